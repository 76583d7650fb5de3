use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    SuperAdmin,
}

impl Role {
    /// Recomputed from configuration on every authentication; the stored
    /// role is never authoritative.
    pub fn derive(telegram_id: &str, super_admin_id: &str) -> Role {
        if telegram_id == super_admin_id {
            Role::SuperAdmin
        } else {
            Role::User
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::SuperAdmin => "super_admin",
        }
    }
}

impl From<&str> for Role {
    fn from(raw: &str) -> Role {
        if raw == "super_admin" {
            Role::SuperAdmin
        } else {
            Role::User
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub telegram_id: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub role: Role,
    pub first_used_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

/// A verified "this user may publish to this channel" association.
/// Only ever persisted after the bot's admin rights were confirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelBinding {
    pub id: String,
    pub channel_id: String,
    pub title: String,
    pub username: String,
    pub added_by: String,
    pub bot_is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// One published broadcast. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub prompt: String,
    pub generated_text: String,
    pub channel_id: String,
    pub telegram_message_id: String,
    pub published_by: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_derivation_is_exact_string_equality() {
        assert_eq!(Role::derive("42", "42"), Role::SuperAdmin);
        assert_eq!(Role::derive("42", "43"), Role::User);
        assert_eq!(Role::derive("42", ""), Role::User);
    }

    #[test]
    fn role_round_trips_through_storage_form() {
        assert_eq!(Role::from(Role::SuperAdmin.as_str()), Role::SuperAdmin);
        assert_eq!(Role::from(Role::User.as_str()), Role::User);
        // Anything unexpected in storage degrades to the unprivileged role.
        assert_eq!(Role::from("admin"), Role::User);
    }

    #[test]
    fn role_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::SuperAdmin).unwrap(),
            "\"super_admin\""
        );
    }
}
