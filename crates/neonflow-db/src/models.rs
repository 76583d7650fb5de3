//! Database row types mapping directly to SQLite rows.
//! Distinct from the neonflow-types API models to keep the DB layer independent.

use chrono::{DateTime, Utc};
use tracing::warn;

use neonflow_types::models::{ChannelBinding, Post, Role, User};

pub struct UserRow {
    pub telegram_id: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub role: String,
    pub first_used_at: String,
    pub last_used_at: String,
}

pub struct ChannelRow {
    pub id: String,
    pub channel_id: String,
    pub title: String,
    pub username: String,
    pub added_by: String,
    pub bot_is_admin: bool,
    pub created_at: String,
}

pub struct PostRow {
    pub id: String,
    pub prompt: String,
    pub generated_text: String,
    pub channel_id: String,
    pub telegram_message_id: String,
    pub published_by: String,
    pub created_at: String,
}

impl UserRow {
    pub fn into_user(self) -> User {
        let first_used_at = parse_timestamp(&self.first_used_at, "user", &self.telegram_id);
        let last_used_at = parse_timestamp(&self.last_used_at, "user", &self.telegram_id);
        User {
            role: Role::from(self.role.as_str()),
            telegram_id: self.telegram_id,
            first_name: self.first_name,
            last_name: self.last_name,
            username: self.username,
            first_used_at,
            last_used_at,
        }
    }
}

impl ChannelRow {
    pub fn into_binding(self) -> ChannelBinding {
        let created_at = parse_timestamp(&self.created_at, "channel", &self.id);
        ChannelBinding {
            id: self.id,
            channel_id: self.channel_id,
            title: self.title,
            username: self.username,
            added_by: self.added_by,
            bot_is_admin: self.bot_is_admin,
            created_at,
        }
    }
}

impl PostRow {
    pub fn into_post(self) -> Post {
        let created_at = parse_timestamp(&self.created_at, "post", &self.id);
        Post {
            id: self.id,
            prompt: self.prompt,
            generated_text: self.generated_text,
            channel_id: self.channel_id,
            telegram_message_id: self.telegram_message_id,
            published_by: self.published_by,
            created_at,
        }
    }
}

fn parse_timestamp(raw: &str, kind: &str, id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite-style "YYYY-MM-DD HH:MM:SS" without timezone, parsed as UTC.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {} '{}': {}", raw, kind, id, e);
            DateTime::default()
        })
}
