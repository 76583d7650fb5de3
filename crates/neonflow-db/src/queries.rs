use anyhow::{Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;

use crate::Database;
use crate::models::{ChannelRow, PostRow, UserRow};

/// Fixed-width UTC form so TEXT columns compare chronologically.
fn fmt_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Database {
    // -- Users --

    /// Atomic insert-or-update keyed by telegram id. The first-seen timestamp
    /// survives conflicts; everything else reflects the latest authentication.
    pub fn upsert_user(
        &self,
        telegram_id: &str,
        first_name: &str,
        last_name: &str,
        username: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<UserRow> {
        let now = fmt_timestamp(now);
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (telegram_id, first_name, last_name, username, role, first_used_at, last_used_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 ON CONFLICT(telegram_id) DO UPDATE SET
                     first_name = excluded.first_name,
                     last_name = excluded.last_name,
                     username = excluded.username,
                     role = excluded.role,
                     last_used_at = excluded.last_used_at",
                rusqlite::params![telegram_id, first_name, last_name, username, role, now],
            )?;
            query_user(conn, telegram_id)?
                .ok_or_else(|| anyhow!("user row missing after upsert: {}", telegram_id))
        })
    }

    pub fn get_user(&self, telegram_id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, telegram_id))
    }

    // -- Channels --

    /// Atomic insert-or-update on the (channel_id, added_by) pair. Callers
    /// only reach this after the admin check, so the row is always written
    /// with bot_is_admin set; a conflict refreshes title, handle and timestamp.
    pub fn upsert_channel(
        &self,
        id: &str,
        channel_id: &str,
        title: &str,
        username: &str,
        added_by: &str,
        now: DateTime<Utc>,
    ) -> Result<ChannelRow> {
        let now = fmt_timestamp(now);
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO channels (id, channel_id, title, username, added_by, bot_is_admin, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
                 ON CONFLICT(channel_id, added_by) DO UPDATE SET
                     title = excluded.title,
                     username = excluded.username,
                     bot_is_admin = 1,
                     created_at = excluded.created_at",
                rusqlite::params![id, channel_id, title, username, added_by, now],
            )?;
            query_channel(conn, channel_id, added_by)?
                .ok_or_else(|| anyhow!("channel row missing after upsert: {}", channel_id))
        })
    }

    pub fn list_channels(&self, added_by: &str) -> Result<Vec<ChannelRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, channel_id, title, username, added_by, bot_is_admin, created_at
                 FROM channels
                 WHERE added_by = ?1
                 ORDER BY created_at DESC",
            )?;

            let rows = stmt
                .query_map([added_by], map_channel_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Posts --

    pub fn insert_post(
        &self,
        id: &str,
        prompt: &str,
        generated_text: &str,
        channel_id: &str,
        telegram_message_id: &str,
        published_by: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let now = fmt_timestamp(now);
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (id, prompt, generated_text, channel_id, telegram_message_id, published_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![id, prompt, generated_text, channel_id, telegram_message_id, published_by, now],
            )?;
            Ok(())
        })
    }

    /// All posts, or one publisher's posts, newest first.
    pub fn list_posts(&self, published_by: Option<&str>) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let rows = match published_by {
                Some(publisher) => {
                    let mut stmt = conn.prepare(
                        "SELECT id, prompt, generated_text, channel_id, telegram_message_id, published_by, created_at
                         FROM posts
                         WHERE published_by = ?1
                         ORDER BY created_at DESC",
                    )?;
                    stmt.query_map([publisher], map_post_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, prompt, generated_text, channel_id, telegram_message_id, published_by, created_at
                         FROM posts
                         ORDER BY created_at DESC",
                    )?;
                    stmt.query_map([], map_post_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
            };

            Ok(rows)
        })
    }

    // -- Stats --

    pub fn count_users(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            Ok(n as u64)
        })
    }

    pub fn count_channels(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM channels", [], |row| row.get(0))?;
            Ok(n as u64)
        })
    }

    pub fn count_posts(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
            Ok(n as u64)
        })
    }
}

fn query_user(conn: &Connection, telegram_id: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT telegram_id, first_name, last_name, username, role, first_used_at, last_used_at
         FROM users WHERE telegram_id = ?1",
    )?;

    let row = stmt
        .query_row([telegram_id], |row| {
            Ok(UserRow {
                telegram_id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                username: row.get(3)?,
                role: row.get(4)?,
                first_used_at: row.get(5)?,
                last_used_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_channel(conn: &Connection, channel_id: &str, added_by: &str) -> Result<Option<ChannelRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, channel_id, title, username, added_by, bot_is_admin, created_at
         FROM channels WHERE channel_id = ?1 AND added_by = ?2",
    )?;

    let row = stmt
        .query_row([channel_id, added_by], map_channel_row)
        .optional()?;

    Ok(row)
}

fn map_channel_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChannelRow> {
    Ok(ChannelRow {
        id: row.get(0)?,
        channel_id: row.get(1)?,
        title: row.get(2)?,
        username: row.get(3)?,
        added_by: row.get(4)?,
        bot_is_admin: row.get::<_, i64>(5)? != 0,
        created_at: row.get(6)?,
    })
}

fn map_post_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        prompt: row.get(1)?,
        generated_text: row.get(2)?,
        channel_id: row.get(3)?,
        telegram_message_id: row.get(4)?,
        published_by: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn user_upsert_preserves_first_seen_and_recomputes_the_rest() {
        let db = db();
        let t0 = Utc::now();

        let created = db.upsert_user("42", "Ada", "", "ada", "user", t0).unwrap();
        assert_eq!(created.first_used_at, created.last_used_at);

        let t1 = t0 + Duration::seconds(5);
        let updated = db
            .upsert_user("42", "Ada", "Lovelace", "ada", "super_admin", t1)
            .unwrap();

        assert_eq!(updated.first_used_at, created.first_used_at);
        assert_eq!(updated.last_used_at, fmt_timestamp(t1));
        assert_eq!(updated.role, "super_admin");
        assert_eq!(updated.last_name, "Lovelace");
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn channel_upsert_collapses_to_one_row_per_owner() {
        let db = db();
        let t0 = Utc::now();

        let first = db
            .upsert_channel("id-1", "-100555", "News", "news", "42", t0)
            .unwrap();
        let second = db
            .upsert_channel("id-2", "-100555", "Daily News", "news", "42", t0 + Duration::seconds(3))
            .unwrap();

        // Same pair keeps the original row id, refreshed metadata and timestamp.
        assert_eq!(second.id, first.id);
        assert_eq!(second.title, "Daily News");
        assert!(second.created_at >= first.created_at);
        assert_eq!(db.count_channels().unwrap(), 1);

        // A different owner gets an independent binding.
        db.upsert_channel("id-3", "-100555", "News", "news", "77", t0)
            .unwrap();
        assert_eq!(db.count_channels().unwrap(), 2);
        assert_eq!(db.list_channels("42").unwrap().len(), 1);
    }

    #[test]
    fn channel_listing_is_newest_first() {
        let db = db();
        let t0 = Utc::now();

        db.upsert_channel("id-1", "-1", "Old", "", "42", t0).unwrap();
        db.upsert_channel("id-2", "-2", "New", "", "42", t0 + Duration::seconds(10))
            .unwrap();

        let rows = db.list_channels("42").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "New");
        assert_eq!(rows[1].title, "Old");
    }

    #[test]
    fn posts_listing_scopes_by_publisher() {
        let db = db();
        let t0 = Utc::now();

        db.insert_post("p1", "", "hello", "-1", "10", "42", t0).unwrap();
        db.insert_post("p2", "", "world", "-1", "11", "77", t0 + Duration::seconds(1))
            .unwrap();

        assert_eq!(db.list_posts(None).unwrap().len(), 2);

        let mine = db.list_posts(Some("42")).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "p1");

        assert_eq!(db.count_posts().unwrap(), 2);
    }

    #[test]
    fn row_timestamps_round_trip_to_chrono() {
        let db = db();
        let t0 = Utc::now();

        let row = db.upsert_user("42", "Ada", "", "", "user", t0).unwrap();
        let user = row.into_user();
        assert_eq!(user.first_used_at.timestamp_millis(), t0.timestamp_millis());
    }
}
