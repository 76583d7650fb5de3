use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            telegram_id    TEXT PRIMARY KEY,
            first_name     TEXT NOT NULL DEFAULT '',
            last_name      TEXT NOT NULL DEFAULT '',
            username       TEXT NOT NULL DEFAULT '',
            role           TEXT NOT NULL DEFAULT 'user',
            first_used_at  TEXT NOT NULL,
            last_used_at   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS channels (
            id            TEXT PRIMARY KEY,
            channel_id    TEXT NOT NULL,
            title         TEXT NOT NULL DEFAULT '',
            username      TEXT NOT NULL DEFAULT '',
            added_by      TEXT NOT NULL,
            bot_is_admin  INTEGER NOT NULL DEFAULT 0,
            created_at    TEXT NOT NULL,
            UNIQUE(channel_id, added_by)
        );

        CREATE INDEX IF NOT EXISTS idx_channels_owner
            ON channels(added_by, created_at);

        CREATE TABLE IF NOT EXISTS posts (
            id                   TEXT PRIMARY KEY,
            prompt               TEXT NOT NULL DEFAULT '',
            generated_text       TEXT NOT NULL DEFAULT '',
            channel_id           TEXT NOT NULL,
            telegram_message_id  TEXT NOT NULL DEFAULT '',
            published_by         TEXT NOT NULL,
            created_at           TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_posts_publisher
            ON posts(published_by, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
