use sqlx::SqlitePool;

pub const SQL_CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY NOT NULL,
    username TEXT NOT NULL,
    avatar_url TEXT,
    guilds TEXT NOT NULL DEFAULT '[]',
    latitude REAL,
    longitude REAL,
    location_timestamp REAL,
    location_mocked INTEGER,
    settings TEXT NOT NULL DEFAULT '{"guild_ids":[]}',
    auth TEXT NOT NULL,
    push_token TEXT
)
"#;

pub const SQL_CREATE_SESSIONS: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
)
"#;

pub const SQL_CREATE_SESSIONS_USER_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions (user_id)
"#;

pub async fn init_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    for statement in [
        SQL_CREATE_USERS,
        SQL_CREATE_SESSIONS,
        SQL_CREATE_SESSIONS_USER_INDEX,
    ] {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
