use sqlx::{Executor, Sqlite, SqlitePool};

pub const SQL_LOAD_SESSION_USER: &str = r#"
SELECT user_id
FROM sessions
WHERE token = ?1
LIMIT 1
"#;

pub const SQL_INSERT_SESSION: &str = r#"
INSERT OR REPLACE INTO sessions (token, user_id)
VALUES (?1, ?2)
"#;

pub const SQL_DELETE_SESSION: &str = r#"
DELETE FROM sessions
WHERE token = ?1
"#;

pub const SQL_DELETE_USER_SESSIONS: &str = r#"
DELETE FROM sessions
WHERE user_id = ?1
"#;

pub const SQL_COUNT_SESSIONS: &str = r#"
SELECT COUNT(*) FROM sessions
"#;

pub async fn load_session_user(pool: &SqlitePool, token: &str) -> sqlx::Result<Option<String>> {
    sqlx::query_scalar::<_, String>(SQL_LOAD_SESSION_USER)
        .bind(token)
        .fetch_optional(pool)
        .await
}

pub async fn insert_session(pool: &SqlitePool, token: &str, user_id: &str) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_SESSION)
        .bind(token)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_session(pool: &SqlitePool, token: &str) -> sqlx::Result<()> {
    sqlx::query(SQL_DELETE_SESSION)
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_user_sessions<'e, E>(executor: E, user_id: &str) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(SQL_DELETE_USER_SESSIONS)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

pub async fn count_sessions(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(SQL_COUNT_SESSIONS)
        .fetch_one(pool)
        .await
}
