use sqlx::{Executor, Sqlite, SqlitePool};

use crate::models::{Location, UserRow};

const USER_COLUMNS: &str = r#"
    user_id,
    username,
    avatar_url,
    guilds,
    latitude,
    longitude,
    location_timestamp,
    location_mocked,
    settings,
    auth,
    push_token
"#;

// ON CONFLICT keeps the rowid, so an updated user keeps its snapshot position.
pub const SQL_UPSERT_USER: &str = r#"
INSERT INTO users (
    user_id,
    username,
    avatar_url,
    guilds,
    latitude,
    longitude,
    location_timestamp,
    location_mocked,
    settings,
    auth,
    push_token
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
ON CONFLICT (user_id) DO UPDATE SET
    username = excluded.username,
    avatar_url = excluded.avatar_url,
    guilds = excluded.guilds,
    latitude = excluded.latitude,
    longitude = excluded.longitude,
    location_timestamp = excluded.location_timestamp,
    location_mocked = excluded.location_mocked,
    settings = excluded.settings,
    auth = excluded.auth,
    push_token = excluded.push_token
"#;

pub const SQL_UPDATE_LOCATION: &str = r#"
UPDATE users
SET latitude = ?2,
    longitude = ?3,
    location_timestamp = ?4,
    location_mocked = ?5
WHERE user_id = ?1
"#;

pub const SQL_UPDATE_SETTINGS: &str = r#"
UPDATE users
SET settings = ?2
WHERE user_id = ?1
"#;

pub const SQL_DELETE_USER: &str = r#"
DELETE FROM users
WHERE user_id = ?1
"#;

pub const SQL_COUNT_USERS: &str = r#"
SELECT COUNT(*) FROM users
"#;

pub async fn load_user(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE user_id = ?1 LIMIT 1", USER_COLUMNS);
    sqlx::query_as::<_, UserRow>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn load_all_users(pool: &SqlitePool) -> sqlx::Result<Vec<UserRow>> {
    let sql = format!("SELECT {} FROM users ORDER BY rowid", USER_COLUMNS);
    sqlx::query_as::<_, UserRow>(&sql).fetch_all(pool).await
}

pub async fn upsert_user(pool: &SqlitePool, row: &UserRow) -> sqlx::Result<()> {
    sqlx::query(SQL_UPSERT_USER)
        .bind(&row.user_id)
        .bind(&row.username)
        .bind(&row.avatar_url)
        .bind(&row.guilds)
        .bind(row.latitude)
        .bind(row.longitude)
        .bind(row.location_timestamp)
        .bind(row.location_mocked)
        .bind(&row.settings)
        .bind(&row.auth)
        .bind(&row.push_token)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_location(
    pool: &SqlitePool,
    user_id: &str,
    location: &Location,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_LOCATION)
        .bind(user_id)
        .bind(location.coords.latitude)
        .bind(location.coords.longitude)
        .bind(location.timestamp)
        .bind(location.mocked)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn update_settings(
    pool: &SqlitePool,
    user_id: &str,
    settings_json: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_SETTINGS)
        .bind(user_id)
        .bind(settings_json)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete_user<'e, E>(executor: E, user_id: &str) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(SQL_DELETE_USER)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

pub async fn count_users(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(SQL_COUNT_USERS)
        .fetch_one(pool)
        .await
}
