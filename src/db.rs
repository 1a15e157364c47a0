use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id        TEXT PRIMARY KEY NOT NULL,
    owner     TEXT NOT NULL,
    sender    TEXT NOT NULL CHECK (sender IN ('user', 'ai')),
    text      TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    client_id TEXT
);
CREATE INDEX IF NOT EXISTS messages_owner_timestamp ON messages (owner, timestamp);
"#;

pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    migrate(&db_pool).await?;
    Ok(db_pool)
}

pub async fn migrate(db_pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(db_pool).await?;
    Ok(())
}

/// Single-connection in-memory database, each pool gets its own.
pub async fn memory() -> Result<SqlitePool, sqlx::Error> {
    connect("sqlite::memory:", 1).await
}
