use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the listings table if the sync job has not run yet.
/// The sync job owns the rows; this service only reads them.
pub async fn ensure_job_listings_table(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS job_listings (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            location TEXT,
            department TEXT,
            description_md TEXT,
            posted_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
