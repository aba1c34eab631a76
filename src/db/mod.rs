#[cfg(test)]
pub mod memory;
pub mod models;
pub mod store;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::quality::policy::{CO2_CRITICAL_LIMIT, CO2_WARNING_LIMIT};

pub const SYSTEM_NAME: &str = "SYSTEM_NAME";
pub const REPORTING_INTERVAL: &str = "REPORTING_INTERVAL";

/// Settings written on first start: `(key, value, description)`.
pub const DEFAULT_SETTINGS: &[(&str, &str, &str)] = &[
    (CO2_WARNING_LIMIT, "1000", "CO2 level in ppm above which a warning alert is raised"),
    (CO2_CRITICAL_LIMIT, "1500", "CO2 level in ppm above which a critical alert is raised"),
    (SYSTEM_NAME, "CleanOffice Alpha", "Display name of this installation"),
    (REPORTING_INTERVAL, "30000", "Sensor reporting interval in milliseconds"),
];

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Insert every default setting that is not present yet. Existing values
/// are left untouched.
pub async fn seed_settings(pool: &PgPool) -> Result<()> {
    let mut tx = pool.begin().await?;
    let mut seeded = 0u64;

    for &(key, value, description) in DEFAULT_SETTINGS {
        seeded += sqlx::query(
            r#"
            INSERT INTO system_settings (key, value, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(description)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;
    info!(seeded, "Default settings checked");
    Ok(())
}
