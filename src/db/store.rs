use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;

use super::models::{Alert, Measurement, NewAlert, NewMeasurement, WindowStats};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Storage operations the ingestion pipeline depends on.
///
/// `insert_measurement` and `insert_alerts` are separate commits: the first
/// assigns the measurement its identity, the second writes every alert that
/// references it. Each call is atomic on its own.
#[async_trait]
pub trait Store: Send + Sync {
    async fn sensor_exists(&self, sensor_id: i64) -> Result<bool, StoreError>;

    /// Snapshot of the requested settings. Absent keys are simply missing.
    async fn settings(&self, keys: &[&str]) -> Result<HashMap<String, String>, StoreError>;

    /// Persist a scored measurement and stamp the sensor's `last_seen`.
    async fn insert_measurement(&self, measurement: NewMeasurement) -> Result<Measurement, StoreError>;

    /// Persist all alerts for a measurement, or none of them.
    async fn insert_alerts(&self, alerts: Vec<NewAlert>) -> Result<Vec<Alert>, StoreError>;

    /// Count and averages of a sensor's measurements taken at or after `since`.
    async fn window_stats(&self, sensor_id: i64, since: DateTime<Utc>) -> Result<WindowStats, StoreError>;
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn sensor_exists(&self, sensor_id: i64) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM sensors WHERE id = $1)")
            .bind(sensor_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn settings(&self, keys: &[&str]) -> Result<HashMap<String, String>, StoreError> {
        let keys: Vec<String> = keys.iter().map(|k| (*k).to_owned()).collect();
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM system_settings WHERE key = ANY($1)")
                .bind(keys)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().collect())
    }

    async fn insert_measurement(&self, m: NewMeasurement) -> Result<Measurement, StoreError> {
        let mut tx = self.pool.begin().await?;

        let measurement = sqlx::query_as::<_, Measurement>(
            r#"
            INSERT INTO measurements (sensor_id, temperature, humidity, co2_level, aqi)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, sensor_id, temperature, humidity, co2_level, aqi, measured_at
            "#,
        )
        .bind(m.sensor_id)
        .bind(m.temperature)
        .bind(m.humidity)
        .bind(m.co2_level)
        .bind(m.aqi)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE sensors SET last_seen = $2 WHERE id = $1")
            .bind(m.sensor_id)
            .bind(measurement.measured_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(measurement)
    }

    async fn insert_alerts(&self, alerts: Vec<NewAlert>) -> Result<Vec<Alert>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(alerts.len());

        for alert in alerts {
            let row = sqlx::query_as::<_, Alert>(
                r#"
                INSERT INTO alerts (measurement_id, message, severity)
                VALUES ($1, $2, $3)
                RETURNING id, measurement_id, assigned_to_id, message,
                          severity, is_resolved, created_at
                "#,
            )
            .bind(alert.measurement_id)
            .bind(&alert.message)
            .bind(alert.severity)
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(row);
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn window_stats(&self, sensor_id: i64, since: DateTime<Utc>) -> Result<WindowStats, StoreError> {
        let stats = sqlx::query_as::<_, WindowStats>(
            r#"
            SELECT COUNT(*)              AS count,
                   AVG(temperature)      AS avg_temperature,
                   AVG(humidity)         AS avg_humidity,
                   AVG(co2_level)        AS avg_co2,
                   CASE WHEN COUNT(aqi) = COUNT(*) THEN AVG(aqi) END AS avg_aqi
            FROM measurements
            WHERE sensor_id   = $1
              AND measured_at >= $2
            "#,
        )
        .bind(sensor_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
