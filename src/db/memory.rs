use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{
    models::{Alert, Measurement, NewAlert, NewMeasurement, WindowStats},
    store::{Store, StoreError},
};

#[derive(Default)]
struct Tables {
    sensors: Vec<i64>,
    settings: HashMap<String, String>,
    measurements: Vec<Measurement>,
    alerts: Vec<Alert>,
}

/// In-memory `Store` for exercising the pipeline without Postgres.
///
/// Cloning shares state. Each commit phase can be made to fail on demand.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Tables>>,
    fail_measurements: Arc<AtomicBool>,
    fail_alerts: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_sensor(&self, sensor_id: i64) {
        self.inner.write().await.sensors.push(sensor_id);
    }

    pub async fn set_setting(&self, key: &str, value: &str) {
        self.inner
            .write()
            .await
            .settings
            .insert(key.to_owned(), value.to_owned());
    }

    /// Insert a measurement as-is, bypassing scoring.
    pub async fn push_measurement(&self, measurement: Measurement) {
        self.inner.write().await.measurements.push(measurement);
    }

    pub async fn measurements(&self) -> Vec<Measurement> {
        self.inner.read().await.measurements.clone()
    }

    pub async fn alerts(&self) -> Vec<Alert> {
        self.inner.read().await.alerts.clone()
    }

    pub fn fail_measurements(&self, fail: bool) {
        self.fail_measurements.store(fail, Ordering::SeqCst);
    }

    pub fn fail_alerts(&self, fail: bool) {
        self.fail_alerts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn sensor_exists(&self, sensor_id: i64) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.sensors.contains(&sensor_id))
    }

    async fn settings(&self, keys: &[&str]) -> Result<HashMap<String, String>, StoreError> {
        let tables = self.inner.read().await;
        Ok(keys
            .iter()
            .filter_map(|k| tables.settings.get(*k).map(|v| ((*k).to_owned(), v.clone())))
            .collect())
    }

    async fn insert_measurement(&self, m: NewMeasurement) -> Result<Measurement, StoreError> {
        if self.fail_measurements.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("measurement insert rejected".into()));
        }
        let mut tables = self.inner.write().await;
        let measurement = Measurement {
            id: tables.measurements.len() as i64 + 1,
            sensor_id: m.sensor_id,
            temperature: m.temperature,
            humidity: m.humidity,
            co2_level: m.co2_level,
            aqi: Some(m.aqi),
            measured_at: Utc::now(),
        };
        tables.measurements.push(measurement.clone());
        Ok(measurement)
    }

    async fn insert_alerts(&self, alerts: Vec<NewAlert>) -> Result<Vec<Alert>, StoreError> {
        if self.fail_alerts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("alert insert rejected".into()));
        }
        let mut tables = self.inner.write().await;
        let mut inserted = Vec::with_capacity(alerts.len());
        for alert in alerts {
            let row = Alert {
                id: tables.alerts.len() as i64 + 1,
                measurement_id: alert.measurement_id,
                assigned_to_id: None,
                message: alert.message,
                severity: alert.severity,
                is_resolved: false,
                created_at: Utc::now(),
            };
            tables.alerts.push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn window_stats(&self, sensor_id: i64, since: DateTime<Utc>) -> Result<WindowStats, StoreError> {
        let tables = self.inner.read().await;
        let rows: Vec<&Measurement> = tables
            .measurements
            .iter()
            .filter(|m| m.sensor_id == sensor_id && m.measured_at >= since)
            .collect();

        if rows.is_empty() {
            return Ok(WindowStats::default());
        }

        let n = rows.len() as f64;
        let mean = |f: fn(&Measurement) -> f64| rows.iter().map(|m| f(m)).sum::<f64>() / n;
        let avg_aqi = rows
            .iter()
            .map(|m| m.aqi)
            .collect::<Option<Vec<f64>>>()
            .map(|v| v.iter().sum::<f64>() / n);

        Ok(WindowStats {
            count: rows.len() as i64,
            avg_temperature: Some(mean(|m| m.temperature)),
            avg_humidity: Some(mean(|m| m.humidity)),
            avg_co2: Some(mean(|m| m.co2_level)),
            avg_aqi,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn measurement(id: i64, sensor_id: i64, aqi: Option<f64>, age_hours: i64) -> Measurement {
        Measurement {
            id,
            sensor_id,
            temperature: 20.0 + id as f64,
            humidity: 50.0,
            co2_level: 600.0,
            aqi,
            measured_at: Utc::now() - Duration::hours(age_hours),
        }
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let store = MemoryStore::new();
        let clone = store.clone();
        store.add_sensor(1).await;
        assert!(clone.sensor_exists(1).await.unwrap());
        assert!(!clone.sensor_exists(2).await.unwrap());
    }

    #[tokio::test]
    async fn settings_snapshot_only_contains_requested_keys() {
        let store = MemoryStore::new();
        store.set_setting("A", "1").await;
        store.set_setting("B", "2").await;

        let snap = store.settings(&["A", "C"]).await.unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap["A"], "1");
    }

    #[tokio::test]
    async fn window_stats_filters_by_sensor_and_time() {
        let store = MemoryStore::new();
        store.push_measurement(measurement(1, 1, Some(10.0), 1)).await;
        store.push_measurement(measurement(2, 1, Some(20.0), 2)).await;
        store.push_measurement(measurement(3, 1, Some(90.0), 48)).await;
        store.push_measurement(measurement(4, 2, Some(90.0), 1)).await;

        let since = Utc::now() - Duration::hours(24);
        let stats = store.window_stats(1, since).await.unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.avg_temperature, Some(21.5));
        assert_eq!(stats.avg_aqi, Some(15.0));
    }

    #[tokio::test]
    async fn window_stats_drops_aqi_mean_when_any_aqi_missing() {
        let store = MemoryStore::new();
        store.push_measurement(measurement(1, 1, Some(10.0), 1)).await;
        store.push_measurement(measurement(2, 1, None, 1)).await;

        let stats = store
            .window_stats(1, Utc::now() - Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.avg_aqi, None);
    }
}
