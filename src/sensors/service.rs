use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

use super::analytics::{self, SensorAnalytics};
use crate::{
    db::{
        models::{Measurement, NewMeasurement},
        store::{Store, StoreError},
    },
    quality::{
        aqi,
        policy::{self, CO2_CRITICAL_LIMIT, CO2_WARNING_LIMIT},
    },
};

/// A raw reading as submitted by a sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity percentage
    pub humidity: f64,
    /// Parts per million
    pub co2_level: f64,
}

impl Reading {
    fn validate(&self) -> Result<(), IngestError> {
        for (field, value) in [
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("co2_level", self.co2_level),
        ] {
            if !value.is_finite() {
                return Err(IngestError::InvalidInput(format!("{field} must be a finite number")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("sensor {0} not found")]
    SensorNotFound(i64),

    #[error("invalid reading: {0}")]
    InvalidInput(String),

    /// Nothing was written.
    #[error("failed to persist measurement: {0}")]
    MeasurementNotPersisted(#[source] StoreError),

    /// The measurement is committed but none of its alerts are.
    #[error("measurement {} persisted but its alerts were lost: {source}", .measurement.id)]
    AlertsNotPersisted {
        measurement: Box<Measurement>,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Length of the analytics window.
pub const ANALYTICS_WINDOW_HOURS: i64 = 24;

pub struct SensorService<S> {
    store: S,
}

impl<S: Store> SensorService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Scores a reading, derives its alerts and persists both.
    ///
    /// The measurement is committed first so its identity can be attached to
    /// the alerts, which are committed in a second step. A failure in that
    /// second step is reported as `IngestError::AlertsNotPersisted` and the
    /// measurement stays stored.
    pub async fn ingest(&self, sensor_id: i64, reading: Reading) -> Result<Measurement, IngestError> {
        reading.validate()?;

        if !self.store.sensor_exists(sensor_id).await? {
            return Err(IngestError::SensorNotFound(sensor_id));
        }

        let aqi = aqi::score(reading.co2_level, reading.temperature, reading.humidity);
        let settings = self
            .store
            .settings(&[CO2_WARNING_LIMIT, CO2_CRITICAL_LIMIT])
            .await?;
        let candidates = policy::evaluate(reading.co2_level, aqi, &settings);

        let measurement = self
            .store
            .insert_measurement(NewMeasurement {
                sensor_id,
                temperature: reading.temperature,
                humidity: reading.humidity,
                co2_level: reading.co2_level,
                aqi,
            })
            .await
            .map_err(IngestError::MeasurementNotPersisted)?;

        info!(
            sensor_id,
            measurement_id = measurement.id,
            aqi,
            alerts = candidates.len(),
            "Measurement persisted"
        );

        if candidates.is_empty() {
            return Ok(measurement);
        }

        let alerts = candidates
            .into_iter()
            .map(|c| c.attach(&measurement))
            .collect();

        match self.store.insert_alerts(alerts).await {
            Ok(inserted) => {
                for alert in &inserted {
                    warn!(
                        sensor_id,
                        measurement_id = measurement.id,
                        alert_id = alert.id,
                        severity = %alert.severity,
                        message = %alert.message,
                        "Alert raised"
                    );
                }
                Ok(measurement)
            }
            Err(source) => {
                error!(
                    sensor_id,
                    measurement_id = measurement.id,
                    error = %source,
                    "Alerts lost after measurement commit"
                );
                Err(IngestError::AlertsNotPersisted {
                    measurement: Box::new(measurement),
                    source,
                })
            }
        }
    }

    /// Averages over the sensor's measurements from the last 24 hours.
    ///
    /// The caller is responsible for checking that the sensor exists.
    pub async fn analytics(&self, sensor_id: i64) -> Result<SensorAnalytics, StoreError> {
        let since = Utc::now() - Duration::hours(ANALYTICS_WINDOW_HOURS);
        let stats = self.store.window_stats(sensor_id, since).await?;
        Ok(analytics::summarize(sensor_id, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{memory::MemoryStore, models::AlertSeverity};

    const SENSOR: i64 = 1;

    async fn service_with_sensor() -> (SensorService<MemoryStore>, MemoryStore) {
        let store = MemoryStore::new();
        store.add_sensor(SENSOR).await;
        (SensorService::new(store.clone()), store)
    }

    fn reading(co2_level: f64, temperature: f64, humidity: f64) -> Reading {
        Reading {
            temperature,
            humidity,
            co2_level,
        }
    }

    #[tokio::test]
    async fn comfortable_reading_raises_no_alerts() {
        let (service, store) = service_with_sensor().await;

        let m = service.ingest(SENSOR, reading(500.0, 22.0, 50.0)).await.unwrap();

        assert_eq!(m.sensor_id, SENSOR);
        assert_eq!(m.aqi, Some(4.4));
        assert_eq!(store.measurements().await.len(), 1);
        assert!(store.alerts().await.is_empty());
    }

    #[tokio::test]
    async fn aqi_is_attached_to_measurement() {
        let (service, _store) = service_with_sensor().await;
        let m = service.ingest(SENSOR, reading(2000.0, 22.0, 50.0)).await.unwrap();
        assert_eq!(m.aqi, Some(70.0));
        assert_eq!(m.co2_level, 2000.0);
        assert_eq!(m.temperature, 22.0);
        assert_eq!(m.humidity, 50.0);
    }

    #[tokio::test]
    async fn critical_co2_raises_one_critical_alert() {
        let (service, store) = service_with_sensor().await;

        let m = service.ingest(SENSOR, reading(1600.0, 22.0, 50.0)).await.unwrap();

        let alerts = store.alerts().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[0].message, "CRITICAL: CO2 at 1600 ppm (limit: 1500.0)");
        assert_eq!(alerts[0].measurement_id, m.id);
        assert!(!alerts[0].is_resolved);
    }

    #[tokio::test]
    async fn warning_co2_and_poor_aqi_raise_two_alerts_in_order() {
        let (service, store) = service_with_sensor().await;

        let m = service.ingest(SENSOR, reading(1100.0, 40.0, 0.0)).await.unwrap();
        assert_eq!(m.aqi, Some(60.6));

        let alerts = store.alerts().await;
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].message, "WARNING: CO2 at 1100 ppm (limit: 1000.0)");
        assert_eq!(alerts[1].message, "Poor Air Quality Index: 60.6");
        assert!(alerts.iter().all(|a| a.severity == AlertSeverity::Warning));
        assert!(alerts.iter().all(|a| a.measurement_id == m.id));
    }

    #[tokio::test]
    async fn thresholds_come_from_settings() {
        let (service, store) = service_with_sensor().await;
        store.set_setting(CO2_WARNING_LIMIT, "600").await;

        service.ingest(SENSOR, reading(700.0, 22.0, 50.0)).await.unwrap();

        let alerts = store.alerts().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].message, "WARNING: CO2 at 700 ppm (limit: 600.0)");
    }

    #[tokio::test]
    async fn unknown_sensor_is_not_found_and_persists_nothing() {
        let (service, store) = service_with_sensor().await;

        let err = service.ingest(99, reading(1600.0, 22.0, 50.0)).await.unwrap_err();

        assert!(matches!(err, IngestError::SensorNotFound(99)));
        assert!(store.measurements().await.is_empty());
        assert!(store.alerts().await.is_empty());
    }

    #[tokio::test]
    async fn non_finite_reading_is_rejected_before_persisting() {
        let (service, store) = service_with_sensor().await;

        let err = service
            .ingest(SENSOR, reading(f64::NAN, 22.0, 50.0))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::InvalidInput(_)));
        assert!(err.to_string().contains("co2_level"));
        assert!(store.measurements().await.is_empty());
    }

    #[tokio::test]
    async fn measurement_failure_writes_nothing() {
        let (service, store) = service_with_sensor().await;
        store.fail_measurements(true);

        let err = service.ingest(SENSOR, reading(1600.0, 22.0, 50.0)).await.unwrap_err();

        assert!(matches!(err, IngestError::MeasurementNotPersisted(_)));
        assert!(store.measurements().await.is_empty());
        assert!(store.alerts().await.is_empty());
    }

    #[tokio::test]
    async fn alert_failure_keeps_measurement_and_reports_it() {
        let (service, store) = service_with_sensor().await;
        store.fail_alerts(true);

        let err = service.ingest(SENSOR, reading(1600.0, 22.0, 50.0)).await.unwrap_err();

        match err {
            IngestError::AlertsNotPersisted { measurement, .. } => {
                assert_eq!(store.measurements().await, vec![*measurement]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.alerts().await.is_empty());
    }

    #[tokio::test]
    async fn alert_failure_is_irrelevant_without_alerts() {
        let (service, store) = service_with_sensor().await;
        store.fail_alerts(true);

        service.ingest(SENSOR, reading(500.0, 22.0, 50.0)).await.unwrap();
        assert_eq!(store.measurements().await.len(), 1);
    }

    #[tokio::test]
    async fn analytics_without_measurements_reports_no_data() {
        let (service, _store) = service_with_sensor().await;
        let result = service.analytics(SENSOR).await.unwrap();
        assert_eq!(result, SensorAnalytics::no_data());
    }

    #[tokio::test]
    async fn analytics_averages_recent_measurements() {
        let (service, _store) = service_with_sensor().await;
        service.ingest(SENSOR, reading(400.0, 22.0, 50.0)).await.unwrap();
        service.ingest(SENSOR, reading(2000.0, 22.0, 50.0)).await.unwrap();

        let SensorAnalytics::Summary(summary) = service.analytics(SENSOR).await.unwrap() else {
            panic!("expected a summary");
        };
        assert_eq!(summary.sensor_id, SENSOR);
        assert_eq!(summary.measurements_count, 2);
        assert_eq!(summary.averages.co2, 1200.0);
        assert_eq!(summary.averages.aqi, Some(35.0));
    }

    #[tokio::test]
    async fn analytics_ignores_measurements_older_than_a_day() {
        let (service, store) = service_with_sensor().await;
        store
            .push_measurement(Measurement {
                id: 1,
                sensor_id: SENSOR,
                temperature: 22.0,
                humidity: 50.0,
                co2_level: 800.0,
                aqi: Some(17.5),
                measured_at: Utc::now() - Duration::hours(25),
            })
            .await;

        let result = service.analytics(SENSOR).await.unwrap();
        assert_eq!(result, SensorAnalytics::no_data());
    }
}
