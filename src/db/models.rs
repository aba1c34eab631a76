use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Mirrors the `alert_severity` Postgres enum.
///
/// Variants are declared in ascending order so the derived `Ord` gives
/// `Info < Warning < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "alert_severity", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Mirrors the `user_role` Postgres enum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Sensor {
    pub id: i64,
    pub serial_number: String,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub sensor_type: String,
    pub is_active: bool,
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Measurement {
    pub id: i64,
    pub sensor_id: i64,
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity percentage
    pub humidity: f64,
    /// Parts per million
    pub co2_level: f64,
    /// Always set for rows written by ingestion; nullable for legacy rows.
    pub aqi: Option<f64>,
    pub measured_at: DateTime<Utc>,
}

/// A measurement that has been scored but not yet assigned an identity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeasurement {
    pub sensor_id: i64,
    pub temperature: f64,
    pub humidity: f64,
    pub co2_level: f64,
    pub aqi: f64,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Alert {
    pub id: i64,
    pub measurement_id: i64,
    pub assigned_to_id: Option<i64>,
    pub message: String,
    pub severity: AlertSeverity,
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
}

/// An alert bound to a persisted measurement, ready to be inserted.
///
/// Only `CandidateAlert::attach` builds one, so an alert can never be
/// written without the identity of the measurement that triggered it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub(crate) measurement_id: i64,
    pub(crate) message: String,
    pub(crate) severity: AlertSeverity,
}

impl NewAlert {
    pub fn measurement_id(&self) -> i64 {
        self.measurement_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> AlertSeverity {
        self.severity
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct SystemSetting {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct AuditLog {
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    pub target: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregates over a sensor's measurements inside a time window.
///
/// `avg_aqi` is `None` unless every measurement in the window carries an AQI.
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct WindowStats {
    pub count: i64,
    pub avg_temperature: Option<f64>,
    pub avg_humidity: Option<f64>,
    pub avg_co2: Option<f64>,
    pub avg_aqi: Option<f64>,
}
