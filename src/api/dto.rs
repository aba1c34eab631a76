use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{db::models::UserRole, sensors::Reading};

/// Request body for `POST /api/v1/sensors/`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SensorCreate {
    pub serial_number: String,
    pub location: Option<String>,
    #[serde(rename = "type", default = "default_sensor_type")]
    pub sensor_type: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_sensor_type() -> String {
    "generic".to_owned()
}

fn default_true() -> bool {
    true
}

/// Request body for `POST /api/v1/sensors/{sensor_id}/measurements`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MeasurementCreate {
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity percentage
    pub humidity: f64,
    /// Parts per million
    pub co2_level: f64,
}

impl From<MeasurementCreate> for Reading {
    fn from(m: MeasurementCreate) -> Self {
        Self {
            temperature: m.temperature,
            humidity: m.humidity,
            co2_level: m.co2_level,
        }
    }
}

/// Request body for `PATCH /api/v1/alerts/{alert_id}/assign`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignAlert {
    pub user_id: i64,
}

/// Request body for `POST /api/v1/users/`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UserCreate {
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
}

/// Form body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    /// `(offset, limit)` with negatives clamped to zero.
    pub fn resolve(&self, default_limit: i64) -> (i64, i64) {
        (
            self.offset.unwrap_or(0).max(0),
            self.limit.unwrap_or(default_limit).max(0),
        )
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SettingUpdate {
    pub value: String,
    /// User performing the change, recorded in the audit log.
    pub admin_id: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditLogQuery {
    pub limit: Option<i64>,
}
