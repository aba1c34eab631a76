use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use utoipa::OpenApi;

use super::{
    admin, alerts,
    dto::{
        AssignAlert, LoginForm, MeasurementCreate, Pagination, SensorCreate, TokenResponse,
        UserCreate,
    },
    errors::AppError,
    users, AppState,
};
use crate::{
    db::models::{Alert, AlertSeverity, AuditLog, Measurement, Sensor, SystemSetting, User, UserRole},
    sensors::analytics::{AnalyticsSummary, Averages, NoData, SensorAnalytics},
};

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Register a new sensor.
#[utoipa::path(
    post,
    path = "/api/v1/sensors/",
    request_body = SensorCreate,
    responses(
        (status = 201, description = "Sensor registered", body = Sensor),
        (status = 409, description = "Serial number already registered"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn create_sensor(
    State(state): State<AppState>,
    Json(body): Json<SensorCreate>,
) -> Result<(StatusCode, Json<Sensor>), AppError> {
    let sensor = sqlx::query_as::<_, Sensor>(
        r#"
        INSERT INTO sensors (serial_number, location, sensor_type, is_active)
        VALUES ($1, $2, $3, $4)
        RETURNING id, serial_number, location, sensor_type, is_active, last_seen
        "#,
    )
    .bind(&body.serial_number)
    .bind(&body.location)
    .bind(&body.sensor_type)
    .bind(body.is_active)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Conflict(format!("Serial number {} already registered", body.serial_number))
        }
        other => other.into(),
    })?;

    tracing::info!(sensor_id = sensor.id, serial_number = %sensor.serial_number, "Sensor registered");
    Ok((StatusCode::CREATED, Json(sensor)))
}

/// List sensors ordered by id.
#[utoipa::path(
    get,
    path = "/api/v1/sensors/",
    params(Pagination),
    responses(
        (status = 200, description = "Sensors", body = Vec<Sensor>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn read_sensors(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Sensor>>, AppError> {
    let (offset, limit) = page.resolve(100);
    let rows = sqlx::query_as::<_, Sensor>(
        r#"
        SELECT id, serial_number, location, sensor_type, is_active, last_seen
        FROM sensors
        ORDER BY id
        OFFSET $1
        LIMIT $2
        "#,
    )
    .bind(offset)
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/v1/sensors/{sensor_id}",
    params(("sensor_id" = i64, Path, description = "Sensor ID")),
    responses(
        (status = 200, description = "Sensor", body = Sensor),
        (status = 404, description = "Sensor not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn read_sensor(
    State(state): State<AppState>,
    Path(sensor_id): Path<i64>,
) -> Result<Json<Sensor>, AppError> {
    let sensor = sqlx::query_as::<_, Sensor>(
        r#"
        SELECT id, serial_number, location, sensor_type, is_active, last_seen
        FROM sensors
        WHERE id = $1
        "#,
    )
    .bind(sensor_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::not_found("Sensor"))?;

    Ok(Json(sensor))
}

/// Submit a reading for a sensor.
///
/// The reading is scored, stored, and any threshold alerts it triggers are
/// stored alongside it. Returns the stored measurement with its AQI.
#[utoipa::path(
    post,
    path = "/api/v1/sensors/{sensor_id}/measurements",
    params(("sensor_id" = i64, Path, description = "Sensor ID")),
    request_body = MeasurementCreate,
    responses(
        (status = 201, description = "Measurement stored", body = Measurement),
        (status = 404, description = "Sensor not found"),
        (status = 422, description = "Missing or non-numeric reading fields"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn create_measurement(
    State(state): State<AppState>,
    Path(sensor_id): Path<i64>,
    payload: Result<Json<MeasurementCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<Measurement>), AppError> {
    let Json(body) = payload.map_err(|e| AppError::Unprocessable(e.body_text()))?;
    let measurement = state.sensor_service().ingest(sensor_id, body.into()).await?;
    Ok((StatusCode::CREATED, Json(measurement)))
}

// ---------------------------------------------------------------------------
// Measurements
// ---------------------------------------------------------------------------

/// List measurements across all sensors, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/measurements/",
    params(Pagination),
    responses(
        (status = 200, description = "Measurements", body = Vec<Measurement>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "measurements"
)]
pub async fn read_measurements(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Measurement>>, AppError> {
    let (offset, limit) = page.resolve(100);
    let rows = sqlx::query_as::<_, Measurement>(
        r#"
        SELECT id, sensor_id, temperature, humidity, co2_level, aqi, measured_at
        FROM measurements
        ORDER BY measured_at DESC, id DESC
        OFFSET $1
        LIMIT $2
        "#,
    )
    .bind(offset)
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows))
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Welcome message")),
    tag = "system"
)]
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Welcome to CleanOffice API" }))
}

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        create_sensor,
        read_sensors,
        read_sensor,
        create_measurement,
        read_measurements,
        alerts::read_alerts,
        alerts::read_alert,
        alerts::resolve_alert,
        alerts::assign_alert,
        users::create_user,
        users::read_users,
        users::read_user,
        users::login,
        admin::read_settings,
        admin::update_setting,
        admin::read_audit_logs,
        admin::sensor_analytics,
        root,
        health,
    ),
    components(schemas(
        Sensor,
        SensorCreate,
        Measurement,
        MeasurementCreate,
        Alert,
        AlertSeverity,
        AssignAlert,
        User,
        UserRole,
        UserCreate,
        LoginForm,
        TokenResponse,
        SystemSetting,
        AuditLog,
        SensorAnalytics,
        AnalyticsSummary,
        Averages,
        NoData,
    )),
    tags(
        (name = "sensors",        description = "Sensor registration and reading ingestion"),
        (name = "measurements",   description = "Stored measurements"),
        (name = "alerts",         description = "Threshold alerts"),
        (name = "users",          description = "Users and authentication"),
        (name = "administration", description = "Settings, audit trail and analytics"),
        (name = "system",         description = "System endpoints"),
    ),
    info(
        title = "CleanOffice API",
        version = "0.1.0",
        description = "API for CleanOffice Air Quality Monitoring System"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
