use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;

use super::{
    dto::{AuditLogQuery, SettingUpdate},
    errors::AppError,
    AppState,
};
use crate::{
    db::models::{AuditLog, SystemSetting},
    sensors::SensorAnalytics,
};

pub const UPDATE_SETTING_ACTION: &str = "UPDATE_SETTING";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/admin/settings/",
    responses((status = 200, description = "All system settings", body = Vec<SystemSetting>)),
    tag = "administration"
)]
pub async fn read_settings(
    State(state): State<AppState>,
) -> Result<Json<Vec<SystemSetting>>, AppError> {
    let rows = sqlx::query_as::<_, SystemSetting>(
        "SELECT key, value, description, updated_at FROM system_settings ORDER BY key",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows))
}

/// Create or overwrite a setting and record the change in the audit trail.
///
/// Threshold changes take effect on the next ingested reading.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/settings/{key}",
    params(
        ("key" = String, Path, description = "Setting key"),
        SettingUpdate,
    ),
    responses(
        (status = 200, description = "Updated setting", body = SystemSetting),
        (status = 404, description = "User not found"),
    ),
    tag = "administration"
)]
pub async fn update_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(update): Query<SettingUpdate>,
) -> Result<Json<SystemSetting>, AppError> {
    let mut tx = state.pool.begin().await?;

    let admin_exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
        .bind(update.admin_id)
        .fetch_one(&mut *tx)
        .await?;
    if !admin_exists {
        return Err(AppError::not_found("User"));
    }

    let setting = sqlx::query_as::<_, SystemSetting>(
        r#"
        INSERT INTO system_settings (key, value)
        VALUES ($1, $2)
        ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()
        RETURNING key, value, description, updated_at
        "#,
    )
    .bind(&key)
    .bind(&update.value)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO audit_logs (user_id, action, target, details)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(update.admin_id)
    .bind(UPDATE_SETTING_ACTION)
    .bind(&key)
    .bind(format!("Value changed to {}", update.value))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(key = %key, value = %update.value, admin_id = update.admin_id, "Setting updated");
    Ok(Json(setting))
}

// ---------------------------------------------------------------------------
// Audit trail
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/admin/audit-logs/",
    params(AuditLogQuery),
    responses((status = 200, description = "Audit entries, newest first", body = Vec<AuditLog>)),
    tag = "administration"
)]
pub async fn read_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<Vec<AuditLog>>, AppError> {
    let limit = query.limit.unwrap_or(100).max(0);
    let rows = sqlx::query_as::<_, AuditLog>(
        r#"
        SELECT id, user_id, action, target, details, created_at
        FROM audit_logs
        ORDER BY created_at DESC, id DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows))
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

/// Averages over the sensor's last 24 hours of measurements.
#[utoipa::path(
    get,
    path = "/api/v1/admin/analytics/sensors/{sensor_id}",
    params(("sensor_id" = i64, Path, description = "Sensor ID")),
    responses(
        (status = 200, description = "Window summary or a no-data marker", body = SensorAnalytics),
        (status = 404, description = "Sensor not found"),
    ),
    tag = "administration"
)]
pub async fn sensor_analytics(
    State(state): State<AppState>,
    Path(sensor_id): Path<i64>,
) -> Result<Json<SensorAnalytics>, AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM sensors WHERE id = $1)")
        .bind(sensor_id)
        .fetch_one(&state.pool)
        .await?;
    if !exists {
        return Err(AppError::not_found("Sensor"));
    }

    let analytics = state.sensor_service().analytics(sensor_id).await?;
    Ok(Json(analytics))
}
