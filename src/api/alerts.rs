use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;

use super::{
    dto::{AssignAlert, Pagination},
    errors::AppError,
    AppState,
};
use crate::db::models::Alert;

const ALERT_COLUMNS: &str =
    "id, measurement_id, assigned_to_id, message, severity, is_resolved, created_at";

async fn fetch_alert(state: &AppState, alert_id: i64) -> Result<Alert, AppError> {
    sqlx::query_as::<_, Alert>(&format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = $1"))
        .bind(alert_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Alert"))
}

/// List alerts, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/alerts/",
    params(Pagination),
    responses(
        (status = 200, description = "Alerts", body = Vec<Alert>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "alerts"
)]
pub async fn read_alerts(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Alert>>, AppError> {
    let (offset, limit) = page.resolve(50);
    let rows = sqlx::query_as::<_, Alert>(&format!(
        "SELECT {ALERT_COLUMNS} FROM alerts ORDER BY created_at DESC, id DESC OFFSET $1 LIMIT $2"
    ))
    .bind(offset)
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/v1/alerts/{alert_id}",
    params(("alert_id" = i64, Path, description = "Alert ID")),
    responses(
        (status = 200, description = "Alert", body = Alert),
        (status = 404, description = "Alert not found"),
    ),
    tag = "alerts"
)]
pub async fn read_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<i64>,
) -> Result<Json<Alert>, AppError> {
    Ok(Json(fetch_alert(&state, alert_id).await?))
}

/// Mark an alert as resolved. Resolving twice is a no-op.
#[utoipa::path(
    patch,
    path = "/api/v1/alerts/{alert_id}/resolve",
    params(("alert_id" = i64, Path, description = "Alert ID")),
    responses(
        (status = 200, description = "Resolved alert", body = Alert),
        (status = 404, description = "Alert not found"),
    ),
    tag = "alerts"
)]
pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<i64>,
) -> Result<Json<Alert>, AppError> {
    let alert = sqlx::query_as::<_, Alert>(&format!(
        "UPDATE alerts SET is_resolved = TRUE WHERE id = $1 RETURNING {ALERT_COLUMNS}"
    ))
    .bind(alert_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::not_found("Alert"))?;

    info!(alert_id, "Alert resolved");
    Ok(Json(alert))
}

/// Assign an alert to a user.
#[utoipa::path(
    patch,
    path = "/api/v1/alerts/{alert_id}/assign",
    params(("alert_id" = i64, Path, description = "Alert ID")),
    request_body = AssignAlert,
    responses(
        (status = 200, description = "Assigned alert", body = Alert),
        (status = 404, description = "Alert or user not found"),
    ),
    tag = "alerts"
)]
pub async fn assign_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<i64>,
    Json(body): Json<AssignAlert>,
) -> Result<Json<Alert>, AppError> {
    // Alert first so an unknown alert reports as such even with a bad user.
    fetch_alert(&state, alert_id).await?;

    let user_exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
        .bind(body.user_id)
        .fetch_one(&state.pool)
        .await?;
    if !user_exists {
        return Err(AppError::not_found("User"));
    }

    let alert = sqlx::query_as::<_, Alert>(&format!(
        "UPDATE alerts SET assigned_to_id = $2 WHERE id = $1 RETURNING {ALERT_COLUMNS}"
    ))
    .bind(alert_id)
    .bind(body.user_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::not_found("Alert"))?;

    info!(alert_id, user_id = body.user_id, "Alert assigned");
    Ok(Json(alert))
}
