pub mod admin;
pub mod alerts;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod users;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    auth::TokenSettings,
    db::store::PgStore,
    sensors::SensorService,
};
use handlers::ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tokens: Arc<TokenSettings>,
}

impl AppState {
    pub fn new(pool: PgPool, tokens: TokenSettings) -> Self {
        Self {
            pool,
            tokens: Arc::new(tokens),
        }
    }

    pub fn sensor_service(&self) -> SensorService<PgStore> {
        SensorService::new(PgStore::new(self.pool.clone()))
    }
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route(
            "/api/v1/sensors/",
            get(handlers::read_sensors).post(handlers::create_sensor),
        )
        .route("/api/v1/sensors/{sensor_id}", get(handlers::read_sensor))
        .route(
            "/api/v1/sensors/{sensor_id}/measurements",
            post(handlers::create_measurement),
        )
        .route("/api/v1/measurements/", get(handlers::read_measurements))
        .route("/api/v1/alerts/", get(alerts::read_alerts))
        .route("/api/v1/alerts/{alert_id}", get(alerts::read_alert))
        .route("/api/v1/alerts/{alert_id}/resolve", patch(alerts::resolve_alert))
        .route("/api/v1/alerts/{alert_id}/assign", patch(alerts::assign_alert))
        .route(
            "/api/v1/users/",
            get(users::read_users).post(users::create_user),
        )
        .route("/api/v1/users/{user_id}", get(users::read_user))
        .route("/api/v1/login", post(users::login))
        .route("/api/v1/admin/settings/", get(admin::read_settings))
        .route("/api/v1/admin/settings/{key}", patch(admin::update_setting))
        .route("/api/v1/admin/audit-logs/", get(admin::read_audit_logs))
        .route(
            "/api/v1/admin/analytics/sensors/{sensor_id}",
            get(admin::sensor_analytics),
        )
        .with_state(state)
        .split_for_parts();

    router
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
}
