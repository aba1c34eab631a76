use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Form, Json,
};
use tracing::{info, warn};

use super::{
    dto::{LoginForm, Pagination, TokenResponse, UserCreate},
    errors::AppError,
    AppState,
};
use crate::{auth, db::models::User};

const USER_COLUMNS: &str = "id, username, password_hash, full_name, role, created_at";

async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(e.into()))
}

/// Register a user. The password is stored as an Argon2 hash.
#[utoipa::path(
    post,
    path = "/api/v1/users/",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Username already registered"),
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<UserCreate>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let password = body.password;
    let password_hash = run_blocking(move || auth::hash_password(&password)).await??;

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (username, password_hash, full_name, role)
        VALUES ($1, $2, $3, $4)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&body.username)
    .bind(&password_hash)
    .bind(&body.full_name)
    .bind(body.role)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::BadRequest("Username already registered".to_owned())
        }
        other => other.into(),
    })?;

    info!(user_id = user.id, username = %user.username, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/",
    params(Pagination),
    responses((status = 200, description = "Users", body = Vec<User>)),
    tag = "users"
)]
pub async fn read_users(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<User>>, AppError> {
    let (offset, limit) = page.resolve(100);
    let rows = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY id OFFSET $1 LIMIT $2"
    ))
    .bind(offset)
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    params(("user_id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn read_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(Json(user))
}

/// Exchange form-encoded credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Access token", body = TokenResponse),
        (status = 400, description = "Incorrect username or password"),
    ),
    tag = "users"
)]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, AppError> {
    let stored: Option<String> =
        sqlx::query_scalar("SELECT password_hash FROM users WHERE username = $1")
            .bind(&form.username)
            .fetch_optional(&state.pool)
            .await?;

    let verified = match stored {
        Some(hash) => {
            let password = form.password;
            run_blocking(move || auth::verify_password(&password, &hash)).await?
        }
        None => false,
    };
    if !verified {
        warn!(username = %form.username, "Rejected login");
        return Err(AppError::BadRequest("Incorrect username or password".to_owned()));
    }

    let access_token = auth::issue_token(&form.username, &state.tokens)?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_owned(),
    }))
}
