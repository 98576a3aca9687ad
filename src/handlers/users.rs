// src/handlers/users.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{LoginRequest, RenameRequest, User},
};

const USER_COLUMNS: &str = "id, user_code, name, password, is_admin, score, latest_quiz_at";

/// Logs a user in by display name, registering the name on first use.
///
/// Registration is idempotent per name: a second login with the same name
/// returns the existing record. New users start with score 0 and a freshly
/// generated user code.
pub async fn login(
    State(pool): State<SqlitePool>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name must not be empty".to_string()));
    }

    let existing = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE name = ?"
    ))
    .bind(&name)
    .fetch_optional(&pool)
    .await?;

    if let Some(user) = existing {
        return Ok(Json(user));
    }

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (user_code, name) VALUES (?, ?) RETURNING {USER_COLUMNS}"
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(&name)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to register user: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!("Registered new user '{}'", user.name);

    Ok(Json(user))
}

/// Fetches a single user by id.
pub async fn get_user(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Changes a user's display name.
///
/// The distinguished admin identity is protected: once a user has been
/// promoted, its name can no longer be changed.
pub async fn rename_user(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Path(id): Path<i64>,
    Json(payload): Json<RenameRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name must not be empty".to_string()));
    }

    let existing = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    if existing.is_admin && existing.user_code == config.admin_id {
        return Err(AppError::Forbidden(
            "The admin account cannot be renamed".to_string(),
        ));
    }

    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET name = ? WHERE id = ? RETURNING {USER_COLUMNS}"
    ))
    .bind(&name)
    .bind(id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(user))
}

/// Lists all non-admin users for the leaderboard.
///
/// Ordered by score descending; ties go to the user who reached the score
/// earlier (latest_quiz_at ascending).
pub async fn list_users(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE is_admin = FALSE \
         ORDER BY score DESC, latest_quiz_at ASC"
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(users))
}
