// src/handlers/admin.rs

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{config::Config, error::AppError, models::user::{AdminAuthRequest, User}};

/// Verifies the static admin credential pair and promotes the acting user.
///
/// On a match the acting user's record becomes the distinguished admin
/// identity: `is_admin` is set and the user code and password are
/// overwritten with the configured values. Promotion is permanent; there is
/// no demotion operation, and repeating the call is a no-op that returns
/// the same admin state.
pub async fn authenticate(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<AdminAuthRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.id != config.admin_id || payload.password != config.admin_password {
        return Err(AppError::AuthError(
            "Admin id or password does not match".to_string(),
        ));
    }

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET is_admin = TRUE, user_code = ?, password = ? WHERE id = ? \
         RETURNING id, user_code, name, password, is_admin, score, latest_quiz_at",
    )
    .bind(&config.admin_id)
    .bind(&config.admin_password)
    .bind(payload.current_user_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to promote user {}: {:?}", payload.current_user_id, e);
        AppError::from(e)
    })?
    .ok_or(AppError::NotFound("Current user not found".to_string()))?;

    tracing::info!("User {} promoted to admin", user.id);

    Ok(Json(user))
}
