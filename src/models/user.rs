// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Opaque user code generated at registration.
    /// Overwritten with the configured admin id on promotion.
    pub user_code: String,

    /// Display name. Lookup-by-name is the login mechanism, so two people
    /// entering the same name share one identity.
    pub name: String,

    /// Only ever set to the static admin password on promotion.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: Option<String>,

    pub is_admin: bool,

    /// Total correct answers, one point each.
    pub score: i64,

    /// When the user last answered correctly. Breaks leaderboard ties in
    /// favor of the earlier solver.
    pub latest_quiz_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for logging in (registers the name on first use).
/// An absent name defaults to empty and is rejected by the handler.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(max = 50, message = "Name must be at most 50 characters."))]
    pub name: String,
}

/// DTO for changing the display name.
#[derive(Debug, Deserialize, Validate)]
pub struct RenameRequest {
    #[serde(default)]
    #[validate(length(max = 50, message = "Name must be at most 50 characters."))]
    pub name: String,
}

/// DTO for the admin credential form.
#[derive(Debug, Deserialize)]
pub struct AdminAuthRequest {
    pub id: String,
    pub password: String,
    /// The logged-in user to promote on a successful match.
    pub current_user_id: i64,
}
