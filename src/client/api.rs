// src/client/api.rs

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::fmt;

use crate::models::{
    problem::{ProblemResponse, QuestionPayload, SolveResponse},
    user::User,
};

/// Error surfaced by a `QuizApi` call.
#[derive(Debug)]
pub enum ApiError {
    /// The request never produced a usable response (network, decode).
    Transport(String),

    /// The service answered with an error status and message.
    Api { status: u16, message: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(msg) => write!(f, "transport error: {}", msg),
            ApiError::Api { status, message } => write!(f, "{} ({})", message, status),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

/// The quiz service operations, as seen from the client.
#[async_trait]
pub trait QuizApi: Send + Sync {
    async fn login(&self, name: &str) -> Result<User, ApiError>;
    async fn get_user(&self, id: i64) -> Result<User, ApiError>;
    async fn rename_user(&self, id: i64, name: &str) -> Result<User, ApiError>;
    async fn authenticate_admin(
        &self,
        id: &str,
        password: &str,
        current_user_id: i64,
    ) -> Result<User, ApiError>;
    async fn list_users(&self) -> Result<Vec<User>, ApiError>;
    async fn list_problems(&self) -> Result<Vec<ProblemResponse>, ApiError>;
    async fn create_problem(
        &self,
        date: &str,
        question: &QuestionPayload,
        answer: i64,
    ) -> Result<ProblemResponse, ApiError>;
    async fn delete_problem(&self, date: &str) -> Result<(), ApiError>;
    async fn submit_answer(
        &self,
        date: &str,
        user_id: i64,
        answer: i64,
    ) -> Result<SolveResponse, ApiError>;
}

/// `QuizApi` over HTTP, against a running backend.
#[derive(Clone)]
pub struct HttpQuizApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpQuizApi {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:5000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }
}

/// Decodes a response body, turning error statuses into `ApiError::Api`
/// with the service's `{"error": ...}` message when present.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response.json::<T>().await?)
    } else {
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body.get("error")?.as_str().map(str::to_string))
            .unwrap_or_else(|| status.to_string());
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl QuizApi for HttpQuizApi {
    async fn login(&self, name: &str) -> Result<User, ApiError> {
        let response = self
            .http
            .post(self.url("/users/login"))
            .json(&json!({ "name": name }))
            .send()
            .await?;
        decode(response).await
    }

    async fn get_user(&self, id: i64) -> Result<User, ApiError> {
        let response = self.http.get(self.url(&format!("/users/{}", id))).send().await?;
        decode(response).await
    }

    async fn rename_user(&self, id: i64, name: &str) -> Result<User, ApiError> {
        let response = self
            .http
            .put(self.url(&format!("/users/{}", id)))
            .json(&json!({ "name": name }))
            .send()
            .await?;
        decode(response).await
    }

    async fn authenticate_admin(
        &self,
        id: &str,
        password: &str,
        current_user_id: i64,
    ) -> Result<User, ApiError> {
        let response = self
            .http
            .post(self.url("/admin/auth"))
            .json(&json!({
                "id": id,
                "password": password,
                "current_user_id": current_user_id,
            }))
            .send()
            .await?;
        decode(response).await
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let response = self.http.get(self.url("/users")).send().await?;
        decode(response).await
    }

    async fn list_problems(&self) -> Result<Vec<ProblemResponse>, ApiError> {
        let response = self.http.get(self.url("/problems")).send().await?;
        decode(response).await
    }

    async fn create_problem(
        &self,
        date: &str,
        question: &QuestionPayload,
        answer: i64,
    ) -> Result<ProblemResponse, ApiError> {
        // The payload travels in its textual encoding; the service stores it
        // as-is and deserializes it on listing.
        let encoded = serde_json::to_string(question)?;
        let response = self
            .http
            .post(self.url("/problems"))
            .json(&json!({
                "date": date,
                "question": encoded,
                "answer": answer,
            }))
            .send()
            .await?;
        decode(response).await
    }

    async fn delete_problem(&self, date: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url(&format!("/problems/{}", date)))
            .send()
            .await?;
        decode::<serde_json::Value>(response).await.map(|_| ())
    }

    async fn submit_answer(
        &self,
        date: &str,
        user_id: i64,
        answer: i64,
    ) -> Result<SolveResponse, ApiError> {
        let response = self
            .http
            .post(self.url(&format!("/problems/{}/solve", date)))
            .json(&json!({ "user_id": user_id, "answer": answer }))
            .send()
            .await?;
        decode(response).await
    }
}
