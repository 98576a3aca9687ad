// src/models/problem.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'problems' table in the database.
///
/// The question payload is stored in its textual JSON encoding and only
/// deserialized on the way out (see `QuestionBody`).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Problem {
    pub id: i64,

    /// Calendar date 'YYYY-MM-DD'. One problem per date; the natural key
    /// used by the API.
    pub date: String,

    /// Question payload in its stored textual encoding.
    pub question: String,

    /// 1-based index of the correct option.
    pub answer: i64,
}

/// One option of a multiple-choice question. Either field may be absent,
/// but a usable option carries at least one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Data-URI image, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Structured form of the question payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub options: Vec<QuestionOption>,
}

/// A question as it appears in API responses: structured when the stored
/// text parses, otherwise the raw text passed through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionBody {
    Structured(QuestionPayload),
    Raw(String),
}

impl QuestionBody {
    /// Deserializes a stored question payload. Parse failures are tolerated:
    /// the raw text is kept and a warning logged, the listing never fails.
    pub fn from_stored(raw: String, date: &str) -> Self {
        match serde_json::from_str::<QuestionPayload>(&raw) {
            Ok(payload) => QuestionBody::Structured(payload),
            Err(err) => {
                tracing::warn!("Question payload for problem {} is not valid JSON: {}", date, err);
                QuestionBody::Raw(raw)
            }
        }
    }
}

/// Represents the 'solvers' table: one user's recorded attempt at one
/// problem.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Solver {
    pub user_id: i64,
    /// Name snapshot taken at solve time.
    pub name: String,
    pub is_correct: bool,
    pub solved_at: chrono::DateTime<chrono::Utc>,
}

/// A solver row joined with its owning problem id, for grouping.
#[derive(Debug, FromRow)]
pub struct SolverRow {
    pub problem_id: i64,
    pub user_id: i64,
    pub name: String,
    pub is_correct: bool,
    pub solved_at: chrono::DateTime<chrono::Utc>,
}

/// Problem as returned by the API: question deserialized, solver list
/// attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemResponse {
    pub id: i64,
    pub date: String,
    pub question: QuestionBody,
    pub answer: i64,
    pub solvers: Vec<Solver>,
}

/// DTO for creating a new daily problem.
///
/// Fields are optional at the serde level so that an absent field surfaces
/// as a 400 from the handler rather than a body-rejection from the
/// framework.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CreateProblemRequest {
    #[validate(custom(function = validate_date))]
    pub date: Option<String>,
    /// Question payload in its textual encoding, stored as-is.
    #[validate(length(min = 1, message = "Question must not be empty."))]
    pub question: Option<String>,
    #[validate(range(min = 1, message = "Answer index is 1-based."))]
    pub answer: Option<i64>,
}

fn validate_date(date: &str) -> Result<(), validator::ValidationError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| validator::ValidationError::new("date_must_be_yyyy_mm_dd"))
}

/// DTO for submitting an answer to a problem.
#[derive(Debug, Serialize, Deserialize)]
pub struct SolveRequest {
    pub user_id: i64,
    /// Selected option, 1-based.
    pub answer: i64,
}

/// Outcome of a solve attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveResponse {
    pub success: bool,
    pub is_correct: bool,
    pub new_score: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_question_parses_to_structured_form() {
        let raw = r#"{"text":"2+2?","options":[{"text":"3"},{"text":"4"}]}"#;
        match QuestionBody::from_stored(raw.to_string(), "2024-01-01") {
            QuestionBody::Structured(payload) => {
                assert_eq!(payload.text.as_deref(), Some("2+2?"));
                assert!(payload.image.is_none());
                assert_eq!(payload.options.len(), 2);
                assert_eq!(payload.options[1].text.as_deref(), Some("4"));
            }
            QuestionBody::Raw(_) => panic!("expected structured payload"),
        }
    }

    #[test]
    fn malformed_question_is_passed_through_raw() {
        let raw = "not json at all";
        match QuestionBody::from_stored(raw.to_string(), "2024-01-01") {
            QuestionBody::Raw(text) => assert_eq!(text, raw),
            QuestionBody::Structured(_) => panic!("expected raw passthrough"),
        }
    }

    #[test]
    fn create_problem_request_rejects_bad_date() {
        let req = CreateProblemRequest {
            date: Some("January 1st".to_string()),
            question: Some(r#"{"options":[]}"#.to_string()),
            answer: Some(1),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn create_problem_request_rejects_zero_answer() {
        let req = CreateProblemRequest {
            date: Some("2024-01-01".to_string()),
            question: Some(r#"{"options":[]}"#.to_string()),
            answer: Some(0),
        };
        assert!(req.validate().is_err());
    }
}
