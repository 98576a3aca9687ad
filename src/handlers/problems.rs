// src/handlers/problems.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        problem::{
            CreateProblemRequest, Problem, ProblemResponse, QuestionBody, Solver, SolveRequest,
            SolveResponse, SolverRow,
        },
        user::User,
    },
};

/// Lists all problems, newest date first, each with its solver list and the
/// question payload deserialized from its stored textual encoding.
pub async fn list_problems(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let problems = sqlx::query_as::<_, Problem>(
        "SELECT id, date, question, answer FROM problems ORDER BY date DESC",
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list problems: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let solver_rows = sqlx::query_as::<_, SolverRow>(
        "SELECT problem_id, user_id, name, is_correct, solved_at FROM solvers \
         ORDER BY solved_at ASC",
    )
    .fetch_all(&pool)
    .await?;

    let mut solvers_by_problem: HashMap<i64, Vec<Solver>> = HashMap::new();
    for row in solver_rows {
        solvers_by_problem
            .entry(row.problem_id)
            .or_default()
            .push(Solver {
                user_id: row.user_id,
                name: row.name,
                is_correct: row.is_correct,
                solved_at: row.solved_at,
            });
    }

    let response: Vec<ProblemResponse> = problems
        .into_iter()
        .map(|p| {
            let question = QuestionBody::from_stored(p.question, &p.date);
            ProblemResponse {
                id: p.id,
                date: p.date,
                question,
                answer: p.answer,
                solvers: solvers_by_problem.remove(&p.id).unwrap_or_default(),
            }
        })
        .collect();

    Ok(Json(response))
}

/// Creates a new daily problem.
///
/// The date is the unique key; inserting a second problem for the same date
/// is rejected with 409. No admin check happens at this layer, matching the
/// source design.
pub async fn create_problem(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateProblemRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let (Some(date), Some(question), Some(answer)) =
        (payload.date, payload.question, payload.answer)
    else {
        return Err(AppError::BadRequest(
            "date, question and answer are all required".to_string(),
        ));
    };

    let problem = sqlx::query_as::<_, Problem>(
        "INSERT INTO problems (date, question, answer) VALUES (?, ?, ?) \
         RETURNING id, date, question, answer",
    )
    .bind(&date)
    .bind(&question)
    .bind(answer)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("A problem already exists for {}", date))
        } else {
            tracing::error!("Failed to create problem: {:?}", e);
            AppError::from(e)
        }
    })?;

    let question = QuestionBody::from_stored(problem.question, &problem.date);
    let response = ProblemResponse {
        id: problem.id,
        date: problem.date,
        question,
        answer: problem.answer,
        solvers: Vec::new(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Deletes the problem for a given date. Solver records go with it.
pub async fn delete_problem(
    State(pool): State<SqlitePool>,
    Path(date): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM problems WHERE date = ?")
        .bind(&date)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete problem: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("No problem found for {}", date)));
    }

    Ok(Json(serde_json::json!({ "message": "Problem deleted" })))
}

/// Records a solve attempt and updates the score on a correct answer.
///
/// The duplicate-solve guard is the UNIQUE (problem_id, user_id) key: the
/// solver record is inserted with ON CONFLICT DO NOTHING, and zero affected
/// rows means this user already solved the problem. Under two concurrent
/// submissions exactly one insert wins. The insert and the score update
/// share one transaction, so a solver record never lands without its score
/// increment.
pub async fn submit_answer(
    State(pool): State<SqlitePool>,
    Path(date): Path<String>,
    Json(payload): Json<SolveRequest>,
) -> Result<impl IntoResponse, AppError> {
    let problem = sqlx::query_as::<_, Problem>(
        "SELECT id, date, question, answer FROM problems WHERE date = ?",
    )
    .bind(&date)
    .fetch_optional(&pool)
    .await?;

    let user = sqlx::query_as::<_, User>(
        "SELECT id, user_code, name, password, is_admin, score, latest_quiz_at \
         FROM users WHERE id = ?",
    )
    .bind(payload.user_id)
    .fetch_optional(&pool)
    .await?;

    let (Some(problem), Some(user)) = (problem, user) else {
        return Err(AppError::NotFound("Problem or user not found".to_string()));
    };

    let is_correct = payload.answer == problem.answer;
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        "INSERT INTO solvers (problem_id, user_id, name, is_correct, solved_at) \
         VALUES (?, ?, ?, ?, ?) \
         ON CONFLICT (problem_id, user_id) DO NOTHING",
    )
    .bind(problem.id)
    .bind(user.id)
    .bind(&user.name)
    .bind(is_correct)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    if inserted.rows_affected() == 0 {
        // Dropping the transaction rolls it back.
        return Err(AppError::BadRequest(
            "You have already solved this problem".to_string(),
        ));
    }

    let new_score = if is_correct {
        sqlx::query_scalar::<_, i64>(
            "UPDATE users SET score = score + 1, latest_quiz_at = ? WHERE id = ? RETURNING score",
        )
        .bind(now)
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await?
    } else {
        user.score
    };

    tx.commit().await?;

    Ok(Json(SolveResponse {
        success: true,
        is_correct,
        new_score,
    }))
}
