use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;

use fitlingo_core::plan::PlanProgress;
use fitlingo_core::service::{RegisterError, register_user};
use fitlingo_core::{GenerationError, PlanGenerator, UserStore};
use fitlingo_db::StoreError;
use fitlingo_db::models::{UpdateOutcome, User};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    raw: Option<String>,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
            raw: None,
        }
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
            raw: None,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => {
                tracing::error!(error = %e, "database error");
                Self::internal(e)
            }
            other => Self::bad_request(other.to_string()),
        }
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: err.error,
            raw: Some(err.raw),
        }
    }
}

impl From<RegisterError> for AppError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::Validation(e) => Self::bad_request(e.to_string()),
            RegisterError::Store(e) => e.into(),
            RegisterError::Generation(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = match self.raw {
            Some(raw) => json!({ "error": self.message, "raw": raw }),
            None => json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteDayRequest {
    username: String,
    day_no: i64,
}

#[derive(Debug, Deserialize)]
pub struct CompleteWorkoutRequest {
    username: String,
    day_no: i64,
    workout_no: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub plan: Value,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub username: String,
    #[serde(flatten)]
    pub progress: PlanProgress,
}

const NO_CHANGE: &str = "no change was made";

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub planner: PlanGenerator,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/register", post(register))
        .route("/getuser", get(get_user))
        .route("/search", get(search))
        .route("/complete-day", post(complete_day))
        .route("/complete-exercise", post(complete_exercise))
        .route("/progress", get(progress))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("fitlingo serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("fitlingo serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index() -> Json<Value> {
    Json(json!({ "msg": "fitlingo" }))
}

async fn register(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RegisterResponse>, AppError> {
    let Json(document) = body?;
    let registration = register_user(state.store.as_ref(), &state.planner, &document).await?;
    Ok(Json(RegisterResponse {
        message: format!("user '{}' registered", registration.user.username),
        plan: registration.plan,
    }))
}

async fn get_user(
    State(state): State<AppState>,
    query: Result<Query<UsernameQuery>, QueryRejection>,
) -> Result<Json<User>, AppError> {
    let username = required(query?.0.username, "username")?;
    let user = state
        .store
        .find_user(&username)
        .await?
        .ok_or_else(|| AppError::bad_request(format!("no user by name {username}")))?;
    Ok(Json(user))
}

async fn search(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<User>>, AppError> {
    let pattern = required(query?.0.query, "query")?;
    let users = state.store.search_users(&pattern).await?;
    Ok(Json(users))
}

async fn complete_day(
    State(state): State<AppState>,
    body: Result<Json<CompleteDayRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(request) = body?;
    let day_no = position(request.day_no, "day_no")?;

    let outcome = state
        .store
        .mark_day_completed(&request.username, day_no)
        .await?;
    tracing::info!(username = %request.username, day_no, ?outcome, "day completion");

    Ok(Json(message_for(
        outcome,
        format!("day {day_no} marked completed for {}", request.username),
    )))
}

async fn complete_exercise(
    State(state): State<AppState>,
    body: Result<Json<CompleteWorkoutRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(request) = body?;
    let day_no = position(request.day_no, "day_no")?;
    let workout_no = position(request.workout_no, "workout_no")?;

    let outcome = state
        .store
        .mark_workout_completed(&request.username, day_no, workout_no)
        .await?;
    tracing::info!(username = %request.username, day_no, workout_no, ?outcome, "workout completion");

    Ok(Json(message_for(
        outcome,
        format!(
            "day {day_no} workout {workout_no} marked completed for {}",
            request.username
        ),
    )))
}

async fn progress(
    State(state): State<AppState>,
    query: Result<Query<UsernameQuery>, QueryRejection>,
) -> Result<Json<ProgressResponse>, AppError> {
    let username = required(query?.0.username, "username")?;
    let user = state
        .store
        .find_user(&username)
        .await?
        .ok_or_else(|| AppError::bad_request(format!("no user by name {username}")))?;

    let progress = user
        .plan
        .as_ref()
        .map(PlanProgress::from_plan)
        .unwrap_or_default();
    Ok(Json(ProgressResponse { username, progress }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::bad_request(format!("missing query parameter '{name}'")))
}

/// Validate a 1-indexed position from a request body.
fn position(value: i64, name: &str) -> Result<u32, AppError> {
    u32::try_from(value)
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| AppError::bad_request(format!("{name} must be a positive integer")))
}

fn message_for(outcome: UpdateOutcome, updated: String) -> MessageResponse {
    let message = match outcome {
        UpdateOutcome::Updated => updated,
        UpdateOutcome::Unchanged => NO_CHANGE.to_owned(),
    };
    MessageResponse { message }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
