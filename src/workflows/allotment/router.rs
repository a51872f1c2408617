use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::allocator::{AllotmentEvent, AllotmentRunResult, RunState};
use super::domain::Allotment;
use super::registration::{RoomRegistration, StudentRegistration};
use super::repository::{HostelRepository, RepositoryError};
use super::service::{AllotmentService, AllotmentServiceError};

/// Router builder exposing allotment runs, registration and status lookups.
pub fn allotment_router<R>(service: Arc<AllotmentService<R>>) -> Router
where
    R: HostelRepository + 'static,
{
    Router::new()
        .route("/api/v1/allotments/runs", post(run_handler::<R>))
        .route("/api/v1/students", post(register_student_handler::<R>))
        .route(
            "/api/v1/students/:registration_id/allotment",
            get(student_allotment_handler::<R>),
        )
        .route("/api/v1/rooms", post(register_room_handler::<R>))
        .route("/api/v1/roster", get(roster_handler::<R>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunRequest {
    #[serde(default)]
    pub category_cutoff: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RunResponse {
    state: RunState,
    category_cutoff: usize,
    eligible: usize,
    unallotted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
    new_allotments: Vec<Allotment>,
    events: Vec<AllotmentEvent>,
    messages: Vec<String>,
}

impl From<AllotmentRunResult> for RunResponse {
    fn from(result: AllotmentRunResult) -> Self {
        Self {
            state: result.state,
            category_cutoff: result.category_cutoff,
            eligible: result.eligible,
            unallotted: result.unallotted(),
            warning: result.warning().map(|warning| warning.to_string()),
            messages: result.events.iter().map(AllotmentEvent::message).collect(),
            new_allotments: result.new_allotments,
            events: result.events,
        }
    }
}

pub(crate) async fn run_handler<R>(
    State(service): State<Arc<AllotmentService<R>>>,
    body: Bytes,
) -> Response
where
    R: HostelRepository + 'static,
{
    let request = match parse_run_request(&body) {
        Ok(request) => request,
        Err(err) => {
            let payload = json!({
                "error": format!("invalid run request: {err}"),
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
    };
    let cutoff = request
        .category_cutoff
        .unwrap_or(service.policy().category_cutoff);

    // Runs hold a blocking lock for their whole duration.
    let outcome = tokio::task::spawn_blocking(move || service.run_allotment(cutoff)).await;

    match outcome {
        Ok(Ok(result)) => (StatusCode::OK, axum::Json(RunResponse::from(result))).into_response(),
        Ok(Err(error)) => error_response(error),
        Err(join_error) => {
            let payload = json!({
                "error": format!("allotment run did not finish: {join_error}"),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

/// An empty body means "use the configured cutoff"; anything else must parse.
fn parse_run_request(body: &[u8]) -> Result<RunRequest, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RunRequest::default());
    }
    serde_json::from_slice(body)
}

pub(crate) async fn register_student_handler<R>(
    State(service): State<Arc<AllotmentService<R>>>,
    axum::Json(registration): axum::Json<StudentRegistration>,
) -> Response
where
    R: HostelRepository + 'static,
{
    match service.register_student(registration) {
        Ok(student) => (StatusCode::CREATED, axum::Json(student)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn register_room_handler<R>(
    State(service): State<Arc<AllotmentService<R>>>,
    axum::Json(registration): axum::Json<RoomRegistration>,
) -> Response
where
    R: HostelRepository + 'static,
{
    match service.register_room(registration) {
        Ok(room) => (StatusCode::CREATED, axum::Json(room)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn student_allotment_handler<R>(
    State(service): State<Arc<AllotmentService<R>>>,
    Path(registration_id): Path<String>,
) -> Response
where
    R: HostelRepository + 'static,
{
    match service.student_allotment(&registration_id) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(AllotmentServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "error": "student record not found",
                "registration_id": registration_id,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn roster_handler<R>(State(service): State<Arc<AllotmentService<R>>>) -> Response
where
    R: HostelRepository + 'static,
{
    match service.roster() {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: AllotmentServiceError) -> Response {
    let status = match &error {
        AllotmentServiceError::InvalidCutoff | AllotmentServiceError::Registration(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AllotmentServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        AllotmentServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AllotmentServiceError::Repository(RepositoryError::Unavailable(_))
        | AllotmentServiceError::Allotment(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
