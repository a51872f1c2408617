use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::allotment::{AllotmentServiceError, RepositoryError};
use crate::workflows::roster::RosterImportError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Roster(RosterImportError),
    Allotment(AllotmentServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Roster(err) => write!(f, "roster import error: {}", err),
            AppError::Allotment(err) => write!(f, "allotment error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Roster(err) => Some(err),
            AppError::Allotment(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Roster(_)
            | AppError::Allotment(AllotmentServiceError::InvalidCutoff)
            | AppError::Allotment(AllotmentServiceError::Registration(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Allotment(AllotmentServiceError::Repository(RepositoryError::Conflict)) => {
                StatusCode::CONFLICT
            }
            AppError::Allotment(AllotmentServiceError::Repository(RepositoryError::NotFound)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Allotment(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<RosterImportError> for AppError {
    fn from(value: RosterImportError) -> Self {
        Self::Roster(value)
    }
}

impl From<AllotmentServiceError> for AppError {
    fn from(value: AllotmentServiceError) -> Self {
        Self::Allotment(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_and_bad_input_map_to_client_statuses() {
        let conflict = AppError::from(AllotmentServiceError::Repository(
            RepositoryError::Conflict,
        ));
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);

        let cutoff = AppError::from(AllotmentServiceError::InvalidCutoff);
        assert_eq!(cutoff.into_response().status(), StatusCode::BAD_REQUEST);

        let outage = AppError::from(AllotmentServiceError::Repository(
            RepositoryError::Unavailable("offline".to_string()),
        ));
        assert_eq!(
            outage.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
