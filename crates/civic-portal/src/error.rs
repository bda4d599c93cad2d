use crate::config::ConfigError;
use crate::config::settings::SettingsError;
use crate::telemetry::TelemetryError;
use crate::workflows::housing::EligibilityConfigError;
use crate::workflows::zoning::WorkflowError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Top-level error for the service binary: everything that can take the
/// portal down or fail a request outside the workflow engine itself.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Settings(SettingsError),
    Eligibility(EligibilityConfigError),
    Telemetry(TelemetryError),
    Workflow(WorkflowError),
    Io(std::io::Error),
    Server(axum::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Settings(err) => write!(f, "settings error: {}", err),
            AppError::Eligibility(err) => write!(f, "eligibility config error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Workflow(err) => write!(f, "workflow error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Settings(err) => Some(err),
            AppError::Eligibility(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Workflow(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Settings(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Workflow(_) => StatusCode::CONFLICT,
            AppError::Config(_)
            | AppError::Eligibility(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
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

impl From<SettingsError> for AppError {
    fn from(value: SettingsError) -> Self {
        Self::Settings(value)
    }
}

impl From<EligibilityConfigError> for AppError {
    fn from(value: EligibilityConfigError) -> Self {
        Self::Eligibility(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<WorkflowError> for AppError {
    fn from(value: WorkflowError) -> Self {
        Self::Workflow(value)
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
