use std::io::Error as IoError;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use sitewatch_service::config::ConfigError;
use sitewatch_service::database::RegistryError;
use sitewatch_service::validation::ValidationError;

/// Startup and shutdown failures of the server binary
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Address parsing error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Scheduler task failed: {0}")]
    Scheduler(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Startup(#[from] anyhow::Error),
}

/// Request failures, rendered as `{"detail": "..."}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0} URL already exists")]
    Duplicate(&'static str),
    #[error("Storage error: {0}")]
    Registry(#[from] RegistryError),
}

impl ApiError {
    /// Attach the kind of record to the registry's not-found and conflict errors
    pub fn for_record(kind: &'static str) -> impl Fn(RegistryError) -> ApiError {
        move |error| match error {
            RegistryError::NotFound => ApiError::NotFound(kind),
            RegistryError::Conflict => ApiError::Duplicate(kind),
            other => ApiError::Registry(other),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::Duplicate(_)
            | ApiError::Registry(RegistryError::Conflict | RegistryError::OutOfRange(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) | ApiError::Registry(RegistryError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            tracing::error!("Request failed: {self}");
        }
        HttpResponse::build(self.status_code()).json(json!({ "detail": self.to_string() }))
    }
}
