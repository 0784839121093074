// Garden Server - Error types
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for the server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use garden::{QueryError, StoreError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::metrics::QueryOutcome;
use crate::replay::ReplayError;

/// Startup errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Store could not be opened.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Replay capture could not be loaded.
    #[error("Replay error: {0}")]
    Replay(#[from] ReplayError),

    /// Simulated sensor could not be configured.
    #[cfg(feature = "simulate")]
    #[error("Simulation error: {0}")]
    Simulation(#[from] garden_sim::SimError),

    /// Listener could not be bound or served.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Request errors, rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required parameters: startDate, endDate, sensorType")]
    MissingParameters,

    #[error("Invalid sensor type")]
    InvalidSensorType,

    #[error("Invalid date for {name}: {value}")]
    InvalidDate { name: &'static str, value: String },

    #[error("Invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },

    /// Details are logged, never returned.
    #[error("Internal server error")]
    Internal(#[source] StoreError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Metrics outcome label for this error.
    pub fn outcome(&self) -> QueryOutcome {
        match self {
            ApiError::Internal(_) => QueryOutcome::ServerError,
            _ => QueryOutcome::ClientError,
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidChannel(_) => ApiError::InvalidSensorType,
            QueryError::InvalidGranularity(value) => ApiError::InvalidParameter {
                name: "interval",
                value,
            },
            QueryError::StoreUnavailable(e) => ApiError::Internal(e),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref source) = self {
            error!("Query failed: {}", source);
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_mapping() {
        let invalid: ApiError = QueryError::InvalidChannel("x".to_string()).into();
        assert!(matches!(invalid, ApiError::InvalidSensorType));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let store: ApiError =
            QueryError::StoreUnavailable(StoreError::Unavailable("down".to_string())).into();
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.outcome(), QueryOutcome::ServerError);
        // Store details never reach the client
        assert_eq!(store.to_string(), "Internal server error");
    }
}
