//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use kanflow_app::dispatcher::DispatchError;
use kanflow_domain::error::KanflowError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps application failures to an HTTP response with an appropriate status code.
#[derive(Debug)]
pub enum ApiError {
    Domain(KanflowError),
    Dispatch(DispatchError),
}

impl From<KanflowError> for ApiError {
    fn from(err: KanflowError) -> Self {
        Self::Domain(err)
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        Self::Dispatch(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Domain(KanflowError::Validation(err)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Self::Domain(KanflowError::Configuration(err)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Self::Domain(KanflowError::NotFound(err)) => (StatusCode::NOT_FOUND, err.to_string()),
            Self::Domain(KanflowError::Storage(err)) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            Self::Dispatch(err) => {
                tracing::warn!(error = %err, "event rejected");
                (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanflow_domain::error::{NotFoundError, ValidationError};

    #[test]
    fn should_map_validation_error_to_bad_request() {
        let response = ApiError::from(KanflowError::from(ValidationError::EmptyName)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn should_map_missing_record_to_not_found() {
        let err = KanflowError::from(NotFoundError {
            entity: "AutomationRule",
            id: "42".to_string(),
        });
        assert_eq!(ApiError::from(err).into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn should_hide_storage_details() {
        let err = KanflowError::Storage("disk on fire".into());
        assert_eq!(
            ApiError::from(err).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn should_map_full_queue_to_service_unavailable() {
        let response = ApiError::from(DispatchError::QueueFull).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
