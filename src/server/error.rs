use axum::extract::rejection::JsonRejection;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Every failure a handler can end with. The display text is the public message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request")]
    BadRequest,
    #[error("not found")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("request timed out")]
    RequestTimeout,
    #[error("could not process the request")]
    Unprocessable,
    /// Details are logged, never sent to the client
    #[error("internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn from_status(status: StatusCode) -> Option<Self> {
        match status {
            StatusCode::BAD_REQUEST => Some(ApiError::BadRequest),
            StatusCode::NOT_FOUND => Some(ApiError::NotFound),
            StatusCode::METHOD_NOT_ALLOWED => Some(ApiError::MethodNotAllowed),
            StatusCode::REQUEST_TIMEOUT => Some(ApiError::RequestTimeout),
            StatusCode::UNPROCESSABLE_ENTITY => Some(ApiError::Unprocessable),
            StatusCode::INTERNAL_SERVER_ERROR => Some(ApiError::Internal(anyhow::anyhow!(
                "service responded with a bare {status}"
            ))),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::Internal(error.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {rejection}");
        ApiError::BadRequest
    }
}

#[derive(Serialize, Debug)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: u16,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(error) = &self {
            tracing::error!("Request failed: {error:#}");
        }
        let status = self.status_code();
        let envelope = ErrorEnvelope {
            success: false,
            error: status.as_u16(),
            message: self.to_string(),
        };
        (status, Json(envelope)).into_response()
    }
}

/// Wraps error statuses produced outside of handlers (unmatched methods,
/// timeouts, extractor rejections) into the same envelope handlers use.
pub async fn envelope_errors(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|value| value.as_bytes().starts_with(b"application/json"));
    if is_json {
        return response;
    }
    match ApiError::from_status(response.status()) {
        Some(error) => error.into_response(),
        None => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::NOT_FOUND,
            StatusCode::METHOD_NOT_ALLOWED,
            StatusCode::REQUEST_TIMEOUT,
            StatusCode::UNPROCESSABLE_ENTITY,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            assert_eq!(ApiError::from_status(status).unwrap().status_code(), status);
        }
        assert!(ApiError::from_status(StatusCode::UNSUPPORTED_MEDIA_TYPE).is_none());
    }

    #[test]
    fn internal_errors_hide_details() {
        let error = ApiError::from(sqlx::Error::RowNotFound);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.to_string(), "internal server error");
    }

    #[test]
    fn messages_are_fixed_per_code() {
        assert_eq!(ApiError::NotFound.to_string(), "not found");
        assert_eq!(ApiError::Unprocessable.to_string(), "could not process the request");
        assert_eq!(ApiError::RequestTimeout.to_string(), "request timed out");
    }

    #[tokio::test]
    async fn bare_error_statuses_get_an_envelope() {
        let response = envelope_errors(StatusCode::METHOD_NOT_ALLOWED.into_response()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], 405);
        assert_eq!(body["message"], "method not allowed");
    }

    #[tokio::test]
    async fn successful_responses_pass_through() {
        let response = envelope_errors((StatusCode::OK, "OK").into_response()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
