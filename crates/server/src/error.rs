// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps the shared domain error enum onto HTTP responses. This is the
//! only place in the workspace that knows about status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use sg_core::AppError;

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

/// Newtype so `sg-server` can provide its own `IntoResponse` for a
/// foreign type without violating the orphan rule.
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RenderServiceUnreachable(_) | AppError::RenderServiceError(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            AppError::ItemTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "internal error");
        }
        let body = ErrorBody { code: self.0.code(), message: self.0.to_string() };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let response = ApiError(AppError::NotFound("sample job x".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn conflict_maps_to_409() {
        let response = ApiError(AppError::Conflict("job running".into())).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
