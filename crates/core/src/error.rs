// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain error kinds shared across every crate.
//!
//! Kinds are semantic, not type hierarchies: the HTTP boundary in
//! `sg-server` maps each variant to a status code; nothing else in the
//! workspace should need to pattern-match on error *strings*.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("render service unreachable: {0}")]
    RenderServiceUnreachable(String),

    #[error("render service error: {0}")]
    RenderServiceError(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("item timed out waiting for progress")]
    ItemTimeout,

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code, used in item `errorMessage` prefixes
    /// and in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationFailed(_) => "validation_failed",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::RenderServiceUnreachable(_) => "render_service_unreachable",
            AppError::RenderServiceError(_) => "render_service_error",
            AppError::MalformedResponse(_) => "malformed_response",
            AppError::ItemTimeout => "item_timeout",
            AppError::Internal(_) => "internal",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_stable_per_variant() {
        assert_eq!(AppError::NotFound("x".into()).code(), "not_found");
        assert_eq!(AppError::ItemTimeout.code(), "item_timeout");
    }
}