// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage-level error. Not-found is distinguishable from every other
//! failure at this layer so callers can map it to a 404 without
//! string-matching.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("migration failed at version {version}: {source}")]
    Migration { version: i64, source: rusqlite::Error },

    #[error("storage task panicked: {0}")]
    TaskJoin(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for sg_core::AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => sg_core::AppError::NotFound(msg),
            other => sg_core::AppError::Internal(other.to_string()),
        }
    }
}