//! Errors surfaced by user actions.

use crate::store::StoreError;
use crate::sync::MigrationError;
use crate::sync::auth::AuthError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Migration(#[from] MigrationError),
}

impl AppError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }
}

pub type AppResult<T> = Result<T, AppError>;
