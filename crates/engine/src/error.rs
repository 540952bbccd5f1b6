//! The module contains the errors the engine can throw.
//!
//! Business-rule violations (`InvalidTransaction`), referential failures
//! against active rows (`UnknownAccount`/`UnknownCategory`), admin lookups
//! (`*NotFound`), duplicate ids (`AlreadyExists`) and lost races on the
//! active ledger version (`Conflict`) are separated so callers can map them
//! to distinct status codes.
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("Account `{0}` is not active.")]
    UnknownAccount(String),
    #[error("Category `{0}` is not active.")]
    UnknownCategory(String),
    #[error("Account `{0}` was not found.")]
    AccountNotFound(String),
    #[error("Category `{0}` was not found.")]
    CategoryNotFound(String),
    #[error("Group `{0}` was not found.")]
    GroupNotFound(String),
    #[error("Concept `{0}` has no active version.")]
    ConceptNotFound(String),
    #[error("{0} already exists.")]
    AlreadyExists(String),
    #[error("Conflict on update: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidTransaction(a), Self::InvalidTransaction(b)) => a == b,
            (Self::UnknownAccount(a), Self::UnknownAccount(b)) => a == b,
            (Self::UnknownCategory(a), Self::UnknownCategory(b)) => a == b,
            (Self::AccountNotFound(a), Self::AccountNotFound(b)) => a == b,
            (Self::CategoryNotFound(a), Self::CategoryNotFound(b)) => a == b,
            (Self::GroupNotFound(a), Self::GroupNotFound(b)) => a == b,
            (Self::ConceptNotFound(a), Self::ConceptNotFound(b)) => a == b,
            (Self::AlreadyExists(a), Self::AlreadyExists(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
