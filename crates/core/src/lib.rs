//! Flashgen core: hierarchical configuration documents for the storage engine and its proxy.

#![forbid(unsafe_code)]

mod diff;
mod document;
mod value;

pub use diff::DocumentDiff;
pub use document::ConfigDocument;
pub use value::{Table, TypeMismatch, Value, ValueKind};

/// The only failure a document raises: a stored value has a different kind than requested.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch { path: String, expected: ValueKind, found: ValueKind },
}
