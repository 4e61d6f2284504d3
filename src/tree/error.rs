//! Structural errors raised by tree mutations.

use thiserror::Error;

/// A structural conflict for a single tree operation. The rest of the tree is
/// left untouched when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("parent path not found: {0}")]
    ParentNotFound(String),

    #[error("object \"{name}\" already exists under {parent}")]
    DuplicateName { parent: String, name: String },

    #[error("path not found: {0}")]
    NotFound(String),

    #[error("invalid object name: {0:?}")]
    InvalidName(String),

    #[error("cannot add children under sensor {0}")]
    ParentIsSensor(String),

    #[error("sensor under {0} has no owning FRU")]
    SensorOutsideFru(String),

    #[error("the tree root cannot be deleted")]
    CannotDeleteRoot,
}
