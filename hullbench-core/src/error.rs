//! Structural errors raised by the engine.
//!
//! Numerical degeneracies (zero denominators, empty windows) are not errors:
//! they surface as `None` in metric and curve outputs.

use thiserror::Error;

use crate::domain::{MaterialId, ModelId};

/// Errors from the core engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("input alignment error: expected {expected} values, found {found} ({detail})")]
    InputAlignment {
        expected: usize,
        found: usize,
        detail: String,
    },

    #[error("model '{0}' not found in prediction table")]
    UnknownModel(ModelId),

    #[error("duplicate material id '{0}'")]
    DuplicateMaterial(MaterialId),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl CoreError {
    pub(crate) fn length_mismatch(expected: usize, found: usize) -> Self {
        CoreError::InputAlignment {
            expected,
            found,
            detail: "series lengths differ".into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
