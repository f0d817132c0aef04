//! Error types for COLLADA import.
//!
//! Only [`ColladaError::Markup`] and [`ColladaError::UnbalancedTag`] come out of
//! document construction. Everything else is recovered from inside the scene
//! walk by skipping the geometry or semantic it belongs to.

use thiserror::Error;

/// Errors raised while reading a COLLADA document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ColladaError {
    /// The text could not be tokenized as markup.
    #[error("malformed markup at byte {offset}")]
    Markup { offset: usize },

    /// A closing tag did not match the innermost open element.
    #[error("unbalanced tag: expected </{expected}>, found </{found}>")]
    UnbalancedTag { expected: String, found: String },

    /// An element or attribute needed to extract geometry is missing.
    #[error("missing {element} in {context}")]
    StructuralAbsence { element: String, context: String },

    /// A numeric token could not be parsed.
    #[error("malformed number in <{element}>: {token:?}")]
    MalformedNumeric { element: String, token: String },

    /// An index addresses past the end of the array it points into.
    #[error("{semantic} index {index} out of range (len {len})")]
    IndexOutOfRange {
        semantic: String,
        index: usize,
        len: usize,
    },

    /// A primitive list or geometry produced nothing that can be drawn.
    #[error("no usable data: {0}")]
    NoUsableData(String),
}

impl ColladaError {
    pub(crate) fn absent(element: impl Into<String>, context: impl Into<String>) -> Self {
        Self::StructuralAbsence {
            element: element.into(),
            context: context.into(),
        }
    }
}

/// Convenience alias for `Result<T, ColladaError>`.
pub type ColladaResult<T> = Result<T, ColladaError>;
