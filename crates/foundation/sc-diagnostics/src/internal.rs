//! Internal defect errors

use sc_span::FileSpan;
use thiserror::Error;

/// A defect in the staging engine itself
///
/// These are never attributed to user input. Any pass that hits one stops
/// and returns it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    /// A node shape reached a pass with no case for it
    #[error("{pass}: unhandled node `{node}` at {span}")]
    UnhandledNode {
        /// Pass that rejected the node
        pass: &'static str,
        /// Description of the node
        node: String,
        /// Location of the node
        span: FileSpan,
    },

    /// A node expected to carry an origin location has none
    #[error("no location recorded for {node}")]
    MissingLocation {
        /// Description of the node
        node: String,
    },

    /// A node expected to carry a symbol mapping has none
    #[error("no symbol mapping recorded for {node}")]
    MissingSymbolMapping {
        /// Description of the node
        node: String,
    },

    /// A symbol id that this compilation's registry never produced
    #[error("unknown symbol id `{id}`")]
    UnknownSymbolId {
        /// The offending id
        id: String,
    },

    /// A node was annotated with two different stages
    #[error("node {node} already tagged {existing}, refusing {requested}")]
    ConflictingStageAnnotation {
        /// Description of the node
        node: String,
        /// Tag already stored
        existing: String,
        /// Tag that was requested
        requested: String,
    },

    /// A node reached the rewriter without a stage, or still unresolved
    #[error("node {node} has no resolved stage")]
    UnresolvedStage {
        /// Description of the node
        node: String,
    },

    /// A context was popped with no context pushed
    #[error("{context} stack underflow")]
    ContextUnderflow {
        /// Which context stack underflowed
        context: &'static str,
    },

    /// A copied subtree no longer renders like its original
    #[error("passthrough copy diverged from original at {span}: `{original}` vs `{copy}`")]
    PassthroughMismatch {
        /// Original rendering
        original: String,
        /// Rendering of the copy
        copy: String,
        /// Location of the subtree
        span: FileSpan,
    },
}

impl InternalError {
    /// Returns the span where the defect was detected, when known
    #[must_use]
    pub fn span(&self) -> Option<FileSpan> {
        match self {
            Self::UnhandledNode { span, .. } | Self::PassthroughMismatch { span, .. } => Some(*span),
            Self::MissingLocation { .. }
            | Self::MissingSymbolMapping { .. }
            | Self::UnknownSymbolId { .. }
            | Self::ConflictingStageAnnotation { .. }
            | Self::UnresolvedStage { .. }
            | Self::ContextUnderflow { .. } => None,
        }
    }
}
