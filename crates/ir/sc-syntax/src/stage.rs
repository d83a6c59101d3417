//! Execution stages

use crate::SymbolId;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// When a node executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageTag {
    /// Evaluated during the generation pass
    #[serde(rename = "compile")]
    CompileTimeOnly,
    /// Reconstructed as data and emitted into the generated artifact
    #[serde(rename = "run")]
    RunTimeOnly,
    /// Operands that no rule could reconcile
    #[serde(rename = "dynamic")]
    Dynamic,
    /// Not yet classified; never survives classification
    #[serde(rename = "unresolved")]
    Unresolved,
}

impl StageTag {
    /// Combine the stages of two operands of a composite
    ///
    /// Dynamic absorbs everything, run-time absorbs compile-time, and an
    /// unresolved side defers to the other.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Self::Dynamic, _) | (_, Self::Dynamic) => Self::Dynamic,
            (Self::RunTimeOnly, _) | (_, Self::RunTimeOnly) => Self::RunTimeOnly,
            (Self::CompileTimeOnly, _) | (_, Self::CompileTimeOnly) => Self::CompileTimeOnly,
            (Self::Unresolved, Self::Unresolved) => Self::Unresolved,
        }
    }

    /// Whether the node belongs to the generated artifact
    #[must_use]
    pub fn is_run_time(self) -> bool {
        self == Self::RunTimeOnly
    }

    /// Whether the node runs during generation
    #[must_use]
    pub fn is_compile_time(self) -> bool {
        self == Self::CompileTimeOnly
    }
}

impl fmt::Display for StageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CompileTimeOnly => "compile-time",
            Self::RunTimeOnly => "run-time",
            Self::Dynamic => "dynamic",
            Self::Unresolved => "unresolved",
        })
    }
}

/// Declared stages of symbols, supplied by the host
///
/// Classification only reads it.
pub trait StageFacts {
    /// Declared stage of a symbol, if the host fixed one
    fn stage_of(&self, symbol: SymbolId) -> Option<StageTag>;
}

/// Map-backed [`StageFacts`]
#[derive(Debug, Clone, Default)]
pub struct StageTable {
    stages: FxHashMap<SymbolId, StageTag>,
}

impl StageTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the stage of a symbol
    pub fn declare(&mut self, symbol: SymbolId, stage: StageTag) {
        self.stages.insert(symbol, stage);
    }

    /// Builder-style [`declare`](Self::declare)
    #[must_use]
    pub fn with(mut self, symbol: SymbolId, stage: StageTag) -> Self {
        self.declare(symbol, stage);
        self
    }
}

impl StageFacts for StageTable {
    fn stage_of(&self, symbol: SymbolId) -> Option<StageTag> {
        self.stages.get(&symbol).copied()
    }
}

impl<F: StageFacts + ?Sized> StageFacts for &F {
    fn stage_of(&self, symbol: SymbolId) -> Option<StageTag> {
        (**self).stage_of(symbol)
    }
}
