//! Scope classifier
//!
//! Assigns every node of a template body the stage it executes in:
//!
//! - literals and type introspection are compile-time
//! - a reference takes the stage of its declaration, from the host's
//!   [`StageFacts`] or from an earlier local; anything else takes the
//!   ambient stage of the enclosing [`ScopeContext`]
//! - composites combine their operands; positions that only exist during
//!   generation (arguments of compile-time callees, compile-time locals,
//!   splices) report a conflict when handed a run-time value
//! - control constructs take the stage of their controlling expression, and
//!   a run-time construct makes its bodies run-time by default
//!
//! User-facing problems go to the diagnostic sink and classification carries
//! on with a best-effort [`StageTag::Dynamic`]; only internal defects are
//! returned as errors.

mod classifier;
mod context;

pub use context::ScopeContext;

use classifier::Classifier;
use rustc_hash::FxHashSet;
use sc_diagnostics::{DiagnosticSink, InternalError};
use sc_identity::StageStore;
use sc_intern::{Interner, Symbol};
use sc_syntax::{Block, Body, Member, StageFacts, StageTag};
use tracing::{debug, instrument};

/// Classifier settings
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Ambient stage outside any run-time construct
    pub default_ambient: StageTag,
    /// Aliases whose members are evaluated during generation (`meta::`)
    pub compile_time_aliases: FxHashSet<Symbol>,
}

impl ClassifierConfig {
    /// Settings with the given ambient stage and no compile-time aliases
    #[must_use]
    pub fn new(default_ambient: StageTag) -> Self {
        Self {
            default_ambient,
            compile_time_aliases: FxHashSet::default(),
        }
    }

    /// Add a compile-time alias
    #[must_use]
    pub fn with_alias(mut self, alias: Symbol) -> Self {
        self.compile_time_aliases.insert(alias);
        self
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::new(StageTag::RunTimeOnly)
    }
}

/// Classify every node under `block`
///
/// The input is never modified; stages are returned in a side table keyed
/// by the body's node ids.
#[instrument(skip_all, fields(nodes = body.node_count()))]
pub fn classify(
    body: &Body,
    block: &Block,
    facts: &dyn StageFacts,
    config: &ClassifierConfig,
    interner: &Interner,
    sink: &mut dyn DiagnosticSink,
) -> Result<StageStore, InternalError> {
    let mut classifier = Classifier::new(body, facts, config, interner, sink);
    let stage = classifier.block(block)?;
    let stages = classifier.finish(block)?;
    debug!(%stage, tagged = stages.len(), "classified");
    Ok(stages)
}

/// Classify the body of a member
pub fn classify_member(
    member: &Member,
    facts: &dyn StageFacts,
    config: &ClassifierConfig,
    interner: &Interner,
    sink: &mut dyn DiagnosticSink,
) -> Result<StageStore, InternalError> {
    classify(&member.body, &member.block, facts, config, interner, sink)
}
