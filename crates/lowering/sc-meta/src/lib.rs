//! Meta rewriter
//!
//! Turns a classified template into its generation program: a routine that,
//! run during generation, builds the template's later-stage code as a syntax
//! tree.
//!
//! Compile-time code is copied into the program unchanged and runs there.
//! Every later-stage statement becomes a call chain over the `syntax::`
//! primitives whose result is pushed onto a statement list; the program
//! returns `syntax::block(list)`. Compile-time values used inside later-stage
//! code are spliced in with `syntax::value`.
//!
//! ```text
//! x + 1;                      let stmts = syntax::list();
//!                      ==>    stmts = syntax::push(stmts, syntax::expr_stmt(
//!                                 syntax::binary("+", syntax::name("x"), syntax::value(1))));
//!                             return syntax::block(stmts);
//! ```
//!
//! Every program node records the template span it came from, and nodes that
//! refer to host symbols record the symbol's registry id, so diagnostics on
//! the program can be mapped back to the template.

mod context;
mod rewriter;

pub use context::MetaContext;

use rewriter::Rewriter;
use rustc_hash::FxHashMap;
use sc_diagnostics::InternalError;
use sc_identity::{LocationStore, StageStore, SymbolRegistry, SymbolStore};
use sc_intern::Interner;
use sc_span::FileSpan;
use sc_syntax::pretty::render_block;
use sc_syntax::{Member, NodeRef, StageFacts, SymbolId};
use tracing::{debug, instrument};

/// Suffix appended to a template's name to name its program
pub const DEFAULT_PROGRAM_SUFFIX: &str = "_generator";

/// How a template node was carried into the program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformationKind {
    /// Copied unchanged
    None,
    /// Copied unchanged and checked against the original
    Clone,
    /// Replaced by a builder of its syntax
    Transform,
}

/// Everything the rewriter reads besides the template itself
pub struct RewriteContext<'a> {
    /// Interner shared with the host tree
    pub interner: &'a Interner,
    /// Symbol id registry of the compilation
    pub registry: &'a SymbolRegistry,
    /// Declared stages of host symbols
    pub facts: &'a dyn StageFacts,
    /// Suffix for program names
    pub program_suffix: &'a str,
    /// Check every verbatim copy against its original
    pub verify_passthrough: bool,
}

impl<'a> RewriteContext<'a> {
    /// Context with the default suffix and no copy verification
    #[must_use]
    pub fn new(
        interner: &'a Interner,
        registry: &'a SymbolRegistry,
        facts: &'a dyn StageFacts,
    ) -> Self {
        Self {
            interner,
            registry,
            facts,
            program_suffix: DEFAULT_PROGRAM_SUFFIX,
            verify_passthrough: false,
        }
    }

    /// Use `suffix` for program names
    #[must_use]
    pub fn with_suffix(mut self, suffix: &'a str) -> Self {
        self.program_suffix = suffix;
        self
    }

    /// Turn copy verification on or off
    #[must_use]
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_passthrough = verify;
        self
    }
}

/// Origin annotations of a program's nodes
#[derive(Debug, Clone, Default)]
pub struct ProgramAnnotations {
    /// Template span of every program node
    pub locations: LocationStore,
    /// Registry ids of referenced host symbols
    pub symbols: SymbolStore,
}

/// Where a program node came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    /// Template location
    pub span: FileSpan,
    /// Host symbol, when the node refers to one
    pub symbol: Option<SymbolId>,
}

impl ProgramAnnotations {
    /// Map a program node back to the template
    pub fn origin(&self, node: NodeRef, registry: &SymbolRegistry) -> Result<Origin, InternalError> {
        let span = self.locations.require(node)?;
        let symbol = self
            .symbols
            .resolve(node)
            .map(|id| registry.get_symbol(id))
            .transpose()?;
        Ok(Origin { span, symbol })
    }
}

/// The generation program of one template
#[derive(Debug, Clone)]
pub struct GenerationProgram {
    /// The program routine; its parameters are the template's
    /// compile-time parameters
    pub member: Member,
    /// Name of the statement list the program returns
    pub result: String,
    /// Origins of the program's nodes
    pub annotations: ProgramAnnotations,
    kinds: FxHashMap<NodeRef, TransformationKind>,
}

impl GenerationProgram {
    /// How a template node was handled, if the rewriter reached it
    ///
    /// Nodes inside a verbatim copy are not listed individually.
    #[must_use]
    pub fn kind_of(&self, node: NodeRef) -> Option<TransformationKind> {
        self.kinds.get(&node).copied()
    }

    /// Number of template nodes rebuilt as syntax builders
    #[must_use]
    pub fn transformed_count(&self) -> usize {
        self.kinds
            .values()
            .filter(|kind| **kind == TransformationKind::Transform)
            .count()
    }

    /// Source rendering of the program body
    #[must_use]
    pub fn render(&self, interner: &Interner) -> String {
        render_block(&self.member.body, &self.member.block, interner)
    }
}

/// Rewrite a classified template into its generation program
///
/// `stages` must hold a resolved stage for every node of the template;
/// templates with stage conflicts are rejected before this point.
#[instrument(skip_all, fields(template = %ctx.interner.resolve(&template.name)))]
pub fn rewrite(
    template: &Member,
    stages: &StageStore,
    ctx: &RewriteContext<'_>,
) -> Result<GenerationProgram, InternalError> {
    let program = Rewriter::new(template, stages, ctx).run()?;
    debug!(
        nodes = program.member.body.node_count(),
        transformed = program.transformed_count(),
        "rewrote template"
    );
    Ok(program)
}
