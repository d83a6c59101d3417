//! Statement accumulation contexts

use crate::rewriter::Rewriter;
use sc_diagnostics::InternalError;
use sc_syntax::StmtId;
use std::ops::{Deref, DerefMut};

/// Generation statements collected for one later-stage block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaContext {
    /// Generation-time local the block's statements are pushed onto
    pub result: String,
    /// Generation statements, in order; only ever appended to
    pub stmts: Vec<StmtId>,
}

impl MetaContext {
    /// Empty context accumulating into `result`
    #[must_use]
    pub fn new(result: String) -> Self {
        Self {
            result,
            stmts: Vec::new(),
        }
    }
}

/// Scope of one [`MetaContext`]
///
/// The context is popped when the guard drops, on error paths too, so the
/// enclosing context is current again afterwards.
pub(crate) struct MetaGuard<'r, 'a> {
    rewriter: &'r mut Rewriter<'a>,
    depth: usize,
}

impl<'r, 'a> MetaGuard<'r, 'a> {
    pub(crate) fn new(rewriter: &'r mut Rewriter<'a>, context: MetaContext) -> Self {
        let depth = rewriter.contexts.len();
        rewriter.contexts.push(context);
        Self { rewriter, depth }
    }

    /// Leave the context, handing back what it collected
    pub(crate) fn finish(self) -> Result<MetaContext, InternalError> {
        if self.rewriter.contexts.len() != self.depth + 1 {
            return Err(InternalError::ContextUnderflow { context: "meta" });
        }
        self.rewriter
            .contexts
            .pop()
            .ok_or(InternalError::ContextUnderflow { context: "meta" })
    }
}

impl<'a> Deref for MetaGuard<'_, 'a> {
    type Target = Rewriter<'a>;

    fn deref(&self) -> &Self::Target {
        self.rewriter
    }
}

impl DerefMut for MetaGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.rewriter
    }
}

impl Drop for MetaGuard<'_, '_> {
    fn drop(&mut self) {
        self.rewriter.contexts.truncate(self.depth);
    }
}
