//! Ambient stage contexts

use crate::classifier::Classifier;
use sc_syntax::StageTag;
use std::ops::{Deref, DerefMut};

/// Stage assumed for unresolved identifiers in one lexical region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeContext {
    /// Ambient default stage
    pub ambient: StageTag,
}

/// Restores the enclosing [`ScopeContext`] when dropped
///
/// Dereferences to the classifier, so the region is classified through the
/// guard and the previous context comes back on every exit path, `?`
/// included.
pub(crate) struct ScopeGuard<'c, 'a> {
    classifier: &'c mut Classifier<'a>,
    depth: usize,
}

impl<'c, 'a> ScopeGuard<'c, 'a> {
    pub(crate) fn new(classifier: &'c mut Classifier<'a>, context: ScopeContext) -> Self {
        let depth = classifier.contexts.len();
        classifier.contexts.push(context);
        Self { classifier, depth }
    }
}

impl<'a> Deref for ScopeGuard<'_, 'a> {
    type Target = Classifier<'a>;

    fn deref(&self) -> &Self::Target {
        self.classifier
    }
}

impl DerefMut for ScopeGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.classifier
    }
}

impl Drop for ScopeGuard<'_, '_> {
    fn drop(&mut self) {
        self.classifier.contexts.truncate(self.depth);
    }
}
