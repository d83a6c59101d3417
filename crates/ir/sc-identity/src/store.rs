//! Node-identity side tables
//!
//! Each store is scoped to one [`Body`]: keys are arena indices of that body
//! and mean nothing for any other. Annotating never touches the node itself.

use rustc_hash::FxHashMap;
use sc_diagnostics::InternalError;
use sc_span::FileSpan;
use sc_syntax::{visit, Body, NodeRef, StageTag};

/// Origin locations of nodes
#[derive(Debug, Clone, Default)]
pub struct LocationStore {
    locations: FxHashMap<NodeRef, FileSpan>,
}

impl LocationStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `transformed` stands for source at `original`
    ///
    /// Returns `transformed` so calls can wrap node construction.
    pub fn annotate(&mut self, original: FileSpan, transformed: NodeRef) -> NodeRef {
        self.locations.insert(transformed, original);
        transformed
    }

    /// Record every node under `root` as originating at its own span
    ///
    /// Used for subtrees copied verbatim, whose spans are already source
    /// coordinates.
    pub fn annotate_recursive(&mut self, body: &Body, root: NodeRef) -> NodeRef {
        for node in visit::preorder(body, root) {
            self.locations.insert(node, body.span_of(node));
        }
        root
    }

    /// Origin of `node`, if it was annotated
    #[must_use]
    pub fn resolve(&self, node: NodeRef) -> Option<FileSpan> {
        self.locations.get(&node).copied()
    }

    /// Origin of `node`, which must have been annotated
    ///
    /// # Errors
    ///
    /// [`InternalError::MissingLocation`] if it was not.
    pub fn require(&self, node: NodeRef) -> Result<FileSpan, InternalError> {
        self.resolve(node)
            .ok_or_else(|| InternalError::MissingLocation { node: node.to_string() })
    }

    /// Number of annotated nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether nothing was annotated
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

/// Stage tags of nodes
#[derive(Debug, Clone, Default)]
pub struct StageStore {
    stages: FxHashMap<NodeRef, StageTag>,
}

impl StageStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag `node`
    ///
    /// Re-tagging with the same stage is a no-op. An unresolved tag may be
    /// replaced once classification settles it.
    ///
    /// # Errors
    ///
    /// [`InternalError::ConflictingStageAnnotation`] when `node` already
    /// carries a different resolved stage.
    pub fn tag(&mut self, node: NodeRef, stage: StageTag) -> Result<NodeRef, InternalError> {
        match self.stages.get(&node) {
            Some(existing) if *existing != stage && *existing != StageTag::Unresolved => {
                Err(InternalError::ConflictingStageAnnotation {
                    node: node.to_string(),
                    existing: existing.to_string(),
                    requested: stage.to_string(),
                })
            }
            _ => {
                self.stages.insert(node, stage);
                Ok(node)
            }
        }
    }

    /// Stage of `node`, if tagged
    #[must_use]
    pub fn stage(&self, node: NodeRef) -> Option<StageTag> {
        self.stages.get(&node).copied()
    }

    /// Resolved stage of `node`
    ///
    /// # Errors
    ///
    /// [`InternalError::UnresolvedStage`] when `node` is untagged or still
    /// unresolved.
    pub fn require(&self, node: NodeRef) -> Result<StageTag, InternalError> {
        match self.stage(node) {
            Some(StageTag::Unresolved) | None => {
                Err(InternalError::UnresolvedStage { node: node.to_string() })
            }
            Some(stage) => Ok(stage),
        }
    }

    /// Iterate all tagged nodes
    pub fn iter(&self) -> impl Iterator<Item = (NodeRef, StageTag)> + '_ {
        self.stages.iter().map(|(node, stage)| (*node, *stage))
    }

    /// Number of tagged nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether nothing was tagged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Registry ids of the symbols nodes stand for
#[derive(Debug, Clone, Default)]
pub struct SymbolStore {
    symbols: FxHashMap<NodeRef, String>,
}

impl SymbolStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `transformed` refers to the symbol with registry id `id`
    pub fn annotate(&mut self, id: String, transformed: NodeRef) -> NodeRef {
        self.symbols.insert(transformed, id);
        transformed
    }

    /// Registry id recorded for `node`
    #[must_use]
    pub fn resolve(&self, node: NodeRef) -> Option<&str> {
        self.symbols.get(&node).map(String::as_str)
    }

    /// Registry id of `node`, which must have been annotated
    ///
    /// # Errors
    ///
    /// [`InternalError::MissingSymbolMapping`] if it was not.
    pub fn require(&self, node: NodeRef) -> Result<&str, InternalError> {
        self.resolve(node)
            .ok_or_else(|| InternalError::MissingSymbolMapping { node: node.to_string() })
    }

    /// Number of annotated nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether nothing was annotated
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_intern::Interner;
    use sc_span::{FileId, Span};
    use sc_syntax::{BinaryOp, BodyBuilder};

    #[test]
    fn test_location_annotate_and_resolve() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(2));
        let lit = b.int(1);
        let body = b.finish();

        let mut store = LocationStore::new();
        let origin = FileSpan::new(FileId(9), Span::new(10, 12));
        let node = store.annotate(origin, NodeRef::Expr(lit));
        assert_eq!(node, NodeRef::Expr(lit));
        assert_eq!(store.resolve(node), Some(origin));
        assert_eq!(body.exprs[lit].span().file, FileId(2));
    }

    #[test]
    fn test_location_recursive_covers_every_node() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let left = b.int(1);
        let right = b.int(2);
        let sum = b.binary(BinaryOp::Add, left, right);
        let stmt = b.expr_stmt(sum);
        let body = b.finish();

        let mut store = LocationStore::new();
        store.annotate_recursive(&body, NodeRef::Stmt(stmt));
        assert_eq!(store.len(), 4);
        assert_eq!(store.resolve(NodeRef::Expr(right)), Some(body.exprs[right].span()));
        assert!(store.require(NodeRef::Stmt(stmt)).is_ok());
    }

    #[test]
    fn test_missing_location_is_internal_error() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let lit = b.int(1);
        let store = LocationStore::new();
        assert!(matches!(
            store.require(NodeRef::Expr(lit)),
            Err(InternalError::MissingLocation { .. })
        ));
    }

    #[test]
    fn test_missing_symbol_mapping_is_internal_error() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let node = NodeRef::Expr(b.name("x", None));

        let mut store = SymbolStore::new();
        assert!(matches!(
            store.require(node),
            Err(InternalError::MissingSymbolMapping { .. })
        ));
        store.annotate("node=1,compilation=0".to_owned(), node);
        assert_eq!(store.require(node), Ok("node=1,compilation=0"));
    }

    #[test]
    fn test_stage_store_refuses_conflicting_tags() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let node = NodeRef::Expr(b.int(1));

        let mut store = StageStore::new();
        store.tag(node, StageTag::Unresolved).ok();
        assert!(store.tag(node, StageTag::CompileTimeOnly).is_ok());
        assert!(store.tag(node, StageTag::CompileTimeOnly).is_ok());
        assert!(matches!(
            store.tag(node, StageTag::RunTimeOnly),
            Err(InternalError::ConflictingStageAnnotation { .. })
        ));
        assert_eq!(store.require(node), Ok(StageTag::CompileTimeOnly));
    }

    #[test]
    fn test_unresolved_stage_is_not_required_stage() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let node = NodeRef::Expr(b.int(1));

        let mut store = StageStore::new();
        store.tag(node, StageTag::Unresolved).ok();
        assert!(matches!(
            store.require(node),
            Err(InternalError::UnresolvedStage { .. })
        ));
    }
}
