//! Stage inference over one template body

use crate::context::{ScopeContext, ScopeGuard};
use crate::ClassifierConfig;
use rustc_hash::{FxHashMap, FxHashSet};
use sc_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, InternalError};
use sc_identity::StageStore;
use sc_intern::{Interner, Symbol};
use sc_span::FileSpan;
use sc_syntax::{
    pretty, visit, Block, Body, Expr, ExprId, InterpolationPart, NodeRef, StageFacts, StageTag,
    Stmt, StmtId, SymbolId,
};
use tracing::trace;

/// Recursive-descent classifier state
///
/// Owned by one classification; never shared across threads.
pub(crate) struct Classifier<'a> {
    body: &'a Body,
    facts: &'a dyn StageFacts,
    config: &'a ClassifierConfig,
    interner: &'a Interner,
    sink: &'a mut dyn DiagnosticSink,
    /// Stack of ambient contexts, innermost last
    pub(crate) contexts: Vec<ScopeContext>,
    stages: StageStore,
    /// Stages of locals declared so far
    locals: FxHashMap<SymbolId, StageTag>,
    /// Locals of enclosing blocks not yet declared
    pending: FxHashSet<SymbolId>,
}

impl<'a> Classifier<'a> {
    pub(crate) fn new(
        body: &'a Body,
        facts: &'a dyn StageFacts,
        config: &'a ClassifierConfig,
        interner: &'a Interner,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            body,
            facts,
            config,
            interner,
            sink,
            contexts: Vec::new(),
            stages: StageStore::new(),
            locals: FxHashMap::default(),
            pending: FxHashSet::default(),
        }
    }

    /// Ambient stage of the innermost region
    pub(crate) fn ambient(&self) -> StageTag {
        self.contexts
            .last()
            .map_or(self.config.default_ambient, |context| context.ambient)
    }

    /// Enter a region with the given ambient stage
    pub(crate) fn scope(&mut self, ambient: StageTag) -> ScopeGuard<'_, 'a> {
        ScopeGuard::new(self, ScopeContext { ambient })
    }

    pub(crate) fn tag(&mut self, node: impl Into<NodeRef>, stage: StageTag) -> Result<StageTag, InternalError> {
        let node = node.into();
        self.stages.tag(node, stage)?;
        trace!(%node, %stage, "stage assigned");
        Ok(stage)
    }

    fn report(&mut self, code: DiagnosticCode, span: FileSpan, args: Vec<String>) {
        self.sink.report(Diagnostic::new(code, span, args));
    }

    fn render(&self, id: ExprId) -> String {
        pretty::render_expr(self.body, id, self.interner)
    }

    fn symbol_stage(&mut self, symbol: Option<SymbolId>, name: Symbol, span: FileSpan) -> StageTag {
        let Some(symbol) = symbol else {
            return self.ambient();
        };
        if let Some(stage) = self.locals.get(&symbol) {
            return *stage;
        }
        if self.pending.contains(&symbol) {
            let name = self.interner.resolve(&name).to_string();
            self.report(DiagnosticCode::ForwardReference, span, vec![name]);
            return self.ambient();
        }
        self.facts.stage_of(symbol).unwrap_or_else(|| self.ambient())
    }

    /// Whether calling `callee` always happens during generation
    fn is_now_only_callee(&self, callee: ExprId) -> bool {
        match &self.body.exprs[callee] {
            Expr::AliasQualified { alias, .. } => self.config.compile_time_aliases.contains(alias),
            Expr::Name {
                symbol: Some(symbol),
                ..
            } => self.facts.stage_of(*symbol) == Some(StageTag::CompileTimeOnly),
            _ => false,
        }
    }

    fn combine_all(&mut self, ids: &[ExprId]) -> Result<StageTag, InternalError> {
        let mut stage = StageTag::CompileTimeOnly;
        for id in ids {
            stage = stage.combine(self.expr(*id)?);
        }
        Ok(stage)
    }

    /// Tag every node under `root` with `stage` without inspecting it
    fn force(&mut self, root: ExprId, stage: StageTag) -> Result<(), InternalError> {
        for node in visit::preorder(self.body, NodeRef::Expr(root)) {
            self.tag(node, stage)?;
        }
        Ok(())
    }

    pub(crate) fn expr(&mut self, id: ExprId) -> Result<StageTag, InternalError> {
        let body = self.body;
        let stage = match &body.exprs[id] {
            Expr::Literal { .. } | Expr::TypeOf { .. } | Expr::TypeExpr { .. } => {
                StageTag::CompileTimeOnly
            }
            Expr::Name { name, symbol, span } => self.symbol_stage(*symbol, *name, *span),
            Expr::AliasQualified {
                alias,
                name,
                symbol,
                span,
            } => {
                if self.config.compile_time_aliases.contains(alias) {
                    StageTag::CompileTimeOnly
                } else {
                    self.symbol_stage(*symbol, *name, *span)
                }
            }
            Expr::QualifiedName { symbol, .. } => symbol
                .and_then(|symbol| self.facts.stage_of(symbol))
                .unwrap_or_else(|| self.ambient()),
            Expr::Binary { left, right, .. } => self.combine_all(&[*left, *right])?,
            Expr::Index { target, index, .. } | Expr::ConditionalIndex { target, index, .. } => {
                self.combine_all(&[*target, *index])?
            }
            Expr::Unary { operand: inner, .. } | Expr::Paren { inner, .. } => self.expr(*inner)?,
            Expr::List { items, .. } => self.combine_all(items)?,
            Expr::Interpolated { parts, .. } => {
                let holes: Vec<ExprId> = parts
                    .iter()
                    .filter_map(|part| match part {
                        InterpolationPart::Hole(hole) => Some(*hole),
                        InterpolationPart::Text(_) => None,
                    })
                    .collect();
                self.combine_all(&holes)?
            }
            Expr::Member {
                receiver, symbol, ..
            }
            | Expr::ConditionalMember {
                receiver, symbol, ..
            } => {
                let receiver = self.expr(*receiver)?;
                symbol
                    .and_then(|symbol| self.facts.stage_of(symbol))
                    .map_or(receiver, |declared| receiver.combine(declared))
            }
            Expr::Assign {
                target,
                value,
                span,
            } => {
                let target_stage = self.expr(*target)?;
                let value_stage = self.expr(*value)?;
                if target_stage.is_compile_time() && value_stage.is_run_time() {
                    let args = vec![self.render(*target), self.render(*value)];
                    self.report(DiagnosticCode::RunTimeValueInCompileTimeLocal, *span, args);
                    StageTag::Dynamic
                } else if target_stage.is_compile_time() && value_stage == StageTag::Dynamic {
                    self.ambiguous(*value)
                } else {
                    target_stage.combine(value_stage)
                }
            }
            Expr::Call { callee, args, span } => {
                let callee_stage = self.expr(*callee)?;
                let mut arg_stages = Vec::with_capacity(args.len());
                for arg in args {
                    arg_stages.push(self.expr(*arg)?);
                }
                if self.is_now_only_callee(*callee) {
                    let run_time = arg_stages.iter().position(|stage| stage.is_run_time());
                    let dynamic = arg_stages.iter().position(|stage| *stage == StageTag::Dynamic);
                    match (run_time, dynamic) {
                        (Some(position), _) => {
                            let conflict = vec![self.render(*callee), self.render(args[position])];
                            self.report(DiagnosticCode::StageConflict, *span, conflict);
                            StageTag::Dynamic
                        }
                        (None, Some(position)) => self.ambiguous(args[position]),
                        (None, None) => StageTag::CompileTimeOnly,
                    }
                } else {
                    arg_stages.into_iter().fold(callee_stage, StageTag::combine)
                }
            }
            Expr::NameOf { operand, .. } => {
                self.force(*operand, StageTag::CompileTimeOnly)?;
                StageTag::CompileTimeOnly
            }
            Expr::Splice { inner, span } => match self.expr(*inner)? {
                StageTag::RunTimeOnly => {
                    let conflict = vec![self.render(id), self.render(*inner)];
                    self.report(DiagnosticCode::StageConflict, *span, conflict);
                    StageTag::Dynamic
                }
                StageTag::Dynamic => self.ambiguous(*inner),
                StageTag::CompileTimeOnly | StageTag::Unresolved => StageTag::RunTimeOnly,
            },
        };
        self.tag(id, stage)
    }

    /// Report a Dynamic operand that reached a now-only position
    fn ambiguous(&mut self, operand: ExprId) -> StageTag {
        let args = vec![self.render(operand)];
        let span = self.body.exprs[operand].span();
        self.report(DiagnosticCode::AmbiguousStage, span, args);
        StageTag::Dynamic
    }

    /// Stage of a control construct from its controlling expression
    fn control(&mut self, condition: ExprId) -> Result<StageTag, InternalError> {
        let stage = self.expr(condition)?;
        if stage == StageTag::Dynamic {
            self.ambiguous(condition);
        }
        Ok(stage)
    }

    /// Ambient stage for the bodies of a construct controlled at `stage`
    fn body_ambient(&self, stage: StageTag) -> StageTag {
        if stage.is_run_time() {
            StageTag::RunTimeOnly
        } else {
            self.ambient()
        }
    }

    pub(crate) fn block(&mut self, block: &Block) -> Result<StageTag, InternalError> {
        // Hoist declarations so uses before them are caught.
        for stmt in &block.stmts {
            if let Stmt::Let { symbol, .. } = &self.body.stmts[*stmt] {
                self.pending.insert(*symbol);
            }
        }
        let mut stage = StageTag::CompileTimeOnly;
        for stmt in &block.stmts {
            stage = stage.combine(self.stmt(*stmt)?);
        }
        Ok(stage)
    }

    fn stmt(&mut self, id: StmtId) -> Result<StageTag, InternalError> {
        let body = self.body;
        let stage = match &body.stmts[id] {
            Stmt::Let {
                name,
                symbol,
                init,
                span,
                ..
            } => {
                let init_stage = match init {
                    Some(init) => Some(self.expr(*init)?),
                    None => None,
                };
                self.pending.remove(symbol);
                let stage = match (self.facts.stage_of(*symbol), init_stage) {
                    (Some(StageTag::CompileTimeOnly), Some(StageTag::Dynamic)) => match init {
                        Some(init) => self.ambiguous(*init),
                        None => StageTag::Dynamic,
                    },
                    (_, Some(StageTag::Dynamic)) => StageTag::Dynamic,
                    (Some(StageTag::CompileTimeOnly), Some(StageTag::RunTimeOnly)) => {
                        let value = init.map(|init| self.render(init)).unwrap_or_default();
                        let local = self.interner.resolve(name).to_string();
                        self.report(
                            DiagnosticCode::RunTimeValueInCompileTimeLocal,
                            *span,
                            vec![local, value],
                        );
                        StageTag::Dynamic
                    }
                    (Some(declared), _) => declared,
                    (None, Some(inferred)) => inferred,
                    (None, None) => self.ambient(),
                };
                self.locals.insert(*symbol, stage);
                stage
            }
            Stmt::Expr { expr, .. } => self.expr(*expr)?,
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(value) => self.expr(*value)?,
                    None => StageTag::CompileTimeOnly,
                };
                // Leaving the template is always part of the artifact.
                value.combine(StageTag::RunTimeOnly)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let stage = self.control(*condition)?;
                let ambient = self.body_ambient(stage);
                let mut scope = self.scope(ambient);
                scope.block(then_branch)?;
                if let Some(else_branch) = else_branch {
                    scope.block(else_branch)?;
                }
                stage
            }
            Stmt::While {
                condition, body, ..
            } => {
                let stage = self.control(*condition)?;
                let ambient = self.body_ambient(stage);
                self.scope(ambient).block(body)?;
                stage
            }
            Stmt::ForEach {
                symbol,
                iterable,
                body,
                ..
            } => {
                let stage = self.control(*iterable)?;
                let binding = self.facts.stage_of(*symbol).unwrap_or(stage);
                self.locals.insert(*symbol, binding);
                let ambient = self.body_ambient(stage);
                self.scope(ambient).block(body)?;
                stage
            }
            Stmt::Switch {
                scrutinee,
                cases,
                default,
                ..
            } => {
                let stage = self.control(*scrutinee)?;
                let ambient = self.body_ambient(stage);
                let mut scope = self.scope(ambient);
                for case in cases {
                    scope.expr(case.value)?;
                    scope.block(&case.body)?;
                }
                if let Some(default) = default {
                    scope.block(default)?;
                }
                stage
            }
            Stmt::Block { block, .. } => {
                let ambient = self.ambient();
                self.scope(ambient).block(block)?
            }
        };
        self.tag(id, stage)
    }

    /// Check that every node under `root` got a final stage and hand the
    /// stages out
    pub(crate) fn finish(self, root: &Block) -> Result<StageStore, InternalError> {
        for node in visit::preorder_block(self.body, root) {
            self.stages.require(node)?;
        }
        Ok(self.stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_diagnostics::DiagnosticBag;
    use sc_span::FileId;
    use sc_syntax::{BodyBuilder, StageTable};

    #[test]
    fn test_scope_guard_restores_context() {
        let interner = Interner::new();
        let body = Body::new();
        let facts = StageTable::new();
        let config = ClassifierConfig::new(StageTag::CompileTimeOnly);
        let mut sink = DiagnosticBag::new();
        let mut classifier = Classifier::new(&body, &facts, &config, &interner, &mut sink);

        {
            let mut outer = classifier.scope(StageTag::RunTimeOnly);
            assert_eq!(outer.ambient(), StageTag::RunTimeOnly);
            let inner = outer.scope(StageTag::CompileTimeOnly);
            assert_eq!(inner.ambient(), StageTag::CompileTimeOnly);
        }
        assert_eq!(classifier.ambient(), StageTag::CompileTimeOnly);
        assert!(classifier.contexts.is_empty());
    }

    #[test]
    fn test_scope_guard_restores_context_on_error() {
        fn fail_inside(classifier: &mut Classifier<'_>, node: NodeRef) -> Result<(), InternalError> {
            let mut scope = classifier.scope(StageTag::RunTimeOnly);
            scope.tag(node, StageTag::CompileTimeOnly)?;
            scope.tag(node, StageTag::RunTimeOnly)?;
            Ok(())
        }

        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let lit = b.int(1);
        let body = b.finish();
        let facts = StageTable::new();
        let config = ClassifierConfig::new(StageTag::CompileTimeOnly);
        let mut sink = DiagnosticBag::new();
        let mut classifier = Classifier::new(&body, &facts, &config, &interner, &mut sink);

        let result = fail_inside(&mut classifier, NodeRef::Expr(lit));
        assert!(matches!(
            result,
            Err(InternalError::ConflictingStageAnnotation { .. })
        ));
        assert_eq!(classifier.ambient(), StageTag::CompileTimeOnly);
    }
}
