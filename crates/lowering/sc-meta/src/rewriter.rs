//! Quasiquote rewriting of one classified template

use crate::context::{MetaContext, MetaGuard};
use crate::{GenerationProgram, ProgramAnnotations, RewriteContext, TransformationKind};
use rustc_hash::{FxHashMap, FxHashSet};
use sc_diagnostics::InternalError;
use sc_fixers::conditional::has_conditional_access;
use sc_fixers::ConditionalAccessFlattener;
use sc_identity::{LexicalScope, LocationStore, StageStore, SymbolStore};
use sc_intern::{Interner, Symbol};
use sc_span::FileSpan;
use sc_syntax::pretty::{render_expr, render_stmt};
use sc_syntax::primitive::{FixerHook, Primitive, FIX_ALIAS, SYNTAX_ALIAS};
use sc_syntax::{
    visit, Block, Body, Copier, Expr, ExprId, InterpolationPart, LiteralKind, Member, NodeRef,
    StageTag, Stmt, StmtId, SymbolId, TypeRef, Verbatim,
};
use tracing::trace;

/// Name hint for generation-time statement lists
pub(crate) const RESULT_HINT: &str = "stmts";

pub(crate) struct Rewriter<'a> {
    template: &'a Member,
    stages: &'a StageStore,
    ctx: &'a RewriteContext<'a>,
    program: Body,
    pub(crate) contexts: Vec<MetaContext>,
    scope: LexicalScope,
    locations: LocationStore,
    symbols: SymbolStore,
    kinds: FxHashMap<NodeRef, TransformationKind>,
    /// Flattened conditional accesses, keyed by the node they replace
    replacements: FxHashMap<ExprId, Expr>,
    run_time: FxHashMap<NodeRef, bool>,
    syntax_alias: Symbol,
    fix_alias: Symbol,
    next_synthetic: u32,
    /// Generation-time loops enclosing the current statement, reset by
    /// every later-stage block
    loop_depth: u32,
    /// Later-stage bindings whose name is allocated during generation,
    /// mapped to the local holding it
    generated_names: FxHashMap<SymbolId, String>,
}

impl<'a> Rewriter<'a> {
    pub(crate) fn new(
        template: &'a Member,
        stages: &'a StageStore,
        ctx: &'a RewriteContext<'a>,
    ) -> Self {
        let interner = ctx.interner;
        Self {
            template,
            stages,
            ctx,
            program: Body::new(),
            contexts: Vec::new(),
            scope: LexicalScope::for_member(template, interner),
            locations: LocationStore::new(),
            symbols: SymbolStore::new(),
            kinds: FxHashMap::default(),
            replacements: flatten_chains(&template.body),
            run_time: FxHashMap::default(),
            syntax_alias: interner.intern(SYNTAX_ALIAS),
            fix_alias: interner.intern(FIX_ALIAS),
            next_synthetic: 0,
            loop_depth: 0,
            generated_names: FxHashMap::default(),
        }
    }

    /// Rewrite the whole template into its generation program
    pub(crate) fn run(mut self) -> Result<GenerationProgram, InternalError> {
        let template = self.template;
        let span = template.block.span;
        let result = self.scope.get_unique_identifier(RESULT_HINT);

        let context = {
            let mut guard = self.enter(MetaContext::new(result.clone()));
            guard.declare_list(&result, span)?;
            for stmt in &template.block.stmts {
                guard.stmt(*stmt)?;
            }
            let list = guard.local(&result, span);
            let built = guard.prim(Primitive::Block, vec![list], span);
            let ret = guard.alloc_stmt(Stmt::Return {
                value: Some(built),
                span,
            });
            guard.emit(ret)?;
            guard.finish()?
        };
        if self.ctx.verify_passthrough {
            self.check_annotations()?;
        }

        let interner = self.ctx.interner;
        let name = format!(
            "{}{}",
            interner.resolve(&template.name),
            self.ctx.program_suffix
        );
        let params = template
            .params
            .iter()
            .filter(|param| {
                self.ctx.facts.stage_of(param.symbol) == Some(StageTag::CompileTimeOnly)
            })
            .cloned()
            .collect();

        let member = Member {
            name: interner.intern(&name),
            attributes: Vec::new(),
            params,
            type_params: template.type_params.clone(),
            body: self.program,
            block: Block::new(context.stmts, span),
            span: template.span,
        };
        Ok(GenerationProgram {
            member,
            result,
            annotations: ProgramAnnotations {
                locations: self.locations,
                symbols: self.symbols,
            },
            kinds: self.kinds,
        })
    }

    fn enter(&mut self, context: MetaContext) -> MetaGuard<'_, 'a> {
        MetaGuard::new(self, context)
    }

    fn text(&self, sym: &Symbol) -> &'a str {
        let interner: &'a Interner = self.ctx.interner;
        interner.resolve(sym)
    }

    /// Resolved stage of a template node
    fn stage(&self, node: NodeRef) -> Result<StageTag, InternalError> {
        match self.stages.require(node)? {
            StageTag::Dynamic => Err(InternalError::UnresolvedStage {
                node: node.to_string(),
            }),
            stage => Ok(stage),
        }
    }

    /// Whether the node or anything under it runs later
    fn contains_run_time(&mut self, node: NodeRef) -> Result<bool, InternalError> {
        if let Some(known) = self.run_time.get(&node) {
            return Ok(*known);
        }
        let mut found = self.stage(node)?.is_run_time();
        if !found {
            for child in visit::children(&self.template.body, node) {
                if self.contains_run_time(child)? {
                    found = true;
                    break;
                }
            }
        }
        self.run_time.insert(node, found);
        Ok(found)
    }

    fn passthrough_kind(&self) -> TransformationKind {
        if self.ctx.verify_passthrough {
            TransformationKind::Clone
        } else {
            TransformationKind::None
        }
    }

    fn record(&mut self, node: NodeRef, kind: TransformationKind) {
        trace!(%node, ?kind, "rewrite");
        self.kinds.insert(node, kind);
    }

    fn synthetic(&mut self) -> SymbolId {
        let symbol = SymbolId::synthetic(self.next_synthetic);
        self.next_synthetic += 1;
        symbol
    }

    fn annotate_symbol(&mut self, symbol: Option<SymbolId>, node: NodeRef) {
        if let Some(symbol) = symbol.filter(|symbol| !symbol.is_synthetic()) {
            let id = self.ctx.registry.get_id(symbol);
            self.symbols.annotate(id, node);
        }
    }

    // Allocation. Every program node records the template span it came from.

    fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let span = expr.span();
        let id = self.program.alloc_expr(expr);
        self.locations.annotate(span, NodeRef::Expr(id));
        id
    }

    fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let span = stmt.span();
        let id = self.program.alloc_stmt(stmt);
        self.locations.annotate(span, NodeRef::Stmt(id));
        id
    }

    fn string(&mut self, text: &str, span: FileSpan) -> ExprId {
        self.alloc_expr(Expr::Literal {
            kind: LiteralKind::String(text.to_owned()),
            span,
        })
    }

    fn null(&mut self, span: FileSpan) -> ExprId {
        self.alloc_expr(Expr::Literal {
            kind: LiteralKind::Null,
            span,
        })
    }

    fn local(&mut self, name: &str, span: FileSpan) -> ExprId {
        let name = self.ctx.interner.intern(name);
        self.alloc_expr(Expr::Name {
            name,
            symbol: None,
            span,
        })
    }

    fn list(&mut self, items: Vec<ExprId>, span: FileSpan) -> ExprId {
        self.alloc_expr(Expr::List { items, span })
    }

    fn aliased_call(&mut self, alias: Symbol, name: &str, args: Vec<ExprId>, span: FileSpan) -> ExprId {
        let name = self.ctx.interner.intern(name);
        let callee = self.alloc_expr(Expr::AliasQualified {
            alias,
            name,
            symbol: None,
            span,
        });
        self.alloc_expr(Expr::Call { callee, args, span })
    }

    fn prim(&mut self, prim: Primitive, args: Vec<ExprId>, span: FileSpan) -> ExprId {
        self.aliased_call(self.syntax_alias, prim.name(), args, span)
    }

    fn fix(&mut self, hook: FixerHook, arg: ExprId, span: FileSpan) -> ExprId {
        self.aliased_call(self.fix_alias, hook.name(), vec![arg], span)
    }

    // Statement accumulation

    fn emit(&mut self, stmt: StmtId) -> Result<(), InternalError> {
        self.contexts
            .last_mut()
            .ok_or(InternalError::ContextUnderflow { context: "meta" })?
            .stmts
            .push(stmt);
        Ok(())
    }

    fn result_var(&self) -> Result<String, InternalError> {
        self.contexts
            .last()
            .map(|context| context.result.clone())
            .ok_or(InternalError::ContextUnderflow { context: "meta" })
    }

    /// `let name = syntax::list();`
    fn declare_list(&mut self, name: &str, span: FileSpan) -> Result<(), InternalError> {
        let init = self.prim(Primitive::List, Vec::new(), span);
        let symbol = self.synthetic();
        let name = self.ctx.interner.intern(name);
        let stmt = self.alloc_stmt(Stmt::Let {
            name,
            symbol,
            ty: None,
            init: Some(init),
            span,
        });
        self.emit(stmt)
    }

    /// `result = syntax::push(result, builder);`
    fn push_builder(&mut self, builder: ExprId, span: FileSpan) -> Result<(), InternalError> {
        let result = self.result_var()?;
        let target = self.local(&result, span);
        let list = self.local(&result, span);
        let push = self.prim(Primitive::Push, vec![list, builder], span);
        let assign = self.alloc_expr(Expr::Assign {
            target,
            value: push,
            span,
        });
        let stmt = self.alloc_stmt(Stmt::Expr { expr: assign, span });
        self.emit(stmt)
    }

    // Verbatim copies

    fn copy_expr(&mut self, id: ExprId) -> Result<ExprId, InternalError> {
        let template = self.template;
        let dest = std::mem::take(&mut self.program);
        let mut copier = Copier::with_dest(&template.body, dest, Verbatim);
        let copy = copier.expr(id);
        self.program = copier.finish();
        self.annotate_copy(NodeRef::Expr(copy));
        if self.ctx.verify_passthrough {
            let interner = self.ctx.interner;
            verify(
                render_expr(&template.body, id, interner),
                render_expr(&self.program, copy, interner),
                template.body.exprs[id].span(),
            )?;
        }
        Ok(copy)
    }

    fn copy_stmt(&mut self, id: StmtId) -> Result<StmtId, InternalError> {
        let template = self.template;
        let dest = std::mem::take(&mut self.program);
        let mut copier = Copier::with_dest(&template.body, dest, Verbatim);
        let copy = copier.stmt(id);
        self.program = copier.finish();
        self.annotate_copy(NodeRef::Stmt(copy));
        if self.ctx.verify_passthrough {
            let interner = self.ctx.interner;
            verify(
                render_stmt(&template.body, id, interner),
                render_stmt(&self.program, copy, interner),
                template.body.stmts[id].span(),
            )?;
        }
        Ok(copy)
    }

    fn annotate_copy(&mut self, root: NodeRef) {
        self.locations.annotate_recursive(&self.program, root);
        for node in visit::preorder(&self.program, root) {
            let symbol = node_symbol(&self.program, node);
            self.annotate_symbol(symbol, node);
        }
    }

    /// Every program node must map back to the template
    fn check_annotations(&self) -> Result<(), InternalError> {
        let body = &self.program;
        let exprs = body.exprs.iter().map(|(id, _)| NodeRef::Expr(id));
        let stmts = body.stmts.iter().map(|(id, _)| NodeRef::Stmt(id));
        for node in exprs.chain(stmts) {
            self.locations.require(node)?;
            if node_symbol(body, node).is_some_and(|symbol| !symbol.is_synthetic()) {
                self.symbols.require(node)?;
            }
        }
        Ok(())
    }

    // Statements

    pub(crate) fn stmt(&mut self, id: StmtId) -> Result<(), InternalError> {
        let template = self.template;
        let node = NodeRef::Stmt(id);
        if !self.contains_run_time(node)? {
            let kind = self.passthrough_kind();
            self.record(node, kind);
            let copy = self.copy_stmt(id)?;
            return self.emit(copy);
        }

        self.record(node, TransformationKind::Transform);
        let stmt = &template.body.stmts[id];
        if self.stage(node)?.is_compile_time() {
            return self.compile_time_stmt(stmt);
        }
        let span = stmt.span();
        let builder = self.run_time_stmt(stmt)?;
        self.annotate_symbol(node_symbol(&template.body, node), NodeRef::Expr(builder));
        self.push_builder(builder, span)
    }

    /// Generation-time control construct whose bodies hold later-stage code
    fn compile_time_stmt(&mut self, stmt: &'a Stmt) -> Result<(), InternalError> {
        let copy = match stmt {
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                span,
            } => {
                let condition = self.copy_expr(*condition)?;
                let then_branch = self.nested_block(then_branch)?;
                let else_branch = match else_branch {
                    Some(block) => Some(self.nested_block(block)?),
                    None => None,
                };
                Stmt::If {
                    condition,
                    then_branch,
                    else_branch,
                    span: *span,
                }
            }
            Stmt::While {
                condition,
                body,
                span,
            } => Stmt::While {
                condition: self.copy_expr(*condition)?,
                body: self.loop_body(body)?,
                span: *span,
            },
            Stmt::ForEach {
                binding,
                symbol,
                iterable,
                body,
                span,
            } => Stmt::ForEach {
                binding: *binding,
                symbol: *symbol,
                iterable: self.copy_expr(*iterable)?,
                body: self.loop_body(body)?,
                span: *span,
            },
            Stmt::Switch {
                scrutinee,
                cases,
                default,
                span,
            } => {
                let scrutinee = self.copy_expr(*scrutinee)?;
                let mut copied = Vec::with_capacity(cases.len());
                for case in cases {
                    copied.push(sc_syntax::SwitchCase {
                        value: self.copy_expr(case.value)?,
                        body: self.nested_block(&case.body)?,
                    });
                }
                let default = match default {
                    Some(block) => Some(self.nested_block(block)?),
                    None => None,
                };
                Stmt::Switch {
                    scrutinee,
                    cases: copied,
                    default,
                    span: *span,
                }
            }
            Stmt::Block { block, span } => Stmt::Block {
                block: self.nested_block(block)?,
                span: *span,
            },
            Stmt::Let { span, .. } | Stmt::Expr { span, .. } | Stmt::Return { span, .. } => {
                return Err(InternalError::UnhandledNode {
                    pass: "meta",
                    node: stmt.kind_name().to_owned(),
                    span: *span,
                });
            }
        };
        let id = self.alloc_stmt(copy);
        let symbol = node_symbol(&self.program, NodeRef::Stmt(id));
        self.annotate_symbol(symbol, NodeRef::Stmt(id));
        self.emit(id)
    }

    /// Body of a generation-time construct, pushing onto the current list
    fn nested_block(&mut self, block: &'a Block) -> Result<Block, InternalError> {
        let result = self.result_var()?;
        let mut guard = self.enter(MetaContext::new(result));
        for stmt in &block.stmts {
            guard.stmt(*stmt)?;
        }
        let context = guard.finish()?;
        Ok(Block::new(context.stmts, block.span))
    }

    fn loop_body(&mut self, block: &'a Block) -> Result<Block, InternalError> {
        self.loop_depth += 1;
        let body = self.nested_block(block);
        self.loop_depth -= 1;
        body
    }

    /// Body of a later-stage construct, collected into a fresh list
    ///
    /// Returns the `syntax::block(list)` builder.
    fn run_time_block(&mut self, block: &'a Block) -> Result<ExprId, InternalError> {
        let var = self.scope.get_unique_identifier(RESULT_HINT);
        self.declare_list(&var, block.span)?;
        let depth = std::mem::take(&mut self.loop_depth);
        let context = {
            let mut guard = self.enter(MetaContext::new(var.clone()));
            for stmt in &block.stmts {
                guard.stmt(*stmt)?;
            }
            guard.finish()?
        };
        self.loop_depth = depth;
        for stmt in context.stmts {
            self.emit(stmt)?;
        }
        let list = self.local(&var, block.span);
        Ok(self.prim(Primitive::Block, vec![list], block.span))
    }

    fn optional_block(&mut self, block: Option<&'a Block>, span: FileSpan) -> Result<ExprId, InternalError> {
        match block {
            Some(block) => self.run_time_block(block),
            None => Ok(self.null(span)),
        }
    }

    fn run_time_stmt(&mut self, stmt: &'a Stmt) -> Result<ExprId, InternalError> {
        let span = stmt.span();
        let builder = match stmt {
            Stmt::Let {
                name,
                symbol,
                ty,
                init,
                ..
            } => {
                let name = self.binding_name(name, *symbol, span)?;
                let ty = match ty {
                    Some(ty) => self.type_builder(ty, span),
                    None => self.null(span),
                };
                let init = match init {
                    Some(init) => self.child(*init)?,
                    None => self.null(span),
                };
                self.prim(Primitive::Let, vec![name, ty, init], span)
            }
            Stmt::Expr { expr, .. } => {
                let expr = self.child(*expr)?;
                self.prim(Primitive::ExprStmt, vec![expr], span)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(value) => self.child(*value)?,
                    None => self.null(span),
                };
                self.prim(Primitive::Return, vec![value], span)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let condition = self.child(*condition)?;
                let then_branch = self.run_time_block(then_branch)?;
                let else_branch = self.optional_block(else_branch.as_ref(), span)?;
                self.prim(Primitive::If, vec![condition, then_branch, else_branch], span)
            }
            Stmt::While { condition, body, .. } => {
                let condition = self.child(*condition)?;
                let body = self.run_time_block(body)?;
                self.prim(Primitive::While, vec![condition, body], span)
            }
            Stmt::ForEach {
                binding,
                symbol,
                iterable,
                body,
                ..
            } => {
                let binding = self.binding_name(binding, *symbol, span)?;
                let iterable = self.child(*iterable)?;
                let body = self.run_time_block(body)?;
                self.prim(Primitive::ForEach, vec![binding, iterable, body], span)
            }
            Stmt::Switch {
                scrutinee,
                cases,
                default,
                ..
            } => {
                let scrutinee = self.child(*scrutinee)?;
                let mut built = Vec::with_capacity(cases.len());
                for case in cases {
                    let value = self.child(case.value)?;
                    let body = self.run_time_block(&case.body)?;
                    built.push(self.prim(Primitive::Case, vec![value, body], span));
                }
                let cases = self.list(built, span);
                let default = self.optional_block(default.as_ref(), span)?;
                self.prim(Primitive::Switch, vec![scrutinee, cases, default], span)
            }
            Stmt::Block { block, .. } => {
                let block = self.run_time_block(block)?;
                self.prim(Primitive::BlockStmt, vec![block], span)
            }
        };
        Ok(builder)
    }

    /// Name argument of a later-stage binding
    ///
    /// Under a generation-time loop the binding is emitted once per
    /// iteration, so its name is allocated during generation with
    /// `fix::unique_name` and held in a generation-time local that later
    /// references read.
    fn binding_name(
        &mut self,
        name: &Symbol,
        symbol: SymbolId,
        span: FileSpan,
    ) -> Result<ExprId, InternalError> {
        let text = self.text(name);
        let hint = self.string(text, span);
        if self.loop_depth == 0 {
            return Ok(hint);
        }
        let local = self.scope.get_unique_identifier(&format!("{text}_name"));
        let init = self.fix(FixerHook::UniqueName, hint, span);
        let decl = Stmt::Let {
            name: self.ctx.interner.intern(&local),
            symbol: self.synthetic(),
            ty: None,
            init: Some(init),
            span,
        };
        let decl = self.alloc_stmt(decl);
        self.emit(decl)?;
        let read = self.local(&local, span);
        self.generated_names.insert(symbol, local);
        Ok(read)
    }

    // Expressions

    /// Builder for an operand of a later-stage node
    ///
    /// Generation-time values are spliced in with `syntax::value`.
    fn child(&mut self, id: ExprId) -> Result<ExprId, InternalError> {
        let node = NodeRef::Expr(id);
        if self.contains_run_time(node)? || self.is_structural(id) {
            return self.transform_expr(id);
        }
        let kind = self.passthrough_kind();
        self.record(node, kind);
        let span = self.template.body.exprs[id].span();
        let copy = self.copy_expr(id)?;
        Ok(self.prim(Primitive::Value, vec![copy], span))
    }

    /// Type syntax that has no value of its own during generation
    fn is_structural(&self, id: ExprId) -> bool {
        match &self.template.body.exprs[id] {
            Expr::TypeExpr { .. } | Expr::TypeOf { .. } => true,
            Expr::Member { receiver, .. } | Expr::ConditionalMember { receiver, .. } => {
                self.is_structural(*receiver)
            }
            _ => false,
        }
    }

    /// Builder that reconstructs the node's syntax during generation
    fn transform_expr(&mut self, id: ExprId) -> Result<ExprId, InternalError> {
        let template = self.template;
        let node = NodeRef::Expr(id);
        self.record(node, TransformationKind::Transform);
        let expr = match self.replacements.get(&id) {
            Some(flattened) => flattened.clone(),
            None => template.body.exprs[id].clone(),
        };
        let span = expr.span();

        let builder = match &expr {
            Expr::Literal { .. } => {
                let copy = self.copy_expr(id)?;
                self.prim(Primitive::Value, vec![copy], span)
            }
            Expr::Name { name, symbol, .. } => {
                let generated = symbol
                    .and_then(|symbol| self.generated_names.get(&symbol).cloned());
                let text = match generated {
                    Some(local) => self.local(&local, span),
                    None => {
                        let text = self.text(name);
                        self.string(text, span)
                    }
                };
                self.prim(Primitive::Name, vec![text], span)
            }
            Expr::AliasQualified { alias, name, .. } => {
                let (alias, name) = (self.text(alias), self.text(name));
                let alias = self.string(alias, span);
                let name = self.string(name, span);
                self.prim(Primitive::AliasQualified, vec![alias, name], span)
            }
            Expr::QualifiedName { segments, .. } => {
                let segments = self.segments(segments, span);
                self.prim(Primitive::Qualified, vec![segments], span)
            }
            Expr::Binary {
                op, left, right, ..
            } => {
                let op = self.string(op.as_str(), span);
                let left = self.child(*left)?;
                let right = self.child(*right)?;
                self.prim(Primitive::Binary, vec![op, left, right], span)
            }
            Expr::Unary { op, operand, .. } => {
                let op = self.string(op.as_str(), span);
                let operand = self.child(*operand)?;
                self.prim(Primitive::Unary, vec![op, operand], span)
            }
            Expr::Assign { target, value, .. } => {
                let target = self.child(*target)?;
                let value = self.child(*value)?;
                self.prim(Primitive::Assign, vec![target, value], span)
            }
            Expr::Call { callee, args, .. } => {
                let callee = self.child(*callee)?;
                let mut built = Vec::with_capacity(args.len());
                for arg in args {
                    built.push(self.child(*arg)?);
                }
                let args = self.list(built, span);
                self.prim(Primitive::Call, vec![callee, args], span)
            }
            Expr::Member { receiver, name, .. } => {
                self.member(Primitive::Member, *receiver, name, span)?
            }
            Expr::ConditionalMember { receiver, name, .. } => {
                self.member(Primitive::ConditionalMember, *receiver, name, span)?
            }
            Expr::Index { target, index, .. } => {
                self.index(Primitive::Index, *target, *index, span)?
            }
            Expr::ConditionalIndex { target, index, .. } => {
                self.index(Primitive::ConditionalIndex, *target, *index, span)?
            }
            Expr::Paren { inner, .. } => {
                let inner = self.child(*inner)?;
                self.prim(Primitive::Paren, vec![inner], span)
            }
            Expr::TypeOf { ty, .. } => {
                let ty = self.type_builder(ty, span);
                self.prim(Primitive::TypeOf, vec![ty], span)
            }
            Expr::TypeExpr { ty, .. } => {
                let ty = self.type_builder(ty, span);
                self.prim(Primitive::TypeExpr, vec![ty], span)
            }
            Expr::NameOf { operand, .. } => {
                let operand = self.transform_expr(*operand)?;
                self.prim(Primitive::NameOf, vec![operand], span)
            }
            Expr::Interpolated { parts, .. } => {
                let mut built = Vec::with_capacity(parts.len());
                for part in parts {
                    let part = match part {
                        InterpolationPart::Text(text) => {
                            let text = self.string(text, span);
                            self.prim(Primitive::Text, vec![text], span)
                        }
                        InterpolationPart::Hole(hole) => {
                            let hole_span = template.body.exprs[*hole].span();
                            let inner = self.child(*hole)?;
                            let fixed = self.fix(FixerHook::InterpolationHole, inner, hole_span);
                            self.prim(Primitive::Hole, vec![fixed], hole_span)
                        }
                    };
                    built.push(part);
                }
                let parts = self.list(built, span);
                self.prim(Primitive::Interpolated, vec![parts], span)
            }
            Expr::Splice { inner, .. } => {
                let kind = self.passthrough_kind();
                self.record(NodeRef::Expr(*inner), kind);
                let copy = self.copy_expr(*inner)?;
                self.prim(Primitive::Value, vec![copy], span)
            }
            Expr::List { items, .. } => {
                let mut built = Vec::with_capacity(items.len());
                for item in items {
                    built.push(self.child(*item)?);
                }
                let items = self.list(built, span);
                self.prim(Primitive::ListExpr, vec![items], span)
            }
        };
        self.annotate_symbol(expr_symbol(&expr), NodeRef::Expr(builder));
        Ok(builder)
    }

    fn member(
        &mut self,
        prim: Primitive,
        receiver: ExprId,
        name: &Symbol,
        span: FileSpan,
    ) -> Result<ExprId, InternalError> {
        let receiver = self.child(receiver)?;
        let name = self.text(name);
        let name = self.string(name, span);
        Ok(self.prim(prim, vec![receiver, name], span))
    }

    fn index(
        &mut self,
        prim: Primitive,
        target: ExprId,
        index: ExprId,
        span: FileSpan,
    ) -> Result<ExprId, InternalError> {
        let target = self.child(target)?;
        let index = self.child(index)?;
        Ok(self.prim(prim, vec![target, index], span))
    }

    fn segments(&mut self, segments: &[Symbol], span: FileSpan) -> ExprId {
        let built = segments
            .iter()
            .map(|segment| {
                let text = self.text(segment);
                self.string(text, span)
            })
            .collect();
        self.list(built, span)
    }

    /// Builder for type syntax
    fn type_builder(&mut self, ty: &TypeRef, span: FileSpan) -> ExprId {
        match ty {
            TypeRef::Path { segments, args } => {
                let segments = self.segments(segments, span);
                let built = args
                    .iter()
                    .map(|arg| self.type_builder(arg, span))
                    .collect();
                let args = self.list(built, span);
                self.prim(Primitive::TypePath, vec![segments, args], span)
            }
            TypeRef::Nullable(inner) => {
                let inner = self.type_builder(inner, span);
                self.prim(Primitive::Nullable, vec![inner], span)
            }
        }
    }
}

fn verify(original: String, copy: String, span: FileSpan) -> Result<(), InternalError> {
    if original == copy {
        Ok(())
    } else {
        Err(InternalError::PassthroughMismatch {
            original,
            copy,
            span,
        })
    }
}

fn expr_symbol(expr: &Expr) -> Option<SymbolId> {
    match expr {
        Expr::Name { symbol, .. }
        | Expr::AliasQualified { symbol, .. }
        | Expr::QualifiedName { symbol, .. }
        | Expr::Member { symbol, .. }
        | Expr::ConditionalMember { symbol, .. } => *symbol,
        _ => None,
    }
}

/// Host symbol a node refers to or declares
fn node_symbol(body: &Body, node: NodeRef) -> Option<SymbolId> {
    match node {
        NodeRef::Expr(id) => expr_symbol(&body.exprs[id]),
        NodeRef::Stmt(id) => match &body.stmts[id] {
            Stmt::Let { symbol, .. } | Stmt::ForEach { symbol, .. } => Some(*symbol),
            _ => None,
        },
    }
}

fn chain_link(expr: &Expr) -> Option<ExprId> {
    match expr {
        Expr::Member { receiver, .. } | Expr::ConditionalMember { receiver, .. } => Some(*receiver),
        Expr::Index { target, .. } | Expr::ConditionalIndex { target, .. } => Some(*target),
        Expr::Call { callee, .. } => Some(*callee),
        _ => None,
    }
}

/// Flatten the first conditional access of every access chain
fn flatten_chains(body: &Body) -> FxHashMap<ExprId, Expr> {
    let inner: FxHashSet<ExprId> = body.exprs.iter().filter_map(|(_, expr)| chain_link(expr)).collect();
    let mut replacements = FxHashMap::default();
    for (id, expr) in body.exprs.iter() {
        if chain_link(expr).is_none() || inner.contains(&id) || !has_conditional_access(body, id) {
            continue;
        }
        if let Some((node, flattened)) = ConditionalAccessFlattener::new().flatten_once(body, id) {
            trace!(node = %NodeRef::Expr(node), "flattened conditional access");
            replacements.insert(node, flattened);
        }
    }
    replacements
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_identity::SymbolRegistry;
    use sc_span::FileId;
    use sc_syntax::{BodyBuilder, StageTable};

    fn nest_and_fail(rewriter: &mut Rewriter<'_>) -> Result<(), InternalError> {
        let mut outer = rewriter.enter(MetaContext::new("outer".to_owned()));
        let inner = outer.enter(MetaContext::new("inner".to_owned()));
        assert_eq!(inner.contexts.len(), 2);
        Err(InternalError::ContextUnderflow { context: "meta" })
    }

    #[test]
    fn test_guard_pops_context_on_error() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let block = b.block(Vec::new());
        let template = b.into_member("emit", &["template"], Vec::new(), block);
        let registry = SymbolRegistry::new();
        let facts = StageTable::new();
        let ctx = RewriteContext::new(&interner, &registry, &facts);
        let stages = StageStore::new();
        let mut rewriter = Rewriter::new(&template, &stages, &ctx);

        assert!(nest_and_fail(&mut rewriter).is_err());
        assert!(rewriter.contexts.is_empty());
    }

    #[test]
    fn test_unmapped_host_symbol_is_internal_error() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let block = b.block(Vec::new());
        let template = b.into_member("emit", &["template"], Vec::new(), block);
        let registry = SymbolRegistry::new();
        let facts = StageTable::new();
        let ctx = RewriteContext::new(&interner, &registry, &facts).with_verification(true);
        let stages = StageStore::new();
        let mut rewriter = Rewriter::new(&template, &stages, &ctx);

        let span = template.block.span;
        let local = rewriter.local("stmts", span);
        assert!(rewriter.check_annotations().is_ok());

        let host = rewriter.alloc_expr(Expr::Name {
            name: interner.intern("x"),
            symbol: Some(SymbolId(0)),
            span,
        });
        let err = rewriter.check_annotations().unwrap_err();
        assert_eq!(
            err,
            InternalError::MissingSymbolMapping {
                node: NodeRef::Expr(host).to_string()
            }
        );

        rewriter.annotate_symbol(Some(SymbolId(0)), NodeRef::Expr(host));
        assert!(rewriter.check_annotations().is_ok());
        assert!(rewriter.locations.resolve(NodeRef::Expr(local)).is_some());
    }

    #[test]
    fn test_only_chain_tops_are_flattened() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let recv = b.name("recv", None);
        let spliced = b.splice(recv);
        let out = b.cond_member(spliced, "Out");
        let len = b.member(out, "Length");
        let body = b.finish();

        let replacements = flatten_chains(&body);
        assert_eq!(replacements.len(), 1);
        assert!(matches!(replacements.get(&out), Some(Expr::Member { .. })));
        assert!(!replacements.contains_key(&len));
    }
}
