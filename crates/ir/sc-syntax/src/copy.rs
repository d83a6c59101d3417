//! Copying subtrees between bodies
//!
//! Passes that need a modified tree copy it into a fresh [`Body`] through a
//! [`Copier`], substituting nodes on the way via a [`CopyHook`]. Spans are
//! kept, so a copy still points at the original source.

use crate::{Block, Body, Expr, ExprId, InterpolationPart, Stmt, StmtId, SwitchCase, TypeRef};

/// Substitutions applied while copying
pub trait CopyHook {
    /// Replacement for the expression at `id` in `source`
    ///
    /// Child ids of the returned expression refer to `source` and are copied
    /// in turn.
    fn substitute(&mut self, _source: &Body, _id: ExprId) -> Option<Expr> {
        None
    }

    /// Replacement for a type in annotation or `typeof` position
    fn map_type(&mut self, ty: &TypeRef) -> TypeRef {
        ty.clone()
    }
}

/// Verbatim copy
#[derive(Debug, Default, Clone, Copy)]
pub struct Verbatim;

impl CopyHook for Verbatim {}

/// Copies nodes of `source` into an owned destination body
pub struct Copier<'s, H> {
    source: &'s Body,
    dest: Body,
    hook: H,
}

impl<'s, H: CopyHook> Copier<'s, H> {
    /// Copy into a new, empty body
    pub fn new(source: &'s Body, hook: H) -> Self {
        Self::with_dest(source, Body::new(), hook)
    }

    /// Copy into an existing body
    pub fn with_dest(source: &'s Body, dest: Body, hook: H) -> Self {
        Self { source, dest, hook }
    }

    /// The hook, for inspecting state it gathered
    pub fn hook(&self) -> &H {
        &self.hook
    }

    /// Destination body
    pub fn dest(&self) -> &Body {
        &self.dest
    }

    /// Give up the destination body
    pub fn finish(self) -> Body {
        self.dest
    }

    /// Copy the expression tree rooted at `id`
    pub fn expr(&mut self, id: ExprId) -> ExprId {
        let expr = match self.hook.substitute(self.source, id) {
            Some(expr) => expr,
            None => self.source.exprs[id].clone(),
        };
        let copied = match expr {
            Expr::Binary {
                op,
                left,
                right,
                span,
            } => Expr::Binary {
                op,
                left: self.expr(left),
                right: self.expr(right),
                span,
            },
            Expr::Unary { op, operand, span } => Expr::Unary {
                op,
                operand: self.expr(operand),
                span,
            },
            Expr::Assign {
                target,
                value,
                span,
            } => Expr::Assign {
                target: self.expr(target),
                value: self.expr(value),
                span,
            },
            Expr::Call { callee, args, span } => Expr::Call {
                callee: self.expr(callee),
                args: args.into_iter().map(|arg| self.expr(arg)).collect(),
                span,
            },
            Expr::Member {
                receiver,
                name,
                symbol,
                span,
            } => Expr::Member {
                receiver: self.expr(receiver),
                name,
                symbol,
                span,
            },
            Expr::ConditionalMember {
                receiver,
                name,
                symbol,
                span,
            } => Expr::ConditionalMember {
                receiver: self.expr(receiver),
                name,
                symbol,
                span,
            },
            Expr::Index {
                target,
                index,
                span,
            } => Expr::Index {
                target: self.expr(target),
                index: self.expr(index),
                span,
            },
            Expr::ConditionalIndex {
                target,
                index,
                span,
            } => Expr::ConditionalIndex {
                target: self.expr(target),
                index: self.expr(index),
                span,
            },
            Expr::Paren { inner, span } => Expr::Paren {
                inner: self.expr(inner),
                span,
            },
            Expr::NameOf { operand, span } => Expr::NameOf {
                operand: self.expr(operand),
                span,
            },
            Expr::Splice { inner, span } => Expr::Splice {
                inner: self.expr(inner),
                span,
            },
            Expr::TypeOf { ty, span } => Expr::TypeOf {
                ty: self.hook.map_type(&ty),
                span,
            },
            Expr::TypeExpr { ty, span } => Expr::TypeExpr {
                ty: self.hook.map_type(&ty),
                span,
            },
            Expr::Interpolated { parts, span } => Expr::Interpolated {
                parts: parts
                    .into_iter()
                    .map(|part| match part {
                        InterpolationPart::Hole(hole) => InterpolationPart::Hole(self.expr(hole)),
                        InterpolationPart::Text(text) => InterpolationPart::Text(text),
                    })
                    .collect(),
                span,
            },
            Expr::List { items, span } => Expr::List {
                items: items.into_iter().map(|item| self.expr(item)).collect(),
                span,
            },
            leaf @ (Expr::Literal { .. }
            | Expr::Name { .. }
            | Expr::AliasQualified { .. }
            | Expr::QualifiedName { .. }) => leaf,
        };
        self.dest.alloc_expr(copied)
    }

    /// Copy the statement tree rooted at `id`
    pub fn stmt(&mut self, id: StmtId) -> StmtId {
        let copied = match self.source.stmts[id].clone() {
            Stmt::Let {
                name,
                symbol,
                ty,
                init,
                span,
            } => Stmt::Let {
                name,
                symbol,
                ty: ty.map(|ty| self.hook.map_type(&ty)),
                init: init.map(|init| self.expr(init)),
                span,
            },
            Stmt::Expr { expr, span } => Stmt::Expr {
                expr: self.expr(expr),
                span,
            },
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                span,
            } => Stmt::If {
                condition: self.expr(condition),
                then_branch: self.block(&then_branch),
                else_branch: else_branch.map(|block| self.block(&block)),
                span,
            },
            Stmt::While {
                condition,
                body,
                span,
            } => Stmt::While {
                condition: self.expr(condition),
                body: self.block(&body),
                span,
            },
            Stmt::ForEach {
                binding,
                symbol,
                iterable,
                body,
                span,
            } => Stmt::ForEach {
                binding,
                symbol,
                iterable: self.expr(iterable),
                body: self.block(&body),
                span,
            },
            Stmt::Switch {
                scrutinee,
                cases,
                default,
                span,
            } => Stmt::Switch {
                scrutinee: self.expr(scrutinee),
                cases: cases
                    .into_iter()
                    .map(|case| SwitchCase {
                        value: self.expr(case.value),
                        body: self.block(&case.body),
                    })
                    .collect(),
                default: default.map(|block| self.block(&block)),
                span,
            },
            Stmt::Return { value, span } => Stmt::Return {
                value: value.map(|value| self.expr(value)),
                span,
            },
            Stmt::Block { block, span } => Stmt::Block {
                block: self.block(&block),
                span,
            },
        };
        self.dest.alloc_stmt(copied)
    }

    /// Copy every statement of `block`
    pub fn block(&mut self, block: &Block) -> Block {
        Block::new(
            block.stmts.iter().map(|stmt| self.stmt(*stmt)).collect(),
            block.span,
        )
    }
}
