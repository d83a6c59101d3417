//! Convenience construction of template trees
//!
//! Hosts that do not own a parser, and tests, build trees through
//! [`BodyBuilder`]. Every node gets a distinct span so that location
//! bookkeeping can be checked node by node.

use crate::{
    BinaryOp, Block, Body, Expr, ExprId, InterpolationPart, LiteralKind, Member, Parameter, Stmt,
    StmtId, SwitchCase, SymbolId, TypeRef, UnaryOp,
};
use sc_intern::{Interner, Symbol};
use sc_span::{FileId, FileSpan, Span};

/// Incremental tree builder
pub struct BodyBuilder<'i> {
    body: Body,
    interner: &'i Interner,
    file: FileId,
    offset: u32,
}

impl<'i> BodyBuilder<'i> {
    /// Create a builder for a tree in `file`
    #[must_use]
    pub fn new(interner: &'i Interner, file: FileId) -> Self {
        Self {
            body: Body::new(),
            interner,
            file,
            offset: 0,
        }
    }

    fn next_span(&mut self) -> FileSpan {
        let start = self.offset;
        self.offset += 1;
        FileSpan::new(self.file, Span::new(start, start + 1))
    }

    /// Intern a name with the builder's interner
    pub fn sym(&self, text: &str) -> Symbol {
        self.interner.intern(text)
    }

    fn expr(&mut self, make: impl FnOnce(FileSpan) -> Expr) -> ExprId {
        let span = self.next_span();
        self.body.alloc_expr(make(span))
    }

    fn stmt(&mut self, make: impl FnOnce(FileSpan) -> Stmt) -> StmtId {
        let span = self.next_span();
        self.body.alloc_stmt(make(span))
    }

    /// Integer literal
    pub fn int(&mut self, value: i64) -> ExprId {
        self.expr(|span| Expr::Literal {
            kind: LiteralKind::Int(value),
            span,
        })
    }

    /// String literal
    pub fn string(&mut self, value: &str) -> ExprId {
        let kind = LiteralKind::String(value.to_string());
        self.expr(|span| Expr::Literal { kind, span })
    }

    /// Boolean literal
    pub fn bool(&mut self, value: bool) -> ExprId {
        self.expr(|span| Expr::Literal {
            kind: LiteralKind::Bool(value),
            span,
        })
    }

    /// Null literal
    pub fn null(&mut self) -> ExprId {
        self.expr(|span| Expr::Literal {
            kind: LiteralKind::Null,
            span,
        })
    }

    /// Name resolved to `symbol`
    pub fn name(&mut self, text: &str, symbol: Option<SymbolId>) -> ExprId {
        let name = self.sym(text);
        self.expr(|span| Expr::Name { name, symbol, span })
    }

    /// Alias-qualified name
    pub fn alias(&mut self, alias: &str, text: &str) -> ExprId {
        let alias = self.sym(alias);
        let name = self.sym(text);
        self.expr(|span| Expr::AliasQualified {
            alias,
            name,
            symbol: None,
            span,
        })
    }

    /// Dotted qualified name
    pub fn qualified(&mut self, segments: &[&str]) -> ExprId {
        let segments = segments.iter().map(|seg| self.sym(seg)).collect();
        self.expr(|span| Expr::QualifiedName {
            segments,
            symbol: None,
            span,
        })
    }

    /// Binary expression
    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        self.expr(|span| Expr::Binary {
            op,
            left,
            right,
            span,
        })
    }

    /// Unary expression
    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        self.expr(|span| Expr::Unary { op, operand, span })
    }

    /// Assignment
    pub fn assign(&mut self, target: ExprId, value: ExprId) -> ExprId {
        self.expr(|span| Expr::Assign {
            target,
            value,
            span,
        })
    }

    /// Call
    pub fn call(&mut self, callee: ExprId, args: Vec<ExprId>) -> ExprId {
        self.expr(|span| Expr::Call { callee, args, span })
    }

    /// Member access
    pub fn member(&mut self, receiver: ExprId, text: &str) -> ExprId {
        let name = self.sym(text);
        self.expr(|span| Expr::Member {
            receiver,
            name,
            symbol: None,
            span,
        })
    }

    /// Index access
    pub fn index(&mut self, target: ExprId, index: ExprId) -> ExprId {
        self.expr(|span| Expr::Index {
            target,
            index,
            span,
        })
    }

    /// Null-conditional member access
    pub fn cond_member(&mut self, receiver: ExprId, text: &str) -> ExprId {
        let name = self.sym(text);
        self.expr(|span| Expr::ConditionalMember {
            receiver,
            name,
            symbol: None,
            span,
        })
    }

    /// Null-conditional index access
    pub fn cond_index(&mut self, target: ExprId, index: ExprId) -> ExprId {
        self.expr(|span| Expr::ConditionalIndex {
            target,
            index,
            span,
        })
    }

    /// Parenthesized expression
    pub fn paren(&mut self, inner: ExprId) -> ExprId {
        self.expr(|span| Expr::Paren { inner, span })
    }

    /// `typeof(ty)`
    pub fn type_of(&mut self, ty: TypeRef) -> ExprId {
        self.expr(|span| Expr::TypeOf { ty, span })
    }

    /// `nameof(operand)`
    pub fn name_of(&mut self, operand: ExprId) -> ExprId {
        self.expr(|span| Expr::NameOf { operand, span })
    }

    /// Type in expression position
    pub fn type_expr(&mut self, ty: TypeRef) -> ExprId {
        self.expr(|span| Expr::TypeExpr { ty, span })
    }

    /// Interpolated string
    pub fn interpolated(&mut self, parts: Vec<InterpolationPart>) -> ExprId {
        self.expr(|span| Expr::Interpolated { parts, span })
    }

    /// Splice of a now-computed tree
    pub fn splice(&mut self, inner: ExprId) -> ExprId {
        self.expr(|span| Expr::Splice { inner, span })
    }

    /// List literal
    pub fn list(&mut self, items: Vec<ExprId>) -> ExprId {
        self.expr(|span| Expr::List { items, span })
    }

    /// Type path from dotted text (`a.b.C`)
    pub fn ty(&self, dotted: &str) -> TypeRef {
        TypeRef::Path {
            segments: dotted.split('.').map(|seg| self.sym(seg)).collect(),
            args: Vec::new(),
        }
    }

    /// Nullable wrapper
    #[must_use]
    pub fn nullable(ty: TypeRef) -> TypeRef {
        TypeRef::Nullable(Box::new(ty))
    }

    /// Local declaration
    pub fn let_(&mut self, text: &str, symbol: SymbolId, ty: Option<TypeRef>, init: Option<ExprId>) -> StmtId {
        let name = self.sym(text);
        self.stmt(|span| Stmt::Let {
            name,
            symbol,
            ty,
            init,
            span,
        })
    }

    /// Expression statement
    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.stmt(|span| Stmt::Expr { expr, span })
    }

    /// If statement
    pub fn if_(&mut self, condition: ExprId, then_branch: Block, else_branch: Option<Block>) -> StmtId {
        self.stmt(|span| Stmt::If {
            condition,
            then_branch,
            else_branch,
            span,
        })
    }

    /// While loop
    pub fn while_(&mut self, condition: ExprId, body: Block) -> StmtId {
        self.stmt(|span| Stmt::While {
            condition,
            body,
            span,
        })
    }

    /// For-each loop
    pub fn for_each(&mut self, binding: &str, symbol: SymbolId, iterable: ExprId, body: Block) -> StmtId {
        let binding = self.sym(binding);
        self.stmt(|span| Stmt::ForEach {
            binding,
            symbol,
            iterable,
            body,
            span,
        })
    }

    /// Switch statement
    pub fn switch(&mut self, scrutinee: ExprId, cases: Vec<SwitchCase>, default: Option<Block>) -> StmtId {
        self.stmt(|span| Stmt::Switch {
            scrutinee,
            cases,
            default,
            span,
        })
    }

    /// Return statement
    pub fn ret(&mut self, value: Option<ExprId>) -> StmtId {
        self.stmt(|span| Stmt::Return { value, span })
    }

    /// Nested block statement
    pub fn block_stmt(&mut self, block: Block) -> StmtId {
        self.stmt(|span| Stmt::Block { block, span })
    }

    /// Group statements into a block
    pub fn block(&mut self, stmts: Vec<StmtId>) -> Block {
        let span = self.next_span();
        Block::new(stmts, span)
    }

    /// Parameter declaration
    pub fn param(&mut self, text: &str, symbol: SymbolId) -> Parameter {
        let name = self.sym(text);
        let span = self.next_span();
        Parameter {
            name,
            symbol,
            ty: None,
            span,
        }
    }

    /// Finish the tree
    #[must_use]
    pub fn finish(self) -> Body {
        self.body
    }

    /// Finish the tree as a member
    #[must_use]
    pub fn into_member(self, name: &str, attributes: &[&str], params: Vec<Parameter>, block: Block) -> Member {
        let name_sym = self.sym(name);
        let attributes = attributes.iter().map(|attr| self.sym(attr)).collect();
        let span = FileSpan::new(self.file, Span::new(0, self.offset));
        Member {
            name: name_sym,
            attributes,
            params,
            type_params: Vec::new(),
            body: self.body,
            block,
            span,
        }
    }

    /// Read access to the tree under construction
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }
}
