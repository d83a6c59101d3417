//! Tree-construction primitives
//!
//! Every `syntax::` primitive allocates its node into the artifact and hands
//! back a [`SyntaxValue`]. Plain values reaching an expression position are
//! lifted into literals, which is how generation-time results end up inside
//! the later-stage tree.

use crate::evaluator::{EvalError, Evaluator};
use crate::value::{SyntaxValue, Value};
use sc_fixers::interpolation::fix_hole;
use sc_intern::Symbol;
use sc_span::FileSpan;
use sc_syntax::primitive::{FixerHook, Primitive, FIX_ALIAS, SYNTAX_ALIAS};
use sc_syntax::{
    BinaryOp, Block, Expr, ExprId, InterpolationPart, LiteralKind, Stmt, StmtId, SwitchCase,
    SymbolId, TypeRef, UnaryOp,
};
use tracing::trace;

fn take<const N: usize>(
    name: String,
    args: Vec<Value>,
    span: FileSpan,
) -> Result<[Value; N], EvalError> {
    let found = args.len();
    <[Value; N]>::try_from(args).map_err(|_| EvalError::ArgumentCount {
        name,
        expected: N,
        found,
        span,
    })
}

fn mismatch(expected: &'static str, found: &Value, span: FileSpan) -> EvalError {
    EvalError::TypeMismatch {
        expected,
        found: found.type_name(),
        span,
    }
}

impl Evaluator<'_> {
    pub(crate) fn primitive(
        &mut self,
        prim: Primitive,
        args: Vec<Value>,
        span: FileSpan,
    ) -> Result<Value, EvalError> {
        trace!(primitive = prim.name(), args = args.len(), "materialise");
        let name = format!("{SYNTAX_ALIAS}::{}", prim.name());
        let syntax = match prim {
            Primitive::List => return Ok(Value::List(args)),
            Primitive::Push => {
                let [list, item] = take::<2>(name, args, span)?;
                let mut items = list_of(list, span)?;
                items.push(item);
                return Ok(Value::List(items));
            }
            Primitive::Value => {
                let [value] = take::<1>(name, args, span)?;
                SyntaxValue::Expr(self.expr_of(value, span)?)
            }
            Primitive::Name => {
                let [text] = take::<1>(name, args, span)?;
                let name = self.binding_of(&text, span)?;
                self.alloc(Expr::Name {
                    name,
                    symbol: None,
                    span,
                })
            }
            Primitive::AliasQualified => {
                let [alias, text] = take::<2>(name, args, span)?;
                let alias = self.symbol_of(&alias, span)?;
                let name = self.symbol_of(&text, span)?;
                self.alloc(Expr::AliasQualified {
                    alias,
                    name,
                    symbol: None,
                    span,
                })
            }
            Primitive::Qualified => {
                let [segments] = take::<1>(name, args, span)?;
                let segments = self.symbols_of(segments, span)?;
                self.alloc(Expr::QualifiedName {
                    segments,
                    symbol: None,
                    span,
                })
            }
            Primitive::Binary => {
                let [op, left, right] = take::<3>(name, args, span)?;
                let token = string_of(op, span)?;
                let op = BinaryOp::from_token(&token)
                    .ok_or(EvalError::UnknownOperator { op: token, span })?;
                let left = self.expr_of(left, span)?;
                let right = self.expr_of(right, span)?;
                self.alloc(Expr::Binary {
                    op,
                    left,
                    right,
                    span,
                })
            }
            Primitive::Unary => {
                let [op, operand] = take::<2>(name, args, span)?;
                let token = string_of(op, span)?;
                let op = UnaryOp::from_token(&token)
                    .ok_or(EvalError::UnknownOperator { op: token, span })?;
                let operand = self.expr_of(operand, span)?;
                self.alloc(Expr::Unary { op, operand, span })
            }
            Primitive::Assign => {
                let [target, value] = take::<2>(name, args, span)?;
                let target = self.expr_of(target, span)?;
                let value = self.expr_of(value, span)?;
                self.alloc(Expr::Assign {
                    target,
                    value,
                    span,
                })
            }
            Primitive::Call => {
                let [callee, args] = take::<2>(name, args, span)?;
                let callee = self.expr_of(callee, span)?;
                let args = self.exprs_of(args, span)?;
                self.alloc(Expr::Call { callee, args, span })
            }
            Primitive::Member | Primitive::ConditionalMember => {
                let [receiver, text] = take::<2>(name, args, span)?;
                let receiver = self.expr_of(receiver, span)?;
                let name = self.symbol_of(&text, span)?;
                self.alloc(if prim == Primitive::Member {
                    Expr::Member {
                        receiver,
                        name,
                        symbol: None,
                        span,
                    }
                } else {
                    Expr::ConditionalMember {
                        receiver,
                        name,
                        symbol: None,
                        span,
                    }
                })
            }
            Primitive::Index | Primitive::ConditionalIndex => {
                let [target, index] = take::<2>(name, args, span)?;
                let target = self.expr_of(target, span)?;
                let index = self.expr_of(index, span)?;
                self.alloc(if prim == Primitive::Index {
                    Expr::Index {
                        target,
                        index,
                        span,
                    }
                } else {
                    Expr::ConditionalIndex {
                        target,
                        index,
                        span,
                    }
                })
            }
            Primitive::Paren => {
                let [inner] = take::<1>(name, args, span)?;
                let inner = self.expr_of(inner, span)?;
                self.alloc(Expr::Paren { inner, span })
            }
            Primitive::TypeOf => {
                let [ty] = take::<1>(name, args, span)?;
                let ty = type_of(ty, span)?;
                self.alloc(Expr::TypeOf { ty, span })
            }
            Primitive::TypeExpr => {
                let [ty] = take::<1>(name, args, span)?;
                let ty = type_of(ty, span)?;
                self.alloc(Expr::TypeExpr { ty, span })
            }
            Primitive::NameOf => {
                let [operand] = take::<1>(name, args, span)?;
                let operand = self.expr_of(operand, span)?;
                self.alloc(Expr::NameOf { operand, span })
            }
            Primitive::Interpolated => {
                let [parts] = take::<1>(name, args, span)?;
                let parts = list_of(parts, span)?
                    .into_iter()
                    .map(|part| match part {
                        Value::Syntax(SyntaxValue::Part(part)) => Ok(part),
                        other => Err(mismatch("interpolation part", &other, span)),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                self.alloc(Expr::Interpolated { parts, span })
            }
            Primitive::Text => {
                let [text] = take::<1>(name, args, span)?;
                SyntaxValue::Part(InterpolationPart::Text(string_of(text, span)?))
            }
            Primitive::Hole => {
                let [hole] = take::<1>(name, args, span)?;
                SyntaxValue::Part(InterpolationPart::Hole(self.expr_of(hole, span)?))
            }
            Primitive::ListExpr => {
                let [items] = take::<1>(name, args, span)?;
                let items = self.exprs_of(items, span)?;
                self.alloc(Expr::List { items, span })
            }
            Primitive::TypePath => {
                let [segments, args] = take::<2>(name, args, span)?;
                let segments = self.symbols_of(segments, span)?;
                let args = list_of(args, span)?
                    .into_iter()
                    .map(|arg| type_of(arg, span))
                    .collect::<Result<Vec<_>, _>>()?;
                SyntaxValue::Type(TypeRef::Path { segments, args })
            }
            Primitive::Nullable => {
                let [inner] = take::<1>(name, args, span)?;
                SyntaxValue::Type(TypeRef::Nullable(Box::new(type_of(inner, span)?)))
            }
            Primitive::Let => {
                let [text, ty, init] = take::<3>(name, args, span)?;
                let name = self.binding_of(&text, span)?;
                let ty = match ty {
                    Value::Null => None,
                    ty => Some(type_of(ty, span)?),
                };
                let init = self.optional_expr(init, span)?;
                let symbol = self.synthetic();
                self.alloc_stmt(Stmt::Let {
                    name,
                    symbol,
                    ty,
                    init,
                    span,
                })
            }
            Primitive::ExprStmt => {
                let [expr] = take::<1>(name, args, span)?;
                let expr = self.expr_of(expr, span)?;
                self.alloc_stmt(Stmt::Expr { expr, span })
            }
            Primitive::If => {
                let [condition, then_branch, else_branch] = take::<3>(name, args, span)?;
                let condition = self.expr_of(condition, span)?;
                let then_branch = block_of(then_branch, span)?;
                let else_branch = optional_block(else_branch, span)?;
                self.alloc_stmt(Stmt::If {
                    condition,
                    then_branch,
                    else_branch,
                    span,
                })
            }
            Primitive::While => {
                let [condition, body] = take::<2>(name, args, span)?;
                let condition = self.expr_of(condition, span)?;
                let body = block_of(body, span)?;
                self.alloc_stmt(Stmt::While {
                    condition,
                    body,
                    span,
                })
            }
            Primitive::ForEach => {
                let [binding, iterable, body] = take::<3>(name, args, span)?;
                let binding = self.binding_of(&binding, span)?;
                let iterable = self.expr_of(iterable, span)?;
                let body = block_of(body, span)?;
                let symbol = self.synthetic();
                self.alloc_stmt(Stmt::ForEach {
                    binding,
                    symbol,
                    iterable,
                    body,
                    span,
                })
            }
            Primitive::Switch => {
                let [scrutinee, cases, default] = take::<3>(name, args, span)?;
                let scrutinee = self.expr_of(scrutinee, span)?;
                let cases = list_of(cases, span)?
                    .into_iter()
                    .map(|case| match case {
                        Value::Syntax(SyntaxValue::Case(case)) => Ok(case),
                        other => Err(mismatch("case syntax", &other, span)),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let default = optional_block(default, span)?;
                self.alloc_stmt(Stmt::Switch {
                    scrutinee,
                    cases,
                    default,
                    span,
                })
            }
            Primitive::Case => {
                let [value, body] = take::<2>(name, args, span)?;
                let value = self.expr_of(value, span)?;
                let body = block_of(body, span)?;
                SyntaxValue::Case(SwitchCase { value, body })
            }
            Primitive::Return => {
                let [value] = take::<1>(name, args, span)?;
                let value = self.optional_expr(value, span)?;
                self.alloc_stmt(Stmt::Return { value, span })
            }
            Primitive::Block => {
                let [stmts] = take::<1>(name, args, span)?;
                let stmts = list_of(stmts, span)?
                    .into_iter()
                    .map(|stmt| stmt_of(stmt, span))
                    .collect::<Result<Vec<_>, _>>()?;
                SyntaxValue::Block(Block::new(stmts, span))
            }
            Primitive::BlockStmt => {
                let [block] = take::<1>(name, args, span)?;
                let block = block_of(block, span)?;
                self.alloc_stmt(Stmt::Block { block, span })
            }
        };
        Ok(Value::Syntax(syntax))
    }

    pub(crate) fn hook(
        &mut self,
        hook: FixerHook,
        args: Vec<Value>,
        span: FileSpan,
    ) -> Result<Value, EvalError> {
        let name = format!("{FIX_ALIAS}::{}", hook.name());
        match hook {
            FixerHook::InterpolationHole => {
                let [hole] = take::<1>(name, args, span)?;
                let hole = self.expr_of(hole, span)?;
                let fixed = fix_hole(&mut self.artifact, hole);
                Ok(Value::Syntax(SyntaxValue::Expr(fixed)))
            }
            FixerHook::UniqueName => {
                let [hint] = take::<1>(name, args, span)?;
                let hint = string_of(hint, span)?;
                Ok(Value::String(self.names.get_unique_identifier(&hint)))
            }
        }
    }

    fn alloc(&mut self, expr: Expr) -> SyntaxValue {
        SyntaxValue::Expr(self.artifact.alloc_expr(expr))
    }

    fn alloc_stmt(&mut self, stmt: Stmt) -> SyntaxValue {
        SyntaxValue::Stmt(self.artifact.alloc_stmt(stmt))
    }

    fn synthetic(&mut self) -> SymbolId {
        let symbol = SymbolId::synthetic(self.next_synthetic);
        self.next_synthetic += 1;
        symbol
    }

    /// Expression syntax for a value, lifting plain values into literals
    fn expr_of(&mut self, value: Value, span: FileSpan) -> Result<ExprId, EvalError> {
        let kind = match value {
            Value::Syntax(SyntaxValue::Expr(id)) => return Ok(id),
            Value::Syntax(SyntaxValue::Type(ty)) => {
                return Ok(self.artifact.alloc_expr(Expr::TypeExpr { ty, span }));
            }
            Value::List(items) => {
                let items = items
                    .into_iter()
                    .map(|item| self.expr_of(item, span))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(self.artifact.alloc_expr(Expr::List { items, span }));
            }
            Value::Syntax(other) => {
                return Err(mismatch("expression", &Value::Syntax(other), span));
            }
            Value::Null => LiteralKind::Null,
            Value::Bool(value) => LiteralKind::Bool(value),
            Value::Int(value) => LiteralKind::Int(value),
            Value::Float(value) => LiteralKind::Float(value),
            Value::String(value) => LiteralKind::String(value),
        };
        Ok(self.artifact.alloc_expr(Expr::Literal { kind, span }))
    }

    fn optional_expr(&mut self, value: Value, span: FileSpan) -> Result<Option<ExprId>, EvalError> {
        match value {
            Value::Null => Ok(None),
            value => self.expr_of(value, span).map(Some),
        }
    }

    fn exprs_of(&mut self, value: Value, span: FileSpan) -> Result<Vec<ExprId>, EvalError> {
        list_of(value, span)?
            .into_iter()
            .map(|item| self.expr_of(item, span))
            .collect()
    }

    fn symbol_of(&self, value: &Value, span: FileSpan) -> Result<Symbol, EvalError> {
        value
            .as_str()
            .map(|text| self.interner.intern(text))
            .ok_or_else(|| mismatch("string", value, span))
    }

    /// Like `symbol_of`, also recording the name as taken in the artifact
    fn binding_of(&mut self, value: &Value, span: FileSpan) -> Result<Symbol, EvalError> {
        let symbol = self.symbol_of(value, span)?;
        self.names.register(self.interner.resolve(&symbol));
        Ok(symbol)
    }

    fn symbols_of(&self, value: Value, span: FileSpan) -> Result<Vec<Symbol>, EvalError> {
        list_of(value, span)?
            .iter()
            .map(|item| self.symbol_of(item, span))
            .collect()
    }
}

fn list_of(value: Value, span: FileSpan) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::List(items) => Ok(items),
        other => Err(mismatch("list", &other, span)),
    }
}

fn string_of(value: Value, span: FileSpan) -> Result<String, EvalError> {
    match value {
        Value::String(text) => Ok(text),
        other => Err(mismatch("string", &other, span)),
    }
}

fn stmt_of(value: Value, span: FileSpan) -> Result<StmtId, EvalError> {
    match value {
        Value::Syntax(SyntaxValue::Stmt(id)) => Ok(id),
        other => Err(mismatch("statement syntax", &other, span)),
    }
}

fn block_of(value: Value, span: FileSpan) -> Result<Block, EvalError> {
    match value {
        Value::Syntax(SyntaxValue::Block(block)) => Ok(block),
        other => Err(mismatch("block syntax", &other, span)),
    }
}

fn optional_block(value: Value, span: FileSpan) -> Result<Option<Block>, EvalError> {
    match value {
        Value::Null => Ok(None),
        value => block_of(value, span).map(Some),
    }
}

fn type_of(value: Value, span: FileSpan) -> Result<TypeRef, EvalError> {
    match value {
        Value::Syntax(SyntaxValue::Type(ty)) => Ok(ty),
        other => Err(mismatch("type syntax", &other, span)),
    }
}
