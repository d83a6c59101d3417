//! Generation program evaluator

use crate::value::{SyntaxValue, Value};
use crate::GeneratedArtifact;
use rustc_hash::{FxHashMap, FxHashSet};
use sc_identity::LexicalScope;
use sc_intern::{Interner, Symbol};
use sc_span::FileSpan;
use sc_syntax::primitive::{FixerHook, Primitive, FIX_ALIAS, SYNTAX_ALIAS};
use sc_syntax::{
    BinaryOp, Block, Body, Expr, ExprId, InterpolationPart, LiteralKind, Member, Stmt, StmtId,
    UnaryOp,
};
use thiserror::Error;
use tracing::{debug, instrument};

/// Alias of the built-in generation-time library
pub const INTRINSIC_ALIAS: &str = "meta";

/// Iterations after which a `while` loop is considered runaway
pub const MAX_ITERATIONS: u64 = 1_000_000;

/// Evaluation error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Read of a local that was never assigned
    #[error("undefined local `{name}` at {span}")]
    UndefinedLocal {
        /// Local name
        name: String,
        /// Location of the read
        span: FileSpan,
    },
    /// A value of the wrong type
    #[error("expected {expected}, found {found} at {span}")]
    TypeMismatch {
        /// Expected type
        expected: &'static str,
        /// Type found
        found: &'static str,
        /// Location of the use
        span: FileSpan,
    },
    /// Operator applied to operands it does not support
    #[error("cannot apply `{op}` to {left} and {right} at {span}")]
    InvalidOperands {
        /// Operator
        op: &'static str,
        /// Left operand type
        left: &'static str,
        /// Right operand type
        right: &'static str,
        /// Location of the operation
        span: FileSpan,
    },
    /// Division by zero
    #[error("division by zero at {span}")]
    DivisionByZero {
        /// Location of the division
        span: FileSpan,
    },
    /// Call of a function the generation host does not provide
    #[error("unknown function `{name}` at {span}")]
    UnknownFunction {
        /// Qualified function name
        name: String,
        /// Location of the call
        span: FileSpan,
    },
    /// Wrong number of arguments
    #[error("`{name}` takes {expected} arguments, got {found} at {span}")]
    ArgumentCount {
        /// Function name
        name: String,
        /// Expected argument count
        expected: usize,
        /// Actual argument count
        found: usize,
        /// Location of the call
        span: FileSpan,
    },
    /// Operator token no tree operator matches
    #[error("unknown operator `{op}` at {span}")]
    UnknownOperator {
        /// The token
        op: String,
        /// Location of the primitive call
        span: FileSpan,
    },
    /// Index past the end of a list
    #[error("index {index} out of bounds for length {len} at {span}")]
    IndexOutOfBounds {
        /// The index
        index: i64,
        /// List length
        len: usize,
        /// Location of the access
        span: FileSpan,
    },
    /// Construct with no generation-time meaning
    #[error("{kind} cannot be evaluated during generation at {span}")]
    Unsupported {
        /// Node kind
        kind: &'static str,
        /// Location of the node
        span: FileSpan,
    },
    /// Runaway loop
    #[error("loop at {span} exceeded {limit} iterations")]
    IterationLimit {
        /// Iteration limit
        limit: u64,
        /// Location of the loop
        span: FileSpan,
    },
    /// Generator returned without producing a block
    #[error("generator finished without returning a block at {span}")]
    MissingResult {
        /// Location of the generator
        span: FileSpan,
    },
}

impl EvalError {
    /// Location the error refers to
    #[must_use]
    pub fn span(&self) -> FileSpan {
        match self {
            Self::UndefinedLocal { span, .. }
            | Self::TypeMismatch { span, .. }
            | Self::InvalidOperands { span, .. }
            | Self::DivisionByZero { span }
            | Self::UnknownFunction { span, .. }
            | Self::ArgumentCount { span, .. }
            | Self::UnknownOperator { span, .. }
            | Self::IndexOutOfBounds { span, .. }
            | Self::Unsupported { span, .. }
            | Self::IterationLimit { span, .. }
            | Self::MissingResult { span } => *span,
        }
    }
}

/// Control flow out of a statement
enum Flow {
    Next,
    Return(Value),
}

/// Executes generation programs
///
/// Each evaluator builds one artifact; `run` consumes it.
pub struct Evaluator<'a> {
    pub(crate) interner: &'a Interner,
    syntax_alias: Symbol,
    fix_alias: Symbol,
    intrinsic_aliases: FxHashSet<Symbol>,
    locals: FxHashMap<Symbol, Value>,
    /// Tree under construction
    pub(crate) artifact: Body,
    /// Names the artifact binds or refers to
    pub(crate) names: LexicalScope,
    pub(crate) next_synthetic: u32,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator with the intrinsic library under `meta`
    #[must_use]
    pub fn new(interner: &'a Interner) -> Self {
        let mut intrinsic_aliases = FxHashSet::default();
        intrinsic_aliases.insert(interner.intern(INTRINSIC_ALIAS));
        Self {
            interner,
            syntax_alias: interner.intern(SYNTAX_ALIAS),
            fix_alias: interner.intern(FIX_ALIAS),
            intrinsic_aliases,
            locals: FxHashMap::default(),
            artifact: Body::new(),
            names: LexicalScope::new(),
            next_synthetic: 0,
        }
    }

    /// Also expose the intrinsic library under `alias`
    #[must_use]
    pub fn with_intrinsic_alias(mut self, alias: Symbol) -> Self {
        self.intrinsic_aliases.insert(alias);
        self
    }

    /// Run a generation program with its compile-time arguments
    ///
    /// # Errors
    /// Returns `EvalError` if execution fails or the program does not
    /// return a block
    #[instrument(skip_all, fields(params = program.params.len()))]
    pub fn run(mut self, program: &Member, args: Vec<Value>) -> Result<GeneratedArtifact, EvalError> {
        let interner = self.interner;
        if args.len() != program.params.len() {
            return Err(EvalError::ArgumentCount {
                name: interner.resolve(&program.name).to_owned(),
                expected: program.params.len(),
                found: args.len(),
                span: program.span,
            });
        }
        for (param, arg) in program.params.iter().zip(args) {
            self.locals.insert(param.name, arg);
        }

        match self.block(&program.body, &program.block)? {
            Flow::Return(Value::Syntax(SyntaxValue::Block(block))) => {
                debug!(
                    program = interner.resolve(&program.name),
                    nodes = self.artifact.node_count(),
                    "materialised artifact"
                );
                Ok(GeneratedArtifact {
                    body: self.artifact,
                    block,
                })
            }
            Flow::Return(other) => Err(EvalError::TypeMismatch {
                expected: "block syntax",
                found: other.type_name(),
                span: program.span,
            }),
            Flow::Next => Err(EvalError::MissingResult { span: program.span }),
        }
    }

    fn block(&mut self, body: &Body, block: &Block) -> Result<Flow, EvalError> {
        for stmt in &block.stmts {
            if let Flow::Return(value) = self.stmt(body, *stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }

    fn stmt(&mut self, body: &Body, id: StmtId) -> Result<Flow, EvalError> {
        match &body.stmts[id] {
            Stmt::Let { name, init, .. } => {
                let value = match init {
                    Some(init) => self.expr(body, *init)?,
                    None => Value::Null,
                };
                self.locals.insert(*name, value);
                Ok(Flow::Next)
            }
            Stmt::Expr { expr, .. } => {
                self.expr(body, *expr)?;
                Ok(Flow::Next)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.expr(body, *condition)?.is_truthy() {
                    self.block(body, then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.block(body, else_branch)
                } else {
                    Ok(Flow::Next)
                }
            }
            Stmt::While {
                condition,
                body: loop_body,
                span,
            } => {
                let mut iterations = 0;
                while self.expr(body, *condition)?.is_truthy() {
                    iterations += 1;
                    if iterations > MAX_ITERATIONS {
                        return Err(EvalError::IterationLimit {
                            limit: MAX_ITERATIONS,
                            span: *span,
                        });
                    }
                    if let Flow::Return(value) = self.block(body, loop_body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Next)
            }
            Stmt::ForEach {
                binding,
                iterable,
                body: loop_body,
                span,
                ..
            } => {
                let items = match self.expr(body, *iterable)? {
                    Value::List(items) => items,
                    other => {
                        return Err(EvalError::TypeMismatch {
                            expected: "list",
                            found: other.type_name(),
                            span: *span,
                        });
                    }
                };
                for item in items {
                    self.locals.insert(*binding, item);
                    if let Flow::Return(value) = self.block(body, loop_body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Next)
            }
            Stmt::Switch {
                scrutinee,
                cases,
                default,
                ..
            } => {
                let scrutinee = self.expr(body, *scrutinee)?;
                for case in cases {
                    if self.expr(body, case.value)? == scrutinee {
                        return self.block(body, &case.body);
                    }
                }
                match default {
                    Some(default) => self.block(body, default),
                    None => Ok(Flow::Next),
                }
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(value) => self.expr(body, *value)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Block { block, .. } => self.block(body, block),
        }
    }

    fn expr(&mut self, body: &Body, id: ExprId) -> Result<Value, EvalError> {
        let expr = &body.exprs[id];
        let span = expr.span();
        match expr {
            Expr::Literal { kind, .. } => Ok(literal(kind)),
            Expr::Name { name, .. } => self.locals.get(name).cloned().ok_or_else(|| {
                EvalError::UndefinedLocal {
                    name: self.interner.resolve(name).to_owned(),
                    span,
                }
            }),
            Expr::Binary {
                op, left, right, ..
            } => self.binary(body, *op, *left, *right, span),
            Expr::Unary { op, operand, .. } => {
                let operand = self.expr(body, *operand)?;
                unary(*op, operand, span)
            }
            Expr::Assign { target, value, .. } => {
                let Expr::Name { name, .. } = &body.exprs[*target] else {
                    return Err(EvalError::Unsupported {
                        kind: "assignment to a non-local",
                        span,
                    });
                };
                let value = self.expr(body, *value)?;
                self.locals.insert(*name, value.clone());
                Ok(value)
            }
            Expr::Call { callee, args, .. } => self.call(body, *callee, args, span),
            Expr::Index { target, index, .. } => {
                let target = self.expr(body, *target)?;
                let index = self.expr(body, *index)?;
                match (target, index) {
                    (Value::List(items), Value::Int(index)) => usize::try_from(index)
                        .ok()
                        .and_then(|at| items.get(at).cloned())
                        .ok_or_else(|| EvalError::IndexOutOfBounds {
                            index,
                            len: items.len(),
                            span,
                        }),
                    (Value::List(_), other) => Err(EvalError::TypeMismatch {
                        expected: "int",
                        found: other.type_name(),
                        span,
                    }),
                    (other, _) => Err(EvalError::TypeMismatch {
                        expected: "list",
                        found: other.type_name(),
                        span,
                    }),
                }
            }
            Expr::Paren { inner, .. } => self.expr(body, *inner),
            Expr::NameOf { operand, .. } => match &body.exprs[*operand] {
                Expr::Name { name, .. }
                | Expr::AliasQualified { name, .. }
                | Expr::Member { name, .. }
                | Expr::ConditionalMember { name, .. } => {
                    Ok(Value::String(self.interner.resolve(name).to_owned()))
                }
                Expr::QualifiedName { segments, .. } => Ok(Value::String(
                    segments
                        .last()
                        .map(|last| self.interner.resolve(last).to_owned())
                        .unwrap_or_default(),
                )),
                other => Err(EvalError::Unsupported {
                    kind: other.kind_name(),
                    span,
                }),
            },
            Expr::Interpolated { parts, .. } => {
                let mut text = String::new();
                for part in parts {
                    match part {
                        InterpolationPart::Text(literal) => text.push_str(literal),
                        InterpolationPart::Hole(hole) => {
                            text.push_str(&self.expr(body, *hole)?.to_text());
                        }
                    }
                }
                Ok(Value::String(text))
            }
            Expr::List { items, .. } => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.expr(body, *item)?);
                }
                Ok(Value::List(values))
            }
            Expr::AliasQualified { .. }
            | Expr::QualifiedName { .. }
            | Expr::Member { .. }
            | Expr::ConditionalMember { .. }
            | Expr::ConditionalIndex { .. }
            | Expr::TypeOf { .. }
            | Expr::TypeExpr { .. }
            | Expr::Splice { .. } => Err(EvalError::Unsupported {
                kind: expr.kind_name(),
                span,
            }),
        }
    }

    fn binary(
        &mut self,
        body: &Body,
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
        span: FileSpan,
    ) -> Result<Value, EvalError> {
        match op {
            BinaryOp::And => {
                if !self.expr(body, left)?.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.expr(body, right)?.is_truthy()))
            }
            BinaryOp::Or => {
                if self.expr(body, left)?.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.expr(body, right)?.is_truthy()))
            }
            BinaryOp::Coalesce => match self.expr(body, left)? {
                Value::Null => self.expr(body, right),
                value => Ok(value),
            },
            _ => {
                let left = self.expr(body, left)?;
                let right = self.expr(body, right)?;
                eval_binary_op(op, left, right, span)
            }
        }
    }

    fn call(
        &mut self,
        body: &Body,
        callee: ExprId,
        args: &[ExprId],
        span: FileSpan,
    ) -> Result<Value, EvalError> {
        let Expr::AliasQualified { alias, name, .. } = &body.exprs[callee] else {
            return Err(EvalError::Unsupported {
                kind: "call of an unqualified function",
                span,
            });
        };
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.expr(body, *arg)?);
        }

        let interner = self.interner;
        let (alias_text, name_text) = (interner.resolve(alias), interner.resolve(name));
        let unknown = || EvalError::UnknownFunction {
            name: format!("{alias_text}::{name_text}"),
            span,
        };
        if *alias == self.syntax_alias {
            let prim = Primitive::from_name(name_text).ok_or_else(unknown)?;
            self.primitive(prim, values, span)
        } else if *alias == self.fix_alias {
            let hook = FixerHook::from_name(name_text).ok_or_else(unknown)?;
            self.hook(hook, values, span)
        } else if self.intrinsic_aliases.contains(alias) {
            intrinsic(alias_text, name_text, values, span).ok_or_else(unknown)?
        } else {
            Err(unknown())
        }
    }
}

fn literal(kind: &LiteralKind) -> Value {
    match kind {
        LiteralKind::Int(value) => Value::Int(*value),
        LiteralKind::Float(value) => Value::Float(*value),
        LiteralKind::String(value) => Value::String(value.clone()),
        LiteralKind::Bool(value) => Value::Bool(*value),
        LiteralKind::Null => Value::Null,
    }
}

fn unary(op: UnaryOp, operand: Value, span: FileSpan) -> Result<Value, EvalError> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Int(value)) => Ok(Value::Int(value.wrapping_neg())),
        (UnaryOp::Neg, Value::Float(value)) => Ok(Value::Float(-value)),
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
        (UnaryOp::Neg, other) => Err(EvalError::TypeMismatch {
            expected: "number",
            found: other.type_name(),
            span,
        }),
    }
}

fn eval_binary_op(op: BinaryOp, left: Value, right: Value, span: FileSpan) -> Result<Value, EvalError> {
    match (op, left, right) {
        // Integer operations
        (BinaryOp::Add, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_add(r))),
        (BinaryOp::Sub, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_sub(r))),
        (BinaryOp::Mul, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_mul(r))),
        (BinaryOp::Div | BinaryOp::Mod, Value::Int(_), Value::Int(0)) => {
            Err(EvalError::DivisionByZero { span })
        }
        (BinaryOp::Div, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_div(r))),
        (BinaryOp::Mod, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_rem(r))),

        // Float operations
        (BinaryOp::Add, Value::Float(l), Value::Float(r)) => Ok(Value::Float(l + r)),
        (BinaryOp::Sub, Value::Float(l), Value::Float(r)) => Ok(Value::Float(l - r)),
        (BinaryOp::Mul, Value::Float(l), Value::Float(r)) => Ok(Value::Float(l * r)),
        (BinaryOp::Div, Value::Float(l), Value::Float(r)) => Ok(Value::Float(l / r)),
        (BinaryOp::Mod, Value::Float(l), Value::Float(r)) => Ok(Value::Float(l % r)),

        // Concatenation
        (BinaryOp::Add, Value::String(l), r) => Ok(Value::String(l + &r.to_text())),
        (BinaryOp::Add, l, Value::String(r)) => Ok(Value::String(l.to_text() + &r)),
        (BinaryOp::Add, Value::List(mut l), Value::List(r)) => {
            l.extend(r);
            Ok(Value::List(l))
        }

        // Equality
        (BinaryOp::Eq, l, r) => Ok(Value::Bool(l == r)),
        (BinaryOp::Ne, l, r) => Ok(Value::Bool(l != r)),

        // Ordering
        (BinaryOp::Lt, Value::Int(l), Value::Int(r)) => Ok(Value::Bool(l < r)),
        (BinaryOp::Le, Value::Int(l), Value::Int(r)) => Ok(Value::Bool(l <= r)),
        (BinaryOp::Gt, Value::Int(l), Value::Int(r)) => Ok(Value::Bool(l > r)),
        (BinaryOp::Ge, Value::Int(l), Value::Int(r)) => Ok(Value::Bool(l >= r)),
        (BinaryOp::Lt, Value::Float(l), Value::Float(r)) => Ok(Value::Bool(l < r)),
        (BinaryOp::Le, Value::Float(l), Value::Float(r)) => Ok(Value::Bool(l <= r)),
        (BinaryOp::Gt, Value::Float(l), Value::Float(r)) => Ok(Value::Bool(l > r)),
        (BinaryOp::Ge, Value::Float(l), Value::Float(r)) => Ok(Value::Bool(l >= r)),
        (BinaryOp::Lt, Value::String(l), Value::String(r)) => Ok(Value::Bool(l < r)),
        (BinaryOp::Le, Value::String(l), Value::String(r)) => Ok(Value::Bool(l <= r)),
        (BinaryOp::Gt, Value::String(l), Value::String(r)) => Ok(Value::Bool(l > r)),
        (BinaryOp::Ge, Value::String(l), Value::String(r)) => Ok(Value::Bool(l >= r)),

        (op, left, right) => Err(EvalError::InvalidOperands {
            op: op.as_str(),
            left: left.type_name(),
            right: right.type_name(),
            span,
        }),
    }
}

/// The generation-time library; `None` for names it does not define
fn intrinsic(
    alias: &str,
    name: &str,
    args: Vec<Value>,
    span: FileSpan,
) -> Option<Result<Value, EvalError>> {
    let expected = match name {
        "range" | "len" => 1,
        "concat" => 2,
        _ => return None,
    };
    if args.len() != expected {
        return Some(Err(EvalError::ArgumentCount {
            name: format!("{alias}::{name}"),
            expected,
            found: args.len(),
            span,
        }));
    }
    let mut args = args.into_iter();
    let first = args.next().unwrap_or(Value::Null);
    let result = match (name, first) {
        ("range", Value::Int(count)) => Ok(Value::List((0..count.max(0)).map(Value::Int).collect())),
        ("len", Value::List(items)) => Ok(Value::Int(items.len() as i64)),
        ("len", Value::String(text)) => Ok(Value::Int(text.chars().count() as i64)),
        ("concat", first) => match (first, args.next().unwrap_or(Value::Null)) {
            (Value::List(mut left), Value::List(right)) => {
                left.extend(right);
                Ok(Value::List(left))
            }
            (left, right) => Ok(Value::String(left.to_text() + &right.to_text())),
        },
        ("range", other) => Err(EvalError::TypeMismatch {
            expected: "int",
            found: other.type_name(),
            span,
        }),
        (_, other) => Err(EvalError::TypeMismatch {
            expected: "list or string",
            found: other.type_name(),
            span,
        }),
    };
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_span::FileId;
    use sc_syntax::BodyBuilder;

    fn make_program<'i>(
        interner: &'i Interner,
        build: impl FnOnce(&mut BodyBuilder<'i>) -> Vec<StmtId>,
    ) -> Member {
        let mut b = BodyBuilder::new(interner, FileId(0));
        let stmts = build(&mut b);
        let block = b.block(stmts);
        b.into_member("emit_generator", &[], Vec::new(), block)
    }

    /// `return syntax::block(syntax::push(syntax::list(), syntax::expr_stmt(syntax::value(<value>))));`
    fn emit_value(b: &mut BodyBuilder<'_>, value: ExprId) -> StmtId {
        let value_fn = b.alias("syntax", "value");
        let lifted = b.call(value_fn, vec![value]);
        let stmt_fn = b.alias("syntax", "expr_stmt");
        let stmt = b.call(stmt_fn, vec![lifted]);
        let list_fn = b.alias("syntax", "list");
        let empty = b.call(list_fn, Vec::new());
        let push_fn = b.alias("syntax", "push");
        let pushed = b.call(push_fn, vec![empty, stmt]);
        let block_fn = b.alias("syntax", "block");
        let block = b.call(block_fn, vec![pushed]);
        b.ret(Some(block))
    }

    fn run_to_text(interner: &Interner, program: &Member) -> Result<String, EvalError> {
        let artifact = Evaluator::new(interner).run(program, Vec::new())?;
        Ok(artifact.render_stmts(interner))
    }

    #[test]
    fn test_intrinsics_compute_now() {
        let interner = Interner::new();
        let program = make_program(&interner, |b| {
            let range = b.alias("meta", "range");
            let three = b.int(3);
            let items = b.call(range, vec![three]);
            let len = b.alias("meta", "len");
            let count = b.call(len, vec![items]);
            vec![emit_value(b, count)]
        });
        assert_eq!(run_to_text(&interner, &program).unwrap(), "3;");
    }

    #[test]
    fn test_interpolation_and_concat_produce_strings() {
        let interner = Interner::new();
        let program = make_program(&interner, |b| {
            let n = b.int(2);
            let decl = b.let_("n", sc_syntax::SymbolId(0), None, Some(n));
            let hole = b.name("n", None);
            let text = b.interpolated(vec![
                InterpolationPart::Text("n=".to_owned()),
                InterpolationPart::Hole(hole),
            ]);
            let concat = b.alias("meta", "concat");
            let suffix = b.string("!");
            let joined = b.call(concat, vec![text, suffix]);
            vec![decl, emit_value(b, joined)]
        });
        assert_eq!(run_to_text(&interner, &program).unwrap(), "\"n=2!\";");
    }

    #[test]
    fn test_division_by_zero_is_reported() {
        let interner = Interner::new();
        let program = make_program(&interner, |b| {
            let one = b.int(1);
            let zero = b.int(0);
            let div = b.binary(BinaryOp::Div, one, zero);
            vec![emit_value(b, div)]
        });
        let err = run_to_text(&interner, &program).unwrap_err();
        assert!(matches!(err, EvalError::DivisionByZero { .. }));
    }

    #[test]
    fn test_unknown_functions_are_named() {
        let interner = Interner::new();
        let program = make_program(&interner, |b| {
            let missing = b.alias("meta", "missing");
            let call = b.call(missing, Vec::new());
            vec![emit_value(b, call)]
        });
        let err = run_to_text(&interner, &program).unwrap_err();
        assert_eq!(
            err,
            EvalError::UnknownFunction {
                name: "meta::missing".to_owned(),
                span: err.span(),
            }
        );
    }

    #[test]
    fn test_program_must_return_block() {
        let interner = Interner::new();
        let program = make_program(&interner, |b| {
            let one = b.int(1);
            vec![b.ret(Some(one))]
        });
        let err = Evaluator::new(&interner).run(&program, Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            EvalError::TypeMismatch {
                expected: "block syntax",
                found: "int",
                ..
            }
        ));
    }

    #[test]
    fn test_argument_count_is_checked() {
        let interner = Interner::new();
        let program = make_program(&interner, |_| Vec::new());
        let err = Evaluator::new(&interner)
            .run(&program, vec![Value::Int(1)])
            .unwrap_err();
        assert!(matches!(
            err,
            EvalError::ArgumentCount {
                expected: 0,
                found: 1,
                ..
            }
        ));
    }
}
