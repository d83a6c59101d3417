//! Template syntax trees
//!
//! The tree model every stage of the engine works on. A [`Body`] owns two
//! arenas, one for expressions and one for statements; children are held by
//! index. Passes never mutate a body they were given: the classifier
//! records its results in side tables, and the rewriter and fixers allocate
//! into a fresh body.
//!
//! Node identity is the arena index ([`NodeRef`]). It is only meaningful
//! together with the body that allocated it.

pub mod builder;
pub mod copy;
pub mod pretty;
pub mod primitive;
pub mod stage;
pub mod visit;

pub use builder::BodyBuilder;
pub use copy::{Copier, CopyHook, Verbatim};
pub use primitive::Primitive;
pub use stage::{StageFacts, StageTable, StageTag};

use la_arena::{Arena, Idx};
use sc_intern::Symbol;
use sc_span::FileSpan;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Expression node id
pub type ExprId = Idx<Expr>;
/// Statement node id
pub type StmtId = Idx<Stmt>;

/// Host symbol identity, as produced by the host's name resolution
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

impl SymbolId {
    /// Start of the id range reserved for locals the engine synthesizes
    ///
    /// Hosts must hand out ids below this bound.
    pub const SYNTHETIC_START: u32 = 1 << 31;

    /// The `index`-th synthesized symbol
    #[must_use]
    pub fn synthetic(index: u32) -> Self {
        Self(Self::SYNTHETIC_START | index)
    }

    /// Whether the symbol was synthesized rather than resolved by the host
    #[must_use]
    pub fn is_synthetic(self) -> bool {
        self.0 >= Self::SYNTHETIC_START
    }
}

/// Identity of a node inside one [`Body`]
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum NodeRef {
    /// Expression node
    Expr(ExprId),
    /// Statement node
    Stmt(StmtId),
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expr(id) => write!(f, "expr#{}", u32::from(id.into_raw())),
            Self::Stmt(id) => write!(f, "stmt#{}", u32::from(id.into_raw())),
        }
    }
}

impl From<ExprId> for NodeRef {
    fn from(id: ExprId) -> Self {
        Self::Expr(id)
    }
}

impl From<StmtId> for NodeRef {
    fn from(id: StmtId) -> Self {
        Self::Stmt(id)
    }
}

/// Node storage for one tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    /// Expression arena
    pub exprs: Arena<Expr>,
    /// Statement arena
    pub stmts: Arena<Stmt>,
}

impl Body {
    /// Creates a new empty body
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an expression
    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        self.exprs.alloc(expr)
    }

    /// Allocate a statement
    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        self.stmts.alloc(stmt)
    }

    /// Span of any node
    #[must_use]
    pub fn span_of(&self, node: NodeRef) -> FileSpan {
        match node {
            NodeRef::Expr(id) => self.exprs[id].span(),
            NodeRef::Stmt(id) => self.stmts[id].span(),
        }
    }

    /// Number of nodes allocated in this body
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.exprs.len() + self.stmts.len()
    }
}

/// Literal kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralKind {
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Bool(bool),
    /// The null literal
    Null,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,
    /// Modulo (%)
    Mod,
    /// Equality (==)
    Eq,
    /// Inequality (!=)
    Ne,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// Logical AND (&&)
    And,
    /// Logical OR (||)
    Or,
    /// Null coalescing (??)
    Coalesce,
}

impl BinaryOp {
    const ALL: [Self; 14] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Mod,
        Self::Eq,
        Self::Ne,
        Self::Lt,
        Self::Le,
        Self::Gt,
        Self::Ge,
        Self::And,
        Self::Or,
        Self::Coalesce,
    ];

    /// Source token of the operator
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::Coalesce => "??",
        }
    }

    /// Parse an operator token
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == token)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
    /// Logical NOT (!)
    Not,
}

impl UnaryOp {
    /// Source token of the operator
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "!",
        }
    }

    /// Parse an operator token
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "-" => Some(Self::Neg),
            "!" => Some(Self::Not),
            _ => None,
        }
    }
}

/// Type syntax
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// Possibly generic, possibly qualified type path (`a.b.List<T>`)
    Path {
        /// Path segments
        segments: Vec<Symbol>,
        /// Generic arguments
        args: Vec<TypeRef>,
    },
    /// Nullable type (`T?`)
    Nullable(Box<TypeRef>),
}

impl TypeRef {
    /// Single-segment, non-generic type name
    #[must_use]
    pub fn named(name: Symbol) -> Self {
        Self::Path {
            segments: vec![name],
            args: Vec::new(),
        }
    }

    /// The type with one outer nullable marker removed
    #[must_use]
    pub fn strip_nullable(&self) -> &Self {
        match self {
            Self::Nullable(inner) => inner,
            Self::Path { .. } => self,
        }
    }

    /// If this is a bare single-segment name, that name
    #[must_use]
    pub fn as_bare_name(&self) -> Option<Symbol> {
        match self {
            Self::Path { segments, args } if segments.len() == 1 && args.is_empty() => {
                Some(segments[0])
            }
            Self::Path { .. } | Self::Nullable(_) => None,
        }
    }
}

/// Piece of an interpolated string
#[derive(Debug, Clone, PartialEq)]
pub enum InterpolationPart {
    /// Literal text
    Text(String),
    /// Expression hole
    Hole(ExprId),
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal {
        /// Literal kind
        kind: LiteralKind,
        /// Source location
        span: FileSpan,
    },
    /// Simple name
    Name {
        /// Identifier
        name: Symbol,
        /// Resolved symbol, if the host resolved one
        symbol: Option<SymbolId>,
        /// Source location
        span: FileSpan,
    },
    /// Alias-qualified name (`global::Console`, `meta::range`)
    AliasQualified {
        /// Alias
        alias: Symbol,
        /// Name inside the alias
        name: Symbol,
        /// Resolved symbol
        symbol: Option<SymbolId>,
        /// Source location
        span: FileSpan,
    },
    /// Multi-segment dotted name (`System.Collections.List`)
    QualifiedName {
        /// Segments, leftmost first
        segments: Vec<Symbol>,
        /// Resolved symbol
        symbol: Option<SymbolId>,
        /// Source location
        span: FileSpan,
    },
    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: ExprId,
        /// Right operand
        right: ExprId,
        /// Source location
        span: FileSpan,
    },
    /// Unary operation
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: ExprId,
        /// Source location
        span: FileSpan,
    },
    /// Assignment
    Assign {
        /// Assigned place
        target: ExprId,
        /// Assigned value
        value: ExprId,
        /// Source location
        span: FileSpan,
    },
    /// Call
    Call {
        /// Callee
        callee: ExprId,
        /// Arguments
        args: Vec<ExprId>,
        /// Source location
        span: FileSpan,
    },
    /// Member access (`a.b`)
    Member {
        /// Receiver
        receiver: ExprId,
        /// Member name
        name: Symbol,
        /// Resolved member symbol
        symbol: Option<SymbolId>,
        /// Source location
        span: FileSpan,
    },
    /// Index access (`a[i]`)
    Index {
        /// Indexed expression
        target: ExprId,
        /// Index
        index: ExprId,
        /// Source location
        span: FileSpan,
    },
    /// Null-conditional member access (`a?.b`)
    ConditionalMember {
        /// Receiver
        receiver: ExprId,
        /// Member name
        name: Symbol,
        /// Resolved member symbol
        symbol: Option<SymbolId>,
        /// Source location
        span: FileSpan,
    },
    /// Null-conditional index access (`a?[i]`)
    ConditionalIndex {
        /// Indexed expression
        target: ExprId,
        /// Index
        index: ExprId,
        /// Source location
        span: FileSpan,
    },
    /// Parenthesized expression
    Paren {
        /// Inner expression
        inner: ExprId,
        /// Source location
        span: FileSpan,
    },
    /// Type introspection (`typeof(T)`)
    TypeOf {
        /// Inspected type
        ty: TypeRef,
        /// Source location
        span: FileSpan,
    },
    /// Name introspection (`nameof(x)`)
    NameOf {
        /// Named expression
        operand: ExprId,
        /// Source location
        span: FileSpan,
    },
    /// Type used in expression position (`int.Parse`)
    TypeExpr {
        /// The type
        ty: TypeRef,
        /// Source location
        span: FileSpan,
    },
    /// Interpolated string (`$"a{b}c"`)
    Interpolated {
        /// Text and holes in order
        parts: Vec<InterpolationPart>,
        /// Source location
        span: FileSpan,
    },
    /// Splice of a tree computed now (`$(e)`)
    Splice {
        /// Compile-time expression producing the tree
        inner: ExprId,
        /// Source location
        span: FileSpan,
    },
    /// List literal (`[a, b]`)
    List {
        /// Items
        items: Vec<ExprId>,
        /// Source location
        span: FileSpan,
    },
}

impl Expr {
    /// Source location of the expression
    #[must_use]
    pub fn span(&self) -> FileSpan {
        match self {
            Self::Literal { span, .. }
            | Self::Name { span, .. }
            | Self::AliasQualified { span, .. }
            | Self::QualifiedName { span, .. }
            | Self::Binary { span, .. }
            | Self::Unary { span, .. }
            | Self::Assign { span, .. }
            | Self::Call { span, .. }
            | Self::Member { span, .. }
            | Self::Index { span, .. }
            | Self::ConditionalMember { span, .. }
            | Self::ConditionalIndex { span, .. }
            | Self::Paren { span, .. }
            | Self::TypeOf { span, .. }
            | Self::NameOf { span, .. }
            | Self::TypeExpr { span, .. }
            | Self::Interpolated { span, .. }
            | Self::Splice { span, .. }
            | Self::List { span, .. } => *span,
        }
    }

    /// Short name of the node shape, for logs and internal errors
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Literal { .. } => "literal",
            Self::Name { .. } => "name",
            Self::AliasQualified { .. } => "alias-qualified name",
            Self::QualifiedName { .. } => "qualified name",
            Self::Binary { .. } => "binary expression",
            Self::Unary { .. } => "unary expression",
            Self::Assign { .. } => "assignment",
            Self::Call { .. } => "call",
            Self::Member { .. } => "member access",
            Self::Index { .. } => "index access",
            Self::ConditionalMember { .. } => "conditional member access",
            Self::ConditionalIndex { .. } => "conditional index access",
            Self::Paren { .. } => "parenthesized expression",
            Self::TypeOf { .. } => "typeof",
            Self::NameOf { .. } => "nameof",
            Self::TypeExpr { .. } => "type expression",
            Self::Interpolated { .. } => "interpolated string",
            Self::Splice { .. } => "splice",
            Self::List { .. } => "list",
        }
    }
}

/// Statement block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    /// Statements in order
    pub stmts: Vec<StmtId>,
    /// Source location
    pub span: FileSpan,
}

impl Block {
    /// Create a block
    #[must_use]
    pub fn new(stmts: Vec<StmtId>, span: FileSpan) -> Self {
        Self { stmts, span }
    }
}

/// A `case` arm of a switch
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// Matched value
    pub value: ExprId,
    /// Arm body
    pub body: Block,
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Local declaration
    Let {
        /// Local name
        name: Symbol,
        /// Local symbol
        symbol: SymbolId,
        /// Type annotation
        ty: Option<TypeRef>,
        /// Initializer
        init: Option<ExprId>,
        /// Source location
        span: FileSpan,
    },
    /// Expression statement
    Expr {
        /// Expression
        expr: ExprId,
        /// Source location
        span: FileSpan,
    },
    /// If statement
    If {
        /// Condition
        condition: ExprId,
        /// Then branch
        then_branch: Block,
        /// Else branch
        else_branch: Option<Block>,
        /// Source location
        span: FileSpan,
    },
    /// While loop
    While {
        /// Loop condition
        condition: ExprId,
        /// Loop body
        body: Block,
        /// Source location
        span: FileSpan,
    },
    /// For-each loop
    ForEach {
        /// Loop variable name
        binding: Symbol,
        /// Loop variable symbol
        symbol: SymbolId,
        /// Iterated expression
        iterable: ExprId,
        /// Loop body
        body: Block,
        /// Source location
        span: FileSpan,
    },
    /// Switch statement
    Switch {
        /// Switched value
        scrutinee: ExprId,
        /// Case arms
        cases: Vec<SwitchCase>,
        /// Default arm
        default: Option<Block>,
        /// Source location
        span: FileSpan,
    },
    /// Return statement
    Return {
        /// Returned value
        value: Option<ExprId>,
        /// Source location
        span: FileSpan,
    },
    /// Nested block
    Block {
        /// The block
        block: Block,
        /// Source location
        span: FileSpan,
    },
}

impl Stmt {
    /// Source location of the statement
    #[must_use]
    pub fn span(&self) -> FileSpan {
        match self {
            Self::Let { span, .. }
            | Self::Expr { span, .. }
            | Self::If { span, .. }
            | Self::While { span, .. }
            | Self::ForEach { span, .. }
            | Self::Switch { span, .. }
            | Self::Return { span, .. }
            | Self::Block { span, .. } => *span,
        }
    }

    /// Short name of the node shape
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Let { .. } => "let",
            Self::Expr { .. } => "expression statement",
            Self::If { .. } => "if",
            Self::While { .. } => "while",
            Self::ForEach { .. } => "for",
            Self::Switch { .. } => "switch",
            Self::Return { .. } => "return",
            Self::Block { .. } => "block",
        }
    }
}

/// Routine parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name
    pub name: Symbol,
    /// Parameter symbol
    pub symbol: SymbolId,
    /// Declared type
    pub ty: Option<TypeRef>,
    /// Source location
    pub span: FileSpan,
}

/// A routine declared on a template provider
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// Member name
    pub name: Symbol,
    /// Attribute names attached to the member
    pub attributes: Vec<Symbol>,
    /// Parameters
    pub params: Vec<Parameter>,
    /// Generic type parameters
    pub type_params: Vec<Symbol>,
    /// Node storage
    pub body: Body,
    /// Root block of the routine
    pub block: Block,
    /// Source location
    pub span: FileSpan,
}

impl Member {
    /// Whether the member carries the given attribute
    #[must_use]
    pub fn has_attribute(&self, attribute: Symbol) -> bool {
        self.attributes.contains(&attribute)
    }
}

/// The declaring entity that owns a set of templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateProvider {
    /// Templates declared on a type
    Type(Symbol),
    /// Templates declared on one instance of a type
    Instance {
        /// Declaring type
        ty: Symbol,
        /// Instance ordinal
        instance: u32,
    },
}

/// A set of members owned by one provider
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Declaring entity
    pub provider: TemplateProvider,
    /// Members in declaration order
    pub members: Vec<Member>,
}
