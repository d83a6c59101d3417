//! Tree-construction vocabulary
//!
//! Generation programs build later-stage trees exclusively through these
//! primitives. The rewriter emits them as calls to alias-qualified names
//! (`syntax::binary(...)`); the host binds each name to a factory.

/// Alias under which tree-construction primitives are called
pub const SYNTAX_ALIAS: &str = "syntax";

/// Alias under which generation-time fixers are called
pub const FIX_ALIAS: &str = "fix";

/// Tree-construction primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `list(items...)`: a generation-time list
    List,
    /// `push(list, item)`: the list with `item` appended
    Push,
    /// `value(v)`: splice a now-computed value as an expression
    Value,
    /// `name(text)`
    Name,
    /// `alias_qualified(alias, name)`
    AliasQualified,
    /// `qualified(segments)`
    Qualified,
    /// `binary(op, left, right)`
    Binary,
    /// `unary(op, operand)`
    Unary,
    /// `assign(target, value)`
    Assign,
    /// `call(callee, args)`
    Call,
    /// `member(receiver, name)`
    Member,
    /// `index(target, index)`
    Index,
    /// `cond_member(receiver, name)`
    ConditionalMember,
    /// `cond_index(target, index)`
    ConditionalIndex,
    /// `paren(inner)`
    Paren,
    /// `type_of(type)`
    TypeOf,
    /// `name_of(operand)`
    NameOf,
    /// `type_expr(type)`
    TypeExpr,
    /// `interpolated(parts)`
    Interpolated,
    /// `text(content)`: interpolation text part
    Text,
    /// `hole(expr)`: interpolation hole part
    Hole,
    /// `list_expr(items)`
    ListExpr,
    /// `type_path(segments, args)`
    TypePath,
    /// `nullable(type)`
    Nullable,
    /// `let_stmt(name, type, init)`
    Let,
    /// `expr_stmt(expr)`
    ExprStmt,
    /// `if_stmt(condition, then, else)`
    If,
    /// `while_stmt(condition, body)`
    While,
    /// `foreach_stmt(binding, iterable, body)`
    ForEach,
    /// `switch_stmt(scrutinee, cases, default)`
    Switch,
    /// `case(value, body)`
    Case,
    /// `return_stmt(value)`
    Return,
    /// `block(statements)`
    Block,
    /// `block_stmt(block)`
    BlockStmt,
}

impl Primitive {
    const ALL: [Self; 34] = [
        Self::List,
        Self::Push,
        Self::Value,
        Self::Name,
        Self::AliasQualified,
        Self::Qualified,
        Self::Binary,
        Self::Unary,
        Self::Assign,
        Self::Call,
        Self::Member,
        Self::Index,
        Self::ConditionalMember,
        Self::ConditionalIndex,
        Self::Paren,
        Self::TypeOf,
        Self::NameOf,
        Self::TypeExpr,
        Self::Interpolated,
        Self::Text,
        Self::Hole,
        Self::ListExpr,
        Self::TypePath,
        Self::Nullable,
        Self::Let,
        Self::ExprStmt,
        Self::If,
        Self::While,
        Self::ForEach,
        Self::Switch,
        Self::Case,
        Self::Return,
        Self::Block,
        Self::BlockStmt,
    ];

    /// Name under [`SYNTAX_ALIAS`]
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Push => "push",
            Self::Value => "value",
            Self::Name => "name",
            Self::AliasQualified => "alias_qualified",
            Self::Qualified => "qualified",
            Self::Binary => "binary",
            Self::Unary => "unary",
            Self::Assign => "assign",
            Self::Call => "call",
            Self::Member => "member",
            Self::Index => "index",
            Self::ConditionalMember => "cond_member",
            Self::ConditionalIndex => "cond_index",
            Self::Paren => "paren",
            Self::TypeOf => "type_of",
            Self::NameOf => "name_of",
            Self::TypeExpr => "type_expr",
            Self::Interpolated => "interpolated",
            Self::Text => "text",
            Self::Hole => "hole",
            Self::ListExpr => "list_expr",
            Self::TypePath => "type_path",
            Self::Nullable => "nullable",
            Self::Let => "let_stmt",
            Self::ExprStmt => "expr_stmt",
            Self::If => "if_stmt",
            Self::While => "while_stmt",
            Self::ForEach => "foreach_stmt",
            Self::Switch => "switch_stmt",
            Self::Case => "case",
            Self::Return => "return_stmt",
            Self::Block => "block",
            Self::BlockStmt => "block_stmt",
        }
    }

    /// Look a primitive up by its name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|prim| prim.name() == name)
    }

    /// Number of arguments, or `None` for variadic primitives
    #[must_use]
    pub fn arity(self) -> Option<usize> {
        match self {
            Self::List => None,
            Self::Value
            | Self::Name
            | Self::Qualified
            | Self::Paren
            | Self::TypeOf
            | Self::NameOf
            | Self::TypeExpr
            | Self::Interpolated
            | Self::Text
            | Self::Hole
            | Self::ListExpr
            | Self::Nullable
            | Self::ExprStmt
            | Self::Return
            | Self::Block
            | Self::BlockStmt => Some(1),
            Self::Push
            | Self::AliasQualified
            | Self::Unary
            | Self::Assign
            | Self::Call
            | Self::Member
            | Self::Index
            | Self::ConditionalMember
            | Self::ConditionalIndex
            | Self::TypePath
            | Self::While
            | Self::Case => Some(2),
            Self::Binary | Self::Let | Self::If | Self::ForEach | Self::Switch => Some(3),
        }
    }
}

/// Generation-time fixer hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixerHook {
    /// `interpolation_hole(part)`: parenthesize an interpolation hole when needed
    InterpolationHole,
    /// `unique_name(hint)`: a later-stage name not yet used in the artifact
    UniqueName,
}

impl FixerHook {
    /// Name under [`FIX_ALIAS`]
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::InterpolationHole => "interpolation_hole",
            Self::UniqueName => "unique_name",
        }
    }

    /// Look a hook up by its name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "interpolation_hole" => Some(Self::InterpolationHole),
            "unique_name" => Some(Self::UniqueName),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique_and_resolvable() {
        for prim in Primitive::ALL {
            assert_eq!(Primitive::from_name(prim.name()), Some(prim));
        }
        assert_eq!(Primitive::from_name("no_such_primitive"), None);
    }

    #[test]
    fn test_hook_names_resolve() {
        for hook in [FixerHook::InterpolationHole, FixerHook::UniqueName] {
            assert_eq!(FixerHook::from_name(hook.name()), Some(hook));
        }
        assert_eq!(FixerHook::from_name("unique"), None);
    }
}
