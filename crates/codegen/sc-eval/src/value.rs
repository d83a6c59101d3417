//! Generation-time value representation

use sc_syntax::{Block, ExprId, InterpolationPart, StmtId, SwitchCase, TypeRef};
use std::fmt;

/// A piece of later-stage syntax built during generation
///
/// Node ids point into the artifact being built.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxValue {
    /// Expression node
    Expr(ExprId),
    /// Statement node
    Stmt(StmtId),
    /// Statement block
    Block(Block),
    /// Type syntax
    Type(TypeRef),
    /// Part of an interpolated string
    Part(InterpolationPart),
    /// Switch arm
    Case(SwitchCase),
}

impl SyntaxValue {
    fn kind_name(&self) -> &'static str {
        match self {
            Self::Expr(_) => "expression syntax",
            Self::Stmt(_) => "statement syntax",
            Self::Block(_) => "block syntax",
            Self::Type(_) => "type syntax",
            Self::Part(_) => "interpolation part",
            Self::Case(_) => "case syntax",
        }
    }
}

/// Generation-time value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
    /// List value
    List(Vec<Self>),
    /// Syntax value
    Syntax(SyntaxValue),
}

impl Value {
    /// Short description of the value's type, for errors
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Syntax(syntax) => syntax.kind_name(),
        }
    }

    /// Get the value as a boolean, if possible
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the value as an integer, if possible
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the value as a string slice, if possible
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Check if value is truthy (for conditionals)
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Int(value) => *value != 0,
            Self::Null => false,
            _ => true,
        }
    }

    /// Text of the value inside an interpolated string
    ///
    /// Strings are inserted without quotes.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::String(value) => value.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:?}"),
            Self::String(value) => write!(f, "{value:?}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Syntax(syntax) => write!(f, "<{}>", syntax.kind_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_strings_but_text_does_not() {
        let value = Value::String("hi".to_owned());
        assert_eq!(value.to_string(), "\"hi\"");
        assert_eq!(value.to_text(), "hi");
        let list = Value::List(vec![Value::Int(1), Value::Null, value]);
        assert_eq!(list.to_string(), "[1, null, \"hi\"]");
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(Value::List(Vec::new()).is_truthy());
    }
}
