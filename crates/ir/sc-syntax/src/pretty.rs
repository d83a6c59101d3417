//! Deterministic source rendering
//!
//! Two trees are considered equivalent when they render to the same text.

use crate::{Block, Body, Expr, ExprId, InterpolationPart, LiteralKind, Stmt, StmtId, TypeRef};
use sc_intern::Interner;
use std::fmt::{self, Write};

const INDENT: &str = "    ";

/// Writer that tracks block nesting
struct NestedWriter<'a> {
    body: &'a Body,
    interner: &'a Interner,
    out: String,
    depth: usize,
}

impl<'a> NestedWriter<'a> {
    fn new(body: &'a Body, interner: &'a Interner, depth: usize) -> Self {
        Self {
            body,
            interner,
            out: String::new(),
            depth,
        }
    }

    fn newline(&mut self) -> fmt::Result {
        self.out.push('\n');
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        Ok(())
    }

    fn name(&self, sym: &sc_intern::Symbol) -> &'a str {
        self.interner.resolve(sym)
    }

    fn expr(&mut self, id: ExprId) -> fmt::Result {
        let body = self.body;
        match &body.exprs[id] {
            Expr::Literal { kind, .. } => write_literal(&mut self.out, kind),
            Expr::Name { name, .. } => {
                let text = self.name(name);
                self.out.write_str(text)
            }
            Expr::AliasQualified { alias, name, .. } => {
                let (alias, name) = (self.name(alias), self.name(name));
                write!(self.out, "{alias}::{name}")
            }
            Expr::QualifiedName { segments, .. } => {
                let joined: Vec<&str> = segments.iter().map(|seg| self.name(seg)).collect();
                self.out.write_str(&joined.join("."))
            }
            Expr::Binary { op, left, right, .. } => {
                self.expr(*left)?;
                write!(self.out, " {} ", op.as_str())?;
                self.expr(*right)
            }
            Expr::Unary { op, operand, .. } => {
                self.out.write_str(op.as_str())?;
                self.expr(*operand)
            }
            Expr::Assign { target, value, .. } => {
                self.expr(*target)?;
                self.out.write_str(" = ")?;
                self.expr(*value)
            }
            Expr::Call { callee, args, .. } => {
                self.expr(*callee)?;
                self.out.write_char('(')?;
                self.comma_separated(args)?;
                self.out.write_char(')')
            }
            Expr::Member { receiver, name, .. } => {
                self.expr(*receiver)?;
                let name = self.name(name);
                write!(self.out, ".{name}")
            }
            Expr::ConditionalMember { receiver, name, .. } => {
                self.expr(*receiver)?;
                let name = self.name(name);
                write!(self.out, "?.{name}")
            }
            Expr::Index { target, index, .. } => {
                self.expr(*target)?;
                self.out.write_char('[')?;
                self.expr(*index)?;
                self.out.write_char(']')
            }
            Expr::ConditionalIndex { target, index, .. } => {
                self.expr(*target)?;
                self.out.write_str("?[")?;
                self.expr(*index)?;
                self.out.write_char(']')
            }
            Expr::Paren { inner, .. } => {
                self.out.write_char('(')?;
                self.expr(*inner)?;
                self.out.write_char(')')
            }
            Expr::TypeOf { ty, .. } => {
                let ty = render_type(ty, self.interner);
                write!(self.out, "typeof({ty})")
            }
            Expr::NameOf { operand, .. } => {
                self.out.write_str("nameof(")?;
                self.expr(*operand)?;
                self.out.write_char(')')
            }
            Expr::TypeExpr { ty, .. } => {
                let ty = render_type(ty, self.interner);
                self.out.write_str(&ty)
            }
            Expr::Interpolated { parts, .. } => {
                self.out.write_str("$\"")?;
                for part in parts {
                    match part {
                        InterpolationPart::Text(text) => {
                            self.out.write_str(&escape_interpolation_text(text))?;
                        }
                        InterpolationPart::Hole(hole) => {
                            let mut hole_writer = NestedWriter::new(self.body, self.interner, 0);
                            hole_writer.expr(*hole)?;
                            write!(self.out, "{{{}}}", normalize_hole_text(&hole_writer.out))?;
                        }
                    }
                }
                self.out.write_char('"')
            }
            Expr::Splice { inner, .. } => {
                self.out.write_str("$(")?;
                self.expr(*inner)?;
                self.out.write_char(')')
            }
            Expr::List { items, .. } => {
                self.out.write_char('[')?;
                self.comma_separated(items)?;
                self.out.write_char(']')
            }
        }
    }

    fn comma_separated(&mut self, items: &[ExprId]) -> fmt::Result {
        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                self.out.write_str(", ")?;
            }
            self.expr(*item)?;
        }
        Ok(())
    }

    fn stmt(&mut self, id: StmtId) -> fmt::Result {
        let body = self.body;
        match &body.stmts[id] {
            Stmt::Let { name, ty, init, .. } => {
                let name = self.name(name);
                write!(self.out, "let {name}")?;
                if let Some(ty) = ty {
                    let ty = render_type(ty, self.interner);
                    write!(self.out, ": {ty}")?;
                }
                if let Some(init) = init {
                    self.out.write_str(" = ")?;
                    self.expr(*init)?;
                }
                self.out.write_char(';')
            }
            Stmt::Expr { expr, .. } => {
                self.expr(*expr)?;
                self.out.write_char(';')
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.out.write_str("if ")?;
                self.expr(*condition)?;
                self.out.write_char(' ')?;
                self.block(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.out.write_str(" else ")?;
                    self.block(else_branch)?;
                }
                Ok(())
            }
            Stmt::While { condition, body, .. } => {
                self.out.write_str("while ")?;
                self.expr(*condition)?;
                self.out.write_char(' ')?;
                self.block(body)
            }
            Stmt::ForEach {
                binding,
                iterable,
                body,
                ..
            } => {
                let binding = self.name(binding);
                write!(self.out, "for {binding} in ")?;
                self.expr(*iterable)?;
                self.out.write_char(' ')?;
                self.block(body)
            }
            Stmt::Switch {
                scrutinee,
                cases,
                default,
                ..
            } => {
                self.out.write_str("switch ")?;
                self.expr(*scrutinee)?;
                self.out.write_str(" {")?;
                self.depth += 1;
                for case in cases {
                    self.newline()?;
                    self.out.write_str("case ")?;
                    self.expr(case.value)?;
                    self.out.write_char(' ')?;
                    self.block(&case.body)?;
                }
                if let Some(default) = default {
                    self.newline()?;
                    self.out.write_str("default ")?;
                    self.block(default)?;
                }
                self.depth -= 1;
                self.newline()?;
                self.out.write_char('}')
            }
            Stmt::Return { value, .. } => {
                self.out.write_str("return")?;
                if let Some(value) = value {
                    self.out.write_char(' ')?;
                    self.expr(*value)?;
                }
                self.out.write_char(';')
            }
            Stmt::Block { block, .. } => self.block(block),
        }
    }

    fn block(&mut self, block: &Block) -> fmt::Result {
        if block.stmts.is_empty() {
            return self.out.write_str("{}");
        }
        self.out.write_char('{')?;
        self.depth += 1;
        for stmt in &block.stmts {
            self.newline()?;
            self.stmt(*stmt)?;
        }
        self.depth -= 1;
        self.newline()?;
        self.out.write_char('}')
    }
}

fn write_literal(out: &mut String, kind: &LiteralKind) -> fmt::Result {
    match kind {
        LiteralKind::Int(value) => write!(out, "{value}"),
        LiteralKind::Float(value) => write!(out, "{value:?}"),
        LiteralKind::String(value) => write!(out, "{value:?}"),
        LiteralKind::Bool(value) => write!(out, "{value}"),
        LiteralKind::Null => out.write_str("null"),
    }
}

/// Replace every line break in hole source text with a single space
///
/// Holes are printed inline. Literal values never reach this with a raw
/// line break since string literals are printed escaped.
#[must_use]
pub fn normalize_hole_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push(' ');
            }
            '\n' => out.push(' '),
            other => out.push(other),
        }
    }
    out
}

/// Escape literal text inside an interpolated string
#[must_use]
pub fn escape_interpolation_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '{' => escaped.push_str("{{"),
            '}' => escaped.push_str("}}"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Render a type
#[must_use]
pub fn render_type(ty: &TypeRef, interner: &Interner) -> String {
    match ty {
        TypeRef::Path { segments, args } => {
            let mut text = segments
                .iter()
                .map(|seg| interner.resolve(seg))
                .collect::<Vec<_>>()
                .join(".");
            if !args.is_empty() {
                let args: Vec<String> = args.iter().map(|arg| render_type(arg, interner)).collect();
                text.push('<');
                text.push_str(&args.join(", "));
                text.push('>');
            }
            text
        }
        TypeRef::Nullable(inner) => format!("{}?", render_type(inner, interner)),
    }
}

/// Render an expression
#[must_use]
pub fn render_expr(body: &Body, id: ExprId, interner: &Interner) -> String {
    let mut writer = NestedWriter::new(body, interner, 0);
    // Writing into a String cannot fail.
    match writer.expr(id) {
        Ok(()) => writer.out,
        Err(_) => String::new(),
    }
}

/// Render a statement
#[must_use]
pub fn render_stmt(body: &Body, id: StmtId, interner: &Interner) -> String {
    let mut writer = NestedWriter::new(body, interner, 0);
    match writer.stmt(id) {
        Ok(()) => writer.out,
        Err(_) => String::new(),
    }
}

/// Render a block
#[must_use]
pub fn render_block(body: &Body, block: &Block, interner: &Interner) -> String {
    let mut writer = NestedWriter::new(body, interner, 0);
    match writer.block(block) {
        Ok(()) => writer.out,
        Err(_) => String::new(),
    }
}

/// Render the statements of a block without the surrounding braces
#[must_use]
pub fn render_stmts(body: &Body, stmts: &[StmtId], interner: &Interner) -> String {
    stmts
        .iter()
        .map(|stmt| render_stmt(body, *stmt, interner))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryOp, BodyBuilder, SymbolId};
    use expect_test::expect;
    use sc_span::FileId;

    #[test]
    fn test_render_nested_statements() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let x = b.name("x", Some(SymbolId(1)));
        let zero = b.int(0);
        let cond = b.binary(BinaryOp::Gt, x, zero);
        let log = b.name("log", None);
        let msg = b.string("positive");
        let call = b.call(log, vec![msg]);
        let stmt = b.expr_stmt(call);
        let then_branch = b.block(vec![stmt]);
        let empty = b.block(Vec::new());
        let if_stmt = b.if_(cond, then_branch, Some(empty));
        let body = b.finish();

        expect![[r#"
            if x > 0 {
                log("positive");
            } else {}"#]]
        .assert_eq(&render_stmt(&body, if_stmt, &interner));
    }

    #[test]
    fn test_render_interpolation_and_access() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let console = b.alias("global", "Console");
        let recv = b.cond_member(console, "Out");
        let first = b.int(1);
        let indexed = b.index(recv, first);
        let parts = vec![
            InterpolationPart::Text("a{b}\"".to_string()),
            InterpolationPart::Hole(indexed),
        ];
        let text = b.interpolated(parts);
        let body = b.finish();

        assert_eq!(
            render_expr(&body, text, &interner),
            r#"$"a{{b}}\"{global::Console?.Out[1]}""#
        );
    }

    #[test]
    fn test_render_types() {
        let interner = Interner::new();
        let b = BodyBuilder::new(&interner, FileId(0));
        let list = TypeRef::Path {
            segments: vec![b.sym("List")],
            args: vec![BodyBuilder::nullable(b.ty("int"))],
        };
        assert_eq!(render_type(&list, &interner), "List<int?>");
        assert_eq!(render_type(&b.ty("System.String"), &interner), "System.String");
    }

    #[test]
    fn test_string_hole_keeps_its_value() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let text = b.string("a\nb");
        let parts = vec![InterpolationPart::Hole(text)];
        let interpolated = b.interpolated(parts);
        let body = b.finish();

        assert_eq!(render_expr(&body, interpolated, &interner), r#"$"{"a\nb"}""#);
    }

    #[test]
    fn test_normalize_line_breaks() {
        assert_eq!(normalize_hole_text("a\nb\r\nc\rd"), "a b c d");
        assert_eq!(normalize_hole_text("plain"), "plain");
    }
}
