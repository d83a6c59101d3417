//! Interpolation-hole normalization
//!
//! A hole of a reconstructed `$"..."` string is printed inline, so its
//! source text must not contain line breaks, which the printer collapses with
//! [`sc_syntax::pretty::normalize_hole_text`]. An
//! expression whose leftmost token is an alias (`global::X`) must be
//! parenthesized to stay unambiguous next to the hole delimiters.

use sc_syntax::{Body, Expr, ExprId};

/// Whether `id` must be wrapped in parentheses before being used as a hole
#[must_use]
pub fn needs_parenthesizing(body: &Body, id: ExprId) -> bool {
    match &body.exprs[id] {
        Expr::AliasQualified { .. } => true,
        Expr::Call { callee, .. } => needs_parenthesizing(body, *callee),
        Expr::Index { target, .. }
        | Expr::ConditionalIndex { target, .. }
        | Expr::Member {
            receiver: target, ..
        }
        | Expr::ConditionalMember {
            receiver: target, ..
        } => needs_parenthesizing(body, *target),
        // Parentheses and brackets already delimit the leftmost token.
        _ => false,
    }
}

/// Parenthesize a hole expression already allocated in `body` if needed
///
/// Returns the id to use as the hole, which is `hole` itself when nothing
/// needed fixing. Literal values are never changed; line breaks in hole
/// source text are collapsed by the printer.
pub fn fix_hole(body: &mut Body, hole: ExprId) -> ExprId {
    if needs_parenthesizing(body, hole) {
        let span = body.exprs[hole].span();
        body.alloc_expr(Expr::Paren { inner: hole, span })
    } else {
        hole
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_intern::Interner;
    use sc_span::FileId;
    use sc_syntax::{pretty, BodyBuilder};

    #[test]
    fn test_alias_leaf_needs_parens() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let console = b.alias("global", "Console");
        let out = b.member(console, "Out");
        let one = b.int(1);
        let indexed = b.index(out, one);
        let call = b.call(indexed, vec![]);
        let body = b.finish();

        assert!(needs_parenthesizing(&body, console));
        assert!(needs_parenthesizing(&body, call));
    }

    #[test]
    fn test_parenthesized_or_plain_does_not_need_parens() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let console = b.alias("global", "Console");
        let paren = b.paren(console);
        let call = b.call(paren, vec![]);
        let local = b.name("x", None);
        let body = b.finish();

        assert!(!needs_parenthesizing(&body, paren));
        assert!(!needs_parenthesizing(&body, call));
        assert!(!needs_parenthesizing(&body, local));
    }

    #[test]
    fn test_fix_hole_wraps_but_keeps_values() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let console = b.alias("global", "Console");
        let text = b.string("two\nlines");
        let mut body = b.finish();

        let fixed = fix_hole(&mut body, console);
        assert_eq!(pretty::render_expr(&body, fixed, &interner), "(global::Console)");

        let fixed = fix_hole(&mut body, text);
        assert_eq!(fixed, text);
        assert_eq!(pretty::render_expr(&body, fixed, &interner), r#""two\nlines""#);
    }
}
