//! Conditional-access flattening
//!
//! A spliced receiver is a tree built at generation time, never null, so the
//! null-conditional access applied directly to it is emitted as a plain
//! access. Only the chain's root receiver is ever spliced, so at most one node
//! per chain is rewritten.

use sc_syntax::{Body, Expr, ExprId};
use tracing::trace;

/// One-shot flattener for a single access chain
///
/// Once it has produced a rewrite it reports nothing further; callers create
/// a fresh instance per chain.
#[derive(Debug, Default)]
pub struct ConditionalAccessFlattener {
    done: bool,
}

impl ConditionalAccessFlattener {
    /// Create a flattener for one chain
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the leftmost conditional access of the chain ending at `top`
    ///
    /// Returns that node together with its plain replacement, whose children
    /// are the original node's children, when its receiver is a splice.
    pub fn flatten_once(&mut self, body: &Body, top: ExprId) -> Option<(ExprId, Expr)> {
        if self.done {
            return None;
        }
        let root = leftmost_conditional(body, top)?;
        let replacement = match &body.exprs[root] {
            Expr::ConditionalMember {
                receiver,
                name,
                symbol,
                span,
            } if is_splice(body, *receiver) => Expr::Member {
                receiver: *receiver,
                name: *name,
                symbol: *symbol,
                span: *span,
            },
            Expr::ConditionalIndex {
                target,
                index,
                span,
            } if is_splice(body, *target) => Expr::Index {
                target: *target,
                index: *index,
                span: *span,
            },
            _ => return None,
        };
        self.done = true;
        trace!(node = ?root, "flattened conditional access on spliced receiver");
        Some((root, replacement))
    }
}

fn is_splice(body: &Body, id: ExprId) -> bool {
    matches!(body.exprs[id], Expr::Splice { .. })
}

/// The conditional access closest to the chain's root receiver
fn leftmost_conditional(body: &Body, top: ExprId) -> Option<ExprId> {
    let mut current = top;
    let mut found = None;
    loop {
        current = match &body.exprs[current] {
            Expr::ConditionalMember { receiver, .. } => {
                found = Some(current);
                *receiver
            }
            Expr::ConditionalIndex { target, .. } => {
                found = Some(current);
                *target
            }
            Expr::Member { receiver, .. } => *receiver,
            Expr::Index { target, .. } => *target,
            Expr::Call { callee, .. } => *callee,
            _ => return found,
        };
    }
}

/// Whether a chain is an access chain with a conditional step
#[must_use]
pub fn has_conditional_access(body: &Body, top: ExprId) -> bool {
    leftmost_conditional(body, top).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_intern::Interner;
    use sc_span::FileId;
    use sc_syntax::{pretty, BodyBuilder};

    #[test]
    fn test_flattens_spliced_root() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let recv = b.name("recv", None);
        let splice = b.splice(recv);
        let out = b.cond_member(splice, "Out");
        let one = b.int(1);
        let chain = b.index(out, one);
        let mut body = b.finish();

        let mut flattener = ConditionalAccessFlattener::new();
        let (node, replacement) = flattener.flatten_once(&body, chain).unwrap();
        assert_eq!(node, out);
        body.exprs[node] = replacement;

        let rendered = pretty::render_expr(&body, chain, &interner);
        assert_eq!(rendered, "$(recv).Out[1]");
        assert!(!rendered.contains('?'));
    }

    #[test]
    fn test_flattener_is_one_shot() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let recv = b.name("recv", None);
        let splice = b.splice(recv);
        let zero = b.int(0);
        let chain = b.cond_index(splice, zero);
        let body = b.finish();

        let mut flattener = ConditionalAccessFlattener::new();
        assert!(flattener.flatten_once(&body, chain).is_some());
        assert!(flattener.flatten_once(&body, chain).is_none());
    }

    #[test]
    fn test_leaves_unspliced_chain_alone() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let recv = b.name("recv", None);
        let chain = b.cond_member(recv, "Out");
        let other = b.name("other", None);
        let spliced = b.splice(other);
        let spliced_chain = b.cond_member(spliced, "Out");
        let plain_recv = b.name("plain", None);
        let plain = b.member(plain_recv, "Out");
        let body = b.finish();

        let mut flattener = ConditionalAccessFlattener::new();
        assert!(has_conditional_access(&body, chain));
        assert!(!has_conditional_access(&body, plain));
        assert!(flattener.flatten_once(&body, chain).is_none());
        // Nothing was rewritten, so the same flattener still works
        assert!(flattener.flatten_once(&body, spliced_chain).is_some());
    }
}
