//! Child enumeration and traversal

use crate::{Block, Body, Expr, ExprId, InterpolationPart, NodeRef, Stmt, StmtId};

/// Direct expression children of an expression, in source order
#[must_use]
pub fn expr_children(body: &Body, id: ExprId) -> Vec<ExprId> {
    match &body.exprs[id] {
        Expr::Literal { .. }
        | Expr::Name { .. }
        | Expr::AliasQualified { .. }
        | Expr::QualifiedName { .. }
        | Expr::TypeOf { .. }
        | Expr::TypeExpr { .. } => Vec::new(),
        Expr::Binary { left, right, .. } => vec![*left, *right],
        Expr::Assign { target, value, .. } => vec![*target, *value],
        Expr::Index { target, index, .. } | Expr::ConditionalIndex { target, index, .. } => {
            vec![*target, *index]
        }
        Expr::Unary { operand: inner, .. }
        | Expr::Member { receiver: inner, .. }
        | Expr::ConditionalMember { receiver: inner, .. }
        | Expr::Paren { inner, .. }
        | Expr::NameOf { operand: inner, .. }
        | Expr::Splice { inner, .. } => vec![*inner],
        Expr::Call { callee, args, .. } => {
            let mut children = Vec::with_capacity(args.len() + 1);
            children.push(*callee);
            children.extend(args.iter().copied());
            children
        }
        Expr::Interpolated { parts, .. } => parts
            .iter()
            .filter_map(|part| match part {
                InterpolationPart::Hole(hole) => Some(*hole),
                InterpolationPart::Text(_) => None,
            })
            .collect(),
        Expr::List { items, .. } => items.clone(),
    }
}

/// Direct children of a statement: expressions first, then nested statements
#[must_use]
pub fn stmt_children(body: &Body, id: StmtId) -> Vec<NodeRef> {
    let mut children = Vec::new();
    let push_block = |children: &mut Vec<NodeRef>, block: &Block| {
        children.extend(block.stmts.iter().map(|stmt| NodeRef::Stmt(*stmt)));
    };
    match &body.stmts[id] {
        Stmt::Let { init, .. } => children.extend(init.map(NodeRef::Expr)),
        Stmt::Expr { expr, .. } => children.push(NodeRef::Expr(*expr)),
        Stmt::Return { value, .. } => children.extend(value.map(NodeRef::Expr)),
        Stmt::If {
            condition,
            then_branch,
            else_branch,
            ..
        } => {
            children.push(NodeRef::Expr(*condition));
            push_block(&mut children, then_branch);
            if let Some(else_branch) = else_branch {
                push_block(&mut children, else_branch);
            }
        }
        Stmt::While { condition, body, .. } => {
            children.push(NodeRef::Expr(*condition));
            push_block(&mut children, body);
        }
        Stmt::ForEach { iterable, body, .. } => {
            children.push(NodeRef::Expr(*iterable));
            push_block(&mut children, body);
        }
        Stmt::Switch {
            scrutinee,
            cases,
            default,
            ..
        } => {
            children.push(NodeRef::Expr(*scrutinee));
            for case in cases {
                children.push(NodeRef::Expr(case.value));
                push_block(&mut children, &case.body);
            }
            if let Some(default) = default {
                push_block(&mut children, default);
            }
        }
        Stmt::Block { block, .. } => push_block(&mut children, block),
    }
    children
}

/// Direct children of any node
#[must_use]
pub fn children(body: &Body, node: NodeRef) -> Vec<NodeRef> {
    match node {
        NodeRef::Expr(id) => expr_children(body, id).into_iter().map(NodeRef::Expr).collect(),
        NodeRef::Stmt(id) => stmt_children(body, id),
    }
}

/// All nodes reachable from `root`, parents before children
#[must_use]
pub fn preorder(body: &Body, root: NodeRef) -> Vec<NodeRef> {
    let mut order = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        order.push(node);
        let mut kids = children(body, node);
        kids.reverse();
        stack.extend(kids);
    }
    order
}

/// All nodes reachable from the statements of `block`
#[must_use]
pub fn preorder_block(body: &Body, block: &Block) -> Vec<NodeRef> {
    block
        .stmts
        .iter()
        .flat_map(|stmt| preorder(body, NodeRef::Stmt(*stmt)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryOp, BodyBuilder, SymbolId};
    use sc_intern::Interner;
    use sc_span::FileId;

    #[test]
    fn test_preorder_visits_parents_first() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let x = b.name("x", Some(SymbolId(0)));
        let one = b.int(1);
        let sum = b.binary(BinaryOp::Add, x, one);
        let stmt = b.expr_stmt(sum);
        let body = b.finish();

        let order = preorder(&body, NodeRef::Stmt(stmt));
        assert_eq!(
            order,
            vec![
                NodeRef::Stmt(stmt),
                NodeRef::Expr(sum),
                NodeRef::Expr(x),
                NodeRef::Expr(one),
            ]
        );
    }
}
