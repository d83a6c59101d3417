//! Passthrough and reconstruction laws
//!
//! Compile-time subtrees must reach the program text-identical, and running
//! the program must rebuild every later-stage node text-identical to the
//! template.

use anyhow::Result;
use integration_tests::StagingFixture;
use sc_eval::Value;
use sc_meta::TransformationKind;
use sc_syntax::pretty::render_stmt;
use sc_syntax::{BinaryOp, BodyBuilder, InterpolationPart, NodeRef, StageTag, SwitchCase, TypeRef, UnaryOp};

#[test]
fn test_run_time_statements_rebuild_identically() -> Result<()> {
    let mut fixture = StagingFixture::new();
    let x_sym = fixture.declare(StageTag::RunTimeOnly);
    let flag_sym = fixture.declare(StageTag::RunTimeOnly);
    let z_sym = fixture.undeclared();
    let item_sym = fixture.undeclared();
    let mut b = fixture.builder();
    let mut stmts = Vec::new();

    let x = b.name("x", Some(x_sym));
    stmts.push(b.expr_stmt(x));

    let x = b.name("x", Some(x_sym));
    let length = b.member(x, "Length");
    stmts.push(b.expr_stmt(length));

    let x = b.name("x", Some(x_sym));
    let zero = b.int(0);
    let first = b.index(x, zero);
    stmts.push(b.expr_stmt(first));

    let f = b.name("f", None);
    let x = b.name("x", Some(x_sym));
    let s = b.string("s");
    let call = b.call(f, vec![x, s]);
    stmts.push(b.expr_stmt(call));

    let x = b.name("x", Some(x_sym));
    let name = b.cond_member(x, "Name");
    stmts.push(b.expr_stmt(name));

    let x = b.name("x", Some(x_sym));
    let neg = b.unary(UnaryOp::Neg, x);
    stmts.push(b.expr_stmt(neg));

    let x = b.name("x", Some(x_sym));
    let one = b.int(1);
    let sum = b.binary(BinaryOp::Add, x, one);
    let grouped = b.paren(sum);
    let two = b.int(2);
    let product = b.binary(BinaryOp::Mul, grouped, two);
    stmts.push(b.expr_stmt(product));

    let console = b.alias("global", "Console");
    let write = b.member(console, "WriteLine");
    let x = b.name("x", Some(x_sym));
    let call = b.call(write, vec![x]);
    stmts.push(b.expr_stmt(call));

    let encoding = b.qualified(&["System", "Text", "Encoding"]);
    stmts.push(b.expr_stmt(encoding));

    let y = b.name("y", None);
    let x = b.name("x", Some(x_sym));
    let assign = b.assign(y, x);
    stmts.push(b.expr_stmt(assign));

    let x = b.name("x", Some(x_sym));
    let text = b.interpolated(vec![
        InterpolationPart::Text("v=".to_owned()),
        InterpolationPart::Hole(x),
    ]);
    stmts.push(b.expr_stmt(text));

    let list = TypeRef::Path {
        segments: vec![b.sym("List")],
        args: vec![b.ty("int")],
    };
    let x = b.name("x", Some(x_sym));
    stmts.push(b.let_("z", z_sym, Some(BodyBuilder::nullable(list)), Some(x)));

    let flag = b.name("flag", Some(flag_sym));
    let x = b.name("x", Some(x_sym));
    let then_stmt = b.expr_stmt(x);
    let then_branch = b.block(vec![then_stmt]);
    let f = b.name("f", None);
    let call = b.call(f, Vec::new());
    let else_stmt = b.expr_stmt(call);
    let else_branch = b.block(vec![else_stmt]);
    stmts.push(b.if_(flag, then_branch, Some(else_branch)));

    let flag = b.name("flag", Some(flag_sym));
    let x = b.name("x", Some(x_sym));
    let body_stmt = b.expr_stmt(x);
    let body = b.block(vec![body_stmt]);
    stmts.push(b.while_(flag, body));

    let x = b.name("x", Some(x_sym));
    let f = b.name("f", None);
    let item = b.name("item", Some(item_sym));
    let call = b.call(f, vec![item]);
    let body_stmt = b.expr_stmt(call);
    let body = b.block(vec![body_stmt]);
    stmts.push(b.for_each("item", item_sym, x, body));

    let x = b.name("x", Some(x_sym));
    let one = b.int(1);
    let f = b.name("f", None);
    let arg = b.int(1);
    let call = b.call(f, vec![arg]);
    let case_stmt = b.expr_stmt(call);
    let case_body = b.block(vec![case_stmt]);
    let f = b.name("f", None);
    let arg = b.int(0);
    let call = b.call(f, vec![arg]);
    let default_stmt = b.expr_stmt(call);
    let default = b.block(vec![default_stmt]);
    let cases = vec![SwitchCase {
        value: one,
        body: case_body,
    }];
    stmts.push(b.switch(x, cases, Some(default)));

    let x = b.name("x", Some(x_sym));
    let inner_stmt = b.expr_stmt(x);
    let inner = b.block(vec![inner_stmt]);
    stmts.push(b.block_stmt(inner));

    let x = b.name("x", Some(x_sym));
    stmts.push(b.ret(Some(x)));

    let block = b.block(stmts);
    let template = b.into_member("emit", &["template"], Vec::new(), block);

    let artifact = fixture.generate(&template, Vec::new())?;
    assert_eq!(
        artifact.render(fixture.interner()),
        fixture.render(&template)
    );
    Ok(())
}

#[test]
fn test_compile_time_statements_are_copied_verbatim() -> Result<()> {
    let mut fixture = StagingFixture::from_config_file("strict.toml")?;
    let x_sym = fixture.declare(StageTag::RunTimeOnly);
    let n_sym = fixture.declare(StageTag::CompileTimeOnly);
    let total_sym = fixture.undeclared();
    let i_sym = fixture.undeclared();
    let mut b = fixture.builder();
    let param = b.param("n", n_sym);

    let zero = b.int(0);
    let decl = b.let_("total", total_sym, None, Some(zero));

    let range = b.alias("meta", "range");
    let n = b.name("n", Some(n_sym));
    let iterable = b.call(range, vec![n]);
    let total = b.name("total", Some(total_sym));
    let total_read = b.name("total", Some(total_sym));
    let i = b.name("i", Some(i_sym));
    let sum = b.binary(BinaryOp::Add, total_read, i);
    let assign = b.assign(total, sum);
    let assign_stmt = b.expr_stmt(assign);
    let loop_body = b.block(vec![assign_stmt]);
    let for_each = b.for_each("i", i_sym, iterable, loop_body);

    let total = b.name("total", Some(total_sym));
    let hundred = b.int(100);
    let condition = b.binary(BinaryOp::Gt, total, hundred);
    let total = b.name("total", Some(total_sym));
    let total_read = b.name("total", Some(total_sym));
    let hundred = b.int(100);
    let reduced = b.binary(BinaryOp::Sub, total_read, hundred);
    let assign = b.assign(total, reduced);
    let assign_stmt = b.expr_stmt(assign);
    let while_body = b.block(vec![assign_stmt]);
    let while_stmt = b.while_(condition, while_body);

    let x = b.name("x", Some(x_sym));
    let total = b.name("total", Some(total_sym));
    let emitted = b.binary(BinaryOp::Add, x, total);
    let emit = b.expr_stmt(emitted);

    let block = b.block(vec![decl, for_each, while_stmt, emit]);
    let template = b.into_member("emit", &["template"], vec![param], block);

    let program = fixture.program(&template)?;
    let interner = fixture.interner();
    for (offset, original) in [decl, for_each, while_stmt].into_iter().enumerate() {
        assert_eq!(program.kind_of(NodeRef::Stmt(original)), Some(TransformationKind::Clone));
        let copied = program.member.block.stmts[offset + 1];
        assert_eq!(
            render_stmt(&program.member.body, copied, interner),
            render_stmt(&template.body, original, interner)
        );
    }

    let artifact = fixture.generate(&template, vec![Value::Int(5)])?;
    assert_eq!(artifact.render_stmts(interner), "x + 10;");
    Ok(())
}
