//! Generation program interpreter
//!
//! Reference host for the generation pass: executes a generation program,
//! evaluating compile-time code directly and materialising the later-stage
//! tree through the `syntax::` primitives.

pub mod evaluator;
mod syntax;
pub mod value;

pub use evaluator::{EvalError, Evaluator};
pub use value::{SyntaxValue, Value};

use sc_intern::Interner;
use sc_syntax::pretty::{render_block, render_stmts};
use sc_syntax::{Block, Body};

/// The later-stage tree produced by one generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedArtifact {
    /// Node storage of the tree
    pub body: Body,
    /// Root block
    pub block: Block,
}

impl GeneratedArtifact {
    /// Source rendering of the root block, braces included
    #[must_use]
    pub fn render(&self, interner: &Interner) -> String {
        render_block(&self.body, &self.block, interner)
    }

    /// Source rendering of the root block's statements
    #[must_use]
    pub fn render_stmts(&self, interner: &Interner) -> String {
        render_stmts(&self.body, &self.block.stmts, interner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;
    use sc_classify::{classify_member, ClassifierConfig};
    use sc_diagnostics::DiagnosticBag;
    use sc_identity::SymbolRegistry;
    use sc_meta::{rewrite, RewriteContext};
    use sc_span::FileId;
    use sc_syntax::{
        BinaryOp, BodyBuilder, InterpolationPart, Member, StageTable, StageTag, SymbolId,
    };

    const X: SymbolId = SymbolId(0);
    const N: SymbolId = SymbolId(1);
    const I: SymbolId = SymbolId(2);
    const S: SymbolId = SymbolId(3);
    const T: SymbolId = SymbolId(4);

    fn make_facts() -> StageTable {
        StageTable::new()
            .with(X, StageTag::RunTimeOnly)
            .with(N, StageTag::CompileTimeOnly)
            .with(S, StageTag::CompileTimeOnly)
    }

    fn generate(interner: &Interner, template: &Member, args: Vec<Value>) -> GeneratedArtifact {
        let facts = make_facts();
        let config = ClassifierConfig::default().with_alias(interner.intern("meta"));
        let mut sink = DiagnosticBag::new();
        let stages = classify_member(template, &facts, &config, interner, &mut sink).unwrap();
        assert!(!sink.has_errors());
        let registry = SymbolRegistry::new();
        let ctx = RewriteContext::new(interner, &registry, &facts);
        let program = rewrite(template, &stages, &ctx).unwrap();
        Evaluator::new(interner)
            .run(&program.member, args)
            .unwrap()
    }

    #[test]
    fn test_run_time_expression_is_reconstructed() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let param = b.param("x", X);
        let x = b.name("x", Some(X));
        let one = b.int(1);
        let sum = b.binary(BinaryOp::Add, x, one);
        let stmt = b.expr_stmt(sum);
        let block = b.block(vec![stmt]);
        let template = b.into_member("emit", &["template"], vec![param], block);

        let artifact = generate(&interner, &template, Vec::new());
        assert_eq!(artifact.render_stmts(&interner), "x + 1;");
    }

    #[test]
    fn test_compile_time_parameter_is_spliced() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let param = b.param("n", N);
        let x = b.name("x", Some(X));
        let n = b.name("n", Some(N));
        let two = b.int(2);
        let scaled = b.binary(BinaryOp::Mul, n, two);
        let sum = b.binary(BinaryOp::Add, x, scaled);
        let stmt = b.expr_stmt(sum);
        let block = b.block(vec![stmt]);
        let template = b.into_member("emit", &["template"], vec![param], block);

        let artifact = generate(&interner, &template, vec![Value::Int(21)]);
        assert_eq!(artifact.render_stmts(&interner), "x + 42;");
    }

    #[test]
    fn test_compile_time_loop_unrolls() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let range = b.alias("meta", "range");
        let three = b.int(3);
        let iterable = b.call(range, vec![three]);
        let log = b.name("log", None);
        let i = b.name("i", Some(I));
        let call = b.call(log, vec![i]);
        let log_stmt = b.expr_stmt(call);
        let loop_body = b.block(vec![log_stmt]);
        let for_each = b.for_each("i", I, iterable, loop_body);
        let block = b.block(vec![for_each]);
        let template = b.into_member("emit", &["template"], Vec::new(), block);

        let artifact = generate(&interner, &template, Vec::new());
        expect![[r#"
            log(0);
            log(1);
            log(2);"#]]
        .assert_eq(&artifact.render_stmts(&interner));
    }

    #[test]
    fn test_unrolled_locals_get_distinct_names() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let range = b.alias("meta", "range");
        let two = b.int(2);
        let iterable = b.call(range, vec![two]);
        let x = b.name("x", Some(X));
        let i = b.name("i", Some(I));
        let sum = b.binary(BinaryOp::Add, x, i);
        let decl = b.let_("t", T, None, Some(sum));
        let log = b.name("log", None);
        let t = b.name("t", Some(T));
        let call = b.call(log, vec![t]);
        let use_stmt = b.expr_stmt(call);
        let loop_body = b.block(vec![decl, use_stmt]);
        let for_each = b.for_each("i", I, iterable, loop_body);
        let block = b.block(vec![for_each]);
        let template = b.into_member("emit", &["template"], Vec::new(), block);

        let artifact = generate(&interner, &template, Vec::new());
        expect![[r#"
            let t = x + 0;
            log(t);
            let t_1 = x + 1;
            log(t_1);"#]]
        .assert_eq(&artifact.render_stmts(&interner));
    }

    #[test]
    fn test_interpolation_holes_keep_spliced_values() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let param = b.param("s", S);
        let x = b.name("x", Some(X));
        let s = b.name("s", Some(S));
        let text = b.string("a\nb");
        let greeting = b.interpolated(vec![
            InterpolationPart::Text("v=".to_owned()),
            InterpolationPart::Hole(x),
            InterpolationPart::Hole(text),
            InterpolationPart::Hole(s),
        ]);
        let stmt = b.expr_stmt(greeting);
        let block = b.block(vec![stmt]);
        let template = b.into_member("emit", &["template"], vec![param], block);

        let args = vec![Value::String("line1\nline2".to_owned())];
        let artifact = generate(&interner, &template, args);
        assert_eq!(
            artifact.render_stmts(&interner),
            r#"$"v={x}{"a\nb"}{"line1\nline2"}";"#
        );
    }

    #[test]
    fn test_alias_hole_is_parenthesized() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let console = b.alias("global", "Console");
        let out = b.member(console, "Out");
        let greeting = b.interpolated(vec![InterpolationPart::Hole(out)]);
        let stmt = b.expr_stmt(greeting);
        let block = b.block(vec![stmt]);
        let template = b.into_member("emit", &["template"], Vec::new(), block);

        let artifact = generate(&interner, &template, Vec::new());
        assert_eq!(
            artifact.render_stmts(&interner),
            r#"$"{(global::Console.Out)}";"#
        );
    }
}
