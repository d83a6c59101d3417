//! Staging driver
//!
//! Entry point for hosts: a [`Compilation`] holds the interner, the symbol
//! registry and the [`StagingConfig`]; its [`TemplateFilter`] turns each
//! module's template members into generation programs and leaves the rest
//! alone.

pub mod compilation;
pub mod config;
pub mod filter;

pub use compilation::Compilation;
pub use config::{Ambient, ConfigError, StagingConfig};
pub use filter::{CompiledModule, CompiledTemplate, TemplateFilter, TemplateOutcome};

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;
    use sc_span::FileId;
    use sc_syntax::{BinaryOp, BodyBuilder, Module, StageTable, StageTag, SymbolId, TemplateProvider};

    #[test]
    fn test_module_from_config_file_text() {
        let config = StagingConfig::from_toml_str("program_suffix = \"_build\"").unwrap();
        let compilation = Compilation::new(config);
        let interner = compilation.interner();
        let mut b = BodyBuilder::new(interner, FileId(0));
        let param = b.param("n", SymbolId(1));
        let x = b.name("x", Some(SymbolId(0)));
        let n = b.name("n", Some(SymbolId(1)));
        let sum = b.binary(BinaryOp::Add, x, n);
        let stmt = b.expr_stmt(sum);
        let block = b.block(vec![stmt]);
        let template = b.into_member("emit", &["template"], vec![param], block);
        let provider = TemplateProvider::Type(interner.intern("Widget"));
        let module = Module {
            provider,
            members: vec![template],
        };
        let facts = StageTable::new()
            .with(SymbolId(0), StageTag::RunTimeOnly)
            .with(SymbolId(1), StageTag::CompileTimeOnly);

        let compiled = compilation.filter().compile_module(&module, &facts).unwrap();
        let program = compiled.lookup(provider, interner.intern("emit")).unwrap();
        assert_eq!(interner.resolve(&program.member.name), "emit_build");
        expect![[r#"
            {
                let stmts = syntax::list();
                stmts = syntax::push(stmts, syntax::expr_stmt(syntax::binary("+", syntax::name("x"), syntax::value(n))));
                return syntax::block(stmts);
            }"#]]
        .assert_eq(&program.render(interner));
    }
}
