//! Template filter
//!
//! Selects the members of a module that carry the template attribute and
//! runs each one through the version gate, the classifier and the rewriter.
//! Every other member is handed back untouched. A template that collects an
//! error diagnostic is abandoned on its own; its siblings still compile.
//! Internal defects stop the whole module.

use crate::compilation::Compilation;
use indexmap::IndexMap;
use sc_classify::{classify_member, ClassifierConfig};
use sc_diagnostics::{Diagnostic, DiagnosticBag, InternalError};
use sc_fixers::type_params::{self, TypeArguments};
use sc_fixers::version::{self, VersionReport};
use sc_intern::Symbol;
use sc_meta::{rewrite, GenerationProgram, RewriteContext};
use sc_syntax::{Member, Module, StageFacts, TemplateProvider};
use tracing::{debug, instrument};

/// What became of one template
#[derive(Debug, Clone)]
pub enum TemplateOutcome {
    /// The template was rewritten
    Generated(GenerationProgram),
    /// The template had errors and was skipped
    Abandoned,
}

impl TemplateOutcome {
    /// The generation program, if one was produced
    #[must_use]
    pub fn program(&self) -> Option<&GenerationProgram> {
        match self {
            Self::Generated(program) => Some(program),
            Self::Abandoned => None,
        }
    }
}

/// One compiled template with everything reported about it
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    /// Template name
    pub name: Symbol,
    /// Generated program or abandonment
    pub outcome: TemplateOutcome,
    /// Diagnostics of the gate and the classifier
    pub diagnostics: Vec<Diagnostic>,
    /// Language levels the template needed
    pub version: VersionReport,
}

/// A module after filtering
#[derive(Debug, Clone)]
pub struct CompiledModule {
    /// Declaring entity
    pub provider: TemplateProvider,
    /// Templates in declaration order
    pub templates: IndexMap<Symbol, CompiledTemplate>,
    /// Members that are not templates, unchanged
    pub ordinary: Vec<Member>,
}

impl CompiledModule {
    /// Generation program of template `name` as seen from `provider`
    ///
    /// Templates declared on a type serve every instance of that type.
    #[must_use]
    pub fn lookup(&self, provider: TemplateProvider, name: Symbol) -> Option<&GenerationProgram> {
        if !self.serves(provider) {
            return None;
        }
        self.templates.get(&name)?.outcome.program()
    }

    fn serves(&self, provider: TemplateProvider) -> bool {
        match (self.provider, provider) {
            (TemplateProvider::Type(owner), TemplateProvider::Instance { ty, .. }) => owner == ty,
            (own, requested) => own == requested,
        }
    }

    /// Number of templates that were abandoned
    #[must_use]
    pub fn abandoned_count(&self) -> usize {
        self.templates
            .values()
            .filter(|template| matches!(template.outcome, TemplateOutcome::Abandoned))
            .count()
    }

    /// All diagnostics of all templates, in declaration order
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.templates
            .values()
            .flat_map(|template| template.diagnostics.iter())
    }
}

/// Routes template members through the staging pipeline
pub struct TemplateFilter<'a> {
    compilation: &'a Compilation,
    attribute: Symbol,
    classifier: ClassifierConfig,
}

impl<'a> TemplateFilter<'a> {
    pub(crate) fn new(compilation: &'a Compilation) -> Self {
        let config = compilation.config();
        let interner = compilation.interner();
        Self {
            compilation,
            attribute: interner.intern(&config.template_attribute),
            classifier: config.classifier_config(interner),
        }
    }

    /// Whether `member` is a template
    #[must_use]
    pub fn is_template(&self, member: &Member) -> bool {
        member.has_attribute(self.attribute)
    }

    /// Compile every template of `module`
    pub fn compile_module(
        &self,
        module: &Module,
        facts: &dyn StageFacts,
    ) -> Result<CompiledModule, InternalError> {
        self.compile_module_with(module, facts, &TypeArguments::default())
    }

    /// Compile every template of `module`, instantiating generic templates
    /// with `type_args`
    #[instrument(skip_all, fields(members = module.members.len()))]
    pub fn compile_module_with(
        &self,
        module: &Module,
        facts: &dyn StageFacts,
        type_args: &TypeArguments,
    ) -> Result<CompiledModule, InternalError> {
        let mut templates = IndexMap::new();
        let mut ordinary = Vec::new();
        for member in &module.members {
            if self.is_template(member) {
                let compiled = self.compile_template(member, facts, type_args)?;
                templates.insert(member.name, compiled);
            } else {
                ordinary.push(member.clone());
            }
        }
        debug!(
            templates = templates.len(),
            ordinary = ordinary.len(),
            "compiled module"
        );
        Ok(CompiledModule {
            provider: module.provider,
            templates,
            ordinary,
        })
    }

    /// Compile one template member
    pub fn compile_template(
        &self,
        member: &Member,
        facts: &dyn StageFacts,
        type_args: &TypeArguments,
    ) -> Result<CompiledTemplate, InternalError> {
        let instantiated;
        let template = if member.type_params.is_empty() {
            member
        } else {
            instantiated = type_params::instantiate(member, type_args);
            &instantiated
        };

        let interner = self.compilation.interner();
        let config = self.compilation.config();
        let mut sink = DiagnosticBag::new();
        let version = version::gate(
            &template.body,
            &template.block,
            config.max_language_version,
            &mut sink,
        );
        let stages = classify_member(template, facts, &self.classifier, interner, &mut sink)?;

        let outcome = if sink.has_errors() {
            debug!(
                template = %interner.resolve(&template.name),
                errors = sink.error_count(),
                "abandoned template"
            );
            TemplateOutcome::Abandoned
        } else {
            let ctx = RewriteContext::new(interner, self.compilation.registry(), facts)
                .with_suffix(&config.program_suffix)
                .with_verification(config.verify_passthrough);
            let program = rewrite(template, &stages, &ctx)?;
            debug!(template = %interner.resolve(&template.name), "accepted template");
            TemplateOutcome::Generated(program)
        };

        Ok(CompiledTemplate {
            name: member.name,
            outcome,
            diagnostics: sink.take_diagnostics(),
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StagingConfig;
    use sc_diagnostics::DiagnosticCode;
    use sc_fixers::type_params::TemplateTypeArgument;
    use sc_intern::Interner;
    use sc_span::FileId;
    use sc_syntax::{BinaryOp, BodyBuilder, StageTable, StageTag, SymbolId};

    const X: SymbolId = SymbolId(0);
    const RECV: SymbolId = SymbolId(1);
    const Y: SymbolId = SymbolId(2);

    fn make_facts() -> StageTable {
        StageTable::new()
            .with(X, StageTag::RunTimeOnly)
            .with(RECV, StageTag::RunTimeOnly)
    }

    fn make_add_one(interner: &Interner, name: &str, attributes: &[&str]) -> Member {
        let mut b = BodyBuilder::new(interner, FileId(0));
        let x = b.name("x", Some(X));
        let one = b.int(1);
        let sum = b.binary(BinaryOp::Add, x, one);
        let stmt = b.expr_stmt(sum);
        let block = b.block(vec![stmt]);
        b.into_member(name, attributes, Vec::new(), block)
    }

    fn make_conflicting(interner: &Interner) -> Member {
        let mut b = BodyBuilder::new(interner, FileId(0));
        let range = b.alias("meta", "range");
        let x = b.name("x", Some(X));
        let call = b.call(range, vec![x]);
        let stmt = b.expr_stmt(call);
        let block = b.block(vec![stmt]);
        b.into_member("broken", &["template"], Vec::new(), block)
    }

    fn make_conditional(interner: &Interner) -> Member {
        let mut b = BodyBuilder::new(interner, FileId(0));
        let recv = b.name("recv", Some(RECV));
        let access = b.cond_member(recv, "Out");
        let stmt = b.expr_stmt(access);
        let block = b.block(vec![stmt]);
        b.into_member("access", &["template"], Vec::new(), block)
    }

    #[test]
    fn test_ordinary_members_pass_through() {
        let compilation = Compilation::default();
        let interner = compilation.interner();
        let template = make_add_one(interner, "emit", &["template"]);
        let helper = make_add_one(interner, "helper", &[]);
        let provider = TemplateProvider::Type(interner.intern("Widget"));
        let module = Module {
            provider,
            members: vec![template, helper.clone()],
        };

        let compiled = compilation
            .filter()
            .compile_module(&module, &make_facts())
            .unwrap();
        assert_eq!(compiled.ordinary, vec![helper]);
        assert_eq!(compiled.templates.len(), 1);
        let program = compiled.lookup(provider, interner.intern("emit")).unwrap();
        assert_eq!(interner.resolve(&program.member.name), "emit_generator");
        assert!(compiled.lookup(provider, interner.intern("helper")).is_none());
    }

    #[test]
    fn test_instances_find_type_templates() {
        let compilation = Compilation::default();
        let interner = compilation.interner();
        let widget = interner.intern("Widget");
        let module = Module {
            provider: TemplateProvider::Type(widget),
            members: vec![make_add_one(interner, "emit", &["template"])],
        };

        let compiled = compilation
            .filter()
            .compile_module(&module, &make_facts())
            .unwrap();
        let emit = interner.intern("emit");
        let instance = TemplateProvider::Instance {
            ty: widget,
            instance: 3,
        };
        assert!(compiled.lookup(instance, emit).is_some());
        let other = TemplateProvider::Type(interner.intern("Gadget"));
        assert!(compiled.lookup(other, emit).is_none());
    }

    #[test]
    fn test_conflict_abandons_only_that_template() {
        let compilation = Compilation::default();
        let interner = compilation.interner();
        let module = Module {
            provider: TemplateProvider::Type(interner.intern("Widget")),
            members: vec![
                make_conflicting(interner),
                make_add_one(interner, "emit", &["template"]),
            ],
        };

        let compiled = compilation
            .filter()
            .compile_module(&module, &make_facts())
            .unwrap();
        assert_eq!(compiled.abandoned_count(), 1);
        let broken = &compiled.templates[&interner.intern("broken")];
        assert!(broken.outcome.program().is_none());
        assert_eq!(broken.diagnostics[0].code, DiagnosticCode::StageConflict);
        assert!(compiled
            .lookup(module.provider, interner.intern("emit"))
            .is_some());
        let names: Vec<_> = compiled
            .templates
            .keys()
            .map(|name| interner.resolve(name))
            .collect();
        assert_eq!(names, ["broken", "emit"]);
    }

    #[test]
    fn test_version_ceiling_abandons_template() {
        let config = StagingConfig {
            max_language_version: 5,
            ..StagingConfig::default()
        };
        let compilation = Compilation::new(config);
        let interner = compilation.interner();
        let template = make_conditional(interner);

        let compiled = compilation
            .filter()
            .compile_template(&template, &make_facts(), &TypeArguments::default())
            .unwrap();
        assert!(compiled.outcome.program().is_none());
        assert_eq!(compiled.version.max_encountered, 6);
        assert_eq!(compiled.version.rejected, 1);
        assert_eq!(
            compiled.diagnostics[0].code,
            DiagnosticCode::UnsupportedLanguageVersion
        );
    }

    #[test]
    fn test_version_within_ceiling_is_reported() {
        let compilation = Compilation::default();
        let interner = compilation.interner();
        let template = make_conditional(interner);

        let compiled = compilation
            .filter()
            .compile_template(&template, &make_facts(), &TypeArguments::default())
            .unwrap();
        assert!(compiled.outcome.program().is_some());
        assert_eq!(compiled.version.max_encountered, 6);
        assert!(compiled.diagnostics.is_empty());
    }

    #[test]
    fn test_generic_template_is_instantiated() {
        let compilation = Compilation::default();
        let interner = compilation.interner();
        let mut b = BodyBuilder::new(interner, FileId(0));
        let x = b.name("x", Some(X));
        let ty = b.ty("T");
        let decl = b.let_("y", Y, Some(ty), Some(x));
        let block = b.block(vec![decl]);
        let int = b.ty("int");
        let mut template = b.into_member("emit", &["template"], Vec::new(), block);
        let t = interner.intern("T");
        template.type_params.push(t);

        let mut args = TypeArguments::default();
        args.insert(t, TemplateTypeArgument::new(int));
        let compiled = compilation
            .filter()
            .compile_template(&template, &make_facts(), &args)
            .unwrap();
        let rendered = compiled.outcome.program().unwrap().render(interner);
        assert!(rendered.contains("\"int\""), "{rendered}");
        assert!(!rendered.contains("\"T\""), "{rendered}");
    }

    #[test]
    fn test_custom_attribute_and_suffix() {
        let config = StagingConfig::from_toml_str(
            r#"
            template_attribute = "staged"
            program_suffix = "_gen"
            "#,
        )
        .unwrap();
        let compilation = Compilation::new(config);
        let interner = compilation.interner();
        let filter = compilation.filter();
        assert!(!filter.is_template(&make_add_one(interner, "emit", &["template"])));

        let staged = make_add_one(interner, "emit", &["staged"]);
        let compiled = filter
            .compile_template(&staged, &make_facts(), &TypeArguments::default())
            .unwrap();
        let program = compiled.outcome.program().unwrap();
        assert_eq!(interner.resolve(&program.member.name), "emit_gen");
    }
}
