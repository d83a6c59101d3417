//! Integration test utilities for the staging pipeline

use anyhow::{bail, Result};
use sc_driver::{Compilation, CompiledTemplate, StagingConfig, TemplateOutcome};
use sc_eval::{Evaluator, GeneratedArtifact, Value};
use sc_intern::Interner;
use sc_meta::GenerationProgram;
use sc_span::FileId;
use sc_syntax::pretty::render_block;
use sc_syntax::{BodyBuilder, Member, StageTable, StageTag, SymbolId};
use std::path::PathBuf;

/// Path of a file under the crate's `fixtures` directory
#[must_use]
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

/// Test fixture helper
///
/// Host symbols are declared up front with their stage; templates are then
/// built with [`StagingFixture::builder`] and pushed through the filter and
/// the evaluator.
pub struct StagingFixture {
    /// Compilation under test
    pub compilation: Compilation,
    /// Declared stages of host symbols
    pub facts: StageTable,
    next_symbol: u32,
}

impl StagingFixture {
    /// Creates a fixture with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StagingConfig::default())
    }

    /// Creates a fixture with `config`
    #[must_use]
    pub fn with_config(config: StagingConfig) -> Self {
        Self {
            compilation: Compilation::new(config),
            facts: StageTable::new(),
            next_symbol: 0,
        }
    }

    /// Creates a fixture from a config file in `fixtures/`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded
    pub fn from_config_file(name: &str) -> Result<Self> {
        let config = StagingConfig::load(&fixture_path(name))?;
        Ok(Self::with_config(config))
    }

    /// Declares a host symbol with the given stage
    pub fn declare(&mut self, stage: StageTag) -> SymbolId {
        let symbol = SymbolId(self.next_symbol);
        self.next_symbol += 1;
        self.facts.declare(symbol, stage);
        symbol
    }

    /// Declares a symbol the host knows nothing about
    pub fn undeclared(&mut self) -> SymbolId {
        let symbol = SymbolId(self.next_symbol);
        self.next_symbol += 1;
        symbol
    }

    /// Interner of the compilation
    #[must_use]
    pub fn interner(&self) -> &Interner {
        self.compilation.interner()
    }

    /// Builder for a template tree
    #[must_use]
    pub fn builder(&self) -> BodyBuilder<'_> {
        BodyBuilder::new(self.interner(), FileId(0))
    }

    /// Runs one template through the filter
    ///
    /// # Errors
    ///
    /// Returns an error on an internal defect
    pub fn compile(&self, template: &Member) -> Result<CompiledTemplate> {
        let compiled = self.compilation.filter().compile_template(
            template,
            &self.facts,
            &Default::default(),
        )?;
        Ok(compiled)
    }

    /// Generation program of a template that must compile cleanly
    ///
    /// # Errors
    ///
    /// Returns an error if the template was abandoned
    pub fn program(&self, template: &Member) -> Result<GenerationProgram> {
        let compiled = self.compile(template)?;
        match compiled.outcome {
            TemplateOutcome::Generated(program) => Ok(program),
            TemplateOutcome::Abandoned => {
                let messages: Vec<String> =
                    compiled.diagnostics.iter().map(ToString::to_string).collect();
                bail!("template was abandoned: {}", messages.join("; "))
            }
        }
    }

    /// Compiles a template and runs its program with `args`
    ///
    /// # Errors
    ///
    /// Returns an error if compilation or evaluation fails
    pub fn generate(&self, template: &Member, args: Vec<Value>) -> Result<GeneratedArtifact> {
        let program = self.program(template)?;
        let artifact = Evaluator::new(self.interner()).run(&program.member, args)?;
        Ok(artifact)
    }

    /// Source rendering of a template body
    #[must_use]
    pub fn render(&self, template: &Member) -> String {
        render_block(&template.body, &template.block, self.interner())
    }
}

impl Default for StagingFixture {
    fn default() -> Self {
        Self::new()
    }
}
