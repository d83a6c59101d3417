//! Compilation unit

use crate::config::StagingConfig;
use crate::filter::TemplateFilter;
use sc_identity::SymbolRegistry;
use sc_intern::Interner;

/// State shared by every template compiled in one run
///
/// The interner must be the one the host built its trees with; the
/// registry hands out the symbol ids recorded in generation programs.
pub struct Compilation {
    interner: Interner,
    registry: SymbolRegistry,
    config: StagingConfig,
}

impl Compilation {
    /// Start a compilation with its own interner
    #[must_use]
    pub fn new(config: StagingConfig) -> Self {
        Self::with_interner(Interner::new(), config)
    }

    /// Start a compilation over an existing interner
    #[must_use]
    pub fn with_interner(interner: Interner, config: StagingConfig) -> Self {
        Self {
            interner,
            registry: SymbolRegistry::new(),
            config,
        }
    }

    /// Interner of the host trees
    #[must_use]
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Symbol id registry of this compilation
    #[must_use]
    pub fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    /// Settings of this compilation
    #[must_use]
    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    /// Template filter bound to this compilation
    #[must_use]
    pub fn filter(&self) -> TemplateFilter<'_> {
        TemplateFilter::new(self)
    }
}

impl Default for Compilation {
    fn default() -> Self {
        Self::new(StagingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compilations_get_distinct_sequences() {
        let first = Compilation::default();
        let second = Compilation::default();
        assert_ne!(
            first.registry().compilation_seq(),
            second.registry().compilation_seq()
        );
    }

    #[test]
    fn test_existing_interner_is_kept() {
        let interner = Interner::new();
        let name = interner.intern("emit");
        let compilation = Compilation::with_interner(interner, StagingConfig::default());
        assert_eq!(compilation.interner().resolve(&name), "emit");
    }
}
