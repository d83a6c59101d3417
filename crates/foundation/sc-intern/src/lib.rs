//! String interning for identifiers
//!
//! All names in template trees are interned once per compilation. The
//! rodeo is already thread-safe, so clones of an [`Interner`] can be handed
//! to independent templates compiled on separate threads.

pub use lasso::Spur as Symbol;
use lasso::ThreadedRodeo;
use std::fmt;
use std::sync::Arc;

/// Thread-safe string interner
#[derive(Clone, Default)]
pub struct Interner {
    inner: Arc<ThreadedRodeo>,
}

impl Interner {
    /// Create an empty interner
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ThreadedRodeo::new()),
        }
    }

    /// Intern `text`, returning its symbol
    pub fn intern(&self, text: &str) -> Symbol {
        self.inner.get_or_intern(text)
    }

    /// Look up an already interned string without interning it
    pub fn get(&self, text: &str) -> Option<Symbol> {
        self.inner.get(text)
    }

    /// Resolve a symbol produced by this interner
    pub fn resolve(&self, sym: &Symbol) -> &str {
        self.inner.resolve(sym)
    }

    /// Resolve a symbol that may belong to another interner
    pub fn try_resolve(&self, sym: &Symbol) -> Option<&str> {
        self.inner.try_resolve(sym)
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interner")
            .field("len", &self.inner.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_idempotent() {
        let interner = Interner::new();
        let first = interner.intern("tmp");
        let second = interner.intern("tmp");
        assert_eq!(first, second);
        assert_eq!(interner.resolve(&first), "tmp");
    }

    #[test]
    fn test_clones_share_storage() {
        let interner = Interner::new();
        let clone = interner.clone();
        let sym = clone.intern("shared");
        assert_eq!(interner.get("shared"), Some(sym));
    }
}
