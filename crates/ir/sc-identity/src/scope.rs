//! Collision-free name allocation

use rustc_hash::FxHashSet;
use sc_intern::Interner;
use sc_syntax::{Body, Expr, Member, Stmt};

/// Names visible in one generated region
///
/// The set only grows. One instance belongs to one rewrite and is not shared
/// across threads.
#[derive(Debug, Clone, Default)]
pub struct LexicalScope {
    names: FxHashSet<String>,
}

impl LexicalScope {
    /// Create an empty scope
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope that already sees `names`
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a scope seeded with every identifier a member declares or uses
    #[must_use]
    pub fn for_member(member: &Member, interner: &Interner) -> Self {
        let declared = std::iter::once(&member.name)
            .chain(member.params.iter().map(|param| &param.name));
        let mut scope = Self::from_names(declared.map(|name| interner.resolve(name)));
        scope.register_body(&member.body, interner);
        scope
    }

    fn register_body(&mut self, body: &Body, interner: &Interner) {
        for (_, expr) in body.exprs.iter() {
            match expr {
                Expr::Name { name, .. } => {
                    self.register(interner.resolve(name));
                }
                Expr::QualifiedName { segments, .. } => {
                    if let Some(first) = segments.first() {
                        self.register(interner.resolve(first));
                    }
                }
                _ => {}
            }
        }
        for (_, stmt) in body.stmts.iter() {
            match stmt {
                Stmt::Let { name, .. } | Stmt::ForEach { binding: name, .. } => {
                    self.register(interner.resolve(name));
                }
                _ => {}
            }
        }
    }

    /// Make `name` visible; returns whether it was new
    pub fn register(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string())
    }

    /// Whether `name` is visible
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Allocate a fresh name derived from `hint`
    ///
    /// Returns `hint` itself when free, otherwise the first free name among
    /// `hint_1`, `hint_2`, ... The result is registered before returning.
    pub fn get_unique_identifier(&mut self, hint: &str) -> String {
        let mut candidate = hint.to_string();
        let mut suffix = 0u32;
        while self.names.contains(&candidate) {
            suffix += 1;
            candidate = format!("{hint}_{suffix}");
        }
        self.names.insert(candidate.clone());
        candidate
    }

    /// Number of visible names
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no name is visible
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
