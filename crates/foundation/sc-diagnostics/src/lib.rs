//! Diagnostics for the staging engine
//!
//! There are two tiers of failure:
//!
//! - **User diagnostics** ([`Diagnostic`]) describe problems in template
//!   source: stage conflicts, constructs above the configured language
//!   version, references before declaration. Passes write them to a
//!   [`DiagnosticSink`] and keep going.
//! - **Internal defects** ([`InternalError`]) mean the engine itself is
//!   wrong: a node shape nobody handles, a lookup into a side table that
//!   should have been populated. They propagate as `Err` and are never
//!   reported as if the user caused them.

pub mod internal;

pub use internal::InternalError;

use sc_span::FileSpan;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Informational message
    Info,
    /// Warning that should be addressed
    Warning,
    /// Error; the template that produced it is abandoned
    Error,
}

/// Stable diagnostic codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// A now-only position received a later-stage value
    StageConflict,
    /// A control construct's condition has no decidable stage
    AmbiguousStage,
    /// A local was referenced before its declaration in the same block
    ForwardReference,
    /// A construct requires a newer language version than allowed
    UnsupportedLanguageVersion,
    /// A run-time value was stored in a compile-time local
    RunTimeValueInCompileTimeLocal,
}

impl DiagnosticCode {
    /// Short code printed in front of the message
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StageConflict => "SC0001",
            Self::AmbiguousStage => "SC0002",
            Self::ForwardReference => "SC0003",
            Self::UnsupportedLanguageVersion => "SC0004",
            Self::RunTimeValueInCompileTimeLocal => "SC0005",
        }
    }

    /// Default severity for this code
    #[must_use]
    pub fn default_severity(self) -> Severity {
        Severity::Error
    }

    /// Message template; `{0}`, `{1}`, ... are replaced by arguments
    #[must_use]
    pub fn template(self) -> &'static str {
        match self {
            Self::StageConflict => {
                "`{0}` is compile-time only but receives the run-time value `{1}`"
            }
            Self::AmbiguousStage => {
                "cannot decide whether `{0}` runs at compile time or at run time"
            }
            Self::ForwardReference => "local `{0}` is used before its declaration",
            Self::UnsupportedLanguageVersion => {
                "{0} requires language version {1}, but the maximum allowed is {2}"
            }
            Self::RunTimeValueInCompileTimeLocal => {
                "compile-time local `{0}` cannot hold the run-time value `{1}`"
            }
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-facing diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Diagnostic code
    pub code: DiagnosticCode,
    /// Severity level
    pub severity: Severity,
    /// Source location
    pub span: FileSpan,
    /// Message arguments substituted into the code's template
    pub args: Vec<String>,
}

impl Diagnostic {
    /// Create a diagnostic with the code's default severity
    #[must_use]
    pub fn new(code: DiagnosticCode, span: FileSpan, args: Vec<String>) -> Self {
        Self {
            code,
            severity: code.default_severity(),
            span,
            args,
        }
    }

    /// Render the human-readable message
    #[must_use]
    pub fn message(&self) -> String {
        let mut message = self.code.template().to_string();
        for (index, arg) in self.args.iter().enumerate() {
            message = message.replace(&format!("{{{index}}}"), arg);
        }
        message
    }

    /// Whether this diagnostic abandons its template
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.code, self.span, self.message())
    }
}

/// Capability the passes write user diagnostics to
pub trait DiagnosticSink {
    /// Report a diagnostic
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Collecting sink
#[derive(Debug, Clone, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    /// Create an empty bag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All diagnostics reported so far
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Take all diagnostics
    #[must_use]
    pub fn take_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Number of error-severity diagnostics
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|diag| diag.is_error()).count()
    }

    /// Whether any error was reported
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

impl DiagnosticSink for DiagnosticBag {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}
