//! Language-version gate
//!
//! Runs over a template before rewriting, independent of stages. Every
//! construct that needs a newer language level than the configured ceiling
//! is reported once; the highest level seen is returned either way.

use sc_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use sc_syntax::{visit, BinaryOp, Block, Body, Expr, NodeRef, Stmt};
use std::fmt;
use tracing::{debug, instrument};

/// Language level, as a plain ordinal
pub type Level = u32;

/// Language features with a minimum level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageFeature {
    /// `a ?? b`
    NullCoalescing,
    /// `a?.b`, `a?[i]`
    NullConditional,
    /// `$"..{x}.."`
    StringInterpolation,
    /// `nameof(x)`
    NameOf,
    /// `switch` over non-constant cases
    PatternSwitch,
    /// `[a, b]`
    CollectionLiteral,
}

impl LanguageFeature {
    /// Minimum language level that accepts the feature
    #[must_use]
    pub fn required_level(self) -> Level {
        match self {
            Self::NullCoalescing => 2,
            Self::NullConditional | Self::StringInterpolation | Self::NameOf => 6,
            Self::PatternSwitch => 7,
            Self::CollectionLiteral => 12,
        }
    }

    /// User-facing feature name
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::NullCoalescing => "null-coalescing operator",
            Self::NullConditional => "null-conditional access",
            Self::StringInterpolation => "string interpolation",
            Self::NameOf => "nameof expression",
            Self::PatternSwitch => "switch on non-constant case",
            Self::CollectionLiteral => "collection literal",
        }
    }
}

impl fmt::Display for LanguageFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Outcome of gating one template
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionReport {
    /// Highest language level any construct needed
    pub max_encountered: Level,
    /// Number of constructs above the ceiling
    pub rejected: usize,
}

impl VersionReport {
    /// Whether every construct fit under the ceiling
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.rejected == 0
    }
}

fn feature_of(body: &Body, node: NodeRef) -> Option<LanguageFeature> {
    match node {
        NodeRef::Expr(id) => match &body.exprs[id] {
            Expr::Binary {
                op: BinaryOp::Coalesce,
                ..
            } => Some(LanguageFeature::NullCoalescing),
            Expr::ConditionalMember { .. } | Expr::ConditionalIndex { .. } => {
                Some(LanguageFeature::NullConditional)
            }
            Expr::Interpolated { .. } => Some(LanguageFeature::StringInterpolation),
            Expr::NameOf { .. } => Some(LanguageFeature::NameOf),
            Expr::List { .. } => Some(LanguageFeature::CollectionLiteral),
            _ => None,
        },
        NodeRef::Stmt(id) => match &body.stmts[id] {
            Stmt::Switch { cases, .. }
                if cases
                    .iter()
                    .any(|case| !matches!(body.exprs[case.value], Expr::Literal { .. })) =>
            {
                Some(LanguageFeature::PatternSwitch)
            }
            _ => None,
        },
    }
}

/// Check every construct under `block` against `max`
#[instrument(skip_all, fields(max = max))]
pub fn gate(body: &Body, block: &Block, max: Level, sink: &mut dyn DiagnosticSink) -> VersionReport {
    let mut report = VersionReport::default();
    for node in visit::preorder_block(body, block) {
        let Some(feature) = feature_of(body, node) else {
            continue;
        };
        let required = feature.required_level();
        report.max_encountered = report.max_encountered.max(required);
        if required > max {
            report.rejected += 1;
            sink.report(Diagnostic::new(
                DiagnosticCode::UnsupportedLanguageVersion,
                body.span_of(node),
                vec![feature.to_string(), required.to_string(), max.to_string()],
            ));
        }
    }
    debug!(max_encountered = report.max_encountered, rejected = report.rejected, "version gate");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_diagnostics::DiagnosticBag;
    use sc_intern::Interner;
    use sc_span::FileId;
    use sc_syntax::{BodyBuilder, InterpolationPart};

    #[test]
    fn test_tracks_max_level_without_rejecting() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let x = b.name("x", None);
        let fallback = b.int(0);
        let coalesce = b.binary(BinaryOp::Coalesce, x, fallback);
        let parts = vec![InterpolationPart::Hole(coalesce)];
        let text = b.interpolated(parts);
        let stmt = b.expr_stmt(text);
        let block = b.block(vec![stmt]);
        let body = b.finish();

        let mut sink = DiagnosticBag::new();
        let report = gate(&body, &block, 7, &mut sink);
        assert_eq!(report.max_encountered, 6);
        assert!(report.is_accepted());
        assert!(!sink.has_errors());
    }

    #[test]
    fn test_reports_construct_above_ceiling() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let x = b.name("x", None);
        let access = b.cond_member(x, "Length");
        let stmt = b.expr_stmt(access);
        let block = b.block(vec![stmt]);
        let body = b.finish();

        let mut sink = DiagnosticBag::new();
        let report = gate(&body, &block, 5, &mut sink);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.max_encountered, 6);

        let diagnostic = &sink.diagnostics()[0];
        assert_eq!(diagnostic.code, DiagnosticCode::UnsupportedLanguageVersion);
        assert_eq!(diagnostic.span, body.exprs[access].span());
        assert_eq!(
            diagnostic.message(),
            "null-conditional access requires language version 6, but the maximum allowed is 5"
        );
    }

    #[test]
    fn test_literal_switch_is_not_gated() {
        let interner = Interner::new();
        let mut b = BodyBuilder::new(&interner, FileId(0));
        let x = b.name("x", None);
        let one = b.int(1);
        let empty = b.block(Vec::new());
        let switch = b.switch(
            x,
            vec![sc_syntax::SwitchCase {
                value: one,
                body: empty,
            }],
            None,
        );
        let block = b.block(vec![switch]);
        let body = b.finish();

        let mut sink = DiagnosticBag::new();
        let report = gate(&body, &block, 1, &mut sink);
        assert_eq!(report.max_encountered, 0);
        assert!(sink.diagnostics().is_empty());
    }
}
