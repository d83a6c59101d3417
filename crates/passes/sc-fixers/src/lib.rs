//! Special-case rewrites needed for valid reconstruction
//!
//! Each fixer is small and independent:
//!
//! - [`interpolation`]: keeps holes of reconstructed interpolated strings
//!   printable on one line and unambiguous
//! - [`conditional`]: turns the root `?.`/`?[` of an access chain on a
//!   spliced receiver into a plain access
//! - [`type_params`]: replaces type parameters with concrete arguments
//! - [`version`]: flags constructs above the configured language version

pub mod conditional;
pub mod interpolation;
pub mod type_params;
pub mod version;

pub use conditional::ConditionalAccessFlattener;
pub use type_params::TemplateTypeArgument;
pub use version::{LanguageFeature, Level, VersionReport};
