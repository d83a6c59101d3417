//! Identity bookkeeping for staged rewriting
//!
//! - [`SymbolRegistry`]: stable string ids for host symbols, one registry per
//!   compilation unit.
//! - [`LocationStore`], [`StageStore`], [`SymbolStore`]: side tables keyed by
//!   node identity within one body.
//! - [`LexicalScope`]: collision-free allocation of synthesized names.

pub mod registry;
pub mod scope;
pub mod store;

pub use registry::SymbolRegistry;
pub use scope::LexicalScope;
pub use store::{LocationStore, StageStore, SymbolStore};
