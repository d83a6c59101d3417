//! Symbol identity registry
//!
//! Ids have the form `node=<seq>,compilation=<compilation-seq>`. The
//! sequence is per registry; the compilation sequence is unique per process,
//! so an id minted by one compilation is never accepted by another.
//!
//! The registry is owned by its compilation unit and dropped with it; it
//! holds symbol ids by value and owns nothing of the host's.

use rustc_hash::FxHashMap;
use sc_diagnostics::InternalError;
use sc_syntax::SymbolId;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::trace;

static NEXT_COMPILATION: AtomicU32 = AtomicU32::new(1);

#[derive(Debug, Default)]
struct Tables {
    ids: FxHashMap<SymbolId, String>,
    symbols: FxHashMap<String, SymbolId>,
    next: u32,
}

/// Bidirectional symbol ↔ id map for one compilation unit
#[derive(Debug)]
pub struct SymbolRegistry {
    compilation: u32,
    tables: Mutex<Tables>,
}

impl SymbolRegistry {
    /// Create the registry of a new compilation unit
    #[must_use]
    pub fn new() -> Self {
        Self {
            compilation: NEXT_COMPILATION.fetch_add(1, Ordering::Relaxed),
            tables: Mutex::new(Tables::default()),
        }
    }

    /// Process-unique sequence number of this compilation
    #[must_use]
    pub fn compilation_seq(&self) -> u32 {
        self.compilation
    }

    /// Id of `symbol`, created on first sight
    ///
    /// Concurrent first calls for the same symbol agree on a single id: the
    /// create-if-absent check runs under the registry lock.
    pub fn get_id(&self, symbol: SymbolId) -> String {
        // The tables stay consistent even if a holder panicked; every
        // mutation below is a pair of inserts done together.
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(id) = tables.ids.get(&symbol) {
            return id.clone();
        }
        let seq = tables.next;
        tables.next += 1;
        let id = format!("node={seq},compilation={}", self.compilation);
        tables.ids.insert(symbol, id.clone());
        tables.symbols.insert(id.clone(), symbol);
        trace!(?symbol, %id, "symbol id created");
        id
    }

    /// Exact reverse lookup
    ///
    /// # Errors
    ///
    /// Returns [`InternalError::UnknownSymbolId`] when `id` was not produced by
    /// this registry. Ids never reach users, so this is always a defect.
    pub fn get_symbol(&self, id: &str) -> Result<SymbolId, InternalError> {
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables
            .symbols
            .get(id)
            .copied()
            .ok_or_else(|| InternalError::UnknownSymbolId { id: id.to_string() })
    }

    /// Number of symbols that have an id
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner).ids.len()
    }

    /// Whether no id has been created yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
