//! Worklist-driven resolution scheduler.
//!
//! Single-threaded and synchronous: `drain` runs to fixpoint inside the
//! committing transaction, so callers always observe a converged binding
//! graph. Forward references converge because every pass that resolves at
//! least one binding retries the rest; a pass with no state change stops the
//! loop, which bounds malformed reference cycles.

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::model::ModelTree;
use crate::symbols::{SymbolChange, SymbolTable};

use super::binding::{BindingId, BindingSet, BindingStatus};
use super::normalize::normalize;

/// Counters reported from one drain, for logging and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Bindings that transitioned to `Known` during the drain.
    pub resolved: usize,
    /// Bindings still `Unknown` when the drain settled.
    pub unresolved: usize,
}

/// Requeues and re-runs pending bindings as the symbol table changes.
#[derive(Default)]
pub struct ResolveEngine {
    queue: Vec<BindingId>,
    queued: FxHashSet<BindingId>,
}

enum Attempt {
    Resolved,
    StillUnknown { changed: bool },
    Settled,
}

impl ResolveEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, id: BindingId) {
        if self.queued.insert(id) {
            self.queue.push(id);
        }
    }

    /// React to one symbol-table mutation: requeue the bindings keyed on the
    /// affected symbol via the inverse index, plus any binding whose symbol
    /// is currently uncomputable (its scope may have just appeared).
    pub fn note_change(&mut self, bindings: &BindingSet, change: &SymbolChange) {
        let symbol = match change {
            SymbolChange::Declared(symbol) | SymbolChange::Removed(symbol) => symbol,
        };
        for id in bindings.keyed_on(symbol) {
            trace!("requeue {:?} for {}", id, symbol);
            self.enqueue(id);
        }
        for id in bindings.floating() {
            self.enqueue(id);
        }
    }

    /// Drain the worklist to fixpoint.
    pub fn drain(
        &mut self,
        tree: &ModelTree,
        table: &SymbolTable,
        bindings: &mut BindingSet,
    ) -> DrainStats {
        let mut pending = std::mem::take(&mut self.queue);
        self.queued.clear();
        let mut stats = DrainStats::default();

        loop {
            // Floating bindings may become computable as other bindings
            // resolve within this same drain; retry them every pass.
            let mut seen: FxHashSet<BindingId> = pending.iter().copied().collect();
            for id in bindings.floating() {
                if seen.insert(id) {
                    pending.push(id);
                }
            }

            let mut progress = false;
            let mut next = Vec::new();
            for id in pending {
                match Self::attempt(tree, table, bindings, id) {
                    Attempt::Resolved => {
                        stats.resolved += 1;
                        progress = true;
                    }
                    Attempt::StillUnknown { changed } => {
                        progress |= changed;
                        next.push(id);
                    }
                    Attempt::Settled => {}
                }
            }
            if next.is_empty() || !progress {
                stats.unresolved = next.len();
                break;
            }
            pending = next;
        }

        debug!(
            "drain settled: {} resolved, {} unresolved",
            stats.resolved, stats.unresolved
        );
        stats
    }

    /// One resolution attempt: fresh normalization, inverse-index rekey,
    /// table lookup, shape check. A hit of the wrong shape is a miss.
    fn attempt(
        tree: &ModelTree,
        table: &SymbolTable,
        bindings: &mut BindingSet,
        id: BindingId,
    ) -> Attempt {
        let Some(binding) = bindings.get(id) else {
            return Attempt::Settled;
        };
        if binding.status() == BindingStatus::Undefined {
            return Attempt::Settled;
        }
        let owner = binding.owner();
        let context = binding.context();
        let raw = binding.raw_text().map(smol_str::SmolStr::new);
        let was_known = binding.status() == BindingStatus::Known;
        let old_symbol = binding.symbol().cloned();

        let Some(owner_space) = tree.get(owner).map(|el| el.space) else {
            return Attempt::Settled;
        };

        match normalize(context, tree, bindings, owner, raw.as_deref()) {
            None => {
                let changed = was_known || old_symbol.is_some();
                bindings.rekey(id, None);
                if let Some(binding) = bindings.get_mut(id) {
                    binding.set_unknown();
                }
                Attempt::StillUnknown { changed }
            }
            Some(name) => {
                let symbol_changed = old_symbol.as_ref() != Some(&name.symbol);
                let matches: Vec<_> = table
                    .candidates(&name.symbol)
                    .iter()
                    .copied()
                    .filter(|candidate| {
                        tree.get(*candidate).is_some_and(|el| {
                            context.target_matches(el.kind, el.space, owner_space)
                        })
                    })
                    .collect();

                bindings.rekey(id, Some(name.symbol.clone()));
                match matches.as_slice() {
                    [target] => {
                        let target = *target;
                        let already = bindings.get(id).and_then(|b| b.target()) == Some(target);
                        if let Some(binding) = bindings.get_mut(id) {
                            binding.set_known(target);
                        }
                        trace!("{:?} bound {} -> {:?}", id, name.symbol, target);
                        if already && !symbol_changed {
                            Attempt::Settled
                        } else {
                            Attempt::Resolved
                        }
                    }
                    _ => {
                        if let Some(binding) = bindings.get_mut(id) {
                            binding.set_unknown();
                        }
                        Attempt::StillUnknown {
                            changed: was_known || symbol_changed,
                        }
                    }
                }
            }
        }
    }
}
