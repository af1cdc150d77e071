use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::model::ElementId;
use crate::symbols::Symbol;

use super::context::ReferenceContext;

/// Arena index of a binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BindingId(pub u32);

impl BindingId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Resolution state of a reference site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingStatus {
    /// No reference text was specified. Terminal: never retried.
    Undefined,
    /// Not yet resolved, or the target went away. Retried whenever the
    /// symbol table changes underneath the binding's computed symbol.
    Unknown,
    /// Resolved to exactly one element of the expected shape.
    Known,
}

/// One reference site: raw text, context, and current resolution state.
///
/// Invariant: `target.is_some()` iff `status == Known`. State changes go
/// through the scheduler; reads never trigger resolution.
#[derive(Debug)]
pub struct SingleItemBinding {
    owner: ElementId,
    context: ReferenceContext,
    raw: Option<SmolStr>,
    status: BindingStatus,
    target: Option<ElementId>,
    /// Symbol this binding is currently keyed under in the inverse index.
    symbol: Option<Symbol>,
}

impl SingleItemBinding {
    pub fn new(owner: ElementId, context: ReferenceContext, raw: Option<&str>) -> Self {
        let raw = raw.filter(|text| !text.is_empty()).map(SmolStr::new);
        let status = if raw.is_none() && !context.defaults_when_omitted() {
            BindingStatus::Undefined
        } else {
            BindingStatus::Unknown
        };
        Self {
            owner,
            context,
            raw,
            status,
            target: None,
            symbol: None,
        }
    }

    pub fn owner(&self) -> ElementId {
        self.owner
    }

    pub fn context(&self) -> ReferenceContext {
        self.context
    }

    pub fn raw_text(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn status(&self) -> BindingStatus {
        self.status
    }

    pub fn target(&self) -> Option<ElementId> {
        self.target
    }

    /// Symbol last computed by the normalizer for this binding.
    pub fn symbol(&self) -> Option<&Symbol> {
        self.symbol.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.status == BindingStatus::Known
    }

    pub(crate) fn set_known(&mut self, target: ElementId) {
        self.status = BindingStatus::Known;
        self.target = Some(target);
    }

    pub(crate) fn set_unknown(&mut self) {
        if self.status != BindingStatus::Undefined {
            self.status = BindingStatus::Unknown;
        }
        self.target = None;
    }

    /// Replace the raw text, resetting resolution state.
    pub(crate) fn reset_raw(&mut self, raw: Option<&str>) {
        self.raw = raw.filter(|text| !text.is_empty()).map(SmolStr::new);
        self.status = if self.raw.is_none() && !self.context.defaults_when_omitted() {
            BindingStatus::Undefined
        } else {
            BindingStatus::Unknown
        };
        self.target = None;
    }

    pub(crate) fn set_symbol(&mut self, symbol: Option<Symbol>) {
        self.symbol = symbol;
    }
}

/// Arena of bindings plus the inverse index from symbols to the bindings
/// currently keyed on them.
///
/// The inverse index is what keeps rename/deletion cascades linear: a table
/// mutation requeues only the bindings registered against the affected
/// symbol, never a scan of every binding in the model.
#[derive(Default)]
pub struct BindingSet {
    arena: Vec<Option<SingleItemBinding>>,
    by_symbol: FxHashMap<Symbol, FxHashSet<BindingId>>,
    /// Unknown bindings whose symbol is currently uncomputable (a scoping
    /// dependency of their normalizer is itself unresolved).
    floating: FxHashSet<BindingId>,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, binding: SingleItemBinding) -> BindingId {
        let id = BindingId::new(self.arena.len());
        if binding.status() == BindingStatus::Unknown {
            self.floating.insert(id);
        }
        self.arena.push(Some(binding));
        id
    }

    pub fn get(&self, id: BindingId) -> Option<&SingleItemBinding> {
        self.arena.get(id.index()).and_then(|slot| slot.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: BindingId) -> Option<&mut SingleItemBinding> {
        self.arena
            .get_mut(id.index())
            .and_then(|slot| slot.as_mut())
    }

    /// Bindings currently keyed on `symbol`.
    pub fn keyed_on(&self, symbol: &Symbol) -> Vec<BindingId> {
        self.by_symbol
            .get(symbol)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub(crate) fn floating(&self) -> Vec<BindingId> {
        self.floating.iter().copied().collect()
    }

    /// Move a binding's inverse-index registration to `symbol` (or to the
    /// floating set when the symbol is uncomputable).
    pub(crate) fn rekey(&mut self, id: BindingId, symbol: Option<Symbol>) {
        let old = match self.get(id) {
            Some(binding) => binding.symbol().cloned(),
            None => return,
        };
        if let Some(old_symbol) = old {
            if let Some(ids) = self.by_symbol.get_mut(&old_symbol) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.by_symbol.remove(&old_symbol);
                }
            }
        }
        self.floating.remove(&id);
        match &symbol {
            Some(new_symbol) => {
                self.by_symbol
                    .entry(new_symbol.clone())
                    .or_default()
                    .insert(id);
            }
            None => {
                let undefined = self
                    .get(id)
                    .is_some_and(|b| b.status() == BindingStatus::Undefined);
                if !undefined {
                    self.floating.insert(id);
                }
            }
        }
        if let Some(binding) = self.get_mut(id) {
            binding.set_symbol(symbol);
        }
    }

    /// Deregister and tombstone a binding (its owner was deleted).
    pub(crate) fn remove(&mut self, id: BindingId) {
        self.rekey(id, None);
        self.floating.remove(&id);
        if let Some(slot) = self.arena.get_mut(id.index()) {
            *slot = None;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (BindingId, &SingleItemBinding)> {
        self.arena
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|b| (BindingId::new(index), b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ElementId;

    #[test]
    fn empty_text_is_undefined_and_terminal() {
        let binding = SingleItemBinding::new(
            ElementId::new(0),
            ReferenceContext::NavigationPropertyRelationship,
            Some(""),
        );
        assert_eq!(binding.status(), BindingStatus::Undefined);
        assert_eq!(binding.raw_text(), None);

        let mut binding = binding;
        binding.set_unknown();
        assert_eq!(binding.status(), BindingStatus::Undefined);
    }

    #[test]
    fn defaultable_contexts_stay_unknown_without_text() {
        let binding = SingleItemBinding::new(
            ElementId::new(0),
            ReferenceContext::AssociationSetEndRole,
            None,
        );
        assert_eq!(binding.status(), BindingStatus::Unknown);
    }

    #[test]
    fn rekey_moves_inverse_index_registration() {
        let mut set = BindingSet::new();
        let id = set.alloc(SingleItemBinding::new(
            ElementId::new(0),
            ReferenceContext::EntitySetEntityType,
            Some("Customer"),
        ));
        assert_eq!(set.floating(), vec![id]);

        let symbol = crate::symbols::Symbol::from_parts(["Model1", "Customer"]);
        set.rekey(id, Some(symbol.clone()));
        assert_eq!(set.keyed_on(&symbol), vec![id]);
        assert!(set.floating().is_empty());

        set.rekey(id, None);
        assert!(set.keyed_on(&symbol).is_empty());
        assert_eq!(set.floating(), vec![id]);
    }
}
