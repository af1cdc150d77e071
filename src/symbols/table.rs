use rustc_hash::FxHashMap;
use tracing::trace;

use crate::model::ElementId;

use super::Symbol;

/// A symbol-table mutation recorded for the resolution scheduler.
///
/// The table journals every insert/remove; the scheduler drains the journal
/// at transaction commit and requeues only the bindings keyed on the
/// affected symbols.
#[derive(Clone, Debug)]
pub enum SymbolChange {
    Declared(Symbol),
    Removed(Symbol),
}

/// Per-artifact registry mapping symbols to declared elements.
///
/// Duplicate declarations coexist here: lookups filter by expected kind and
/// require exactly one surviving candidate, and duplicate same-kinded
/// declarations surface later as designer structural errors, never as
/// resolution failures.
#[derive(Default)]
pub struct SymbolTable {
    entries: FxHashMap<Symbol, Vec<ElementId>>,
    by_element: FxHashMap<ElementId, Vec<Symbol>>,
    journal: Vec<SymbolChange>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `element` under `symbol`.
    pub fn declare(&mut self, symbol: Symbol, element: ElementId) {
        trace!("declare {} -> {:?}", symbol, element);
        self.entries.entry(symbol.clone()).or_default().push(element);
        self.by_element.entry(element).or_default().push(symbol.clone());
        self.journal.push(SymbolChange::Declared(symbol));
    }

    /// Remove every symbol `element` is registered under.
    pub fn undeclare_element(&mut self, element: ElementId) {
        let Some(symbols) = self.by_element.remove(&element) else {
            return;
        };
        for symbol in symbols {
            trace!("undeclare {} -> {:?}", symbol, element);
            if let Some(candidates) = self.entries.get_mut(&symbol) {
                candidates.retain(|candidate| *candidate != element);
                if candidates.is_empty() {
                    self.entries.remove(&symbol);
                }
            }
            self.journal.push(SymbolChange::Removed(symbol));
        }
    }

    /// Elements currently declared under `symbol`.
    pub fn candidates(&self, symbol: &Symbol) -> &[ElementId] {
        self.entries.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Symbols `element` is currently declared under.
    pub fn symbols_of(&self, element: ElementId) -> &[Symbol] {
        self.by_element
            .get(&element)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Symbols with more than one declaration, for designer duplicate checks.
    pub fn duplicates(&self) -> impl Iterator<Item = (&Symbol, &[ElementId])> {
        self.entries
            .iter()
            .filter(|(_, candidates)| candidates.len() > 1)
            .map(|(symbol, candidates)| (symbol, candidates.as_slice()))
    }

    /// Drain the mutation journal accumulated since the last commit.
    pub fn drain_changes(&mut self) -> Vec<SymbolChange> {
        std::mem::take(&mut self.journal)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_and_lookup_are_case_insensitive() {
        let mut table = SymbolTable::new();
        let element = ElementId::new(0);
        table.declare(Symbol::from_parts(["Model1", "Customer"]), element);

        let lookup = Symbol::from_parts(["model1", "customer"]);
        assert_eq!(table.candidates(&lookup), &[element]);
    }

    #[test]
    fn undeclare_element_removes_all_its_symbols() {
        let mut table = SymbolTable::new();
        let element = ElementId::new(3);
        table.declare(Symbol::from_parts(["A"]), element);
        table.declare(Symbol::from_parts(["B", "C"]), element);
        table.drain_changes();

        table.undeclare_element(element);
        assert!(table.candidates(&Symbol::from_parts(["A"])).is_empty());
        assert!(table.candidates(&Symbol::from_parts(["B", "C"])).is_empty());
        assert_eq!(table.drain_changes().len(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn duplicates_coexist_until_reported() {
        let mut table = SymbolTable::new();
        let symbol = Symbol::from_parts(["Model1", "Customer"]);
        table.declare(symbol.clone(), ElementId::new(1));
        table.declare(symbol.clone(), ElementId::new(2));

        assert_eq!(table.candidates(&symbol).len(), 2);
        assert_eq!(table.duplicates().count(), 1);
    }

    #[test]
    fn journal_records_declares_and_removes_in_order() {
        let mut table = SymbolTable::new();
        let element = ElementId::new(7);
        table.declare(Symbol::from_parts(["X"]), element);
        table.undeclare_element(element);

        let changes = table.drain_changes();
        assert_eq!(changes.len(), 2);
        assert!(matches!(changes[0], SymbolChange::Declared(_)));
        assert!(matches!(changes[1], SymbolChange::Removed(_)));
        assert!(table.drain_changes().is_empty());
    }
}
