//! Computes the symbols an element declares itself under.
//!
//! Scoping rules per kind: types, associations and functions declare under
//! their schema namespace; sets, association-sets and function imports under
//! their entity container; properties under their declaring type; association
//! ends under their association's symbol plus role name.

use smol_str::SmolStr;

use crate::model::{ElementId, ElementKind, ModelTree};

use super::Symbol;

/// Namespace of the nearest enclosing `Schema` (including `id` itself).
pub fn schema_namespace(tree: &ModelTree, id: ElementId) -> Option<SmolStr> {
    let element = tree.get(id)?;
    if element.kind == ElementKind::Schema {
        return element.name.clone();
    }
    let schema = tree.nearest_ancestor(id, ElementKind::Schema)?;
    tree.get(schema)?.name.clone()
}

/// All symbols `id` declares itself under (usually zero or one).
pub fn declared_symbols(tree: &ModelTree, id: ElementId) -> Vec<Symbol> {
    declared_symbol(tree, id).into_iter().collect()
}

/// The symbol `id` declares itself under, if its kind declares one.
pub fn declared_symbol(tree: &ModelTree, id: ElementId) -> Option<Symbol> {
    let element = tree.get(id)?;
    let name = element.name.clone()?;
    match element.kind {
        ElementKind::EntityType
        | ElementKind::ComplexType
        | ElementKind::Association
        | ElementKind::Function => Some(namespace_qualified(tree, id, name)),

        ElementKind::Property | ElementKind::NavigationProperty => {
            let declaring_type = element.parent?;
            Some(declared_symbol(tree, declaring_type)?.child(name))
        }

        ElementKind::EntityContainer => Some(Symbol::from_parts([name])),

        ElementKind::EntitySet | ElementKind::AssociationSet | ElementKind::FunctionImport => {
            let container = tree.nearest_ancestor(id, ElementKind::EntityContainer)?;
            Some(declared_symbol(tree, container)?.child(name))
        }

        ElementKind::AssociationEnd => {
            let association = element.parent?;
            Some(declared_symbol(tree, association)?.child(name))
        }

        _ => None,
    }
}

// Dotted namespaces split into path components, so `Model1.Store.Customers`
// names the same symbol however the reference spells the qualifier.
fn namespace_qualified(tree: &ModelTree, id: ElementId, name: SmolStr) -> Symbol {
    match schema_namespace(tree, id) {
        Some(namespace) => Symbol::from_dotted(&namespace).child(name),
        None => Symbol::from_parts([name]),
    }
}
