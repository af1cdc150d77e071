//! Name normalizers: one scoping rule per reference context.
//!
//! A normalizer computes, from the referencing element and the raw reference
//! text, the symbol the referenced element is expected to be registered
//! under. Normalizers are pure: they read the tree and already-resolved
//! sibling bindings but never mutate anything, so calling one twice yields
//! structurally equal symbols.
//!
//! Mapping-side normalizers depend on other bindings (a fragment's
//! `StoreEntitySet` is scoped by its container mapping's resolved
//! `StorageEntityContainer`); while the dependency is unresolved they return
//! `None` and the scheduler retries them on a later pass.

use smol_str::SmolStr;
use tracing::trace;

use crate::model::{ElementId, ElementKind, ModelTree};
use crate::symbols::{NormalizedName, Symbol, declared_symbol, schema_namespace};

use super::binding::BindingSet;
use super::context::ReferenceContext;

/// Compute the expected symbol for one reference site.
///
/// Returns `None` only when the raw text is absent for a non-defaultable
/// context, or when a scoping dependency is still unresolved.
pub fn normalize(
    context: ReferenceContext,
    tree: &ModelTree,
    bindings: &BindingSet,
    owner: ElementId,
    raw: Option<&str>,
) -> Option<NormalizedName> {
    use ReferenceContext as Ctx;

    let normalized = match context {
        // Namespace-qualified type references.
        Ctx::PropertyType
        | Ctx::NavigationPropertyRelationship
        | Ctx::AssociationEndType
        | Ctx::EntitySetEntityType
        | Ctx::AssociationSetAssociation
        | Ctx::AssociationSetMappingTypeName
        | Ctx::FunctionImportMappingFunctionName => {
            let raw = raw?;
            Some(NormalizedName::new(qualified_type(tree, owner, raw), raw))
        }

        Ctx::EntityTypeMappingTypeName => {
            let raw = raw?;
            let inner = strip_is_type_of(raw);
            let symbol = if inner.contains('.') {
                Symbol::from_dotted(inner)
            } else {
                Symbol::from_parts([inner])
            };
            Some(NormalizedName::new(symbol, raw))
        }

        // Roles of the navigation property's resolved association.
        Ctx::NavigationPropertyFromRole | Ctx::NavigationPropertyToRole => {
            let raw = raw?;
            let association =
                resolved_target(tree, bindings, owner, Ctx::NavigationPropertyRelationship)?;
            let symbol = declared_symbol(tree, association)?.child(raw);
            Some(NormalizedName::new(symbol, raw))
        }

        // Key property references scope under the declaring entity type.
        Ctx::PropertyRefName => {
            let raw = raw?;
            let entity_type = tree.nearest_ancestor(owner, ElementKind::EntityType)?;
            let symbol = declared_symbol(tree, entity_type)?.child(raw);
            Some(NormalizedName::new(symbol, raw))
        }

        // Association-set ends: scope is the set's resolved association.
        Ctx::AssociationSetEndRole => {
            let set = tree.get(owner)?.parent?;
            let association = resolved_target(tree, bindings, set, Ctx::AssociationSetAssociation)?;
            let role = match raw {
                Some(text) => SmolStr::new(text),
                None => default_set_end_role(tree, bindings, owner, set, association)?,
            };
            let symbol = declared_symbol(tree, association)?.child(role.clone());
            Some(NormalizedName::new(symbol, role))
        }

        Ctx::AssociationSetEndEntitySet => {
            let raw = raw?;
            let container = tree.nearest_ancestor(owner, ElementKind::EntityContainer)?;
            let symbol = declared_symbol(tree, container)?.child(raw);
            Some(NormalizedName::new(symbol, raw))
        }

        // Container references are bare names; the shape check picks the side.
        Ctx::MappingStorageContainer | Ctx::MappingConceptualContainer => {
            let raw = raw?;
            Some(NormalizedName::new(Symbol::from_parts([raw]), raw))
        }

        // C-space set references scope under the resolved conceptual container.
        Ctx::EntitySetMappingName | Ctx::AssociationSetMappingName => {
            let raw = raw?;
            let container =
                container_mapping_target(tree, bindings, owner, Ctx::MappingConceptualContainer)?;
            let symbol = declared_symbol(tree, container)?.child(raw);
            Some(NormalizedName::new(symbol, raw))
        }

        // S-space set references scope under the resolved storage container.
        // Using the conceptual side here would yield a permanently-Unknown
        // binding, never an error.
        Ctx::MappingFragmentStoreEntitySet => {
            let raw = raw?;
            let container =
                container_mapping_target(tree, bindings, owner, Ctx::MappingStorageContainer)?;
            let symbol = declared_symbol(tree, container)?.child(raw);
            Some(NormalizedName::new(symbol, raw))
        }

        Ctx::ScalarPropertyName => {
            let raw = raw?;
            let entity_type = scalar_property_entity_type(tree, bindings, owner)?;
            let symbol = declared_symbol(tree, entity_type)?.child(raw);
            Some(NormalizedName::new(symbol, raw))
        }

        Ctx::ScalarPropertyColumnName => {
            let raw = raw?;
            let store_set = store_entity_set_for(tree, bindings, owner)?;
            let store_type = resolved_target(tree, bindings, store_set, Ctx::EntitySetEntityType)?;
            let symbol = declared_symbol(tree, store_type)?.child(raw);
            Some(NormalizedName::new(symbol, raw))
        }

        Ctx::EndPropertyRole => {
            let raw = raw?;
            let set_mapping = tree.nearest_ancestor(owner, ElementKind::AssociationSetMapping)?;
            let association =
                resolved_target(tree, bindings, set_mapping, Ctx::AssociationSetMappingTypeName)?;
            let symbol = declared_symbol(tree, association)?.child(raw);
            Some(NormalizedName::new(symbol, raw))
        }

        Ctx::FunctionImportMappingImportName => {
            let raw = raw?;
            let container =
                container_mapping_target(tree, bindings, owner, Ctx::MappingConceptualContainer)?;
            let symbol = declared_symbol(tree, container)?.child(raw);
            Some(NormalizedName::new(symbol, raw))
        }
    };

    if let Some(name) = &normalized {
        trace!("normalize {:?} '{}' -> {}", context, name.raw, name.symbol);
    }
    normalized
}

/// EDM default for type-like references: dotted raw text is taken verbatim
/// as components; otherwise the nearest schema namespace prefixes it; with
/// no schema in scope the bare name stands alone.
fn qualified_type(tree: &ModelTree, owner: ElementId, raw: &str) -> Symbol {
    if raw.contains('.') {
        return Symbol::from_dotted(raw);
    }
    match schema_namespace(tree, owner) {
        Some(namespace) => Symbol::from_dotted(&namespace).child(raw),
        None => Symbol::from_parts([raw]),
    }
}

/// `IsTypeOf(Model1.Customer)` → `Model1.Customer`.
fn strip_is_type_of(raw: &str) -> &str {
    raw.strip_prefix("IsTypeOf(")
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(raw)
}

/// Resolved target of the binding with the given context on `element`.
fn resolved_target(
    tree: &ModelTree,
    bindings: &BindingSet,
    element: ElementId,
    context: ReferenceContext,
) -> Option<ElementId> {
    tree.get(element)?
        .bindings
        .iter()
        .filter_map(|id| bindings.get(*id))
        .find(|binding| binding.context() == context)
        .and_then(|binding| binding.target())
}

/// Resolved container of the nearest enclosing `EntityContainerMapping`.
fn container_mapping_target(
    tree: &ModelTree,
    bindings: &BindingSet,
    owner: ElementId,
    side: ReferenceContext,
) -> Option<ElementId> {
    let mapping = tree.nearest_ancestor(owner, ElementKind::EntityContainerMapping)?;
    resolved_target(tree, bindings, mapping, side)
}

/// The conceptual entity type a `ScalarProperty.Name` is scoped by: the
/// enclosing `EntityTypeMapping`'s type, or, inside an
/// `AssociationSetMapping`, the type of the enclosing end's role.
fn scalar_property_entity_type(
    tree: &ModelTree,
    bindings: &BindingSet,
    owner: ElementId,
) -> Option<ElementId> {
    if let Some(type_mapping) = tree.nearest_ancestor(owner, ElementKind::EntityTypeMapping) {
        return resolved_target(
            tree,
            bindings,
            type_mapping,
            ReferenceContext::EntityTypeMappingTypeName,
        );
    }
    let end_property = tree.nearest_ancestor(owner, ElementKind::EndProperty)?;
    let end = resolved_target(tree, bindings, end_property, ReferenceContext::EndPropertyRole)?;
    resolved_target(tree, bindings, end, ReferenceContext::AssociationEndType)
}

/// The storage entity set scoping a `ColumnName`: the nearest ancestor that
/// carries a `StoreEntitySet` binding (a fragment, or the association-set
/// mapping itself).
fn store_entity_set_for(
    tree: &ModelTree,
    bindings: &BindingSet,
    owner: ElementId,
) -> Option<ElementId> {
    std::iter::once(owner)
        .chain(tree.ancestors(owner))
        .find_map(|ancestor| {
            resolved_target(
                tree,
                bindings,
                ancestor,
                ReferenceContext::MappingFragmentStoreEntitySet,
            )
        })
}

/// Default role for an association-set end with no `Role` attribute: the
/// association end whose entity type matches the set-end's entity set, by
/// sibling position for self-associations.
fn default_set_end_role(
    tree: &ModelTree,
    bindings: &BindingSet,
    set_end: ElementId,
    set: ElementId,
    association: ElementId,
) -> Option<SmolStr> {
    let ends = tree.children_of_kind(association, ElementKind::AssociationEnd);
    let entity_set =
        resolved_target(tree, bindings, set_end, ReferenceContext::AssociationSetEndEntitySet)?;
    let entity_type =
        resolved_target(tree, bindings, entity_set, ReferenceContext::EntitySetEntityType)?;

    let matching: Vec<ElementId> = ends
        .iter()
        .copied()
        .filter(|end| {
            resolved_target(tree, bindings, *end, ReferenceContext::AssociationEndType)
                == Some(entity_type)
        })
        .collect();

    let end = match matching.len() {
        1 => matching[0],
        0 => return None,
        // Self-association: both ends have the same type, match by position.
        _ => {
            let siblings = tree.children_of_kind(set, ElementKind::AssociationSetEnd);
            let position = siblings.iter().position(|sibling| *sibling == set_end)?;
            ends.get(position).copied()?
        }
    };
    tree.get(end)?.name.clone()
}
