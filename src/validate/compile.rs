//! Compiles the bound three-document graph into runtime metadata.
//!
//! Compilation never mutates the artifact: it reads the converged binding
//! graph and produces runtime objects plus raw errors carrying line/column
//! positions. The validator later maps positions back to elements and
//! applies the designer rewrites.

use crate::artifact::{Artifact, SchemaVersion};
use crate::base::Position;
use crate::model::{ElementId, ElementKind, ModelSpace};
use crate::resolve::{BindingStatus, ReferenceContext};
use crate::symbols::declared_symbol;

use super::error_codes as codes;
use super::error_info::Severity;

/// An error raised by metadata compilation, before designer processing.
///
/// `space` names the document `position` was measured in. Line numbers
/// restart at zero in every document, so the position alone cannot address
/// an element.
#[derive(Clone, Debug)]
pub struct RawError {
    pub code: u32,
    pub message: String,
    pub space: ModelSpace,
    pub position: Option<Position>,
    pub severity: Severity,
}

impl RawError {
    fn new(
        code: u32,
        severity: Severity,
        message: String,
        space: ModelSpace,
        position: Option<Position>,
    ) -> Self {
        Self {
            code,
            message,
            space,
            position,
            severity,
        }
    }
}

/// Runtime metadata compiled from the bound graph. Consumed by code
/// generation and provider-specific validation once validation succeeds.
#[derive(Clone, Debug, Default)]
pub struct CompiledRuntimeModel {
    pub entity_types: Vec<RuntimeEntityType>,
    pub associations: Vec<RuntimeAssociation>,
    pub containers: Vec<RuntimeContainer>,
    pub set_mappings: Vec<RuntimeSetMapping>,
}

#[derive(Clone, Debug)]
pub struct RuntimeEntityType {
    pub name: String,
    pub space: ModelSpace,
    pub key: Vec<String>,
    pub properties: Vec<RuntimeProperty>,
}

#[derive(Clone, Debug)]
pub struct RuntimeProperty {
    pub name: String,
    pub type_name: String,
    pub nullable: bool,
}

#[derive(Clone, Debug)]
pub struct RuntimeAssociation {
    pub name: String,
    pub space: ModelSpace,
    pub ends: Vec<RuntimeAssociationEnd>,
}

#[derive(Clone, Debug)]
pub struct RuntimeAssociationEnd {
    pub role: String,
    pub entity_type: String,
    pub multiplicity: String,
}

#[derive(Clone, Debug)]
pub struct RuntimeContainer {
    pub name: String,
    pub space: ModelSpace,
    pub entity_sets: Vec<RuntimeEntitySet>,
    pub association_sets: Vec<RuntimeAssociationSet>,
}

#[derive(Clone, Debug)]
pub struct RuntimeEntitySet {
    pub name: String,
    pub entity_type: String,
}

#[derive(Clone, Debug)]
pub struct RuntimeAssociationSet {
    pub name: String,
    pub association: String,
}

/// The mapping closure of one conceptual entity set.
#[derive(Clone, Debug)]
pub struct RuntimeSetMapping {
    pub entity_set: String,
    pub entity_type: String,
    pub store_entity_sets: Vec<String>,
    /// Pairs of (conceptual property, store column).
    pub mapped_properties: Vec<(String, String)>,
    /// The `EntitySetMapping` element, for error positions.
    pub source: ElementId,
}

/// Entity types, associations and containers of one schema space.
#[derive(Debug, Default)]
pub struct SchemaParts {
    pub entity_types: Vec<RuntimeEntityType>,
    pub associations: Vec<RuntimeAssociation>,
    pub containers: Vec<RuntimeContainer>,
}

fn position_of(artifact: &Artifact, element: ElementId) -> Option<Position> {
    artifact.tree().get(element).map(|el| el.span.start)
}

fn display_name(artifact: &Artifact, element: ElementId) -> String {
    declared_symbol(artifact.tree(), element)
        .map(|symbol| symbol.to_string())
        .or_else(|| {
            artifact
                .tree()
                .get(element)
                .and_then(|el| el.name())
                .map(str::to_owned)
        })
        .unwrap_or_default()
}

/// Resolved target of the binding with `context` on `element`.
fn binding_target(
    artifact: &Artifact,
    element: ElementId,
    context: ReferenceContext,
) -> Option<ElementId> {
    artifact
        .tree()
        .get(element)?
        .bindings
        .iter()
        .filter_map(|id| artifact.bindings().get(*id))
        .find(|binding| binding.context() == context)
        .and_then(|binding| binding.target())
}

/// Report every `Unknown` binding owned by elements of `space`.
///
/// `Undefined` bindings are optional references left unset and stay silent.
fn unresolved_reference_errors(artifact: &Artifact, space: ModelSpace, code: u32) -> Vec<RawError> {
    let mut errors = Vec::new();
    for id in artifact.tree().elements_in_space(space) {
        let Some(element) = artifact.tree().get(id) else {
            continue;
        };
        for binding in element
            .bindings
            .iter()
            .filter_map(|b| artifact.bindings().get(*b))
        {
            if binding.status() != BindingStatus::Unknown {
                continue;
            }
            let raw = binding.raw_text().unwrap_or("(unspecified)");
            errors.push(RawError::new(
                code,
                Severity::Error,
                format!(
                    "The '{}' attribute value '{}' on element '{}' could not be resolved",
                    binding.context().attribute(),
                    raw,
                    element.name().unwrap_or(element.kind.tag()),
                ),
                space,
                Some(element.span.start),
            ));
        }
    }
    errors
}

/// Compile one schema space (CSDL or SSDL) into metadata parts.
pub fn compile_schema(artifact: &Artifact, space: ModelSpace) -> (SchemaParts, Vec<RawError>) {
    let (unresolved_code, no_key_code) = match space {
        ModelSpace::Conceptual => (
            codes::CSDL_UNRESOLVED_REFERENCE,
            codes::CSDL_ENTITY_TYPE_WITHOUT_KEY,
        ),
        _ => (
            codes::SSDL_UNRESOLVED_REFERENCE,
            codes::SSDL_ENTITY_TYPE_WITHOUT_KEY,
        ),
    };

    let mut parts = SchemaParts::default();
    let mut errors = unresolved_reference_errors(artifact, space, unresolved_code);
    let tree = artifact.tree();

    for id in tree.elements_in_space(space) {
        let Some(element) = tree.get(id) else {
            continue;
        };
        match element.kind {
            ElementKind::EntityType => {
                let mut key = Vec::new();
                for key_el in tree.children_of_kind(id, ElementKind::Key) {
                    for property_ref in tree.children_of_kind(key_el, ElementKind::PropertyRef) {
                        if let Some(target) =
                            binding_target(artifact, property_ref, ReferenceContext::PropertyRefName)
                        {
                            if let Some(name) = tree.get(target).and_then(|el| el.name()) {
                                key.push(name.to_owned());
                            }
                        }
                    }
                }
                if key.is_empty() {
                    errors.push(RawError::new(
                        no_key_code,
                        Severity::Error,
                        format!(
                            "EntityType '{}' has no key defined; define a key for this entity type",
                            element.name().unwrap_or_default()
                        ),
                        space,
                        Some(element.span.start),
                    ));
                }
                let properties = tree
                    .children_of_kind(id, ElementKind::Property)
                    .into_iter()
                    .filter_map(|prop| tree.get(prop))
                    .map(|prop| RuntimeProperty {
                        name: prop.name().unwrap_or_default().to_owned(),
                        type_name: prop.attr("Type").unwrap_or_default().to_owned(),
                        nullable: prop.attr("Nullable") != Some("false"),
                    })
                    .collect();
                parts.entity_types.push(RuntimeEntityType {
                    name: display_name(artifact, id),
                    space,
                    key,
                    properties,
                });

                // An unqualified complex-type reference resolves through the
                // schema namespace but is rejected by the runtime.
                if space == ModelSpace::Conceptual {
                    for prop in tree.children_of_kind(id, ElementKind::Property) {
                        let Some(binding) = artifact.binding_for_attribute(prop, "Type") else {
                            continue;
                        };
                        if binding.context() == ReferenceContext::PropertyType
                            && binding.is_resolved()
                            && binding.raw_text().is_some_and(|raw| !raw.contains('.'))
                        {
                            let prop_el = tree.get(prop);
                            errors.push(RawError::new(
                                codes::CSDL_UNQUALIFIED_COMPLEX_TYPE,
                                Severity::Error,
                                format!(
                                    "The complex type reference '{}' is not namespace-qualified",
                                    binding.raw_text().unwrap_or_default()
                                ),
                                space,
                                prop_el.map(|el| el.span.start),
                            ));
                        }
                    }
                }
            }
            ElementKind::Association => {
                let ends = tree
                    .children_of_kind(id, ElementKind::AssociationEnd)
                    .into_iter()
                    .map(|end| RuntimeAssociationEnd {
                        role: tree
                            .get(end)
                            .and_then(|el| el.name())
                            .unwrap_or_default()
                            .to_owned(),
                        entity_type: binding_target(artifact, end, ReferenceContext::AssociationEndType)
                            .map(|target| display_name(artifact, target))
                            .unwrap_or_default(),
                        multiplicity: tree
                            .get(end)
                            .and_then(|el| el.attr("Multiplicity"))
                            .unwrap_or_default()
                            .to_owned(),
                    })
                    .collect();
                parts.associations.push(RuntimeAssociation {
                    name: display_name(artifact, id),
                    space,
                    ends,
                });
            }
            ElementKind::EntityContainer => {
                let entity_sets = tree
                    .children_of_kind(id, ElementKind::EntitySet)
                    .into_iter()
                    .map(|set| RuntimeEntitySet {
                        name: tree
                            .get(set)
                            .and_then(|el| el.name())
                            .unwrap_or_default()
                            .to_owned(),
                        entity_type: binding_target(artifact, set, ReferenceContext::EntitySetEntityType)
                            .map(|target| display_name(artifact, target))
                            .unwrap_or_default(),
                    })
                    .collect();
                let association_sets = tree
                    .children_of_kind(id, ElementKind::AssociationSet)
                    .into_iter()
                    .map(|set| RuntimeAssociationSet {
                        name: tree
                            .get(set)
                            .and_then(|el| el.name())
                            .unwrap_or_default()
                            .to_owned(),
                        association: binding_target(
                            artifact,
                            set,
                            ReferenceContext::AssociationSetAssociation,
                        )
                        .map(|target| display_name(artifact, target))
                        .unwrap_or_default(),
                    })
                    .collect();
                parts.containers.push(RuntimeContainer {
                    name: display_name(artifact, id),
                    space,
                    entity_sets,
                    association_sets,
                });
            }
            _ => {}
        }
    }

    (parts, errors)
}

/// Compile the mapping document into set mappings, checking instance
/// coverage and association-set completeness.
pub fn compile_mapping(
    artifact: &Artifact,
    version: SchemaVersion,
) -> (Vec<RuntimeSetMapping>, Vec<RawError>) {
    let tree = artifact.tree();
    let mut errors =
        unresolved_reference_errors(artifact, ModelSpace::Mapping, codes::MSL_UNRESOLVED_REFERENCE);
    let mut set_mappings = Vec::new();

    for id in tree.elements_in_space(ModelSpace::Mapping) {
        let Some(element) = tree.get(id) else {
            continue;
        };
        match element.kind {
            ElementKind::EntitySetMapping => {
                set_mappings.push(compile_set_mapping(artifact, id));
            }
            ElementKind::AssociationSetMapping => {
                if let Some(error) = check_association_set_mapping(artifact, id) {
                    errors.push(error);
                }
            }
            ElementKind::FunctionImportMapping => {
                if !version.supports_function_import_mapping() {
                    errors.push(RawError::new(
                        codes::MSL_FUNCTION_IMPORT_UNSUPPORTED,
                        Severity::Error,
                        "Function import mapping is not supported by the targeted schema version"
                            .to_owned(),
                        ModelSpace::Mapping,
                        Some(element.span.start),
                    ));
                }
            }
            _ => {}
        }
    }

    errors.extend(instance_not_specified_errors(artifact));
    (set_mappings, errors)
}

fn compile_set_mapping(artifact: &Artifact, id: ElementId) -> RuntimeSetMapping {
    let tree = artifact.tree();
    let entity_set = binding_target(artifact, id, ReferenceContext::EntitySetMappingName);
    let entity_type = entity_set
        .and_then(|set| binding_target(artifact, set, ReferenceContext::EntitySetEntityType));

    let mut store_entity_sets = Vec::new();
    let mut mapped_properties = Vec::new();
    for type_mapping in tree.children_of_kind(id, ElementKind::EntityTypeMapping) {
        for fragment in tree.children_of_kind(type_mapping, ElementKind::MappingFragment) {
            if let Some(store_set) =
                binding_target(artifact, fragment, ReferenceContext::MappingFragmentStoreEntitySet)
            {
                store_entity_sets.push(display_name(artifact, store_set));
            }
            for scalar in tree.children_of_kind(fragment, ElementKind::ScalarProperty) {
                let Some(scalar_el) = tree.get(scalar) else {
                    continue;
                };
                mapped_properties.push((
                    scalar_el.attr("Name").unwrap_or_default().to_owned(),
                    scalar_el.attr("ColumnName").unwrap_or_default().to_owned(),
                ));
            }
        }
    }

    RuntimeSetMapping {
        entity_set: entity_set
            .map(|set| display_name(artifact, set))
            .unwrap_or_default(),
        entity_type: entity_type
            .map(|ty| display_name(artifact, ty))
            .unwrap_or_default(),
        store_entity_sets,
        mapped_properties,
        source: id,
    }
}

/// An association-set mapping must carry an `EndProperty` per association
/// end, each mapping at least one key column.
fn check_association_set_mapping(artifact: &Artifact, id: ElementId) -> Option<RawError> {
    let tree = artifact.tree();
    let association = binding_target(artifact, id, ReferenceContext::AssociationSetMappingTypeName)?;
    let ends = tree.children_of_kind(association, ElementKind::AssociationEnd);
    let end_properties = tree.children_of_kind(id, ElementKind::EndProperty);

    let incomplete = end_properties.len() < ends.len()
        || end_properties.iter().any(|end_property| {
            tree.children_of_kind(*end_property, ElementKind::ScalarProperty)
                .is_empty()
        });
    if !incomplete {
        return None;
    }
    Some(RawError::new(
        codes::MSL_ASSOCIATION_SET_NOT_FULLY_MAPPED,
        Severity::Error,
        format!(
            "AssociationSetMapping '{}' does not map all ends of the association",
            tree.get(id).and_then(|el| el.name()).unwrap_or_default()
        ),
        ModelSpace::Mapping,
        position_of(artifact, id),
    ))
}

/// Every conceptual entity set and association set needs a mapping instance.
fn instance_not_specified_errors(artifact: &Artifact) -> Vec<RawError> {
    let tree = artifact.tree();
    let mut mapped_sets = Vec::new();
    let mut mapped_association_sets = Vec::new();
    for id in tree.elements_in_space(ModelSpace::Mapping) {
        let Some(element) = tree.get(id) else {
            continue;
        };
        match element.kind {
            ElementKind::EntitySetMapping => {
                mapped_sets.extend(binding_target(artifact, id, ReferenceContext::EntitySetMappingName));
            }
            ElementKind::AssociationSetMapping => {
                mapped_association_sets.extend(binding_target(
                    artifact,
                    id,
                    ReferenceContext::AssociationSetMappingName,
                ));
            }
            _ => {}
        }
    }

    let mut errors = Vec::new();
    for id in tree.elements_in_space(ModelSpace::Conceptual) {
        let Some(element) = tree.get(id) else {
            continue;
        };
        let unmapped = match element.kind {
            ElementKind::EntitySet => !mapped_sets.contains(&id),
            ElementKind::AssociationSet => !mapped_association_sets.contains(&id),
            _ => continue,
        };
        if unmapped {
            errors.push(RawError::new(
                codes::MSL_INSTANCE_NOT_SPECIFIED,
                Severity::Error,
                format!(
                    "No mapping is specified for the instance of '{}'",
                    element.name().unwrap_or_default()
                ),
                // The unmapped set itself is the best place to point at.
                ModelSpace::Conceptual,
                Some(element.span.start),
            ));
        }
    }
    errors
}
