use crate::model::{ElementKind, ModelSpace};

/// The static kind of a reference site.
///
/// Fixed once when the binding is constructed, from the referencing
/// element's kind and containment context. Each variant selects one scoping
/// rule in [`super::normalize`] and one target shape check here, so adding a
/// reference kind is an exhaustive-match change, not an open type-test
/// chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceContext {
    /// `Property.Type` naming a complex type (primitive types never bind).
    PropertyType,
    /// `NavigationProperty.Relationship` naming an association.
    NavigationPropertyRelationship,
    /// `NavigationProperty.FromRole` naming an end of the resolved association.
    NavigationPropertyFromRole,
    /// `NavigationProperty.ToRole` naming an end of the resolved association.
    NavigationPropertyToRole,
    /// `End.Type` on an association end, naming an entity type.
    AssociationEndType,
    /// `PropertyRef.Name` inside a `Key`, naming a property of the entity type.
    PropertyRefName,
    /// `EntitySet.EntityType`.
    EntitySetEntityType,
    /// `AssociationSet.Association`.
    AssociationSetAssociation,
    /// `End.Role` on an association-set end; defaults when omitted in XML.
    AssociationSetEndRole,
    /// `End.EntitySet` on an association-set end, container-scoped.
    AssociationSetEndEntitySet,
    /// `EntityContainerMapping.StorageEntityContainer` (S-space side).
    MappingStorageContainer,
    /// `EntityContainerMapping.CdmEntityContainer` (C-space side).
    MappingConceptualContainer,
    /// `EntitySetMapping.Name`, scoped by the resolved conceptual container.
    EntitySetMappingName,
    /// `EntityTypeMapping.TypeName` (tolerates `IsTypeOf(...)` wrappers).
    EntityTypeMappingTypeName,
    /// `MappingFragment.StoreEntitySet`, scoped by the resolved storage container.
    MappingFragmentStoreEntitySet,
    /// `ScalarProperty.Name`, scoped by the enclosing mapping's entity type.
    ScalarPropertyName,
    /// `ScalarProperty.ColumnName`, scoped by the store entity set's type.
    ScalarPropertyColumnName,
    /// `AssociationSetMapping.Name`, conceptual-container-scoped.
    AssociationSetMappingName,
    /// `AssociationSetMapping.TypeName` naming the conceptual association.
    AssociationSetMappingTypeName,
    /// `EndProperty.Name` naming a role of the mapped association.
    EndPropertyRole,
    /// `FunctionImportMapping.FunctionName` naming a store function.
    FunctionImportMappingFunctionName,
    /// `FunctionImportMapping.FunctionImportName`, container-scoped.
    FunctionImportMappingImportName,
}

impl ReferenceContext {
    /// The XML attribute this reference is read from, for messages.
    pub fn attribute(self) -> &'static str {
        match self {
            Self::PropertyType | Self::AssociationEndType => "Type",
            Self::NavigationPropertyRelationship => "Relationship",
            Self::NavigationPropertyFromRole => "FromRole",
            Self::NavigationPropertyToRole => "ToRole",
            Self::PropertyRefName
            | Self::EntitySetMappingName
            | Self::ScalarPropertyName
            | Self::AssociationSetMappingName
            | Self::EndPropertyRole => "Name",
            Self::EntitySetEntityType => "EntityType",
            Self::AssociationSetAssociation => "Association",
            Self::AssociationSetEndRole => "Role",
            Self::AssociationSetEndEntitySet => "EntitySet",
            Self::MappingStorageContainer => "StorageEntityContainer",
            Self::MappingConceptualContainer => "CdmEntityContainer",
            Self::EntityTypeMappingTypeName | Self::AssociationSetMappingTypeName => "TypeName",
            Self::MappingFragmentStoreEntitySet => "StoreEntitySet",
            Self::ScalarPropertyColumnName => "ColumnName",
            Self::FunctionImportMappingFunctionName => "FunctionName",
            Self::FunctionImportMappingImportName => "FunctionImportName",
        }
    }

    /// Whether an omitted attribute still participates in resolution with a
    /// computed default instead of being `Undefined`.
    ///
    /// Association-set-end roles are optional in XML; the defaulted role must
    /// resolve exactly like an explicitly written one.
    pub fn defaults_when_omitted(self) -> bool {
        matches!(self, Self::AssociationSetEndRole)
    }

    /// Shape check for a symbol-table hit. A hit of the wrong kind or space
    /// is a resolution miss, never an error.
    pub fn target_matches(
        self,
        kind: ElementKind,
        space: ModelSpace,
        owner_space: ModelSpace,
    ) -> bool {
        match self {
            Self::PropertyType => {
                kind == ElementKind::ComplexType && space == ModelSpace::Conceptual
            }
            Self::NavigationPropertyRelationship => {
                kind == ElementKind::Association && space == ModelSpace::Conceptual
            }
            Self::NavigationPropertyFromRole
            | Self::NavigationPropertyToRole
            | Self::EndPropertyRole => {
                kind == ElementKind::AssociationEnd && space == ModelSpace::Conceptual
            }
            Self::AssociationEndType => kind == ElementKind::EntityType && space == owner_space,
            Self::PropertyRefName => kind == ElementKind::Property && space == owner_space,
            Self::EntitySetEntityType => kind == ElementKind::EntityType && space == owner_space,
            Self::AssociationSetAssociation => {
                kind == ElementKind::Association && space == owner_space
            }
            Self::AssociationSetEndRole => {
                kind == ElementKind::AssociationEnd && space == owner_space
            }
            Self::AssociationSetEndEntitySet => {
                kind == ElementKind::EntitySet && space == owner_space
            }
            Self::MappingStorageContainer => {
                kind == ElementKind::EntityContainer && space == ModelSpace::Storage
            }
            Self::MappingConceptualContainer => {
                kind == ElementKind::EntityContainer && space == ModelSpace::Conceptual
            }
            Self::EntitySetMappingName => {
                kind == ElementKind::EntitySet && space == ModelSpace::Conceptual
            }
            Self::EntityTypeMappingTypeName => {
                kind == ElementKind::EntityType && space == ModelSpace::Conceptual
            }
            Self::MappingFragmentStoreEntitySet => {
                kind == ElementKind::EntitySet && space == ModelSpace::Storage
            }
            Self::ScalarPropertyName => {
                kind == ElementKind::Property && space == ModelSpace::Conceptual
            }
            Self::ScalarPropertyColumnName => {
                kind == ElementKind::Property && space == ModelSpace::Storage
            }
            Self::AssociationSetMappingName => {
                kind == ElementKind::AssociationSet && space == ModelSpace::Conceptual
            }
            Self::AssociationSetMappingTypeName => {
                kind == ElementKind::Association && space == ModelSpace::Conceptual
            }
            Self::FunctionImportMappingFunctionName => {
                kind == ElementKind::Function && space == ModelSpace::Storage
            }
            Self::FunctionImportMappingImportName => {
                kind == ElementKind::FunctionImport && space == ModelSpace::Conceptual
            }
        }
    }
}
