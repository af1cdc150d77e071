//! Tests for cross-document mapping resolution - fragments scope their
//! store-set references through the container mapping's resolved storage
//! side, conceptual-side references through the conceptual side, and
//! association-set-end roles default when the XML omits them.

use edml::symbols::Symbol;
use edml::{Artifact, BindingStatus, ElementId, ElementKind, ModelSpace};

const CSDL: &str = r#"<Schema Namespace="Model1">
  <EntityType Name="Customer">
    <Key><PropertyRef Name="Id" /></Key>
    <Property Name="Id" Type="Int32" Nullable="false" />
    <Property Name="Name" Type="String" />
    <NavigationProperty Name="Orders" Relationship="Model1.CustomerOrder" FromRole="Customer" ToRole="Order" />
  </EntityType>
  <EntityType Name="Order">
    <Key><PropertyRef Name="Id" /></Key>
    <Property Name="Id" Type="Int32" Nullable="false" />
    <Property Name="CustomerId" Type="Int32" />
  </EntityType>
  <Association Name="CustomerOrder">
    <End Type="Model1.Customer" Role="Customer" Multiplicity="1" />
    <End Type="Model1.Order" Role="Order" Multiplicity="*" />
  </Association>
  <EntityContainer Name="Model1Container">
    <EntitySet Name="Customers" EntityType="Model1.Customer" />
    <EntitySet Name="Orders" EntityType="Model1.Order" />
    <AssociationSet Name="CustomerOrders" Association="Model1.CustomerOrder">
      <End EntitySet="Customers" />
      <End Role="Order" EntitySet="Orders" />
    </AssociationSet>
  </EntityContainer>
</Schema>"#;

const SSDL: &str = r#"<Schema Namespace="Model1.Store">
  <EntityType Name="Customers">
    <Key><PropertyRef Name="Id" /></Key>
    <Property Name="Id" Type="int" Nullable="false" />
    <Property Name="Name" Type="nvarchar" />
  </EntityType>
  <EntityType Name="Orders">
    <Key><PropertyRef Name="Id" /></Key>
    <Property Name="Id" Type="int" Nullable="false" />
    <Property Name="CustomerId" Type="int" />
  </EntityType>
  <EntityContainer Name="Model1StoreContainer">
    <EntitySet Name="Customers" EntityType="Model1.Store.Customers" />
    <EntitySet Name="Orders" EntityType="Model1.Store.Orders" />
  </EntityContainer>
</Schema>"#;

const MSL: &str = r#"<Mapping>
  <EntityContainerMapping StorageEntityContainer="Model1StoreContainer" CdmEntityContainer="Model1Container">
    <EntitySetMapping Name="Customers">
      <EntityTypeMapping TypeName="Model1.Customer">
        <MappingFragment StoreEntitySet="Customers">
          <ScalarProperty Name="Id" ColumnName="Id" />
          <ScalarProperty Name="Name" ColumnName="Name" />
        </MappingFragment>
      </EntityTypeMapping>
    </EntitySetMapping>
    <EntitySetMapping Name="Orders">
      <EntityTypeMapping TypeName="Model1.Order">
        <MappingFragment StoreEntitySet="Orders">
          <ScalarProperty Name="Id" ColumnName="Id" />
          <ScalarProperty Name="CustomerId" ColumnName="CustomerId" />
        </MappingFragment>
      </EntityTypeMapping>
    </EntitySetMapping>
    <AssociationSetMapping Name="CustomerOrders" TypeName="Model1.CustomerOrder" StoreEntitySet="Orders">
      <EndProperty Name="Customer">
        <ScalarProperty Name="Id" ColumnName="CustomerId" />
      </EndProperty>
      <EndProperty Name="Order">
        <ScalarProperty Name="Id" ColumnName="Id" />
      </EndProperty>
    </AssociationSetMapping>
  </EntityContainerMapping>
</Mapping>"#;

fn find(artifact: &Artifact, space: ModelSpace, kind: ElementKind, name: &str) -> ElementId {
    artifact
        .tree()
        .elements_in_space(space)
        .into_iter()
        .find(|id| {
            artifact
                .tree()
                .get(*id)
                .is_some_and(|el| el.kind == kind && el.name() == Some(name))
        })
        .unwrap_or_else(|| panic!("no {kind:?} named '{name}' in {space:?}"))
}

fn assert_all_bound(artifact: &Artifact) {
    for (id, binding) in artifact.bindings().iter() {
        assert_eq!(
            binding.status(),
            BindingStatus::Known,
            "{id:?} ({:?}, raw {:?}) did not resolve",
            binding.context(),
            binding.raw_text(),
        );
    }
}

#[test]
fn full_document_set_resolves_every_reference() {
    let mut artifact = Artifact::default();
    let stats = artifact
        .load_documents(Some(CSDL), Some(SSDL), Some(MSL))
        .unwrap();

    assert_eq!(stats.unresolved, 0);
    assert_all_bound(&artifact);
}

/// The mapping document loaded and committed before either schema exists:
/// every mapping reference floats until the schemas arrive, then the whole
/// graph converges in the second commit.
#[test]
fn mapping_loaded_before_schemas_still_converges() {
    let mut artifact = Artifact::default();
    artifact.load_documents(None, None, Some(MSL)).unwrap();
    let unresolved = artifact
        .bindings()
        .iter()
        .filter(|(_, b)| b.status() == BindingStatus::Unknown)
        .count();
    assert!(unresolved > 0, "mapping references cannot resolve yet");

    let stats = artifact
        .load_documents(Some(CSDL), Some(SSDL), None)
        .unwrap();

    assert_eq!(stats.unresolved, 0);
    assert_all_bound(&artifact);
}

/// A fragment's `StoreEntitySet="Customers"` must bind to the storage set,
/// not the conceptual set of the same name.
#[test]
fn fragment_store_entity_set_binds_in_storage_space() {
    let mut artifact = Artifact::default();
    artifact
        .load_documents(Some(CSDL), Some(SSDL), Some(MSL))
        .unwrap();

    let store_set = find(&artifact, ModelSpace::Storage, ElementKind::EntitySet, "Customers");
    let fragments: Vec<ElementId> = artifact
        .tree()
        .elements_in_space(ModelSpace::Mapping)
        .into_iter()
        .filter(|id| {
            artifact
                .tree()
                .get(*id)
                .is_some_and(|el| el.kind == ElementKind::MappingFragment)
        })
        .collect();
    let customer_fragment = fragments
        .iter()
        .copied()
        .find(|id| {
            artifact
                .binding_for_attribute(*id, "StoreEntitySet")
                .and_then(|b| b.raw_text())
                == Some("Customers")
        })
        .expect("customer fragment");

    let binding = artifact
        .binding_for_attribute(customer_fragment, "StoreEntitySet")
        .expect("store set binding");
    assert_eq!(binding.status(), BindingStatus::Known);
    assert_eq!(binding.target(), Some(store_set));
}

/// Conceptual-side references bind conceptual elements even when storage
/// declares the same local names.
#[test]
fn set_mapping_name_binds_in_conceptual_space() {
    let mut artifact = Artifact::default();
    artifact
        .load_documents(Some(CSDL), Some(SSDL), Some(MSL))
        .unwrap();

    let conceptual_set = find(&artifact, ModelSpace::Conceptual, ElementKind::EntitySet, "Customers");
    let set_mapping = find(
        &artifact,
        ModelSpace::Mapping,
        ElementKind::EntitySetMapping,
        "Customers",
    );
    let binding = artifact
        .binding_for_attribute(set_mapping, "Name")
        .expect("set mapping name binding");
    assert_eq!(binding.target(), Some(conceptual_set));
}

/// An `End` with no `Role` attribute defaults to the association end whose
/// entity type matches the end's entity set, and binds exactly as an
/// explicit `Role="Customer"` would.
#[test]
fn omitted_set_end_role_defaults_to_matching_association_end() {
    let mut artifact = Artifact::default();
    artifact
        .load_documents(Some(CSDL), Some(SSDL), Some(MSL))
        .unwrap();

    let set = find(
        &artifact,
        ModelSpace::Conceptual,
        ElementKind::AssociationSet,
        "CustomerOrders",
    );
    let ends = artifact.tree().children_of_kind(set, ElementKind::AssociationSetEnd);
    assert_eq!(ends.len(), 2);

    let customer_end = find(
        &artifact,
        ModelSpace::Conceptual,
        ElementKind::AssociationEnd,
        "Customer",
    );
    let defaulted = artifact
        .binding_for_attribute(ends[0], "Role")
        .expect("role binding");
    assert_eq!(defaulted.raw_text(), None, "role was not written in XML");
    assert_eq!(defaulted.status(), BindingStatus::Known);
    assert_eq!(defaulted.target(), Some(customer_end));
    assert_eq!(
        defaulted.symbol(),
        Some(&Symbol::from_parts(["Model1", "CustomerOrder", "Customer"])),
        "defaulted role must normalize like an explicit Role=\"Customer\""
    );
}

/// ScalarProperty sits at the deepest dependency chain: its `Name` scopes
/// through the type mapping's conceptual type, its `ColumnName` through the
/// fragment's store set's storage type.
#[test]
fn scalar_properties_bind_both_sides_of_the_mapping() {
    let mut artifact = Artifact::default();
    artifact
        .load_documents(Some(CSDL), Some(SSDL), Some(MSL))
        .unwrap();

    let conceptual_id = find(&artifact, ModelSpace::Conceptual, ElementKind::Property, "Name");
    let storage_id = find(&artifact, ModelSpace::Storage, ElementKind::Property, "Name");

    let scalar = artifact
        .tree()
        .elements_in_space(ModelSpace::Mapping)
        .into_iter()
        .find(|id| {
            artifact.tree().get(*id).is_some_and(|el| {
                el.kind == ElementKind::ScalarProperty && el.attr("Name") == Some("Name")
            })
        })
        .expect("scalar property for Name");

    let name = artifact.binding_for_attribute(scalar, "Name").unwrap();
    let column = artifact.binding_for_attribute(scalar, "ColumnName").unwrap();
    assert_eq!(name.target(), Some(conceptual_id));
    assert_eq!(column.target(), Some(storage_id));
}

/// Renaming the storage container cascades through the dependent scoping
/// chain: the container reference and every fragment scoped through it
/// unbind, and rebind once the reference text catches up.
#[test]
fn storage_container_rename_cascades_through_fragments() {
    let mut artifact = Artifact::default();
    artifact
        .load_documents(Some(CSDL), Some(SSDL), Some(MSL))
        .unwrap();

    let storage_container = find(
        &artifact,
        ModelSpace::Storage,
        ElementKind::EntityContainer,
        "Model1StoreContainer",
    );
    let container_mapping = artifact
        .tree()
        .elements_in_space(ModelSpace::Mapping)
        .into_iter()
        .find(|id| {
            artifact
                .tree()
                .get(*id)
                .is_some_and(|el| el.kind == ElementKind::EntityContainerMapping)
        })
        .expect("container mapping");

    let mut tx = artifact.begin();
    tx.set_name(storage_container, "RenamedStore");
    tx.commit();

    let side = artifact
        .binding_for_attribute(container_mapping, "StorageEntityContainer")
        .unwrap();
    assert_eq!(side.status(), BindingStatus::Unknown);
    for (_, binding) in artifact.bindings().iter() {
        if binding.context().attribute() == "StoreEntitySet" {
            assert_eq!(binding.status(), BindingStatus::Unknown);
        }
    }

    let side_id = artifact
        .binding_id_for_attribute(container_mapping, "StorageEntityContainer")
        .unwrap();
    let mut tx = artifact.begin();
    tx.set_reference_text(side_id, Some("RenamedStore"));
    tx.commit();

    assert_all_bound(&artifact);
}
