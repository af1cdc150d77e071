//! Tests for the rename cascade - renaming a declared element must
//! invalidate every binding resolved against its old symbol and re-resolve
//! bindings whose raw text already names the new symbol, with no manual
//! re-registration by the caller.

use edml::{Artifact, BindingId, BindingStatus, ElementId, ElementKind, ModelSpace, ReferenceContext};

struct Fixture {
    artifact: Artifact,
    schema: ElementId,
    entity_type: ElementId,
    reference: BindingId,
}

/// One schema, one entity type, one entity set whose `EntityType` reference
/// is resolved against `Model1.Customer`.
fn resolved_fixture() -> Fixture {
    let mut artifact = Artifact::default();
    let mut tx = artifact.begin();
    let schema = tx.create_element(None, ElementKind::Schema, ModelSpace::Conceptual, Some("Model1"));
    let entity_type = tx.create_element(
        Some(schema),
        ElementKind::EntityType,
        ModelSpace::Conceptual,
        Some("Customer"),
    );
    let container = tx.create_element(
        Some(schema),
        ElementKind::EntityContainer,
        ModelSpace::Conceptual,
        Some("Ctx"),
    );
    let set = tx.create_element(
        Some(container),
        ElementKind::EntitySet,
        ModelSpace::Conceptual,
        Some("Customers"),
    );
    let reference = tx.add_reference(
        set,
        ReferenceContext::EntitySetEntityType,
        Some("Model1.Customer"),
    );
    tx.commit();

    let fixture = Fixture {
        artifact,
        schema,
        entity_type,
        reference,
    };
    assert_eq!(status(&fixture.artifact, fixture.reference), BindingStatus::Known);
    fixture
}

fn status(artifact: &Artifact, id: BindingId) -> BindingStatus {
    artifact
        .bindings()
        .get(id)
        .map(|b| b.status())
        .expect("binding should exist")
}

fn target(artifact: &Artifact, id: BindingId) -> Option<ElementId> {
    artifact.bindings().get(id).and_then(|b| b.target())
}

#[test]
fn renaming_the_target_invalidates_stale_references() {
    let mut fx = resolved_fixture();

    let mut tx = fx.artifact.begin();
    tx.set_name(fx.entity_type, "Client");
    tx.commit();

    // The reference still reads "Model1.Customer"; nothing declares that
    // symbol any more.
    assert_eq!(status(&fx.artifact, fx.reference), BindingStatus::Unknown);
    assert_eq!(target(&fx.artifact, fx.reference), None);
}

#[test]
fn updating_raw_text_in_the_same_transaction_rebinds() {
    let mut fx = resolved_fixture();

    let mut tx = fx.artifact.begin();
    tx.set_name(fx.entity_type, "Client");
    tx.set_reference_text(fx.reference, Some("Model1.Client"));
    let stats = tx.commit();

    assert_eq!(stats.unresolved, 0);
    assert_eq!(status(&fx.artifact, fx.reference), BindingStatus::Known);
    assert_eq!(target(&fx.artifact, fx.reference), Some(fx.entity_type));
}

#[test]
fn renaming_back_restores_the_binding() {
    let mut fx = resolved_fixture();

    let mut tx = fx.artifact.begin();
    tx.set_name(fx.entity_type, "Client");
    tx.commit();
    assert_eq!(status(&fx.artifact, fx.reference), BindingStatus::Unknown);

    let mut tx = fx.artifact.begin();
    tx.set_name(fx.entity_type, "Customer");
    tx.commit();

    assert_eq!(status(&fx.artifact, fx.reference), BindingStatus::Known);
    assert_eq!(target(&fx.artifact, fx.reference), Some(fx.entity_type));
}

/// A rename also captures references that were dangling under the old model:
/// whatever now declares the symbol they name becomes their target.
#[test]
fn rename_resolves_previously_dangling_references() {
    let mut fx = resolved_fixture();

    // Dangling alongside the resolved one.
    let mut tx = fx.artifact.begin();
    let container = tx.create_element(
        Some(fx.schema),
        ElementKind::EntityContainer,
        ModelSpace::Conceptual,
        Some("Ctx2"),
    );
    let other_set = tx.create_element(
        Some(container),
        ElementKind::EntitySet,
        ModelSpace::Conceptual,
        Some("Clients"),
    );
    let dangling = tx.add_reference(
        other_set,
        ReferenceContext::EntitySetEntityType,
        Some("Model1.Client"),
    );
    tx.commit();
    assert_eq!(status(&fx.artifact, dangling), BindingStatus::Unknown);

    let mut tx = fx.artifact.begin();
    tx.set_name(fx.entity_type, "Client");
    tx.commit();

    assert_eq!(status(&fx.artifact, dangling), BindingStatus::Known);
    assert_eq!(target(&fx.artifact, dangling), Some(fx.entity_type));
    // And the original reference, still reading "Model1.Customer", breaks.
    assert_eq!(status(&fx.artifact, fx.reference), BindingStatus::Unknown);
}

/// Renaming an ancestor changes the symbol an unqualified reference inside
/// the subtree normalizes to. That holds even for a reference that never
/// resolved under the old namespace: declaring the name it now normalizes
/// to must bind it.
#[test]
fn namespace_rename_recomputes_dangling_references_in_the_subtree() {
    let mut fx = resolved_fixture();

    let mut tx = fx.artifact.begin();
    let container = tx.create_element(
        Some(fx.schema),
        ElementKind::EntityContainer,
        ModelSpace::Conceptual,
        Some("Ctx2"),
    );
    let set = tx.create_element(
        Some(container),
        ElementKind::EntitySet,
        ModelSpace::Conceptual,
        Some("Ghosts"),
    );
    // Unqualified, so it normalizes through the schema namespace.
    let dangling = tx.add_reference(set, ReferenceContext::EntitySetEntityType, Some("Ghost"));
    tx.commit();
    assert_eq!(status(&fx.artifact, dangling), BindingStatus::Unknown);

    let mut tx = fx.artifact.begin();
    tx.set_name(fx.schema, "ModelX");
    tx.commit();

    // Declared only under the new namespace; the old key `Model1.Ghost`
    // never matched anything, so the binding must have been re-normalized
    // by the rename itself to pick this up.
    let mut tx = fx.artifact.begin();
    let ghost = tx.create_element(
        Some(fx.schema),
        ElementKind::EntityType,
        ModelSpace::Conceptual,
        Some("Ghost"),
    );
    tx.commit();

    assert_eq!(status(&fx.artifact, dangling), BindingStatus::Known);
    assert_eq!(target(&fx.artifact, dangling), Some(ghost));
}

/// Renaming a schema namespace re-registers every nested declaration, so
/// namespace-qualified references cascade exactly like local renames.
#[test]
fn namespace_rename_cascades_to_nested_declarations() {
    let mut fx = resolved_fixture();

    let mut tx = fx.artifact.begin();
    tx.set_name(fx.schema, "ModelX");
    tx.commit();
    assert_eq!(status(&fx.artifact, fx.reference), BindingStatus::Unknown);

    let mut tx = fx.artifact.begin();
    tx.set_reference_text(fx.reference, Some("ModelX.Customer"));
    tx.commit();

    assert_eq!(status(&fx.artifact, fx.reference), BindingStatus::Known);
    assert_eq!(target(&fx.artifact, fx.reference), Some(fx.entity_type));
}
