//! Pull-based reader for CSDL, SSDL and MSL documents.
//!
//! Parsing is deliberately lenient: any well-formed element becomes a tree
//! node (unrecognized tags as [`ElementKind::Other`]), and reference
//! attributes are wrapped in bindings as they are encountered. Dangling
//! references are a resolution concern, not a parse error; only malformed
//! XML or a wrong root element aborts the load.

use std::str;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;
use tracing::trace;

use crate::artifact::Transaction;
use crate::base::{LineIndex, Span};
use crate::model::{ElementId, ElementKind, ModelSpace};
use crate::resolve::ReferenceContext;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("XML error: {0}")]
    Xml(String),

    #[error("malformed attribute: {0}")]
    Attribute(String),

    #[error("unexpected root element '{found}', expected '{expected}'")]
    UnexpectedRoot { expected: &'static str, found: String },
}

/// Parse one document into the transaction, returning its root element.
///
/// The caller decides when to commit; loading all three documents of an
/// artifact in one transaction lets cross-document references resolve in a
/// single fixpoint drain regardless of document order.
pub fn load_document(
    tx: &mut Transaction<'_>,
    space: ModelSpace,
    text: &str,
) -> Result<ElementId, LoadError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);
    let lines = LineIndex::new(text);

    let mut loader = Loader {
        tx,
        space,
        lines,
        stack: Vec::new(),
        root: None,
    };

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let after = reader.buffer_position() as usize;
                let start = after.saturating_sub(e.len() + 2);
                let id = loader.open(&e)?;
                loader.stack.push((id, start));
            }
            Ok(Event::Empty(e)) => {
                let after = reader.buffer_position() as usize;
                let start = after.saturating_sub(e.len() + 3);
                let id = loader.open(&e)?;
                loader.close(id, start, after);
            }
            Ok(Event::End(_)) => {
                let after = reader.buffer_position() as usize;
                if let Some((id, start)) = loader.stack.pop() {
                    loader.close(id, start, after);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(LoadError::Xml(format!(
                    "at offset {}: {e}",
                    reader.error_position()
                )));
            }
        }
    }

    loader
        .root
        .ok_or_else(|| LoadError::Xml("document has no root element".into()))
}

struct Loader<'tx, 'art> {
    tx: &'tx mut Transaction<'art>,
    space: ModelSpace,
    lines: LineIndex,
    stack: Vec<(ElementId, usize)>,
    root: Option<ElementId>,
}

impl Loader<'_, '_> {
    fn open(&mut self, e: &BytesStart<'_>) -> Result<ElementId, LoadError> {
        let tag = str::from_utf8(e.local_name().as_ref())
            .map_err(|err| LoadError::Xml(err.to_string()))?
            .to_string();

        let mut attrs: Vec<(String, String)> = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| LoadError::Attribute(err.to_string()))?;
            let key = str::from_utf8(attr.key.local_name().as_ref())
                .map_err(|err| LoadError::Attribute(err.to_string()))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|err| LoadError::Attribute(err.to_string()))?
                .into_owned();
            attrs.push((key, value));
        }

        let parent = self.stack.last().map(|(id, _)| *id);
        if parent.is_none() {
            let expected = match self.space {
                ModelSpace::Mapping => "Mapping",
                _ => "Schema",
            };
            if tag != expected {
                return Err(LoadError::UnexpectedRoot {
                    expected,
                    found: tag,
                });
            }
        }

        let parent_kind = match parent {
            Some(p) => self.tx.artifact().tree().get(p).map(|el| el.kind),
            None => None,
        };
        let kind = element_kind(self.space, &tag, parent_kind);
        let name = defining_name(kind, &attrs);

        let id = self
            .tx
            .create_element(parent, kind, self.space, name.as_deref());
        for (key, value) in &attrs {
            self.tx.set_attribute(id, key, value);
        }
        self.wire_references(id, kind, &attrs);

        if parent.is_none() && self.root.is_none() {
            self.root = Some(id);
        }
        trace!("parsed <{tag}> as {kind:?} {id:?}");
        Ok(id)
    }

    fn close(&mut self, id: ElementId, start: usize, end: usize) {
        let span = Span::new(self.lines.position(start), self.lines.position(end));
        self.tx.set_span(id, span);
    }

    fn wire_references(&mut self, id: ElementId, kind: ElementKind, attrs: &[(String, String)]) {
        let attr = |name: &str| {
            attrs
                .iter()
                .find(|(k, _)| k.as_str() == name)
                .map(|(_, v)| v.as_str())
        };
        match kind {
            // Store property types are always primitive; only conceptual
            // properties can name a complex type.
            ElementKind::Property if self.space == ModelSpace::Conceptual => {
                if let Some(raw) = attr("Type") {
                    if !is_primitive_type(raw) {
                        self.tx
                            .add_reference(id, ReferenceContext::PropertyType, Some(raw));
                    }
                }
            }
            ElementKind::NavigationProperty => {
                self.tx.add_reference(
                    id,
                    ReferenceContext::NavigationPropertyRelationship,
                    attr("Relationship"),
                );
                self.tx.add_reference(
                    id,
                    ReferenceContext::NavigationPropertyFromRole,
                    attr("FromRole"),
                );
                self.tx.add_reference(
                    id,
                    ReferenceContext::NavigationPropertyToRole,
                    attr("ToRole"),
                );
            }
            ElementKind::AssociationEnd => {
                self.tx
                    .add_reference(id, ReferenceContext::AssociationEndType, attr("Type"));
            }
            ElementKind::PropertyRef => {
                self.tx
                    .add_reference(id, ReferenceContext::PropertyRefName, attr("Name"));
            }
            ElementKind::EntitySet => {
                self.tx.add_reference(
                    id,
                    ReferenceContext::EntitySetEntityType,
                    attr("EntityType"),
                );
            }
            ElementKind::AssociationSet => {
                self.tx.add_reference(
                    id,
                    ReferenceContext::AssociationSetAssociation,
                    attr("Association"),
                );
            }
            ElementKind::AssociationSetEnd => {
                self.tx
                    .add_reference(id, ReferenceContext::AssociationSetEndRole, attr("Role"));
                self.tx.add_reference(
                    id,
                    ReferenceContext::AssociationSetEndEntitySet,
                    attr("EntitySet"),
                );
            }
            ElementKind::EntityContainerMapping => {
                self.tx.add_reference(
                    id,
                    ReferenceContext::MappingStorageContainer,
                    attr("StorageEntityContainer"),
                );
                self.tx.add_reference(
                    id,
                    ReferenceContext::MappingConceptualContainer,
                    attr("CdmEntityContainer"),
                );
            }
            ElementKind::EntitySetMapping => {
                self.tx
                    .add_reference(id, ReferenceContext::EntitySetMappingName, attr("Name"));
            }
            ElementKind::EntityTypeMapping => {
                self.tx.add_reference(
                    id,
                    ReferenceContext::EntityTypeMappingTypeName,
                    attr("TypeName"),
                );
            }
            ElementKind::MappingFragment => {
                self.tx.add_reference(
                    id,
                    ReferenceContext::MappingFragmentStoreEntitySet,
                    attr("StoreEntitySet"),
                );
            }
            ElementKind::ScalarProperty => {
                self.tx
                    .add_reference(id, ReferenceContext::ScalarPropertyName, attr("Name"));
                self.tx.add_reference(
                    id,
                    ReferenceContext::ScalarPropertyColumnName,
                    attr("ColumnName"),
                );
            }
            ElementKind::AssociationSetMapping => {
                self.tx.add_reference(
                    id,
                    ReferenceContext::AssociationSetMappingName,
                    attr("Name"),
                );
                self.tx.add_reference(
                    id,
                    ReferenceContext::AssociationSetMappingTypeName,
                    attr("TypeName"),
                );
                // Association-set mappings carry the store set inline rather
                // than through a fragment; same reference kind either way.
                if attr("StoreEntitySet").is_some() {
                    self.tx.add_reference(
                        id,
                        ReferenceContext::MappingFragmentStoreEntitySet,
                        attr("StoreEntitySet"),
                    );
                }
            }
            ElementKind::EndProperty => {
                self.tx
                    .add_reference(id, ReferenceContext::EndPropertyRole, attr("Name"));
            }
            ElementKind::FunctionImportMapping => {
                self.tx.add_reference(
                    id,
                    ReferenceContext::FunctionImportMappingFunctionName,
                    attr("FunctionName"),
                );
                self.tx.add_reference(
                    id,
                    ReferenceContext::FunctionImportMappingImportName,
                    attr("FunctionImportName"),
                );
            }
            _ => {}
        }
    }
}

fn element_kind(space: ModelSpace, tag: &str, parent: Option<ElementKind>) -> ElementKind {
    match space {
        ModelSpace::Mapping => match tag {
            "Mapping" => ElementKind::Mapping,
            "EntityContainerMapping" => ElementKind::EntityContainerMapping,
            "EntitySetMapping" => ElementKind::EntitySetMapping,
            "EntityTypeMapping" => ElementKind::EntityTypeMapping,
            "MappingFragment" => ElementKind::MappingFragment,
            "ScalarProperty" => ElementKind::ScalarProperty,
            "AssociationSetMapping" => ElementKind::AssociationSetMapping,
            "EndProperty" => ElementKind::EndProperty,
            "FunctionImportMapping" => ElementKind::FunctionImportMapping,
            _ => ElementKind::Other,
        },
        _ => match tag {
            "Schema" => ElementKind::Schema,
            "EntityType" => ElementKind::EntityType,
            "ComplexType" => ElementKind::ComplexType,
            "Property" => ElementKind::Property,
            "NavigationProperty" => ElementKind::NavigationProperty,
            "Key" => ElementKind::Key,
            "PropertyRef" => ElementKind::PropertyRef,
            "Association" => ElementKind::Association,
            // The same tag under an association declares an end; under an
            // association set it references one.
            "End" => match parent {
                Some(ElementKind::AssociationSet) => ElementKind::AssociationSetEnd,
                _ => ElementKind::AssociationEnd,
            },
            "EntityContainer" => ElementKind::EntityContainer,
            "EntitySet" => ElementKind::EntitySet,
            "AssociationSet" => ElementKind::AssociationSet,
            "Function" => ElementKind::Function,
            "FunctionImport" => ElementKind::FunctionImport,
            _ => ElementKind::Other,
        },
    }
}

/// The attribute that defines an element's own name, as opposed to the
/// attributes that reference other elements' names.
fn defining_name(kind: ElementKind, attrs: &[(String, String)]) -> Option<String> {
    let attr = |name: &str| {
        attrs
            .iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| v.clone())
    };
    match kind {
        ElementKind::Schema => attr("Namespace"),
        // An association end without an explicit Role is addressed by the
        // last segment of its Type name.
        ElementKind::AssociationEnd => attr("Role")
            .or_else(|| attr("Type").map(|t| last_segment(&t).to_string())),
        ElementKind::AssociationSetEnd => attr("Role"),
        ElementKind::Key
        | ElementKind::Mapping
        | ElementKind::EntityContainerMapping
        | ElementKind::EntityTypeMapping
        | ElementKind::MappingFragment
        | ElementKind::Other => None,
        _ => attr("Name"),
    }
}

fn last_segment(raw: &str) -> &str {
    raw.rsplit('.').next().unwrap_or(raw)
}

/// EDM primitive type names never participate in resolution.
fn is_primitive_type(raw: &str) -> bool {
    const PRIMITIVES: &[&str] = &[
        "Binary",
        "Boolean",
        "Byte",
        "DateTime",
        "DateTimeOffset",
        "Decimal",
        "Double",
        "Geography",
        "Geometry",
        "Guid",
        "Int16",
        "Int32",
        "Int64",
        "SByte",
        "Single",
        "String",
        "Time",
    ];
    if let Some(bare) = raw.strip_prefix("Edm.") {
        return PRIMITIVES.iter().any(|p| p.eq_ignore_ascii_case(bare));
    }
    PRIMITIVES.iter().any(|p| p.eq_ignore_ascii_case(raw))
}
