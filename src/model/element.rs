use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::Span;
use crate::resolve::BindingId;

/// The schema space a model element belongs to.
///
/// Every element lives in exactly one space; the mapping space stitches the
/// other two together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelSpace {
    /// Application-facing entity/association schema (CSDL).
    Conceptual,
    /// Database-facing table/column schema (SSDL).
    Storage,
    /// C-space to S-space mapping document (MSL).
    Mapping,
}

/// The metatype of an EDM element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    // Schema-space declarations (CSDL and SSDL)
    Schema,
    EntityType,
    ComplexType,
    Property,
    NavigationProperty,
    Key,
    PropertyRef,
    Association,
    AssociationEnd,
    EntityContainer,
    EntitySet,
    AssociationSet,
    AssociationSetEnd,
    Function,
    FunctionImport,

    // Mapping-space elements (MSL)
    Mapping,
    EntityContainerMapping,
    EntitySetMapping,
    EntityTypeMapping,
    MappingFragment,
    ScalarProperty,
    AssociationSetMapping,
    EndProperty,
    FunctionImportMapping,

    /// Unrecognized XML kept only so span lookups stay complete.
    Other,
}

impl ElementKind {
    /// The XML tag this kind corresponds to, for messages.
    pub fn tag(self) -> &'static str {
        match self {
            ElementKind::Schema => "Schema",
            ElementKind::EntityType => "EntityType",
            ElementKind::ComplexType => "ComplexType",
            ElementKind::Property => "Property",
            ElementKind::NavigationProperty => "NavigationProperty",
            ElementKind::Key => "Key",
            ElementKind::PropertyRef => "PropertyRef",
            ElementKind::Association => "Association",
            ElementKind::AssociationEnd => "End",
            ElementKind::EntityContainer => "EntityContainer",
            ElementKind::EntitySet => "EntitySet",
            ElementKind::AssociationSet => "AssociationSet",
            ElementKind::AssociationSetEnd => "End",
            ElementKind::Function => "Function",
            ElementKind::FunctionImport => "FunctionImport",
            ElementKind::Mapping => "Mapping",
            ElementKind::EntityContainerMapping => "EntityContainerMapping",
            ElementKind::EntitySetMapping => "EntitySetMapping",
            ElementKind::EntityTypeMapping => "EntityTypeMapping",
            ElementKind::MappingFragment => "MappingFragment",
            ElementKind::ScalarProperty => "ScalarProperty",
            ElementKind::AssociationSetMapping => "AssociationSetMapping",
            ElementKind::EndProperty => "EndProperty",
            ElementKind::FunctionImportMapping => "FunctionImportMapping",
            ElementKind::Other => "(unrecognized)",
        }
    }
}

/// Arena index of a model element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElementId(pub u32);

impl ElementId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node of the EDM element tree.
///
/// Elements are owned by the [`super::ModelTree`] arena and are destroyed
/// when their subtree is deleted or the owning document is unloaded.
#[derive(Debug)]
pub struct Element {
    pub kind: ElementKind,
    pub space: ModelSpace,
    /// Local defining name (`Name` attribute; `Namespace` for `Schema`,
    /// `Role` for association ends).
    pub name: Option<SmolStr>,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
    pub span: Span,
    /// Raw XML attributes in document order.
    pub attrs: IndexMap<SmolStr, SmolStr>,
    /// Reference bindings attached to this element's attributes.
    pub bindings: Vec<BindingId>,
}

impl Element {
    pub fn new(kind: ElementKind, space: ModelSpace, name: Option<&str>) -> Self {
        Self {
            kind,
            space,
            name: name.map(SmolStr::new),
            parent: None,
            children: Vec::new(),
            span: Span::default(),
            attrs: IndexMap::new(),
            bindings: Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|v| v.as_str())
    }
}
