use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::model::{ElementId, ModelSpace};

/// Severity of a validation error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Message,
}

/// Partition of validation errors by schema space and origin.
///
/// `Runtime*` classes hold errors from compiling the bound graph into
/// runtime metadata; `Designer*` classes hold the designer's own structural
/// checks. Each class is independently markable dirty and is cleared and
/// recomputed on its own, so unrelated validation work is never invalidated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    RuntimeCsdl,
    RuntimeSsdl,
    RuntimeMsl,
    RuntimeViewGen,
    DesignerCsdl,
    DesignerSsdl,
    DesignerMsl,
}

impl ErrorClass {
    pub const ALL: [ErrorClass; 7] = [
        ErrorClass::RuntimeCsdl,
        ErrorClass::RuntimeSsdl,
        ErrorClass::RuntimeMsl,
        ErrorClass::RuntimeViewGen,
        ErrorClass::DesignerCsdl,
        ErrorClass::DesignerSsdl,
        ErrorClass::DesignerMsl,
    ];

    /// Classes whose inputs include the given space. Mapping validation and
    /// view generation read all three documents, so every space dirties
    /// them.
    pub fn invalidated_by(space: ModelSpace) -> &'static [ErrorClass] {
        match space {
            ModelSpace::Conceptual => &[
                ErrorClass::RuntimeCsdl,
                ErrorClass::DesignerCsdl,
                ErrorClass::RuntimeMsl,
                ErrorClass::RuntimeViewGen,
            ],
            ModelSpace::Storage => &[
                ErrorClass::RuntimeSsdl,
                ErrorClass::DesignerSsdl,
                ErrorClass::RuntimeMsl,
                ErrorClass::RuntimeViewGen,
            ],
            ModelSpace::Mapping => &[
                ErrorClass::RuntimeMsl,
                ErrorClass::DesignerMsl,
                ErrorClass::RuntimeViewGen,
            ],
        }
    }

    pub fn is_designer(self) -> bool {
        matches!(
            self,
            ErrorClass::DesignerCsdl | ErrorClass::DesignerSsdl | ErrorClass::DesignerMsl
        )
    }
}

/// One validation error, addressable to a source element.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorInfo {
    pub severity: Severity,
    pub message: String,
    /// Originating element; `None` when the whole document is missing.
    pub source: Option<ElementId>,
    pub code: u32,
    pub class: ErrorClass,
}

impl ErrorInfo {
    pub fn new(
        severity: Severity,
        message: impl Into<String>,
        source: Option<ElementId>,
        code: u32,
        class: ErrorClass,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            source,
            code,
            class,
        }
    }
}

/// The artifact's error set, keyed by class with per-class dirty flags.
///
/// Dirtiness is plain cache invalidation: a clean class keeps its stored
/// errors across validation runs, which is what makes re-validation without
/// edits reproduce the identical error list.
pub struct ErrorSet {
    by_class: IndexMap<ErrorClass, Vec<ErrorInfo>>,
    dirty: FxHashSet<ErrorClass>,
}

impl ErrorSet {
    pub fn new() -> Self {
        Self {
            by_class: IndexMap::new(),
            dirty: ErrorClass::ALL.into_iter().collect(),
        }
    }

    pub fn is_dirty(&self, class: ErrorClass) -> bool {
        self.dirty.contains(&class)
    }

    pub fn mark_dirty(&mut self, class: ErrorClass) {
        self.dirty.insert(class);
    }

    pub(crate) fn clear_dirty(&mut self, class: ErrorClass) {
        self.dirty.remove(&class);
    }

    /// Replace one class's errors wholesale; other classes are untouched.
    pub(crate) fn replace_class(&mut self, class: ErrorClass, errors: Vec<ErrorInfo>) {
        self.by_class.insert(class, errors);
    }

    pub fn class_errors(&self, class: ErrorClass) -> &[ErrorInfo] {
        self.by_class.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all(&self) -> impl Iterator<Item = &ErrorInfo> {
        self.by_class.values().flatten()
    }

    pub fn count(&self) -> usize {
        self.by_class.values().map(Vec::len).sum()
    }

    /// Whether a class currently holds any `Error`-severity entry.
    pub fn class_has_blocking_errors(&self, class: ErrorClass) -> bool {
        self.class_errors(class)
            .iter()
            .any(|error| error.severity == Severity::Error)
    }
}

impl Default for ErrorSet {
    fn default() -> Self {
        Self::new()
    }
}
