mod transaction;

pub use transaction::Transaction;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::base::EventEmitter;
use crate::model::{ElementId, ModelSpace, ModelTree};
use crate::resolve::{BindingId, BindingSet, DrainStats, ResolveEngine, SingleItemBinding};
use crate::symbols::{Symbol, SymbolChange, SymbolTable};
use crate::validate::{CompiledRuntimeModel, ErrorClass, ErrorSet};

/// Target runtime schema version, used by validation to select compatible
/// rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchemaVersion {
    V2,
    #[default]
    V3,
}

impl SchemaVersion {
    /// Function-import mappings arrived with V3.
    pub fn supports_function_import_mapping(self) -> bool {
        matches!(self, SchemaVersion::V3)
    }
}

/// Notifications published to presentation-layer observers after commits and
/// validation runs.
pub enum ArtifactEvent {
    SymbolDeclared { symbol: Symbol },
    SymbolRemoved { symbol: Symbol },
    TransactionCommitted { stats: DrainStats },
    ErrorsChanged { class: ErrorClass },
}

/// One open document set: the element tree for all three documents, the
/// symbol table, every reference binding, and the error set.
///
/// Owned state, never ambient: each open artifact carries its own table and
/// bindings, so multiple open document sets cannot cross-contaminate.
pub struct Artifact {
    pub(crate) tree: ModelTree,
    pub(crate) symbols: SymbolTable,
    pub(crate) bindings: BindingSet,
    pub(crate) engine: ResolveEngine,
    pub(crate) errors: ErrorSet,
    /// Metadata from the last full validation run, reusable while every
    /// runtime class stays clean.
    pub(crate) runtime_model: Option<CompiledRuntimeModel>,
    pub(crate) touched: FxHashSet<ModelSpace>,
    version: SchemaVersion,
    pub events: EventEmitter<ArtifactEvent, Artifact>,
}

impl Artifact {
    pub fn new(version: SchemaVersion) -> Self {
        Self {
            tree: ModelTree::new(),
            symbols: SymbolTable::new(),
            bindings: BindingSet::new(),
            engine: ResolveEngine::new(),
            errors: ErrorSet::new(),
            runtime_model: None,
            touched: FxHashSet::default(),
            version,
            events: EventEmitter::new(),
        }
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    pub fn tree(&self) -> &ModelTree {
        &self.tree
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn bindings(&self) -> &BindingSet {
        &self.bindings
    }

    pub fn errors(&self) -> &ErrorSet {
        &self.errors
    }

    /// The binding attached to `element` for the given attribute, if any.
    pub fn binding_for_attribute(
        &self,
        element: ElementId,
        attribute: &str,
    ) -> Option<&SingleItemBinding> {
        self.tree
            .get(element)?
            .bindings
            .iter()
            .filter_map(|id| self.bindings.get(*id))
            .find(|binding| binding.context().attribute() == attribute)
    }

    pub fn binding_id_for_attribute(
        &self,
        element: ElementId,
        attribute: &str,
    ) -> Option<BindingId> {
        self.tree
            .get(element)?
            .bindings
            .iter()
            .copied()
            .find(|id| {
                self.bindings
                    .get(*id)
                    .is_some_and(|binding| binding.context().attribute() == attribute)
            })
    }

    /// Start an edit transaction. All mutations go through the returned
    /// handle; resolution re-runs to fixpoint inside `commit`.
    pub fn begin(&mut self) -> Transaction<'_> {
        Transaction::new(self)
    }

    /// Storage model's entity container, if one exists. Validation keys the
    /// not-specified-instance severity downgrade off its absence.
    pub fn storage_entity_container(&self) -> Option<ElementId> {
        self.tree
            .elements_in_space(ModelSpace::Storage)
            .into_iter()
            .find(|id| {
                self.tree
                    .get(*id)
                    .is_some_and(|el| el.kind == crate::model::ElementKind::EntityContainer)
            })
    }

    pub(crate) fn publish(&mut self, event: ArtifactEvent) {
        let emitter = std::mem::take(&mut self.events);
        self.events = emitter.emit(event, self);
    }

    /// Commit body shared by [`Transaction::commit`]: drain the symbol
    /// journal into the scheduler, resolve to fixpoint, dirty the error
    /// classes whose inputs changed, notify observers.
    pub(crate) fn commit_internal(&mut self) -> DrainStats {
        let changes = self.symbols.drain_changes();
        for change in &changes {
            self.engine.note_change(&self.bindings, change);
        }
        let stats = self
            .engine
            .drain(&self.tree, &self.symbols, &mut self.bindings);

        let touched = std::mem::take(&mut self.touched);
        if !touched.is_empty() {
            self.runtime_model = None;
        }
        for space in touched {
            for class in ErrorClass::invalidated_by(space) {
                self.errors.mark_dirty(*class);
            }
        }

        debug!(
            "commit: {} symbol change(s), {} resolved, {} unresolved",
            changes.len(),
            stats.resolved,
            stats.unresolved
        );
        for change in changes {
            let event = match change {
                SymbolChange::Declared(symbol) => ArtifactEvent::SymbolDeclared { symbol },
                SymbolChange::Removed(symbol) => ArtifactEvent::SymbolRemoved { symbol },
            };
            self.publish(event);
        }
        self.publish(ArtifactEvent::TransactionCommitted { stats });
        stats
    }
}

impl Default for Artifact {
    fn default() -> Self {
        Self::new(SchemaVersion::default())
    }
}
