use tracing::trace;

use crate::base::Span;
use crate::model::{Element, ElementId, ElementKind, ModelSpace};
use crate::resolve::{BindingId, BindingStatus, DrainStats, ReferenceContext, SingleItemBinding};
use crate::symbols::declared_symbols;

use super::Artifact;

/// An edit transaction over one artifact.
///
/// Mutations apply to the tree and symbol table immediately; resolution of
/// affected bindings is deferred to [`Transaction::commit`], which drains
/// the scheduler to fixpoint before returning. Callers therefore never
/// observe a partially-resolved graph after commit.
pub struct Transaction<'a> {
    artifact: &'a mut Artifact,
}

impl<'a> Transaction<'a> {
    pub(super) fn new(artifact: &'a mut Artifact) -> Self {
        Self { artifact }
    }

    /// Create an element and declare its symbols.
    pub fn create_element(
        &mut self,
        parent: Option<ElementId>,
        kind: ElementKind,
        space: ModelSpace,
        name: Option<&str>,
    ) -> ElementId {
        let id = self
            .artifact
            .tree
            .alloc(Element::new(kind, space, name), parent);
        for symbol in declared_symbols(&self.artifact.tree, id) {
            self.artifact.symbols.declare(symbol, id);
        }
        self.artifact.touched.insert(space);
        id
    }

    pub fn set_span(&mut self, element: ElementId, span: Span) {
        if let Some(el) = self.artifact.tree.get_mut(element) {
            el.span = span;
        }
    }

    pub fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
        if let Some(el) = self.artifact.tree.get_mut(element) {
            el.attrs.insert(name.into(), value.into());
            let space = el.space;
            self.artifact.touched.insert(space);
        }
    }

    /// Wrap a reference attribute in a binding. `None`/empty raw text makes
    /// the binding `Undefined` unless the context defaults when omitted.
    pub fn add_reference(
        &mut self,
        owner: ElementId,
        context: ReferenceContext,
        raw: Option<&str>,
    ) -> BindingId {
        let binding = SingleItemBinding::new(owner, context, raw);
        let pending = binding.status() == BindingStatus::Unknown;
        let id = self.artifact.bindings.alloc(binding);
        if let Some(el) = self.artifact.tree.get_mut(owner) {
            el.bindings.push(id);
            let space = el.space;
            self.artifact.touched.insert(space);
        }
        if pending {
            self.artifact.engine.enqueue(id);
        }
        trace!("reference {:?} {:?} '{}'", id, context, raw.unwrap_or(""));
        id
    }

    /// Rename an element's defining name.
    ///
    /// Every symbol declared inside the subtree is re-registered, since the
    /// computed symbols of contained declarations embed the ancestor name.
    /// Outside referrers keyed on the removed symbols are requeued at commit
    /// through the inverse index; bindings owned inside the subtree are
    /// requeued directly, since renaming their scope changes the symbol they
    /// normalize to.
    pub fn set_name(&mut self, element: ElementId, name: &str) {
        let subtree = self.artifact.tree.subtree(element);
        for id in &subtree {
            self.artifact.symbols.undeclare_element(*id);
        }
        if let Some(el) = self.artifact.tree.get_mut(element) {
            el.name = Some(name.into());
            let space = el.space;
            self.artifact.touched.insert(space);
        }
        for id in subtree {
            for symbol in declared_symbols(&self.artifact.tree, id) {
                self.artifact.symbols.declare(symbol, id);
            }
            // Bindings owned inside the subtree normalize through the renamed
            // ancestor, so their inverse-index keys are stale. The index alone
            // cannot requeue them: their old keys match none of the removed
            // symbols when the referenced name never resolved.
            if let Some(el) = self.artifact.tree.get(id) {
                for binding in &el.bindings {
                    self.artifact.engine.enqueue(*binding);
                }
            }
        }
    }

    /// Replace a binding's raw reference text, resetting its state.
    pub fn set_reference_text(&mut self, binding: BindingId, raw: Option<&str>) {
        if let Some(b) = self.artifact.bindings.get_mut(binding) {
            b.reset_raw(raw);
        }
        // Rekey after the reset so a now-Undefined binding leaves the index.
        self.artifact.bindings.rekey(binding, None);
        if let Some(b) = self.artifact.bindings.get(binding) {
            if let Some(owner) = self.artifact.tree.get(b.owner()) {
                let space = owner.space;
                self.artifact.touched.insert(space);
            }
            if b.status() == BindingStatus::Unknown {
                self.artifact.engine.enqueue(binding);
            }
        }
    }

    /// Delete an element and its subtree. Symbols declared inside are
    /// undeclared (cascading re-resolution to referrers at commit) and the
    /// subtree's own bindings are dropped.
    pub fn delete_element(&mut self, element: ElementId) {
        let subtree = self.artifact.tree.subtree(element);
        for id in &subtree {
            self.artifact.symbols.undeclare_element(*id);
            if let Some(el) = self.artifact.tree.get(*id) {
                let space = el.space;
                self.artifact.touched.insert(space);
                for binding in el.bindings.clone() {
                    self.artifact.bindings.remove(binding);
                }
            }
        }
        self.artifact.tree.remove_subtree(element);
    }

    /// Commit: run resolution to fixpoint and notify observers. Consumes the
    /// transaction; the artifact is fully converged when this returns.
    pub fn commit(self) -> DrainStats {
        self.artifact.commit_internal()
    }

    pub(crate) fn artifact(&mut self) -> &mut Artifact {
        self.artifact
    }
}
