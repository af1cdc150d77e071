use tracing::trace;

use crate::base::Position;

use super::element::{Element, ElementId, ElementKind, ModelSpace};

/// Arena holding every element of one document set.
///
/// Slots of deleted elements stay tombstoned so `ElementId`s held by errors
/// raised earlier in the same session never alias a different element.
#[derive(Default)]
pub struct ModelTree {
    arena: Vec<Option<Element>>,
    roots: Vec<ElementId>,
}

impl ModelTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an element and link it under its parent (or as a root).
    pub fn alloc(&mut self, mut element: Element, parent: Option<ElementId>) -> ElementId {
        let id = ElementId::new(self.arena.len());
        element.parent = parent;
        self.arena.push(Some(element));
        match parent {
            Some(parent_id) => {
                if let Some(parent) = self.get_mut(parent_id) {
                    parent.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        id
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.arena.get(id.index()).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.arena
            .get_mut(id.index())
            .and_then(|slot| slot.as_mut())
    }

    pub fn roots(&self) -> &[ElementId] {
        &self.roots
    }

    /// Root elements belonging to one space (usually zero or one).
    pub fn roots_in_space(&self, space: ModelSpace) -> Vec<ElementId> {
        self.roots
            .iter()
            .copied()
            .filter(|id| self.get(*id).is_some_and(|el| el.space == space))
            .collect()
    }

    /// Walk from `id` towards the root, excluding `id` itself.
    pub fn ancestors(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let mut current = self.get(id).and_then(|el| el.parent);
        std::iter::from_fn(move || {
            let id = current?;
            current = self.get(id).and_then(|el| el.parent);
            Some(id)
        })
    }

    /// Nearest ancestor of the given kind, if any.
    pub fn nearest_ancestor(&self, id: ElementId, kind: ElementKind) -> Option<ElementId> {
        self.ancestors(id)
            .find(|&ancestor| self.get(ancestor).is_some_and(|el| el.kind == kind))
    }

    /// Depth-first traversal of `id` and everything below it.
    pub fn subtree(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(el) = self.get(current) {
                out.push(current);
                stack.extend(el.children.iter().rev().copied());
            }
        }
        out
    }

    /// Children of `id` restricted to one kind.
    pub fn children_of_kind(&self, id: ElementId, kind: ElementKind) -> Vec<ElementId> {
        self.get(id)
            .map(|el| {
                el.children
                    .iter()
                    .copied()
                    .filter(|child| self.get(*child).is_some_and(|c| c.kind == kind))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All live elements in one space, in allocation order.
    pub fn elements_in_space(&self, space: ModelSpace) -> Vec<ElementId> {
        self.arena
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.as_ref()
                    .filter(|el| el.space == space)
                    .map(|_| ElementId::new(index))
            })
            .collect()
    }

    /// Detach and tombstone the subtree rooted at `id`, returning the removed
    /// ids (deepest last). The caller is responsible for undeclaring symbols
    /// and dropping bindings first.
    pub fn remove_subtree(&mut self, id: ElementId) -> Vec<ElementId> {
        let removed = self.subtree(id);
        if let Some(parent) = self.get(id).and_then(|el| el.parent) {
            if let Some(parent_el) = self.get_mut(parent) {
                parent_el.children.retain(|child| *child != id);
            }
        } else {
            self.roots.retain(|root| *root != id);
        }
        for victim in &removed {
            self.arena[victim.index()] = None;
        }
        trace!("removed subtree of {} element(s) under {:?}", removed.len(), id);
        removed
    }

    /// Deepest element in `space` whose span contains the position.
    ///
    /// This is the designer's line/column-to-element lookup used to address
    /// compiler errors back to their originating element. The lookup is
    /// scoped to one document: all three documents count lines from zero, so
    /// a position is only meaningful together with the space it came from.
    pub fn find_at_position(&self, space: ModelSpace, position: Position) -> Option<ElementId> {
        let mut best: Option<ElementId> = None;
        let mut frontier: Vec<ElementId> = self.roots_in_space(space);
        while let Some(hit) = frontier.iter().copied().find(|id| {
            self.get(*id)
                .is_some_and(|el| el.span.contains(position))
        }) {
            best = Some(hit);
            frontier = self.get(hit).map(|el| el.children.clone()).unwrap_or_default();
        }
        best
    }

    pub fn len(&self) -> usize {
        self.arena.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
