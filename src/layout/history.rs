use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use super::GraphLayout;
use crate::entity::{EntityDelta, Replay};
use crate::model::{Edge, EdgeId, ElementRef, Grouping, GroupingId, Vertex, VertexId};

/// Value copy of the layout collections and selection at a commit point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutState {
    pub vertices: IndexMap<VertexId, Vertex>,
    pub edges: IndexMap<EdgeId, Edge>,
    pub groupings: IndexMap<GroupingId, Grouping>,
    pub selection: IndexSet<ElementRef>,
}

#[derive(Clone, Debug)]
struct HistoryEntry {
    state: LayoutState,
    delta: EntityDelta,
}

/// Committed states after a base state. `cursor` counts the entries that are
/// currently applied, so `cursor == len()` means there is nothing to redo.
#[derive(Clone, Debug)]
pub struct History {
    base: LayoutState,
    entries: Vec<HistoryEntry>,
    cursor: usize,
    limit: usize,
}

impl History {
    pub fn new(base: LayoutState, limit: usize) -> Self {
        Self {
            base,
            entries: Vec::new(),
            cursor: 0,
            limit: limit.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    pub fn current_state(&self) -> &LayoutState {
        match self.cursor {
            0 => &self.base,
            n => &self.entries[n - 1].state,
        }
    }

    /// Appends a committed state, discarding any redo branch first.
    pub fn push(&mut self, state: LayoutState, delta: EntityDelta) {
        self.entries.truncate(self.cursor);
        self.entries.push(HistoryEntry { state, delta });
        if self.entries.len() > self.limit {
            let overflow = self.entries.len() - self.limit;
            let mut dropped = self.entries.drain(0..overflow);
            if let Some(last) = dropped.next_back() {
                self.base = last.state;
            }
        }
        self.cursor = self.entries.len();
    }

    /// Steps back one entry. Returns the state to restore and the delta that
    /// must be reverted.
    pub fn undo(&mut self) -> Option<(LayoutState, EntityDelta)> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        let delta = self.entries[self.cursor].delta.clone();
        Some((self.current_state().clone(), delta))
    }

    pub fn redo(&mut self) -> Option<(LayoutState, EntityDelta)> {
        let entry = self.entries.get(self.cursor)?;
        let out = (entry.state.clone(), entry.delta.clone());
        self.cursor += 1;
        Some(out)
    }

    pub fn reset(&mut self, base: LayoutState) {
        self.base = base;
        self.entries.clear();
        self.cursor = 0;
    }
}

impl GraphLayout {
    /// Committed view of the layout. Provisional vertices and everything
    /// referring to them are left out, and vertices under an active drag are
    /// recorded at their gesture-start positions.
    pub fn state(&self) -> LayoutState {
        let provisional: IndexSet<&VertexId> =
            self.pending.values().map(|p| &p.vertex_id).collect();
        let vertices: IndexMap<VertexId, Vertex> = self
            .vertices
            .iter()
            .filter(|(id, _)| !provisional.contains(id))
            .map(|(id, v)| {
                let mut v = v.clone();
                if let Some(origin) = self.drag.as_ref().and_then(|d| d.origin(id)) {
                    v.position = origin;
                }
                (id.clone(), v)
            })
            .collect();
        let edges: IndexMap<EdgeId, Edge> = self
            .edges
            .iter()
            .filter(|(_, e)| {
                !provisional.contains(&e.source_id) && !provisional.contains(&e.target_id)
            })
            .map(|(id, e)| (id.clone(), e.clone()))
            .collect();
        let groupings: IndexMap<GroupingId, Grouping> = self
            .groupings
            .iter()
            .filter_map(|(id, g)| {
                let mut g = g.clone();
                g.vertex_ids.retain(|v| !provisional.contains(v));
                (!g.vertex_ids.is_empty()).then(|| (id.clone(), g))
            })
            .collect();
        let selection = self
            .selection
            .iter()
            .filter(|r| match r {
                ElementRef::Vertex(id) => !provisional.contains(id),
                ElementRef::Edge(id) => edges.contains_key(id),
                ElementRef::Grouping(id) => groupings.contains_key(id),
            })
            .cloned()
            .collect();
        LayoutState {
            vertices,
            edges,
            groupings,
            selection,
        }
    }

    fn restore(&mut self, state: LayoutState) {
        let provisional: Vec<Vertex> = self
            .pending
            .values()
            .filter_map(|p| self.vertices.get(&p.vertex_id).cloned())
            .collect();
        self.vertices = state.vertices;
        for v in provisional {
            self.vertices.entry(v.id.clone()).or_insert(v);
        }
        self.edges = state.edges;
        self.groupings = state.groupings;
        self.selection = state.selection;
        self.drag = None;
        self.revalidate_selection();
    }

    pub(super) fn commit(&mut self, delta: EntityDelta) {
        let state = self.state();
        debug!(
            created = delta.created.len(),
            updated = delta.updated.len(),
            deleted = delta.deleted.len(),
            "committing layout state"
        );
        self.history.push(state, delta);
    }

    /// Clears history and makes the current state the new base.
    pub fn reset_history(&mut self) {
        let base = self.state();
        self.history.reset(base);
    }

    pub fn undo(&mut self) -> bool {
        let Some((state, delta)) = self.history.undo() else {
            return false;
        };
        self.entities.apply_entity_changes(&delta, Replay::Undo);
        self.restore(state);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some((state, delta)) = self.history.redo() else {
            return false;
        };
        self.entities.apply_entity_changes(&delta, Replay::Redo);
        self.restore(state);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::model::Point;

    fn state_with(ids: &[&str]) -> LayoutState {
        let mut state = LayoutState::default();
        for id in ids {
            let v = Vertex::new(*id, *id, Point::ZERO);
            state.vertices.insert(v.id.clone(), v);
        }
        state
    }

    #[test]
    fn push_after_undo_discards_redo_branch() {
        let mut history = History::new(LayoutState::default(), 10);
        history.push(state_with(&["a"]), EntityDelta::default());
        history.push(state_with(&["a", "b"]), EntityDelta::default());
        assert_eq!(history.cursor(), 2);

        let (state, _) = history.undo().unwrap();
        assert_eq!(state, state_with(&["a"]));
        assert!(history.can_redo());

        history.push(state_with(&["a", "c"]), EntityDelta::default());
        assert_eq!(history.len(), 2);
        assert_eq!(history.cursor(), 2);
        assert!(!history.can_redo());
        assert!(history.redo().is_none());
    }

    #[test]
    fn undo_at_base_is_a_noop() {
        let mut history = History::new(state_with(&["base"]), 10);
        assert!(history.undo().is_none());
        history.push(state_with(&["x"]), EntityDelta::created(Entity::new("e", "Thing")));
        let (state, delta) = history.undo().unwrap();
        assert_eq!(state, state_with(&["base"]));
        assert_eq!(delta.created.len(), 1);
        assert!(history.undo().is_none());
        assert_eq!(history.cursor(), 0);
    }

    #[test]
    fn limit_folds_oldest_entries_into_base() {
        let mut history = History::new(LayoutState::default(), 2);
        history.push(state_with(&["1"]), EntityDelta::default());
        history.push(state_with(&["2"]), EntityDelta::default());
        history.push(state_with(&["3"]), EntityDelta::default());
        assert_eq!(history.len(), 2);
        assert!(history.undo().is_some());
        let (state, _) = history.undo().unwrap();
        assert_eq!(state, state_with(&["1"]));
        assert!(history.undo().is_none());
    }
}
