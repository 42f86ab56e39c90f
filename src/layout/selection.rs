use indexmap::IndexSet;
use tracing::warn;

use super::GraphLayout;
use crate::entity::Entity;
use crate::model::{Edge, EdgeId, ElementRef, Grouping, GroupingId, Rect, Vertex, VertexId};

impl GraphLayout {
    /// Replaces the selection, or extends it when `additional` is set.
    /// Selecting a grouping also selects its live members.
    pub fn select_element<I>(&mut self, elements: I, additional: bool)
    where
        I: IntoIterator,
        I::Item: Into<ElementRef>,
    {
        if !additional {
            self.selection.clear();
        }
        for element in elements {
            let element = element.into();
            if !self.has_element(&element) {
                warn!(%element, "ignoring selection of unknown element");
                continue;
            }
            if let ElementRef::Grouping(id) = &element {
                let members: Vec<VertexId> = self.groupings[id]
                    .live_members(&self.vertices)
                    .map(|v| v.id.clone())
                    .collect();
                self.selection
                    .extend(members.into_iter().map(ElementRef::Vertex));
            }
            self.selection.insert(element);
        }
    }

    /// Selects exactly the vertices whose position lies inside `rect`.
    pub fn select_area(&mut self, rect: Rect) {
        self.selection = self
            .vertices
            .values()
            .filter(|v| rect.contains(v.position))
            .map(|v| ElementRef::Vertex(v.id.clone()))
            .collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selection(&self) -> &IndexSet<ElementRef> {
        &self.selection
    }

    /// Drops selection entries whose element no longer exists.
    pub(super) fn revalidate_selection(&mut self) {
        let stale: Vec<ElementRef> = self
            .selection
            .iter()
            .filter(|r| !self.has_element(r))
            .cloned()
            .collect();
        for r in &stale {
            self.selection.shift_remove(r);
        }
    }

    pub fn is_element_selected(&self, element: &ElementRef) -> bool {
        match element {
            ElementRef::Grouping(id) => self.is_grouping_selected(id),
            _ => self.selection.contains(element),
        }
    }

    pub fn is_edge_highlighted(&self, edge: &EdgeId) -> bool {
        let Some(e) = self.edges.get(edge) else {
            return false;
        };
        self.selection.contains(&ElementRef::Edge(e.id.clone()))
            || self.is_vertex_selected(&e.source_id)
            || self.is_vertex_selected(&e.target_id)
    }

    fn is_vertex_selected(&self, id: &VertexId) -> bool {
        self.selection.contains(&ElementRef::Vertex(id.clone()))
    }

    /// Selected directly, or every live member is selected.
    pub fn is_grouping_selected(&self, id: &GroupingId) -> bool {
        if self.selection.contains(&ElementRef::Grouping(id.clone())) {
            return true;
        }
        let Some(g) = self.groupings.get(id) else {
            return false;
        };
        let mut members = g.live_members(&self.vertices).peekable();
        members.peek().is_some() && members.all(|v| self.is_vertex_selected(&v.id))
    }

    /// Some but not all live members are selected.
    pub fn is_grouping_member_selected(&self, id: &GroupingId) -> bool {
        let Some(g) = self.groupings.get(id) else {
            return false;
        };
        let (selected, total) = g
            .live_members(&self.vertices)
            .fold((0usize, 0usize), |(s, t), v| {
                (s + usize::from(self.is_vertex_selected(&v.id)), t + 1)
            });
        selected > 0 && selected < total
    }

    /// Vertices a drag moves: directly selected ones plus members of
    /// selected groupings, each once.
    pub(super) fn selected_vertex_ids(&self) -> IndexSet<VertexId> {
        let mut out = IndexSet::new();
        for r in &self.selection {
            match r {
                ElementRef::Vertex(id) if self.vertices.contains_key(id) => {
                    out.insert(id.clone());
                }
                ElementRef::Grouping(id) => {
                    if let Some(g) = self.groupings.get(id) {
                        out.extend(g.live_members(&self.vertices).map(|v| v.id.clone()));
                    }
                }
                _ => {}
            }
        }
        out
    }

    pub fn get_selected_vertices(&self) -> Vec<&Vertex> {
        self.selected_vertex_ids()
            .iter()
            .filter_map(|id| self.vertices.get(id))
            .collect()
    }

    pub fn get_selected_edges(&self) -> Vec<&Edge> {
        self.selection
            .iter()
            .filter_map(|r| match r {
                ElementRef::Edge(id) => self.edges.get(id),
                _ => None,
            })
            .collect()
    }

    pub fn get_selected_groupings(&self) -> Vec<&Grouping> {
        self.groupings
            .values()
            .filter(|g| self.is_grouping_selected(&g.id))
            .collect()
    }

    /// Entities behind the selected vertices and edges, as the store has them.
    pub fn get_selected_entities(&self) -> Vec<Entity> {
        let vertex_entities = self
            .get_selected_vertices()
            .into_iter()
            .filter_map(|v| v.entity_id.as_ref());
        let edge_entities = self
            .get_selected_edges()
            .into_iter()
            .filter_map(|e| e.entity_id.as_ref());
        let ids: IndexSet<_> = vertex_entities.chain(edge_entities).collect();
        ids.into_iter()
            .filter_map(|id| self.entities.resolve_entity_reference(id))
            .collect()
    }
}
