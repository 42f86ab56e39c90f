use indexmap::{IndexMap, IndexSet};

use super::GraphLayout;
use super::snapshot::{EdgeRecord, GroupingRecord, LayoutSnapshot, VertexRecord};
use crate::entity::EntityDelta;
use crate::model::{Edge, EdgeId, ElementRef, Grouping, GroupingId, Point, Vertex, VertexId};

impl GraphLayout {
    /// Selected vertices, the edges between them, and groupings they fully
    /// cover.
    pub fn copy_selection(&self) -> LayoutSnapshot {
        let ids = self.selected_vertex_ids();
        let vertices = ids
            .iter()
            .filter_map(|id| self.vertices.get(id))
            .map(VertexRecord::from)
            .collect();
        let edges = self
            .edges
            .values()
            .filter(|e| ids.contains(&e.source_id) && ids.contains(&e.target_id))
            .map(EdgeRecord::from)
            .collect();
        let groupings = self
            .groupings
            .values()
            .filter(|g| !g.vertex_ids.is_empty() && g.vertex_ids.iter().all(|v| ids.contains(v)))
            .map(GroupingRecord::from)
            .collect();
        LayoutSnapshot {
            vertices,
            edges,
            groupings,
        }
    }

    /// Inserts a copy of `payload` with fresh ids, shifted by `offset`, and
    /// selects the pasted vertices. Entity links already shown elsewhere in the
    /// layout are dropped so an entity keeps a single vertex.
    pub fn paste(&mut self, payload: &LayoutSnapshot, offset: Point) -> Vec<VertexId> {
        if payload.vertices.is_empty() {
            return Vec::new();
        }
        let mut id_map: IndexMap<VertexId, VertexId> = IndexMap::new();
        for record in &payload.vertices {
            if id_map.contains_key(&record.id) {
                continue;
            }
            let mut v = Vertex::from(record.clone());
            let new_id = VertexId::generate();
            id_map.insert(v.id.clone(), new_id.clone());
            v.id = new_id;
            v.position += offset;
            if v.entity_id.as_ref().is_some_and(|e| self.entity_in_use(e)) {
                v.entity_id = None;
            }
            self.vertices.insert(v.id.clone(), v);
        }

        for record in &payload.edges {
            let (Some(source), Some(target)) =
                (id_map.get(&record.source_id), id_map.get(&record.target_id))
            else {
                continue;
            };
            let mut e = Edge::from(record.clone());
            e.id = EdgeId::generate();
            e.source_id = source.clone();
            e.target_id = target.clone();
            e.label_position = e.label_position.map(|p| p + offset);
            if e.entity_id.as_ref().is_some_and(|id| self.entity_in_use(id)) {
                e.entity_id = None;
            }
            self.edges.insert(e.id.clone(), e);
        }

        for record in &payload.groupings {
            let members: IndexSet<VertexId> = record
                .vertex_ids
                .iter()
                .filter_map(|id| id_map.get(id).cloned())
                .collect();
            if members.is_empty() {
                continue;
            }
            let mut g = Grouping::new(GroupingId::generate(), members, record.color);
            g.label = record.label.clone();
            self.groupings.insert(g.id.clone(), g);
        }

        let pasted: Vec<VertexId> = id_map.into_values().collect();
        self.selection = pasted.iter().cloned().map(ElementRef::Vertex).collect();
        self.commit(EntityDelta::default());
        pasted
    }
}
