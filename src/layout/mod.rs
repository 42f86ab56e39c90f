use indexmap::{IndexMap, IndexSet};
use std::fmt;

use crate::entity::{EntityDraft, EntityManager};
use crate::model::{Edge, EdgeId, ElementRef, EntityId, Grouping, GroupingId, Vertex, VertexId};
use crate::viewport::{LayoutConfig, RenderPlan, Viewport};

mod clipboard;
mod drag;
mod grouping;
mod history;
mod mutation;
mod positioning;
mod selection;
mod snapshot;

pub use history::{History, LayoutState};
pub use mutation::Removal;
pub use positioning::{ForceLink, ForceNode, PositioningInput};
pub use snapshot::{EdgeRecord, GroupingRecord, LayoutSnapshot, VertexRecord};

use drag::DragGesture;

/// Handle for an entity creation that has not settled yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CreationToken(u64);

impl fmt::Display for CreationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug)]
struct PendingCreation {
    vertex_id: VertexId,
    draft: EntityDraft,
}

/// Authoritative diagram state: the only place vertices, edges, groupings,
/// selection and history are mutated.
pub struct GraphLayout {
    config: LayoutConfig,
    vertices: IndexMap<VertexId, Vertex>,
    edges: IndexMap<EdgeId, Edge>,
    groupings: IndexMap<GroupingId, Grouping>,
    selection: IndexSet<ElementRef>,
    entities: EntityManager,
    history: History,
    drag: Option<DragGesture>,
    pending: IndexMap<CreationToken, PendingCreation>,
    /// Creations whose provisional vertex went away before they settled.
    abandoned: IndexSet<CreationToken>,
    next_token: u64,
}

impl Default for GraphLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphLayout {
    pub fn new() -> Self {
        Self::with_parts(LayoutConfig::default(), EntityManager::new())
    }

    pub fn with_parts(config: LayoutConfig, entities: EntityManager) -> Self {
        let history = History::new(LayoutState::default(), config.history_limit);
        Self {
            config,
            vertices: IndexMap::new(),
            edges: IndexMap::new(),
            groupings: IndexMap::new(),
            selection: IndexSet::new(),
            entities,
            history,
            drag: None,
            pending: IndexMap::new(),
            abandoned: IndexSet::new(),
            next_token: 1,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn entity_manager(&self) -> &EntityManager {
        &self.entities
    }

    pub fn entity_manager_mut(&mut self) -> &mut EntityManager {
        &mut self.entities
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn get_vertices(&self) -> Vec<&Vertex> {
        self.vertices.values().collect()
    }

    pub fn get_edges(&self) -> Vec<&Edge> {
        self.edges.values().collect()
    }

    pub fn get_groupings(&self) -> Vec<&Grouping> {
        self.groupings.values().collect()
    }

    pub fn vertex(&self, id: &VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn grouping(&self, id: &GroupingId) -> Option<&Grouping> {
        self.groupings.get(id)
    }

    pub fn vertex_map(&self) -> &IndexMap<VertexId, Vertex> {
        &self.vertices
    }

    pub fn get_vertex_by_entity(&self, entity_id: &EntityId) -> Option<&Vertex> {
        self.vertices
            .values()
            .find(|v| v.entity_id.as_ref() == Some(entity_id))
    }

    pub fn has_element(&self, element: &ElementRef) -> bool {
        match element {
            ElementRef::Vertex(id) => self.vertices.contains_key(id),
            ElementRef::Edge(id) => self.edges.contains_key(id),
            ElementRef::Grouping(id) => self.groupings.contains_key(id),
        }
    }

    pub fn is_provisional(&self, id: &VertexId) -> bool {
        self.pending.values().any(|p| &p.vertex_id == id)
    }

    pub fn plan_render(&self, viewport: &Viewport) -> RenderPlan {
        RenderPlan::build(self, viewport)
    }

    /// Forgets pending creations whose provisional vertex is gone, so a late
    /// confirmation is rolled back in the store instead of placing a vertex.
    fn abandon_creations(&mut self) {
        let gone: Vec<CreationToken> = self
            .pending
            .iter()
            .filter(|(_, p)| !self.vertices.contains_key(&p.vertex_id))
            .map(|(token, _)| *token)
            .collect();
        for token in gone {
            self.pending.shift_remove(&token);
            self.abandoned.insert(token);
        }
    }

    fn incident_edges(&self, vertex: &VertexId) -> Vec<EdgeId> {
        self.edges
            .values()
            .filter(|e| e.is_incident(vertex))
            .map(|e| e.id.clone())
            .collect()
    }

    fn entity_in_use(&self, entity_id: &EntityId) -> bool {
        self.vertices
            .values()
            .any(|v| v.entity_id.as_ref() == Some(entity_id))
            || self
                .edges
                .values()
                .any(|e| e.entity_id.as_ref() == Some(entity_id))
    }
}
