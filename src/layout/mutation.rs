use tracing::{debug, warn};

use super::{CreationToken, GraphLayout, PendingCreation};
use crate::entity::{Entity, EntityDelta, EntityDraft, EntityUpdate};
use crate::error::{EntityError, LayoutError};
use crate::model::{Edge, ElementRef, EntityId, Grouping, Point, Vertex, VertexId};

/// Elements taken out of the layout by one removal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Removal {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    pub groupings: Vec<Grouping>,
    pub entities: Vec<Entity>,
}

impl Removal {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty() && self.groupings.is_empty()
    }
}

impl GraphLayout {
    pub(super) fn insert_vertex(&mut self, vertex: Vertex) -> bool {
        if self.vertices.contains_key(&vertex.id) {
            warn!(id = %vertex.id, "vertex id already in use, keeping the original");
            return false;
        }
        self.vertices.insert(vertex.id.clone(), vertex);
        true
    }

    pub(super) fn insert_edge(&mut self, edge: Edge) -> bool {
        if self.edges.contains_key(&edge.id) {
            warn!(id = %edge.id, "edge id already in use, keeping the original");
            return false;
        }
        for end in [&edge.source_id, &edge.target_id] {
            if !self.vertices.contains_key(end) {
                warn!(id = %edge.id, vertex = %end, "dropping edge with missing endpoint");
                return false;
            }
        }
        self.edges.insert(edge.id.clone(), edge);
        true
    }

    pub fn add_vertex(&mut self, vertex: Vertex) -> bool {
        if !self.insert_vertex(vertex) {
            return false;
        }
        self.commit(EntityDelta::default());
        true
    }

    pub fn add_edge(&mut self, edge: Edge) -> bool {
        if !self.insert_edge(edge) {
            return false;
        }
        self.commit(EntityDelta::default());
        true
    }

    /// Inserts a provisional vertex for an entity the store has yet to create.
    /// Settle it with [`GraphLayout::complete_entity_creation`].
    pub fn begin_entity_creation(
        &mut self,
        draft: EntityDraft,
        position: Point,
    ) -> (CreationToken, VertexId) {
        let token = CreationToken(self.next_token);
        self.next_token += 1;

        let mut vertex = Vertex::new(
            VertexId::generate(),
            draft.caption().unwrap_or_default(),
            position,
        );
        vertex.kind = draft.schema.clone();
        vertex.color = self.config.default_vertex_color;
        vertex.radius = self.config.vertex_radius;
        let vertex_id = vertex.id.clone();
        self.vertices.insert(vertex_id.clone(), vertex);
        self.pending.insert(
            token,
            PendingCreation {
                vertex_id: vertex_id.clone(),
                draft,
            },
        );
        debug!(%token, vertex = %vertex_id, "entity creation pending");
        (token, vertex_id)
    }

    /// Confirms or rolls back a pending creation. A failed creation removes the
    /// provisional vertex and leaves history untouched.
    pub fn complete_entity_creation(
        &mut self,
        token: CreationToken,
        result: Result<Entity, EntityError>,
    ) -> Result<VertexId, LayoutError> {
        if self.abandoned.shift_remove(&token) {
            if let Ok(entity) = &result {
                debug!(%token, entity = %entity.id, "rolling back entity of abandoned creation");
                self.entities.delete_entity(&entity.id);
            }
            return Err(LayoutError::UnknownCreation(token));
        }
        let pending = self
            .pending
            .shift_remove(&token)
            .ok_or(LayoutError::UnknownCreation(token))?;
        let vertex_id = pending.vertex_id;

        let entity = match result {
            Ok(entity) => entity,
            Err(err) => {
                warn!(%token, schema = %pending.draft.schema, %err, "entity creation failed");
                self.discard_vertex(&vertex_id);
                return Err(err.into());
            }
        };

        let Some(vertex) = self.vertices.get_mut(&vertex_id) else {
            warn!(%token, "provisional vertex vanished before creation settled");
            self.entities.delete_entity(&entity.id);
            return Err(LayoutError::UnknownElement(ElementRef::Vertex(vertex_id)));
        };
        vertex.entity_id = Some(entity.id.clone());
        vertex.kind = entity.schema.clone();
        vertex.label = entity.caption().to_string();

        self.commit(EntityDelta::created(entity));
        Ok(vertex_id)
    }

    /// Creates the entity through the bridge and places a vertex for it.
    pub fn add_entity(&mut self, draft: EntityDraft, position: Point) -> Result<VertexId, LayoutError> {
        let (token, _) = self.begin_entity_creation(draft.clone(), position);
        let result = self.entities.create_entity(draft);
        self.complete_entity_creation(token, result)
    }

    /// Removes a vertex without touching history or the entity store.
    fn discard_vertex(&mut self, id: &VertexId) {
        self.vertices.shift_remove(id);
        self.edges.retain(|_, e| !e.is_incident(id));
        for g in self.groupings.values_mut() {
            g.vertex_ids.shift_remove(id);
        }
        self.groupings.retain(|_, g| !g.vertex_ids.is_empty());
        self.revalidate_selection();
    }

    /// Removes a vertex, edge or grouping. Removing a vertex with `cascade`
    /// also removes its edges and its grouping memberships; without `cascade`
    /// a vertex that still has edges is left alone.
    pub fn remove_entity(&mut self, element: &ElementRef, cascade: bool) -> Result<Removal, LayoutError> {
        if !self.has_element(element) {
            return Err(LayoutError::UnknownElement(element.clone()));
        }
        let mut removal = Removal::default();
        let mut provisional = false;
        match element {
            ElementRef::Vertex(id) => {
                let incident = self.incident_edges(id);
                if !cascade && !incident.is_empty() {
                    return Err(LayoutError::IncidentEdges {
                        vertex: id.clone(),
                        count: incident.len(),
                    });
                }
                provisional = self.is_provisional(id);
                for edge_id in incident {
                    removal.edges.extend(self.edges.shift_remove(&edge_id));
                }
                removal.vertices.extend(self.vertices.shift_remove(id));
                for g in self.groupings.values_mut() {
                    g.vertex_ids.shift_remove(id);
                }
                let emptied: Vec<_> = self
                    .groupings
                    .values()
                    .filter(|g| g.vertex_ids.is_empty())
                    .map(|g| g.id.clone())
                    .collect();
                for gid in emptied {
                    removal.groupings.extend(self.groupings.shift_remove(&gid));
                }
            }
            ElementRef::Edge(id) => {
                removal.edges.extend(self.edges.shift_remove(id));
            }
            ElementRef::Grouping(id) => {
                removal.groupings.extend(self.groupings.shift_remove(id));
            }
        }

        let entity_ids: Vec<EntityId> = removal
            .vertices
            .iter()
            .filter_map(|v| v.entity_id.clone())
            .chain(removal.edges.iter().filter_map(|e| e.entity_id.clone()))
            .collect();
        for entity_id in entity_ids {
            if self.entity_in_use(&entity_id) {
                continue;
            }
            if let Some(entity) = self.entities.resolve_entity_reference(&entity_id) {
                self.entities.delete_entity(&entity_id);
                removal.entities.push(entity);
            }
        }

        self.abandon_creations();
        self.revalidate_selection();
        if !provisional {
            self.commit(EntityDelta {
                deleted: removal.entities.clone(),
                ..EntityDelta::default()
            });
        }
        Ok(removal)
    }

    /// Pushes a changed entity through the store and refreshes the vertices
    /// and edges showing it. Positions are left alone.
    pub fn update_entity(&mut self, entity: Entity) -> Result<(), LayoutError> {
        self.apply_entity_update(entity, None)
    }

    /// Like [`GraphLayout::update_entity`] but also moves the entity's vertex.
    pub fn update_entity_with_position(&mut self, entity: Entity, position: Point) -> Result<(), LayoutError> {
        self.apply_entity_update(entity, Some(position))
    }

    fn apply_entity_update(&mut self, entity: Entity, position: Option<Point>) -> Result<(), LayoutError> {
        let before = self.entities.resolve_entity_reference(&entity.id);
        self.entities.update_entity(&entity)?;

        for v in self.vertices.values_mut() {
            if v.entity_id.as_ref() == Some(&entity.id) {
                v.kind = entity.schema.clone();
                v.label = entity.caption().to_string();
                if let Some(p) = position {
                    v.position = p;
                }
            }
        }
        for e in self.edges.values_mut() {
            if e.entity_id.as_ref() == Some(&entity.id) {
                e.label = entity.caption().to_string();
            }
        }

        let delta = match before {
            Some(before) => EntityDelta {
                updated: vec![EntityUpdate {
                    before,
                    after: entity,
                }],
                ..EntityDelta::default()
            },
            None => EntityDelta::created(entity),
        };
        self.commit(delta);
        Ok(())
    }
}
