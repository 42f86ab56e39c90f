use serde::{Deserialize, Serialize};
use tracing::info;

use super::GraphLayout;
use crate::entity::EntityManager;
use crate::error::LayoutError;
use crate::model::{
    DEFAULT_VERTEX_RADIUS, Edge, EdgeId, EntityId, Grouping, GroupingId, Point, Rgba, Vertex,
    VertexId,
};
use crate::viewport::LayoutConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexRecord {
    pub id: VertexId,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub label: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub color: Rgba,
    #[serde(default = "default_radius")]
    pub radius: f64,
    #[serde(default)]
    pub fixed: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub entity_id: Option<EntityId>,
}

fn default_radius() -> f64 {
    DEFAULT_VERTEX_RADIUS
}

fn default_directed() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    pub id: EdgeId,
    pub source_id: VertexId,
    pub target_id: VertexId,
    #[serde(default = "default_directed")]
    pub directed: bool,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub label_x: Option<f64>,
    #[serde(default)]
    pub label_y: Option<f64>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<EntityId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingRecord {
    pub id: GroupingId,
    pub vertex_ids: Vec<VertexId>,
    #[serde(default)]
    pub color: Rgba,
    #[serde(default)]
    pub label: String,
}

/// Serializable form of a layout. Pixel coordinates are never stored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    #[serde(default)]
    pub vertices: Vec<VertexRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
    #[serde(default)]
    pub groupings: Vec<GroupingRecord>,
}

impl From<&Vertex> for VertexRecord {
    fn from(v: &Vertex) -> Self {
        Self {
            id: v.id.clone(),
            kind: v.kind.clone(),
            label: v.label.clone(),
            x: v.position.x,
            y: v.position.y,
            color: v.color,
            radius: v.radius,
            fixed: v.fixed,
            hidden: v.hidden,
            entity_id: v.entity_id.clone(),
        }
    }
}

impl From<VertexRecord> for Vertex {
    fn from(r: VertexRecord) -> Self {
        Self {
            id: r.id,
            entity_id: r.entity_id,
            kind: r.kind,
            label: r.label,
            position: Point::new(r.x, r.y),
            color: r.color,
            radius: r.radius,
            fixed: r.fixed,
            hidden: r.hidden,
        }
    }
}

impl From<&Edge> for EdgeRecord {
    fn from(e: &Edge) -> Self {
        Self {
            id: e.id.clone(),
            source_id: e.source_id.clone(),
            target_id: e.target_id.clone(),
            directed: e.directed,
            label: e.label.clone(),
            label_x: e.label_position.map(|p| p.x),
            label_y: e.label_position.map(|p| p.y),
            hidden: e.hidden,
            entity_id: e.entity_id.clone(),
        }
    }
}

impl From<EdgeRecord> for Edge {
    fn from(r: EdgeRecord) -> Self {
        let label_position = match (r.label_x, r.label_y) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        };
        Self {
            id: r.id,
            source_id: r.source_id,
            target_id: r.target_id,
            directed: r.directed,
            label: r.label,
            label_position,
            hidden: r.hidden,
            entity_id: r.entity_id,
        }
    }
}

impl From<&Grouping> for GroupingRecord {
    fn from(g: &Grouping) -> Self {
        Self {
            id: g.id.clone(),
            vertex_ids: g.vertex_ids.iter().cloned().collect(),
            color: g.color,
            label: g.label.clone(),
        }
    }
}

impl From<GroupingRecord> for Grouping {
    fn from(r: GroupingRecord) -> Self {
        let mut g = Grouping::new(r.id, r.vertex_ids, r.color);
        g.label = r.label;
        g
    }
}

impl GraphLayout {
    /// Committed elements as a snapshot; provisional vertices are left out.
    pub fn to_snapshot(&self) -> LayoutSnapshot {
        let state = self.state();
        LayoutSnapshot {
            vertices: state.vertices.values().map(VertexRecord::from).collect(),
            edges: state.edges.values().map(EdgeRecord::from).collect(),
            groupings: state.groupings.values().map(GroupingRecord::from).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, LayoutError> {
        Ok(serde_json::to_string_pretty(&self.to_snapshot())?)
    }

    /// Replaces the layout contents with `snapshot`. Dangling edges, missing
    /// grouping members and duplicate ids are dropped with a warning. Selection
    /// and history start fresh.
    pub fn load_snapshot(&mut self, snapshot: LayoutSnapshot) {
        self.vertices.clear();
        self.edges.clear();
        self.groupings.clear();
        self.selection.clear();
        self.abandon_creations();
        self.drag = None;

        let (vertex_count, edge_count, grouping_count) = (
            snapshot.vertices.len(),
            snapshot.edges.len(),
            snapshot.groupings.len(),
        );
        for record in snapshot.vertices {
            self.insert_vertex(record.into());
        }
        for record in snapshot.edges {
            self.insert_edge(record.into());
        }
        for record in snapshot.groupings {
            self.insert_grouping(record.into());
        }
        info!(
            vertices = self.vertices.len(),
            edges = self.edges.len(),
            groupings = self.groupings.len(),
            pruned = vertex_count + edge_count + grouping_count
                - self.vertices.len()
                - self.edges.len()
                - self.groupings.len(),
            "loaded layout snapshot"
        );
        self.reset_history();
    }

    pub fn load_json(&mut self, data: &str) -> Result<(), LayoutError> {
        let snapshot: LayoutSnapshot = serde_json::from_str(data)?;
        self.load_snapshot(snapshot);
        Ok(())
    }

    pub fn from_json(data: &str) -> Result<Self, LayoutError> {
        Self::from_json_with(data, LayoutConfig::default(), EntityManager::new())
    }

    pub fn from_json_with(
        data: &str,
        config: LayoutConfig,
        entities: EntityManager,
    ) -> Result<Self, LayoutError> {
        let mut layout = Self::with_parts(config, entities);
        layout.load_json(data)?;
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tracing_test::traced_test]
    #[test]
    fn dangling_references_are_pruned_on_load() {
        let data = r##"{
            "vertices": [
                {"id": "a", "type": "Person", "label": "A", "x": 0, "y": 0, "color": "#ff0000"},
                {"id": "a", "label": "dup", "x": 9, "y": 9},
                {"id": "b", "x": 2.5, "y": -1}
            ],
            "edges": [
                {"id": "ab", "sourceId": "a", "targetId": "b", "labelX": 1, "labelY": 2},
                {"id": "ax", "sourceId": "a", "targetId": "x"}
            ],
            "groupings": [
                {"id": "g", "vertexIds": ["a", "b", "x"], "color": "#00ff00", "label": "G"}
            ]
        }"##;
        let layout = GraphLayout::from_json(data).unwrap();
        assert_eq!(layout.get_vertices().len(), 2);
        assert_eq!(layout.vertex(&"a".into()).unwrap().label, "A");
        assert_eq!(layout.get_edges().len(), 1);
        assert_eq!(
            layout.edge(&"ab".into()).unwrap().label_position,
            Some(Point::new(1.0, 2.0))
        );
        assert_eq!(layout.grouping(&"g".into()).unwrap().vertex_ids.len(), 2);
        assert!(layout.history().is_empty());
        assert!(logs_contain("dropping edge with missing endpoint"));
        assert!(logs_contain("vertex id already in use"));
    }

    #[test]
    fn coordinates_survive_json_exactly() {
        let mut layout = GraphLayout::new();
        layout.add_vertex(Vertex::new("a", "A", Point::new(-930039.7635799367, 915014.532569486)));
        let restored = GraphLayout::from_json(&layout.to_json().unwrap()).unwrap();
        assert_eq!(
            restored.vertex(&"a".into()).unwrap().position,
            Point::new(-930039.7635799367, 915014.532569486)
        );
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            GraphLayout::from_json("{\"vertices\": 3}"),
            Err(LayoutError::Snapshot(_))
        ));
    }

    #[test]
    fn records_use_flat_camel_case_fields() {
        let mut layout = GraphLayout::new();
        let mut v = Vertex::new("a", "A", Point::new(1.0, 2.0));
        v.entity_id = Some("ent".into());
        layout.add_vertex(v);
        let json: serde_json::Value = serde_json::from_str(&layout.to_json().unwrap()).unwrap();
        let record = &json["vertices"][0];
        assert_eq!(record["x"], 1.0);
        assert_eq!(record["entityId"], "ent");
        assert_eq!(record["type"], "");
        assert!(record.get("position").is_none());
    }
}
