use indexmap::IndexSet;

use super::GraphLayout;
use crate::entity::EntityDelta;
use crate::model::{Point, VertexId};

#[derive(Clone, Debug, PartialEq)]
pub struct ForceNode {
    pub id: VertexId,
    pub radius: f64,
    pub fixed: bool,
    /// Position the physics engine must not move, when pinning is requested.
    pub pinned: Option<Point>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForceLink {
    pub source: VertexId,
    pub target: VertexId,
}

/// Input for an external force-directed layout pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositioningInput {
    pub nodes: Vec<ForceNode>,
    pub links: Vec<ForceLink>,
    pub grouping_links: Vec<ForceLink>,
    pub center: Point,
}

impl GraphLayout {
    /// Visible vertices as physics nodes, edges between them as links, and a
    /// link for every ordered pair of grouping members so groups stay together.
    pub fn positioning_input(&self, maintain_fixed: bool, center: Option<Point>) -> PositioningInput {
        let visible: IndexSet<&VertexId> = self
            .vertices
            .values()
            .filter(|v| !v.hidden)
            .map(|v| &v.id)
            .collect();

        let center = center.unwrap_or_else(|| {
            let n = self.vertices.len().max(1) as f64;
            let sum = self
                .vertices
                .values()
                .fold(Point::ZERO, |acc, v| acc + v.position);
            sum * (1.0 / n)
        });

        let nodes = self
            .vertices
            .values()
            .filter(|v| !v.hidden)
            .map(|v| ForceNode {
                id: v.id.clone(),
                radius: v.radius,
                fixed: v.fixed,
                pinned: (maintain_fixed && v.fixed).then_some(v.position),
            })
            .collect();

        let links = self
            .edges
            .values()
            .filter(|e| visible.contains(&e.source_id) && visible.contains(&e.target_id))
            .map(|e| ForceLink {
                source: e.source_id.clone(),
                target: e.target_id.clone(),
            })
            .collect();

        let mut grouping_links = Vec::new();
        for g in self.groupings.values() {
            let members: Vec<&VertexId> = g
                .vertex_ids
                .iter()
                .filter(|id| visible.contains(id))
                .collect();
            for a in &members {
                for b in &members {
                    if a != b {
                        grouping_links.push(ForceLink {
                            source: (*a).clone(),
                            target: (*b).clone(),
                        });
                    }
                }
            }
        }

        PositioningInput {
            nodes,
            links,
            grouping_links,
            center,
        }
    }

    /// Writes positions computed by an external layout pass and commits them.
    /// Unknown ids and non-finite positions are skipped; returns how many
    /// vertices moved.
    pub fn apply_positions<I>(&mut self, positions: I) -> usize
    where
        I: IntoIterator<Item = (VertexId, Point)>,
    {
        let mut moved = 0;
        for (id, position) in positions {
            if !position.is_finite() {
                continue;
            }
            if let Some(v) = self.vertices.get_mut(&id) {
                if !v.position.approx_eq(position) {
                    v.position = position;
                    moved += 1;
                }
            }
        }
        if moved > 0 {
            self.commit(EntityDelta::default());
        }
        moved
    }
}
