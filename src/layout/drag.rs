use indexmap::IndexMap;
use tracing::{debug, trace};

use super::GraphLayout;
use crate::entity::EntityDelta;
use crate::model::{Point, VertexId};

/// An in-flight drag: where each dragged vertex started and the net
/// displacement so far.
#[derive(Clone, Debug)]
pub(super) struct DragGesture {
    origins: IndexMap<VertexId, Point>,
    net: Point,
}

impl DragGesture {
    /// Where `id` stood when the gesture started, if it is being dragged.
    pub(super) fn origin(&self, id: &VertexId) -> Option<Point> {
        self.origins.get(id).copied()
    }
}

impl GraphLayout {
    /// Moves the selection by `offset` grid units without committing.
    ///
    /// With `initial_position` set, `offset` is read as the current pointer
    /// position and the displacement is measured from `initial_position`.
    pub fn drag_selection(&mut self, offset: Point, initial_position: Option<Point>) {
        if !offset.is_finite() || initial_position.is_some_and(|p| !p.is_finite()) {
            return;
        }
        if self.drag.is_none() {
            let origins: IndexMap<VertexId, Point> = self
                .selected_vertex_ids()
                .into_iter()
                .filter_map(|id| self.vertices.get(&id).map(|v| (id, v.position)))
                .collect();
            if origins.is_empty() {
                return;
            }
            self.drag = Some(DragGesture {
                origins,
                net: Point::ZERO,
            });
        }
        let Some(gesture) = self.drag.as_mut() else {
            return;
        };
        gesture.net = match initial_position {
            Some(start) => offset - start,
            None => gesture.net + offset,
        };
        for (id, origin) in &gesture.origins {
            if let Some(v) = self.vertices.get_mut(id) {
                v.position = *origin + gesture.net;
            }
        }
        trace!(x = gesture.net.x, y = gesture.net.y, "dragging selection");
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Ends the drag. Returns whether the gesture moved anything and was
    /// committed.
    pub fn drop_selection(&mut self) -> bool {
        let Some(gesture) = self.drag.take() else {
            return false;
        };
        if gesture.net.approx_eq(Point::ZERO) {
            self.put_back(&gesture);
            return false;
        }
        let snap = self.config.snap_to_grid;
        let mut moved = false;
        for (id, origin) in &gesture.origins {
            let Some(v) = self.vertices.get_mut(id) else {
                continue;
            };
            if snap {
                v.position = self.config.snap_position(v.position);
            }
            if !v.position.approx_eq(*origin) {
                v.fixed = true;
                moved = true;
            }
        }
        if !moved {
            self.put_back(&gesture);
            return false;
        }
        debug!(vertices = gesture.origins.len(), "dropped selection");
        self.commit(EntityDelta::default());
        true
    }

    /// Abandons the drag and restores the positions it started from.
    pub fn cancel_drag(&mut self) {
        if let Some(gesture) = self.drag.take() {
            self.put_back(&gesture);
        }
    }

    fn put_back(&mut self, gesture: &DragGesture) {
        for (id, origin) in &gesture.origins {
            if let Some(v) = self.vertices.get_mut(id) {
                v.position = *origin;
            }
        }
    }
}
