use tracing::warn;

use super::GraphLayout;
use crate::entity::EntityDelta;
use crate::model::{ElementRef, Grouping, GroupingId, Rect, VertexId};

impl GraphLayout {
    pub(super) fn insert_grouping(&mut self, mut grouping: Grouping) -> bool {
        if self.groupings.contains_key(&grouping.id) {
            warn!(id = %grouping.id, "grouping id already in use, keeping the original");
            return false;
        }
        let missing: Vec<VertexId> = grouping
            .vertex_ids
            .iter()
            .filter(|id| !self.vertices.contains_key(*id))
            .cloned()
            .collect();
        for id in &missing {
            warn!(grouping = %grouping.id, vertex = %id, "dropping missing grouping member");
            grouping.vertex_ids.shift_remove(id);
        }
        if grouping.vertex_ids.is_empty() {
            warn!(id = %grouping.id, "dropping grouping without members");
            return false;
        }
        self.groupings.insert(grouping.id.clone(), grouping);
        true
    }

    pub fn add_grouping(&mut self, grouping: Grouping) -> bool {
        if !self.insert_grouping(grouping) {
            return false;
        }
        self.commit(EntityDelta::default());
        true
    }

    /// Groups the selected vertices. Needs at least two of them.
    pub fn group_selection(&mut self, label: impl Into<String>) -> Option<GroupingId> {
        let members = self.selected_vertex_ids();
        if members.len() < 2 {
            return None;
        }
        let color = self.config.grouping_color(self.groupings.len());
        let mut grouping = Grouping::new(GroupingId::generate(), members, color);
        grouping.label = label.into();
        let id = grouping.id.clone();
        self.groupings.insert(id.clone(), grouping);
        self.selection.insert(ElementRef::Grouping(id.clone()));
        self.commit(EntityDelta::default());
        Some(id)
    }

    /// Destroys a grouping; its vertices stay.
    pub fn remove_grouping(&mut self, id: &GroupingId) -> Option<Grouping> {
        let removed = self.groupings.shift_remove(id)?;
        self.revalidate_selection();
        self.commit(EntityDelta::default());
        Some(removed)
    }

    pub fn get_render_groupings(&self) -> Vec<&Grouping> {
        self.groupings
            .values()
            .filter(|g| g.is_renderable(&self.vertices))
            .collect()
    }

    pub fn grouping_bounding_rect(&self, id: &GroupingId) -> Option<Rect> {
        self.groupings
            .get(id)?
            .bounding_rect(&self.vertices, self.config.grouping_padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Point, Rgba, Vertex};

    fn layout() -> GraphLayout {
        let mut layout = GraphLayout::new();
        for (id, x, y) in [("a", 0.0, 0.0), ("b", 3.0, 4.0), ("c", -2.0, 1.0)] {
            layout.add_vertex(Vertex::new(id, id, Point::new(x, y)));
        }
        layout
    }

    #[test]
    fn single_vertex_cannot_be_grouped() {
        let mut layout = layout();
        layout.select_element([VertexId::from("a")], false);
        assert!(layout.group_selection("solo").is_none());
        assert!(layout.get_groupings().is_empty());
    }

    #[test]
    fn grouping_selection_assigns_palette_colour() {
        let mut layout = layout();
        layout.select_element([VertexId::from("a"), VertexId::from("b")], false);
        let id = layout.group_selection("pair").unwrap();
        let g = layout.grouping(&id).unwrap();
        assert_eq!(g.vertex_ids.len(), 2);
        assert_eq!(g.label, "pair");
        assert_eq!(g.color, layout.config().grouping_color(0));
        assert!(layout.is_grouping_selected(&id));

        let rect = layout.grouping_bounding_rect(&id).unwrap();
        assert_eq!(rect.min, Point::new(-1.5, -1.5));
        assert_eq!(rect.max, Point::new(4.5, 5.5));
    }

    #[test]
    fn bounding_rect_follows_member_moves() {
        let mut layout = layout();
        layout.add_grouping(Grouping::new(
            "g",
            [VertexId::from("a"), VertexId::from("c")],
            Rgba::default(),
        ));
        let before = layout.grouping_bounding_rect(&"g".into()).unwrap();
        layout.select_element([VertexId::from("a")], false);
        layout.drag_selection(Point::new(10.0, 0.0), None);
        let after = layout.grouping_bounding_rect(&"g".into()).unwrap();
        assert_eq!(after.max.x, before.max.x + 10.0);
    }

    #[tracing_test::traced_test]
    #[test]
    fn missing_members_are_pruned() {
        let mut layout = layout();
        assert!(layout.add_grouping(Grouping::new(
            "g",
            [VertexId::from("a"), VertexId::from("ghost")],
            Rgba::default(),
        )));
        assert_eq!(layout.grouping(&"g".into()).unwrap().vertex_ids.len(), 1);
        assert!(layout.get_render_groupings().is_empty());
        assert!(logs_contain("dropping missing grouping member"));
    }

    #[test]
    fn removing_grouping_keeps_vertices() {
        let mut layout = layout();
        layout.select_element([VertexId::from("a"), VertexId::from("b")], false);
        let id = layout.group_selection("").unwrap();
        assert!(layout.remove_grouping(&id).is_some());
        assert_eq!(layout.get_vertices().len(), 3);
        assert!(!layout.selection().contains(&ElementRef::Grouping(id)));
    }
}
