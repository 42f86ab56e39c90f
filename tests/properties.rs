use netdiagram::{GraphLayout, LayoutConfig, Point, Rect, Vertex, VertexId};
use proptest::prelude::*;

fn coord() -> impl Strategy<Value = f64> {
    -1.0e6..1.0e6f64
}

fn point() -> impl Strategy<Value = Point> {
    (coord(), coord()).prop_map(|(x, y)| Point::new(x, y))
}

fn layout_with(points: &[(Point, f64)]) -> GraphLayout {
    let mut layout = GraphLayout::new();
    for (i, (p, r)) in points.iter().enumerate() {
        let mut v = Vertex::new(format!("v{i}"), "", *p);
        v.radius = *r;
        layout.add_vertex(v);
    }
    layout
}

proptest! {
    #[test]
    fn pixel_grid_round_trip(p in point(), grid_unit in 0.1..100.0f64, ratio in 0.25..4.0f64) {
        let config = LayoutConfig { grid_unit, ratio, ..LayoutConfig::default() };
        let back = config.pixel_to_grid(config.grid_to_pixel(p));
        prop_assert!(back.approx_eq(p), "{:?} came back as {:?}", p, back);
    }

    #[test]
    fn area_selection_is_exact(points in prop::collection::vec(point(), 0..30), a in point(), b in point()) {
        let entries: Vec<(Point, f64)> = points.iter().map(|p| (*p, 0.5)).collect();
        let mut layout = layout_with(&entries);
        let rect = Rect::from_min_max(a, b);
        layout.select_area(rect);

        let mut selected: Vec<VertexId> = layout.get_selected_vertices().iter().map(|v| v.id.clone()).collect();
        let mut expected: Vec<VertexId> = layout
            .get_vertices()
            .iter()
            .filter(|v| rect.contains(v.position))
            .map(|v| v.id.clone())
            .collect();
        selected.sort();
        expected.sort();
        prop_assert_eq!(selected, expected);
        prop_assert!(layout.get_selected_edges().is_empty());
    }

    #[test]
    fn grouping_rect_encloses_member_circles(
        members in prop::collection::vec((point(), 0.0..50.0f64), 2..12),
    ) {
        let mut layout = layout_with(&members);
        layout.select_area(Rect::from_min_max(Point::new(-2.0e6, -2.0e6), Point::new(2.0e6, 2.0e6)));
        let id = layout.group_selection("g").unwrap();
        let rect = layout.grouping_bounding_rect(&id).unwrap();
        for v in layout.get_vertices() {
            prop_assert!(rect.contains_rect(v.bounds()));
        }
    }

    #[test]
    fn json_round_trip_preserves_elements(members in prop::collection::vec((point(), 0.1..5.0f64), 0..20)) {
        let layout = layout_with(&members);
        let restored = GraphLayout::from_json(&layout.to_json().unwrap()).unwrap();
        prop_assert_eq!(restored.get_vertices(), layout.get_vertices());
    }
}
