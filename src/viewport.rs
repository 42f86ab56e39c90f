use crate::layout::GraphLayout;
use crate::model::{EdgeId, GroupingId, Point, Rect, Rgba, VertexId};

pub const VISUAL_LABEL_THRESHOLD: f64 = 1.5;
pub const WINDOWING_THRESHOLD: f64 = 1.3;
pub const GROUPING_PADDING: f64 = 1.0;

/// Grid/pixel transform and the visual constants the layout depends on.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
    pub grid_unit: f64,
    pub ratio: f64,
    pub vertex_radius: f64,
    pub grouping_padding: f64,
    pub snap_to_grid: bool,
    pub visual_label_threshold: f64,
    pub windowing_threshold: f64,
    pub history_limit: usize,
    pub default_vertex_color: Rgba,
    pub colors: Vec<Rgba>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            grid_unit: 10.0,
            ratio: 1.0,
            vertex_radius: crate::model::DEFAULT_VERTEX_RADIUS,
            grouping_padding: GROUPING_PADDING,
            snap_to_grid: true,
            visual_label_threshold: VISUAL_LABEL_THRESHOLD,
            windowing_threshold: WINDOWING_THRESHOLD,
            history_limit: 200,
            default_vertex_color: Rgba::default(),
            colors: default_palette(),
        }
    }
}

pub fn default_palette() -> Vec<Rgba> {
    vec![
        Rgba::rgb(0x1f, 0x77, 0xb4),
        Rgba::rgb(0xff, 0x7f, 0x0e),
        Rgba::rgb(0x2c, 0xa0, 0x2c),
        Rgba::rgb(0xd6, 0x27, 0x28),
        Rgba::rgb(0x94, 0x67, 0xbd),
        Rgba::rgb(0x8c, 0x56, 0x4b),
        Rgba::rgb(0xe3, 0x77, 0xc2),
        Rgba::rgb(0x7f, 0x7f, 0x7f),
        Rgba::rgb(0xbc, 0xbd, 0x22),
        Rgba::rgb(0x17, 0xbe, 0xcf),
    ]
}

impl LayoutConfig {
    /// Pixels per grid unit.
    pub fn scale(&self) -> f64 {
        self.grid_unit * self.ratio
    }

    pub fn grid_to_pixel(&self, p: Point) -> Point {
        p * self.scale()
    }

    pub fn pixel_to_grid(&self, p: Point) -> Point {
        let s = self.scale();
        Point::new(p.x / s, p.y / s)
    }

    pub fn snap_position(&self, p: Point) -> Point {
        Point::new(p.x.round(), p.y.round())
    }

    /// Palette colour for the `index`-th grouping.
    pub fn grouping_color(&self, index: usize) -> Rgba {
        if self.colors.is_empty() {
            return self.default_vertex_color;
        }
        self.colors[index % self.colors.len()]
    }
}

/// The visible window, in grid units, and the current zoom.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub zoom_level: f64,
    pub view_box: Rect,
}

impl Viewport {
    pub fn new(zoom_level: f64, view_box: Rect) -> Self {
        Self {
            zoom_level,
            view_box,
        }
    }

    /// Viewport of `size_px` pixels centred on `center` (grid units).
    pub fn centered(config: &LayoutConfig, center: Point, size_px: Point, zoom_level: f64) -> Self {
        let half = config.pixel_to_grid(size_px * (0.5 / zoom_level));
        Self {
            zoom_level,
            view_box: Rect::from_min_max(center - half, center + half),
        }
    }

    pub fn is_visual_label_redundant(&self, config: &LayoutConfig) -> bool {
        self.zoom_level > config.visual_label_threshold
    }

    pub fn is_worth_windowing(&self, config: &LayoutConfig) -> bool {
        self.zoom_level < config.windowing_threshold
    }
}

/// What the view should draw for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderPlan {
    pub label_redundant: bool,
    pub windowing: bool,
    pub vertices: Vec<VertexId>,
    pub edges: Vec<EdgeId>,
    pub groupings: Vec<GroupingId>,
}

impl RenderPlan {
    pub fn build(layout: &GraphLayout, viewport: &Viewport) -> Self {
        let config = layout.config();
        let windowing = viewport.is_worth_windowing(config);
        let view = viewport.view_box;
        let vertices = layout.vertex_map();

        let visible_vertices = layout
            .get_vertices()
            .into_iter()
            .filter(|v| !v.hidden)
            .filter(|v| !windowing || view.contains(v.position))
            .map(|v| v.id.clone())
            .collect();

        let edges = layout
            .get_edges()
            .into_iter()
            .filter(|e| !e.hidden)
            .filter_map(|e| {
                let rect = e.segment_rect(vertices)?;
                let endpoint_hidden = [&e.source_id, &e.target_id]
                    .into_iter()
                    .any(|id| vertices.get(id).is_none_or(|v| v.hidden));
                if endpoint_hidden || (windowing && !view.overlaps(rect)) {
                    return None;
                }
                Some(e.id.clone())
            })
            .collect();

        let groupings = layout
            .get_render_groupings()
            .into_iter()
            .filter(|g| {
                !windowing
                    || g.bounding_rect(vertices, config.grouping_padding)
                        .is_some_and(|r| view.overlaps(r))
            })
            .map(|g| g.id.clone())
            .collect();

        Self {
            label_redundant: viewport.is_visual_label_redundant(config),
            windowing,
            vertices: visible_vertices,
            edges,
            groupings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, Vertex};

    #[test]
    fn transform_scales_by_grid_unit_and_ratio() {
        let config = LayoutConfig {
            grid_unit: 10.0,
            ratio: 2.0,
            ..LayoutConfig::default()
        };
        assert_eq!(config.grid_to_pixel(Point::new(1.5, -2.0)), Point::new(30.0, -40.0));
        assert_eq!(config.pixel_to_grid(Point::new(30.0, -40.0)), Point::new(1.5, -2.0));
    }

    #[test]
    fn thresholds_leave_a_band_with_neither_behaviour() {
        let config = LayoutConfig::default();
        let at = |zoom| Viewport::new(zoom, Rect::default());
        assert!(at(1.0).is_worth_windowing(&config));
        assert!(!at(1.0).is_visual_label_redundant(&config));
        assert!(!at(1.4).is_worth_windowing(&config));
        assert!(!at(1.4).is_visual_label_redundant(&config));
        assert!(at(2.0).is_visual_label_redundant(&config));
    }

    #[test]
    fn windowing_culls_outside_elements() {
        let mut layout = GraphLayout::new();
        layout.add_vertex(Vertex::new("in", "in", Point::new(1.0, 1.0)));
        layout.add_vertex(Vertex::new("out", "out", Point::new(50.0, 50.0)));
        layout.add_vertex(Vertex::new("far", "far", Point::new(60.0, 50.0)));
        layout.add_edge(Edge::new("crossing", "in", "out"));
        layout.add_edge(Edge::new("outside", "out", "far"));

        let view = Rect::from_min_max(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let plan = RenderPlan::build(&layout, &Viewport::new(1.0, view));
        assert!(plan.windowing);
        assert_eq!(plan.vertices, vec![VertexId::from("in")]);
        assert_eq!(plan.edges, vec![EdgeId::from("crossing")]);

        let plan = RenderPlan::build(&layout, &Viewport::new(1.4, view));
        assert!(!plan.windowing);
        assert_eq!(plan.vertices.len(), 3);
        assert_eq!(plan.edges.len(), 2);
    }

    #[test]
    fn hidden_vertices_hide_their_edges() {
        let mut layout = GraphLayout::new();
        let mut hidden = Vertex::new("h", "h", Point::new(0.0, 0.0));
        hidden.hidden = true;
        layout.add_vertex(hidden);
        layout.add_vertex(Vertex::new("v", "v", Point::new(1.0, 0.0)));
        layout.add_edge(Edge::new("e", "h", "v"));

        let plan = RenderPlan::build(&layout, &Viewport::new(2.0, Rect::default()));
        assert!(plan.label_redundant);
        assert_eq!(plan.vertices, vec![VertexId::from("v")]);
        assert!(plan.edges.is_empty());
    }
}
