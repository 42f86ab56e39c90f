use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

/// Tolerance used for geometric equality checks.
pub const EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn approx_eq(self, other: Point) -> bool {
        (self.x - other.x).abs() <= EPSILON * self.x.abs().max(other.x.abs()).max(1.0)
            && (self.y - other.y).abs() <= EPSILON * self.y.abs().max(other.y.abs()).max(1.0)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle. Containment and overlap are closed on both axes.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub fn from_min_max(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn from_center_radius(center: Point, radius: f64) -> Self {
        let r = Point::new(radius, radius);
        Self {
            min: center - r,
            max: center + r,
        }
    }

    pub fn width(self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(self) -> Point {
        Point::new((self.min.x + self.max.x) * 0.5, (self.min.y + self.max.y) * 0.5)
    }

    pub fn contains(self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn contains_rect(self, other: Rect) -> bool {
        self.contains(other.min) && self.contains(other.max)
    }

    pub fn overlaps(self, other: Rect) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    pub fn union(self, other: Rect) -> Rect {
        Rect {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn expand(self, amount: f64) -> Rect {
        let d = Point::new(amount, amount);
        Rect {
            min: self.min - d,
            max: self.max + d,
        }
    }
}

/// Colour stored as straight RGBA, serialized as `#rrggbb` or `#rrggbbaa`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: channel(6)?,
            }),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::rgb(30, 30, 30)
    }
}

impl TryFrom<String> for Rgba {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgba::from_hex(&value).ok_or_else(|| format!("invalid colour `{value}`"))
    }
}

impl From<Rgba> for String {
    fn from(value: Rgba) -> Self {
        value.to_hex()
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Fresh random id; never collides with an id handed out earlier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(VertexId);
string_id!(EdgeId);
string_id!(GroupingId);
string_id!(
    /// Id of a domain entity owned by the external entity store.
    EntityId
);

/// A reference to one element of the layout, used by the selection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ElementRef {
    Vertex(VertexId),
    Edge(EdgeId),
    Grouping(GroupingId),
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementRef::Vertex(id) => write!(f, "vertex {id}"),
            ElementRef::Edge(id) => write!(f, "edge {id}"),
            ElementRef::Grouping(id) => write!(f, "grouping {id}"),
        }
    }
}

impl From<VertexId> for ElementRef {
    fn from(value: VertexId) -> Self {
        ElementRef::Vertex(value)
    }
}

impl From<EdgeId> for ElementRef {
    fn from(value: EdgeId) -> Self {
        ElementRef::Edge(value)
    }
}

impl From<GroupingId> for ElementRef {
    fn from(value: GroupingId) -> Self {
        ElementRef::Grouping(value)
    }
}

pub const DEFAULT_VERTEX_RADIUS: f64 = 0.5;

/// A positioned node. Position is in grid units.
#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    pub id: VertexId,
    pub entity_id: Option<EntityId>,
    pub kind: String,
    pub label: String,
    pub position: Point,
    pub color: Rgba,
    pub radius: f64,
    pub fixed: bool,
    pub hidden: bool,
}

impl Vertex {
    pub fn new(id: impl Into<VertexId>, label: impl Into<String>, position: Point) -> Self {
        Self {
            id: id.into(),
            entity_id: None,
            kind: String::new(),
            label: label.into(),
            position,
            color: Rgba::default(),
            radius: DEFAULT_VERTEX_RADIUS,
            fixed: false,
            hidden: false,
        }
    }

    /// Bounding box of the circle drawn for this vertex.
    pub fn bounds(&self) -> Rect {
        Rect::from_center_radius(self.position, self.radius)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub source_id: VertexId,
    pub target_id: VertexId,
    pub directed: bool,
    pub label: String,
    pub label_position: Option<Point>,
    pub hidden: bool,
    pub entity_id: Option<EntityId>,
}

impl Edge {
    pub fn new(
        id: impl Into<EdgeId>,
        source_id: impl Into<VertexId>,
        target_id: impl Into<VertexId>,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            directed: true,
            label: String::new(),
            label_position: None,
            hidden: false,
            entity_id: None,
        }
    }

    pub fn is_incident(&self, vertex: &VertexId) -> bool {
        &self.source_id == vertex || &self.target_id == vertex
    }

    /// Bounding rectangle of the segment between the resolved endpoints.
    pub fn segment_rect(&self, vertices: &IndexMap<VertexId, Vertex>) -> Option<Rect> {
        let source = vertices.get(&self.source_id)?;
        let target = vertices.get(&self.target_id)?;
        Some(Rect::from_min_max(source.position, target.position))
    }
}

/// A named, coloured set of vertices dragged and selected as one unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Grouping {
    pub id: GroupingId,
    pub vertex_ids: IndexSet<VertexId>,
    pub color: Rgba,
    pub label: String,
}

impl Grouping {
    pub fn new(
        id: impl Into<GroupingId>,
        vertex_ids: impl IntoIterator<Item = VertexId>,
        color: Rgba,
    ) -> Self {
        Self {
            id: id.into(),
            vertex_ids: vertex_ids.into_iter().collect(),
            color,
            label: String::new(),
        }
    }

    pub fn live_members<'a>(
        &'a self,
        vertices: &'a IndexMap<VertexId, Vertex>,
    ) -> impl Iterator<Item = &'a Vertex> + 'a {
        self.vertex_ids.iter().filter_map(|id| vertices.get(id))
    }

    /// Groupings are only drawn once they hold two live members.
    pub fn is_renderable(&self, vertices: &IndexMap<VertexId, Vertex>) -> bool {
        self.live_members(vertices).nth(1).is_some()
    }

    /// Smallest axis-aligned rectangle covering every member's circle, grown by
    /// `padding`. Computed from current positions on every call.
    pub fn bounding_rect(
        &self,
        vertices: &IndexMap<VertexId, Vertex>,
        padding: f64,
    ) -> Option<Rect> {
        self.live_members(vertices)
            .map(Vertex::bounds)
            .reduce(Rect::union)
            .map(|r| r.expand(padding))
    }
}
