//! Headless engine for node-link diagrams: vertices, edges and groupings laid
//! out on a grid, with selection, drag/drop, undo/redo and a bridge to an
//! externally owned entity store.

pub mod entity;
pub mod error;
pub mod layout;
pub mod model;
pub mod settings;
pub mod viewport;

pub use entity::{
    Entity, EntityChange, EntityDelta, EntityDraft, EntityManager, EntityRef, EntityStore,
    EntityUpdate, MemoryEntityStore, Replay,
};
pub use error::{EntityError, LayoutError, SettingsError};
pub use layout::{CreationToken, GraphLayout, History, LayoutSnapshot, LayoutState, Removal};
pub use model::{
    Edge, EdgeId, ElementRef, EntityId, Grouping, GroupingId, Point, Rect, Rgba, Vertex, VertexId,
};
pub use settings::LayoutSettings;
pub use viewport::{LayoutConfig, RenderPlan, Viewport};
