//! AtlasInk Core Library
//!
//! Platform-agnostic engine for drawing geo-referenced annotations on top of
//! a panning, zooming map: shape model, hit-testing, tools, event bus and
//! frame-coalesced redraw.

pub mod config;
pub mod editor;
pub mod events;
pub mod geo;
pub mod geometry;
pub mod painter;
pub mod persist;
pub mod projection;
pub mod render_manager;
pub mod selection;
pub mod shapes;
pub mod surface;
pub mod tools;

#[cfg(test)]
mod test_util;

pub use config::{ConfigError, EngineConfig, StyleConfig};
pub use editor::Editor;
pub use events::{EditorEvent, EventBus, EventFilter, EventReceiver, Topic, ViewportChange};
pub use geo::{GeoPoint, Units, format_distance, measure};
pub use painter::GeoPainter;
pub use persist::{EditorState, PersistError};
pub use projection::{MapView, MercatorViewport, Projection};
pub use render_manager::RenderManager;
pub use selection::{Handle, HandleKind, HandleShape};
pub use shapes::{Shape, ShapeError, ShapeId, ShapeKind, ShapeType};
pub use surface::{
    DrawBackend, FrameScheduler, FrameToken, IconError, IconImage, IconLoader, ManualScheduler,
    QueuedIconLoader, SurfaceManager,
};
pub use tools::{IconDrop, PointerInput, ToolKey, ToolKind, ToolManager};
