//! Event types carried on the bus.

use crate::geo::GeoPoint;
use crate::shapes::{Shape, ShapeId};

/// Named topic of an [`EditorEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    ShapeComplete,
    SelectionChange,
    ShapeMove,
    ShapeUpdate,
    ShapeDelete,
    ViewportChanged,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::ShapeComplete => "shape:complete",
            Topic::SelectionChange => "selection:change",
            Topic::ShapeMove => "shape:move",
            Topic::ShapeUpdate => "shape:update",
            Topic::ShapeDelete => "shape:delete",
            Topic::ViewportChanged => "viewport:changed",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to the map viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportChange {
    /// Request to move the map center (published by the pan tool).
    Recenter(GeoPoint),
    Move,
    Zoom,
    Rotate,
    Pitch,
    Resize,
}

/// Editing intent published by tools.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// A tool finished drawing a new shape.
    ShapeComplete(Shape),
    /// The selection moved to another shape, or was cleared.
    SelectionChange(Option<ShapeId>),
    /// A shape was dragged; carries the translated shape.
    ShapeMove(Shape),
    /// A shape was resized, rotated or edited; carries the new shape.
    ShapeUpdate(Shape),
    ShapeDelete(ShapeId),
    ViewportChanged(ViewportChange),
}

impl EditorEvent {
    pub fn topic(&self) -> Topic {
        match self {
            EditorEvent::ShapeComplete(_) => Topic::ShapeComplete,
            EditorEvent::SelectionChange(_) => Topic::SelectionChange,
            EditorEvent::ShapeMove(_) => Topic::ShapeMove,
            EditorEvent::ShapeUpdate(_) => Topic::ShapeUpdate,
            EditorEvent::ShapeDelete(_) => Topic::ShapeDelete,
            EditorEvent::ViewportChanged(_) => Topic::ViewportChanged,
        }
    }
}
