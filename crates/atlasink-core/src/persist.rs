//! Serializable editor state and JSON persistence.

use crate::shapes::{Shape, ShapeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("invalid editor state JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("duplicate shape id {0}")]
    DuplicateId(ShapeId),
}

/// Everything needed to restore a drawing: the ordered shape list and the
/// selected shape id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub selected_shape_id: Option<ShapeId>,
}

impl EditorState {
    pub fn new(shapes: Vec<Shape>, selected_shape_id: Option<ShapeId>) -> Self {
        Self {
            shapes,
            selected_shape_id,
        }
    }

    /// Drop a selection that does not name a shape in the list.
    pub fn sanitized(mut self) -> Self {
        if let Some(id) = self.selected_shape_id {
            if !self.shapes.iter().any(|s| s.id() == id) {
                log::warn!("dropping selection of missing shape {}", id);
                self.selected_shape_id = None;
            }
        }
        self
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and check a saved state.
    ///
    /// Duplicate ids are an error. Shapes that fail validation are kept and
    /// logged so that no user data is lost on load.
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let state: EditorState = serde_json::from_str(json)?;
        let mut seen = HashSet::with_capacity(state.shapes.len());
        for shape in &state.shapes {
            if !seen.insert(shape.id()) {
                return Err(PersistError::DuplicateId(shape.id()));
            }
            if let Err(e) = shape.validate() {
                log::warn!("loaded {} {} is invalid: {}", shape.shape_type(), shape.id(), e);
            }
        }
        Ok(state.sanitized())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
