//! AtlasInk Render Library
//!
//! Drawing backends for the core surface manager and headless export.
//! The default backend records a serializable display list; a Vello scene
//! backend is available behind the `vello-renderer` feature.

mod display_list;
mod export;
mod icons;
mod renderer;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use display_list::{DisplayList, DrawCommand};
pub use export::{ExportOptions, export_state};
pub use icons::{decode_icon, load_icon_file, resolve_icon_path};
pub use renderer::{RenderResult, RendererError};

#[cfg(feature = "vello-renderer")]
pub use vello_impl::VelloBackend;
