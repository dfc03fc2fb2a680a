//! Sign icon images and the URL-keyed cache in front of the host loader.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IconError {
    #[error("icon has no url")]
    MissingUrl,
    #[error("failed to decode icon: {0}")]
    Decode(String),
    #[error("failed to fetch icon: {0}")]
    Fetch(String),
}

/// Decoded straight-alpha RGBA8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct IconImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<Vec<u8>>,
}

impl IconImage {
    /// Wrap raw pixels, checking the buffer matches the dimensions.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, IconError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(IconError::Decode(format!(
                "expected {expected} bytes for {width}x{height}, got {}",
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba: Arc::new(rgba),
        })
    }
}

/// Starts an asynchronous image fetch. The host reports the outcome back
/// through `SurfaceManager::icon_loaded`.
pub trait IconLoader {
    fn start_load(&mut self, url: &str);
}

/// Loader that only records requested urls. Clones share the queue.
#[derive(Debug, Clone, Default)]
pub struct QueuedIconLoader {
    pending: Rc<RefCell<Vec<String>>>,
}

impl QueuedIconLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Urls requested since the last call.
    pub fn take_pending(&self) -> Vec<String> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }
}

impl IconLoader for QueuedIconLoader {
    fn start_load(&mut self, url: &str) {
        self.pending.borrow_mut().push(url.to_string());
    }
}

#[derive(Debug, Clone)]
enum IconEntry {
    Pending,
    Ready(IconImage),
}

/// Lazily loaded icons keyed by url.
pub struct IconCache {
    entries: HashMap<String, IconEntry>,
    loader: Box<dyn IconLoader>,
}

impl IconCache {
    pub fn new(loader: Box<dyn IconLoader>) -> Self {
        Self {
            entries: HashMap::new(),
            loader,
        }
    }

    /// The decoded icon, or `None` while it loads. A miss starts exactly
    /// one load per url.
    pub fn request(&mut self, url: &str) -> Option<&IconImage> {
        if !self.entries.contains_key(url) {
            log::debug!("loading icon {}", url);
            self.entries.insert(url.to_string(), IconEntry::Pending);
            self.loader.start_load(url);
        }
        match self.entries.get(url) {
            Some(IconEntry::Ready(image)) => Some(image),
            _ => None,
        }
    }

    /// Record a finished load. Returns `true` if the icon became drawable.
    ///
    /// Failures evict the entry so the next request retries.
    pub fn resolve(&mut self, url: &str, result: Result<IconImage, IconError>) -> bool {
        match result {
            Ok(image) => {
                let was_pending = matches!(self.entries.get(url), Some(IconEntry::Pending));
                if !was_pending {
                    log::debug!("ignoring unrequested icon {}", url);
                    return false;
                }
                self.entries.insert(url.to_string(), IconEntry::Ready(image));
                true
            }
            Err(e) => {
                log::warn!("icon {} failed: {}", url, e);
                self.entries.remove(url);
                false
            }
        }
    }

    pub fn is_pending(&self, url: &str) -> bool {
        matches!(self.entries.get(url), Some(IconEntry::Pending))
    }

    pub fn is_ready(&self, url: &str) -> bool {
        matches!(self.entries.get(url), Some(IconEntry::Ready(_)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for IconCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}
