use std::fmt;
use std::sync::{Arc, Weak};

use log::{debug, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier a loader hands out for every texture it creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub u64);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("unable to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("request for {url} failed: {message}")]
    Http { url: String, message: String },
    #[error("unable to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
}

impl TextureImage {
    pub fn decode(bytes: &[u8]) -> Result<Self, TextureError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            pixels: Arc::from(rgba.into_raw().into_boxed_slice()),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextureState {
    Loading,
    Ready(TextureImage),
    /// The load failed; the texture stays blank.
    Failed(String),
    Disposed,
}

#[derive(Debug)]
struct TextureSlot {
    state: TextureState,
    version: u64,
}

/// Handle to an image that may still be arriving.
///
/// Clones share the same slot, so a completed load is visible through every
/// handle. `version` bumps whenever the image changes.
#[derive(Debug, Clone)]
pub struct Texture {
    id: TextureId,
    source: Arc<str>,
    slot: Arc<RwLock<TextureSlot>>,
}

impl Texture {
    fn pending(id: TextureId, source: &str) -> Self {
        Self {
            id,
            source: Arc::from(source),
            slot: Arc::new(RwLock::new(TextureSlot {
                state: TextureState::Loading,
                version: 0,
            })),
        }
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn state(&self) -> TextureState {
        self.slot.read().state.clone()
    }

    pub fn image(&self) -> Option<TextureImage> {
        match &self.slot.read().state {
            TextureState::Ready(image) => Some(image.clone()),
            _ => None,
        }
    }

    pub fn version(&self) -> u64 {
        self.slot.read().version
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self.slot.read().state, TextureState::Disposed)
    }

    /// Releases the image. Returns `false` if it was already disposed.
    pub fn dispose(&self) -> bool {
        let mut slot = self.slot.write();
        if matches!(slot.state, TextureState::Disposed) {
            return false;
        }
        slot.state = TextureState::Disposed;
        slot.version += 1;
        true
    }

    fn downgrade(&self) -> PendingTexture {
        PendingTexture {
            id: self.id,
            source: Arc::clone(&self.source),
            slot: Arc::downgrade(&self.slot),
        }
    }
}

impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

/// What a load holds on to while it runs. Weak, so an abandoned texture can
/// be freed before its load finishes.
struct PendingTexture {
    id: TextureId,
    source: Arc<str>,
    slot: Weak<RwLock<TextureSlot>>,
}

impl PendingTexture {
    fn complete(self, result: Result<TextureImage, TextureError>) {
        let Some(slot) = self.slot.upgrade() else {
            debug!("{} ({}) dropped before its load finished", self.id, self.source);
            return;
        };
        let mut slot = slot.write();
        if !matches!(slot.state, TextureState::Loading) {
            debug!("discarding late load for {} ({})", self.id, self.source);
            return;
        }
        slot.state = match result {
            Ok(image) => {
                debug!(
                    "loaded {} ({}) {}x{}",
                    self.id, self.source, image.width, image.height
                );
                TextureState::Ready(image)
            }
            Err(err) => {
                warn!("failed to load texture {}: {err}", self.source);
                TextureState::Failed(err.to_string())
            }
        };
        slot.version += 1;
    }
}

/// Source of raw image bytes.
pub trait TextureFetcher: Send + Sync {
    fn fetch(&self, source: &str) -> Result<Vec<u8>, TextureError>;
}

/// Reads plain paths from disk and fetches `http(s)://` sources.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFetcher;

#[cfg(not(target_arch = "wasm32"))]
impl TextureFetcher for DefaultFetcher {
    fn fetch(&self, source: &str) -> Result<Vec<u8>, TextureError> {
        if is_remote(source) {
            let response = ureq::get(source).call().map_err(|err| TextureError::Http {
                url: source.to_string(),
                message: err.to_string(),
            })?;
            let mut bytes = Vec::new();
            std::io::Read::read_to_end(&mut response.into_reader(), &mut bytes).map_err(
                |err| TextureError::Http {
                    url: source.to_string(),
                    message: err.to_string(),
                },
            )?;
            Ok(bytes)
        } else {
            std::fs::read(source).map_err(|source_err| TextureError::Io {
                path: source.to_string(),
                source: source_err,
            })
        }
    }
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Starts asynchronous image loads and hands back placeholder textures.
///
/// Natively each load runs on its own thread through the configured
/// [`TextureFetcher`]. In the browser loads are spawned on the page's event
/// loop and go through `fetch` unless a fetcher was supplied.
pub struct TextureLoader {
    #[cfg(not(target_arch = "wasm32"))]
    fetcher: Arc<dyn TextureFetcher>,
    #[cfg(target_arch = "wasm32")]
    fetcher: Option<Arc<dyn TextureFetcher>>,
    next_id: u64,
    #[cfg(not(target_arch = "wasm32"))]
    pending: Vec<std::thread::JoinHandle<()>>,
}

impl Default for TextureLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureLoader {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new() -> Self {
        Self::with_fetcher(Arc::new(DefaultFetcher))
    }

    #[cfg(target_arch = "wasm32")]
    pub fn new() -> Self {
        Self {
            fetcher: None,
            next_id: 0,
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn with_fetcher(fetcher: Arc<dyn TextureFetcher>) -> Self {
        Self {
            fetcher,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn with_fetcher(fetcher: Arc<dyn TextureFetcher>) -> Self {
        Self {
            fetcher: Some(fetcher),
            next_id: 0,
        }
    }

    /// Returns immediately with a texture in the `Loading` state.
    pub fn load(&mut self, source: &str) -> Texture {
        let texture = Texture::pending(TextureId(self.next_id), source);
        self.next_id += 1;
        self.spawn(texture.downgrade());
        texture
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn(&mut self, pending: PendingTexture) {
        let fetcher = Arc::clone(&self.fetcher);
        let name = format!("texture-load-{}", pending.id.0);
        let spawned = std::thread::Builder::new().name(name).spawn(move || {
            let result = fetcher
                .fetch(&pending.source)
                .and_then(|bytes| TextureImage::decode(&bytes));
            pending.complete(result);
        });
        match spawned {
            Ok(handle) => self.pending.push(handle),
            Err(err) => warn!("unable to start texture load thread: {err}"),
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn(&mut self, pending: PendingTexture) {
        let fetcher = self.fetcher.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let bytes = match fetcher {
                Some(fetcher) => fetcher.fetch(&pending.source),
                None => crate::web::fetch_bytes(&pending.source).await,
            };
            let result = bytes.and_then(|bytes| TextureImage::decode(&bytes));
            pending.complete(result);
        });
    }

    /// Blocks until every load started so far has settled.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn join_pending(&mut self) {
        for handle in self.pending.drain(..) {
            if handle.join().is_err() {
                warn!("texture load thread panicked");
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn join_pending(&mut self) {}
}
