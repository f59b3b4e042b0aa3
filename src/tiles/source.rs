//! Tile providers and the on-disk tile cache.

use image::RgbaImage;
use once_cell::sync::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::{TileId, TILE_SIZE};
use crate::error::{Result, StatemapError};

/// OpenStreetMap standard tile layer
pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Anything that can hand out basemap tiles
pub trait TileSource {
    /// Fetch one tile as a `TILE_SIZE` square image
    fn fetch(&self, tile: TileId) -> Result<RgbaImage>;

    /// Short identifier, used to keep cached tiles of different providers apart
    fn name(&self) -> &str;
}

impl<T: TileSource + ?Sized> TileSource for &T {
    fn fetch(&self, tile: TileId) -> Result<RgbaImage> {
        (**self).fetch(tile)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Decode tile bytes and bring them to `TILE_SIZE` pixels
fn decode_tile(tile: TileId, bytes: &[u8]) -> Result<RgbaImage> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| StatemapError::TileFetch {
            tile,
            message: format!("Failed to decode tile image: {}", e),
        })?
        .to_rgba8();

    if decoded.width() == TILE_SIZE && decoded.height() == TILE_SIZE {
        Ok(decoded)
    } else {
        // High-DPI providers serve 512px tiles
        Ok(image::imageops::resize(
            &decoded,
            TILE_SIZE,
            TILE_SIZE,
            image::imageops::FilterType::Triangle,
        ))
    }
}

/// Tiles from a `{z}/{x}/{y}` URL template over blocking HTTP
pub struct HttpTileSource {
    url_template: String,
    name: String,
    client: reqwest::blocking::Client,
}

impl HttpTileSource {
    pub fn new(url_template: &str, user_agent: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| StatemapError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            url_template: url_template.to_string(),
            name: provider_name(url_template),
            client,
        })
    }

    /// Concrete URL for a tile
    pub fn url_for(&self, tile: TileId) -> String {
        self.url_template
            .replace("{z}", &tile.z.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }
}

impl TileSource for HttpTileSource {
    fn fetch(&self, tile: TileId) -> Result<RgbaImage> {
        let url = self.url_for(tile);
        let start = Instant::now();

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| StatemapError::TileFetch {
                tile,
                message: format!("Request to {} failed: {}", url, e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StatemapError::TileFetch {
                tile,
                message: format!("{} returned HTTP {}", url, status),
            });
        }

        let bytes = response.bytes().map_err(|e| StatemapError::TileFetch {
            tile,
            message: format!("Failed to read body from {}: {}", url, e),
        })?;

        debug!(
            tile = %tile,
            bytes = bytes.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Fetched tile"
        );

        decode_tile(tile, &bytes)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Directory-safe provider name taken from the template's host
fn provider_name(url_template: &str) -> String {
    let host = reqwest::Url::parse(url_template)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "tiles".to_string());

    host.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Tiles stored as `<root>/<provider>/<z>/<x>/<y>.png`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileCache {
    root: PathBuf,
}

impl TileCache {
    /// Open (and create if needed) a cache rooted at `root`
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, provider: &str, tile: TileId) -> PathBuf {
        self.root
            .join(provider)
            .join(tile.z.to_string())
            .join(tile.x.to_string())
            .join(format!("{}.png", tile.y))
    }

    pub fn load(&self, provider: &str, tile: TileId) -> Option<RgbaImage> {
        let path = self.path_for(provider, tile);
        if !path.exists() {
            return None;
        }
        match image::open(&path) {
            Ok(img) => Some(img.to_rgba8()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable cached tile");
                None
            }
        }
    }

    pub fn store(&self, provider: &str, tile: TileId, image: &RgbaImage) -> Result<()> {
        let path = self.path_for(provider, tile);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        image
            .save_with_format(&path, image::ImageFormat::Png)
            .map_err(|e| StatemapError::ImageGeneration {
                message: format!("Failed to write cached tile {}: {}", path.display(), e),
            })
    }
}

static TILE_CACHE: OnceCell<TileCache> = OnceCell::new();

/// Set up the process-wide tile cache.
///
/// The directory is created on the first call only; later calls return the
/// same cache even when given a different directory.
pub fn init_cache(root: &Path) -> Result<&'static TileCache> {
    let cache = TILE_CACHE.get_or_try_init(|| {
        let cache = TileCache::open(root)?;
        info!(cache_dir = %root.display(), "Tile cache initialized");
        Ok::<_, StatemapError>(cache)
    })?;

    if cache.root() != root {
        warn!(
            requested = %root.display(),
            active = %cache.root().display(),
            "Tile cache already initialized, keeping the existing directory"
        );
    }
    Ok(cache)
}

/// Serve tiles from a [`TileCache`], falling back to an inner source on a miss
pub struct CachedTileSource<'a, S> {
    inner: S,
    cache: &'a TileCache,
}

impl<'a, S: TileSource> CachedTileSource<'a, S> {
    pub fn new(inner: S, cache: &'a TileCache) -> Self {
        Self { inner, cache }
    }
}

impl<S: TileSource> TileSource for CachedTileSource<'_, S> {
    fn fetch(&self, tile: TileId) -> Result<RgbaImage> {
        if let Some(image) = self.cache.load(self.inner.name(), tile) {
            debug!(tile = %tile, "Tile cache hit");
            return Ok(image);
        }

        let image = self.inner.fetch(tile)?;
        self.cache.store(self.inner.name(), tile, &image)?;
        Ok(image)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
