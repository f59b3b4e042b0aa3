//! Basemap tiles.
//!
//! Tiles follow the OpenStreetMap slippy-map scheme: at zoom `z` the square
//! web-mercator world is cut into `2^z × 2^z` tiles of 256 pixels, numbered
//! from the north-west corner.

pub mod basemap;
pub mod source;

pub use basemap::{extent_with_buffer, Basemap};
pub use source::{
    init_cache, CachedTileSource, HttpTileSource, TileCache, TileSource, DEFAULT_TILE_URL,
};

use geo::{coord, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, StatemapError};
use crate::projection::{from_unit_square, to_unit_square, HALF_WORLD};

/// Edge length of a tile in pixels
pub const TILE_SIZE: u32 = 256;

/// Highest zoom level OpenStreetMap serves
pub const MAX_ZOOM: u8 = 19;

/// Address of a single tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Projected bounds of this tile in EPSG:3857 meters
    pub fn bounds(&self) -> Rect<f64> {
        let n = (1u64 << self.z) as f64;
        let nw = from_unit_square(coord! { x: self.x as f64 / n, y: self.y as f64 / n });
        let se = from_unit_square(coord! {
            x: (self.x + 1) as f64 / n,
            y: (self.y + 1) as f64 / n,
        });
        Rect::new(nw, se)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Inclusive block of tiles at one zoom level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub z: u8,
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl TileRange {
    /// Tiles covering a projected rectangle at zoom `z`
    pub fn covering(extent: Rect<f64>, z: u8) -> Self {
        let n = 1u64 << z;
        let last = (n - 1) as u32;
        // Max edges are exclusive so an extent ending on a tile border does
        // not pull in the next row or column
        let first = |unit: f64| ((unit * n as f64).floor().max(0.0) as u32).min(last);
        let end = |unit: f64| (((unit * n as f64).ceil() - 1.0).max(0.0) as u32).min(last);

        let nw = to_unit_square(coord! { x: extent.min().x, y: extent.max().y });
        let se = to_unit_square(coord! { x: extent.max().x, y: extent.min().y });

        let (x_min, y_min) = (first(nw.x), first(nw.y));
        Self {
            z,
            x_min,
            x_max: end(se.x).max(x_min),
            y_min,
            y_max: end(se.y).max(y_min),
        }
    }

    pub fn columns(&self) -> u32 {
        self.x_max - self.x_min + 1
    }

    pub fn rows(&self) -> u32 {
        self.y_max - self.y_min + 1
    }

    pub fn len(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major iteration from the north-west tile
    pub fn iter(&self) -> impl Iterator<Item = TileId> + '_ {
        (self.y_min..=self.y_max)
            .flat_map(move |y| (self.x_min..=self.x_max).map(move |x| TileId::new(self.z, x, y)))
    }

    /// Projected bounds of the whole block
    pub fn bounds(&self) -> Rect<f64> {
        let nw = TileId::new(self.z, self.x_min, self.y_min).bounds();
        let se = TileId::new(self.z, self.x_max, self.y_max).bounds();
        Rect::new(
            coord! { x: nw.min().x, y: se.min().y },
            coord! { x: se.max().x, y: nw.max().y },
        )
    }
}

/// Smallest zoom at which `extent` spans at least `width_px` pixels
pub fn zoom_for_extent(extent: Rect<f64>, width_px: u32, max_zoom: u8) -> Result<u8> {
    if width_px == 0 {
        return Err(StatemapError::InvalidParameter {
            param: "width".to_string(),
            message: "Basemap width must be positive".to_string(),
        });
    }

    let unit_width = extent.width() / (2.0 * HALF_WORLD);
    if !unit_width.is_finite() || unit_width <= 0.0 {
        return Ok(max_zoom);
    }

    let zoom = (width_px as f64 / (unit_width * TILE_SIZE as f64)).log2().ceil();
    Ok(zoom.clamp(0.0, max_zoom as f64) as u8)
}
