//! In-memory tile sources so integration tests never touch the network.

use image::{Rgba, RgbaImage};
use std::cell::RefCell;

use statemap::tiles::{TileId, TileSource, TILE_SIZE};
use statemap::{Result, StatemapError};

/// Color every basemap pixel carries in the tests
pub const BASEMAP_COLOR: Rgba<u8> = Rgba([200, 200, 200, 255]);

/// Serves solid tiles and records which tiles were asked for
#[derive(Default)]
pub struct SolidTileSource {
    pub requested: RefCell<Vec<TileId>>,
}

impl TileSource for SolidTileSource {
    fn fetch(&self, tile: TileId) -> Result<RgbaImage> {
        self.requested.borrow_mut().push(tile);
        Ok(RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, BASEMAP_COLOR))
    }

    fn name(&self) -> &str {
        "solid"
    }
}

/// A provider that is always down
pub struct UnreachableTileSource;

impl TileSource for UnreachableTileSource {
    fn fetch(&self, tile: TileId) -> Result<RgbaImage> {
        Err(StatemapError::TileFetch {
            tile,
            message: "connection refused".to_string(),
        })
    }

    fn name(&self) -> &str {
        "unreachable"
    }
}
