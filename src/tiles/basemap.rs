//! Stitching tiles into one basemap image.

use geo::{coord, Coord, Rect};
use image::{Rgba, RgbaImage};
use std::time::Instant;
use tracing::{debug, info};

use super::{zoom_for_extent, TileRange, TileSource, TILE_SIZE};
use crate::error::{Result, StatemapError};
use crate::projection::HALF_WORLD;

/// Grow a projected rectangle by `buffer_percent` of its width/height on
/// every side, clamped to the web-mercator world
pub fn extent_with_buffer(bounds: Rect<f64>, buffer_percent: f64) -> Rect<f64> {
    let dx = bounds.width() * buffer_percent / 100.0;
    let dy = bounds.height() * buffer_percent / 100.0;
    let clamp = |v: f64| v.clamp(-HALF_WORLD, HALF_WORLD);

    Rect::new(
        coord! { x: clamp(bounds.min().x - dx), y: clamp(bounds.min().y - dy) },
        coord! { x: clamp(bounds.max().x + dx), y: clamp(bounds.max().y + dy) },
    )
}

/// A stitched block of tiles and the projected area it covers
#[derive(Debug, Clone)]
pub struct Basemap {
    pub image: RgbaImage,
    pub bounds: Rect<f64>,
    pub zoom: u8,
}

impl Basemap {
    /// Fetch and stitch the tiles covering `extent` at a zoom where the
    /// extent is about `width_px` pixels wide.
    ///
    /// When that zoom needs more than `max_tiles` tiles, coarser zooms are
    /// tried until the grid fits. Fails without fetching anything only when
    /// even zoom 0 is over the limit.
    pub fn compose(
        source: &dyn TileSource,
        extent: Rect<f64>,
        width_px: u32,
        max_zoom: u8,
        max_tiles: usize,
    ) -> Result<Self> {
        let target_zoom = zoom_for_extent(extent, width_px, max_zoom)?;

        let mut zoom = target_zoom;
        let mut range = TileRange::covering(extent, zoom);
        while range.len() > max_tiles && zoom > 0 {
            zoom -= 1;
            range = TileRange::covering(extent, zoom);
        }

        if range.len() > max_tiles {
            return Err(StatemapError::InvalidParameter {
                param: "max_tiles".to_string(),
                message: format!(
                    "Basemap needs {} tiles even at zoom 0, limit is {}",
                    range.len(),
                    max_tiles
                ),
            });
        }
        if zoom < target_zoom {
            debug!(
                target_zoom = target_zoom,
                zoom = zoom,
                max_tiles = max_tiles,
                "Lowered basemap zoom to stay within the tile limit"
            );
        }

        let start = Instant::now();
        let mut image = RgbaImage::new(range.columns() * TILE_SIZE, range.rows() * TILE_SIZE);

        for tile in range.iter() {
            let tile_image = source.fetch(tile)?;
            let x = ((tile.x - range.x_min) * TILE_SIZE) as i64;
            let y = ((tile.y - range.y_min) * TILE_SIZE) as i64;
            image::imageops::replace(&mut image, &tile_image, x, y);
        }

        info!(
            provider = source.name(),
            zoom = zoom,
            tiles = range.len(),
            width = image.width(),
            height = image.height(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Basemap composed"
        );
        debug!(range = ?range, "Basemap tile range");

        Ok(Self {
            image,
            bounds: range.bounds(),
            zoom,
        })
    }

    /// Basemap color at a projected coordinate, `None` outside the basemap
    pub fn sample(&self, c: Coord<f64>) -> Option<Rgba<u8>> {
        let fx = (c.x - self.bounds.min().x) / self.bounds.width();
        let fy = (self.bounds.max().y - c.y) / self.bounds.height();
        if !(0.0..1.0).contains(&fx) || !(0.0..1.0).contains(&fy) {
            return None;
        }

        let px = (fx * self.image.width() as f64) as u32;
        let py = (fy * self.image.height() as f64) as u32;
        Some(*self.image.get_pixel(px, py))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::TileId;

    /// Each tile filled with a color encoding its column and row
    struct GridSource;

    impl TileSource for GridSource {
        fn fetch(&self, tile: TileId) -> Result<RgbaImage> {
            Ok(RgbaImage::from_pixel(
                TILE_SIZE,
                TILE_SIZE,
                Rgba([tile.x as u8, tile.y as u8, tile.z, 255]),
            ))
        }

        fn name(&self) -> &str {
            "grid"
        }
    }

    #[test]
    fn test_extent_with_buffer() {
        let bounds = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 100.0, y: 50.0 });
        let padded = extent_with_buffer(bounds, 20.0);
        assert_eq!(padded.min(), coord! { x: -20.0, y: -10.0 });
        assert_eq!(padded.max(), coord! { x: 120.0, y: 60.0 });

        let tight = extent_with_buffer(bounds, 0.01);
        assert!((tight.min().x - -0.01).abs() < 1e-9);
    }

    #[test]
    fn test_extent_clamped_to_world() {
        let world = TileId::new(0, 0, 0).bounds();
        let padded = extent_with_buffer(world, 20.0);
        assert!((padded.width() - world.width()).abs() < 1e-6);
    }

    #[test]
    fn test_compose_world_at_zoom_one() {
        let world = TileId::new(0, 0, 0).bounds();
        let basemap = Basemap::compose(&GridSource, world, 512, 19, 16).unwrap();

        assert_eq!(basemap.zoom, 1);
        assert_eq!(basemap.image.dimensions(), (512, 512));
        assert_eq!(basemap.image.get_pixel(10, 10).0, [0, 0, 1, 255]);
        assert_eq!(basemap.image.get_pixel(300, 10).0, [1, 0, 1, 255]);
        assert_eq!(basemap.image.get_pixel(300, 300).0, [1, 1, 1, 255]);

        // South-east quadrant of the world is tile (1, 1)
        let se = coord! { x: HALF_WORLD / 2.0, y: -HALF_WORLD / 2.0 };
        assert_eq!(basemap.sample(se).unwrap().0, [1, 1, 1, 255]);
    }

    #[test]
    fn test_compose_lowers_zoom_to_fit_tile_limit() {
        // 4096px across the world asks for zoom 4 (256 tiles)
        let world = TileId::new(0, 0, 0).bounds();
        let basemap = Basemap::compose(&GridSource, world, 4096, 19, 4).unwrap();
        assert_eq!(basemap.zoom, 1);
        assert_eq!(basemap.image.dimensions(), (512, 512));
    }

    #[test]
    fn test_compose_tall_extent_within_limit() {
        // Narrow and tall: the width-derived zoom needs many rows
        let extent = Rect::new(
            coord! { x: 0.0, y: -HALF_WORLD / 2.0 },
            coord! { x: HALF_WORLD / 64.0, y: HALF_WORLD / 2.0 },
        );
        let target = zoom_for_extent(extent, 1000, 19).unwrap();
        assert!(TileRange::covering(extent, target).len() > 64);

        let basemap = Basemap::compose(&GridSource, extent, 1000, 19, 64).unwrap();
        assert!(basemap.zoom < target);
        assert!(TileRange::covering(extent, basemap.zoom).len() <= 64);
    }

    #[test]
    fn test_compose_fails_when_zoom_zero_exceeds_limit() {
        let world = TileId::new(0, 0, 0).bounds();
        let err = Basemap::compose(&GridSource, world, 512, 19, 0).unwrap_err();
        assert!(matches!(err, StatemapError::InvalidParameter { .. }));
    }

    #[test]
    fn test_sample_outside_is_none() {
        let tile = TileId::new(2, 1, 1);
        let basemap = Basemap::compose(&GridSource, tile.bounds(), 256, 2, 4).unwrap();
        assert!(basemap.sample(coord! { x: HALF_WORLD * 0.9, y: 0.0 }).is_none());
    }
}
