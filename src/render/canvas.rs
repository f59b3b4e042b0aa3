//! Raster canvas framed on a projected viewport.
//!
//! Pixel (0, 0) is the north-west corner of the viewport. Overlays are
//! rasterized into a coverage mask first and blended once, so overlapping
//! edges of one layer never stack their opacity.

use geo::{Coord, LineString, Polygon};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use std::fs;
use std::path::Path;

use super::style::blend;
use crate::bbox::Viewport;
use crate::boundaries::StatePolygon;
use crate::error::{Result, StatemapError};
use crate::projection::Crs;
use crate::tiles::Basemap;
use crate::zips::ZipLocations;

/// Largest edge the canvas accepts, in pixels
pub const MAX_DIMENSION: u32 = 16_384;

/// Pixel coordinates are kept well inside `i32`
const PIXEL_LIMIT: f64 = 1.0e8;

const COVERED: Luma<u8> = Luma([255]);
const UNCOVERED: Luma<u8> = Luma([0]);

fn ensure_web_mercator(found: Crs) -> Result<()> {
    if found == Crs::WebMercator {
        Ok(())
    } else {
        Err(StatemapError::CrsMismatch {
            expected: Crs::WebMercator,
            found,
        })
    }
}

pub struct Canvas {
    image: RgbaImage,
    viewport: Viewport,
}

impl Canvas {
    /// A canvas `width` pixels wide; the height follows the viewport's aspect
    pub fn new(viewport: Viewport, width: u32, background: Rgba<u8>) -> Result<Self> {
        if !viewport.is_valid() {
            return Err(StatemapError::ImageGeneration {
                message: format!("Degenerate viewport {:?}", viewport.as_array()),
            });
        }

        let height = (width as f64 * viewport.height() / viewport.width()).round() as u32;
        if width == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(StatemapError::ImageGeneration {
                message: format!(
                    "Canvas size {}x{} is outside 1..={}",
                    width, height, MAX_DIMENSION
                ),
            });
        }

        Ok(Self {
            image: RgbaImage::from_pixel(width, height.max(1), background),
            viewport,
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Projected coordinate to fractional pixel position
    pub fn to_pixel(&self, c: Coord<f64>) -> (f64, f64) {
        let px = (c.x - self.viewport.x_min) / self.viewport.width() * self.width() as f64;
        let py = (self.viewport.y_max - c.y) / self.viewport.height() * self.height() as f64;
        (
            px.clamp(-PIXEL_LIMIT, PIXEL_LIMIT),
            py.clamp(-PIXEL_LIMIT, PIXEL_LIMIT),
        )
    }

    /// Projected coordinate of a pixel's center
    pub fn to_world(&self, px: u32, py: u32) -> Coord<f64> {
        Coord {
            x: self.viewport.x_min + (px as f64 + 0.5) / self.width() as f64 * self.viewport.width(),
            y: self.viewport.y_max
                - (py as f64 + 0.5) / self.height() as f64 * self.viewport.height(),
        }
    }

    /// Paint every pixel the basemap covers; the rest keeps the background
    pub fn draw_basemap(&mut self, basemap: &Basemap) {
        for py in 0..self.height() {
            for px in 0..self.width() {
                if let Some(color) = basemap.sample(self.to_world(px, py)) {
                    self.image.put_pixel(px, py, color);
                }
            }
        }
    }

    fn empty_mask(&self) -> GrayImage {
        GrayImage::new(self.width(), self.height())
    }

    /// Blend `color` into every covered pixel of `mask`
    fn blend_mask(&mut self, mask: &GrayImage, color: Rgba<u8>, alpha: f32) {
        for (px, py, coverage) in mask.enumerate_pixels() {
            if coverage[0] == 0 {
                continue;
            }
            let t = alpha * coverage[0] as f32 / 255.0;
            let pixel = self.image.get_pixel_mut(px, py);
            *pixel = blend(*pixel, color, t);
        }
    }

    /// Ring vertices in pixel space, ready for `draw_polygon_mut`
    fn ring_points(&self, ring: &LineString<f64>) -> Option<Vec<Point<i32>>> {
        let mut points: Vec<Point<i32>> = Vec::with_capacity(ring.0.len());
        for c in ring.coords() {
            let (px, py) = self.to_pixel(*c);
            let p = Point::new(px.round() as i32, py.round() as i32);
            if points.last() != Some(&p) {
                points.push(p);
            }
        }
        // imageproc expects an open ring
        while points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        (points.len() >= 3).then_some(points)
    }

    fn is_off_canvas(&self, polygon: &Polygon<f64>) -> bool {
        use geo::BoundingRect;
        match polygon.bounding_rect() {
            Some(rect) => {
                rect.max().x < self.viewport.x_min
                    || rect.min().x > self.viewport.x_max
                    || rect.max().y < self.viewport.y_min
                    || rect.min().y > self.viewport.y_max
            }
            None => true,
        }
    }

    fn rasterize_polygon(&self, mask: &mut GrayImage, polygon: &Polygon<f64>) {
        let Some(exterior) = self.ring_points(polygon.exterior()) else {
            return;
        };

        if polygon.interiors().is_empty() {
            draw_polygon_mut(mask, &exterior, COVERED);
            return;
        }

        // Holes are cut from a scratch mask so they cannot erase neighbours
        let mut scratch = self.empty_mask();
        draw_polygon_mut(&mut scratch, &exterior, COVERED);
        for hole in polygon.interiors() {
            if let Some(points) = self.ring_points(hole) {
                draw_polygon_mut(&mut scratch, &points, UNCOVERED);
            }
        }
        for (px, py, coverage) in scratch.enumerate_pixels() {
            if coverage[0] > 0 {
                mask.put_pixel(px, py, COVERED);
            }
        }
    }

    fn rasterize_ring_edges(&self, mask: &mut GrayImage, ring: &LineString<f64>, width: u32) {
        let offsets: Vec<f32> = (0..width.max(1))
            .map(|i| i as f32 - (width.max(1) - 1) as f32 / 2.0)
            .collect();

        for line in ring.lines() {
            let (x0, y0) = self.to_pixel(line.start);
            let (x1, y1) = self.to_pixel(line.end);
            for &dx in &offsets {
                for &dy in &offsets {
                    draw_line_segment_mut(
                        mask,
                        (x0 as f32 + dx, y0 as f32 + dy),
                        (x1 as f32 + dx, y1 as f32 + dy),
                        COVERED,
                    );
                }
            }
        }
    }

    /// Fill and outline a state boundary
    pub fn draw_polygon(
        &mut self,
        polygon: &StatePolygon,
        fill: Rgba<u8>,
        edge: Rgba<u8>,
        alpha: f32,
        edge_width: u32,
    ) -> Result<()> {
        ensure_web_mercator(polygon.crs)?;

        let mut fill_mask = self.empty_mask();
        let mut edge_mask = self.empty_mask();
        for part in polygon.boundary.iter().filter(|p| !self.is_off_canvas(p)) {
            self.rasterize_polygon(&mut fill_mask, part);
            self.rasterize_ring_edges(&mut edge_mask, part.exterior(), edge_width);
            for hole in part.interiors() {
                self.rasterize_ring_edges(&mut edge_mask, hole, edge_width);
            }
        }

        self.blend_mask(&fill_mask, fill, alpha);
        self.blend_mask(&edge_mask, edge, alpha);
        Ok(())
    }

    /// Downward triangle markers centred on each point.
    ///
    /// Markers partly outside the frame are clipped, not skipped. Returns how
    /// many markers reached the canvas.
    pub fn draw_markers(
        &mut self,
        points: &ZipLocations,
        color: Rgba<u8>,
        alpha: f32,
        size: u32,
    ) -> Result<usize> {
        ensure_web_mercator(points.crs())?;

        let s = size.max(1) as f64;
        let mut mask = self.empty_mask();
        let mut drawn = 0;

        for zip in points.iter() {
            let (cx, cy) = self.to_pixel(zip.point.0);
            let triangle = [
                Point::new((cx - s).round() as i32, (cy - s * 0.6).round() as i32),
                Point::new((cx + s).round() as i32, (cy - s * 0.6).round() as i32),
                Point::new(cx.round() as i32, (cy + s).round() as i32),
            ];
            if !self.overlaps(&triangle) {
                continue;
            }
            draw_polygon_mut(&mut mask, &triangle, COVERED);
            drawn += 1;
        }

        self.blend_mask(&mask, color, alpha);
        Ok(drawn)
    }

    /// Whether the bounding box of `points` touches any canvas pixel
    fn overlaps(&self, points: &[Point<i32>]) -> bool {
        let (w, h) = (self.width() as i32, self.height() as i32);
        let x_min = points.iter().map(|p| p.x).min();
        let x_max = points.iter().map(|p| p.x).max();
        let y_min = points.iter().map(|p| p.y).min();
        let y_max = points.iter().map(|p| p.y).max();
        match (x_min, x_max, y_min, y_max) {
            (Some(x_min), Some(x_max), Some(y_min), Some(y_max)) => {
                x_max >= 0 && x_min < w && y_max >= 0 && y_min < h
            }
            _ => false,
        }
    }

    /// Write the canvas as PNG, replacing any existing file
    pub fn save_png(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| StatemapError::ImageGeneration {
                message: format!("Failed to write PNG {}: {}", path.display(), e),
            })
    }
}
