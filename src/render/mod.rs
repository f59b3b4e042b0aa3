//! Map rendering.
//!
//! One linear pipeline: reproject the ZIP points and the state boundary,
//! compose a basemap around the boundary, frame the figure on the state's
//! viewport, draw basemap, boundary and markers, write the PNG.

pub mod canvas;
pub mod style;

pub use canvas::Canvas;
pub use style::{blend, parse_color, MapStyle, Palette};

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::bbox::{get_bounding_box, Viewport};
use crate::boundaries::{load_state_polygon, StatePolygon};
use crate::config::Config;
use crate::error::{Result, StatemapError};
use crate::framing::framing_for;
use crate::logging::{log_error, log_operation_end, log_operation_start};
use crate::projection::Crs;
use crate::tiles::{extent_with_buffer, Basemap, TileSource};
use crate::zips::{get_state_zips, ZipLocations};

/// Inputs and settings for one render
pub struct RenderContext<'a> {
    pub boundaries_path: PathBuf,
    pub bbox_path: PathBuf,
    pub output_path: PathBuf,
    pub width: u32,
    pub max_zoom: u8,
    pub max_tiles: usize,
    pub style: MapStyle,
    pub tiles: &'a dyn TileSource,
}

impl<'a> RenderContext<'a> {
    pub fn from_config(config: &Config, tiles: &'a dyn TileSource) -> Self {
        Self {
            boundaries_path: config.inputs.states_shapefile.clone(),
            bbox_path: config.inputs.bbox_csv.clone(),
            output_path: config.output.path.clone(),
            width: config.output.width,
            max_zoom: config.tiles.max_zoom,
            max_tiles: config.tiles.max_tiles,
            style: config.style.clone(),
            tiles,
        }
    }
}

/// Summary of a written map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedMap {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub zoom: u8,
    pub markers: usize,
    pub viewport: Viewport,
}

/// Render `state` with its ZIP `points` and write the PNG.
///
/// `points` may be in either reference system; they are reprojected before
/// drawing. The boundary shapefile and bounding-box table are read on every
/// call.
pub fn create_map(state: &str, points: &ZipLocations, ctx: &RenderContext) -> Result<RenderedMap> {
    let start = Instant::now();
    log_operation_start("create_map", Some(state));

    let result = load_state_polygon(state, &ctx.boundaries_path)
        .and_then(|polygon| draw_map(state, points, &polygon, ctx));

    if let Err(error) = &result {
        log_error(error, "create_map");
    }
    log_operation_end("create_map", start, result.is_ok());
    result
}

/// Render with an already-loaded boundary
pub fn draw_map(
    state: &str,
    points: &ZipLocations,
    polygon: &StatePolygon,
    ctx: &RenderContext,
) -> Result<RenderedMap> {
    let points = points.to_crs(Crs::WebMercator)?;
    let polygon = polygon.to_crs(Crs::WebMercator)?;
    let palette = ctx.style.palette()?;

    let framing = framing_for(state);
    let bounds = polygon
        .bounding_rect()
        .ok_or_else(|| StatemapError::ImageGeneration {
            message: format!("Boundary for {} has no vertices", state),
        })?;
    let extent = extent_with_buffer(bounds, framing.extent_buffer);
    debug!(
        state = state,
        extent_buffer = framing.extent_buffer,
        extent = ?extent,
        "Basemap extent"
    );

    let basemap = Basemap::compose(ctx.tiles, extent, ctx.width, ctx.max_zoom, ctx.max_tiles)?;

    // The viewport, not the basemap extent, decides the final frame
    let viewport = get_bounding_box(state, &ctx.bbox_path)?;

    let mut canvas = Canvas::new(viewport, ctx.width, palette.background)?;
    canvas.draw_basemap(&basemap);
    canvas.draw_polygon(
        &polygon,
        palette.polygon_fill,
        palette.polygon_edge,
        ctx.style.polygon_alpha,
        ctx.style.edge_width,
    )?;
    let markers = canvas.draw_markers(
        &points,
        palette.marker,
        ctx.style.marker_alpha,
        ctx.style.marker_size,
    )?;
    canvas.save_png(&ctx.output_path)?;

    info!(
        state = state,
        path = %ctx.output_path.display(),
        width = canvas.width(),
        height = canvas.height(),
        zoom = basemap.zoom,
        markers = markers,
        zip_codes = points.len(),
        "Map written"
    );

    Ok(RenderedMap {
        path: ctx.output_path.clone(),
        width: canvas.width(),
        height: canvas.height(),
        zoom: basemap.zoom,
        markers,
        viewport,
    })
}

/// Locate the ZIP codes for `zip_state` and render `state`
pub fn render_state(
    state: &str,
    zip_state: &str,
    zip_csv: &Path,
    ctx: &RenderContext,
) -> Result<RenderedMap> {
    let points = get_state_zips(zip_state, zip_csv)?;
    info!(
        state = state,
        zip_state = zip_state,
        zip_codes = points.len(),
        "ZIP codes located"
    );
    create_map(state, &points, ctx)
}
