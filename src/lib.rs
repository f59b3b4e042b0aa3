//! # statemap
//!
//! Render a single U.S. state, overlaid with its ZIP-code centroids, on an
//! OpenStreetMap basemap and write the result as a PNG.
//!
//! ## Pipeline
//!
//! - **ZIP locator** ([`zips`]): filter the ZIP table to one state and build
//!   a point collection in geographic coordinates
//! - **Bounding-box calculator** ([`bbox`]): look up the state's box, pad it
//!   (or use the Alaska/Hawaii literals from [`framing`]) and project it to a
//!   web-mercator viewport
//! - **Renderer** ([`render`]): reproject boundary and points, stitch the
//!   basemap from [`tiles`], frame on the viewport and draw
//!
//! Everything drawn is in EPSG:3857 first; see [`projection`].

pub mod bbox;
pub mod boundaries;
pub mod config;
pub mod error;
pub mod framing;
pub mod logging;
pub mod projection;
pub mod render;
pub mod tiles;
pub mod zips;

pub use bbox::{get_bounding_box, BoundingBoxTable, StateBoundingBox, Viewport};
pub use boundaries::{load_state_polygon, StatePolygon};
pub use config::{Config, Target};
pub use error::{Result, StatemapError};
pub use framing::{framing_for, GeoBounds, PaddingRule, StateFraming};
pub use logging::{
    generate_run_id, init_tracing, log_data_load_stats, log_error, log_operation_end,
    log_operation_start, log_timed_operation,
};
pub use projection::Crs;
pub use render::{create_map, render_state, RenderContext, RenderedMap};
pub use zips::{get_state_zips, ZipLocations, ZipPoint, ZipRecord};
