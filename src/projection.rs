//! Coordinate reference systems and reprojection.
//!
//! Two systems are in play: geographic longitude/latitude in degrees
//! (EPSG:4326) and spherical pseudo-Mercator in meters (EPSG:3857), the
//! projection used by web tile basemaps. Every drawable geometry is moved to
//! EPSG:3857 before any extent or plotting math happens.

use geo::{Coord, MapCoords, MultiPolygon, Point};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, StatemapError};

/// Sphere radius used by EPSG:3857, in meters
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude at which the square web-mercator world ends
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Half the projected world width, in meters
pub const HALF_WORLD: f64 = std::f64::consts::PI * EARTH_RADIUS;

/// Coordinate reference systems understood by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    /// Longitude/latitude in degrees
    #[serde(rename = "EPSG:4326")]
    Geographic,
    /// Spherical pseudo-Mercator in meters
    #[serde(rename = "EPSG:3857")]
    WebMercator,
}

impl Crs {
    /// EPSG code as used in GIS tooling
    pub fn epsg_code(&self) -> u32 {
        match self {
            Crs::Geographic => 4326,
            Crs::WebMercator => 3857,
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg_code())
    }
}

/// Check that a longitude/latitude pair is finite and on the globe
pub fn validate_lon_lat(lon: f64, lat: f64) -> Result<()> {
    if !lon.is_finite() || !lat.is_finite() {
        return Err(StatemapError::InvalidCoordinates {
            message: format!("Non-finite coordinate ({}, {})", lon, lat),
        });
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(StatemapError::InvalidCoordinates {
            message: format!("Longitude {} is outside -180..180", lon),
        });
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(StatemapError::InvalidCoordinates {
            message: format!("Latitude {} is outside -90..90", lat),
        });
    }
    Ok(())
}

/// Parse a degree value from a text field, naming the field on failure
pub fn parse_degrees(field: &str, raw: &str, context: &str) -> Result<f64> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| StatemapError::InvalidCoordinates {
            message: format!("{}: {} '{}' is not a number", context, field, raw),
        })?;
    if !value.is_finite() {
        return Err(StatemapError::InvalidCoordinates {
            message: format!("{}: {} '{}' is not finite", context, field, raw),
        });
    }
    Ok(value)
}

/// Project a geographic coordinate (x = longitude, y = latitude) to EPSG:3857.
///
/// Latitudes beyond [`MAX_LATITUDE`] are clamped to the edge of the square
/// mercator world, as tile servers do.
pub fn to_web_mercator(coord: Coord<f64>) -> Result<Coord<f64>> {
    validate_lon_lat(coord.x, coord.y)?;

    let lat = coord.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let sin_lat = lat.sin();

    Ok(Coord {
        x: EARTH_RADIUS * coord.x.to_radians(),
        y: EARTH_RADIUS * ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / 2.0,
    })
}

/// Inverse of [`to_web_mercator`]
pub fn to_geographic(coord: Coord<f64>) -> Result<Coord<f64>> {
    if !coord.x.is_finite() || !coord.y.is_finite() {
        return Err(StatemapError::InvalidCoordinates {
            message: format!("Non-finite projected coordinate ({}, {})", coord.x, coord.y),
        });
    }

    let lon = (coord.x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (coord.y / EARTH_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2)
        .to_degrees();

    Ok(Coord { x: lon, y: lat })
}

/// Move a single coordinate between reference systems
pub fn transform(coord: Coord<f64>, from: Crs, to: Crs) -> Result<Coord<f64>> {
    if from == to {
        return Ok(coord);
    }
    match to {
        Crs::WebMercator => to_web_mercator(coord),
        Crs::Geographic => to_geographic(coord),
    }
}

/// Reproject a point
pub fn transform_point(point: Point<f64>, from: Crs, to: Crs) -> Result<Point<f64>> {
    transform(point.0, from, to).map(Point)
}

/// Reproject every vertex of a multipolygon
pub fn transform_multipolygon(
    geometry: &MultiPolygon<f64>,
    from: Crs,
    to: Crs,
) -> Result<MultiPolygon<f64>> {
    if from == to {
        return Ok(geometry.clone());
    }
    match to {
        Crs::WebMercator => geometry.try_map_coords(to_web_mercator),
        Crs::Geographic => geometry.try_map_coords(to_geographic),
    }
}

/// Normalized web-mercator position in `[0, 1]`, origin at the north-west
/// corner, as used for tile addressing
pub fn to_unit_square(coord: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (coord.x + HALF_WORLD) / (2.0 * HALF_WORLD),
        y: (HALF_WORLD - coord.y) / (2.0 * HALF_WORLD),
    }
}

/// Inverse of [`to_unit_square`]
pub fn from_unit_square(coord: Coord<f64>) -> Coord<f64> {
    Coord {
        x: coord.x * 2.0 * HALF_WORLD - HALF_WORLD,
        y: HALF_WORLD - coord.y * 2.0 * HALF_WORLD,
    }
}
