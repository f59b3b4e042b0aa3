//! Colors and drawing style for the map overlays.

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatemapError};

/// Parse a color name or `#rrggbb` hex string into an opaque RGBA value
pub fn parse_color(value: &str) -> Result<Rgba<u8>> {
    let rgb = match value.trim().to_lowercase().as_str() {
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        "red" => [255, 0, 0],
        "green" => [0, 128, 0],
        "blue" => [0, 0, 255],
        "orange" => [255, 165, 0],
        "yellow" => [255, 255, 0],
        "gray" | "grey" => [128, 128, 128],
        hex if hex.starts_with('#') && hex.len() == 7 => {
            let channel = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16).map_err(|_| StatemapError::InvalidParameter {
                    param: "color".to_string(),
                    message: format!("Invalid hex color: {}", value),
                })
            };
            [channel(1..3)?, channel(3..5)?, channel(5..7)?]
        }
        _ => {
            return Err(StatemapError::InvalidParameter {
                param: "color".to_string(),
                message: format!("Unknown color: {}", value),
            })
        }
    };
    Ok(Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

/// Linear interpolation between two colors; the result keeps `base`'s alpha
pub fn blend(base: Rgba<u8>, overlay: Rgba<u8>, t: f32) -> Rgba<u8> {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f32 * (1.0 - t) + b as f32 * t).round() as u8;
    Rgba([
        mix(base[0], overlay[0]),
        mix(base[1], overlay[1]),
        mix(base[2], overlay[2]),
        base[3],
    ])
}

/// User-facing style settings, as found in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapStyle {
    /// Canvas color where no basemap tile covers the frame
    #[serde(default = "default_background")]
    pub background: String,

    /// State polygon fill
    #[serde(default = "default_polygon_fill")]
    pub polygon_fill: String,

    /// State polygon outline
    #[serde(default = "default_polygon_edge")]
    pub polygon_edge: String,

    /// Opacity of both fill and outline
    #[serde(default = "default_polygon_alpha")]
    pub polygon_alpha: f32,

    /// Outline width in pixels
    #[serde(default = "default_edge_width")]
    pub edge_width: u32,

    #[serde(default = "default_marker_color")]
    pub marker_color: String,

    #[serde(default = "default_marker_alpha")]
    pub marker_alpha: f32,

    /// Half-width of the triangle marker in pixels
    #[serde(default = "default_marker_size")]
    pub marker_size: u32,
}

/// Parsed colors ready for drawing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: Rgba<u8>,
    pub polygon_fill: Rgba<u8>,
    pub polygon_edge: Rgba<u8>,
    pub marker: Rgba<u8>,
}

impl MapStyle {
    pub fn palette(&self) -> Result<Palette> {
        Ok(Palette {
            background: parse_color(&self.background)?,
            polygon_fill: parse_color(&self.polygon_fill)?,
            polygon_edge: parse_color(&self.polygon_edge)?,
            marker: parse_color(&self.marker_color)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.palette()?;

        for (param, alpha) in [
            ("polygon_alpha", self.polygon_alpha),
            ("marker_alpha", self.marker_alpha),
        ] {
            if !(0.0..=1.0).contains(&alpha) {
                return Err(StatemapError::InvalidParameter {
                    param: param.to_string(),
                    message: format!("Alpha must be between 0 and 1, got {}", alpha),
                });
            }
        }

        if self.marker_size == 0 {
            return Err(StatemapError::InvalidParameter {
                param: "marker_size".to_string(),
                message: "Marker size must be positive".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            background: default_background(),
            polygon_fill: default_polygon_fill(),
            polygon_edge: default_polygon_edge(),
            polygon_alpha: default_polygon_alpha(),
            edge_width: default_edge_width(),
            marker_color: default_marker_color(),
            marker_alpha: default_marker_alpha(),
            marker_size: default_marker_size(),
        }
    }
}

// Default value functions for serde
fn default_background() -> String {
    "white".to_string()
}

fn default_polygon_fill() -> String {
    "white".to_string()
}

fn default_polygon_edge() -> String {
    "black".to_string()
}

fn default_polygon_alpha() -> f32 {
    0.3
}

fn default_edge_width() -> u32 {
    1
}

fn default_marker_color() -> String {
    "red".to_string()
}

fn default_marker_alpha() -> f32 {
    0.4
}

fn default_marker_size() -> u32 {
    6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("red").unwrap(), Rgba([255, 0, 0, 255]));
        assert_eq!(parse_color(" Black ").unwrap(), Rgba([0, 0, 0, 255]));
        assert_eq!(parse_color("#1a2B3c").unwrap(), Rgba([0x1a, 0x2b, 0x3c, 255]));
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#zzzzzz").is_err());
        assert!(parse_color("chartreuse-ish").is_err());
    }

    #[test]
    fn test_blend() {
        let black = Rgba([0, 0, 0, 255]);
        let white = Rgba([255, 255, 255, 255]);

        assert_eq!(blend(black, white, 0.5), Rgba([128, 128, 128, 255]));
        assert_eq!(blend(black, white, 0.0), black);
        assert_eq!(blend(black, white, 2.0), white);
    }

    #[test]
    fn test_style_validation() {
        assert!(MapStyle::default().validate().is_ok());

        let mut style = MapStyle::default();
        style.marker_alpha = 1.5;
        assert!(style.validate().is_err());

        let mut style = MapStyle::default();
        style.polygon_edge = "not-a-color".to_string();
        assert!(style.validate().is_err());

        let mut style = MapStyle::default();
        style.marker_size = 0;
        assert!(style.validate().is_err());
    }
}
