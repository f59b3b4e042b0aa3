//! Configuration management for statemap.
//!
//! This module handles the layered configuration system with the following precedence:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. JSON config file
//! 4. Default values (lowest priority)

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, StatemapError};
use crate::render::MapStyle;
use crate::tiles::{DEFAULT_TILE_URL, MAX_ZOOM};

/// Command-line arguments for statemap
#[derive(Parser, Debug)]
#[command(name = "statemap")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// State to render, as named in the boundary shapefile (e.g. "California")
    pub state: String,

    /// State key in the ZIP table, when it differs from the state name (e.g. "CA")
    #[arg(long, env = "STATEMAP_ZIP_STATE")]
    pub zip_state: Option<String>,

    /// Semicolon-delimited ZIP code table
    #[arg(long, env = "STATEMAP_ZIP_CSV")]
    pub zip_csv: Option<PathBuf>,

    /// Per-state bounding box table
    #[arg(long, env = "STATEMAP_BBOX_CSV")]
    pub bbox_csv: Option<PathBuf>,

    /// State boundary shapefile
    #[arg(long, env = "STATEMAP_STATES_SHP")]
    pub states_shapefile: Option<PathBuf>,

    /// Output PNG path (overwritten on every run)
    #[arg(short, long, env = "STATEMAP_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Output width in pixels
    #[arg(short, long, env = "STATEMAP_WIDTH")]
    pub width: Option<u32>,

    /// Tile URL template with {z}, {x} and {y} placeholders
    #[arg(long, env = "STATEMAP_TILE_URL")]
    pub tile_url: Option<String>,

    /// Directory for cached tiles
    #[arg(long, env = "STATEMAP_TILE_CACHE")]
    pub tile_cache: Option<PathBuf>,

    /// Path to JSON configuration file
    #[arg(short, long, env = "STATEMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "STATEMAP_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Reference data locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_zip_csv")]
    pub zip_csv: PathBuf,

    #[serde(default = "default_bbox_csv")]
    pub bbox_csv: PathBuf,

    #[serde(default = "default_states_shapefile")]
    pub states_shapefile: PathBuf,
}

/// Basemap tile provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileConfig {
    #[serde(default = "default_tile_url")]
    pub url_template: String,

    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Sent with every tile request; OpenStreetMap rejects anonymous clients
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,

    /// Upper bound on tiles fetched for one basemap
    #[serde(default = "default_max_tiles")]
    pub max_tiles: usize,
}

/// Rendered image settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    #[serde(default = "default_width")]
    pub width: u32,
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub inputs: InputConfig,

    #[serde(default)]
    pub tiles: TileConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub style: MapStyle,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// What to render, as given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub state: String,
    pub zip_state: String,
}

impl Config {
    /// Load configuration from all sources with proper precedence
    pub fn load() -> Result<(Self, Target)> {
        Self::from_args(Args::parse())
    }

    /// Build a configuration from already-parsed arguments
    pub fn from_args(args: Args) -> Result<(Self, Target)> {
        // Start with defaults
        let mut config = Config::default();

        // Load from JSON file if provided
        if let Some(config_path) = &args.config {
            config = Self::load_from_file(config_path)?;
        }

        // Override with command-line arguments
        if let Some(path) = args.zip_csv {
            config.inputs.zip_csv = path;
        }
        if let Some(path) = args.bbox_csv {
            config.inputs.bbox_csv = path;
        }
        if let Some(path) = args.states_shapefile {
            config.inputs.states_shapefile = path;
        }
        if let Some(path) = args.output {
            config.output.path = path;
        }
        if let Some(width) = args.width {
            config.output.width = width;
        }
        if let Some(url) = args.tile_url {
            config.tiles.url_template = url;
        }
        if let Some(dir) = args.tile_cache {
            config.tiles.cache_dir = dir;
        }
        if let Some(level) = args.log_level {
            config.log_level = level;
        }

        let target = Target {
            zip_state: args.zip_state.unwrap_or_else(|| args.state.clone()),
            state: args.state,
        };

        Ok((config, target))
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("inputs.zip_csv", &self.inputs.zip_csv),
            ("inputs.bbox_csv", &self.inputs.bbox_csv),
            ("inputs.states_shapefile", &self.inputs.states_shapefile),
            ("tiles.cache_dir", &self.tiles.cache_dir),
            ("output.path", &self.output.path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(StatemapError::Config {
                    message: format!("{} cannot be empty", name),
                });
            }
        }

        if self.output.width == 0 {
            return Err(StatemapError::Config {
                message: "Output width cannot be 0".to_string(),
            });
        }

        for placeholder in ["{z}", "{x}", "{y}"] {
            if !self.tiles.url_template.contains(placeholder) {
                return Err(StatemapError::Config {
                    message: format!(
                        "Tile URL template '{}' is missing {}",
                        self.tiles.url_template, placeholder
                    ),
                });
            }
        }

        if self.tiles.max_zoom > MAX_ZOOM {
            return Err(StatemapError::Config {
                message: format!(
                    "Invalid max zoom: {}. Must be at most {}",
                    self.tiles.max_zoom, MAX_ZOOM
                ),
            });
        }

        if self.tiles.max_tiles == 0 {
            return Err(StatemapError::Config {
                message: "max_tiles cannot be 0".to_string(),
            });
        }

        if self.tiles.user_agent.trim().is_empty() {
            return Err(StatemapError::Config {
                message: "Tile user agent cannot be empty".to_string(),
            });
        }

        // Validate log level
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(StatemapError::Config {
                    message: format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        self.log_level
                    ),
                });
            }
        }

        self.style.validate().map_err(|e| StatemapError::Config {
            message: format!("Invalid style: {}", e),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inputs: InputConfig::default(),
            tiles: TileConfig::default(),
            output: OutputConfig::default(),
            style: MapStyle::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            zip_csv: default_zip_csv(),
            bbox_csv: default_bbox_csv(),
            states_shapefile: default_states_shapefile(),
        }
    }
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            url_template: default_tile_url(),
            cache_dir: default_cache_dir(),
            user_agent: default_user_agent(),
            max_zoom: default_max_zoom(),
            max_tiles: default_max_tiles(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            width: default_width(),
        }
    }
}

// Default value functions for serde
fn default_zip_csv() -> PathBuf {
    PathBuf::from("us-zip-code-latitude-and-longitude.csv")
}

fn default_bbox_csv() -> PathBuf {
    PathBuf::from("us_state_bounding_boxes.csv")
}

fn default_states_shapefile() -> PathBuf {
    Path::new("gz_2010_us_040_00_500k").join("gz_2010_us_040_00_500k.shp")
}

fn default_tile_url() -> String {
    DEFAULT_TILE_URL.to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".tile_cache")
}

fn default_user_agent() -> String {
    format!("statemap/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_zoom() -> u8 {
    MAX_ZOOM
}

fn default_max_tiles() -> usize {
    64
}

fn default_output_path() -> PathBuf {
    Path::new("data").join("plot1.png")
}

fn default_width() -> u32 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["statemap"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.output.path, PathBuf::from("data/plot1.png"));
        assert_eq!(config.output.width, 1000);
        assert_eq!(config.tiles.url_template, DEFAULT_TILE_URL);
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides_and_zip_state() {
        let (config, target) =
            Config::from_args(args(&["California", "--width", "640", "--zip-state", "CA"]))
                .unwrap();
        assert_eq!(config.output.width, 640);
        assert_eq!(target.state, "California");
        assert_eq!(target.zip_state, "CA");

        let (_, target) = Config::from_args(args(&["Hawaii"])).unwrap();
        assert_eq!(target.zip_state, "Hawaii");
    }

    #[test]
    fn test_json_file_then_cli() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statemap.json");
        std::fs::write(
            &path,
            r#"{"output": {"width": 800}, "tiles": {"max_tiles": 9}, "style": {"marker_color": "blue"}}"#,
        )
        .unwrap();

        let path_str = path.to_str().unwrap();
        let (config, _) =
            Config::from_args(args(&["Ohio", "--config", path_str, "--log-level", "debug"]))
                .unwrap();
        assert_eq!(config.output.width, 800);
        assert_eq!(config.tiles.max_tiles, 9);
        assert_eq!(config.style.marker_color, "blue");
        // Unspecified sections keep their defaults
        assert_eq!(config.style.marker_alpha, 0.4);
        assert_eq!(config.output.path, PathBuf::from("data/plot1.png"));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.output.width = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tiles.url_template = "https://example.com/{z}/{x}.png".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tiles.max_zoom = 25;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.inputs.bbox_csv = PathBuf::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.style.polygon_alpha = -0.1;
        assert!(config.validate().is_err());
    }
}
