//! # Input Configuration Module
//!
//! Configuration parsing and validation for satcrop extraction jobs. A job
//! names the input NetCDF dataset, the variables to extract, the stations to
//! extract them at, the crop window geometry and boundary policy, the
//! statistics to compute, and the Parquet output destination.
//!
//! Configurations are accepted as JSON or YAML; [`JobConfig::from_file`]
//! picks the parser from the file extension.
//!
//! ## Example
//!
//! ```json
//! {
//!   "nc_key": "ascat_20220925.nc",
//!   "parquet_key": "buoy_params.parquet",
//!   "variables": ["sigma0_trip_fore", "inc_angle_trip_fore"],
//!   "stations": [{"name": "buoy-1", "lon": 5.0, "lat": 65.0}],
//!   "window": {"ny": 17, "nx": 17},
//!   "boundary": "strict",
//!   "statistics": ["nearest", "mean", "std", "gradient"]
//! }
//! ```

use crate::reduce::Statistic;
use crate::window::BoundaryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A named station (buoy) location in degrees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StationSpec {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
}

/// Requested crop window extent in cells: `ny` rows (latitude) by `nx`
/// columns (longitude). The CNN-style crops upstream default to 17x17.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowSpec {
    pub ny: usize,
    pub nx: usize,
}

impl Default for WindowSpec {
    fn default() -> Self {
        WindowSpec { ny: 17, nx: 17 }
    }
}

/// Complete configuration for one extraction job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Path to the input NetCDF file (local or s3://)
    pub nc_key: String,
    /// Path for the output Parquet file (local or s3://)
    pub parquet_key: String,
    /// Name of the longitude coordinate variable
    #[serde(default = "default_lon_name")]
    pub lon_name: String,
    /// Name of the latitude coordinate variable
    #[serde(default = "default_lat_name")]
    pub lat_name: String,
    /// Variables to extract at each station
    pub variables: Vec<String>,
    /// Stations to extract at
    pub stations: Vec<StationSpec>,
    /// Crop window extent
    #[serde(default)]
    pub window: WindowSpec,
    /// Edge handling for windows near the domain boundary
    #[serde(default)]
    pub boundary: BoundaryPolicy,
    /// Statistics to compute per variable
    #[serde(default = "default_statistics")]
    pub statistics: Vec<Statistic>,
}

fn default_lon_name() -> String {
    "lon".to_string()
}

fn default_lat_name() -> String {
    "lat".to_string()
}

fn default_statistics() -> Vec<Statistic> {
    vec![Statistic::Nearest]
}

impl JobConfig {
    /// Loads a job configuration from a JSON or YAML file, chosen by
    /// extension (`.yaml`/`.yml` parse as YAML, anything else as JSON).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    /// Parses a job configuration from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: JobConfig = serde_json::from_str(json_str)?;
        Ok(config)
    }

    /// Parses a job configuration from a YAML string.
    pub fn from_yaml(yaml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: JobConfig = serde_yaml::from_str(yaml_str)?;
        Ok(config)
    }

    /// Validates the configuration before any I/O happens: window extents
    /// must be positive, and at least one station and one variable must be
    /// requested.
    pub fn validate(&self) -> Result<(), String> {
        if self.window.ny == 0 || self.window.nx == 0 {
            return Err(format!(
                "window size must be positive, got {}x{}",
                self.window.ny, self.window.nx
            ));
        }
        if self.stations.is_empty() {
            return Err("at least one station is required".to_string());
        }
        if self.variables.is_empty() {
            return Err("at least one variable is required".to_string());
        }
        if self.statistics.is_empty() {
            return Err("at least one statistic is required".to_string());
        }
        for station in &self.stations {
            if station.name.trim().is_empty() {
                return Err("station names cannot be empty".to_string());
            }
        }
        Ok(())
    }

    /// Serializes the configuration in the requested format, used by the
    /// `template` subcommand.
    pub fn to_string_pretty(&self, yaml: bool) -> Result<String, Box<dyn std::error::Error>> {
        if yaml {
            Ok(serde_yaml::to_string(self)?)
        } else {
            Ok(serde_json::to_string_pretty(self)?)
        }
    }
}
