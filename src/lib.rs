//! # satcrop
//!
//! A Rust library and CLI for extracting satellite and meteorological
//! parameters from gridded NetCDF datasets (ASCAT, SAR/Sentinel-1, ERA5
//! fields) at or around buoy station locations.
//!
//! ## Features
//!
//! - **Nearest-cell lookup**: deterministic row-major nearest-neighbor search
//!   over 2-D coordinate grids
//! - **Window crops**: fixed-size crops centered on the nearest cell, with an
//!   explicit boundary policy (reject, clamp, or NaN-pad) at domain edges
//! - **Windowed statistics**: mean and population std over finite values,
//!   plus a centered edge-to-edge gradient pair
//! - **Physics helpers**: moist-air density (Vaisala), SAR NRCS conversions
//! - **Type safety**: typed errors separating computational failure from I/O
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use satcrop::{process_extraction_job, input::JobConfig};
//!
//! // Load configuration from JSON or YAML file
//! let config = JobConfig::from_file("job.json").expect("Failed to load config");
//!
//! // Extract station parameters and write the Parquet table
//! process_extraction_job(&config).expect("Failed to process extraction job");
//! ```
//!
//! ## Configuration Example
//!
//! ```json
//! {
//!   "nc_key": "ascat_20220925.nc",
//!   "parquet_key": "buoy_params.parquet",
//!   "variables": ["sigma0_trip_fore"],
//!   "stations": [{"name": "buoy-1", "lon": 5.0, "lat": 65.0}],
//!   "window": {"ny": 17, "nx": 17},
//!   "statistics": ["nearest", "mean", "std"]
//! }
//! ```

pub mod cli;
pub mod dataset;
pub mod extract;
pub mod grid;
pub mod info;
pub mod input;
pub mod log;
pub mod output;
pub mod physics;
pub mod reduce;
pub mod storage;
pub mod window;

#[cfg(test)]
mod tests;

use crate::dataset::load_grid;
use crate::extract::{extract_stations, records_to_dataframe};
use crate::input::JobConfig;
use crate::output::write_dataframe_to_parquet;

/// Processes an extraction job with local input and output paths.
///
/// This function orchestrates the whole pipeline:
/// 1. Opens the NetCDF file
/// 2. Loads the coordinate grid and the requested variables
/// 3. Locates the nearest cell and extracts the crop window per station
/// 4. Computes the configured statistics
/// 5. Writes the long-format results table to Parquet
///
/// For `s3://` paths use [`cli::run_extract`], which stages remote input
/// through the storage layer.
///
/// # Errors
///
/// Fails if the NetCDF file cannot be opened, a requested variable or
/// coordinate is missing, a window exceeds the grid under the strict
/// boundary policy, or the Parquet output cannot be written.
pub fn process_extraction_job(config: &JobConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    let file = netcdf::open(&config.nc_key)?;
    let grid = load_grid(&file, &config.lon_name, &config.lat_name, &config.variables)?;
    let records = extract_stations(&grid, config)?;
    let df = records_to_dataframe(&records)?;
    write_dataframe_to_parquet(&df, &config.parquet_key)?;
    file.close()?;
    Ok(())
}
