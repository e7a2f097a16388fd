//! Logging setup and progress reporting helpers for the CLI.

use crate::input::JobConfig;
use log::{LevelFilter, info};

/// Initializes env_logger, honoring `RUST_LOG` when set and the CLI's
/// verbosity flags otherwise.
pub fn init_logging(verbose: bool, quiet: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        let level = if quiet {
            LevelFilter::Error
        } else if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };
        builder.filter_level(level);
    }
    builder.format_timestamp_secs().init();
}

/// Echoes the resolved job configuration at the start of a run.
pub fn config_echo(config: &JobConfig) {
    info!("Input NetCDF: {}", config.nc_key);
    info!("Output Parquet: {}", config.parquet_key);
    info!(
        "Window: {}x{} cells, boundary policy: {:?}",
        config.window.ny, config.window.nx, config.boundary
    );
    info!(
        "Extracting {} variable(s) at {} station(s)",
        config.variables.len(),
        config.stations.len()
    );
    for station in &config.stations {
        info!(
            "  Station '{}' at ({:.4}, {:.4})",
            station.name, station.lon, station.lat
        );
    }
}

/// Logs a dataset summary after opening.
pub fn show_dataset_summary(file: &netcdf::File) {
    info!("Dataset dimensions:");
    for dim in file.dimensions() {
        info!("  {}: {}", dim.name(), dim.len());
    }
    let n_vars = file.variables().count();
    info!("Dataset contains {} variable(s)", n_vars);
}
