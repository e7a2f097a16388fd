//! # NetCDF Dataset Adapter
//!
//! Loads a [`Grid`] from a NetCDF file: coordinate variables (1-D axes or
//! full 2-D geolocation arrays) plus the requested data variables. Leading
//! length-1 dimensions are squeezed, since ASCAT granules carry a unit time
//! dimension in front of the (lat, lon) raster.
//!
//! I/O errors from the `netcdf` crate are kept separate from the typed
//! computational errors of the grid core.

use crate::grid::Grid;
use chrono::{DateTime, Utc};
use log::debug;
use ndarray::{ArrayD, Ix1, Ix2};

/// Sensing-time metadata carried as global attributes by ASCAT and SAR
/// granules. Either bound may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensingTimes {
    pub start: Option<DateTime<Utc>>,
    pub stop: Option<DateTime<Utc>>,
}

/// Loads coordinates and the requested variables from a NetCDF file into a
/// [`Grid`].
///
/// Coordinate variables may be 1-D axes (regular lat/lon rasters) or 2-D
/// geolocation arrays (curvilinear SAR grids); 1-D axes are meshed into the
/// 2-D coordinate pair the grid core works with.
pub fn load_grid(
    file: &netcdf::File,
    lon_name: &str,
    lat_name: &str,
    variables: &[String],
) -> Result<Grid, Box<dyn std::error::Error>> {
    let lon_var = file
        .variable(lon_name)
        .ok_or(format!("Coordinate variable '{}' not found", lon_name))?;
    let lat_var = file
        .variable(lat_name)
        .ok_or(format!("Coordinate variable '{}' not found", lat_name))?;

    let lon_values = squeeze(lon_var.get::<f64, _>(..)?);
    let lat_values = squeeze(lat_var.get::<f64, _>(..)?);

    let mut grid = match (lon_values.ndim(), lat_values.ndim()) {
        (1, 1) => {
            let lon_axis = lon_values.into_dimensionality::<Ix1>()?.to_vec();
            let lat_axis = lat_values.into_dimensionality::<Ix1>()?.to_vec();
            Grid::from_axes(&lon_axis, &lat_axis)?
        }
        (2, 2) => Grid::new(
            lon_values.into_dimensionality::<Ix2>()?,
            lat_values.into_dimensionality::<Ix2>()?,
        )?,
        (a, b) => {
            return Err(format!(
                "Coordinate variables must both be 1-D or both 2-D, got {}-D and {}-D",
                a, b
            )
            .into());
        }
    };

    for name in variables {
        let var = file
            .variable(name)
            .ok_or(format!("Variable '{}' not found in NetCDF file", name))?;
        let values = squeeze(var.get::<f64, _>(..)?);
        let values = values.into_dimensionality::<Ix2>().map_err(|_| {
            format!("Variable '{}' is not 2-D after squeezing unit dimensions", name)
        })?;
        grid.add_variable(name, values)?;
        debug!("Loaded variable '{}' with shape {:?}", name, grid.shape());
    }

    Ok(grid)
}

/// Reads the `start_sensing_time` / `stop_sensing_time` global attributes
/// when present. Timestamps that fail to parse are dropped with a debug log
/// rather than failing the job.
pub fn sensing_times(file: &netcdf::File) -> SensingTimes {
    SensingTimes {
        start: read_time_attribute(file, "start_sensing_time"),
        stop: read_time_attribute(file, "stop_sensing_time"),
    }
}

fn read_time_attribute(file: &netcdf::File, name: &str) -> Option<DateTime<Utc>> {
    let attr = file.attribute(name)?;
    let value = match attr.value() {
        Ok(netcdf::AttributeValue::Str(s)) => s,
        _ => return None,
    };
    match value.parse::<DateTime<Utc>>() {
        Ok(t) => Some(t),
        Err(e) => {
            debug!("Could not parse attribute '{}' as timestamp: {}", name, e);
            None
        }
    }
}

/// Drops leading length-1 axes until the array is at most 2-D.
fn squeeze(mut arr: ArrayD<f64>) -> ArrayD<f64> {
    while arr.ndim() > 2 && arr.shape()[0] == 1 {
        arr = arr.index_axis_move(ndarray::Axis(0), 0);
    }
    arr
}
