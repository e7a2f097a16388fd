//! # Station Extraction Pipeline
//!
//! Runs the grid core for every configured station: nearest-cell lookup,
//! window crop, and the requested reducers, then assembles the results into
//! a long-format Polars DataFrame ready for Parquet output.
//!
//! Each station is independent of the others; the loop has no shared state
//! beyond the immutable grid, so callers that need throughput can fan
//! stations out across threads without coordination.

use crate::grid::{Grid, GridError, Point};
use crate::input::{JobConfig, StationSpec};
use crate::reduce::{Reduced, Statistic, reduce};
use crate::window::{extract_window, nearest_index};
use log::warn;
use polars::prelude::*;
use std::collections::HashMap;

/// One reduced value for one (station, variable, statistic) combination.
/// Gradient statistics contribute two values (`grad_x`, `grad_y`).
#[derive(Debug, Clone, PartialEq)]
pub struct ParamValue {
    pub variable: String,
    pub statistic: String,
    pub value: f64,
}

/// Everything extracted for a single station.
#[derive(Debug, Clone)]
pub struct StationRecord {
    pub station: StationSpec,
    /// Index of the nearest grid cell, row-major (lat, lon).
    pub grid_index: (usize, usize),
    /// Coordinates of the nearest grid cell.
    pub cell: Point,
    pub values: Vec<ParamValue>,
}

impl StationRecord {
    /// Results as a flat name -> value map, keyed the way the upstream
    /// parameter dictionaries are: `<var>` for the nearest value,
    /// `<var>_mean`, `<var>_std`, and `<var>_x` / `<var>_y` for gradients.
    pub fn as_map(&self) -> HashMap<String, f64> {
        let mut out = HashMap::new();
        for pv in &self.values {
            let key = match pv.statistic.as_str() {
                "nearest" => pv.variable.clone(),
                "grad_x" => format!("{}_x", pv.variable),
                "grad_y" => format!("{}_y", pv.variable),
                other => format!("{}_{}", pv.variable, other),
            };
            out.insert(key, pv.value);
        }
        out
    }
}

/// Extracts all configured statistics for every station in the job.
///
/// Boundary violations under the strict policy and unknown variables fail
/// the job; an all-missing reduction window degrades to NaN with a warning,
/// since a cloud-masked crop over one buoy should not sink the whole run.
pub fn extract_stations(
    grid: &Grid,
    config: &JobConfig,
) -> Result<Vec<StationRecord>, Box<dyn std::error::Error>> {
    let mut records = Vec::with_capacity(config.stations.len());
    for station in &config.stations {
        records.push(extract_station(grid, station, config)?);
    }
    Ok(records)
}

/// Extracts one station. Exposed separately so callers doing their own
/// fan-out can dispatch stations individually.
pub fn extract_station(
    grid: &Grid,
    station: &StationSpec,
    config: &JobConfig,
) -> Result<StationRecord, Box<dyn std::error::Error>> {
    let point = Point::new(station.lon, station.lat);
    let center = nearest_index(grid, point)?;
    let windowed = extract_window(
        grid,
        center,
        (config.window.ny, config.window.nx),
        config.boundary,
    )?;

    let mut values = Vec::new();
    for variable in &config.variables {
        for stat in &config.statistics {
            match reduce(&windowed, variable, *stat) {
                Ok(Reduced::Scalar(v)) => values.push(ParamValue {
                    variable: variable.clone(),
                    statistic: stat.kind().to_string(),
                    value: v,
                }),
                Ok(Reduced::Gradient { x, y }) => {
                    values.push(ParamValue {
                        variable: variable.clone(),
                        statistic: "grad_x".to_string(),
                        value: x,
                    });
                    values.push(ParamValue {
                        variable: variable.clone(),
                        statistic: "grad_y".to_string(),
                        value: y,
                    });
                }
                Err(GridError::AllMissing) => {
                    warn!(
                        "All values missing for '{}' ({}) at station '{}'",
                        variable,
                        stat.kind(),
                        station.name
                    );
                    values.push(ParamValue {
                        variable: variable.clone(),
                        statistic: stat.kind().to_string(),
                        value: f64::NAN,
                    });
                }
                Err(e) => return Err(Box::new(e)),
            }
        }
    }

    Ok(StationRecord {
        station: station.clone(),
        grid_index: center,
        cell: grid.point_at(center.0, center.1),
        values,
    })
}

/// Assembles station records into a long-format DataFrame with one row per
/// (station, variable, statistic) value.
pub fn records_to_dataframe(
    records: &[StationRecord],
) -> Result<DataFrame, Box<dyn std::error::Error>> {
    let mut stations = Vec::new();
    let mut lons = Vec::new();
    let mut lats = Vec::new();
    let mut grid_is = Vec::new();
    let mut grid_js = Vec::new();
    let mut variables = Vec::new();
    let mut statistics = Vec::new();
    let mut values = Vec::new();

    for record in records {
        for pv in &record.values {
            stations.push(record.station.name.clone());
            lons.push(record.station.lon);
            lats.push(record.station.lat);
            grid_is.push(record.grid_index.0 as u32);
            grid_js.push(record.grid_index.1 as u32);
            variables.push(pv.variable.clone());
            statistics.push(pv.statistic.clone());
            values.push(pv.value);
        }
    }

    let columns = vec![
        Series::new("station".into(), stations).into(),
        Series::new("lon".into(), lons).into(),
        Series::new("lat".into(), lats).into(),
        Series::new("grid_i".into(), grid_is).into(),
        Series::new("grid_j".into(), grid_js).into(),
        Series::new("variable".into(), variables).into(),
        Series::new("statistic".into(), statistics).into(),
        Series::new("value".into(), values).into(),
    ];

    let df = DataFrame::new(columns)?;
    Ok(df)
}
