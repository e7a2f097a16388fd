//! # Dataset Information Module
//!
//! Extracts and displays structural information about NetCDF datasets:
//! dimensions, variables, global attributes, and sensing times. Used by the
//! `info` subcommand for local and S3 files.

use crate::dataset::sensing_times;
use crate::storage::stage_input;
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Information about a NetCDF dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionInfo {
    pub name: String,
    pub length: usize,
}

/// Information about a NetCDF variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableInfo {
    pub name: String,
    pub dimensions: Vec<String>,
    pub shape: Vec<usize>,
    pub attributes: HashMap<String, String>,
}

/// Structural summary of a NetCDF dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub path: String,
    pub dimensions: Vec<DimensionInfo>,
    pub variables: Vec<VariableInfo>,
    pub start_sensing_time: Option<String>,
    pub stop_sensing_time: Option<String>,
}

/// Builds a [`DatasetInfo`] for a local or `s3://` NetCDF path.
///
/// When `variable` is given, only that variable is described; `detailed`
/// controls whether variable attributes are collected.
pub async fn get_dataset_info(
    file_path: &str,
    variable: Option<&str>,
    detailed: bool,
) -> Result<DatasetInfo> {
    let (local_path, _guard) = stage_input(file_path)
        .await
        .context("Failed to stage NetCDF file for inspection")?;
    debug!("Inspecting NetCDF file at {}", local_path.display());

    let file = netcdf::open(&local_path).context("Failed to open NetCDF file")?;

    let dimensions = file
        .dimensions()
        .map(|dim| DimensionInfo {
            name: dim.name().to_string(),
            length: dim.len(),
        })
        .collect();

    let mut variables = Vec::new();
    for var in file.variables() {
        if let Some(wanted) = variable
            && var.name() != wanted
        {
            continue;
        }
        let mut attributes = HashMap::new();
        if detailed {
            for attr in var.attributes() {
                if let Ok(netcdf::AttributeValue::Str(value)) = attr.value() {
                    attributes.insert(attr.name().to_string(), value);
                }
            }
        }
        variables.push(VariableInfo {
            name: var.name().to_string(),
            dimensions: var.dimensions().iter().map(|d| d.name().to_string()).collect(),
            shape: var.dimensions().iter().map(|d| d.len()).collect(),
            attributes,
        });
    }

    if let Some(wanted) = variable
        && variables.is_empty()
    {
        anyhow::bail!("Variable '{}' not found in {}", wanted, file_path);
    }

    let times = sensing_times(&file);
    Ok(DatasetInfo {
        path: file_path.to_string(),
        dimensions,
        variables,
        start_sensing_time: times.start.map(|t| t.to_rfc3339()),
        stop_sensing_time: times.stop.map(|t| t.to_rfc3339()),
    })
}

/// Renders a [`DatasetInfo`] for human consumption.
pub fn format_human(info: &DatasetInfo) -> String {
    let mut out = String::new();
    out.push_str(&format!("Dataset: {}\n", info.path));
    if let Some(ref start) = info.start_sensing_time {
        out.push_str(&format!("Sensing start: {}\n", start));
    }
    if let Some(ref stop) = info.stop_sensing_time {
        out.push_str(&format!("Sensing stop:  {}\n", stop));
    }
    out.push_str("Dimensions:\n");
    for dim in &info.dimensions {
        out.push_str(&format!("  {}: {}\n", dim.name, dim.length));
    }
    out.push_str("Variables:\n");
    for var in &info.variables {
        out.push_str(&format!(
            "  {} ({}): {:?}\n",
            var.name,
            var.dimensions.join(", "),
            var.shape
        ));
        for (name, value) in &var.attributes {
            out.push_str(&format!("    {} = {}\n", name, value));
        }
    }
    out
}
