//! # Grid Data Model
//!
//! In-memory representation of a 2-D geophysical grid: a pair of coordinate
//! arrays (longitude, latitude) plus named variable arrays, all sharing the
//! same `(H, W)` shape. Grids are built by the [`crate::dataset`] adapter from
//! NetCDF files, but can also be constructed directly for testing or for data
//! already held in memory.
//!
//! All core operations over grids are pure and fail with a typed
//! [`GridError`] rather than panicking, so computational failures stay
//! distinguishable from I/O failures in the surrounding pipeline.

use ndarray::Array2;
use std::collections::HashMap;
use thiserror::Error;

/// Errors produced by the grid core (construction, lookup, windowing,
/// reduction). I/O failures are not represented here; they belong to the
/// dataset and storage layers.
#[derive(Error, Debug)]
pub enum GridError {
    #[error("grid has no cells")]
    EmptyGrid,

    #[error("array '{name}' has shape {got:?}, expected {expected:?}")]
    ShapeMismatch {
        name: String,
        got: (usize, usize),
        expected: (usize, usize),
    },

    #[error("window size must be positive, got {ny}x{nx}")]
    NonPositiveWindow { ny: usize, nx: usize },

    #[error(
        "window rows {row_lo}..={row_hi}, cols {col_lo}..={col_hi} exceeds grid extent {height}x{width}"
    )]
    OutOfBounds {
        row_lo: isize,
        row_hi: isize,
        col_lo: isize,
        col_hi: isize,
        height: usize,
        width: usize,
    },

    #[error("window extent {extent} along {axis} is too small for a gradient (need at least 2)")]
    DegenerateWindow { axis: &'static str, extent: usize },

    #[error("all values in the reduction window are missing")]
    AllMissing,

    #[error("variable '{0}' not present in grid")]
    UnknownVariable(String),
}

/// Result type for grid-core operations
pub type GridResult<T> = Result<T, GridError>;

/// A station or query location as a (longitude, latitude) pair in degrees.
///
/// Coordinates are range-unchecked: values outside [-180, 180] / [-90, 90]
/// are the caller's responsibility, matching the upstream datasets which
/// carry both 0..360 and -180..180 longitude conventions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
}

impl Point {
    pub fn new(lon: f64, lat: f64) -> Self {
        Point { lon, lat }
    }
}

/// A 2-D geophysical grid: coordinate arrays plus named variable arrays.
///
/// Invariant: `lons`, `lats` and every variable array share the same
/// `(H, W)` shape with `H, W >= 1`. The constructors enforce this; the
/// struct fields are private so the invariant cannot be broken afterwards.
#[derive(Debug, Clone)]
pub struct Grid {
    lons: Array2<f64>,
    lats: Array2<f64>,
    vars: HashMap<String, Array2<f64>>,
}

impl Grid {
    /// Creates a grid from 2-D coordinate arrays (curvilinear grids such as
    /// SAR geolocation grids).
    pub fn new(lons: Array2<f64>, lats: Array2<f64>) -> GridResult<Self> {
        let shape = (lons.nrows(), lons.ncols());
        if shape.0 == 0 || shape.1 == 0 {
            return Err(GridError::EmptyGrid);
        }
        if (lats.nrows(), lats.ncols()) != shape {
            return Err(GridError::ShapeMismatch {
                name: "lats".to_string(),
                got: (lats.nrows(), lats.ncols()),
                expected: shape,
            });
        }
        Ok(Grid {
            lons,
            lats,
            vars: HashMap::new(),
        })
    }

    /// Creates a grid from 1-D longitude and latitude axes (regular grids
    /// such as ASCAT swaths resampled to a lat/lon raster). Rows follow the
    /// latitude axis, columns the longitude axis.
    pub fn from_axes(lon_axis: &[f64], lat_axis: &[f64]) -> GridResult<Self> {
        if lon_axis.is_empty() || lat_axis.is_empty() {
            return Err(GridError::EmptyGrid);
        }
        let (h, w) = (lat_axis.len(), lon_axis.len());
        let lons = Array2::from_shape_fn((h, w), |(_, j)| lon_axis[j]);
        let lats = Array2::from_shape_fn((h, w), |(i, _)| lat_axis[i]);
        Grid::new(lons, lats)
    }

    /// Adds a named variable array, validating its shape against the grid.
    pub fn add_variable(&mut self, name: &str, values: Array2<f64>) -> GridResult<()> {
        let shape = self.shape();
        if (values.nrows(), values.ncols()) != shape {
            return Err(GridError::ShapeMismatch {
                name: name.to_string(),
                got: (values.nrows(), values.ncols()),
                expected: shape,
            });
        }
        self.vars.insert(name.to_string(), values);
        Ok(())
    }

    /// Grid shape as (height, width) = (rows, cols) = (lat, lon).
    pub fn shape(&self) -> (usize, usize) {
        (self.lons.nrows(), self.lons.ncols())
    }

    pub fn lons(&self) -> &Array2<f64> {
        &self.lons
    }

    pub fn lats(&self) -> &Array2<f64> {
        &self.lats
    }

    /// Looks up a variable array by name.
    pub fn variable(&self, name: &str) -> GridResult<&Array2<f64>> {
        self.vars
            .get(name)
            .ok_or_else(|| GridError::UnknownVariable(name.to_string()))
    }

    /// Names of all variables held by the grid, in arbitrary order.
    pub fn variable_names(&self) -> Vec<&str> {
        self.vars.keys().map(|s| s.as_str()).collect()
    }

    /// Coordinate of a cell as a [`Point`].
    pub fn point_at(&self, i: usize, j: usize) -> Point {
        Point::new(self.lons[(i, j)], self.lats[(i, j)])
    }
}
