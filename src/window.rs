//! # Nearest-Cell Lookup and Window Extraction
//!
//! The geometric core of the crate: locating the grid cell nearest a station
//! and cropping a fixed-size window around it.
//!
//! ## Window convention
//!
//! A requested extent `n` along an axis is split into `half_low = (n - 1) / 2`
//! cells below the center and `half_high = n / 2` cells above it (integer
//! division), so the crop always has exactly `n` cells and an even `n` places
//! the extra cell on the high-index side.
//!
//! ## Boundary handling
//!
//! Windows near the domain edge are resolved by an explicit
//! [`BoundaryPolicy`] instead of relying on slicing semantics: reject, clamp
//! to the valid range, or pad with NaN.

use crate::grid::{Grid, GridError, GridResult, Point};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How to resolve a window that extends past the grid edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
    /// Fail with [`GridError::OutOfBounds`].
    #[default]
    Strict,
    /// Clip the window to the valid index range; the crop may be smaller
    /// than requested.
    Clamp,
    /// Keep the requested size and fill cells outside the domain with NaN.
    Pad,
}

/// A cropped sub-grid centered on a reference cell.
///
/// Holds the cropped coordinate and variable arrays as a [`Grid`] of its own,
/// plus enough bookkeeping to map window indices back to the parent grid.
#[derive(Debug, Clone)]
pub struct WindowedGrid {
    grid: Grid,
    /// Row/col of the window's first cell in the parent grid. May be
    /// negative under [`BoundaryPolicy::Pad`].
    origin: (isize, isize),
    /// Position of the center cell within the window.
    center: (usize, usize),
}

impl WindowedGrid {
    /// The cropped grid (coordinates and variables).
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Row/col of the window's first cell in the parent grid.
    pub fn origin(&self) -> (isize, isize) {
        self.origin
    }

    /// Position of the center cell within the window.
    pub fn center(&self) -> (usize, usize) {
        self.center
    }

    /// Crop shape as (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        self.grid.shape()
    }

    /// The crop of one variable.
    pub fn variable(&self, name: &str) -> GridResult<&Array2<f64>> {
        self.grid.variable(name)
    }

    /// Value of one variable at the window center (the nearest cell).
    pub fn center_value(&self, name: &str) -> GridResult<f64> {
        Ok(self.grid.variable(name)?[self.center])
    }
}

/// Finds the index of the grid cell nearest to `point`.
///
/// Exhaustive row-major scan minimizing Euclidean distance in (lon, lat)
/// degree space. Ties are broken by the first cell encountered in row-major
/// order; this is part of the contract, not an accident of the scan. O(H*W),
/// fine for the swath sizes in scope.
///
/// A point far outside the grid still returns its nearest cell; plausibility
/// is the caller's concern.
pub fn nearest_index(grid: &Grid, point: Point) -> GridResult<(usize, usize)> {
    let (h, w) = grid.shape();
    if h == 0 || w == 0 {
        return Err(GridError::EmptyGrid);
    }
    let lons = grid.lons();
    let lats = grid.lats();

    let mut best = (0usize, 0usize);
    let mut best_dist = f64::INFINITY;
    for i in 0..h {
        for j in 0..w {
            let dlat = lats[(i, j)] - point.lat;
            let dlon = lons[(i, j)] - point.lon;
            let dist = (dlat * dlat + dlon * dlon).sqrt();
            if dist < best_dist {
                best_dist = dist;
                best = (i, j);
            }
        }
    }
    Ok(best)
}

/// Extracts a `(ny, nx)` window centered on `center`, resolving edge
/// overruns per `policy`. The center itself must be a valid cell index
/// under every policy; only the window edges may fall outside. A `(1, 1)`
/// request returns exactly the center cell. Pure; the parent grid is
/// untouched.
pub fn extract_window(
    grid: &Grid,
    center: (usize, usize),
    size: (usize, usize),
    policy: BoundaryPolicy,
) -> GridResult<WindowedGrid> {
    let (ny, nx) = size;
    if ny == 0 || nx == 0 {
        return Err(GridError::NonPositiveWindow { ny, nx });
    }
    let (h, w) = grid.shape();
    let (i0, j0) = (center.0 as isize, center.1 as isize);

    let row_lo = i0 - ((ny - 1) / 2) as isize;
    let row_hi = i0 + (ny / 2) as isize;
    let col_lo = j0 - ((nx - 1) / 2) as isize;
    let col_hi = j0 + (nx / 2) as isize;

    if center.0 >= h || center.1 >= w {
        return Err(GridError::OutOfBounds {
            row_lo,
            row_hi,
            col_lo,
            col_hi,
            height: h,
            width: w,
        });
    }

    let in_bounds =
        row_lo >= 0 && col_lo >= 0 && row_hi < h as isize && col_hi < w as isize;

    match policy {
        BoundaryPolicy::Strict if !in_bounds => Err(GridError::OutOfBounds {
            row_lo,
            row_hi,
            col_lo,
            col_hi,
            height: h,
            width: w,
        }),
        BoundaryPolicy::Strict | BoundaryPolicy::Clamp => {
            let r_lo = row_lo.max(0) as usize;
            let r_hi = row_hi.min(h as isize - 1) as usize;
            let c_lo = col_lo.max(0) as usize;
            let c_hi = col_hi.min(w as isize - 1) as usize;
            let crop = |arr: &Array2<f64>| {
                arr.slice(ndarray::s![r_lo..=r_hi, c_lo..=c_hi]).to_owned()
            };
            build_window(
                grid,
                crop,
                (r_lo as isize, c_lo as isize),
                (center.0 - r_lo, center.1 - c_lo),
            )
        }
        BoundaryPolicy::Pad => {
            let crop = |arr: &Array2<f64>| {
                Array2::from_shape_fn((ny, nx), |(wi, wj)| {
                    let pi = row_lo + wi as isize;
                    let pj = col_lo + wj as isize;
                    if pi >= 0 && pj >= 0 && pi < h as isize && pj < w as isize {
                        arr[(pi as usize, pj as usize)]
                    } else {
                        f64::NAN
                    }
                })
            };
            build_window(
                grid,
                crop,
                (row_lo, col_lo),
                (
                    (i0 - row_lo) as usize,
                    (j0 - col_lo) as usize,
                ),
            )
        }
    }
}

fn build_window<F>(
    grid: &Grid,
    crop: F,
    origin: (isize, isize),
    center: (usize, usize),
) -> GridResult<WindowedGrid>
where
    F: Fn(&Array2<f64>) -> Array2<f64>,
{
    let mut cropped = Grid::new(crop(grid.lons()), crop(grid.lats()))?;
    let mut names: Vec<&str> = grid.variable_names();
    names.sort_unstable();
    for name in names {
        cropped.add_variable(name, crop(grid.variable(name)?))?;
    }
    Ok(WindowedGrid {
        grid: cropped,
        origin,
        center,
    })
}

/// Convenience: nearest cell plus window in one call, the shape of the
/// per-station loop in the extraction pipeline.
pub fn window_at(
    grid: &Grid,
    point: Point,
    size: (usize, usize),
    policy: BoundaryPolicy,
) -> GridResult<WindowedGrid> {
    let center = nearest_index(grid, point)?;
    extract_window(grid, center, size, policy)
}

/// Single-cell values of every variable at the cell nearest `point`,
/// keyed by variable name.
pub fn nearest_values(grid: &Grid, point: Point) -> GridResult<HashMap<String, f64>> {
    let (i, j) = nearest_index(grid, point)?;
    let mut out = HashMap::new();
    for name in grid.variable_names() {
        out.insert(name.to_string(), grid.variable(name)?[(i, j)]);
    }
    Ok(out)
}
