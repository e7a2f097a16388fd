//! # Windowed Aggregation Reducers
//!
//! Scalar statistics over a cropped variable window: mean and population
//! standard deviation over finite values, and a centered edge-to-edge
//! gradient pair.

use crate::grid::{GridError, GridResult};
use crate::window::WindowedGrid;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Statistics that can be requested per variable in an extraction job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    /// Value of the single nearest cell.
    Nearest,
    /// Arithmetic mean over finite values in the window.
    Mean,
    /// Population standard deviation over finite values in the window.
    Std,
    /// Centered finite-difference gradient across the window edges.
    Gradient,
}

impl Statistic {
    pub fn kind(&self) -> &'static str {
        match self {
            Statistic::Nearest => "nearest",
            Statistic::Mean => "mean",
            Statistic::Std => "std",
            Statistic::Gradient => "gradient",
        }
    }
}

/// Result of reducing one variable window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reduced {
    Scalar(f64),
    /// Gradient along (lon, lat) axes: `(grad_x, grad_y)`.
    Gradient { x: f64, y: f64 },
}

/// Mean over finite (non-NaN) values. An all-missing window is a typed
/// error, not a NaN that silently propagates.
pub fn mean(window: &Array2<f64>) -> GridResult<f64> {
    let (sum, count) = finite_sum(window);
    if count == 0 {
        return Err(GridError::AllMissing);
    }
    Ok(sum / count as f64)
}

/// Population (biased) standard deviation over finite values. The upstream
/// reference outputs use the population estimator, so no Bessel correction
/// is applied.
pub fn std(window: &Array2<f64>) -> GridResult<f64> {
    let m = mean(window)?;
    let (sq_sum, count) = window
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| {
            let d = v - m;
            (s + d * d, c + 1)
        });
    Ok((sq_sum / count as f64).sqrt())
}

/// Edge-to-edge gradient through the window center:
///
/// ```text
/// grad_x = w[center_row, last_col]  - w[center_row, first_col]
/// grad_y = w[last_row,  center_col] - w[first_row,  center_col]
/// ```
///
/// with `center = (extent - 1) / 2`. Each axis needs an extent of at least
/// 2 for the two edge cells to be distinct.
pub fn gradient(window: &Array2<f64>) -> GridResult<(f64, f64)> {
    let (h, w) = (window.nrows(), window.ncols());
    if w < 2 {
        return Err(GridError::DegenerateWindow {
            axis: "lon",
            extent: w,
        });
    }
    if h < 2 {
        return Err(GridError::DegenerateWindow {
            axis: "lat",
            extent: h,
        });
    }
    let center_row = (h - 1) / 2;
    let center_col = (w - 1) / 2;
    let grad_x = window[(center_row, w - 1)] - window[(center_row, 0)];
    let grad_y = window[(h - 1, center_col)] - window[(0, center_col)];
    Ok((grad_x, grad_y))
}

/// Reduces one variable of a windowed grid with the requested statistic.
pub fn reduce(windowed: &WindowedGrid, variable: &str, stat: Statistic) -> GridResult<Reduced> {
    match stat {
        Statistic::Nearest => Ok(Reduced::Scalar(windowed.center_value(variable)?)),
        Statistic::Mean => Ok(Reduced::Scalar(mean(windowed.variable(variable)?)?)),
        Statistic::Std => Ok(Reduced::Scalar(std(windowed.variable(variable)?)?)),
        Statistic::Gradient => {
            let (x, y) = gradient(windowed.variable(variable)?)?;
            Ok(Reduced::Gradient { x, y })
        }
    }
}

fn finite_sum(window: &Array2<f64>) -> (f64, usize) {
    window
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1))
}
