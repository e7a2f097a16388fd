//! # Physical Property Calculations
//!
//! Self-contained formulas used alongside the extraction pipeline: moist air
//! density from the Vaisala humidity conversion formulas, and the SAR NRCS
//! helpers (HH to VV polarization conversion and incidence-angle
//! normalization).

/// 0 degrees Celsius in Kelvin
const T0: f64 = 273.15;
/// Triple point temperature used in the Vaisala formulation
const TN: f64 = 240.7263;
/// Vaisala saturation vapor pressure constant A
const A: f64 = 6.116441;
/// Vaisala saturation vapor pressure constant m
const M: f64 = 7.591386;
/// Specific gas constant for dry air [J/(kg K)]
const R_DRY: f64 = 286.9;
/// Specific gas constant for water vapor [J/(kg K)]
const R_VAPOR: f64 = 461.4;
/// hPa to Pa
const HPA: f64 = 100.0;

/// Moist air density and relative humidity from 2-metre temperatures and
/// mean sea-level pressure.
///
/// Saturation vapor pressure follows the Vaisala humidity conversion
/// formulas (document B210973EN-F); relative humidity is derived from the
/// dew-point depression, total pressure is partitioned into dry-air and
/// water-vapor partial pressures, and the two are combined through the
/// ideal gas law per constituent.
///
/// # Arguments
///
/// * `t_air` - 2-metre air temperature [K]
/// * `t_dew` - 2-metre dew point temperature [K]
/// * `mslp` - mean sea-level pressure [hPa]
///
/// # Returns
///
/// `(density [kg/m^3], relative humidity [%])`.
///
/// Inputs are not validated against physical plausibility: a dew point
/// above the air temperature yields a relative humidity above 100 %, as
/// the formula has no guard for it.
pub fn air_density(t_air: f64, t_dew: f64, mslp: f64) -> (f64, f64) {
    let tc = t_air - T0;
    let td = t_dew - T0;

    let p_vs = A * 10f64.powf(M * tc / (tc + TN));
    let rh = 100.0 * 10f64.powf(M * (td / (td + TN) - tc / (tc + TN)));
    let p_v = p_vs * rh / 100.0;
    let p_d = mslp * HPA - p_v;
    let rho = p_d / (R_DRY * t_air) + p_v / (R_VAPOR * t_air);

    (rho, rh)
}

/// Converts real-valued (linear, not dB) HH polarization NRCS to VV using
/// the polarization ratio from Ren et al. (2017).
pub fn hh_to_vv(s0_hh: f64, inc: f64) -> f64 {
    let tan2 = (inc.to_radians()).tan().powi(2);
    let pr = (1.0 + 2.0 * tan2).powi(2) / (1.0 + 1.3 * tan2).powi(2);
    s0_hh * pr
}

/// Symmetric equation for a 30 degree incidence angle, Topouzelis et al.
/// (2016) eq. (7).
fn symfunc(inc: f64) -> f64 {
    0.776 * inc - 31.638
}

/// Normalizes an NRCS value in dB to 30 degrees incidence angle following
/// Topouzelis et al. (2016), eq. (3).
pub fn normalize_nrcs(s0_db: f64, inc: f64) -> f64 {
    (s0_db + symfunc(inc)) / 2.0
}

/// Linear NRCS to decibels.
pub fn to_db(s0: f64) -> f64 {
    10.0 * s0.log10()
}
