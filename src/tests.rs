use crate::extract::*;
use crate::grid::*;
use crate::input::*;
use crate::reduce::{self, Reduced, Statistic};
use crate::window::*;
use ndarray::{Array2, array};

/// A regular 1-degree grid spanning lon 0..w-1, lat 0..h-1, with one
/// variable `field` valued `i * 100 + j` so every cell is unique.
fn synthetic_grid(h: usize, w: usize) -> Grid {
    let lon_axis: Vec<f64> = (0..w).map(|j| j as f64).collect();
    let lat_axis: Vec<f64> = (0..h).map(|i| i as f64).collect();
    let mut grid = Grid::from_axes(&lon_axis, &lat_axis).unwrap();
    let field = Array2::from_shape_fn((h, w), |(i, j)| (i * 100 + j) as f64);
    grid.add_variable("field", field).unwrap();
    grid
}

mod grid_tests {
    use super::*;

    #[test]
    fn test_empty_axes_rejected() {
        assert!(matches!(
            Grid::from_axes(&[], &[0.0]),
            Err(GridError::EmptyGrid)
        ));
        assert!(matches!(
            Grid::from_axes(&[0.0], &[]),
            Err(GridError::EmptyGrid)
        ));
    }

    #[test]
    fn test_coordinate_shape_mismatch_rejected() {
        let lons = Array2::zeros((2, 3));
        let lats = Array2::zeros((3, 2));
        assert!(matches!(
            Grid::new(lons, lats),
            Err(GridError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_variable_shape_mismatch_rejected() {
        let mut grid = synthetic_grid(3, 3);
        let wrong = Array2::zeros((2, 3));
        assert!(matches!(
            grid.add_variable("bad", wrong),
            Err(GridError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_variable() {
        let grid = synthetic_grid(3, 3);
        assert!(matches!(
            grid.variable("missing"),
            Err(GridError::UnknownVariable(_))
        ));
    }

    #[test]
    fn test_from_axes_meshes_coordinates() {
        let grid = Grid::from_axes(&[10.0, 11.0, 12.0], &[60.0, 61.0]).unwrap();
        assert_eq!(grid.shape(), (2, 3));
        assert_eq!(grid.point_at(0, 2), Point::new(12.0, 60.0));
        assert_eq!(grid.point_at(1, 0), Point::new(10.0, 61.0));
    }
}

mod nearest_tests {
    use super::*;

    #[test]
    fn test_nearest_exact_cell() {
        let grid = synthetic_grid(5, 5);
        let idx = nearest_index(&grid, Point::new(3.0, 2.0)).unwrap();
        assert_eq!(idx, (2, 3));
    }

    #[test]
    fn test_nearest_within_cell_diagonal() {
        // For any point strictly inside a 1-degree grid, the nearest cell's
        // coordinate must be within one cell diagonal of the point.
        let grid = synthetic_grid(6, 6);
        let diagonal = 2f64.sqrt();
        for &(lon, lat) in &[(0.4, 0.7), (2.49, 2.51), (4.9, 0.1), (3.3, 4.6)] {
            let (i, j) = nearest_index(&grid, Point::new(lon, lat)).unwrap();
            let cell = grid.point_at(i, j);
            let dist = ((cell.lon - lon).powi(2) + (cell.lat - lat).powi(2)).sqrt();
            assert!(dist <= diagonal, "({}, {}) -> ({}, {})", lon, lat, i, j);
        }
    }

    #[test]
    fn test_nearest_tie_break_row_major() {
        // Two cells equidistant from the query point: the first in
        // row-major order must win, deterministically.
        let lons = array![[0.0, 2.0], [0.0, 2.0]];
        let lats = array![[0.0, 0.0], [2.0, 2.0]];
        let grid = Grid::new(lons, lats).unwrap();
        // (1, 0) is equidistant from cells (0,0), (0,1), (1,0), (1,1)
        let idx = nearest_index(&grid, Point::new(1.0, 1.0)).unwrap();
        assert_eq!(idx, (0, 0));
    }

    #[test]
    fn test_nearest_far_outside_still_returns() {
        // Plausibility of distant points is the caller's concern.
        let grid = synthetic_grid(4, 4);
        let idx = nearest_index(&grid, Point::new(500.0, -500.0)).unwrap();
        assert_eq!(idx, (0, 3));
    }
}

mod window_tests {
    use super::*;

    #[test]
    fn test_single_cell_window_equals_direct_indexing() {
        let grid = synthetic_grid(5, 5);
        let windowed = extract_window(&grid, (2, 3), (1, 1), BoundaryPolicy::Strict).unwrap();
        assert_eq!(windowed.shape(), (1, 1));
        assert_eq!(
            windowed.center_value("field").unwrap(),
            grid.variable("field").unwrap()[(2, 3)]
        );
    }

    #[test]
    fn test_window_shape_and_origin() {
        let grid = synthetic_grid(9, 9);
        let windowed = extract_window(&grid, (4, 4), (3, 5), BoundaryPolicy::Strict).unwrap();
        assert_eq!(windowed.shape(), (3, 5));
        assert_eq!(windowed.origin(), (3, 2));
        assert_eq!(windowed.center(), (1, 2));
    }

    #[test]
    fn test_even_window_extends_high_side() {
        // Extent 4 splits into 1 cell below and 2 above the center.
        let grid = synthetic_grid(9, 9);
        let windowed = extract_window(&grid, (4, 4), (4, 4), BoundaryPolicy::Strict).unwrap();
        assert_eq!(windowed.shape(), (4, 4));
        assert_eq!(windowed.origin(), (3, 3));
        assert_eq!(windowed.center(), (1, 1));
    }

    #[test]
    fn test_zero_window_rejected() {
        let grid = synthetic_grid(5, 5);
        assert!(matches!(
            extract_window(&grid, (2, 2), (0, 3), BoundaryPolicy::Strict),
            Err(GridError::NonPositiveWindow { .. })
        ));
    }

    #[test]
    fn test_center_outside_grid_rejected() {
        // A center past the grid extent is rejected under every policy
        // rather than clamped or padded away.
        let grid = synthetic_grid(5, 5);
        for policy in [
            BoundaryPolicy::Strict,
            BoundaryPolicy::Clamp,
            BoundaryPolicy::Pad,
        ] {
            assert!(matches!(
                extract_window(&grid, (7, 2), (3, 3), policy),
                Err(GridError::OutOfBounds { .. })
            ));
            assert!(matches!(
                extract_window(&grid, (2, 5), (3, 3), policy),
                Err(GridError::OutOfBounds { .. })
            ));
        }
    }

    #[test]
    fn test_strict_rejects_edge_overrun() {
        let grid = synthetic_grid(5, 5);
        assert!(matches!(
            extract_window(&grid, (0, 2), (3, 3), BoundaryPolicy::Strict),
            Err(GridError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_clamp_shrinks_at_edge() {
        let grid = synthetic_grid(5, 5);
        let windowed = extract_window(&grid, (0, 0), (3, 3), BoundaryPolicy::Clamp).unwrap();
        // One row/col below the center is clipped away
        assert_eq!(windowed.shape(), (2, 2));
        assert_eq!(windowed.origin(), (0, 0));
        assert_eq!(windowed.center(), (0, 0));
        assert_eq!(windowed.center_value("field").unwrap(), 0.0);
    }

    #[test]
    fn test_pad_fills_nan_outside_domain() {
        let grid = synthetic_grid(5, 5);
        let windowed = extract_window(&grid, (0, 0), (3, 3), BoundaryPolicy::Pad).unwrap();
        assert_eq!(windowed.shape(), (3, 3));
        assert_eq!(windowed.origin(), (-1, -1));
        assert_eq!(windowed.center(), (1, 1));
        let field = windowed.variable("field").unwrap();
        assert!(field[(0, 0)].is_nan());
        assert!(field[(0, 1)].is_nan());
        assert!(field[(1, 0)].is_nan());
        assert_eq!(field[(1, 1)], 0.0);
        assert_eq!(field[(2, 2)], 101.0);
    }

    #[test]
    fn test_round_trip_nearest_in_crop_is_center() {
        // Crop a 17x17 window around a station, then search the crop
        // itself: the nearest cell must be the window's own center.
        let grid = synthetic_grid(40, 40);
        let station = Point::new(20.3, 19.8);
        let center = nearest_index(&grid, station).unwrap();
        let windowed =
            extract_window(&grid, center, (17, 17), BoundaryPolicy::Strict).unwrap();
        assert_eq!(windowed.shape(), (17, 17));
        let inner = nearest_index(windowed.grid(), station).unwrap();
        assert_eq!(inner, windowed.center());
    }

    #[test]
    fn test_window_at_convenience() {
        let grid = synthetic_grid(10, 10);
        let windowed =
            window_at(&grid, Point::new(5.2, 4.9), (3, 3), BoundaryPolicy::Strict).unwrap();
        assert_eq!(windowed.center_value("field").unwrap(), 505.0);
    }

    #[test]
    fn test_nearest_values_map() {
        let grid = synthetic_grid(5, 5);
        let values = nearest_values(&grid, Point::new(1.1, 3.9)).unwrap();
        assert_eq!(values["field"], 401.0);
    }
}

mod reduce_tests {
    use super::*;

    #[test]
    fn test_mean_of_constant_window() {
        let window = Array2::from_elem((5, 5), 7.25);
        assert_eq!(reduce::mean(&window).unwrap(), 7.25);
    }

    #[test]
    fn test_std_of_constant_window_is_zero() {
        let window = Array2::from_elem((5, 5), 3.5);
        assert_eq!(reduce::std(&window).unwrap(), 0.0);
    }

    #[test]
    fn test_std_is_population_estimator() {
        // Population std of [1, 2, 3, 4] is sqrt(5)/2, not the
        // sample-corrected sqrt(5/3).
        let window = array![[1.0, 2.0], [3.0, 4.0]];
        let expected = (5.0f64 / 4.0).sqrt();
        assert!((reduce::std(&window).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_mean_skips_missing_values() {
        let window = array![[1.0, f64::NAN], [3.0, f64::NAN]];
        assert_eq!(reduce::mean(&window).unwrap(), 2.0);
    }

    #[test]
    fn test_all_missing_window_is_typed_error() {
        let window = Array2::from_elem((3, 3), f64::NAN);
        assert!(matches!(reduce::mean(&window), Err(GridError::AllMissing)));
        assert!(matches!(reduce::std(&window), Err(GridError::AllMissing)));
    }

    #[test]
    fn test_gradient_of_linear_ramp() {
        // Values increase by `step` per cell along each axis; the edge
        // gradient over extent n must be exactly (n - 1) * step.
        let step_x = 0.5;
        let step_y = 2.0;
        let n = 5;
        let window =
            Array2::from_shape_fn((n, n), |(i, j)| step_y * i as f64 + step_x * j as f64);
        let (gx, gy) = reduce::gradient(&window).unwrap();
        assert_eq!(gx, (n - 1) as f64 * step_x);
        assert_eq!(gy, (n - 1) as f64 * step_y);
    }

    #[test]
    fn test_gradient_even_extent_centers_low_side() {
        // Extent 4 uses center index (4 - 1) / 2 = 1, so the gradients
        // read row 1 and column 1, not row/column 2.
        let window = Array2::from_shape_fn((4, 4), |(i, j)| (i * j) as f64);
        let (gx, gy) = reduce::gradient(&window).unwrap();
        assert_eq!(gx, 3.0);
        assert_eq!(gy, 3.0);
    }

    #[test]
    fn test_gradient_degenerate_window() {
        let row = Array2::from_elem((1, 5), 1.0);
        assert!(matches!(
            reduce::gradient(&row),
            Err(GridError::DegenerateWindow {
                axis: "lat",
                extent: 1
            })
        ));
        let col = Array2::from_elem((5, 1), 1.0);
        assert!(matches!(
            reduce::gradient(&col),
            Err(GridError::DegenerateWindow {
                axis: "lon",
                extent: 1
            })
        ));
    }

    #[test]
    fn test_reduce_dispatch() {
        let grid = synthetic_grid(7, 7);
        let windowed = extract_window(&grid, (3, 3), (3, 3), BoundaryPolicy::Strict).unwrap();
        match reduce::reduce(&windowed, "field", Statistic::Nearest).unwrap() {
            Reduced::Scalar(v) => assert_eq!(v, 303.0),
            other => panic!("Expected scalar, got {:?}", other),
        }
        match reduce::reduce(&windowed, "field", Statistic::Gradient).unwrap() {
            // field = i * 100 + j, so 2 cells of extent give 2 and 200
            Reduced::Gradient { x, y } => {
                assert_eq!(x, 2.0);
                assert_eq!(y, 200.0);
            }
            other => panic!("Expected gradient, got {:?}", other),
        }
    }
}

mod physics_tests {
    use crate::physics::*;

    #[test]
    fn test_air_density_plausible_range() {
        // 15 C air, 10 C dew point, standard pressure
        let (rho, rh) = air_density(288.15, 283.15, 1013.25);
        assert!(rho > 1.15 && rho < 1.25, "rho = {}", rho);
        assert!(rh > 0.0 && rh <= 100.0, "rh = {}", rh);
    }

    #[test]
    fn test_air_density_saturated_air() {
        // Dew point equal to air temperature means saturation
        let (_, rh) = air_density(288.15, 288.15, 1013.25);
        assert!((rh - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_air_density_drier_air_is_denser() {
        let (rho_dry, rh_dry) = air_density(288.15, 273.15, 1013.25);
        let (rho_moist, rh_moist) = air_density(288.15, 287.15, 1013.25);
        assert!(rh_dry < rh_moist);
        assert!(rho_dry > rho_moist);
    }

    #[test]
    fn test_hh_to_vv_at_nadir_is_identity() {
        // tan(0) = 0 makes the polarization ratio exactly 1
        assert!((hh_to_vv(0.3, 0.0) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_hh_to_vv_increases_with_incidence() {
        assert!(hh_to_vv(0.3, 40.0) > hh_to_vv(0.3, 20.0));
    }

    #[test]
    fn test_normalize_nrcs_at_reference_angle() {
        // symfunc(30) = 0.776 * 30 - 31.638 = -8.358
        let s0 = -12.0;
        let expected = (s0 + (0.776 * 30.0 - 31.638)) / 2.0;
        assert!((normalize_nrcs(s0, 30.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_to_db() {
        assert_eq!(to_db(1.0), 0.0);
        assert!((to_db(0.1) + 10.0).abs() < 1e-12);
    }
}

mod input_tests {
    use super::*;

    #[test]
    fn test_job_config_from_json() {
        let json = r#"
        {
            "nc_key": "ascat_20220925.nc",
            "parquet_key": "buoy_params.parquet",
            "variables": ["sigma0_trip_fore"],
            "stations": [{"name": "buoy-1", "lon": 5.0, "lat": 65.0}],
            "window": {"ny": 17, "nx": 17},
            "boundary": "clamp",
            "statistics": ["nearest", "mean", "std", "gradient"]
        }"#;

        let config = JobConfig::from_json(json).unwrap();
        assert_eq!(config.nc_key, "ascat_20220925.nc");
        assert_eq!(config.parquet_key, "buoy_params.parquet");
        assert_eq!(config.stations.len(), 1);
        assert_eq!(config.stations[0].name, "buoy-1");
        assert_eq!(config.boundary, BoundaryPolicy::Clamp);
        assert_eq!(config.statistics.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_job_config_defaults() {
        let json = r#"
        {
            "nc_key": "input.nc",
            "parquet_key": "output.parquet",
            "variables": ["field"],
            "stations": [{"name": "b", "lon": 0.0, "lat": 0.0}]
        }"#;

        let config = JobConfig::from_json(json).unwrap();
        assert_eq!(config.lon_name, "lon");
        assert_eq!(config.lat_name, "lat");
        assert_eq!(config.window, WindowSpec { ny: 17, nx: 17 });
        assert_eq!(config.boundary, BoundaryPolicy::Strict);
        assert_eq!(config.statistics, vec![Statistic::Nearest]);
    }

    #[test]
    fn test_job_config_from_yaml() {
        let yaml = r#"
nc_key: sar.nc
parquet_key: sar.parquet
lon_name: longitude
lat_name: latitude
variables:
  - sigma0_vv
stations:
  - name: buoy-1
    lon: 5.0
    lat: 65.0
window:
  ny: 9
  nx: 9
boundary: pad
statistics:
  - mean
  - gradient
"#;

        let config = JobConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.lon_name, "longitude");
        assert_eq!(config.window, WindowSpec { ny: 9, nx: 9 });
        assert_eq!(config.boundary, BoundaryPolicy::Pad);
        assert_eq!(
            config.statistics,
            vec![Statistic::Mean, Statistic::Gradient]
        );
    }

    #[test]
    fn test_job_config_validation() {
        let mut config = JobConfig::from_json(
            r#"{
                "nc_key": "a.nc",
                "parquet_key": "a.parquet",
                "variables": ["v"],
                "stations": [{"name": "b", "lon": 0.0, "lat": 0.0}]
            }"#,
        )
        .unwrap();
        assert!(config.validate().is_ok());

        config.window = WindowSpec { ny: 0, nx: 17 };
        assert!(config.validate().is_err());

        config.window = WindowSpec::default();
        config.stations.clear();
        assert!(config.validate().is_err());
    }
}

mod extract_tests {
    use super::*;

    fn job_config(stats: Vec<Statistic>, boundary: BoundaryPolicy) -> JobConfig {
        JobConfig {
            nc_key: "unused.nc".to_string(),
            parquet_key: "unused.parquet".to_string(),
            lon_name: "lon".to_string(),
            lat_name: "lat".to_string(),
            variables: vec!["field".to_string()],
            stations: vec![StationSpec {
                name: "buoy-1".to_string(),
                lon: 4.8,
                lat: 5.1,
            }],
            window: WindowSpec { ny: 3, nx: 3 },
            boundary,
            statistics: stats,
        }
    }

    #[test]
    fn test_extract_station_all_statistics() {
        let grid = synthetic_grid(10, 10);
        let config = job_config(
            vec![
                Statistic::Nearest,
                Statistic::Mean,
                Statistic::Std,
                Statistic::Gradient,
            ],
            BoundaryPolicy::Strict,
        );

        let records = extract_stations(&grid, &config).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.grid_index, (5, 5));

        // nearest + mean + std + grad_x + grad_y
        assert_eq!(record.values.len(), 5);
        let map = record.as_map();
        assert_eq!(map["field"], 505.0);
        // The 3x3 window around a linear field has the center value as mean
        assert_eq!(map["field_mean"], 505.0);
        assert_eq!(map["field_x"], 2.0);
        assert_eq!(map["field_y"], 200.0);
        assert!(map["field_std"] > 0.0);
    }

    #[test]
    fn test_extract_station_strict_boundary_fails_near_edge() {
        let grid = synthetic_grid(10, 10);
        let mut config = job_config(vec![Statistic::Nearest], BoundaryPolicy::Strict);
        config.stations[0].lon = 0.0;
        config.stations[0].lat = 0.0;
        assert!(extract_stations(&grid, &config).is_err());
    }

    #[test]
    fn test_extract_station_clamp_boundary_succeeds_near_edge() {
        let grid = synthetic_grid(10, 10);
        let mut config = job_config(vec![Statistic::Mean], BoundaryPolicy::Clamp);
        config.stations[0].lon = 0.0;
        config.stations[0].lat = 0.0;
        let records = extract_stations(&grid, &config).unwrap();
        assert_eq!(records[0].grid_index, (0, 0));
    }

    #[test]
    fn test_all_missing_variable_degrades_to_nan() {
        let mut grid = synthetic_grid(10, 10);
        grid.add_variable("masked", Array2::from_elem((10, 10), f64::NAN))
            .unwrap();
        let mut config = job_config(vec![Statistic::Mean], BoundaryPolicy::Strict);
        config.variables = vec!["masked".to_string()];

        let records = extract_stations(&grid, &config).unwrap();
        assert!(records[0].values[0].value.is_nan());
    }

    #[test]
    fn test_records_to_dataframe_layout() {
        let grid = synthetic_grid(10, 10);
        let config = job_config(
            vec![Statistic::Nearest, Statistic::Gradient],
            BoundaryPolicy::Strict,
        );
        let records = extract_stations(&grid, &config).unwrap();
        let df = records_to_dataframe(&records).unwrap();

        // One variable, nearest + grad_x + grad_y
        assert_eq!(df.shape(), (3, 8));
        let names: Vec<&str> = df.get_column_names_str();
        assert_eq!(
            names,
            vec![
                "station",
                "lon",
                "lat",
                "grid_i",
                "grid_j",
                "variable",
                "statistic",
                "value"
            ]
        );
    }
}

/// Writes a small NetCDF file with 1-D lon/lat axes and one variable
/// carrying a leading unit time dimension, like an ASCAT granule. The
/// stop sensing time is deliberately malformed.
fn write_test_file(path: &std::path::Path) {
    let mut file = netcdf::create(path).unwrap();
    file.add_dimension("time", 1).unwrap();
    file.add_dimension("lat", 4).unwrap();
    file.add_dimension("lon", 3).unwrap();

    file.add_attribute("start_sensing_time", "2022-09-25T10:30:00Z")
        .unwrap();
    file.add_attribute("stop_sensing_time", "not-a-timestamp")
        .unwrap();

    let mut lat = file.add_variable::<f64>("lat", &["lat"]).unwrap();
    lat.put_values(&[60.0, 61.0, 62.0, 63.0], ..).unwrap();

    let mut lon = file.add_variable::<f64>("lon", &["lon"]).unwrap();
    lon.put_values(&[4.0, 5.0, 6.0], ..).unwrap();

    let mut var = file
        .add_variable::<f64>("sigma0", &["time", "lat", "lon"])
        .unwrap();
    var.put_attribute("units", "dB").unwrap();
    let values: Vec<f64> = (0..12).map(|v| v as f64).collect();
    var.put_values(&values, ..).unwrap();
}

mod dataset_tests {
    use super::*;
    use crate::dataset::{load_grid, sensing_times};
    use tempfile::tempdir;

    #[test]
    fn test_load_grid_squeezes_unit_time_dimension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.nc");
        write_test_file(&path);

        let file = netcdf::open(&path).unwrap();
        let grid = load_grid(&file, "lon", "lat", &["sigma0".to_string()]).unwrap();
        assert_eq!(grid.shape(), (4, 3));
        assert_eq!(grid.point_at(1, 2), Point::new(6.0, 61.0));
        assert_eq!(grid.variable("sigma0").unwrap()[(1, 2)], 5.0);

        // End to end: nearest lookup against the loaded grid
        let idx = nearest_index(&grid, Point::new(5.1, 61.9)).unwrap();
        assert_eq!(idx, (2, 1));
    }

    #[test]
    fn test_load_grid_missing_variable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.nc");
        write_test_file(&path);

        let file = netcdf::open(&path).unwrap();
        let result = load_grid(&file, "lon", "lat", &["nonexistent".to_string()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_sensing_times_from_global_attributes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.nc");
        write_test_file(&path);

        let file = netcdf::open(&path).unwrap();
        let times = sensing_times(&file);
        assert_eq!(
            times.start.unwrap().to_rfc3339(),
            "2022-09-25T10:30:00+00:00"
        );
        // Unparseable timestamps are dropped, not fatal
        assert!(times.stop.is_none());
    }

    #[test]
    fn test_sensing_times_absent_attributes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bare.nc");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_dimension("lat", 2).unwrap();
            let mut lat = file.add_variable::<f64>("lat", &["lat"]).unwrap();
            lat.put_values(&[60.0, 61.0], ..).unwrap();
        }

        let file = netcdf::open(&path).unwrap();
        let times = sensing_times(&file);
        assert!(times.start.is_none());
        assert!(times.stop.is_none());
    }
}

mod info_tests {
    use super::*;
    use crate::info::{format_human, get_dataset_info};
    use tempfile::tempdir;

    #[test]
    fn test_get_dataset_info() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.nc");
        write_test_file(&path);

        let info = tokio_test::block_on(get_dataset_info(
            path.to_str().unwrap(),
            None,
            true,
        ))
        .unwrap();

        assert_eq!(info.dimensions.len(), 3);
        let sigma0 = info
            .variables
            .iter()
            .find(|v| v.name == "sigma0")
            .unwrap();
        assert_eq!(sigma0.dimensions, vec!["time", "lat", "lon"]);
        assert_eq!(sigma0.shape, vec![1, 4, 3]);
        assert_eq!(
            sigma0.attributes.get("units").map(String::as_str),
            Some("dB")
        );
        assert_eq!(
            info.start_sensing_time.as_deref(),
            Some("2022-09-25T10:30:00+00:00")
        );
        assert!(info.stop_sensing_time.is_none());
    }

    #[test]
    fn test_get_dataset_info_variable_filter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.nc");
        write_test_file(&path);

        let info = tokio_test::block_on(get_dataset_info(
            path.to_str().unwrap(),
            Some("sigma0"),
            false,
        ))
        .unwrap();
        assert_eq!(info.variables.len(), 1);
        assert_eq!(info.variables[0].name, "sigma0");

        let missing = tokio_test::block_on(get_dataset_info(
            path.to_str().unwrap(),
            Some("nonexistent"),
            false,
        ));
        assert!(missing.is_err());
    }

    #[test]
    fn test_format_human_rendering() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.nc");
        write_test_file(&path);

        let info = tokio_test::block_on(get_dataset_info(
            path.to_str().unwrap(),
            None,
            true,
        ))
        .unwrap();
        let rendered = format_human(&info);
        assert!(rendered.contains("Sensing start: 2022-09-25T10:30:00+00:00"));
        assert!(rendered.contains("lat: 4"));
        assert!(rendered.contains("sigma0 (time, lat, lon): [1, 4, 3]"));
        assert!(rendered.contains("units = dB"));
    }
}

mod storage_tests {
    use crate::storage::{LocalStorage, StorageBackend, parse_s3_path, stage_input};

    #[test]
    fn test_parse_s3_path() {
        let (bucket, key) = parse_s3_path("s3://my-bucket/granules/a.nc").unwrap();
        assert_eq!(bucket, "my-bucket");
        assert_eq!(key, "granules/a.nc");

        assert!(parse_s3_path("s3://bucket-only").is_err());
        assert!(parse_s3_path("s3:///no-bucket").is_err());
        assert!(parse_s3_path("/local/path.nc").is_err());
    }

    #[test]
    fn test_local_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let path_str = path.to_str().unwrap();

        tokio_test::block_on(async {
            let storage = LocalStorage;
            assert!(!storage.exists(path_str).await.unwrap());
            storage.write(path_str, b"payload").await.unwrap();
            assert!(storage.exists(path_str).await.unwrap());
            assert_eq!(storage.read(path_str).await.unwrap(), b"payload");
        });
    }

    #[test]
    fn test_stage_input_local_passthrough() {
        tokio_test::block_on(async {
            let (path, guard) = stage_input("local/file.nc").await.unwrap();
            assert_eq!(path, std::path::PathBuf::from("local/file.nc"));
            assert!(guard.is_none());
        });
    }
}

mod pipeline_tests {
    use super::*;
    use crate::process_extraction_job;
    use tempfile::tempdir;

    #[test]
    fn test_process_extraction_job_end_to_end() {
        let dir = tempdir().unwrap();
        let nc_path = dir.path().join("input.nc");
        let parquet_path = dir.path().join("output.parquet");

        {
            let mut file = netcdf::create(&nc_path).unwrap();
            file.add_dimension("lat", 8).unwrap();
            file.add_dimension("lon", 8).unwrap();
            let mut lat = file.add_variable::<f64>("lat", &["lat"]).unwrap();
            lat.put_values(&(0..8).map(|v| 60.0 + v as f64).collect::<Vec<_>>(), ..)
                .unwrap();
            let mut lon = file.add_variable::<f64>("lon", &["lon"]).unwrap();
            lon.put_values(&(0..8).map(|v| v as f64).collect::<Vec<_>>(), ..)
                .unwrap();
            let mut var = file.add_variable::<f64>("wspd", &["lat", "lon"]).unwrap();
            var.put_values(&(0..64).map(|v| v as f64 / 10.0).collect::<Vec<_>>(), ..)
                .unwrap();
        }

        let config = JobConfig {
            nc_key: nc_path.to_str().unwrap().to_string(),
            parquet_key: parquet_path.to_str().unwrap().to_string(),
            lon_name: "lon".to_string(),
            lat_name: "lat".to_string(),
            variables: vec!["wspd".to_string()],
            stations: vec![StationSpec {
                name: "buoy-1".to_string(),
                lon: 3.2,
                lat: 63.9,
            }],
            window: WindowSpec { ny: 3, nx: 3 },
            boundary: BoundaryPolicy::Strict,
            statistics: vec![Statistic::Nearest, Statistic::Mean],
        };

        process_extraction_job(&config).unwrap();
        assert!(parquet_path.exists());
    }
}
