//! # CLI Module
//!
//! Command-line interface for satcrop:
//! - Argument parsing with clap
//! - Configuration file loading (JSON/YAML) with CLI and `SATCROP_`
//!   environment overrides (priority: CLI > environment > config file)
//! - Subcommands for extraction, inspection, validation, templates, and
//!   shell completions
//! - Progress reporting over the station loop

use crate::extract::{extract_station, records_to_dataframe};
use crate::info::{format_human, get_dataset_info};
use crate::input::{JobConfig, StationSpec, WindowSpec};
use crate::output::write_dataframe_to_parquet_async;
use crate::reduce::Statistic;
use crate::storage::{StorageBackend as _, StorageFactory, stage_input};
use crate::window::BoundaryPolicy;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::env;
use std::path::PathBuf;

/// Extract satellite and meteorological parameters at buoy stations
#[derive(Parser, Debug)]
#[command(name = "satcrop")]
#[command(about = "Extract gridded satellite/met parameters at station locations")]
#[command(version)]
#[command(long_about = "
satcrop extracts named variables from gridded NetCDF datasets (ASCAT, SAR,
ERA5 fields) at or around buoy station locations: the nearest grid cell, a
square crop window, and windowed statistics (mean, std, edge gradient).
Results are written as a long-format Parquet table.

EXAMPLES:
  # Nearest-cell extraction of one variable at one buoy
  satcrop extract ascat.nc params.parquet -n sigma0_trip_fore \\
    --station 'buoy-1:5.0:65.0'

  # 17x17 crop statistics with clamping at the swath edge
  satcrop extract ascat.nc params.parquet -n sigma0_trip_fore \\
    --station 'buoy-1:5.0:65.0' --window 17x17 --boundary clamp \\
    --stat mean --stat std --stat gradient

  # Using a config file
  satcrop extract --config job.yaml

  # File inspection
  satcrop info ascat.nc --detailed

  # Generate a config template
  satcrop template ascat --format yaml > job.yaml
")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode - suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file path (JSON or YAML)
    #[arg(short, long, global = true, env = "SATCROP_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract station parameters from a NetCDF dataset
    Extract {
        /// Input NetCDF file path (local or S3)
        #[arg(value_name = "INPUT", env = "SATCROP_INPUT")]
        input: Option<String>,

        /// Output Parquet file path (local or S3)
        #[arg(value_name = "OUTPUT", env = "SATCROP_OUTPUT")]
        output: Option<String>,

        /// Variable to extract (repeatable)
        #[arg(short = 'n', long = "variable")]
        variables: Vec<String>,

        /// Station to extract at: name:lon:lat (repeatable)
        #[arg(long = "station", value_parser = parse_station)]
        stations: Vec<StationSpec>,

        /// Crop window extent: NYxNX or a single odd N
        #[arg(long = "window", value_parser = parse_window, env = "SATCROP_WINDOW")]
        window: Option<WindowSpec>,

        /// Edge handling for windows near the domain boundary
        #[arg(long, value_enum, env = "SATCROP_BOUNDARY")]
        boundary: Option<BoundaryArg>,

        /// Statistic to compute per variable (repeatable)
        #[arg(long = "stat", value_enum)]
        stats: Vec<StatArg>,

        /// Name of the longitude coordinate variable
        #[arg(long, env = "SATCROP_LON_NAME")]
        lon_name: Option<String>,

        /// Name of the latitude coordinate variable
        #[arg(long, env = "SATCROP_LAT_NAME")]
        lat_name: Option<String>,

        /// Force overwrite existing output files
        #[arg(long, env = "SATCROP_FORCE")]
        force: bool,

        /// Dry run - validate configuration without processing
        #[arg(long, env = "SATCROP_DRY_RUN")]
        dry_run: bool,
    },

    /// Validate a configuration file without processing
    Validate {
        /// Configuration file to validate
        config_file: Option<PathBuf>,

        /// Show the resolved configuration
        #[arg(long)]
        detailed: bool,
    },

    /// Show information about a NetCDF dataset
    Info {
        /// NetCDF file path (local or S3)
        file: String,

        /// Show variable attributes
        #[arg(long)]
        detailed: bool,

        /// Show only a specific variable
        #[arg(short = 'n', long)]
        variable: Option<String>,

        /// Output format for file information
        #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
        format: OutputFormat,
    },

    /// Generate configuration templates
    Template {
        /// Template type to generate
        #[arg(value_enum)]
        template_type: TemplateType,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration format
        #[arg(long, value_enum, default_value_t = ConfigFormat::Json)]
        format: ConfigFormat,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON structured output
    Json,
    /// YAML structured output
    Yaml,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryArg {
    /// Fail on windows that exceed the grid
    Strict,
    /// Shrink windows to the valid range
    Clamp,
    /// Pad out-of-domain cells with NaN
    Pad,
}

impl From<BoundaryArg> for BoundaryPolicy {
    fn from(arg: BoundaryArg) -> Self {
        match arg {
            BoundaryArg::Strict => BoundaryPolicy::Strict,
            BoundaryArg::Clamp => BoundaryPolicy::Clamp,
            BoundaryArg::Pad => BoundaryPolicy::Pad,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatArg {
    Nearest,
    Mean,
    Std,
    Gradient,
}

impl From<StatArg> for Statistic {
    fn from(arg: StatArg) -> Self {
        match arg {
            StatArg::Nearest => Statistic::Nearest,
            StatArg::Mean => Statistic::Mean,
            StatArg::Std => Statistic::Std,
            StatArg::Gradient => Statistic::Gradient,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateType {
    /// Minimal nearest-cell extraction
    Basic,
    /// S3 input/output paths
    S3,
    /// ASCAT triplet-beam crop statistics
    Ascat,
    /// SAR NRCS crop with padding
    Sar,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON configuration format
    Json,
    /// YAML configuration format
    Yaml,
}

/// Parse a station argument: name:lon:lat
fn parse_station(s: &str) -> Result<StationSpec, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 {
        return Err("Station must be in format 'name:lon:lat'".to_string());
    }
    let name = parts[0].trim().to_string();
    if name.is_empty() {
        return Err("Station name cannot be empty".to_string());
    }
    let lon = parts[1]
        .parse::<f64>()
        .map_err(|_| "Invalid longitude value")?;
    let lat = parts[2]
        .parse::<f64>()
        .map_err(|_| "Invalid latitude value")?;
    Ok(StationSpec { name, lon, lat })
}

/// Parse a window argument: 'NYxNX' or a single 'N' used for both axes
fn parse_window(s: &str) -> Result<WindowSpec, String> {
    let parse_extent = |v: &str| {
        v.trim()
            .parse::<usize>()
            .map_err(|_| format!("Invalid window extent '{}'", v))
            .and_then(|n| {
                if n == 0 {
                    Err("Window extent must be positive".to_string())
                } else {
                    Ok(n)
                }
            })
    };
    match s.split_once(['x', 'X']) {
        Some((ny, nx)) => Ok(WindowSpec {
            ny: parse_extent(ny)?,
            nx: parse_extent(nx)?,
        }),
        None => {
            let n = parse_extent(s)?;
            Ok(WindowSpec { ny: n, nx: n })
        }
    }
}

/// Parse station list from the SATCROP_STATIONS environment variable.
/// Format: "name1:lon1:lat1;name2:lon2:lat2"
pub fn parse_stations_from_env() -> Result<Vec<StationSpec>, String> {
    let mut stations = Vec::new();
    if let Ok(env_val) = env::var("SATCROP_STATIONS")
        && !env_val.trim().is_empty()
    {
        for station_str in env_val.split(';') {
            let station_str = station_str.trim();
            if !station_str.is_empty() {
                stations.push(parse_station(station_str).map_err(|e| {
                    format!("Invalid station in SATCROP_STATIONS: {}", e)
                })?);
            }
        }
    }
    Ok(stations)
}

/// Parse variable list from the SATCROP_VARIABLES environment variable.
/// Format: "var1,var2,var3"
pub fn parse_variables_from_env() -> Vec<String> {
    match env::var("SATCROP_VARIABLES") {
        Ok(env_val) => env_val
            .split(',')
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Resolves the effective job configuration from a config file (when given)
/// and CLI/environment overrides. CLI values win over environment values,
/// which win over the config file.
#[allow(clippy::too_many_arguments)]
pub fn resolve_config(
    config_path: Option<&PathBuf>,
    input: Option<String>,
    output: Option<String>,
    variables: Vec<String>,
    stations: Vec<StationSpec>,
    window: Option<WindowSpec>,
    boundary: Option<BoundaryArg>,
    stats: Vec<StatArg>,
    lon_name: Option<String>,
    lat_name: Option<String>,
) -> Result<JobConfig, Box<dyn std::error::Error>> {
    let mut config = match config_path {
        Some(path) => JobConfig::from_file(path)?,
        None => JobConfig {
            nc_key: String::new(),
            parquet_key: String::new(),
            lon_name: "lon".to_string(),
            lat_name: "lat".to_string(),
            variables: Vec::new(),
            stations: Vec::new(),
            window: WindowSpec::default(),
            boundary: BoundaryPolicy::default(),
            statistics: vec![Statistic::Nearest],
        },
    };

    if let Some(input) = input {
        config.nc_key = input;
    }
    if let Some(output) = output {
        config.parquet_key = output;
    }

    let variables = if variables.is_empty() {
        parse_variables_from_env()
    } else {
        variables
    };
    if !variables.is_empty() {
        config.variables = variables;
    }

    let stations = if stations.is_empty() {
        parse_stations_from_env()?
    } else {
        stations
    };
    if !stations.is_empty() {
        config.stations = stations;
    }

    if let Some(window) = window {
        config.window = window;
    }
    if let Some(boundary) = boundary {
        config.boundary = boundary.into();
    }
    if !stats.is_empty() {
        config.statistics = stats.into_iter().map(Statistic::from).collect();
    }
    if let Some(lon_name) = lon_name {
        config.lon_name = lon_name;
    }
    if let Some(lat_name) = lat_name {
        config.lat_name = lat_name;
    }

    if config.nc_key.is_empty() {
        return Err("No input NetCDF path given (argument, SATCROP_INPUT, or config file)".into());
    }
    if config.parquet_key.is_empty() {
        return Err(
            "No output Parquet path given (argument, SATCROP_OUTPUT, or config file)".into(),
        );
    }
    Ok(config)
}

/// Progress bar for the station loop; hidden under `--quiet` so the only
/// remaining output is error logging.
fn station_progress(len: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

/// Runs the extract subcommand: stage input, load the grid, loop stations
/// with a progress bar, write Parquet output.
pub async fn run_extract(
    config: JobConfig,
    force: bool,
    dry_run: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    crate::log::config_echo(&config);

    if dry_run {
        info!("Dry run: configuration is valid, no data processed");
        return Ok(());
    }

    let storage = StorageFactory::from_path(&config.parquet_key).await?;
    if !force && storage.exists(&config.parquet_key).await? {
        return Err(format!(
            "Output '{}' already exists (use --force to overwrite)",
            config.parquet_key
        )
        .into());
    }

    let (local_path, _guard) = stage_input(&config.nc_key).await?;
    let file = netcdf::open(&local_path)?;
    crate::log::show_dataset_summary(&file);

    let grid = crate::dataset::load_grid(
        &file,
        &config.lon_name,
        &config.lat_name,
        &config.variables,
    )?;
    let times = crate::dataset::sensing_times(&file);
    if let Some(start) = times.start {
        info!("Sensing start: {}", start.to_rfc3339());
    }

    let bar = station_progress(config.stations.len() as u64, quiet);
    let mut records = Vec::with_capacity(config.stations.len());
    for station in &config.stations {
        bar.set_message(station.name.clone());
        records.push(extract_station(&grid, station, &config)?);
        bar.inc(1);
    }
    bar.finish_and_clear();

    for record in &records {
        info!(
            "Station '{}' mapped to grid cell ({}, {}) at ({:.4}, {:.4})",
            record.station.name,
            record.grid_index.0,
            record.grid_index.1,
            record.cell.lon,
            record.cell.lat
        );
    }

    let df = records_to_dataframe(&records)?;
    write_dataframe_to_parquet_async(&df, &config.parquet_key).await?;
    file.close()?;

    info!("Wrote {} rows to {}", df.height(), config.parquet_key);
    Ok(())
}

/// Runs the validate subcommand.
pub fn run_validate(
    config_file: Option<&PathBuf>,
    global_config: Option<&PathBuf>,
    detailed: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_file
        .or(global_config)
        .ok_or("No configuration file given")?;
    let config = JobConfig::from_file(path)?;
    config.validate()?;
    info!("Configuration '{}' is valid", path.display());
    if detailed {
        println!("{}", config.to_string_pretty(false)?);
    }
    Ok(())
}

/// Runs the info subcommand.
pub async fn run_info(
    file: &str,
    detailed: bool,
    variable: Option<&str>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let dataset_info = get_dataset_info(file, variable, detailed).await?;
    match format {
        OutputFormat::Human => print!("{}", format_human(&dataset_info)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dataset_info)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&dataset_info)?),
    }
    Ok(())
}

/// Runs the template subcommand.
pub fn run_template(
    template_type: TemplateType,
    output: Option<&PathBuf>,
    format: ConfigFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = template_config(template_type);
    let rendered = config.to_string_pretty(format == ConfigFormat::Yaml)?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            info!("Wrote template to {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn template_config(template_type: TemplateType) -> JobConfig {
    let station = StationSpec {
        name: "buoy-1".to_string(),
        lon: 5.0,
        lat: 65.0,
    };
    match template_type {
        TemplateType::Basic => JobConfig {
            nc_key: "input.nc".to_string(),
            parquet_key: "output.parquet".to_string(),
            lon_name: "lon".to_string(),
            lat_name: "lat".to_string(),
            variables: vec!["sigma0_trip_fore".to_string()],
            stations: vec![station],
            window: WindowSpec { ny: 1, nx: 1 },
            boundary: BoundaryPolicy::Strict,
            statistics: vec![Statistic::Nearest],
        },
        TemplateType::S3 => JobConfig {
            nc_key: "s3://my-bucket/granules/ascat_20220925.nc".to_string(),
            parquet_key: "s3://my-bucket/extracted/buoy_params.parquet".to_string(),
            lon_name: "lon".to_string(),
            lat_name: "lat".to_string(),
            variables: vec!["sigma0_trip_fore".to_string()],
            stations: vec![station],
            window: WindowSpec::default(),
            boundary: BoundaryPolicy::Strict,
            statistics: vec![Statistic::Nearest, Statistic::Mean],
        },
        TemplateType::Ascat => JobConfig {
            nc_key: "ascat_20220925.nc".to_string(),
            parquet_key: "ascat_buoy_params.parquet".to_string(),
            lon_name: "lon".to_string(),
            lat_name: "lat".to_string(),
            variables: vec![
                "sigma0_trip_fore".to_string(),
                "sigma0_trip_mid".to_string(),
                "sigma0_trip_aft".to_string(),
                "inc_angle_trip_fore".to_string(),
                "inc_angle_trip_mid".to_string(),
                "inc_angle_trip_aft".to_string(),
                "azi_angle_trip_fore".to_string(),
                "azi_angle_trip_mid".to_string(),
                "azi_angle_trip_aft".to_string(),
            ],
            stations: vec![station],
            window: WindowSpec::default(),
            boundary: BoundaryPolicy::Strict,
            statistics: vec![Statistic::Nearest, Statistic::Mean, Statistic::Std],
        },
        TemplateType::Sar => JobConfig {
            nc_key: "s1a_iw_grdh.nc".to_string(),
            parquet_key: "sar_buoy_params.parquet".to_string(),
            lon_name: "longitude".to_string(),
            lat_name: "latitude".to_string(),
            variables: vec!["sigma0_vv".to_string(), "incidence_angle".to_string()],
            stations: vec![station],
            window: WindowSpec::default(),
            boundary: BoundaryPolicy::Pad,
            statistics: vec![
                Statistic::Nearest,
                Statistic::Mean,
                Statistic::Std,
                Statistic::Gradient,
            ],
        },
    }
}

/// Runs the completions subcommand.
pub fn run_completions(
    shell: Shell,
    output: Option<&PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    use clap::CommandFactory;
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    match output {
        Some(path) => {
            let mut file = std::fs::File::create(path)?;
            clap_complete::generate(shell, &mut cmd, name, &mut file);
        }
        None => {
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        }
    }
    Ok(())
}

/// Dispatches a parsed command line.
pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Extract {
            input,
            output,
            variables,
            stations,
            window,
            boundary,
            stats,
            lon_name,
            lat_name,
            force,
            dry_run,
        } => {
            let config = resolve_config(
                cli.config.as_ref(),
                input,
                output,
                variables,
                stations,
                window,
                boundary,
                stats,
                lon_name,
                lat_name,
            )?;
            run_extract(config, force, dry_run, cli.quiet).await
        }
        Commands::Validate {
            config_file,
            detailed,
        } => run_validate(config_file.as_ref(), cli.config.as_ref(), detailed),
        Commands::Info {
            file,
            detailed,
            variable,
            format,
        } => run_info(&file, detailed, variable.as_deref(), format).await,
        Commands::Template {
            template_type,
            output,
            format,
        } => run_template(template_type, output.as_ref(), format),
        Commands::Completions { shell, output } => run_completions(shell, output.as_ref()),
    }
}
