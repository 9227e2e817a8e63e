//! # CLI Module
//!
//! This module provides the command-line interface for nc2json, including:
//! - Argument parsing with clap
//! - Configuration file loading (JSON/YAML)
//! - Environment variable support with the NC2JSON_ prefix
//! - Merging of configuration sources with a fixed priority
//! - Subcommands for export, validation, inspection and templates
//!
//! Priority, highest first: command-line flags, `NC2JSON_*` environment
//! variables, configuration file, built-in defaults.

use crate::input::JobConfig;
use crate::region::BoundingBox;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Crop a lat/lon NetCDF raster to a bounding box and export it as strict JSON
#[derive(Parser, Debug)]
#[command(name = "nc2json")]
#[command(about = "Export a bounding box of a NetCDF raster field as strict JSON")]
#[command(version)]
#[command(long_about = "
nc2json crops a latitude/longitude raster field (for example a seafloor age grid)
from a NetCDF file to a bounding box and writes it as a JSON document.

NaN, infinite and masked cells are written as null, and the writer refuses to
emit any non-finite number, so the output is always strictly valid JSON.

EXAMPLES:
  # South Atlantic export with the built-in defaults
  nc2json convert

  # Explicit input, output and box (lon_min:lon_max:lat_min:lat_max)
  nc2json convert age.nc pacific.json --bbox 150:200:-30:30

  # Using a config file
  nc2json --config south_atlantic.yaml convert

  # Find the field name and coordinate ranges
  nc2json info age.nc
")]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file path (JSON or YAML)
    #[arg(short, long, global = true, env = "NC2JSON_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a bounding box of a NetCDF field to JSON
    #[command(long_about = "
Export a bounding box of a NetCDF field to JSON.

Bounds are inclusive and matched against coordinate values. Latitude axes
stored north-to-south are handled automatically. An empty crop is an error.

EXAMPLES:
  # Defaults: age.2020.1.GTS2012.6m.nc -> age_SAtl_6m.json, lon -70..20, lat -60..20
  nc2json convert

  # Named field, custom axes
  nc2json convert grid.nc out.json -n z --lat-name latitude --lon-name longitude

  # Refuse to replace an existing output
  nc2json convert age.nc out.json --no-clobber

  # Validate the merged configuration without processing
  nc2json convert --config job.json --dry-run
")]
    Convert(ConvertArgs),

    /// Validate a configuration file
    Validate {
        /// Configuration file to validate (defaults to --config)
        config_file: Option<PathBuf>,
    },

    /// Show information about a NetCDF file
    Info {
        /// NetCDF file path
        file: String,

        /// Show only this variable
        #[arg(short = 'n', long)]
        variable: Option<String>,

        /// Include global attributes
        #[arg(long)]
        detailed: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
        format: OutputFormat,
    },

    /// Print a configuration template with the default values
    Template {
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

/// Arguments of the `convert` command. Every field overrides the matching
/// configuration key when set.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ConvertArgs {
    /// Input NetCDF file path
    #[arg(value_name = "INPUT", env = "NC2JSON_INPUT")]
    pub input: Option<String>,

    /// Output JSON file path
    #[arg(value_name = "OUTPUT", env = "NC2JSON_OUTPUT")]
    pub output: Option<String>,

    /// Field to export (default: first data variable)
    #[arg(short = 'n', long, env = "NC2JSON_VARIABLE")]
    pub variable: Option<String>,

    /// Bounding box: lon_min:lon_max:lat_min:lat_max
    #[arg(long, env = "NC2JSON_BBOX", value_parser = parse_bbox, allow_hyphen_values = true)]
    pub bbox: Option<BoundingBox>,

    /// Name of the latitude axis
    #[arg(long, env = "NC2JSON_LAT_NAME")]
    pub lat_name: Option<String>,

    /// Name of the longitude axis
    #[arg(long, env = "NC2JSON_LON_NAME")]
    pub lon_name: Option<String>,

    /// Indent the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Fail instead of replacing an existing output file
    #[arg(long)]
    pub no_clobber: bool,

    /// Validate the configuration without processing
    #[arg(long)]
    pub dry_run: bool,
}

impl ConvertArgs {
    /// Applies the arguments that were given on top of `config`.
    pub fn apply_to(&self, mut config: JobConfig) -> JobConfig {
        if let Some(input) = &self.input {
            config.nc_key = input.clone();
        }
        if let Some(output) = &self.output {
            config.json_key = output.clone();
        }
        if let Some(variable) = &self.variable {
            config.variable_name = Some(variable.clone());
        }
        if let Some(bbox) = self.bbox {
            config.bbox = bbox;
        }
        if let Some(lat_name) = &self.lat_name {
            config.lat_name = lat_name.clone();
        }
        if let Some(lon_name) = &self.lon_name {
            config.lon_name = lon_name.clone();
        }
        if self.pretty {
            config.pretty = true;
        }
        if self.no_clobber {
            config.overwrite = false;
        }
        config
    }
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON structured output
    Json,
    /// YAML structured output
    Yaml,
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON configuration format
    Json,
    /// YAML configuration format
    Yaml,
}

/// Parse a bounding box from a command-line argument
/// Format: lon_min:lon_max:lat_min:lat_max
pub fn parse_bbox(s: &str) -> Result<BoundingBox, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 4 {
        return Err("Bounding box must be in format 'lon_min:lon_max:lat_min:lat_max'".to_string());
    }

    let mut bounds = [0.0f64; 4];
    let labels = ["lon_min", "lon_max", "lat_min", "lat_max"];
    for (i, part) in parts.iter().enumerate() {
        bounds[i] = part
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("Invalid {} value in bounding box: '{}'", labels[i], part))?;
        if !bounds[i].is_finite() {
            return Err(format!("{} must be a finite number", labels[i]));
        }
    }

    let [lon_min, lon_max, lat_min, lat_max] = bounds;
    if lon_min > lon_max {
        return Err("lon_min must not be greater than lon_max".to_string());
    }
    if lat_min > lat_max {
        return Err("lat_min must not be greater than lat_max".to_string());
    }

    Ok(BoundingBox::new(lon_min, lon_max, lat_min, lat_max))
}

/// Builds the job configuration for `convert`: the config file (or defaults)
/// with command-line and environment overrides applied.
pub fn resolve_job_config(config_path: Option<&PathBuf>, args: &ConvertArgs) -> crate::error::Nc2JsonResult<JobConfig> {
    let base = match config_path {
        Some(path) => JobConfig::from_file(path)?,
        None => JobConfig::default(),
    };
    let config = args.apply_to(base);
    config.validate()?;
    Ok(config)
}
