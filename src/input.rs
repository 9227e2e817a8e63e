//! # Input Configuration Module
//!
//! This module provides configuration parsing and validation for nc2json jobs.
//! It handles JSON and YAML configuration files that specify the NetCDF input
//! file, the field to extract, the bounding box and the JSON destination.
//!
//! ## Configuration Structure
//!
//! A configuration file specifies:
//! - **nc_key**: Path to the input NetCDF file
//! - **json_key**: Path for the output JSON file
//! - **variable_name**: Field to extract (optional, defaults to the first data variable)
//! - **bbox**: Longitude and latitude bounds, inclusive
//! - **lat_name** / **lon_name**: Names of the coordinate axes
//! - **pretty** / **overwrite**: Output options
//!
//! Every key is optional; missing keys take the values of [`JobConfig::default`],
//! which reproduce the South Atlantic age-grid export.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use nc2json::input::JobConfig;
//!
//! // Load from file
//! let config = JobConfig::from_file("config.yaml")?;
//!
//! // Load from JSON string
//! let json = r#"
//! {
//!   "nc_key": "age.nc",
//!   "json_key": "age.json",
//!   "bbox": {"lon_min": -70.0, "lon_max": 20.0, "lat_min": -60.0, "lat_max": 20.0}
//! }"#;
//! let config = JobConfig::from_json(json)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::error::{Nc2JsonError, Nc2JsonResult};
use crate::loader::AxisNames;
use crate::output::WriteOptions;
use crate::region::BoundingBox;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_NC_KEY: &str = "age.2020.1.GTS2012.6m.nc";
pub const DEFAULT_JSON_KEY: &str = "age_SAtl_6m.json";

/// Main configuration structure for nc2json jobs.
///
/// # Examples
///
/// ```rust
/// use nc2json::input::JobConfig;
/// use nc2json::region::BoundingBox;
///
/// let config = JobConfig {
///     nc_key: "age_grid.nc".to_string(),
///     json_key: "pacific.json".to_string(),
///     variable_name: Some("z".to_string()),
///     bbox: BoundingBox::new(150.0, 200.0, -30.0, 30.0),
///     ..JobConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct JobConfig {
    /// Path to the input NetCDF file
    pub nc_key: String,
    /// Path for the output JSON file
    pub json_key: String,
    /// Field to extract; the first data variable when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_name: Option<String>,
    /// Region to crop, inclusive on all edges
    pub bbox: BoundingBox,
    /// Name of the latitude dimension and coordinate variable
    pub lat_name: String,
    /// Name of the longitude dimension and coordinate variable
    pub lon_name: String,
    /// Indent the output JSON
    pub pretty: bool,
    /// Replace an existing output file
    pub overwrite: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        JobConfig {
            nc_key: DEFAULT_NC_KEY.to_string(),
            json_key: DEFAULT_JSON_KEY.to_string(),
            variable_name: None,
            bbox: BoundingBox::default(),
            lat_name: "lat".to_string(),
            lon_name: "lon".to_string(),
            pretty: false,
            overwrite: true,
        }
    }
}

impl JobConfig {
    /// Loads a job configuration from a JSON or YAML file.
    ///
    /// The format is chosen by extension: `.yaml` / `.yml` are YAML, anything
    /// else is JSON.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use nc2json::input::JobConfig;
    ///
    /// let config = JobConfig::from_file("south_atlantic.json")?;
    /// println!("Cropping: {:?}", config.bbox);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Nc2JsonResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        if is_yaml {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    /// Loads a job configuration from a JSON string.
    pub fn from_json(json_str: &str) -> Nc2JsonResult<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Nc2JsonError::Config(format!("invalid JSON configuration: {}", e)))
    }

    /// Loads a job configuration from a YAML string.
    pub fn from_yaml(yaml_str: &str) -> Nc2JsonResult<Self> {
        serde_yaml::from_str(yaml_str)
            .map_err(|e| Nc2JsonError::Config(format!("invalid YAML configuration: {}", e)))
    }

    pub fn to_json(&self) -> Nc2JsonResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Nc2JsonError::Config(format!("failed to encode JSON: {}", e)))
    }

    pub fn to_yaml(&self) -> Nc2JsonResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| Nc2JsonError::Config(format!("failed to encode YAML: {}", e)))
    }

    /// Checks paths, axis names and bounding box.
    ///
    /// # Errors
    ///
    /// [`Nc2JsonError::Config`] for an empty path or axis name, a non-finite
    /// bound, or a minimum greater than its maximum.
    pub fn validate(&self) -> Nc2JsonResult<()> {
        let required = [
            ("nc_key", &self.nc_key),
            ("json_key", &self.json_key),
            ("lat_name", &self.lat_name),
            ("lon_name", &self.lon_name),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Nc2JsonError::Config(format!("'{}' must not be empty", key)));
            }
        }
        if let Some(name) = &self.variable_name
            && name.trim().is_empty()
        {
            return Err(Nc2JsonError::Config("'variable_name' must not be empty".to_string()));
        }

        let b = &self.bbox;
        if ![b.lon_min, b.lon_max, b.lat_min, b.lat_max]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(Nc2JsonError::Config(format!("bounding box has a non-finite bound: {:?}", b)));
        }
        if b.lon_min > b.lon_max {
            return Err(Nc2JsonError::Config(format!(
                "lon_min ({}) is greater than lon_max ({})",
                b.lon_min, b.lon_max
            )));
        }
        if b.lat_min > b.lat_max {
            return Err(Nc2JsonError::Config(format!(
                "lat_min ({}) is greater than lat_max ({})",
                b.lat_min, b.lat_max
            )));
        }
        Ok(())
    }

    pub fn axis_names(&self) -> AxisNames {
        AxisNames::new(&self.lat_name, &self.lon_name)
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            pretty: self.pretty,
            overwrite: self.overwrite,
        }
    }
}
