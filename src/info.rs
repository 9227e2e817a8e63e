//! # NetCDF File Information Module
//!
//! Lists the dimensions, variables and attributes of a NetCDF file, so the
//! field name and coordinate extents for an export can be looked up before
//! running it. Coordinate variables also report their range and direction.

use crate::region::AxisOrder;
use crate::source::{NetCdfSource, RasterSource};
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Information about a NetCDF dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetCdfDimensionInfo {
    pub name: String,
    pub length: usize,
    pub is_unlimited: bool,
}

/// Range of a 1-D coordinate variable
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoordinateRange {
    pub first: f64,
    pub last: f64,
    pub descending: bool,
}

/// Information about a NetCDF variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetCdfVariableInfo {
    pub name: String,
    pub data_type: String,
    pub dimensions: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub shape: Vec<usize>,
    /// Whether this variable can be exported (it is not a coordinate variable)
    pub is_data_variable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate_range: Option<CoordinateRange>,
}

/// Complete information about a NetCDF file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetCdfInfo {
    pub path: String,
    pub dimensions: Vec<NetCdfDimensionInfo>,
    pub variables: Vec<NetCdfVariableInfo>,
    pub global_attributes: BTreeMap<String, String>,
    pub file_size: Option<u64>,
    pub total_variables: usize,
    pub total_dimensions: usize,
}

/// Extract information from a NetCDF file, optionally for one variable only.
pub fn get_netcdf_info(file_path: &str, variable: Option<&str>, detailed: bool) -> Result<NetCdfInfo> {
    debug!("Inspecting NetCDF file: {}", file_path);
    let source = NetCdfSource::open(file_path)
        .with_context(|| format!("Failed to open NetCDF file: {}", file_path))?;
    let file = source.file();

    let file_size = std::fs::metadata(Path::new(file_path)).ok().map(|m| m.len());

    let dimensions: Vec<NetCdfDimensionInfo> = file
        .dimensions()
        .map(|dim| NetCdfDimensionInfo {
            name: dim.name(),
            length: dim.len(),
            is_unlimited: dim.is_unlimited(),
        })
        .collect();

    let data_variables = source.data_variables();
    let mut variables = Vec::new();
    for var in file.variables() {
        let name = var.name();
        if let Some(wanted) = variable
            && name != wanted
        {
            continue;
        }

        let mut attributes = BTreeMap::new();
        for attr in var.attributes() {
            if let Ok(value) = attr.value() {
                attributes.insert(attr.name().to_string(), format_attribute_value(&value));
            }
        }

        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let is_coordinate = dims.len() == 1 && dims[0] == name;
        let range = if is_coordinate {
            source
                .read_axis(&name)
                .ok()
                .and_then(|values| coordinate_range(&values))
        } else {
            None
        };

        variables.push(NetCdfVariableInfo {
            data_type: format!("{:?}", var.vartype()),
            shape: var.dimensions().iter().map(|d| d.len()).collect(),
            is_data_variable: data_variables.contains(&name),
            dimensions: dims,
            attributes,
            coordinate_range: range,
            name,
        });
    }

    let mut global_attributes = BTreeMap::new();
    if detailed {
        for attr in file.attributes() {
            if let Ok(value) = attr.value() {
                global_attributes.insert(attr.name().to_string(), format_attribute_value(&value));
            }
        }
    }

    source.close().context("Failed to close NetCDF file")?;

    Ok(NetCdfInfo {
        path: file_path.to_string(),
        total_dimensions: dimensions.len(),
        total_variables: variables.len(),
        dimensions,
        variables,
        global_attributes,
        file_size,
    })
}

fn coordinate_range(values: &[f64]) -> Option<CoordinateRange> {
    Some(CoordinateRange {
        first: *values.first()?,
        last: *values.last()?,
        descending: AxisOrder::detect(values) == AxisOrder::Descending,
    })
}

fn format_attribute_value(value: &netcdf::AttributeValue) -> String {
    match value {
        netcdf::AttributeValue::Str(s) => s.clone(),
        other => format!("{:?}", other),
    }
}

/// Print NetCDF info in human-readable format
pub fn print_file_info_human(info: &NetCdfInfo) {
    println!("NetCDF File Information:");
    println!("  Path: {}", info.path);
    if let Some(size) = info.file_size {
        println!("  File Size: {:.2} MB", size as f64 / 1_048_576.0);
    }
    println!("  Dimensions: {} total", info.total_dimensions);
    for dim in &info.dimensions {
        println!(
            "    {} ({}{})",
            dim.name,
            dim.length,
            if dim.is_unlimited { ", unlimited" } else { "" }
        );
    }
    println!("  Variables: {} total", info.total_variables);
    for var in &info.variables {
        let role = if var.is_data_variable { "data" } else { "coordinate" };
        println!(
            "    {} ({}, {}) - dimensions: [{}]",
            var.name,
            var.data_type,
            role,
            var.dimensions.join(", ")
        );
        if let Some(range) = &var.coordinate_range {
            println!(
                "      range: {} .. {}{}",
                range.first,
                range.last,
                if range.descending { " (descending)" } else { "" }
            );
        }
        for (name, value) in &var.attributes {
            println!("      @{}: {}", name, value);
        }
    }
    if !info.global_attributes.is_empty() {
        println!("  Global Attributes:");
        for (name, value) in &info.global_attributes {
            println!("    @{}: {}", name, value);
        }
    }
}

/// Print NetCDF info in JSON format
pub fn print_file_info_json(info: &NetCdfInfo) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(info)?);
    Ok(())
}

/// Print NetCDF info in YAML format
pub fn print_file_info_yaml(info: &NetCdfInfo) -> Result<()> {
    let yaml = serde_yaml::to_string(info).context("Failed to serialize NetCDF info to YAML")?;
    println!("{}", yaml);
    Ok(())
}
