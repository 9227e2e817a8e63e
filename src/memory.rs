//! # In-Memory Raster Source
//!
//! A [`RasterSource`] over plain vectors. Used to drive the pipeline from
//! fixture arrays, without a NetCDF file on disk.
//!
//! ```rust
//! use nc2json::memory::MemorySource;
//! use nc2json::source::RasterSource;
//!
//! let source = MemorySource::new()
//!     .with_axis("lat", vec![-10.0, 0.0, 10.0])
//!     .with_axis("lon", vec![0.0, 5.0])
//!     .with_field("age", &["lat", "lon"], vec![1.0, 2.0, 3.0, 4.0, 5.0, f64::NAN])
//!     .with_text_attribute("age", "units", "Myr");
//!
//! assert_eq!(source.data_variables(), vec!["age".to_string()]);
//! ```

use crate::error::{Nc2JsonError, Nc2JsonResult};
use crate::grid::RawValue;
use crate::source::{AttrValue, RasterSource};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct MemoryVariable {
    name: String,
    dimensions: Vec<String>,
    values: Vec<RawValue>,
    attributes: HashMap<String, AttrValue>,
}

/// Raster source holding variables in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    variables: Vec<MemoryVariable>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a 1-D coordinate variable named after its own dimension.
    pub fn with_axis(self, name: &str, values: Vec<f64>) -> Self {
        let values = values.into_iter().map(RawValue::Number).collect();
        self.with_raw_field(name, &[name], values)
    }

    /// Adds a numeric data variable.
    pub fn with_field(self, name: &str, dimensions: &[&str], values: Vec<f64>) -> Self {
        let values = values.into_iter().map(RawValue::Number).collect();
        self.with_raw_field(name, dimensions, values)
    }

    /// Adds a data variable whose cells may already be masked or invalid.
    pub fn with_raw_field(mut self, name: &str, dimensions: &[&str], values: Vec<RawValue>) -> Self {
        self.variables.push(MemoryVariable {
            name: name.to_string(),
            dimensions: dimensions.iter().map(|d| d.to_string()).collect(),
            values,
            attributes: HashMap::new(),
        });
        self
    }

    pub fn with_text_attribute(self, variable: &str, name: &str, value: &str) -> Self {
        self.with_attribute(variable, name, AttrValue::Text(value.to_string()))
    }

    pub fn with_number_attribute(self, variable: &str, name: &str, value: f64) -> Self {
        self.with_attribute(variable, name, AttrValue::Number(value))
    }

    /// Sets an attribute on an existing variable; ignored if the variable
    /// has not been added yet.
    pub fn with_attribute(mut self, variable: &str, name: &str, value: AttrValue) -> Self {
        if let Some(var) = self.variables.iter_mut().find(|v| v.name == variable) {
            var.attributes.insert(name.to_string(), value);
        }
        self
    }

    /// Builds a source from a JSON fixture.
    ///
    /// Fixture layout:
    ///
    /// ```json
    /// {
    ///   "variables": [
    ///     {"name": "lat", "dimensions": ["lat"], "values": [0, 1]},
    ///     {"name": "age", "dimensions": ["lat", "lon"], "values": [1.5, null, "NaN", "x"],
    ///      "attributes": {"units": "Myr"}}
    ///   ]
    /// }
    /// ```
    ///
    /// Cells are read with [`raw_value_from_json`]. Attribute strings become
    /// text attributes, numbers become numeric ones.
    pub fn from_json(json: &str) -> Nc2JsonResult<Self> {
        let root: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| Nc2JsonError::Config(format!("invalid JSON fixture: {}", e)))?;
        let variables = root
            .get("variables")
            .and_then(|v| v.as_array())
            .ok_or_else(|| Nc2JsonError::Config("fixture is missing a 'variables' array".to_string()))?;

        let mut source = MemorySource::new();
        for var in variables {
            let name = var
                .get("name")
                .and_then(|n| n.as_str())
                .ok_or_else(|| Nc2JsonError::Config("fixture variable without a name".to_string()))?;
            let dimensions: Vec<&str> = var
                .get("dimensions")
                .and_then(|d| d.as_array())
                .map(|d| d.iter().filter_map(|v| v.as_str()).collect())
                .unwrap_or_default();
            let values: Vec<RawValue> = var
                .get("values")
                .and_then(|v| v.as_array())
                .map(|v| v.iter().map(raw_value_from_json).collect())
                .unwrap_or_default();

            source = source.with_raw_field(name, &dimensions, values);

            if let Some(attributes) = var.get("attributes").and_then(|a| a.as_object()) {
                for (key, value) in attributes {
                    let attr = match value {
                        serde_json::Value::String(s) => AttrValue::Text(s.clone()),
                        serde_json::Value::Number(n) => match n.as_f64() {
                            Some(v) => AttrValue::Number(v),
                            None => continue,
                        },
                        _ => continue,
                    };
                    source = source.with_attribute(name, key, attr);
                }
            }
        }
        Ok(source)
    }

    fn find(&self, name: &str) -> Option<&MemoryVariable> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// Interprets one fixture cell.
///
/// - `null` is masked
/// - numbers are numbers
/// - strings that parse as floats (`"1.5"`, `"NaN"`, `"-inf"`) are numbers
/// - anything else is invalid
pub fn raw_value_from_json(value: &serde_json::Value) -> RawValue {
    match value {
        serde_json::Value::Null => RawValue::Masked,
        serde_json::Value::Number(n) => n.as_f64().map_or(RawValue::Invalid, RawValue::Number),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_or(RawValue::Invalid, RawValue::Number),
        _ => RawValue::Invalid,
    }
}

impl RasterSource for MemorySource {
    fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }

    fn dimensions(&self, variable: &str) -> Option<Vec<String>> {
        self.find(variable).map(|v| v.dimensions.clone())
    }

    fn attribute(&self, variable: &str, name: &str) -> Nc2JsonResult<Option<AttrValue>> {
        Ok(self
            .find(variable)
            .and_then(|v| v.attributes.get(name))
            .cloned())
    }

    fn read_axis(&self, axis: &str) -> Nc2JsonResult<Vec<f64>> {
        let var = self
            .find(axis)
            .ok_or_else(|| Nc2JsonError::AxisNotFound(axis.to_string()))?;
        var.values
            .iter()
            .map(|v| match v {
                RawValue::Number(x) => Ok(*x),
                _ => Err(Nc2JsonError::InvalidShape {
                    field: axis.to_string(),
                    details: "coordinate axis contains a non-numeric value".to_string(),
                }),
            })
            .collect()
    }

    fn read_values(&self, variable: &str) -> Nc2JsonResult<Vec<RawValue>> {
        self.find(variable)
            .map(|v| v.values.clone())
            .ok_or_else(|| Nc2JsonError::FieldNotFound {
                name: variable.to_string(),
                available: self.data_variables(),
            })
    }
}
