//! # Grid Data Model
//!
//! In-memory representation of a lat/lon raster field as it moves through the
//! pipeline. Values are stored row-major: one row per latitude, one column per
//! longitude.

use crate::error::{Nc2JsonError, Nc2JsonResult};

/// A single cell as read from a raster source, before sanitizing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue {
    /// Absent in the source (fill value, mask, explicit null)
    Masked,
    /// A numeric value, possibly NaN or infinite
    Number(f64),
    /// A value that could not be interpreted as a number
    Invalid,
}

impl RawValue {
    /// Returns the finite number held by this cell, if any.
    pub fn finite(&self) -> Option<f64> {
        match self {
            RawValue::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<Option<f64>> for RawValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(RawValue::Masked, RawValue::Number)
    }
}

/// A named 2-D field with its latitude and longitude coordinate vectors.
///
/// The constructor guarantees `values.len() == lat.len() * lon.len()`, so row
/// and cell accessors never index out of bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterField {
    name: String,
    units: String,
    lat: Vec<f64>,
    lon: Vec<f64>,
    values: Vec<RawValue>,
}

impl RasterField {
    pub fn new(
        name: impl Into<String>,
        units: impl Into<String>,
        lat: Vec<f64>,
        lon: Vec<f64>,
        values: Vec<RawValue>,
    ) -> Nc2JsonResult<Self> {
        let name = name.into();
        if values.len() != lat.len() * lon.len() {
            return Err(Nc2JsonError::InvalidShape {
                field: name,
                details: format!(
                    "{} values for a {}x{} (lat x lon) grid",
                    values.len(),
                    lat.len(),
                    lon.len()
                ),
            });
        }
        Ok(RasterField {
            name,
            units: units.into(),
            lat,
            lon,
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn lat(&self) -> &[f64] {
        &self.lat
    }

    pub fn lon(&self) -> &[f64] {
        &self.lon
    }

    /// (rows, columns), i.e. (lat, lon)
    pub fn shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }

    pub fn values(&self) -> &[RawValue] {
        &self.values
    }

    pub fn rows(&self) -> impl Iterator<Item = &[RawValue]> {
        // chunks(0) panics, and a grid with no columns has no rows to yield
        let width = self.lon.len().max(1);
        self.values.chunks(width).take(self.lat.len())
    }

    pub fn get(&self, row: usize, col: usize) -> Option<RawValue> {
        if row >= self.lat.len() || col >= self.lon.len() {
            return None;
        }
        Some(self.values[row * self.lon.len() + col])
    }

    /// Min and max of the latitude vector, ignoring order.
    pub fn lat_extent(&self) -> (f64, f64) {
        extent(&self.lat)
    }

    /// Min and max of the longitude vector, ignoring order.
    pub fn lon_extent(&self) -> (f64, f64) {
        extent(&self.lon)
    }
}

/// A field restricted to a bounding box. Same layout as [`RasterField`]; both
/// axes are guaranteed non-empty by the region selector.
pub type CroppedField = RasterField;

fn extent(values: &[f64]) -> (f64, f64) {
    values.iter().fold((f64::NAN, f64::NAN), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    })
}
