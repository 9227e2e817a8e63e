//! # Raster Sources
//!
//! The pipeline reads rasters through the [`RasterSource`] trait, which exposes
//! exactly what the loader needs: variable listing, dimension names,
//! attributes, coordinate axes and raw values. [`NetCdfSource`] backs it with a
//! NetCDF file; [`crate::memory::MemorySource`] backs it with in-memory
//! fixture arrays.

use crate::error::{Nc2JsonError, Nc2JsonResult};
use crate::grid::RawValue;
use log::debug;
use std::collections::HashSet;
use std::path::Path;

/// Attribute value reduced to what the loader interprets.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Numbers(Vec<f64>),
}

impl AttrValue {
    /// First numeric element, if the attribute is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(v) => Some(*v),
            AttrValue::Numbers(v) => v.first().copied(),
            AttrValue::Text(_) => None,
        }
    }

    /// Every numeric element; empty for text.
    pub fn as_f64s(&self) -> Vec<f64> {
        match self {
            AttrValue::Number(v) => vec![*v],
            AttrValue::Numbers(v) => v.clone(),
            AttrValue::Text(_) => Vec::new(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Read access to a gridded dataset with named variables and coordinate axes.
pub trait RasterSource {
    /// All variable names, in stored order.
    fn variable_names(&self) -> Vec<String>;

    /// Dimension names of `variable`, outermost first, or `None` if absent.
    fn dimensions(&self, variable: &str) -> Option<Vec<String>>;

    /// Attribute `name` of `variable`, or `None` if either is absent.
    fn attribute(&self, variable: &str, name: &str) -> Nc2JsonResult<Option<AttrValue>>;

    /// Values of the 1-D coordinate variable `axis`.
    fn read_axis(&self, axis: &str) -> Nc2JsonResult<Vec<f64>>;

    /// All values of `variable`, flattened in stored (row-major) order,
    /// without any fill-value masking or scaling applied.
    fn read_values(&self, variable: &str) -> Nc2JsonResult<Vec<RawValue>>;

    /// Variables that are not coordinate variables, in stored order. A
    /// coordinate variable is one named after a dimension.
    fn data_variables(&self) -> Vec<String> {
        let names = self.variable_names();
        let dimension_names: HashSet<String> = names
            .iter()
            .filter_map(|name| self.dimensions(name))
            .flatten()
            .collect();
        names
            .into_iter()
            .filter(|name| !dimension_names.contains(name))
            .collect()
    }
}

/// NetCDF-backed raster source. The file is closed when the source is dropped
/// or [`NetCdfSource::close`] is called.
pub struct NetCdfSource {
    path: String,
    file: netcdf::File,
}

impl NetCdfSource {
    /// Opens a NetCDF file for reading.
    ///
    /// # Errors
    ///
    /// Returns [`Nc2JsonError::SourceOpen`] if the file is missing, corrupt or
    /// unreadable.
    pub fn open<P: AsRef<Path>>(path: P) -> Nc2JsonResult<Self> {
        let path_str = path.as_ref().display().to_string();
        debug!("Opening NetCDF file: {}", path_str);
        let file = netcdf::open(path.as_ref()).map_err(|source| Nc2JsonError::SourceOpen {
            path: path_str.clone(),
            source,
        })?;
        Ok(NetCdfSource {
            path: path_str,
            file,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn file(&self) -> &netcdf::File {
        &self.file
    }

    /// Closes the underlying file, reporting any error from the library.
    pub fn close(self) -> Nc2JsonResult<()> {
        debug!("Closing NetCDF file: {}", self.path);
        self.file.close()?;
        Ok(())
    }

    fn variable(&self, name: &str) -> Option<netcdf::Variable<'_>> {
        self.file.variable(name)
    }
}

impl RasterSource for NetCdfSource {
    fn variable_names(&self) -> Vec<String> {
        self.file.variables().map(|var| var.name()).collect()
    }

    fn dimensions(&self, variable: &str) -> Option<Vec<String>> {
        self.variable(variable)
            .map(|var| var.dimensions().iter().map(|d| d.name()).collect())
    }

    fn attribute(&self, variable: &str, name: &str) -> Nc2JsonResult<Option<AttrValue>> {
        let Some(var) = self.variable(variable) else {
            return Ok(None);
        };
        let Some(attr) = var.attribute(name) else {
            return Ok(None);
        };
        Ok(convert_attribute(attr.value()?))
    }

    fn read_axis(&self, axis: &str) -> Nc2JsonResult<Vec<f64>> {
        let var = self
            .variable(axis)
            .ok_or_else(|| Nc2JsonError::AxisNotFound(axis.to_string()))?;
        if var.dimensions().len() != 1 {
            return Err(Nc2JsonError::InvalidShape {
                field: axis.to_string(),
                details: format!(
                    "coordinate variable has {} dimensions, expected 1",
                    var.dimensions().len()
                ),
            });
        }
        Ok(var.get_values::<f64, _>(..)?)
    }

    fn read_values(&self, variable: &str) -> Nc2JsonResult<Vec<RawValue>> {
        let var = self.variable(variable).ok_or_else(|| Nc2JsonError::FieldNotFound {
            name: variable.to_string(),
            available: self.data_variables(),
        })?;
        let values = var.get_values::<f64, _>(..)?;
        Ok(values.into_iter().map(RawValue::Number).collect())
    }
}

/// Maps a NetCDF attribute onto the subset of types the loader reads.
/// Returns `None` for types it has no use for.
fn convert_attribute(value: netcdf::AttributeValue) -> Option<AttrValue> {
    use netcdf::AttributeValue as A;

    let converted = match value {
        A::Str(s) => AttrValue::Text(s),
        A::Strs(s) => AttrValue::Text(s.join(" ")),
        A::Double(v) => AttrValue::Number(v),
        A::Float(v) => AttrValue::Number(v as f64),
        A::Schar(v) => AttrValue::Number(v as f64),
        A::Uchar(v) => AttrValue::Number(v as f64),
        A::Short(v) => AttrValue::Number(v as f64),
        A::Ushort(v) => AttrValue::Number(v as f64),
        A::Int(v) => AttrValue::Number(v as f64),
        A::Uint(v) => AttrValue::Number(v as f64),
        A::Longlong(v) => AttrValue::Number(v as f64),
        A::Ulonglong(v) => AttrValue::Number(v as f64),
        A::Doubles(v) => AttrValue::Numbers(v),
        A::Floats(v) => AttrValue::Numbers(v.into_iter().map(f64::from).collect()),
        A::Schars(v) => AttrValue::Numbers(v.into_iter().map(f64::from).collect()),
        A::Uchars(v) => AttrValue::Numbers(v.into_iter().map(f64::from).collect()),
        A::Shorts(v) => AttrValue::Numbers(v.into_iter().map(f64::from).collect()),
        A::Ushorts(v) => AttrValue::Numbers(v.into_iter().map(f64::from).collect()),
        A::Ints(v) => AttrValue::Numbers(v.into_iter().map(f64::from).collect()),
        A::Uints(v) => AttrValue::Numbers(v.into_iter().map(f64::from).collect()),
        A::Longlongs(v) => AttrValue::Numbers(v.into_iter().map(|x| x as f64).collect()),
        A::Ulonglongs(v) => AttrValue::Numbers(v.into_iter().map(|x| x as f64).collect()),
        #[allow(unreachable_patterns)]
        _ => return None,
    };
    Some(converted)
}
