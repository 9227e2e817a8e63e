//! # Field Loader
//!
//! Selects a data field from a [`RasterSource`] and builds a [`RasterField`]
//! indexed by (latitude, longitude).
//!
//! Values are decoded the CF way before they reach the rest of the pipeline:
//! cells equal to `_FillValue` or `missing_value` become [`RawValue::Masked`],
//! and `scale_factor` / `add_offset` are applied to everything else.

use crate::error::{Nc2JsonError, Nc2JsonResult};
use crate::grid::{RasterField, RawValue};
use crate::source::RasterSource;
use log::{debug, info};

/// Names of the latitude and longitude dimensions / coordinate variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisNames {
    pub lat: String,
    pub lon: String,
}

impl AxisNames {
    pub fn new(lat: &str, lon: &str) -> Self {
        AxisNames {
            lat: lat.to_string(),
            lon: lon.to_string(),
        }
    }
}

impl Default for AxisNames {
    fn default() -> Self {
        AxisNames::new("lat", "lon")
    }
}

/// CF packing and masking attributes of a variable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CfDecoding {
    pub fill_values: Vec<f64>,
    pub scale_factor: Option<f64>,
    pub add_offset: Option<f64>,
}

impl CfDecoding {
    pub fn from_source<S: RasterSource + ?Sized>(source: &S, variable: &str) -> Nc2JsonResult<Self> {
        let mut fill_values = Vec::new();
        for attr in ["_FillValue", "missing_value"] {
            if let Some(value) = source.attribute(variable, attr)? {
                fill_values.extend(value.as_f64s());
            }
        }
        let scale_factor = source
            .attribute(variable, "scale_factor")?
            .and_then(|a| a.as_f64());
        let add_offset = source
            .attribute(variable, "add_offset")?
            .and_then(|a| a.as_f64());

        Ok(CfDecoding {
            fill_values,
            scale_factor,
            add_offset,
        })
    }

    pub fn is_identity(&self) -> bool {
        self.fill_values.is_empty() && self.scale_factor.is_none() && self.add_offset.is_none()
    }

    /// Masks fill values, then unpacks. Fill values compare against the
    /// packed (stored) value.
    pub fn decode(&self, value: RawValue) -> RawValue {
        match value {
            RawValue::Number(v) if self.fill_values.contains(&v) => RawValue::Masked,
            RawValue::Number(v) => {
                let scaled = v * self.scale_factor.unwrap_or(1.0);
                RawValue::Number(scaled + self.add_offset.unwrap_or(0.0))
            }
            other => other,
        }
    }
}

/// Layout of the field's two dimensions relative to (lat, lon).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    LatLon,
    LonLat,
}

/// Picks the field to extract: `requested` if given, else the first data
/// variable in stored order.
///
/// # Errors
///
/// [`Nc2JsonError::FieldNotFound`] if `requested` is not a data variable,
/// [`Nc2JsonError::EmptyDataset`] if there are no data variables at all.
pub fn select_field_name<S: RasterSource + ?Sized>(
    source: &S,
    requested: Option<&str>,
) -> Nc2JsonResult<String> {
    let available = source.data_variables();
    match requested {
        Some(name) if available.iter().any(|v| v == name) => Ok(name.to_string()),
        Some(name) => Err(Nc2JsonError::FieldNotFound {
            name: name.to_string(),
            available,
        }),
        None => available.into_iter().next().ok_or(Nc2JsonError::EmptyDataset),
    }
}

/// Loads a field as a (lat, lon) [`RasterField`].
///
/// The field must have exactly the two configured axis dimensions, in either
/// order; (lon, lat) fields are transposed. Units come from the `units`
/// attribute and default to an empty string.
pub fn load_field<S: RasterSource + ?Sized>(
    source: &S,
    requested: Option<&str>,
    axes: &AxisNames,
) -> Nc2JsonResult<RasterField> {
    let name = select_field_name(source, requested)?;
    let dimensions = source.dimensions(&name).unwrap_or_default();

    let layout = match dimensions.as_slice() {
        [a, b] if *a == axes.lat && *b == axes.lon => Layout::LatLon,
        [a, b] if *a == axes.lon && *b == axes.lat => Layout::LonLat,
        _ => {
            return Err(Nc2JsonError::InvalidShape {
                field: name,
                details: format!(
                    "dimensions [{}], expected [{}, {}]",
                    dimensions.join(", "),
                    axes.lat,
                    axes.lon
                ),
            });
        }
    };

    let lat = source.read_axis(&axes.lat)?;
    let lon = source.read_axis(&axes.lon)?;
    let units = source
        .attribute(&name, "units")?
        .and_then(|a| a.as_text().map(str::to_string))
        .unwrap_or_default();

    let decoding = CfDecoding::from_source(source, &name)?;
    debug!("Field '{}' decoding: {:?}", name, decoding);

    let mut values = source.read_values(&name)?;
    if !decoding.is_identity() {
        for value in values.iter_mut() {
            *value = decoding.decode(*value);
        }
    }

    if layout == Layout::LonLat && values.len() == lat.len() * lon.len() {
        debug!("Transposing field '{}' from (lon, lat) to (lat, lon)", name);
        values = transpose(&values, lon.len(), lat.len());
    }

    info!(
        "Loaded field '{}' ({} x {} lat/lon, units '{}')",
        name,
        lat.len(),
        lon.len(),
        units
    );
    RasterField::new(name, units, lat, lon, values)
}

/// Transposes a row-major `rows x cols` grid.
fn transpose(values: &[RawValue], rows: usize, cols: usize) -> Vec<RawValue> {
    (0..cols)
        .flat_map(|c| (0..rows).map(move |r| values[r * cols + c]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySource;
    use crate::source::AttrValue;

    fn age_source() -> MemorySource {
        MemorySource::new()
            .with_axis("lat", vec![-10.0, 0.0])
            .with_axis("lon", vec![100.0, 110.0, 120.0])
            .with_field("age", &["lat", "lon"], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
            .with_text_attribute("age", "units", "Myr")
            .with_field("error", &["lat", "lon"], vec![0.0; 6])
    }

    #[test]
    fn test_first_data_variable_is_default() {
        let field = load_field(&age_source(), None, &AxisNames::default()).unwrap();
        assert_eq!(field.name(), "age");
        assert_eq!(field.units(), "Myr");
        assert_eq!(field.shape(), (2, 3));
        assert_eq!(field.get(1, 0), Some(RawValue::Number(4.0)));
    }

    #[test]
    fn test_requested_field_and_missing_units() {
        let field = load_field(&age_source(), Some("error"), &AxisNames::default()).unwrap();
        assert_eq!(field.name(), "error");
        assert_eq!(field.units(), "");
    }

    #[test]
    fn test_field_not_found_lists_available() {
        match load_field(&age_source(), Some("depth"), &AxisNames::default()) {
            Err(Nc2JsonError::FieldNotFound { name, available }) => {
                assert_eq!(name, "depth");
                assert_eq!(available, vec!["age", "error"]);
            }
            other => panic!("Expected FieldNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_coordinate_variable_is_not_selectable() {
        assert!(matches!(
            select_field_name(&age_source(), Some("lat")),
            Err(Nc2JsonError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_empty_dataset() {
        let source = MemorySource::new().with_axis("lat", vec![0.0]);
        assert!(matches!(
            load_field(&source, None, &AxisNames::default()),
            Err(Nc2JsonError::EmptyDataset)
        ));
    }

    #[test]
    fn test_lon_lat_field_is_transposed() {
        // stored as (lon, lat): rows are longitudes
        let source = MemorySource::new()
            .with_axis("lat", vec![-10.0, 0.0])
            .with_axis("lon", vec![100.0, 110.0, 120.0])
            .with_field("age", &["lon", "lat"], vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);

        let field = load_field(&source, None, &AxisNames::default()).unwrap();
        let expected: Vec<RawValue> = (1..=6).map(|v| RawValue::Number(v as f64)).collect();
        assert_eq!(field.values(), expected.as_slice());
    }

    #[test]
    fn test_wrong_dimensions_are_invalid_shape() {
        let source = MemorySource::new()
            .with_axis("time", vec![0.0])
            .with_axis("lat", vec![0.0])
            .with_axis("lon", vec![0.0])
            .with_field("age", &["time", "lat", "lon"], vec![1.0]);

        assert!(matches!(
            load_field(&source, None, &AxisNames::default()),
            Err(Nc2JsonError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_custom_axis_names() {
        let source = MemorySource::new()
            .with_axis("latitude", vec![0.0])
            .with_axis("longitude", vec![0.0, 1.0])
            .with_field("age", &["latitude", "longitude"], vec![1.0, 2.0]);

        let field = load_field(&source, None, &AxisNames::new("latitude", "longitude")).unwrap();
        assert_eq!(field.lon(), &[0.0, 1.0]);

        assert!(matches!(
            load_field(&source, None, &AxisNames::default()),
            Err(Nc2JsonError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_fill_values_are_masked_and_packing_applied() {
        let source = MemorySource::new()
            .with_axis("lat", vec![0.0])
            .with_axis("lon", vec![0.0, 1.0, 2.0, 3.0])
            .with_field("age", &["lat", "lon"], vec![10.0, -9999.0, 20.0, -1.0])
            .with_number_attribute("age", "_FillValue", -9999.0)
            .with_number_attribute("age", "missing_value", -1.0)
            .with_number_attribute("age", "scale_factor", 0.5)
            .with_number_attribute("age", "add_offset", 100.0);

        let field = load_field(&source, None, &AxisNames::default()).unwrap();
        assert_eq!(
            field.values(),
            &[
                RawValue::Number(105.0),
                RawValue::Masked,
                RawValue::Number(110.0),
                RawValue::Masked,
            ]
        );
    }

    #[test]
    fn test_every_missing_value_entry_is_masked() {
        let source = MemorySource::new()
            .with_axis("lat", vec![0.0])
            .with_axis("lon", vec![0.0, 1.0, 2.0])
            .with_field("age", &["lat", "lon"], vec![-9999.0, -8888.0, 42.0])
            .with_attribute("age", "missing_value", AttrValue::Numbers(vec![-9999.0, -8888.0]));

        let field = load_field(&source, None, &AxisNames::default()).unwrap();
        assert_eq!(
            field.values(),
            &[RawValue::Masked, RawValue::Masked, RawValue::Number(42.0)]
        );
    }

    #[test]
    fn test_decoding_leaves_non_numbers_alone() {
        let decoding = CfDecoding {
            fill_values: vec![0.0],
            scale_factor: Some(2.0),
            add_offset: None,
        };
        assert_eq!(decoding.decode(RawValue::Invalid), RawValue::Invalid);
        assert_eq!(decoding.decode(RawValue::Masked), RawValue::Masked);
        assert!(matches!(decoding.decode(RawValue::Number(f64::NAN)), RawValue::Number(v) if v.is_nan()));
    }
}
