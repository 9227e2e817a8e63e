//! # Region Selection
//!
//! Crops a [`RasterField`] to a [`BoundingBox`]. Bounds are inclusive and are
//! matched against coordinate values, not indices.
//!
//! Latitude grids are stored either south-to-north or north-to-south, so the
//! slice for each axis is computed by [`axis_slice`], which detects the
//! orientation from the first and last coordinate and returns a contiguous
//! index range over the stored order. A descending axis is searched from
//! `hi` down to `lo`; an ascending one from `lo` up to `hi`. The cropped
//! coordinate vectors keep their stored order.

use crate::error::{Nc2JsonError, Nc2JsonResult};
use crate::grid::{CroppedField, RasterField};
use log::debug;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Geographic box in the same units as the field's coordinate vectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl BoundingBox {
    pub fn new(lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> Self {
        BoundingBox {
            lon_min,
            lon_max,
            lat_min,
            lat_max,
        }
    }
}

impl Default for BoundingBox {
    /// The South Atlantic box
    fn default() -> Self {
        BoundingBox::new(-70.0, 20.0, -60.0, 20.0)
    }
}

/// Storage direction of a coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrder {
    Ascending,
    Descending,
}

impl AxisOrder {
    /// Compares the first and last coordinate. Single-element and empty axes
    /// count as ascending.
    pub fn detect(values: &[f64]) -> Self {
        match (values.first(), values.last()) {
            (Some(first), Some(last)) if first > last => AxisOrder::Descending,
            _ => AxisOrder::Ascending,
        }
    }
}

/// Returns the contiguous index range of `values` whose coordinates fall in
/// `[lo, hi]`, for either storage direction.
///
/// The range is empty when no coordinate falls inside the bounds, including
/// when `lo > hi`. Fails if the axis is not monotonic, since a range over a
/// non-monotonic axis is not contiguous.
pub fn axis_slice(axis: &str, values: &[f64], lo: f64, hi: f64) -> Nc2JsonResult<Range<usize>> {
    let order = AxisOrder::detect(values);
    if !is_monotonic(values, order) {
        return Err(Nc2JsonError::NonMonotonicAxis(axis.to_string()));
    }

    let range = match order {
        AxisOrder::Ascending => {
            let start = values.partition_point(|&v| v < lo);
            let end = values.partition_point(|&v| v <= hi);
            start..end
        }
        AxisOrder::Descending => {
            let start = values.partition_point(|&v| v > hi);
            let end = values.partition_point(|&v| v >= lo);
            start..end
        }
    };

    debug!(
        "Axis '{}' ({:?}, {} values): [{}, {}] -> indices {:?}",
        axis,
        order,
        values.len(),
        lo,
        hi,
        range
    );

    // partition_point can yield start > end when lo > hi
    if range.start >= range.end {
        return Ok(0..0);
    }
    Ok(range)
}

fn is_monotonic(values: &[f64], order: AxisOrder) -> bool {
    values.windows(2).all(|w| match order {
        AxisOrder::Ascending => w[0] <= w[1],
        AxisOrder::Descending => w[0] >= w[1],
    })
}

/// Crops `field` to `bbox`.
///
/// # Errors
///
/// Returns [`Nc2JsonError::EmptyRegion`] if either cropped axis has no
/// elements (box outside the data extent, or inverted bounds), with the
/// requested box and the field's actual extents. Returns
/// [`Nc2JsonError::NonMonotonicAxis`] if a coordinate vector is unsorted.
pub fn select_region(field: &RasterField, bbox: &BoundingBox) -> Nc2JsonResult<CroppedField> {
    let lon_range = axis_slice("lon", field.lon(), bbox.lon_min, bbox.lon_max)?;
    let lat_range = axis_slice("lat", field.lat(), bbox.lat_min, bbox.lat_max)?;

    if lon_range.is_empty() || lat_range.is_empty() {
        return Err(Nc2JsonError::EmptyRegion {
            bbox: *bbox,
            lon_extent: field.lon_extent(),
            lat_extent: field.lat_extent(),
        });
    }

    let lat = field.lat()[lat_range.clone()].to_vec();
    let lon = field.lon()[lon_range.clone()].to_vec();
    let values = field
        .rows()
        .skip(lat_range.start)
        .take(lat_range.len())
        .flat_map(|row| row[lon_range.clone()].iter().copied())
        .collect();

    RasterField::new(field.name(), field.units(), lat, lon, values)
}
