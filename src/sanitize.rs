//! # Sanitizer
//!
//! Turns a cropped field into a grid where every cell is either a finite
//! number or [`Cell::Missing`]. This is a total function: no cell is skipped
//! and nothing here fails.

use crate::grid::{CroppedField, RawValue};
use serde::{Serialize, Serializer};

/// One output cell. `Value` always holds a finite number when produced by
/// [`sanitize`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Missing,
    Value(f64),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl Serialize for Cell {
    /// `Missing` is `null`. A non-finite `Value` is a serialization error,
    /// never a bare `NaN` token.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Missing => serializer.serialize_none(),
            Cell::Value(v) => crate::output::serialize_finite(v, serializer),
        }
    }
}

/// Rows of cells, one row per latitude.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SanitizedGrid {
    rows: Vec<Vec<Cell>>,
}

impl SanitizedGrid {
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.rows.first().map_or(0, Vec::len))
    }
}

/// Counts gathered while sanitizing, for diagnostics only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    /// NaN, infinite or non-numeric cells replaced with `Missing`
    pub replaced: usize,
    /// Cells that were already masked in the source
    pub masked: usize,
    /// Finite cells passed through
    pub finite: usize,
}

/// Maps one raw cell to an output cell and updates `report`.
pub fn sanitize_value(value: RawValue, report: &mut SanitizeReport) -> Cell {
    match value {
        RawValue::Masked => {
            report.masked += 1;
            Cell::Missing
        }
        RawValue::Number(v) if v.is_finite() => {
            report.finite += 1;
            Cell::Value(v)
        }
        RawValue::Number(_) | RawValue::Invalid => {
            report.replaced += 1;
            Cell::Missing
        }
    }
}

/// Sanitizes every cell of `field`, row-major, preserving shape.
pub fn sanitize(field: &CroppedField) -> (SanitizedGrid, SanitizeReport) {
    let mut report = SanitizeReport::default();
    let rows: Vec<Vec<Cell>> = field
        .rows()
        .map(|row| {
            row.iter()
                .map(|&value| sanitize_value(value, &mut report))
                .collect::<Vec<Cell>>()
        })
        .collect();
    (SanitizedGrid { rows }, report)
}
