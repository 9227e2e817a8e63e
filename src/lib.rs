//! # nc2json
//!
//! Crops a lat/lon raster field from a NetCDF file to a bounding box and writes
//! it as strictly valid JSON, with every NaN, infinity or masked cell replaced
//! by `null`.
//!
//! ## Pipeline
//!
//! 1. **Load** ([`loader`]): pick the requested or first data field from a
//!    [`source::RasterSource`] and decode fill values and packing
//! 2. **Select** ([`region`]): crop to the bounding box, for either latitude
//!    direction, failing if the crop is empty
//! 3. **Sanitize** ([`sanitize`]): map every cell to a finite number or `null`
//! 4. **Serialize** ([`output`]): write the document with a writer that refuses
//!    non-finite numbers, then re-check the written file
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nc2json::{run, input::JobConfig};
//!
//! let config = JobConfig::from_file("config.json").expect("Failed to load config");
//! let document = run(&config).expect("Failed to export region");
//! println!("{} rows exported", document.lat.len());
//! ```
//!
//! ## Output Example
//!
//! ```json
//! {
//!   "var_name": "age",
//!   "units": "Myr",
//!   "lon": [-70.0, -69.9],
//!   "lat": [-60.0, -59.9],
//!   "data": [[120.5, null], [119.8, 118.2]]
//! }
//! ```

pub mod cli;
pub mod error;
pub mod grid;
pub mod info;
pub mod input;
pub mod loader;
pub mod log;
pub mod memory;
pub mod output;
pub mod region;
pub mod sanitize;
pub mod source;

#[cfg(test)]
mod tests;

use crate::error::Nc2JsonResult;
use crate::grid::CroppedField;
use crate::input::JobConfig;
use crate::output::{OutputDocument, verify_written, write_document};
use crate::sanitize::{SanitizeReport, SanitizedGrid};
use crate::source::{NetCdfSource, RasterSource};
use ::log::{info, warn};
use std::path::Path;

/// Result of the load, select and sanitize stages.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub cropped: CroppedField,
    pub grid: SanitizedGrid,
    pub report: SanitizeReport,
}

/// Runs the load, select and sanitize stages against any raster source.
pub fn extract_region<S: RasterSource + ?Sized>(
    source: &S,
    config: &JobConfig,
) -> Nc2JsonResult<Extraction> {
    let field = loader::load_field(source, config.variable_name.as_deref(), &config.axis_names())?;
    crate::log::show_field_info(&field);

    let cropped = region::select_region(&field, &config.bbox)?;
    crate::log::show_crop_summary(&cropped);

    let (grid, report) = sanitize::sanitize(&cropped);
    info!(
        "Sanitized {} cells: {} finite, {} replaced, {} masked",
        report.finite + report.replaced + report.masked,
        report.finite,
        report.replaced,
        report.masked
    );
    crate::log::show_sanitize_summary(&report);

    Ok(Extraction {
        cropped,
        grid,
        report,
    })
}

/// Extracts the configured region from `source` and writes it to
/// `config.json_key`.
///
/// Problems found by the post-write check are logged as warnings; they do not
/// fail the run because the file has already been written.
pub fn run_with_source<S: RasterSource + ?Sized>(
    source: &S,
    config: &JobConfig,
) -> Nc2JsonResult<OutputDocument> {
    config.validate()?;
    export(source, config)
}

/// Extract, write and check, for an already validated `config`.
fn export<S: RasterSource + ?Sized>(source: &S, config: &JobConfig) -> Nc2JsonResult<OutputDocument> {
    let extraction = extract_region(source, config)?;
    let document = OutputDocument::new(&extraction.cropped, extraction.grid);

    let output_path = Path::new(&config.json_key);
    let summary = write_document(&document, output_path, config.write_options())?;
    crate::log::show_written(&summary);

    let verification = verify_written(&summary.path);
    for issue in &verification.issues {
        warn!("Output check: {}", issue);
    }
    crate::log::show_verification(&verification);

    Ok(document)
}

/// Runs the full export for a NetCDF input.
///
/// Opens `config.nc_key`, extracts and writes the region, and closes the file
/// again. The file is also closed when any stage fails.
///
/// # Errors
///
/// Any [`error::Nc2JsonError`]; every failure ends the run.
pub fn run(config: &JobConfig) -> Nc2JsonResult<OutputDocument> {
    config.validate()?;
    let source = NetCdfSource::open(&config.nc_key)?;
    crate::log::show_source_info(&source);

    let document = export(&source, config)?;
    source.close()?;
    Ok(document)
}
