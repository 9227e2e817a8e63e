use crate::grid::{CroppedField, RasterField};
use crate::input::JobConfig;
use crate::output::{VerificationReport, WriteSummary};
use crate::sanitize::SanitizeReport;
use crate::source::RasterSource;
use std::time::Duration;

pub fn show_greeting(config_source: &str) {
    println!("=== NetCDF Region to JSON Exporter ===");
    println!("Configuration: {}", config_source);
}

pub fn config_echo(config: &JobConfig) {
    println!("\nConfiguration:");
    println!("  Input NetCDF: {}", config.nc_key);
    println!(
        "  Variable: {}",
        config.variable_name.as_deref().unwrap_or("(first data variable)")
    );
    println!("  Output JSON: {}", config.json_key);
    println!(
        "  Bounding box: lon [{}, {}], lat [{}, {}]",
        config.bbox.lon_min, config.bbox.lon_max, config.bbox.lat_min, config.bbox.lat_max
    );
    println!("  Axes: lat='{}', lon='{}'", config.lat_name, config.lon_name);
}

pub fn show_source_info<S: RasterSource + ?Sized>(source: &S) {
    println!("\nSource variables:");
    for name in source.variable_names() {
        let dims = source.dimensions(&name).unwrap_or_default();
        println!("  {}: {:?}", name, dims);
    }
}

pub fn show_field_info(field: &RasterField) {
    let (lat_min, lat_max) = field.lat_extent();
    let (lon_min, lon_max) = field.lon_extent();
    println!("\nField '{}' ({})", field.name(), field.units());
    println!("  Full sizes (lon, lat): {} {}", field.lon().len(), field.lat().len());
    println!("  Extent: lon [{}, {}], lat [{}, {}]", lon_min, lon_max, lat_min, lat_max);
}

pub fn show_crop_summary(cropped: &CroppedField) {
    println!(
        "Cropped sizes (lon, lat): {} {}",
        cropped.lon().len(),
        cropped.lat().len()
    );
}

pub fn show_sanitize_summary(report: &SanitizeReport) {
    println!("Replaced {} non-finite values with null", report.replaced);
    if report.masked > 0 {
        println!("  ({} cells were already masked in the source)", report.masked);
    }
}

pub fn show_written(summary: &WriteSummary) {
    println!("Wrote JSON to: {}", summary.path.display());
}

pub fn show_verification(report: &VerificationReport) {
    if report.is_clean() {
        println!("Confirmed: no non-finite tokens in JSON.");
    } else {
        println!("WARNING: output check found {} issue(s).", report.issues.len());
    }
}

pub fn show_farewell_with_timing(elapsed: Duration) {
    println!(
        "\n=== Export completed successfully in {:.2}s ===",
        elapsed.as_secs_f64()
    );
}
