use crate::error::Nc2JsonError;
use crate::input::*;
use crate::region::BoundingBox;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

const FILL: f32 = -9999.0;

const LAT: [f64; 5] = [-20.0, -10.0, 0.0, 10.0, 20.0];
const LON: [f64; 4] = [0.0, 10.0, 20.0, 30.0];

/// Age values for the ascending grid: `row * 10 + col`, with a NaN at (1, 1),
/// a fill value at (2, 2) and +inf at (3, 1).
fn age_values() -> Vec<Vec<f32>> {
    (0..LAT.len())
        .map(|r| {
            (0..LON.len())
                .map(|c| match (r, c) {
                    (1, 1) => f32::NAN,
                    (2, 2) => FILL,
                    (3, 1) => f32::INFINITY,
                    _ => (r * 10 + c) as f32,
                })
                .collect()
        })
        .collect()
}

/// Writes a small age grid with `lat`, `lon`, `age` (float, `_FillValue`)
/// and `depth` (packed short with `scale_factor` / `add_offset`).
fn write_age_grid(path: &Path, lat: &[f64], lon: &[f64], rows: &[Vec<f32>]) {
    let mut file = netcdf::create(path).unwrap();
    file.add_dimension("lat", lat.len()).unwrap();
    file.add_dimension("lon", lon.len()).unwrap();
    file.add_attribute("title", "test age grid").unwrap();

    let mut lat_var = file.add_variable::<f64>("lat", &["lat"]).unwrap();
    lat_var.put_attribute("units", "degrees_north").unwrap();
    lat_var.put_values(lat, ..).unwrap();

    let mut lon_var = file.add_variable::<f64>("lon", &["lon"]).unwrap();
    lon_var.put_attribute("units", "degrees_east").unwrap();
    lon_var.put_values(lon, ..).unwrap();

    let flat: Vec<f32> = rows.iter().flatten().copied().collect();
    let mut age_var = file.add_variable::<f32>("age", &["lat", "lon"]).unwrap();
    age_var.put_attribute("units", "Myr").unwrap();
    age_var.put_attribute("_FillValue", FILL).unwrap();
    age_var.put_values(&flat, ..).unwrap();

    let packed: Vec<i16> = (0..flat.len()).map(|i| i as i16).collect();
    let mut depth_var = file.add_variable::<i16>("depth", &["lat", "lon"]).unwrap();
    depth_var.put_attribute("units", "m").unwrap();
    depth_var.put_attribute("scale_factor", 0.5f64).unwrap();
    depth_var.put_attribute("add_offset", -100.0f64).unwrap();
    depth_var.put_values(&packed, ..).unwrap();
}

fn ascending_grid(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("age_ascending.nc");
    write_age_grid(&path, &LAT, &LON, &age_values());
    path
}

fn descending_grid(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("age_descending.nc");
    let lat: Vec<f64> = LAT.iter().rev().copied().collect();
    let rows: Vec<Vec<f32>> = age_values().into_iter().rev().collect();
    write_age_grid(&path, &lat, &LON, &rows);
    path
}

fn job(input: &Path, output: &Path) -> JobConfig {
    JobConfig {
        nc_key: input.display().to_string(),
        json_key: output.display().to_string(),
        bbox: BoundingBox::new(5.0, 25.0, -10.0, 10.0),
        ..JobConfig::default()
    }
}

fn read_json(path: &Path) -> (String, Value) {
    let text = std::fs::read_to_string(path).unwrap();
    let value = serde_json::from_str(&text).unwrap();
    (text, value)
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;
    use crate::output::verify_written;

    #[test]
    fn test_ascending_grid_export() {
        let dir = tempdir().unwrap();
        let input = ascending_grid(&dir);
        let output = dir.path().join("age.json");

        let document = crate::run(&job(&input, &output)).unwrap();
        assert_eq!(document.var_name, "age");
        assert_eq!(document.data.shape(), (3, 2));

        let (text, value) = read_json(&output);
        assert_eq!(
            value,
            json!({
                "var_name": "age",
                "units": "Myr",
                "lon": [10.0, 20.0],
                "lat": [-10.0, 0.0, 10.0],
                "data": [[null, 12.0], [21.0, null], [null, 32.0]]
            })
        );
        assert!(!text.contains("NaN"));
        assert!(!text.contains("Infinity"));
        assert!(!text.contains("nan"));
        assert!(verify_written(&output).is_clean());
    }

    #[test]
    fn test_descending_grid_keeps_stored_order() {
        let dir = tempdir().unwrap();
        let input = descending_grid(&dir);
        let output = dir.path().join("age.json");

        crate::run(&job(&input, &output)).unwrap();

        let (_, value) = read_json(&output);
        assert_eq!(value["lat"], json!([10.0, 0.0, -10.0]));
        assert_eq!(value["data"], json!([[null, 32.0], [21.0, null], [null, 12.0]]));
    }

    #[test]
    fn test_orientation_does_not_change_the_cells() {
        let dir = tempdir().unwrap();
        let asc_out = dir.path().join("asc.json");
        let desc_out = dir.path().join("desc.json");
        crate::run(&job(&ascending_grid(&dir), &asc_out)).unwrap();
        crate::run(&job(&descending_grid(&dir), &desc_out)).unwrap();

        let (_, asc) = read_json(&asc_out);
        let (_, desc) = read_json(&desc_out);

        let mut desc_rows = desc["data"].as_array().unwrap().clone();
        desc_rows.reverse();
        assert_eq!(asc["data"].as_array().unwrap(), &desc_rows);

        let mut desc_lat = desc["lat"].as_array().unwrap().clone();
        desc_lat.reverse();
        assert_eq!(asc["lat"].as_array().unwrap(), &desc_lat);
    }

    #[test]
    fn test_sanitize_report_counts() {
        let dir = tempdir().unwrap();
        let input = ascending_grid(&dir);
        let config = job(&input, &dir.path().join("unused.json"));

        let source = crate::source::NetCdfSource::open(&input).unwrap();
        let extraction = crate::extract_region(&source, &config).unwrap();
        assert_eq!(extraction.report.finite, 3);
        assert_eq!(extraction.report.replaced, 2);
        assert_eq!(extraction.report.masked, 1);
        source.close().unwrap();
    }

    #[test]
    fn test_named_packed_variable_is_decoded() {
        let dir = tempdir().unwrap();
        let input = ascending_grid(&dir);
        let output = dir.path().join("depth.json");
        let config = JobConfig {
            variable_name: Some("depth".to_string()),
            bbox: BoundingBox::new(0.0, 10.0, -20.0, -20.0),
            ..job(&input, &output)
        };

        crate::run(&config).unwrap();

        // packed 0 and 1 with scale 0.5, offset -100
        let (_, value) = read_json(&output);
        assert_eq!(value["var_name"], "depth");
        assert_eq!(value["units"], "m");
        assert_eq!(value["data"], json!([[-100.0, -99.5]]));
    }

    #[test]
    fn test_default_box_on_global_grid() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("global.nc");
        let lat: Vec<f64> = (0..7).map(|i| -90.0 + 30.0 * i as f64).collect();
        let lon: Vec<f64> = (0..13).map(|i| -180.0 + 30.0 * i as f64).collect();
        let rows: Vec<Vec<f32>> = (0..lat.len()).map(|_| vec![100.0; lon.len()]).collect();
        write_age_grid(&input, &lat, &lon, &rows);

        let output = dir.path().join(DEFAULT_JSON_KEY);
        let config = JobConfig {
            nc_key: input.display().to_string(),
            json_key: output.display().to_string(),
            ..JobConfig::default()
        };
        crate::run(&config).unwrap();

        let (_, value) = read_json(&output);
        assert_eq!(value["lon"], json!([-60.0, -30.0, 0.0]));
        assert_eq!(value["lat"], json!([-60.0, -30.0, 0.0]));
    }

    #[test]
    fn test_pretty_output_matches_compact() {
        let dir = tempdir().unwrap();
        let input = ascending_grid(&dir);
        let compact = dir.path().join("compact.json");
        let pretty = dir.path().join("pretty.json");

        crate::run(&job(&input, &compact)).unwrap();
        crate::run(&JobConfig {
            pretty: true,
            ..job(&input, &pretty)
        })
        .unwrap();

        let (compact_text, compact_value) = read_json(&compact);
        let (pretty_text, pretty_value) = read_json(&pretty);
        assert_eq!(compact_value, pretty_value);
        assert!(!compact_text.contains('\n'));
        assert!(pretty_text.contains('\n'));
    }

    #[test]
    fn test_existing_output_is_replaced_by_default() {
        let dir = tempdir().unwrap();
        let input = ascending_grid(&dir);
        let output = dir.path().join("age.json");
        std::fs::write(&output, "old contents").unwrap();

        crate::run(&job(&input, &output)).unwrap();
        let (_, value) = read_json(&output);
        assert_eq!(value["var_name"], "age");
    }
}

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[test]
    fn test_missing_input_is_source_open() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("age.json");
        let result = crate::run(&job(&dir.path().join("missing.nc"), &output));

        assert!(matches!(result, Err(Nc2JsonError::SourceOpen { .. })));
        assert!(!output.exists());
    }

    #[test]
    fn test_not_netcdf_is_source_open() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("plain.nc");
        std::fs::write(&input, "this is not a NetCDF file").unwrap();

        let result = crate::run(&job(&input, &dir.path().join("age.json")));
        assert!(matches!(result, Err(Nc2JsonError::SourceOpen { .. })));
    }

    #[test]
    fn test_box_outside_extent_writes_nothing() {
        let dir = tempdir().unwrap();
        let input = ascending_grid(&dir);
        let output = dir.path().join("age.json");
        let config = JobConfig {
            bbox: BoundingBox::new(100.0, 120.0, 50.0, 60.0),
            ..job(&input, &output)
        };

        match crate::run(&config) {
            Err(Nc2JsonError::EmptyRegion {
                lon_extent,
                lat_extent,
                ..
            }) => {
                assert_eq!(lon_extent, (0.0, 30.0));
                assert_eq!(lat_extent, (-20.0, 20.0));
            }
            other => panic!("Expected EmptyRegion, got {:?}", other),
        }
        assert!(!output.exists());
    }

    #[test]
    fn test_unknown_variable_lists_data_variables() {
        let dir = tempdir().unwrap();
        let input = ascending_grid(&dir);
        let config = JobConfig {
            variable_name: Some("salinity".to_string()),
            ..job(&input, &dir.path().join("age.json"))
        };

        match crate::run(&config) {
            Err(Nc2JsonError::FieldNotFound { name, available }) => {
                assert_eq!(name, "salinity");
                assert_eq!(available, vec!["age".to_string(), "depth".to_string()]);
            }
            other => panic!("Expected FieldNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_axis_name() {
        let dir = tempdir().unwrap();
        let input = ascending_grid(&dir);
        let config = JobConfig {
            lat_name: "latitude".to_string(),
            ..job(&input, &dir.path().join("age.json"))
        };

        assert!(crate::run(&config).is_err());
    }

    #[test]
    fn test_no_clobber_keeps_existing_file() {
        let dir = tempdir().unwrap();
        let input = ascending_grid(&dir);
        let output = dir.path().join("age.json");
        std::fs::write(&output, "keep me").unwrap();

        let config = JobConfig {
            overwrite: false,
            ..job(&input, &output)
        };
        assert!(matches!(crate::run(&config), Err(Nc2JsonError::OutputExists(_))));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "keep me");
    }

    #[test]
    fn test_invalid_config_fails_before_opening() {
        let dir = tempdir().unwrap();
        let config = JobConfig {
            bbox: BoundingBox::new(20.0, -70.0, -60.0, 20.0),
            ..job(&dir.path().join("missing.nc"), &dir.path().join("age.json"))
        };
        assert!(matches!(crate::run(&config), Err(Nc2JsonError::Config(_))));
    }
}

#[cfg(test)]
mod memory_source_tests {
    use super::*;
    use crate::memory::MemorySource;

    #[test]
    fn test_run_with_memory_source() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("memory.json");
        let source = MemorySource::new()
            .with_axis("lat", vec![-45.0, 0.0, 45.0])
            .with_axis("lon", vec![-60.0, 0.0])
            .with_field("age", &["lat", "lon"], vec![1.0, f64::NAN, 2.0, 3.0, 4.0, 5.0])
            .with_text_attribute("age", "units", "Myr");
        let config = JobConfig {
            json_key: output.display().to_string(),
            bbox: BoundingBox::new(-70.0, 20.0, -60.0, 20.0),
            ..JobConfig::default()
        };

        let document = crate::run_with_source(&source, &config).unwrap();
        assert_eq!(document.lat, vec![-45.0, 0.0]);
        assert_eq!(document.lon, vec![-60.0, 0.0]);

        let (_, value) = read_json(&output);
        assert_eq!(value["data"], json!([[1.0, null], [2.0, 3.0]]));
    }

    #[test]
    fn test_run_with_source_validates_config() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("memory.json");
        let source = MemorySource::new()
            .with_axis("lat", vec![0.0])
            .with_axis("lon", vec![0.0])
            .with_field("age", &["lat", "lon"], vec![1.0]);
        let config = JobConfig {
            json_key: output.display().to_string(),
            lon_name: String::new(),
            ..JobConfig::default()
        };

        assert!(matches!(
            crate::run_with_source(&source, &config),
            Err(Nc2JsonError::Config(_))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_run_with_json_fixture() {
        let fixture = r#"
        {
            "variables": [
                {"name": "lat", "dimensions": ["lat"], "values": [20.0, 0.0, -20.0]},
                {"name": "lon", "dimensions": ["lon"], "values": [-10.0, 10.0]},
                {
                    "name": "age",
                    "dimensions": ["lat", "lon"],
                    "values": [10.0, "NaN", null, 40.0, "oops", 60.0],
                    "attributes": {"units": "Myr"}
                }
            ]
        }"#;
        let source = MemorySource::from_json(fixture).unwrap();
        let dir = tempdir().unwrap();
        let output = dir.path().join("fixture.json");
        let config = JobConfig {
            json_key: output.display().to_string(),
            bbox: BoundingBox::new(-20.0, 20.0, -5.0, 25.0),
            ..JobConfig::default()
        };

        crate::run_with_source(&source, &config).unwrap();

        let (text, value) = read_json(&output);
        assert_eq!(value["lat"], json!([20.0, 0.0]));
        assert_eq!(value["data"], json!([[10.0, null], [null, 40.0]]));
        assert!(!text.contains("NaN"));
    }
}

#[cfg(test)]
mod info_tests {
    use super::*;
    use crate::info::get_netcdf_info;

    #[test]
    fn test_info_lists_variables_and_ranges() {
        let dir = tempdir().unwrap();
        let input = descending_grid(&dir);

        let info = get_netcdf_info(input.to_str().unwrap(), None, true).unwrap();
        assert_eq!(info.total_dimensions, 2);
        assert_eq!(info.total_variables, 4);
        assert_eq!(info.global_attributes.get("title").map(String::as_str), Some("test age grid"));

        let lat = info.variables.iter().find(|v| v.name == "lat").unwrap();
        assert!(!lat.is_data_variable);
        let range = lat.coordinate_range.as_ref().unwrap();
        assert_eq!((range.first, range.last), (20.0, -20.0));
        assert!(range.descending);

        let age = info.variables.iter().find(|v| v.name == "age").unwrap();
        assert!(age.is_data_variable);
        assert_eq!(age.shape, vec![5, 4]);
        assert_eq!(age.attributes.get("units").map(String::as_str), Some("Myr"));
        assert!(age.coordinate_range.is_none());
    }

    #[test]
    fn test_info_single_variable() {
        let dir = tempdir().unwrap();
        let input = ascending_grid(&dir);

        let info = get_netcdf_info(input.to_str().unwrap(), Some("depth"), false).unwrap();
        assert_eq!(info.variables.len(), 1);
        assert_eq!(info.variables[0].name, "depth");
        assert!(info.global_attributes.is_empty());
    }

    #[test]
    fn test_info_missing_file() {
        assert!(get_netcdf_info("/nonexistent/age.nc", None, false).is_err());
    }
}
