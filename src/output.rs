//! # JSON Output Module
//!
//! Serializes the cropped, sanitized field to a strict JSON document and
//! checks the written file.
//!
//! ## Guarantees
//!
//! - **No non-finite tokens**: every number goes through [`serialize_finite`],
//!   which fails instead of emitting `NaN` or `Infinity`
//! - **Atomic replace**: the document is written to a temporary file next to
//!   the destination and renamed into place only after a successful write
//! - **Post-write check**: [`verify_written`] re-parses the file and walks the
//!   document structure; problems are reported, not rolled back
//!
//! ## Document Schema
//!
//! ```json
//! {
//!   "var_name": "age",
//!   "units": "Myr",
//!   "lon": [-70.0, -69.9],
//!   "lat": [20.0, 19.9],
//!   "data": [[12.5, null], [13.0, 13.1]]
//! }
//! ```

use crate::error::{Nc2JsonError, Nc2JsonResult};
use crate::grid::CroppedField;
use crate::sanitize::SanitizedGrid;
use log::debug;
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// The exported document. Field order is the JSON key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDocument {
    pub var_name: String,
    pub units: String,
    #[serde(serialize_with = "serialize_finite_seq")]
    pub lon: Vec<f64>,
    #[serde(serialize_with = "serialize_finite_seq")]
    pub lat: Vec<f64>,
    /// Rows are latitudes, columns are longitudes
    pub data: SanitizedGrid,
}

impl OutputDocument {
    pub fn new(field: &CroppedField, data: SanitizedGrid) -> Self {
        OutputDocument {
            var_name: field.name().to_string(),
            units: field.units().to_string(),
            lon: field.lon().to_vec(),
            lat: field.lat().to_vec(),
            data,
        }
    }

    /// Encodes the document, failing on any non-finite number.
    pub fn to_json(&self, pretty: bool) -> Nc2JsonResult<Vec<u8>> {
        let bytes = if pretty {
            serde_json::to_vec_pretty(self)?
        } else {
            serde_json::to_vec(self)?
        };
        Ok(bytes)
    }
}

/// Serializes a finite f64; NaN and infinities are an error.
pub fn serialize_finite<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        Err(S::Error::custom(format!(
            "non-finite value {} cannot be represented in JSON",
            value
        )))
    }
}

struct Finite(f64);

impl Serialize for Finite {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_finite(&self.0, serializer)
    }
}

fn serialize_finite_seq<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(values.iter().map(|&v| Finite(v)))
}

/// How the output file is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub pretty: bool,
    /// Replace an existing file at the destination
    pub overwrite: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            pretty: false,
            overwrite: true,
        }
    }
}

/// Where and how much was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    /// Absolute path of the written file
    pub path: PathBuf,
    pub bytes: usize,
}

/// Writes `doc` to `path` as JSON.
///
/// The document is fully encoded before any file is touched, so a
/// serialization failure leaves nothing on disk. The encoded bytes go to a
/// temporary file in the destination directory which is then renamed over
/// `path`.
///
/// # Errors
///
/// - [`Nc2JsonError::Serialization`] if a non-finite value reached the writer
///
/// The file gets the default mode of a newly created file, or keeps the mode
/// of the file it replaces.
/// - [`Nc2JsonError::OutputExists`] if `path` exists and `overwrite` is off
/// - [`Nc2JsonError::Io`] for filesystem failures
pub fn write_document(
    doc: &OutputDocument,
    path: &Path,
    options: WriteOptions,
) -> Nc2JsonResult<WriteSummary> {
    if !options.overwrite && path.exists() {
        return Err(Nc2JsonError::OutputExists(path.display().to_string()));
    }

    let bytes = doc.to_json(options.pretty)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut temp = new_temp_file(&dir)?;
    debug!("Writing {} bytes to temporary file {:?}", bytes.len(), temp.path());
    temp.write_all(&bytes)?;
    if let Ok(existing) = fs::metadata(path) {
        temp.as_file().set_permissions(existing.permissions())?;
    }
    temp.as_file().sync_all()?;
    persist(temp, path, options.overwrite)?;

    let resolved = fs::canonicalize(path)?;
    debug!("Persisted JSON document at {:?}", resolved);
    Ok(WriteSummary {
        path: resolved,
        bytes: bytes.len(),
    })
}

/// Temporary file created with the same default mode as `fs::write`
/// (0o666 minus the umask).
#[cfg(unix)]
fn new_temp_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    tempfile::Builder::new()
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn new_temp_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    NamedTempFile::new_in(dir)
}

/// Moves the temporary file onto `path`. Without `overwrite` the rename fails
/// if `path` appeared after the up-front existence check.
fn persist(temp: NamedTempFile, path: &Path, overwrite: bool) -> Nc2JsonResult<()> {
    if overwrite {
        temp.persist(path).map_err(|e| e.error)?;
        return Ok(());
    }
    match temp.persist_noclobber(path) {
        Ok(_) => Ok(()),
        Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
            Err(Nc2JsonError::OutputExists(path.display().to_string()))
        }
        Err(e) => Err(e.error.into()),
    }
}

/// Findings of the post-write check. Empty means the file is clean.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    pub issues: Vec<String>,
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Re-reads a written document and checks it. Never fails: an unreadable
/// file is reported as an issue.
pub fn verify_written(path: &Path) -> VerificationReport {
    match fs::read_to_string(path) {
        Ok(text) => verify_json_text(&text),
        Err(e) => VerificationReport {
            issues: vec![format!("could not re-read {}: {}", path.display(), e)],
        },
    }
}

/// Checks document text for bare non-finite tokens and for schema problems.
pub fn verify_json_text(text: &str) -> VerificationReport {
    let mut issues: Vec<String> = bare_tokens(text)
        .into_iter()
        .map(|token| format!("bare token '{}' outside of a string", token))
        .collect();

    match serde_json::from_str::<Value>(text) {
        Ok(doc) => check_document(&doc, &mut issues),
        Err(e) => issues.push(format!("not valid JSON: {}", e)),
    }
    VerificationReport { issues }
}

/// Identifiers appearing outside string literals, other than the JSON
/// keywords. Catches `NaN`, `Infinity`, `nan` and `inf` regardless of
/// surrounding whitespace, without flagging the same letters inside strings.
fn bare_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut current = String::new();

    for ch in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        // exponent markers inside numbers are letters too; digits keep them attached
        if ch.is_ascii_alphabetic() || (!current.is_empty() && ch.is_ascii_alphanumeric()) {
            current.push(ch);
            continue;
        }
        flush_token(&mut current, &mut tokens);
        if ch == '"' {
            in_string = true;
        }
    }
    flush_token(&mut current, &mut tokens);
    tokens
}

fn flush_token(current: &mut String, tokens: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    let token = std::mem::take(current);
    let is_exponent = token.len() > 1
        && token.starts_with(['e', 'E'])
        && token[1..].chars().all(|c| c.is_ascii_digit());
    if !matches!(token.as_str(), "true" | "false" | "null" | "e" | "E") && !is_exponent {
        tokens.push(token);
    }
}

fn check_document(doc: &Value, issues: &mut Vec<String>) {
    let Some(obj) = doc.as_object() else {
        issues.push("document is not a JSON object".to_string());
        return;
    };

    for key in ["var_name", "units"] {
        if !obj.get(key).is_some_and(Value::is_string) {
            issues.push(format!("'{}' is missing or not a string", key));
        }
    }

    let lon_len = check_number_array(obj.get("lon"), "lon", issues);
    let lat_len = check_number_array(obj.get("lat"), "lat", issues);

    let Some(rows) = obj.get("data").and_then(Value::as_array) else {
        issues.push("'data' is missing or not an array".to_string());
        return;
    };
    if let Some(lat_len) = lat_len
        && rows.len() != lat_len
    {
        issues.push(format!("'data' has {} rows but 'lat' has {} values", rows.len(), lat_len));
    }
    for (i, row) in rows.iter().enumerate() {
        let Some(cells) = row.as_array() else {
            issues.push(format!("data row {} is not an array", i));
            continue;
        };
        if let Some(lon_len) = lon_len
            && cells.len() != lon_len
        {
            issues.push(format!("data row {} has {} cells but 'lon' has {} values", i, cells.len(), lon_len));
        }
        if let Some(j) = cells.iter().position(|c| !(c.is_number() || c.is_null())) {
            issues.push(format!("data[{}][{}] is neither a number nor null", i, j));
        }
    }
}

fn check_number_array(value: Option<&Value>, key: &str, issues: &mut Vec<String>) -> Option<usize> {
    match value.and_then(Value::as_array) {
        Some(values) if values.iter().all(Value::is_number) => Some(values.len()),
        Some(_) => {
            issues.push(format!("'{}' contains non-numeric entries", key));
            None
        }
        None => {
            issues.push(format!("'{}' is missing or not an array", key));
            None
        }
    }
}
