//! Format decoders turning config file bytes into a key-value tree.

use crate::error::ConfigError;
use crate::fs::SourceFs;
use crate::paths::ext_no_delimiter;
use regex_lite::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

/// Recognized config file extensions, in probing priority order.
pub const VALID_CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// A recognized config file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Yaml,
    Json,
}

impl Format {
    /// Format for a file extension without the leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Format::Toml),
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_extension(&ext_no_delimiter(path))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Toml => write!(f, "toml"),
            Format::Yaml => write!(f, "yaml"),
            Format::Json => write!(f, "json"),
        }
    }
}

/// Whether `path` has one of the recognized config extensions.
pub fn is_valid_config_filename(path: &Path) -> bool {
    Format::from_path(path).is_some()
}

/// Malformed content, with a 1-based line number when one could be derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub format: Format,
    pub line: Option<usize>,
    pub message: String,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to decode {}: {}", self.format, self.message)
    }
}

impl std::error::Error for DecodeError {}

/// Decodes config bytes into a mapping.
pub trait ConfigDecoder: Send + Sync + fmt::Debug {
    fn decode(&self, bytes: &[u8], format: Format) -> Result<Map<String, Value>, DecodeError>;
}

/// TOML, YAML and JSON decoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDecoder;

impl ConfigDecoder for DefaultDecoder {
    fn decode(&self, bytes: &[u8], format: Format) -> Result<Map<String, Value>, DecodeError> {
        let text = std::str::from_utf8(bytes).map_err(|e| DecodeError {
            format,
            line: None,
            message: format!("invalid UTF-8: {}", e),
        })?;

        let value = match format {
            Format::Toml => {
                let table: toml::Table = toml::from_str(text).map_err(|e| DecodeError {
                    format,
                    line: e.span().map(|span| line_at_offset(text, span.start)),
                    message: e.message().to_string(),
                })?;
                toml_to_json(toml::Value::Table(table))
            }
            Format::Yaml => {
                if text.trim().is_empty() {
                    Value::Null
                } else {
                    serde_yaml::from_str::<Value>(text).map_err(|e| {
                        let message = e.to_string();
                        DecodeError {
                            format,
                            line: e
                                .location()
                                .map(|loc| loc.line())
                                .or_else(|| line_from_message(&message)),
                            message,
                        }
                    })?
                }
            }
            Format::Json => {
                if text.trim().is_empty() {
                    Value::Null
                } else {
                    serde_json::from_str::<Value>(text).map_err(|e| DecodeError {
                        format,
                        line: (e.line() > 0).then_some(e.line()),
                        message: e.to_string(),
                    })?
                }
            }
        };

        match value {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            other => Err(DecodeError {
                format,
                line: None,
                message: format!(
                    "expected a mapping at the document root, found {}",
                    super::merge::value_kind(&other)
                ),
            }),
        }
    }
}

/// Convert a TOML value to JSON. Datetimes become their string form.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// 1-based line of a byte offset.
pub(crate) fn line_at_offset(text: &str, offset: usize) -> usize {
    let end = offset.min(text.len());
    text.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}

/// Pull `line N` out of a free-form error message.
pub(crate) fn line_from_message(message: &str) -> Option<usize> {
    static LINE_RE: OnceLock<Regex> = OnceLock::new();
    let re = LINE_RE.get_or_init(|| Regex::new(r"(?i)\bline\s+(\d+)").expect("valid regex"));
    re.captures(message)?.get(1)?.as_str().parse().ok()
}

/// Read and decode a file, picking the format from its extension.
pub fn decode_file_to_map(
    fs: &dyn SourceFs,
    decoder: &dyn ConfigDecoder,
    path: &Path,
) -> Result<Map<String, Value>, ConfigError> {
    let format = Format::from_path(path).ok_or_else(|| ConfigError::Decode {
        path: path.to_path_buf(),
        line: None,
        message: format!(
            "unsupported config format \"{}\"",
            ext_no_delimiter(path)
        ),
    })?;
    let bytes = fs.read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decoder
        .decode(&bytes, format)
        .map_err(|e| ConfigError::Decode {
            path: path.to_path_buf(),
            line: e.line,
            message: e.message,
        })
}
