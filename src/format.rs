//! Rendering resolved settings as JSON, YAML or TOML.

use anyhow::{Context, Result};
use serde_json::{Map, Value};

/// Output format for the `show`, `modules` and `languages` commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Toml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "toml" => Ok(OutputFormat::Toml),
            _ => Err(format!(
                "Invalid format '{}'. Valid options: json, yaml, toml",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Toml => write!(f, "toml"),
        }
    }
}

/// TOML has no null; drop null values and null list items.
fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(strip_nulls)
                .collect(),
        ),
        other => other,
    }
}

/// Render `value` in `format`. TOML output needs a table at the root, so
/// other values are rendered as a bare TOML value.
pub fn render(value: &Value, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(value).context("rendering JSON")?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Yaml => serde_yaml::to_string(value).context("rendering YAML"),
        OutputFormat::Toml => {
            let value = strip_nulls(value.clone());
            if value.is_object() {
                toml::to_string_pretty(&value).context("rendering TOML")
            } else {
                let value: toml::Value =
                    serde_json::from_value(value).context("rendering TOML")?;
                Ok(format!("{value}\n"))
            }
        }
    }
}
