//! Template serialization and `x-aws-cloudformation` overlays

use crate::error::{Result, TemplateError};
use crate::template::Template;
use serde_yaml::Value;
use std::fmt;
use std::str::FromStr;

/// Output document syntax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl FromStr for OutputFormat {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(TemplateError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yaml => write!(f, "yaml"),
            Self::Json => write!(f, "json"),
        }
    }
}

pub fn render(template: &Template, format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(template)?.into_bytes()),
        OutputFormat::Json => Ok(serde_json::to_vec_pretty(template)?),
    }
}

/// Deep-merge `overlay` onto an already rendered document.
///
/// Mappings merge key by key, sequences take the overlay's items first, any other
/// overlay value replaces the rendered one and `null` deletes the key.
pub fn overlay(rendered: &[u8], overlay: &serde_json::Value, format: OutputFormat) -> Result<Vec<u8>> {
    let mut document: Value = serde_yaml::from_slice(rendered)?;
    let patch = serde_yaml::to_value(overlay)?;
    if !patch.is_mapping() {
        return Err(TemplateError::Overlay(format!(
            "expected a mapping, got {}",
            kind(&patch)
        )));
    }
    if !document.is_mapping() {
        return Err(TemplateError::Overlay(
            "rendered template is not a mapping".to_string(),
        ));
    }

    merge(&mut document, patch);

    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(&document)?.into_bytes()),
        OutputFormat::Json => Ok(serde_json::to_vec_pretty(&document)?),
    }
}

fn merge(dest: &mut Value, src: Value) {
    match (dest, src) {
        (Value::Mapping(dest), Value::Mapping(src)) => {
            for (key, value) in src {
                if value.is_null() {
                    dest.remove(&key);
                } else if let Some(existing) = dest.get_mut(&key) {
                    merge(existing, value);
                } else {
                    dest.insert(key, value);
                }
            }
        }
        (Value::Sequence(dest), Value::Sequence(src)) => {
            let rendered = std::mem::replace(dest, src);
            dest.extend(rendered);
        }
        (dest, src) => *dest = src,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
