//! General purpose template functions: `lookup`, `convert` and `format`.

use super::{expect_arity, number_value, TemplateConfig};
use crate::error::{Error, Result};
use minijinja::value::{Rest, Value};
use minijinja::{Environment, ErrorKind};
use moka::sync::Cache;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::trace;

/// Key to value lookup backed by a bounded, time-expiring cache
#[derive(Clone)]
pub struct LookupService {
    table: Arc<HashMap<String, String>>,
    fallback: Arc<str>,
    cache: Cache<String, String>,
}

impl LookupService {
    /// Creates a lookup over `table` with the cache limits from `config`
    pub fn new(table: HashMap<String, String>, config: &TemplateConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.lookup_capacity)
            .time_to_live(config.lookup_ttl)
            .build();

        Self {
            table: Arc::new(table),
            fallback: Arc::from(config.lookup_fallback.as_str()),
            cache,
        }
    }

    /// Loads the lookup table from a JSON object file.
    ///
    /// String values are used as-is; any other value is stored as its JSON
    /// text.
    pub fn from_json_file(path: impl AsRef<Path>, config: &TemplateConfig) -> Result<Self> {
        let document = super::read_json(path)?;
        let serde_json::Value::Object(entries) = document else {
            return Err(Error::invalid_document("lookup table must be a JSON object"));
        };

        let table = entries
            .into_iter()
            .map(|(key, value)| match value {
                serde_json::Value::String(s) => (key, s),
                other => (key, other.to_string()),
            })
            .collect();

        Ok(Self::new(table, config))
    }

    /// Resolves `key`, falling back to the configured default
    pub fn get(&self, key: &str) -> String {
        self.cache.get_with(key.to_string(), || {
            trace!("Lookup cache miss for '{}'", key);
            self.table
                .get(key)
                .cloned()
                .unwrap_or_else(|| self.fallback.to_string())
        })
    }
}

/// Converts a temperature between celsius and fahrenheit.
///
/// Unit pairs other than those two return `value` unchanged.
pub fn convert_units(value: f64, from: &str, to: &str) -> f64 {
    match (from, to) {
        ("celsius", "fahrenheit") => value * 9.0 / 5.0 + 32.0,
        ("fahrenheit", "celsius") => (value - 32.0) * 5.0 / 9.0,
        _ => value,
    }
}

/// Applies a named case style; unknown styles return the input unchanged
pub fn format_text(value: &str, style: &str) -> String {
    match style {
        "uppercase" => value.to_uppercase(),
        "lowercase" => value.to_lowercase(),
        "capitalize" => {
            let mut chars = value.chars();
            match chars.next() {
                Some(first) => format!(
                    "{}{}",
                    first.to_uppercase(),
                    chars.as_str().to_lowercase()
                ),
                None => String::new(),
            }
        }
        _ => value.to_string(),
    }
}

pub(crate) fn register(env: &mut Environment<'static>, lookup: LookupService) {
    env.add_function(
        "lookup",
        move |args: Rest<Value>| -> std::result::Result<Value, minijinja::Error> {
            expect_arity("lookup", &args, 1, "1 argument: key")?;
            Ok(Value::from(lookup.get(&args[0].to_string())))
        },
    );

    env.add_function(
        "convert",
        |args: Rest<Value>| -> std::result::Result<Value, minijinja::Error> {
            expect_arity("convert", &args, 3, "3 arguments: value, fromUnit, toUnit")?;
            let raw = args[0].to_string();
            let value = raw.parse::<f64>().map_err(|_| {
                minijinja::Error::new(
                    ErrorKind::InvalidOperation,
                    format!("convert: '{}' is not a number", raw),
                )
            })?;
            let converted = convert_units(value, &args[1].to_string(), &args[2].to_string());
            Ok(number_value(converted))
        },
    );

    env.add_function(
        "format",
        |args: Rest<Value>| -> std::result::Result<Value, minijinja::Error> {
            expect_arity("format", &args, 2, "2 arguments: value, format")?;
            Ok(Value::from(format_text(
                &args[0].to_string(),
                &args[1].to_string(),
            )))
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn devices() -> HashMap<String, String> {
        HashMap::from([
            ("iot-sensor-001".to_string(), "Temperature Sensor A".to_string()),
            ("iot-sensor-002".to_string(), "Humidity Sensor B".to_string()),
        ])
    }

    #[test]
    fn test_lookup_hits_and_fallback() {
        let lookup = LookupService::new(devices(), &TemplateConfig::default());
        assert_eq!(lookup.get("iot-sensor-001"), "Temperature Sensor A");
        assert_eq!(lookup.get("iot-sensor-001"), "Temperature Sensor A");
        assert_eq!(lookup.get("iot-sensor-999"), "Unknown Device");
    }

    #[test]
    fn test_lookup_custom_fallback() {
        let config = TemplateConfig::new().lookup_fallback("?");
        let lookup = LookupService::new(HashMap::new(), &config);
        assert_eq!(lookup.get("anything"), "?");
    }

    #[test]
    fn test_lookup_from_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("table.json");
        std::fs::write(&path, r#"{"a": "Alpha", "b": 2}"#).unwrap();

        let lookup = LookupService::from_json_file(&path, &TemplateConfig::default()).unwrap();
        assert_eq!(lookup.get("a"), "Alpha");
        assert_eq!(lookup.get("b"), "2");

        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(
            LookupService::from_json_file(&path, &TemplateConfig::default()),
            Err(Error::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_convert_units() {
        assert_eq!(convert_units(100.0, "celsius", "fahrenheit"), 212.0);
        assert_eq!(convert_units(32.0, "fahrenheit", "celsius"), 0.0);
        assert_eq!(convert_units(7.5, "meters", "feet"), 7.5);
    }

    #[test]
    fn test_format_text() {
        assert_eq!(format_text("mIxEd", "uppercase"), "MIXED");
        assert_eq!(format_text("mIxEd", "lowercase"), "mixed");
        assert_eq!(format_text("mIxEd", "capitalize"), "Mixed");
        assert_eq!(format_text("", "capitalize"), "");
        assert_eq!(format_text("mIxEd", "reverse"), "mIxEd");
    }
}
