//! Template rendering front end.
//!
//! This module wires the decode catalogue, the helper functions and JSONPath
//! queries into a [minijinja] environment. Templates are loaded from disk;
//! includes and imports resolve relative to the directory of the main
//! template. Output is never auto-escaped.
//!
//! ## Example
//!
//! ```no_run
//! use binja_core::{ByteBuffer, TemplateConfig, TemplateRunner};
//!
//! let buffer = ByteBuffer::from_file("record.bin")?;
//! let output = TemplateRunner::open("record.json.j2", TemplateConfig::default())?
//!     .with_decoders(&buffer)
//!     .render(minijinja::context! {})?;
//! std::fs::write("record.json", output)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod helpers;
mod jsonpath;

use crate::buffer::ByteBuffer;
use crate::decoder::{decode, DecodeValue, Operation};
use crate::error::{Error, Result};
use minijinja::value::{Rest, Value};
use minijinja::{path_loader, AutoEscape, Environment, ErrorKind, UndefinedBehavior};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub use helpers::{convert_units, format_text, LookupService};
pub use jsonpath::{JsonPathQuery, QueryOutput};

/// Configuration for template rendering
#[derive(Debug, Clone)]
pub struct TemplateConfig {
    /// Keep the final newline of the template in the output
    pub keep_trailing_newline: bool,
    /// Fail on undefined variables instead of rendering them empty
    pub strict_undefined: bool,
    /// Maximum number of cached lookup results
    pub lookup_capacity: u64,
    /// Time after which a cached lookup result expires
    pub lookup_ttl: Duration,
    /// Value returned by `lookup` for unknown keys
    pub lookup_fallback: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            keep_trailing_newline: true,
            strict_undefined: true,
            lookup_capacity: 100,
            lookup_ttl: Duration::from_secs(10 * 60),
            lookup_fallback: "Unknown Device".to_string(),
        }
    }
}

impl TemplateConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the template's trailing newline is kept
    pub fn keep_trailing_newline(mut self, keep: bool) -> Self {
        self.keep_trailing_newline = keep;
        self
    }

    /// Sets whether undefined variables are an error
    pub fn strict_undefined(mut self, strict: bool) -> Self {
        self.strict_undefined = strict;
        self
    }

    /// Sets the lookup cache capacity
    pub fn lookup_capacity(mut self, capacity: u64) -> Self {
        self.lookup_capacity = capacity;
        self
    }

    /// Sets the lookup cache time-to-live
    pub fn lookup_ttl(mut self, ttl: Duration) -> Self {
        self.lookup_ttl = ttl;
        self
    }

    /// Sets the value returned for unknown lookup keys
    pub fn lookup_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.lookup_fallback = fallback.into();
        self
    }
}

/// A loaded template plus the functions registered for it
pub struct TemplateRunner {
    env: Environment<'static>,
    name: String,
}

impl TemplateRunner {
    /// Loads the template at `path`
    pub fn open(path: impl AsRef<Path>, config: TemplateConfig) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "template".to_string());
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut env = Environment::new();
        env.set_loader(path_loader(dir));
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(config.keep_trailing_newline);
        if config.strict_undefined {
            env.set_undefined_behavior(UndefinedBehavior::Strict);
        }
        env.add_template_owned(name.clone(), source)?;

        debug!("Loaded template {} from {}", name, dir.display());
        Ok(Self { env, name })
    }

    /// Registers the decode catalogue over `buffer` and exposes its length as
    /// `size`
    pub fn with_decoders(mut self, buffer: &ByteBuffer) -> Self {
        for operation in Operation::ALL {
            let buffer = buffer.clone();
            self.env.add_function(
                operation.name(),
                move |args: Rest<Value>| -> std::result::Result<Value, minijinja::Error> {
                    let args: Vec<String> = args.iter().map(Value::to_string).collect();
                    decode(&buffer, operation, &args)
                        .map(Value::from)
                        .map_err(template_error)
                },
            );
        }
        self.env.add_global("size", buffer.len());
        debug!("Registered {} decode functions", Operation::ALL.len());
        self
    }

    /// Registers `lookup`, `convert` and `format`
    pub fn with_helpers(mut self, lookup: LookupService) -> Self {
        helpers::register(&mut self.env, lookup);
        self
    }

    /// Registers `jsonPath` over a parsed document
    pub fn with_json_path(mut self, query: JsonPathQuery) -> Self {
        jsonpath::register(&mut self.env, query);
        self
    }

    /// Renders the template with `context` as its root variables
    pub fn render<S: Serialize>(&self, context: S) -> Result<String> {
        let template = self.env.get_template(&self.name)?;
        Ok(template.render(context)?)
    }
}

/// Reads and parses a JSON file
pub fn read_json(path: impl AsRef<Path>) -> Result<serde_json::Value> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
    Ok(serde_json::from_str(&text)?)
}

/// Turns a JSON object into template root variables
pub fn object_context(document: &serde_json::Value) -> Result<Value> {
    if !document.is_object() {
        return Err(Error::invalid_document("top-level JSON value must be an object"));
    }
    Ok(Value::from_serialize(document))
}

impl From<DecodeValue> for Value {
    fn from(value: DecodeValue) -> Self {
        match value {
            DecodeValue::Short(v) => Value::from(v),
            DecodeValue::Int(v) => Value::from(v),
            DecodeValue::Long(v) => Value::from(v),
            DecodeValue::UnsignedInt(v) => Value::from(v),
            DecodeValue::Float(v) => number_value(shortest_f32(v)),
            DecodeValue::Double(v) => number_value(v),
            DecodeValue::Byte(v) => Value::from(v),
            DecodeValue::Boolean(v) => Value::from(v),
            DecodeValue::Text(s) | DecodeValue::ByteList(s) | DecodeValue::Hex(s) => Value::from(s),
        }
    }
}

/// Integral floats render without a fractional part
pub(crate) fn number_value(value: f64) -> Value {
    const EXACT_LIMIT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() < EXACT_LIMIT {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

/// Widens `value` through its shortest decimal form, so `0.1f32` becomes
/// `0.1` rather than `0.10000000149011612`
fn shortest_f32(value: f32) -> f64 {
    value.to_string().parse().unwrap_or(f64::from(value))
}

pub(crate) fn template_error(err: Error) -> minijinja::Error {
    minijinja::Error::new(ErrorKind::InvalidOperation, err.to_string()).with_source(err)
}

pub(crate) fn expect_arity(
    name: &str,
    args: &[Value],
    count: usize,
    signature: &str,
) -> std::result::Result<(), minijinja::Error> {
    if args.len() == count {
        return Ok(());
    }
    Err(minijinja::Error::new(
        ErrorKind::InvalidOperation,
        format!("{} requires {}, got {}", name, signature, args.len()),
    ))
}
