//! The `jsonPath` template function.

use super::{expect_arity, number_value, template_error};
use crate::error::{Error, Result};
use minijinja::value::{Rest, Value};
use minijinja::Environment;
use serde_json_path::JsonPath;
use std::sync::Arc;
use tracing::trace;

/// Outcome of a JSONPath query, shaped for text output
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// A single string, number, boolean or null
    Scalar(serde_json::Value),
    /// An object, an array, or the matches of an indefinite path, serialized as JSON
    Json(String),
}

/// JSONPath queries over one parsed document
#[derive(Debug, Clone)]
pub struct JsonPathQuery {
    document: Arc<serde_json::Value>,
}

impl JsonPathQuery {
    /// Wraps a parsed document
    pub fn new(document: serde_json::Value) -> Self {
        Self {
            document: Arc::new(document),
        }
    }

    /// Evaluates `expression`.
    ///
    /// A definite path (names and single indices only) yields its one node as
    /// a scalar or as JSON text, and no match is an error. Any other path
    /// yields a JSON array of its matches, `[]` when nothing matches.
    pub fn query(&self, expression: &str) -> Result<QueryOutput> {
        let path = JsonPath::parse(expression)?;
        let nodes = path.query(&self.document).all();
        trace!("{} matched {} node(s)", expression, nodes.len());

        if !is_definite(expression) {
            let array: Vec<serde_json::Value> = nodes.into_iter().cloned().collect();
            return Ok(QueryOutput::Json(serde_json::Value::Array(array).to_string()));
        }

        match nodes.first() {
            None => Err(Error::NoMatch {
                expression: expression.to_string(),
            }),
            Some(node) if node.is_object() || node.is_array() => {
                Ok(QueryOutput::Json(node.to_string()))
            }
            Some(node) => Ok(QueryOutput::Scalar((*node).clone())),
        }
    }
}

/// Whether a parsed path can select at most one node.
///
/// Wildcards, descendant segments, filters, slices and unions are the only
/// selectors that can fan out; quoted member names are skipped.
fn is_definite(expression: &str) -> bool {
    let mut chars = expression.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                while let Some(inner) = chars.next() {
                    if inner == '\\' {
                        chars.next();
                    } else if inner == c {
                        break;
                    }
                }
            }
            '*' | '?' | ':' | ',' => return false,
            '.' if chars.peek() == Some(&'.') => return false,
            _ => {}
        }
    }
    true
}

impl From<QueryOutput> for Value {
    fn from(output: QueryOutput) -> Self {
        match output {
            QueryOutput::Json(text) => Value::from(text),
            QueryOutput::Scalar(serde_json::Value::String(s)) => Value::from(s),
            QueryOutput::Scalar(serde_json::Value::Bool(b)) => Value::from(b),
            QueryOutput::Scalar(serde_json::Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    Value::from(i)
                } else if let Some(u) = n.as_u64() {
                    Value::from(u)
                } else {
                    number_value(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            QueryOutput::Scalar(other) => Value::from(other.to_string()),
        }
    }
}

pub(crate) fn register(env: &mut Environment<'static>, query: JsonPathQuery) {
    env.add_function(
        "jsonPath",
        move |args: Rest<Value>| -> std::result::Result<Value, minijinja::Error> {
            expect_arity("jsonPath", &args, 1, "exactly 1 argument: the JSONPath expression")?;
            query
                .query(&args[0].to_string())
                .map(Value::from)
                .map_err(template_error)
        },
    );
}
