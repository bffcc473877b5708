//! Positional argument validation shared by every decode operation.

use super::Operation;
use crate::error::{Error, Result};

/// Validated view over the text arguments of one decode call
#[derive(Debug)]
pub(crate) struct Args<'a, S> {
    operation: Operation,
    values: &'a [S],
}

impl<'a, S: AsRef<str>> Args<'a, S> {
    /// Checks the argument count against the operation's signature
    pub(crate) fn new(operation: Operation, values: &'a [S]) -> Result<Self> {
        let (min, max) = operation.arity();
        if values.len() < min || values.len() > max {
            return Err(Error::Arity {
                operation,
                signature: operation.signature(),
                actual: values.len(),
            });
        }
        Ok(Self { operation, values })
    }

    /// Parses the argument at `position` as a signed integer
    pub(crate) fn integer(&self, position: usize) -> Result<i64> {
        let raw = self.values[position].as_ref();
        raw.parse::<i64>().map_err(|_| Error::ArgumentParse {
            operation: self.operation,
            position,
            value: raw.to_string(),
        })
    }

    /// Returns the argument at `position` as text, if it was supplied
    pub(crate) fn text(&self, position: usize) -> Option<&'a str> {
        self.values.get(position).map(AsRef::as_ref)
    }
}
