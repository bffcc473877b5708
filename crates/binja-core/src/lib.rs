//! # binja-core
//!
//! Typed field extraction from binary buffers, exposed to text templates.
//!
//! This crate provides the core functionality for:
//! - Bounds-checked, endianness-aware reads from an immutable byte buffer
//! - A closed catalogue of named decode operations driven by text arguments
//! - Rendering [minijinja] templates that call those operations, plus JSON,
//!   lookup and JSONPath helpers for JSON sources
//!
//! ## Architecture
//!
//! - [`buffer`]: the shared read-only buffer and its typed accessors
//! - [`decoder`]: operation catalogue, argument validation and value formatting
//! - [`template`]: template loading and function registration
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```
//! use binja_core::{ByteBuffer, DecodeRequest, DecodeValue, Operation};
//!
//! let buffer = ByteBuffer::new(vec![0xFF, 0xFF, 0xFF, 0xFF]);
//! let request = DecodeRequest::new(Operation::ReadUnsignedInt, ["0"]);
//! assert_eq!(request.evaluate(&buffer)?, DecodeValue::UnsignedInt(4_294_967_295));
//! # Ok::<(), binja_core::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod buffer;
pub mod decoder;
pub mod error;
pub mod template;

// Re-export primary types for convenience
pub use buffer::{ByteBuffer, Endianness};
pub use decoder::{decode, DecodeRequest, DecodeValue, Operation, TextEncoding};
pub use error::{Error, Result};
pub use template::{JsonPathQuery, LookupService, TemplateConfig, TemplateRunner};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
