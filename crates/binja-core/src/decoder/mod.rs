//! The decode catalogue.
//!
//! Every field expression in a template resolves to one [`Operation`] plus a
//! list of text arguments. [`decode`] validates the arguments, reads the
//! value through the [`ByteBuffer`] accessors and returns a [`DecodeValue`].
//!
//! ## Catalogue
//!
//! | Operation | Arguments | Result |
//! |---|---|---|
//! | `readInt` / `readIntBE` | offset | 32-bit signed |
//! | `readLong` / `readLongBE` | offset | 64-bit signed |
//! | `readShort` | offset | 16-bit signed, little endian |
//! | `readFloat` / `readFloatBE` | offset | 32-bit float |
//! | `readDouble` | offset | 64-bit float, little endian |
//! | `readUnsignedInt` | offset | 32-bit unsigned, widened |
//! | `readByte` | offset | unsigned byte |
//! | `readBoolean` | offset | byte != 0 |
//! | `readBit` | offset, bitPos | bit test |
//! | `readString` | offset, length, \[encoding\] | trimmed text |
//! | `readBytes` | offset, length | `[12, 0, 255]` |
//! | `readHex` | offset, length | `0C00FF` |
//!
//! Unless noted otherwise, operations without a `BE` suffix are little endian.
//!
//! ## Example
//!
//! ```
//! use binja_core::{decode, ByteBuffer, DecodeValue, Operation};
//!
//! let buffer = ByteBuffer::new(vec![0x0C, 0x00, 0xFF]);
//! let value = decode(&buffer, Operation::ReadHex, &["0", "3"])?;
//! assert_eq!(value, DecodeValue::Hex("0C00FF".to_string()));
//! # Ok::<(), binja_core::Error>(())
//! ```

mod args;
pub mod text;

use crate::buffer::{ByteBuffer, Endianness};
use crate::error::{Error, Result};
use args::Args;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

pub use text::{trim_padding, TextEncoding, DEFAULT_ENCODING};

/// One entry of the closed decode catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// 32-bit signed, little endian
    ReadInt,
    /// 32-bit signed, big endian
    ReadIntBE,
    /// 64-bit signed, little endian
    ReadLong,
    /// 64-bit signed, big endian
    ReadLongBE,
    /// 16-bit signed, little endian
    ReadShort,
    /// 32-bit float, little endian
    ReadFloat,
    /// 32-bit float, big endian
    ReadFloatBE,
    /// 64-bit float, little endian
    ReadDouble,
    /// 32-bit unsigned widened to 64 bits, little endian
    ReadUnsignedInt,
    /// Unsigned byte
    ReadByte,
    /// Byte as boolean
    ReadBoolean,
    /// Single bit of a byte
    ReadBit,
    /// Fixed-length encoded string
    ReadString,
    /// Byte run rendered as a list
    ReadBytes,
    /// Byte run rendered as hex
    ReadHex,
}

impl Operation {
    /// Every operation in the catalogue
    pub const ALL: [Operation; 15] = [
        Self::ReadInt,
        Self::ReadIntBE,
        Self::ReadLong,
        Self::ReadLongBE,
        Self::ReadShort,
        Self::ReadFloat,
        Self::ReadFloatBE,
        Self::ReadDouble,
        Self::ReadUnsignedInt,
        Self::ReadByte,
        Self::ReadBoolean,
        Self::ReadBit,
        Self::ReadString,
        Self::ReadBytes,
        Self::ReadHex,
    ];

    /// Name under which the operation is exposed to templates
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReadInt => "readInt",
            Self::ReadIntBE => "readIntBE",
            Self::ReadLong => "readLong",
            Self::ReadLongBE => "readLongBE",
            Self::ReadShort => "readShort",
            Self::ReadFloat => "readFloat",
            Self::ReadFloatBE => "readFloatBE",
            Self::ReadDouble => "readDouble",
            Self::ReadUnsignedInt => "readUnsignedInt",
            Self::ReadByte => "readByte",
            Self::ReadBoolean => "readBoolean",
            Self::ReadBit => "readBit",
            Self::ReadString => "readString",
            Self::ReadBytes => "readBytes",
            Self::ReadHex => "readHex",
        }
    }

    /// Accepted argument count as an inclusive `(min, max)` pair
    pub fn arity(&self) -> (usize, usize) {
        match self {
            Self::ReadBit | Self::ReadBytes | Self::ReadHex => (2, 2),
            Self::ReadString => (2, 3),
            _ => (1, 1),
        }
    }

    /// Argument signature used in arity errors
    pub fn signature(&self) -> &'static str {
        match self {
            Self::ReadBit => "2 arguments: offset, bitPosition",
            Self::ReadBytes | Self::ReadHex => "2 arguments: offset, length",
            Self::ReadString => "2-3 arguments: offset, length, [encoding]",
            _ => "1 argument: offset",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| Error::UnknownOperation {
                name: s.to_string(),
            })
    }
}

/// A decoded field value
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeValue {
    /// 16-bit signed integer
    Short(i16),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit unsigned integer held in 64 bits
    UnsignedInt(u64),
    /// Single precision float
    Float(f32),
    /// Double precision float
    Double(f64),
    /// Unsigned byte
    Byte(u8),
    /// Boolean or bit flag
    Boolean(bool),
    /// Decoded and trimmed string
    Text(String),
    /// Byte values formatted as `[a, b, c]`
    ByteList(String),
    /// Uppercase hex digits, two per byte
    Hex(String),
}

impl fmt::Display for DecodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Long(v) => write!(f, "{}", v),
            Self::UnsignedInt(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::Byte(v) => write!(f, "{}", v),
            Self::Boolean(v) => write!(f, "{}", v),
            Self::Text(s) | Self::ByteList(s) | Self::Hex(s) => f.write_str(s),
        }
    }
}

/// An operation together with its raw text arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeRequest {
    /// Operation to run
    pub operation: Operation,
    /// Positional arguments, unparsed
    pub args: Vec<String>,
}

impl DecodeRequest {
    /// Creates a new request
    pub fn new<I, S>(operation: Operation, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            operation,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Evaluates the request against a buffer
    pub fn evaluate(&self, buffer: &ByteBuffer) -> Result<DecodeValue> {
        decode(buffer, self.operation, &self.args)
    }
}

/// Runs one catalogue operation against `buffer`
pub fn decode<S: AsRef<str>>(
    buffer: &ByteBuffer,
    operation: Operation,
    args: &[S],
) -> Result<DecodeValue> {
    use Endianness::{Big, Little};

    let args = Args::new(operation, args)?;
    let offset = args.integer(0)?;
    trace!("{} at offset {}", operation, offset);

    let value = match operation {
        Operation::ReadInt => DecodeValue::Int(buffer.read_i32(offset, Little)?),
        Operation::ReadIntBE => DecodeValue::Int(buffer.read_i32(offset, Big)?),
        Operation::ReadLong => DecodeValue::Long(buffer.read_i64(offset, Little)?),
        Operation::ReadLongBE => DecodeValue::Long(buffer.read_i64(offset, Big)?),
        Operation::ReadShort => DecodeValue::Short(buffer.read_i16(offset, Little)?),
        Operation::ReadFloat => DecodeValue::Float(buffer.read_f32(offset, Little)?),
        Operation::ReadFloatBE => DecodeValue::Float(buffer.read_f32(offset, Big)?),
        Operation::ReadDouble => DecodeValue::Double(buffer.read_f64(offset, Little)?),
        Operation::ReadUnsignedInt => {
            DecodeValue::UnsignedInt(buffer.read_u32_widened(offset, Little)?)
        }
        Operation::ReadByte => DecodeValue::Byte(buffer.read_u8(offset)?),
        Operation::ReadBoolean => DecodeValue::Boolean(buffer.read_bool(offset)?),
        Operation::ReadBit => DecodeValue::Boolean(buffer.read_bit(offset, args.integer(1)?)?),
        Operation::ReadString => {
            let length = args.integer(1)?;
            let encoding = TextEncoding::for_label(args.text(2).unwrap_or(DEFAULT_ENCODING))?;
            let raw = buffer.read_range(offset, length)?;
            let text = encoding.decode(raw).ok_or(Error::Decode {
                encoding: encoding.name(),
                offset,
                length,
            })?;
            DecodeValue::Text(trim_padding(&text).to_string())
        }
        Operation::ReadBytes => {
            let raw = buffer.read_range(offset, args.integer(1)?)?;
            let items: Vec<String> = raw.iter().map(u8::to_string).collect();
            DecodeValue::ByteList(format!("[{}]", items.join(", ")))
        }
        Operation::ReadHex => {
            let raw = buffer.read_range(offset, args.integer(1)?)?;
            DecodeValue::Hex(hex::encode_upper(raw))
        }
    };

    Ok(value)
}
