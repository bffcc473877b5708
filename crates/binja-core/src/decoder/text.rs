//! Text encodings for fixed-length string fields.
//!
//! Encoding names are resolved through the WHATWG label table of
//! `encoding_rs`, with three exceptions. `ASCII`/`US-ASCII` are strict 7-bit
//! and the ISO-8859-1 labels map every byte to the code point of the same
//! value; the WHATWG table folds all of these into windows-1252. Plain
//! `UTF-16` honours a leading byte order mark and otherwise reads big endian.

use crate::error::{Error, Result};
use encoding_rs::{mem, Encoding, REPLACEMENT, UTF_16BE, UTF_16LE, UTF_8};
use std::borrow::Cow;

/// Encoding used when `readString` is called without one
pub const DEFAULT_ENCODING: &str = "UTF-8";

const LATIN1_LABELS: &[&str] = &[
    "iso-8859-1",
    "iso8859-1",
    "iso88591",
    "iso_8859-1",
    "iso_8859-1:1987",
    "iso-ir-100",
    "latin1",
    "l1",
    "cp819",
    "ibm819",
    "csisolatin1",
];

/// A resolved text encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Strict 7-bit ASCII
    Ascii,
    /// UTF-16 with optional byte order mark, big endian without one
    Utf16,
    /// ISO-8859-1, one byte per code point U+0000..=U+00FF
    Latin1,
    /// Any other encoding known to `encoding_rs`
    Standard(&'static Encoding),
}

impl TextEncoding {
    /// UTF-8
    pub const UTF8: Self = Self::Standard(UTF_8);

    /// Resolves an encoding label, ignoring case and surrounding whitespace
    pub fn for_label(label: &str) -> Result<Self> {
        let name = label.trim();
        if name.eq_ignore_ascii_case("ascii") || name.eq_ignore_ascii_case("us-ascii") {
            return Ok(Self::Ascii);
        }
        if name.eq_ignore_ascii_case("utf-16") || name.eq_ignore_ascii_case("utf16") {
            return Ok(Self::Utf16);
        }
        if LATIN1_LABELS.iter().any(|l| name.eq_ignore_ascii_case(l)) {
            return Ok(Self::Latin1);
        }

        match Encoding::for_label(name.as_bytes()) {
            // The replacement encoding decodes everything to U+FFFD
            Some(encoding) if encoding != REPLACEMENT => Ok(Self::Standard(encoding)),
            _ => Err(Error::unsupported_encoding(label)),
        }
    }

    /// Canonical name of the encoding
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ascii => "US-ASCII",
            Self::Utf16 => "UTF-16",
            Self::Latin1 => "ISO-8859-1",
            Self::Standard(encoding) => encoding.name(),
        }
    }

    /// Decodes `bytes`, returning `None` on any malformed sequence
    pub fn decode<'b>(&self, bytes: &'b [u8]) -> Option<Cow<'b, str>> {
        match self {
            Self::Ascii if bytes.is_ascii() => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
            Self::Ascii => None,
            Self::Latin1 => Some(mem::decode_latin1(bytes)),
            Self::Utf16 => match bytes {
                [0xFE, 0xFF, rest @ ..] => UTF_16BE.decode_without_bom_handling_and_without_replacement(rest),
                [0xFF, 0xFE, rest @ ..] => UTF_16LE.decode_without_bom_handling_and_without_replacement(rest),
                _ => UTF_16BE.decode_without_bom_handling_and_without_replacement(bytes),
            },
            Self::Standard(encoding) => {
                encoding.decode_without_bom_handling_and_without_replacement(bytes)
            }
        }
    }
}

/// Strips leading and trailing whitespace and C0 control padding such as NUL
pub fn trim_padding(text: &str) -> &str {
    text.trim_matches(|c: char| c <= ' ' || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_for_label() {
        assert_eq!(TextEncoding::for_label("UTF-8").unwrap(), TextEncoding::UTF8);
        assert_eq!(TextEncoding::for_label(" utf8 ").unwrap(), TextEncoding::UTF8);
        assert_eq!(TextEncoding::for_label("ASCII").unwrap(), TextEncoding::Ascii);
        assert_eq!(TextEncoding::for_label("UTF-16").unwrap(), TextEncoding::Utf16);
        assert_eq!(TextEncoding::for_label("ISO-8859-1").unwrap(), TextEncoding::Latin1);
        assert_eq!(TextEncoding::for_label("latin1").unwrap().name(), "ISO-8859-1");
        assert_eq!(
            TextEncoding::for_label("windows-1252").unwrap().name(),
            "windows-1252"
        );
        assert_eq!(TextEncoding::for_label("UTF-16LE").unwrap().name(), "UTF-16LE");
    }

    #[test]
    fn test_unknown_label() {
        assert!(matches!(
            TextEncoding::for_label("klingon"),
            Err(Error::UnsupportedEncoding { ref name }) if name == "klingon"
        ));
        assert!(TextEncoding::for_label("iso-2022-kr").is_err());
    }

    #[test]
    fn test_ascii_is_strict() {
        assert_eq!(TextEncoding::Ascii.decode(b"AB").as_deref(), Some("AB"));
        assert_eq!(TextEncoding::Ascii.decode(&[0x41, 0xC3]), None);
    }

    #[test]
    fn test_latin1_keeps_c1_controls() {
        let text = TextEncoding::Latin1.decode(&[0x41, 0x80, 0x9F, 0xFF]).unwrap();
        let points: Vec<u32> = text.chars().map(u32::from).collect();
        assert_eq!(points, vec![0x41, 0x80, 0x9F, 0xFF]);
        assert!(matches!(TextEncoding::Latin1.decode(b"AB"), Some(Cow::Borrowed("AB"))));
    }

    #[test]
    fn test_utf8_is_strict() {
        assert_eq!(TextEncoding::UTF8.decode("héllo".as_bytes()).as_deref(), Some("héllo"));
        assert_eq!(TextEncoding::UTF8.decode(&[0x68, 0xC3]), None);
    }

    #[test]
    fn test_utf16_byte_order_mark() {
        let utf16 = TextEncoding::Utf16;
        assert_eq!(utf16.decode(&[0x00, 0x41]).as_deref(), Some("A"));
        assert_eq!(utf16.decode(&[0xFE, 0xFF, 0x00, 0x41]).as_deref(), Some("A"));
        assert_eq!(utf16.decode(&[0xFF, 0xFE, 0x41, 0x00]).as_deref(), Some("A"));
        assert_eq!(utf16.decode(&[0x00]), None);
    }

    #[test]
    fn test_trim_padding() {
        assert_eq!(trim_padding("AB \0\0"), "AB");
        assert_eq!(trim_padding("\t a  b \n"), "a  b");
        assert_eq!(trim_padding("\u{3000}x\u{3000}"), "x");
        assert_eq!(trim_padding("\0\0"), "");
    }
}
