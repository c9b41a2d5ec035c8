//! Source Encoding Detection
//!
//! Determines the text encoding of a source from its byte order mark or the
//! `encoding` label of its XML declaration. The offset index scans raw bytes
//! for ASCII delimiters, so only ASCII-compatible encodings are accepted.

use encoding_rs::Encoding;
use log::debug;

use super::attributes::parse_tag_attributes;
use crate::error::{QcmlError, Result};

/// Encoding family announced by the first bytes of the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrderMark {
    None,
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl ByteOrderMark {
    /// Detect from byte order mark or initial byte pattern
    pub fn detect(input: &[u8]) -> Self {
        match input {
            [0xEF, 0xBB, 0xBF, ..] => ByteOrderMark::Utf8,
            // UTF-16 with BOM, or BOM-less with '<' next to a null byte
            [0xFF, 0xFE, ..] | [b'<', 0x00, ..] => ByteOrderMark::Utf16Le,
            [0xFE, 0xFF, ..] | [0x00, b'<', ..] => ByteOrderMark::Utf16Be,
            _ => ByteOrderMark::None,
        }
    }
}

/// Detect the encoding of a source from its first bytes
///
/// `head` should hold at least the XML declaration if one is present; a few
/// hundred bytes is plenty. Defaults to UTF-8.
pub fn detect_encoding(head: &[u8]) -> Result<&'static Encoding> {
    let bom = ByteOrderMark::detect(head);
    match bom {
        ByteOrderMark::Utf16Le | ByteOrderMark::Utf16Be => {
            return Err(QcmlError::UnsupportedEncoding(format!("{:?}", bom)));
        }
        ByteOrderMark::Utf8 => {
            debug!("UTF-8 byte order mark found");
            return Ok(encoding_rs::UTF_8);
        }
        ByteOrderMark::None => {}
    }

    let Some(label) = declared_label(head) else {
        return Ok(encoding_rs::UTF_8);
    };
    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| QcmlError::UnsupportedEncoding(label.clone()))?;
    if !encoding.is_ascii_compatible() {
        return Err(QcmlError::UnsupportedEncoding(label));
    }
    debug!("Declared source encoding: {} ({})", label, encoding.name());
    Ok(encoding)
}

/// Extract the `encoding` pseudo-attribute of an XML declaration
fn declared_label(head: &[u8]) -> Option<String> {
    if !head.starts_with(b"<?xml") {
        return None;
    }
    let end = memchr::memmem::find(head, b"?>")?;
    // Reuse the tag attribute scan; "<?xml" parses like an element name
    // once the '?' is dropped.
    let mut decl = Vec::with_capacity(end + 1);
    decl.push(b'<');
    decl.extend_from_slice(&head[2..end]);
    decl.push(b'>');
    parse_tag_attributes(&decl)
        .into_iter()
        .find(|attr| attr.name == b"encoding")
        .and_then(|attr| attr.value_str().map(|v| v.trim().to_owned()))
}
