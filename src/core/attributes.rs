//! Opening-tag Attribute Scanning
//!
//! A lightweight textual scan over the bytes of an opening tag. Used by the
//! offset index to pull identifiers and root namespace declarations out of
//! tags without building any tree.

use super::entities::decode_text;
use super::scanner::{is_name_char, is_name_start_char, is_whitespace};
use std::borrow::Cow;

/// A raw attribute found in an opening tag
#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    /// Qualified attribute name
    pub name: &'a [u8],
    /// Attribute value (entities decoded)
    pub value: Cow<'a, [u8]>,
}

impl<'a> Attribute<'a> {
    /// Get the name as a string
    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(self.name).ok()
    }

    /// Get the value as a string
    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(self.value.as_ref()).ok()
    }
}

/// Parse the attributes of a complete opening tag (`<name ...>` or `<name .../>`)
///
/// Unquoted or valueless attributes are skipped; the scan never fails.
pub fn parse_tag_attributes(tag: &[u8]) -> Vec<Attribute<'_>> {
    let mut attrs = Vec::new();
    let end = tag.len();

    // Skip '<' and the element name
    let mut pos = 1;
    while pos < end && is_name_char(tag[pos]) {
        pos += 1;
    }

    while pos < end {
        while pos < end && is_whitespace(tag[pos]) {
            pos += 1;
        }
        if pos >= end || tag[pos] == b'/' || tag[pos] == b'>' {
            break;
        }
        if !is_name_start_char(tag[pos]) {
            pos += 1;
            continue;
        }

        let name_start = pos;
        while pos < end && is_name_char(tag[pos]) {
            pos += 1;
        }
        let name = &tag[name_start..pos];

        while pos < end && is_whitespace(tag[pos]) {
            pos += 1;
        }
        if pos >= end || tag[pos] != b'=' {
            continue;
        }
        pos += 1;
        while pos < end && is_whitespace(tag[pos]) {
            pos += 1;
        }

        let quote = match tag.get(pos) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => continue,
        };
        pos += 1;
        let value_start = pos;
        while pos < end && tag[pos] != quote {
            pos += 1;
        }
        attrs.push(Attribute {
            name,
            value: decode_text(&tag[value_start..pos]),
        });
        pos += 1;
    }

    attrs
}

/// Find the identifier of an element: the value of its `id` attribute,
/// matched case-insensitively (`id`, `ID`, `Id` ...)
pub fn find_identifier(tag: &[u8]) -> Option<String> {
    parse_tag_attributes(tag)
        .into_iter()
        .find(|attr| attr.name.eq_ignore_ascii_case(b"id"))
        .and_then(|attr| attr.value_str().map(str::to_owned))
}

/// Collect the namespace declarations (`xmlns` and `xmlns:prefix`) of a tag
///
/// Returns `(prefix, uri)` pairs; the default namespace has no prefix.
pub fn namespace_declarations(tag: &[u8]) -> Vec<(Option<String>, String)> {
    parse_tag_attributes(tag)
        .into_iter()
        .filter_map(|attr| {
            let name = attr.name_str()?;
            let uri = attr.value_str()?.to_owned();
            match name.strip_prefix("xmlns") {
                Some("") => Some((None, uri)),
                Some(rest) => rest.strip_prefix(':').map(|p| (Some(p.to_owned()), uri)),
                None => None,
            }
        })
        .collect()
}
