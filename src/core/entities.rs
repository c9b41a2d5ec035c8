//! XML Entity Decoding
//!
//! Decodes the built-in entities (`&lt;` `&gt;` `&amp;` `&quot;` `&apos;`)
//! and numeric character references in attribute values pulled out of
//! opening tags. Uses Cow for zero-copy when no entities are present.

use memchr::memchr;
use std::borrow::Cow;

/// Decode text content, handling entity references
///
/// Returns Borrowed if no entities present (zero-copy),
/// returns Owned if entities were decoded.
#[inline]
pub fn decode_text(input: &[u8]) -> Cow<'_, [u8]> {
    if memchr(b'&', input).is_none() {
        return Cow::Borrowed(input);
    }
    Cow::Owned(decode_entities(input))
}

/// Decode all entity references in the input
///
/// Unknown or unterminated references are copied through untouched.
pub fn decode_entities(input: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = memchr(b'&', rest) {
        result.extend_from_slice(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = memchr(b';', rest).and_then(|semi| {
            decode_entity(&rest[1..semi]).map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, consumed)) => {
                let mut buf = [0u8; 4];
                result.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                rest = &rest[consumed..];
            }
            None => {
                result.push(b'&');
                rest = &rest[1..];
            }
        }
    }
    result.extend_from_slice(rest);
    result
}

/// Decode a single entity (without & and ;)
fn decode_entity(entity: &[u8]) -> Option<char> {
    match entity {
        b"lt" => Some('<'),
        b"gt" => Some('>'),
        b"amp" => Some('&'),
        b"quot" => Some('"'),
        b"apos" => Some('\''),
        [b'#', b'x' | b'X', hex @ ..] => {
            let hex = std::str::from_utf8(hex).ok()?;
            char::from_u32(u32::from_str_radix(hex, 16).ok()?)
        }
        [b'#', dec @ ..] => {
            let dec = std::str::from_utf8(dec).ok()?;
            char::from_u32(dec.parse().ok()?)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities() {
        let input = b"run_0";
        assert!(matches!(decode_text(input), Cow::Borrowed(_)));
    }

    #[test]
    fn test_basic_entities() {
        assert_eq!(decode_text(b"a&amp;b&lt;c&gt;").as_ref(), b"a&b<c>");
    }

    #[test]
    fn test_numeric_references() {
        assert_eq!(decode_text(b"&#65;&#x42;").as_ref(), b"AB");
    }

    #[test]
    fn test_unicode_reference() {
        assert_eq!(decode_text(b"&#x20AC;").as_ref(), "\u{20AC}".as_bytes());
    }

    #[test]
    fn test_unknown_entity_kept() {
        assert_eq!(decode_text(b"&nbsp;x").as_ref(), b"&nbsp;x");
        assert_eq!(decode_text(b"a & b").as_ref(), b"a & b");
    }
}
