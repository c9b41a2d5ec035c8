//! Fragment Decoder
//!
//! Parses a snippet cut out of a document into a generic [`Element`] tree,
//! then optionally into a typed value through [`FromElement`].
//!
//! The snippet is wrapped in a synthetic root that replays the namespace
//! declarations of the real root, so prefixes and the default namespace
//! resolve exactly as they would in place.

use std::cell::Cell;

use log::trace;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use super::element::Element;
use super::namespace::NamespaceContext;
use super::schema;
use crate::core::scanner::{local_name, Scanner};
use crate::error::{QcmlError, Result};

/// Conversion from a decoded element into a typed value
pub trait FromElement: Sized {
    fn from_element(element: &Element) -> Result<Self>;
}

impl FromElement for Element {
    fn from_element(element: &Element) -> Result<Self> {
        Ok(element.clone())
    }
}

/// Decoding state for one document handle
///
/// Holds the root namespace context and whether schema validation is on.
/// Not shared between threads; each handle owns one.
#[derive(Debug)]
pub struct DecodeContext {
    namespaces: NamespaceContext,
    validate: Cell<bool>,
}

impl DecodeContext {
    /// Create a context with validation enabled
    pub fn new(namespaces: NamespaceContext) -> Self {
        Self {
            namespaces,
            validate: Cell::new(true),
        }
    }

    /// The namespace context replayed around fragments
    pub fn namespaces(&self) -> &NamespaceContext {
        &self.namespaces
    }

    /// Whether schema validation currently runs
    pub fn validation_enabled(&self) -> bool {
        self.validate.get()
    }

    /// Turn validation on or off
    pub fn set_validation(&self, enabled: bool) {
        self.validate.set(enabled);
    }

    /// Turn validation off until the returned guard is dropped
    pub fn suspend_validation(&self) -> ValidationSuspended<'_> {
        ValidationSuspended {
            flag: &self.validate,
            previous: self.validate.replace(false),
        }
    }

    /// Decode a fragment into a generic element
    pub fn decode_generic(&self, text: &str) -> Result<Element> {
        let _suspended = self.suspend_validation();
        self.decode_fragment(text)
    }

    /// Decode a fragment, checking it against the schema if validation is on
    pub fn decode_validated(&self, text: &str) -> Result<Element> {
        self.decode_fragment(text)
    }

    /// Decode a fragment into a typed value
    pub fn decode_as<T: FromElement>(&self, text: &str) -> Result<T> {
        let element = self.decode_generic(text)?;
        T::from_element(&element)
    }

    /// Decode a complete document, validating it if validation is enabled
    pub fn decode_document(&self, text: &str) -> Result<Element> {
        let tag = first_tag_name(text);
        trace!("Decoding document <{}> ({} bytes)", tag, text.len());
        let root = parse_tree(text).map_err(|message| QcmlError::decode(&tag, message))?;
        check_namespace(&root, root.namespace.as_deref())?;
        if self.validation_enabled() {
            schema::validate(&root)?;
        }
        Ok(root)
    }

    fn decode_fragment(&self, text: &str) -> Result<Element> {
        let tag = first_tag_name(text);
        trace!("Decoding fragment <{}> ({} bytes)", tag, text.len());

        let wrapped = self.namespaces.wrap(text);
        let mut root = parse_tree(&wrapped).map_err(|message| QcmlError::decode(&tag, message))?;
        if root.children.len() != 1 {
            return Err(QcmlError::decode(
                &tag,
                format!("expected one element, found {}", root.children.len()),
            ));
        }
        if !root.text.is_empty() {
            return Err(QcmlError::decode(&tag, "text outside the element"));
        }
        let element = root.children.remove(0);
        check_namespace(&element, self.namespaces.default_namespace())?;

        if self.validation_enabled() {
            schema::validate(&element)?;
        }
        Ok(element)
    }
}

impl Default for DecodeContext {
    fn default() -> Self {
        Self::new(NamespaceContext::default())
    }
}

/// Guard restoring the previous validation setting on drop
#[must_use = "validation is restored as soon as the guard is dropped"]
pub struct ValidationSuspended<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl Drop for ValidationSuspended<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

/// Local name of the first element in a snippet, for error messages
fn first_tag_name(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut scanner = Scanner::new(bytes);
    while let Some(lt) = scanner.find_tag_start() {
        if let Some(name) = scanner.name_at(lt + 1) {
            return String::from_utf8_lossy(local_name(name)).into_owned();
        }
        scanner.set_position(lt + 1);
    }
    String::from("?")
}

/// Require every element to be in `expected` (when one is given)
fn check_namespace(root: &Element, expected: Option<&str>) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };
    root.walk(&mut |el| match el.namespace.as_deref() {
        Some(ns) if ns == expected => Ok(()),
        other => Err(QcmlError::decode(
            &el.name,
            format!(
                "element is in namespace {:?}, expected \"{}\"",
                other.unwrap_or(""),
                expected
            ),
        )),
    })
}

/// Parse markup into an element tree
fn parse_tree(text: &str) -> std::result::Result<Element, String> {
    let mut reader = NsReader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = match reader.read_resolved_event() {
            Ok(event) => event,
            Err(e) => return Err(format!("at byte {}: {}", reader.error_position(), e)),
        };
        match event {
            (ns, Event::Start(start)) => stack.push(open_element(ns, &start)?),
            (ns, Event::Empty(start)) => {
                let element = open_element(ns, &start)?;
                attach(&mut stack, &mut root, element)?;
            }
            (_, Event::End(_)) => {
                let element = stack.pop().ok_or("unexpected end tag")?;
                attach(&mut stack, &mut root, element)?;
            }
            (_, Event::Text(text)) => {
                let text = text.unescape().map_err(|e| e.to_string())?;
                push_text(&mut stack, &text);
            }
            (_, Event::CData(data)) => {
                let data = data.into_inner();
                push_text(&mut stack, &String::from_utf8_lossy(&data));
            }
            (_, Event::Eof) => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("<{}> is not closed", open.name));
    }
    root.ok_or_else(|| String::from("no element found"))
}

fn open_element(ns: ResolveResult<'_>, start: &BytesStart<'_>) -> std::result::Result<Element, String> {
    let namespace = match ns {
        ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8_lossy(uri).into_owned()),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(prefix) => {
            return Err(format!(
                "unbound namespace prefix '{}'",
                String::from_utf8_lossy(&prefix)
            ));
        }
    };

    let mut element = Element::new(String::from_utf8_lossy(start.local_name().as_ref()));
    element.namespace = namespace;
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let name = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
        element.attributes.push((name, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> std::result::Result<(), String> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(String::from("more than one root element")),
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) {
    if let Some(top) = stack.last_mut() {
        top.text.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> DecodeContext {
        DecodeContext::new(NamespaceContext::new(
            "qcML",
            vec![(None, "urn:qcml".to_string())],
        ))
    }

    #[test]
    fn test_decode_fragment_in_root_namespace() {
        let ctx = context();
        let el = ctx
            .decode_generic("<cv ID=\"cv_0\" fullName=\"A &amp; B\"/>")
            .unwrap();
        assert_eq!(el.name, "cv");
        assert_eq!(el.namespace.as_deref(), Some("urn:qcml"));
        assert_eq!(el.attr("fullName"), Some("A & B"));
    }

    #[test]
    fn test_decode_nested_text() {
        let ctx = context();
        let el = ctx
            .decode_generic("<attachment ID=\"a\"><binary> AAEC </binary></attachment>")
            .unwrap();
        assert_eq!(el.child("binary").map(|b| b.text.as_str()), Some("AAEC"));
    }

    #[test]
    fn test_malformed_fragment_names_tag() {
        let ctx = context();
        let err = ctx
            .decode_generic("<runQuality ID=\"r\"><qualityParameter></runQuality>")
            .unwrap_err();
        match err {
            QcmlError::Decode { tag, .. } => assert_eq!(tag, "runQuality"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unbound_prefix_fails() {
        let err = context().decode_generic("<x:cv ID=\"a\"/>").unwrap_err();
        assert!(matches!(err, QcmlError::Decode { .. }));
    }

    #[test]
    fn test_foreign_namespace_fails() {
        let err = context()
            .decode_generic("<cv xmlns=\"urn:other\" ID=\"a\"/>")
            .unwrap_err();
        assert!(matches!(err, QcmlError::Decode { ref tag, .. } if tag == "cv"));
    }

    #[test]
    fn test_two_elements_rejected() {
        assert!(context().decode_generic("<cv ID=\"a\"/><cv ID=\"b\"/>").is_err());
    }

    #[test]
    fn test_fragment_skips_validation_and_restores() {
        let ctx = context();
        // cv without fullName/uri would fail the schema
        assert!(ctx.decode_generic("<cv ID=\"a\"/>").is_ok());
        assert!(ctx.validation_enabled());
    }

    #[test]
    fn test_validated_fragment() {
        let ctx = context();
        assert!(matches!(
            ctx.decode_validated("<cv ID=\"a\"/>"),
            Err(QcmlError::Schema { .. })
        ));
        ctx.set_validation(false);
        assert!(ctx.decode_validated("<cv ID=\"a\"/>").is_ok());
    }

    #[test]
    fn test_validation_restored_after_failure() {
        let ctx = context();
        assert!(ctx.decode_generic("<cv").is_err());
        assert!(ctx.validation_enabled());
    }

    #[test]
    fn test_guard_restores_previous_setting() {
        let ctx = context();
        ctx.set_validation(false);
        {
            let _guard = ctx.suspend_validation();
            assert!(!ctx.validation_enabled());
        }
        assert!(!ctx.validation_enabled());
    }

    #[test]
    fn test_document_decode_validates() {
        let ctx = DecodeContext::default();
        let err = ctx
            .decode_document("<qcML xmlns=\"urn:qcml\"><cvList/></qcML>")
            .unwrap_err();
        assert!(matches!(err, QcmlError::Schema { ref tag, .. } if tag == "qcML"));

        let ok = ctx
            .decode_document("<?xml version=\"1.0\"?><qcML xmlns=\"urn:qcml\" version=\"1\"><cvList/></qcML>")
            .unwrap();
        assert_eq!(ok.children.len(), 1);
    }

    #[test]
    fn test_decode_as_element() {
        let el: Element = context().decode_as("<cvList/>").unwrap();
        assert_eq!(el.name, "cvList");
    }

    #[test]
    fn test_first_tag_name() {
        assert_eq!(first_tag_name("<?xml version=\"1.0\"?><q:qcML/>"), "qcML");
        assert_eq!(first_tag_name("  <runQuality ID=\"r\">"), "runQuality");
        assert_eq!(first_tag_name("no markup"), "?");
    }
}
