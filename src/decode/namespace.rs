//! Root Namespace Context
//!
//! Fragments cut out of a document lose the namespace declarations made on
//! its root element. The context captured at index time is replayed around
//! every fragment before it is parsed.

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

/// Namespace declarations of a document's root element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceContext {
    /// Qualified name of the root element
    root: String,
    /// `(prefix, uri)` pairs; the default namespace has no prefix
    declarations: Vec<(Option<String>, String)>,
}

impl NamespaceContext {
    /// Create a context from a root name and its declarations
    pub fn new(root: impl Into<String>, declarations: Vec<(Option<String>, String)>) -> Self {
        Self {
            root: root.into(),
            declarations,
        }
    }

    /// Qualified name of the root element
    pub fn root_name(&self) -> &str {
        &self.root
    }

    /// All captured declarations in source order
    pub fn declarations(&self) -> &[(Option<String>, String)] {
        &self.declarations
    }

    /// The default namespace, if the root declares one
    pub fn default_namespace(&self) -> Option<&str> {
        self.resolve_prefix(None)
    }

    /// Look up the URI bound to `prefix` (`None` for the default namespace)
    ///
    /// The last declaration of a prefix wins, matching attribute order.
    pub fn resolve_prefix(&self, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(ns::XML);
        }
        self.declarations
            .iter()
            .rev()
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// Surround a fragment with a synthetic root carrying the declarations
    pub fn wrap(&self, fragment: &str) -> String {
        let mut out = String::with_capacity(fragment.len() + 2 * self.root.len() + 64);
        out.push('<');
        out.push_str(&self.root);
        for (prefix, uri) in &self.declarations {
            out.push_str(" xmlns");
            if let Some(prefix) = prefix {
                out.push(':');
                out.push_str(prefix);
            }
            out.push_str("=\"");
            escape_attribute(uri, &mut out);
            out.push('"');
        }
        out.push('>');
        out.push_str(fragment);
        out.push_str("</");
        out.push_str(&self.root);
        out.push('>');
        out
    }
}

impl Default for NamespaceContext {
    fn default() -> Self {
        Self::new("qcML", Vec::new())
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
