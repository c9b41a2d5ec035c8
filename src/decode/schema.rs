//! Structural Schema
//!
//! A small table of required attributes and permitted children per element.
//! Elements without a rule are accepted as they are.

use super::element::Element;
use crate::error::{QcmlError, Result};

/// Constraints on one element
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub element: &'static str,
    pub required: &'static [&'static str],
    pub children: &'static [&'static str],
}

const PARAMETER_ATTRS: &[&str] = &["ID", "name", "accession", "cvRef"];
const RECORD_CHILDREN: &[&str] = &["metaDataParameter", "qualityParameter", "attachment"];

/// Rules for the qcML vocabulary
pub const RULES: &[Rule] = &[
    Rule {
        element: "qcML",
        required: &["version"],
        children: &["runQuality", "setQuality", "cvList"],
    },
    Rule {
        element: "runQuality",
        required: &["ID"],
        children: RECORD_CHILDREN,
    },
    Rule {
        element: "setQuality",
        required: &["ID"],
        children: RECORD_CHILDREN,
    },
    Rule {
        element: "cvList",
        required: &[],
        children: &["cv"],
    },
    Rule {
        element: "cv",
        required: &["ID", "fullName", "uri"],
        children: &[],
    },
    Rule {
        element: "metaDataParameter",
        required: PARAMETER_ATTRS,
        children: &[],
    },
    Rule {
        element: "qualityParameter",
        required: PARAMETER_ATTRS,
        children: &["threshold"],
    },
    Rule {
        element: "threshold",
        required: &["name", "accession", "cvRef"],
        children: &[],
    },
    Rule {
        element: "attachment",
        required: PARAMETER_ATTRS,
        children: &["binary", "table"],
    },
    Rule {
        element: "table",
        required: &[],
        children: &["tableColumnTypes", "tableRowValues"],
    },
];

/// Find the rule for an element name
pub fn rule_for(name: &str) -> Option<&'static Rule> {
    RULES.iter().find(|r| r.element == name)
}

/// Check an element and all its descendants against [`RULES`]
pub fn validate(root: &Element) -> Result<()> {
    root.walk(&mut |el| {
        let Some(rule) = rule_for(&el.name) else {
            return Ok(());
        };
        if let Some(missing) = rule.required.iter().find(|a| !has_attribute(el, a)) {
            return Err(QcmlError::Schema {
                tag: el.name.clone(),
                message: format!("required attribute '{}' is missing", missing),
            });
        }
        if let Some(child) = el.children.iter().find(|c| !rule.children.contains(&c.name.as_str())) {
            return Err(QcmlError::Schema {
                tag: el.name.clone(),
                message: format!("<{}> is not permitted here", child.name),
            });
        }
        Ok(())
    })
}

/// `ID` is matched case-insensitively, as the offset index matches it
fn has_attribute(el: &Element, name: &str) -> bool {
    if name == "ID" {
        el.identifier().is_some()
    } else {
        el.attr(name).is_some()
    }
}
