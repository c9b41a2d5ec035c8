//! Conversions from decoded elements to wire values
//!
//! Each conversion names the attributes and children it reads; anything
//! else on the element is ignored.

use super::wire::{
    WireAttachment, WireEntry, WireParameter, WireQuality, WireRecord, WireTable, WireThreshold,
};
use crate::decode::{Element, FromElement};
use crate::error::{QcmlError, Result};
use crate::index::ElementKind;
use crate::model::{RecordKind, Term};

impl FromElement for Term {
    fn from_element(el: &Element) -> Result<Self> {
        expect_name(el, "cv")?;
        Ok(Term::new(
            el.required_identifier()?,
            el.attr("fullName").unwrap_or_default(),
            el.attr("uri").unwrap_or_default(),
            el.attr_owned("version"),
        ))
    }
}

impl FromElement for WireParameter {
    fn from_element(el: &Element) -> Result<Self> {
        Ok(WireParameter {
            id: el.identifier().map(str::to_owned),
            name: el.attr("name").unwrap_or_default().to_string(),
            accession: el.required_attr("accession")?.to_string(),
            cv_ref: el.required_attr("cvRef")?.to_string(),
            value: el.attr_owned("value"),
            unit_accession: el.attr_owned("unitAccession"),
            unit_name: el.attr_owned("unitName"),
            unit_cv_ref: el.attr_owned("unitCvRef"),
        })
    }
}

impl FromElement for WireThreshold {
    fn from_element(el: &Element) -> Result<Self> {
        expect_name(el, "threshold")?;
        Ok(WireThreshold {
            param: WireParameter::from_element(el)?,
            file_name: el.attr_owned("fileName"),
        })
    }
}

impl FromElement for WireQuality {
    fn from_element(el: &Element) -> Result<Self> {
        expect_name(el, "qualityParameter")?;
        Ok(WireQuality {
            param: WireParameter::from_element(el)?,
            flag: el.attr("flag").is_some_and(parse_flag),
            thresholds: el
                .children_named("threshold")
                .map(WireThreshold::from_element)
                .collect::<Result<_>>()?,
        })
    }
}

impl FromElement for WireTable {
    fn from_element(el: &Element) -> Result<Self> {
        expect_name(el, "table")?;
        Ok(WireTable {
            column_types: el
                .child("tableColumnTypes")
                .map(|c| c.text.clone())
                .unwrap_or_default(),
            rows: el
                .children_named("tableRowValues")
                .map(|r| r.text.clone())
                .collect(),
        })
    }
}

impl FromElement for WireAttachment {
    fn from_element(el: &Element) -> Result<Self> {
        expect_name(el, "attachment")?;
        Ok(WireAttachment {
            param: WireParameter::from_element(el)?,
            quality_parameter_ref: el.attr_owned("qualityParameterRef"),
            binary: el.child("binary").map(|b| b.text.clone()),
            table: el.child("table").map(WireTable::from_element).transpose()?,
        })
    }
}

impl FromElement for WireRecord {
    /// The record kind comes from the element name
    fn from_element(el: &Element) -> Result<Self> {
        let kind = ElementKind::from_tag_name(&el.name)
            .and_then(RecordKind::from_element_kind)
            .ok_or_else(|| {
                QcmlError::decode(&el.name, "expected <runQuality> or <setQuality>")
            })?;

        let mut entries = Vec::with_capacity(el.children.len());
        for child in &el.children {
            let entry = match child.name.as_str() {
                "metaDataParameter" => WireEntry::MetaData(WireParameter::from_element(child)?),
                "qualityParameter" => WireEntry::Quality(WireQuality::from_element(child)?),
                "attachment" => WireEntry::Attachment(WireAttachment::from_element(child)?),
                _ => continue,
            };
            entries.push(entry);
        }

        Ok(WireRecord {
            id: el.required_identifier()?.to_string(),
            kind,
            entries,
        })
    }
}

fn expect_name(el: &Element, name: &str) -> Result<()> {
    if el.name == name {
        Ok(())
    } else {
        Err(QcmlError::decode(&el.name, format!("expected <{}>", name)))
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "true" | "1")
}
