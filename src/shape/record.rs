//! Record reshaping between the wire and domain forms
//!
//! `from_wire` partitions the flat entry list into the three maps of a
//! [`Record`]; `to_wire` flattens them again. Entries are written metadata
//! first, then quality parameters, then attachments, each group sorted by
//! accession so output is stable.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::trace;

use super::table::{table_from_wire, table_to_wire};
use super::wire::{
    WireAttachment, WireEntry, WireParameter, WireQuality, WireRecord, WireThreshold,
};
use crate::error::{QcmlError, Result};
use crate::model::{
    Attachment, AttachmentContent, CvParameter, Entry, MetaDataParameter, QualityParameter, Record,
    Threshold,
};

/// Build a record from its wire form; duplicate accessions keep the last entry
pub fn from_wire(wire: WireRecord) -> Result<Record> {
    let mut record = Record::new(wire.id, wire.kind);
    for entry in wire.entries {
        let replaced = match entry {
            WireEntry::MetaData(param) => record
                .add_metadata(MetaDataParameter::new(param_from_wire(param)))
                .map(|old| old.param.accession),
            WireEntry::Quality(quality) => record
                .add_quality(quality_from_wire(quality))
                .map(|old| old.param.accession),
            WireEntry::Attachment(attachment) => record
                .add_attachment(attachment_from_wire(attachment)?)
                .map(|old| old.param.accession),
        };
        if let Some(accession) = replaced {
            trace!("Record '{}': entry '{}' replaced by a later one", record.id(), accession);
        }
    }
    Ok(record)
}

/// Flatten a record into its wire form
pub fn to_wire(record: &Record) -> WireRecord {
    let mut entries = Vec::with_capacity(record.entry_count());

    let mut metadata: Vec<_> = record.metadata_entries().collect();
    metadata.sort_by(|a, b| a.accession().cmp(b.accession()));
    entries.extend(metadata.into_iter().map(|m| WireEntry::MetaData(param_to_wire(&m.param))));

    let mut quality: Vec<_> = record.quality_entries().collect();
    quality.sort_by(|a, b| a.accession().cmp(b.accession()));
    entries.extend(quality.into_iter().map(|q| WireEntry::Quality(quality_to_wire(q))));

    let mut attachments: Vec<_> = record.attachments().collect();
    attachments.sort_by(|a, b| a.accession().cmp(b.accession()));
    entries.extend(
        attachments
            .into_iter()
            .map(|a| WireEntry::Attachment(attachment_to_wire(a))),
    );

    WireRecord {
        id: record.id().to_string(),
        kind: record.kind(),
        entries,
    }
}

fn param_from_wire(wire: WireParameter) -> CvParameter {
    let mut param = CvParameter::new(wire.accession, wire.name, wire.cv_ref);
    param.id = wire.id;
    param.value = wire.value;
    param.unit_accession = wire.unit_accession;
    param.unit_name = wire.unit_name;
    if let Some(unit) = wire.unit_cv_ref {
        param.set_unit_ref(unit);
    }
    param
}

fn param_to_wire(param: &CvParameter) -> WireParameter {
    WireParameter {
        id: param.id.clone(),
        name: param.name.clone(),
        accession: param.accession.clone(),
        cv_ref: param.term().id().to_string(),
        value: param.value.clone(),
        unit_accession: param.unit_accession.clone(),
        unit_name: param.unit_name.clone(),
        unit_cv_ref: param.unit().map(|u| u.id().to_string()),
    }
}

fn quality_from_wire(wire: WireQuality) -> QualityParameter {
    let mut quality = QualityParameter::new(param_from_wire(wire.param));
    quality.flag = wire.flag;
    for threshold in wire.thresholds {
        let mut t = Threshold::new(param_from_wire(threshold.param));
        t.file_name = threshold.file_name;
        quality.add_threshold(t);
    }
    quality
}

fn quality_to_wire(quality: &QualityParameter) -> WireQuality {
    let mut thresholds: Vec<_> = quality.thresholds().collect();
    thresholds.sort_by(|a, b| a.param.accession.cmp(&b.param.accession));
    WireQuality {
        param: param_to_wire(&quality.param),
        flag: quality.flag,
        thresholds: thresholds
            .into_iter()
            .map(|t| WireThreshold {
                param: param_to_wire(&t.param),
                file_name: t.file_name.clone(),
            })
            .collect(),
    }
}

fn attachment_from_wire(wire: WireAttachment) -> Result<Attachment> {
    let content = match (wire.binary, wire.table) {
        (Some(binary), None) => {
            let data = STANDARD
                .decode(binary.split_whitespace().collect::<String>())
                .map_err(|_| QcmlError::InvalidAttachment {
                    accession: wire.param.accession.clone(),
                    reason: "binary payload is not valid base64",
                })?;
            AttachmentContent::Binary(data)
        }
        (None, Some(table)) => AttachmentContent::Table(table_from_wire(&table)),
        (Some(_), Some(_)) => {
            return Err(QcmlError::InvalidAttachment {
                accession: wire.param.accession,
                reason: "both binary data and a table are present",
            });
        }
        (None, None) => {
            return Err(QcmlError::InvalidAttachment {
                accession: wire.param.accession,
                reason: "neither binary data nor a table is present",
            });
        }
    };

    let mut attachment = Attachment::new(param_from_wire(wire.param), content);
    attachment.set_link(wire.quality_parameter_ref);
    Ok(attachment)
}

fn attachment_to_wire(attachment: &Attachment) -> WireAttachment {
    let (binary, table) = match attachment.content() {
        AttachmentContent::Binary(data) => (Some(STANDARD.encode(data)), None),
        AttachmentContent::Table(table) => (None, Some(table_to_wire(table))),
    };
    WireAttachment {
        param: param_to_wire(&attachment.param),
        quality_parameter_ref: attachment.link().map(|l| l.accession.clone()),
        binary,
        table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordKind;
    use crate::shape::wire::WireTable;

    fn param(accession: &str) -> WireParameter {
        WireParameter {
            id: Some(format!("id_{}", accession)),
            name: "name".to_string(),
            accession: accession.to_string(),
            cv_ref: "cv_0".to_string(),
            ..WireParameter::default()
        }
    }

    fn full_record() -> WireRecord {
        let mut metadata = param("QC:M");
        metadata.value = Some("instrument".to_string());

        let mut measured = param("QC:Q");
        measured.unit_cv_ref = Some("uo".to_string());
        measured.unit_name = Some("second".to_string());

        WireRecord {
            id: "run_0".to_string(),
            kind: RecordKind::Run,
            entries: vec![
                WireEntry::MetaData(metadata),
                WireEntry::Quality(WireQuality {
                    param: measured,
                    flag: true,
                    thresholds: vec![WireThreshold {
                        param: param("QC:T"),
                        file_name: Some("run.raw".to_string()),
                    }],
                }),
                WireEntry::Attachment(WireAttachment {
                    param: param("QC:A"),
                    quality_parameter_ref: Some("QC:Q".to_string()),
                    binary: Some("AAEC".to_string()),
                    table: None,
                }),
                WireEntry::Attachment(WireAttachment {
                    param: param("QC:B"),
                    quality_parameter_ref: None,
                    binary: None,
                    table: Some(WireTable {
                        column_types: "x y".to_string(),
                        rows: vec!["1 2".to_string()],
                    }),
                }),
            ],
        }
    }

    #[test]
    fn test_from_wire_partitions_entries() {
        let record = from_wire(full_record()).unwrap();
        assert_eq!(record.metadata_entries().count(), 1);
        assert_eq!(record.quality_entries().count(), 1);
        assert_eq!(record.attachments().count(), 2);

        let q = record.quality("QC:Q").unwrap();
        assert!(q.flag);
        assert_eq!(q.record(), Some("run_0"));
        assert_eq!(q.param.unit().map(|u| u.id()), Some("uo"));
        assert_eq!(q.threshold("QC:T").unwrap().file_name.as_deref(), Some("run.raw"));

        assert_eq!(record.attachment("QC:A").unwrap().binary(), Some(&[0u8, 1, 2][..]));
        let table = record.attachment("QC:B").unwrap().table().unwrap();
        assert_eq!(table.attachment(), Some("QC:B"));
    }

    #[test]
    fn test_round_trip() {
        let record = from_wire(full_record()).unwrap();
        let again = from_wire(to_wire(&record)).unwrap();
        assert_eq!(again, record);
    }

    #[test]
    fn test_duplicate_accession_last_wins() {
        let mut first = param("QC:Q");
        first.value = Some("1".to_string());
        let mut second = param("QC:Q");
        second.value = Some("2".to_string());
        let wire = WireRecord {
            id: "r".to_string(),
            kind: RecordKind::Set,
            entries: vec![
                WireEntry::Quality(WireQuality { param: first, ..WireQuality::default() }),
                WireEntry::Quality(WireQuality { param: second, ..WireQuality::default() }),
            ],
        };
        let record = from_wire(wire).unwrap();
        assert_eq!(record.quality_entries().count(), 1);
        assert_eq!(record.quality("QC:Q").unwrap().param.value.as_deref(), Some("2"));
    }

    #[test]
    fn test_attachment_payload_exclusive() {
        let both = WireAttachment {
            param: param("QC:A"),
            binary: Some("AA==".to_string()),
            table: Some(WireTable::default()),
            ..WireAttachment::default()
        };
        let neither = WireAttachment {
            param: param("QC:A"),
            ..WireAttachment::default()
        };
        for attachment in [both, neither] {
            let wire = WireRecord {
                id: "r".to_string(),
                kind: RecordKind::Run,
                entries: vec![WireEntry::Attachment(attachment)],
            };
            assert!(matches!(
                from_wire(wire),
                Err(QcmlError::InvalidAttachment { .. })
            ));
        }
    }

    #[test]
    fn test_invalid_base64() {
        let wire = WireRecord {
            id: "r".to_string(),
            kind: RecordKind::Run,
            entries: vec![WireEntry::Attachment(WireAttachment {
                param: param("QC:A"),
                binary: Some("not base64!".to_string()),
                ..WireAttachment::default()
            })],
        };
        assert!(from_wire(wire).is_err());
    }

    #[test]
    fn test_to_wire_order_is_stable() {
        let record = from_wire(full_record()).unwrap();
        let wire = to_wire(&record);
        let accessions: Vec<_> = wire.entries.iter().map(|e| e.param().accession.as_str()).collect();
        assert_eq!(accessions, ["QC:M", "QC:Q", "QC:A", "QC:B"]);
    }
}
