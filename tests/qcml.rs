//! End-to-end behaviour on generated qcML documents.

use std::fmt::Write as _;
use std::io::{Cursor, Write as _};
use std::sync::Arc;

use rustyqcml::shape::{from_wire, to_wire};
use rustyqcml::{
    CvParameter, IndexCache, IndexOptions, IndexedType, OffsetIndex, QcmlError, QcmlReader,
    QualityParameter, Record, RecordKind, Term,
};

const HEADER: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
    "<qcML xmlns=\"https://github.com/qcML/qcml\" version=\"0.0.8\">\n"
);

fn cv_list(ids: &[&str]) -> String {
    let mut out = String::from("  <cvList>\n");
    for id in ids {
        writeln!(
            out,
            "    <cv ID=\"{id}\" fullName=\"vocabulary {id}\" uri=\"https://example.org/{id}.obo\" version=\"1.0\"/>"
        )
        .unwrap();
    }
    out.push_str("  </cvList>\n");
    out
}

fn quality(id: &str, accession: &str, cv_ref: &str, value: &str) -> String {
    format!(
        "<qualityParameter ID=\"{id}\" name=\"p {accession}\" accession=\"{accession}\" cvRef=\"{cv_ref}\" value=\"{value}\"/>"
    )
}

fn run(id: &str, body: &str) -> String {
    format!("  <runQuality ID=\"{id}\">{body}</runQuality>\n")
}

/// Three terms, two runs with one measurement on `cv_0` each, an empty set
fn scenario() -> String {
    let mut doc = String::from(HEADER);
    doc.push_str(&run("run_0", &quality("q0", "QC:0000007", "cv_0", "12")));
    doc.push_str(&run("run_1", &quality("q1", "QC:0000007", "cv_0", "15")));
    doc.push_str("  <setQuality ID=\"set_0\"></setQuality>\n");
    doc.push_str(&cv_list(&["cv_0", "cv_1", "cv_2"]));
    doc.push_str("</qcML>\n");
    doc
}

fn open(doc: &str) -> QcmlReader<Cursor<Vec<u8>>> {
    QcmlReader::from_source(Cursor::new(doc.as_bytes().to_vec())).unwrap()
}

#[test]
fn test_scenario_counts_and_shared_terms() {
    let mut reader = open(&scenario());
    let index = Arc::clone(reader.index());
    assert_eq!(index.entries(IndexedType::Term).len(), 3);
    assert_eq!(index.entries_of_kind(rustyqcml::ElementKind::Run).count(), 2);
    assert_eq!(index.entries_of_kind(rustyqcml::ElementKind::Set).count(), 1);

    let runs: Vec<Record> = reader.runs().collect::<rustyqcml::Result<_>>().unwrap();
    assert_eq!(runs.len(), 2);
    let terms: Vec<&Arc<Term>> = runs
        .iter()
        .map(|r| r.quality("QC:0000007").unwrap().param.term().term().unwrap())
        .collect();
    assert!(Arc::ptr_eq(terms[0], terms[1]));
    assert_eq!(terms[0].id, "cv_0");

    let sets: Vec<Record> = reader.sets().collect::<rustyqcml::Result<_>>().unwrap();
    assert_eq!(sets.len(), 1);
    assert!(sets[0].is_empty());

    // only the referenced term was decoded
    assert_eq!(reader.document().term_count(), 1);
}

#[test]
fn test_nothing_decoded_before_access() {
    let mut reader = open(&scenario());
    assert_eq!(reader.document().term_count(), 0);
    assert_eq!(reader.document().record_count(RecordKind::Run), 0);

    let record = reader.load_record(RecordKind::Run, "run_1").unwrap().unwrap();
    assert_eq!(record.quality("QC:0000007").unwrap().param.value.as_deref(), Some("15"));
    assert_eq!(reader.document().record_count(RecordKind::Run), 1);
    assert_eq!(reader.document().term_count(), 1);
}

#[test]
fn test_reindex_is_idempotent() {
    let doc = scenario();
    let first = OffsetIndex::build(Cursor::new(doc.as_bytes())).unwrap();
    let second = OffsetIndex::build(Cursor::new(doc.as_bytes())).unwrap();
    let chunked =
        OffsetIndex::build_with(Cursor::new(doc.as_bytes()), &IndexOptions { chunk_size: 7 })
            .unwrap();
    assert_eq!(first, second);
    assert_eq!(first, chunked);
}

#[test]
fn test_missing_term_leaves_reference_unset() {
    let mut doc = String::from(HEADER);
    doc.push_str(&run("run_0", &quality("q0", "QC:1", "cv_9", "1")));
    doc.push_str(&cv_list(&["cv_0"]));
    doc.push_str("</qcML>\n");

    let mut reader = open(&doc);
    let mut runs = reader.runs();
    let record = runs.next().unwrap().unwrap();
    let term = record.quality("QC:1").unwrap().param.term();
    assert_eq!(term.id(), "cv_9");
    assert!(!term.is_resolved());
    assert_eq!(runs.last_report().unwrap().missing, ["cv_9"]);
    assert!(runs.next().is_none());
}

#[test]
fn test_measurement_last_write_wins() {
    let body = format!(
        "{}{}",
        quality("q0", "QC:1", "cv_0", "first"),
        quality("q1", "QC:1", "cv_0", "second")
    );
    let mut doc = String::from(HEADER);
    doc.push_str(&run("run_0", &body));
    doc.push_str(&cv_list(&["cv_0"]));
    doc.push_str("</qcML>\n");

    let mut reader = open(&doc);
    let record = reader.load_record(RecordKind::Run, "run_0").unwrap().unwrap();
    assert_eq!(record.quality_entries().count(), 1);
    let entry = record.quality("QC:1").unwrap();
    assert_eq!(entry.param.value.as_deref(), Some("second"));
    assert_eq!(entry.param.id.as_deref(), Some("q1"));
}

fn table_document() -> String {
    let mut rows = String::new();
    for row in 0..5 {
        write!(rows, "<tableRowValues>{} {}.5</tableRowValues>", row, row).unwrap();
    }
    let body = format!(
        "{}<attachment ID=\"a0\" name=\"TIC\" accession=\"QC:0000023\" cvRef=\"cv_0\" qualityParameterRef=\"QC:1\">\
         <table><tableColumnTypes>col_a col_b</tableColumnTypes>{}</table></attachment>\
         <attachment ID=\"a1\" name=\"raw\" accession=\"QC:0000024\" cvRef=\"cv_0\"><binary>AAEC</binary></attachment>",
        quality("q0", "QC:1", "cv_0", "3"),
        rows
    );
    let mut doc = String::from(HEADER);
    doc.push_str(&run("run_0", &body));
    doc.push_str(&cv_list(&["cv_0"]));
    doc.push_str("</qcML>\n");
    doc
}

#[test]
fn test_table_cell_removal() {
    let mut reader = open(&table_document());
    let mut record = reader.runs().next().unwrap().unwrap();
    assert!(record.linked_parameter("QC:0000023").is_some());

    let table = record.attachment_mut("QC:0000023").unwrap().table_mut().unwrap();
    assert_eq!(table.attachment(), Some("QC:0000023"));
    assert_eq!(table.row_count(), 5);
    assert_eq!(table.remove_cell("col_a", 3).as_deref(), Some("3"));

    assert_eq!(table.get("col_a", 3), None);
    assert_eq!(table.get("col_b", 3), Some("3.5"));
    for row in [0, 1, 2, 4] {
        assert_eq!(table.get("col_a", row), Some(row.to_string().as_str()));
    }
    assert_eq!(table.cell_count(), 9);
    assert_eq!(table.cell("col_b", 0).unwrap().kind(), rustyqcml::CellKind::Real);

    let binary = record.attachment("QC:0000024").unwrap().binary().unwrap();
    assert_eq!(binary, [0u8, 1, 2]);
}

#[test]
fn test_shape_round_trip() {
    let mut reader = open(&table_document());
    let record = reader.runs().next().unwrap().unwrap();
    let wire = to_wire(&record);
    let again = from_wire(wire.clone()).unwrap();
    assert_eq!(to_wire(&again), wire);
    assert_eq!(again.entry_count(), record.entry_count());
}

#[test]
fn test_mandatory_reference_cannot_be_cleared() {
    let term = Arc::new(Term::new("uo", "Unit Ontology", "https://example.org/uo.obo", None));
    let mut qp = QualityParameter::new(CvParameter::new("QC:1", "n", "cv_0"));
    qp.param.set_unit_term(Some(Arc::clone(&term)));
    assert!(qp.param.unit().is_some());

    let err = qp.param.set_term(None).unwrap_err();
    assert!(matches!(err, QcmlError::InvalidReference(_)));
    assert_eq!(qp.param.term().id(), "cv_0");

    qp.param.set_unit_term(None);
    assert!(qp.param.unit().is_none());
}

#[test]
fn test_open_cached_reuses_index() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(scenario().as_bytes()).unwrap();
    file.flush().unwrap();

    let cache = IndexCache::new(4);
    let first = QcmlReader::open_cached(file.path(), &cache).unwrap();
    let mut second = QcmlReader::open_cached(file.path(), &cache).unwrap();
    assert!(Arc::ptr_eq(first.index(), second.index()));
    assert_eq!(cache.len().unwrap(), 1);
    assert_eq!(second.records().count(), 3);
    assert!(second.document().key().is_some());
}

#[test]
fn test_decode_error_names_element() {
    let mut doc = String::from(HEADER);
    doc.push_str(&run(
        "run_0",
        "<qualityParameter ID=\"q0\" name=\"n\" cvRef=\"cv_0\"/>",
    ));
    doc.push_str(&run("run_1", &quality("q1", "QC:1", "cv_0", "1")));
    doc.push_str(&cv_list(&["cv_0"]));
    doc.push_str("</qcML>\n");

    let mut reader = open(&doc);
    let results: Vec<_> = reader.runs().collect();
    assert_eq!(results.len(), 2);
    match &results[0] {
        Err(QcmlError::Decode { tag, message }) => {
            assert_eq!(tag, "qualityParameter");
            assert!(message.contains("accession"));
        }
        other => panic!("expected a decode error, got {:?}", other),
    }
    assert!(results[1].is_ok());
}
