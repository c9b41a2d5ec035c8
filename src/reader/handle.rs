//! Document handle
//!
//! [`QcmlReader`] ties one source to its offset index, snippet reader,
//! decoder context and the [`Document`] decoded values are registered in.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};

use super::iter::{decode_record, DocumentTerms, LazyIter, RecordIter};
use super::snippet::SnippetReader;
use crate::decode::{DecodeContext, Element, FromElement};
use crate::error::Result;
use crate::index::{ByteRange, IndexCache, IndexedType, OffsetIndex};
use crate::model::{Document, Record, RecordKind, Term};
use crate::resolve::{resolve, TermCache, TermSource};
use crate::shape::{from_wire, terms_from_wire, WireRecord};

/// Random-access reader over one qcML source.
///
/// Owns the source, a shared offset index, the decoder context and the
/// [`Document`] that decoded terms and records are registered in.
#[derive(Debug)]
pub struct QcmlReader<R = BufReader<File>> {
    index: Arc<OffsetIndex>,
    snippets: SnippetReader<R>,
    decoder: DecodeContext,
    document: Document,
}

impl QcmlReader<BufReader<File>> {
    /// Open and index a file.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be opened or read
    /// - The encoding is not ASCII-compatible
    /// - An indexed element has no identifier or is never closed
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening qcML file: {}", path.display());
        let index = OffsetIndex::build(BufReader::new(File::open(path)?))?;
        let mut reader = Self::with_index(Arc::new(index), BufReader::new(File::open(path)?));
        reader.document.set_key(Some(path.display().to_string()));
        Ok(reader)
    }

    /// Open a file, reusing the cached index when the file is unchanged.
    pub fn open_cached(path: impl AsRef<Path>, cache: &IndexCache) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening qcML file: {} (cached index)", path.display());
        let index = cache.get_or_build(path)?;
        let mut reader = Self::with_index(index, BufReader::new(File::open(path)?));
        reader.document.set_key(Some(path.display().to_string()));
        Ok(reader)
    }
}

impl<R: Read + Seek> QcmlReader<R> {
    /// Index any seekable source.
    pub fn from_source(mut source: R) -> Result<Self> {
        let index = OffsetIndex::build(&mut source)?;
        Ok(Self::with_index(Arc::new(index), source))
    }

    /// Use an existing index for `source`.
    ///
    /// The index must have been built from the same bytes.
    pub fn with_index(index: Arc<OffsetIndex>, source: R) -> Self {
        let snippets = SnippetReader::new(source, index.encoding(), index.source_len());
        let decoder = DecodeContext::new(index.namespaces().clone());
        let mut document = Document::new();
        document.set_version(index.version().map(str::to_owned));
        Self {
            index,
            snippets,
            decoder,
            document,
        }
    }

    /// The shared offset index.
    pub fn index(&self) -> &Arc<OffsetIndex> {
        &self.index
    }

    /// The document populated so far.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Consume the reader, keeping what has been decoded.
    pub fn into_document(self) -> Document {
        self.document
    }

    /// The decoder context of this handle.
    pub fn decoder(&self) -> &DecodeContext {
        &self.decoder
    }

    /// Raw text of a range of the source, optionally capped in characters.
    pub fn snippet(&self, range: &ByteRange, max_chars: usize) -> Result<String> {
        self.snippets.read_capped(range, max_chars)
    }

    /// Look a term up, decoding and registering it on first use.
    pub fn term(&mut self, id: &str) -> Result<Option<Arc<Term>>> {
        self.terms().find_term(id)
    }

    /// Load a record by kind and identifier.
    ///
    /// The record is decoded, its references resolved against the
    /// document's terms, and registered in the document; later calls return
    /// the registered record without decoding again.
    ///
    /// # Errors
    /// Besides read and decode failures, returns [`QcmlError::UnknownTerm`]
    /// when the record references a term the source does not contain. Use
    /// [`records()`](Self::records) to walk such records unregistered.
    ///
    /// [`QcmlError::UnknownTerm`]: crate::QcmlError::UnknownTerm
    pub fn load_record(&mut self, kind: RecordKind, id: &str) -> Result<Option<&Record>> {
        if self.document.record(kind, id).is_none() {
            let entry = match self.index.lookup_entry(IndexedType::Record, id) {
                Some(entry) if entry.kind == kind.element_kind() => entry.clone(),
                _ => return Ok(None),
            };
            let mut cache = TermCache::new();
            let (record, report) = decode_record(&entry, &mut self.terms(), &mut cache)?;
            debug!(
                "Loaded <{}> '{}': {} references resolved, {} missing",
                kind.tag_name(),
                id,
                report.resolved,
                report.missing.len()
            );
            self.document.add_record(record)?;
        }
        Ok(self.document.record(kind, id))
    }

    /// Decode each element of an indexed type on access.
    pub fn iter<T: FromElement>(&self, ty: IndexedType) -> LazyIter<'_, T, R> {
        LazyIter::new(self.index.entries(ty), &self.snippets, &self.decoder)
    }

    /// All records, runs and sets in document order, references resolved.
    pub fn records(&mut self) -> RecordIter<'_, R> {
        self.record_iter(None)
    }

    /// Run records only.
    pub fn runs(&mut self) -> RecordIter<'_, R> {
        self.record_iter(Some(RecordKind::Run))
    }

    /// Set records only.
    pub fn sets(&mut self) -> RecordIter<'_, R> {
        self.record_iter(Some(RecordKind::Set))
    }

    /// Decode the whole source with schema validation into a fresh document.
    ///
    /// Reads the complete source into memory.
    pub fn read_document(&self) -> Result<Document> {
        info!("Decoding whole document ({} bytes)", self.snippets.len());
        let text = self.snippets.read(&ByteRange::new(0, self.snippets.len()))?;
        let root = self.decoder.decode_document(&text)?;
        document_from_element(&root, self.document.key())
    }

    fn terms(&mut self) -> DocumentTerms<'_, R> {
        DocumentTerms {
            index: &self.index,
            snippets: &self.snippets,
            decoder: &self.decoder,
            document: &mut self.document,
        }
    }

    fn record_iter(&mut self, kind: Option<RecordKind>) -> RecordIter<'_, R> {
        let index: &OffsetIndex = &self.index;
        let terms = DocumentTerms {
            index,
            snippets: &self.snippets,
            decoder: &self.decoder,
            document: &mut self.document,
        };
        RecordIter::new(index.entries(IndexedType::Record), kind, terms)
    }
}

/// Build a document from a decoded root element
fn document_from_element(root: &Element, key: Option<&str>) -> Result<Document> {
    let mut document = Document::new();
    document.set_key(key.map(str::to_owned));
    document.set_version(root.attr_owned("version"));

    let terms = root
        .children_named("cvList")
        .flat_map(|list| list.children_named("cv"))
        .map(Term::from_element)
        .collect::<Result<Vec<_>>>()?;
    let mut registry = terms_from_wire(terms);
    for term in registry.values() {
        document.register_term(Arc::clone(term));
    }

    let mut cache = TermCache::new();
    for child in &root.children {
        if child.name != "runQuality" && child.name != "setQuality" {
            continue;
        }
        let mut record = from_wire(WireRecord::from_element(child)?)?;
        resolve(&mut record, &mut cache, &mut registry)?;
        document.add_record(record)?;
    }

    debug!(
        "Document decoded: {} terms, {} runs, {} sets",
        document.term_count(),
        document.record_count(RecordKind::Run),
        document.record_count(RecordKind::Set)
    );
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QcmlError;
    use std::io::Cursor;

    const DOC: &str = concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
        "<qcML xmlns=\"https://github.com/qcML/qcml\" version=\"0.0.8\">\n",
        "<runQuality ID=\"run_0\">",
        "<qualityParameter ID=\"q0\" name=\"MS1 count\" accession=\"QC:0000007\" cvRef=\"cv_0\" value=\"12\" unitCvRef=\"cv_2\" unitName=\"count\"/>",
        "<attachment ID=\"a0\" name=\"TIC\" accession=\"QC:0000023\" cvRef=\"cv_0\" qualityParameterRef=\"QC:0000007\">",
        "<table><tableColumnTypes>MS:1 MS:2</tableColumnTypes><tableRowValues>1 2.5</tableRowValues></table>",
        "</attachment>",
        "</runQuality>\n",
        "<setQuality ID=\"set_0\"></setQuality>\n",
        "<cvList>",
        "<cv ID=\"cv_0\" fullName=\"PSI-MS\" uri=\"https://example.org/psi-ms.obo\" version=\"4.1\"/>",
        "<cv ID=\"cv_1\" fullName=\"QC\" uri=\"https://example.org/qc.obo\"/>",
        "<cv ID=\"cv_2\" fullName=\"UO\" uri=\"https://example.org/uo.obo\"/>",
        "</cvList>\n",
        "</qcML>\n"
    );

    fn reader(doc: &str) -> QcmlReader<Cursor<Vec<u8>>> {
        QcmlReader::from_source(Cursor::new(doc.as_bytes().to_vec())).unwrap()
    }

    #[test]
    fn test_term_decoded_once() {
        let mut r = reader(DOC);
        let first = r.term("cv_0").unwrap().unwrap();
        let second = r.term("cv_0").unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.version.as_deref(), Some("4.1"));
        assert_eq!(r.document().term_count(), 1);
        assert!(r.term("cv_9").unwrap().is_none());
    }

    #[test]
    fn test_load_record_registers() {
        let mut r = reader(DOC);
        let doc_id = r.document().id();
        let record = r.load_record(RecordKind::Run, "run_0").unwrap().unwrap();
        assert_eq!(record.document(), Some(doc_id));
        let q = record.quality("QC:0000007").unwrap();
        assert_eq!(q.param.unit().unwrap().term().unwrap().name, "UO");
        assert!(record.linked_parameter("QC:0000023").is_some());

        assert_eq!(r.document().term_count(), 2);
        assert!(r.load_record(RecordKind::Set, "run_0").unwrap().is_none());
        assert!(r.load_record(RecordKind::Run, "run_9").unwrap().is_none());
    }

    #[test]
    fn test_iter_terms() {
        let r = reader(DOC);
        let terms: Vec<Term> = r
            .iter::<Term>(IndexedType::Term)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(terms.len(), 3);
        assert_eq!(terms[2].id, "cv_2");
    }

    #[test]
    fn test_records_and_filters() {
        let mut r = reader(DOC);
        assert_eq!(r.records().count(), 2);
        assert_eq!(r.runs().count(), 1);
        let sets: Vec<Record> = r.sets().collect::<Result<_>>().unwrap();
        assert_eq!(sets.len(), 1);
        assert!(sets[0].is_empty());
        assert_eq!(sets[0].kind(), RecordKind::Set);
    }

    #[test]
    fn test_read_document() {
        let r = reader(DOC);
        let doc = r.read_document().unwrap();
        assert_eq!(doc.version(), Some("0.0.8"));
        assert_eq!(doc.term_count(), 3);
        assert_eq!(doc.record_count(RecordKind::Run), 1);
        assert_eq!(doc.record_count(RecordKind::Set), 1);
    }

    #[test]
    fn test_read_document_keeps_first_duplicate_term() {
        let dup = DOC.replace(
            "</cvList>",
            "<cv ID=\"cv_0\" fullName=\"Shadow\" uri=\"https://example.org/x.obo\"/></cvList>",
        );
        let doc = reader(&dup).read_document().unwrap();
        assert_eq!(doc.term_count(), 3);
        assert_eq!(doc.term("cv_0").unwrap().name, "PSI-MS");
    }

    #[test]
    fn test_read_document_validates() {
        let invalid = DOC.replace(" version=\"0.0.8\"", "");
        let r = reader(&invalid);
        assert!(matches!(r.read_document(), Err(QcmlError::Schema { .. })));
        // fragment decode is unaffected
        let mut r = reader(&invalid);
        assert_eq!(r.records().filter(|rec| rec.is_ok()).count(), 2);
    }

    #[test]
    fn test_lowercase_identifiers_decode() {
        let doc = concat!(
            "<qcML xmlns=\"https://github.com/qcML/qcml\" version=\"0.0.8\">",
            "<runQuality id='run_1'>",
            "<qualityParameter id=\"q\" name=\"n\" accession=\"QC:1\" cvRef=\"cv_0\"/>",
            "</runQuality>",
            "<cvList><cv id='cv_0' fullName=\"PSI-MS\" uri=\"u\"/></cvList>",
            "</qcML>"
        );
        let mut r = reader(doc);
        assert_eq!(r.term("cv_0").unwrap().unwrap().name, "PSI-MS");

        let record = r.load_record(RecordKind::Run, "run_1").unwrap().unwrap();
        assert_eq!(record.id(), "run_1");
        let qp = record.quality("QC:1").unwrap();
        assert_eq!(qp.param.id.as_deref(), Some("q"));
        assert!(qp.param.term().is_resolved());

        let doc = r.read_document().unwrap();
        assert_eq!(doc.record_count(RecordKind::Run), 1);
    }

    #[test]
    fn test_snippet() {
        let r = reader(DOC);
        let range = r.index().lookup(IndexedType::Record, "set_0").unwrap();
        assert_eq!(r.snippet(&range, 0).unwrap(), "<setQuality ID=\"set_0\"></setQuality>");
        assert_eq!(r.snippet(&range, 11).unwrap(), "<setQuality");
    }
}
