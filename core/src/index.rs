use crate::analysis::Analyzer;
use crate::similarity::CollectionStats;
use crate::trec::Document;
use crate::{Error, Result};
use std::borrow::Cow;
use std::collections::HashMap;

pub type TermId = u32;
pub type DocId = u32;

#[derive(Debug, Clone)]
pub struct DocMeta {
    pub docno: Option<String>,
    /// Number of terms after analysis.
    pub length: u32,
    /// Number of distinct terms after analysis.
    pub unique_terms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32,
}

/// Term dictionary plus postings. Postings of a term are ordered by doc id,
/// which is also insertion order, and hold one entry per document, so the
/// document frequency of a term is the length of its list.
#[derive(Debug, Default)]
struct Postings {
    dictionary: HashMap<String, TermId>,
    terms: Vec<String>,
    lists: Vec<Vec<Posting>>,
}

impl Postings {
    fn intern(&mut self, term: String) -> TermId {
        if let Some(&tid) = self.dictionary.get(&term) {
            return tid;
        }
        let tid = self.terms.len() as TermId;
        self.dictionary.insert(term.clone(), tid);
        self.terms.push(term);
        self.lists.push(Vec::new());
        tid
    }

    fn get(&self, term: &str) -> &[Posting] {
        self.dictionary.get(term).map(|&tid| self.lists[tid as usize].as_slice()).unwrap_or(&[])
    }
}

/// Mutable, append-only side of the index.
///
/// Documents receive sequential ids in the order they are added. Call
/// [`IndexBuilder::seal`] once the corpus is exhausted to get a read-only
/// [`InvertedIndex`].
#[derive(Debug, Default)]
pub struct IndexBuilder {
    analyzer: Analyzer,
    postings: Postings,
    docs: Vec<DocMeta>,
    total_len: u64,
}

impl IndexBuilder {
    pub fn new(analyzer: Analyzer) -> Self {
        Self { analyzer, ..Self::default() }
    }

    pub fn num_docs(&self) -> u32 {
        self.docs.len() as u32
    }

    /// Tokenize `doc` and append its postings.
    ///
    /// Records without any text are rejected with [`Error::EmptyContent`] and
    /// do not consume an id. Records that produce zero terms are kept with
    /// length 0.
    pub fn add(&mut self, doc: Document) -> Result<DocId> {
        if !doc.has_content() {
            return Err(Error::EmptyContent);
        }
        let doc_id = self.docs.len() as DocId;
        if doc.docno.is_none() {
            tracing::warn!(doc_id, "record without DOCNO");
        }

        let tokens = self.analyzer.tokenize(&doc.content);
        let length = tokens.len() as u32;
        let mut unique_terms = 0u32;
        for term in tokens {
            let tid = self.postings.intern(term);
            let list = &mut self.postings.lists[tid as usize];
            match list.last_mut() {
                Some(last) if last.doc_id == doc_id => last.tf += 1,
                _ => {
                    list.push(Posting { doc_id, tf: 1 });
                    unique_terms += 1;
                }
            }
        }

        self.docs.push(DocMeta { docno: doc.docno, length, unique_terms });
        self.total_len += length as u64;
        Ok(doc_id)
    }

    /// Append a partial index built over a later partition of the corpus.
    ///
    /// Ids of `other`'s documents are shifted past this builder's documents,
    /// so merging partitions in corpus order gives the same ids as a
    /// sequential build.
    pub fn merge(&mut self, other: IndexBuilder) {
        debug_assert_eq!(self.analyzer, other.analyzer, "partitions analyzed differently");
        let offset = self.docs.len() as DocId;
        let IndexBuilder { postings, docs, total_len, .. } = other;
        for (term, list) in postings.terms.into_iter().zip(postings.lists) {
            let tid = self.postings.intern(term);
            self.postings.lists[tid as usize]
                .extend(list.into_iter().map(|p| Posting { doc_id: p.doc_id + offset, tf: p.tf }));
        }
        self.docs.extend(docs);
        self.total_len += total_len;
    }

    /// Freeze corpus statistics.
    pub fn seal(self) -> InvertedIndex {
        let n = self.docs.len();
        let avg_doc_len = if n == 0 { 0.0 } else { (self.total_len as f64 / n as f64) as f32 };

        let mut verbose_docs = 0usize;
        let mut avgtf_sum = 0f64;
        for d in self.docs.iter().filter(|d| d.unique_terms > 0) {
            verbose_docs += 1;
            avgtf_sum += d.length as f64 / d.unique_terms as f64;
        }
        let mean_avg_tf = if verbose_docs == 0 { 0.0 } else { (avgtf_sum / verbose_docs as f64) as f32 };

        tracing::info!(num_docs = n, num_terms = self.postings.terms.len(), avg_doc_len, "index sealed");
        InvertedIndex {
            analyzer: self.analyzer,
            postings: self.postings,
            docs: self.docs,
            stats: CollectionStats { num_docs: n as u32, avg_doc_len, mean_avg_tf },
        }
    }
}

/// Read-only index with frozen corpus statistics. Safe to share across
/// threads for concurrent queries.
#[derive(Debug)]
pub struct InvertedIndex {
    analyzer: Analyzer,
    postings: Postings,
    docs: Vec<DocMeta>,
    stats: CollectionStats,
}

impl InvertedIndex {
    /// The analyzer documents were indexed with; queries must use it too.
    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Postings for `term`, empty when the term never occurred.
    pub fn lookup(&self, term: &str) -> &[Posting] {
        self.postings.get(term)
    }

    pub fn df(&self, term: &str) -> u32 {
        self.lookup(term).len() as u32
    }

    pub fn document_count(&self) -> u32 {
        self.stats.num_docs
    }

    pub fn average_document_length(&self) -> f32 {
        self.stats.avg_doc_len
    }

    /// Mean over non-empty documents of `length / unique_terms`.
    pub fn mean_average_term_frequency(&self) -> f32 {
        self.stats.mean_avg_tf
    }

    pub fn stats(&self) -> &CollectionStats {
        &self.stats
    }

    pub fn num_terms(&self) -> usize {
        self.postings.terms.len()
    }

    pub fn doc(&self, id: DocId) -> Option<&DocMeta> {
        self.docs.get(id as usize)
    }

    /// Returns 0 for unknown ids.
    pub fn document_length(&self, id: DocId) -> u32 {
        self.doc(id).map_or(0, |d| d.length)
    }

    pub fn unique_terms(&self, id: DocId) -> u32 {
        self.doc(id).map_or(0, |d| d.unique_terms)
    }

    /// External identifier of a document. Records without a DOCNO fall back
    /// to `DOC-<id>`.
    pub fn docno(&self, id: DocId) -> Cow<'_, str> {
        match self.doc(id).and_then(|d| d.docno.as_deref()) {
            Some(docno) => Cow::Borrowed(docno),
            None => Cow::Owned(format!("DOC-{id}")),
        }
    }

    /// Deterministic FNV-1a hash over documents, terms and postings.
    pub fn fingerprint(&self) -> u64 {
        fn fnv1a_step(mut h: u64, bytes: &[u8]) -> u64 {
            const FNV_PRIME: u64 = 0x100000001b3;
            for &b in bytes {
                h ^= b as u64;
                h = h.wrapping_mul(FNV_PRIME);
            }
            h
        }

        let mut h: u64 = 0xcbf29ce484222325;
        h = fnv1a_step(h, &self.stats.num_docs.to_le_bytes());
        for d in &self.docs {
            h = fnv1a_step(h, d.docno.as_deref().unwrap_or("").as_bytes());
            h = fnv1a_step(h, &d.length.to_le_bytes());
        }

        let mut terms: Vec<&String> = self.postings.terms.iter().collect();
        terms.sort_unstable();
        for t in terms {
            h = fnv1a_step(h, t.as_bytes());
            let list = self.lookup(t);
            h = fnv1a_step(h, &(list.len() as u32).to_le_bytes());
            for p in list {
                h = fnv1a_step(h, &p.doc_id.to_le_bytes());
                h = fnv1a_step(h, &p.tf.to_le_bytes());
            }
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(docno: &str, text: &str) -> Document {
        Document::new(docno, text)
    }

    fn build(docs: &[(&str, &str)]) -> InvertedIndex {
        let mut b = IndexBuilder::new(Analyzer::default());
        for (docno, text) in docs {
            b.add(doc(docno, text)).unwrap();
        }
        b.seal()
    }

    #[test]
    fn ids_are_sequential() {
        let mut b = IndexBuilder::new(Analyzer::default());
        assert_eq!(b.add(doc("A", "one")).unwrap(), 0);
        assert_eq!(b.add(doc("B", "two")).unwrap(), 1);
        assert_eq!(b.num_docs(), 2);
    }

    #[test]
    fn term_frequency_and_df() {
        let ix = build(&[("A", "hello hello hello world"), ("B", "hello rust")]);
        assert_eq!(ix.lookup("hello"), &[Posting { doc_id: 0, tf: 3 }, Posting { doc_id: 1, tf: 1 }]);
        assert_eq!(ix.df("hello"), 2);
        assert_eq!(ix.df("world"), 1);
        assert_eq!(ix.df("missing"), 0);
        assert!(ix.lookup("missing").is_empty());
        assert_eq!(ix.unique_terms(0), 2);
    }

    #[test]
    fn statistics_match_documents() {
        let corpus = [("A", "orange citrus fruit"), ("B", "apple fruit"), ("C", "fruit fruit fruit fruit")];
        let ix = build(&corpus);
        assert_eq!(ix.document_count(), 3);
        assert_eq!(ix.document_length(0), 3);
        assert_eq!(ix.document_length(1), 2);
        assert_eq!(ix.document_length(2), 4);
        assert!((ix.average_document_length() - 3.0).abs() < 1e-6);
        assert_eq!(ix.df("fruit"), 3);
        let occurrences: u32 = ix.lookup("fruit").iter().map(|p| p.tf).sum();
        assert_eq!(occurrences, 6);
        // avgtf: 1, 1, 4
        assert!((ix.mean_average_term_frequency() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn empty_content_is_rejected_without_consuming_an_id() {
        let mut b = IndexBuilder::new(Analyzer::default());
        assert!(matches!(b.add(Document { docno: Some("E".into()), content: String::new() }), Err(Error::EmptyContent)));
        assert_eq!(b.add(doc("A", "text")).unwrap(), 0);
    }

    #[test]
    fn zero_term_documents_count_towards_statistics() {
        let ix = build(&[("A", "<DOC>\n</DOC>"), ("B", "apple fruit")]);
        assert_eq!(ix.document_count(), 2);
        assert_eq!(ix.document_length(0), 0);
        assert!((ix.average_document_length() - 1.0).abs() < 1e-6);
        // only B contributes to mavgtf
        assert!((ix.mean_average_term_frequency() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_index_has_zero_statistics() {
        let ix = IndexBuilder::new(Analyzer::default()).seal();
        assert_eq!(ix.document_count(), 0);
        assert_eq!(ix.average_document_length(), 0.0);
        assert_eq!(ix.mean_average_term_frequency(), 0.0);
    }

    #[test]
    fn missing_docno_falls_back_to_id() {
        let mut b = IndexBuilder::new(Analyzer::default());
        b.add(Document { docno: None, content: "text".into() }).unwrap();
        let ix = b.seal();
        assert_eq!(ix.docno(0), "DOC-0");
    }

    #[test]
    fn merged_partitions_equal_sequential_build() {
        let corpus = [("A", "orange citrus fruit"), ("B", "apple fruit"), ("C", "citrus tree"), ("D", "apple apple pie")];
        let sequential = build(&corpus);

        let mut left = IndexBuilder::new(Analyzer::default());
        let mut right = IndexBuilder::new(Analyzer::default());
        for (docno, text) in &corpus[..2] {
            left.add(doc(docno, text)).unwrap();
        }
        for (docno, text) in &corpus[2..] {
            right.add(doc(docno, text)).unwrap();
        }
        left.merge(right);
        let merged = left.seal();

        assert_eq!(merged.document_count(), 4);
        assert_eq!(merged.lookup("citrus"), &[Posting { doc_id: 0, tf: 1 }, Posting { doc_id: 2, tf: 1 }]);
        assert_eq!(merged.docno(3), "D");
        assert_eq!(merged.average_document_length(), sequential.average_document_length());
        assert_eq!(merged.fingerprint(), sequential.fingerprint());
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = build(&[("A", "apple fruit")]);
        let b = build(&[("A", "apple fruit")]);
        let c = build(&[("A", "apple fruits")]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn sealed_index_is_shareable() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<InvertedIndex>();
    }
}
