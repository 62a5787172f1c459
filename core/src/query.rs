use crate::index::{DocId, InvertedIndex};
use crate::similarity::{DocStats, Similarity};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Default number of hits per topic, as expected by `trec_eval` runs.
pub const DEFAULT_HITS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f32,
}

/// Heap key: higher score first, then lower doc id.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct Rank(OrderedFloat<f32>, Reverse<DocId>);

/// Ranks documents of a sealed index against bag-of-words queries.
pub struct QueryEngine<'a> {
    index: &'a InvertedIndex,
    similarity: Similarity,
}

impl<'a> QueryEngine<'a> {
    pub fn new(index: &'a InvertedIndex, similarity: Similarity) -> Self {
        Self { index, similarity }
    }

    /// Analyze `text` with the index's analyzer, then [`search`](Self::search).
    pub fn search_text(&self, text: &str, k: usize) -> Vec<ScoredDoc> {
        let terms = self.index.analyzer().tokenize(text);
        self.search(&terms, k)
    }

    /// Top `k` documents containing at least one of `terms`, by descending
    /// score with ties broken by ascending doc id.
    ///
    /// Each occurrence of a term in `terms` contributes once, so repeated
    /// query terms weigh more. Unknown terms contribute nothing.
    pub fn search(&self, terms: &[String], k: usize) -> Vec<ScoredDoc> {
        if k == 0 || terms.is_empty() {
            return Vec::new();
        }
        let stats = self.index.stats();

        let mut scores: HashMap<DocId, f32> = HashMap::new();
        for term in terms {
            let postings = self.index.lookup(term);
            if postings.is_empty() {
                continue;
            }
            let idf = Similarity::idf(stats.num_docs, postings.len() as u32);
            for p in postings {
                let doc = DocStats {
                    length: self.index.document_length(p.doc_id),
                    unique_terms: self.index.unique_terms(p.doc_id),
                };
                *scores.entry(p.doc_id).or_insert(0.0) += idf * self.similarity.tf_weight(p.tf, doc, stats);
            }
        }

        top_k(scores, k)
    }
}

/// Bounded min-heap selection followed by a deterministic sort.
fn top_k(scores: HashMap<DocId, f32>, k: usize) -> Vec<ScoredDoc> {
    let mut heap: BinaryHeap<Reverse<Rank>> = BinaryHeap::with_capacity(k.min(scores.len()) + 1);
    for (doc_id, score) in scores {
        heap.push(Reverse(Rank(OrderedFloat(score), Reverse(doc_id))));
        if heap.len() > k {
            heap.pop();
        }
    }
    let mut results: Vec<ScoredDoc> = heap
        .into_iter()
        .map(|Reverse(Rank(score, Reverse(doc_id)))| ScoredDoc { doc_id, score: score.0 })
        .collect();
    results.sort_unstable_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.doc_id.cmp(&b.doc_id)));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analyzer;
    use crate::index::IndexBuilder;
    use crate::similarity::SimilarityKind;
    use crate::trec::Document;

    fn build(docs: &[(&str, &str)]) -> InvertedIndex {
        let mut b = IndexBuilder::new(Analyzer::default());
        for (docno, text) in docs {
            b.add(Document::new(*docno, *text)).unwrap();
        }
        b.seal()
    }

    #[test]
    fn shorter_document_ranks_first() {
        let ix = build(&[("A1", "orange citrus fruit"), ("B1", "apple fruit")]);
        let hits = QueryEngine::new(&ix, Similarity::default()).search_text("fruit", 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(ix.docno(hits[0].doc_id), "B1");
        assert_eq!(ix.docno(hits[1].doc_id), "A1");
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn ties_break_by_doc_id() {
        let ix = build(&[("X", "other words"), ("A", "apple pie"), ("B", "apple tart"), ("C", "apple cake")]);
        let hits = QueryEngine::new(&ix, Similarity::default()).search_text("apple", 10);
        let ids: Vec<DocId> = hits.iter().map(|h| h.doc_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(hits[0].score, hits[2].score);
    }

    #[test]
    fn truncation_keeps_prefix_order() {
        let ix = build(&[
            ("A", "apple"),
            ("B", "apple apple pear"),
            ("C", "apple pear plum fig"),
            ("D", "apple apple apple"),
            ("E", "apple kiwi"),
        ]);
        let engine = QueryEngine::new(&ix, Similarity::default());
        let all = engine.search_text("apple pear", 10);
        assert_eq!(all.len(), 5);
        for k in 1..=5 {
            assert_eq!(engine.search_text("apple pear", k), all[..k].to_vec());
        }
        assert!(all.windows(2).all(|w| w[0].score > w[1].score || (w[0].score == w[1].score && w[0].doc_id < w[1].doc_id)));
    }

    #[test]
    fn unmatched_documents_are_not_candidates() {
        let ix = build(&[("A", "apple"), ("B", "banana"), ("C", "cherry")]);
        let hits = QueryEngine::new(&ix, Similarity::default()).search_text("apple cherry durian", 10);
        let ids: Vec<DocId> = hits.iter().map(|h| h.doc_id).collect();
        assert_eq!(ids.len(), 2);
        assert!(!ids.contains(&1));
    }

    #[test]
    fn no_matching_term_is_empty_not_error() {
        let ix = build(&[("A", "apple")]);
        let engine = QueryEngine::new(&ix, Similarity::default());
        assert!(engine.search_text("durian", 10).is_empty());
        assert!(engine.search_text("", 10).is_empty());
        assert!(engine.search_text("apple", 0).is_empty());
    }

    #[test]
    fn zero_length_documents_never_match() {
        let ix = build(&[("E", "<DOC>\n</DOC>"), ("A", "apple")]);
        for kind in [SimilarityKind::Original, SimilarityKind::Va, SimilarityKind::Default] {
            let hits = QueryEngine::new(&ix, kind.into()).search_text("apple doc", 10);
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].doc_id, 1);
            assert!(hits[0].score.is_finite() && hits[0].score > 0.0);
        }
    }

    #[test]
    fn sum_equals_per_term_scores() {
        let ix = build(&[("A", "apple pear"), ("B", "apple"), ("C", "pear plum")]);
        let sim = Similarity::from(SimilarityKind::Original);
        let hits = QueryEngine::new(&ix, sim).search_text("apple pear", 10);
        let a = hits.iter().find(|h| h.doc_id == 0).unwrap();
        let doc = DocStats { length: 2, unique_terms: 2 };
        let expected = sim.score(1, ix.df("apple"), doc, ix.stats()) + sim.score(1, ix.df("pear"), doc, ix.stats());
        assert!((a.score - expected).abs() < 1e-6);
        assert_eq!(hits[0].doc_id, 0);
    }

    #[test]
    fn repeated_searches_are_identical() {
        let ix = build(&[("A", "apple pear"), ("B", "apple"), ("C", "pear plum apple apple")]);
        for kind in [SimilarityKind::Original, SimilarityKind::Va, SimilarityKind::Default] {
            let engine = QueryEngine::new(&ix, kind.into());
            assert_eq!(engine.search_text("apple plum", 10), engine.search_text("apple plum", 10));
        }
    }
}
