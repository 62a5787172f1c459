//! BM25 scoring policies.
//!
//! Every variant shares the Okapi shape
//!
//! ```text
//! idf    = ln(1 + (N - df + 0.5) / (df + 0.5))
//! weight = (k1 + 1) * tf / (tf + k1 * norm)
//! ```
//!
//! and differs only in its constants and in how `norm` (document length
//! normalization) is computed.
//!
//! References:
//! - Robertson & Zaragoza (2009). "The Probabilistic Relevance Framework: BM25 and Beyond."
//! - Lipani et al. (2015). "Verboseness Fission for BM25 Document Length Normalization."

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Corpus-wide statistics, frozen when the index is sealed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollectionStats {
    pub num_docs: u32,
    pub avg_doc_len: f32,
    /// Mean over non-empty documents of `length / unique_terms`.
    pub mean_avg_tf: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocStats {
    pub length: u32,
    pub unique_terms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f32,
    /// Length normalization strength, in `[0, 1]`.
    pub b: f32,
}

impl Bm25Params {
    /// Library-standard BM25.
    pub const STANDARD: Self = Self { k1: 1.2, b: 0.75 };
    /// Okapi constants from the Robertson/Spärck Jones TREC runs.
    pub const ROBERTSON: Self = Self { k1: 2.0, b: 0.75 };
}

/// Configuration name of a similarity variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimilarityKind {
    Original,
    Va,
    #[default]
    Default,
}

impl SimilarityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityKind::Original => "ORIGINAL",
            SimilarityKind::Va => "VA",
            SimilarityKind::Default => "DEFAULT",
        }
    }
}

impl fmt::Display for SimilarityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimilarityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ORIGINAL" => Ok(SimilarityKind::Original),
            "VA" => Ok(SimilarityKind::Va),
            "DEFAULT" => Ok(SimilarityKind::Default),
            _ => Err(Error::UnknownSimilarity(s.to_string())),
        }
    }
}

/// A scoring policy. Stateless: the same inputs always give the same bits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Similarity {
    /// Classic Okapi BM25 with Robertson's constants.
    Original(Bm25Params),
    /// Verboseness-aware BM25: length normalization splits into a
    /// verboseness part (`length / unique_terms`) and a size part
    /// (`length / avg_doc_len`), weighted by the corpus mean average term
    /// frequency.
    Va { k1: f32 },
    /// Library-standard BM25.
    Default(Bm25Params),
}

impl Default for Similarity {
    fn default() -> Self {
        Similarity::Default(Bm25Params::STANDARD)
    }
}

impl From<SimilarityKind> for Similarity {
    fn from(kind: SimilarityKind) -> Self {
        match kind {
            SimilarityKind::Original => Similarity::Original(Bm25Params::ROBERTSON),
            SimilarityKind::Va => Similarity::Va { k1: Bm25Params::STANDARD.k1 },
            SimilarityKind::Default => Similarity::Default(Bm25Params::STANDARD),
        }
    }
}

impl Similarity {
    pub fn kind(&self) -> SimilarityKind {
        match self {
            Similarity::Original(_) => SimilarityKind::Original,
            Similarity::Va { .. } => SimilarityKind::Va,
            Similarity::Default(_) => SimilarityKind::Default,
        }
    }

    pub fn with_k1(mut self, value: f32) -> Self {
        match &mut self {
            Similarity::Original(p) | Similarity::Default(p) => p.k1 = value,
            Similarity::Va { k1 } => *k1 = value,
        }
        self
    }

    /// VA computes its own normalization, so `b` is ignored there.
    pub fn with_b(mut self, value: f32) -> Self {
        if let Similarity::Original(p) | Similarity::Default(p) = &mut self {
            p.b = value;
        }
        self
    }

    /// BM25 "+1" IDF, never negative. Zero for terms absent from the corpus.
    pub fn idf(num_docs: u32, df: u32) -> f32 {
        if df == 0 {
            return 0.0;
        }
        let n = num_docs as f32;
        let df = df as f32;
        (1.0 + ((n - df + 0.5) / (df + 0.5)).max(0.0)).ln()
    }

    /// Saturated, length-normalized term-frequency component.
    pub fn tf_weight(&self, tf: u32, doc: DocStats, stats: &CollectionStats) -> f32 {
        if tf == 0 {
            return 0.0;
        }
        let tf = tf as f32;
        let dl = doc.length as f32;
        let size = if stats.avg_doc_len > 0.0 { dl / stats.avg_doc_len } else { 0.0 };
        let (k1, norm) = match *self {
            Similarity::Original(p) | Similarity::Default(p) => (p.k1, 1.0 - p.b + p.b * size),
            Similarity::Va { k1 } => {
                let m = stats.mean_avg_tf;
                if m <= 0.0 {
                    return 0.0;
                }
                let verboseness = if doc.unique_terms == 0 { 0.0 } else { dl / (doc.unique_terms as f32 * m * m) };
                (k1, verboseness + (1.0 - 1.0 / m) * size)
            }
        };
        (k1 + 1.0) * tf / (tf + k1 * norm)
    }

    /// Score of one term in one document.
    pub fn score(&self, tf: u32, df: u32, doc: DocStats, stats: &CollectionStats) -> f32 {
        if tf == 0 || df == 0 {
            return 0.0;
        }
        Self::idf(stats.num_docs, df) * self.tf_weight(tf, doc, stats)
    }
}
