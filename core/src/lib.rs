//! Batch BM25 retrieval over TREC collections.
//!
//! The pipeline is: [`trec`] turns raw `<DOC>` records into [`Document`]s,
//! [`index::IndexBuilder`] tokenizes them with an [`analysis::Analyzer`] and
//! collects postings, `seal()` freezes the statistics into an
//! [`InvertedIndex`], and [`query::QueryEngine`] ranks documents for each topic
//! with a [`Similarity`]. [`run::RunWriter`] emits `trec_eval` run lines.

pub mod analysis;
pub mod config;
pub mod index;
pub mod manifest;
pub mod query;
pub mod run;
pub mod similarity;
pub mod topics;
pub mod trec;

pub use analysis::Analyzer;
pub use config::Config;
pub use error::{Error, Result};
pub use index::{DocId, DocMeta, IndexBuilder, InvertedIndex, Posting, TermId};
pub use query::{QueryEngine, ScoredDoc};
pub use similarity::Similarity;
pub use trec::{Document, TrecDocuments, TrecParser};

mod error {
    use std::path::PathBuf;

    /// Errors raised while building or querying a run.
    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("i/o error: {0}")]
        Io(#[from] std::io::Error),
        /// Reading a corpus file failed part-way; the rest of the file is skipped.
        #[error("parse failed: {0}")]
        ParseFailed(#[source] std::io::Error),
        /// A record closed without any accumulated text.
        #[error("document has no indexable content")]
        EmptyContent,
        #[error("missing required configuration key `{0}`")]
        ConfigurationMissing(&'static str),
        #[error("invalid value {value:?} for configuration key `{key}`")]
        InvalidConfiguration { key: &'static str, value: String },
        #[error("unknown similarity {0:?} (expected ORIGINAL, VA or DEFAULT)")]
        UnknownSimilarity(String),
        #[error("manifest error: {0}")]
        Manifest(#[from] serde_json::Error),
        #[error("no index set up at {}; run with setupIndex=true first", .0.display())]
        IndexNotSetUp(PathBuf),
    }

    pub type Result<T> = std::result::Result<T, Error>;
}
