//! TREC run files: `topicId Q0 docno rank score runTag`.

use crate::index::InvertedIndex;
use crate::query::ScoredDoc;
use crate::Result;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// One run line. Rank is 1-based; the score keeps six decimals.
pub fn format_line(topic: &str, docno: &str, rank: usize, score: f32, tag: &str) -> String {
    format!("{topic} Q0 {docno} {rank} {score:.6} {tag}")
}

/// Appends ranked results topic by topic.
///
/// Creating a writer deletes any previous file at the same path. Each topic
/// is flushed before `write_topic` returns, so an aborted run keeps every
/// completed topic.
pub struct RunWriter {
    path: PathBuf,
    tag: String,
}

impl RunWriter {
    pub fn create<P: AsRef<Path>>(path: P, tag: impl Into<String>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        match fs::remove_file(&path) {
            Ok(()) => tracing::info!(path = %path.display(), "removed previous run file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        Ok(Self { path, tag: tag.into() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the ranked `hits` for `topic`. Returns the number of lines written.
    pub fn write_topic(&mut self, topic: &str, hits: &[ScoredDoc], index: &InvertedIndex) -> Result<usize> {
        let f = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut out = BufWriter::new(f);
        for (i, hit) in hits.iter().enumerate() {
            let line = format_line(topic, &index.docno(hit.doc_id), i + 1, hit.score, &self.tag);
            tracing::debug!("{line}");
            writeln!(out, "{line}")?;
        }
        out.flush()?;
        Ok(hits.len())
    }
}
