use crate::index::InvertedIndex;
use crate::similarity::SimilarityKind;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

pub const MANIFEST_VERSION: u32 = 1;

/// Summary of an index setup, written to `meta.json`. The postings
/// themselves are rebuilt every run and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub num_docs: u32,
    pub num_terms: usize,
    pub avg_doc_len: f32,
    pub similarity: String,
    /// Hex FNV-1a fingerprint of the sealed index.
    pub fingerprint: String,
    pub created_at: String,
    pub version: u32,
}

impl IndexManifest {
    pub fn describe(index: &InvertedIndex, similarity: SimilarityKind) -> Self {
        Self {
            num_docs: index.document_count(),
            num_terms: index.num_terms(),
            avg_doc_len: index.average_document_length(),
            similarity: similarity.to_string(),
            fingerprint: format!("{:016x}", index.fingerprint()),
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            version: MANIFEST_VERSION,
        }
    }

    /// Same corpus statistics, ignoring when each was written.
    pub fn matches(&self, other: &IndexManifest) -> bool {
        self.fingerprint == other.fingerprint && self.num_docs == other.num_docs && self.similarity == other.similarity
    }
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

pub fn save_manifest(paths: &IndexPaths, manifest: &IndexManifest) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(manifest)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

/// Fails with [`Error::IndexNotSetUp`] when no manifest exists yet.
pub fn load_manifest(paths: &IndexPaths) -> Result<IndexManifest> {
    let mut f = match File::open(paths.meta()) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::IndexNotSetUp(paths.root.clone())),
        Err(e) => return Err(e.into()),
    };
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let manifest: IndexManifest = serde_json::from_str(&buf)?;
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analyzer;
    use crate::index::IndexBuilder;
    use crate::trec::Document;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path().join("VA"));
        let mut b = IndexBuilder::new(Analyzer::default());
        b.add(Document::new("A1", "orange citrus fruit")).unwrap();
        let manifest = IndexManifest::describe(&b.seal(), SimilarityKind::Va);

        save_manifest(&paths, &manifest).unwrap();
        let loaded = load_manifest(&paths).unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.num_docs, 1);
        assert_eq!(loaded.num_terms, 3);
        assert_eq!(loaded.similarity, "VA");
        assert_eq!(loaded.fingerprint.len(), 16);
    }

    #[test]
    fn missing_manifest_means_not_set_up() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_manifest(&IndexPaths::new(dir.path())).unwrap_err();
        assert!(matches!(err, Error::IndexNotSetUp(_)));
    }

    #[test]
    fn matches_ignores_timestamp() {
        let ix = IndexBuilder::new(Analyzer::default()).seal();
        let a = IndexManifest::describe(&ix, SimilarityKind::Default);
        let mut b = a.clone();
        b.created_at = "1970-01-01T00:00:00Z".into();
        assert!(a.matches(&b));
        b.fingerprint = "0".into();
        assert!(!a.matches(&b));
    }
}
