//! Run configuration.
//!
//! Loaded from a Java-style properties file (`key=value` or `key: value`,
//! `#`/`!` comments) and passed explicitly to every component.

use crate::analysis::Analyzer;
use crate::query::DEFAULT_HITS;
use crate::similarity::{Similarity, SimilarityKind};
use crate::{Error, Result};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    /// Corpus root: a TREC file or a directory tree of them.
    pub docs: PathBuf,
    /// Topic file.
    pub topics: PathBuf,
    /// Root under which each similarity keeps its index manifest.
    pub index: PathBuf,
    /// Build (and record) the index this run instead of requiring a previous setup.
    pub setup_index: bool,
    pub similarity: SimilarityKind,
    pub k1: Option<f32>,
    pub b: Option<f32>,
    /// Ranked documents written per topic.
    pub hits: usize,
    pub run_tag: Option<String>,
    pub results: Option<PathBuf>,
    /// Corpus partitions indexed in parallel.
    pub threads: usize,
    pub analyzer: Analyzer,
}

impl Config {
    pub fn new(docs: impl Into<PathBuf>, topics: impl Into<PathBuf>, index: impl Into<PathBuf>) -> Self {
        Self {
            docs: docs.into(),
            topics: topics.into(),
            index: index.into(),
            setup_index: true,
            similarity: SimilarityKind::default(),
            k1: None,
            b: None,
            hits: DEFAULT_HITS,
            run_tag: None,
            results: None,
            threads: 1,
            analyzer: Analyzer::default(),
        }
    }

    /// Read the properties file at `path`, then apply `overrides` on top.
    ///
    /// A missing file is only an error when the overrides do not supply the
    /// required keys themselves.
    pub fn load<P: AsRef<Path>>(path: P, overrides: &[(&str, String)]) -> Result<Self> {
        let path = path.as_ref();
        let mut props = match std::fs::read_to_string(path) {
            Ok(text) => parse_properties(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(config = %path.display(), "configuration file not found, using flags only");
                HashMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        for (key, value) in overrides {
            props.insert(key.to_string(), value.clone());
        }
        let config = Self::from_properties(&props)?;
        tracing::debug!(path = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }

    pub fn from_properties(props: &HashMap<String, String>) -> Result<Self> {
        let required = |key: &'static str| props.get(key).filter(|v| !v.is_empty()).ok_or(Error::ConfigurationMissing(key));
        let mut config = Config::new(required("docs")?, required("topics")?, required("index")?);

        if let Some(v) = props.get("setupIndex") {
            config.setup_index = parse_bool("setupIndex", v)?;
        }
        if let Some(v) = props.get("similarity") {
            config.similarity = v.parse()?;
        }
        if let Some(v) = props.get("k1") {
            config.k1 = Some(parse_value("k1", v)?);
        }
        if let Some(v) = props.get("b") {
            config.b = Some(parse_value("b", v)?);
        }
        if let Some(v) = props.get("hits") {
            config.hits = parse_value("hits", v)?;
        }
        if let Some(v) = props.get("runTag") {
            config.run_tag = Some(v.clone());
        }
        if let Some(v) = props.get("results") {
            config.results = Some(PathBuf::from(v));
        }
        if let Some(v) = props.get("threads") {
            config.threads = parse_value("threads", v)?;
        }
        if let Some(v) = props.get("stem") {
            config.analyzer.stem = parse_bool("stem", v)?;
        }
        if let Some(v) = props.get("stopwords") {
            config.analyzer.stopwords = parse_bool("stopwords", v)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break scoring or ranking.
    pub fn validate(&self) -> Result<()> {
        if let Some(k1) = self.k1 {
            if !(k1.is_finite() && k1 >= 0.0) {
                return Err(Error::InvalidConfiguration { key: "k1", value: k1.to_string() });
            }
        }
        if let Some(b) = self.b {
            if !(0.0..=1.0).contains(&b) {
                return Err(Error::InvalidConfiguration { key: "b", value: b.to_string() });
            }
        }
        if self.hits == 0 {
            return Err(Error::InvalidConfiguration { key: "hits", value: "0".into() });
        }
        if self.threads == 0 {
            return Err(Error::InvalidConfiguration { key: "threads", value: "0".into() });
        }
        Ok(())
    }

    /// Selected variant with any `k1`/`b` overrides applied.
    pub fn similarity(&self) -> Similarity {
        let mut sim = Similarity::from(self.similarity);
        if let Some(k1) = self.k1 {
            sim = sim.with_k1(k1);
        }
        if let Some(b) = self.b {
            sim = sim.with_b(b);
        }
        sim
    }

    /// Each variant keeps its own index directory.
    pub fn index_dir(&self) -> PathBuf {
        self.index.join(self.similarity.as_str())
    }

    pub fn run_tag(&self) -> String {
        self.run_tag.clone().unwrap_or_else(|| format!("grp2-{}", self.similarity))
    }

    pub fn results_path(&self) -> PathBuf {
        self.results.clone().unwrap_or_else(|| PathBuf::from(format!("resultsFile{}", self.similarity)))
    }
}

/// Parse `key=value` / `key: value` lines. Later keys win.
pub fn parse_properties(text: &str) -> HashMap<String, String> {
    let mut props = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let (key, value) = match line.find(&['=', ':'][..]) {
            Some(i) => (&line[..i], &line[i + 1..]),
            None => (line, ""),
        };
        props.insert(key.trim().to_string(), value.trim().to_string());
    }
    props
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(Error::InvalidConfiguration { key, value: value.to_string() }),
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| Error::InvalidConfiguration { key, value: value.to_string() })
}
