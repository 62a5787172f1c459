use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use trecrun_core::manifest::{load_manifest, save_manifest, IndexManifest, IndexPaths};
use trecrun_core::run::RunWriter;
use trecrun_core::topics::load_topics;
use trecrun_core::{Analyzer, Config, Error, IndexBuilder, InvertedIndex, QueryEngine, TrecDocuments};
use walkdir::WalkDir;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub indexed: usize,
    /// Records rejected for having no content.
    pub skipped: usize,
    /// Records cut off by end of file.
    pub truncated: usize,
}

impl IngestStats {
    fn absorb(&mut self, other: IngestStats) {
        self.indexed += other.indexed;
        self.skipped += other.skipped;
        self.truncated += other.truncated;
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub num_docs: u32,
    pub num_topics: usize,
    pub lines_written: usize,
    pub results: PathBuf,
    pub ingest: IngestStats,
}

/// All corpus files under `root`, sorted by path so document ids are stable
/// between runs. Unreadable entries are skipped.
pub fn discover_files(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.is_dir() {
        return Err(anyhow!("corpus path {} does not exist", root.display()));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(e) if e.file_type().is_file() => files.push(e.into_path()),
            Ok(_) => {}
            Err(err) => tracing::warn!(%err, "skipping unreadable corpus entry"),
        }
    }
    Ok(files)
}

/// Parse one TREC file into `builder`.
pub fn index_file(builder: &mut IndexBuilder, path: &Path) -> Result<IngestStats> {
    let mut stats = IngestStats::default();
    let mut docs = TrecDocuments::open(path)?;
    for doc in docs.by_ref() {
        let doc = doc.with_context(|| format!("reading {}", path.display()))?;
        let docno = doc.docno.clone();
        match builder.add(doc) {
            Ok(_) => stats.indexed += 1,
            Err(Error::EmptyContent) => {
                tracing::warn!(?docno, path = %path.display(), "skipping record without content");
                stats.skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
    stats.truncated = docs.truncated();
    if stats.truncated > 0 {
        tracing::warn!(path = %path.display(), truncated = stats.truncated, "unterminated record discarded");
    }
    Ok(stats)
}

fn index_partition(files: &[PathBuf], analyzer: Analyzer) -> Result<(IndexBuilder, IngestStats)> {
    let mut builder = IndexBuilder::new(analyzer);
    let mut stats = IngestStats::default();
    for file in files {
        stats.absorb(index_file(&mut builder, file)?);
    }
    Ok((builder, stats))
}

/// Index `files` in `threads` contiguous partitions and merge them in
/// order, so ids match a single-threaded build.
pub fn build_index(files: &[PathBuf], analyzer: Analyzer, threads: usize) -> Result<(InvertedIndex, IngestStats)> {
    let threads = threads.clamp(1, files.len().max(1));
    if threads == 1 {
        let (builder, stats) = index_partition(files, analyzer)?;
        return Ok((builder.seal(), stats));
    }

    let chunk = files.len().div_ceil(threads);
    let partials: Vec<Result<(IndexBuilder, IngestStats)>> = std::thread::scope(|s| {
        let handles: Vec<_> = files
            .chunks(chunk)
            .map(|part| s.spawn(move || index_partition(part, analyzer)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| Err(anyhow!("indexing thread panicked"))))
            .collect()
    });

    let mut merged = IndexBuilder::new(analyzer);
    let mut stats = IngestStats::default();
    for partial in partials {
        let (builder, partial_stats) = partial?;
        merged.merge(builder);
        stats.absorb(partial_stats);
    }
    tracing::info!(partitions = threads, num_docs = merged.num_docs(), "merged partial indexes");
    Ok((merged.seal(), stats))
}

/// The whole batch job: index the corpus, search every topic, write the run.
pub fn run(config: &Config) -> Result<RunSummary> {
    config.validate()?;
    let paths = IndexPaths::new(config.index_dir());
    let previous = if config.setup_index { None } else { Some(load_manifest(&paths)?) };

    let topics = load_topics(&config.topics)
        .with_context(|| format!("reading topics from {}", config.topics.display()))?;

    let files = discover_files(&config.docs)?;
    tracing::info!(num_files = files.len(), docs = %config.docs.display(), "indexing corpus");
    let (index, ingest) = build_index(&files, config.analyzer, config.threads)?;
    tracing::info!(indexed = ingest.indexed, skipped = ingest.skipped, truncated = ingest.truncated, "ingested documents");

    let manifest = IndexManifest::describe(&index, config.similarity);
    match previous {
        None => {
            save_manifest(&paths, &manifest)?;
            tracing::info!(path = %paths.meta().display(), fingerprint = %manifest.fingerprint, "index set up");
        }
        Some(previous) if !previous.matches(&manifest) => {
            tracing::warn!(
                recorded = %previous.fingerprint,
                rebuilt = %manifest.fingerprint,
                "corpus changed since the index was set up"
            );
        }
        Some(_) => {}
    }

    let similarity = config.similarity();
    tracing::info!(?similarity, hits = config.hits, "searching topics");
    let engine = QueryEngine::new(&index, similarity);
    let mut writer = RunWriter::create(config.results_path(), config.run_tag())?;
    let mut lines_written = 0;
    for (topic, query) in &topics {
        let hits = engine.search_text(query, config.hits);
        tracing::info!(%topic, %query, hits = hits.len(), "searched topic");
        lines_written += writer.write_topic(topic, &hits, &index)?;
    }

    tracing::info!(results = %writer.path().display(), lines_written, "run complete");
    Ok(RunSummary {
        num_docs: index.document_count(),
        num_topics: topics.len(),
        lines_written,
        results: writer.path().to_path_buf(),
        ingest,
    })
}
