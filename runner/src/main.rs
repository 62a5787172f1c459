use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use trecrun_core::Config;

#[derive(Parser)]
#[command(name = "trecrun")]
#[command(about = "Index a TREC collection and write a BM25 run for a topic set", long_about = None)]
struct Args {
    /// Properties file with docs, topics, index, setupIndex and similarity keys
    #[arg(long, default_value = "config.properties")]
    config: String,
    /// Corpus root (file or directory)
    #[arg(long)]
    docs: Option<String>,
    /// Topic file
    #[arg(long)]
    topics: Option<String>,
    /// Index root; each similarity gets its own subdirectory
    #[arg(long)]
    index: Option<String>,
    /// Rebuild and record the index this run
    #[arg(long)]
    setup_index: Option<bool>,
    /// ORIGINAL, VA or DEFAULT
    #[arg(long)]
    similarity: Option<String>,
    #[arg(long)]
    k1: Option<f32>,
    #[arg(long)]
    b: Option<f32>,
    /// Hits written per topic
    #[arg(long)]
    hits: Option<usize>,
    /// Number of corpus partitions indexed in parallel
    #[arg(long)]
    threads: Option<usize>,
    #[arg(long)]
    run_tag: Option<String>,
    /// Output run file
    #[arg(long)]
    results: Option<String>,
}

impl Args {
    /// Flags override keys from the properties file.
    fn overrides(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        let mut set = |key: &'static str, value: Option<String>| {
            if let Some(v) = value {
                out.push((key, v));
            }
        };
        set("docs", self.docs.clone());
        set("topics", self.topics.clone());
        set("index", self.index.clone());
        set("setupIndex", self.setup_index.map(|v| v.to_string()));
        set("similarity", self.similarity.clone());
        set("k1", self.k1.map(|v| v.to_string()));
        set("b", self.b.map(|v| v.to_string()));
        set("hits", self.hits.map(|v| v.to_string()));
        set("threads", self.threads.map(|v| v.to_string()));
        set("runTag", self.run_tag.clone());
        set("results", self.results.clone());
        out
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = Config::load(&args.config, &args.overrides())
        .with_context(|| format!("loading configuration from {}", args.config))?;

    let summary = trecrun::run(&config)?;
    tracing::info!(
        num_docs = summary.num_docs,
        num_topics = summary.num_topics,
        lines = summary.lines_written,
        results = %summary.results.display(),
        "done"
    );
    Ok(())
}
