use criterion::{criterion_group, criterion_main, Criterion};
use std::io::Cursor;
use trecrun_core::{Analyzer, IndexBuilder, QueryEngine, Similarity, TrecDocuments};

const WORDS: &[&str] = &[
    "orange", "citrus", "fruit", "grown", "arizona", "valencia", "federal", "register",
    "regulation", "marketing", "order", "handler", "shipment", "grade", "size", "season",
];

fn corpus(num_docs: usize) -> String {
    let mut out = String::new();
    for i in 0..num_docs {
        out.push_str(&format!("<DOC>\n<DOCNO> FR{i:06} </DOCNO>\n<TEXT>\n"));
        for j in 0..(20 + i % 80) {
            out.push_str(WORDS[(i * 7 + j * 13) % WORDS.len()]);
            out.push(' ');
        }
        out.push_str("\n</TEXT>\n</DOC>\n");
    }
    out
}

fn bench_tokenize(c: &mut Criterion) {
    let text = corpus(50);
    let analyzer = Analyzer::default();
    c.bench_function("tokenize_corpus", |b| b.iter(|| analyzer.tokenize(&text)));
}

fn bench_search(c: &mut Criterion) {
    let text = corpus(5_000);
    let mut builder = IndexBuilder::new(Analyzer::default());
    for doc in TrecDocuments::new(Cursor::new(text.into_bytes())) {
        builder.add(doc.expect("in-memory corpus")).expect("non-empty record");
    }
    let index = builder.seal();
    let engine = QueryEngine::new(&index, Similarity::default());
    c.bench_function("search_top1000", |b| b.iter(|| engine.search_text("valencia oranges grown in arizona", 1000)));
}

criterion_group!(benches, bench_tokenize, bench_search);
criterion_main!(benches);
