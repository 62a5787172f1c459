use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"(?u)[\p{L}\p{N}][\p{L}\p{N}_']*").expect("valid regex");
    // SGML comments (<!-- PJG FTAG 4702 -->), tags (<DOC>, </TEXT>, <F P=102>) and
    // entities (&amp;, &hyph;). A tag never spans lines, so a stray `<` in text stays text.
    static ref MARKUP: Regex =
        Regex::new(r"<!--.*?-->|</?[A-Za-z][^<>\n]*>|&[A-Za-z0-9#]+;").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","an","and","are","as","at","be","but","by","for","if","in","into","is","it",
            "no","not","of","on","or","such","that","the","their","then","there","these",
            "they","this","to","was","will","with",
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Text → term normalization shared by indexing and querying.
///
/// Scores are only meaningful when documents and queries go through the same
/// `Analyzer`, so the index keeps a copy of the one it was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Analyzer {
    /// Drop SGML tags and entities before splitting words.
    pub strip_markup: bool,
    pub stopwords: bool,
    pub stem: bool,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self { strip_markup: true, stopwords: true, stem: false }
    }
}

impl Analyzer {
    /// Tokenize text using NFKC normalization, lowercase, optional stopword removal and stemming.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let stripped;
        let text = if self.strip_markup {
            stripped = MARKUP.replace_all(text, " ");
            stripped.as_ref()
        } else {
            text
        };
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        let mut tokens = Vec::new();
        for mat in WORD.find_iter(&normalized) {
            let token = mat.as_str().trim_end_matches('\'');
            if token.is_empty() || (self.stopwords && is_stopword(token)) { continue; }
            if self.stem {
                tokens.push(STEMMER.stem(token).into_owned());
            } else {
                tokens.push(token.to_string());
            }
        }
        tokens
    }
}
