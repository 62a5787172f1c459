//! Streaming reader for TREC `<DOC>` … `</DOC>` records.
//!
//! [`TrecParser`] is the line-level state machine and knows nothing about
//! I/O. [`TrecDocuments`] drives it from any [`BufRead`] and yields one
//! [`Document`] per closed record.

use crate::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

const DOC_OPEN: &str = "<DOC>";
const DOC_CLOSE: &str = "</DOC>";

lazy_static! {
    static ref DOCNO: Regex = Regex::new(r"<DOCNO>\s*(\S+)\s*<").expect("valid regex");
}

/// One raw record. `content` is the verbatim record text, markers included;
/// tokenization happens in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub docno: Option<String>,
    pub content: String,
}

impl Document {
    pub fn new(docno: impl Into<String>, content: impl Into<String>) -> Self {
        Self { docno: Some(docno.into()), content: content.into() }
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }
}

#[derive(Debug, Default)]
enum State {
    #[default]
    OutsideDoc,
    InsideDoc { buf: String, docno: Option<String> },
}

/// Two-state machine: feed it lines, get back completed records.
#[derive(Debug, Default)]
pub struct TrecParser {
    state: State,
}

impl TrecParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_doc(&self) -> bool {
        matches!(self.state, State::InsideDoc { .. })
    }

    /// Consume one line (without its terminator). Returns the record when
    /// this line closes it.
    pub fn feed(&mut self, line: &str) -> Option<Document> {
        match &mut self.state {
            State::OutsideDoc => {
                if line.starts_with(DOC_OPEN) {
                    let mut buf = String::new();
                    let docno = extract_docno(line);
                    buf.push_str(line);
                    self.state = State::InsideDoc { buf, docno };
                }
                None
            }
            State::InsideDoc { buf, docno } => {
                if !buf.is_empty() {
                    buf.push('\n');
                }
                buf.push_str(line);
                if line.starts_with(DOC_CLOSE) {
                    let State::InsideDoc { buf, docno } = std::mem::take(&mut self.state) else {
                        unreachable!("state checked above");
                    };
                    return Some(Document { docno, content: buf });
                }
                if docno.is_none() {
                    *docno = extract_docno(line);
                }
                None
            }
        }
    }

    /// Signal end of input. Returns `true` when an unterminated record was
    /// dropped.
    pub fn finish(&mut self) -> bool {
        matches!(std::mem::take(&mut self.state), State::InsideDoc { .. })
    }
}

fn extract_docno(line: &str) -> Option<String> {
    DOCNO.captures(line).map(|c| c[1].to_string())
}

/// Lazy, single-pass iterator of documents read from `R`.
///
/// An I/O error is reported once as [`Error::ParseFailed`] and ends the
/// iteration. Bytes that are not valid UTF-8 are replaced rather than
/// failing the file.
pub struct TrecDocuments<R> {
    reader: R,
    parser: TrecParser,
    line: Vec<u8>,
    done: bool,
    truncated: usize,
}

impl TrecDocuments<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "reading corpus file");
        Ok(Self::new(BufReader::new(f)))
    }
}

impl<R: BufRead> TrecDocuments<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, parser: TrecParser::new(), line: Vec::new(), done: false, truncated: 0 }
    }

    /// Number of records discarded because input ended before `</DOC>`.
    pub fn truncated(&self) -> usize {
        self.truncated
    }
}

impl<R: BufRead> Iterator for TrecDocuments<R> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => {
                    self.done = true;
                    if self.parser.finish() {
                        self.truncated += 1;
                        tracing::debug!("discarding record without closing {DOC_CLOSE}");
                    }
                }
                Ok(_) => {
                    let mut end = self.line.len();
                    while end > 0 && matches!(self.line[end - 1], b'\n' | b'\r') {
                        end -= 1;
                    }
                    let line = String::from_utf8_lossy(&self.line[..end]);
                    if let Some(doc) = self.parser.feed(&line) {
                        return Some(Ok(doc));
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(Error::ParseFailed(e)));
                }
            }
        }
        None
    }
}

impl<R: BufRead> std::iter::FusedIterator for TrecDocuments<R> {}
