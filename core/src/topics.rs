//! TREC topic files (`<num> Number: 401` / `<title> foreign minorities`).

use crate::Result;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const NUM_PREFIX: &str = "<num> Number:";
const TITLE_PREFIX: &str = "<title>";

/// Topic id → query text, iterated in ascending id order.
pub type Topics = BTreeMap<String, String>;

/// Scan topic lines. A `<num>` line sets the current id, the next `<title>`
/// line commits `(id, title)`. Everything else is ignored.
pub fn parse_topics<R: BufRead>(reader: R) -> Result<Topics> {
    let mut topics = Topics::new();
    let mut number = String::from("default");
    for line in reader.lines() {
        let line = line?;
        if let Some(rest) = line.strip_prefix(NUM_PREFIX) {
            number = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix(TITLE_PREFIX) {
            topics.insert(number.clone(), rest.trim().to_string());
        }
    }
    Ok(topics)
}

pub fn load_topics<P: AsRef<Path>>(path: P) -> Result<Topics> {
    let f = File::open(path.as_ref())?;
    let topics = parse_topics(BufReader::new(f))?;
    tracing::info!(path = %path.as_ref().display(), num_topics = topics.len(), "loaded topics");
    Ok(topics)
}
