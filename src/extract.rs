//! Media link extraction from task output
//!
//! Task output is schema-less; different scraping tasks put the download link
//! under different keys. [`CANDIDATES`] lists the keys in priority order, each
//! paired with the function that turns the field's value into a link.

use crate::error::{Error, Result};
use crate::types::{Extraction, ResultRecord};
use serde_json::Value;

/// Reads a link out of one field value
pub type FieldExtractor = fn(&Value) -> Option<String>;

/// Candidate fields probed on the first record, highest priority first
pub const CANDIDATES: &[(&str, FieldExtractor)] = &[
    ("video", string_or_nested_link),
    ("url", non_empty_string),
    ("downloadUrl", non_empty_string),
    ("videoUrl", non_empty_string),
    ("src", non_empty_string),
    ("play", non_empty_string),
];

/// Keys looked up inside an object-valued `video` field
const NESTED_LINK_KEYS: &[&str] = &["url", "downloadUrl", "playAddr"];

/// Select a media link from the first of `records`
///
/// Fails with [`Error::EmptyResult`] when there are no records. A record with
/// none of the candidate fields yields `video: None`, not an error.
pub fn extract_media(records: Vec<ResultRecord>) -> Result<Extraction> {
    let first = records.into_iter().next().ok_or(Error::EmptyResult)?;
    Ok(probe(first))
}

/// Probe a single record against [`CANDIDATES`]
pub fn probe(record: ResultRecord) -> Extraction {
    let hit = CANDIDATES.iter().find_map(|(key, extract)| {
        record
            .get(*key)
            .and_then(extract)
            .map(|link| (*key, link))
    });

    match hit {
        Some((field, link)) => Extraction {
            video: Some(link),
            field: Some(field),
            raw: record,
        },
        None => Extraction {
            video: None,
            field: None,
            raw: record,
        },
    }
}

fn non_empty_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn string_or_nested_link(value: &Value) -> Option<String> {
    non_empty_string(value).or_else(|| {
        let object = value.as_object()?;
        NESTED_LINK_KEYS
            .iter()
            .find_map(|key| object.get(*key).and_then(non_empty_string))
    })
}
