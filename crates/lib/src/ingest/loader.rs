//! # Document Loader
//!
//! Reads the forum-thread export (a JSON array) from disk and parses each
//! record into a [`ForumThread`], converting `date_created` from its ISO-8601
//! string into a UTC timestamp. A malformed record fails the run, naming the
//! offending `topic_id` where it can be recovered.

use crate::types::ForumThread;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read input file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Input file is not a JSON array of threads: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Record {index} (topic_id {topic_id:?}) is malformed: {message}")]
    Record {
        index: usize,
        topic_id: Option<i64>,
        message: String,
    },
    #[error("Record with topic_id {topic_id:?} has an unparseable date_created '{value}'")]
    Timestamp {
        topic_id: Option<i64>,
        value: String,
    },
}

/// The on-disk record shape, before timestamp parsing.
#[derive(Deserialize, Debug)]
struct RawThread {
    topic_id: i64,
    user_id: i64,
    title: String,
    conversation: String,
    date_created: String,
    has_accepted_answer: bool,
}

/// Parses an ISO-8601 timestamp, with or without an explicit offset.
/// Offset-less values are taken as UTC, matching the source export.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Loads forum threads from a JSON array file.
///
/// `limit` truncates the input after the first N records, mirroring the
/// original scripts' test runs over a slice of the export.
pub fn load_threads(
    path: impl AsRef<Path>,
    limit: Option<usize>,
) -> Result<Vec<ForumThread>, LoadError> {
    let contents = fs::read_to_string(path.as_ref())?;
    let mut records: Vec<Value> = serde_json::from_str(&contents)?;
    if let Some(limit) = limit {
        records.truncate(limit);
    }

    let mut threads = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let topic_id = record.get("topic_id").and_then(Value::as_i64);
        let raw: RawThread =
            serde_json::from_value(record).map_err(|e| LoadError::Record {
                index,
                topic_id,
                message: e.to_string(),
            })?;
        let date_created =
            parse_timestamp(&raw.date_created).ok_or_else(|| LoadError::Timestamp {
                topic_id,
                value: raw.date_created.clone(),
            })?;
        threads.push(ForumThread {
            topic_id: raw.topic_id,
            user_id: raw.user_id,
            title: raw.title,
            conversation: raw.conversation,
            date_created,
            has_accepted_answer: raw.has_accepted_answer,
        });
    }

    info!(
        "[loader] Loaded {} threads from {}",
        threads.len(),
        path.as_ref().display()
    );
    Ok(threads)
}
