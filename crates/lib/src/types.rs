use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single forum conversation thread, as loaded from the source JSON export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForumThread {
    /// Unique identifier for the topic of the thread. The storage key is
    /// derived from this value, so it is the natural identity of the record.
    pub topic_id: i64,
    /// Unique identifier for the user creating the thread.
    pub user_id: i64,
    /// Title text of the forum thread.
    pub title: String,
    /// Text of the entire forum conversation thread, uncapped.
    pub conversation: String,
    /// Date and time when the thread was first created.
    pub date_created: DateTime<Utc>,
    /// Whether the thread has an accepted answer.
    pub has_accepted_answer: bool,
}

/// A typed value usable in an equality filter condition.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

/// A conjunction of field equality conditions.
///
/// This is the only filter shape the pipeline needs: every query in the
/// analysis stage restricts by one or more `field == value` conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, FilterValue)>,
}

impl Filter {
    pub fn equals(field: &str, value: impl Into<FilterValue>) -> Self {
        Self {
            conditions: vec![(field.to_string(), value.into())],
        }
    }

    pub fn and(mut self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.conditions.push((field.to_string(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, FilterValue)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// One bucket of a grouped aggregate: a distinct field value and how many
/// documents carry it. The value is kept as the service rendered it (ints and
/// bools arrive stringified).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub value: String,
    pub count: u64,
}
