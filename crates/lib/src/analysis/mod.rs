//! # Analysis & Reporting
//!
//! Aggregate queries over the enriched collection, a generative grouped
//! summary, the flat CSV export, and the offline pivot used for the heatmap.
//! The remote annotator is not schema-enforced, so every reporting step
//! validates categorical values against the registries and drops anything
//! outside them.

use crate::categories::{registry_for, CategoryRegistry};
use crate::errors::StoreError;
use crate::providers::collection::CollectionStore;
use crate::types::{Filter, GroupCount};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Page size for walking the whole collection during export.
const EXPORT_PAGE_SIZE: usize = 100;

/// The enrichment-added properties worth aggregating one by one.
pub const ANALYSIS_FIELDS: &[&str] = &[
    "technicalComplexity",
    "technicalDomain",
    "rootCauseCategory",
    "accessContext",
    "causedByOutdatedStack",
    "isDocumentationGap",
];

/// The properties written to the flat export.
pub const EXPORT_FIELDS: &[&str] = &[
    "title",
    "date_created",
    "has_accepted_answer",
    "topic_id",
    "technicalComplexity",
    "technicalDomain",
    "rootCauseCategory",
    "accessContext",
    "causedByOutdatedStack",
    "isDocumentationGap",
    "summary",
];

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Exported CSV has no '{0}' column")]
    MissingColumn(String),
}

/// Grouped count of documents per distinct value of `field`.
///
/// When the field is registry-backed, values outside the registry are
/// excluded from the result (the annotator is free-running and occasionally
/// invents labels).
pub async fn aggregate_by_field(
    store: &dyn CollectionStore,
    collection: &str,
    field: &str,
    filter: Option<&Filter>,
) -> Result<Vec<GroupCount>, AnalysisError> {
    let groups = store.aggregate_group_by(collection, field, filter).await?;
    match registry_for(field) {
        Some(registry) => Ok(filter_to_registry(groups, registry)),
        None => Ok(groups),
    }
}

/// Drops groups whose value is not a member of the registry.
pub fn filter_to_registry(
    groups: Vec<GroupCount>,
    registry: &CategoryRegistry,
) -> Vec<GroupCount> {
    let (kept, dropped): (Vec<_>, Vec<_>) = groups
        .into_iter()
        .partition(|group| registry.contains(&group.value));
    for group in &dropped {
        debug!(
            "[analysis] Dropping out-of-registry {} value '{}' ({} documents)",
            registry.field(),
            group.value,
            group.count
        );
    }
    kept
}

/// Runs a generative grouped task over the documents matching `filter`.
/// The returned text is opaque, non-deterministic model output.
pub async fn summarize_filtered(
    store: &dyn CollectionStore,
    collection: &str,
    filter: Option<&Filter>,
    limit: usize,
    task: &str,
    view_fields: &[&str],
) -> Result<String, AnalysisError> {
    Ok(store
        .generate_grouped(collection, filter, limit, task, view_fields)
        .await?)
}

/// Renders one projected property for the CSV export.
fn csv_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Streams the whole collection, projected to `fields`, into a CSV file.
/// Returns the number of exported rows.
pub async fn export_flat(
    store: &dyn CollectionStore,
    collection: &str,
    fields: &[&str],
    path: impl AsRef<Path>,
) -> Result<usize, AnalysisError> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record(fields)?;

    let mut offset = 0;
    let mut exported = 0;
    loop {
        let page = store
            .fetch_page(collection, fields, offset, EXPORT_PAGE_SIZE)
            .await?;
        let page_len = page.len();
        for object in &page {
            let row: Vec<String> = fields.iter().map(|f| csv_value(object.get(*f))).collect();
            writer.write_record(&row)?;
        }
        exported += page_len;
        offset += page_len;
        if page_len < EXPORT_PAGE_SIZE {
            break;
        }
    }
    writer.flush()?;

    info!(
        "[analysis] Exported {exported} rows to {}",
        path.as_ref().display()
    );
    Ok(exported)
}

/// Counts (row, column) value pairs from an exported CSV.
pub fn pair_counts_from_csv(
    path: impl AsRef<Path>,
    row_field: &str,
    col_field: &str,
) -> Result<HashMap<(String, String), u64>, AnalysisError> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let headers = reader.headers()?.clone();
    let row_index = headers
        .iter()
        .position(|h| h == row_field)
        .ok_or_else(|| AnalysisError::MissingColumn(row_field.to_string()))?;
    let col_index = headers
        .iter()
        .position(|h| h == col_field)
        .ok_or_else(|| AnalysisError::MissingColumn(col_field.to_string()))?;

    let mut counts: HashMap<(String, String), u64> = HashMap::new();
    for record in reader.records() {
        let record = record?;
        let row_value = record.get(row_index).unwrap_or_default().to_string();
        let col_value = record.get(col_index).unwrap_or_default().to_string();
        *counts.entry((row_value, col_value)).or_insert(0) += 1;
    }
    Ok(counts)
}

/// A complete counts matrix over two category registries, ready for heatmap
/// rendering. Every registry (row, column) pair has a cell; combinations
/// absent from the input are zero, never missing.
#[derive(Debug, Clone)]
pub struct PivotTable {
    pub row_field: String,
    pub col_field: String,
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    /// `cells[r][c]` is the count for `(rows[r], cols[c])`.
    pub cells: Vec<Vec<u64>>,
}

impl PivotTable {
    /// Looks up a cell by codes. `None` for out-of-registry codes.
    pub fn get(&self, row: &str, col: &str) -> Option<u64> {
        let r = self.rows.iter().position(|code| code == row)?;
        let c = self.cols.iter().position(|code| code == col)?;
        Some(self.cells[r][c])
    }

    /// Writes the matrix as CSV: the row field name plus one column per
    /// column code, then one line per row code.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), AnalysisError> {
        let mut writer = csv::Writer::from_path(path.as_ref())?;
        let mut header = vec![self.row_field.clone()];
        header.extend(self.cols.iter().cloned());
        writer.write_record(&header)?;
        for (row, cells) in self.rows.iter().zip(&self.cells) {
            let mut record = vec![row.clone()];
            record.extend(cells.iter().map(u64::to_string));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Reshapes pair counts into a zero-filled matrix keyed by the two
/// registries. Pairs with an out-of-registry row or column code are dropped.
pub fn pivot_report(
    pairs: &HashMap<(String, String), u64>,
    row_registry: &CategoryRegistry,
    col_registry: &CategoryRegistry,
) -> PivotTable {
    let rows: Vec<String> = row_registry.codes().map(str::to_string).collect();
    let cols: Vec<String> = col_registry.codes().map(str::to_string).collect();

    let cells = rows
        .iter()
        .map(|row| {
            cols.iter()
                .map(|col| {
                    pairs
                        .get(&(row.clone(), col.clone()))
                        .copied()
                        .unwrap_or(0)
                })
                .collect()
        })
        .collect();

    PivotTable {
        row_field: row_registry.field().to_string(),
        col_field: col_registry.field().to_string(),
        rows,
        cols,
        cells,
    }
}
