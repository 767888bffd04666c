//! # Catalog Import Commands
//!
//! Two steps, so nothing is written before the operator has seen the plan.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. preview_import(text)                                                │
//! │       parse_catalog ──► records + unreadable rows                       │
//! │       reconcile(catalog, records) ──► to_add / to_update / unchanged    │
//! │       (no writes)                                                       │
//! │                                                                         │
//! │  2. apply_import(plan)            only after the operator confirms      │
//! │       apply_batch(writes, 5 at a time, 5 s per write)                   │
//! │       ──► BatchReport { succeeded, failed[] }                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Row numbers in the preview are line numbers of the source file.

use std::collections::HashSet;

use moda_core::import::parse_catalog;
use moda_core::reconcile::{reconcile, ReconcilePlan, RowError};
use moda_core::{new_id, Product};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::batch::{apply_batch, BatchOptions, BatchProgress, BatchReport};
use crate::error::ApiResult;
use crate::navigation::{Confirmation, Outcome};
use crate::state::DbState;

/// What the operator reviews before confirming an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub plan: ReconcilePlan,
    /// Data rows read from the file, readable or not.
    pub rows_read: usize,
}

impl ImportPreview {
    pub fn summary(&self) -> String {
        format!(
            "{} new, {} changed, {} unchanged, {} with errors",
            self.plan.to_add.len(),
            self.plan.to_update.len(),
            self.plan.unchanged.len(),
            self.plan.error_count()
        )
    }
}

/// Parses a catalog file and plans the writes against the current catalog.
pub async fn preview_import(db: &DbState, text: &str) -> ApiResult<ImportPreview> {
    let parsed = parse_catalog(text);
    let existing = db.inner().products().list().await?;

    let mut plan = reconcile(&existing, &parsed.records, new_id);

    // reconcile numbers rows by record position; report source lines instead
    let mut errors: Vec<RowError> = plan
        .errors
        .drain(..)
        .map(|mut err| {
            if let Some(line) = parsed.lines.get(err.row.saturating_sub(1)) {
                err.row = *line;
            }
            err
        })
        .collect();
    errors.extend(parsed.errors.iter().cloned());
    errors.sort_by_key(|e| e.row);
    plan.errors = errors;

    let preview = ImportPreview {
        rows_read: parsed.records.len() + parsed.errors.len(),
        plan,
    };
    info!(summary = %preview.summary(), "Import previewed");
    Ok(preview)
}

/// Writes the planned products after confirmation.
///
/// Items that fail or time out are listed in the report; the others stay
/// written.
pub async fn apply_import<P>(
    db: &DbState,
    plan: &ReconcilePlan,
    options: BatchOptions,
    confirmation: Confirmation,
    on_progress: P,
) -> ApiResult<Outcome<BatchReport>>
where
    P: FnMut(BatchProgress),
{
    if !confirmation.is_confirmed() {
        return Ok(Outcome::Cancelled);
    }

    let writes = unique_writes(plan);
    let repo = db.inner().products();

    let report = apply_batch(
        writes,
        options,
        |product| {
            let repo = repo.clone();
            async move { repo.upsert(&product).await }
        },
        on_progress,
    )
    .await;

    info!(
        total = report.total,
        succeeded = report.succeeded,
        failed = report.error_count(),
        "Import applied"
    );
    Ok(Outcome::Done(report))
}

/// Planned writes with one entry per product id.
///
/// A SKU repeated in the file yields several writes for the same id, all
/// carrying the final state.
fn unique_writes(plan: &ReconcilePlan) -> Vec<Product> {
    let mut seen = HashSet::new();
    plan.writes()
        .filter(|p| seen.insert(p.id.clone()))
        .cloned()
        .collect()
}
