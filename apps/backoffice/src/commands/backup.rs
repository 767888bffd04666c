//! # Backup Commands
//!
//! Export, restore and reset of the whole workspace.
//!
//! ## Restore Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  file text                                                              │
//! │     │  BackupDocument::parse   (JSON + "ModaGestão AI" signature)       │
//! │     ▼                                                                   │
//! │  signature ok? ── no ──► VALIDATION_ERROR, nothing touched              │
//! │     │ yes                                                               │
//! │     ▼                                                                   │
//! │  operator confirms? ── no ──► Cancelled, nothing touched                │
//! │     │ yes                                                               │
//! │     ▼                                                                   │
//! │  audit products (negative stock → 0) and sales ──► warn! per issue      │
//! │     ▼                                                                   │
//! │  workspace().replace_all()   one transaction                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use moda_core::backup::{backup_file_name, BackupDocument};
use moda_core::validation::validate_reset_confirmation;
use moda_db::WorkspaceCounts;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::commands::cart::clear_cart;
use crate::error::{ApiError, ApiResult};
use crate::navigation::{Confirmation, Outcome};
use crate::state::{CartState, DbState};

/// A backup ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupExport {
    pub file_name: String,
    pub json: String,
    pub counts: WorkspaceCounts,
}

/// What a restore wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub counts: WorkspaceCounts,
    /// Sales whose stored figures were corrected while loading.
    pub corrected_sales: usize,
    /// Products whose oversold stock was loaded as 0.
    pub corrected_products: usize,
}

/// Serializes every collection into a signed backup document.
pub async fn export_backup(db: &DbState, now: DateTime<Utc>) -> ApiResult<BackupExport> {
    let products = db.inner().products().list().await?;
    let customers = db.inner().customers().list().await?;
    let sales = db.inner().sales().list().await?;

    let counts = WorkspaceCounts {
        products: products.len() as i64,
        customers: customers.len() as i64,
        sales: sales.len() as i64,
    };

    let json = BackupDocument::new(products, customers, &sales, now).to_json()?;
    let file_name = backup_file_name(now.date_naive());

    info!(file_name = %file_name, ?counts, "Backup exported");
    Ok(BackupExport {
        file_name,
        json,
        counts,
    })
}

/// Exports and writes the backup into `dir`.
pub async fn write_backup(db: &DbState, dir: &Path, now: DateTime<Utc>) -> ApiResult<PathBuf> {
    let export = export_backup(db, now).await?;
    let path = dir.join(&export.file_name);

    let written = match tokio::fs::create_dir_all(dir).await {
        Ok(()) => tokio::fs::write(&path, export.json.as_bytes()).await,
        Err(e) => Err(e),
    };
    written.map_err(|e| {
        ApiError::internal(format!("Could not write backup to {}: {}", path.display(), e))
    })?;

    info!(path = %path.display(), "Backup written");
    Ok(path)
}

/// Replaces the whole workspace with the contents of a backup file.
///
/// The file is checked before the confirmation is consulted, so a foreign
/// file is reported even when the operator would have declined.
pub async fn restore_backup(
    db: &DbState,
    text: &str,
    confirmation: Confirmation,
) -> ApiResult<Outcome<RestoreReport>> {
    let document = BackupDocument::parse(text)?;

    if !confirmation.is_confirmed() {
        return Ok(Outcome::Cancelled);
    }

    let restore = document.into_restore_set()?;
    for (product_id, issue) in &restore.product_issues {
        warn!(product_id = %product_id, issue = %issue, "Corrected product while restoring");
    }
    for (sale_id, issue) in &restore.issues {
        warn!(sale_id = %sale_id, issue = %issue, "Corrected sale while restoring");
    }

    let mut corrected: Vec<&str> = restore.issues.iter().map(|(id, _)| id.as_str()).collect();
    corrected.sort_unstable();
    corrected.dedup();

    let counts = db
        .inner()
        .workspace()
        .replace_all(&restore.products, &restore.customers, &restore.sales)
        .await?;

    info!(
        ?counts,
        corrected_sales = corrected.len(),
        corrected_products = restore.product_issues.len(),
        "Backup restored"
    );
    Ok(Outcome::Done(RestoreReport {
        counts,
        corrected_sales: corrected.len(),
        corrected_products: restore.product_issues.len(),
    }))
}

/// Deletes every product, customer and sale.
///
/// Needs both the confirmation and the typed word `DELETAR`. The open cart
/// is emptied too.
pub async fn reset_workspace(
    db: &DbState,
    cart: &CartState,
    typed_word: &str,
    confirmation: Confirmation,
) -> ApiResult<Outcome<()>> {
    if !confirmation.is_confirmed() {
        return Ok(Outcome::Cancelled);
    }
    validate_reset_confirmation(typed_word)?;

    db.inner().workspace().clear_all().await?;
    clear_cart(cart);

    warn!("Workspace reset, all data deleted");
    Ok(Outcome::Done(()))
}
