//! # Dashboard Commands
//!
//! Receivables figures and the overdue list.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Receita total   │  Recebido      │  A receber     │  Parcelas vencidas │
//! │  totalRevenue    │  totalPaid     │  totalReceivable│ overdueCount      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │  Overdue list (oldest due date first)                                   │
//! │  Ana      parcela 2/3   vence 2024-03-01   R$60.00                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! With nothing registered yet the dashboard shows onboarding instead.

use chrono::{Local, NaiveDate};
use moda_core::ledger::{compute_summary, overdue_installments, LedgerSummary, OverdueEntry};
use moda_db::migrations::migration_status;
use moda_db::WorkspaceCounts;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ApiResult;
use crate::state::DbState;

/// Everything the dashboard screen renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub today: NaiveDate,
    pub summary: LedgerSummary,
    pub overdue: Vec<OverdueEntry>,
    pub counts: WorkspaceCounts,
    /// True when the workspace is empty and onboarding should show.
    pub onboarding: bool,
}

/// Local calendar date used for overdue checks.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Dashboard as of `today`.
pub async fn dashboard(db: &DbState, today: NaiveDate) -> ApiResult<DashboardView> {
    debug!(%today, "dashboard command");

    let counts = db.inner().workspace().counts().await?;
    let sales = db.inner().sales().list().await?;

    Ok(DashboardView {
        today,
        summary: compute_summary(&sales, today),
        overdue: overdue_installments(&sales, today),
        onboarding: counts.is_empty(),
        counts,
    })
}

pub async fn ledger_summary(db: &DbState, today: NaiveDate) -> ApiResult<LedgerSummary> {
    let sales = db.inner().sales().list().await?;
    Ok(compute_summary(&sales, today))
}

pub async fn overdue(db: &DbState, today: NaiveDate) -> ApiResult<Vec<OverdueEntry>> {
    let sales = db.inner().sales().list().await?;
    Ok(overdue_installments(&sales, today))
}

pub async fn workspace_counts(db: &DbState) -> ApiResult<WorkspaceCounts> {
    Ok(db.inner().workspace().counts().await?)
}

/// State of the store as shown on the diagnostics screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub healthy: bool,
    pub migrations_known: usize,
    pub migrations_applied: usize,
    pub counts: WorkspaceCounts,
}

pub async fn diagnostics(db: &DbState) -> ApiResult<Diagnostics> {
    let healthy = db.inner().health_check().await;
    if !healthy {
        warn!("Store failed its health check");
    }

    let (known, applied) = migration_status(db.inner().pool()).await?;
    Ok(Diagnostics {
        healthy,
        migrations_known: known,
        migrations_applied: applied,
        counts: workspace_counts(db).await?,
    })
}
