//! # Batch Apply
//!
//! Writes a list of catalog records with bounded fan-out and a per-item
//! timeout.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items: [p1 p2 p3 p4 p5 | p6 p7 p8 p9 p10 | p11 p12]   concurrency = 5   │
//! │           └── chunk 1 ──┘  └──── chunk 2 ──┘  └chunk 3┘                  │
//! │                                                                         │
//! │  each write ── race ── tokio::time::timeout(item_timeout)               │
//! │     Ok      → succeeded += 1                                            │
//! │     Err / ⏱ → failed.push(FailedItem { sku, reason })                   │
//! │                                                                         │
//! │  after every chunk → on_progress(processed, total)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed item never stops the batch and never undoes the writes that
//! already landed. A timed-out write is abandoned; it may still complete
//! in the store.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use futures_util::future::join_all;
use moda_core::Product;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Fan-out and timeout for one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Writes in flight at once; 0 is treated as 1.
    pub concurrency: usize,
    pub item_timeout: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            concurrency: 5,
            item_timeout: Duration::from_secs(5),
        }
    }
}

/// Progress reported after each chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub processed: usize,
    pub total: usize,
}

/// A record that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedItem {
    pub sku: String,
    pub reason: String,
}

/// Aggregate result of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: Vec<FailedItem>,
}

impl BatchReport {
    pub fn error_count(&self) -> usize {
        self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// One line for the operator.
    pub fn summary(&self) -> String {
        if self.failed.is_empty() {
            format!("{} items saved", self.succeeded)
        } else {
            format!(
                "{} items saved, {} items failed; check details",
                self.succeeded,
                self.failed.len()
            )
        }
    }
}

/// Writes every item with `write`, `options.concurrency` at a time.
///
/// ## Example
/// ```rust,ignore
/// let report = apply_batch(
///     plan.writes().cloned().collect(),
///     config.import_options(),
///     |product| { let repo = repo.clone(); async move { repo.upsert(&product).await } },
///     |p| println!("{}/{}", p.processed, p.total),
/// )
/// .await;
/// ```
pub async fn apply_batch<W, Fut, E, P>(
    items: Vec<Product>,
    options: BatchOptions,
    write: W,
    mut on_progress: P,
) -> BatchReport
where
    W: Fn(Product) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
    P: FnMut(BatchProgress),
{
    let total = items.len();
    let chunk_size = options.concurrency.max(1);
    let mut report = BatchReport {
        total,
        ..BatchReport::default()
    };

    debug!(total, chunk_size, timeout_ms = options.item_timeout.as_millis() as u64, "Starting batch");

    let mut processed = 0;
    let mut pending = items.into_iter().peekable();

    while pending.peek().is_some() {
        let chunk: Vec<Product> = pending.by_ref().take(chunk_size).collect();
        processed += chunk.len();

        let writes = chunk.into_iter().map(|product| {
            let sku = product.sku.clone();
            let fut = write(product);
            let timeout = options.item_timeout;
            async move {
                let outcome = match tokio::time::timeout(timeout, fut).await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err(format!("timed out after {} ms", timeout.as_millis())),
                };
                (sku, outcome)
            }
        });

        for (sku, outcome) in join_all(writes).await {
            match outcome {
                Ok(()) => report.succeeded += 1,
                Err(reason) => {
                    warn!(sku = %sku, reason = %reason, "Batch item failed");
                    report.failed.push(FailedItem { sku, reason });
                }
            }
        }

        on_progress(BatchProgress { processed, total });
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use moda_core::Money;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn products(n: usize) -> Vec<Product> {
        (1..=n)
            .map(|i| Product {
                id: format!("p{i}"),
                sku: format!("SKU-{i:02}"),
                name: format!("Peça {i}"),
                category: "Camisa".to_string(),
                size: "M".to_string(),
                color: "Azul".to_string(),
                price: Money::from_major(10),
                cost: Money::zero(),
                stock: 1,
            })
            .collect()
    }

    fn options(concurrency: usize, timeout_ms: u64) -> BatchOptions {
        BatchOptions {
            concurrency,
            item_timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[tokio::test]
    async fn test_progress_per_chunk() {
        let mut seen = Vec::new();
        let report = apply_batch(
            products(12),
            options(5, 1_000),
            |_| async { Ok::<(), String>(()) },
            |p| seen.push((p.processed, p.total)),
        )
        .await;

        assert_eq!(report.succeeded, 12);
        assert!(report.is_complete_success());
        assert_eq!(seen, vec![(5, 12), (10, 12), (12, 12)]);
    }

    #[tokio::test]
    async fn test_failures_do_not_abort() {
        let report = apply_batch(
            products(6),
            options(2, 1_000),
            |p| async move {
                if p.sku == "SKU-03" {
                    Err("disk full".to_string())
                } else {
                    Ok(())
                }
            },
            |_| {},
        )
        .await;

        assert_eq!(report.total, 6);
        assert_eq!(report.succeeded, 5);
        assert_eq!(
            report.failed,
            vec![FailedItem {
                sku: "SKU-03".to_string(),
                reason: "disk full".to_string()
            }]
        );
        assert!(report.summary().contains("1 items failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_write_times_out() {
        let report = apply_batch(
            products(3),
            options(3, 50),
            |p| async move {
                if p.sku == "SKU-02" {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                }
                Ok::<(), String>(())
            },
            |_| {},
        )
        .await;

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].reason.contains("timed out"));
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let report = apply_batch(
            products(3),
            options(0, 1_000),
            move |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), String>(())
                }
            },
            |_| {},
        )
        .await;

        assert_eq!(report.succeeded, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let mut calls = 0;
        let report = apply_batch(
            Vec::new(),
            BatchOptions::default(),
            |_| async { Ok::<(), String>(()) },
            |_| calls += 1,
        )
        .await;
        assert_eq!(report, BatchReport::default());
        assert_eq!(calls, 0);
    }
}
