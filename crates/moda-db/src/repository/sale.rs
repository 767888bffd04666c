//! # Sale Repository
//!
//! Sales are stored as JSON documents (items and installments embedded)
//! next to a `version` counter.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    for each product in the sale (quantities summed per product):        │
//! │      UPDATE products SET stock = stock - qty                            │
//! │       WHERE id = ? AND stock >= qty                                     │
//! │      0 rows? → ROLLBACK, InsufficientStock / NotFound                   │
//! │    INSERT INTO sales (document, version = 1)                            │
//! │  COMMIT → notify products + sales                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Settlement Writes
//! ```text
//! read (sale, version) → settlement rule → UPDATE ... WHERE version = ?
//!                                              │
//!                             0 rows ──────────┴──► VersionConflict
//! ```
//! The caller re-reads and retries; the rule always works on the freshest
//! document, so only the target installment changes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use moda_core::integrity::load_sale;
use moda_core::{settlement, CoreResult, Money, Sale, SaleRecord};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::feed::{ChangeFeed, Collection};

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    document: String,
    version: i64,
}

/// Repository for sale documents.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        SaleRepository { pool, feed }
    }

    /// Lists every sale, newest first.
    ///
    /// Stored documents are audited on the way out; inconsistencies are
    /// logged and corrected in the returned values. A document that cannot
    /// be read at all is logged and left out of the list.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        let rows: Vec<SaleRow> = sqlx::query_as(
            "SELECT id, document, version FROM sales ORDER BY sold_at_ms DESC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            match decode(row) {
                Ok((sale, _)) => sales.push(sale),
                Err(DbError::Integrity { id, reason, .. }) => {
                    warn!(sale_id = %id, reason = %reason, "Skipping unreadable sale document");
                }
                Err(err) => return Err(err),
            }
        }

        debug!(count = sales.len(), "Listed sales");
        Ok(sales)
    }

    /// Gets a sale by its ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Sale>> {
        Ok(self.get_versioned(id).await?.map(|(sale, _)| sale))
    }

    /// Gets a sale with its current version.
    pub async fn get_versioned(&self, id: &str) -> DbResult<Option<(Sale, i64)>> {
        let row: Option<SaleRow> =
            sqlx::query_as("SELECT id, document, version FROM sales WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(decode).transpose()
    }

    /// Persists a new sale and takes its items out of stock, atomically.
    ///
    /// ## Errors
    /// - `InsufficientStock` when any product has fewer units than sold
    /// - `NotFound` when a product was deleted since it entered the cart
    ///
    /// Either way nothing is written.
    pub async fn checkout(&self, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, items = sale.items.len(), total = %sale.total, "Checking out sale");

        let mut quantities: BTreeMap<&str, i64> = BTreeMap::new();
        for item in &sale.items {
            *quantities.entry(item.product_id.as_str()).or_insert(0) += item.quantity;
        }

        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for (&product_id, &quantity) in &quantities {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - ?2, updated_at = ?3
                WHERE id = ?1 AND stock >= ?2
                "#,
            )
            .bind(product_id)
            .bind(quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let current: Option<(String, i64)> =
                    sqlx::query_as("SELECT sku, stock FROM products WHERE id = ?1")
                        .bind(product_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                tx.rollback()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

                return Err(match current {
                    None => DbError::not_found("Product", product_id),
                    Some((sku, available)) => {
                        debug!(sku = %sku, available, requested = quantity, "Checkout refused");
                        DbError::InsufficientStock {
                            sku,
                            available,
                            requested: quantity,
                        }
                    }
                });
            }
        }

        insert_with(&mut tx, sale, now).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        self.feed.notify(Collection::Products);
        self.feed.notify(Collection::Sales);
        Ok(())
    }

    /// Applies a ledger rule to the freshest copy of a sale and writes it
    /// back if nobody else wrote in between.
    ///
    /// ## Errors
    /// - `NotFound` when the sale does not exist
    /// - `Core` when the rule rejects the change
    /// - `VersionConflict` when another write won the race
    pub async fn update_with<F>(&self, sale_id: &str, rule: F) -> DbResult<Sale>
    where
        F: FnOnce(&Sale) -> CoreResult<Sale>,
    {
        let (current, version) = self
            .get_versioned(sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        let updated = rule(&current)?;
        self.replace_if_version(&updated, version).await?;
        Ok(updated)
    }

    /// Overwrites a sale document only if its version is still `expected`.
    pub async fn replace_if_version(&self, sale: &Sale, expected: i64) -> DbResult<()> {
        let document = encode(sale)?;

        let result = sqlx::query(
            r#"
            UPDATE sales
            SET document = ?2, customer_name = ?3, version = version + 1, updated_at = ?4
            WHERE id = ?1 AND version = ?5
            "#,
        )
        .bind(&sale.id)
        .bind(document)
        .bind(&sale.customer_name)
        .bind(Utc::now())
        .bind(expected)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(sale_id = %sale.id, expected, "Version conflict");
            return Err(DbError::VersionConflict {
                id: sale.id.clone(),
                expected,
            });
        }

        self.feed.notify(Collection::Sales);
        Ok(())
    }

    /// Sets the amount paid on one installment.
    pub async fn record_payment(
        &self,
        sale_id: &str,
        installment_id: &str,
        amount: Money,
    ) -> DbResult<Sale> {
        debug!(sale_id = %sale_id, installment_id = %installment_id, amount = %amount, "Recording payment");
        self.update_with(sale_id, |sale| {
            settlement::record_payment(sale, installment_id, amount)
        })
        .await
    }

    /// Marks one installment as paid in full.
    pub async fn mark_paid_in_full(&self, sale_id: &str, installment_id: &str) -> DbResult<Sale> {
        self.update_with(sale_id, |sale| settlement::mark_paid_in_full(sale, installment_id))
            .await
    }

    /// Resets one installment to nothing paid.
    pub async fn clear_payment(&self, sale_id: &str, installment_id: &str) -> DbResult<Sale> {
        self.update_with(sale_id, |sale| settlement::clear_payment(sale, installment_id))
            .await
    }

    /// Deletes a sale. Stock is not returned to the shelf.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting sale");

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        self.feed.notify(Collection::Sales);
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Inserts a sale document (version 1) on an existing connection.
pub(crate) async fn insert_with(
    conn: &mut SqliteConnection,
    sale: &Sale,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let document = encode(sale)?;

    sqlx::query(
        r#"
        INSERT INTO sales (id, customer_id, customer_name, sold_at_ms, document, version, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.customer_id)
    .bind(&sale.customer_name)
    .bind(sale.date.timestamp_millis())
    .bind(document)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn encode(sale: &Sale) -> DbResult<String> {
    Ok(serde_json::to_string(&SaleRecord::from(sale))?)
}

fn decode(row: SaleRow) -> DbResult<(Sale, i64)> {
    let unreadable = |reason: String| DbError::Integrity {
        entity: "Sale".to_string(),
        id: row.id.clone(),
        reason,
    };

    let record: SaleRecord =
        serde_json::from_str(&row.document).map_err(|e| unreadable(e.to_string()))?;
    let audited = load_sale(record).map_err(|e| unreadable(e.to_string()))?;

    for issue in &audited.issues {
        warn!(sale_id = %row.id, issue = %issue, "Sale integrity issue");
    }

    Ok((audited.sale, row.version))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{NaiveDate, TimeZone};
    use moda_core::cart::CartLine;
    use moda_core::sale::create_sale;
    use moda_core::{CoreError, Customer, Product};

    fn product(id: &str, sku: &str, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            sku: sku.to_string(),
            name: format!("Peça {sku}"),
            category: "Camisa".to_string(),
            size: "M".to_string(),
            color: "Azul".to_string(),
            price: Money::from_major(100),
            cost: Money::from_major(40),
            stock,
        }
    }

    fn ana() -> Customer {
        Customer {
            id: "c1".to_string(),
            name: "Ana".to_string(),
            phone: String::new(),
            email: None,
        }
    }

    fn sale_of(lines: &[(&Product, i64)], count: u32, day: u32) -> Sale {
        let lines: Vec<CartLine> = lines
            .iter()
            .map(|(p, q)| CartLine::from_product(p, *q))
            .collect();
        let now = Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap();
        create_sale(Some(&ana()), &lines, Money::zero(), count, now).unwrap()
    }

    async fn setup(products: &[Product]) -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for p in products {
            db.products().insert(p).await.unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_checkout_decrements_stock_and_stores_sale() {
        let shirt = product("p1", "CA-1", 5);
        let db = setup(&[shirt.clone()]).await;

        let sale = sale_of(&[(&shirt, 3)], 3, 1);
        db.sales().checkout(&sale).await.unwrap();

        assert_eq!(db.products().get_by_id("p1").await.unwrap().unwrap().stock, 2);

        let stored = db.sales().get(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored, sale);
        assert_eq!(stored.total, Money::from_major(300));
        assert_eq!(stored.installments.len(), 3);
    }

    #[tokio::test]
    async fn test_checkout_insufficient_stock_is_all_or_nothing() {
        let a = product("p1", "A", 5);
        let b = product("p2", "B", 1);
        let db = setup(&[a.clone(), b.clone()]).await;

        let sale = sale_of(&[(&a, 2), (&b, 2)], 1, 1);
        let err = db.sales().checkout(&sale).await.unwrap_err();
        match err {
            DbError::InsufficientStock {
                sku,
                available,
                requested,
            } => {
                assert_eq!(sku, "B");
                assert_eq!(available, 1);
                assert_eq!(requested, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // the first line's decrement was rolled back
        assert_eq!(db.products().get_by_id("p1").await.unwrap().unwrap().stock, 5);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_skips_unreadable_document() {
        let shirt = product("p1", "CA-1", 5);
        let db = setup(&[shirt.clone()]).await;
        let sale = sale_of(&[(&shirt, 1)], 2, 3);
        db.sales().checkout(&sale).await.unwrap();

        sqlx::query(
            r#"
            INSERT INTO sales (id, customer_id, customer_name, sold_at_ms, document, version, updated_at)
            VALUES ('broken', 'c1', 'Ana', 0, '{not json', 1, '2024-01-01T00:00:00Z')
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();

        let listed = db.sales().list().await.unwrap();
        assert_eq!(listed, vec![sale]);

        // a direct lookup still reports the bad document
        let err = db.sales().get("broken").await.unwrap_err();
        assert!(matches!(err, DbError::Integrity { .. }));
    }

    #[tokio::test]
    async fn test_checkout_missing_product() {
        let ghost = product("gone", "G", 5);
        let db = setup(&[]).await;

        let err = db.sales().checkout(&sale_of(&[(&ghost, 1)], 1, 1)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_same_product_on_two_lines_is_summed() {
        let a = product("p1", "A", 3);
        let db = setup(&[a.clone()]).await;

        let err = db
            .sales()
            .checkout(&sale_of(&[(&a, 2), (&a, 2)], 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InsufficientStock { requested: 4, .. }));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let a = product("p1", "A", 10);
        let db = setup(&[a.clone()]).await;

        let older = sale_of(&[(&a, 1)], 1, 2);
        let newer = sale_of(&[(&a, 1)], 1, 20);
        db.sales().checkout(&older).await.unwrap();
        db.sales().checkout(&newer).await.unwrap();

        let ids: Vec<String> = db.sales().list().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn test_record_payment_bumps_version() {
        let a = product("p1", "A", 10);
        let db = setup(&[a.clone()]).await;
        let sale = sale_of(&[(&a, 3)], 3, 1);
        db.sales().checkout(&sale).await.unwrap();

        let first = sale.installments[0].id.clone();
        let updated = db
            .sales()
            .record_payment(&sale.id, &first, Money::from_major(100))
            .await
            .unwrap();
        assert!(updated.installments[0].is_paid());

        let (stored, version) = db.sales().get_versioned(&sale.id).await.unwrap().unwrap();
        assert_eq!(version, 2);
        assert_eq!(stored.amount_paid(), Money::from_major(100));
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let a = product("p1", "A", 10);
        let db = setup(&[a.clone()]).await;
        let sale = sale_of(&[(&a, 2)], 2, 1);
        db.sales().checkout(&sale).await.unwrap();

        let repo = db.sales();
        let (stale, version) = repo.get_versioned(&sale.id).await.unwrap().unwrap();

        // another writer lands between this caller's read and write
        let second = sale.installments[1].id.clone();
        repo.record_payment(&sale.id, &second, Money::from_major(10))
            .await
            .unwrap();

        let first = sale.installments[0].id.clone();
        let updated = settlement::record_payment(&stale, &first, Money::from_major(100)).unwrap();
        let err = repo.replace_if_version(&updated, version).await.unwrap_err();
        assert!(matches!(err, DbError::VersionConflict { expected: 1, .. }));

        // the winner's payment is intact
        let stored = repo.get(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.installments[1].amount_paid, Money::from_major(10));
        assert!(stored.installments[0].amount_paid.is_zero());
    }

    #[tokio::test]
    async fn test_concurrent_payments_on_different_installments() {
        let a = product("p1", "A", 10);
        let db = setup(&[a.clone()]).await;
        let sale = sale_of(&[(&a, 2)], 2, 1);
        db.sales().checkout(&sale).await.unwrap();

        let first = sale.installments[0].id.clone();
        let second = sale.installments[1].id.clone();

        db.sales().record_payment(&sale.id, &first, Money::from_major(100)).await.unwrap();
        db.sales().record_payment(&sale.id, &second, Money::from_major(30)).await.unwrap();

        let stored = db.sales().get(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.installments[0].amount_paid, Money::from_major(100));
        assert_eq!(stored.installments[1].amount_paid, Money::from_major(30));
    }

    #[tokio::test]
    async fn test_unknown_installment_is_core_error() {
        let a = product("p1", "A", 10);
        let db = setup(&[a.clone()]).await;
        let sale = sale_of(&[(&a, 1)], 1, 1);
        db.sales().checkout(&sale).await.unwrap();

        let err = db
            .sales()
            .record_payment(&sale.id, "nope", Money::from_major(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InstallmentNotFound { .. })
        ));

        let err = db.sales().mark_paid_in_full("missing", "x").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_legacy_document_is_audited_on_read() {
        let db = setup(&[]).await;
        let legacy = r#"{
            "id": "old", "customerId": "c1", "customerName": "Ana",
            "date": "2023-06-01T10:00:00.000Z", "total": 100,
            "items": [],
            "installments": [
                {"id":"i1","number":1,"dueDate":"2023-07-01T10:00:00.000Z","value":100,"paid":true}
            ]
        }"#;
        sqlx::query(
            "INSERT INTO sales (id, customer_id, customer_name, sold_at_ms, document, version, updated_at)
             VALUES ('old', 'c1', 'Ana', 0, ?1, 1, '')",
        )
        .bind(legacy)
        .execute(db.pool())
        .await
        .unwrap();

        let sale = db.sales().get("old").await.unwrap().unwrap();
        assert_eq!(sale.installments[0].amount_paid, Money::from_major(100));
        assert_eq!(
            sale.installments[0].due_date,
            NaiveDate::from_ymd_opt(2023, 7, 1).unwrap()
        );
    }

    #[tokio::test]
    async fn test_corrupt_document_is_integrity_error() {
        let db = setup(&[]).await;
        sqlx::query(
            "INSERT INTO sales (id, customer_id, customer_name, sold_at_ms, document, version, updated_at)
             VALUES ('bad', 'c1', 'Ana', 0, '{oops', 1, '')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = db.sales().get("bad").await.unwrap_err();
        assert!(matches!(err, DbError::Integrity { .. }));
    }
}
