//! # Workspace Repository
//!
//! Operations that touch all three collections at once: restoring a backup
//! and clearing the store. Both run in one transaction, so a failure leaves
//! the previous data untouched.

use chrono::Utc;
use moda_core::{Customer, Product, Sale};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::feed::{ChangeFeed, Collection};
use crate::repository::{customer, product, sale};

/// Row counts of every collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceCounts {
    pub products: i64,
    pub customers: i64,
    pub sales: i64,
}

impl WorkspaceCounts {
    pub fn is_empty(&self) -> bool {
        self.products == 0 && self.customers == 0 && self.sales == 0
    }
}

#[derive(Debug, Clone)]
pub struct WorkspaceRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl WorkspaceRepository {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        WorkspaceRepository { pool, feed }
    }

    pub async fn counts(&self) -> DbResult<WorkspaceCounts> {
        let (products, customers, sales): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products),
                (SELECT COUNT(*) FROM customers),
                (SELECT COUNT(*) FROM sales)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(WorkspaceCounts {
            products,
            customers,
            sales,
        })
    }

    /// Replaces every collection with the given contents.
    ///
    /// ## Errors
    /// `UniqueViolation` when the incoming products repeat a SKU or an id;
    /// the store keeps its previous contents.
    pub async fn replace_all(
        &self,
        products: &[Product],
        customers: &[Customer],
        sales: &[Sale],
    ) -> DbResult<WorkspaceCounts> {
        info!(
            products = products.len(),
            customers = customers.len(),
            sales = sales.len(),
            "Replacing all collections"
        );

        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        delete_everything(&mut tx).await?;

        for p in products {
            product::insert_with(&mut tx, p).await?;
        }
        for c in customers {
            customer::insert_with(&mut tx, c).await?;
        }
        for s in sales {
            sale::insert_with(&mut tx, s, now).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        self.notify_all();
        Ok(WorkspaceCounts {
            products: products.len() as i64,
            customers: customers.len() as i64,
            sales: sales.len() as i64,
        })
    }

    /// Deletes every product, customer and sale.
    pub async fn clear_all(&self) -> DbResult<()> {
        info!("Clearing all collections");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        delete_everything(&mut tx).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        self.notify_all();
        Ok(())
    }

    fn notify_all(&self) {
        for collection in Collection::ALL {
            self.feed.notify(collection);
        }
    }
}

async fn delete_everything(conn: &mut sqlx::SqliteConnection) -> DbResult<()> {
    for table in ["sales", "customers", "products"] {
        let result = sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *conn)
            .await?;
        debug!(table, removed = result.rows_affected(), "Table cleared");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Snapshot;
    use crate::pool::{Database, DbConfig};
    use chrono::{NaiveDate, TimeZone};
    use moda_core::{Installment, Money};

    fn product(id: &str, sku: &str) -> Product {
        Product {
            id: id.to_string(),
            sku: sku.to_string(),
            name: format!("Peça {sku}"),
            category: "Geral".to_string(),
            size: "U".to_string(),
            color: String::new(),
            price: Money::from_major(10),
            cost: Money::zero(),
            stock: 1,
        }
    }

    fn sale() -> Sale {
        Sale {
            id: "s1".to_string(),
            customer_id: "c1".to_string(),
            customer_name: "Ana".to_string(),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            total: Money::from_major(10),
            discount: Money::zero(),
            items: Vec::new(),
            installments: vec![Installment {
                id: "i1".to_string(),
                number: 1,
                due_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                value: Money::from_major(10),
                amount_paid: Money::zero(),
            }],
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

    #[tokio::test]
    async fn test_replace_all_then_clear() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().insert(&product("old", "OLD")).await.unwrap();

        let counts = db
            .workspace()
            .replace_all(&[product("p1", "A"), product("p2", "B")], &[ana()], &[sale()])
            .await
            .unwrap();
        assert_eq!(
            counts,
            WorkspaceCounts {
                products: 2,
                customers: 1,
                sales: 1
            }
        );
        assert!(db.products().get_by_id("old").await.unwrap().is_none());
        assert_eq!(db.workspace().counts().await.unwrap(), counts);

        db.workspace().clear_all().await.unwrap();
        assert!(db.workspace().counts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_restore_keeps_previous_data() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().insert(&product("old", "OLD")).await.unwrap();

        let err = db
            .workspace()
            .replace_all(&[product("p1", "DUP"), product("p2", "DUP")], &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let counts = db.workspace().counts().await.unwrap();
        assert_eq!(counts.products, 1);
        assert!(db.products().get_by_id("old").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear_wakes_every_subscriber() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.workspace().replace_all(&[], &[ana()], &[sale()]).await.unwrap();

        let mut sales = db.subscribe(Collection::Sales);
        assert_eq!(sales.next().await.unwrap().unwrap().len(), 1);

        db.workspace().clear_all().await.unwrap();
        let after = sales.next().await.unwrap().unwrap();
        assert_eq!(after, Snapshot::Sales(Vec::new()));
    }
}
