//! # Customer Repository
//!
//! Database operations for customers. Sales copy the customer name at
//! checkout, so renaming or deleting a customer never rewrites history.

use chrono::Utc;
use moda_core::Customer;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::feed::{ChangeFeed, Collection};

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    phone: String,
    email: Option<String>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email.filter(|e| !e.is_empty()),
        }
    }
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        CustomerRepository { pool, feed }
    }

    /// Lists every customer ordered by name (case-insensitive).
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let rows: Vec<CustomerRow> = sqlx::query_as(
            "SELECT id, name, phone, email FROM customers ORDER BY name COLLATE NOCASE ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed customers");
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let row: Option<CustomerRow> =
            sqlx::query_as("SELECT id, name, phone, email FROM customers WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Customer::from))
    }

    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "Inserting customer");

        let mut conn = self.pool.acquire().await?;
        insert_with(&mut conn, customer).await?;

        self.feed.notify(Collection::Customers);
        Ok(())
    }

    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "Updating customer");

        let result = sqlx::query(
            "UPDATE customers SET name = ?2, phone = ?3, email = ?4, updated_at = ?5 WHERE id = ?1",
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.email.as_deref())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        self.feed.notify(Collection::Customers);
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        self.feed.notify(Collection::Customers);
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Inserts a customer on an existing connection or transaction.
pub(crate) async fn insert_with(conn: &mut SqliteConnection, customer: &Customer) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO customers (id, name, phone, email, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&customer.id)
    .bind(&customer.name)
    .bind(&customer.phone)
    .bind(customer.email.as_deref())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}
