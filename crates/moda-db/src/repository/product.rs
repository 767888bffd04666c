//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - Ordered listing (the inventory screen and its subscription)
//! - Lookup by id and by SKU (the import reconciler matches on SKU)
//! - Insert / update / upsert / delete
//!
//! Stock is only decremented inside the checkout transaction in
//! [`SaleRepository::checkout`](super::sale::SaleRepository::checkout);
//! manual edits go through `update`.

use chrono::Utc;
use moda_core::{Money, Product};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::feed::{ChangeFeed, Collection};

const SELECT_PRODUCT: &str = r#"
    SELECT id, sku, name, category, size, color, price_cents, cost_cents, stock
    FROM products
"#;

/// Row shape of the `products` table.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    sku: String,
    name: String,
    category: String,
    size: String,
    color: String,
    price_cents: i64,
    cost_cents: i64,
    stock: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            sku: row.sku,
            name: row.name,
            category: row.category,
            size: row.size,
            color: row.color,
            price: Money::from_cents(row.price_cents),
            cost: Money::from_cents(row.cost_cents),
            stock: row.stock,
        }
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let all = repo.list().await?;
/// let shirt = repo.get_by_sku("BS-CA-AZ-01-m").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        ProductRepository { pool, feed }
    }

    /// Lists every product ordered by name (case-insensitive).
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("{SELECT_PRODUCT} ORDER BY name COLLATE NOCASE ASC, id ASC");
        let rows: Vec<ProductRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        debug!(count = rows.len(), "Listed products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Substring search over SKU, name and category.
    ///
    /// An empty query lists the first `limit` products by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();
        debug!(query = %query, limit = %limit, "Searching products");

        let pattern = format!("%{}%", escape_like(query));
        let sql = format!(
            "{SELECT_PRODUCT}
             WHERE sku LIKE ?1 ESCAPE '\\' OR name LIKE ?1 ESCAPE '\\' OR category LIKE ?1 ESCAPE '\\'
             ORDER BY name COLLATE NOCASE ASC, id ASC
             LIMIT ?2"
        );
        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Search returned products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("{SELECT_PRODUCT} WHERE id = ?1");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("{SELECT_PRODUCT} WHERE sku = ?1");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Inserts a new product.
    ///
    /// ## Errors
    /// `UniqueViolation` when the id or SKU is already taken.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        let mut conn = self.pool.acquire().await?;
        insert_with(&mut conn, product).await?;

        self.feed.notify(Collection::Products);
        Ok(())
    }

    /// Updates every field of an existing product.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, sku = %product.sku, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET sku = ?2, name = ?3, category = ?4, size = ?5, color = ?6,
                price_cents = ?7, cost_cents = ?8, stock = ?9, updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.size)
        .bind(&product.color)
        .bind(product.price.cents())
        .bind(product.cost.cents())
        .bind(product.stock)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| with_sku(e, &product.sku))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        self.feed.notify(Collection::Products);
        Ok(())
    }

    /// Inserts or fully replaces a product by id.
    ///
    /// Used by catalog import, where each planned write already carries the
    /// final state for its id.
    pub async fn upsert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, sku = %product.sku, "Upserting product");

        sqlx::query(
            r#"
            INSERT INTO products
                (id, sku, name, category, size, color, price_cents, cost_cents, stock, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                sku = excluded.sku,
                name = excluded.name,
                category = excluded.category,
                size = excluded.size,
                color = excluded.color,
                price_cents = excluded.price_cents,
                cost_cents = excluded.cost_cents,
                stock = excluded.stock,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.size)
        .bind(&product.color)
        .bind(product.price.cents())
        .bind(product.cost.cents())
        .bind(product.stock)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| with_sku(e, &product.sku))?;

        self.feed.notify(Collection::Products);
        Ok(())
    }

    /// Deletes a product. Past sales keep their item snapshots.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.feed.notify(Collection::Products);
        Ok(())
    }

    /// Counts products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Inserts a product on an existing connection or transaction.
pub(crate) async fn insert_with(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO products
            (id, sku, name, category, size, color, price_cents, cost_cents, stock, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&product.id)
    .bind(&product.sku)
    .bind(&product.name)
    .bind(&product.category)
    .bind(&product.size)
    .bind(&product.color)
    .bind(product.price.cents())
    .bind(product.cost.cents())
    .bind(product.stock)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(|e| with_sku(e, &product.sku))?;

    Ok(())
}

/// Fills the offending value into a unique violation on `products.sku`.
fn with_sku(err: sqlx::Error, sku: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { field, .. } if field.ends_with("sku") => {
            DbError::duplicate(field, sku)
        }
        other => other,
    }
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// =============================================================================
// Unit Tests
// =============================================================================
