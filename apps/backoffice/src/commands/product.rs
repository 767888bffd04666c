//! # Product Commands
//!
//! Catalog listing, search and manual editing.

use moda_core::import::generate_sku;
use moda_core::validation::{validate_product, validate_search_query};
use moda_core::{new_id, Money, Product};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::navigation::{Confirmation, Outcome};
use crate::state::DbState;

/// Default search result limit.
const DEFAULT_SEARCH_LIMIT: u32 = 50;

/// Form data for creating or editing a product.
///
/// `id` is absent for a new product. An empty `sku` is generated from
/// category, color and size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductInput {
    pub id: Option<String>,
    pub sku: String,
    pub name: String,
    pub category: String,
    pub size: String,
    pub color: String,
    pub price: Money,
    pub cost: Money,
    pub stock: i64,
}

/// Every product, by name.
pub async fn list_products(db: &DbState) -> ApiResult<Vec<Product>> {
    debug!("list_products command");
    Ok(db.inner().products().list().await?)
}

/// Searches by name or SKU.
///
/// ## Arguments
/// * `query` - Search string (empty lists everything)
/// * `limit` - Maximum results (default: 50)
pub async fn search_products(
    db: &DbState,
    query: &str,
    limit: Option<u32>,
) -> ApiResult<Vec<Product>> {
    let query = validate_search_query(query)?;
    let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    debug!(query = %query, limit, "search_products command");

    Ok(db.inner().products().search(&query, limit).await?)
}

pub async fn get_product(db: &DbState, id: &str) -> ApiResult<Product> {
    db.inner()
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))
}

/// Creates or updates a product.
///
/// ## Behavior
/// - New product: a fresh id, SKU generated when left blank
/// - Existing product: every field replaced, id kept
/// - A SKU already used by another product is rejected as `DUPLICATE`
pub async fn save_product(db: &DbState, input: ProductInput) -> ApiResult<Product> {
    let repo = db.inner().products();

    let sku = if input.sku.trim().is_empty() {
        let sequence = repo.count().await? as usize + 1;
        generate_sku(&input.category, &input.color, &input.size, sequence)
    } else {
        input.sku.trim().to_string()
    };

    let product = Product {
        id: input.id.clone().unwrap_or_else(new_id),
        sku,
        name: input.name.trim().to_string(),
        category: input.category.trim().to_string(),
        size: input.size.trim().to_string(),
        color: input.color.trim().to_string(),
        price: input.price,
        cost: input.cost,
        stock: input.stock,
    };
    validate_product(&product)?;

    if input.id.is_some() {
        repo.update(&product).await?;
        info!(id = %product.id, sku = %product.sku, "Product updated");
    } else {
        repo.insert(&product).await?;
        info!(id = %product.id, sku = %product.sku, "Product created");
    }

    Ok(product)
}

/// Deletes a product after confirmation.
///
/// Past sales keep their frozen copy of the name and price.
pub async fn delete_product(
    db: &DbState,
    id: &str,
    confirmation: Confirmation,
) -> ApiResult<Outcome<()>> {
    if !confirmation.is_confirmed() {
        debug!(id = %id, "delete_product declined");
        return Ok(Outcome::Cancelled);
    }

    db.inner().products().delete(id).await?;
    info!(id = %id, "Product deleted");
    Ok(Outcome::Done(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn input(sku: &str, name: &str) -> ProductInput {
        ProductInput {
            id: None,
            sku: sku.to_string(),
            name: name.to_string(),
            category: "Camisa".to_string(),
            size: "M".to_string(),
            color: "Rede".to_string(),
            price: Money::from_major(100),
            cost: Money::from_major(40),
            stock: 3,
        }
    }

    #[tokio::test]
    async fn test_blank_sku_is_generated() {
        let db = DbState::in_memory().await.unwrap();
        let product = save_product(&db, input("", "Camisa Rede")).await.unwrap();
        assert_eq!(product.sku, "BS-CA-RE-01-m");

        let second = save_product(&db, input("  ", "Camisa Rede 2")).await.unwrap();
        assert_eq!(second.sku, "BS-CA-RE-02-m");
    }

    #[tokio::test]
    async fn test_edit_keeps_id() {
        let db = DbState::in_memory().await.unwrap();
        let created = save_product(&db, input("SKU-1", "Blusa")).await.unwrap();

        let mut edit = input("SKU-1", "Blusa Nova");
        edit.id = Some(created.id.clone());
        save_product(&db, edit).await.unwrap();

        let stored = get_product(&db, &created.id).await.unwrap();
        assert_eq!(stored.name, "Blusa Nova");
        assert_eq!(list_products(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_sku() {
        let db = DbState::in_memory().await.unwrap();
        save_product(&db, input("SKU-1", "Blusa")).await.unwrap();
        let err = save_product(&db, input("SKU-1", "Outra")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Duplicate);
    }

    #[tokio::test]
    async fn test_invalid_product_rejected() {
        let db = DbState::in_memory().await.unwrap();
        let err = save_product(&db, input("SKU-1", "  ")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let db = DbState::in_memory().await.unwrap();
        let product = save_product(&db, input("SKU-1", "Blusa")).await.unwrap();

        let outcome = delete_product(&db, &product.id, Confirmation::Declined)
            .await
            .unwrap();
        assert!(outcome.is_cancelled());
        assert!(get_product(&db, &product.id).await.is_ok());

        delete_product(&db, &product.id, Confirmation::Confirmed)
            .await
            .unwrap();
        assert_eq!(
            get_product(&db, &product.id).await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }
}
