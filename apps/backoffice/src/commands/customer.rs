//! # Customer Commands

use moda_core::validation::validate_customer;
use moda_core::{new_id, Customer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::navigation::{Confirmation, Outcome};
use crate::state::DbState;

/// Form data for creating or editing a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerInput {
    pub id: Option<String>,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

pub async fn list_customers(db: &DbState) -> ApiResult<Vec<Customer>> {
    debug!("list_customers command");
    Ok(db.inner().customers().list().await?)
}

pub async fn get_customer(db: &DbState, id: &str) -> ApiResult<Customer> {
    db.inner()
        .customers()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", id))
}

/// Finds a customer by id, or else by exact name ignoring case.
///
/// ## Errors
/// - `NOT_FOUND`: neither an id nor a name matches
/// - `VALIDATION_ERROR`: several customers share the name
pub async fn find_customer(db: &DbState, key: &str) -> ApiResult<Customer> {
    if let Some(customer) = db.inner().customers().get_by_id(key).await? {
        return Ok(customer);
    }

    let wanted = key.trim().to_lowercase();
    let mut matches: Vec<Customer> = list_customers(db)
        .await?
        .into_iter()
        .filter(|c| c.name.to_lowercase() == wanted)
        .collect();

    match matches.len() {
        0 => Err(ApiError::not_found("Customer", key)),
        1 => Ok(matches.remove(0)),
        n => Err(ApiError::validation(format!(
            "{n} customers are named '{key}'; use the customer id"
        ))),
    }
}

/// Creates or updates a customer. A blank email is stored as none.
pub async fn save_customer(db: &DbState, input: CustomerInput) -> ApiResult<Customer> {
    let customer = Customer {
        id: input.id.clone().unwrap_or_else(new_id),
        name: input.name.trim().to_string(),
        phone: input.phone.trim().to_string(),
        email: input
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty()),
    };
    validate_customer(&customer)?;

    let repo = db.inner().customers();
    if input.id.is_some() {
        repo.update(&customer).await?;
        info!(id = %customer.id, "Customer updated");
    } else {
        repo.insert(&customer).await?;
        info!(id = %customer.id, "Customer created");
    }

    Ok(customer)
}

/// Deletes a customer after confirmation.
///
/// Sales keep the customer name captured at checkout.
pub async fn delete_customer(
    db: &DbState,
    id: &str,
    confirmation: Confirmation,
) -> ApiResult<Outcome<()>> {
    if !confirmation.is_confirmed() {
        return Ok(Outcome::Cancelled);
    }

    db.inner().customers().delete(id).await?;
    info!(id = %id, "Customer deleted");
    Ok(Outcome::Done(()))
}
