//! # Validation Module
//!
//! Input validation for catalog entries, customers and checkout parameters.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command input (backoffice)                                    │
//! │  ├── Type validation (deserialization, argument parsing)                │
//! │  └── Typed confirmations for destructive actions                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE: Business rule validation                         │
//! │  ├── SKU / name / quantity / installment count                          │
//! │  └── Non-negative money                                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── UNIQUE(sku)                                                        │
//! │  └── CHECK(stock >= 0)                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use moda_core::validation::{validate_sku, validate_quantity};
//!
//! validate_sku("BS-CA-RE-01-m").unwrap();
//! validate_quantity(2).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Customer, Product};
use crate::{MAX_CART_ITEMS, MAX_INSTALLMENTS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Word the operator must type before all data is wiped.
pub const RESET_CONFIRMATION_WORD: &str = "DELETAR";

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - No whitespace inside
///
/// ## Example
/// ```rust
/// use moda_core::validation::validate_sku;
///
/// assert!(validate_sku("BS-CA-RE-01-m").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("BS CA").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.chars().count() > 64 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 64,
        });
    }

    if sku.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }

    Ok(())
}

fn validate_name(field: &str, name: &str, max: usize) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product name (1-200 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name, 200)
}

/// Validates a customer name (1-120 characters).
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    validate_name("customer name", name, 120)
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query string; empty means "everything".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Checks the typed confirmation for a full data reset.
pub fn validate_reset_confirmation(typed: &str) -> ValidationResult<()> {
    if typed.trim() != RESET_CONFIRMATION_WORD {
        return Err(ValidationError::ConfirmationMismatch {
            expected: RESET_CONFIRMATION_WORD.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates that a money value is not negative.
///
/// ## Example
/// ```rust
/// use moda_core::money::Money;
/// use moda_core::validation::validate_non_negative;
///
/// assert!(validate_non_negative("price", Money::zero()).is_ok());
/// assert!(validate_non_negative("price", Money::from_cents(-1)).is_err());
/// ```
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates the number of installments.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Checkout: choose "3x"                                                  │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_installment_count(3) ← THIS FUNCTION                         │
/// │       │                                                                 │
/// │       ├── 0 or > 24? → Error: "installments must be between 1 and 24"   │
/// │       │                                                                 │
/// │       └── OK → generate schedule                                       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_installment_count(count: u32) -> ValidationResult<()> {
    if count == 0 || count > MAX_INSTALLMENTS {
        return Err(ValidationError::OutOfRange {
            field: "installments".to_string(),
            min: 1,
            max: i64::from(MAX_INSTALLMENTS),
        });
    }
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size (number of distinct lines).
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates a product before it is written.
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_sku(&product.sku)?;
    validate_product_name(&product.name)?;
    validate_non_negative("price", product.price)?;
    validate_non_negative("cost", product.cost)?;

    if product.stock < 0 {
        return Err(ValidationError::Negative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

/// Validates a customer before it is written.
pub fn validate_customer(customer: &Customer) -> ValidationResult<()> {
    validate_customer_name(&customer.name)?;

    if let Some(email) = customer.email.as_deref() {
        let email = email.trim();
        if !email.is_empty() && !email.contains('@') {
            return Err(ValidationError::InvalidFormat {
                field: "email".to_string(),
                reason: "must contain '@'".to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("BS-CA-RE-01-m").is_ok());
        assert!(validate_sku("CAM/001").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_installment_count() {
        assert!(validate_installment_count(1).is_ok());
        assert!(validate_installment_count(24).is_ok());
        assert!(validate_installment_count(0).is_err());
        assert!(validate_installment_count(25).is_err());
    }

    #[test]
    fn test_validate_reset_confirmation() {
        assert!(validate_reset_confirmation("DELETAR").is_ok());
        assert!(validate_reset_confirmation(" DELETAR ").is_ok());
        assert!(validate_reset_confirmation("deletar").is_err());
        assert!(validate_reset_confirmation("").is_err());
    }

    #[test]
    fn test_validate_customer_email() {
        let mut customer = Customer {
            id: "c1".to_string(),
            name: "Ana".to_string(),
            phone: "11 99999-0000".to_string(),
            email: None,
        };
        assert!(validate_customer(&customer).is_ok());

        customer.email = Some("ana@example.com".to_string());
        assert!(validate_customer(&customer).is_ok());

        customer.email = Some("ana.example.com".to_string());
        assert!(validate_customer(&customer).is_err());

        customer.name = "  ".to_string();
        assert!(validate_customer(&customer).is_err());
    }

    #[test]
    fn test_validate_product_rejects_negative_values() {
        let mut product = Product {
            id: "p1".to_string(),
            sku: "BS-CA-RE-01-m".to_string(),
            name: "Camisa".to_string(),
            category: String::new(),
            size: String::new(),
            color: String::new(),
            price: Money::from_major(100),
            cost: Money::zero(),
            stock: 0,
        };
        assert!(validate_product(&product).is_ok());

        product.stock = -1;
        assert!(validate_product(&product).is_err());

        product.stock = 1;
        product.price = Money::from_cents(-1);
        assert!(validate_product(&product).is_err());
    }
}
