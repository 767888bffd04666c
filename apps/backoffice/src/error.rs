//! # API Error Type
//!
//! Unified error type for back-office commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in ModaGestão                             │
//! │                                                                         │
//! │  Command Function → Result<T, ApiError>                                 │
//! │         │                                                               │
//! │         ├── DbError ────────┐                                           │
//! │         ├── CoreError ──────┼──► ApiError { code, message }             │
//! │         ├── ValidationError ┤                                           │
//! │         └── ConfigError ────┘                                           │
//! │                                                                         │
//! │  Transient storage failures (busy, unreachable) all become              │
//! │  STORE_UNAVAILABLE with one plain-language message. Details go to the   │
//! │  log, never to the operator.                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use moda_core::{CoreError, ValidationError};
use moda_db::DbError;
use serde::Serialize;
use tracing::error;

use crate::state::ConfigError;

/// Message shown whenever the store could not be reached.
pub const STORE_UNAVAILABLE_MESSAGE: &str =
    "The store is unavailable right now. Nothing was saved; please try again.";

/// API error returned from commands.
///
/// ## Serialization
/// ```json
/// { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for BS-CA-AZ-01-m: 1 available, 2 requested" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// A value that must be unique is already taken
    Duplicate,

    /// Store busy or unreachable; retrying may succeed
    StoreUnavailable,

    /// Another write changed the record first
    Conflict,

    /// Not enough units on the shelf
    InsufficientStock,

    /// Cart operation failed
    CartError,

    /// A stored document could not be read
    IntegrityError,

    /// Configuration could not be loaded
    ConfigError,

    /// Database operation failed
    DatabaseError,

    /// Internal error
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Creates the transient storage error.
    pub fn unavailable() -> Self {
        ApiError::new(ErrorCode::StoreUnavailable, STORE_UNAVAILABLE_MESSAGE)
    }

    pub fn is_transient(&self) -> bool {
        self.code == ErrorCode::StoreUnavailable
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        if err.is_transient() {
            error!(error = %err, "Store unavailable");
            return ApiError::unavailable();
        }

        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Duplicate,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::VersionConflict { id, .. } => ApiError::new(
                ErrorCode::Conflict,
                format!("Sale {} was changed by another action; reload and try again", id),
            ),
            DbError::InsufficientStock {
                sku,
                available,
                requested,
            } => insufficient_stock(&sku, available, requested),
            DbError::Integrity { entity, id, reason } => {
                error!(entity = %entity, id = %id, reason = %reason, "Unreadable document");
                ApiError::new(
                    ErrorCode::IntegrityError,
                    format!("{} {} is damaged and cannot be opened", entity, id),
                )
            }
            DbError::Core(e) => ApiError::from(e),
            DbError::MigrationFailed(e) => {
                error!("Migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            other => {
                error!(error = %other, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::CustomerNotFound(id) => ApiError::not_found("Customer", &id),
            CoreError::SaleNotFound(id) => ApiError::not_found("Sale", &id),
            CoreError::InstallmentNotFound {
                sale_id,
                installment_id,
            } => ApiError::new(
                ErrorCode::NotFound,
                format!("Installment {} not found in sale {}", installment_id, sale_id),
            ),
            CoreError::InsufficientStock {
                sku,
                available,
                requested,
            } => insufficient_stock(&sku, available, requested),
            CoreError::CartTooLarge { max } => ApiError::new(
                ErrorCode::CartError,
                format!("Cart cannot have more than {} items", max),
            ),
            CoreError::QuantityTooLarge { requested, max } => ApiError::new(
                ErrorCode::ValidationError,
                format!("Quantity {} exceeds maximum allowed ({})", requested, max),
            ),
            CoreError::NotInCart(id) => {
                ApiError::new(ErrorCode::CartError, format!("Product {} is not in the cart", id))
            }
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::ConfigError, err.to_string())
    }
}

fn insufficient_stock(sku: &str, available: i64, requested: i64) -> ApiError {
    ApiError::new(
        ErrorCode::InsufficientStock,
        format!(
            "Insufficient stock for {}: {} available, {} requested",
            sku, available, requested
        ),
    )
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result alias for commands.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors_share_one_message() {
        for err in [
            DbError::PoolExhausted,
            DbError::Timeout("database is locked".into()),
            DbError::ConnectionFailed("Pool is closed".into()),
        ] {
            let api = ApiError::from(err);
            assert_eq!(api.code, ErrorCode::StoreUnavailable);
            assert_eq!(api.message, STORE_UNAVAILABLE_MESSAGE);
            assert!(api.is_transient());
        }
    }

    #[test]
    fn test_stock_error_from_db_and_core_match() {
        let from_db = ApiError::from(DbError::InsufficientStock {
            sku: "A".into(),
            available: 1,
            requested: 2,
        });
        let from_core = ApiError::from(CoreError::InsufficientStock {
            sku: "A".into(),
            available: 1,
            requested: 2,
        });
        assert_eq!(from_db, from_core);
        assert_eq!(from_db.code, ErrorCode::InsufficientStock);
    }

    #[test]
    fn test_code_serialization() {
        let json = serde_json::to_string(&ApiError::unavailable()).unwrap();
        assert!(json.contains("\"code\":\"STORE_UNAVAILABLE\""));

        let json = serde_json::to_string(&ApiError::validation("x")).unwrap();
        assert!(json.contains("\"VALIDATION_ERROR\""));
    }

    #[test]
    fn test_nested_core_error_in_db_error() {
        let api = ApiError::from(DbError::Core(CoreError::InstallmentNotFound {
            sale_id: "s".into(),
            installment_id: "i".into(),
        }));
        assert_eq!(api.code, ErrorCode::NotFound);
    }
}
