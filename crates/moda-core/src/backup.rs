//! # Backup Document
//!
//! The JSON file written by "export backup" and read by "restore".
//!
//! ```json
//! {
//!   "products":   [ ... ],
//!   "customers":  [ ... ],
//!   "sales":      [ ... ],
//!   "exportedAt": "2024-05-01T12:00:00Z",
//!   "system":     "ModaGestão AI"
//! }
//! ```
//!
//! A file whose `system` field is anything other than the signature is
//! rejected before any data is touched.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, ValidationError};
use crate::integrity::{load_product, load_sale, IntegrityIssue};
use crate::types::{Customer, Product, Sale, SaleRecord};

/// Signature every backup file carries.
pub const BACKUP_SIGNATURE: &str = "ModaGestão AI";

/// Full export of the three collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub sales: Vec<SaleRecord>,
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub system: String,
}

/// Collections ready to be written back, with audit findings per sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreSet {
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
    pub sales: Vec<Sale>,
    /// `(sale id, issue)` for every sale that needed correction.
    pub issues: Vec<(String, IntegrityIssue)>,
    /// `(product id, issue)` for every product that needed correction.
    pub product_issues: Vec<(String, IntegrityIssue)>,
}

impl BackupDocument {
    /// Builds a signed backup from the current collections.
    pub fn new(
        products: Vec<Product>,
        customers: Vec<Customer>,
        sales: &[Sale],
        exported_at: DateTime<Utc>,
    ) -> Self {
        BackupDocument {
            products,
            customers,
            sales: sales.iter().map(SaleRecord::from).collect(),
            exported_at,
            system: BACKUP_SIGNATURE.to_string(),
        }
    }

    /// Parses and checks the signature of a backup file.
    ///
    /// ## Errors
    /// `ValidationError::InvalidFormat` for malformed JSON or a foreign
    /// signature.
    pub fn parse(text: &str) -> CoreResult<Self> {
        let doc: BackupDocument =
            serde_json::from_str(text).map_err(|e| ValidationError::InvalidFormat {
                field: "backup".to_string(),
                reason: e.to_string(),
            })?;

        if doc.system != BACKUP_SIGNATURE {
            return Err(ValidationError::InvalidFormat {
                field: "system".to_string(),
                reason: format!("not a {BACKUP_SIGNATURE} backup (found '{}')", doc.system),
            }
            .into());
        }

        Ok(doc)
    }

    /// Pretty JSON for writing to disk.
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ValidationError::InvalidFormat {
                field: "backup".to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Audits every product and sale and returns the collections to restore.
    pub fn into_restore_set(self) -> CoreResult<RestoreSet> {
        let mut products = Vec::with_capacity(self.products.len());
        let mut product_issues = Vec::new();
        for product in self.products {
            let (product, issue) = load_product(product);
            if let Some(issue) = issue {
                product_issues.push((product.id.clone(), issue));
            }
            products.push(product);
        }

        let mut sales = Vec::with_capacity(self.sales.len());
        let mut issues = Vec::new();

        for record in self.sales {
            let audited = load_sale(record)?;
            let sale_id = audited.sale.id.clone();
            issues.extend(audited.issues.into_iter().map(|i| (sale_id.clone(), i)));
            sales.push(audited.sale);
        }

        Ok(RestoreSet {
            products,
            customers: self.customers,
            sales,
            issues,
            product_issues,
        })
    }
}

/// File name for a backup exported on `date`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use moda_core::backup::backup_file_name;
///
/// let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
/// assert_eq!(backup_file_name(date), "backup_modagestao_2024-05-01.json");
/// ```
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("backup_modagestao_{}.json", date.format("%Y-%m-%d"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::Installment;
    use chrono::TimeZone;

    fn sample_sale() -> Sale {
        Sale {
            id: "s1".to_string(),
            customer_id: "c1".to_string(),
            customer_name: "Ana".to_string(),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            total: Money::from_major(100),
            discount: Money::zero(),
            items: Vec::new(),
            installments: vec![Installment {
                id: "i1".to_string(),
                number: 1,
                due_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                value: Money::from_major(100),
                amount_paid: Money::from_major(40),
            }],
        }
    }

    fn exported_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_export_then_restore() {
        let doc = BackupDocument::new(Vec::new(), Vec::new(), &[sample_sale()], exported_at());
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"exportedAt\""));
        assert!(json.contains("\"system\": \"ModaGestão AI\""));

        let restored = BackupDocument::parse(&json).unwrap().into_restore_set().unwrap();
        assert_eq!(restored.sales, vec![sample_sale()]);
        assert!(restored.issues.is_empty());
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let json = r#"{"products":[],"customers":[],"sales":[],"exportedAt":"2024-05-01T12:00:00Z","system":"OtherApp"}"#;
        assert!(BackupDocument::parse(json).is_err());

        let json = r#"{"products":[],"exportedAt":"2024-05-01T12:00:00Z"}"#;
        assert!(BackupDocument::parse(json).is_err());
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(BackupDocument::parse("{not json").is_err());
    }

    #[test]
    fn test_restore_reports_integrity_issues() {
        let json = r#"{
            "products": [],
            "customers": [{"id":"c1","name":"Ana","phone":"","email":""}],
            "sales": [{
                "id": "s1", "customerId": "c1", "customerName": "Ana",
                "date": "2024-01-01T12:00:00.000Z", "total": 100,
                "items": [{"productId":"p1","productName":"Camisa","quantity":1,"price":100}],
                "installments": [
                    {"id":"i1","number":1,"dueDate":"2024-02-01T12:00:00.000Z","value":100,"amountPaid":30,"paid":true}
                ]
            }],
            "exportedAt": "2024-05-01T12:00:00.000Z",
            "system": "ModaGestão AI"
        }"#;

        let restored = BackupDocument::parse(json).unwrap().into_restore_set().unwrap();
        assert!(restored.product_issues.is_empty());
        assert_eq!(restored.customers.len(), 1);
        assert_eq!(restored.issues.len(), 1);
        assert_eq!(restored.issues[0].0, "s1");
        assert!(!restored.sales[0].installments[0].is_paid());
        assert_eq!(restored.sales[0].discount, Money::zero());
    }
}
