//! # Catalog Upsert Reconciler
//!
//! Plans how a batch of incoming product records merges into the catalog.
//! Planning is pure; the writes happen later in the batch apply step, after
//! the operator has seen the preview.
//!
//! ## Decision per Record
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  incoming record                                                        │
//! │       │                                                                 │
//! │       ├── sku empty / invalid values ──────────────► errors            │
//! │       │                                                                 │
//! │       ├── sku known, no field differs ─────────────► unchanged         │
//! │       │                                                                 │
//! │       ├── sku known, some field differs ───────────► to_update         │
//! │       │      (storage id of the known product kept)                    │
//! │       │                                                                 │
//! │       └── sku unknown ─────────────────────────────► to_add            │
//! │              (fresh id; sku now known for the rest of the batch)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Compared fields: name, category, size, color, price, cost, stock.
//!
//! A SKU repeated inside one batch resolves to its last row: every write
//! planned for that product carries the same final state, so the order in
//! which concurrent writes land does not matter.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::Product;

/// Attempts made to draw an id that is not already taken.
const MAX_ID_ATTEMPTS: usize = 16;

/// A product record coming from an import or another external batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingProduct {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub size: String,
    pub color: String,
    pub price: Money,
    pub cost: Money,
    pub stock: i64,
}

/// A record or row that could not be planned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    /// 1-based row (line number for tabular imports, position otherwise).
    pub row: usize,
    pub sku: Option<String>,
    pub reason: String,
}

/// Outcome of the planning step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcilePlan {
    pub to_add: Vec<Product>,
    pub to_update: Vec<Product>,
    /// SKUs whose record matched the catalog exactly.
    pub unchanged: Vec<String>,
    pub errors: Vec<RowError>,
}

impl ReconcilePlan {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of writes the apply step will perform.
    pub fn write_count(&self) -> usize {
        self.to_add.len() + self.to_update.len()
    }

    /// Every planned write, additions first.
    pub fn writes(&self) -> impl Iterator<Item = &Product> {
        self.to_add.iter().chain(self.to_update.iter())
    }

    pub fn is_noop(&self) -> bool {
        self.write_count() == 0
    }
}

/// Names of the compared fields that differ between `current` and `incoming`.
pub fn changed_fields(current: &Product, incoming: &IncomingProduct) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if current.name != incoming.name {
        changed.push("name");
    }
    if current.category != incoming.category {
        changed.push("category");
    }
    if current.size != incoming.size {
        changed.push("size");
    }
    if current.color != incoming.color {
        changed.push("color");
    }
    if current.price != incoming.price {
        changed.push("price");
    }
    if current.cost != incoming.cost {
        changed.push("cost");
    }
    if current.stock != incoming.stock {
        changed.push("stock");
    }
    changed
}

fn check_record(record: &IncomingProduct) -> Result<String, String> {
    let sku = record.sku.trim();
    if sku.is_empty() {
        return Err("missing sku".to_string());
    }
    if record.price.is_negative() {
        return Err("negative price".to_string());
    }
    if record.cost.is_negative() {
        return Err("negative cost".to_string());
    }
    if record.stock < 0 {
        return Err("negative stock".to_string());
    }
    Ok(sku.to_string())
}

fn into_product(id: String, sku: String, record: &IncomingProduct) -> Product {
    Product {
        id,
        sku,
        name: record.name.clone(),
        category: record.category.clone(),
        size: record.size.clone(),
        color: record.color.clone(),
        price: record.price,
        cost: record.cost,
        stock: record.stock,
    }
}

/// Plans the merge of `incoming` into `existing`.
///
/// `id_gen` supplies storage ids for new products; ids already used by the
/// catalog or earlier in the batch are skipped.
///
/// ## Example
/// ```rust
/// use moda_core::money::Money;
/// use moda_core::reconcile::{reconcile, IncomingProduct};
///
/// let incoming = vec![IncomingProduct {
///     sku: "BS-CA-RE-01-m".into(),
///     name: "Camisa".into(),
///     category: "Camisa".into(),
///     size: "m".into(),
///     color: "Rede".into(),
///     price: Money::from_major(120),
///     cost: Money::from_major(40),
///     stock: 1,
/// }];
///
/// let mut n = 0;
/// let plan = reconcile(&[], &incoming, || { n += 1; format!("id-{n}") });
/// assert_eq!(plan.to_add.len(), 1);
/// assert_eq!(plan.to_add[0].id, "id-1");
/// ```
pub fn reconcile<F>(existing: &[Product], incoming: &[IncomingProduct], mut id_gen: F) -> ReconcilePlan
where
    F: FnMut() -> String,
{
    let mut lookup: HashMap<String, Product> = existing
        .iter()
        .map(|p| (p.sku.clone(), p.clone()))
        .collect();
    let mut used_ids: HashSet<String> = existing.iter().map(|p| p.id.clone()).collect();

    let mut plan = ReconcilePlan::default();

    for (index, record) in incoming.iter().enumerate() {
        let row = index + 1;

        let sku = match check_record(record) {
            Ok(sku) => sku,
            Err(reason) => {
                let sku = Some(record.sku.trim().to_string()).filter(|s| !s.is_empty());
                plan.errors.push(RowError { row, sku, reason });
                continue;
            }
        };

        match lookup.get(&sku) {
            Some(current) => {
                if changed_fields(current, record).is_empty() {
                    plan.unchanged.push(sku);
                    continue;
                }
                let updated = into_product(current.id.clone(), sku.clone(), record);
                plan.to_update.push(updated.clone());
                lookup.insert(sku, updated);
            }
            None => {
                let id = (0..MAX_ID_ATTEMPTS)
                    .map(|_| id_gen())
                    .find(|candidate| !used_ids.contains(candidate));

                let Some(id) = id else {
                    plan.errors.push(RowError {
                        row,
                        sku: Some(sku),
                        reason: "could not allocate a unique id".to_string(),
                    });
                    continue;
                };

                used_ids.insert(id.clone());
                let added = into_product(id, sku.clone(), record);
                plan.to_add.push(added.clone());
                lookup.insert(sku, added);
            }
        }
    }

    // Repeated SKUs: every planned write carries the final state.
    let latest: HashMap<&str, &Product> = lookup.values().map(|p| (p.id.as_str(), p)).collect();
    for product in plan.to_add.iter_mut().chain(plan.to_update.iter_mut()) {
        if let Some(last) = latest.get(product.id.as_str()) {
            *product = (*last).clone();
        }
    }

    plan
}

// =============================================================================
// Unit Tests
// =============================================================================
