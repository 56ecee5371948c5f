//! Line-item reconciliation.
//!
//! An order holds at most one line item per product. Adding a product that is
//! already present merges into the existing quantity and keeps the first
//! price snapshot; setting a quantity replaces it.

use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    #[error("Product quantity must be positive for product {product_id}: {quantity}")]
    NotPositive { product_id: Uuid, quantity: i32 },
    #[error("Product quantity is too large for product {product_id}")]
    Overflow { product_id: Uuid },
}

/// What has to happen to the `order_items` table for one addition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineItemChange {
    Insert { quantity: i32, price: Decimal },
    Merge { line_item_id: Uuid, quantity: i32 },
}

/// The existing row for an (order, product) pair, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistingLine {
    pub line_item_id: Uuid,
    pub quantity: i32,
}

pub fn ensure_positive(product_id: Uuid, quantity: i32) -> Result<i32, QuantityError> {
    if quantity <= 0 {
        return Err(QuantityError::NotPositive {
            product_id,
            quantity,
        });
    }
    Ok(quantity)
}

pub fn plan_addition(
    product_id: Uuid,
    existing: Option<ExistingLine>,
    quantity: i32,
    current_price: Decimal,
) -> Result<LineItemChange, QuantityError> {
    let quantity = ensure_positive(product_id, quantity)?;
    match existing {
        None => Ok(LineItemChange::Insert {
            quantity,
            price: current_price,
        }),
        Some(line) => {
            let merged = line
                .quantity
                .checked_add(quantity)
                .ok_or(QuantityError::Overflow { product_id })?;
            Ok(LineItemChange::Merge {
                line_item_id: line.line_item_id,
                quantity: merged,
            })
        }
    }
}

/// Collapses repeated products in a new order into one entry each, summing
/// their quantities. First-seen order is preserved.
pub fn consolidate(items: &[(Uuid, i32)]) -> Result<Vec<(Uuid, i32)>, QuantityError> {
    let mut positions: HashMap<Uuid, usize> = HashMap::new();
    let mut merged: Vec<(Uuid, i32)> = Vec::with_capacity(items.len());

    for &(product_id, quantity) in items {
        let quantity = ensure_positive(product_id, quantity)?;
        match positions.get(&product_id) {
            Some(&idx) => {
                let entry = &mut merged[idx];
                entry.1 = entry
                    .1
                    .checked_add(quantity)
                    .ok_or(QuantityError::Overflow { product_id })?;
            }
            None => {
                positions.insert(product_id, merged.len());
                merged.push((product_id, quantity));
            }
        }
    }

    Ok(merged)
}
