//! The cart item mapping.
//!
//! A cart is stored as a JSON object of product id (as a string key, the
//! JSON-object limitation) to purchased quantity. This type keeps that
//! mapping honest: every deserialization re-validates, so no handler or
//! repository ever sees a negative quantity or a key that is not a product
//! id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Errors that can occur when validating a [`CartItems`] mapping.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartItemsError {
    /// A key is not a product id.
    #[error("cart key {0:?} is not a product id")]
    InvalidKey(String),
    /// A quantity is negative.
    #[error("quantity for product {0} must not be negative (got {1})")]
    NegativeQuantity(String, i64),
    /// A quantity does not fit the storage type.
    #[error("quantity for product {0} is out of range (got {1})")]
    QuantityOutOfRange(String, i64),
}

/// A validated product → quantity mapping.
///
/// Invariant: every stored quantity is >= 1. Writes with quantity zero are
/// dropped rather than stored; negative quantities reject the whole mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, i64>", into = "BTreeMap<String, i64>")]
pub struct CartItems(BTreeMap<ProductId, u32>);

impl CartItems {
    /// An empty mapping.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add `quantity` of a product, summing with any existing entry.
    ///
    /// Adding zero is a no-op, preserving the >= 1 invariant.
    pub fn add(&mut self, product: ProductId, quantity: u32) {
        if quantity == 0 {
            return;
        }
        self.0
            .entry(product)
            .and_modify(|q| *q = q.saturating_add(quantity))
            .or_insert(quantity);
    }

    /// Remove a product entirely. No-op if it is not in the cart.
    pub fn remove(&mut self, product: ProductId) {
        self.0.remove(&product);
    }

    /// Empty the mapping.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Quantity stored for a product, if any.
    #[must_use]
    pub fn get(&self, product: ProductId) -> Option<u32> {
        self.0.get(&product).copied()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.0.values().map(|&q| u64::from(q)).sum()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(product, quantity)` pairs in product-id order.
    pub fn iter(&self) -> impl Iterator<Item = (ProductId, u32)> + '_ {
        self.0.iter().map(|(&id, &q)| (id, q))
    }
}

impl TryFrom<BTreeMap<String, i64>> for CartItems {
    type Error = CartItemsError;

    fn try_from(raw: BTreeMap<String, i64>) -> Result<Self, Self::Error> {
        let mut items = BTreeMap::new();
        for (key, quantity) in raw {
            let product: ProductId = key
                .parse()
                .map_err(|_| CartItemsError::InvalidKey(key.clone()))?;
            if quantity < 0 {
                return Err(CartItemsError::NegativeQuantity(key, quantity));
            }
            if quantity == 0 {
                continue;
            }
            let quantity = u32::try_from(quantity)
                .map_err(|_| CartItemsError::QuantityOutOfRange(key, quantity))?;
            items.insert(product, quantity);
        }
        Ok(Self(items))
    }
}

impl From<CartItems> for BTreeMap<String, i64> {
    fn from(items: CartItems) -> Self {
        items
            .0
            .into_iter()
            .map(|(id, q)| (id.to_string(), i64::from(q)))
            .collect()
    }
}

impl<'a> IntoIterator for &'a CartItems {
    type Item = (&'a ProductId, &'a u32);
    type IntoIter = std::collections::btree_map::Iter<'a, ProductId, u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn items(json: &str) -> Result<CartItems, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn empty_object_is_empty_cart() {
        let cart = items("{}").unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
    }

    #[test]
    fn total_items_sums_quantities() {
        let cart = items(r#"{"1": 2, "2": 3}"#).unwrap();
        assert_eq!(cart.total_items(), 5);
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.get(ProductId::new(1)), Some(2));
    }

    #[test]
    fn zero_quantities_are_dropped_not_stored() {
        let cart = items(r#"{"1": 0, "2": 4}"#).unwrap();
        assert_eq!(cart.get(ProductId::new(1)), None);
        assert_eq!(cart.total_items(), 4);
    }

    #[test]
    fn negative_quantity_rejects_the_mapping() {
        assert!(items(r#"{"1": -1}"#).is_err());
    }

    #[test]
    fn non_numeric_key_rejects_the_mapping() {
        assert!(items(r#"{"widget": 1}"#).is_err());
    }

    #[test]
    fn nested_value_rejects_the_mapping() {
        assert!(items(r#"{"1": {"qty": 2}}"#).is_err());
    }

    #[test]
    fn add_increments_existing_entry() {
        let mut cart = CartItems::new();
        cart.add(ProductId::new(7), 1);
        cart.add(ProductId::new(7), 2);
        assert_eq!(cart.get(ProductId::new(7)), Some(3));
    }

    #[test]
    fn add_zero_is_a_no_op() {
        let mut cart = CartItems::new();
        cart.add(ProductId::new(7), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn remove_then_clear() {
        let mut cart = items(r#"{"1": 2, "2": 3}"#).unwrap();
        cart.remove(ProductId::new(1));
        assert_eq!(cart.len(), 1);
        cart.remove(ProductId::new(99)); // absent: no-op
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn serializes_with_string_keys() {
        let mut cart = CartItems::new();
        cart.add(ProductId::new(3), 2);
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json, serde_json::json!({"3": 2}));
    }
}
