//! Order domain types.
//!
//! An order is an immutable snapshot: line items copy the product's name and
//! price at purchase time, so later catalog edits never change what a
//! customer sees on an old order.

use bazaar_core::{Email, OrderId, OrderItemId, ProductId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// A placed order with its shipping snapshot.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    /// Payment flag; orders are created unpaid.
    pub paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of an order.
///
/// `product_id` and `product_name` identify what was bought; there is no
/// live link back to the catalog, so deleting the product later leaves the
/// order intact.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    /// Price at purchase time, never recomputed.
    pub price: Decimal,
    pub quantity: u32,
}

impl OrderItem {
    /// Price times quantity for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Sum of `price * quantity` over an order's lines.
#[must_use]
pub fn total_cost(items: &[OrderItem]) -> Decimal {
    items.iter().map(OrderItem::line_total).sum()
}

/// Errors raised by [`ShippingDetails::validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShippingError {
    #[error("shipping field {0:?} must not be empty")]
    EmptyField(&'static str),
    #[error("shipping email is not a valid address")]
    InvalidEmail,
}

/// Shipping fields supplied when placing an order.
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
}

impl ShippingDetails {
    /// Check that every field is non-empty and the email is well-formed.
    ///
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<(), ShippingError> {
        let fields: [(&'static str, &str); 6] = [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("address", &self.address),
            ("postal_code", &self.postal_code),
            ("city", &self.city),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ShippingError::EmptyField(name));
            }
        }
        Email::parse(&self.email).map_err(|_| ShippingError::InvalidEmail)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn item(price: &str, quantity: u32) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(1),
            order_id: OrderId::new(1),
            product_id: ProductId::new(1),
            product_name: "thing".to_owned(),
            price: price.parse::<Decimal>().unwrap(),
            quantity,
        }
    }

    fn shipping() -> ShippingDetails {
        ShippingDetails {
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            email: "ada@example.com".to_owned(),
            address: "1 Analytical Way".to_owned(),
            postal_code: "12345".to_owned(),
            city: "London".to_owned(),
        }
    }

    #[test]
    fn line_total_multiplies_price_by_quantity() {
        assert_eq!(item("10.00", 2).line_total(), "20.00".parse().unwrap());
    }

    #[test]
    fn total_cost_sums_lines() {
        let items = vec![item("10.00", 2), item("5.00", 3)];
        assert_eq!(total_cost(&items), "35.00".parse().unwrap());
    }

    #[test]
    fn total_cost_of_no_lines_is_zero() {
        assert_eq!(total_cost(&[]), Decimal::ZERO);
    }

    #[test]
    fn valid_shipping_passes() {
        assert!(shipping().validate().is_ok());
    }

    #[test]
    fn blank_field_is_rejected_by_name() {
        let mut details = shipping();
        details.city = "   ".to_owned();
        assert_eq!(details.validate(), Err(ShippingError::EmptyField("city")));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut details = shipping();
        details.email = "not-an-email".to_owned();
        assert_eq!(details.validate(), Err(ShippingError::InvalidEmail));
    }
}
