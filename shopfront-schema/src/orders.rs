use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct OrderItem {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub status: String,
    pub total_cents: i64,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    /// `false` when the order was priced against fallback data and not stored.
    #[serde(default = "default_persisted")]
    pub persisted: bool,
}

fn default_persisted() -> bool {
    true
}

impl Order {
    /// Sum of `unit_price_cents * quantity`, or `None` if it does not fit in an `i64`.
    pub fn checked_total(items: &[OrderItem]) -> Option<i64> {
        items.iter().try_fold(0i64, |total, item| {
            item.unit_price_cents
                .checked_mul(item.quantity)
                .and_then(|line| total.checked_add(line))
        })
    }
}

/// Validated order request: the user and the product lines to price.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NewOrder {
    pub user_id: i64,
    #[serde(default)]
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(unit_price_cents: i64, quantity: i64) -> OrderItem {
        OrderItem {
            product_id: 1,
            quantity,
            unit_price_cents,
        }
    }

    #[test]
    fn totals_sum_every_line() {
        assert_eq!(Order::checked_total(&[]), Some(0));
        assert_eq!(
            Order::checked_total(&[item(12_999, 1), item(2_400, 2)]),
            Some(17_799)
        );
    }

    #[test]
    fn totals_that_overflow_are_none() {
        assert_eq!(Order::checked_total(&[item(3_499, i64::MAX / 2)]), None);
        assert_eq!(Order::checked_total(&[item(1, i64::MAX), item(1, 1)]), None);
    }
}
