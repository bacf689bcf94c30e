//! Supplier orders placed for a client.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ClientRef, Record, ValidationError, require};
use crate::{EarSide, MagasinCode, OrderId, OrderStatus, TransitionError, Urgency};

/// One product line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub designation: String,
    #[serde(default)]
    pub reference: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub side: Option<EarSide>,
}

/// An order of products (devices, accessories, consumables) for a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub client: ClientRef,
    pub magasin: MagasinCode,
    pub products: Vec<OrderLine>,
    pub status: OrderStatus,
    #[serde(default)]
    pub urgency: Urgency,
    /// Name of the collaborator who took the order.
    #[serde(default)]
    pub collaborator: Option<String>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub ordered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Editable order fields, as posted by the order form.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderInput {
    pub client: ClientRef,
    pub products: Vec<OrderLine>,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub collaborator: Option<String>,
    #[serde(default)]
    pub notes: String,
}

impl OrderInput {
    /// Check the client reference and every product line.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a missing client name, an empty
    /// product list, a blank designation or a zero quantity.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.client.validate()?;
        if self.products.is_empty() {
            return Err(ValidationError::Required("products"));
        }
        for line in &self.products {
            require("products.designation", &line.designation)?;
            if line.quantity == 0 {
                return Err(ValidationError::OutOfRange {
                    field: "products.quantity",
                    reason: "must be at least 1".to_owned(),
                });
            }
        }
        Ok(())
    }
}

impl Order {
    /// Create a new order in status `nouvelle`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the input is incomplete.
    pub fn new(
        input: OrderInput,
        magasin: MagasinCode,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        input.validate()?;
        Ok(Self {
            id: OrderId::generate(),
            client: input.client,
            magasin,
            products: input.products,
            status: OrderStatus::Nouvelle,
            urgency: input.urgency,
            collaborator: input.collaborator,
            notes: input.notes,
            created_at: now,
            updated_at: now,
            ordered_at: None,
            received_at: None,
            delivered_at: None,
        })
    }

    /// Replace editable fields.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the input is incomplete.
    pub fn apply(&mut self, input: OrderInput, now: DateTime<Utc>) -> Result<(), ValidationError> {
        input.validate()?;
        self.client = input.client;
        self.products = input.products;
        self.urgency = input.urgency;
        self.collaborator = input.collaborator;
        self.notes = input.notes;
        self.updated_at = now;
        Ok(())
    }

    /// Move to `next`, stamping the matching milestone date.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the lifecycle forbids the move.
    pub fn set_status(
        &mut self,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.status = self.status.transition(next)?;
        match next {
            OrderStatus::Commandee => self.ordered_at = Some(now),
            OrderStatus::Recue => self.received_at = Some(now),
            OrderStatus::Livree => self.delivered_at = Some(now),
            OrderStatus::Nouvelle | OrderStatus::Annulee => {}
        }
        self.updated_at = now;
        Ok(())
    }

    /// Total number of items across lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.products
            .iter()
            .fold(0_u32, |count, l| count.saturating_add(l.quantity))
    }

    /// Work-list ordering: most urgent first, then oldest first.
    #[must_use]
    pub fn priority_cmp(&self, other: &Self) -> Ordering {
        self.urgency
            .rank()
            .cmp(&other.urgency.rank())
            .then(self.created_at.cmp(&other.created_at))
    }
}

impl Record for Order {
    const COLLECTION: &'static str = "orders";

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn magasin(&self) -> Option<&MagasinCode> {
        Some(&self.magasin)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn input(urgency: Urgency) -> OrderInput {
        OrderInput {
            client: ClientRef {
                id: None,
                name: "DUPONT Marc".to_owned(),
                phone: None,
            },
            products: vec![OrderLine {
                designation: "Piles 312".to_owned(),
                reference: None,
                quantity: 6,
                side: None,
            }],
            urgency,
            collaborator: Some("Claire".to_owned()),
            notes: String::new(),
        }
    }

    fn magasin() -> MagasinCode {
        MagasinCode::parse("BEA").unwrap()
    }

    #[test]
    fn test_new_order_starts_as_nouvelle() {
        let order = Order::new(input(Urgency::Normale), magasin(), Utc::now()).unwrap();
        assert_eq!(order.status, OrderStatus::Nouvelle);
        assert_eq!(order.item_count(), 6);
    }

    #[test]
    fn test_rejects_empty_products_and_zero_quantity() {
        let mut bad = input(Urgency::Normale);
        bad.products.clear();
        assert_eq!(
            Order::new(bad, magasin(), Utc::now()).unwrap_err(),
            ValidationError::Required("products")
        );

        let mut bad = input(Urgency::Normale);
        bad.products[0].quantity = 0;
        assert!(matches!(
            Order::new(bad, magasin(), Utc::now()),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_status_changes_stamp_dates() {
        let now = Utc::now();
        let mut order = Order::new(input(Urgency::Normale), magasin(), now).unwrap();
        order.set_status(OrderStatus::Commandee, now).unwrap();
        assert_eq!(order.ordered_at, Some(now));
        order.set_status(OrderStatus::Recue, now).unwrap();
        order.set_status(OrderStatus::Livree, now).unwrap();
        assert_eq!(order.delivered_at, Some(now));
        assert!(order.set_status(OrderStatus::Annulee, now).is_err());
    }

    #[test]
    fn test_priority_sorts_urgent_then_oldest() {
        let t0 = Utc::now();
        let old_normal = Order::new(input(Urgency::Normale), magasin(), t0).unwrap();
        let new_urgent =
            Order::new(input(Urgency::Urgente), magasin(), t0 + Duration::hours(1)).unwrap();
        let old_urgent = Order::new(input(Urgency::Urgente), magasin(), t0).unwrap();

        let mut orders = vec![old_normal.clone(), new_urgent.clone(), old_urgent.clone()];
        orders.sort_by(Order::priority_cmp);
        let ids: Vec<_> = orders.iter().map(|o| o.id.clone()).collect();
        assert_eq!(ids, vec![old_urgent.id, new_urgent.id, old_normal.id]);
    }
}
