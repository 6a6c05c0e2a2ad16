use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::access::{Actor, Role};
use crate::domain::reference_number;
use crate::lifecycle::Aggregate;
use crate::store::Record;
use super::commands::{OrderCommand, PlaceOrder};
use super::errors::OrderError;
use super::events::*;
use super::value_objects::{
    CustomerContact, OrderItem, OrderStatus, OrderTotals, PaymentMethod, PaymentStatus,
    PricingPolicy, ShippingAddress,
};

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    // Identity
    pub id: Uuid,
    pub order_number: String,
    pub version: i64,

    pub customer_id: Uuid,
    pub contact: CustomerContact,
    pub items: Vec<OrderItem>,
    pub totals: OrderTotals,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub shipping_address: ShippingAddress,
    pub notes: Option<String>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Validate a checkout request and produce the `Placed` event
    pub fn place(
        command: &PlaceOrder,
        actor: Actor,
        policy: &PricingPolicy,
        now: DateTime<Utc>,
    ) -> Result<OrderEvent, OrderError> {
        if !(actor.is(Role::Customer, command.customer_id) || actor.is_admin()) {
            return Err(OrderError::Forbidden(
                "orders are placed by the customer they belong to".to_string(),
            ));
        }

        if command.lines.is_empty() {
            return Err(OrderError::EmptyItems);
        }

        for line in &command.lines {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity(line.quantity));
            }
            if line.unit_price < Decimal::ZERO {
                return Err(OrderError::InvalidPrice(line.unit_price));
            }
        }

        let items: Vec<OrderItem> = command.lines.iter().map(OrderItem::from_line).collect();
        let totals = OrderTotals::compute(&items, policy, command.discount)?;

        Ok(OrderEvent::Placed(OrderPlaced {
            order_id: command.order_id,
            order_number: reference_number("ORD", now, command.order_id),
            customer_id: command.customer_id,
            contact: command.contact.clone(),
            items,
            totals,
            payment_method: command.payment_method,
            shipping_address: command.shipping_address.clone(),
            notes: command.notes.clone(),
            placed_at: now,
        }))
    }

    pub fn has_seller(&self, seller_id: Uuid) -> bool {
        self.items.iter().any(|item| item.seller_id == seller_id)
    }

    pub fn seller_ids(&self) -> BTreeSet<Uuid> {
        self.items.iter().map(|item| item.seller_id).collect()
    }

    pub fn item(&self, item_id: Uuid) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Distributors see orders through their deliveries; everyone else
    /// must be a party to the order.
    pub fn can_view(&self, actor: &Actor) -> bool {
        match actor.role {
            Role::Admin | Role::Distributor => true,
            Role::Customer => actor.id == self.customer_id,
            Role::Seller => self.has_seller(actor.id),
        }
    }

    /// Capability check for an order-level status change that already
    /// passed the transition guard.
    fn authorize_status_change(&self, actor: &Actor, to: OrderStatus) -> Result<(), OrderError> {
        let allowed = match actor.role {
            Role::Admin => true,
            Role::Seller => {
                self.has_seller(actor.id)
                    && (self.status.forward() == Some(to)
                        || (to == OrderStatus::Cancelled && self.status == OrderStatus::Pending))
            }
            Role::Customer => {
                actor.id == self.customer_id
                    && to == OrderStatus::Cancelled
                    && self.status == OrderStatus::Pending
            }
            Role::Distributor => false,
        };

        if allowed {
            Ok(())
        } else {
            Err(OrderError::Forbidden(format!(
                "{} may not move order {} to {}",
                actor.role, self.order_number, to
            )))
        }
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for Order {
    type Event = OrderEvent;
    type Command = OrderCommand;
    type Error = OrderError;

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            OrderEvent::Placed(e) => Ok(Self {
                id: e.order_id,
                order_number: e.order_number.clone(),
                version: 1,
                customer_id: e.customer_id,
                contact: e.contact.clone(),
                items: e.items.clone(),
                totals: e.totals.clone(),
                status: OrderStatus::Pending,
                payment_status: PaymentStatus::Pending,
                payment_method: e.payment_method,
                shipping_address: e.shipping_address.clone(),
                notes: e.notes.clone(),
                created_at: e.placed_at,
                updated_at: e.placed_at,
            }),
            _ => Err(OrderError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            OrderEvent::Placed(_) => return Err(OrderError::NotInitialized),
            OrderEvent::StatusChanged(e) => {
                self.status = e.to;
                // Order-level changes drive the lines that are behind
                for item in self.items.iter_mut() {
                    let behind = match (item.status.chain_position(), e.to.chain_position()) {
                        (Some(current), Some(target)) => current < target,
                        (Some(_), None) => true,
                        (None, _) => false,
                    };
                    if behind && !item.status.is_terminal() {
                        item.status = e.to;
                    }
                }
                self.updated_at = e.changed_at;
            }
            OrderEvent::ItemStatusChanged(e) => {
                let item = self
                    .items
                    .iter_mut()
                    .find(|item| item.id == e.item_id)
                    .ok_or(OrderError::ItemNotFound(e.item_id))?;
                item.status = e.to;
                self.updated_at = e.changed_at;
            }
            OrderEvent::PaymentStatusChanged(e) => {
                self.payment_status = e.to;
                self.updated_at = e.changed_at;
            }
        }

        self.version += 1;
        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let now = Utc::now();

        match command {
            OrderCommand::ChangeStatus { actor, to, note, shipment } => {
                if !self.status.can_transition_to(*to) {
                    return Err(OrderError::InvalidTransition { from: self.status, to: *to });
                }
                self.authorize_status_change(actor, *to)?;

                if shipment.is_some() && *to != OrderStatus::Shipped {
                    return Err(OrderError::UnexpectedShipment);
                }

                Ok(vec![OrderEvent::StatusChanged(OrderStatusChanged {
                    from: self.status,
                    to: *to,
                    note: note.clone(),
                    changed_by: *actor,
                    shipment: shipment.clone(),
                    changed_at: now,
                })])
            }

            OrderCommand::Cancel { actor, reason } => {
                // The cancel operation is the pending-only path; admins use
                // ChangeStatus for later overrides.
                if self.status != OrderStatus::Pending {
                    return Err(OrderError::InvalidTransition {
                        from: self.status,
                        to: OrderStatus::Cancelled,
                    });
                }

                let party = actor.is_admin()
                    || actor.is(Role::Customer, self.customer_id)
                    || (actor.role == Role::Seller && self.has_seller(actor.id));
                if !party {
                    return Err(OrderError::Forbidden(format!(
                        "{} is not a party to order {}",
                        actor.role, self.order_number
                    )));
                }

                Ok(vec![OrderEvent::StatusChanged(OrderStatusChanged {
                    from: self.status,
                    to: OrderStatus::Cancelled,
                    note: reason.clone(),
                    changed_by: *actor,
                    shipment: None,
                    changed_at: now,
                })])
            }

            OrderCommand::ChangeItemStatus { actor, item_id, to } => {
                let item = self.item(*item_id).ok_or(OrderError::ItemNotFound(*item_id))?;

                if !item.status.can_transition_to(*to) {
                    return Err(OrderError::InvalidTransition { from: item.status, to: *to });
                }

                let allowed = actor.is_admin()
                    || (actor.is(Role::Seller, item.seller_id)
                        && (item.status.forward() == Some(*to)
                            || (*to == OrderStatus::Cancelled && item.status == OrderStatus::Pending)));
                if !allowed {
                    return Err(OrderError::Forbidden(format!(
                        "{} may not move item {} to {}",
                        actor.role, item.name, to
                    )));
                }

                Ok(vec![OrderEvent::ItemStatusChanged(OrderItemStatusChanged {
                    item_id: *item_id,
                    from: item.status,
                    to: *to,
                    changed_by: *actor,
                    changed_at: now,
                })])
            }

            OrderCommand::ChangePaymentStatus { actor, to } => {
                if !actor.is_admin() {
                    return Err(OrderError::Forbidden(
                        "payment status is managed by admins".to_string(),
                    ));
                }
                if !self.payment_status.next_states().contains(to) {
                    return Err(OrderError::InvalidPaymentTransition {
                        from: self.payment_status,
                        to: *to,
                    });
                }

                Ok(vec![OrderEvent::PaymentStatusChanged(OrderPaymentStatusChanged {
                    from: self.payment_status,
                    to: *to,
                    changed_by: *actor,
                    changed_at: now,
                })])
            }
        }
    }

    fn version(&self) -> i64 {
        self.version
    }
}

impl Record for Order {
    const KIND: &'static str = "orders";

    fn record_id(&self) -> Uuid {
        self.id
    }

    fn record_version(&self) -> i64 {
        self.version
    }

    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
