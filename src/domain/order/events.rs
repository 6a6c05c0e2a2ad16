use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::access::Actor;
use crate::lifecycle::DomainEvent;
use super::value_objects::{
    CustomerContact, OrderItem, OrderStatus, OrderTotals, PaymentMethod, PaymentStatus,
    ShipmentDetails, ShippingAddress,
};

// ============================================================================
// Order Events - Domain Events for the Order Aggregate
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Placed(OrderPlaced),
    StatusChanged(OrderStatusChanged),
    ItemStatusChanged(OrderItemStatusChanged),
    PaymentStatusChanged(OrderPaymentStatusChanged),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Placed(_) => "OrderPlaced",
            OrderEvent::StatusChanged(_) => "OrderStatusChanged",
            OrderEvent::ItemStatusChanged(_) => "OrderItemStatusChanged",
            OrderEvent::PaymentStatusChanged(_) => "OrderPaymentStatusChanged",
        }
    }
}

/// Order Placed - Initial event in the order lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub contact: CustomerContact,
    pub items: Vec<OrderItem>,
    pub totals: OrderTotals,
    pub payment_method: PaymentMethod,
    pub shipping_address: ShippingAddress,
    pub notes: Option<String>,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusChanged {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub note: Option<String>,
    pub changed_by: Actor,
    /// Present only on a change to `shipped` that requests a delivery
    pub shipment: Option<ShipmentDetails>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemStatusChanged {
    pub item_id: Uuid,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub changed_by: Actor,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPaymentStatusChanged {
    pub from: PaymentStatus,
    pub to: PaymentStatus,
    pub changed_by: Actor,
    pub changed_at: DateTime<Utc>,
}
