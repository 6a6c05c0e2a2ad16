use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::access::Actor;
use super::value_objects::{
    CustomerContact, OrderLine, OrderStatus, PaymentMethod, PaymentStatus, ShipmentDetails,
    ShippingAddress,
};

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

/// Checkout request; creates the order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub contact: CustomerContact,
    pub lines: Vec<OrderLine>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub discount: Decimal,
}

#[derive(Debug, Clone)]
pub enum OrderCommand {
    ChangeStatus {
        actor: Actor,
        to: OrderStatus,
        note: Option<String>,
        shipment: Option<ShipmentDetails>,
    },
    Cancel {
        actor: Actor,
        reason: Option<String>,
    },
    ChangeItemStatus {
        actor: Actor,
        item_id: Uuid,
        to: OrderStatus,
    },
    ChangePaymentStatus {
        actor: Actor,
        to: PaymentStatus,
    },
}

impl OrderCommand {
    pub fn actor(&self) -> Actor {
        match self {
            OrderCommand::ChangeStatus { actor, .. }
            | OrderCommand::Cancel { actor, .. }
            | OrderCommand::ChangeItemStatus { actor, .. }
            | OrderCommand::ChangePaymentStatus { actor, .. } => *actor,
        }
    }
}
