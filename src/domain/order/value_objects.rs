use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::delivery::{DeliveryPriority, Location};
use crate::domain::UnknownVariant;
use super::errors::OrderError;

// ============================================================================
// Order Status Taxonomy
// ============================================================================
//
//   pending -> confirmed -> processing -> shipped -> delivered
//       \__________\____________\___________\_____-> cancelled | refunded
//
// delivered, cancelled and refunded are terminal.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];

    /// Every status reachable in one step from `self`
    pub fn next_states(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled, Refunded],
            Confirmed => &[Processing, Cancelled, Refunded],
            Processing => &[Shipped, Cancelled, Refunded],
            Shipped => &[Delivered, Cancelled, Refunded],
            Delivered | Cancelled | Refunded => &[],
        }
    }

    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.next_states().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        self.next_states().is_empty()
    }

    /// The single forward step of the fulfilment chain, if any
    pub fn forward(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Processing),
            OrderStatus::Processing => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => Some(OrderStatus::Delivered),
            _ => None,
        }
    }

    /// Position along the fulfilment chain; None for cancelled/refunded
    pub fn chain_position(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Processing => Some(2),
            OrderStatus::Shipped => Some(3),
            OrderStatus::Delivered => Some(4),
            OrderStatus::Cancelled | OrderStatus::Refunded => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| UnknownVariant::new("order status", s))
    }
}

// ============================================================================
// Payment Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    pub fn next_states(&self) -> &'static [PaymentStatus] {
        use PaymentStatus::*;
        match self {
            Pending => &[Paid, Failed],
            Failed => &[Pending, Paid],
            Paid => &[Refunded],
            Refunded => &[],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| UnknownVariant::new("payment status", s))
    }
}

/// Mobile money dominates; cards and bank transfers exist for larger buyers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Mpesa,
    TigoPesa,
    AirtelMoney,
    Card,
    BankTransfer,
    CashOnDelivery,
}

// ============================================================================
// Line Items & Addresses
// ============================================================================

/// A line as requested at checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// A persisted line; only `status` ever changes after placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub status: OrderStatus,
}

impl OrderItem {
    pub fn from_line(line: &OrderLine) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id: line.product_id,
            seller_id: line.seller_id,
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            total_price: line.unit_price * Decimal::from(line.quantity),
            status: OrderStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
}

/// Snapshot of the customer's address book entry at checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address_id: Option<Uuid>,
    pub recipient: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub region: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ShippingAddress {
    pub fn to_location(&self) -> Location {
        Location {
            address: format!("{}, {}, {}", self.street, self.city, self.region),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Attached by a seller when marking an order shipped; lets the delivery
/// dispatcher open the matching delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentDetails {
    pub pickup: Location,
    #[serde(default)]
    pub priority: DeliveryPriority,
    pub estimated_time: Option<chrono::DateTime<chrono::Utc>>,
}

// ============================================================================
// Pricing
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub flat_shipping_fee: Decimal,
    /// Subtotal at or above which shipping is free
    pub free_shipping_threshold: Option<Decimal>,
    /// Fraction of the subtotal, e.g. 0.18
    pub tax_rate: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            flat_shipping_fee: Decimal::from(5_000),
            free_shipping_threshold: None,
            tax_rate: Decimal::ZERO,
        }
    }
}

/// Amounts fixed at placement; never recomputed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    pub fn compute(items: &[OrderItem], policy: &PricingPolicy, discount: Decimal) -> Result<Self, OrderError> {
        let subtotal: Decimal = items.iter().map(|item| item.total_price).sum();

        if discount < Decimal::ZERO || discount > subtotal {
            return Err(OrderError::InvalidDiscount(discount));
        }

        let shipping_fee = match policy.free_shipping_threshold {
            Some(threshold) if subtotal >= threshold => Decimal::ZERO,
            _ => policy.flat_shipping_fee,
        };
        let tax = (subtotal * policy.tax_rate).round_dp(2);

        Ok(Self {
            subtotal,
            shipping_fee,
            tax,
            discount,
            total: subtotal + shipping_fee + tax - discount,
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: u32, unit_price: i64) -> OrderItem {
        OrderItem::from_line(&OrderLine {
            product_id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            name: "Sato (tilapia)".to_string(),
            quantity,
            unit_price: Decimal::from(unit_price),
        })
    }

    #[test]
    fn test_forward_chain_and_terminal_states() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));

        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Processing));

        for terminal in [OrderStatus::Delivered, OrderStatus::Cancelled, OrderStatus::Refunded] {
            assert!(terminal.is_terminal());
            for target in OrderStatus::ALL {
                assert!(!terminal.can_transition_to(target));
            }
        }
    }

    #[test]
    fn test_every_non_terminal_status_can_be_cancelled_or_refunded() {
        for status in OrderStatus::ALL.into_iter().filter(|s| !s.is_terminal()) {
            assert!(status.can_transition_to(OrderStatus::Cancelled));
            assert!(status.can_transition_to(OrderStatus::Refunded));
        }
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("lost_at_sea".parse::<OrderStatus>().is_err());
        assert_eq!(serde_json::to_string(&OrderStatus::Processing).unwrap(), "\"processing\"");
    }

    #[test]
    fn test_payment_transitions() {
        assert!(PaymentStatus::Pending.next_states().contains(&PaymentStatus::Paid));
        assert!(PaymentStatus::Failed.next_states().contains(&PaymentStatus::Pending));
        assert!(!PaymentStatus::Pending.next_states().contains(&PaymentStatus::Refunded));
        assert!(PaymentStatus::Refunded.next_states().is_empty());
    }

    #[test]
    fn test_line_total_is_quantity_times_price() {
        let item = item(3, 12_500);
        assert_eq!(item.total_price, Decimal::from(37_500));
        assert_eq!(item.status, OrderStatus::Pending);
    }

    #[test]
    fn test_totals_with_default_policy() {
        let items = vec![item(2, 30_000), item(1, 40_000)];
        let totals = OrderTotals::compute(&items, &PricingPolicy::default(), Decimal::ZERO).unwrap();

        assert_eq!(totals.subtotal, Decimal::from(100_000));
        assert_eq!(totals.shipping_fee, Decimal::from(5_000));
        assert_eq!(totals.tax, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::from(105_000));
    }

    #[test]
    fn test_totals_with_tax_threshold_and_discount() {
        let policy = PricingPolicy {
            flat_shipping_fee: Decimal::from(5_000),
            free_shipping_threshold: Some(Decimal::from(50_000)),
            tax_rate: Decimal::new(18, 2),
        };
        let items = vec![item(1, 60_000)];
        let totals = OrderTotals::compute(&items, &policy, Decimal::from(1_000)).unwrap();

        assert_eq!(totals.shipping_fee, Decimal::ZERO);
        assert_eq!(totals.tax, Decimal::from(10_800));
        assert_eq!(totals.total, Decimal::from(60_000 + 10_800 - 1_000));
        assert_eq!(
            totals.total,
            totals.subtotal + totals.shipping_fee + totals.tax - totals.discount
        );
    }

    #[test]
    fn test_discount_above_subtotal_rejected() {
        let items = vec![item(1, 1_000)];
        let result = OrderTotals::compute(&items, &PricingPolicy::default(), Decimal::from(2_000));
        assert!(matches!(result, Err(OrderError::InvalidDiscount(_))));
    }
}
