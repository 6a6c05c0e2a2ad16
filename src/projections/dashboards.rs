use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::delivery::{Delivery, DeliveryStatus};
use crate::domain::order::{Order, OrderStatus, PaymentStatus};
use super::deliveries::{claim_queue, newest_first};
use super::ratings::RatingSummary;

// ============================================================================
// Role Dashboards
// ============================================================================

fn newest_orders_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

fn count_by<T, I>(labels: I) -> BTreeMap<&'static str, usize>
where
    I: IntoIterator<Item = T>,
    T: Into<&'static str>,
{
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(label.into()).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerDashboard {
    pub active_orders: Vec<Order>,
    pub order_history: Vec<Order>,
    pub total_spent: Decimal,
}

impl CustomerDashboard {
    pub fn build(customer_id: Uuid, orders: Vec<Order>) -> Self {
        let (history, active): (Vec<Order>, Vec<Order>) = orders
            .into_iter()
            .filter(|o| o.customer_id == customer_id)
            .partition(|o| o.status.is_terminal());

        let total_spent = history
            .iter()
            .filter(|o| o.status == OrderStatus::Delivered)
            .map(|o| o.totals.total)
            .sum();

        Self {
            active_orders: newest_orders_first(active),
            order_history: newest_orders_first(history),
            total_spent,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SellerDashboard {
    /// Orders with this seller's items still in flight
    pub queue: Vec<Order>,
    /// Value of this seller's delivered items
    pub revenue: Decimal,
    pub orders_by_status: BTreeMap<&'static str, usize>,
    pub rating: RatingSummary,
}

impl SellerDashboard {
    pub fn build(seller_id: Uuid, orders: Vec<Order>, rating: RatingSummary) -> Self {
        let mine: Vec<Order> = orders.into_iter().filter(|o| o.has_seller(seller_id)).collect();

        let revenue = mine
            .iter()
            .flat_map(|o| o.items.iter())
            .filter(|item| item.seller_id == seller_id && item.status == OrderStatus::Delivered)
            .map(|item| item.total_price)
            .sum();
        let orders_by_status = count_by(mine.iter().map(|o| o.status.as_str()));
        let queue = mine.into_iter().filter(|o| !o.status.is_terminal()).collect();

        Self {
            queue: newest_orders_first(queue),
            revenue,
            orders_by_status,
            rating,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributorDashboard {
    pub available: Vec<Delivery>,
    pub active: Vec<Delivery>,
    pub history: Vec<Delivery>,
}

impl DistributorDashboard {
    pub fn build(distributor_id: Uuid, deliveries: Vec<Delivery>) -> Self {
        let (mine, others): (Vec<Delivery>, Vec<Delivery>) =
            deliveries.into_iter().partition(|d| d.is_assigned_to(distributor_id));
        let (active, history): (Vec<Delivery>, Vec<Delivery>) =
            mine.into_iter().partition(|d| d.status.is_active());

        Self {
            available: claim_queue(others),
            active: newest_first(active),
            history: newest_first(history),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub total_orders: usize,
    pub orders_by_status: BTreeMap<&'static str, usize>,
    pub deliveries_by_status: BTreeMap<&'static str, usize>,
    pub unassigned_deliveries: usize,
    /// Sum of order totals with payment received
    pub paid_revenue: Decimal,
    pub pending_certifications: usize,
}

impl AdminDashboard {
    pub fn build(orders: &[Order], deliveries: &[Delivery], pending_certifications: usize) -> Self {
        Self {
            total_orders: orders.len(),
            orders_by_status: count_by(orders.iter().map(|o| o.status.as_str())),
            deliveries_by_status: count_by(deliveries.iter().map(|d| d.status.as_str())),
            unassigned_deliveries: deliveries
                .iter()
                .filter(|d| d.status == DeliveryStatus::Pending)
                .count(),
            paid_revenue: orders
                .iter()
                .filter(|o| o.payment_status == PaymentStatus::Paid)
                .map(|o| o.totals.total)
                .sum(),
            pending_certifications,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::{Actor, Role};
    use crate::domain::delivery::aggregate::tests::{processing_order, test_open_delivery};
    use crate::domain::order::aggregate::tests::test_create_order;
    use crate::domain::order::PricingPolicy;
    use crate::domain::review::aggregate::tests::deliver;
    use crate::lifecycle::Aggregate;
    use chrono::Utc;

    fn placed(customer: Uuid, seller: Uuid) -> Order {
        let event = Order::place(
            &test_create_order(customer, seller),
            Actor::new(customer, Role::Customer),
            &PricingPolicy::default(),
            Utc::now(),
        )
        .unwrap();
        Order::apply_first_event(&event).unwrap()
    }

    #[test]
    fn test_customer_dashboard_splits_active_and_history() {
        let (mut delivered, seller) = processing_order();
        deliver(&mut delivered, seller);
        let customer = delivered.customer_id;
        let open = placed(customer, seller.id);
        let someone_else = placed(Uuid::new_v4(), seller.id);

        let dashboard = CustomerDashboard::build(customer, vec![delivered, open, someone_else]);
        assert_eq!(dashboard.active_orders.len(), 1);
        assert_eq!(dashboard.order_history.len(), 1);
        assert_eq!(dashboard.total_spent, Decimal::from(105_000));
    }

    #[test]
    fn test_seller_revenue_counts_only_delivered_items() {
        let (mut delivered, seller) = processing_order();
        deliver(&mut delivered, seller);
        let open = placed(Uuid::new_v4(), seller.id);

        let dashboard = SellerDashboard::build(seller.id, vec![delivered, open], RatingSummary::default());
        assert_eq!(dashboard.revenue, Decimal::from(100_000));
        assert_eq!(dashboard.queue.len(), 1);
        assert_eq!(dashboard.orders_by_status.get("delivered"), Some(&1));
        assert_eq!(dashboard.orders_by_status.get("pending"), Some(&1));
    }

    #[test]
    fn test_distributor_and_admin_dashboards() {
        let (order, seller) = processing_order();
        let distributor = Actor::new(Uuid::new_v4(), Role::Distributor);

        let open = |o: &Order| {
            let event = Delivery::open(&test_open_delivery(o.id), seller, o, Utc::now()).unwrap();
            Delivery::apply_first_event(&event).unwrap()
        };
        let waiting = open(&order);
        let mut carried = open(&order);
        carried.distributor_id = Some(distributor.id);
        carried.status = DeliveryStatus::InTransit;

        let dashboard = DistributorDashboard::build(distributor.id, vec![waiting.clone(), carried.clone()]);
        assert_eq!(dashboard.available.len(), 1);
        assert_eq!(dashboard.active.len(), 1);
        assert!(dashboard.history.is_empty());

        let mut paid = order.clone();
        paid.payment_status = PaymentStatus::Paid;
        let admin = AdminDashboard::build(&[paid, placed(Uuid::new_v4(), seller.id)], &[waiting, carried], 2);
        assert_eq!(admin.total_orders, 2);
        assert_eq!(admin.unassigned_deliveries, 1);
        assert_eq!(admin.paid_revenue, Decimal::from(105_000));
        assert_eq!(admin.deliveries_by_status.get("in_transit"), Some(&1));
        assert_eq!(admin.pending_certifications, 2);
    }
}
