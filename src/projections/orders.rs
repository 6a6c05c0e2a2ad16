use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::order::{Order, OrderStatus};

/// Criteria for order listings and exports; unset fields match everything
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub customer_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    /// Inclusive, by creation date (UTC)
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Case-insensitive match on order number, customer name/email or item names
    pub search: Option<String>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        let created = order.created_at.date_naive();

        self.customer_id.map_or(true, |id| order.customer_id == id)
            && self.seller_id.map_or(true, |id| order.has_seller(id))
            && self.status.map_or(true, |s| order.status == s)
            && self.from.map_or(true, |from| created >= from)
            && self.to.map_or(true, |to| created <= to)
            && self.search_matches(order)
    }

    fn search_matches(&self, order: &Order) -> bool {
        let needle = match self.search.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_lowercase(),
            _ => return true,
        };

        std::iter::once(order.order_number.as_str())
            .chain([order.contact.name.as_str(), order.contact.email.as_str()])
            .chain(order.items.iter().map(|item| item.name.as_str()))
            .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Matching orders, newest first
    pub fn apply(&self, orders: Vec<Order>) -> Vec<Order> {
        let mut matching: Vec<Order> = orders.into_iter().filter(|o| self.matches(o)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching
    }
}
