use std::cmp::Reverse;

use crate::domain::delivery::{Delivery, DeliveryStatus};

/// Pending deliveries, most urgent first, then longest waiting
pub fn claim_queue(deliveries: Vec<Delivery>) -> Vec<Delivery> {
    let mut pending: Vec<Delivery> = deliveries
        .into_iter()
        .filter(|d| d.status == DeliveryStatus::Pending)
        .collect();
    pending.sort_by_key(|d| (Reverse(d.priority), d.created_at));
    pending
}

pub fn newest_first(mut deliveries: Vec<Delivery>) -> Vec<Delivery> {
    deliveries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    deliveries
}
