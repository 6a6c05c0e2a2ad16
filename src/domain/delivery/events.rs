use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::access::Actor;
use crate::lifecycle::DomainEvent;
use super::value_objects::{DeliveryPriority, DeliveryStatus, Location};

// ============================================================================
// Delivery Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum DeliveryEvent {
    Opened(DeliveryOpened),
    Assigned(DeliveryAssigned),
    StatusChanged(DeliveryStatusChanged),
    EstimateUpdated(DeliveryEstimateUpdated),
    Reprioritized(DeliveryReprioritized),
}

impl DomainEvent for DeliveryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DeliveryEvent::Opened(_) => "DeliveryOpened",
            DeliveryEvent::Assigned(_) => "DeliveryAssigned",
            DeliveryEvent::StatusChanged(_) => "DeliveryStatusChanged",
            DeliveryEvent::EstimateUpdated(_) => "DeliveryEstimateUpdated",
            DeliveryEvent::Reprioritized(_) => "DeliveryReprioritized",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryOpened {
    pub delivery_id: Uuid,
    pub delivery_number: String,
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub seller_ids: Vec<Uuid>,
    pub pickup: Location,
    pub dropoff: Location,
    pub priority: DeliveryPriority,
    pub estimated_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub opened_by: Actor,
    pub opened_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAssigned {
    pub distributor_id: Uuid,
    pub assigned_by: Actor,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatusChanged {
    pub from: DeliveryStatus,
    pub to: DeliveryStatus,
    pub note: Option<String>,
    pub changed_by: Actor,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryEstimateUpdated {
    pub estimated_time: Option<DateTime<Utc>>,
    pub changed_by: Actor,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReprioritized {
    pub from: DeliveryPriority,
    pub to: DeliveryPriority,
    pub changed_by: Actor,
    pub changed_at: DateTime<Utc>,
}
