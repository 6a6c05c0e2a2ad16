use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::access::Actor;
use super::value_objects::{DeliveryPriority, DeliveryStatus, Location};

// ============================================================================
// Delivery Commands
// ============================================================================

/// Open the delivery for an order; the drop-off defaults to the order's
/// shipping address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenDelivery {
    pub order_id: Uuid,
    pub pickup: Location,
    #[serde(default)]
    pub dropoff: Option<Location>,
    #[serde(default)]
    pub priority: DeliveryPriority,
    pub estimated_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub enum DeliveryCommand {
    Assign {
        actor: Actor,
        distributor_id: Uuid,
    },
    ChangeStatus {
        actor: Actor,
        to: DeliveryStatus,
        note: Option<String>,
    },
    UpdateEstimate {
        actor: Actor,
        estimated_time: Option<DateTime<Utc>>,
    },
    Reprioritize {
        actor: Actor,
        priority: DeliveryPriority,
    },
}
