use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::access::{Actor, Role};
use crate::domain::order::{Order, OrderStatus};
use crate::domain::reference_number;
use crate::lifecycle::Aggregate;
use crate::store::Record;
use super::commands::{DeliveryCommand, OpenDelivery};
use super::errors::DeliveryError;
use super::events::*;
use super::value_objects::{DeliveryPriority, DeliveryStatus, Location};

// ============================================================================
// Delivery Aggregate - Domain Logic
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    // Identity
    pub id: Uuid,
    pub delivery_number: String,
    pub version: i64,

    // Order it fulfils (1:1)
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub seller_ids: Vec<Uuid>,

    pub pickup: Location,
    pub dropoff: Location,
    pub distributor_id: Option<Uuid>,
    pub status: DeliveryStatus,
    pub priority: DeliveryPriority,
    pub estimated_time: Option<DateTime<Utc>>,
    pub pickup_time: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Delivery {
    /// Validate an open request against the order and produce `Opened`
    pub fn open(
        command: &OpenDelivery,
        actor: Actor,
        order: &Order,
        now: DateTime<Utc>,
    ) -> Result<DeliveryEvent, DeliveryError> {
        let allowed = actor.is_admin() || (actor.role == Role::Seller && order.has_seller(actor.id));
        if !allowed {
            return Err(DeliveryError::Forbidden(format!(
                "{} may not open a delivery for order {}",
                actor.role, order.order_number
            )));
        }

        if !matches!(order.status, OrderStatus::Processing | OrderStatus::Shipped) {
            return Err(DeliveryError::OrderNotShippable(order.status));
        }

        let delivery_id = Uuid::new_v4();
        Ok(DeliveryEvent::Opened(DeliveryOpened {
            delivery_id,
            delivery_number: reference_number("DEL", now, delivery_id),
            order_id: order.id,
            order_number: order.order_number.clone(),
            customer_id: order.customer_id,
            seller_ids: order.seller_ids().into_iter().collect(),
            pickup: command.pickup.clone(),
            dropoff: command
                .dropoff
                .clone()
                .unwrap_or_else(|| order.shipping_address.to_location()),
            priority: command.priority,
            estimated_time: command.estimated_time,
            notes: command.notes.clone(),
            opened_by: actor,
            opened_at: now,
        }))
    }

    pub fn is_assigned_to(&self, distributor_id: Uuid) -> bool {
        self.distributor_id == Some(distributor_id)
    }

    fn forbidden(&self, actor: &Actor, action: &str) -> DeliveryError {
        DeliveryError::Forbidden(format!(
            "{} may not {} delivery {}",
            actor.role, action, self.delivery_number
        ))
    }

    fn authorize_status_change(&self, actor: &Actor, to: DeliveryStatus) -> Result<(), DeliveryError> {
        let allowed = match actor.role {
            Role::Admin => true,
            Role::Distributor => self.is_assigned_to(actor.id) && to != DeliveryStatus::Cancelled,
            Role::Seller => {
                self.seller_ids.contains(&actor.id)
                    && to == DeliveryStatus::Cancelled
                    && self.status == DeliveryStatus::Pending
            }
            Role::Customer => false,
        };

        if allowed {
            Ok(())
        } else {
            Err(self.forbidden(actor, &format!("move to {}", to)))
        }
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for Delivery {
    type Event = DeliveryEvent;
    type Command = DeliveryCommand;
    type Error = DeliveryError;

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            DeliveryEvent::Opened(e) => Ok(Self {
                id: e.delivery_id,
                delivery_number: e.delivery_number.clone(),
                version: 1,
                order_id: e.order_id,
                order_number: e.order_number.clone(),
                customer_id: e.customer_id,
                seller_ids: e.seller_ids.clone(),
                pickup: e.pickup.clone(),
                dropoff: e.dropoff.clone(),
                distributor_id: None,
                status: DeliveryStatus::Pending,
                priority: e.priority,
                estimated_time: e.estimated_time,
                pickup_time: None,
                delivery_time: None,
                notes: e.notes.clone(),
                created_at: e.opened_at,
                updated_at: e.opened_at,
            }),
            _ => Err(DeliveryError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            DeliveryEvent::Opened(_) => return Err(DeliveryError::NotInitialized),
            DeliveryEvent::Assigned(e) => {
                self.distributor_id = Some(e.distributor_id);
                self.status = DeliveryStatus::Assigned;
                self.updated_at = e.assigned_at;
            }
            DeliveryEvent::StatusChanged(e) => {
                self.status = e.to;
                match e.to {
                    DeliveryStatus::PickedUp => self.pickup_time = Some(e.changed_at),
                    DeliveryStatus::Delivered => self.delivery_time = Some(e.changed_at),
                    _ => {}
                }
                if let Some(note) = &e.note {
                    self.notes = Some(note.clone());
                }
                self.updated_at = e.changed_at;
            }
            DeliveryEvent::EstimateUpdated(e) => {
                self.estimated_time = e.estimated_time;
                self.updated_at = e.changed_at;
            }
            DeliveryEvent::Reprioritized(e) => {
                self.priority = e.to;
                self.updated_at = e.changed_at;
            }
        }

        self.version += 1;
        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let now = Utc::now();

        match command {
            DeliveryCommand::Assign { actor, distributor_id } => {
                if self.status != DeliveryStatus::Pending || self.distributor_id.is_some() {
                    return Err(DeliveryError::AlreadyAssigned(self.id));
                }

                let allowed = actor.is_admin() || actor.is(Role::Distributor, *distributor_id);
                if !allowed {
                    return Err(self.forbidden(actor, "assign"));
                }

                Ok(vec![DeliveryEvent::Assigned(DeliveryAssigned {
                    distributor_id: *distributor_id,
                    assigned_by: *actor,
                    assigned_at: now,
                })])
            }

            DeliveryCommand::ChangeStatus { actor, to, note } => {
                // Assignment only happens through the claim path
                if *to == DeliveryStatus::Assigned || !self.status.can_transition_to(*to) {
                    return Err(DeliveryError::InvalidTransition { from: self.status, to: *to });
                }
                self.authorize_status_change(actor, *to)?;

                Ok(vec![DeliveryEvent::StatusChanged(DeliveryStatusChanged {
                    from: self.status,
                    to: *to,
                    note: note.clone(),
                    changed_by: *actor,
                    changed_at: now,
                })])
            }

            DeliveryCommand::UpdateEstimate { actor, estimated_time } => {
                if self.status.is_terminal() {
                    return Err(DeliveryError::InvalidTransition { from: self.status, to: self.status });
                }

                let allowed = actor.is_admin()
                    || (actor.role == Role::Distributor && self.is_assigned_to(actor.id))
                    || (actor.role == Role::Seller && self.seller_ids.contains(&actor.id));
                if !allowed {
                    return Err(self.forbidden(actor, "re-estimate"));
                }

                Ok(vec![DeliveryEvent::EstimateUpdated(DeliveryEstimateUpdated {
                    estimated_time: *estimated_time,
                    changed_by: *actor,
                    changed_at: now,
                })])
            }

            DeliveryCommand::Reprioritize { actor, priority } => {
                if !actor.is_admin() {
                    return Err(self.forbidden(actor, "reprioritize"));
                }
                if self.status.is_terminal() {
                    return Err(DeliveryError::InvalidTransition { from: self.status, to: self.status });
                }

                Ok(vec![DeliveryEvent::Reprioritized(DeliveryReprioritized {
                    from: self.priority,
                    to: *priority,
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

impl Record for Delivery {
    const KIND: &'static str = "deliveries";

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
