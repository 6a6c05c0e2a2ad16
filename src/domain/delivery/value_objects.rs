use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::UnknownVariant;

// ============================================================================
// Delivery Status Taxonomy
// ============================================================================
//
//   pending -> assigned -> picked_up -> in_transit -> delivered
//       \_________\____________\____________\______-> failed | cancelled
//
// delivered, failed and cancelled are terminal.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Assigned,
    PickedUp,
    InTransit,
    Delivered,
    Failed,
    Cancelled,
}

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 7] = [
        DeliveryStatus::Pending,
        DeliveryStatus::Assigned,
        DeliveryStatus::PickedUp,
        DeliveryStatus::InTransit,
        DeliveryStatus::Delivered,
        DeliveryStatus::Failed,
        DeliveryStatus::Cancelled,
    ];

    pub fn next_states(&self) -> &'static [DeliveryStatus] {
        use DeliveryStatus::*;
        match self {
            Pending => &[Assigned, Failed, Cancelled],
            Assigned => &[PickedUp, Failed, Cancelled],
            PickedUp => &[InTransit, Failed, Cancelled],
            InTransit => &[Delivered, Failed, Cancelled],
            Delivered | Failed | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: DeliveryStatus) -> bool {
        self.next_states().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        self.next_states().is_empty()
    }

    /// Statuses in which a distributor is actively carrying the parcel
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            DeliveryStatus::Assigned | DeliveryStatus::PickedUp | DeliveryStatus::InTransit
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Assigned => "assigned",
            DeliveryStatus::PickedUp => "picked_up",
            DeliveryStatus::InTransit => "in_transit",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeliveryStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| UnknownVariant::new("delivery status", s))
    }
}

/// Ordered so that `Urgent > High > Medium > Normal`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPriority {
    #[default]
    Normal,
    Medium,
    High,
    Urgent,
}

impl DeliveryPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryPriority::Normal => "normal",
            DeliveryPriority::Medium => "medium",
            DeliveryPriority::High => "high",
            DeliveryPriority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for DeliveryPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryPriority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "normal" => Ok(DeliveryPriority::Normal),
            "medium" => Ok(DeliveryPriority::Medium),
            "high" => Ok(DeliveryPriority::High),
            "urgent" => Ok(DeliveryPriority::Urgent),
            _ => Err(UnknownVariant::new("delivery priority", s)),
        }
    }
}

/// A street address with optional coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_chain() {
        use DeliveryStatus::*;
        assert!(Pending.can_transition_to(Assigned));
        assert!(Assigned.can_transition_to(PickedUp));
        assert!(PickedUp.can_transition_to(InTransit));
        assert!(InTransit.can_transition_to(Delivered));

        assert!(!Pending.can_transition_to(PickedUp));
        assert!(!InTransit.can_transition_to(Assigned));

        for status in DeliveryStatus::ALL.into_iter().filter(|s| !s.is_terminal()) {
            assert!(status.can_transition_to(Failed));
            assert!(status.can_transition_to(Cancelled));
        }
        for terminal in [Delivered, Failed, Cancelled] {
            assert!(terminal.next_states().is_empty());
        }
    }

    #[test]
    fn test_status_and_priority_parsing() {
        assert_eq!("picked_up".parse::<DeliveryStatus>().unwrap(), DeliveryStatus::PickedUp);
        assert!("lost".parse::<DeliveryStatus>().is_err());
        assert_eq!("urgent".parse::<DeliveryPriority>().unwrap(), DeliveryPriority::Urgent);
        assert_eq!(DeliveryPriority::default(), DeliveryPriority::Normal);
        assert!(DeliveryPriority::Urgent > DeliveryPriority::High);
        assert!(DeliveryPriority::Medium > DeliveryPriority::Normal);
    }
}
