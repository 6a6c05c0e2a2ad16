use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::access::Actor;
use crate::lifecycle::DomainEvent;
use super::value_objects::CertificationKind;

// ============================================================================
// Seller Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SellerEvent {
    ProfileSaved(SellerProfileSaved),
    CertificationClaimed(CertificationChanged),
    CertificationWithdrawn(CertificationChanged),
    CertificationApproved(CertificationChanged),
}

impl DomainEvent for SellerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SellerEvent::ProfileSaved(_) => "SellerProfileSaved",
            SellerEvent::CertificationClaimed(_) => "CertificationClaimed",
            SellerEvent::CertificationWithdrawn(_) => "CertificationWithdrawn",
            SellerEvent::CertificationApproved(_) => "CertificationApproved",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerProfileSaved {
    pub seller_id: Uuid,
    pub business_name: String,
    pub location: Option<String>,
    pub description: Option<String>,
    /// Replaces the stored logo only when present
    pub logo_url: Option<String>,
    pub saved_by: Actor,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificationChanged {
    pub kind: CertificationKind,
    pub changed_by: Actor,
    pub changed_at: DateTime<Utc>,
}
