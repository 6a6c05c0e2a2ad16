use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::access::{Actor, Role};
use crate::lifecycle::Aggregate;
use crate::store::Record;
use super::commands::{ProfileDetails, SellerCommand};
use super::errors::CertificationError;
use super::events::*;
use super::value_objects::Certifications;

// ============================================================================
// Seller Profile Aggregate
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerProfile {
    /// Same as the seller's user id
    pub id: Uuid,
    pub version: i64,

    pub business_name: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub certifications: Certifications,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SellerProfile {
    /// First save of a seller's profile
    pub fn create(
        seller_id: Uuid,
        actor: Actor,
        details: &ProfileDetails,
        logo_url: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<SellerEvent, CertificationError> {
        authorize_owner(&actor, seller_id)?;
        profile_saved(seller_id, actor, details, logo_url, now)
    }
}

fn authorize_owner(actor: &Actor, seller_id: Uuid) -> Result<(), CertificationError> {
    if actor.is_admin() || actor.is(Role::Seller, seller_id) {
        Ok(())
    } else {
        Err(CertificationError::Forbidden(
            "sellers only edit their own profile".to_string(),
        ))
    }
}

fn profile_saved(
    seller_id: Uuid,
    actor: Actor,
    details: &ProfileDetails,
    logo_url: Option<String>,
    now: DateTime<Utc>,
) -> Result<SellerEvent, CertificationError> {
    Ok(SellerEvent::ProfileSaved(SellerProfileSaved {
        seller_id,
        business_name: details.business_name()?.to_string(),
        location: details.location.clone(),
        description: details.description.clone(),
        logo_url,
        saved_by: actor,
        saved_at: now,
    }))
}

impl Aggregate for SellerProfile {
    type Event = SellerEvent;
    type Command = SellerCommand;
    type Error = CertificationError;

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            SellerEvent::ProfileSaved(e) => Ok(Self {
                id: e.seller_id,
                version: 1,
                business_name: e.business_name.clone(),
                location: e.location.clone(),
                description: e.description.clone(),
                logo_url: e.logo_url.clone(),
                certifications: Certifications::default(),
                created_at: e.saved_at,
                updated_at: e.saved_at,
            }),
            _ => Err(CertificationError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            SellerEvent::ProfileSaved(e) => {
                self.business_name = e.business_name.clone();
                self.location = e.location.clone();
                self.description = e.description.clone();
                if let Some(url) = &e.logo_url {
                    self.logo_url = Some(url.clone());
                }
                self.updated_at = e.saved_at;
            }
            SellerEvent::CertificationClaimed(e) => {
                self.certifications.get_mut(e.kind).claim();
                self.updated_at = e.changed_at;
            }
            SellerEvent::CertificationWithdrawn(e) => {
                self.certifications.get_mut(e.kind).withdraw();
                self.updated_at = e.changed_at;
            }
            SellerEvent::CertificationApproved(e) => {
                self.certifications.get_mut(e.kind).approve();
                self.updated_at = e.changed_at;
            }
        }

        self.version += 1;
        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let now = Utc::now();

        match command {
            SellerCommand::SaveProfile { actor, details, logo_url } => {
                authorize_owner(actor, self.id)?;
                Ok(vec![profile_saved(self.id, *actor, details, logo_url.clone(), now)?])
            }

            SellerCommand::SetCertification { actor, kind, certified } => {
                authorize_owner(actor, self.id)?;

                let state = self.certifications.get(*kind);
                let change = CertificationChanged { kind: *kind, changed_by: *actor, changed_at: now };
                // Re-sending the current flag is a no-op
                match (*certified, state.certified) {
                    (true, false) => Ok(vec![SellerEvent::CertificationClaimed(change)]),
                    (false, true) => Ok(vec![SellerEvent::CertificationWithdrawn(change)]),
                    _ => Ok(vec![]),
                }
            }

            SellerCommand::ApproveCertification { actor, kind } => {
                if !actor.is_admin() {
                    return Err(CertificationError::Forbidden(
                        "certifications are approved by admins".to_string(),
                    ));
                }

                let state = self.certifications.get(*kind);
                if !state.certified {
                    return Err(CertificationError::NotClaimed(*kind));
                }
                if state.approved {
                    return Err(CertificationError::AlreadyApproved(*kind));
                }

                Ok(vec![SellerEvent::CertificationApproved(CertificationChanged {
                    kind: *kind,
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

impl Record for SellerProfile {
    const KIND: &'static str = "seller_profiles";

    fn record_id(&self) -> Uuid {
        self.id
    }

    fn record_version(&self) -> i64 {
        self.version
    }

    fn status_label(&self) -> &'static str {
        if self.certifications.pending().is_empty() {
            "active"
        } else {
            "awaiting_review"
        }
    }
}
