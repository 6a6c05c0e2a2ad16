use serde::{Deserialize, Serialize};

use crate::domain::access::Actor;
use super::errors::CertificationError;
use super::value_objects::CertificationKind;

/// Editable profile fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDetails {
    pub business_name: String,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl ProfileDetails {
    /// Trimmed business name, which must not be blank
    pub fn business_name(&self) -> Result<&str, CertificationError> {
        let name = self.business_name.trim();
        if name.is_empty() {
            return Err(CertificationError::EmptyBusinessName);
        }
        Ok(name)
    }
}

#[derive(Debug, Clone)]
pub enum SellerCommand {
    SaveProfile {
        actor: Actor,
        details: ProfileDetails,
        logo_url: Option<String>,
    },
    SetCertification {
        actor: Actor,
        kind: CertificationKind,
        certified: bool,
    },
    ApproveCertification {
        actor: Actor,
        kind: CertificationKind,
    },
}
