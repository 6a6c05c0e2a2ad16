use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::UnknownVariant;

// ============================================================================
// Certifications
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificationKind {
    Haccp,
    Gap,
    Gmp,
    Msc,
    Asc,
}

impl CertificationKind {
    pub const ALL: [CertificationKind; 5] = [
        CertificationKind::Haccp,
        CertificationKind::Gap,
        CertificationKind::Gmp,
        CertificationKind::Msc,
        CertificationKind::Asc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CertificationKind::Haccp => "haccp",
            CertificationKind::Gap => "gap",
            CertificationKind::Gmp => "gmp",
            CertificationKind::Msc => "msc",
            CertificationKind::Asc => "asc",
        }
    }
}

impl fmt::Display for CertificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertificationKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        CertificationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| UnknownVariant::new("certification", s))
    }
}

/// Flag set for one certification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationState {
    pub certified: bool,
    pub pending_approval: bool,
    pub approved: bool,
}

impl CertificationState {
    /// A claim that is not yet approved always waits for review
    pub fn claim(&mut self) {
        self.certified = true;
        self.pending_approval = !self.approved;
    }

    pub fn withdraw(&mut self) {
        *self = CertificationState::default();
    }

    pub fn approve(&mut self) {
        self.approved = true;
        self.pending_approval = false;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certifications {
    pub haccp: CertificationState,
    pub gap: CertificationState,
    pub gmp: CertificationState,
    pub msc: CertificationState,
    pub asc: CertificationState,
}

impl Certifications {
    pub fn get(&self, kind: CertificationKind) -> &CertificationState {
        match kind {
            CertificationKind::Haccp => &self.haccp,
            CertificationKind::Gap => &self.gap,
            CertificationKind::Gmp => &self.gmp,
            CertificationKind::Msc => &self.msc,
            CertificationKind::Asc => &self.asc,
        }
    }

    pub fn get_mut(&mut self, kind: CertificationKind) -> &mut CertificationState {
        match kind {
            CertificationKind::Haccp => &mut self.haccp,
            CertificationKind::Gap => &mut self.gap,
            CertificationKind::Gmp => &mut self.gmp,
            CertificationKind::Msc => &mut self.msc,
            CertificationKind::Asc => &mut self.asc,
        }
    }

    /// Claims waiting for an admin
    pub fn pending(&self) -> Vec<CertificationKind> {
        CertificationKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).pending_approval)
            .collect()
    }
}
