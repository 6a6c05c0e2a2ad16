use super::value_objects::CertificationKind;

// ============================================================================
// Seller Profile & Certification Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CertificationError {
    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("{0} has not been claimed")]
    NotClaimed(CertificationKind),

    #[error("{0} is already approved")]
    AlreadyApproved(CertificationKind),

    #[error("Business name cannot be empty")]
    EmptyBusinessName,

    #[error("Aggregate not initialized")]
    NotInitialized,
}
