// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each lifecycle record has its own subdirectory with:
// - Value objects (status taxonomy + transition tables)
// - Events
// - Commands
// - Errors
// - Aggregate implementation
// - Command handler
//
// ============================================================================

pub mod access;
pub mod cart;
pub mod catalog;
pub mod delivery;
pub mod order;
pub mod review;
pub mod seller;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A string did not name any variant of a closed vocabulary
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

/// Human-readable reference such as `ORD-20260314-9F2C41AB`
pub fn reference_number(prefix: &str, at: DateTime<Utc>, id: Uuid) -> String {
    let suffix: String = id.simple().to_string().chars().take(8).collect();
    format!("{}-{}-{}", prefix, at.format("%Y%m%d"), suffix.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reference_number_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap();
        let id = Uuid::parse_str("9f2c41ab-0000-4000-8000-000000000000").unwrap();

        assert_eq!(reference_number("ORD", at, id), "ORD-20260314-9F2C41AB");
        assert_eq!(reference_number("DEL", at, id), "DEL-20260314-9F2C41AB");
    }
}
