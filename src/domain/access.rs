use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UnknownVariant;

// ============================================================================
// Roles & Actors
// ============================================================================
//
// Identity is established upstream by the auth backend; every mutating
// operation receives the resulting Actor explicitly and re-checks
// capabilities against it.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Seller,
    Distributor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Seller => "seller",
            Role::Distributor => "distributor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "seller" => Ok(Role::Seller),
            "distributor" => Ok(Role::Distributor),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownVariant::new("role", s)),
        }
    }
}

/// The authenticated caller of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True when the actor has `role` and is the owner `owner_id`
    pub fn is(&self, role: Role, owner_id: Uuid) -> bool {
        self.role == role && self.id == owner_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_is_case_insensitive() {
        assert_eq!("Seller".parse::<Role>().unwrap(), Role::Seller);
        assert_eq!(" admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!("fisherman".parse::<Role>().is_err());
    }

    #[test]
    fn test_actor_ownership() {
        let id = Uuid::new_v4();
        let actor = Actor::new(id, Role::Customer);

        assert!(actor.is(Role::Customer, id));
        assert!(!actor.is(Role::Seller, id));
        assert!(!actor.is(Role::Customer, Uuid::new_v4()));
        assert!(!actor.is_admin());
    }
}
