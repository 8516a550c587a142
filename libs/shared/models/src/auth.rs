use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub iat: Option<u64>,
    pub role: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerRole {
    Admin,
    Staff,
    Patient,
}

/// Authenticated caller identity, produced by the auth layer and passed
/// explicitly into every mutating core operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
    pub id: Uuid,
    pub role: CallerRole,
    pub display_name: Option<String>,
}

impl Caller {
    pub fn staff(id: Uuid) -> Self {
        Self {
            id,
            role: CallerRole::Staff,
            display_name: None,
        }
    }

    pub fn patient(id: Uuid) -> Self {
        Self {
            id,
            role: CallerRole::Patient,
            display_name: None,
        }
    }

    /// Admin callers hold every staff capability.
    pub fn is_staff(&self) -> bool {
        matches!(self.role, CallerRole::Staff | CallerRole::Admin)
    }
}
