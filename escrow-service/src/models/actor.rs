//! Caller identity as asserted by the upstream gateway.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    Admin,
    Vendor,
    Customer,
}

impl ActorRole {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ADMIN" => Some(Self::Admin),
            "VENDOR" => Some(Self::Vendor),
            "CUSTOMER" => Some(Self::Customer),
            _ => None,
        }
    }
}

/// Who is calling. Authentication itself happens upstream; the gateway
/// forwards the resolved identity in headers.
#[derive(Debug, Clone, Copy)]
pub struct ActorContext {
    pub actor_id: Uuid,
    pub role: ActorRole,
}

impl ActorContext {
    pub fn is_admin(&self) -> bool {
        self.role == ActorRole::Admin
    }
}
