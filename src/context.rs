//! Request Context
//!
//! Tenant and actor identity for one inbound operation. Authentication and
//! authorization happen upstream; this crate only carries the resolved
//! identity through every operation as an explicit parameter.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Teacher,
    Admin,
    SuperAdmin,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Teacher => "teacher",
            ActorRole::Admin => "admin",
            ActorRole::SuperAdmin => "super_admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "teacher" => Some(ActorRole::Teacher),
            "admin" => Some(ActorRole::Admin),
            "super_admin" => Some(ActorRole::SuperAdmin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    pub tenant_id: String,
    pub actor_id: String,
    pub actor_role: ActorRole,
}

impl RequestContext {
    pub fn new(tenant_id: impl Into<String>, actor_id: impl Into<String>, actor_role: ActorRole) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            actor_id: actor_id.into(),
            actor_role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [ActorRole::Teacher, ActorRole::Admin, ActorRole::SuperAdmin] {
            assert_eq!(ActorRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(ActorRole::parse("visitor"), None);
    }
}
