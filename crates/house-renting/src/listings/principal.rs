use axum::http::HeaderMap;
use serde::Serialize;

use super::domain::{AgentId, UserId};
use super::repository::{AgentDirectory, RepositoryError};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLES_HEADER: &str = "x-user-roles";

/// Authenticated caller as asserted by the upstream identity layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub admin: bool,
}

impl Principal {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            admin: false,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            admin: true,
        }
    }

    /// Reads the identity headers; `None` when no user id is present.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())?;

        let admin = headers
            .get_all(USER_ROLES_HEADER)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .any(|role| role.trim().eq_ignore_ascii_case("admin"));

        Some(Self {
            user_id: UserId::new(user_id),
            admin,
        })
    }
}

/// Role a principal acts under once agent registration is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ActingRole {
    Renter,
    Agent { agent_id: AgentId },
    /// Administrators may also hold an agent registration.
    Admin { agent_id: Option<AgentId> },
}

impl ActingRole {
    pub fn resolve<D>(principal: &Principal, directory: &D) -> Result<Self, RepositoryError>
    where
        D: AgentDirectory + ?Sized,
    {
        let agent_id = directory.agent_id(&principal.user_id)?;
        Ok(match (principal.admin, agent_id) {
            (true, agent_id) => ActingRole::Admin { agent_id },
            (false, Some(agent_id)) => ActingRole::Agent { agent_id },
            (false, None) => ActingRole::Renter,
        })
    }

    /// Plain agents list houses; they never occupy them.
    pub fn may_occupy(&self) -> bool {
        !matches!(self, ActingRole::Agent { .. })
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, ActingRole::Admin { .. })
    }

    pub fn agent_id(&self) -> Option<AgentId> {
        match self {
            ActingRole::Renter => None,
            ActingRole::Agent { agent_id } => Some(*agent_id),
            ActingRole::Admin { agent_id } => *agent_id,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            ActingRole::Renter => "renter",
            ActingRole::Agent { .. } => "agent",
            ActingRole::Admin { .. } => "admin",
        }
    }
}
