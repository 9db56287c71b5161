use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::categories::CategoryId;

/// Identifier wrapper for listed houses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HouseId(pub Uuid);

impl HouseId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl fmt::Display for HouseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque user identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Agent record identifier; distinct from the agent's user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Whether a house is free or held by exactly one renter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Occupancy {
    #[default]
    Vacant,
    Rented { renter_id: UserId },
}

impl Occupancy {
    pub fn rented_by(renter_id: UserId) -> Self {
        Self::Rented { renter_id }
    }

    pub fn is_rented(&self) -> bool {
        matches!(self, Occupancy::Rented { .. })
    }

    pub fn renter(&self) -> Option<&UserId> {
        match self {
            Occupancy::Vacant => None,
            Occupancy::Rented { renter_id } => Some(renter_id),
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Occupancy::Vacant => "vacant",
            Occupancy::Rented { .. } => "rented",
        }
    }
}

/// Validated listing attributes supplied when adding or editing a house.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HouseDraft {
    pub title: String,
    pub address: String,
    pub description: String,
    pub image_url: String,
    pub price_per_month: Decimal,
    pub category_id: CategoryId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct House {
    pub id: HouseId,
    pub title: String,
    pub address: String,
    pub description: String,
    pub image_url: String,
    pub price_per_month: Decimal,
    pub created_on: DateTime<Utc>,
    pub is_active: bool,
    pub category_id: CategoryId,
    pub agent_id: AgentId,
    pub occupancy: Occupancy,
}

impl House {
    /// New listings start active and vacant.
    pub fn new(draft: HouseDraft, agent_id: AgentId, created_on: DateTime<Utc>) -> Self {
        let HouseDraft {
            title,
            address,
            description,
            image_url,
            price_per_month,
            category_id,
        } = draft;

        Self {
            id: HouseId::generate(),
            title,
            address,
            description,
            image_url,
            price_per_month,
            created_on,
            is_active: true,
            category_id,
            agent_id,
            occupancy: Occupancy::Vacant,
        }
    }

    pub fn is_owned_by(&self, agent_id: &AgentId) -> bool {
        &self.agent_id == agent_id
    }

    pub fn is_rented_by(&self, user_id: &UserId) -> bool {
        self.occupancy.renter() == Some(user_id)
    }

    /// Replaces listing attributes; owner and occupancy are left alone.
    pub fn apply(&mut self, draft: HouseDraft) {
        self.title = draft.title;
        self.address = draft.address;
        self.description = draft.description;
        self.image_url = draft.image_url;
        self.price_per_month = draft.price_per_month;
        self.category_id = draft.category_id;
    }

    pub fn summary(&self) -> HouseSummary {
        HouseSummary {
            id: self.id,
            title: self.title.clone(),
            address: self.address.clone(),
            image_url: self.image_url.clone(),
            price_per_month: self.price_per_month,
            is_rented: self.occupancy.is_rented(),
        }
    }
}

/// Card shown in listing pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HouseSummary {
    pub id: HouseId,
    pub title: String,
    pub address: String,
    pub image_url: String,
    pub price_per_month: Decimal,
    pub is_rented: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HouseDetails {
    pub id: HouseId,
    pub title: String,
    pub address: String,
    pub description: String,
    pub image_url: String,
    pub price_per_month: Decimal,
    pub created_on: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub agent_id: AgentId,
    pub occupancy: &'static str,
}

impl HouseDetails {
    pub fn from_house(house: &House, category: Option<String>) -> Self {
        Self {
            id: house.id,
            title: house.title.clone(),
            address: house.address.clone(),
            description: house.description.clone(),
            image_url: house.image_url.clone(),
            price_per_month: house.price_per_month,
            created_on: house.created_on,
            category,
            agent_id: house.agent_id,
            occupancy: house.occupancy.label(),
        }
    }
}
