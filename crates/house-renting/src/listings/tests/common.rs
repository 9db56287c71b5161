use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::categories::{default_categories, Category, CategoryId, CategoryRepository};
use crate::config::ListingConfig;
use crate::listings::domain::{AgentId, House, HouseDraft, HouseId, Occupancy, UserId};
use crate::listings::form::HouseForm;
use crate::listings::repository::{
    AgentDirectory, HouseRepository, RepositoryError, TransitionError,
};
use crate::listings::{house_router, HouseCatalogueService, RentalStateManager};

pub(super) const AGENT_USER: &str = "agent-user";
pub(super) const OTHER_AGENT_USER: &str = "other-agent-user";
pub(super) const ADMIN_AGENT_USER: &str = "admin-agent-user";

#[derive(Default, Clone)]
pub(super) struct MemoryHouses {
    pub(super) records: Arc<Mutex<HashMap<HouseId, House>>>,
}

impl MemoryHouses {
    pub(super) fn stored(&self, id: &HouseId) -> House {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned()
            .expect("house stored")
    }

    pub(super) fn seed(&self, house: House) -> HouseId {
        let id = house.id;
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .insert(id, house);
        id
    }
}

impl HouseRepository for MemoryHouses {
    fn exists(&self, id: &HouseId) -> Result<bool, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).is_some_and(|house| house.is_active))
    }

    fn fetch(&self, id: &HouseId) -> Result<Option<House>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn insert(&self, house: House) -> Result<House, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&house.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(house.id, house.clone());
        Ok(house)
    }

    fn update(&self, house: House) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard
            .get_mut(&house.id)
            .filter(|stored| stored.is_active)
            .ok_or(RepositoryError::NotFound)?;
        let House {
            occupancy,
            agent_id,
            created_on,
            ..
        } = stored.clone();
        *stored = House {
            occupancy,
            agent_id,
            created_on,
            is_active: true,
            ..house
        };
        Ok(())
    }

    fn deactivate(&self, id: &HouseId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard
            .get_mut(id)
            .filter(|stored| stored.is_active)
            .ok_or(RepositoryError::NotFound)?;
        stored.is_active = false;
        Ok(())
    }

    fn transition_occupancy(
        &self,
        id: &HouseId,
        expected: &Occupancy,
        next: Occupancy,
    ) -> Result<House, TransitionError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let house = guard
            .get_mut(id)
            .filter(|house| house.is_active)
            .ok_or(TransitionError::Missing)?;
        if &house.occupancy != expected {
            return Err(TransitionError::Stale {
                current: house.occupancy.clone(),
            });
        }
        house.occupancy = next;
        Ok(house.clone())
    }

    fn is_owner(&self, house_id: &HouseId, agent_id: &AgentId) -> Result<bool, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .get(house_id)
            .is_some_and(|house| house.is_active && house.is_owned_by(agent_id)))
    }

    fn list_active(&self) -> Result<Vec<House>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().filter(|house| house.is_active).cloned().collect())
    }
}

/// Repository whose occupancy changes underneath the caller between read and write.
pub(super) struct RacingHouses {
    pub(super) inner: MemoryHouses,
    pub(super) interleaved: Occupancy,
}

impl HouseRepository for RacingHouses {
    fn exists(&self, id: &HouseId) -> Result<bool, RepositoryError> {
        self.inner.exists(id)
    }

    fn fetch(&self, id: &HouseId) -> Result<Option<House>, RepositoryError> {
        let house = self.inner.fetch(id)?;
        if let Some(stored) = self
            .inner
            .records
            .lock()
            .expect("repository mutex poisoned")
            .get_mut(id)
        {
            stored.occupancy = self.interleaved.clone();
        }
        Ok(house)
    }

    fn insert(&self, house: House) -> Result<House, RepositoryError> {
        self.inner.insert(house)
    }

    fn update(&self, house: House) -> Result<(), RepositoryError> {
        self.inner.update(house)
    }

    fn deactivate(&self, id: &HouseId) -> Result<(), RepositoryError> {
        self.inner.deactivate(id)
    }

    fn transition_occupancy(
        &self,
        id: &HouseId,
        expected: &Occupancy,
        next: Occupancy,
    ) -> Result<House, TransitionError> {
        self.inner.transition_occupancy(id, expected, next)
    }

    fn is_owner(&self, house_id: &HouseId, agent_id: &AgentId) -> Result<bool, RepositoryError> {
        self.inner.is_owner(house_id, agent_id)
    }

    fn list_active(&self) -> Result<Vec<House>, RepositoryError> {
        self.inner.list_active()
    }
}

/// Repository where the house is soft-deleted right after it is read.
pub(super) struct DeletedAfterRead {
    pub(super) inner: MemoryHouses,
}

impl HouseRepository for DeletedAfterRead {
    fn exists(&self, id: &HouseId) -> Result<bool, RepositoryError> {
        self.inner.exists(id)
    }

    fn fetch(&self, id: &HouseId) -> Result<Option<House>, RepositoryError> {
        let house = self.inner.fetch(id)?;
        self.inner.deactivate(id)?;
        Ok(house)
    }

    fn insert(&self, house: House) -> Result<House, RepositoryError> {
        self.inner.insert(house)
    }

    fn update(&self, house: House) -> Result<(), RepositoryError> {
        self.inner.update(house)
    }

    fn deactivate(&self, id: &HouseId) -> Result<(), RepositoryError> {
        self.inner.deactivate(id)
    }

    fn transition_occupancy(
        &self,
        id: &HouseId,
        expected: &Occupancy,
        next: Occupancy,
    ) -> Result<House, TransitionError> {
        self.inner.transition_occupancy(id, expected, next)
    }

    fn is_owner(&self, house_id: &HouseId, agent_id: &AgentId) -> Result<bool, RepositoryError> {
        self.inner.is_owner(house_id, agent_id)
    }

    fn list_active(&self) -> Result<Vec<House>, RepositoryError> {
        self.inner.list_active()
    }
}

pub(super) struct UnavailableHouses;

impl HouseRepository for UnavailableHouses {
    fn exists(&self, _id: &HouseId) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &HouseId) -> Result<Option<House>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert(&self, _house: House) -> Result<House, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _house: House) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn deactivate(&self, _id: &HouseId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn transition_occupancy(
        &self,
        _id: &HouseId,
        _expected: &Occupancy,
        _next: Occupancy,
    ) -> Result<House, TransitionError> {
        Err(RepositoryError::Unavailable("database offline".to_string()).into())
    }

    fn is_owner(&self, _house_id: &HouseId, _agent_id: &AgentId) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_active(&self) -> Result<Vec<House>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryAgents {
    agents: Arc<Mutex<HashMap<UserId, AgentId>>>,
}

impl MemoryAgents {
    pub(super) fn register(&self, user_id: &str) -> AgentId {
        let agent_id = AgentId::generate();
        self.agents
            .lock()
            .expect("agent mutex poisoned")
            .insert(UserId::new(user_id), agent_id);
        agent_id
    }
}

impl AgentDirectory for MemoryAgents {
    fn agent_id(&self, user_id: &UserId) -> Result<Option<AgentId>, RepositoryError> {
        Ok(self
            .agents
            .lock()
            .expect("agent mutex poisoned")
            .get(user_id)
            .copied())
    }
}

pub(super) struct MemoryCategories(pub(super) Vec<Category>);

impl Default for MemoryCategories {
    fn default() -> Self {
        Self(default_categories())
    }
}

impl CategoryRepository for MemoryCategories {
    fn all(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self.0.clone())
    }
}

pub(super) fn created_at(days_ago: i64) -> DateTime<Utc> {
    let anchor = Utc
        .with_ymd_and_hms(2025, 9, 24, 10, 0, 0)
        .single()
        .expect("valid anchor");
    anchor - Duration::days(days_ago)
}

pub(super) fn draft(title: &str, price: i64, category: u32) -> HouseDraft {
    HouseDraft {
        title: title.to_string(),
        address: "Boyana Neighbourhood, Sofia, Bulgaria".to_string(),
        description: "A house with a big garden and a lot of trees, ideal for families with kids."
            .to_string(),
        image_url: "https://images.example.com/house.jpg".to_string(),
        price_per_month: Decimal::new(price, 0),
        category_id: CategoryId(category),
    }
}

pub(super) fn house_for(agent_id: AgentId) -> House {
    House::new(draft("Family House Comfort", 1200, 2), agent_id, created_at(3))
}

pub(super) fn house_form() -> HouseForm {
    HouseForm {
        title: "Grand House Beach".to_string(),
        address: "Sea Garden Boulevard 12, Varna, Bulgaria".to_string(),
        description: "Newly renovated house two minutes from the beach with a view of the sea."
            .to_string(),
        image_url: "https://images.example.com/beach.jpg".to_string(),
        price_per_month: Some("1500,00".to_string()),
        category_id: Some(CategoryId(1)),
    }
}

pub(super) struct Fixture {
    pub(super) houses: Arc<MemoryHouses>,
    pub(super) agents: Arc<MemoryAgents>,
    pub(super) agent_id: AgentId,
    pub(super) other_agent_id: AgentId,
    pub(super) admin_agent_id: AgentId,
}

pub(super) fn fixture() -> Fixture {
    let houses = Arc::new(MemoryHouses::default());
    let agents = Arc::new(MemoryAgents::default());
    let agent_id = agents.register(AGENT_USER);
    let other_agent_id = agents.register(OTHER_AGENT_USER);
    let admin_agent_id = agents.register(ADMIN_AGENT_USER);
    Fixture {
        houses,
        agents,
        agent_id,
        other_agent_id,
        admin_agent_id,
    }
}

impl Fixture {
    pub(super) fn rentals(&self) -> RentalStateManager<MemoryHouses, MemoryAgents> {
        RentalStateManager::new(self.houses.clone(), self.agents.clone())
    }

    pub(super) fn catalogue(
        &self,
    ) -> HouseCatalogueService<MemoryHouses, MemoryAgents, MemoryCategories> {
        HouseCatalogueService::new(
            self.houses.clone(),
            self.agents.clone(),
            Arc::new(MemoryCategories::default()),
            ListingConfig::default(),
        )
    }

    pub(super) fn router(&self) -> axum::Router {
        house_router(Arc::new(self.catalogue()))
    }

    pub(super) fn vacant_house(&self) -> HouseId {
        self.houses.seed(house_for(self.agent_id))
    }

    pub(super) fn rented_house(&self, renter: &str) -> HouseId {
        let mut house = house_for(self.agent_id);
        house.occupancy = Occupancy::rented_by(UserId::new(renter));
        self.houses.seed(house)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
