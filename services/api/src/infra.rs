use house_renting::categories::{default_categories, Category, CategoryRepository};
use house_renting::listings::{
    AgentDirectory, AgentId, House, HouseId, HouseRepository, Occupancy, RepositoryError,
    TransitionError, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn poisoned<T>(_: PoisonError<T>) -> RepositoryError {
    RepositoryError::Unavailable("in-memory store lock poisoned".to_string())
}

/// House store whose occupancy transitions run under one lock.
#[derive(Default, Clone)]
pub(crate) struct InMemoryHouseRepository {
    records: Arc<Mutex<HashMap<HouseId, House>>>,
}

impl HouseRepository for InMemoryHouseRepository {
    fn exists(&self, id: &HouseId) -> Result<bool, RepositoryError> {
        let guard = self.records.lock().map_err(poisoned)?;
        Ok(guard.get(id).is_some_and(|house| house.is_active))
    }

    fn fetch(&self, id: &HouseId) -> Result<Option<House>, RepositoryError> {
        let guard = self.records.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }

    fn insert(&self, house: House) -> Result<House, RepositoryError> {
        let mut guard = self.records.lock().map_err(poisoned)?;
        if guard.contains_key(&house.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(house.id, house.clone());
        Ok(house)
    }

    fn update(&self, house: House) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().map_err(poisoned)?;
        let stored = guard
            .get_mut(&house.id)
            .filter(|stored| stored.is_active)
            .ok_or(RepositoryError::NotFound)?;
        // Occupancy, ownership and the active flag change through their own paths.
        let occupancy = stored.occupancy.clone();
        let agent_id = stored.agent_id;
        let created_on = stored.created_on;
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
        let mut guard = self.records.lock().map_err(poisoned)?;
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
        let mut guard = self.records.lock().map_err(poisoned)?;
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
        let guard = self.records.lock().map_err(poisoned)?;
        Ok(guard
            .get(house_id)
            .is_some_and(|house| house.is_active && house.is_owned_by(agent_id)))
    }

    fn list_active(&self) -> Result<Vec<House>, RepositoryError> {
        let guard = self.records.lock().map_err(poisoned)?;
        Ok(guard
            .values()
            .filter(|house| house.is_active)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAgentDirectory {
    agents: Arc<Mutex<HashMap<UserId, AgentId>>>,
}

impl InMemoryAgentDirectory {
    /// Registers the user as an agent, keeping an existing registration.
    pub(crate) fn register(&self, user_id: &str) -> Result<AgentId, RepositoryError> {
        let mut guard = self.agents.lock().map_err(poisoned)?;
        Ok(*guard
            .entry(UserId::new(user_id.trim()))
            .or_insert_with(AgentId::generate))
    }
}

impl AgentDirectory for InMemoryAgentDirectory {
    fn agent_id(&self, user_id: &UserId) -> Result<Option<AgentId>, RepositoryError> {
        let guard = self.agents.lock().map_err(poisoned)?;
        Ok(guard.get(user_id).copied())
    }
}

#[derive(Clone)]
pub(crate) struct InMemoryCategoryRepository {
    categories: Arc<Vec<Category>>,
}

impl Default for InMemoryCategoryRepository {
    fn default() -> Self {
        Self {
            categories: Arc::new(default_categories()),
        }
    }
}

impl CategoryRepository for InMemoryCategoryRepository {
    fn all(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self.categories.as_ref().clone())
    }
}
