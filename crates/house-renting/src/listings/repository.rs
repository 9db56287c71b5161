use super::domain::{AgentId, House, HouseId, Occupancy, UserId};

/// Storage abstraction so the rental workflow can be exercised in isolation.
///
/// Occupancy only ever changes through [`HouseRepository::transition_occupancy`]
/// and the active flag only through [`HouseRepository::deactivate`]. `update`
/// keeps the stored occupancy, owner, creation time and active flag, and fails
/// with `NotFound` once the stored record is inactive.
pub trait HouseRepository: Send + Sync {
    /// True only for active houses.
    fn exists(&self, id: &HouseId) -> Result<bool, RepositoryError>;
    fn fetch(&self, id: &HouseId) -> Result<Option<House>, RepositoryError>;
    fn insert(&self, house: House) -> Result<House, RepositoryError>;
    fn update(&self, house: House) -> Result<(), RepositoryError>;
    /// Soft delete. `NotFound` when the house is missing or already inactive.
    fn deactivate(&self, id: &HouseId) -> Result<(), RepositoryError>;
    /// Compare-and-set on occupancy. Fails with `Stale` when the stored
    /// occupancy no longer equals `expected`.
    fn transition_occupancy(
        &self,
        id: &HouseId,
        expected: &Occupancy,
        next: Occupancy,
    ) -> Result<House, TransitionError>;
    fn is_owner(&self, house_id: &HouseId, agent_id: &AgentId) -> Result<bool, RepositoryError>;
    fn list_active(&self) -> Result<Vec<House>, RepositoryError>;
}

/// Lookup of agent registrations by user.
pub trait AgentDirectory: Send + Sync {
    fn agent_id(&self, user_id: &UserId) -> Result<Option<AgentId>, RepositoryError>;

    fn is_agent(&self, user_id: &UserId) -> Result<bool, RepositoryError> {
        Ok(self.agent_id(user_id)?.is_some())
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of a rejected occupancy compare-and-set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("house is missing or inactive")]
    Missing,
    #[error("occupancy changed to {}", .current.label())]
    Stale { current: Occupancy },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
