//! Occupancy workflow for listed houses.
//!
//! A house is either vacant or rented by exactly one user. Renting and leaving
//! validate existence, role, and current occupancy in a fixed order, then apply
//! the change through the repository's compare-and-set so two concurrent
//! requests cannot both claim the same vacant house.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use super::domain::{AgentId, House, HouseId, Occupancy, UserId};
use super::principal::{ActingRole, Principal};
use super::repository::{AgentDirectory, HouseRepository, RepositoryError, TransitionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    AgentsCannotRent,
    AgentsCannotLeave,
    NotYourRental,
    AgentRegistrationRequired,
    NotOwningAgent,
}

impl ForbiddenReason {
    pub const fn message(self) -> &'static str {
        match self {
            ForbiddenReason::AgentsCannotRent => "agents cannot rent houses",
            ForbiddenReason::AgentsCannotLeave => "agents cannot leave houses",
            ForbiddenReason::NotYourRental => "selected house is not rented by you",
            ForbiddenReason::AgentRegistrationRequired => {
                "you must become an agent to manage houses"
            }
            ForbiddenReason::NotOwningAgent => "you must be the agent owner of the house",
        }
    }
}

impl fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    AlreadyRented,
    NotRented,
    ConcurrentModification,
}

impl ConflictReason {
    pub const fn message(self) -> &'static str {
        match self {
            ConflictReason::AlreadyRented => "selected house is already rented",
            ConflictReason::NotRented => "house is not rented",
            ConflictReason::ConcurrentModification => "house was modified concurrently",
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Tagged failure returned by every rental workflow operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RentalError {
    #[error("house with provided id does not exist")]
    NotFound,
    #[error("forbidden: {0}")]
    Forbidden(ForbiddenReason),
    #[error("conflict: {0}")]
    Conflict(ConflictReason),
    #[error("persistence failure: {0}")]
    Persistence(RepositoryError),
}

impl From<RepositoryError> for RentalError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => RentalError::NotFound,
            other => RentalError::Persistence(other),
        }
    }
}

pub struct RentalStateManager<H, D> {
    houses: Arc<H>,
    agents: Arc<D>,
}

impl<H, D> Clone for RentalStateManager<H, D> {
    fn clone(&self) -> Self {
        Self {
            houses: self.houses.clone(),
            agents: self.agents.clone(),
        }
    }
}

impl<H, D> RentalStateManager<H, D>
where
    H: HouseRepository + 'static,
    D: AgentDirectory + 'static,
{
    pub fn new(houses: Arc<H>, agents: Arc<D>) -> Self {
        Self { houses, agents }
    }

    /// Move a vacant house into the acting user's possession.
    pub fn rent(&self, house_id: &HouseId, principal: &Principal) -> Result<House, RentalError> {
        let house = self.active_house(house_id)?;

        let role = ActingRole::resolve(principal, self.agents.as_ref())?;
        if !role.may_occupy() {
            return Err(RentalError::Forbidden(ForbiddenReason::AgentsCannotRent));
        }

        if house.occupancy.is_rented() {
            return Err(RentalError::Conflict(ConflictReason::AlreadyRented));
        }

        let next = Occupancy::rented_by(principal.user_id.clone());
        let rented = self
            .houses
            .transition_occupancy(house_id, &Occupancy::Vacant, next)
            .map_err(|err| match err {
                TransitionError::Stale { .. } => {
                    RentalError::Conflict(ConflictReason::AlreadyRented)
                }
                other => transition_failure(other),
            })?;

        info!(
            house_id = %house_id,
            renter_id = %principal.user_id,
            role = role.label(),
            "house rented"
        );
        Ok(rented)
    }

    /// Release a rented house. Administrators act on behalf of whoever holds it.
    pub fn leave(&self, house_id: &HouseId, principal: &Principal) -> Result<House, RentalError> {
        let house = self.active_house(house_id)?;

        let role = ActingRole::resolve(principal, self.agents.as_ref())?;
        if !role.may_occupy() {
            return Err(RentalError::Forbidden(ForbiddenReason::AgentsCannotLeave));
        }

        let renter_id = leave_target(&role, &principal.user_id, &house.occupancy)?;
        let expected = Occupancy::rented_by(renter_id.clone());

        let vacated = match self
            .houses
            .transition_occupancy(house_id, &expected, Occupancy::Vacant)
        {
            Ok(house) => house,
            Err(TransitionError::Stale { current }) => {
                debug!(house_id = %house_id, current = current.label(), "occupancy changed before leave");
                leave_target(&role, &principal.user_id, &current)?;
                return Err(RentalError::Conflict(
                    ConflictReason::ConcurrentModification,
                ));
            }
            Err(other) => return Err(transition_failure(other)),
        };

        info!(
            house_id = %house_id,
            renter_id = %renter_id,
            acting_user = %principal.user_id,
            role = role.label(),
            "house vacated"
        );
        Ok(vacated)
    }

    /// Gate for edit and delete: the caller must be a registered agent that
    /// owns the house, or an administrator holding an agent registration.
    pub fn authorize_mutation(
        &self,
        house_id: &HouseId,
        principal: &Principal,
    ) -> Result<AgentId, RentalError> {
        if !self.houses.exists(house_id)? {
            return Err(RentalError::NotFound);
        }

        let agent_id = self.agents.agent_id(&principal.user_id)?.ok_or(
            RentalError::Forbidden(ForbiddenReason::AgentRegistrationRequired),
        )?;

        if principal.admin || self.houses.is_owner(house_id, &agent_id)? {
            Ok(agent_id)
        } else {
            Err(RentalError::Forbidden(ForbiddenReason::NotOwningAgent))
        }
    }

    pub fn houses(&self) -> &Arc<H> {
        &self.houses
    }

    pub fn agents(&self) -> &Arc<D> {
        &self.agents
    }

    pub(crate) fn active_house(&self, house_id: &HouseId) -> Result<House, RentalError> {
        self.houses
            .fetch(house_id)?
            .filter(|house| house.is_active)
            .ok_or(RentalError::NotFound)
    }
}

/// Renter whose tenancy a leave request ends, or why it may not.
fn leave_target(
    role: &ActingRole,
    acting_user: &UserId,
    occupancy: &Occupancy,
) -> Result<UserId, RentalError> {
    match occupancy {
        Occupancy::Vacant => Err(RentalError::Conflict(ConflictReason::NotRented)),
        Occupancy::Rented { renter_id } if role.is_admin() || renter_id == acting_user => {
            Ok(renter_id.clone())
        }
        Occupancy::Rented { .. } => Err(RentalError::Forbidden(ForbiddenReason::NotYourRental)),
    }
}

fn transition_failure(err: TransitionError) -> RentalError {
    match err {
        TransitionError::Missing => RentalError::NotFound,
        TransitionError::Stale { .. } => {
            RentalError::Conflict(ConflictReason::ConcurrentModification)
        }
        TransitionError::Repository(err) => err.into(),
    }
}
