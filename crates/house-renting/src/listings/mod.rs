//! House listings and the vacant/rented occupancy workflow.

pub mod catalogue;
pub mod domain;
pub mod form;
pub mod principal;
pub mod query;
pub mod rental;
pub mod repository;
pub mod router;

#[cfg(test)]
mod tests;

pub use catalogue::{HouseCatalogueService, HouseServiceError};
pub use domain::{
    AgentId, House, HouseDetails, HouseDraft, HouseId, HouseSummary, Occupancy, UserId,
};
pub use form::HouseForm;
pub use principal::{ActingRole, Principal};
pub use query::{AllHousesQuery, FilteredHouses, HouseSorting};
pub use rental::{ConflictReason, ForbiddenReason, RentalError, RentalStateManager};
pub use repository::{AgentDirectory, HouseRepository, RepositoryError, TransitionError};
pub use router::house_router;
