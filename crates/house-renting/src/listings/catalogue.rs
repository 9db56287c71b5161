use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{House, HouseDetails, HouseDraft, HouseId, HouseSummary};
use super::form::HouseForm;
use super::principal::{ActingRole, Principal};
use super::query::{AllHousesQuery, FilteredHouses};
use super::rental::{ForbiddenReason, RentalError, RentalStateManager};
use super::repository::{AgentDirectory, HouseRepository, RepositoryError};
use crate::categories::{CategoryRepository, CategoryService};
use crate::config::ListingConfig;
use crate::forms::decimal::DecimalNormalizer;
use crate::forms::FieldErrors;

pub const MISSING_CATEGORY_MESSAGE: &str = "Selected category does not exist.";

/// Service composing the house repository, agent directory, category lookups,
/// and the rental workflow.
pub struct HouseCatalogueService<H, D, C> {
    rentals: RentalStateManager<H, D>,
    categories: CategoryService<C>,
    normalizer: DecimalNormalizer,
    houses_per_page: usize,
}

impl<H, D, C> HouseCatalogueService<H, D, C>
where
    H: HouseRepository + 'static,
    D: AgentDirectory + 'static,
    C: CategoryRepository + 'static,
{
    pub fn new(houses: Arc<H>, agents: Arc<D>, categories: Arc<C>, config: ListingConfig) -> Self {
        Self {
            rentals: RentalStateManager::new(houses, agents),
            categories: CategoryService::new(categories),
            normalizer: DecimalNormalizer::new(config.decimal_locale),
            houses_per_page: config.houses_per_page,
        }
    }

    pub fn rentals(&self) -> &RentalStateManager<H, D> {
        &self.rentals
    }

    pub fn categories(&self) -> &CategoryService<C> {
        &self.categories
    }

    /// List a new vacant house owned by the calling agent.
    pub fn add(
        &self,
        principal: &Principal,
        form: &HouseForm,
    ) -> Result<HouseId, HouseServiceError> {
        let agent_id = self
            .rentals
            .agents()
            .agent_id(&principal.user_id)?
            .ok_or(RentalError::Forbidden(ForbiddenReason::AgentRegistrationRequired))?;

        let draft = self.validate(form)?;
        let house = House::new(draft, agent_id, Utc::now());
        let stored = self.rentals.houses().insert(house)?;

        info!(house_id = %stored.id, agent_id = %agent_id, "house listed");
        Ok(stored.id)
    }

    pub fn details(&self, house_id: &HouseId) -> Result<HouseDetails, HouseServiceError> {
        let house = self.rentals.active_house(house_id)?;
        let category = self.categories.name_of(house.category_id)?;
        Ok(HouseDetails::from_house(&house, category))
    }

    /// Edit form prefilled from the stored listing, after the ownership check.
    pub fn edit_form(
        &self,
        principal: &Principal,
        house_id: &HouseId,
    ) -> Result<HouseForm, HouseServiceError> {
        self.rentals.authorize_mutation(house_id, principal)?;
        let house = self.rentals.active_house(house_id)?;
        Ok(HouseForm::from_house(&house))
    }

    pub fn edit(
        &self,
        principal: &Principal,
        house_id: &HouseId,
        form: &HouseForm,
    ) -> Result<HouseDetails, HouseServiceError> {
        let draft = self.validate(form)?;
        self.rentals.authorize_mutation(house_id, principal)?;

        let mut house = self.rentals.active_house(house_id)?;
        house.apply(draft);
        self.rentals.houses().update(house)?;

        info!(house_id = %house_id, acting_user = %principal.user_id, "house edited");
        self.details(house_id)
    }

    /// Soft delete: the record stays but no longer resolves.
    pub fn delete(
        &self,
        principal: &Principal,
        house_id: &HouseId,
    ) -> Result<(), HouseServiceError> {
        self.rentals.authorize_mutation(house_id, principal)?;
        self.rentals.houses().deactivate(house_id)?;

        info!(house_id = %house_id, acting_user = %principal.user_id, "house deleted");
        Ok(())
    }

    pub fn all(&self, query: &AllHousesQuery) -> Result<FilteredHouses, HouseServiceError> {
        let houses = self.rentals.houses().list_active()?;
        let categories = self.categories.all_categories()?;
        Ok(query.apply(houses, &categories, self.houses_per_page))
    }

    /// Houses relevant to the caller: owned listings for agents, current
    /// rentals for renters, and both for administrators.
    pub fn mine(&self, principal: &Principal) -> Result<Vec<HouseSummary>, HouseServiceError> {
        let role = ActingRole::resolve(principal, self.rentals.agents().as_ref())?;
        let houses = self.rentals.houses().list_active()?;

        let owned_by = role.agent_id();
        let include_rented = !matches!(role, ActingRole::Agent { .. });

        let mut seen = HashSet::new();
        let mut mine: Vec<&House> = houses
            .iter()
            .filter(|house| {
                owned_by.is_some_and(|agent_id| house.is_owned_by(&agent_id))
                    || (include_rented && house.is_rented_by(&principal.user_id))
            })
            .filter(|house| seen.insert(house.id))
            .collect();
        mine.sort_by(|left, right| right.created_on.cmp(&left.created_on));

        Ok(mine.into_iter().map(House::summary).collect())
    }

    fn validate(&self, form: &HouseForm) -> Result<HouseDraft, HouseServiceError> {
        let mut errors = FieldErrors::new();

        if let Some(category_id) = form.category_id {
            if !self.categories.exists_by_id(category_id)? {
                errors.add("category_id", MISSING_CATEGORY_MESSAGE);
            }
        }

        match form.validate(&self.normalizer) {
            Ok(draft) if errors.is_empty() => Ok(draft),
            Ok(_) => Err(HouseServiceError::Validation(errors)),
            Err(form_errors) => {
                errors.merge(form_errors);
                Err(HouseServiceError::Validation(errors))
            }
        }
    }
}

/// Error raised by the catalogue service.
#[derive(Debug, thiserror::Error)]
pub enum HouseServiceError {
    #[error(transparent)]
    Rental(#[from] RentalError),
    #[error("{0}")]
    Validation(FieldErrors),
}

impl From<RepositoryError> for HouseServiceError {
    fn from(value: RepositoryError) -> Self {
        Self::Rental(value.into())
    }
}
