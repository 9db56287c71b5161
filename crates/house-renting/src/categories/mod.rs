//! Category lookups backing listing forms and the listing filter.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::listings::repository::RepositoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Storage abstraction over the category table.
pub trait CategoryRepository: Send + Sync {
    fn all(&self) -> Result<Vec<Category>, RepositoryError>;
}

pub struct CategoryService<C> {
    repository: Arc<C>,
}

impl<C> CategoryService<C>
where
    C: CategoryRepository + 'static,
{
    pub fn new(repository: Arc<C>) -> Self {
        Self { repository }
    }

    /// Options for the house form's category picker, ordered by id.
    pub fn all_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let mut categories = self.repository.all()?;
        categories.sort_by_key(|category| category.id);
        Ok(categories)
    }

    pub fn exists_by_id(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        Ok(self.repository.all()?.iter().any(|category| category.id == id))
    }

    pub fn all_category_names(&self) -> Result<Vec<String>, RepositoryError> {
        let mut names: Vec<String> = self
            .repository
            .all()?
            .into_iter()
            .map(|category| category.name)
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    pub fn name_of(&self, id: CategoryId) -> Result<Option<String>, RepositoryError> {
        Ok(self
            .repository
            .all()?
            .into_iter()
            .find(|category| category.id == id)
            .map(|category| category.name))
    }
}

/// Category set seeded into fresh deployments.
pub fn default_categories() -> Vec<Category> {
    ["Cottage", "Single-Family", "Duplex"]
        .into_iter()
        .enumerate()
        .map(|(index, name)| Category {
            id: CategoryId(index as u32 + 1),
            name: name.to_string(),
        })
        .collect()
}
