use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use super::domain::{House, HouseSummary};
use crate::categories::Category;

pub const MAX_HOUSES_PER_PAGE: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseSorting {
    #[default]
    Newest,
    Oldest,
    PriceAscending,
    PriceDescending,
    NotRentedFirst,
}

/// Filter, sort, and paging parameters for the public listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AllHousesQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub search_term: Option<String>,
    #[serde(default)]
    pub sorting: HouseSorting,
    #[serde(default)]
    pub current_page: Option<usize>,
    #[serde(default)]
    pub houses_per_page: Option<usize>,
}

/// One page of listing cards plus the unpaged match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilteredHouses {
    pub total_house_count: usize,
    pub current_page: usize,
    pub houses_per_page: usize,
    pub houses: Vec<HouseSummary>,
}

impl AllHousesQuery {
    pub fn page(&self) -> usize {
        self.current_page.filter(|page| *page > 0).unwrap_or(1)
    }

    pub fn page_size(&self, default_per_page: usize) -> usize {
        self.houses_per_page
            .filter(|size| *size > 0)
            .unwrap_or(default_per_page)
            .min(MAX_HOUSES_PER_PAGE)
    }

    /// Applies the query to active houses. An unknown category name matches nothing.
    pub fn apply(
        &self,
        houses: Vec<House>,
        categories: &[Category],
        default_per_page: usize,
    ) -> FilteredHouses {
        let page = self.page();
        let per_page = self.page_size(default_per_page);

        let category_filter = match self.category.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(
                categories
                    .iter()
                    .find(|category| category.name.eq_ignore_ascii_case(name))
                    .map(|category| category.id),
            ),
            _ => None,
        };

        let needle = self
            .search_term
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase);

        let mut matches: Vec<House> = houses
            .into_iter()
            .filter(|house| house.is_active)
            .filter(|house| match category_filter {
                Some(Some(id)) => house.category_id == id,
                Some(None) => false,
                None => true,
            })
            .filter(|house| match &needle {
                Some(term) => [&house.title, &house.address, &house.description]
                    .iter()
                    .any(|field| field.to_lowercase().contains(term.as_str())),
                None => true,
            })
            .collect();

        match self.sorting {
            HouseSorting::Newest => {
                matches.sort_by_key(|house| (Reverse(house.created_on), house.id))
            }
            HouseSorting::Oldest => matches.sort_by_key(|house| (house.created_on, house.id)),
            HouseSorting::PriceAscending => {
                matches.sort_by_key(|house| {
                    (house.price_per_month, Reverse(house.created_on), house.id)
                })
            }
            HouseSorting::PriceDescending => matches.sort_by_key(|house| {
                (
                    Reverse(house.price_per_month),
                    Reverse(house.created_on),
                    house.id,
                )
            }),
            HouseSorting::NotRentedFirst => matches.sort_by_key(|house| {
                (house.occupancy.is_rented(), Reverse(house.created_on), house.id)
            }),
        }

        let total_house_count = matches.len();
        let houses = matches
            .iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .map(House::summary)
            .collect();

        FilteredHouses {
            total_house_count,
            current_page: page,
            houses_per_page: per_page,
            houses,
        }
    }
}
