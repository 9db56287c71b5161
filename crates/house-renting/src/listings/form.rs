use std::ops::RangeInclusive;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain::{House, HouseDraft};
use crate::categories::CategoryId;
use crate::forms::decimal::{deserialize_raw_decimal, DecimalNormalizer};
use crate::forms::FieldErrors;

pub const TITLE_LENGTH: RangeInclusive<usize> = 10..=50;
pub const ADDRESS_LENGTH: RangeInclusive<usize> = 30..=150;
pub const DESCRIPTION_LENGTH: RangeInclusive<usize> = 50..=500;
pub const IMAGE_URL_MAX_LENGTH: usize = 2048;

/// Inclusive monthly price bounds.
pub fn price_range() -> RangeInclusive<Decimal> {
    Decimal::ZERO..=Decimal::new(2000, 0)
}

/// Raw add/edit payload as submitted by an agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default, deserialize_with = "deserialize_raw_decimal")]
    pub price_per_month: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

impl HouseForm {
    /// Prefills an edit form from the stored listing.
    pub fn from_house(house: &House) -> Self {
        Self {
            title: house.title.clone(),
            address: house.address.clone(),
            description: house.description.clone(),
            image_url: house.image_url.clone(),
            price_per_month: Some(house.price_per_month.to_string()),
            category_id: Some(house.category_id),
        }
    }

    pub fn validate(&self, normalizer: &DecimalNormalizer) -> Result<HouseDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = text_field("title", &self.title, TITLE_LENGTH, &mut errors);
        let address = text_field("address", &self.address, ADDRESS_LENGTH, &mut errors);
        let description =
            text_field("description", &self.description, DESCRIPTION_LENGTH, &mut errors);
        let image_url = text_field(
            "image_url",
            &self.image_url,
            1..=IMAGE_URL_MAX_LENGTH,
            &mut errors,
        );

        let price = normalizer.bind(
            "price_per_month",
            self.price_per_month.as_deref(),
            &mut errors,
        );
        let bounds = price_range();
        let price = match price {
            Some(value) if !bounds.contains(&value) => {
                errors.add(
                    "price_per_month",
                    format!(
                        "price per month must be between {} and {}",
                        bounds.start(),
                        bounds.end()
                    ),
                );
                None
            }
            Some(value) => Some(value),
            None if errors.contains("price_per_month") => None,
            None => {
                errors.add("price_per_month", "price per month is required");
                None
            }
        };

        if self.category_id.is_none() {
            errors.add("category_id", "category is required");
        }

        match (price, self.category_id) {
            (Some(price_per_month), Some(category_id)) if errors.is_empty() => Ok(HouseDraft {
                title,
                address,
                description,
                image_url,
                price_per_month,
                category_id,
            }),
            _ => Err(errors),
        }
    }
}

fn text_field(
    field: &str,
    raw: &str,
    length: RangeInclusive<usize>,
    errors: &mut FieldErrors,
) -> String {
    let value = raw.trim();
    let count = value.chars().count();
    if !length.contains(&count) {
        errors.add(
            field,
            format!(
                "{field} must be between {} and {} characters",
                length.start(),
                length.end()
            ),
        );
    }
    value.to_string()
}
