//! Locale tolerant parsing of user supplied decimal amounts.
//!
//! Prices arrive from forms written by people on either side of the `.`/`,`
//! divide. Both characters are folded onto the active locale separator before
//! parsing, so `"1,234"` and `"1.234"` bind to the same amount. Empty input is
//! "no value supplied" rather than an error.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use super::FieldErrors;

/// Decimal separator used as the normalization target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalLocale {
    separator: char,
}

impl DecimalLocale {
    pub fn new(separator: char) -> Option<Self> {
        matches!(separator, '.' | ',').then_some(Self { separator })
    }

    pub fn separator(&self) -> char {
        self.separator
    }
}

impl Default for DecimalLocale {
    fn default() -> Self {
        Self { separator: '.' }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecimalParseError {
    #[error("'{value}' is not a valid decimal number")]
    Invalid { value: String },
}

#[derive(Debug, Clone, Default)]
pub struct DecimalNormalizer {
    locale: DecimalLocale,
}

impl DecimalNormalizer {
    pub fn new(locale: DecimalLocale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> DecimalLocale {
        self.locale
    }

    /// Rewrites both separators to the locale one.
    pub fn canonicalize(&self, raw: &str) -> String {
        let separator = self.locale.separator;
        raw.trim()
            .chars()
            .map(|c| if c == ',' || c == '.' { separator } else { c })
            .collect()
    }

    /// `Ok(None)` for blank input.
    pub fn normalize(&self, raw: &str) -> Result<Option<Decimal>, DecimalParseError> {
        if raw.trim().is_empty() {
            return Ok(None);
        }

        let canonical = self.canonicalize(raw);
        let invariant = if self.locale.separator == '.' {
            canonical
        } else {
            canonical.replace(self.locale.separator, ".")
        };

        Decimal::from_str(&invariant)
            .map(Some)
            .map_err(|_| DecimalParseError::Invalid {
                value: raw.trim().to_string(),
            })
    }

    /// Records a parse failure against `field` instead of returning it.
    pub fn bind(
        &self,
        field: &str,
        raw: Option<&str>,
        errors: &mut FieldErrors,
    ) -> Option<Decimal> {
        match self.normalize(raw.unwrap_or_default()) {
            Ok(value) => value,
            Err(err) => {
                errors.add(field, err.to_string());
                None
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDecimal {
    Text(String),
    Number(serde_json::Number),
}

/// Accepts a JSON string or number and keeps the raw text for later binding.
pub fn deserialize_raw_decimal<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawDecimal>::deserialize(deserializer)?;
    Ok(raw.map(|value| match value {
        RawDecimal::Text(text) => text,
        RawDecimal::Number(number) => number.to_string(),
    }))
}
