pub mod admin_user;
pub mod business;
pub mod place;
pub mod reference;
pub mod status;

pub use admin_user::AdminRecord;
pub use business::{BusinessInput, BusinessRecord};
pub use place::{Place, PlaceInput};
pub use reference::{Category, Locality, Province, ReferenceData, Subcategory};
pub use status::RecordStatus;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// A backend row could not be mapped onto the application's record type
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Malformed {entity} row: {message}")]
    Malformed {
        entity: &'static str,
        message: String,
    },
}

impl AdapterError {
    pub fn malformed(entity: &'static str, err: impl std::fmt::Display) -> Self {
        AdapterError::Malformed {
            entity,
            message: err.to_string(),
        }
    }
}

/// Deserialize a row value into `T`, tagging failures with the entity name
pub(crate) fn from_row_value<T: serde::de::DeserializeOwned>(
    entity: &'static str,
    row: Value,
) -> Result<T, AdapterError> {
    serde_json::from_value(row).map_err(|e| AdapterError::malformed(entity, e))
}

/// Form selects submit "" for "nothing selected"
pub(crate) fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Uuid::parse_str(s).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Lenient id parsing for legacy rows, where ids were not always UUIDs
pub(crate) fn lenient_uuid(raw: Option<&str>) -> Option<Uuid> {
    raw.and_then(|s| Uuid::parse_str(s.trim()).ok())
}

/// Drop blank gallery entries and surrounding whitespace
pub(crate) fn clean_images(images: &[String]) -> Vec<String> {
    images
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

impl SocialLinks {
    /// Blank links are stored as absent
    pub fn cleaned(&self) -> Self {
        fn keep(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }
        Self {
            instagram: keep(&self.instagram),
            facebook: keep(&self.facebook),
            twitter: keep(&self.twitter),
            website: keep(&self.website),
        }
    }
}
