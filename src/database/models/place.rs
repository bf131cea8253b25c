use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{blank_as_none, clean_images, lenient_uuid, AdapterError, SocialLinks};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    #[serde(default)]
    pub value: f64,
    #[serde(default = "manual_source")]
    pub source: String,
}

fn manual_source() -> String {
    "manual".to_string()
}

impl Default for Rating {
    fn default() -> Self {
        Self {
            value: 0.0,
            source: manual_source(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

/// A tourist place or public entity shown in the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub full_description: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub province_id: Option<Uuid>,
    pub locality_id: Option<Uuid>,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub google_maps_link: Option<String>,
    pub rating: Rating,
    pub social_links: SocialLinks,
    pub location: Location,
    /// External (maps provider) place identifier
    pub place_id: Option<String>,
}

impl Place {
    /// Map a `places` row. Accepts both snake_case columns and the camelCase
    /// keys older rows were written with.
    pub fn from_row(row: Value) -> Result<Self, AdapterError> {
        let raw: RawPlace =
            serde_json::from_value(row).map_err(|e| AdapterError::malformed("places", e))?;

        let location = raw.location.unwrap_or_default();
        let rating = match (raw.rating, raw.rating_value) {
            (Some(RawRating::Full(rating)), _) => rating,
            (Some(RawRating::Bare(value)), _) | (None, Some(value)) => Rating {
                value,
                source: raw.rating_source.unwrap_or_else(manual_source),
            },
            (None, None) => Rating::default(),
        };

        Ok(Self {
            id: raw.id,
            name: raw.name.unwrap_or_default(),
            description: raw.description,
            full_description: raw.full_description,
            category_id: lenient_uuid(raw.category_id.as_deref()),
            subcategory_id: lenient_uuid(raw.subcategory_id.as_deref()),
            province_id: lenient_uuid(raw.province_id.as_deref().or(location.province_id.as_deref())),
            locality_id: lenient_uuid(raw.locality_id.as_deref().or(location.locality_id.as_deref())),
            image: raw.image,
            images: clean_images(&raw.images.unwrap_or_default()),
            google_maps_link: raw.google_maps_link,
            rating,
            social_links: raw.social_links.unwrap_or_default().cleaned(),
            location: Location {
                address: location.address,
                lat: location.lat,
                lng: location.lng,
            },
            place_id: raw.place_id,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    id: Uuid,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "fullDescription")]
    full_description: Option<String>,
    #[serde(default, alias = "categoryId")]
    category_id: Option<String>,
    #[serde(default, alias = "subcategoryId")]
    subcategory_id: Option<String>,
    #[serde(default, alias = "provinceId")]
    province_id: Option<String>,
    #[serde(default, alias = "localityId")]
    locality_id: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    images: Option<Vec<String>>,
    #[serde(default, alias = "googleMapsLink", alias = "googleMapsUrl")]
    google_maps_link: Option<String>,
    #[serde(default)]
    rating: Option<RawRating>,
    #[serde(default, alias = "googleRating")]
    rating_value: Option<f64>,
    #[serde(default)]
    rating_source: Option<String>,
    #[serde(default, alias = "socialLinks")]
    social_links: Option<SocialLinks>,
    #[serde(default)]
    location: Option<RawLocation>,
    #[serde(default, alias = "placeId")]
    place_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRating {
    Full(Rating),
    Bare(f64),
}

#[derive(Debug, Default, Deserialize)]
struct RawLocation {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
    #[serde(default, alias = "provinceId")]
    province_id: Option<String>,
    #[serde(default, alias = "localityId")]
    locality_id: Option<String>,
}

/// Client payload for creating or editing a place
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub full_description: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub category_id: Option<Uuid>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub subcategory_id: Option<Uuid>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub province_id: Option<Uuid>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub locality_id: Option<Uuid>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub google_maps_link: Option<String>,
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub social_links: SocialLinks,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub place_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn adapts_snake_case_row() {
        let id = Uuid::new_v4();
        let place = Place::from_row(json!({
            "id": id,
            "name": "Cerro San Javier",
            "full_description": "Mirador",
            "rating": { "value": 4.7, "source": "google" },
            "social_links": { "instagram": "@sanjavier" },
            "location": { "address": "Ruta 340", "lat": -26.78, "lng": -65.38 }
        }))
        .unwrap();

        assert_eq!(place.id, id);
        assert_eq!(place.rating.value, 4.7);
        assert_eq!(place.rating.source, "google");
        assert_eq!(place.location.address.as_deref(), Some("Ruta 340"));
        assert_eq!(place.social_links.instagram.as_deref(), Some("@sanjavier"));
    }

    #[test]
    fn adapts_camel_case_row() {
        let locality = Uuid::new_v4();
        let place = Place::from_row(json!({
            "id": Uuid::new_v4(),
            "name": "Plaza Independencia",
            "fullDescription": "Plaza central",
            "googleMapsUrl": "https://maps.example/plaza",
            "googleRating": 4.4,
            "socialLinks": { "facebook": "plaza" },
            "location": { "localityId": locality }
        }))
        .unwrap();

        assert_eq!(place.full_description.as_deref(), Some("Plaza central"));
        assert_eq!(place.google_maps_link.as_deref(), Some("https://maps.example/plaza"));
        assert_eq!(place.rating.value, 4.4);
        assert_eq!(place.rating.source, "manual");
        assert_eq!(place.locality_id, Some(locality));
    }

    #[test]
    fn missing_rating_defaults_to_manual_zero() {
        let place = Place::from_row(json!({ "id": Uuid::new_v4(), "name": "Dique" })).unwrap();
        assert_eq!(place.rating, Rating::default());
    }
}
