use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{blank_as_none, clean_images, lenient_uuid, AdapterError, RecordStatus, SocialLinks};

/// A business listing, optionally owned by an auth identity (`auth_user_id`).
///
/// Rows exist in two shapes: the current flat layout (`name`, `category_id`, ...)
/// and an older nested one (`profile.businessName`, `profile.links.*`,
/// `location.localityId`). Both are mapped through [`BusinessRecord::from_row`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessRecord {
    pub id: Uuid,
    pub auth_user_id: Option<Uuid>,
    pub status: RecordStatus,
    pub name: String,
    pub description: Option<String>,
    pub full_description: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub province_id: Option<Uuid>,
    pub locality_id: Option<Uuid>,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub hours: Option<String>,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub google_maps_link: Option<String>,
    pub social_links: SocialLinks,
    pub rating_value: Option<f64>,
    pub rating_source: Option<String>,
    pub place_id: Option<String>,
}

impl BusinessRecord {
    pub fn from_row(row: Value) -> Result<Self, AdapterError> {
        let nested = row.get("profile").map_or(false, Value::is_object);
        if nested {
            serde_json::from_value::<NestedRow>(row)
                .map(BusinessRecord::from)
                .map_err(|e| AdapterError::malformed("businesses", e))
        } else {
            serde_json::from_value::<FlatRow>(row)
                .map(BusinessRecord::from)
                .map_err(|e| AdapterError::malformed("businesses", e))
        }
    }
}

#[derive(Debug, Deserialize)]
struct FlatRow {
    id: Uuid,
    #[serde(default)]
    auth_user_id: Option<String>,
    #[serde(default)]
    status: RecordStatus,
    #[serde(default, alias = "business_name")]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    full_description: Option<String>,
    #[serde(default)]
    category_id: Option<String>,
    #[serde(default)]
    subcategory_id: Option<String>,
    #[serde(default)]
    province_id: Option<String>,
    #[serde(default)]
    locality_id: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default, alias = "contact_email")]
    email: Option<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    hours: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    images: Option<Vec<String>>,
    #[serde(default)]
    google_maps_link: Option<String>,
    #[serde(default)]
    social_links: Option<SocialLinks>,
    #[serde(default)]
    rating_value: Option<f64>,
    #[serde(default)]
    rating_source: Option<String>,
    #[serde(default)]
    place_id: Option<String>,
}

impl From<FlatRow> for BusinessRecord {
    fn from(row: FlatRow) -> Self {
        Self {
            id: row.id,
            auth_user_id: lenient_uuid(row.auth_user_id.as_deref()),
            status: row.status,
            name: row.name.unwrap_or_default(),
            description: row.description,
            full_description: row.full_description,
            category_id: lenient_uuid(row.category_id.as_deref()),
            subcategory_id: lenient_uuid(row.subcategory_id.as_deref()),
            province_id: lenient_uuid(row.province_id.as_deref()),
            locality_id: lenient_uuid(row.locality_id.as_deref()),
            address: row.address,
            lat: row.lat,
            lng: row.lng,
            phone: row.phone,
            email: row.email,
            website: row.website,
            hours: row.hours,
            image: row.image,
            images: clean_images(&row.images.unwrap_or_default()),
            google_maps_link: row.google_maps_link,
            social_links: row.social_links.unwrap_or_default().cleaned(),
            rating_value: row.rating_value,
            rating_source: row.rating_source,
            place_id: row.place_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NestedRow {
    id: Uuid,
    #[serde(default, alias = "auth_user_id")]
    auth_user_id: Option<String>,
    #[serde(default)]
    status: RecordStatus,
    profile: NestedProfile,
    #[serde(default, alias = "contactInfo")]
    contact: NestedContact,
    #[serde(default)]
    location: NestedLocation,
    #[serde(default)]
    rating: Option<NestedRating>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NestedProfile {
    #[serde(default)]
    business_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    full_description: Option<String>,
    #[serde(default)]
    category_id: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    links: NestedLinks,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NestedLinks {
    #[serde(default)]
    google_maps_link: Option<String>,
    #[serde(default)]
    instagram_link: Option<String>,
    #[serde(default)]
    facebook_link: Option<String>,
    #[serde(default)]
    twitter_link: Option<String>,
    #[serde(default)]
    website_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NestedContact {
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    hours: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NestedLocation {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
    #[serde(default)]
    province_id: Option<String>,
    #[serde(default)]
    locality_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NestedRating {
    #[serde(default)]
    value: Option<f64>,
    #[serde(default)]
    source: Option<String>,
}

impl From<NestedRow> for BusinessRecord {
    fn from(row: NestedRow) -> Self {
        let profile = row.profile;
        let links = profile.links;
        let rating = row.rating.unwrap_or_default();
        let website = row.contact.website.or(links.website_link);

        Self {
            id: row.id,
            auth_user_id: lenient_uuid(row.auth_user_id.as_deref()),
            status: row.status,
            name: profile.business_name.unwrap_or_default(),
            description: profile.description,
            full_description: profile.full_description,
            category_id: lenient_uuid(profile.category_id.as_deref()),
            subcategory_id: None,
            province_id: lenient_uuid(row.location.province_id.as_deref()),
            locality_id: lenient_uuid(row.location.locality_id.as_deref()),
            address: row.location.address,
            lat: row.location.lat,
            lng: row.location.lng,
            phone: row.contact.phone,
            email: row.contact.email,
            website: website.clone(),
            hours: row.contact.hours,
            image: profile.image,
            images: clean_images(&profile.images),
            google_maps_link: links.google_maps_link,
            social_links: SocialLinks {
                instagram: links.instagram_link,
                facebook: links.facebook_link,
                twitter: links.twitter_link,
                website,
            }
            .cleaned(),
            rating_value: rating.value,
            rating_source: rating.source,
            place_id: None,
        }
    }
}

/// Client payload for creating or editing a business.
///
/// `status` is only honoured on the admin panel; owners cannot change it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BusinessInput {
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
    pub address: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub hours: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub google_maps_link: Option<String>,
    #[serde(default)]
    pub social_links: SocialLinks,
    #[serde(default)]
    pub status: Option<RecordStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn adapts_flat_row() {
        let id = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let category = Uuid::new_v4();
        let record = BusinessRecord::from_row(json!({
            "id": id,
            "auth_user_id": owner,
            "status": "pending",
            "name": "Café del Cerro",
            "category_id": category,
            "images": ["a.jpg", " ", "b.jpg"],
            "social_links": { "instagram": "@cerro", "facebook": "" },
            "rating_value": 4.5
        }))
        .unwrap();

        assert_eq!(record.id, id);
        assert_eq!(record.auth_user_id, Some(owner));
        assert_eq!(record.status, RecordStatus::Pending);
        assert_eq!(record.name, "Café del Cerro");
        assert_eq!(record.category_id, Some(category));
        assert_eq!(record.images, vec!["a.jpg", "b.jpg"]);
        assert_eq!(record.social_links.instagram.as_deref(), Some("@cerro"));
        assert_eq!(record.social_links.facebook, None);
        assert_eq!(record.rating_value, Some(4.5));
    }

    #[test]
    fn adapts_flat_row_with_business_name_column() {
        let record = BusinessRecord::from_row(json!({
            "id": Uuid::new_v4(),
            "business_name": "Hostería Tafí",
            "status": "active"
        }))
        .unwrap();
        assert_eq!(record.name, "Hostería Tafí");
        assert_eq!(record.auth_user_id, None);
    }

    #[test]
    fn adapts_nested_profile_row() {
        let locality = Uuid::new_v4();
        let record = BusinessRecord::from_row(json!({
            "id": Uuid::new_v4(),
            "status": "active",
            "profile": {
                "businessName": "Museo Casa Histórica",
                "description": "Museo",
                "categoryId": "museos",
                "images": ["x.png"],
                "links": {
                    "googleMapsLink": "https://maps.example/1",
                    "instagramLink": "@casa"
                }
            },
            "location": { "localityId": locality, "lat": -26.8, "lng": -65.2 },
            "rating": { "value": 4.8, "source": "google" }
        }))
        .unwrap();

        assert_eq!(record.name, "Museo Casa Histórica");
        assert_eq!(record.category_id, None);
        assert_eq!(record.locality_id, Some(locality));
        assert_eq!(record.google_maps_link.as_deref(), Some("https://maps.example/1"));
        assert_eq!(record.social_links.instagram.as_deref(), Some("@casa"));
        assert_eq!(record.rating_value, Some(4.8));
        assert_eq!(record.lat, Some(-26.8));
    }

    #[test]
    fn row_without_id_is_malformed() {
        assert!(BusinessRecord::from_row(json!({ "name": "sin id" })).is_err());
    }
}
