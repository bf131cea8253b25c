use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{BusinessRecord, Place, RecordStatus};

/// Query string of the place listings (`?q=&category_id=&locality_id=`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceFilter {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub locality_id: Option<String>,
}

/// Query string of the admin business listing (`?q=&status=`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BusinessFilter {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

fn needle(q: &Option<String>) -> Option<String> {
    q.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

/// `None` when no filter was given (absent or blank); `Some(None)` for an id that can match nothing
fn id_filter(raw: &Option<String>) -> Option<Option<Uuid>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(s) => Some(Uuid::parse_str(s).ok()),
    }
}

/// Case-insensitive name search plus category/locality filters, sorted by name
pub fn filter_places(places: Vec<Place>, filter: &PlaceFilter) -> Vec<Place> {
    let q = needle(&filter.q);
    let category = id_filter(&filter.category_id);
    let locality = id_filter(&filter.locality_id);

    let mut places: Vec<Place> = places
        .into_iter()
        .filter(|p| q.as_ref().map_or(true, |q| p.name.to_lowercase().contains(q)))
        .filter(|p| category.map_or(true, |c| c.is_some() && p.category_id == c))
        .filter(|p| locality.map_or(true, |l| l.is_some() && p.locality_id == l))
        .collect();

    places.sort_by_key(|p| p.name.to_lowercase());
    places
}

/// Search by name or address, optional status filter, sorted by name
pub fn filter_businesses(businesses: Vec<BusinessRecord>, filter: &BusinessFilter) -> Vec<BusinessRecord> {
    let q = needle(&filter.q);
    let status = filter
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| RecordStatus::parse(Some(s)));

    let mut businesses: Vec<BusinessRecord> = businesses
        .into_iter()
        .filter(|b| {
            q.as_ref().map_or(true, |q| {
                b.name.to_lowercase().contains(q)
                    || b.address.as_deref().map_or(false, |a| a.to_lowercase().contains(q))
            })
        })
        .filter(|b| status.map_or(true, |s| b.status == s))
        .collect();

    businesses.sort_by_key(|b| b.name.to_lowercase());
    businesses
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn place(name: &str, category: Option<Uuid>, locality: Option<Uuid>) -> Place {
        Place::from_row(json!({
            "id": Uuid::new_v4(),
            "name": name,
            "category_id": category,
            "locality_id": locality
        }))
        .unwrap()
    }

    fn business(name: &str, status: &str, address: &str) -> BusinessRecord {
        BusinessRecord::from_row(json!({
            "id": Uuid::new_v4(),
            "name": name,
            "status": status,
            "address": address
        }))
        .unwrap()
    }

    #[test]
    fn search_is_case_insensitive_and_sorted() {
        let places = vec![
            place("Museo Casa Histórica", None, None),
            place("casa de Gobierno", None, None),
            place("Dique El Cadillal", None, None),
        ];
        let filter = PlaceFilter {
            q: Some("CASA".into()),
            ..Default::default()
        };

        let names: Vec<String> = filter_places(places, &filter).into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["casa de Gobierno", "Museo Casa Histórica"]);
    }

    #[test]
    fn category_and_locality_filters() {
        let museums = Uuid::new_v4();
        let tafi = Uuid::new_v4();
        let places = vec![
            place("A", Some(museums), Some(tafi)),
            place("B", Some(museums), None),
            place("C", None, Some(tafi)),
        ];

        let filter = PlaceFilter {
            category_id: Some(museums.to_string()),
            locality_id: Some(tafi.to_string()),
            ..Default::default()
        };
        let names: Vec<String> = filter_places(places.clone(), &filter).into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["A"]);

        let blank = PlaceFilter {
            category_id: Some("".into()),
            ..Default::default()
        };
        assert_eq!(filter_places(places.clone(), &blank).len(), 3);

        let garbage = PlaceFilter {
            category_id: Some("museos".into()),
            ..Default::default()
        };
        assert!(filter_places(places, &garbage).is_empty());
    }

    #[test]
    fn business_search_and_status() {
        let businesses = vec![
            business("Hostería Tafí", "active", "Av. Perón 120"),
            business("Café del Cerro", "pending", "Ruta 340"),
            business("Parrilla El Sol", "suspended", "Perón 45"),
        ];

        let by_address = BusinessFilter {
            q: Some("perón".into()),
            status: None,
        };
        let names: Vec<String> = filter_businesses(businesses.clone(), &by_address)
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["Hostería Tafí", "Parrilla El Sol"]);

        let pending = BusinessFilter {
            q: None,
            status: Some("pending".into()),
        };
        let found = filter_businesses(businesses, &pending);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Café del Cerro");
    }
}
