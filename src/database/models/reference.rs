use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: Uuid,
    pub name: String,
    pub category_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Province {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locality {
    pub id: Uuid,
    pub name: String,
    pub province_id: Uuid,
}

/// Lookup tables used to validate and label catalog entries
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReferenceData {
    pub categories: Vec<Category>,
    pub subcategories: Vec<Subcategory>,
    pub provinces: Vec<Province>,
    pub localities: Vec<Locality>,
}

impl ReferenceData {
    pub fn has_category(&self, id: Uuid) -> bool {
        self.categories.iter().any(|c| c.id == id)
    }

    pub fn has_province(&self, id: Uuid) -> bool {
        self.provinces.iter().any(|p| p.id == id)
    }

    /// Whether `subcategory` exists and belongs to `category`
    pub fn subcategory_in(&self, subcategory: Uuid, category: Uuid) -> bool {
        self.subcategories
            .iter()
            .any(|s| s.id == subcategory && s.category_id == category)
    }

    /// Whether `locality` exists and belongs to `province`
    pub fn locality_in(&self, locality: Uuid, province: Uuid) -> bool {
        self.localities
            .iter()
            .any(|l| l.id == locality && l.province_id == province)
    }

    pub fn subcategories_of(&self, category: Uuid) -> Vec<Subcategory> {
        self.subcategories
            .iter()
            .filter(|s| s.category_id == category)
            .cloned()
            .collect()
    }

    pub fn localities_of(&self, province: Uuid) -> Vec<Locality> {
        self.localities
            .iter()
            .filter(|l| l.province_id == province)
            .cloned()
            .collect()
    }
}
