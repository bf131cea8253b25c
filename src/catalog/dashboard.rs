use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{BusinessRecord, Category, Place};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category_id: Option<Uuid>,
    pub name: String,
    pub count: usize,
}

/// Counters shown on the admin panel landing page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_places: usize,
    pub places_by_category: Vec<CategoryCount>,
    pub total_businesses: usize,
    pub businesses_by_status: BTreeMap<String, usize>,
}

pub fn summarize(places: &[Place], businesses: &[BusinessRecord], categories: &[Category]) -> DashboardSummary {
    let mut per_category: BTreeMap<Option<Uuid>, usize> = BTreeMap::new();
    for place in places {
        *per_category.entry(place.category_id).or_default() += 1;
    }

    let mut places_by_category: Vec<CategoryCount> = per_category
        .into_iter()
        .map(|(category_id, count)| CategoryCount {
            category_id,
            name: category_id
                .and_then(|id| categories.iter().find(|c| c.id == id))
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "Uncategorized".to_string()),
            count,
        })
        .collect();
    places_by_category.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    let mut businesses_by_status = BTreeMap::new();
    for business in businesses {
        *businesses_by_status
            .entry(business.status.as_str().to_string())
            .or_default() += 1;
    }

    DashboardSummary {
        total_places: places.len(),
        places_by_category,
        total_businesses: businesses.len(),
        businesses_by_status,
    }
}
