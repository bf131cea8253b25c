pub mod dashboard;
pub mod filter;
pub mod repository;
pub mod validation;

pub use dashboard::{summarize, DashboardSummary};
pub use filter::{filter_businesses, filter_places, BusinessFilter, PlaceFilter};
pub use validation::{validate_business, validate_place, validate_registration, Registration};
