//! Required-field and cross-field checks run before any write.
//!
//! Each validator returns the cleaned payload (trimmed text, blank gallery
//! entries and links dropped) or a `VALIDATION_ERROR` with one message per field.

use std::collections::HashMap;

use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{blank_as_none, clean_images, BusinessInput, PlaceInput, ReferenceData, SocialLinks};
use crate::error::ApiError;

pub const MIN_PASSWORD_LEN: usize = 8;

const REQUIRED: &str = "This field is required";

#[derive(Debug, Default)]
struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    fn require_text(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, REQUIRED);
        }
    }

    fn require_id(&mut self, field: &str, value: Option<Uuid>) {
        if value.is_none() {
            self.add(field, REQUIRED);
        }
    }

    fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Please correct the highlighted fields", Some(self.0)))
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Category, subcategory, province and locality must exist and fit together
fn check_taxonomy(
    errors: &mut FieldErrors,
    refs: &ReferenceData,
    category: Option<Uuid>,
    subcategory: Option<Uuid>,
    province: Option<Uuid>,
    locality: Option<Uuid>,
) {
    if let Some(category) = category {
        if !refs.has_category(category) {
            errors.add("category_id", "Unknown category");
        } else if let Some(subcategory) = subcategory {
            if !refs.subcategory_in(subcategory, category) {
                errors.add("subcategory_id", "Subcategory does not belong to the selected category");
            }
        }
    } else if subcategory.is_some() {
        errors.add("subcategory_id", "Select a category first");
    }

    match (province, locality) {
        (Some(province), _) if !refs.has_province(province) => errors.add("province_id", "Unknown province"),
        (Some(province), Some(locality)) if !refs.locality_in(locality, province) => {
            errors.add("locality_id", "Locality does not belong to the selected province")
        }
        (None, Some(_)) => errors.add("locality_id", "Select a province first"),
        _ => {}
    }
}

fn check_business_category(errors: &mut FieldErrors, category: Option<Uuid>, allowed: &[Uuid]) {
    if let Some(category) = category {
        if !allowed.is_empty() && !allowed.contains(&category) {
            errors.add("category_id", "Businesses cannot be listed under this category");
        }
    }
}

pub fn validate_place(input: PlaceInput, refs: &ReferenceData) -> Result<PlaceInput, ApiError> {
    let mut errors = FieldErrors::default();
    errors.require_text("name", &input.name);
    errors.require_text("description", &input.description);
    errors.require_id("category_id", input.category_id);
    errors.require_id("province_id", input.province_id);
    errors.require_id("locality_id", input.locality_id);
    check_taxonomy(
        &mut errors,
        refs,
        input.category_id,
        input.subcategory_id,
        input.province_id,
        input.locality_id,
    );
    errors.finish()?;

    Ok(PlaceInput {
        name: input.name.trim().to_string(),
        description: input.description.trim().to_string(),
        full_description: trimmed(input.full_description),
        image: trimmed(input.image),
        images: clean_images(&input.images),
        google_maps_link: trimmed(input.google_maps_link),
        social_links: input.social_links.cleaned(),
        place_id: trimmed(input.place_id),
        ..input
    })
}

pub fn validate_business(
    input: BusinessInput,
    refs: &ReferenceData,
    allowed_categories: &[Uuid],
) -> Result<BusinessInput, ApiError> {
    let mut errors = FieldErrors::default();
    errors.require_text("name", &input.name);
    errors.require_text("description", &input.description);
    errors.require_text("address", &input.address);
    check_business_category(&mut errors, input.category_id, allowed_categories);
    check_taxonomy(
        &mut errors,
        refs,
        input.category_id,
        input.subcategory_id,
        input.province_id,
        input.locality_id,
    );
    errors.finish()?;

    Ok(BusinessInput {
        name: input.name.trim().to_string(),
        description: input.description.trim().to_string(),
        address: input.address.trim().to_string(),
        full_description: trimmed(input.full_description),
        phone: trimmed(input.phone),
        email: trimmed(input.email),
        website: trimmed(input.website),
        hours: trimmed(input.hours),
        image: trimmed(input.image),
        images: clean_images(&input.images),
        google_maps_link: trimmed(input.google_maps_link),
        social_links: input.social_links.cleaned(),
        ..input
    })
}

/// Business owner sign-up form: account, business basics, contact details
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub business_name: String,
    #[serde(default, alias = "category", deserialize_with = "blank_as_none")]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, alias = "locality", alias = "localidad", deserialize_with = "blank_as_none")]
    pub locality_id: Option<Uuid>,
    #[serde(default, alias = "province", alias = "provincia", deserialize_with = "blank_as_none")]
    pub province_id: Option<Uuid>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub hours: Option<String>,
    #[serde(default)]
    pub google_maps_link: Option<String>,
    #[serde(default)]
    pub facebook_url: Option<String>,
    #[serde(default)]
    pub instagram_url: Option<String>,
}

fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((user, domain)) => !user.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

impl Registration {
    /// Business row for the new owner. Always filed as pending.
    pub fn into_business_input(self) -> BusinessInput {
        BusinessInput {
            name: self.business_name.trim().to_string(),
            description: self.description.trim().to_string(),
            address: self.address.trim().to_string(),
            category_id: self.category_id,
            province_id: self.province_id,
            locality_id: self.locality_id,
            phone: trimmed(Some(self.phone)),
            email: trimmed(Some(self.contact_email)),
            website: trimmed(self.website.clone()),
            hours: trimmed(self.hours),
            google_maps_link: trimmed(self.google_maps_link),
            social_links: SocialLinks {
                instagram: self.instagram_url,
                facebook: self.facebook_url,
                twitter: None,
                website: self.website,
            }
            .cleaned(),
            ..BusinessInput::default()
        }
    }
}

pub fn validate_registration(
    registration: &Registration,
    refs: &ReferenceData,
    allowed_categories: &[Uuid],
) -> Result<(), ApiError> {
    let mut errors = FieldErrors::default();

    // Account
    errors.require_text("email", &registration.email);
    if !registration.email.trim().is_empty() && !looks_like_email(&registration.email) {
        errors.add("email", "Enter a valid email address");
    }
    errors.require_text("password", &registration.password);
    if !registration.password.is_empty() && registration.password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        );
    }
    errors.require_text("confirmPassword", &registration.confirm_password);
    if !registration.confirm_password.is_empty() && registration.password != registration.confirm_password {
        errors.add("confirmPassword", "Passwords do not match");
    }

    // Business basics
    errors.require_text("businessName", &registration.business_name);
    errors.require_id("category", registration.category_id);
    errors.require_text("description", &registration.description);

    // Contact
    errors.require_text("address", &registration.address);
    errors.require_id("locality", registration.locality_id);
    errors.require_id("province", registration.province_id);
    errors.require_text("phone", &registration.phone);
    errors.require_text("contactEmail", &registration.contact_email);
    if !registration.contact_email.trim().is_empty() && !looks_like_email(&registration.contact_email) {
        errors.add("contactEmail", "Enter a valid email address");
    }

    let mut taxonomy = FieldErrors::default();
    check_business_category(&mut taxonomy, registration.category_id, allowed_categories);
    check_taxonomy(
        &mut taxonomy,
        refs,
        registration.category_id,
        None,
        registration.province_id,
        registration.locality_id,
    );
    // Form field names differ from the column names
    for (field, message) in taxonomy.0 {
        let field = match field.as_str() {
            "category_id" => "category",
            "province_id" => "province",
            "locality_id" => "locality",
            other => other,
        };
        errors.add(field, message);
    }

    errors.finish()
}
