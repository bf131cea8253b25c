//! Catalog reads and writes against the hosted Postgres database.
//!
//! Every query returns rows as `row_to_json` so they go through the same
//! adapters as the privileged lookups. Nothing here is cached: each call is a
//! fresh round trip.

use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::database::models::{
    from_row_value, BusinessInput, BusinessRecord, Category, Locality, Place, PlaceInput, Province,
    RecordStatus, ReferenceData, Subcategory,
};
use crate::database::DatabaseError;

fn row_values(rows: Vec<PgRow>) -> Result<Vec<Value>, DatabaseError> {
    rows.into_iter()
        .map(|row| row.try_get::<Value, _>("row").map_err(DatabaseError::from))
        .collect()
}

fn decode<T: DeserializeOwned>(entity: &'static str, rows: Vec<PgRow>) -> Result<Vec<T>, DatabaseError> {
    row_values(rows)?
        .into_iter()
        .map(|value| from_row_value(entity, value).map_err(DatabaseError::from))
        .collect()
}

fn single_row(row: Option<PgRow>) -> Result<Option<Value>, DatabaseError> {
    row.map(|row| row.try_get::<Value, _>("row"))
        .transpose()
        .map_err(DatabaseError::from)
}

// Reference data

pub async fn categories(pool: &PgPool) -> Result<Vec<Category>, DatabaseError> {
    let rows = sqlx::query("SELECT row_to_json(t) AS row FROM categories t ORDER BY t.name")
        .fetch_all(pool)
        .await?;
    decode("categories", rows)
}

pub async fn subcategories(pool: &PgPool, category: Option<Uuid>) -> Result<Vec<Subcategory>, DatabaseError> {
    let rows = sqlx::query(
        "SELECT row_to_json(t) AS row FROM subcategories t \
         WHERE ($1::uuid IS NULL OR t.category_id = $1) ORDER BY t.name",
    )
    .bind(category)
    .fetch_all(pool)
    .await?;
    decode("subcategories", rows)
}

pub async fn provinces(pool: &PgPool) -> Result<Vec<Province>, DatabaseError> {
    let rows = sqlx::query("SELECT row_to_json(t) AS row FROM provinces t ORDER BY t.name")
        .fetch_all(pool)
        .await?;
    decode("provinces", rows)
}

pub async fn localities(pool: &PgPool, province: Option<Uuid>) -> Result<Vec<Locality>, DatabaseError> {
    let rows = sqlx::query(
        "SELECT row_to_json(t) AS row FROM localities t \
         WHERE ($1::uuid IS NULL OR t.province_id = $1) ORDER BY t.name",
    )
    .bind(province)
    .fetch_all(pool)
    .await?;
    decode("localities", rows)
}

/// All four lookup tables, fetched concurrently
pub async fn reference_data(pool: &PgPool) -> Result<ReferenceData, DatabaseError> {
    let (categories, subcategories, provinces, localities) = futures::try_join!(
        categories(pool),
        subcategories(pool, None),
        provinces(pool),
        localities(pool, None),
    )?;

    Ok(ReferenceData {
        categories,
        subcategories,
        provinces,
        localities,
    })
}

// Places

pub async fn list_places(pool: &PgPool) -> Result<Vec<Place>, DatabaseError> {
    let rows = sqlx::query("SELECT row_to_json(t) AS row FROM places t")
        .fetch_all(pool)
        .await?;
    row_values(rows)?
        .into_iter()
        .map(|value| Place::from_row(value).map_err(DatabaseError::from))
        .collect()
}

pub async fn find_place(pool: &PgPool, id: Uuid) -> Result<Option<Place>, DatabaseError> {
    let row = sqlx::query("SELECT row_to_json(t) AS row FROM places t WHERE t.id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(single_row(row)?.map(Place::from_row).transpose()?)
}

pub async fn insert_place(pool: &PgPool, input: &PlaceInput) -> Result<Place, DatabaseError> {
    let sql = r#"
        WITH inserted AS (
            INSERT INTO places (
                name, description, full_description, category_id, subcategory_id,
                province_id, locality_id, image, images, google_maps_link,
                rating, social_links, location, place_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
        )
        SELECT row_to_json(inserted) AS row FROM inserted
    "#;

    let row = sqlx::query(sql)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.full_description)
        .bind(input.category_id)
        .bind(input.subcategory_id)
        .bind(input.province_id)
        .bind(input.locality_id)
        .bind(&input.image)
        .bind(Json(&input.images))
        .bind(&input.google_maps_link)
        .bind(Json(input.rating.clone().unwrap_or_default()))
        .bind(Json(&input.social_links))
        .bind(Json(&input.location))
        .bind(&input.place_id)
        .fetch_one(pool)
        .await?;

    let value: Value = row.try_get("row")?;
    Ok(Place::from_row(value)?)
}

pub async fn update_place(pool: &PgPool, id: Uuid, input: &PlaceInput) -> Result<Option<Place>, DatabaseError> {
    let sql = r#"
        WITH updated AS (
            UPDATE places SET
                name = $2, description = $3, full_description = $4, category_id = $5,
                subcategory_id = $6, province_id = $7, locality_id = $8, image = $9,
                images = $10, google_maps_link = $11, rating = $12, social_links = $13,
                location = $14, place_id = $15
            WHERE id = $1
            RETURNING *
        )
        SELECT row_to_json(updated) AS row FROM updated
    "#;

    let row = sqlx::query(sql)
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.full_description)
        .bind(input.category_id)
        .bind(input.subcategory_id)
        .bind(input.province_id)
        .bind(input.locality_id)
        .bind(&input.image)
        .bind(Json(&input.images))
        .bind(&input.google_maps_link)
        .bind(Json(input.rating.clone().unwrap_or_default()))
        .bind(Json(&input.social_links))
        .bind(Json(&input.location))
        .bind(&input.place_id)
        .fetch_optional(pool)
        .await?;

    Ok(single_row(row)?.map(Place::from_row).transpose()?)
}

// Businesses

/// Businesses, optionally restricted to one status
pub async fn list_businesses(
    pool: &PgPool,
    status: Option<RecordStatus>,
) -> Result<Vec<BusinessRecord>, DatabaseError> {
    let rows = sqlx::query("SELECT row_to_json(t) AS row FROM businesses t WHERE ($1::text IS NULL OR t.status = $1)")
        .bind(status.map(|s| s.as_str()))
        .fetch_all(pool)
        .await?;
    row_values(rows)?
        .into_iter()
        .map(|value| BusinessRecord::from_row(value).map_err(DatabaseError::from))
        .collect()
}

pub async fn find_business(pool: &PgPool, id: Uuid) -> Result<Option<BusinessRecord>, DatabaseError> {
    let row = sqlx::query("SELECT row_to_json(t) AS row FROM businesses t WHERE t.id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(single_row(row)?.map(BusinessRecord::from_row).transpose()?)
}

pub async fn insert_business(
    pool: &PgPool,
    input: &BusinessInput,
    status: RecordStatus,
    owner: Option<Uuid>,
) -> Result<BusinessRecord, DatabaseError> {
    let sql = r#"
        WITH inserted AS (
            INSERT INTO businesses (
                name, description, full_description, category_id, subcategory_id,
                province_id, locality_id, address, lat, lng, phone, email, website,
                hours, image, images, google_maps_link, social_links, status, auth_user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING *
        )
        SELECT row_to_json(inserted) AS row FROM inserted
    "#;

    let row = sqlx::query(sql)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.full_description)
        .bind(input.category_id)
        .bind(input.subcategory_id)
        .bind(input.province_id)
        .bind(input.locality_id)
        .bind(&input.address)
        .bind(input.lat)
        .bind(input.lng)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.website)
        .bind(&input.hours)
        .bind(&input.image)
        .bind(Json(&input.images))
        .bind(&input.google_maps_link)
        .bind(Json(&input.social_links))
        .bind(status.as_str())
        .bind(owner)
        .fetch_one(pool)
        .await?;

    let value: Value = row.try_get("row")?;
    Ok(BusinessRecord::from_row(value)?)
}

/// Which row an update targets
#[derive(Debug, Clone, Copy)]
pub enum BusinessKey {
    Id(Uuid),
    Owner(Uuid),
}

/// Overwrite the editable columns of one business. `status: None` keeps the stored status;
/// `auth_user_id` is never touched.
pub async fn update_business(
    pool: &PgPool,
    key: BusinessKey,
    input: &BusinessInput,
    status: Option<RecordStatus>,
) -> Result<Option<BusinessRecord>, DatabaseError> {
    let (column, id) = match key {
        BusinessKey::Id(id) => ("id", id),
        BusinessKey::Owner(owner) => ("auth_user_id", owner),
    };

    let sql = format!(
        r#"
        WITH updated AS (
            UPDATE businesses SET
                name = $2, description = $3, full_description = $4, category_id = $5,
                subcategory_id = $6, province_id = $7, locality_id = $8, address = $9,
                lat = $10, lng = $11, phone = $12, email = $13, website = $14, hours = $15,
                image = $16, images = $17, google_maps_link = $18, social_links = $19,
                status = COALESCE($20, status)
            WHERE {} = $1
            RETURNING *
        )
        SELECT row_to_json(updated) AS row FROM updated
    "#,
        column
    );

    let row = sqlx::query(&sql)
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.full_description)
        .bind(input.category_id)
        .bind(input.subcategory_id)
        .bind(input.province_id)
        .bind(input.locality_id)
        .bind(&input.address)
        .bind(input.lat)
        .bind(input.lng)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.website)
        .bind(&input.hours)
        .bind(&input.image)
        .bind(Json(&input.images))
        .bind(&input.google_maps_link)
        .bind(Json(&input.social_links))
        .bind(status.map(|s| s.as_str()))
        .fetch_optional(pool)
        .await?;

    Ok(single_row(row)?.map(BusinessRecord::from_row).transpose()?)
}
