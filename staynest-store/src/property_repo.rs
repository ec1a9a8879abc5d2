use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use staynest_core::property::{
    Property, PropertyFilter, PropertyStatus, PropertyType, PropertyWithHost,
};
use staynest_core::repository::{PropertyRepository, RepoError};
use staynest_core::user::UserSummary;

pub struct PgPropertyRepository {
    pool: PgPool,
}

impl PgPropertyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct PropertyRow {
    id: Uuid,
    host_id: Uuid,
    title: String,
    description: String,
    property_type: String,
    location: Value,
    price: Value,
    amenities: Vec<String>,
    rules: Value,
    rooms: Value,
    images: Value,
    ratings: Value,
    availability: Value,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct PropertyHostRow {
    #[sqlx(flatten)]
    property: PropertyRow,
    host_name: String,
    host_email: String,
    host_profile_image: Option<String>,
}

fn to_property(row: PropertyRow) -> Result<Property, RepoError> {
    Ok(Property {
        id: row.id,
        host_id: row.host_id,
        title: row.title,
        description: row.description,
        property_type: PropertyType::parse(&row.property_type)?,
        location: serde_json::from_value(row.location)?,
        price: serde_json::from_value(row.price)?,
        amenities: row.amenities,
        rules: serde_json::from_value(row.rules)?,
        rooms: serde_json::from_value(row.rooms)?,
        images: serde_json::from_value(row.images)?,
        ratings: serde_json::from_value(row.ratings)?,
        availability: serde_json::from_value(row.availability)?,
        status: PropertyStatus::parse(&row.status)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn to_property_with_host(row: PropertyHostRow) -> Result<PropertyWithHost, RepoError> {
    let host = UserSummary {
        id: row.property.host_id,
        name: row.host_name,
        email: row.host_email,
        profile_image: row.host_profile_image,
    };
    Ok(PropertyWithHost {
        property: to_property(row.property)?,
        host,
    })
}

const PROPERTY_COLS: &str = "p.id, p.host_id, p.title, p.description, p.property_type, \
     p.location, p.price, p.amenities, p.rules, p.rooms, p.images, p.ratings, \
     p.availability, p.status, p.created_at, p.updated_at";

/// Appends the WHERE clause shared by the COUNT and page queries.
fn apply_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &PropertyFilter) {
    qb.push(" WHERE 1=1");

    if let Some(status) = filter.status {
        qb.push(" AND p.status = ").push_bind(status.as_str());
    }
    if let Some(city) = &filter.city {
        qb.push(" AND p.location->>'city' ILIKE ")
            .push_bind(format!("%{}%", city));
    }
    if let Some(ty) = filter.property_type {
        qb.push(" AND p.property_type = ").push_bind(ty.as_str());
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND (p.price->>'regular')::float8 >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND (p.price->>'regular')::float8 <= ").push_bind(max);
    }
    if let Some(guests) = filter.guests {
        qb.push(" AND (p.rules->>'maxGuests')::int >= ").push_bind(guests);
    }
    if let Some(term) = &filter.term {
        let pattern = format!("%{}%", term);
        qb.push(" AND (p.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.location->>'city' ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl PropertyRepository for PgPropertyRepository {
    async fn create(&self, property: &Property) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO properties
                (id, host_id, title, description, property_type, location, price,
                 amenities, rules, rooms, images, ratings, availability, status,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(property.id)
        .bind(property.host_id)
        .bind(&property.title)
        .bind(&property.description)
        .bind(property.property_type.as_str())
        .bind(serde_json::to_value(&property.location)?)
        .bind(serde_json::to_value(&property.price)?)
        .bind(&property.amenities)
        .bind(serde_json::to_value(&property.rules)?)
        .bind(serde_json::to_value(&property.rooms)?)
        .bind(serde_json::to_value(&property.images)?)
        .bind(serde_json::to_value(&property.ratings)?)
        .bind(serde_json::to_value(&property.availability)?)
        .bind(property.status.as_str())
        .bind(property.created_at)
        .bind(property.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Property>, RepoError> {
        let row: Option<PropertyRow> = sqlx::query_as(&format!(
            "SELECT {} FROM properties p WHERE p.id = $1",
            PROPERTY_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(to_property).transpose()
    }

    async fn get_with_host(&self, id: Uuid) -> Result<Option<PropertyWithHost>, RepoError> {
        let row: Option<PropertyHostRow> = sqlx::query_as(&format!(
            "SELECT {}, u.name AS host_name, u.email AS host_email, \
             u.profile_image AS host_profile_image \
             FROM properties p JOIN users u ON u.id = p.host_id WHERE p.id = $1",
            PROPERTY_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(to_property_with_host).transpose()
    }

    async fn update(&self, property: &Property) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            UPDATE properties SET
                title = $2, description = $3, property_type = $4, location = $5,
                price = $6, amenities = $7, rules = $8, rooms = $9, images = $10,
                ratings = $11, availability = $12, status = $13, updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(property.id)
        .bind(&property.title)
        .bind(&property.description)
        .bind(property.property_type.as_str())
        .bind(serde_json::to_value(&property.location)?)
        .bind(serde_json::to_value(&property.price)?)
        .bind(&property.amenities)
        .bind(serde_json::to_value(&property.rules)?)
        .bind(serde_json::to_value(&property.rooms)?)
        .bind(serde_json::to_value(&property.images)?)
        .bind(serde_json::to_value(&property.ratings)?)
        .bind(serde_json::to_value(&property.availability)?)
        .bind(property.status.as_str())
        .bind(property.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn search(
        &self,
        filter: &PropertyFilter,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<PropertyWithHost>, i64), RepoError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM properties p");
        apply_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {}, u.name AS host_name, u.email AS host_email, \
             u.profile_image AS host_profile_image \
             FROM properties p JOIN users u ON u.id = p.host_id",
            PROPERTY_COLS
        ));
        apply_filters(&mut qb, filter);
        qb.push(" ORDER BY p.created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind((page - 1) * limit);

        let rows: Vec<PropertyHostRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        let properties = rows
            .into_iter()
            .map(to_property_with_host)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((properties, total))
    }

    async fn list_by_host(&self, host_id: Uuid) -> Result<Vec<Property>, RepoError> {
        let rows: Vec<PropertyRow> = sqlx::query_as(&format!(
            "SELECT {} FROM properties p WHERE p.host_id = $1 ORDER BY p.created_at DESC",
            PROPERTY_COLS
        ))
        .bind(host_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(to_property).collect()
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Property>, RepoError> {
        let rows: Vec<PropertyRow> = sqlx::query_as(&format!(
            "SELECT {} FROM properties p WHERE p.id = ANY($1) ORDER BY p.created_at DESC",
            PROPERTY_COLS
        ))
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(to_property).collect()
    }
}
