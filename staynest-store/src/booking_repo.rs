use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use staynest_core::booking::{
    Booking, BookingDetail, BookingStatus, BookingWithProperty, HostBooking, PaymentStatus,
};
use staynest_core::property::PropertySummary;
use staynest_core::repository::{BookingRepository, PropertyRepository, RepoError};
use staynest_core::user::UserSummary;

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    property_id: Uuid,
    guest_id: Uuid,
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
    total_guests: i32,
    total_price: f64,
    payment_status: String,
    booking_status: String,
    special_requests: Option<String>,
    cancellation_reason: Option<String>,
    review_submitted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct GuestBookingRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    property_title: String,
    property_images: Value,
    property_location: Value,
    property_price: Value,
}

#[derive(sqlx::FromRow)]
struct HostBookingRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    property_title: String,
    property_images: Value,
    property_location: Value,
    property_price: Value,
    guest_name: String,
    guest_email: String,
    guest_profile_image: Option<String>,
}

fn to_booking(row: BookingRow) -> Result<Booking, RepoError> {
    Ok(Booking {
        id: row.id,
        property_id: row.property_id,
        guest_id: row.guest_id,
        check_in_date: row.check_in,
        check_out_date: row.check_out,
        total_guests: row.total_guests,
        total_price: row.total_price,
        payment_status: PaymentStatus::parse(&row.payment_status)?,
        booking_status: BookingStatus::parse(&row.booking_status)?,
        special_requests: row.special_requests,
        cancellation_reason: row.cancellation_reason,
        review_submitted: row.review_submitted,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn to_property_summary(
    id: Uuid,
    title: String,
    images: Value,
    location: Value,
    price: Value,
) -> Result<PropertySummary, RepoError> {
    Ok(PropertySummary {
        id,
        title,
        images: serde_json::from_value(images)?,
        location: serde_json::from_value(location)?,
        price: serde_json::from_value(price)?,
    })
}

const BOOKING_COLS: &str = "b.id, b.property_id, b.guest_id, b.check_in, b.check_out, \
     b.total_guests, b.total_price, b.payment_status, b.booking_status, \
     b.special_requests, b.cancellation_reason, b.review_submitted, \
     b.created_at, b.updated_at";

const CONFLICT_SQL: &str = "SELECT EXISTS( \
     SELECT 1 FROM bookings \
     WHERE property_id = $1 \
       AND booking_status IN ('pending', 'confirmed') \
       AND check_in <= $3 AND check_out >= $2)";

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn is_available(
        &self,
        property_id: Uuid,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    ) -> Result<bool, RepoError> {
        let conflict: bool = sqlx::query_scalar(CONFLICT_SQL)
            .bind(property_id)
            .bind(check_in)
            .bind(check_out)
            .fetch_one(&self.pool)
            .await?;

        Ok(!conflict)
    }

    async fn create(&self, booking: &Booking) -> Result<Option<Booking>, RepoError> {
        // The conflict check and the insert share one serializable
        // transaction so two racing requests cannot both pass the check.
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        let conflict: bool = sqlx::query_scalar(CONFLICT_SQL)
            .bind(booking.property_id)
            .bind(booking.check_in_date)
            .bind(booking.check_out_date)
            .fetch_one(&mut *tx)
            .await?;

        if conflict {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query(
            r#"
            INSERT INTO bookings
                (id, property_id, guest_id, check_in, check_out, total_guests,
                 total_price, payment_status, booking_status, special_requests,
                 cancellation_reason, review_submitted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(booking.id)
        .bind(booking.property_id)
        .bind(booking.guest_id)
        .bind(booking.check_in_date)
        .bind(booking.check_out_date)
        .bind(booking.total_guests)
        .bind(booking.total_price)
        .bind(booking.payment_status.as_str())
        .bind(booking.booking_status.as_str())
        .bind(&booking.special_requests)
        .bind(&booking.cancellation_reason)
        .bind(booking.review_submitted)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(booking.clone()))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, RepoError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings b WHERE b.id = $1",
            BOOKING_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(to_booking).transpose()
    }

    async fn get_detail(&self, id: Uuid) -> Result<Option<BookingDetail>, RepoError> {
        let booking = match self.get(id).await? {
            Some(b) => b,
            None => return Ok(None),
        };

        let property_repo = crate::PgPropertyRepository::new(self.pool.clone());
        let property = match property_repo.get_with_host(booking.property_id).await? {
            Some(p) => p,
            None => return Ok(None),
        };

        let guest: Option<(Uuid, String, String, Option<String>)> = sqlx::query_as(
            "SELECT id, name, email, profile_image FROM users WHERE id = $1",
        )
        .bind(booking.guest_id)
        .fetch_optional(&self.pool)
        .await?;

        let guest = match guest {
            Some((gid, name, email, profile_image)) => UserSummary {
                id: gid,
                name,
                email,
                profile_image,
            },
            None => return Ok(None),
        };

        Ok(Some(BookingDetail {
            booking,
            property,
            guest,
        }))
    }

    async fn list_for_guest(&self, guest_id: Uuid) -> Result<Vec<BookingWithProperty>, RepoError> {
        let rows: Vec<GuestBookingRow> = sqlx::query_as(&format!(
            "SELECT {}, p.title AS property_title, p.images AS property_images, \
             p.location AS property_location, p.price AS property_price \
             FROM bookings b JOIN properties p ON p.id = b.property_id \
             WHERE b.guest_id = $1 ORDER BY b.created_at DESC",
            BOOKING_COLS
        ))
        .bind(guest_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let property = to_property_summary(
                    row.booking.property_id,
                    row.property_title,
                    row.property_images,
                    row.property_location,
                    row.property_price,
                )?;
                Ok(BookingWithProperty {
                    booking: to_booking(row.booking)?,
                    property,
                })
            })
            .collect()
    }

    async fn list_for_host(&self, host_id: Uuid) -> Result<Vec<HostBooking>, RepoError> {
        let rows: Vec<HostBookingRow> = sqlx::query_as(&format!(
            "SELECT {}, p.title AS property_title, p.images AS property_images, \
             p.location AS property_location, p.price AS property_price, \
             g.name AS guest_name, g.email AS guest_email, \
             g.profile_image AS guest_profile_image \
             FROM bookings b \
             JOIN properties p ON p.id = b.property_id \
             JOIN users g ON g.id = b.guest_id \
             WHERE p.host_id = $1 ORDER BY b.created_at DESC",
            BOOKING_COLS
        ))
        .bind(host_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let property = to_property_summary(
                    row.booking.property_id,
                    row.property_title,
                    row.property_images,
                    row.property_location,
                    row.property_price,
                )?;
                let guest = UserSummary {
                    id: row.booking.guest_id,
                    name: row.guest_name,
                    email: row.guest_email,
                    profile_image: row.guest_profile_image,
                };
                Ok(HostBooking {
                    booking: to_booking(row.booking)?,
                    property,
                    guest,
                })
            })
            .collect()
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        cancellation_reason: Option<&str>,
    ) -> Result<Option<Booking>, RepoError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "UPDATE bookings b SET booking_status = $2, \
             cancellation_reason = COALESCE($3, b.cancellation_reason), \
             updated_at = NOW() \
             WHERE b.id = $1 \
             RETURNING {}",
            BOOKING_COLS
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(cancellation_reason)
        .fetch_optional(&self.pool)
        .await?;

        row.map(to_booking).transpose()
    }
}
