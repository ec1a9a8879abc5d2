use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::booking::{Booking, BookingDetail, BookingStatus, BookingWithProperty, HostBooking};
use crate::property::{Property, PropertyFilter, PropertyWithHost};
use crate::user::User;

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;

/// Repository trait for listing data access
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn create(&self, property: &Property) -> Result<(), RepoError>;

    async fn get(&self, id: Uuid) -> Result<Option<Property>, RepoError>;

    async fn get_with_host(&self, id: Uuid) -> Result<Option<PropertyWithHost>, RepoError>;

    async fn update(&self, property: &Property) -> Result<(), RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    /// Filtered, paginated search, newest first. Returns the page of results
    /// and the total number of matches.
    async fn search(
        &self,
        filter: &PropertyFilter,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<PropertyWithHost>, i64), RepoError>;

    async fn list_by_host(&self, host_id: Uuid) -> Result<Vec<Property>, RepoError>;

    async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Property>, RepoError>;
}

/// Repository trait for reservation data access
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Availability check: true when no confirmed or pending booking for the
    /// property overlaps the closed interval [check_in, check_out].
    /// Read-only.
    async fn is_available(
        &self,
        property_id: Uuid,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    ) -> Result<bool, RepoError>;

    /// Re-checks availability and inserts inside a single consistency
    /// boundary. Returns `None` when the dates conflict with an existing
    /// confirmed or pending booking.
    async fn create(&self, booking: &Booking) -> Result<Option<Booking>, RepoError>;

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, RepoError>;

    async fn get_detail(&self, id: Uuid) -> Result<Option<BookingDetail>, RepoError>;

    async fn list_for_guest(&self, guest_id: Uuid) -> Result<Vec<BookingWithProperty>, RepoError>;

    async fn list_for_host(&self, host_id: Uuid) -> Result<Vec<HostBooking>, RepoError>;

    /// Applies a status change. The cancellation reason, when given, is
    /// stored alongside; `None` leaves any existing reason untouched.
    async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        cancellation_reason: Option<&str>,
    ) -> Result<Option<Booking>, RepoError>;
}

/// Repository trait for account data access
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<User>, RepoError>;

    /// Updates the mutable profile fields only. `None` keeps the current
    /// value.
    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        phone_number: Option<&str>,
        profile_image: Option<&str>,
    ) -> Result<Option<User>, RepoError>;

    async fn set_saved_properties(&self, id: Uuid, saved: &[Uuid]) -> Result<(), RepoError>;
}
