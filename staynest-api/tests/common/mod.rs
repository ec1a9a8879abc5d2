use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tower::ServiceExt;
use uuid::Uuid;

use staynest_api::auth::Claims;
use staynest_api::state::{AppState, AuthConfig};
use staynest_core::availability::overlaps;
use staynest_core::booking::{
    Booking, BookingDetail, BookingStatus, BookingWithProperty, HostBooking,
};
use staynest_core::property::{
    HouseRules, Location, Price, Property, PropertyFilter, PropertyStatus, PropertySummary,
    PropertyType, PropertyWithHost, Ratings, Rooms,
};
use staynest_core::repository::{
    BookingRepository, PropertyRepository, RepoError, UserRepository,
};
use staynest_core::user::{Role, User, UserSummary};
use staynest_store::app_config::BusinessRules;
use staynest_store::RedisClient;

pub const TEST_SECRET: &str = "integration-test-secret";

/// In-memory implementation of all three repository traits, exercising the
/// same availability and idempotence semantics as the Postgres store.
#[derive(Default)]
pub struct MemStore {
    pub users: Mutex<Vec<User>>,
    pub properties: Mutex<Vec<Property>>,
    pub bookings: Mutex<Vec<Booking>>,
}

fn summary_of(user: &User) -> UserSummary {
    UserSummary {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        profile_image: user.profile_image.clone(),
    }
}

fn property_summary(property: &Property) -> PropertySummary {
    PropertySummary {
        id: property.id,
        title: property.title.clone(),
        images: property.images.clone(),
        location: property.location.clone(),
        price: property.price.clone(),
    }
}

fn matches_filter(p: &Property, f: &PropertyFilter) -> bool {
    if let Some(status) = f.status {
        if p.status != status {
            return false;
        }
    }
    if let Some(city) = &f.city {
        if !p.location.city.to_lowercase().contains(&city.to_lowercase()) {
            return false;
        }
    }
    if let Some(ty) = f.property_type {
        if p.property_type != ty {
            return false;
        }
    }
    if let Some(min) = f.min_price {
        if p.price.regular < min {
            return false;
        }
    }
    if let Some(max) = f.max_price {
        if p.price.regular > max {
            return false;
        }
    }
    if let Some(guests) = f.guests {
        if p.rules.max_guests < guests {
            return false;
        }
    }
    if let Some(term) = &f.term {
        let t = term.to_lowercase();
        if !(p.title.to_lowercase().contains(&t)
            || p.description.to_lowercase().contains(&t)
            || p.location.city.to_lowercase().contains(&t))
        {
            return false;
        }
    }
    true
}

impl MemStore {
    fn host_summary(&self, host_id: Uuid) -> Result<UserSummary, RepoError> {
        let users = self.users.lock().unwrap();
        users
            .iter()
            .find(|u| u.id == host_id)
            .map(summary_of)
            .ok_or_else(|| "host not found".into())
    }
}

#[async_trait]
impl PropertyRepository for MemStore {
    async fn create(&self, property: &Property) -> Result<(), RepoError> {
        self.properties.lock().unwrap().push(property.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Property>, RepoError> {
        Ok(self
            .properties
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn get_with_host(&self, id: Uuid) -> Result<Option<PropertyWithHost>, RepoError> {
        let property = match PropertyRepository::get(self, id).await? {
            Some(p) => p,
            None => return Ok(None),
        };
        let host = self.host_summary(property.host_id)?;
        Ok(Some(PropertyWithHost { property, host }))
    }

    async fn update(&self, property: &Property) -> Result<(), RepoError> {
        let mut properties = self.properties.lock().unwrap();
        if let Some(existing) = properties.iter_mut().find(|p| p.id == property.id) {
            *existing = property.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.properties.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }

    async fn search(
        &self,
        filter: &PropertyFilter,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<PropertyWithHost>, i64), RepoError> {
        let mut matches: Vec<Property> = self
            .properties
            .lock()
            .unwrap()
            .iter()
            .filter(|p| matches_filter(p, filter))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matches.len() as i64;
        let start = ((page - 1) * limit).max(0) as usize;
        let mut results = Vec::new();
        for property in matches.into_iter().skip(start).take(limit as usize) {
            let host = self.host_summary(property.host_id)?;
            results.push(PropertyWithHost { property, host });
        }
        Ok((results, total))
    }

    async fn list_by_host(&self, host_id: Uuid) -> Result<Vec<Property>, RepoError> {
        let mut properties: Vec<Property> = self
            .properties
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.host_id == host_id)
            .cloned()
            .collect();
        properties.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(properties)
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Property>, RepoError> {
        Ok(self
            .properties
            .lock()
            .unwrap()
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BookingRepository for MemStore {
    async fn is_available(
        &self,
        property_id: Uuid,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    ) -> Result<bool, RepoError> {
        let conflict = self.bookings.lock().unwrap().iter().any(|b| {
            b.property_id == property_id
                && b.booking_status.blocks_availability()
                && overlaps(b.check_in_date, b.check_out_date, check_in, check_out)
        });
        Ok(!conflict)
    }

    async fn create(&self, booking: &Booking) -> Result<Option<Booking>, RepoError> {
        // Check and insert under one lock, mirroring the serializable
        // transaction in the Postgres repository.
        let mut bookings = self.bookings.lock().unwrap();
        let conflict = bookings.iter().any(|b| {
            b.property_id == booking.property_id
                && b.booking_status.blocks_availability()
                && overlaps(
                    b.check_in_date,
                    b.check_out_date,
                    booking.check_in_date,
                    booking.check_out_date,
                )
        });
        if conflict {
            return Ok(None);
        }
        bookings.push(booking.clone());
        Ok(Some(booking.clone()))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, RepoError> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id)
            .cloned())
    }

    async fn get_detail(&self, id: Uuid) -> Result<Option<BookingDetail>, RepoError> {
        let booking = match BookingRepository::get(self, id).await? {
            Some(b) => b,
            None => return Ok(None),
        };
        let property = match self.get_with_host(booking.property_id).await? {
            Some(p) => p,
            None => return Ok(None),
        };
        let guest = {
            let users = self.users.lock().unwrap();
            match users.iter().find(|u| u.id == booking.guest_id) {
                Some(u) => summary_of(u),
                None => return Ok(None),
            }
        };
        Ok(Some(BookingDetail {
            booking,
            property,
            guest,
        }))
    }

    async fn list_for_guest(&self, guest_id: Uuid) -> Result<Vec<BookingWithProperty>, RepoError> {
        let properties = self.properties.lock().unwrap().clone();
        let mut bookings: Vec<Booking> = self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.guest_id == guest_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut results = Vec::new();
        for booking in bookings {
            let property = properties
                .iter()
                .find(|p| p.id == booking.property_id)
                .map(property_summary)
                .ok_or("property not found")?;
            results.push(BookingWithProperty { booking, property });
        }
        Ok(results)
    }

    async fn list_for_host(&self, host_id: Uuid) -> Result<Vec<HostBooking>, RepoError> {
        let properties = self.properties.lock().unwrap().clone();
        let users = self.users.lock().unwrap().clone();
        let host_property_ids: Vec<Uuid> = properties
            .iter()
            .filter(|p| p.host_id == host_id)
            .map(|p| p.id)
            .collect();

        let mut bookings: Vec<Booking> = self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| host_property_ids.contains(&b.property_id))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut results = Vec::new();
        for booking in bookings {
            let property = properties
                .iter()
                .find(|p| p.id == booking.property_id)
                .map(property_summary)
                .ok_or("property not found")?;
            let guest = users
                .iter()
                .find(|u| u.id == booking.guest_id)
                .map(summary_of)
                .ok_or("guest not found")?;
            results.push(HostBooking {
                booking,
                property,
                guest,
            });
        }
        Ok(results)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        cancellation_reason: Option<&str>,
    ) -> Result<Option<Booking>, RepoError> {
        let mut bookings = self.bookings.lock().unwrap();
        let booking = match bookings.iter_mut().find(|b| b.id == id) {
            Some(b) => b,
            None => return Ok(None),
        };
        booking.booking_status = status;
        if let Some(reason) = cancellation_reason {
            booking.cancellation_reason = Some(reason.to_string());
        }
        booking.updated_at = Utc::now();
        Ok(Some(booking.clone()))
    }
}

#[async_trait]
impl UserRepository for MemStore {
    async fn get(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        phone_number: Option<&str>,
        profile_image: Option<&str>,
    ) -> Result<Option<User>, RepoError> {
        let mut users = self.users.lock().unwrap();
        let user = match users.iter_mut().find(|u| u.id == id) {
            Some(u) => u,
            None => return Ok(None),
        };
        if let Some(name) = name {
            user.name = name.to_string();
        }
        if let Some(phone) = phone_number {
            user.phone_number = Some(phone.to_string());
        }
        if let Some(image) = profile_image {
            user.profile_image = Some(image.to_string());
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_saved_properties(&self, id: Uuid, saved: &[Uuid]) -> Result<(), RepoError> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.saved_properties = saved.to_vec();
            user.updated_at = Utc::now();
        }
        Ok(())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn june(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, day, 0, 0, 0).unwrap()
}

pub fn make_user(name: &str, role: Role) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        role,
        phone_number: None,
        profile_image: None,
        saved_properties: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

pub fn make_property(host: &User, title: &str, city: &str, price: f64, max_guests: i32) -> Property {
    let now = Utc::now();
    Property {
        id: Uuid::new_v4(),
        host_id: host.id,
        title: title.to_string(),
        description: format!("{} in {}", title, city),
        property_type: PropertyType::House,
        location: Location {
            address: "1 Main St".to_string(),
            city: city.to_string(),
            state: "CA".to_string(),
            country: "USA".to_string(),
            zip_code: None,
            coordinates: None,
        },
        price: Price {
            regular: price,
            discounted: None,
        },
        amenities: vec!["WiFi".to_string()],
        rules: HouseRules {
            pets_allowed: false,
            smoking_allowed: false,
            events_allowed: false,
            max_guests,
            check_in_time: "15:00".to_string(),
            check_out_time: "11:00".to_string(),
        },
        rooms: Rooms {
            bedrooms: 2,
            beds: 3,
            bathrooms: 1,
        },
        images: Vec::new(),
        ratings: Ratings::default(),
        availability: Vec::new(),
        status: PropertyStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

pub fn make_booking(
    property: &Property,
    guest: &User,
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
    status: BookingStatus,
) -> Booking {
    let mut booking = Booking::new(
        property.id,
        guest.id,
        check_in,
        check_out,
        2,
        property.price.regular,
        None,
    );
    booking.booking_status = status;
    booking
}

pub async fn test_state(store: Arc<MemStore>) -> AppState {
    AppState {
        properties: store.clone(),
        bookings: store.clone(),
        users: store,
        redis: Arc::new(
            RedisClient::new("redis://127.0.0.1:6379")
                .await
                .expect("redis client"),
        ),
        auth: AuthConfig {
            secret: TEST_SECRET.to_string(),
        },
        business_rules: BusinessRules {
            default_page_size: 10,
            max_page_size: 50,
            rate_limit_per_minute: 100,
        },
    }
}

pub fn token_for(user: &User) -> String {
    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.as_str().to_string(),
        exp: (Utc::now() + Duration::days(1)).timestamp() as usize,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("token encoding")
}

// ============================================================================
// Request helpers
// ============================================================================

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, body)
}
