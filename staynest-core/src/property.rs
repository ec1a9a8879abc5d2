use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::UserSummary;
use crate::CoreError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PropertyType {
    Hotel,
    Apartment,
    House,
    Villa,
    Cabin,
    Cottage,
    Other,
}

impl PropertyType {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyType::Hotel => "Hotel",
            PropertyType::Apartment => "Apartment",
            PropertyType::House => "House",
            PropertyType::Villa => "Villa",
            PropertyType::Cabin => "Cabin",
            PropertyType::Cottage => "Cottage",
            PropertyType::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "Hotel" => Ok(PropertyType::Hotel),
            "Apartment" => Ok(PropertyType::Apartment),
            "House" => Ok(PropertyType::House),
            "Villa" => Ok(PropertyType::Villa),
            "Cabin" => Ok(PropertyType::Cabin),
            "Cottage" => Ok(PropertyType::Cottage),
            "Other" => Ok(PropertyType::Other),
            other => Err(CoreError::UnknownValue(format!("property type '{}'", other))),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listing lifecycle. Only `active` listings are visible on the public
/// search path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Active,
    Inactive,
    Pending,
    Rejected,
}

impl PropertyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyStatus::Active => "active",
            PropertyStatus::Inactive => "inactive",
            PropertyStatus::Pending => "pending",
            PropertyStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "active" => Ok(PropertyStatus::Active),
            "inactive" => Ok(PropertyStatus::Inactive),
            "pending" => Ok(PropertyStatus::Pending),
            "rejected" => Ok(PropertyStatus::Rejected),
            other => Err(CoreError::UnknownValue(format!("property status '{}'", other))),
        }
    }
}

impl fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: Option<String>,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub regular: f64,
    pub discounted: Option<f64>,
}

/// Occupancy and house rules. Defaults mirror what the marketplace has
/// always used for new listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseRules {
    #[serde(default)]
    pub pets_allowed: bool,
    #[serde(default)]
    pub smoking_allowed: bool,
    #[serde(default)]
    pub events_allowed: bool,
    pub max_guests: i32,
    #[serde(default = "default_check_in_time")]
    pub check_in_time: String,
    #[serde(default = "default_check_out_time")]
    pub check_out_time: String,
}

fn default_check_in_time() -> String {
    "15:00".to_string()
}

fn default_check_out_time() -> String {
    "11:00".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rooms {
    pub bedrooms: i32,
    pub beds: i32,
    pub bathrooms: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyImage {
    pub url: String,
    pub caption: Option<String>,
    #[serde(default)]
    pub is_main: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ratings {
    pub average: f64,
    pub count: i64,
}

impl Default for Ratings {
    fn default() -> Self {
        Self { average: 0.0, count: 0 }
    }
}

/// A window of dates during which the host accepts stays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityWindow {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// A host's listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    pub host_id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub location: Location,
    pub price: Price,
    pub amenities: Vec<String>,
    pub rules: HouseRules,
    pub rooms: Rooms,
    pub images: Vec<PropertyImage>,
    #[serde(default)]
    pub ratings: Ratings,
    pub availability: Vec<AvailabilityWindow>,
    pub status: PropertyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing with its host's public profile embedded, as returned by the
/// search and detail endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyWithHost {
    #[serde(flatten)]
    pub property: Property,
    pub host: UserSummary,
}

/// Slim projection embedded in a guest's booking list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    pub id: Uuid,
    pub title: String,
    pub images: Vec<PropertyImage>,
    pub location: Location,
    pub price: Price,
}

/// Search filters for the public listing path. `None` fields are not
/// applied. `term` matches title, description, or city.
#[derive(Debug, Clone, Default)]
pub struct PropertyFilter {
    pub city: Option<String>,
    pub property_type: Option<PropertyType>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub guests: Option<i32>,
    pub term: Option<String>,
    pub status: Option<PropertyStatus>,
}
