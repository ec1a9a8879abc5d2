use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

/// Closed set of account roles. Capability checks go through the predicates
/// below instead of string comparisons at call sites.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Host,
    Admin,
}

impl Role {
    pub fn is_host_or_admin(self) -> bool {
        matches!(self, Role::Host | Role::Admin)
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Host => "host",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "user" => Ok(Role::User),
            "host" => Ok(Role::Host),
            "admin" => Ok(Role::Admin),
            other => Err(CoreError::UnknownValue(format!("role '{}'", other))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marketplace account. Credentials live with the external identity
/// provider; there is no password field anywhere in this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub profile_image: Option<String>,
    pub saved_properties: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Add a property to the saved set. Saving an already-saved property has
    /// no additional effect.
    pub fn save_property(&mut self, property_id: Uuid) {
        if !self.saved_properties.contains(&property_id) {
            self.saved_properties.push(property_id);
        }
    }

    /// Remove a property from the saved set. Unsaving a non-member is a
    /// no-op.
    pub fn unsave_property(&mut self, property_id: Uuid) {
        self.saved_properties.retain(|id| *id != property_id);
    }
}

/// Slim projection embedded in booking and property responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub profile_image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Jane Guest".to_string(),
            email: "guest@example.com".to_string(),
            role: Role::User,
            phone_number: None,
            profile_image: None,
            saved_properties: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn role_capabilities() {
        assert!(!Role::User.is_host_or_admin());
        assert!(Role::Host.is_host_or_admin());
        assert!(Role::Admin.is_host_or_admin());
        assert!(Role::Admin.is_admin());
        assert!(!Role::Host.is_admin());
    }

    #[test]
    fn role_parse_round_trip() {
        for role in [Role::User, Role::Host, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()).unwrap(), role);
        }
        assert!(Role::parse("superuser").is_err());
    }

    #[test]
    fn saving_twice_is_idempotent() {
        let mut user = sample_user();
        let property_id = Uuid::new_v4();

        user.save_property(property_id);
        user.save_property(property_id);

        assert_eq!(user.saved_properties, vec![property_id]);
    }

    #[test]
    fn unsaving_a_non_member_is_a_noop() {
        let mut user = sample_user();
        let saved = Uuid::new_v4();
        user.save_property(saved);

        user.unsave_property(Uuid::new_v4());
        assert_eq!(user.saved_properties, vec![saved]);

        user.unsave_property(saved);
        assert!(user.saved_properties.is_empty());
    }
}
