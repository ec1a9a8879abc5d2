use std::sync::Arc;

use staynest_core::repository::{BookingRepository, PropertyRepository, UserRepository};
use staynest_store::app_config::BusinessRules;
use staynest_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub properties: Arc<dyn PropertyRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub users: Arc<dyn UserRepository>,
    pub redis: Arc<RedisClient>,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
}
