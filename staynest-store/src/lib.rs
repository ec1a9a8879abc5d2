pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod property_repo;
pub mod redis_repo;
pub mod user_repo;

pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use property_repo::PgPropertyRepository;
pub use redis_repo::RedisClient;
pub use user_repo::PgUserRepository;
