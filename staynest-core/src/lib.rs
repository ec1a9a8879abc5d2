pub mod availability;
pub mod booking;
pub mod property;
pub mod repository;
pub mod user;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown enum value: {0}")]
    UnknownValue(String),
}
