pub mod registration_repository;
pub mod repository;
pub mod service;
pub mod types;

pub use service::{TrainerService, TrainerServiceImpl};
