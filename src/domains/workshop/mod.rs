pub mod service;
pub mod status;
pub mod types;

pub use service::{WorkshopStatusService, WorkshopStatusServiceImpl};
pub use status::compute_workshop_status;
pub use types::WorkshopStatus;
