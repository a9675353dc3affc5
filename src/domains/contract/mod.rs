pub mod repository;
pub mod service;
pub mod template;
pub mod types;

pub use service::{ContractService, ContractServiceImpl};
pub use template::{resolve, Placeholder, TemplateContext};
