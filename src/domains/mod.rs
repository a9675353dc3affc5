pub mod contract;
pub mod core;
pub mod permission;
pub mod trainer;
pub mod workshop;
