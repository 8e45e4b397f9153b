pub mod error;
pub mod registry;
pub mod repo;
pub mod service;
