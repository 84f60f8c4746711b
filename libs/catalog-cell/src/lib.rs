pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{CatalogError, Clinic, Doctor};
pub use router::catalog_routes;
pub use services::CatalogService;
