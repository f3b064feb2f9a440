pub mod csv_exchange;
pub mod error;
pub mod repository;
pub mod service;

pub use error::CategoryServiceError;
pub use repository::{CategoryStore, SqliteCategoryStore};
