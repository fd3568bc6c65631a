pub mod codes;
pub mod config;
pub mod db;
pub mod diff;
pub mod error;
pub mod handlers;
pub mod models;
pub mod service;

pub use error::AppError;
pub use handlers::router;
