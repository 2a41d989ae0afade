pub mod config;
pub mod error;
pub mod notify;
pub mod paths;
pub mod pipeline;
pub mod rating;
pub mod repository;
pub mod reviews;
pub mod store;

// Re-export commonly used types
pub use error::{Error, Result};
pub use repository::ReviewsRepository;
pub use reviews::{Distribution, Review, ReviewBatch, Store};
