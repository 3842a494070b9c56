pub mod client;
pub mod error;

pub use client::{ApiClient, SyncResponse};
pub use error::ApiError;
