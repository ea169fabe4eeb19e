//! Typed client for the SMS campaign backend.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod models;

pub use api::SmsApi;
pub use backend::SmsBackend;
pub use config::ClientConfig;
pub use error::ClientError;
