//! HTTP transport for the NHL feeds.

pub mod client;
pub mod errors;

pub use client::NhlClient;
pub use errors::ApiError;
