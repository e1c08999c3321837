//! Optional remote API.
//!
//! Nothing in the local core depends on it. Calls are never retried; a 401
//! clears the client's token.

mod client;
mod error;
pub mod types;

pub use client::ApiClient;
pub use error::{ApiError, ApiErrorKind};
pub use types::ApiResponse;
