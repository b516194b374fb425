//! Authenticated HTTP primitive for the Skillexa API.
//!
//! One client, one contract: JSON over HTTP with a bearer credential read
//! from the persistent store. 401 surfaces as [`ApiError::Unauthorized`],
//! every other non-success status as [`ApiError::RequestFailed`]. Callers
//! (pollers, mutators) supply the endpoint shapes; this crate only moves
//! JSON.

mod client;
mod error;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
