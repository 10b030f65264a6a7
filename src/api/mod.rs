//! REST client for the analysis service.
//!
//! The tracker talks to the backend only through the [`TaskApi`] trait;
//! [`HttpTaskApi`] is the `reqwest`-backed implementation.

pub mod client;
pub mod error;

pub use client::{HttpTaskApi, TaskApi};
pub use error::ApiError;
