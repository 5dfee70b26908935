//! Forum REST API client
//!
//! A thin typed layer over the HTTP endpoints: boards, threads, posts, the
//! session and user profiles. Failures surface as [`ApiError`]; list adapters
//! coerce them into the "no result" signal the entity list expects.

pub mod client;
pub mod errors;
pub mod types;

pub use client::*;
pub use errors::*;
pub use types::*;
