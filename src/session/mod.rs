//! Session state for the logged-in user
//!
//! The forum authenticates with a session cookie held by the HTTP client; this
//! module only tracks who the server says is logged in.

mod store;

pub use store::*;
