//! HTTP API
//!
//! The hosted edge function's routes plus read-only campaign, credential and
//! session endpoints, served with axum.

pub mod handlers;
pub mod server;

pub use handlers::{ApiError, SharedContext};
pub use server::{build_router, serve};
