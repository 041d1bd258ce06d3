//! Realtime gateway and HTTP API implementation.

mod error;
mod handler;
mod server;
mod signal;
pub mod state;

pub use error::ApiError;
pub use server::{Server, build_router};
