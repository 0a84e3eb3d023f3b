//! Core Module - Infrastructure of the application
//!
//! - Authentication and JWT
//! - Configuration
//! - Error handling
//! - One time codes and per event locks
//! - Application state

pub mod auth;
pub mod config;
pub mod error;
pub mod locks;
pub mod otp;
pub mod state;

// Re-exports
pub use auth::{Claims, authentication_middleware, decode_jwt, encode_jwt, require_creator};
pub use config::Config;
pub use error::AppError;
pub use state::AppState;
