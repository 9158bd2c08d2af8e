pub mod attachment;
pub mod config;
pub mod directive;
pub mod error;
pub mod notification;
pub mod persona;
pub mod repository;
pub mod session;

// Re-export common error type
pub use error::{ArminError, Result, TransportErrorKind};
