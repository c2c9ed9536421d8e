//! Core error types shared by every component.

pub mod error;

pub use error::{ErrorContext, NotifierError, user_friendly_error};
