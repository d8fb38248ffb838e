//! # Application Layer
//!
//! Use-case services, request/response shapes and the error type the
//! routing layer sees.

pub mod dto;
pub mod error;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
