//! # Infrastructure Layer
//!
//! Adapters behind the repository ports.

pub mod persistence;
