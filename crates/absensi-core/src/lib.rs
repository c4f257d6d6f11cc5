//! Core types and trait definitions for the absensi (attendance) service.
//!
//! This crate is deliberately free of HTTP, metrics and database
//! dependencies. The store, API and server crates build on it.

pub mod error;
pub mod page;
pub mod record;
pub mod store;
pub mod timestamp;
pub mod validate;

pub use error::{Error, ErrorKind, Result};
