//! Storage traits for authentication data.
//!
//! Implementations live outside this crate (the server ships an in-memory
//! one); this crate only depends on the lookups it needs to issue credentials.

pub mod user;

pub use user::{User, UserStorage};
