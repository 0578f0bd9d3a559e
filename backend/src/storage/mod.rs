//! # Storage Module
//!
//! Handles all data persistence operations for the habit tracker.
//!
//! The domain layer only sees the traits in [`traits`]; the SQLite
//! repositories here are one implementation of them, wired in by
//! [`crate::initialize_backend`]. The implementation can be swapped out
//! without affecting the domain logic.

pub mod connection;
pub mod repositories;
pub mod traits;

// Re-export the main types that other modules need
pub use connection::DbConnection;
pub use repositories::{HabitRepository, ProfileRepository};
pub use traits::{HabitStorage, ProfileStorage};
