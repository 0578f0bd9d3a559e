//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends to be used interchangeably in the domain layer.

use anyhow::Result;
use async_trait::async_trait;
use shared::{Habit, Profile};

/// Trait defining the interface for habit storage operations
///
/// This trait abstracts away the specific storage implementation details,
/// allowing the domain layer to work with different storage backends
/// without modification.
#[async_trait]
pub trait HabitStorage: Send + Sync {
    /// Store a new habit for a user
    async fn store_habit(&self, user_id: &str, habit: &Habit) -> Result<()>;

    /// Retrieve a specific habit by ID
    async fn get_habit(&self, user_id: &str, habit_id: &str) -> Result<Option<Habit>>;

    /// List all habits for a user in creation order (oldest first)
    async fn list_habits(&self, user_id: &str) -> Result<Vec<Habit>>;

    /// Update an existing habit
    async fn update_habit(&self, user_id: &str, habit: &Habit) -> Result<()>;

    /// Delete a habit by ID
    /// Returns true if the habit was found and deleted, false otherwise
    async fn delete_habit(&self, user_id: &str, habit_id: &str) -> Result<bool>;
}

/// Trait defining the interface for profile storage operations
#[async_trait]
pub trait ProfileStorage: Send + Sync {
    /// Store a new profile
    async fn store_profile(&self, profile: &Profile) -> Result<()>;

    /// Retrieve a profile by user ID
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>>;

    /// Update an existing profile
    async fn update_profile(&self, profile: &Profile) -> Result<()>;
}
