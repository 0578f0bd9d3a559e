//! Profile lifecycle and derived account-wide reward values.

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};
use log::info;
use std::sync::Arc;

use crate::domain::leveling;
use crate::storage::traits::ProfileStorage;
use shared::{Habit, Profile, RewardsSummary};

/// Service for managing user profiles
#[derive(Clone)]
pub struct ProfileService {
    profile_store: Arc<dyn ProfileStorage>,
}

impl ProfileService {
    /// Create a new ProfileService
    pub fn new(profile_store: Arc<dyn ProfileStorage>) -> Self {
        Self { profile_store }
    }

    /// Fetch the user's profile, creating it on first sight.
    ///
    /// A missing profile is a normal first-login condition, not an error.
    pub async fn get_or_create(&self, user_id: &str) -> Result<Profile> {
        self.get_or_create_at(user_id, Local::now()).await
    }

    /// Fetch or lazily create the profile as of a specific instant
    pub async fn get_or_create_at(
        &self,
        user_id: &str,
        now: DateTime<Local>,
    ) -> Result<Profile> {
        if let Some(profile) = self.profile_store.get_profile(user_id).await? {
            return Ok(profile);
        }

        // New accounts start consolidated "now": the first weekly sweep can
        // run a week from signup, and negative-habit accrual has a baseline.
        let profile = Profile {
            id: user_id.to_string(),
            global_xp: 0,
            last_consolidated: now.to_rfc3339(),
        };
        self.profile_store.store_profile(&profile).await?;

        info!("Created profile for user: {}", user_id);

        Ok(profile)
    }

    /// Derived account-wide values for the rewards display
    pub fn rewards_summary(
        &self,
        profile: &Profile,
        habits: &[Habit],
        today: NaiveDate,
    ) -> RewardsSummary {
        let total_points =
            profile.global_xp + habits.iter().map(|habit| habit.points).sum::<i64>();

        RewardsSummary {
            total_points,
            current_level: leveling::level_for_points(total_points),
            progress_to_next_level: leveling::progress_to_next_level(total_points),
            points_to_next_level: leveling::points_to_next_level(total_points),
            completed_today: habits.iter().filter(|habit| habit.completed_on(today)).count()
                as u32,
            best_streak: habits.iter().map(|habit| habit.streak).max().unwrap_or(0),
            total_habits: habits.len() as u32,
        }
    }
}
