//! # Habit Rabbit Backend
//!
//! Contains all non-UI logic for the habit tracker application.
//!
//! This module serves as the orchestration layer that brings together:
//! - **Domain**: The point/streak/leveling engine and its services
//! - **Storage**: Data persistence behind the storage traits
//!
//! The backend is UI-agnostic: it exposes services and notification events,
//! and leaves rendering, animation, and notification presentation to
//! whatever frontend embeds it.
//!
//! ## Architecture
//!
//! ```text
//! UI layer (out of scope here)
//!     |
//! AppState (habit / profile / consolidation / streak / calendar services)
//!     |
//! Domain layer (business logic)
//!     |
//! Storage layer (HabitStorage / ProfileStorage traits, SQLite repositories)
//! ```

pub mod domain;
pub mod storage;

use anyhow::Result;
use chrono::{DateTime, Local};
use log::{info, warn};
use std::sync::Arc;

use crate::domain::{
    CalendarService, ConsolidationService, HabitService, ProfileService, StreakService,
};
use crate::storage::{
    DbConnection, HabitRepository, HabitStorage, ProfileRepository, ProfileStorage,
};
use shared::{LoadDataResponse, NotificationEvent};

pub use domain::*;
pub use storage::*;

/// Main application state that holds all services.
///
/// Created on login, dropped on logout; every operation goes through an
/// explicit `AppState` rather than ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub habit_service: HabitService,
    pub profile_service: ProfileService,
    pub consolidation_service: ConsolidationService,
    pub streak_service: StreakService,
    pub calendar_service: CalendarService,
}

/// Initialize the backend with all required services
pub async fn initialize_backend() -> Result<AppState> {
    info!("Setting up database");
    let db = DbConnection::init().await?;

    Ok(AppState::with_connection(db))
}

impl AppState {
    /// Wire all services onto a database connection
    pub fn with_connection(db: DbConnection) -> Self {
        info!("Setting up domain model");
        let habit_store: Arc<dyn HabitStorage> = Arc::new(HabitRepository::new(db.clone()));
        let profile_store: Arc<dyn ProfileStorage> = Arc::new(ProfileRepository::new(db));

        AppState {
            habit_service: HabitService::new(habit_store.clone(), profile_store.clone()),
            profile_service: ProfileService::new(profile_store.clone()),
            consolidation_service: ConsolidationService::new(
                habit_store.clone(),
                profile_store,
            ),
            streak_service: StreakService::new(habit_store),
            calendar_service: CalendarService::new(),
        }
    }

    /// Load a user's data: lazily create the profile, run the weekly
    /// consolidation sweep, synchronize negative-habit streaks, and return
    /// the habits in creation order
    pub async fn load_user_data(&self, user_id: &str) -> Result<LoadDataResponse> {
        self.load_user_data_at(user_id, Local::now()).await
    }

    /// Load a user's data as of a specific instant
    pub async fn load_user_data_at(
        &self,
        user_id: &str,
        now: DateTime<Local>,
    ) -> Result<LoadDataResponse> {
        info!("Loading data for user: {}", user_id);

        self.profile_service.get_or_create_at(user_id, now).await?;

        let mut notifications = Vec::new();
        match self.consolidation_service.run_weekly_sweep(user_id, now).await {
            Ok(Some(amount)) => {
                notifications.push(NotificationEvent::ConsolidationOccurred { amount })
            }
            Ok(None) => {}
            // The load still serves data; an interrupted sweep is skipped on
            // the next pass because last_consolidated already advanced.
            Err(error) => warn!("Weekly consolidation failed for {}: {}", user_id, error),
        }

        // Re-read the profile: the sweep may have advanced it
        let profile = self.profile_service.get_or_create_at(user_id, now).await?;

        self.streak_service.synchronize(user_id, &profile, now).await?;

        let habits = self.habit_service.list_habits(user_id).await?.habits;

        Ok(LoadDataResponse {
            profile,
            habits,
            notifications,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use shared::{Habit, HabitType, Profile, TargetPeriod};

    async fn create_test_state() -> (AppState, Arc<HabitRepository>, Arc<ProfileRepository>) {
        let db = DbConnection::init_test().await.unwrap();
        let habits = Arc::new(HabitRepository::new(db.clone()));
        let profiles = Arc::new(ProfileRepository::new(db.clone()));
        (AppState::with_connection(db), habits, profiles)
    }

    fn seeded_habit(id: &str, habit_type: HabitType, points: i64, created_at: String) -> Habit {
        Habit {
            id: id.to_string(),
            name: "Read".to_string(),
            icon: "📚".to_string(),
            habit_type,
            target_period: TargetPeriod::Daily,
            target_count: 1,
            streak: 0,
            points,
            last_completed: None,
            completion_history: Vec::new(),
            created_at,
            has_timer: false,
        }
    }

    #[tokio::test]
    async fn test_load_creates_profile_lazily() {
        let (state, _habits, _profiles) = create_test_state().await;

        let response = state.load_user_data("user-1").await.unwrap();
        assert_eq!(response.profile.id, "user-1");
        assert_eq!(response.profile.global_xp, 0);
        assert!(response.habits.is_empty());
        assert!(response.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_load_runs_weekly_consolidation() {
        let (state, habits, profiles) = create_test_state().await;
        let now = Local::now();

        profiles
            .store_profile(&Profile {
                id: "user-1".to_string(),
                global_xp: 50,
                last_consolidated: (now - Duration::days(8)).to_rfc3339(),
            })
            .await
            .unwrap();
        habits
            .store_habit(
                "user-1",
                &seeded_habit("habit::1", HabitType::Positive, 30, now.to_rfc3339()),
            )
            .await
            .unwrap();

        let response = state.load_user_data_at("user-1", now).await.unwrap();

        assert_eq!(response.profile.global_xp, 80);
        assert_eq!(response.profile.last_consolidated, now.to_rfc3339());
        assert_eq!(response.habits.len(), 1);
        assert_eq!(response.habits[0].points, 0);
        assert!(response
            .notifications
            .contains(&NotificationEvent::ConsolidationOccurred { amount: 30 }));
    }

    #[tokio::test]
    async fn test_load_synchronizes_negative_habits() {
        let (state, habits, profiles) = create_test_state().await;
        let now = Local::now();
        let ten_days_ago = now - Duration::days(10);

        profiles
            .store_profile(&Profile {
                id: "user-1".to_string(),
                global_xp: 0,
                last_consolidated: ten_days_ago.to_rfc3339(),
            })
            .await
            .unwrap();
        habits
            .store_habit(
                "user-1",
                &seeded_habit(
                    "habit::1",
                    HabitType::Negative,
                    0,
                    ten_days_ago.to_rfc3339(),
                ),
            )
            .await
            .unwrap();

        let response = state.load_user_data_at("user-1", now).await.unwrap();

        assert_eq!(response.habits[0].streak, 10);
        assert_eq!(response.habits[0].points, 100);
    }

    #[tokio::test]
    async fn test_delete_habit_grace_period_rules() {
        let (state, habits, profiles) = create_test_state().await;
        let now = Local::now();

        profiles
            .store_profile(&Profile {
                id: "user-1".to_string(),
                global_xp: 0,
                last_consolidated: now.to_rfc3339(),
            })
            .await
            .unwrap();

        // Old enough: points are consolidated before the delete
        habits
            .store_habit(
                "user-1",
                &seeded_habit(
                    "habit::1",
                    HabitType::Positive,
                    40,
                    (now - Duration::days(10)).to_rfc3339(),
                ),
            )
            .await
            .unwrap();

        let response = state
            .habit_service
            .delete_habit_at("user-1", "habit::1", now)
            .await
            .unwrap();
        assert_eq!(response.points_credited, 40);
        assert!(response
            .notifications
            .contains(&NotificationEvent::ConsolidationOccurred { amount: 40 }));
        assert_eq!(
            profiles.get_profile("user-1").await.unwrap().unwrap().global_xp,
            40
        );
        assert!(habits.get_habit("user-1", "habit::1").await.unwrap().is_none());

        // Too young: points are forfeited
        habits
            .store_habit(
                "user-1",
                &seeded_habit(
                    "habit::2",
                    HabitType::Positive,
                    40,
                    (now - Duration::days(2)).to_rfc3339(),
                ),
            )
            .await
            .unwrap();

        let response = state
            .habit_service
            .delete_habit_at("user-1", "habit::2", now)
            .await
            .unwrap();
        assert_eq!(response.points_credited, 0);
        assert!(response.notifications.is_empty());
        assert_eq!(
            profiles.get_profile("user-1").await.unwrap().unwrap().global_xp,
            40
        );
    }
}
