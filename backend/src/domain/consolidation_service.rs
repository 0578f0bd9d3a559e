//! XP consolidation service for the habit tracker.
//!
//! Transient per-habit points are periodically migrated into the profile's
//! permanent `global_xp` pool. Two triggers exist: a weekly sweep evaluated
//! on data load, and a deletion-time sweep gated by a 7-day grace period
//! (a habit deleted younger than that forfeits its points, so points cannot
//! be farmed through create/complete/delete cycles).
//!
//! The weekly sweep persists the profile before resetting habit points.
//! Advancing `last_consolidated` first is what guards against
//! double-crediting the same window if a habit reset fails midway: the next
//! sweep sees the timestamp already moved and skips re-crediting, even
//! though some habit points were never cleared.

use anyhow::Result;
use chrono::{DateTime, Local};
use log::{info, warn};
use std::sync::Arc;

use crate::domain::parse_timestamp;
use crate::storage::traits::{HabitStorage, ProfileStorage};
use shared::{Habit, Profile};

/// Days between weekly sweeps, and the deletion grace period
pub const CONSOLIDATION_INTERVAL_DAYS: i64 = 7;

/// Service responsible for migrating habit points into global XP
#[derive(Clone)]
pub struct ConsolidationService {
    habit_store: Arc<dyn HabitStorage>,
    profile_store: Arc<dyn ProfileStorage>,
}

impl ConsolidationService {
    /// Create a new ConsolidationService
    pub fn new(habit_store: Arc<dyn HabitStorage>, profile_store: Arc<dyn ProfileStorage>) -> Self {
        Self {
            habit_store,
            profile_store,
        }
    }

    /// Run the weekly sweep if it is due.
    ///
    /// Returns the credited amount when a sweep ran, None when nothing was
    /// due (too recent, no profile yet, or no habit holds points).
    pub async fn run_weekly_sweep(
        &self,
        user_id: &str,
        now: DateTime<Local>,
    ) -> Result<Option<i64>> {
        let profile = match self.profile_store.get_profile(user_id).await? {
            Some(profile) => profile,
            None => return Ok(None),
        };

        let last_consolidated = parse_timestamp(&profile.last_consolidated)?;
        let elapsed_days = now.signed_duration_since(last_consolidated).num_days();
        if elapsed_days < CONSOLIDATION_INTERVAL_DAYS {
            return Ok(None);
        }

        let habits = self.habit_store.list_habits(user_id).await?;
        let total: i64 = habits.iter().map(|habit| habit.points.max(0)).sum();
        if total <= 0 {
            info!(
                "Weekly sweep due for {} but no habit holds points; skipping",
                user_id
            );
            return Ok(None);
        }

        info!(
            "Running weekly consolidation for {}: {} points from {} habits ({} days since last)",
            user_id,
            total,
            habits.iter().filter(|habit| habit.points > 0).count(),
            elapsed_days
        );

        // Profile first; see the module docs for why this ordering matters.
        let mut updated = profile.clone();
        updated.global_xp += total;
        updated.last_consolidated = now.to_rfc3339();
        self.profile_store.update_profile(&updated).await?;

        for habit in habits.iter().filter(|habit| habit.points != 0) {
            let mut reset = habit.clone();
            reset.points = 0;
            if let Err(error) = self.habit_store.update_habit(user_id, &reset).await {
                warn!(
                    "Habit {} points were credited but not cleared: {}",
                    habit.id, error
                );
                return Err(error);
            }
        }

        info!(
            "Consolidated {} points into global XP for {} (now {})",
            total, user_id, updated.global_xp
        );

        Ok(Some(total))
    }

    /// Credit a habit's points to global XP ahead of deletion, if the habit
    /// has outlived the grace period. Returns the credited amount.
    pub async fn consolidate_before_delete(
        &self,
        user_id: &str,
        habit: &Habit,
        now: DateTime<Local>,
    ) -> Result<i64> {
        if habit.points <= 0 {
            return Ok(0);
        }

        let created_at = parse_timestamp(&habit.created_at)?;
        let age_days = now.signed_duration_since(created_at).num_days();
        if age_days < CONSOLIDATION_INTERVAL_DAYS {
            info!(
                "Habit {} is {} days old; {} points forfeited on deletion",
                habit.id, age_days, habit.points
            );
            return Ok(0);
        }

        match self.profile_store.get_profile(user_id).await? {
            Some(mut profile) => {
                profile.global_xp += habit.points;
                self.profile_store.update_profile(&profile).await?;
            }
            None => {
                let profile = Profile {
                    id: user_id.to_string(),
                    global_xp: habit.points,
                    last_consolidated: now.to_rfc3339(),
                };
                self.profile_store.store_profile(&profile).await?;
            }
        }

        info!(
            "Credited {} points from habit {} to global XP before deletion",
            habit.points, habit.id
        );

        Ok(habit.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::repositories::{HabitRepository, ProfileRepository};
    use crate::storage::DbConnection;
    use shared::{HabitType, TargetPeriod};

    fn habit_with_points(id: &str, points: i64, created_at: DateTime<Local>) -> Habit {
        Habit {
            id: id.to_string(),
            name: "Read".to_string(),
            icon: "📚".to_string(),
            habit_type: HabitType::Positive,
            target_period: TargetPeriod::Daily,
            target_count: 1,
            streak: 0,
            points,
            last_completed: None,
            completion_history: Vec::new(),
            created_at: created_at.to_rfc3339(),
            has_timer: false,
        }
    }

    async fn create_test_service() -> (ConsolidationService, Arc<HabitRepository>, Arc<ProfileRepository>)
    {
        let db = DbConnection::init_test().await.unwrap();
        let habit_repo = Arc::new(HabitRepository::new(db.clone()));
        let profile_repo = Arc::new(ProfileRepository::new(db));
        let service = ConsolidationService::new(habit_repo.clone(), profile_repo.clone());
        (service, habit_repo, profile_repo)
    }

    #[tokio::test]
    async fn test_weekly_sweep_credits_and_resets() {
        let (service, habits, profiles) = create_test_service().await;
        let now = Local::now();

        profiles
            .store_profile(&Profile {
                id: "user-1".to_string(),
                global_xp: 50,
                last_consolidated: (now - chrono::Duration::days(8)).to_rfc3339(),
            })
            .await
            .unwrap();
        habits
            .store_habit("user-1", &habit_with_points("habit::1", 30, now))
            .await
            .unwrap();

        let credited = service.run_weekly_sweep("user-1", now).await.unwrap();
        assert_eq!(credited, Some(30));

        let profile = profiles.get_profile("user-1").await.unwrap().unwrap();
        assert_eq!(profile.global_xp, 80);
        assert_eq!(
            parse_timestamp(&profile.last_consolidated).unwrap(),
            parse_timestamp(&now.to_rfc3339()).unwrap()
        );

        let habit = habits.get_habit("user-1", "habit::1").await.unwrap().unwrap();
        assert_eq!(habit.points, 0);
    }

    #[tokio::test]
    async fn test_weekly_sweep_not_due_yet() {
        let (service, habits, profiles) = create_test_service().await;
        let now = Local::now();

        profiles
            .store_profile(&Profile {
                id: "user-1".to_string(),
                global_xp: 50,
                last_consolidated: (now - chrono::Duration::days(6)).to_rfc3339(),
            })
            .await
            .unwrap();
        habits
            .store_habit("user-1", &habit_with_points("habit::1", 30, now))
            .await
            .unwrap();

        assert_eq!(service.run_weekly_sweep("user-1", now).await.unwrap(), None);

        let profile = profiles.get_profile("user-1").await.unwrap().unwrap();
        assert_eq!(profile.global_xp, 50);
        let habit = habits.get_habit("user-1", "habit::1").await.unwrap().unwrap();
        assert_eq!(habit.points, 30);
    }

    #[tokio::test]
    async fn test_weekly_sweep_skips_when_no_points() {
        let (service, habits, profiles) = create_test_service().await;
        let now = Local::now();
        let stale = (now - chrono::Duration::days(10)).to_rfc3339();

        profiles
            .store_profile(&Profile {
                id: "user-1".to_string(),
                global_xp: 50,
                last_consolidated: stale.clone(),
            })
            .await
            .unwrap();
        habits
            .store_habit("user-1", &habit_with_points("habit::1", 0, now))
            .await
            .unwrap();

        assert_eq!(service.run_weekly_sweep("user-1", now).await.unwrap(), None);

        // A skipped sweep leaves the window open rather than consuming it
        let profile = profiles.get_profile("user-1").await.unwrap().unwrap();
        assert_eq!(profile.last_consolidated, stale);
    }

    #[tokio::test]
    async fn test_delete_consolidation_after_grace_period() {
        let (service, _habits, profiles) = create_test_service().await;
        let now = Local::now();

        profiles
            .store_profile(&Profile {
                id: "user-1".to_string(),
                global_xp: 10,
                last_consolidated: now.to_rfc3339(),
            })
            .await
            .unwrap();

        let habit = habit_with_points("habit::1", 40, now - chrono::Duration::days(10));
        let credited = service
            .consolidate_before_delete("user-1", &habit, now)
            .await
            .unwrap();

        assert_eq!(credited, 40);
        let profile = profiles.get_profile("user-1").await.unwrap().unwrap();
        assert_eq!(profile.global_xp, 50);
    }

    #[tokio::test]
    async fn test_delete_consolidation_inside_grace_period() {
        let (service, _habits, profiles) = create_test_service().await;
        let now = Local::now();

        profiles
            .store_profile(&Profile {
                id: "user-1".to_string(),
                global_xp: 10,
                last_consolidated: now.to_rfc3339(),
            })
            .await
            .unwrap();

        let habit = habit_with_points("habit::1", 40, now - chrono::Duration::days(2));
        let credited = service
            .consolidate_before_delete("user-1", &habit, now)
            .await
            .unwrap();

        assert_eq!(credited, 0);
        let profile = profiles.get_profile("user-1").await.unwrap().unwrap();
        assert_eq!(profile.global_xp, 10);
    }

    #[tokio::test]
    async fn test_delete_consolidation_creates_missing_profile() {
        let (service, _habits, profiles) = create_test_service().await;
        let now = Local::now();

        let habit = habit_with_points("habit::1", 25, now - chrono::Duration::days(9));
        let credited = service
            .consolidate_before_delete("user-1", &habit, now)
            .await
            .unwrap();

        assert_eq!(credited, 25);
        let profile = profiles.get_profile("user-1").await.unwrap().unwrap();
        assert_eq!(profile.global_xp, 25);
    }
}
