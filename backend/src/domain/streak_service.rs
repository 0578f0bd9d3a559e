//! Clean-streak synchronization for negative habits.
//!
//! Clean streaks advance with elapsed wall-clock time, not with toggles:
//! staying clean requires no daily action. On each data load this service
//! recomputes every negative habit's streak and points from the time since
//! the last relapse, reconciled against the profile's last consolidation
//! (points accrued before a consolidation already live in global XP).

use anyhow::Result;
use chrono::{DateTime, Local};
use log::info;
use std::sync::Arc;

use crate::domain::parse_timestamp;
use crate::storage::traits::HabitStorage;
use shared::{parse_day, Habit, HabitType, Profile};

/// Points accrued per clean day on a negative habit
pub const CLEAN_DAY_POINTS: i64 = 10;

/// Recompute a negative habit's streak and points from elapsed time.
///
/// The streak counts whole days since the last relapse (the creation day
/// when none was ever recorded), zeroed if a relapse was recorded today.
/// Points accrue per whole day since the later of the last relapse and the
/// last consolidation.
pub fn recompute_clean_streak(
    habit: &Habit,
    last_consolidated: DateTime<Local>,
    now: DateTime<Local>,
) -> Result<(u32, i64)> {
    let today = now.date_naive();

    let last_relapse = match habit.last_completed.as_deref() {
        Some(entry) => {
            parse_day(entry).ok_or_else(|| anyhow::anyhow!("Invalid relapse day: {}", entry))?
        }
        None => parse_timestamp(&habit.created_at)?.date_naive(),
    };

    let days_clean = (today - last_relapse).num_days().max(0);
    let streak = if habit.completed_on(today) {
        0
    } else {
        days_clean as u32
    };

    // The accrual baseline is the later of the last relapse and the last
    // consolidation, so already-consolidated clean days are not re-awarded.
    let days_since_consolidation = now.signed_duration_since(last_consolidated).num_days();
    let accrual_days = days_clean.min(days_since_consolidation).max(0);
    let points = accrual_days * CLEAN_DAY_POINTS;

    Ok((streak, points))
}

/// Service that keeps negative-habit streaks in step with the clock
#[derive(Clone)]
pub struct StreakService {
    habit_store: Arc<dyn HabitStorage>,
}

impl StreakService {
    /// Create a new StreakService
    pub fn new(habit_store: Arc<dyn HabitStorage>) -> Self {
        Self { habit_store }
    }

    /// Recompute all of a user's negative habits, persisting only those
    /// whose stored values differ. Returns the habits that changed.
    pub async fn synchronize(
        &self,
        user_id: &str,
        profile: &Profile,
        now: DateTime<Local>,
    ) -> Result<Vec<Habit>> {
        let last_consolidated = parse_timestamp(&profile.last_consolidated)?;
        let habits = self.habit_store.list_habits(user_id).await?;

        let mut changed = Vec::new();
        for habit in habits {
            if habit.habit_type != HabitType::Negative {
                continue;
            }

            let (streak, points) = recompute_clean_streak(&habit, last_consolidated, now)?;
            if streak == habit.streak && points == habit.points {
                continue;
            }

            let mut next = habit.clone();
            next.streak = streak;
            next.points = points;
            self.habit_store.update_habit(user_id, &next).await?;
            changed.push(next);
        }

        if !changed.is_empty() {
            info!(
                "Synchronized {} negative habit(s) for {}",
                changed.len(),
                user_id
            );
        }

        Ok(changed)
    }
}
