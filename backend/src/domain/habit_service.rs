//! Habit management service: creation, deletion, and the completion/relapse
//! state machine behind the daily toggle.
//!
//! The transition rules live in [`apply_toggle`], a pure function over the
//! habit and "today"; the service fetches, applies, persists on confirmed
//! success only, and assembles the notification events the presentation
//! layer reacts to.

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};
use log::{info, warn};
use std::sync::Arc;

use crate::domain::calendar::CalendarService;
use crate::domain::consolidation_service::ConsolidationService;
use crate::domain::leveling;
use crate::storage::traits::{HabitStorage, ProfileStorage};
use shared::{
    format_day, CreateHabitRequest, DeleteHabitResponse, Habit, HabitListResponse, HabitResponse,
    HabitType, NotificationEvent, TargetPeriod, TimerSessionResponse, ToggleHabitResponse,
};

/// Points awarded for completing a positive habit (and per focus session)
pub const COMPLETION_POINTS: i64 = 10;
/// Points deducted for reporting a relapse on a negative habit
pub const RELAPSE_PENALTY: i64 = 20;

/// What a toggle did, derived from habit type and today's state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    /// Positive habit completed for today
    Completed,
    /// Today's completion taken back
    Undone,
    /// Relapse recorded for today on a negative habit
    RelapseReported,
    /// Today's relapse taken back
    RelapseUndone,
}

/// Result of applying the toggle transition, before persistence
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleOutcome {
    pub habit: Habit,
    pub action: ToggleAction,
    /// Actual point change after flooring at zero
    pub points_delta: i64,
}

/// Apply the toggle transition for "today" to a habit.
///
/// Completion state is derived, not stored: a habit counts as
/// completed/relapsed today iff `last_completed` equals today. The history
/// never holds the same day twice; undo removes exactly today's entry and
/// recomputes `last_completed` from the new history tail.
pub fn apply_toggle(habit: &Habit, today: NaiveDate) -> ToggleOutcome {
    let today_str = format_day(today);
    let toggled_today = habit.completed_on(today);
    let mut next = habit.clone();

    match (habit.habit_type, toggled_today) {
        (HabitType::Positive, false) => {
            // COMPLETE
            let yesterday = today.pred_opt().map(format_day);
            let was_completed_yesterday =
                habit.last_completed.is_some() && habit.last_completed == yesterday;

            if !next.completion_history.contains(&today_str) {
                next.completion_history.push(today_str.clone());
            }
            next.last_completed = Some(today_str);
            next.points += COMPLETION_POINTS;

            // Streaks only advance per-day; multi-completion targets leave
            // the streak untouched.
            if habit.target_count == 1 {
                next.streak = if was_completed_yesterday {
                    habit.streak + 1
                } else {
                    1
                };
            }

            ToggleOutcome {
                habit: next,
                action: ToggleAction::Completed,
                points_delta: COMPLETION_POINTS,
            }
        }
        (HabitType::Positive, true) => {
            // UNDO
            next.completion_history.retain(|entry| entry != &today_str);
            let new_points = (habit.points - COMPLETION_POINTS).max(0);
            let points_delta = new_points - habit.points;
            next.points = new_points;

            if habit.target_count == 1 {
                next.streak = habit.streak.saturating_sub(1);
            }
            next.last_completed = next.completion_history.last().cloned();

            ToggleOutcome {
                habit: next,
                action: ToggleAction::Undone,
                points_delta,
            }
        }
        (HabitType::Negative, false) => {
            // REPORT RELAPSE
            if !next.completion_history.contains(&today_str) {
                next.completion_history.push(today_str.clone());
            }
            next.last_completed = Some(today_str);
            next.streak = 0;
            let new_points = (habit.points - RELAPSE_PENALTY).max(0);
            let points_delta = new_points - habit.points;
            next.points = new_points;

            ToggleOutcome {
                habit: next,
                action: ToggleAction::RelapseReported,
                points_delta,
            }
        }
        (HabitType::Negative, true) => {
            // UNDO RELAPSE
            next.completion_history.retain(|entry| entry != &today_str);
            next.points = habit.points + RELAPSE_PENALTY;
            next.last_completed = next.completion_history.last().cloned();
            // The streak is not restored here; the synchronizer recomputes
            // it from the remaining relapse history on the next load.

            ToggleOutcome {
                habit: next,
                action: ToggleAction::RelapseUndone,
                points_delta: RELAPSE_PENALTY,
            }
        }
    }
}

/// Service for managing habits in the habit tracking system
#[derive(Clone)]
pub struct HabitService {
    habit_store: Arc<dyn HabitStorage>,
    profile_store: Arc<dyn ProfileStorage>,
    calendar_service: CalendarService,
    consolidation_service: ConsolidationService,
}

impl HabitService {
    /// Create a new HabitService
    pub fn new(habit_store: Arc<dyn HabitStorage>, profile_store: Arc<dyn ProfileStorage>) -> Self {
        let consolidation_service =
            ConsolidationService::new(habit_store.clone(), profile_store.clone());
        Self {
            habit_store,
            profile_store,
            calendar_service: CalendarService::new(),
            consolidation_service,
        }
    }

    /// Create a new habit
    pub async fn create_habit(
        &self,
        user_id: &str,
        request: CreateHabitRequest,
    ) -> Result<HabitResponse> {
        info!(
            "Creating habit: name={}, type={}, period={}",
            request.name,
            request.habit_type.as_str(),
            request.target_period.as_str()
        );

        self.validate_create_request(&request)?;

        let now = Local::now();
        let timestamp_millis = now.timestamp_millis() as u64;

        // Daily goals are always a single completion per day
        let target_count = match request.target_period {
            TargetPeriod::Daily => 1,
            _ => request.target_count,
        };

        let habit = Habit {
            id: Habit::generate_id(timestamp_millis),
            name: request.name.trim().to_string(),
            icon: request.icon,
            habit_type: request.habit_type,
            target_period: request.target_period,
            target_count,
            streak: 0,
            points: 0,
            last_completed: None,
            completion_history: Vec::new(),
            created_at: now.to_rfc3339(),
            has_timer: request.has_timer,
        };

        self.habit_store.store_habit(user_id, &habit).await?;

        info!("Created habit: {} with ID: {}", habit.name, habit.id);

        Ok(HabitResponse {
            habit,
            success_message: "Habit created successfully".to_string(),
        })
    }

    /// List all of a user's habits in creation order
    pub async fn list_habits(&self, user_id: &str) -> Result<HabitListResponse> {
        let habits = self.habit_store.list_habits(user_id).await?;

        info!("Found {} habits for user {}", habits.len(), user_id);

        Ok(HabitListResponse { habits })
    }

    /// Toggle a habit for today: complete/undo a positive habit, or
    /// report/undo a relapse on a negative one
    pub async fn toggle_habit(&self, user_id: &str, habit_id: &str) -> Result<ToggleHabitResponse> {
        self.toggle_habit_at(user_id, habit_id, Local::now()).await
    }

    /// Toggle a habit as of a specific instant
    pub async fn toggle_habit_at(
        &self,
        user_id: &str,
        habit_id: &str,
        now: DateTime<Local>,
    ) -> Result<ToggleHabitResponse> {
        let today = now.date_naive();

        let habit = self
            .habit_store
            .get_habit(user_id, habit_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Habit not found: {}", habit_id))?;

        let total_before = self.total_points(user_id).await?;
        let outcome = apply_toggle(&habit, today);

        // Persist before surfacing any new state; a failed write must leave
        // the caller's view untouched.
        self.habit_store.update_habit(user_id, &outcome.habit).await?;

        info!(
            "Toggled habit {}: {:?}, points {} -> {}, streak {} -> {}",
            habit_id,
            outcome.action,
            habit.points,
            outcome.habit.points,
            habit.streak,
            outcome.habit.streak
        );

        let notifications =
            self.collect_toggle_notifications(&outcome, total_before, today);

        Ok(ToggleHabitResponse {
            habit: outcome.habit,
            notifications,
        })
    }

    /// Delete a habit, consolidating its points first when the habit has
    /// outlived the 7-day grace period
    pub async fn delete_habit(&self, user_id: &str, habit_id: &str) -> Result<DeleteHabitResponse> {
        self.delete_habit_at(user_id, habit_id, Local::now()).await
    }

    /// Delete a habit as of a specific instant
    pub async fn delete_habit_at(
        &self,
        user_id: &str,
        habit_id: &str,
        now: DateTime<Local>,
    ) -> Result<DeleteHabitResponse> {
        let habit = self
            .habit_store
            .get_habit(user_id, habit_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Habit not found: {}", habit_id))?;

        let points_credited = self
            .consolidation_service
            .consolidate_before_delete(user_id, &habit, now)
            .await?;

        let deleted = self.habit_store.delete_habit(user_id, habit_id).await?;
        if !deleted {
            warn!("Habit {} disappeared before deletion", habit_id);
        }

        info!(
            "Deleted habit: {} with ID: {} ({} points credited)",
            habit.name, habit.id, points_credited
        );

        let mut notifications = Vec::new();
        if points_credited > 0 {
            notifications.push(NotificationEvent::ConsolidationOccurred {
                amount: points_credited,
            });
        }

        Ok(DeleteHabitResponse {
            habit_id: habit_id.to_string(),
            points_credited,
            notifications,
            success_message: "Habit deleted successfully".to_string(),
        })
    }

    /// Award XP for a completed focus-timer session. The timer's tick loop
    /// lives in the client; this is the one point where it touches the core.
    pub async fn complete_timer_session(
        &self,
        user_id: &str,
        habit_id: &str,
    ) -> Result<TimerSessionResponse> {
        let habit = self
            .habit_store
            .get_habit(user_id, habit_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Habit not found: {}", habit_id))?;

        if habit.habit_type != HabitType::Positive || !habit.has_timer {
            return Err(anyhow::anyhow!(
                "Focus timer is only available for positive habits with the timer enabled"
            ));
        }

        let total_before = self.total_points(user_id).await?;

        let mut updated = habit.clone();
        updated.points += COMPLETION_POINTS;
        self.habit_store.update_habit(user_id, &updated).await?;

        info!(
            "Focus session completed for {}: +{} points",
            habit_id, COMPLETION_POINTS
        );

        let mut notifications = vec![NotificationEvent::XpAwarded {
            amount: COMPLETION_POINTS,
        }];
        if let Some(new_level) = level_up(total_before, COMPLETION_POINTS) {
            notifications.push(NotificationEvent::LevelUp { new_level });
        }

        Ok(TimerSessionResponse {
            habit: updated,
            notifications,
        })
    }

    /// Sum of global XP and every habit's transient points
    async fn total_points(&self, user_id: &str) -> Result<i64> {
        let global_xp = self
            .profile_store
            .get_profile(user_id)
            .await?
            .map(|profile| profile.global_xp)
            .unwrap_or(0);
        let habits = self.habit_store.list_habits(user_id).await?;
        Ok(global_xp + habits.iter().map(|habit| habit.points).sum::<i64>())
    }

    fn collect_toggle_notifications(
        &self,
        outcome: &ToggleOutcome,
        total_before: i64,
        today: NaiveDate,
    ) -> Vec<NotificationEvent> {
        let mut notifications = Vec::new();

        match outcome.action {
            ToggleAction::Completed => {
                notifications.push(NotificationEvent::XpAwarded {
                    amount: outcome.points_delta,
                });
                let progress = self.calendar_service.period_progress(&outcome.habit, today);
                if progress.met {
                    notifications.push(NotificationEvent::TargetMet {
                        habit_id: outcome.habit.id.clone(),
                    });
                }
            }
            ToggleAction::RelapseReported => {
                notifications.push(NotificationEvent::RelapseReported {
                    habit_id: outcome.habit.id.clone(),
                });
            }
            ToggleAction::RelapseUndone => {
                notifications.push(NotificationEvent::XpAwarded {
                    amount: outcome.points_delta,
                });
            }
            ToggleAction::Undone => {}
        }

        if outcome.points_delta > 0 {
            if let Some(new_level) = level_up(total_before, outcome.points_delta) {
                notifications.push(NotificationEvent::LevelUp { new_level });
            }
        }

        notifications
    }

    /// Validate create habit request
    fn validate_create_request(&self, request: &CreateHabitRequest) -> Result<()> {
        if request.name.trim().is_empty() {
            return Err(anyhow::anyhow!("Habit name cannot be empty"));
        }

        if request.name.len() > 100 {
            return Err(anyhow::anyhow!("Habit name cannot exceed 100 characters"));
        }

        if request.target_period != TargetPeriod::Daily && request.target_count == 0 {
            return Err(anyhow::anyhow!("Target count must be at least 1"));
        }

        if request.has_timer && request.habit_type == HabitType::Negative {
            return Err(anyhow::anyhow!(
                "Focus timer is only available for positive habits"
            ));
        }

        Ok(())
    }
}

/// The level reached after gaining `delta` points on top of `total_before`,
/// if that gain crossed a threshold
fn level_up(total_before: i64, delta: i64) -> Option<u32> {
    let before = leveling::level_for_points(total_before);
    let after = leveling::level_for_points(total_before + delta);
    (after > before).then_some(after)
}
