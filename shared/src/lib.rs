use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar-day format used everywhere a habit records a day: "YYYY-MM-DD"
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Format a calendar day as the canonical "YYYY-MM-DD" string
pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// Parse a canonical "YYYY-MM-DD" string back into a calendar day
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DAY_FORMAT).ok()
}

/// Habit ID in format: "habit::<epoch_millis>"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    /// Display name (max 100 characters)
    pub name: String,
    /// Display icon (emoji or short label)
    pub icon: String,
    /// Whether this habit is being built up or broken
    pub habit_type: HabitType,
    /// Recurrence window for the habit's goal
    pub target_period: TargetPeriod,
    /// Qualifying completions required within one target period (always 1 for daily)
    pub target_count: u32,
    /// Consecutive qualifying days (build-completion or break-abstinence)
    pub streak: u32,
    /// Transient points, swept into the profile's global XP on consolidation
    pub points: i64,
    /// Most recent day a completion/relapse was recorded ("YYYY-MM-DD")
    pub last_completed: Option<String>,
    /// Chronological days with a recorded completion/relapse, no duplicates
    pub completion_history: Vec<String>,
    /// Creation timestamp (RFC 3339); drives the 7-day grace-period rule
    pub created_at: String,
    /// Enables the focus-timer feature (positive habits only)
    pub has_timer: bool,
}

/// Whether a habit is a behavior to build or to break
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HabitType {
    /// "Build this" - completions are rewarded
    Positive,
    /// "Stop doing this" - relapses are penalized, clean days accrue
    Negative,
}

impl HabitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HabitType::Positive => "positive",
            HabitType::Negative => "negative",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "positive" => Some(HabitType::Positive),
            "negative" => Some(HabitType::Negative),
            _ => None,
        }
    }
}

/// Recurrence window for a habit's goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl TargetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetPeriod::Daily => "daily",
            TargetPeriod::Weekly => "weekly",
            TargetPeriod::Monthly => "monthly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(TargetPeriod::Daily),
            "weekly" => Some(TargetPeriod::Weekly),
            "monthly" => Some(TargetPeriod::Monthly),
            _ => None,
        }
    }
}

impl Habit {
    /// Generate a habit ID from a creation timestamp
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("habit::{}", epoch_millis)
    }

    /// Parse a habit ID to extract the creation timestamp
    pub fn parse_id(id: &str) -> Result<u64, HabitIdError> {
        let parts: Vec<&str> = id.split("::").collect();
        if parts.len() != 2 || parts[0] != "habit" {
            return Err(HabitIdError::InvalidFormat);
        }

        parts[1]
            .parse::<u64>()
            .map_err(|_| HabitIdError::InvalidTimestamp)
    }

    /// Whether a completion/relapse was recorded on the given day
    pub fn completed_on(&self, day: NaiveDate) -> bool {
        self.last_completed.as_deref() == Some(format_day(day).as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HabitIdError {
    InvalidFormat,
    InvalidTimestamp,
}

impl fmt::Display for HabitIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HabitIdError::InvalidFormat => write!(f, "Invalid habit ID format"),
            HabitIdError::InvalidTimestamp => write!(f, "Invalid timestamp in habit ID"),
        }
    }
}

/// Per-user account record holding the permanent experience pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Equals the user identifier
    pub id: String,
    /// Permanent, consolidation-immune point pool
    pub global_xp: i64,
    /// Timestamp of the most recent weekly consolidation (RFC 3339)
    pub last_consolidated: String,
}

/// Request to create a new habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateHabitRequest {
    pub name: String,
    pub icon: String,
    pub habit_type: HabitType,
    pub target_period: TargetPeriod,
    /// Ignored for daily habits, which always use a target of 1
    pub target_count: u32,
    pub has_timer: bool,
}

/// Response containing a single habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitResponse {
    pub habit: Habit,
    pub success_message: String,
}

/// Response containing all of a user's habits in creation order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitListResponse {
    pub habits: Vec<Habit>,
}

/// Notification events surfaced to the presentation layer.
/// Dispatch (toasts, confetti, sounds) is the caller's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NotificationEvent {
    /// The habit's period goal was reached by this completion
    TargetMet { habit_id: String },
    /// The account's total points crossed a level threshold upward
    LevelUp { new_level: u32 },
    /// A relapse was recorded for a negative habit
    RelapseReported { habit_id: String },
    /// Transient points were migrated into the permanent pool
    ConsolidationOccurred { amount: i64 },
    /// Points were awarded to a habit
    XpAwarded { amount: i64 },
}

/// Response after toggling a habit for today
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleHabitResponse {
    pub habit: Habit,
    pub notifications: Vec<NotificationEvent>,
}

/// Response after a completed focus-timer session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSessionResponse {
    pub habit: Habit,
    pub notifications: Vec<NotificationEvent>,
}

/// Response after deleting a habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteHabitResponse {
    pub habit_id: String,
    /// Points migrated into global XP before deletion (0 inside the grace period)
    pub points_credited: i64,
    pub notifications: Vec<NotificationEvent>,
    pub success_message: String,
}

/// Response for the data-load path: profile and habits after the weekly
/// consolidation sweep and negative-habit synchronization have run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadDataResponse {
    pub profile: Profile,
    pub habits: Vec<Habit>,
    pub notifications: Vec<NotificationEvent>,
}

/// Progress toward a habit's goal within the current period window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodProgress {
    pub completed: u32,
    pub target: u32,
    pub met: bool,
}

/// Derived account-wide reward values for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardsSummary {
    /// Global XP plus every habit's transient points
    pub total_points: i64,
    pub current_level: u32,
    /// Fraction of the way from the current level to the next, in [0, 1)
    pub progress_to_next_level: f64,
    pub points_to_next_level: i64,
    /// Habits completed/relapsed today
    pub completed_today: u32,
    pub best_streak: u32,
    pub total_habits: u32,
}

/// Per-habit completion statistics for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitMonthlyStats {
    pub habit_id: String,
    pub name: String,
    pub icon: String,
    pub completions: u32,
    /// Percent of the month's days with a completion, rounded
    pub completion_rate: u32,
}

/// Month-level statistics across all habits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStatsResponse {
    pub month: u32,
    pub year: u32,
    pub total_completions: u32,
    /// habits x days in the month
    pub possible_completions: u32,
    /// Percent of possible completions achieved, rounded
    pub completion_rate: u32,
    /// Habit with the most completions this month; None when the user has no habits
    pub most_consistent: Option<HabitMonthlyStats>,
    pub habits: Vec<HabitMonthlyStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_habit_id() {
        let id = Habit::generate_id(1702516122000);
        assert_eq!(id, "habit::1702516122000");
    }

    #[test]
    fn test_parse_habit_id() {
        let timestamp = Habit::parse_id("habit::1702516122000").unwrap();
        assert_eq!(timestamp, 1702516122000);

        assert_eq!(
            Habit::parse_id("child::1702516122000"),
            Err(HabitIdError::InvalidFormat)
        );
        assert_eq!(
            Habit::parse_id("habit::not-a-number"),
            Err(HabitIdError::InvalidTimestamp)
        );
        assert_eq!(Habit::parse_id("habit"), Err(HabitIdError::InvalidFormat));
    }

    #[test]
    fn test_day_round_trip() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 19).unwrap();
        let formatted = format_day(day);
        assert_eq!(formatted, "2025-06-19");
        assert_eq!(parse_day(&formatted), Some(day));
        assert_eq!(parse_day("June 19, 2025"), None);
    }

    #[test]
    fn test_enum_string_round_trip() {
        assert_eq!(HabitType::from_str("positive"), Some(HabitType::Positive));
        assert_eq!(HabitType::from_str("negative"), Some(HabitType::Negative));
        assert_eq!(HabitType::from_str("neutral"), None);
        assert_eq!(HabitType::Negative.as_str(), "negative");

        for period in [
            TargetPeriod::Daily,
            TargetPeriod::Weekly,
            TargetPeriod::Monthly,
        ] {
            assert_eq!(TargetPeriod::from_str(period.as_str()), Some(period));
        }
        assert_eq!(TargetPeriod::from_str("yearly"), None);
    }

    #[test]
    fn test_completed_on() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 19).unwrap();
        let habit = Habit {
            id: Habit::generate_id(1702516122000),
            name: "Read".to_string(),
            icon: "📚".to_string(),
            habit_type: HabitType::Positive,
            target_period: TargetPeriod::Daily,
            target_count: 1,
            streak: 0,
            points: 0,
            last_completed: Some("2025-06-19".to_string()),
            completion_history: vec!["2025-06-19".to_string()],
            created_at: "2025-06-01T08:00:00+00:00".to_string(),
            has_timer: false,
        };

        assert!(habit.completed_on(day));
        assert!(!habit.completed_on(day.succ_opt().unwrap()));
    }
}
