//! # Domain Module
//!
//! Contains all business logic for the habit tracker.
//!
//! This module encapsulates the core rules that decide, for a single user
//! action, how streak counters, point totals, and period-based target
//! progress change. It operates independently of any specific UI framework
//! or storage mechanism.
//!
//! ## Module Organization
//!
//! - **leveling**: Geometric XP curve mapping point totals to levels
//! - **habit_service**: Habit CRUD plus the completion/relapse state machine
//! - **calendar**: Period target windows and monthly statistics
//! - **consolidation_service**: Weekly and deletion-time XP consolidation
//! - **streak_service**: Elapsed-time streak/point sync for negative habits
//! - **profile_service**: Profile lifecycle and derived reward values
//!
//! ## Core Concepts
//!
//! - **Habit points**: transient, habit-local, swept into the profile
//! - **Global XP**: the permanent, consolidation-immune pool
//! - **Streak**: consecutive completed days (positive) or clean days (negative)
//! - **Target**: required completions within a daily/weekly/monthly window
//!
//! All "today" decisions are calendar-day granular in local time; public
//! service methods capture the clock once and delegate to `*_at` variants
//! that tests drive with fixed instants.

pub mod calendar;
pub mod consolidation_service;
pub mod habit_service;
pub mod leveling;
pub mod profile_service;
pub mod streak_service;

pub use calendar::*;
pub use consolidation_service::*;
pub use habit_service::*;
pub use profile_service::*;
pub use streak_service::*;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

/// Parse an RFC 3339 timestamp into local time
pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Local>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid timestamp: {}", value))?
        .with_timezone(&Local))
}
