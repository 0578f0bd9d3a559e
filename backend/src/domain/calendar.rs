//! Calendar domain logic for the habit tracker.
//!
//! This module contains the period-window computations: which completion
//! entries qualify for the current daily/weekly/monthly goal window, and
//! month-level statistics for the dashboard. All date comparisons are
//! calendar-day granular, local midnight to midnight; weeks start on the
//! most recent Sunday.

use chrono::{Datelike, NaiveDate};
use log::info;
use shared::{parse_day, Habit, HabitMonthlyStats, MonthlyStatsResponse, PeriodProgress, TargetPeriod};

/// Calendar service that handles all period-window business logic
#[derive(Clone)]
pub struct CalendarService;

impl CalendarService {
    /// Create a new CalendarService instance
    pub fn new() -> Self {
        Self
    }

    /// The Sunday that starts the week containing the given day
    pub fn week_start(&self, day: NaiveDate) -> NaiveDate {
        let days_from_sunday = day.weekday().num_days_from_sunday() as i64;
        day - chrono::Duration::days(days_from_sunday)
    }

    /// Count history entries that qualify for the habit's current period window
    pub fn completions_in_period(&self, habit: &Habit, today: NaiveDate) -> u32 {
        match habit.target_period {
            TargetPeriod::Daily => habit.completed_on(today) as u32,
            TargetPeriod::Weekly => {
                let start = self.week_start(today);
                habit
                    .completion_history
                    .iter()
                    .filter_map(|entry| parse_day(entry))
                    .filter(|day| *day >= start && *day <= today)
                    .count() as u32
            }
            TargetPeriod::Monthly => habit
                .completion_history
                .iter()
                .filter_map(|entry| parse_day(entry))
                .filter(|day| day.month() == today.month() && day.year() == today.year())
                .count() as u32,
        }
    }

    /// Progress toward the habit's goal in the current period window
    pub fn period_progress(&self, habit: &Habit, today: NaiveDate) -> PeriodProgress {
        let completed = self.completions_in_period(habit, today);
        PeriodProgress {
            completed,
            target: habit.target_count,
            met: completed >= habit.target_count,
        }
    }

    /// Get the number of days in a given month and year
    pub fn days_in_month(&self, month: u32, year: u32) -> u32 {
        match month {
            2 => {
                if self.is_leap_year(year) {
                    29
                } else {
                    28
                }
            }
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }

    /// Check if a year is a leap year
    pub fn is_leap_year(&self, year: u32) -> bool {
        year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
    }

    /// Month-level completion statistics across all habits
    pub fn monthly_stats(&self, habits: &[Habit], month: u32, year: u32) -> MonthlyStatsResponse {
        let days_in_month = self.days_in_month(month, year);

        let per_habit: Vec<HabitMonthlyStats> = habits
            .iter()
            .map(|habit| {
                let completions = habit
                    .completion_history
                    .iter()
                    .filter_map(|entry| parse_day(entry))
                    .filter(|day| day.month() == month && day.year() as u32 == year)
                    .count() as u32;

                HabitMonthlyStats {
                    habit_id: habit.id.clone(),
                    name: habit.name.clone(),
                    icon: habit.icon.clone(),
                    completions,
                    completion_rate: ((completions as f64 / days_in_month as f64) * 100.0).round()
                        as u32,
                }
            })
            .collect();

        let total_completions: u32 = per_habit.iter().map(|stats| stats.completions).sum();
        let possible_completions = habits.len() as u32 * days_in_month;
        let completion_rate = if possible_completions > 0 {
            ((total_completions as f64 / possible_completions as f64) * 100.0).round() as u32
        } else {
            0
        };

        // First habit with the highest completion count wins ties
        let most_consistent = per_habit
            .iter()
            .enumerate()
            .max_by_key(|(index, stats)| (stats.completions, std::cmp::Reverse(*index)))
            .map(|(_, stats)| stats.clone());

        info!(
            "Monthly stats for {}/{}: {} completions across {} habits ({}%)",
            month,
            year,
            total_completions,
            habits.len(),
            completion_rate
        );

        MonthlyStatsResponse {
            month,
            year,
            total_completions,
            possible_completions,
            completion_rate,
            most_consistent,
            habits: per_habit,
        }
    }
}
