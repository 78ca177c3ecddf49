use std::collections::BTreeMap;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Serialize;

use crate::error::{CheckinError, Result};
use crate::models::{Workout, WorkoutType};

/// how far back the feeling insight looks
pub const INSIGHT_WINDOW_DAYS: i64 = 14;
/// fewer workouts than this in the window gives no insight
pub const INSIGHT_MIN_WORKOUTS: usize = 3;

/// one row of the per-day aggregate query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub workout_count: u32,
    pub total_duration: u32,
    pub avg_feeling: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekStats {
    pub count: u32,
    pub total_duration: u32,
    pub avg_duration: u32,
    pub avg_feeling: f64,
    pub types: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayStatus {
    pub date: NaiveDate,
    pub day_name: String,
    pub completed: bool,
    pub is_today: bool,
    pub is_future: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyReport {
    pub this_week: WeekStats,
    pub last_week: WeekStats,
    pub comparison: String,
    pub days: Vec<DayStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthSummary {
    pub total_workouts: u32,
    pub total_duration: u32,
    pub workout_days: u32,
    pub avg_feeling: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    pub month: String,
    pub calendar: Vec<DailyTotal>,
    pub summary: MonthSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub this_week_duration: u32,
    pub last_week_duration: u32,
    pub percentage_change: i64,
    pub message: String,
    pub insight: Option<String>,
}

/// half away from zero, one decimal
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Monday..=Sunday containing `day`
pub fn week_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = day - Duration::days(i64::from(day.weekday().num_days_from_monday()));
    (start, start + Duration::days(6))
}

pub fn last_week_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    week_bounds(today - Duration::days(7))
}

/// first day of a `YYYY-MM` month
pub fn parse_month(month: &str) -> Result<NaiveDate> {
    let trimmed = month.trim();
    let well_formed = trimmed.len() == 7 && trimmed.as_bytes()[4] == b'-';
    if !well_formed {
        return Err(CheckinError::InvalidMonth(month.to_string()));
    }
    NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d")
        .map_err(|_| CheckinError::InvalidMonth(month.to_string()))
}

/// first..=last day of the month containing `day`
pub fn month_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = day.with_day(1).unwrap_or(day);
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX);
    (start, end)
}

pub fn week_stats(workouts: &[Workout]) -> WeekStats {
    let count = workouts.len() as u32;
    let total_duration: u32 = workouts.iter().map(|w| w.duration).sum();
    let feeling_sum: u32 = workouts.iter().map(|w| u32::from(w.feeling)).sum();

    let (avg_duration, avg_feeling) = if count == 0 {
        (0, 0.0)
    } else {
        (
            (f64::from(total_duration) / f64::from(count)).round() as u32,
            round1(f64::from(feeling_sum) / f64::from(count)),
        )
    };

    let mut types = BTreeMap::new();
    for w in workouts {
        *types.entry(w.workout_type.as_str().to_string()).or_insert(0) += 1;
    }

    WeekStats {
        count,
        total_duration,
        avg_duration,
        avg_feeling,
        types,
    }
}

/// Monday..Sunday of the current week
pub fn week_days(workouts: &[Workout], today: NaiveDate) -> Vec<DayStatus> {
    let (start, _) = week_bounds(today);
    (0..7)
        .map(|offset| {
            let date = start + Duration::days(offset);
            DayStatus {
                date,
                day_name: date.format("%a").to_string(),
                completed: workouts.iter().any(|w| w.date == date),
                is_today: date == today,
                is_future: date > today,
            }
        })
        .collect()
}

pub fn week_comparison_message(this_week: &WeekStats, last_week: &WeekStats) -> String {
    if last_week.count == 0 {
        return "Your first week! Keep it up! 🚀".to_string();
    }

    let diff = i64::from(this_week.count) - i64::from(last_week.count);
    if diff > 0 {
        format!("You trained {} more sessions than last week! 📈", diff)
    } else if diff < 0 {
        format!(
            "You trained {} fewer sessions than last week. Keep pushing! 💪",
            diff.abs()
        )
    } else {
        "You matched last week's session count! 👍".to_string()
    }
}

pub fn weekly_report(
    this_week: &[Workout],
    last_week: &[Workout],
    today: NaiveDate,
) -> WeeklyReport {
    let this_stats = week_stats(this_week);
    let last_stats = week_stats(last_week);
    WeeklyReport {
        comparison: week_comparison_message(&this_stats, &last_stats),
        days: week_days(this_week, today),
        this_week: this_stats,
        last_week: last_stats,
    }
}

/// week-over-week change in percent, 100 when last week was empty
pub fn percentage_change(this_week: u32, last_week: u32) -> i64 {
    if last_week == 0 {
        return if this_week > 0 { 100 } else { 0 };
    }
    let delta = f64::from(this_week) - f64::from(last_week);
    (delta / f64::from(last_week) * 100.0).round() as i64
}

pub fn comparison_message(percentage: i64) -> String {
    if percentage > 20 {
        format!("You're training {}% more than last week! 🎉", percentage)
    } else if percentage > 0 {
        format!("You're up {}% on last week 📈", percentage)
    } else if percentage == 0 {
        "You're holding a steady pace 👍".to_string()
    } else if percentage > -20 {
        format!(
            "A bit slower this week, down {}%, and that's fine! 💪",
            percentage.abs()
        )
    } else {
        "This week needs more effort! Every small step counts 🌱".to_string()
    }
}

/// type with the best average feeling, ties go to the first in `WorkoutType::ALL`
pub fn insight(recent: &[Workout]) -> Option<String> {
    if recent.len() < INSIGHT_MIN_WORKOUTS {
        return None;
    }

    let mut by_type: BTreeMap<WorkoutType, (u32, u32)> = BTreeMap::new();
    for w in recent {
        let entry = by_type.entry(w.workout_type).or_insert((0, 0));
        entry.0 += u32::from(w.feeling);
        entry.1 += 1;
    }

    let mut best: Option<(WorkoutType, f64)> = None;
    for (workout_type, (sum, n)) in by_type {
        let avg = f64::from(sum) / f64::from(n);
        if best.is_none_or(|(_, top)| avg > top) {
            best = Some((workout_type, avg));
        }
    }

    best.map(|(workout_type, _)| {
        format!(
            "You tend to feel best when doing {}! 💡",
            workout_type.as_str()
        )
    })
}

/// first day of the insight window ending at `today`
pub fn insight_window_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(INSIGHT_WINDOW_DAYS)
}

pub fn comparison_report(
    this_week: &[Workout],
    last_week: &[Workout],
    recent: &[Workout],
) -> ComparisonReport {
    let this_week_duration: u32 = this_week.iter().map(|w| w.duration).sum();
    let last_week_duration: u32 = last_week.iter().map(|w| w.duration).sum();
    let percentage_change = percentage_change(this_week_duration, last_week_duration);

    ComparisonReport {
        this_week_duration,
        last_week_duration,
        percentage_change,
        message: comparison_message(percentage_change),
        insight: insight(recent),
    }
}

pub fn monthly_report(month_start: NaiveDate, days: &[DailyTotal]) -> MonthlyReport {
    let total_workouts: u32 = days.iter().map(|d| d.workout_count).sum();
    let total_duration: u32 = days.iter().map(|d| d.total_duration).sum();
    let feeling_sum: f64 = days
        .iter()
        .map(|d| d.avg_feeling * f64::from(d.workout_count))
        .sum();
    let avg_feeling = if total_workouts == 0 {
        0.0
    } else {
        round1(feeling_sum / f64::from(total_workouts))
    };

    let calendar = days
        .iter()
        .map(|d| DailyTotal {
            avg_feeling: round1(d.avg_feeling),
            ..d.clone()
        })
        .collect();

    MonthlyReport {
        month: month_start.format("%Y-%m").to_string(),
        calendar,
        summary: MonthSummary {
            total_workouts,
            total_duration,
            workout_days: days.len() as u32,
            avg_feeling,
        },
    }
}
