use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

/// distinct workout days, ascending
pub type WorkoutDateSet = BTreeSet<NaiveDate>;

/// consecutive days back from today, or from yesterday if today is empty
pub fn current_streak<I>(dates: I, today: NaiveDate) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    let dates: WorkoutDateSet = dates.into_iter().collect();

    let Some(anchor) = anchor_day(&dates, today) else {
        return 0;
    };

    let mut streak = 0;
    let mut day = Some(anchor);
    while let Some(d) = day.filter(|d| dates.contains(d)) {
        streak += 1;
        day = d.pred_opt();
    }
    streak
}

/// longest run of consecutive days anywhere in the history
pub fn longest_streak<I>(dates: I) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    let dates: WorkoutDateSet = dates.into_iter().collect();

    let mut iter = dates.iter();
    let Some(mut prev) = iter.next() else {
        return 0;
    };

    let mut longest = 1;
    let mut run = 1;
    for date in iter {
        if prev.succ_opt().as_ref() == Some(date) {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 1;
        }
        prev = date;
    }
    longest
}

fn anchor_day(dates: &WorkoutDateSet, today: NaiveDate) -> Option<NaiveDate> {
    if dates.contains(&today) {
        return Some(today);
    }
    today.pred_opt().filter(|yesterday| dates.contains(yesterday))
}

/// encouragement text keyed by streak length
pub fn streak_message(streak: u32) -> String {
    match streak {
        0 => "Start your first workout today! 🎯".to_string(),
        1..=2 => "Good start! Keep it going! 🌱".to_string(),
        3..=6 => "You're making real progress! 🔥".to_string(),
        7..=13 => "A full week in a row! Amazing! 🏆".to_string(),
        14..=29 => format!("Wow! {} days in a row! You're persistent! 💪", streak),
        _ => format!("{} days! You're a legend! 🌟", streak),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakSummary {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub streak_message: String,
}

impl StreakSummary {
    pub fn from_dates(dates: &WorkoutDateSet, today: NaiveDate) -> Self {
        let current_streak = current_streak(dates.iter().copied(), today);
        Self {
            current_streak,
            longest_streak: longest_streak(dates.iter().copied()),
            streak_message: streak_message(current_streak),
        }
    }
}
