use tracing::{debug, warn};

use crate::models::Workout;
use crate::streak::streak_message;

/// title + body for a fresh check-in
pub fn checkin_text(workout: &Workout, current_streak: u32) -> (String, String) {
    let title = if current_streak > 1 {
        format!("🔥 {} day streak!", current_streak)
    } else {
        "💪 Workout logged!".to_string()
    };
    let body = format!(
        "{} for {} min. {}",
        workout.type_label(),
        workout.duration,
        streak_message(current_streak)
    );
    (title, body)
}

pub fn notify_checkin(workout: &Workout, current_streak: u32) {
    let (title, body) = checkin_text(workout, current_streak);
    debug!(%title, "sending check-in notification");

    if let Err(e) = notify_rust::Notification::new()
        .summary(&title)
        .body(&body)
        .appname("Ferris Check-in")
        .timeout(5000)
        .show()
    {
        warn!(error = %e, "failed to send check-in notification");
    }
}
