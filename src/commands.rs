use chrono::Local;
use rusqlite::Connection;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::{Command, Config, ListArgs, LogArgs, StatsCommand, UpdateArgs, UserCommand};
use crate::db::{self, WorkoutFilter};
use crate::error::{CheckinError, Result};
use crate::models::{NewUser, NewWorkout, User, WorkoutChanges, WorkoutView};
use crate::notifications;
use crate::stats;
use crate::streak::{self, StreakSummary};

/// run one command, returns the JSON document to print
pub fn run(conn: &Connection, config: &Config, command: Command) -> Result<Value> {
    match command {
        Command::User { action } => match action {
            UserCommand::Register { email, name } => register(conn, &email, &name),
            UserCommand::List => list_users(conn),
            UserCommand::Me => me(conn, config),
        },
        Command::Log(args) => log_workout(conn, config, args),
        Command::List(args) => list_workouts(conn, config, args),
        Command::Show { id } => show_workout(conn, config, id),
        Command::Update(args) => update_workout(conn, config, args),
        Command::Delete { id } => delete_workout(conn, config, id),
        Command::Stats { report } => match report {
            StatsCommand::Streak => streak_stats(conn, config),
            StatsCommand::Weekly => weekly_stats(conn, config),
            StatsCommand::Monthly { month } => monthly_stats(conn, config, month.as_deref()),
            StatsCommand::Comparison => comparison_stats(conn, config),
        },
        Command::Health => health(conn),
    }
}

fn active_user(conn: &Connection, config: &Config) -> Result<User> {
    let email = config.user.as_deref().ok_or(CheckinError::NoActiveUser)?;
    db::find_user_by_email(conn, email)?
        .ok_or_else(|| CheckinError::UserNotFound(email.to_string()))
}

fn ensure_valid(errors: Vec<String>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CheckinError::Validation(errors))
    }
}

fn streak_summary(conn: &Connection, config: &Config, user: &User) -> Result<StreakSummary> {
    let dates = db::workout_dates(conn, user.id)?;
    let summary = StreakSummary::from_dates(&dates, config.today);
    debug!(
        user_id = user.id,
        current = summary.current_streak,
        longest = summary.longest_streak,
        "computed streaks"
    );
    Ok(summary)
}

pub fn register(conn: &Connection, email: &str, name: &str) -> Result<Value> {
    let new_user = NewUser::new(email, name);
    ensure_valid(new_user.validate())?;

    let user = db::create_user(conn, &new_user)?;
    info!(user_id = user.id, email = %user.email, "registered user");
    Ok(json!({
        "message": format!("Welcome, {}!", user.name),
        "user": user,
    }))
}

pub fn list_users(conn: &Connection) -> Result<Value> {
    Ok(json!({ "users": db::list_users(conn)? }))
}

pub fn me(conn: &Connection, config: &Config) -> Result<Value> {
    let user = active_user(conn, config)?;
    let streaks = streak_summary(conn, config, &user)?;
    let total_workouts = db::count_workouts(conn, user.id, &WorkoutFilter::default())?;
    Ok(json!({
        "user": user,
        "stats": {
            "current_streak": streaks.current_streak,
            "longest_streak": streaks.longest_streak,
            "streak_message": streaks.streak_message,
            "total_workouts": total_workouts,
        },
    }))
}

pub fn log_workout(conn: &Connection, config: &Config, args: LogArgs) -> Result<Value> {
    let user = active_user(conn, config)?;
    let new_workout = NewWorkout {
        date: args.date.unwrap_or(config.today),
        workout_type: args.workout_type,
        custom_workout_type: args.custom_type,
        duration: args.duration,
        feeling: args.feeling,
        note: args.note,
    };
    ensure_valid(new_workout.validate(config.today))?;

    let workout = db::insert_workout(conn, user.id, &new_workout)?;
    info!(
        user_id = user.id,
        workout_id = workout.id,
        date = %workout.date,
        "logged workout"
    );

    let dates = db::workout_dates(conn, user.id)?;
    let current_streak = streak::current_streak(dates, config.today);
    let today_total = db::duration_on(conn, user.id, config.today)?;

    if config.notify {
        notifications::notify_checkin(&workout, current_streak);
    }

    Ok(json!({
        "message": "Workout logged! 💪",
        "workout": WorkoutView::from(workout),
        "stats": {
            "current_streak": current_streak,
            "today_total": today_total,
        },
    }))
}

fn list_filter(args: &ListArgs) -> Result<WorkoutFilter> {
    let range = match (&args.month, args.from, args.to) {
        (Some(month), _, _) => Some(stats::month_bounds(stats::parse_month(month)?)),
        (None, Some(from), Some(to)) => Some((from, to)),
        _ => None,
    };
    Ok(WorkoutFilter {
        workout_type: args.workout_type,
        range,
        limit: Some(args.limit),
    })
}

pub fn list_workouts(conn: &Connection, config: &Config, args: ListArgs) -> Result<Value> {
    let user = active_user(conn, config)?;
    let filter = list_filter(&args)?;

    let workouts: Vec<WorkoutView> = db::list_workouts(conn, user.id, &filter)?
        .into_iter()
        .map(WorkoutView::from)
        .collect();
    // total counts the returned page, so it never exceeds the limit
    let total = workouts.len();
    let today = WorkoutFilter::in_range(config.today, config.today);
    let today_completed = db::count_workouts(conn, user.id, &today)? > 0;

    Ok(json!({
        "workouts": workouts,
        "meta": {
            "total": total,
            "today_completed": today_completed,
        },
    }))
}

pub fn show_workout(conn: &Connection, config: &Config, id: i64) -> Result<Value> {
    let user = active_user(conn, config)?;
    let workout = db::get_workout(conn, user.id, id)?;
    Ok(json!({ "workout": WorkoutView::from(workout) }))
}

pub fn update_workout(conn: &Connection, config: &Config, args: UpdateArgs) -> Result<Value> {
    let user = active_user(conn, config)?;
    let existing = db::get_workout(conn, user.id, args.id)?;

    let changes = WorkoutChanges {
        date: args.date,
        workout_type: args.workout_type,
        custom_workout_type: args.custom_type,
        duration: args.duration,
        feeling: args.feeling,
        note: args.note,
    };
    let updated = changes.apply_to(&existing);
    ensure_valid(updated.validate(config.today))?;

    let workout = db::update_workout(conn, user.id, args.id, &updated)?;
    info!(user_id = user.id, workout_id = workout.id, "updated workout");
    Ok(json!({
        "message": "Workout updated",
        "workout": WorkoutView::from(workout),
    }))
}

pub fn delete_workout(conn: &Connection, config: &Config, id: i64) -> Result<Value> {
    let user = active_user(conn, config)?;
    db::delete_workout(conn, user.id, id)?;
    info!(user_id = user.id, workout_id = id, "deleted workout");
    Ok(json!({ "message": "Workout deleted" }))
}

pub fn streak_stats(conn: &Connection, config: &Config) -> Result<Value> {
    let user = active_user(conn, config)?;
    Ok(serde_json::to_value(streak_summary(conn, config, &user)?)?)
}

pub fn weekly_stats(conn: &Connection, config: &Config) -> Result<Value> {
    let user = active_user(conn, config)?;
    let (start, end) = stats::week_bounds(config.today);
    let (last_start, last_end) = stats::last_week_bounds(config.today);

    let this_week = db::workouts_in_range(conn, user.id, start, end)?;
    let last_week = db::workouts_in_range(conn, user.id, last_start, last_end)?;
    let report = stats::weekly_report(&this_week, &last_week, config.today);
    Ok(serde_json::to_value(report)?)
}

pub fn monthly_stats(conn: &Connection, config: &Config, month: Option<&str>) -> Result<Value> {
    let user = active_user(conn, config)?;
    let anchor = match month {
        Some(m) => stats::parse_month(m)?,
        None => config.today,
    };
    let (start, end) = stats::month_bounds(anchor);

    let days = db::daily_totals_in_range(conn, user.id, start, end)?;
    Ok(serde_json::to_value(stats::monthly_report(start, &days))?)
}

pub fn comparison_stats(conn: &Connection, config: &Config) -> Result<Value> {
    let user = active_user(conn, config)?;
    let (start, end) = stats::week_bounds(config.today);
    let (last_start, last_end) = stats::last_week_bounds(config.today);

    let this_week = db::workouts_in_range(conn, user.id, start, end)?;
    let last_week = db::workouts_in_range(conn, user.id, last_start, last_end)?;
    let recent = db::workouts_in_range(
        conn,
        user.id,
        stats::insight_window_start(config.today),
        config.today,
    )?;
    let report = stats::comparison_report(&this_week, &last_week, &recent);
    Ok(serde_json::to_value(report)?)
}

pub fn health(conn: &Connection) -> Result<Value> {
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
    Ok(json!({
        "status": "ok",
        "database": "connected",
        "timestamp": Local::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{date, in_memory_db};
    use crate::models::WorkoutType;
    use std::path::PathBuf;

    fn config(today: chrono::NaiveDate) -> Config {
        Config {
            db_path: PathBuf::from(":memory:"),
            user: Some("jane@example.com".to_string()),
            today,
            notify: false,
        }
    }

    fn log_args(
        workout_type: WorkoutType,
        duration: u32,
        feeling: u8,
        day: chrono::NaiveDate,
    ) -> LogArgs {
        LogArgs {
            workout_type,
            duration,
            feeling,
            date: Some(day),
            note: None,
            custom_type: None,
        }
    }

    fn setup(today: chrono::NaiveDate) -> (Connection, Config) {
        let conn = in_memory_db();
        register(&conn, "Jane@Example.com", "Jane").unwrap();
        (conn, config(today))
    }

    #[test]
    fn test_register_validates() {
        let conn = in_memory_db();
        let err = register(&conn, "nope", "J").unwrap_err();
        match err {
            CheckinError::Validation(messages) => assert_eq!(messages.len(), 2),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(matches!(
            register(&conn, "a@b.io", "Al").and_then(|_| register(&conn, "A@B.io", "Al")),
            Err(CheckinError::EmailTaken(_))
        ));
    }

    #[test]
    fn test_requires_active_user() {
        let conn = in_memory_db();
        let mut cfg = config(date(2026, 2, 19));
        cfg.user = None;
        assert!(matches!(me(&conn, &cfg), Err(CheckinError::NoActiveUser)));

        cfg.user = Some("ghost@example.com".to_string());
        assert!(matches!(
            streak_stats(&conn, &cfg),
            Err(CheckinError::UserNotFound(_))
        ));
    }

    #[test]
    fn test_log_reports_streak() {
        let today = date(2026, 2, 19);
        let (conn, cfg) = setup(today);

        log_workout(&conn, &cfg, log_args(WorkoutType::Gym, 30, 2, date(2026, 2, 17))).unwrap();
        log_workout(&conn, &cfg, log_args(WorkoutType::Gym, 30, 2, date(2026, 2, 18))).unwrap();
        let out = log_workout(&conn, &cfg, log_args(WorkoutType::Yoga, 45, 3, today)).unwrap();

        assert_eq!(out["message"], "Workout logged! 💪");
        assert_eq!(out["workout"]["workout_type"], "yoga");
        assert_eq!(out["workout"]["workout_type_label"], "🧘 Yoga");
        assert_eq!(out["workout"]["formatted_date"], "19/02/2026");
        assert_eq!(out["workout"]["day_name"], "Thursday");
        assert_eq!(out["stats"]["current_streak"], 3);
        assert_eq!(out["stats"]["today_total"], 45);

        let profile = me(&conn, &cfg).unwrap();
        assert_eq!(profile["user"]["email"], "jane@example.com");
        assert_eq!(profile["stats"]["current_streak"], 3);
        assert_eq!(profile["stats"]["longest_streak"], 3);
        assert_eq!(profile["stats"]["total_workouts"], 3);
    }

    #[test]
    fn test_log_rejects_invalid_workout() {
        let today = date(2026, 2, 19);
        let (conn, cfg) = setup(today);
        let mut args = log_args(WorkoutType::Other, 20, 2, today);
        args.custom_type = None;

        match log_workout(&conn, &cfg, args).unwrap_err() {
            CheckinError::Validation(messages) => {
                assert!(messages.contains(&"Duration is not included in the list".to_string()));
                assert!(messages.contains(&"Custom workout type can't be blank".to_string()));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_streak_stats() {
        let today = date(2026, 2, 19);
        let (conn, cfg) = setup(today);
        for day in [1, 2, 3, 4, 10, 18] {
            let args = log_args(WorkoutType::Running, 30, 2, date(2026, 2, day));
            log_workout(&conn, &cfg, args).unwrap();
        }

        let out = streak_stats(&conn, &cfg).unwrap();
        assert_eq!(out["current_streak"], 1);
        assert_eq!(out["longest_streak"], 4);
        assert_eq!(out["streak_message"], "Good start! Keep it going! 🌱");
    }

    #[test]
    fn test_list_and_meta() {
        let today = date(2026, 2, 19);
        let (conn, cfg) = setup(today);
        log_workout(&conn, &cfg, log_args(WorkoutType::Gym, 30, 2, date(2026, 1, 30))).unwrap();
        log_workout(&conn, &cfg, log_args(WorkoutType::Running, 30, 2, date(2026, 2, 3))).unwrap();
        log_workout(&conn, &cfg, log_args(WorkoutType::Gym, 60, 3, date(2026, 2, 5))).unwrap();

        let args = ListArgs {
            workout_type: None,
            from: None,
            to: None,
            month: Some("2026-02".to_string()),
            limit: 1,
        };
        let out = list_workouts(&conn, &cfg, args.clone()).unwrap();
        assert_eq!(out["workouts"].as_array().unwrap().len(), 1);
        assert_eq!(out["workouts"][0]["date"], "2026-02-05");
        assert_eq!(out["meta"]["total"], 1);
        assert_eq!(out["meta"]["today_completed"], false);

        let out = list_workouts(&conn, &cfg, ListArgs { limit: 50, ..args }).unwrap();
        assert_eq!(out["meta"]["total"], 2);
    }

    #[test]
    fn test_update_and_delete() {
        let today = date(2026, 2, 19);
        let (conn, cfg) = setup(today);
        let out = log_workout(&conn, &cfg, log_args(WorkoutType::Gym, 30, 2, today)).unwrap();
        let id = out["workout"]["id"].as_i64().unwrap();

        let args = UpdateArgs {
            id,
            workout_type: None,
            duration: Some(90),
            feeling: None,
            date: None,
            note: Some("leg day".to_string()),
            custom_type: None,
        };
        let out = update_workout(&conn, &cfg, args).unwrap();
        assert_eq!(out["workout"]["duration"], 90);
        assert_eq!(out["workout"]["note"], "leg day");
        assert_eq!(out["workout"]["workout_type"], "gym");

        delete_workout(&conn, &cfg, id).unwrap();
        assert!(matches!(
            show_workout(&conn, &cfg, id),
            Err(CheckinError::WorkoutNotFound(_))
        ));
    }

    #[test]
    fn test_weekly_and_comparison() {
        // Thursday
        let today = date(2026, 2, 19);
        let (conn, cfg) = setup(today);
        log_workout(&conn, &cfg, log_args(WorkoutType::Gym, 60, 2, date(2026, 2, 10))).unwrap();
        log_workout(&conn, &cfg, log_args(WorkoutType::Running, 45, 3, date(2026, 2, 16))).unwrap();
        log_workout(&conn, &cfg, log_args(WorkoutType::Running, 45, 3, date(2026, 2, 18))).unwrap();

        let weekly = weekly_stats(&conn, &cfg).unwrap();
        assert_eq!(weekly["this_week"]["count"], 2);
        assert_eq!(weekly["last_week"]["count"], 1);
        assert_eq!(weekly["days"][0]["completed"], true);
        assert_eq!(weekly["days"][3]["is_today"], true);
        assert_eq!(
            weekly["comparison"],
            "You trained 1 more sessions than last week! 📈"
        );

        let comparison = comparison_stats(&conn, &cfg).unwrap();
        assert_eq!(comparison["this_week_duration"], 90);
        assert_eq!(comparison["last_week_duration"], 60);
        assert_eq!(comparison["percentage_change"], 50);
        assert_eq!(
            comparison["insight"],
            "You tend to feel best when doing running! 💡"
        );
    }

    #[test]
    fn test_monthly_stats() {
        let today = date(2026, 2, 19);
        let (conn, cfg) = setup(today);
        log_workout(&conn, &cfg, log_args(WorkoutType::Gym, 30, 1, date(2026, 2, 3))).unwrap();
        log_workout(&conn, &cfg, log_args(WorkoutType::Yoga, 15, 2, date(2026, 2, 3))).unwrap();
        log_workout(&conn, &cfg, log_args(WorkoutType::Gym, 60, 3, date(2026, 1, 31))).unwrap();

        let out = monthly_stats(&conn, &cfg, None).unwrap();
        assert_eq!(out["month"], "2026-02");
        assert_eq!(out["summary"]["total_workouts"], 2);
        assert_eq!(out["summary"]["workout_days"], 1);
        assert_eq!(out["calendar"][0]["avg_feeling"], 1.5);

        let out = monthly_stats(&conn, &cfg, Some("2026-01")).unwrap();
        assert_eq!(out["summary"]["total_duration"], 60);

        assert!(matches!(
            monthly_stats(&conn, &cfg, Some("January")),
            Err(CheckinError::InvalidMonth(_))
        ));
    }

    #[test]
    fn test_health() {
        let conn = in_memory_db();
        let out = health(&conn).unwrap();
        assert_eq!(out["status"], "ok");
        assert_eq!(out["database"], "connected");
        assert_eq!(out["version"], env!("CARGO_PKG_VERSION"));
        let timestamp = out["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }
}
