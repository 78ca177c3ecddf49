use chrono::{Local, NaiveDate};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CheckinError, Result};
use crate::models::{NewUser, NewWorkout, User, Workout, WorkoutType};
use crate::stats::DailyTotal;
use crate::streak::WorkoutDateSet;

pub const DATE_FMT: &str = "%Y-%m-%d";
const TIMESTAMP_FMT: &str = "%Y-%m-%dT%H:%M:%S";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        email TEXT NOT NULL UNIQUE COLLATE NOCASE,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS workouts (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        date TEXT NOT NULL,
        workout_type TEXT NOT NULL,
        custom_workout_type TEXT,
        duration INTEGER NOT NULL,
        feeling INTEGER NOT NULL,
        note TEXT,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_workouts_user_date ON workouts (user_id, date);
    CREATE INDEX IF NOT EXISTS idx_workouts_date ON workouts (date);
    CREATE INDEX IF NOT EXISTS idx_workouts_type ON workouts (workout_type);
";

const WORKOUT_COLUMNS: &str =
    "id, user_id, date, workout_type, custom_workout_type, duration, feeling, note, created_at";

/// default db file path
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ferris-checkin")
        .join("ferris_checkin.db")
}

/// open db file + init tables
pub fn init_db(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    debug!(path = %path.display(), "opening database");
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FMT).to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

fn parse_date_column(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FMT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn workout_from_row(row: &Row) -> rusqlite::Result<Workout> {
    let date: String = row.get(2)?;
    let workout_type: String = row.get(3)?;
    let workout_type = workout_type
        .parse::<WorkoutType>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into()))?;

    Ok(Workout {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: parse_date_column(2, &date)?,
        workout_type,
        custom_workout_type: row.get(4)?,
        duration: row.get(5)?,
        feeling: row.get(6)?,
        note: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub fn create_user(conn: &Connection, user: &NewUser) -> Result<User> {
    if find_user_by_email(conn, &user.email)?.is_some() {
        return Err(CheckinError::EmailTaken(user.email.clone()));
    }

    conn.execute(
        "INSERT INTO users (email, name, created_at) VALUES (?1, ?2, ?3)",
        params![user.email, user.name, now_timestamp()],
    )?;
    let id = conn.last_insert_rowid();

    conn.query_row(
        "SELECT id, email, name, created_at FROM users WHERE id = ?1",
        params![id],
        user_from_row,
    )
    .map_err(CheckinError::from)
}

/// case-insensitive lookup
pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, email, name, created_at FROM users WHERE email = ?1",
            params![email.trim()],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare("SELECT id, email, name, created_at FROM users ORDER BY id")?;
    let rows = stmt.query_map([], user_from_row)?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}

/// list query options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkoutFilter {
    pub workout_type: Option<WorkoutType>,
    /// inclusive
    pub range: Option<(NaiveDate, NaiveDate)>,
    pub limit: Option<u32>,
}

impl WorkoutFilter {
    pub fn in_range(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            range: Some((start, end)),
            ..Default::default()
        }
    }

    fn where_clause(&self, user_id: i64) -> (String, Vec<Value>) {
        let mut clause = String::from("user_id = ?");
        let mut values = vec![Value::Integer(user_id)];

        if let Some(t) = self.workout_type {
            clause.push_str(" AND workout_type = ?");
            values.push(Value::Text(t.as_str().to_string()));
        }
        if let Some((start, end)) = self.range {
            clause.push_str(" AND date >= ? AND date <= ?");
            values.push(Value::Text(format_date(start)));
            values.push(Value::Text(format_date(end)));
        }
        (clause, values)
    }
}

pub fn insert_workout(conn: &Connection, user_id: i64, workout: &NewWorkout) -> Result<Workout> {
    conn.execute(
        "INSERT INTO workouts (user_id, date, workout_type, custom_workout_type, duration, feeling, note, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user_id,
            format_date(workout.date),
            workout.workout_type.as_str(),
            workout.custom_workout_type,
            workout.duration,
            workout.feeling,
            workout.note,
            now_timestamp(),
        ],
    )?;
    get_workout(conn, user_id, conn.last_insert_rowid())
}

/// only finds the user's own workouts
pub fn get_workout(conn: &Connection, user_id: i64, id: i64) -> Result<Workout> {
    let sql = format!("SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = ?1 AND user_id = ?2");
    conn.query_row(&sql, params![id, user_id], workout_from_row)
        .optional()?
        .ok_or(CheckinError::WorkoutNotFound(id))
}

pub fn update_workout(
    conn: &Connection,
    user_id: i64,
    id: i64,
    workout: &NewWorkout,
) -> Result<Workout> {
    let changed = conn.execute(
        "UPDATE workouts
         SET date = ?1, workout_type = ?2, custom_workout_type = ?3, duration = ?4, feeling = ?5, note = ?6
         WHERE id = ?7 AND user_id = ?8",
        params![
            format_date(workout.date),
            workout.workout_type.as_str(),
            workout.custom_workout_type,
            workout.duration,
            workout.feeling,
            workout.note,
            id,
            user_id,
        ],
    )?;
    if changed == 0 {
        return Err(CheckinError::WorkoutNotFound(id));
    }
    get_workout(conn, user_id, id)
}

pub fn delete_workout(conn: &Connection, user_id: i64, id: i64) -> Result<()> {
    let changed = conn.execute(
        "DELETE FROM workouts WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    if changed == 0 {
        return Err(CheckinError::WorkoutNotFound(id));
    }
    Ok(())
}

/// newest first
pub fn list_workouts(
    conn: &Connection,
    user_id: i64,
    filter: &WorkoutFilter,
) -> Result<Vec<Workout>> {
    let (clause, mut values) = filter.where_clause(user_id);
    let mut sql = format!(
        "SELECT {WORKOUT_COLUMNS} FROM workouts WHERE {clause} ORDER BY date DESC, created_at DESC, id DESC"
    );
    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        values.push(Value::Integer(i64::from(limit)));
    }
    debug!(%sql, "listing workouts");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), workout_from_row)?;

    let mut workouts = Vec::new();
    for row in rows {
        workouts.push(row?);
    }
    Ok(workouts)
}

/// matches ignoring the limit
pub fn count_workouts(conn: &Connection, user_id: i64, filter: &WorkoutFilter) -> Result<u32> {
    let (clause, values) = filter.where_clause(user_id);
    let sql = format!("SELECT COUNT(*) FROM workouts WHERE {clause}");
    let count = conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
    Ok(count)
}

pub fn workouts_in_range(
    conn: &Connection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Workout>> {
    list_workouts(conn, user_id, &WorkoutFilter::in_range(start, end))
}

/// distinct workout days for streaks
pub fn workout_dates(conn: &Connection, user_id: i64) -> Result<WorkoutDateSet> {
    let mut stmt = conn.prepare("SELECT DISTINCT date FROM workouts WHERE user_id = ?1")?;
    let rows = stmt.query_map(params![user_id], |row| {
        let raw: String = row.get(0)?;
        parse_date_column(0, &raw)
    })?;

    let mut dates = WorkoutDateSet::new();
    for row in rows {
        dates.insert(row?);
    }
    debug!(user_id, days = dates.len(), "loaded workout dates");
    Ok(dates)
}

/// per-day totals in range, grouped by date
pub fn daily_totals_in_range(
    conn: &Connection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DailyTotal>> {
    let mut stmt = conn.prepare(
        "SELECT date, COUNT(*), COALESCE(SUM(duration), 0), AVG(feeling)
         FROM workouts
         WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
         GROUP BY date
         ORDER BY date",
    )?;

    let rows = stmt.query_map(
        params![user_id, format_date(start), format_date(end)],
        |row| {
            let raw: String = row.get(0)?;
            Ok(DailyTotal {
                date: parse_date_column(0, &raw)?,
                workout_count: row.get(1)?,
                total_duration: row.get(2)?,
                avg_feeling: row.get(3)?,
            })
        },
    )?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// total minutes logged on a day
pub fn duration_on(conn: &Connection, user_id: i64, date: NaiveDate) -> Result<u32> {
    let total = conn.query_row(
        "SELECT COALESCE(SUM(duration), 0) FROM workouts WHERE user_id = ?1 AND date = ?2",
        params![user_id, format_date(date)],
        |row| row.get(0),
    )?;
    Ok(total)
}
