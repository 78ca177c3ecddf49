use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};

use crate::db;
use crate::models::{DEFAULT_LIST_LIMIT, WorkoutType};

#[derive(Debug, Parser)]
#[command(
    name = "ferris-checkin",
    version,
    about = "Log daily workouts and keep your streak alive",
    long_about = "Workout check-in tracker. Log workouts, then follow your current and longest streaks plus weekly and monthly stats. Every command prints JSON."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Database file [default: <data dir>/ferris-checkin/ferris_checkin.db]
    #[arg(long, env = "CHECKIN_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Email of the user to act as
    #[arg(long, env = "CHECKIN_USER", global = true)]
    pub user: Option<String>,

    /// Reference date (YYYY-MM-DD) instead of the local calendar date
    #[arg(long, env = "CHECKIN_TODAY", global = true)]
    pub today: Option<NaiveDate>,

    /// Don't show desktop notifications
    #[arg(long, global = true)]
    pub no_notify: bool,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// User profiles
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Log a workout
    Log(LogArgs),

    /// List workouts, newest first
    List(ListArgs),

    /// Show one workout
    Show { id: i64 },

    /// Change fields of a workout
    Update(UpdateArgs),

    /// Delete a workout
    Delete { id: i64 },

    /// Streaks and statistics
    Stats {
        #[command(subcommand)]
        report: StatsCommand,
    },

    /// Check the database is reachable
    Health,
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create a user profile
    Register {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,
    },

    /// List all user profiles
    List,

    /// Show the active user with streaks
    Me,
}

#[derive(Debug, Args)]
pub struct LogArgs {
    /// gym, running, yoga or other
    #[arg(long = "type")]
    pub workout_type: WorkoutType,

    /// Minutes: 15, 30, 45, 60, 90 or 120
    #[arg(long)]
    pub duration: u32,

    /// 1 exhausted, 2 normal, 3 great
    #[arg(long)]
    pub feeling: u8,

    /// Workout day [default: today]
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long)]
    pub note: Option<String>,

    /// Name of the activity, required with --type other
    #[arg(long)]
    pub custom_type: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    #[arg(long = "type")]
    pub workout_type: Option<WorkoutType>,

    /// Start of an inclusive date range
    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,

    /// End of an inclusive date range
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,

    /// Whole month as YYYY-MM
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub month: Option<String>,

    #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
    pub limit: u32,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub id: i64,

    #[arg(long = "type")]
    pub workout_type: Option<WorkoutType>,

    #[arg(long)]
    pub duration: Option<u32>,

    #[arg(long)]
    pub feeling: Option<u8>,

    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long)]
    pub note: Option<String>,

    #[arg(long)]
    pub custom_type: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum StatsCommand {
    /// Current and longest streak
    Streak,

    /// This week against last week
    Weekly,

    /// Per-day calendar for a month
    Monthly {
        /// YYYY-MM [default: current month]
        #[arg(long)]
        month: Option<String>,
    },

    /// Duration change against last week
    Comparison,
}

/// runtime settings resolved from the command line
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub user: Option<String>,
    pub today: NaiveDate,
    pub notify: bool,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            db_path: cli.db.clone().unwrap_or_else(db::default_db_path),
            user: cli.user.clone(),
            today: cli.today.unwrap_or_else(|| Local::now().date_naive()),
            notify: !cli.no_notify,
        }
    }

    /// RUST_LOG wins, then --verbose
    pub fn default_log_level(verbose: bool) -> &'static str {
        if verbose { "debug" } else { "info" }
    }
}
