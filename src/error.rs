use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckinError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("workout {0} not found")]
    WorkoutNotFound(i64),

    #[error("no user registered with email {0}")]
    UserNotFound(String),

    #[error("email {0} is already registered")]
    EmailTaken(String),

    #[error("invalid month {0:?}, expected YYYY-MM")]
    InvalidMonth(String),

    #[error("no active user, pass --user or set CHECKIN_USER")]
    NoActiveUser,
}

pub type Result<T> = std::result::Result<T, CheckinError>;
