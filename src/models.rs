use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    Gym,
    Running,
    Yoga,
    Other,
}

impl WorkoutType {
    pub const ALL: [WorkoutType; 4] = [
        WorkoutType::Gym,
        WorkoutType::Running,
        WorkoutType::Yoga,
        WorkoutType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutType::Gym => "gym",
            WorkoutType::Running => "running",
            WorkoutType::Yoga => "yoga",
            WorkoutType::Other => "other",
        }
    }
}

impl FromStr for WorkoutType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkoutType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown workout type {:?}, expected one of gym, running, yoga, other",
                    s
                )
            })
    }
}

/// allowed workout lengths in minutes
pub const DURATIONS: [u32; 6] = [15, 30, 45, 60, 90, 120];

pub const NOTE_MAX_CHARS: usize = 500;
pub const CUSTOM_TYPE_MAX_CHARS: usize = 100;
pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const DEFAULT_LIST_LIMIT: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feeling {
    Exhausted = 1,
    Normal = 2,
    Great = 3,
}

impl Feeling {
    pub fn from_score(score: u8) -> Option<Self> {
        match score {
            1 => Some(Feeling::Exhausted),
            2 => Some(Feeling::Normal),
            3 => Some(Feeling::Great),
            _ => None,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Feeling::Exhausted => "😫",
            Feeling::Normal => "😐",
            Feeling::Great => "😄",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Feeling::Exhausted => "Exhausted",
            Feeling::Normal => "Normal",
            Feeling::Great => "Great",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub workout_type: WorkoutType,
    pub custom_workout_type: Option<String>,
    /// minutes
    pub duration: u32,
    /// 1..=3, see [`Feeling`]
    pub feeling: u8,
    pub note: Option<String>,
    pub created_at: String,
}

impl Workout {
    pub fn type_label(&self) -> String {
        match self.workout_type {
            WorkoutType::Gym => "🏋️ Gym".to_string(),
            WorkoutType::Running => "🏃 Running".to_string(),
            WorkoutType::Yoga => "🧘 Yoga".to_string(),
            WorkoutType::Other => match self.custom_workout_type.as_deref() {
                Some(custom) if !custom.trim().is_empty() => format!("💪 {}", custom),
                _ => "💪 Other".to_string(),
            },
        }
    }

    pub fn feeling(&self) -> Option<Feeling> {
        Feeling::from_score(self.feeling)
    }
}

/// serialized shape of a workout, with display fields
#[derive(Debug, Clone, Serialize)]
pub struct WorkoutView {
    #[serde(flatten)]
    pub workout: Workout,
    pub workout_type_label: String,
    pub feeling_emoji: Option<&'static str>,
    pub feeling_label: Option<&'static str>,
    /// dd/mm/yyyy
    pub formatted_date: String,
    /// full weekday name
    pub day_name: String,
}

impl From<Workout> for WorkoutView {
    fn from(workout: Workout) -> Self {
        let feeling = workout.feeling();
        Self {
            workout_type_label: workout.type_label(),
            feeling_emoji: feeling.map(|f| f.emoji()),
            feeling_label: feeling.map(|f| f.label()),
            formatted_date: workout.date.format("%d/%m/%Y").to_string(),
            day_name: workout.date.format("%A").to_string(),
            workout,
        }
    }
}

/// workout input as submitted by the user
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkout {
    pub date: NaiveDate,
    pub workout_type: WorkoutType,
    pub custom_workout_type: Option<String>,
    pub duration: u32,
    pub feeling: u8,
    pub note: Option<String>,
}

impl NewWorkout {
    /// all failed rules, empty when valid
    pub fn validate(&self, today: NaiveDate) -> Vec<String> {
        let mut errors = Vec::new();

        if self.date > today {
            errors.push("Date can't be in the future".to_string());
        }
        if !DURATIONS.contains(&self.duration) {
            errors.push("Duration is not included in the list".to_string());
        }
        if Feeling::from_score(self.feeling).is_none() {
            errors.push("Feeling is not included in the list".to_string());
        }
        if let Some(note) = &self.note {
            if note.chars().count() > NOTE_MAX_CHARS {
                errors.push(format!(
                    "Note is too long (maximum is {} characters)",
                    NOTE_MAX_CHARS
                ));
            }
        }

        let custom = self.custom_workout_type.as_deref().unwrap_or("");
        if self.workout_type == WorkoutType::Other && custom.trim().is_empty() {
            errors.push("Custom workout type can't be blank".to_string());
        }
        if custom.chars().count() > CUSTOM_TYPE_MAX_CHARS {
            errors.push(format!(
                "Custom workout type is too long (maximum is {} characters)",
                CUSTOM_TYPE_MAX_CHARS
            ));
        }

        errors
    }
}

/// partial update, None leaves the field as is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkoutChanges {
    pub date: Option<NaiveDate>,
    pub workout_type: Option<WorkoutType>,
    pub custom_workout_type: Option<String>,
    pub duration: Option<u32>,
    pub feeling: Option<u8>,
    pub note: Option<String>,
}

impl WorkoutChanges {
    pub fn apply_to(&self, workout: &Workout) -> NewWorkout {
        NewWorkout {
            date: self.date.unwrap_or(workout.date),
            workout_type: self.workout_type.unwrap_or(workout.workout_type),
            custom_workout_type: self
                .custom_workout_type
                .clone()
                .or_else(|| workout.custom_workout_type.clone()),
            duration: self.duration.unwrap_or(workout.duration),
            feeling: self.feeling.unwrap_or(workout.feeling),
            note: self.note.clone().or_else(|| workout.note.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern compiles")
});

impl NewUser {
    /// trims input and lowercases the email
    pub fn new(email: &str, name: &str) -> Self {
        Self {
            email: email.trim().to_lowercase(),
            name: name.trim().to_string(),
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.email.is_empty() {
            errors.push("Email can't be blank".to_string());
        } else if !EMAIL_RE.is_match(&self.email) {
            errors.push("Email is invalid".to_string());
        }

        let name_len = self.name.chars().count();
        if name_len == 0 {
            errors.push("Name can't be blank".to_string());
        } else if name_len < NAME_MIN_CHARS {
            errors.push(format!(
                "Name is too short (minimum is {} characters)",
                NAME_MIN_CHARS
            ));
        } else if name_len > NAME_MAX_CHARS {
            errors.push(format!(
                "Name is too long (maximum is {} characters)",
                NAME_MAX_CHARS
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 19).unwrap()
    }

    fn valid_workout() -> NewWorkout {
        NewWorkout {
            date: today(),
            workout_type: WorkoutType::Gym,
            custom_workout_type: None,
            duration: 45,
            feeling: 3,
            note: None,
        }
    }

    #[test]
    fn test_workout_type_parse() {
        for t in WorkoutType::ALL {
            assert_eq!(t.as_str().parse::<WorkoutType>(), Ok(t));
        }
        assert!("swimming".parse::<WorkoutType>().is_err());
    }

    #[test]
    fn test_valid_workout() {
        assert!(valid_workout().validate(today()).is_empty());
    }

    #[test]
    fn test_invalid_duration_and_feeling() {
        let workout = NewWorkout {
            duration: 20,
            feeling: 4,
            ..valid_workout()
        };
        assert_eq!(
            workout.validate(today()),
            vec![
                "Duration is not included in the list".to_string(),
                "Feeling is not included in the list".to_string(),
            ]
        );
    }

    #[test]
    fn test_other_requires_custom_type() {
        let workout = NewWorkout {
            workout_type: WorkoutType::Other,
            custom_workout_type: Some("  ".to_string()),
            ..valid_workout()
        };
        assert_eq!(
            workout.validate(today()),
            vec!["Custom workout type can't be blank".to_string()]
        );

        let workout = NewWorkout {
            workout_type: WorkoutType::Other,
            custom_workout_type: Some("Swimming".to_string()),
            ..valid_workout()
        };
        assert!(workout.validate(today()).is_empty());
    }

    #[test]
    fn test_note_length() {
        let workout = NewWorkout {
            note: Some("x".repeat(501)),
            ..valid_workout()
        };
        assert_eq!(workout.validate(today()).len(), 1);

        let workout = NewWorkout {
            note: Some("x".repeat(500)),
            ..valid_workout()
        };
        assert!(workout.validate(today()).is_empty());
    }

    #[test]
    fn test_future_date_rejected() {
        let workout = NewWorkout {
            date: today().succ_opt().unwrap(),
            ..valid_workout()
        };
        assert_eq!(
            workout.validate(today()),
            vec!["Date can't be in the future".to_string()]
        );
    }

    #[test]
    fn test_type_label() {
        let mut workout = Workout {
            id: 1,
            user_id: 1,
            date: today(),
            workout_type: WorkoutType::Other,
            custom_workout_type: Some("Climbing".to_string()),
            duration: 60,
            feeling: 2,
            note: None,
            created_at: "2026-02-19T10:00:00".to_string(),
        };
        assert_eq!(workout.type_label(), "💪 Climbing");

        workout.custom_workout_type = None;
        assert_eq!(workout.type_label(), "💪 Other");

        workout.workout_type = WorkoutType::Yoga;
        assert_eq!(workout.type_label(), "🧘 Yoga");
    }

    #[test]
    fn test_view_display_fields() {
        let workout = Workout {
            id: 3,
            user_id: 1,
            date: today(),
            workout_type: WorkoutType::Gym,
            custom_workout_type: None,
            duration: 45,
            feeling: 1,
            note: None,
            created_at: "2026-02-19T18:00:00".to_string(),
        };
        let view = WorkoutView::from(workout);
        assert_eq!(view.formatted_date, "19/02/2026");
        assert_eq!(view.day_name, "Thursday");
        assert_eq!(view.feeling_label, Some("Exhausted"));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["formatted_date"], "19/02/2026");
        assert_eq!(json["day_name"], "Thursday");
        assert_eq!(json["date"], "2026-02-19");
    }

    #[test]
    fn test_changes_keep_unset_fields() {
        let workout = Workout {
            id: 7,
            user_id: 1,
            date: today(),
            workout_type: WorkoutType::Running,
            custom_workout_type: None,
            duration: 30,
            feeling: 2,
            note: Some("easy pace".to_string()),
            created_at: "2026-02-19T07:00:00".to_string(),
        };
        let changes = WorkoutChanges {
            duration: Some(60),
            ..Default::default()
        };
        let updated = changes.apply_to(&workout);
        assert_eq!(updated.duration, 60);
        assert_eq!(updated.workout_type, WorkoutType::Running);
        assert_eq!(updated.note.as_deref(), Some("easy pace"));
    }

    #[test]
    fn test_new_user_normalizes_email() {
        let user = NewUser::new("  Jane@Example.COM ", " Jane ");
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.name, "Jane");
        assert!(user.validate().is_empty());
    }

    #[test]
    fn test_new_user_validation() {
        let user = NewUser::new("not-an-email", "J");
        assert_eq!(
            user.validate(),
            vec![
                "Email is invalid".to_string(),
                "Name is too short (minimum is 2 characters)".to_string(),
            ]
        );
    }

    #[test]
    fn test_feeling_scale() {
        assert_eq!(Feeling::from_score(1), Some(Feeling::Exhausted));
        assert_eq!(Feeling::Great.label(), "Great");
        assert_eq!(Feeling::Normal.emoji(), "😐");
        assert_eq!(Feeling::from_score(0), None);
    }
}
