//! Form validation for login, registration and new reminders.
//!
//! Validation runs before any network call. Every failing field is
//! reported, not just the first one.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;

use crate::reminders::NewReminder;

pub const REQUIRED: &str = "This field is required!";
pub const DESCRIPTION_LENGTH: &str = "The description must be between 3 and 30 characters.";
pub const NAME_LENGTH: &str = "The name must be between 3 and 20 characters.";
pub const PASSWORD_LENGTH: &str = "The password must be between 6 and 40 characters.";
pub const INVALID_EMAIL: &str = "This is not a valid email.";
pub const PASSWORD_MISMATCH: &str = "Passwords must match.";
pub const DATE_FORMAT: &str = "Date must be YYYY-MM-DD.";
pub const TIME_FORMAT: &str = "Time must be HH:MM.";
pub const DATETIME_IN_PAST: &str = "Datetime must be in the future";

/// Wire format for reminder datetimes (seconds are always zero).
pub const REMINDER_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:00";

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// A single failing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All failing fields of one form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: &str) {
        self.errors.push(FieldError {
            field,
            message: message.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// First message reported for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn length_within(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&value.trim().chars().count())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE
        .as_ref()
        .is_some_and(|re| re.is_match(email.trim()))
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// # Errors
    /// Returns every missing field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if is_blank(&self.email) {
            errors.push("email", REQUIRED);
        }
        if self.password.is_empty() {
            errors.push("password", REQUIRED);
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

impl RegisterForm {
    /// # Errors
    /// Returns every field that is missing or out of range.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if is_blank(&self.name) {
            errors.push("name", REQUIRED);
        } else if !length_within(&self.name, 3, 20) {
            errors.push("name", NAME_LENGTH);
        }

        if is_blank(&self.email) {
            errors.push("email", REQUIRED);
        } else if !is_valid_email(&self.email) {
            errors.push("email", INVALID_EMAIL);
        }

        // Passwords are checked untrimmed.
        let password_len = self.password.chars().count();
        if self.password.is_empty() {
            errors.push("password", REQUIRED);
        } else if !(6..=40).contains(&password_len) {
            errors.push("password", PASSWORD_LENGTH);
        }

        if self.password_confirmation.is_empty() {
            errors.push("password_confirmation", REQUIRED);
        } else if self.password_confirmation != self.password {
            errors.push("password_confirmation", PASSWORD_MISMATCH);
        }

        errors.into_result()
    }
}

/// The new-reminder form as entered.
#[derive(Debug, Clone, Default)]
pub struct ReminderForm {
    pub description: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub city: String,
    pub location_coordinates: String,
}

impl ReminderForm {
    /// Validates the form and builds the request payload.
    ///
    /// `date` and `time` are read as wall-clock time at `offset` and must
    /// not be earlier than `now`.
    ///
    /// # Errors
    /// Returns every failing field.
    pub fn validate(
        &self,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Result<NewReminder, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if is_blank(&self.description) {
            errors.push("description", REQUIRED);
        } else if !length_within(&self.description, 3, 30) {
            errors.push("description", DESCRIPTION_LENGTH);
        }

        let date = if is_blank(&self.date) {
            errors.push("date", REQUIRED);
            None
        } else {
            let parsed = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok();
            if parsed.is_none() {
                errors.push("date", DATE_FORMAT);
            }
            parsed
        };

        let time = if is_blank(&self.time) {
            errors.push("time", REQUIRED);
            None
        } else {
            let parsed = NaiveTime::parse_from_str(self.time.trim(), "%H:%M").ok();
            if parsed.is_none() {
                errors.push("time", TIME_FORMAT);
            }
            parsed
        };

        let datetime = date.zip(time).map(|(d, t)| NaiveDateTime::new(d, t));
        if let Some(local) = datetime {
            let in_past = offset
                .from_local_datetime(&local)
                .single()
                .is_none_or(|at| at < now);
            if in_past {
                errors.push("time", DATETIME_IN_PAST);
            }
        }

        if is_blank(&self.city) {
            errors.push("city", REQUIRED);
        }
        if is_blank(&self.location_coordinates) {
            errors.push("location_coordinates", REQUIRED);
        }

        match datetime {
            Some(local) if errors.is_empty() => Ok(NewReminder {
                description: self.description.trim().to_string(),
                datetime: local.format(REMINDER_DATETIME_FORMAT).to_string(),
                city: self.city.trim().to_string(),
                location_coordinates: self.location_coordinates.trim().to_string(),
            }),
            _ => Err(errors),
        }
    }
}
