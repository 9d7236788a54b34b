use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;

use crate::errors::FieldError;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    })
}

fn currency_regex() -> &'static Regex {
    static CURRENCY: OnceLock<Regex> = OnceLock::new();
    CURRENCY.get_or_init(|| Regex::new(r"^[A-Za-z]{3}$").expect("currency pattern is valid"))
}

/// Collects field errors so a request reports every problem at once.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    pub fn into_result(self) -> Result<(), Vec<FieldError>> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self.0)
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// At least 8 characters with a lowercase letter, an uppercase letter and a digit.
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

pub fn is_currency_code(code: &str) -> bool {
    currency_regex().is_match(code)
}

pub fn char_len_between(value: &str, min: usize, max: usize) -> bool {
    let len = value.chars().count();
    len >= min && len <= max
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| format!("Invalid date: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("taro@example.com"));
        assert!(!is_valid_email("taro@example"));
        assert!(!is_valid_email("taro example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_password_strength() {
        assert!(is_strong_password("Passw0rd"));
        assert!(!is_strong_password("password1"));
        assert!(!is_strong_password("PASSWORD1"));
        assert!(!is_strong_password("Password"));
        assert!(!is_strong_password("Pa1"));
    }

    #[test]
    fn test_currency_code() {
        assert!(is_currency_code("JPY"));
        assert!(is_currency_code("usd"));
        assert!(!is_currency_code("US"));
        assert!(!is_currency_code("US1"));
        assert!(!is_currency_code("EURO"));
    }

    #[test]
    fn test_parse_plain_date_is_midnight_utc() {
        let dt = parse_date("2024-03-15").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 3, 15));
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_parse_rfc3339_converts_to_utc() {
        let dt = parse_date("2024-03-15T09:00:00+09:00").unwrap();
        assert_eq!(dt.hour(), 0);
        assert_eq!(dt.day(), 15);
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_date("15/03/2024").is_err());
    }

    #[test]
    fn test_field_errors_collects_all() {
        let mut errors = FieldErrors::new();
        errors.check(false, "name", "Name is required");
        errors.check(true, "email", "unused");
        errors.add("quantity", "Quantity must be positive");
        let err = errors.into_result().unwrap_err();
        assert_eq!(err.len(), 2);
        assert_eq!(err[1].field, "quantity");
    }
}
