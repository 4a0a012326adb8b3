//! Field-level validation rules.
//!
//! Rules run on the trimmed value: the required check first, short-circuiting
//! on failure, then the rule selected by the field's kind or name.

use chrono::{Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::form::{field::GPA, FieldDescriptor, FieldKind, FormSurface};

pub const REQUIRED_MESSAGE: &str = "This field is required";
pub const EMAIL_MESSAGE: &str = "Please enter a valid email address";
pub const PHONE_MESSAGE: &str = "Please enter a valid phone number";
pub const GPA_MESSAGE: &str = "GPA must be between 0.00 and 4.00";
pub const DATE_MESSAGE: &str = "Please enter a valid date of birth";
pub const MINIMUM_AGE_MESSAGE: &str = "Student must be at least 13 years old";

pub const MINIMUM_AGE_YEARS: u32 = 13;
pub const GPA_MIN: f64 = 0.0;
pub const GPA_MAX: f64 = 4.0;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[1-9][0-9]{0,15}$").expect("valid phone pattern"));

static LEADING_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?").expect("valid float pattern")
});

/// Verdict for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn pass() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Applies the validation rules. `today` anchors the date-of-birth age limit.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    today: NaiveDate,
}

impl Validator {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn validate(&self, field: &FieldDescriptor, value: &str) -> ValidationResult {
        let value = value.trim();

        if field.required && value.is_empty() {
            return ValidationResult::fail(REQUIRED_MESSAGE);
        }
        if value.is_empty() {
            return ValidationResult::pass();
        }

        match field.kind {
            FieldKind::Email if !is_valid_email(value) => {
                return ValidationResult::fail(EMAIL_MESSAGE)
            }
            FieldKind::Telephone if !is_valid_phone(value) => {
                return ValidationResult::fail(PHONE_MESSAGE)
            }
            FieldKind::Date => {
                if let Err(message) = self.check_date_of_birth(value) {
                    return ValidationResult::fail(message);
                }
            }
            _ => {}
        }

        if field.name == GPA && !is_valid_gpa(value) {
            return ValidationResult::fail(GPA_MESSAGE);
        }

        ValidationResult::pass()
    }

    /// Validates one field on the surface and renders or clears its inline
    /// error. Unknown names pass.
    pub fn validate_field<S: FormSurface + ?Sized>(
        &self,
        surface: &mut S,
        name: &str,
    ) -> ValidationResult {
        let Some(field) = surface.descriptor().field(name).cloned() else {
            return ValidationResult::pass();
        };
        let value = surface.field_value(name).unwrap_or_default();
        let result = self.validate(&field, &value);
        surface.render_error(field.name, result.message.as_deref());
        result
    }

    /// Validates every required field, rendering each verdict inline.
    /// Returns `true` iff all of them pass.
    pub fn validate_form<S: FormSurface + ?Sized>(&self, surface: &mut S) -> bool {
        self.validate_all(surface).is_empty()
    }

    /// Like [`Validator::validate_form`] but returns the failing
    /// `(field, message)` pairs in field order.
    pub fn validate_all<S: FormSurface + ?Sized>(
        &self,
        surface: &mut S,
    ) -> Vec<(&'static str, String)> {
        let required: Vec<&'static str> = surface
            .descriptor()
            .required_fields()
            .map(|field| field.name)
            .collect();

        let mut failures = Vec::new();
        for name in required {
            if let Some(message) = self.validate_field(&mut *surface, name).message {
                failures.push((name, message));
            }
        }
        failures
    }

    fn check_date_of_birth(&self, value: &str) -> Result<(), &'static str> {
        let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| DATE_MESSAGE)?;
        let latest = self
            .today
            .checked_sub_months(Months::new(12 * MINIMUM_AGE_YEARS))
            .unwrap_or(NaiveDate::MIN);
        if date > latest {
            return Err(MINIMUM_AGE_MESSAGE);
        }
        Ok(())
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

/// Spaces, hyphens and parentheses are formatting and are ignored.
pub fn is_valid_phone(value: &str) -> bool {
    let digits: String = value
        .chars()
        .filter(|ch| !(ch.is_whitespace() || matches!(ch, '-' | '(' | ')')))
        .collect();
    PHONE_PATTERN.is_match(&digits)
}

pub fn is_valid_gpa(value: &str) -> bool {
    match parse_leading_float(value) {
        Some(gpa) => (GPA_MIN..=GPA_MAX).contains(&gpa),
        None => false,
    }
}

/// Parses the longest numeric prefix of `value`, so `"3.5 weighted"` reads
/// as `3.5` and `"abc"` as nothing.
pub fn parse_leading_float(value: &str) -> Option<f64> {
    let trimmed = value.trim_start();
    let matched = LEADING_FLOAT.find(trimmed)?;
    matched.as_str().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::field::{student_form, DATE_OF_BIRTH, EMAIL, FIRST_NAME, PHONE};
    use crate::form::FormState;

    fn validator() -> Validator {
        Validator::new(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap())
    }

    fn field(name: &str) -> FieldDescriptor {
        student_form().field(name).cloned().unwrap()
    }

    #[test]
    fn required_fields_reject_blank_values() {
        let v = validator();
        for blank in ["", "   ", "\t\n"] {
            let result = v.validate(&field(FIRST_NAME), blank);
            assert!(!result.valid);
            assert_eq!(result.message.as_deref(), Some(REQUIRED_MESSAGE));
        }
    }

    #[test]
    fn required_check_runs_before_type_rule() {
        let result = validator().validate(&field(EMAIL), " ");
        assert_eq!(result.message.as_deref(), Some(REQUIRED_MESSAGE));
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@school.example.edu"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("bad"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email("a@@b.co"));
        assert!(!is_valid_email("@b.co"));

        let result = validator().validate(&field(EMAIL), "a@b");
        assert_eq!(result.message.as_deref(), Some(EMAIL_MESSAGE));
    }

    #[test]
    fn phone_formatting_is_ignored() {
        assert!(is_valid_phone("+1 (555) 123-4567"));
        assert!(is_valid_phone("5551234567"));
        assert!(!is_valid_phone("0555123456"));
        assert!(!is_valid_phone("+"));
        assert!(!is_valid_phone("555-CALL-NOW"));
        assert!(!is_valid_phone("12345678901234567"));

        let result = validator().validate(&field(PHONE), "12ab");
        assert_eq!(result.message.as_deref(), Some(PHONE_MESSAGE));
    }

    #[test]
    fn optional_fields_accept_empty_values() {
        let v = validator();
        assert!(v.validate(&field(PHONE), "").valid);
        assert!(v.validate(&field(GPA), "").valid);
    }

    #[test]
    fn gpa_bounds() {
        let v = validator();
        let gpa = field(GPA);
        assert!(v.validate(&gpa, "4.00").valid);
        assert!(v.validate(&gpa, "0").valid);
        assert!(v.validate(&gpa, "3.5 weighted").valid);
        assert!(!v.validate(&gpa, "4.01").valid);
        assert!(!v.validate(&gpa, "-0.1").valid);
        assert_eq!(
            v.validate(&gpa, "abc").message.as_deref(),
            Some(GPA_MESSAGE)
        );
    }

    #[test]
    fn leading_float_prefix() {
        assert_eq!(parse_leading_float("  2.75"), Some(2.75));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
        assert_eq!(parse_leading_float("3."), Some(3.0));
        assert_eq!(parse_leading_float("1e0x"), Some(1.0));
        assert_eq!(parse_leading_float("x1"), None);
    }

    #[test]
    fn date_of_birth_enforces_minimum_age() {
        let v = validator();
        let dob = field(DATE_OF_BIRTH);
        assert!(v.validate(&dob, "2012-06-15").valid);
        assert_eq!(
            v.validate(&dob, "2012-06-16").message.as_deref(),
            Some(MINIMUM_AGE_MESSAGE)
        );
        assert_eq!(
            v.validate(&dob, "15/06/2008").message.as_deref(),
            Some(DATE_MESSAGE)
        );
    }

    #[test]
    fn validate_form_renders_and_clears_errors() {
        let v = validator();
        let mut state = FormState::new(student_form());
        state.render_error(FIRST_NAME, Some("stale"));
        state.set_field_value(FIRST_NAME, "Jo");
        state.set_field_value(EMAIL, "nope");

        assert!(!v.validate_form(&mut state));
        assert_eq!(state.error(FIRST_NAME), None);
        assert_eq!(state.error(EMAIL), Some(EMAIL_MESSAGE));
        assert_eq!(state.error("lastName"), Some(REQUIRED_MESSAGE));
    }

    #[test]
    fn validate_form_skips_optional_fields() {
        let v = validator();
        let mut state = FormState::new(student_form());
        for (name, value) in [
            ("firstName", "Jo"),
            ("lastName", "Doe"),
            ("email", "jo@school.edu"),
            ("dateOfBirth", "2008-01-01"),
            ("studentId", "S-1"),
            ("school", "Central High"),
            ("grade", "10"),
            ("gpa", "9.9"),
        ] {
            state.set_field_value(name, value);
        }

        assert!(v.validate_form(&mut state));
        assert!(v.validate_all(&mut state).is_empty());
    }
}
