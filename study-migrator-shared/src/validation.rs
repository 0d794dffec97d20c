//! Field validation for destination records.
//!
//! Every record written to the relational store implements [`Validate`]. The
//! rules mirror the constraints of the destination schema so a record that
//! would be rejected by the database is rejected here first, with the name of
//! the offending field.
use thiserror::Error;

/// A destination-side constraint violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("field `{field}` is required")]
    Required { field: &'static str },

    #[error("field `{field}` must be at most {max} characters (got {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("field `{field}` must be exactly {expected} characters (got {actual})")]
    WrongLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("field `{field}` has invalid value `{value}`")]
    InvalidChoice { field: &'static str, value: String },

    #[error("field `{field}` must not be negative (got {value})")]
    Negative { field: &'static str, value: i64 },

    #[error("{entity} with {field} `{value}` already exists")]
    Duplicate {
        entity: &'static str,
        field: &'static str,
        value: String,
    },
}

/// Implemented by every record that can be bulk-inserted.
pub trait Validate {
    /// Checks every field constraint, returning the first violation.
    fn validate(&self) -> Result<(), ValidationError>;
}

pub fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

pub fn max_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

pub fn exact_length(
    field: &'static str,
    value: &str,
    expected: usize,
) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual != expected {
        return Err(ValidationError::WrongLength {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

pub fn non_negative(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}

/// Required, and no longer than `max`.
pub fn required_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    required(field, value)?;
    max_length(field, value, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_blank() {
        assert_eq!(
            required("name", "   "),
            Err(ValidationError::Required { field: "name" })
        );
        assert!(required("name", "A").is_ok());
    }

    #[test]
    fn test_max_length_counts_chars_not_bytes() {
        assert!(max_length("name", "ééé", 3).is_ok());
        assert_eq!(
            max_length("name", "éééé", 3),
            Err(ValidationError::TooLong {
                field: "name",
                max: 3,
                actual: 4
            })
        );
    }

    #[test]
    fn test_exact_length() {
        assert!(exact_length("salt", "abcd", 4).is_ok());
        assert!(matches!(
            exact_length("salt", "abc", 4),
            Err(ValidationError::WrongLength { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_non_negative() {
        assert!(non_negative("gps_on_duration_seconds", 0).is_ok());
        assert!(non_negative("gps_on_duration_seconds", -1).is_err());
    }
}
