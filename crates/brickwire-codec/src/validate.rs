//! Precondition guards run before any bytes are built.

use std::fmt::{Debug, Display};
use std::ops::RangeInclusive;

/// A caller-supplied value was rejected before encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The value lies outside its declared range.
    #[error("{name} should be between {min} and {max} (got {value})")]
    OutOfRange {
        name: &'static str,
        value: String,
        min: String,
        max: String,
    },

    /// The value is not one of the declared constants.
    #[error("{name} should be one of {allowed} (got {value})")]
    NotAMember {
        name: &'static str,
        value: String,
        allowed: String,
    },

    /// Two options were given where exactly one is allowed, or neither was.
    #[error("specify {first} or {second} (but not both)")]
    Exclusive {
        first: &'static str,
        second: &'static str,
    },

    /// The request is not valid for this target.
    #[error("invalid invocation: {0}")]
    Invocation(String),
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Reject `value` unless it lies in `range`. Returns the value on success.
pub fn validate_range<T>(value: T, name: &'static str, range: RangeInclusive<T>) -> Result<T>
where
    T: PartialOrd + Display,
{
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::OutOfRange {
            name,
            value: value.to_string(),
            min: range.start().to_string(),
            max: range.end().to_string(),
        })
    }
}

/// Reject `value` unless it equals one of `allowed`.
pub fn validate_member<T>(value: T, name: &'static str, allowed: &[T]) -> Result<T>
where
    T: PartialEq + Debug,
{
    if allowed.contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::NotAMember {
            name,
            value: format!("{value:?}"),
            allowed: format!("{allowed:?}"),
        })
    }
}

/// Require exactly one of two optional settings.
pub fn validate_exclusive<A, B>(
    first: (&'static str, &Option<A>),
    second: (&'static str, &Option<B>),
) -> Result<()> {
    if first.1.is_some() == second.1.is_some() {
        return Err(ValidationError::Exclusive {
            first: first.0,
            second: second.0,
        });
    }
    Ok(())
}
