#![forbid(unsafe_code)]

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaVersion(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MonotonicTimeNs(pub u64);

impl MonotonicTimeNs {
    pub fn from_ms(ms: u64) -> Self {
        Self(ms.saturating_mul(1_000_000))
    }

    pub fn saturating_add_ms(self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms.saturating_mul(1_000_000)))
    }

    /// Whole milliseconds elapsed since `earlier`; zero if `earlier` is in the future.
    pub fn ms_since(self, earlier: MonotonicTimeNs) -> u64 {
        self.0.saturating_sub(earlier.0) / 1_000_000
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContractViolation {
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
    InvalidRange {
        field: &'static str,
        min: f64,
        max: f64,
        got: f64,
    },
    NotFinite {
        field: &'static str,
    },
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { field, reason } => write!(f, "{field}: {reason}"),
            Self::InvalidRange {
                field,
                min,
                max,
                got,
            } => write!(f, "{field}: {got} outside [{min}, {max}]"),
            Self::NotFinite { field } => write!(f, "{field}: must be finite"),
        }
    }
}

impl std::error::Error for ContractViolation {}

pub trait Validate {
    fn validate(&self) -> Result<(), ContractViolation>;
}

pub(crate) fn validate_text(
    field: &'static str,
    value: &str,
    max_len: usize,
) -> Result<(), ContractViolation> {
    if value.trim().is_empty() {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must not be empty",
        });
    }
    if value.len() > max_len {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "exceeds max length",
        });
    }
    if value.contains(['\n', '\r']) {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must be a single line",
        });
    }
    Ok(())
}

pub(crate) fn validate_probability(field: &'static str, p: f64) -> Result<(), ContractViolation> {
    if !p.is_finite() {
        return Err(ContractViolation::NotFinite { field });
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(ContractViolation::InvalidRange {
            field,
            min: 0.0,
            max: 1.0,
            got: p,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ms_since_saturates_when_earlier_is_later() {
        let a = MonotonicTimeNs::from_ms(10);
        let b = MonotonicTimeNs::from_ms(25);
        assert_eq!(b.ms_since(a), 15);
        assert_eq!(a.ms_since(b), 0);
    }

    #[test]
    fn probability_rejects_out_of_range_and_nan() {
        assert!(validate_probability("p", 0.5).is_ok());
        assert!(matches!(
            validate_probability("p", 1.5),
            Err(ContractViolation::InvalidRange { field: "p", .. })
        ));
        assert_eq!(
            validate_probability("p", f64::NAN),
            Err(ContractViolation::NotFinite { field: "p" })
        );
    }

    #[test]
    fn text_must_be_single_non_empty_line() {
        assert!(validate_text("f", "abc", 8).is_ok());
        assert!(validate_text("f", "  ", 8).is_err());
        assert!(validate_text("f", "a\nb", 8).is_err());
        assert!(validate_text("f", "abcdefghi", 8).is_err());
    }
}
