//! Field validation
//!
//! Columns declare a [`Validator`] built from atomic [`Check`]s. Running the
//! validators over a model yields a flat list of [`FieldError`]s; an empty
//! list means the row is valid. Validation never fails an operation, it only
//! annotates rows and gates sync.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::column::{Column, flatten_data_columns};
use crate::model::GridModel;
use crate::types::Value;

/// A validation failure attached to one field of a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that has the error
    pub field: String,
    /// Error message
    pub error: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            error: error.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.error)
    }
}

/// User-supplied check over a present value
pub type CustomCheckFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// A single atomic rule producing at most one message
#[derive(Clone)]
pub enum Check {
    /// Fails only when the value is absent or NULL
    Required,
    Min(f64),
    Max(f64),
    MinLen(usize),
    MaxLen(usize),
    Before(NaiveDate),
    After(NaiveDate),
    Custom { name: String, check: CustomCheckFn },
}

impl Check {
    pub fn custom(
        name: impl Into<String>,
        check: impl Fn(&Value) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Check::Custom {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Run the check against a possibly-absent value.
    ///
    /// Every rule except `Required` passes when the value is absent, so
    /// optional fields only need `Required` when they are in fact required.
    pub fn run(&self, value: Option<&Value>) -> Option<String> {
        let present = value.filter(|v| !v.is_null());

        if let Check::Required = self {
            return match present {
                Some(_) => None,
                None => Some("Required".to_string()),
            };
        }

        let value = present?;
        match self {
            Check::Required => None,
            Check::Min(min) => match value.as_f64() {
                Some(n) if n < *min => Some(format!("Must be at least {}", min)),
                Some(_) => None,
                None => Some("Must be a number".to_string()),
            },
            Check::Max(max) => match value.as_f64() {
                Some(n) if n > *max => Some(format!("Must be at most {}", max)),
                Some(_) => None,
                None => Some("Must be a number".to_string()),
            },
            Check::MinLen(min) => {
                let len = text_len(value);
                (len < *min).then(|| format!("Must be at least {} characters", min))
            }
            Check::MaxLen(max) => {
                let len = text_len(value);
                (len > *max).then(|| format!("Must be at most {} characters", max))
            }
            Check::Before(bound) => match value.as_date() {
                Some(d) if d > *bound => Some(format!("Must be before {}", bound.format("%Y-%m-%d"))),
                Some(_) => None,
                None => Some("Must be a valid date".to_string()),
            },
            Check::After(bound) => match value.as_date() {
                Some(d) if d < *bound => Some(format!("Must be after {}", bound.format("%Y-%m-%d"))),
                Some(_) => None,
                None => Some("Must be a valid date".to_string()),
            },
            Check::Custom { check, .. } => check(value),
        }
    }
}

fn text_len(value: &Value) -> usize {
    match value {
        Value::String(s) => s.chars().count(),
        other => other.to_string().chars().count(),
    }
}

impl std::fmt::Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Check::Required => write!(f, "Required"),
            Check::Min(n) => write!(f, "Min({})", n),
            Check::Max(n) => write!(f, "Max({})", n),
            Check::MinLen(n) => write!(f, "MinLen({})", n),
            Check::MaxLen(n) => write!(f, "MaxLen({})", n),
            Check::Before(d) => write!(f, "Before({})", d),
            Check::After(d) => write!(f, "After({})", d),
            Check::Custom { name, .. } => write!(f, "Custom({})", name),
        }
    }
}

/// An ordered set of checks attached to a data column
#[derive(Debug, Clone, Default)]
pub struct Validator {
    checks: Vec<Check>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(self) -> Self {
        self.check(Check::Required)
    }

    pub fn min(self, n: f64) -> Self {
        self.check(Check::Min(n))
    }

    pub fn max(self, n: f64) -> Self {
        self.check(Check::Max(n))
    }

    pub fn min_len(self, n: usize) -> Self {
        self.check(Check::MinLen(n))
    }

    pub fn max_len(self, n: usize) -> Self {
        self.check(Check::MaxLen(n))
    }

    pub fn before(self, date: NaiveDate) -> Self {
        self.check(Check::Before(date))
    }

    pub fn after(self, date: NaiveDate) -> Self {
        self.check(Check::After(date))
    }

    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Run every check against `field` of `model`
    pub fn validate<M: GridModel>(&self, model: &M, field: &str) -> Vec<FieldError> {
        let value = model.get(field);
        self.checks
            .iter()
            .filter_map(|check| check.run(value.as_ref()))
            .map(|error| FieldError::new(field, error))
            .collect()
    }
}

/// Validate a model against every data column that declares a validator
pub fn validate_model<M: GridModel>(model: &M, columns: &[Column]) -> Vec<FieldError> {
    flatten_data_columns(columns)
        .into_iter()
        .filter_map(|col| col.validator.as_ref().map(|v| v.validate(model, &col.field)))
        .flatten()
        .collect()
}
