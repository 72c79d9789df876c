//! Validation of externally sourced record batches.
//!
//! Device exports and uploaded files arrive as loose JSON. Each element is
//! checked on its own: a record without a usable `date` cannot be given a
//! day-key, so it is set aside with a [`ValidationError`] and the rest of the
//! batch carries on.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::collection::ImportSummary;
use crate::models::{MetricSource, Timestamp};

/// Why one element of a batch was rejected. `index` is its batch position.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationError {
    #[error("record {index}: missing date")]
    MissingDate { index: usize },

    #[error("record {index}: invalid date '{value}'")]
    InvalidDate { index: usize, value: String },

    #[error("record {index}: {message}")]
    InvalidRecord { index: usize, message: String },
}

impl ValidationError {
    pub fn index(&self) -> usize {
        match self {
            ValidationError::MissingDate { index }
            | ValidationError::InvalidDate { index, .. }
            | ValidationError::InvalidRecord { index, .. } => *index,
        }
    }
}

/// Summary of a raw import plus the records that never reached the merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub summary: ImportSummary,
    pub rejected: Vec<ValidationError>,
    /// Distinct sources among the accepted records.
    pub sources: Vec<MetricSource>,
}

fn check_date(index: usize, record: &Value) -> Result<(), ValidationError> {
    match record.get("date") {
        None | Some(Value::Null) => Err(ValidationError::MissingDate { index }),
        Some(Value::String(s)) => s
            .parse::<Timestamp>()
            .map(|_| ())
            .map_err(|_| ValidationError::InvalidDate {
                index,
                value: s.clone(),
            }),
        Some(other) => Err(ValidationError::InvalidDate {
            index,
            value: other.to_string(),
        }),
    }
}

/// Splits a batch into typed records and rejections, preserving order.
pub fn validate_batch<R: DeserializeOwned>(
    values: Vec<Value>,
) -> (Vec<R>, Vec<ValidationError>) {
    let mut records = Vec::with_capacity(values.len());
    let mut rejected = Vec::new();

    for (index, value) in values.into_iter().enumerate() {
        if let Err(e) = check_date(index, &value) {
            rejected.push(e);
            continue;
        }
        match serde_json::from_value(value) {
            Ok(record) => records.push(record),
            Err(e) => rejected.push(ValidationError::InvalidRecord {
                index,
                message: e.to_string(),
            }),
        }
    }

    (records, rejected)
}

/// Reads a batch document: either a JSON array or an object with a
/// `records` array.
pub fn batch_from_json(text: &str) -> Result<Vec<Value>, serde_json::Error> {
    match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("records") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(serde::de::Error::custom(
                "expected a JSON array or an object with a \"records\" array",
            )),
        },
        _ => Err(serde::de::Error::custom(
            "expected a JSON array or an object with a \"records\" array",
        )),
    }
}
