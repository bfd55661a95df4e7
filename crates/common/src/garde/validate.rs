//! Garde validation utilities.

use garde::{Report, Validate};
use thiserror::Error;

/// Structural validation failure carrying the formatted field report.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StructureError(pub String);

/// Run garde validation and fold the report into a `StructureError`.
pub fn validate_struct<T>(value: &T) -> Result<(), StructureError>
where
    T: Validate,
    T::Context: Default,
{
    value
        .validate()
        .map_err(|report| StructureError(format_validation_errors(&report)))
}

/// Format validation errors from a garde `Report` into a human-readable string.
fn format_validation_errors(report: &Report) -> String {
    report
        .iter()
        .map(|(path, error)| {
            if path.to_string().is_empty() {
                error.message().to_string()
            } else {
                format!("{}: {}", path, error.message())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
