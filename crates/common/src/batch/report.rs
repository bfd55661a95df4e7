use crate::batch::ItemOutcome;
use serde::Serialize;
use std::collections::BTreeSet;

/// Redelivery report returned to the queue boundary.
///
/// Identifiers in the set are redelivered; identifiers absent from it are
/// implicitly acknowledged as processed. An empty report means the whole
/// batch succeeded. Serializes to the broker shape
/// `{"failedItemIds": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReport {
    pub failed_item_ids: Vec<String>,
}

impl FailureReport {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Collect the identifiers of failed outcomes. Pure and total over any
    /// outcome collection, including the empty one.
    pub fn from_outcomes(outcomes: &[ItemOutcome]) -> Self {
        let failed: BTreeSet<String> = outcomes
            .iter()
            .filter(|outcome| !outcome.is_success())
            .map(|outcome| outcome.item_id.clone())
            .collect();
        Self {
            failed_item_ids: failed.into_iter().collect(),
        }
    }

    /// Report that fails every given identifier. Used when the envelope
    /// itself is structurally invalid and no safe partial interpretation of
    /// the batch exists.
    pub fn all_failed<I>(item_ids: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let failed: BTreeSet<String> = item_ids.into_iter().collect();
        Self {
            failed_item_ids: failed.into_iter().collect(),
        }
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.failed_item_ids.iter().any(|id| id == item_id)
    }

    pub fn is_empty(&self) -> bool {
        self.failed_item_ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failed_item_ids.len()
    }
}
