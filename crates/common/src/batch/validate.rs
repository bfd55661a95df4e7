use crate::batch::{BatchEnvelope, BatchItem, RawBatch};
use crate::garde::{StructureError, validate_struct};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchValidationError {
    #[error("invalid batch envelope: {0}")]
    InvalidEnvelope(#[from] StructureError),
}

/// Structural validation of a raw batch: the item collection must be
/// non-empty and every item must carry an identifier and an attribute map.
///
/// A structurally invalid batch is rejected whole; the caller is expected to
/// report every raw item identifier as failed, since no safe partial
/// interpretation exists. An attribute map that is present but missing the
/// selector attribute is not a structural failure and passes through here.
pub fn validate_batch(raw: RawBatch) -> Result<BatchEnvelope, BatchValidationError> {
    validate_struct(&raw)?;

    let items = raw
        .items
        .into_iter()
        .map(|item| BatchItem {
            id: item.id,
            attributes: item.attributes.unwrap_or_default(),
            payload: item.payload,
        })
        .collect();

    Ok(BatchEnvelope::new(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::RawBatchItem;
    use std::collections::BTreeMap;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_valid_batch_passes() {
        let raw = RawBatch::new(vec![
            RawBatchItem::new("1", Some(attrs(&[("event", "task_created")])), "{}"),
            RawBatchItem::new("2", Some(attrs(&[("event", "task_deleted")])), "{}"),
        ]);

        let envelope = validate_batch(raw).unwrap();

        assert_eq!(envelope.len(), 2);
        assert_eq!(envelope.items()[0].id, "1");
        assert_eq!(
            envelope.items()[0].attributes.get("event"),
            Some(&"task_created".to_string())
        );
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let result = validate_batch(RawBatch::default());
        assert!(matches!(
            result,
            Err(BatchValidationError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn test_item_without_attribute_map_fails_the_whole_batch() {
        let raw = RawBatch::new(vec![
            RawBatchItem::new("1", Some(attrs(&[("event", "task_created")])), "{}"),
            RawBatchItem::new("2", None, "{}"),
        ]);

        let result = validate_batch(raw);
        assert!(matches!(
            result,
            Err(BatchValidationError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn test_item_with_empty_id_fails_the_whole_batch() {
        let raw = RawBatch::new(vec![RawBatchItem::new(
            "",
            Some(attrs(&[("event", "task_created")])),
            "{}",
        )]);

        let result = validate_batch(raw);
        assert!(matches!(
            result,
            Err(BatchValidationError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn test_missing_selector_attribute_is_not_structural() {
        // The map is present but carries no selector; that failure belongs to
        // the single item at dispatch time, not to the envelope.
        let raw = RawBatch::new(vec![RawBatchItem::new(
            "1",
            Some(attrs(&[("source", "api")])),
            "{}",
        )]);

        assert!(validate_batch(raw).is_ok());
    }

    #[test]
    fn test_raw_item_ids_cover_every_item() {
        let raw = RawBatch::new(vec![
            RawBatchItem::new("a", None, ""),
            RawBatchItem::new("b", Some(BTreeMap::new()), ""),
        ]);

        assert_eq!(raw.item_ids(), vec!["a".to_string(), "b".to_string()]);
    }
}
