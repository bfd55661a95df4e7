use bytes::Bytes;
use garde::Validate;
use std::collections::BTreeMap;

/// One queue delivery as handed to the worker, before validation.
///
/// `id` is queue-assigned, opaque, and unique within the batch; it is used
/// only for correlation and redelivery. `attributes` is `None` when the
/// delivery carried no attribute map at all.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct RawBatchItem {
    #[garde(length(min = 1))]
    pub id: String,
    #[garde(custom(attributes_present))]
    pub attributes: Option<BTreeMap<String, String>>,
    #[garde(skip)]
    pub payload: Bytes,
}

impl RawBatchItem {
    pub fn new(
        id: impl Into<String>,
        attributes: Option<BTreeMap<String, String>>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            id: id.into(),
            attributes,
            payload: payload.into(),
        }
    }
}

fn attributes_present(
    attributes: &Option<BTreeMap<String, String>>,
    _context: &(),
) -> garde::Result {
    if attributes.is_some() {
        Ok(())
    } else {
        Err(garde::Error::new("attribute map is missing"))
    }
}

/// A batch exactly as delivered by the queue boundary, unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct RawBatch {
    #[garde(length(min = 1), dive)]
    pub items: Vec<RawBatchItem>,
}

impl RawBatch {
    pub fn new(items: Vec<RawBatchItem>) -> Self {
        Self { items }
    }

    /// Identifiers of every item present in the raw input, valid or not.
    pub fn item_ids(&self) -> Vec<String> {
        self.items.iter().map(|item| item.id.clone()).collect()
    }
}

/// One item of a validated batch. The attribute map is guaranteed present;
/// whether it contains a usable action selector is decided per item at
/// dispatch time.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    pub id: String,
    pub attributes: BTreeMap<String, String>,
    pub payload: Bytes,
}

/// A batch that passed structural validation: non-empty, every item carrying
/// an identifier and an attribute map. Read-only from here on.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEnvelope {
    items: Vec<BatchItem>,
}

impl BatchEnvelope {
    pub(crate) fn new(items: Vec<BatchItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<BatchItem> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
