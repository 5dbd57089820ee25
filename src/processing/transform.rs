//! Ordered record transforms applied during decoding.

use std::fmt;
use std::sync::Arc;

use crate::types::Record;

/// A record-rewriting function. It may add, rename or drop keys.
pub type Transform = Arc<dyn Fn(Record) -> Record + Send + Sync>;

/// Append-only, ordered list of [`Transform`]s.
///
/// [`Self::apply`] threads a record through every transform in registration order: each
/// transform sees the previous one's output, not the originally decoded record.
#[derive(Clone, Default)]
pub struct TransformChain {
    transforms: Vec<Transform>,
}

impl TransformChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `transform` to the end of the chain.
    pub fn register<F>(&mut self, transform: F)
    where
        F: Fn(Record) -> Record + Send + Sync + 'static,
    {
        self.transforms.push(Arc::new(transform));
    }

    /// Run `record` through the chain.
    pub fn apply(&self, record: Record) -> Record {
        self.transforms.iter().fold(record, |acc, t| t(acc))
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl fmt::Debug for TransformChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformChain")
            .field("transforms_len", &self.transforms.len())
            .finish()
    }
}
