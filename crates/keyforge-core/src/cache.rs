//! Compiled-evaluator cache
//!
//! One slot per call site. The map only ever hands out the slot; compilation
//! runs inside the slot's `OnceLock`, outside the map's shard lock, so racing
//! first callers block on the in-flight compile and all observe its result.
//! Failures are stored like successes.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::errors::Result;
use crate::evaluator::CompiledEvaluator;

/// Identity of a call site
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SiteKey {
    /// Method plus the template declared on it, within the namespace of the
    /// wrapper compiling it
    Single {
        namespace: String,
        method_id: String,
        template: String,
    },
    /// Method plus the identity of the attribute carrying several templates
    Multi { method_id: String, attribute: String },
}

type Slot = Arc<OnceLock<Result<Arc<CompiledEvaluator>>>>;

#[derive(Debug, Default)]
pub struct EvaluatorCache {
    slots: DashMap<SiteKey, Slot>,
}

impl EvaluatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached result for `key`, running `compile` on first use only
    ///
    /// # Errors
    ///
    /// The error `compile` returned the first time, cloned.
    pub fn get_or_compile<F>(&self, key: SiteKey, compile: F) -> Result<Arc<CompiledEvaluator>>
    where
        F: FnOnce() -> Result<CompiledEvaluator>,
    {
        let slot = self.slot(key);
        slot.get_or_init(|| compile().map(Arc::new)).clone()
    }

    /// Whether `key` has a published result
    pub fn contains(&self, key: &SiteKey) -> bool {
        self.slots
            .get(key)
            .map(|slot| slot.get().is_some())
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, key: SiteKey) -> Slot {
        if let Some(slot) = self.slots.get(&key) {
            return slot.value().clone();
        }
        self.slots.entry(key).or_default().value().clone()
    }
}
