//! The delivery guard: a bounded membership set over event identifiers that have already triggered a
//! notification.
//!
//! Shopify retries a webhook whenever it does not get a timely 2xx response, and each retry would otherwise
//! send a duplicate WhatsApp message to a real customer. The guard remembers which event identifiers have
//! been handled, bounding its memory by evicting the oldest entries (strict FIFO by insertion order) in
//! batches once it reaches capacity. State is in-process only: a restart forgets everything, which trades a
//! small duplicate-message risk after redeploys for having no storage dependency at all.

use std::{
    collections::{HashSet, VecDeque},
    sync::{Mutex, PoisonError},
};

use log::*;

pub const DEFAULT_MAX_ITEMS: usize = 10_000;
pub const DEFAULT_EVICTION_BATCH: usize = 1_000;

#[derive(Debug, Clone, Copy)]
pub struct DedupConfig {
    /// Maximum number of identifiers held. `len() <= max_items` holds after every mutating call.
    pub max_items: usize,
    /// How many of the oldest identifiers are dropped in one go when the guard is full.
    pub eviction_batch: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self { max_items: DEFAULT_MAX_ITEMS, eviction_batch: DEFAULT_EVICTION_BATCH }
    }
}

/// A size-bounded set of already-notified event identifiers.
///
/// Identifiers are opaque strings; distinct event categories (orders vs abandoned checkouts) must each get
/// their own guard instance, since their identifier spaces can overlap numerically. All operations are total
/// and take `&self`; the interior mutex makes the check-and-mark sequence atomic across worker threads.
pub struct DeliveryGuard {
    config: DedupConfig,
    inner: Mutex<GuardInner>,
}

#[derive(Default)]
struct GuardInner {
    seen: HashSet<String>,
    // Insertion order of `seen`, oldest at the front. Drives FIFO eviction.
    order: VecDeque<String>,
}

impl DeliveryGuard {
    pub fn new(mut config: DedupConfig) -> Self {
        if config.max_items == 0 {
            warn!("🧮️ A delivery guard with zero capacity is useless. Using {DEFAULT_MAX_ITEMS} instead.");
            config.max_items = DEFAULT_MAX_ITEMS;
        }
        config.eviction_batch = config.eviction_batch.clamp(1, config.max_items);
        Self { config, inner: Mutex::new(GuardInner::default()) }
    }

    /// Has this event already triggered a notification? Pure membership test; no side effects.
    pub fn is_processed(&self, id: &str) -> bool {
        self.lock().seen.contains(id)
    }

    /// Record that a notification was dispatched for this event. Idempotent.
    pub fn mark_processed(&self, id: &str) {
        let mut inner = self.lock();
        Self::insert(&mut inner, self.config, id);
    }

    /// Atomically check membership and mark in one step.
    ///
    /// Returns `true` if the identifier was newly marked, `false` if it was already present. Handlers use
    /// this as the commit point before dispatching, so two concurrent retries of the same event can never
    /// both observe "not processed".
    pub fn mark_if_new(&self, id: &str) -> bool {
        let mut inner = self.lock();
        if inner.seen.contains(id) {
            return false;
        }
        Self::insert(&mut inner, self.config, id);
        true
    }

    pub fn len(&self) -> usize {
        self.lock().seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().seen.is_empty()
    }

    fn insert(inner: &mut GuardInner, config: DedupConfig, id: &str) {
        if inner.seen.contains(id) {
            return;
        }
        if inner.seen.len() >= config.max_items {
            debug!("🧮️ Delivery guard is at capacity ({}). Evicting the oldest {} entries.", config.max_items, config.eviction_batch);
            for _ in 0..config.eviction_batch {
                match inner.order.pop_front() {
                    Some(oldest) => {
                        inner.seen.remove(&oldest);
                    },
                    None => break,
                }
            }
        }
        inner.seen.insert(id.to_string());
        inner.order.push_back(id.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GuardInner> {
        // A poisoned lock means a handler panicked mid-insert; the set is still structurally valid.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod test {
    use super::{DedupConfig, DeliveryGuard};

    #[test]
    fn marking_is_idempotent() {
        let guard = DeliveryGuard::new(DedupConfig::default());
        assert!(!guard.is_processed("order-1"));
        guard.mark_processed("order-1");
        assert!(guard.is_processed("order-1"));
        guard.mark_processed("order-1");
        guard.mark_processed("order-1");
        assert!(guard.is_processed("order-1"));
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn mark_if_new_reports_the_first_caller_only() {
        let guard = DeliveryGuard::new(DedupConfig::default());
        assert!(guard.mark_if_new("chk-42"));
        assert!(!guard.mark_if_new("chk-42"));
        assert!(guard.is_processed("chk-42"));
    }

    #[test]
    fn size_never_exceeds_capacity() {
        let guard = DeliveryGuard::new(DedupConfig { max_items: 100, eviction_batch: 10 });
        for i in 0..1_000 {
            guard.mark_processed(&format!("id-{i}"));
            assert!(guard.len() <= 100, "guard grew to {} after {} inserts", guard.len(), i + 1);
        }
    }

    #[test]
    fn eviction_is_fifo_by_insertion_order() {
        let guard = DeliveryGuard::new(DedupConfig { max_items: 50, eviction_batch: 10 });
        for i in 0..50 {
            guard.mark_processed(&format!("id-{i}"));
        }
        // The 51st insert evicts exactly the 10 oldest entries.
        guard.mark_processed("id-50");
        for i in 0..10 {
            assert!(!guard.is_processed(&format!("id-{i}")), "id-{i} should have been evicted");
        }
        for i in 10..51 {
            assert!(guard.is_processed(&format!("id-{i}")), "id-{i} should still be present");
        }
        assert_eq!(guard.len(), 41);
    }

    #[test]
    fn eviction_batch_is_clamped_to_capacity() {
        let guard = DeliveryGuard::new(DedupConfig { max_items: 5, eviction_batch: 50 });
        for i in 0..6 {
            guard.mark_processed(&format!("id-{i}"));
        }
        // The whole set was evicted before the sixth insert; only the newest entry remains.
        assert_eq!(guard.len(), 1);
        assert!(guard.is_processed("id-5"));
    }
}
