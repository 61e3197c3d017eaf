//! The event bus.
//!
//! [`EventBus`] is a cheap `Clone` handle over a shared listener registry, so
//! producers and consumers receive the bus they should talk to instead of
//! reaching for a process-wide instance. Tests build as many isolated buses
//! as they like.
//!
//! Listeners are grouped by the raw pattern string they registered with.
//! An emit snapshots the matching listeners under the lock, releases it,
//! then calls them one by one, so listeners may subscribe, unsubscribe or
//! emit re-entrantly.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, error, trace};

use crate::errors::{BusError, Result};
use crate::event::BusEvent;
use crate::pattern::{Pattern, delivery_keys};

/// A bus subscriber.
///
/// Implemented for every `Fn(&BusEvent) -> Result<()>` closure.
pub trait Listener: Send + Sync {
    /// Handle one event. Errors are logged by the bus and go no further.
    fn on_event(&self, event: &BusEvent) -> Result<()>;
}

impl<F> Listener for F
where
    F: Fn(&BusEvent) -> Result<()> + Send + Sync,
{
    fn on_event(&self, event: &BusEvent) -> Result<()> {
        self(event)
    }
}

type ListenerId = u64;

struct Entry {
    id: ListenerId,
    listener: Arc<dyn Listener>,
}

#[derive(Default)]
struct Registry {
    next_id: ListenerId,
    /// Listeners keyed by raw pattern, in registration order.
    by_pattern: HashMap<String, Vec<Entry>>,
}

impl Registry {
    fn remove(&mut self, pattern: &str, id: ListenerId) -> bool {
        let Some(entries) = self.by_pattern.get_mut(pattern) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.id != id);
        let removed = entries.len() < before;
        if entries.is_empty() {
            let _ = self.by_pattern.remove(pattern);
        }
        removed
    }
}

/// One listener failure observed during an emit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerFailure {
    /// Pattern the failing listener was registered under.
    pub pattern: String,
    /// What went wrong.
    pub error: BusError,
}

/// Outcome of a single [`EventBus::emit`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Listener invocations that returned `Ok`.
    pub delivered: usize,
    /// Listener invocations that errored or panicked.
    pub failures: Vec<ListenerFailure>,
}

impl DeliveryReport {
    /// Total listener invocations.
    pub fn invoked(&self) -> usize {
        self.delivered + self.failures.len()
    }
}

/// Synchronous publish/subscribe hub.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` under `pattern`.
    ///
    /// `pattern` is an exact type, `*`, or `<namespace>.*`; see
    /// [`Pattern::parse`]. Nothing is validated beyond that.
    pub fn on<F>(&self, pattern: &str, listener: F) -> Subscription
    where
        F: Fn(&BusEvent) -> Result<()> + Send + Sync + 'static,
    {
        self.on_arc(pattern, Arc::new(listener))
    }

    /// Register an already shared listener, such as a struct implementing
    /// [`Listener`].
    pub fn on_arc(&self, pattern: &str, listener: Arc<dyn Listener>) -> Subscription {
        let mut registry = self.registry.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry
            .by_pattern
            .entry(pattern.to_string())
            .or_default()
            .push(Entry { id, listener });
        drop(registry);

        debug!(pattern, kind = ?Pattern::parse(pattern), "listener subscribed");

        Subscription {
            registry: Arc::downgrade(&self.registry),
            pattern: pattern.to_string(),
            id,
            active: AtomicBool::new(true),
        }
    }

    /// Deliver `event` to every matching listener before returning.
    ///
    /// Order: exact-type listeners, then namespace wildcards from the most
    /// specific prefix outward, then `*`. Within a pattern, registration
    /// order. A listener fault never stops delivery to the rest.
    pub fn emit(&self, mut event: BusEvent) -> DeliveryReport {
        if event.timestamp.is_none() {
            event.timestamp = Some(Utc::now());
        }

        let targets: Vec<(String, Arc<dyn Listener>)> = {
            let registry = self.registry.lock();
            delivery_keys(&event.event_type)
                .into_iter()
                .filter_map(|key| registry.by_pattern.get(&key).map(|entries| (key, entries)))
                .flat_map(|(key, entries)| {
                    entries
                        .iter()
                        .map(move |e| (key.clone(), Arc::clone(&e.listener)))
                })
                .collect()
        };

        trace!(
            event_type = %event.event_type,
            source = %event.source,
            listeners = targets.len(),
            "emitting"
        );

        let mut report = DeliveryReport::default();
        for (pattern, listener) in targets {
            match invoke(listener.as_ref(), &event) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    error!(
                        pattern = %pattern,
                        event_type = %event.event_type,
                        error = %err,
                        "event listener failed"
                    );
                    report.failures.push(ListenerFailure {
                        pattern,
                        error: err,
                    });
                }
            }
        }
        report
    }

    /// Number of listeners registered under exactly `pattern`.
    ///
    /// Wildcard registrations are not folded in: `listener_count("map.x")`
    /// ignores listeners on `map.*`.
    pub fn listener_count(&self, pattern: &str) -> usize {
        self.registry
            .lock()
            .by_pattern
            .get(pattern)
            .map_or(0, Vec::len)
    }

    /// Number of distinct patterns with at least one listener.
    pub fn pattern_count(&self) -> usize {
        self.registry.lock().by_pattern.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("pattern_count", &self.pattern_count())
            .finish()
    }
}

fn invoke(listener: &dyn Listener, event: &BusEvent) -> Result<()> {
    match catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
        Ok(result) => result,
        Err(panic) => Err(BusError::ListenerPanicked(panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Handle returned by [`EventBus::on`].
///
/// Dropping the handle does not unsubscribe; call [`unsubscribe`](Self::unsubscribe).
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    pattern: String,
    id: ListenerId,
    active: AtomicBool,
}

impl Subscription {
    /// Remove the listener. Safe to call any number of times; only the first
    /// call has an effect. Returns whether this call removed it.
    pub fn unsubscribe(&self) -> bool {
        if !self.active.swap(false, Ordering::AcqRel) {
            return false;
        }
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let removed = registry.lock().remove(&self.pattern, self.id);
        if removed {
            debug!(pattern = %self.pattern, "listener unsubscribed");
        }
        removed
    }

    /// Whether [`unsubscribe`](Self::unsubscribe) has not been called yet.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("pattern", &self.pattern)
            .field("active", &self.is_active())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use mapchat_core::logging::capture_logs;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn event(event_type: &str) -> BusEvent {
        BusEvent::new(event_type, "test", json!({}))
    }

    fn counter(bus: &EventBus, pattern: &str) -> (Arc<AtomicUsize>, Subscription) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let sub = bus.on(pattern, move |_: &BusEvent| {
            let _ = h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (hits, sub)
    }

    fn recorder(bus: &EventBus, pattern: &str, log: &Arc<Mutex<Vec<String>>>) -> Subscription {
        let log = Arc::clone(log);
        let tag = pattern.to_string();
        bus.on(pattern, move |_: &BusEvent| {
            log.lock().push(tag.clone());
            Ok(())
        })
    }

    // ── Routing ─────────────────────────────────────────────────────

    #[test]
    fn exact_listener_receives_matching_type_only() {
        let bus = EventBus::new();
        let (hits, _sub) = counter(&bus, "map.tile_created");
        let _ = bus.emit(event("map.tile_created"));
        let _ = bus.emit(event("map.tile_deleted"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn namespace_wildcard_routes_by_prefix() {
        let bus = EventBus::new();
        let (hits, _sub) = counter(&bus, "map.*");
        let _ = bus.emit(event("map.tile_created"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        let _ = bus.emit(event("auth.login"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn root_wildcard_receives_everything() {
        let bus = EventBus::new();
        let (hits, _sub) = counter(&bus, "*");
        for t in ["map.tile_created", "auth.login", "error.occurred", "flat"] {
            let _ = bus.emit(event(t));
        }
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn every_namespace_level_matches() {
        let bus = EventBus::new();
        let (a, _s1) = counter(&bus, "map.*");
        let (b, _s2) = counter(&bus, "map.tiles.*");
        let (c, _s3) = counter(&bus, "map.tiles.swap.*");
        let (d, _s4) = counter(&bus, "map.tiles.swap.completed.*");
        let _ = bus.emit(event("map.tiles.swap.completed"));
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
        assert_eq!(c.load(Ordering::SeqCst), 1);
        assert_eq!(d.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn delivery_order_exact_then_specific_wildcards_then_root() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _s1 = recorder(&bus, "*", &log);
        let _s2 = recorder(&bus, "map.*", &log);
        let _s3 = recorder(&bus, "map.tiles.*", &log);
        let _s4 = recorder(&bus, "map.tiles.moved", &log);

        let report = bus.emit(event("map.tiles.moved"));
        assert_eq!(report.delivered, 4);
        assert_eq!(
            *log.lock(),
            vec!["map.tiles.moved", "map.tiles.*", "map.*", "*"]
        );
    }

    #[test]
    fn same_listener_under_two_patterns_runs_twice() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let shared: Arc<dyn Listener> = {
            let h = Arc::clone(&hits);
            Arc::new(move |_: &BusEvent| -> Result<()> {
                let _ = h.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        };
        let _a = bus.on_arc("map.*", Arc::clone(&shared));
        let _b = bus.on_arc("*", shared);
        let _ = bus.emit(event("map.tile_created"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn wildcard_spelled_type_reaches_one_registration_once() {
        let bus = EventBus::new();
        let (hits, _sub) = counter(&bus, "map.*");
        let report = bus.emit(event("map.*"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(report.delivered, 1);
    }

    #[test]
    fn emit_stamps_missing_timestamp() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(None));
        let s = Arc::clone(&seen);
        let _sub = bus.on("auth.login", move |e: &BusEvent| {
            *s.lock() = e.timestamp;
            Ok(())
        });
        let _ = bus.emit(event("auth.login"));
        assert!(seen.lock().is_some());
    }

    #[test]
    fn emit_keeps_explicit_timestamp() {
        let bus = EventBus::new();
        let ts = chrono::DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let seen = Arc::new(Mutex::new(None));
        let s = Arc::clone(&seen);
        let _sub = bus.on("*", move |e: &BusEvent| {
            *s.lock() = e.timestamp;
            Ok(())
        });
        let _ = bus.emit(event("x").with_timestamp(ts));
        assert_eq!(*seen.lock(), Some(ts));
    }

    #[test]
    fn emit_without_listeners_is_a_noop() {
        let bus = EventBus::new();
        let report = bus.emit(event("nobody.listens"));
        assert_eq!(report, DeliveryReport::default());
    }

    // ── Fault isolation ─────────────────────────────────────────────

    #[test]
    fn erroring_listener_does_not_block_others() {
        let (logs, _guard) = capture_logs();
        let bus = EventBus::new();
        let _bad = bus.on("map.tile_created", |_: &BusEvent| {
            Err(BusError::ListenerFailed("boom".into()))
        });
        let (hits, _good) = counter(&bus, "map.tile_created");
        let (wild, _w) = counter(&bus, "map.*");

        let report = bus.emit(event("map.tile_created"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(wild.load(Ordering::SeqCst), 1);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].pattern, "map.tile_created");
        assert!(logs.has_event(tracing::Level::ERROR, "event listener failed"));
    }

    #[test]
    fn panicking_listener_is_caught() {
        let bus = EventBus::new();
        let _bad = bus.on("*", |_: &BusEvent| -> Result<()> { panic!("listener exploded") });
        let (hits, _good) = counter(&bus, "*");

        let report = bus.emit(event("error.occurred"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_matches!(
            &report.failures[0].error,
            BusError::ListenerPanicked(msg) if msg.contains("listener exploded")
        );
        assert_eq!(report.invoked(), 2);
    }

    // ── Subscription lifecycle ──────────────────────────────────────

    #[test]
    fn unsubscribe_stops_delivery_and_is_idempotent() {
        let bus = EventBus::new();
        let (hits, sub) = counter(&bus, "auth.login");
        assert!(sub.unsubscribe());
        assert!(!sub.unsubscribe());
        assert!(!sub.is_active());
        let _ = bus.emit(event("auth.login"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribe_removes_only_its_own_listener() {
        let bus = EventBus::new();
        let (a, sub_a) = counter(&bus, "auth.login");
        let (b, _sub_b) = counter(&bus, "auth.login");
        let _ = sub_a.unsubscribe();
        let _ = sub_a.unsubscribe();
        assert_eq!(bus.listener_count("auth.login"), 1);
        let _ = bus.emit(event("auth.login"));
        assert_eq!(a.load(Ordering::SeqCst), 0);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_pattern_sets_are_pruned() {
        let bus = EventBus::new();
        for i in 0..50 {
            let sub = bus.on(&format!("oneoff.{i}"), |_: &BusEvent| Ok(()));
            let _ = sub.unsubscribe();
        }
        assert_eq!(bus.pattern_count(), 0);
    }

    #[test]
    fn listener_count_is_per_exact_pattern() {
        let bus = EventBus::new();
        let _a = bus.on("map.tile_created", |_: &BusEvent| Ok(()));
        let _b = bus.on("map.tile_created", |_: &BusEvent| Ok(()));
        let _c = bus.on("map.*", |_: &BusEvent| Ok(()));
        assert_eq!(bus.listener_count("map.tile_created"), 2);
        assert_eq!(bus.listener_count("map.*"), 1);
        assert_eq!(bus.listener_count("auth.login"), 0);
    }

    #[test]
    fn unsubscribe_after_bus_dropped_is_harmless() {
        let bus = EventBus::new();
        let sub = bus.on("x", |_: &BusEvent| Ok(()));
        drop(bus);
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn listener_may_unsubscribe_itself_during_emit() {
        let bus = EventBus::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let hits = Arc::new(AtomicUsize::new(0));
        let (s, h) = (Arc::clone(&slot), Arc::clone(&hits));
        let sub = bus.on("once", move |_: &BusEvent| {
            let _ = h.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = s.lock().as_ref() {
                let _ = sub.unsubscribe();
            }
            Ok(())
        });
        *slot.lock() = Some(sub);

        let _ = bus.emit(event("once"));
        let _ = bus.emit(event("once"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count("once"), 0);
    }

    #[test]
    fn clones_share_the_registry() {
        let bus = EventBus::new();
        let other = bus.clone();
        let (hits, _sub) = counter(&other, "map.*");
        let _ = bus.emit(event("map.navigation"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn separate_buses_are_isolated() {
        let a = EventBus::new();
        let b = EventBus::new();
        let (hits, _sub) = counter(&a, "*");
        let _ = b.emit(event("map.navigation"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
