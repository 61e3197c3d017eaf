//! Chat session: the read interface the UI holds on to.
//!
//! A [`ChatSession`] owns the event log and keeps the derived
//! [`ChatSnapshot`] current. It subscribes itself to the bus for `map.*`,
//! `auth.*` and `error.*` events, translates them through
//! [`translate`](crate::ingest::translate), and appends the result. Callers
//! can also [`dispatch`](ChatSession::dispatch) chat events directly.
//!
//! Every log change re-derives the message timeline from the full log with
//! fresh settings and updates the widget lifecycle from the new event. The
//! new snapshot is published on a `tokio::sync::watch` channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use mapchat_bus::{BusError, BusEvent, EventBus, Subscription};
use mapchat_events::{
    ChatEvent, EventFactory, EventLog, LifecycleTable, Message, PendingEvent,
    WELCOME_MESSAGE_ID, Widget, derive_messages,
};
use mapchat_settings::SettingsSource;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::errors::{IngestError, Result, SessionError};
use crate::ingest::{INGEST_PATTERNS, translate};

/// Derived state of one log version.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSnapshot {
    /// The log the projections were derived from.
    pub log: EventLog,
    /// Message timeline, in log order.
    pub visible_messages: Vec<Message>,
    /// Active widgets, most recent first.
    pub active_widgets: Vec<Widget>,
}

struct SessionState {
    log: EventLog,
    table: LifecycleTable,
}

struct SessionInner {
    bus: EventBus,
    settings: Arc<dyn SettingsSource>,
    factory: EventFactory,
    state: Mutex<SessionState>,
    snapshot_tx: watch::Sender<Arc<ChatSnapshot>>,
    closed: AtomicBool,
}

impl SessionInner {
    /// Append a complete event and publish the new snapshot.
    fn commit(&self, event: ChatEvent) -> Arc<ChatSnapshot> {
        let mut state = self.state.lock();
        let cleared = event.is_clear();
        let position = state.log.len();
        let (event_id, event_type) = (event.id.clone(), event.type_name());

        if !cleared {
            state.table.apply(position, &event);
        }
        state.log = state.log.append(event);
        if cleared {
            state.table = LifecycleTable::replay(state.log.events());
        }

        let snapshot = Arc::new(self.derive(&state));
        debug!(
            event_id = %event_id,
            event_type,
            log_len = state.log.len(),
            widgets = snapshot.active_widgets.len(),
            "chat event committed"
        );
        let _ = self.snapshot_tx.send_replace(Arc::clone(&snapshot));
        snapshot
    }

    fn derive(&self, state: &SessionState) -> ChatSnapshot {
        let settings = self.settings.snapshot();
        ChatSnapshot {
            log: state.log.clone(),
            visible_messages: derive_messages(state.log.events(), &settings),
            active_widgets: state.table.active_widgets(),
        }
    }

    fn dispatch(&self, pending: PendingEvent) -> Result<Arc<ChatSnapshot>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SessionError::Closed);
        }
        Ok(self.commit(self.factory.normalize(pending)))
    }
}

/// Owns the chat log of one map session and its derived state.
///
/// Dropping the session detaches it from the bus.
pub struct ChatSession {
    inner: Arc<SessionInner>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl ChatSession {
    /// Create a session with an empty log and attach it to `bus`.
    pub fn new(bus: EventBus, settings: impl SettingsSource + 'static) -> Self {
        Self::with_factory(bus, settings, EventFactory::new())
    }

    /// Like [`new`](Self::new), with a custom event factory (e.g. a fixed
    /// clock in tests).
    pub fn with_factory(
        bus: EventBus,
        settings: impl SettingsSource + 'static,
        factory: EventFactory,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(ChatSnapshot::default()));
        let inner = Arc::new(SessionInner {
            bus,
            settings: Arc::new(settings),
            factory,
            state: Mutex::new(SessionState {
                log: EventLog::new(),
                table: LifecycleTable::new(),
            }),
            snapshot_tx,
            closed: AtomicBool::new(false),
        });

        let mut subscriptions: Vec<Subscription> = INGEST_PATTERNS
            .iter()
            .map(|pattern| inner.bus.on(pattern, ingest_listener(Arc::downgrade(&inner))))
            .collect();
        subscriptions.push(inner.bus.on("*", |event: &BusEvent| {
            debug!(
                event_type = %event.event_type,
                source = %event.source,
                "bus event"
            );
            Ok(())
        }));
        debug!(patterns = subscriptions.len(), "chat session attached to bus");

        let session = Self {
            inner,
            subscriptions: Mutex::new(subscriptions),
        };
        let _ = session.refresh();
        session
    }

    /// Create a session whose log starts with the welcome sentinel, which
    /// survives `clear_chat`.
    pub fn with_welcome(
        bus: EventBus,
        settings: impl SettingsSource + 'static,
        welcome: impl Into<String>,
    ) -> Self {
        let session = Self::new(bus, settings);
        let event = session.inner.factory.welcome_message(welcome);
        debug_assert_eq!(event.id.as_str(), WELCOME_MESSAGE_ID);
        let _ = session.inner.commit(event);
        session
    }

    /// Append a chat event, filling in id and timestamp when absent.
    pub fn dispatch(&self, pending: PendingEvent) -> Result<Arc<ChatSnapshot>> {
        self.inner.dispatch(pending)
    }

    /// Translate and append one bus event without going through the bus.
    ///
    /// Unlike the bus listener, types without a chat counterpart are
    /// reported as [`IngestError::UnknownType`].
    pub fn ingest(&self, event: &BusEvent) -> Result<Arc<ChatSnapshot>> {
        match translate(event)? {
            Some(pending) => self.dispatch(pending),
            None => Err(IngestError::UnknownType(event.event_type.clone()).into()),
        }
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> Arc<ChatSnapshot> {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Receiver that sees every new snapshot.
    pub fn watch(&self) -> watch::Receiver<Arc<ChatSnapshot>> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Re-derive the snapshot with current settings, without a log change.
    pub fn refresh(&self) -> Arc<ChatSnapshot> {
        let state = self.inner.state.lock();
        let snapshot = Arc::new(self.inner.derive(&state));
        let _ = self.inner.snapshot_tx.send_replace(Arc::clone(&snapshot));
        snapshot
    }

    /// The bus this session listens on, for producers that emit directly.
    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Detach from the bus and reject further dispatches. Idempotent.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let subscriptions = std::mem::take(&mut *self.subscriptions.lock());
        for subscription in &subscriptions {
            let _ = subscription.unsubscribe();
        }
        debug!(
            detached = subscriptions.len(),
            log_len = self.inner.state.lock().log.len(),
            "chat session closed"
        );
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("log_len", &self.inner.state.lock().log.len())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Bus listener feeding one session. Holds the session weakly so the bus
/// never keeps it alive.
fn ingest_listener(
    session: Weak<SessionInner>,
) -> impl Fn(&BusEvent) -> mapchat_bus::Result<()> + Send + Sync + 'static {
    move |event: &BusEvent| {
        let Some(inner) = session.upgrade() else {
            return Ok(());
        };
        match translate(event) {
            Ok(Some(pending)) => inner
                .dispatch(pending)
                .map(|_| ())
                .map_err(|e| BusError::ListenerFailed(e.to_string())),
            Ok(None) => Ok(()),
            Err(error) => {
                warn!(
                    event_type = %event.event_type,
                    source = %event.source,
                    error = %error,
                    "rejected inbound event"
                );
                Ok(())
            }
        }
    }
}
