//! In-memory capture of `tracing` output for tests.
//!
//! [`capture_logs`] installs a thread-local subscriber; everything logged on
//! the current thread while the returned guard lives is recorded in
//! [`CapturedLogs`].

use std::sync::Arc;

use parking_lot::Mutex;

use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

/// One recorded `tracing` event.
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    /// Level the event was emitted at.
    pub level: Level,
    /// Module target.
    pub target: String,
    /// The `message` field.
    pub message: String,
    /// Remaining fields as `(name, debug-formatted value)`.
    pub fields: Vec<(String, String)>,
}

impl CapturedEvent {
    /// Value of a structured field, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Shared handle to the recorded events.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CapturedLogs {
    /// All recorded events, oldest first.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().clone()
    }

    /// Whether any event at `level` has a message containing `needle`.
    pub fn has_event(&self, level: Level, needle: &str) -> bool {
        self.events
            .lock()
            .iter()
            .any(|e| e.level == level && e.message.contains(needle))
    }

    /// Number of events recorded at `level`.
    pub fn count_at_level(&self, level: Level) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.level == level)
            .count()
    }

    /// Drop everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

struct CaptureLayer {
    logs: CapturedLogs,
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{value:?}");
        if field.name() == "message" {
            self.message = rendered;
        } else {
            self.fields.push((field.name().to_owned(), rendered));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            value.clone_into(&mut self.message);
        } else {
            self.fields.push((field.name().to_owned(), value.to_owned()));
        }
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        self.logs.events.lock().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_owned(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

/// Capture every `tracing` event on the current thread.
///
/// Keep the returned guard alive for as long as capture should last.
pub fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::registry()
        .with(CaptureLayer { logs: logs.clone() })
        .with(LevelFilter::TRACE);
    (logs, subscriber.set_default())
}
