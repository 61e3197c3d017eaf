//! Widget lifecycle state machine.
//!
//! Every widget is identified by a deterministic key. Each key moves through
//! a two-state machine driven by named transitions:
//!
//! | current     | transition  | next        |
//! |-------------|-------------|-------------|
//! | none        | `Spawn`     | `Active`    |
//! | `Completed` | `Spawn`     | `Active`    |
//! | `Active`    | `Supersede` | `Active`    |
//! | any         | `Resolve`   | `Completed` |
//!
//! [`LifecycleTable`] applies those transitions one event at a time. It also
//! remembers the most recent event that spawned each key, so the active
//! widget set can be read straight from the table without another pass over
//! the log.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::types::{
    ChatEvent, ChatEventKind, OperationKind, Widget, WidgetData, WidgetType,
};

/// Key of the singleton login prompt.
pub const LOGIN_WIDGET_KEY: &str = "login-widget";

/// Lifecycle state of one widget key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WidgetState {
    /// Visible.
    Active,
    /// Closed; hidden unless spawned again.
    Completed,
}

/// Named lifecycle transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transition {
    /// First spawn, or respawn of a completed key.
    Spawn,
    /// Spawn of a key that is already active.
    Supersede,
    /// Close the widget.
    Resolve,
}

impl Transition {
    /// The transition a spawning event causes on a key in `current` state.
    pub fn spawn_for(current: Option<WidgetState>) -> Self {
        match current {
            Some(WidgetState::Active) => Self::Supersede,
            Some(WidgetState::Completed) | None => Self::Spawn,
        }
    }
}

impl WidgetState {
    /// Apply `transition` to a key in `current` state.
    pub fn next(current: Option<Self>, transition: Transition) -> Self {
        match (current, transition) {
            (_, Transition::Resolve) => Self::Completed,
            (_, Transition::Spawn | Transition::Supersede) => Self::Active,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Keys
// ─────────────────────────────────────────────────────────────────────────────

/// `preview-{tileId}`
pub fn preview_key(tile_id: &str) -> String {
    format!("preview-{tile_id}")
}

/// `creation-{eventId}`
pub fn creation_key(event_id: &str) -> String {
    format!("creation-{event_id}")
}

/// `delete-{eventId}`
pub fn delete_key(event_id: &str) -> String {
    format!("delete-{event_id}")
}

/// `error-{eventId}`
pub fn error_key(event_id: &str) -> String {
    format!("error-{event_id}")
}

/// Key of the widget `event` spawns, if it spawns one.
pub fn spawn_key(event: &ChatEvent) -> Option<String> {
    match &event.kind {
        ChatEventKind::TileSelected(p) => Some(preview_key(&p.tile_id)),
        ChatEventKind::OperationStarted(p) => match p.operation {
            OperationKind::Create => Some(creation_key(&event.id)),
            OperationKind::Delete => Some(delete_key(&event.id)),
            _ => None,
        },
        ChatEventKind::AuthRequired(_) => Some(LOGIN_WIDGET_KEY.to_string()),
        ChatEventKind::ErrorOccurred(_) => Some(error_key(&event.id)),
        _ => None,
    }
}

/// Build the widget `event` would display, regardless of lifecycle state.
pub fn build_widget(event: &ChatEvent) -> Option<Widget> {
    let id = spawn_key(event)?;
    let (widget_type, data) = match &event.kind {
        ChatEventKind::TileSelected(p) => (
            WidgetType::Preview,
            WidgetData::Preview {
                tile_id: p.tile_id.clone(),
                title: p.tile_data.title.clone(),
                content: p.tile_data.content.clone(),
                coord_id: p.tile_data.coord_id.clone(),
                open_in_edit_mode: p.open_in_edit_mode,
            },
        ),
        ChatEventKind::OperationStarted(p) if p.operation == OperationKind::Create => (
            WidgetType::Creation,
            WidgetData::Creation {
                coord_id: p.coord_id.clone(),
                parent_id: p.parent_id.clone(),
                parent_name: p.parent_name.clone(),
            },
        ),
        ChatEventKind::OperationStarted(p) => (
            WidgetType::Delete,
            WidgetData::Delete {
                tile_id: p.tile_id.clone(),
                tile_name: p.tile_name.clone(),
            },
        ),
        ChatEventKind::AuthRequired(p) => (
            WidgetType::Login,
            WidgetData::Login {
                reason: p.reason.clone(),
            },
        ),
        ChatEventKind::ErrorOccurred(p) => (
            WidgetType::Error,
            WidgetData::Error {
                message: p.error.clone(),
                retryable: p.retryable,
                context: p.context.clone(),
            },
        ),
        _ => return None,
    };
    Some(Widget {
        id,
        widget_type,
        data,
        priority: widget_type.priority(),
        timestamp: event.timestamp,
    })
}

/// Whether `(timestamp, position)` beats the current best.
///
/// Later timestamps win; equal timestamps go to the later log position.
pub(crate) fn is_more_recent(
    candidate: (DateTime<Utc>, usize),
    current: Option<(DateTime<Utc>, usize)>,
) -> bool {
    current.is_none_or(|best| candidate > best)
}

/// Order widgets most recent first.
pub(crate) fn sort_by_recency(widgets: &mut [(Widget, usize)]) {
    widgets.sort_by(|(a, pa), (b, pb)| b.timestamp.cmp(&a.timestamp).then(pb.cmp(pa)));
}

// ─────────────────────────────────────────────────────────────────────────────
// Table
// ─────────────────────────────────────────────────────────────────────────────

/// State of one key plus the newest widget it spawned.
#[derive(Clone, Debug)]
struct WidgetRecord {
    state: WidgetState,
    latest: Option<(Widget, usize)>,
}

/// An `operation_started` awaiting its `operation_completed`.
#[derive(Clone, Debug)]
struct OpenOperation {
    target: String,
    key: String,
}

/// Incrementally maintained widget lifecycle.
///
/// Feed every appended event to [`apply`](Self::apply) with its log
/// position. After a `clear_chat`, rebuild with [`replay`](Self::replay) on
/// the retained log.
#[derive(Clone, Debug, Default)]
pub struct LifecycleTable {
    records: HashMap<String, WidgetRecord>,
    open: Vec<OpenOperation>,
}

impl LifecycleTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a whole log.
    pub fn replay(log: &[ChatEvent]) -> Self {
        let mut table = Self::new();
        for (position, event) in log.iter().enumerate() {
            table.apply(position, event);
        }
        table
    }

    /// Apply the event stored at `position` in the log.
    ///
    /// `clear_chat` empties the table.
    pub fn apply(&mut self, position: usize, event: &ChatEvent) {
        match &event.kind {
            ChatEventKind::ClearChat => *self = Self::new(),
            ChatEventKind::OperationCompleted(p) => {
                if p.operation == OperationKind::Delete {
                    if let Some(tile_id) = &p.tile_id {
                        self.transition(&preview_key(tile_id), Transition::Resolve);
                    }
                }
                let (closed, open): (Vec<_>, Vec<_>) = std::mem::take(&mut self.open)
                    .into_iter()
                    .partition(|op| p.concerns(&op.target));
                self.open = open;
                for op in closed {
                    self.transition(&op.key, Transition::Resolve);
                }
            }
            ChatEventKind::WidgetResolved(p) => self.transition(&p.widget_id, Transition::Resolve),
            _ => {
                if let Some(widget) = build_widget(event) {
                    if let ChatEventKind::OperationStarted(p) = &event.kind {
                        if let Some(target) = p.target() {
                            self.open.push(OpenOperation {
                                target: target.to_string(),
                                key: widget.id.clone(),
                            });
                        }
                    }
                    self.spawn(position, widget);
                }
            }
        }
    }

    /// Current state of `key`, `None` if never seen.
    pub fn state(&self, key: &str) -> Option<WidgetState> {
        self.records.get(key).map(|r| r.state)
    }

    /// Number of keys ever seen since the last reset.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no key has been seen.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Active widgets, most recent first.
    pub fn active_widgets(&self) -> Vec<Widget> {
        let mut active: Vec<(Widget, usize)> = self
            .records
            .values()
            .filter(|r| r.state == WidgetState::Active)
            .filter_map(|r| r.latest.clone())
            .collect();
        sort_by_recency(&mut active);
        active.into_iter().map(|(w, _)| w).collect()
    }

    fn spawn(&mut self, position: usize, widget: Widget) {
        let current = self.state(&widget.id);
        let next = WidgetState::next(current, Transition::spawn_for(current));
        let record = self
            .records
            .entry(widget.id.clone())
            .or_insert(WidgetRecord {
                state: next,
                latest: None,
            });
        record.state = next;
        let best = record.latest.as_ref().map(|(w, p)| (w.timestamp, *p));
        if is_more_recent((widget.timestamp, position), best) {
            record.latest = Some((widget, position));
        }
    }

    fn transition(&mut self, key: &str, transition: Transition) {
        let current = self.state(key);
        let next = WidgetState::next(current, transition);
        let _ = self
            .records
            .entry(key.to_string())
            .and_modify(|r| r.state = next)
            .or_insert(WidgetRecord {
                state: next,
                latest: None,
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Actor, AuthRequiredPayload, OperationCompletedPayload, OperationStartedPayload, TileData,
        TileSelectedPayload, WidgetResolvedPayload,
    };
    use chrono::TimeZone;
    use mapchat_core::EventId;

    fn event(id: &str, secs: i64, kind: ChatEventKind) -> ChatEvent {
        ChatEvent {
            id: EventId::from(id),
            actor: Actor::User,
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            kind,
        }
    }

    fn select(id: &str, secs: i64, tile: &str) -> ChatEvent {
        event(
            id,
            secs,
            ChatEventKind::TileSelected(TileSelectedPayload {
                tile_id: tile.into(),
                tile_data: TileData {
                    title: format!("Tile {tile}"),
                    content: String::new(),
                    coord_id: format!("c-{tile}"),
                },
                open_in_edit_mode: false,
            }),
        )
    }

    fn start(id: &str, secs: i64, operation: OperationKind, tile: &str) -> ChatEvent {
        event(
            id,
            secs,
            ChatEventKind::OperationStarted(OperationStartedPayload {
                operation,
                tile_id: Some(tile.into()),
                ..Default::default()
            }),
        )
    }

    fn complete(id: &str, secs: i64, operation: OperationKind, tile: &str) -> ChatEvent {
        event(
            id,
            secs,
            ChatEventKind::OperationCompleted(OperationCompletedPayload {
                operation,
                tile_id: Some(tile.into()),
                ..Default::default()
            }),
        )
    }

    // ── state machine ──

    #[test]
    fn transition_table() {
        use Transition::{Resolve, Spawn, Supersede};
        use WidgetState::{Active, Completed};

        assert_eq!(WidgetState::next(None, Spawn), Active);
        assert_eq!(WidgetState::next(Some(Completed), Spawn), Active);
        assert_eq!(WidgetState::next(Some(Active), Supersede), Active);
        assert_eq!(WidgetState::next(Some(Active), Resolve), Completed);
        assert_eq!(WidgetState::next(None, Resolve), Completed);
        assert_eq!(WidgetState::next(Some(Completed), Resolve), Completed);
    }

    #[test]
    fn spawn_on_active_key_is_supersede() {
        assert_eq!(Transition::spawn_for(None), Transition::Spawn);
        assert_eq!(Transition::spawn_for(Some(WidgetState::Completed)), Transition::Spawn);
        assert_eq!(Transition::spawn_for(Some(WidgetState::Active)), Transition::Supersede);
    }

    // ── keys ──

    #[test]
    fn spawn_keys_per_event_type() {
        assert_eq!(spawn_key(&select("e1", 0, "t1")).as_deref(), Some("preview-t1"));
        assert_eq!(
            spawn_key(&start("e2", 0, OperationKind::Create, "t1")).as_deref(),
            Some("creation-e2")
        );
        assert_eq!(
            spawn_key(&start("e3", 0, OperationKind::Delete, "t1")).as_deref(),
            Some("delete-e3")
        );
        assert_eq!(spawn_key(&start("e4", 0, OperationKind::Edit, "t1")), None);
        assert_eq!(
            spawn_key(&event("e5", 0, ChatEventKind::AuthRequired(AuthRequiredPayload::default())))
                .as_deref(),
            Some(LOGIN_WIDGET_KEY)
        );
        assert_eq!(spawn_key(&event("e6", 0, ChatEventKind::ClearChat)), None);
    }

    // ── table ──

    #[test]
    fn delete_flow_closes_preview_and_confirmation() {
        let mut table = LifecycleTable::new();
        table.apply(0, &select("e1", 0, "t1"));
        table.apply(1, &start("e2", 1, OperationKind::Delete, "t1"));
        assert_eq!(table.state("preview-t1"), Some(WidgetState::Active));
        assert_eq!(table.state("delete-e2"), Some(WidgetState::Active));
        assert_eq!(table.active_widgets().len(), 2);

        table.apply(2, &complete("e3", 2, OperationKind::Delete, "t1"));
        assert_eq!(table.state("preview-t1"), Some(WidgetState::Completed));
        assert_eq!(table.state("delete-e2"), Some(WidgetState::Completed));
        assert!(table.active_widgets().is_empty());
    }

    #[test]
    fn non_delete_completion_keeps_preview() {
        let mut table = LifecycleTable::new();
        table.apply(0, &select("e1", 0, "t1"));
        table.apply(1, &complete("e2", 1, OperationKind::Edit, "t1"));
        assert_eq!(table.state("preview-t1"), Some(WidgetState::Active));
    }

    #[test]
    fn completion_for_other_tile_leaves_marker_open() {
        let log = vec![
            start("e1", 0, OperationKind::Delete, "t1"),
            complete("e2", 1, OperationKind::Delete, "t2"),
        ];
        let table = LifecycleTable::replay(&log);
        assert_eq!(table.state("delete-e1"), Some(WidgetState::Active));
    }

    #[test]
    fn creation_marker_matches_coordinate() {
        let started = event(
            "e1",
            0,
            ChatEventKind::OperationStarted(OperationStartedPayload {
                operation: OperationKind::Create,
                coord_id: Some("c7".into()),
                ..Default::default()
            }),
        );
        let done = event(
            "e2",
            1,
            ChatEventKind::OperationCompleted(OperationCompletedPayload {
                operation: OperationKind::Create,
                tile_id: Some("t-new".into()),
                coord_id: Some("c7".into()),
                ..Default::default()
            }),
        );
        let table = LifecycleTable::replay(&[started, done]);
        assert_eq!(table.state("creation-e1"), Some(WidgetState::Completed));
    }

    #[test]
    fn widget_resolved_closes_exact_key() {
        let log = vec![
            event("e1", 0, ChatEventKind::AuthRequired(AuthRequiredPayload::default())),
            event(
                "e2",
                1,
                ChatEventKind::WidgetResolved(WidgetResolvedPayload {
                    widget_id: LOGIN_WIDGET_KEY.into(),
                    action: None,
                }),
            ),
        ];
        let table = LifecycleTable::replay(&log);
        assert_eq!(table.state(LOGIN_WIDGET_KEY), Some(WidgetState::Completed));
        assert!(table.active_widgets().is_empty());
    }

    #[test]
    fn resolve_of_unknown_key_is_recorded() {
        let log = vec![event(
            "e1",
            0,
            ChatEventKind::WidgetResolved(WidgetResolvedPayload {
                widget_id: "ghost".into(),
                action: None,
            }),
        )];
        let table = LifecycleTable::replay(&log);
        assert_eq!(table.state("ghost"), Some(WidgetState::Completed));
        assert!(table.active_widgets().is_empty());
    }

    #[test]
    fn reselect_after_delete_reactivates_preview() {
        let log = vec![
            select("e1", 0, "t1"),
            complete("e2", 1, OperationKind::Delete, "t1"),
            select("e3", 2, "t1"),
        ];
        let table = LifecycleTable::replay(&log);
        let widgets = table.active_widgets();
        assert_eq!(widgets.len(), 1);
        assert_eq!(widgets[0].timestamp, Utc.timestamp_opt(2, 0).unwrap());
    }

    #[test]
    fn newest_spawn_wins_and_ties_go_to_later_position() {
        let mut table = LifecycleTable::new();
        table.apply(0, &select("e1", 5, "t1"));
        table.apply(1, &select("e2", 3, "t1"));
        assert_eq!(
            table.active_widgets()[0].timestamp,
            Utc.timestamp_opt(5, 0).unwrap()
        );

        let mut tie = LifecycleTable::new();
        tie.apply(0, &select("e1", 5, "t1"));
        let mut later = select("e2", 5, "t1");
        if let ChatEventKind::TileSelected(p) = &mut later.kind {
            p.tile_data.title = "second".into();
        }
        tie.apply(1, &later);
        let widgets = tie.active_widgets();
        assert_eq!(widgets.len(), 1);
        assert!(matches!(&widgets[0].data, WidgetData::Preview { title, .. } if title == "second"));
    }

    #[test]
    fn clear_chat_resets_table() {
        let mut table = LifecycleTable::replay(&[select("e1", 0, "t1")]);
        table.apply(1, &event("e2", 1, ChatEventKind::ClearChat));
        assert!(table.is_empty());
        assert!(table.active_widgets().is_empty());
    }
}
