//! Active widget derivation by full replay.
//!
//! [`derive_widgets`] is a two-pass algorithm over the whole log:
//!
//! 1. **First pass**: compute the final [`WidgetState`] of every widget key.
//!    Closing events (`operation_completed`, `widget_resolved`) can appear
//!    long after the event that opened the widget.
//! 2. **Second pass**: build a widget for every spawning event whose key
//!    ended up `Active`, keep the most recent one per key, and sort newest
//!    first.
//!
//! [`LifecycleTable`](super::LifecycleTable) produces the same result one
//! event at a time; this module is the reference it is tested against.

use std::collections::HashMap;

use crate::derive::lifecycle::{
    Transition, WidgetState, build_widget, is_more_recent, preview_key, sort_by_recency,
    spawn_key,
};
use crate::types::{ChatEvent, ChatEventKind, OperationKind, Widget};

/// Build the active widget set from the full log, most recent first.
pub fn derive_widgets(log: &[ChatEvent]) -> Vec<Widget> {
    let states = collect_states(log);
    build_widgets(log, &states)
}

/// Pass 1: final lifecycle state per key.
fn collect_states(log: &[ChatEvent]) -> HashMap<String, WidgetState> {
    let mut states: HashMap<String, WidgetState> = HashMap::new();
    // (target, widget key) of operations still waiting for completion
    let mut open: Vec<(String, String)> = Vec::new();

    for event in log {
        match &event.kind {
            ChatEventKind::OperationCompleted(p) => {
                if p.operation == OperationKind::Delete {
                    if let Some(tile_id) = &p.tile_id {
                        step(&mut states, preview_key(tile_id), Transition::Resolve);
                    }
                }
                open.retain(|(target, key)| {
                    if p.concerns(target) {
                        step(&mut states, key.clone(), Transition::Resolve);
                        false
                    } else {
                        true
                    }
                });
            }
            ChatEventKind::WidgetResolved(p) => {
                step(&mut states, p.widget_id.clone(), Transition::Resolve);
            }
            _ => {
                let Some(key) = spawn_key(event) else { continue };
                if let ChatEventKind::OperationStarted(p) = &event.kind {
                    if let Some(target) = p.target() {
                        open.push((target.to_string(), key.clone()));
                    }
                }
                let current = states.get(&key).copied();
                step(&mut states, key, Transition::spawn_for(current));
            }
        }
    }

    states
}

fn step(states: &mut HashMap<String, WidgetState>, key: String, transition: Transition) {
    let next = WidgetState::next(states.get(&key).copied(), transition);
    let _ = states.insert(key, next);
}

/// Pass 2: materialize active widgets, dedup by key, sort by recency.
fn build_widgets(log: &[ChatEvent], states: &HashMap<String, WidgetState>) -> Vec<Widget> {
    let mut latest: HashMap<String, (Widget, usize)> = HashMap::new();

    for (position, event) in log.iter().enumerate() {
        let Some(widget) = build_widget(event) else { continue };
        if states.get(&widget.id) != Some(&WidgetState::Active) {
            continue;
        }
        let best = latest.get(&widget.id).map(|(w, p)| (w.timestamp, *p));
        if is_more_recent((widget.timestamp, position), best) {
            let _ = latest.insert(widget.id.clone(), (widget, position));
        }
    }

    let mut widgets: Vec<(Widget, usize)> = latest.into_values().collect();
    sort_by_recency(&mut widgets);
    widgets.into_iter().map(|(w, _)| w).collect()
}
