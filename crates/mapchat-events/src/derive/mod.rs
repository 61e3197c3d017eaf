//! Derivation engine.
//!
//! Pure functions from `(log, settings)` to the two projections the UI
//! reads: the message timeline ([`derive_messages`]) and the active widget
//! set ([`derive_widgets`]). Nothing here keeps state between calls.
//!
//! [`LifecycleTable`] is the incremental counterpart of [`derive_widgets`]
//! for hosts that apply events one at a time.

pub mod format;
pub mod lifecycle;
pub mod messages;
pub mod widgets;

use mapchat_settings::ChatSettings;
use serde::Serialize;

use crate::types::{ChatEvent, Message, Widget};

pub use lifecycle::{LOGIN_WIDGET_KEY, LifecycleTable, Transition, WidgetState};
pub use messages::derive_messages;
pub use widgets::derive_widgets;

/// Both projections of one log version.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    /// Visible message timeline, in log order.
    pub messages: Vec<Message>,
    /// Active widgets, most recent first.
    pub widgets: Vec<Widget>,
}

/// Derive both projections from the full log.
pub fn derive(log: &[ChatEvent], settings: &ChatSettings) -> Projection {
    Projection {
        messages: derive_messages(log, settings),
        widgets: derive_widgets(log),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Actor, AuthRequiredPayload, ChatEventKind, ErrorOccurredPayload, MessagePayload,
        NavigationPayload, OperationCompletedPayload, OperationKind, OperationResult,
        OperationStartedPayload, TileData, TileSelectedPayload, WidgetResolvedPayload,
    };
    use chrono::{TimeZone, Utc};
    use mapchat_core::EventId;
    use proptest::prelude::*;

    const TILES: [&str; 3] = ["t1", "t2", "t3"];
    const COORDS: [&str; 2] = ["c1", "c2"];
    const LOG_LEN: usize = 30;
    const OPS: [OperationKind; 4] = [
        OperationKind::Create,
        OperationKind::Edit,
        OperationKind::Delete,
        OperationKind::Swap,
    ];

    /// Operation target: a tile id, a bare coordinate, both, or nothing.
    fn arb_target() -> impl Strategy<Value = (Option<String>, Option<String>)> {
        let tile = (0..TILES.len()).prop_map(|i| TILES[i].to_string());
        let coord = (0..COORDS.len()).prop_map(|i| COORDS[i].to_string());
        (proptest::option::of(tile), proptest::option::of(coord))
    }

    /// Small event vocabulary over few tiles, so keys collide often.
    fn arb_kind() -> impl Strategy<Value = ChatEventKind> {
        let tile = (0..TILES.len()).prop_map(|i| TILES[i].to_string());
        let op = (0..OPS.len()).prop_map(|i| OPS[i].clone());
        prop_oneof![
            "[a-z ]{0,12}".prop_map(|t| ChatEventKind::UserMessage(MessagePayload::new(t))),
            (tile.clone(), any::<bool>()).prop_map(|(tile_id, edit)| {
                ChatEventKind::TileSelected(TileSelectedPayload {
                    tile_id,
                    tile_data: TileData {
                        title: "Tile".into(),
                        content: String::new(),
                        coord_id: "c".into(),
                    },
                    open_in_edit_mode: edit,
                })
            }),
            (op.clone(), arb_target()).prop_map(|(operation, (tile_id, coord_id))| {
                ChatEventKind::OperationStarted(OperationStartedPayload {
                    operation,
                    tile_id,
                    coord_id,
                    ..Default::default()
                })
            }),
            (op, arb_target(), any::<bool>()).prop_map(|(operation, (tile_id, coord_id), ok)| {
                ChatEventKind::OperationCompleted(OperationCompletedPayload {
                    operation,
                    result: if ok { OperationResult::Success } else { OperationResult::Failure },
                    tile_id,
                    coord_id,
                    message: "Done \"Tile\"".into(),
                })
            }),
            tile.clone().prop_map(|t| ChatEventKind::Navigation(NavigationPayload {
                from_center_id: None,
                from_center_name: None,
                to_center_id: t.clone(),
                to_center_name: t,
            })),
            Just(ChatEventKind::AuthRequired(AuthRequiredPayload::default())),
            Just(ChatEventKind::ErrorOccurred(ErrorOccurredPayload {
                error: "boom".into(),
                context: None,
                retryable: false,
            })),
            prop_oneof![
                Just(LOGIN_WIDGET_KEY.to_string()),
                tile.prop_map(|t| format!("preview-{t}")),
                (
                    prop_oneof![Just("creation"), Just("delete"), Just("error")],
                    0..LOG_LEN,
                )
                    .prop_map(|(kind, i)| format!("{kind}-e{i}")),
            ]
            .prop_map(|widget_id| ChatEventKind::WidgetResolved(WidgetResolvedPayload {
                widget_id,
                action: None,
            })),
        ]
    }

    /// Logs with unique ids and timestamps drawn from a narrow range to
    /// force ties.
    fn arb_log() -> impl Strategy<Value = Vec<ChatEvent>> {
        proptest::collection::vec((arb_kind(), 0i64..6), 0..LOG_LEN).prop_map(|items| {
            items
                .into_iter()
                .enumerate()
                .map(|(i, (kind, secs))| ChatEvent {
                    id: EventId::from(format!("e{i}")),
                    actor: Actor::User,
                    timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
                    kind,
                })
                .collect()
        })
    }

    fn arb_settings() -> impl Strategy<Value = ChatSettings> {
        (any::<bool>(), any::<[bool; 5]>()).prop_map(|(debug, flags)| {
            let mut settings = ChatSettings::default();
            settings.messages.debug = debug;
            let tile = &mut settings.messages.tile;
            [tile.edit, tile.create, tile.delete, tile.r#move, tile.swap] = flags;
            settings
        })
    }

    proptest! {
        #[test]
        fn derivation_is_deterministic(log in arb_log(), settings in arb_settings()) {
            prop_assert_eq!(derive(&log, &settings), derive(&log, &settings));
        }

        #[test]
        fn incremental_table_matches_full_replay(log in arb_log()) {
            let mut table = LifecycleTable::new();
            for (position, event) in log.iter().enumerate() {
                table.apply(position, event);
                prop_assert_eq!(table.active_widgets(), derive_widgets(&log[..=position]));
            }
        }

        #[test]
        fn messages_never_outnumber_events(log in arb_log(), settings in arb_settings()) {
            prop_assert!(derive_messages(&log, &settings).len() <= log.len());
        }
    }

    #[test]
    fn projection_serializes_camel_case() {
        let json = serde_json::to_value(Projection::default()).unwrap();
        assert!(json.get("messages").is_some());
        assert!(json.get("widgets").is_some());
    }
}
