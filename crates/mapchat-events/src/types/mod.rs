//! Chat event and projection types.
//!
//! All wire types use camelCase field names. [`ChatEventKind`] serializes
//! adjacently tagged, so a chat event looks like
//!
//! ```json
//! { "id": "evt_...", "actor": "system", "timestamp": "2025-...",
//!   "type": "tile_selected", "payload": { "tileId": "t1", ... } }
//! ```

pub mod event;
pub mod payloads;
pub mod projection;

pub use event::{Actor, ChatEvent, ChatEventKind};
pub use payloads::*;
pub use projection::{Message, Widget, WidgetData, WidgetPriority, WidgetType};
