//! Read-only settings access for the derivation engine.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::ChatSettings;

/// Anything the engine can poll for a settings snapshot.
///
/// Polled synchronously on every re-derivation; implementations must be
/// cheap and must not call back into the engine.
pub trait SettingsSource: Send + Sync {
    /// Current settings.
    fn snapshot(&self) -> ChatSettings;
}

impl SettingsSource for ChatSettings {
    fn snapshot(&self) -> ChatSettings {
        self.clone()
    }
}

/// Host-owned, mutable settings handle.
///
/// Clones share the same underlying value. The engine only ever reads it.
#[derive(Clone, Debug, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<ChatSettings>>,
}

impl SharedSettings {
    /// Wrap an initial value.
    pub fn new(settings: ChatSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Replace the whole settings value.
    pub fn replace(&self, settings: ChatSettings) {
        *self.inner.write() = settings;
    }

    /// Mutate settings in place.
    pub fn update(&self, f: impl FnOnce(&mut ChatSettings)) {
        f(&mut self.inner.write());
    }
}

impl SettingsSource for SharedSettings {
    fn snapshot(&self) -> ChatSettings {
        self.inner.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_settings_snapshot_is_a_copy() {
        let settings = ChatSettings::default();
        assert_eq!(settings.snapshot(), settings);
    }

    #[test]
    fn shared_settings_updates_are_visible_to_clones() {
        let shared = SharedSettings::default();
        let reader: Box<dyn SettingsSource> = Box::new(shared.clone());
        assert!(!reader.snapshot().messages.debug);

        shared.update(|s| s.messages.debug = true);
        assert!(reader.snapshot().messages.debug);

        shared.replace(ChatSettings::default());
        assert!(!reader.snapshot().messages.debug);
    }
}
