//! Key event types delivered by the keyboard capture collaborator.
//!
//! Unlike background telemetry, password capture needs the key symbol to know
//! when the password has been typed. Events live only for the duration of a
//! single capture and are discarded once features are extracted.

use serde::{Deserialize, Serialize};

/// Symbol the capture hook reports for the space bar.
pub const SPACE_SYMBOL: &str = "space";

/// Direction of a key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyTransition {
    Down,
    Up,
}

/// A single timestamped key transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Key symbol as named by the capture hook (e.g. "a", "space", "shift")
    pub key: String,
    /// Press or release
    pub kind: KeyTransition,
    /// Seconds since capture start
    pub timestamp: f64,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, kind: KeyTransition, timestamp: f64) -> Self {
        Self {
            key: key.into(),
            kind,
            timestamp,
        }
    }

    pub fn down(key: impl Into<String>, timestamp: f64) -> Self {
        Self::new(key, KeyTransition::Down, timestamp)
    }

    pub fn up(key: impl Into<String>, timestamp: f64) -> Self {
        Self::new(key, KeyTransition::Up, timestamp)
    }

    pub fn is_down(&self) -> bool {
        self.kind == KeyTransition::Down
    }

    /// The text this key contributes to the typed password.
    ///
    /// Only the space bar is translated; every other symbol is used as-is.
    pub fn typed_text(&self) -> &str {
        if self.key == SPACE_SYMBOL {
            " "
        } else {
            &self.key
        }
    }
}

/// Wire form of a key event as produced by external capture tools.
///
/// ```json
/// {"keySymbol": "a", "transition": "down", "timestampSeconds": 0.25}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawKeyEvent {
    pub key_symbol: String,
    pub transition: KeyTransition,
    pub timestamp_seconds: f64,
}

impl From<RawKeyEvent> for KeyEvent {
    fn from(raw: RawKeyEvent) -> Self {
        KeyEvent::new(raw.key_symbol, raw.transition, raw.timestamp_seconds)
    }
}

impl From<&KeyEvent> for RawKeyEvent {
    fn from(event: &KeyEvent) -> Self {
        Self {
            key_symbol: event.key.clone(),
            transition: event.kind,
            timestamp_seconds: event.timestamp,
        }
    }
}
