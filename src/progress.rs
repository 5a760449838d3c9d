//! Progress events delivered to listeners

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named events emitted by a request and its upload channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Transfer started
    LoadStart,
    /// Bytes were transferred
    Progress,
    /// Transfer finished successfully
    Load,
    /// Transfer finished, successfully or not
    LoadEnd,
    /// Transfer was cancelled
    Abort,
    /// Transfer exceeded its time budget
    Timeout,
    /// Transfer failed
    Error,
}

impl EventType {
    /// Every event type, in lifecycle order
    pub const ALL: [EventType; 7] = [
        EventType::LoadStart,
        EventType::Progress,
        EventType::Load,
        EventType::LoadEnd,
        EventType::Abort,
        EventType::Timeout,
        EventType::Error,
    ];

    /// DOM name of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::LoadStart => "loadstart",
            EventType::Progress => "progress",
            EventType::Load => "load",
            EventType::LoadEnd => "loadend",
            EventType::Abort => "abort",
            EventType::Timeout => "timeout",
            EventType::Error => "error",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| format!("Unknown event type: {}", s))
    }
}

/// Progress information reported by a transport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressInfo {
    /// Number of bytes transferred so far
    pub bytes_transferred: u64,
    /// Total bytes to transfer (if known)
    pub total_bytes: Option<u64>,
}

impl ProgressInfo {
    /// Create a progress measurement
    pub fn new(bytes_transferred: u64, total_bytes: Option<u64>) -> Self {
        Self {
            bytes_transferred,
            total_bytes,
        }
    }
}

/// Event object handed to listeners.
///
/// When the total is unknown `length_computable` is false and `total` is 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    event_type: EventType,
    length_computable: bool,
    loaded: u64,
    total: u64,
}

impl ProgressEvent {
    /// Build an event from a progress measurement
    pub fn new(event_type: EventType, progress: ProgressInfo) -> Self {
        Self {
            event_type,
            length_computable: progress.total_bytes.is_some(),
            loaded: progress.bytes_transferred,
            total: progress.total_bytes.unwrap_or(0),
        }
    }

    /// Event with nothing transferred and no known total
    pub fn empty(event_type: EventType) -> Self {
        Self::new(event_type, ProgressInfo::default())
    }

    /// Event type
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Whether `total` is meaningful
    pub fn length_computable(&self) -> bool {
        self.length_computable
    }

    /// Bytes transferred so far
    pub fn loaded(&self) -> u64 {
        self.loaded
    }

    /// Total bytes, 0 when unknown
    pub fn total(&self) -> u64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_total() {
        let event = ProgressEvent::new(EventType::Progress, ProgressInfo::new(12, None));
        assert!(!event.length_computable());
        assert_eq!(event.loaded(), 12);
        assert_eq!(event.total(), 0);
    }

    #[test]
    fn test_event_type_names() {
        for ty in EventType::ALL {
            assert_eq!(ty.as_str().parse::<EventType>().unwrap(), ty);
        }
        assert!("readystatechange".parse::<EventType>().is_err());
    }

    #[test]
    fn test_serializes_like_dom_event() {
        let event = ProgressEvent::new(EventType::LoadStart, ProgressInfo::new(0, Some(10)));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "loadstart",
                "lengthComputable": true,
                "loaded": 0,
                "total": 10
            })
        );
    }
}
