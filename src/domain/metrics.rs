use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Per-track play/like state, one record per track id in the key-value
/// store. The set keeps device membership idempotent and free of duplicates
/// on the wire; the like count is always derived from it, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsRecord {
    #[serde(rename = "playCount", default)]
    pub play_count: u64,
    #[serde(rename = "likesSet", default)]
    pub likes_set: BTreeSet<String>,
}

impl MetricsRecord {
    pub fn likes_count(&self) -> u64 {
        self.likes_set.len() as u64
    }

    /// Pure state transition, isolated from store I/O so it can be tested
    /// without store timing.
    pub fn apply(mut self, event: MetricsEvent) -> MetricsRecord {
        match event {
            MetricsEvent::Play => self.play_count += 1,
            MetricsEvent::Like(device) => {
                self.likes_set.insert(device);
            }
            MetricsEvent::Unlike(device) => {
                self.likes_set.remove(&device);
            }
        }
        self
    }
}

#[derive(Debug, Clone)]
pub enum MetricsEvent {
    Play,
    Like(String),
    Unlike(String),
}

/// Outcome of decoding a stored value. `Missing` and `Malformed` both
/// default to the zero record, but stay distinguishable for callers that
/// care about corruption.
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded {
    Record(MetricsRecord),
    Missing,
    Malformed,
}

impl Decoded {
    pub fn into_record(self) -> MetricsRecord {
        match self {
            Decoded::Record(record) => record,
            Decoded::Missing | Decoded::Malformed => MetricsRecord::default(),
        }
    }
}

/// Decodes a stored value into a record. Never fails: an absent value is a
/// zero record, and a value that does not parse is treated the same way so
/// the caller always makes forward progress.
pub fn decode(raw: Option<&[u8]>) -> Decoded {
    match raw {
        None => Decoded::Missing,
        Some(bytes) => match serde_json::from_slice(bytes) {
            Ok(record) => Decoded::Record(record),
            Err(_) => Decoded::Malformed,
        },
    }
}

pub fn encode(record: &MetricsRecord) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(record)
}
