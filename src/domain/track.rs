use serde::{Deserialize, Serialize};

/// One public catalog entry, an element of the index document
/// `tracks/tracks.json`. Field names are the wire format.
///
/// `likes_count` is a snapshot written once at creation and intentionally
/// not reconciled with the live per-device like set in the metrics store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub cover: Option<String>,
    pub audio: String,
    pub uploader: String,
    pub tip_address: Option<String>,
    pub likes_count: u64,
    pub tip_total_sats: u64,
    pub created_at: String,
}
