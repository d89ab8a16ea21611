use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

use crate::{
    domain::track::Track, public_url, service::error::ServiceError, storage::blob::BlobStore,
};

/// Well-known key of the whole-catalog index document, a JSON array of Track.
pub const INDEX_KEY: &str = "tracks/tracks.json";

/// Fields accepted for a new catalog entry. Text fields are expected to be
/// sanitized and size limits enforced by the caller.
#[derive(Debug, Default)]
pub struct NewTrack {
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub uploader: String,
    pub tip_address: String,
    pub audio: Option<Media>,
    pub cover: Option<Media>,
}

#[derive(Debug)]
pub struct Media {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// The append-only public track index, stored as a single JSON array
/// document in the blob store.
pub struct TrackIndexService {
    store: Arc<dyn BlobStore>,
    public_base_url: String,
}

impl TrackIndexService {
    pub fn new(store: Arc<dyn BlobStore>, public_base_url: String) -> Self {
        Self {
            store,
            public_base_url,
        }
    }

    /// Reads the whole index. An absent or unparsable document is an empty
    /// catalog, never an error; a store fault still fails the call.
    pub fn list_tracks(&self) -> Result<Vec<Track>, ServiceError> {
        let Some(doc) = self.store.get(INDEX_KEY)? else {
            return Ok(Vec::new());
        };
        Ok(serde_json::from_slice(&doc.bytes).unwrap_or_default())
    }

    /// Stores the new track's media, then appends the entry to the index by
    /// rewriting the whole document. The blob store has no conditional
    /// writes, so two concurrent appends can each overwrite the other's
    /// entry; likewise, if the index write fails after the media was stored,
    /// the media is not rolled back.
    pub fn append_track(&self, new: NewTrack) -> Result<Track, ServiceError> {
        let Some(audio) = new.audio else {
            return Err(ServiceError::Validation("Missing required fields".into()));
        };
        if new.title.is_empty() || new.artist.is_empty() {
            return Err(ServiceError::Validation("Missing required fields".into()));
        }

        let id = Uuid::new_v4().to_string();

        let audio_key = format!("tracks/{id}/audio.{}", ext_from_mime(&audio.content_type).unwrap_or("mp3"));
        self.store.put(&audio_key, &audio.bytes, &audio.content_type)?;

        let cover_key = match &new.cover {
            Some(cover) => {
                let key = format!("tracks/{id}/cover.{}", ext_from_mime(&cover.content_type).unwrap_or("jpg"));
                self.store.put(&key, &cover.bytes, &cover.content_type)?;
                Some(key)
            }
            None => None,
        };

        let track = Track {
            audio: public_url::join(&self.public_base_url, &audio_key),
            cover: cover_key.map(|key| public_url::join(&self.public_base_url, &key)),
            id,
            title: new.title,
            artist: new.artist,
            genre: if new.genre.is_empty() {
                "Unknown".to_string()
            } else {
                new.genre
            },
            uploader: new.uploader,
            tip_address: (!new.tip_address.is_empty()).then_some(new.tip_address),
            likes_count: 0,
            tip_total_sats: 0,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let mut index = self.list_tracks()?;
        index.push(track.clone());
        let doc = serde_json::to_vec_pretty(&index)?;
        self.store.put(INDEX_KEY, &doc, "application/json")?;

        Ok(track)
    }
}

/// Maps an upload MIME type to the stored file extension. Returns None for
/// unrecognized types; callers fall back per media kind.
fn ext_from_mime(mime: &str) -> Option<&'static str> {
    if mime.contains("audio/mpeg") {
        Some("mp3")
    } else if mime.contains("audio/wav") {
        Some("wav")
    } else if mime.contains("audio/ogg") {
        Some("ogg")
    } else if mime.contains("image/png") {
        Some("png")
    } else if mime.contains("image/jpeg") {
        Some("jpg")
    } else if mime.contains("image/webp") {
        Some("webp")
    } else if mime.contains("image/svg+xml") {
        Some("svg")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryBlobStore;

    fn service() -> (Arc<MemoryBlobStore>, TrackIndexService) {
        let store = Arc::new(MemoryBlobStore::new());
        let svc = TrackIndexService::new(store.clone(), "http://cdn.test".to_string());
        (store, svc)
    }

    fn audio() -> Option<Media> {
        Some(Media {
            bytes: b"mp3bytes".to_vec(),
            content_type: "audio/mpeg".to_string(),
        })
    }

    fn candidate() -> NewTrack {
        NewTrack {
            title: "T".into(),
            artist: "A".into(),
            audio: audio(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_store_lists_no_tracks() {
        let (_, svc) = service();

        assert!(svc.list_tracks().unwrap().is_empty());
    }

    #[test]
    fn unparsable_index_document_lists_as_empty() {
        let (store, svc) = service();
        store
            .put(INDEX_KEY, b"not an array", "application/json")
            .unwrap();

        assert!(svc.list_tracks().unwrap().is_empty());
    }

    #[test]
    fn append_then_list_includes_the_track() {
        let (_, svc) = service();

        let track = svc.append_track(candidate()).unwrap();

        assert!(!track.id.is_empty());
        assert_eq!(track.likes_count, 0);
        assert_eq!(track.tip_total_sats, 0);
        assert_eq!(track.genre, "Unknown");
        assert_eq!(track.tip_address, None);
        assert_eq!(track.cover, None);

        let listed = svc.list_tracks().unwrap();
        assert_eq!(listed, vec![track]);
    }

    #[test]
    fn append_stores_audio_under_the_track_key() {
        let (store, svc) = service();

        let track = svc.append_track(candidate()).unwrap();

        let key = format!("tracks/{}/audio.mp3", track.id);
        assert_eq!(track.audio, format!("http://cdn.test/{key}"));
        assert_eq!(store.get(&key).unwrap().unwrap().bytes, b"mp3bytes");
    }

    #[test]
    fn append_stores_optional_cover() {
        let (store, svc) = service();
        let mut new = candidate();
        new.cover = Some(Media {
            bytes: b"png".to_vec(),
            content_type: "image/png".to_string(),
        });

        let track = svc.append_track(new).unwrap();

        let key = format!("tracks/{}/cover.png", track.id);
        assert_eq!(track.cover, Some(format!("http://cdn.test/{key}")));
        assert!(store.get(&key).unwrap().is_some());
    }

    #[test]
    fn append_keeps_provided_fields() {
        let (_, svc) = service();
        let new = NewTrack {
            genre: "Jazz".into(),
            uploader: "u".into(),
            tip_address: "addr".into(),
            ..candidate()
        };

        let track = svc.append_track(new).unwrap();

        assert_eq!(track.genre, "Jazz");
        assert_eq!(track.uploader, "u");
        assert_eq!(track.tip_address, Some("addr".into()));
    }

    #[test]
    fn append_requires_audio_title_and_artist() {
        let (_, svc) = service();

        let missing_audio = NewTrack {
            audio: None,
            ..candidate()
        };
        let missing_title = NewTrack {
            title: String::new(),
            ..candidate()
        };
        let missing_artist = NewTrack {
            artist: String::new(),
            ..candidate()
        };

        for new in [missing_audio, missing_title, missing_artist] {
            let err = svc.append_track(new).unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }
    }

    #[test]
    fn second_append_extends_the_index() {
        let (_, svc) = service();

        svc.append_track(candidate()).unwrap();
        svc.append_track(NewTrack {
            title: "T2".into(),
            ..candidate()
        })
        .unwrap();

        let listed = svc.list_tracks().unwrap();
        assert_eq!(listed.len(), 2);
        assert_ne!(listed[0].id, listed[1].id);
    }

    #[test]
    fn append_over_corrupt_index_starts_fresh() {
        let (store, svc) = service();
        store
            .put(INDEX_KEY, b"%%%", "application/json")
            .unwrap();

        svc.append_track(candidate()).unwrap();

        assert_eq!(svc.list_tracks().unwrap().len(), 1);
    }

    #[test]
    fn unknown_audio_mime_falls_back_to_mp3() {
        let (store, svc) = service();
        let new = NewTrack {
            audio: Some(Media {
                bytes: b"x".to_vec(),
                content_type: "application/octet-stream".into(),
            }),
            ..candidate()
        };

        let track = svc.append_track(new).unwrap();

        let key = format!("tracks/{}/audio.mp3", track.id);
        assert!(store.get(&key).unwrap().is_some());
    }

    #[test]
    fn index_document_is_written_as_json_array() {
        let (store, svc) = service();

        svc.append_track(candidate()).unwrap();

        let doc = store.get(INDEX_KEY).unwrap().unwrap();
        assert_eq!(doc.content_type, "application/json");
        let parsed: serde_json::Value = serde_json::from_slice(&doc.bytes).unwrap();
        assert!(parsed.is_array());
    }
}
