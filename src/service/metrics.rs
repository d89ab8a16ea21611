use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};

use crate::{
    domain::metrics::{self, MetricsEvent, MetricsRecord},
    service::error::ServiceError,
    storage::kv::KeyValueStore,
};

pub const MAX_DEVICE_LEN: usize = 100;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackMetrics {
    pub id: String,
    #[serde(rename = "playCount")]
    pub play_count: u64,
    #[serde(rename = "likesCount")]
    pub likes_count: u64,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayCount {
    pub id: String,
    #[serde(rename = "playCount")]
    pub play_count: u64,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct LikeCount {
    pub id: String,
    #[serde(rename = "likesCount")]
    pub likes_count: u64,
}

/// Read-modify-write of a single track's metrics record, keyed by track id.
/// Ids are free-form strings: metrics may exist for ids with no catalog
/// entry.
///
/// The store is last-write-wins with no conditional puts, so two concurrent
/// writers for the same id can lose one update. The per-id lock map below
/// serializes writers within this process, which narrows the window but
/// gives no cross-process atomicity.
pub struct MetricsService {
    store: Arc<dyn KeyValueStore>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MetricsService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Fetches metrics for each id, preserving caller order and duplicates.
    /// An absent record, a malformed record, or a store fault for one id all
    /// degrade to zero values instead of failing the batch.
    pub fn get_batch(&self, ids: &[String]) -> Vec<TrackMetrics> {
        ids.iter()
            .map(|id| {
                let raw = self.store.get(id).ok().flatten();
                let record = metrics::decode(raw.as_deref()).into_record();
                TrackMetrics {
                    id: id.clone(),
                    play_count: record.play_count,
                    likes_count: record.likes_count(),
                }
            })
            .collect()
    }

    pub fn record_play(&self, id: &str) -> Result<PlayCount, ServiceError> {
        let record = self.mutate(id, MetricsEvent::Play)?;
        Ok(PlayCount {
            id: id.to_string(),
            play_count: record.play_count,
        })
    }

    /// Adds or removes a device from the track's like set. Idempotent:
    /// repeating the same call leaves stored state and the returned count
    /// unchanged.
    pub fn set_like(&self, id: &str, device: &str, like: bool) -> Result<LikeCount, ServiceError> {
        let device: String = device.chars().take(MAX_DEVICE_LEN).collect();
        if device.is_empty() {
            return Err(ServiceError::Validation("device required".into()));
        }

        let event = if like {
            MetricsEvent::Like(device)
        } else {
            MetricsEvent::Unlike(device)
        };
        let record = self.mutate(id, event)?;
        Ok(LikeCount {
            id: id.to_string(),
            likes_count: record.likes_count(),
        })
    }

    fn mutate(&self, id: &str, event: MetricsEvent) -> Result<MetricsRecord, ServiceError> {
        let lock = self.lock_for(id);
        // a poisoned guard only means a previous writer panicked mid-update;
        // the record itself lives in the store, so carry on
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let raw = self.store.get(id)?;
        let record = metrics::decode(raw.as_deref()).into_record().apply(event);
        self.store.put(id, &metrics::encode(&record)?)?;
        Ok(record)
    }

    fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(id.to_string()).or_default().clone()
    }
}
