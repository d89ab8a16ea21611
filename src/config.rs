use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub http: HttpConfig,
    pub metrics_store: MetricsStore,
    pub blob_store: BlobStoreConfig,
    #[serde(default)]
    pub upload: UploadLimits,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {path}"))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config TOML")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

fn default_allowed_origin() -> String {
    "*".to_string()
}

#[derive(Debug, Deserialize)]
pub struct MetricsStore {
    pub in_memory: bool,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct BlobStoreConfig {
    pub in_memory: bool,
    pub root: Option<PathBuf>,
    /// Base URL under which stored blobs are publicly reachable.
    pub public_base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadLimits {
    #[serde(default = "default_max_audio_bytes")]
    pub max_audio_bytes: usize,
    #[serde(default = "default_max_cover_bytes")]
    pub max_cover_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_audio_bytes: default_max_audio_bytes(),
            max_cover_bytes: default_max_cover_bytes(),
        }
    }
}

fn default_max_audio_bytes() -> usize {
    26_214_400
}

fn default_max_cover_bytes() -> usize {
    3_145_728
}
