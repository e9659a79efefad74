use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::payload::DigestPayload;

const LATEST_FILE: &str = "latest.json";
const ARCHIVE_DIR: &str = "archive";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid digest JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("latest.json not found: {0}")]
    MissingLatest(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDigest {
    pub latest: PathBuf,
    pub archive: PathBuf,
}

/// `data/latest.json` plus one `data/archive/<date>.json` per target day.
#[derive(Debug, Clone)]
pub struct DigestStore {
    data_dir: PathBuf,
}

impl DigestStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn latest_path(&self) -> PathBuf {
        self.data_dir.join(LATEST_FILE)
    }

    pub fn archive_path(&self, payload: &DigestPayload) -> PathBuf {
        self.data_dir
            .join(ARCHIVE_DIR)
            .join(format!("{}.json", payload.target_date_hkt.format("%Y-%m-%d")))
    }

    pub fn ensure_dirs(&self) -> Result<(), StoreError> {
        let archive = self.data_dir.join(ARCHIVE_DIR);
        fs::create_dir_all(&archive).map_err(|source| StoreError::Io {
            path: archive,
            source,
        })
    }

    pub fn save(&self, payload: &DigestPayload) -> Result<SavedDigest, StoreError> {
        self.ensure_dirs()?;

        let latest = self.latest_path();
        let archive = self.archive_path(payload);
        let json = payload.to_pretty_json().map_err(|source| StoreError::Json {
            path: latest.clone(),
            source,
        })?;

        for path in [&latest, &archive] {
            fs::write(path, json.as_bytes()).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), "saved digest");
        }

        Ok(SavedDigest { latest, archive })
    }

    pub fn load_latest(&self) -> Result<DigestPayload, StoreError> {
        let path = self.latest_path();
        if !path.exists() {
            return Err(StoreError::MissingLatest(path));
        }

        let raw = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StoreError::Json { path, source })
    }
}
