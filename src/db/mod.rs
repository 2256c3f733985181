pub(crate) mod models;
pub(crate) mod types;

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::core::config::Settings;

const EXAMS_DIR: &str = "exams";
const RESULTS_FILE: &str = "results.json";

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid record id: {0}")]
    InvalidId(String),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json { path: path.to_path_buf(), source }
    }
}

/// Root of the file-based store.
#[derive(Debug, Clone)]
pub(crate) struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn exams_dir(&self) -> PathBuf {
        self.root.join(EXAMS_DIR)
    }

    pub(crate) fn results_file(&self) -> PathBuf {
        self.root.join(RESULTS_FILE)
    }

    /// Path of one exam record. Ids become file names, so separators and dot-only ids are refused.
    pub(crate) fn exam_file(&self, id: &str) -> Result<PathBuf, StoreError> {
        let valid = !id.is_empty()
            && id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !id.chars().all(|c| c == '.');
        if !valid {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.exams_dir().join(format!("{id}.json")))
    }

    /// Checks that the store accepts writes by creating and removing a probe file.
    pub(crate) async fn probe_writable(&self) -> Result<(), StoreError> {
        let probe = self.root.join(format!(".probe-{}", Uuid::new_v4().simple()));
        tokio::fs::write(&probe, b"ok").await.map_err(|err| StoreError::io(&probe, err))?;
        tokio::fs::remove_file(&probe).await.map_err(|err| StoreError::io(&probe, err))?;
        Ok(())
    }
}

pub(crate) async fn init_data_dir(settings: &Settings) -> Result<DataDir, StoreError> {
    let root = settings.storage().data_dir.clone();
    let data_dir = DataDir { root };
    let exams_dir = data_dir.exams_dir();
    tokio::fs::create_dir_all(&exams_dir).await.map_err(|err| StoreError::io(&exams_dir, err))?;

    tracing::info!(path = %data_dir.root().display(), "Data directory ready");
    Ok(data_dir)
}

/// Reads a JSON document, mapping a missing file to `None`.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(StoreError::io(path, err)),
    };

    serde_json::from_slice(&bytes).map(Some).map_err(|err| StoreError::json(path, err))
}

/// Writes through a sibling temp file and renames it into place.
pub(crate) async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|err| StoreError::json(path, err))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|err| StoreError::io(parent, err))?;
    }

    let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or("record");
    let temp_path = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

    tokio::fs::write(&temp_path, &bytes).await.map_err(|err| StoreError::io(&temp_path, err))?;
    if let Err(err) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(StoreError::io(path, err));
    }

    Ok(())
}

#[cfg(test)]
impl DataDir {
    pub(crate) fn for_tests(root: &Path) -> Self {
        Self { root: root.to_path_buf() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exam_file_rejects_path_traversal() {
        let data_dir = DataDir::for_tests(Path::new("/tmp/kiemtra"));

        assert!(data_dir.exam_file("exam_1700000000000").is_ok());
        assert!(matches!(data_dir.exam_file("../secret"), Err(StoreError::InvalidId(_))));
        assert!(matches!(data_dir.exam_file(".."), Err(StoreError::InvalidId(_))));
        assert!(matches!(data_dir.exam_file(""), Err(StoreError::InvalidId(_))));
    }

    #[tokio::test]
    async fn write_then_read_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("doc.json");

        write_json_atomic(&path, &serde_json::json!({"ok": true})).await.expect("write");
        let value: Option<serde_json::Value> = read_json(&path).await.expect("read");

        assert_eq!(value, Some(serde_json::json!({"ok": true})));
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test]
    async fn read_json_missing_file_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let value: Option<serde_json::Value> =
            read_json(&dir.path().join("absent.json")).await.expect("read");
        assert!(value.is_none());
    }
}
