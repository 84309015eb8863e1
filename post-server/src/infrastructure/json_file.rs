use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum JsonFileError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed json in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode json for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl JsonFileError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        JsonFileError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Reads and decodes a JSON document. `Ok(None)` when the file does not exist.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, JsonFileError> {
    let raw = match fs::read(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(JsonFileError::io(path, err)),
    };

    serde_json::from_slice(&raw)
        .map(Some)
        .map_err(|source| JsonFileError::Malformed {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes the whole document to a sibling temp file, then renames it over `path`.
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), JsonFileError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|err| JsonFileError::io(parent, err))?;
    }

    let mut body = serde_json::to_vec_pretty(value).map_err(|source| JsonFileError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    body.push(b'\n');

    let tmp = tmp_path(path);
    fs::write(&tmp, &body)
        .await
        .map_err(|err| JsonFileError::io(&tmp, err))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|err| JsonFileError::io(path, err))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let value: Option<Value> = read_json(&dir.path().join("absent.json")).await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn write_preserves_non_ascii_and_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("doc.json");

        write_json(&path, &json!({ "title": "咖啡 ☕" })).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("咖啡 ☕"));
        assert!(text.contains("\n  \"title\""));
        assert!(!dir.path().join("nested").join("doc.json.tmp").exists());
    }

    #[tokio::test]
    async fn malformed_document_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result: Result<Option<Value>, _> = read_json(&path).await;
        assert!(matches!(result, Err(JsonFileError::Malformed { .. })));
    }

    #[tokio::test]
    async fn unencodable_value_is_an_encode_error() {
        use std::collections::HashMap;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        // JSON object keys must be strings.
        let value = HashMap::from([((1u8, 2u8), "pair")]);

        let result = write_json(&path, &value).await;

        assert!(matches!(result, Err(JsonFileError::Encode { .. })));
        assert!(!path.exists());
    }
}
