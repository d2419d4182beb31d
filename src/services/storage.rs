use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::io::AsyncWriteExt;

use crate::models::tool::ImageInfo;

/// Extensions treated as generated images when listing.
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "gif"];

/// Flat on-disk store for generated images.
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Open the store, creating the output directory if it is missing.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::Io { path: root.clone(), source: e })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write image bytes under `filename`, returning the full path.
    ///
    /// Never overwrites: an existing file with the same name is an error.
    pub async fn save(&self, filename: &str, data: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.resolve(filename)?;
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(filename.to_string()))
            }
            Err(e) => return Err(StorageError::Io { path, source: e }),
        };
        file.write_all(data)
            .await
            .map_err(|e| StorageError::Io { path: path.clone(), source: e })?;
        file.flush()
            .await
            .map_err(|e| StorageError::Io { path: path.clone(), source: e })?;
        Ok(path)
    }

    /// List images, newest first, optionally keeping only names containing `pattern`.
    pub async fn list(&self, pattern: Option<&str>) -> Result<Vec<ImageInfo>, StorageError> {
        let needle = pattern
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_lowercase);

        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| StorageError::Io { path: self.root.clone(), source: e })?;

        let mut images = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::Io { path: self.root.clone(), source: e })?
        {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            if !is_image(&path) {
                continue;
            }
            if let Some(needle) = &needle {
                if !name.to_lowercase().contains(needle.as_str()) {
                    continue;
                }
            }

            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                // Removed between read_dir and stat.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::Io { path, source: e }),
            };
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            let created = metadata.created().unwrap_or(modified);

            images.push(ImageInfo {
                name,
                path: path.display().to_string(),
                size: metadata.len(),
                created_at: DateTime::<Utc>::from(created),
                modified_at: DateTime::<Utc>::from(modified),
            });
        }

        images.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(images)
    }

    /// Delete one file from the output directory.
    pub async fn delete(&self, filename: &str) -> Result<(), StorageError> {
        let path = self.resolve(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(filename.to_string()))
            }
            Err(e) => Err(StorageError::Io { path, source: e }),
        }
    }

    /// Only bare file names are accepted; anything that could escape the root is rejected.
    fn resolve(&self, filename: &str) -> Result<PathBuf, StorageError> {
        let name = filename.trim();
        if name.is_empty()
            || name == "."
            || name.contains("..")
            || name.contains('/')
            || name.contains('\\')
            || name.contains('\0')
        {
            return Err(StorageError::InvalidName(filename.to_string()));
        }
        Ok(self.root.join(name))
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Image not found: {0}")]
    NotFound(String),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("Image already exists: {0}")]
    AlreadyExists(String),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
