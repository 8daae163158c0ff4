//! Storage collaborator: fetches stored PDF bytes.

use std::path::{Component, Path, PathBuf};

use reqwest::{StatusCode, Url};

use crate::config::SupabaseConfig;
use crate::error::{Error, Result};

/// Source of stored PDF objects.
pub trait Storage: Send + Sync {
    /// Fetch the object at `path`.
    ///
    /// Fails with [`Error::ObjectNotFound`] when the object is missing and
    /// [`Error::Storage`] when the transfer fails.
    fn download(&self, path: &str) -> Result<Vec<u8>>;
}

/// Supabase Storage over its REST API.
pub struct SupabaseStorage {
    client: reqwest::blocking::Client,
    config: SupabaseConfig,
    bucket_url: Url,
}

impl SupabaseStorage {
    /// Create a storage client.
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("pdf-pipeline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {}", e)))?;
        let bucket_url = bucket_url(&config)?;
        Ok(Self {
            client,
            config,
            bucket_url,
        })
    }

    /// URL of an object in the configured bucket.
    ///
    /// Each path segment is percent-encoded, so `#`, `?` and spaces in
    /// file names stay part of the object key.
    pub fn object_url(&self, path: &str) -> String {
        let mut url = self.bucket_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
        }
        url.to_string()
    }
}

fn bucket_url(config: &SupabaseConfig) -> Result<Url> {
    let mut url = Url::parse(config.base_url())
        .map_err(|e| Error::Config(format!("Supabase URL: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("Supabase URL has no path: {}", config.url)))?
        .pop_if_empty()
        .extend(["storage", "v1", "object", config.bucket.as_str()]);
    Ok(url)
}

impl Storage for SupabaseStorage {
    fn download(&self, path: &str) -> Result<Vec<u8>> {
        let storage_error = |reason: String| Error::Storage {
            path: path.to_string(),
            reason,
        };

        let response = self
            .client
            .get(self.object_url(path))
            .header("apikey", &self.config.service_role_key)
            .bearer_auth(&self.config.service_role_key)
            .send()
            .map_err(|e| storage_error(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::ObjectNotFound(path.to_string()));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(storage_error(format!("HTTP {}: {}", status, body.trim())));
        }

        let bytes = response.bytes().map_err(|e| storage_error(e.to_string()))?;
        log::debug!("Downloaded {} bytes from {}", bytes.len(), path);
        Ok(bytes.to_vec())
    }
}

/// Objects stored as files under a root directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Serve objects from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe {
            return Err(Error::Storage {
                path: path.to_string(),
                reason: "path must be relative and stay inside the storage root".into(),
            });
        }
        Ok(self.root.join(relative))
    }
}

impl Storage for LocalStorage {
    fn download(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        std::fs::read(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ObjectNotFound(path.to_string()),
            _ => Error::Storage {
                path: path.to_string(),
                reason: e.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_object_url() {
        let storage =
            SupabaseStorage::new(SupabaseConfig::new("https://proj.supabase.co/", "key")).unwrap();
        assert_eq!(
            storage.object_url("/user-1/report.pdf"),
            "https://proj.supabase.co/storage/v1/object/documents/user-1/report.pdf"
        );
    }

    #[test]
    fn test_object_url_escapes_file_names() {
        let storage =
            SupabaseStorage::new(SupabaseConfig::new("https://proj.supabase.co", "key")).unwrap();
        assert_eq!(
            storage.object_url("user-1/Q#1 report?.pdf"),
            "https://proj.supabase.co/storage/v1/object/documents/user-1/Q%231%20report%3F.pdf"
        );
    }

    #[test]
    fn test_supabase_storage_rejects_unparsable_url() {
        assert!(matches!(
            SupabaseStorage::new(SupabaseConfig::new("not a url", "key")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_supabase_storage_requires_config() {
        assert!(SupabaseStorage::new(SupabaseConfig::new("", "")).is_err());
    }

    #[test]
    fn test_local_storage_reads_nested_objects() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("user-1")).unwrap();
        std::fs::write(dir.path().join("user-1/a.pdf"), b"%PDF-1.4").unwrap();

        let storage = LocalStorage::new(dir.path());
        assert_eq!(storage.download("user-1/a.pdf").unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn test_local_storage_missing_object() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalStorage::new(dir.path())
            .download("nope.pdf")
            .unwrap_err();
        assert!(matches!(err, Error::ObjectNotFound(_)));
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
    }

    #[test]
    fn test_local_storage_rejects_escapes() {
        let storage = LocalStorage::new("/srv/objects");
        for path in ["../etc/passwd", "/etc/passwd", "a/../../b", ""] {
            assert!(
                matches!(storage.download(path), Err(Error::Storage { .. })),
                "accepted {:?}",
                path
            );
        }
    }
}
