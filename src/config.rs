//! Worker limits and paths.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default ceiling on downloaded PDF size, in megabytes.
pub const DEFAULT_MAX_PDF_SIZE_MB: u64 = 50;

/// Default ceiling on page count.
pub const DEFAULT_MAX_PAGES: u32 = 500;

/// Default per-job wall-clock ceiling, in seconds.
pub const DEFAULT_TASK_TIMEOUT_SECS: u64 = 180;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Limits and paths that govern one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    /// Maximum accepted PDF size in bytes
    pub max_pdf_size_bytes: u64,

    /// Maximum accepted page count
    pub max_pages: u32,

    /// Wall-clock ceiling for one job, measured from job start
    pub task_timeout: Duration,

    /// Root under which job-scoped working directories are created
    pub temp_dir: PathBuf,
}

impl WorkerConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the size ceiling in megabytes.
    pub fn with_max_pdf_size_mb(mut self, mb: u64) -> Self {
        self.max_pdf_size_bytes = mb.saturating_mul(BYTES_PER_MB);
        self
    }

    /// Set the size ceiling in bytes.
    pub fn with_max_pdf_size_bytes(mut self, bytes: u64) -> Self {
        self.max_pdf_size_bytes = bytes;
        self
    }

    /// Set the page ceiling.
    pub fn with_max_pages(mut self, pages: u32) -> Self {
        self.max_pages = pages;
        self
    }

    /// Set the per-job time ceiling.
    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    /// Set the per-job time ceiling in seconds.
    pub fn with_task_timeout_secs(self, secs: u64) -> Self {
        self.with_task_timeout(Duration::from_secs(secs))
    }

    /// Set the working-directory root.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// Reject zero ceilings and an empty working root.
    pub fn validate(&self) -> Result<()> {
        if self.max_pdf_size_bytes == 0 {
            return Err(Error::Config("max PDF size must be greater than zero".into()));
        }
        if self.max_pages == 0 {
            return Err(Error::Config("max pages must be greater than zero".into()));
        }
        if self.task_timeout.is_zero() {
            return Err(Error::Config("task timeout must be greater than zero".into()));
        }
        if self.temp_dir.as_os_str().is_empty() {
            return Err(Error::Config("temp dir must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_pdf_size_bytes: DEFAULT_MAX_PDF_SIZE_MB * BYTES_PER_MB,
            max_pages: DEFAULT_MAX_PAGES,
            task_timeout: Duration::from_secs(DEFAULT_TASK_TIMEOUT_SECS),
            temp_dir: std::env::temp_dir().join("pdf-worker"),
        }
    }
}

/// Default storage bucket holding uploaded PDFs.
pub const DEFAULT_STORAGE_BUCKET: &str = "documents";

/// Connection settings for the Supabase REST and storage APIs.
#[derive(Clone, PartialEq)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,

    /// Service-role key sent as `apikey` and bearer token
    pub service_role_key: String,

    /// Storage bucket for PDFs
    pub bucket: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl SupabaseConfig {
    /// Create settings for a project.
    pub fn new(url: impl Into<String>, service_role_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            service_role_key: service_role_key.into(),
            bucket: DEFAULT_STORAGE_BUCKET.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Set the storage bucket.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Project URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Require a URL and a key.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::Config("Supabase URL is required".into()));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(Error::Config(format!(
                "Supabase URL must start with http:// or https://: {}",
                self.url
            )));
        }
        if self.service_role_key.trim().is_empty() {
            return Err(Error::Config("Supabase service role key is required".into()));
        }
        if self.bucket.trim().is_empty() {
            return Err(Error::Config("storage bucket must not be empty".into()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("service_role_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("timeout", &self.timeout)
            .finish()
    }
}
