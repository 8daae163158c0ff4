//! Database collaborator: persists extraction results and document status.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SupabaseConfig;
use crate::error::{Error, Result};
use crate::job::validate_document_id;
use crate::model::{DocumentStatus, ExtractionResult};

/// Sink for extraction results and status changes.
///
/// The job processor never reads back what it writes.
pub trait Database: Send + Sync {
    /// Persist a completed extraction.
    fn save_extraction(&self, document_id: &str, result: &ExtractionResult) -> Result<()>;

    /// Record a status change, with the page count and error message when known.
    fn update_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
        pages: Option<u32>,
        error_message: Option<&str>,
    ) -> Result<()>;
}

/// Row written to the `extractions` table.
///
/// Carries the full result as structured JSON plus flattened summary columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub document_id: String,
    pub raw_text: String,
    pub content_json: serde_json::Value,
    pub extraction_method: String,
    pub tables_count: usize,
    pub images_count: usize,
}

impl ExtractionRecord {
    /// Flatten a result into a row.
    pub fn from_result(document_id: &str, result: &ExtractionResult) -> Result<Self> {
        Ok(Self {
            document_id: document_id.to_string(),
            raw_text: result.raw_text.clone(),
            content_json: serde_json::to_value(result)?,
            extraction_method: result.metadata.extraction_method.to_string(),
            tables_count: result.metadata.total_tables,
            images_count: result.total_images(),
        })
    }
}

/// Patch applied to a `documents` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: DocumentStatus,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl StatusUpdate {
    /// Build a patch stamped with the current time.
    pub fn new(status: DocumentStatus, pages: Option<u32>, error_message: Option<&str>) -> Self {
        Self {
            status,
            updated_at: Utc::now(),
            pages,
            error_message: error_message.map(String::from),
        }
    }
}

/// Supabase tables over PostgREST.
pub struct SupabaseDatabase {
    client: reqwest::blocking::Client,
    config: SupabaseConfig,
}

impl SupabaseDatabase {
    /// Create a database client.
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("pdf-pipeline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.base_url(), table)
    }

    fn send(&self, request: reqwest::blocking::RequestBuilder, what: &str) -> Result<()> {
        let response = request
            .header("apikey", &self.config.service_role_key)
            .bearer_auth(&self.config.service_role_key)
            .header("Prefer", "return=minimal")
            .send()
            .map_err(|e| Error::Database(format!("{}: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Database(format!(
                "{}: HTTP {}: {}",
                what,
                status,
                body.trim()
            )));
        }
        Ok(())
    }
}

impl Database for SupabaseDatabase {
    fn save_extraction(&self, document_id: &str, result: &ExtractionResult) -> Result<()> {
        let record = ExtractionRecord::from_result(document_id, result)?;
        let request = self.client.post(self.table_url("extractions")).json(&record);
        self.send(request, "insert extraction")?;
        log::info!("[{}] Saved extraction", document_id);
        Ok(())
    }

    fn update_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
        pages: Option<u32>,
        error_message: Option<&str>,
    ) -> Result<()> {
        let update = StatusUpdate::new(status, pages, error_message);
        let request = self
            .client
            .patch(self.table_url("documents"))
            .query(&[("id", format!("eq.{}", document_id))])
            .json(&update);
        self.send(request, "update document status")?;
        log::debug!("[{}] Status set to {}", document_id, status);
        Ok(())
    }
}

/// Results and statuses kept as files, for local runs.
///
/// Writes `{id}.extraction.json` and appends to `{id}.status.jsonl`.
#[derive(Debug, Clone)]
pub struct FsDatabase {
    root: PathBuf,
}

impl FsDatabase {
    /// Store under `root`, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the extraction file for a document.
    pub fn extraction_path(&self, document_id: &str) -> Result<PathBuf> {
        validate_document_id(document_id)?;
        Ok(self.root.join(format!("{}.extraction.json", document_id)))
    }

    /// Path of the status log for a document.
    pub fn status_path(&self, document_id: &str) -> Result<PathBuf> {
        validate_document_id(document_id)?;
        Ok(self.root.join(format!("{}.status.jsonl", document_id)))
    }

    /// Read a saved extraction back.
    pub fn load_extraction(&self, document_id: &str) -> Result<ExtractionRecord> {
        let data = std::fs::read(self.extraction_path(document_id)?)?;
        serde_json::from_slice(&data).map_err(|e| Error::Database(e.to_string()))
    }

    /// Read every status update recorded for a document, oldest first.
    pub fn status_history(&self, document_id: &str) -> Result<Vec<StatusUpdate>> {
        let path = self.status_path(document_id)?;
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(std::fs::File::open(path)?);
        let mut updates = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            updates.push(serde_json::from_str(&line).map_err(|e| Error::Database(e.to_string()))?);
        }
        Ok(updates)
    }
}

impl Database for FsDatabase {
    fn save_extraction(&self, document_id: &str, result: &ExtractionResult) -> Result<()> {
        let record = ExtractionRecord::from_result(document_id, result)?;
        let json = serde_json::to_vec_pretty(&record)?;
        std::fs::write(self.extraction_path(document_id)?, json)
            .map_err(|e| Error::Database(format!("write extraction: {}", e)))?;
        log::info!("[{}] Saved extraction", document_id);
        Ok(())
    }

    fn update_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
        pages: Option<u32>,
        error_message: Option<&str>,
    ) -> Result<()> {
        let update = StatusUpdate::new(status, pages, error_message);
        let mut line = serde_json::to_string(&update)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.status_path(document_id)?)
            .map_err(|e| Error::Database(format!("open status log: {}", e)))?;
        file.write_all(line.as_bytes())
            .map_err(|e| Error::Database(format!("append status: {}", e)))?;

        log::debug!("[{}] Status set to {}", document_id, status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExtractionMetadata, ExtractionMethod, PageContent};

    fn sample_result() -> ExtractionResult {
        let mut page2 = PageContent::new(2, "World");
        page2.images_count = 2;
        let mut page1 = PageContent::new(1, "Hello");
        page1.images_count = 1;
        ExtractionResult {
            document_id: "doc-1".into(),
            status: DocumentStatus::Completed,
            metadata: ExtractionMetadata {
                total_pages: 2,
                total_tables: 0,
                total_characters: 10,
                processing_time_seconds: 0.01,
                pdf_hash: "00".into(),
                extraction_method: ExtractionMethod::Lopdf,
            },
            raw_text: "Hello\n\nWorld".into(),
            tables: vec![],
            pages: vec![page1, page2],
            errors: vec![],
        }
    }

    #[test]
    fn test_extraction_record_flattens_summary() {
        let record = ExtractionRecord::from_result("doc-1", &sample_result()).unwrap();
        assert_eq!(record.extraction_method, "lopdf");
        assert_eq!(record.images_count, 3);
        assert_eq!(record.tables_count, 0);
        assert_eq!(record.content_json["metadata"]["total_pages"], 2);
        assert_eq!(record.raw_text, "Hello\n\nWorld");
    }

    #[test]
    fn test_status_update_omits_absent_fields() {
        let json = serde_json::to_value(StatusUpdate::new(DocumentStatus::Extracting, None, None))
            .unwrap();
        assert_eq!(json["status"], "extracting");
        assert!(json.get("pages").is_none());
        assert!(json.get("error_message").is_none());
        assert!(json["updated_at"].as_str().unwrap().contains('T'));

        let json = serde_json::to_value(StatusUpdate::new(
            DocumentStatus::Failed,
            Some(3),
            Some("boom"),
        ))
        .unwrap();
        assert_eq!(json["pages"], 3);
        assert_eq!(json["error_message"], "boom");
    }

    #[test]
    fn test_fs_database_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = FsDatabase::new(dir.path().join("out")).unwrap();

        db.update_status("doc-1", DocumentStatus::Downloading, None, None)
            .unwrap();
        db.save_extraction("doc-1", &sample_result()).unwrap();
        db.update_status("doc-1", DocumentStatus::Completed, Some(2), None)
            .unwrap();

        let history = db.status_history("doc-1").unwrap();
        let statuses: Vec<DocumentStatus> = history.iter().map(|u| u.status).collect();
        assert_eq!(
            statuses,
            vec![DocumentStatus::Downloading, DocumentStatus::Completed]
        );
        assert_eq!(history[1].pages, Some(2));

        let record = db.load_extraction("doc-1").unwrap();
        assert_eq!(record.document_id, "doc-1");
        assert!(db.status_history("other").unwrap().is_empty());
    }

    #[test]
    fn test_fs_database_rejects_unsafe_ids() {
        let dir = tempfile::tempdir().unwrap();
        let db = FsDatabase::new(dir.path()).unwrap();
        assert!(db
            .update_status("../escape", DocumentStatus::Failed, None, None)
            .is_err());
    }
}
