// ==========================================
// Water Survey Catalog - Workbook Sources
// ==========================================
// Where the spreadsheet payload comes from. The remote
// source is the production path (third-party sheet behind
// an HTTP GET); the file source covers local imports and
// keeps tests hermetic.
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::workbook::Workbook;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

// ==========================================
// SheetSource Trait
// ==========================================
// The orchestrator's only view of the outside world.
#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn fetch_workbook(&self) -> ImportResult<Workbook>;
}

#[async_trait]
impl<T: SheetSource + ?Sized> SheetSource for std::sync::Arc<T> {
    async fn fetch_workbook(&self) -> ImportResult<Workbook> {
        (**self).fetch_workbook().await
    }
}

// ==========================================
// RemoteWorkbookSource - HTTP GET + parse
// ==========================================
// The only operation in the pipeline that may block for a
// non-trivial duration; it always carries a timeout.
pub struct RemoteWorkbookSource {
    client: reqwest::Client,
    url: String,
}

impl RemoteWorkbookSource {
    pub fn new(url: &str, timeout: Duration) -> ImportResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ImportError::RemoteFetch(e.to_string()))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl SheetSource for RemoteWorkbookSource {
    async fn fetch_workbook(&self) -> ImportResult<Workbook> {
        debug!(url = %self.url, "fetching remote workbook");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ImportError::RemoteFetch(e.to_string()))?;

        let bytes = response.bytes().await?;
        info!(bytes = bytes.len(), "remote workbook downloaded");

        Workbook::from_xlsx_bytes(&bytes)
    }
}

// ==========================================
// FileWorkbookSource - local xlsx/csv
// ==========================================
pub struct FileWorkbookSource {
    path: PathBuf,
}

impl FileWorkbookSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SheetSource for FileWorkbookSource {
    async fn fetch_workbook(&self) -> ImportResult<Workbook> {
        debug!(path = %self.path.display(), "reading local workbook");
        Workbook::from_path(&self.path)
    }
}
