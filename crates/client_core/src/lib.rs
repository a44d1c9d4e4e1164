use std::{path::Path, time::Duration};

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::{ListingResponse, PickBaseResponse, QueryParams, RenameSummary, UploadResult},
    error::extract_error_detail,
    protocol::{
        DownloadAllQuery, DownloadSelectedRequest, OpenFolderRequest, PickBaseRequest,
        RenameSelectedRequest, DOWNLOAD_ALL_PATH, DOWNLOAD_SELECTED_PATH, LIST_PATH,
        OPEN_FOLDER_PATH, PICK_BASE_PATH, RENAME_SELECTED_PATH, UPLOAD_FILES_FIELD, UPLOAD_PATH,
        UPLOAD_SUBFOLDER_FIELD,
    },
};
use tracing::{debug, info};
use url::Url;

pub mod error;
pub mod sink;
pub mod state;
pub mod view;
pub mod workflow;

pub use error::ClientError;
pub use sink::{DeliveryOutcome, DirectorySink, DialogSink, FileSink, RfdSaveDialog, SaveDialog};
pub use state::{PreviewArea, PreviewCard, UiEvent, UiState};
pub use workflow::WorkflowController;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const OCTET_STREAM: &str = "application/octet-stream";

/// A file picked for upload, already read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_guess::from_path(&file_name)
            .first_raw()
            .unwrap_or(OCTET_STREAM)
            .to_string();
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> ClientResult<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| ClientError::io(path, err))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(file_name, bytes))
    }
}

/// Backend operations the workflow depends on.
#[async_trait]
pub trait RenamerApi: Send + Sync {
    async fn upload(&self, subcarpeta: &str, files: Vec<UploadFile>) -> ClientResult<UploadResult>;
    async fn list(&self, params: &QueryParams) -> ClientResult<ListingResponse>;
    async fn rename_selected(&self, request: &RenameSelectedRequest)
        -> ClientResult<RenameSummary>;
    async fn download_selected(&self, request: &DownloadSelectedRequest) -> ClientResult<Vec<u8>>;
    async fn download_all(&self, subcarpeta: &str) -> ClientResult<Vec<u8>>;
    async fn pick_base(&self) -> ClientResult<PickBaseResponse>;
    async fn open_folder(&self, folder: &str) -> ClientResult<()>;
    /// Turns a preview item URL into something openable outside the backend.
    fn resolve_asset_url(&self, url: &str) -> String;
}

pub struct RenamerClient {
    http: Client,
    api_base: String,
    /// `api_base` with a trailing slash so joins keep any path prefix.
    asset_root: Url,
}

impl RenamerClient {
    pub fn new(api_base: &str) -> ClientResult<Self> {
        Self::with_timeout(api_base, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(api_base: &str, timeout: Duration) -> ClientResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Self::with_http_client(http, api_base)
    }

    pub fn with_http_client(http: Client, api_base: &str) -> ClientResult<Self> {
        let api_base = api_base.trim().trim_end_matches('/').to_string();
        let asset_root = Url::parse(&format!("{api_base}/"))?;
        Ok(Self {
            http,
            api_base,
            asset_root,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: DeserializeOwned + Send,
    {
        debug!(path, "POST json");
        let response = self.http.post(self.endpoint(path)).json(body).send().await?;
        decode_json(ensure_success(response).await?).await
    }
}

/// Maps non-2xx responses to `ClientError::Http` with the best detail the
/// body offers.
async fn ensure_success(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Http {
        status: status.as_u16(),
        detail: extract_error_detail(&body),
    })
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl RenamerApi for RenamerClient {
    async fn upload(&self, subcarpeta: &str, files: Vec<UploadFile>) -> ClientResult<UploadResult> {
        let file_count = files.len();
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.mime_type)?;
            form = form.part(UPLOAD_FILES_FIELD, part);
        }
        form = form.text(UPLOAD_SUBFOLDER_FIELD, subcarpeta.to_string());

        let response = self
            .http
            .post(self.endpoint(UPLOAD_PATH))
            .multipart(form)
            .send()
            .await?;
        let result: UploadResult = decode_json(ensure_success(response).await?).await?;
        info!(
            files = file_count,
            saved = result.saved.len(),
            folder = %result.folder,
            "upload complete"
        );
        Ok(result)
    }

    async fn list(&self, params: &QueryParams) -> ClientResult<ListingResponse> {
        let listing: ListingResponse = self.post_json(LIST_PATH, params).await?;
        info!(
            subcarpeta = %params.subcarpeta,
            count = listing.count,
            "listing received"
        );
        Ok(listing)
    }

    async fn rename_selected(
        &self,
        request: &RenameSelectedRequest,
    ) -> ClientResult<RenameSummary> {
        let summary: RenameSummary = self.post_json(RENAME_SELECTED_PATH, request).await?;
        info!(
            selected = request.selected.len(),
            renamed = summary.renamed,
            skipped = summary.skipped,
            errors = summary.errors,
            "rename complete"
        );
        Ok(summary)
    }

    async fn download_selected(&self, request: &DownloadSelectedRequest) -> ClientResult<Vec<u8>> {
        let response = self
            .http
            .post(self.endpoint(DOWNLOAD_SELECTED_PATH))
            .json(request)
            .send()
            .await?;
        let bytes = ensure_success(response).await?.bytes().await?;
        info!(
            subcarpeta = %request.subcarpeta,
            selected = request.selected.len(),
            size_bytes = bytes.len(),
            "archive received"
        );
        Ok(bytes.to_vec())
    }

    async fn download_all(&self, subcarpeta: &str) -> ClientResult<Vec<u8>> {
        let response = self
            .http
            .get(self.endpoint(DOWNLOAD_ALL_PATH))
            .query(&DownloadAllQuery {
                subcarpeta: subcarpeta.to_string(),
            })
            .send()
            .await?;
        let bytes = ensure_success(response).await?.bytes().await?;
        info!(subcarpeta, size_bytes = bytes.len(), "archive received");
        Ok(bytes.to_vec())
    }

    async fn pick_base(&self) -> ClientResult<PickBaseResponse> {
        self.post_json(PICK_BASE_PATH, &PickBaseRequest::default())
            .await
    }

    async fn open_folder(&self, folder: &str) -> ClientResult<()> {
        let response = self
            .http
            .post(self.endpoint(OPEN_FOLDER_PATH))
            .json(&OpenFolderRequest {
                folder: folder.to_string(),
            })
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    fn resolve_asset_url(&self, url: &str) -> String {
        self.asset_root
            .join(url.trim_start_matches('/'))
            .map(String::from)
            .unwrap_or_else(|_| url.to_string())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/mock_backend.rs"]
pub(crate) mod mock_backend;
