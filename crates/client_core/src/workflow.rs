//! Event handlers for the upload / preview / rename / download workflow.
//!
//! Each handler runs one request chain to completion and records the
//! outcome in [`UiState`]. Failures never escape a handler; they land in
//! the state's error region.

use std::{path::PathBuf, sync::Arc};

use shared::{
    domain::QueryParams,
    protocol::{ArchiveScope, DownloadSelectedRequest, RenameSelectedRequest},
};
use tracing::{info, warn};

use crate::{
    sink::{DeliveryOutcome, FileSink},
    state::{UiEvent, UiState, PICK_BASE_FAILED_MESSAGE},
    view, ClientResult, RenamerApi, UploadFile,
};

pub struct WorkflowController {
    api: Arc<dyn RenamerApi>,
    sink: Arc<dyn FileSink>,
    state: UiState,
}

impl WorkflowController {
    pub fn new(api: Arc<dyn RenamerApi>, sink: Arc<dyn FileSink>) -> Self {
        Self {
            api,
            sink,
            state: UiState::default(),
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn take_alert(&mut self) -> Option<String> {
        self.state.take_alert()
    }

    pub fn toggle(&mut self, name: &str) {
        self.state.apply(UiEvent::ToggleSelection(name.to_string()));
    }

    /// Checks the card named `name`. Returns `false` when no such card is
    /// listed.
    pub fn select(&mut self, name: &str) -> bool {
        if !self.state.has_card(name) {
            return false;
        }
        self.state.apply(UiEvent::Select(name.to_string()));
        true
    }

    pub fn select_all(&mut self) {
        self.state.apply(UiEvent::SelectAll);
    }

    pub fn select_none(&mut self) {
        self.state.apply(UiEvent::SelectNone);
    }

    pub fn set_base(&mut self, base: Option<String>) {
        self.state.base = base
            .map(|base| base.trim().to_string())
            .filter(|base| !base.is_empty());
    }

    pub fn preview_text(&self) -> String {
        view::render_preview(&self.state, &|url: &str| self.api.resolve_asset_url(url))
    }

    pub async fn upload(&mut self, subcarpeta: &str, files: Vec<UploadFile>) {
        self.state.apply(UiEvent::UploadStarted);
        if files.is_empty() {
            self.state.apply(UiEvent::UploadRejected);
            return;
        }

        match self.api.upload(subcarpeta, files).await {
            Ok(result) => self.state.apply(UiEvent::UploadSucceeded(result)),
            Err(err) => {
                warn!(%err, subcarpeta, "upload failed");
                self.state.apply(UiEvent::UploadFailed(err.to_string()));
            }
        }
    }

    /// Reads `paths` from disk and uploads them. A file that cannot be read
    /// fails the whole upload before any request is sent.
    pub async fn upload_paths(&mut self, subcarpeta: &str, paths: &[PathBuf]) {
        match read_upload_files(paths).await {
            Ok(files) => self.upload(subcarpeta, files).await,
            Err(err) => {
                self.state.apply(UiEvent::UploadStarted);
                self.state.apply(UiEvent::UploadFailed(err.to_string()));
            }
        }
    }

    pub async fn list(&mut self, params: &QueryParams) {
        self.fetch_listing(params, UiEvent::ListStarted).await;
    }

    async fn fetch_listing(&mut self, params: &QueryParams, started: UiEvent) {
        let params = self.outgoing_params(params);
        self.state.apply(started);
        match self.api.list(&params).await {
            Ok(listing) => self.state.apply(UiEvent::ListLoaded(listing)),
            Err(err) => {
                warn!(%err, subcarpeta = %params.subcarpeta, "listing failed");
                self.state.apply(UiEvent::ListFailed(err.to_string()));
            }
        }
    }

    /// Renames the checked items, then refreshes the preview so the
    /// proposals reflect the new backend state.
    pub async fn rename_selected(&mut self, params: &QueryParams) {
        self.state.apply(UiEvent::RenameStarted);
        let selected = self.state.selected_names();
        if selected.is_empty() {
            self.state.apply(UiEvent::SelectionRequired);
            return;
        }

        let request = RenameSelectedRequest {
            params: self.outgoing_params(params),
            selected,
        };
        match self.api.rename_selected(&request).await {
            Ok(summary) => {
                self.state.apply(UiEvent::RenameSucceeded(summary));
                self.fetch_listing(params, UiEvent::RefreshStarted).await;
            }
            Err(err) => {
                warn!(%err, "rename failed");
                self.state.apply(UiEvent::RenameFailed(err.to_string()));
            }
        }
    }

    pub async fn download_selected(&mut self, subcarpeta: &str) {
        self.state.apply(UiEvent::DownloadStarted);
        let selected = self.state.selected_names();
        if selected.is_empty() {
            self.state.apply(UiEvent::SelectionRequired);
            return;
        }

        let request = DownloadSelectedRequest {
            subcarpeta: subcarpeta.to_string(),
            selected,
        };
        let result = match self.api.download_selected(&request).await {
            Ok(bytes) => {
                self.deliver(ArchiveScope::Selected.file_name(subcarpeta), bytes)
                    .await
            }
            Err(err) => Err(err),
        };
        self.finish_download(result);
    }

    pub async fn download_all(&mut self, subcarpeta: &str) {
        self.state.apply(UiEvent::DownloadStarted);
        let result = match self.api.download_all(subcarpeta).await {
            Ok(bytes) => self.deliver(ArchiveScope::All.file_name(subcarpeta), bytes).await,
            Err(err) => Err(err),
        };
        self.finish_download(result);
    }

    pub async fn pick_base(&mut self) {
        self.state.apply(UiEvent::PickBaseStarted);
        match self.api.pick_base().await {
            Ok(response) => match response.picked_base() {
                Some(base) => {
                    info!(base, "base folder picked");
                    self.state.apply(UiEvent::BasePicked(base.to_string()));
                }
                None => self.state.apply(UiEvent::BasePickRefused(response.error)),
            },
            Err(err) => {
                warn!(%err, "pick base request failed");
                self.state.apply(UiEvent::BasePickRefused(Some(format!(
                    "{PICK_BASE_FAILED_MESSAGE} {err}"
                ))));
            }
        }
    }

    /// Asks the backend to reveal the current base folder. Failures are
    /// logged and otherwise ignored.
    pub async fn open_folder(&mut self) {
        let Some(folder) = self.state.base.clone() else {
            return;
        };
        if let Err(err) = self.api.open_folder(&folder).await {
            warn!(%err, %folder, "open folder request failed");
        }
    }

    fn outgoing_params(&self, params: &QueryParams) -> QueryParams {
        let base = params.base.clone().or_else(|| self.state.base.clone());
        params.clone().with_base(base).normalized()
    }

    async fn deliver(
        &self,
        file_name: String,
        bytes: Vec<u8>,
    ) -> ClientResult<DeliveryOutcome> {
        self.sink.deliver(&file_name, &bytes).await
    }

    fn finish_download(&mut self, result: ClientResult<DeliveryOutcome>) {
        match result {
            Ok(outcome) => self.state.apply(UiEvent::DownloadDelivered(outcome)),
            Err(err) => {
                warn!(%err, "download failed");
                self.state.apply(UiEvent::DownloadFailed(err.to_string()));
            }
        }
    }
}

async fn read_upload_files(paths: &[PathBuf]) -> ClientResult<Vec<UploadFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(UploadFile::from_path(path).await?);
    }
    Ok(files)
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
