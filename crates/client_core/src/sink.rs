//! Destinations for downloaded archives.
//!
//! A [`DialogSink`] asks the user where to save and falls back to a
//! [`DirectorySink`] when the dialog is cancelled or fails. Which one the
//! workflow gets is decided once at startup by [`select_file_sink`].

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{ClientError, ClientResult};

const FALLBACK_FILE_NAME: &str = "download.zip";

/// Where a delivered archive ended up.
///
/// `Saved` is only produced when the user confirmed a location and the
/// write completed. Everything else is `Offered`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Saved(PathBuf),
    Offered(PathBuf),
}

impl DeliveryOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Saved(path) | Self::Offered(path) => path,
        }
    }
}

#[async_trait]
pub trait FileSink: Send + Sync {
    async fn deliver(&self, suggested_name: &str, bytes: &[u8]) -> ClientResult<DeliveryOutcome>;
}

#[async_trait]
pub trait SaveDialog: Send + Sync {
    /// `Ok(None)` means the user dismissed the dialog.
    async fn choose_destination(&self, suggested_name: &str) -> ClientResult<Option<PathBuf>>;
}

pub struct RfdSaveDialog;

#[async_trait]
impl SaveDialog for RfdSaveDialog {
    async fn choose_destination(&self, suggested_name: &str) -> ClientResult<Option<PathBuf>> {
        let handle = rfd::AsyncFileDialog::new()
            .set_title("Save archive")
            .set_file_name(suggested_name)
            .add_filter("ZIP file", &["zip"])
            .save_file()
            .await;
        Ok(handle.map(|handle| handle.path().to_path_buf()))
    }
}

/// Drops archives into a fixed directory without asking, the way a browser
/// download does.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn available_path(&self, file_name: &str) -> ClientResult<PathBuf> {
        let candidate = self.dir.join(file_name);
        if !path_exists(&candidate).await? {
            return Ok(candidate);
        }

        let name = Path::new(file_name);
        let stem = name
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = name
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let mut counter = 1;
        loop {
            let candidate = self.dir.join(format!("{stem}({counter}){extension}"));
            if !path_exists(&candidate).await? {
                return Ok(candidate);
            }
            counter += 1;
        }
    }
}

#[async_trait]
impl FileSink for DirectorySink {
    async fn deliver(&self, suggested_name: &str, bytes: &[u8]) -> ClientResult<DeliveryOutcome> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| ClientError::io(&self.dir, err))?;

        let file_name = sanitize_file_name(suggested_name);
        let target = self.available_path(&file_name).await?;
        write_staged(&target, bytes).await?;

        info!(path = %target.display(), size_bytes = bytes.len(), "archive written");
        Ok(DeliveryOutcome::Offered(target))
    }
}

pub struct DialogSink<D: SaveDialog> {
    dialog: D,
    fallback: DirectorySink,
}

impl<D: SaveDialog> DialogSink<D> {
    pub fn new(dialog: D, fallback: DirectorySink) -> Self {
        Self { dialog, fallback }
    }
}

#[async_trait]
impl<D: SaveDialog> FileSink for DialogSink<D> {
    async fn deliver(&self, suggested_name: &str, bytes: &[u8]) -> ClientResult<DeliveryOutcome> {
        match self.dialog.choose_destination(suggested_name).await {
            Ok(Some(path)) => match write_staged(&path, bytes).await {
                Ok(()) => {
                    info!(path = %path.display(), size_bytes = bytes.len(), "archive saved");
                    return Ok(DeliveryOutcome::Saved(path));
                }
                Err(err) => warn!(
                    path = %path.display(),
                    %err,
                    "writing to chosen location failed; using download directory"
                ),
            },
            Ok(None) => warn!("save dialog dismissed; using download directory"),
            Err(err) => warn!(%err, "save dialog failed; using download directory"),
        }

        self.fallback.deliver(suggested_name, bytes).await
    }
}

/// Whether a native save dialog can be shown in this session.
pub fn save_dialog_available() -> bool {
    if cfg!(any(target_os = "windows", target_os = "macos")) {
        return true;
    }
    ["DISPLAY", "WAYLAND_DISPLAY"]
        .iter()
        .any(|var| std::env::var_os(var).is_some_and(|value| !value.is_empty()))
}

pub fn select_file_sink(prefer_dialog: bool, download_dir: PathBuf) -> Arc<dyn FileSink> {
    let fallback = DirectorySink::new(download_dir);
    if prefer_dialog && save_dialog_available() {
        info!("archives will be saved through the native save dialog");
        Arc::new(DialogSink::new(RfdSaveDialog, fallback))
    } else {
        info!(dir = %fallback.dir().display(), "archives will be written to the download directory");
        Arc::new(fallback)
    }
}

fn sanitize_file_name(suggested_name: &str) -> String {
    Path::new(suggested_name.trim())
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

/// Writes `bytes` next to `target` and renames into place, so a failed
/// write never leaves a partial file at `target`.
async fn write_staged(target: &Path, bytes: &[u8]) -> ClientResult<()> {
    let file_name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());
    let staging = StagingFile::new(target.with_file_name(format!(".{file_name}.part")));

    tokio::fs::write(staging.path(), bytes)
        .await
        .map_err(|err| ClientError::io(staging.path(), err))?;
    tokio::fs::rename(staging.path(), target)
        .await
        .map_err(|err| ClientError::io(target, err))?;
    staging.persisted();
    Ok(())
}

async fn path_exists(path: &Path) -> ClientResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|err| ClientError::io(path, err))
}

/// Partial download file that is removed unless the write was persisted.
struct StagingFile {
    path: PathBuf,
    keep: bool,
}

impl StagingFile {
    fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn persisted(mut self) {
        self.keep = true;
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        if !self.keep {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
#[path = "tests/sink_tests.rs"]
mod tests;
