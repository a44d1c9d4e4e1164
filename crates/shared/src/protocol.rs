use serde::{Deserialize, Serialize};

use crate::domain::QueryParams;

pub const UPLOAD_PATH: &str = "/api/upload";
pub const LIST_PATH: &str = "/api/list";
pub const RENAME_SELECTED_PATH: &str = "/api/rename-selected";
pub const DOWNLOAD_SELECTED_PATH: &str = "/api/download-selected";
pub const DOWNLOAD_ALL_PATH: &str = "/api/download-all";
pub const PICK_BASE_PATH: &str = "/api/pick-base";
pub const OPEN_FOLDER_PATH: &str = "/api/open-folder";

/// Multipart field names for `/api/upload`.
pub const UPLOAD_FILES_FIELD: &str = "files";
pub const UPLOAD_SUBFOLDER_FIELD: &str = "subcarpeta";

/// Body of `/api/rename-selected`: the listing query plus the chosen names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameSelectedRequest {
    #[serde(flatten)]
    pub params: QueryParams,
    pub selected: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadSelectedRequest {
    pub subcarpeta: String,
    pub selected: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadAllQuery {
    pub subcarpeta: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickBaseRequest {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenFolderRequest {
    pub folder: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveScope {
    Selected,
    All,
}

impl ArchiveScope {
    pub fn file_name(self, subcarpeta: &str) -> String {
        match self {
            Self::Selected => format!("{subcarpeta}_seleccionadas.zip"),
            Self::All => format!("{subcarpeta}_completo.zip"),
        }
    }
}
