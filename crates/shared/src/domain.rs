use serde::{Deserialize, Serialize};

/// Folder and metadata fields the backend uses to propose new file names.
///
/// `base` is only sent once a base folder has been picked through
/// `/api/pick-base`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    pub subcarpeta: String,
    pub clase: String,
    pub fecha: String,
    pub lote: String,
    pub angulo: String,
}

impl QueryParams {
    pub fn new(
        subcarpeta: impl Into<String>,
        clase: impl Into<String>,
        fecha: impl Into<String>,
        lote: impl Into<String>,
        angulo: impl Into<String>,
    ) -> Self {
        Self {
            base: None,
            subcarpeta: subcarpeta.into(),
            clase: clase.into(),
            fecha: fecha.into(),
            lote: lote.into(),
            angulo: angulo.into(),
        }
    }

    pub fn with_base(mut self, base: Option<String>) -> Self {
        self.base = base;
        self
    }

    /// Trims the free-text fields the way the form does before sending.
    /// `subcarpeta` and `clase` go out exactly as typed.
    pub fn normalized(&self) -> Self {
        Self {
            base: self
                .base
                .as_deref()
                .map(str::trim)
                .filter(|base| !base.is_empty())
                .map(str::to_string),
            subcarpeta: self.subcarpeta.clone(),
            clase: self.clase.clone(),
            fecha: self.fecha.trim().to_string(),
            lote: self.lote.trim().to_string(),
            angulo: self.angulo.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewItem {
    pub name: String,
    pub url: String,
    pub proposed: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingResponse {
    pub count: usize,
    pub folder: String,
    #[serde(default)]
    pub items: Vec<PreviewItem>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameSummary {
    #[serde(default)]
    pub renamed: u64,
    #[serde(default)]
    pub skipped: u64,
    #[serde(default)]
    pub errors: u64,
}

/// Entries of `saved` come back either as bare names or as
/// `{ name, rel_path }` objects depending on the backend build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SavedFile {
    Name(String),
    Detailed {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rel_path: Option<String>,
    },
}

impl SavedFile {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Detailed { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    #[serde(default)]
    pub saved: Vec<SavedFile>,
    pub folder: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickBaseResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PickBaseResponse {
    pub fn picked_base(&self) -> Option<&str> {
        if !self.ok {
            return None;
        }
        self.base.as_deref().filter(|base| !base.is_empty())
    }
}
