//! Explicit UI state for the preview/selection workflow, updated by
//! reducer-style events.

use shared::domain::{ListingResponse, PreviewItem, RenameSummary, UploadResult};

use crate::sink::DeliveryOutcome;

pub const SELECTION_REQUIRED_MESSAGE: &str = "Select at least one image.";
pub const PICK_BASE_FAILED_MESSAGE: &str = "Could not open the folder picker.";
pub const UPLOAD_REJECTED_MESSAGE: &str = "Select files to upload";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewCard {
    pub item: PreviewItem,
    pub checked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PreviewArea {
    #[default]
    Idle,
    Loading,
    Empty,
    Cards(Vec<PreviewCard>),
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    UploadStarted,
    UploadRejected,
    UploadSucceeded(UploadResult),
    UploadFailed(String),
    ListStarted,
    /// Re-list after a rename; keeps the rename report in `status`.
    RefreshStarted,
    ListLoaded(ListingResponse),
    ListFailed(String),
    ToggleSelection(String),
    Select(String),
    SelectAll,
    SelectNone,
    SelectionRequired,
    RenameStarted,
    RenameSucceeded(RenameSummary),
    RenameFailed(String),
    DownloadStarted,
    DownloadDelivered(DeliveryOutcome),
    DownloadFailed(String),
    PickBaseStarted,
    BasePicked(String),
    BasePickRefused(Option<String>),
}

#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub preview: PreviewArea,
    pub summary: String,
    pub upload_status: String,
    pub status: String,
    pub error: Option<String>,
    /// One-shot blocking prompt; consumers take it once shown.
    pub alert: Option<String>,
    pub base: Option<String>,
    pub rename_enabled: bool,
    pub download_selected_enabled: bool,
    pub in_flight: bool,
}

impl UiState {
    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::UploadStarted => {
                self.error = None;
                self.upload_status = "Uploading…".to_string();
                self.in_flight = true;
            }
            UiEvent::UploadRejected => {
                self.upload_status = UPLOAD_REJECTED_MESSAGE.to_string();
                self.in_flight = false;
            }
            UiEvent::UploadSucceeded(result) => {
                self.upload_status =
                    format!("OK: {} file(s) in {}", result.saved.len(), result.folder);
                self.in_flight = false;
            }
            UiEvent::UploadFailed(message) => {
                self.upload_status.clear();
                self.error = Some(format!("Upload failed: {message}"));
                self.in_flight = false;
            }
            UiEvent::ListStarted => {
                self.status.clear();
                self.apply(UiEvent::RefreshStarted);
            }
            UiEvent::RefreshStarted => {
                self.error = None;
                self.preview = PreviewArea::Loading;
                self.rename_enabled = false;
                self.download_selected_enabled = false;
                self.in_flight = true;
            }
            UiEvent::ListLoaded(listing) => {
                self.in_flight = false;
                if listing.count == 0 || listing.items.is_empty() {
                    self.preview = PreviewArea::Empty;
                    self.summary.clear();
                    return;
                }
                self.summary = format!("Folder: {} | Images: {}", listing.folder, listing.count);
                self.preview = PreviewArea::Cards(
                    listing
                        .items
                        .into_iter()
                        .map(|item| PreviewCard {
                            item,
                            checked: false,
                        })
                        .collect(),
                );
                self.rename_enabled = true;
                self.download_selected_enabled = true;
            }
            UiEvent::ListFailed(message) => {
                self.preview = PreviewArea::Idle;
                self.error = Some(format!("List failed: {message}"));
                self.in_flight = false;
            }
            UiEvent::ToggleSelection(name) => {
                if let Some(card) = self.cards_mut().find(|card| card.item.name == name) {
                    card.checked = !card.checked;
                }
            }
            UiEvent::Select(name) => {
                if let Some(card) = self.cards_mut().find(|card| card.item.name == name) {
                    card.checked = true;
                }
            }
            UiEvent::SelectAll => self.cards_mut().for_each(|card| card.checked = true),
            UiEvent::SelectNone => self.cards_mut().for_each(|card| card.checked = false),
            UiEvent::SelectionRequired => {
                self.status.clear();
                self.alert = Some(SELECTION_REQUIRED_MESSAGE.to_string());
                self.in_flight = false;
            }
            UiEvent::RenameStarted => {
                self.error = None;
                self.status = "Renaming…".to_string();
                self.in_flight = true;
            }
            UiEvent::RenameSucceeded(summary) => {
                self.status = format!(
                    "Renamed: {} | Skipped: {} | Errors: {}",
                    summary.renamed, summary.skipped, summary.errors
                );
                self.in_flight = false;
            }
            UiEvent::RenameFailed(message) => {
                self.status.clear();
                self.error = Some(format!("Rename failed: {message}"));
                self.in_flight = false;
            }
            UiEvent::DownloadStarted => {
                self.error = None;
                self.status = "Preparing ZIP…".to_string();
                self.in_flight = true;
            }
            UiEvent::DownloadDelivered(outcome) => {
                self.status = match outcome {
                    DeliveryOutcome::Saved(path) => {
                        format!("Download saved to {}", path.display())
                    }
                    DeliveryOutcome::Offered(path) => {
                        format!("Download offered at {}", path.display())
                    }
                };
                self.in_flight = false;
            }
            UiEvent::DownloadFailed(message) => {
                self.status.clear();
                self.error = Some(format!("Download failed: {message}"));
                self.in_flight = false;
            }
            UiEvent::PickBaseStarted => {
                self.error = None;
                self.in_flight = true;
            }
            UiEvent::BasePicked(base) => {
                self.base = Some(base);
                self.in_flight = false;
            }
            UiEvent::BasePickRefused(reason) => {
                self.in_flight = false;
                self.alert = Some(reason.unwrap_or_else(|| PICK_BASE_FAILED_MESSAGE.to_string()));
            }
        }
    }

    pub fn cards(&self) -> &[PreviewCard] {
        match &self.preview {
            PreviewArea::Cards(cards) => cards,
            _ => &[],
        }
    }

    fn cards_mut(&mut self) -> impl Iterator<Item = &mut PreviewCard> {
        let cards: &mut [PreviewCard] = match &mut self.preview {
            PreviewArea::Cards(cards) => cards.as_mut_slice(),
            _ => &mut [],
        };
        cards.iter_mut()
    }

    /// Names of the checked cards, in listing order.
    pub fn selected_names(&self) -> Vec<String> {
        self.cards()
            .iter()
            .filter(|card| card.checked)
            .map(|card| card.item.name.clone())
            .collect()
    }

    pub fn has_card(&self, name: &str) -> bool {
        self.cards().iter().any(|card| card.item.name == name)
    }

    /// Whether the last action ended in an error, a pending alert or a
    /// refused upload.
    pub fn needs_attention(&self) -> bool {
        self.error.is_some() || self.alert.is_some() || self.upload_status == UPLOAD_REJECTED_MESSAGE
    }

    pub fn take_alert(&mut self) -> Option<String> {
        self.alert.take()
    }
}
