//! Text projection of [`UiState`]. Rendering never mutates state.

use crate::state::{PreviewArea, PreviewCard, UiState};

pub const LOADING_TEXT: &str = "Loading preview…";
pub const EMPTY_TEXT: &str = "No images in that subfolder. Upload some first.";
pub const TOOLBAR_TEXT: &str = "[all] Select all   [none] Clear selection";

/// Renders the preview grid. `resolve_url` maps item URLs to openable ones.
pub fn render_preview(state: &UiState, resolve_url: &dyn Fn(&str) -> String) -> String {
    match &state.preview {
        PreviewArea::Idle => String::new(),
        PreviewArea::Loading => LOADING_TEXT.to_string(),
        PreviewArea::Empty => EMPTY_TEXT.to_string(),
        PreviewArea::Cards(cards) => {
            let mut lines = vec![TOOLBAR_TEXT.to_string()];
            lines.extend(
                cards
                    .iter()
                    .enumerate()
                    .map(|(index, card)| render_card(index + 1, card, resolve_url)),
            );
            lines.join("\n")
        }
    }
}

fn render_card(position: usize, card: &PreviewCard, resolve_url: &dyn Fn(&str) -> String) -> String {
    let mark = if card.checked { 'x' } else { ' ' };
    format!(
        "{position:>3}. [{mark}] {} → {}\n       {}",
        card.item.name,
        card.item.proposed,
        resolve_url(&card.item.url)
    )
}

/// Status regions that currently hold text, in display order.
pub fn render_status(state: &UiState) -> Vec<String> {
    let mut lines = Vec::new();
    if !state.summary.is_empty() {
        lines.push(state.summary.clone());
    }
    if !state.upload_status.is_empty() {
        lines.push(state.upload_status.clone());
    }
    if !state.status.is_empty() {
        lines.push(state.status.clone());
    }
    if let Some(error) = &state.error {
        lines.push(format!("Error: {error}"));
    }
    lines
}

/// One-line description of which actions are currently available.
pub fn render_actions(state: &UiState) -> String {
    let flag = |enabled: bool| if enabled { "on" } else { "off" };
    let mut line = format!(
        "rename: {} | download selected: {} | selected: {}",
        flag(state.rename_enabled),
        flag(state.download_selected_enabled),
        state.selected_names().len()
    );
    if state.in_flight {
        line.push_str(" | busy");
    }
    line
}
