use ratatui::widgets::ListState;
use crate::conversation::sanitize;

/// Shown as the panel's single entry whenever no fragments are present.
pub const EMPTY_PLACEHOLDER: &str = "No relevant document fragments found.";

/// One retrieved snippet of source-document text. Starts collapsed; the
/// preview and full forms are fixed at construction and toggling only
/// switches which one is displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    preview: String,
    full: String,
    expanded: bool,
}

impl Fragment {
    pub fn new(preview: String, full: String) -> Self {
        Self {
            preview: sanitize(&preview),
            full: sanitize(&full),
            expanded: false,
        }
    }

    pub fn display_text(&self) -> &str {
        if self.expanded {
            &self.full
        } else {
            &self.preview
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Whether the full form actually adds anything over the preview.
    /// Fragments without more to show get no expand affordance.
    pub fn has_more(&self) -> bool {
        self.full != self.preview
    }

    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
    }
}

/// The source panel's fragment set. Replaced wholesale on every answer;
/// per-fragment expansion state never survives a replace.
#[derive(Debug, Default)]
pub struct SourcePanel {
    fragments: Vec<Fragment>,
    pub list_state: ListState,
}

impl SourcePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, fragments: Vec<Fragment>) {
        self.fragments = fragments;
        self.list_state = ListState::default();
        if !self.fragments.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn select_next(&mut self) {
        let len = self.fragments.len();
        if len > 0 {
            let i = self.list_state.selected().unwrap_or(0);
            self.list_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn select_prev(&mut self) {
        if !self.fragments.is_empty() {
            let i = self.list_state.selected().unwrap_or(0);
            self.list_state.select(Some(i.saturating_sub(1)));
        }
    }

    /// Toggle the selected fragment between preview and full text.
    /// A stale or missing selection is a no-op.
    pub fn toggle_selected(&mut self) {
        if let Some(i) = self.list_state.selected() {
            if let Some(fragment) = self.fragments.get_mut(i) {
                fragment.toggle();
            }
        }
    }
}
