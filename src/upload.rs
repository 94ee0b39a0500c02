use std::path::PathBuf;

use crate::backend::{has_supported_extension, BackendCommand, BackendError};
use crate::conversation::{Conversation, MessageId};
use crate::sources::SourcePanel;

pub const VALIDATION_MESSAGE: &str = "Only .pdf and .docx files are supported.";
pub const UPLOAD_FAILED_MESSAGE: &str = "Error uploading file. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub filename: String,
}

/// Upload lifecycle: at most one document active and at most one upload in
/// flight. A successful upload replaces the document and bumps `generation`,
/// invalidating any question still in flight against the old document.
#[derive(Debug, Default)]
pub struct UploadState {
    document: Option<Document>,
    generation: u64,
    in_flight: bool,
    processing_id: Option<MessageId>,
    pub prompt_open: bool,
    pub path_input: String,
    pub path_cursor: usize,
}

impl UploadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Question submission is gated on this.
    pub fn document_ready(&self) -> bool {
        self.document.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn open_prompt(&mut self) {
        self.prompt_open = true;
        self.path_input.clear();
        self.path_cursor = 0;
    }

    pub fn close_prompt(&mut self) {
        self.prompt_open = false;
        self.path_input.clear();
        self.path_cursor = 0;
    }

    /// Submit the typed path. A bad extension yields the specific validation
    /// message and no command; an upload already in flight rejects the new
    /// one outright rather than queueing it.
    pub fn submit(&mut self, conversation: &mut Conversation) -> Option<BackendCommand> {
        let raw = self.path_input.trim().to_string();
        if raw.is_empty() {
            return None;
        }
        if self.in_flight {
            tracing::debug!("upload already in flight, new request rejected");
            return None;
        }

        let path = PathBuf::from(raw);
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        if !has_supported_extension(&filename) {
            conversation.push_error(VALIDATION_MESSAGE);
            self.close_prompt();
            return None;
        }

        self.processing_id =
            Some(conversation.push_placeholder(&format!("Processing {filename}")));
        self.in_flight = true;
        self.close_prompt();
        Some(BackendCommand::Upload { path })
    }

    /// Absorb the upload outcome. The processing placeholder is removed and
    /// the in-flight flag cleared on every path. Returns true when a new
    /// document became ready.
    pub fn resolve(
        &mut self,
        result: Result<String, BackendError>,
        conversation: &mut Conversation,
        sources: &mut SourcePanel,
    ) -> bool {
        self.in_flight = false;
        if let Some(id) = self.processing_id.take() {
            conversation.remove(id);
        }

        match result {
            Ok(filename) => {
                tracing::info!(filename = %filename, "document ready");
                self.document = Some(Document {
                    filename: filename.clone(),
                });
                self.generation += 1;
                conversation.push_assistant(&format!(
                    "{filename} has been processed. You can now ask questions about it."
                ));
                sources.clear();
                true
            }
            Err(err) if err.is_validation() => {
                conversation.push_error(VALIDATION_MESSAGE);
                false
            }
            Err(err) => {
                // Detail goes to the log only; the rendered message stays generic.
                tracing::warn!(error = %err, "upload failed");
                conversation.push_error(UPLOAD_FAILED_MESSAGE);
                false
            }
        }
    }
}
