use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::sources::Fragment;
use crate::tui::AppEvent;

pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["pdf", "docx"];

// Expiry surfaces as a network failure; uploads and answers can both be slow.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Check a filename against the supported document types. Case-insensitive,
/// checked before any file or network I/O happens.
pub fn has_supported_extension(filename: &str) -> bool {
    let name = filename.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|ext| name.ends_with(&format!(".{ext}")))
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("unsupported file type")]
    UnsupportedExtension,
    #[error("question must not be empty")]
    EmptyQuestion,
    #[error("could not read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server error: {0}")]
    Server(String),
}

impl BackendError {
    /// Failures caught locally, before any request was issued. These get a
    /// specific user-facing message; everything else is reported generically
    /// with the detail kept to the diagnostic log.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BackendError::UnsupportedExtension | BackendError::EmptyQuestion
        )
    }
}

#[derive(Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
struct UploadResponse {
    success: Option<bool>,
    filename: Option<String>,
    error: Option<String>,
}

/// The `sources` array mixes object entries and bare strings depending on
/// the backend version; both map onto [`Fragment`].
#[derive(Deserialize)]
#[serde(untagged)]
enum SourceEntry {
    Structured {
        content: String,
        full_content: Option<String>,
    },
    Text(String),
}

impl SourceEntry {
    fn into_fragment(self) -> Fragment {
        match self {
            SourceEntry::Structured {
                content,
                full_content,
            } => {
                let full = full_content.unwrap_or_else(|| content.clone());
                Fragment::new(content, full)
            }
            SourceEntry::Text(text) => Fragment::new(text.clone(), text),
        }
    }
}

#[derive(Deserialize)]
struct AskResponse {
    answer: Option<String>,
    sources: Option<Vec<SourceEntry>>,
    error: Option<String>,
}

#[derive(Debug)]
pub struct AskReply {
    pub answer: String,
    pub fragments: Vec<Fragment>,
}

pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Upload a document for processing. Returns the server-confirmed
    /// filename. The extension check runs before the file is even read.
    pub async fn upload(&self, path: &Path) -> Result<String, BackendError> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or(BackendError::UnsupportedExtension)?;
        if !has_supported_extension(&filename) {
            return Err(BackendError::UnsupportedExtension);
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| BackendError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;

        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.clone());
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = format!("{}/upload", self.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        let body: UploadResponse = serde_json::from_slice(&bytes).map_err(|err| {
            BackendError::Server(format!("unreadable response (status {status}): {err}"))
        })?;

        // Anything without an explicit success marker is a failure,
        // whatever shape the body takes.
        if body.success == Some(true) {
            Ok(body.filename.unwrap_or(filename))
        } else {
            let detail = body
                .error
                .unwrap_or_else(|| format!("upload failed with status {status}"));
            Err(BackendError::Server(detail))
        }
    }

    /// Ask a question about the active document.
    pub async fn ask(&self, question: &str) -> Result<AskReply, BackendError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(BackendError::EmptyQuestion);
        }

        let url = format!("{}/ask", self.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&AskRequest { question })
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        let body: AskResponse = serde_json::from_slice(&bytes).map_err(|err| {
            BackendError::Server(format!("unreadable response (status {status}): {err}"))
        })?;

        if let Some(error) = body.error {
            return Err(BackendError::Server(error));
        }
        match body.answer {
            Some(answer) => {
                let fragments = body
                    .sources
                    .unwrap_or_default()
                    .into_iter()
                    .map(SourceEntry::into_fragment)
                    .collect();
                Ok(AskReply { answer, fragments })
            }
            None => Err(BackendError::Server(format!(
                "answer missing from response (status {status})"
            ))),
        }
    }
}

/// Gateway work requested by a state transition. Producing a command has no
/// side effects; the [`Dispatcher`] executes it and reports the completion
/// back through the app event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    Upload { path: PathBuf },
    Ask { question: String, generation: u64 },
}

pub struct Dispatcher {
    client: Arc<BackendClient>,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl Dispatcher {
    pub fn new(client: BackendClient, tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            client: Arc::new(client),
            tx,
        }
    }

    pub fn dispatch(&self, command: BackendCommand) {
        match command {
            BackendCommand::Upload { path } => {
                tracing::debug!(path = %path.display(), "dispatching upload");
                let client = Arc::clone(&self.client);
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = client.upload(&path).await;
                    let _ = tx.send(AppEvent::UploadDone { result });
                });
            }
            BackendCommand::Ask {
                question,
                generation,
            } => {
                tracing::debug!(generation, "dispatching ask");
                let client = Arc::clone(&self.client);
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = client.ask(&question).await;
                    let _ = tx.send(AppEvent::AskDone { generation, result });
                });
            }
        }
    }
}
