//! Client controller
//!
//! Turns a user-selected image into a submission, sends it to the proxy
//! endpoint and tracks what the UI should show. All state lives in one
//! controller object; UI events reach it through [`ClientController::dispatch`].

pub mod clipboard;
pub mod mock;
pub mod transport;

pub use clipboard::{Clipboard, MemoryClipboard};
pub use mock::MockProxyTransport;
pub use transport::{HttpProxyTransport, ProxyReply, ProxyTransport};

use crate::ai::decode_alt_text;
use crate::models::{AltTextResult, FileInput, ImageSubmission, ProxyError};
use crate::{Error, Result};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

pub const SELECT_IMAGE_FIRST: &str = "Please select an image first.";
pub const INVALID_FILE_TYPE: &str = "Please select a valid image file.";
pub const UNREADABLE_FILE: &str = "Could not read the selected file.";
pub const COPY_FAILED: &str = "Failed to copy text.";
pub const COPIED: &str = "Copied to clipboard.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
}

/// Banner message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiMessage {
    pub kind: MessageKind,
    pub text: String,
}

impl UiMessage {
    fn error(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            text: text.into(),
        }
    }

    fn success(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Success,
            text: text.into(),
        }
    }
}

/// UI events, each bound to exactly one controller handler.
#[derive(Debug, Clone)]
pub enum UiEvent {
    FileSelected(FileInput),
    FilesDropped(Vec<FileInput>),
    GenerateClicked,
    CopyClicked,
}

/// What a submit action ended in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Displayed(AltTextResult),
    Failed(String),
    /// A newer file replaced the submission while the request was in flight.
    Superseded,
    NoSubmission,
    AlreadyInFlight,
}

/// Snapshot of everything the UI renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerView {
    pub has_submission: bool,
    pub submit_enabled: bool,
    pub is_loading: bool,
    pub result: Option<String>,
    pub copy_enabled: bool,
    pub message: Option<UiMessage>,
}

#[derive(Debug, Default)]
struct ControllerState {
    current_submission: Option<ImageSubmission>,
    /// Bumped on every accepted file so late replies can be recognised.
    submission_seq: u64,
    is_loading: bool,
    result: Option<AltTextResult>,
    message: Option<UiMessage>,
}

pub struct ClientController {
    transport: Box<dyn ProxyTransport>,
    clipboard: Box<dyn Clipboard>,
    state: Mutex<ControllerState>,
}

/// Clears the loading flag however `submit` exits, including cancellation.
struct LoadingGuard<'a> {
    state: &'a Mutex<ControllerState>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).is_loading = false;
    }
}

fn lock(state: &Mutex<ControllerState>) -> MutexGuard<'_, ControllerState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl ClientController {
    pub fn new(transport: Box<dyn ProxyTransport>, clipboard: Box<dyn Clipboard>) -> Self {
        Self {
            transport,
            clipboard,
            state: Mutex::new(ControllerState::default()),
        }
    }

    pub fn view(&self) -> ControllerView {
        let state = lock(&self.state);
        ControllerView {
            has_submission: state.current_submission.is_some(),
            submit_enabled: state.current_submission.is_some() && !state.is_loading,
            is_loading: state.is_loading,
            result: state.result.as_ref().map(|r| r.as_str().to_string()),
            copy_enabled: state.result.is_some(),
            message: state.message.clone(),
        }
    }

    pub fn current_submission(&self) -> Option<ImageSubmission> {
        lock(&self.state).current_submission.clone()
    }

    pub async fn dispatch(&self, event: UiEvent) {
        match event {
            UiEvent::FileSelected(file) => {
                let _ = self.accept_file(file);
            }
            UiEvent::FilesDropped(files) => match files.into_iter().next() {
                Some(file) => {
                    let _ = self.accept_file(file);
                }
                None => debug!("Ignoring drop without files"),
            },
            UiEvent::GenerateClicked => {
                self.submit().await;
            }
            UiEvent::CopyClicked => {
                let _ = self.copy_result().await;
            }
        }
    }

    /// Validates and encodes a picked file as the current submission.
    pub fn accept_file(&self, file: FileInput) -> Result<()> {
        let mut state = lock(&self.state);

        if !file.mime_type.starts_with("image/") {
            info!("Rejected {} with type '{}'", file.name, file.mime_type);
            state.message = Some(UiMessage::error(INVALID_FILE_TYPE));
            return Err(Error::Validation(INVALID_FILE_TYPE.to_string()));
        }

        if file.bytes.is_empty() {
            warn!("Selected file {} is empty", file.name);
            state.message = Some(UiMessage::error(UNREADABLE_FILE));
            return Err(Error::Validation(UNREADABLE_FILE.to_string()));
        }

        debug!(
            "Accepted {} ({} bytes, {})",
            file.name,
            file.bytes.len(),
            file.mime_type
        );

        state.current_submission = Some(ImageSubmission::encode(&file.bytes, file.mime_type));
        state.submission_seq += 1;
        state.result = None;
        state.message = None;
        Ok(())
    }

    /// Sends the current submission; at most one request is in flight.
    pub async fn submit(&self) -> SubmitOutcome {
        let (submission, seq) = {
            let mut state = lock(&self.state);
            if state.is_loading {
                debug!("Submit ignored; a request is already in flight");
                return SubmitOutcome::AlreadyInFlight;
            }
            let Some(submission) = state.current_submission.clone() else {
                state.message = Some(UiMessage::error(SELECT_IMAGE_FIRST));
                return SubmitOutcome::NoSubmission;
            };
            state.is_loading = true;
            state.message = None;
            (submission, state.submission_seq)
        };
        let _loading = LoadingGuard { state: &self.state };

        let outcome = self.request_alt_text(&submission).await;

        let mut state = lock(&self.state);
        if state.submission_seq != seq {
            debug!("Discarding reply for a superseded submission");
            return SubmitOutcome::Superseded;
        }

        match outcome {
            Ok(result) => {
                info!("Generated alt text ({} chars)", result.as_str().len());
                state.result = Some(result.clone());
                SubmitOutcome::Displayed(result)
            }
            Err(e) => {
                warn!("Error generating alt text: {}", e);
                let text = e.to_string();
                state.message = Some(UiMessage::error(text.clone()));
                SubmitOutcome::Failed(text)
            }
        }
    }

    async fn request_alt_text(&self, submission: &ImageSubmission) -> Result<AltTextResult> {
        let reply = self.transport.send(submission).await?;

        if reply.is_success() {
            return decode_alt_text(&reply.body);
        }

        let message = serde_json::from_str::<ProxyError>(&reply.body)
            .map(|err| err.message)
            .unwrap_or_else(|_| format!("API request failed with status {}", reply.status));

        Err(Error::Proxy {
            status: reply.status,
            message,
        })
    }

    /// Copies the displayed result. Returns `Ok(false)` when there is nothing to copy.
    pub async fn copy_result(&self) -> Result<bool> {
        let text = lock(&self.state)
            .result
            .as_ref()
            .map(|r| r.as_str().to_string());
        let Some(text) = text else {
            return Ok(false);
        };

        match self.clipboard.write_text(&text).await {
            Ok(()) => {
                lock(&self.state).message = Some(UiMessage::success(COPIED));
                Ok(true)
            }
            Err(e) => {
                warn!("Failed to copy text: {}", e);
                lock(&self.state).message = Some(UiMessage::error(COPY_FAILED));
                Err(e)
            }
        }
    }
}
