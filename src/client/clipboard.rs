use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Mutex;

#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<()>;
}

/// Process-local clipboard; optionally rejects every write.
#[derive(Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
    reject_writes: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting() -> Self {
        Self {
            contents: Mutex::new(None),
            reject_writes: true,
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        if self.reject_writes {
            return Err(Error::Clipboard("write rejected".to_string()));
        }
        *self.contents.lock().unwrap_or_else(|e| e.into_inner()) = Some(text.to_string());
        Ok(())
    }
}
