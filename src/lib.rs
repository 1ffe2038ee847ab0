//! Alt-text generator - accessibility descriptions for images
//!
//! A proxy endpoint hides the Gemini credential and forwards base64 image
//! submissions upstream; a client controller turns a picked image into a
//! submission and renders the generated description.

pub mod ai;
pub mod client;
pub mod error;
pub mod models;
pub mod prompts;
pub mod proxy;
pub mod server;

pub use error::{Error, Result};
