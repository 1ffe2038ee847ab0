pub mod alt_text;
pub mod client;
pub mod types;

pub use alt_text::{decode_alt_text, GeminiAltTextClient};
pub use client::{GeminiHttpClient, DEFAULT_BASE_URL};
