//! pagespeak - read page text aloud
//!
//! Selects text from a page by CSS-like selector, formats it for a speech
//! engine and drives the host synthesizer, with the user's text selection
//! taking over while it exists.

pub mod clipboard;
pub mod controller;
pub mod dom;
pub mod error;
pub mod speech;

pub use controller::config::{Options, OptionsPatch};
pub use controller::{Host, PlaybackState, SpeechController, DEFAULT_SELECTOR};
pub use error::{Result, SpeechError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "pagespeak";
