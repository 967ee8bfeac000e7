//! Desktop text selection
//!
//! On X11 and Wayland, highlighting text anywhere puts it in the primary
//! selection. Reading it lets `play()` speak whatever the user highlighted.

use crate::dom::SelectionSource;
use crate::Result;
use log::debug;

/// Selection source backed by the desktop primary selection
#[derive(Debug, Default)]
pub struct PrimarySelection;

impl PrimarySelection {
    pub fn new() -> Self {
        Self
    }
}

impl SelectionSource for PrimarySelection {
    #[cfg(target_os = "linux")]
    fn selected_text(&mut self) -> Result<String> {
        use crate::SpeechError;
        use arboard::{Clipboard, GetExtLinux, LinuxClipboardKind};

        debug!("Reading primary selection");

        let mut clipboard = Clipboard::new()
            .map_err(|e| SpeechError::Other(format!("Failed to open clipboard: {}", e)))?;

        match clipboard
            .get()
            .clipboard(LinuxClipboardKind::Primary)
            .text()
        {
            Ok(text) => Ok(text),
            // Nothing highlighted
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(SpeechError::Other(format!(
                "Failed to read primary selection: {}",
                e
            ))),
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn selected_text(&mut self) -> Result<String> {
        debug!("No primary selection on this platform");
        Ok(String::new())
    }
}
