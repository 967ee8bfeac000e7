//! Speech synthesizer abstraction
//!
//! The controller never talks to an engine directly. Everything it needs
//! from the host (voice list, speaking, pausing, cancelling and the events
//! coming back) goes through the `SpeechSynthesis` trait.

use super::utterance::{SpeechEvent, Utterance};
use super::voice::Voice;
use crate::Result;
use log::info;
use std::sync::mpsc::Sender;

/// Notifications the host pushes to a subscribed controller
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// The voice list became available or changed
    VoicesChanged,
    /// The hosting page or process is about to be torn down
    Unload,
    /// A lifecycle event for the utterance being spoken
    Speech(SpeechEvent),
}

/// Host speech synthesis capability
///
/// `speak` enqueues: a second call while speaking queues another utterance
/// behind the first, and `cancel` drops the whole queue.
pub trait SpeechSynthesis: Send {
    /// Whether the host can synthesize speech at all
    fn is_supported(&self) -> bool {
        true
    }

    /// Current voice list; may be empty until `VoicesChanged` fires
    fn voices(&mut self) -> Result<Vec<Voice>>;

    /// Enqueue an utterance
    fn speak(&mut self, utterance: &Utterance) -> Result<()>;

    /// Whether `pause` and `resume` actually hold and continue the audio
    fn can_pause(&self) -> bool {
        true
    }

    fn pause(&mut self) -> Result<()>;

    fn resume(&mut self) -> Result<()>;

    /// Cancel every queued utterance
    fn cancel(&mut self) -> Result<()>;

    /// Whether an utterance is currently being spoken, if the host can tell
    fn is_speaking(&self) -> Result<Option<bool>> {
        Ok(None)
    }

    /// Subscribe a controller to host notifications
    fn attach(&mut self, events: Sender<HostEvent>) -> Result<()>;

    /// Drop the subscription made by `attach`
    fn detach(&mut self);
}

/// Create a platform-appropriate speech synthesizer
///
/// Uses the native engine (Speech Dispatcher on Linux, AVFoundation on
/// macOS, SAPI/WinRT on Windows). Fails with `CapabilityUnsupported` when no
/// engine can be reached, including builds without the `native` feature.
pub fn create_synthesis() -> Result<Box<dyn SpeechSynthesis>> {
    let platform = std::env::consts::OS;
    info!(
        "Creating native speech synthesizer for platform: {}",
        platform
    );

    #[cfg(feature = "native")]
    {
        use super::backends::native::NativeSynthesis;

        match NativeSynthesis::new() {
            Ok(synth) => {
                info!("✓ Successfully initialized native TTS backend");
                Ok(Box::new(synth))
            }
            Err(e) => Err(crate::SpeechError::CapabilityUnsupported(format!(
                "Failed to initialize speech backend for platform '{}': {}\n\
                 On Linux install Speech Dispatcher: sudo apt install speech-dispatcher",
                platform, e
            ))),
        }
    }

    #[cfg(not(feature = "native"))]
    {
        Err(crate::SpeechError::CapabilityUnsupported(format!(
            "pagespeak was built without the `native` feature; no engine for '{}'",
            platform
        )))
    }
}
