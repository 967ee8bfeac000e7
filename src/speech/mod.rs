//! Speech synthesis system

pub mod backends;
pub mod format;
pub mod synth;
pub mod utterance;
pub mod voice;

pub use format::{format_text, Terminator};
pub use synth::{create_synthesis, HostEvent, SpeechSynthesis};
pub use utterance::{Callback, EventHandlers, EventKind, SpeechEvent, Utterance};
pub use voice::{select_voice, Voice};
