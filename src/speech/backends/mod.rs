//! Speech backends

// Native TTS backend using the tts crate (cross-platform)
#[cfg(feature = "native")]
pub mod native;

// In-process recording backend for tests and dry runs
pub mod memory;
