//! In-process recording backend
//!
//! Speaks nothing. Every call is recorded so callers can inspect what would
//! have reached an engine, and events can be injected as if the engine had
//! sent them. Clones share state, so a test can keep one handle while the
//! controller owns the other.

use crate::speech::{HostEvent, SpeechEvent, SpeechSynthesis, Utterance, Voice};
use crate::{Result, SpeechError};
use log::debug;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};

/// A call that reached the backend
#[derive(Debug, Clone, PartialEq)]
pub enum SynthCall {
    Speak(String),
    Pause,
    Resume,
    Cancel,
}

#[derive(Default)]
struct MemoryState {
    supported: bool,
    pausable: bool,
    voices: Vec<Voice>,
    calls: Vec<SynthCall>,
    spoken: Vec<Utterance>,
    /// Utterances queued and not yet ended or cancelled
    queued: usize,
    subscriber: Option<Sender<HostEvent>>,
}

/// Recording speech backend
#[derive(Clone)]
pub struct MemorySynthesis {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySynthesis {
    /// Backend with voices available immediately
    pub fn new(voices: Vec<Voice>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                supported: true,
                pausable: true,
                voices,
                ..Default::default()
            })),
        }
    }

    /// Backend whose voices arrive later through `load_voices`
    pub fn deferred() -> Self {
        Self::new(Vec::new())
    }

    /// Backend reporting no synthesis capability
    pub fn unsupported() -> Self {
        let synth = Self::new(Vec::new());
        synth.lock().supported = false;
        synth
    }

    /// Backend that, like some engines, cannot hold an utterance
    pub fn without_pause(voices: Vec<Voice>) -> Self {
        let synth = Self::new(voices);
        synth.lock().pausable = false;
        synth
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the voice list and notify the subscriber
    pub fn load_voices(&self, voices: Vec<Voice>) {
        debug!("Loading {} voices", voices.len());
        let mut state = self.lock();
        state.voices = voices;
        if let Some(tx) = &state.subscriber {
            let _ = tx.send(HostEvent::VoicesChanged);
        }
    }

    /// Deliver an engine event to the subscriber
    ///
    /// Returns false when nobody is attached.
    pub fn emit(&self, event: SpeechEvent) -> bool {
        let mut state = self.lock();
        if matches!(event, SpeechEvent::End | SpeechEvent::Error(_)) {
            state.queued = state.queued.saturating_sub(1);
        }
        match &state.subscriber {
            Some(tx) => tx.send(HostEvent::Speech(event)).is_ok(),
            None => false,
        }
    }

    /// Deliver the teardown notice to the subscriber
    pub fn unload(&self) -> bool {
        match &self.lock().subscriber {
            Some(tx) => tx.send(HostEvent::Unload).is_ok(),
            None => false,
        }
    }

    pub fn calls(&self) -> Vec<SynthCall> {
        self.lock().calls.clone()
    }

    /// Snapshots of every utterance passed to `speak`
    pub fn spoken(&self) -> Vec<Utterance> {
        self.lock().spoken.clone()
    }

    pub fn queued(&self) -> usize {
        self.lock().queued
    }

    pub fn is_attached(&self) -> bool {
        self.lock().subscriber.is_some()
    }
}

impl SpeechSynthesis for MemorySynthesis {
    fn is_supported(&self) -> bool {
        self.lock().supported
    }

    fn voices(&mut self) -> Result<Vec<Voice>> {
        Ok(self.lock().voices.clone())
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        let mut state = self.lock();
        if !state.supported {
            return Err(SpeechError::Speech("Speak failed: no engine".to_string()));
        }
        debug!("Speaking: {}", utterance.text);
        state.calls.push(SynthCall::Speak(utterance.text.clone()));
        state.spoken.push(utterance.clone());
        state.queued += 1;
        Ok(())
    }

    fn can_pause(&self) -> bool {
        self.lock().pausable
    }

    fn pause(&mut self) -> Result<()> {
        self.lock().calls.push(SynthCall::Pause);
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.lock().calls.push(SynthCall::Resume);
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(SynthCall::Cancel);
        state.queued = 0;
        Ok(())
    }

    fn is_speaking(&self) -> Result<Option<bool>> {
        Ok(Some(self.lock().queued > 0))
    }

    fn attach(&mut self, events: Sender<HostEvent>) -> Result<()> {
        self.lock().subscriber = Some(events);
        Ok(())
    }

    fn detach(&mut self) {
        self.lock().subscriber = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_records_calls() {
        let mut synth = MemorySynthesis::new(vec![Voice::new("Alex", "en-US")]);
        let utterance = Utterance {
            text: "hello".to_string(),
            ..Default::default()
        };

        synth.speak(&utterance).unwrap();
        synth.pause().unwrap();
        synth.resume().unwrap();
        synth.cancel().unwrap();

        assert_eq!(
            synth.calls(),
            vec![
                SynthCall::Speak("hello".to_string()),
                SynthCall::Pause,
                SynthCall::Resume,
                SynthCall::Cancel,
            ]
        );
        assert_eq!(synth.queued(), 0);
    }

    #[test]
    fn test_deferred_voices_notify() {
        let mut synth = MemorySynthesis::deferred();
        let (tx, rx) = channel();
        synth.attach(tx).unwrap();

        assert!(synth.voices().unwrap().is_empty());
        synth.load_voices(vec![Voice::new("Alex", "en-US")]);

        assert_eq!(rx.try_recv().unwrap(), HostEvent::VoicesChanged);
        assert_eq!(synth.voices().unwrap().len(), 1);
    }

    #[test]
    fn test_emit_without_subscriber() {
        let mut synth = MemorySynthesis::deferred();
        assert!(!synth.emit(SpeechEvent::Start));

        let (tx, _rx) = channel();
        synth.attach(tx).unwrap();
        assert!(synth.emit(SpeechEvent::Start));

        synth.detach();
        assert!(!synth.is_attached());
    }

    #[test]
    fn test_unsupported() {
        let mut synth = MemorySynthesis::unsupported();
        assert!(!synth.is_supported());
        assert!(synth.speak(&Utterance::default()).is_err());
    }
}
