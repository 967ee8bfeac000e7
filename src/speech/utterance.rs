//! The utterance handed to the synthesizer, and its lifecycle events

use super::voice::Voice;
use std::fmt;
use std::sync::Arc;

/// Lifecycle events delivered by the synthesis engine
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    Start,
    End,
    Pause,
    Resume,
    /// A word or sentence boundary was reached
    Boundary { char_index: usize, name: String },
    /// A named SSML mark was reached
    Mark { name: String },
    /// The engine failed to speak the utterance
    Error(String),
}

impl SpeechEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SpeechEvent::Start => EventKind::Start,
            SpeechEvent::End => EventKind::End,
            SpeechEvent::Pause => EventKind::Pause,
            SpeechEvent::Resume => EventKind::Resume,
            SpeechEvent::Boundary { .. } => EventKind::Boundary,
            SpeechEvent::Mark { .. } => EventKind::Mark,
            SpeechEvent::Error(_) => EventKind::Error,
        }
    }
}

/// The seven callback slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Boundary,
    End,
    Error,
    Mark,
    Pause,
    Resume,
    Start,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::Boundary,
        EventKind::End,
        EventKind::Error,
        EventKind::Mark,
        EventKind::Pause,
        EventKind::Resume,
        EventKind::Start,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EventKind::Boundary => "boundary",
            EventKind::End => "end",
            EventKind::Error => "error",
            EventKind::Mark => "mark",
            EventKind::Pause => "pause",
            EventKind::Resume => "resume",
            EventKind::Start => "start",
        }
    }
}

/// A user callback bound to one event slot
pub type Callback = Arc<dyn Fn(&SpeechEvent) + Send + Sync>;

/// One handler per event kind
///
/// Binding a slot replaces whatever was there; there is no fan-out.
#[derive(Clone, Default)]
pub struct EventHandlers {
    boundary: Option<Callback>,
    end: Option<Callback>,
    error: Option<Callback>,
    mark: Option<Callback>,
    pause: Option<Callback>,
    resume: Option<Callback>,
    start: Option<Callback>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, kind: EventKind) -> &mut Option<Callback> {
        match kind {
            EventKind::Boundary => &mut self.boundary,
            EventKind::End => &mut self.end,
            EventKind::Error => &mut self.error,
            EventKind::Mark => &mut self.mark,
            EventKind::Pause => &mut self.pause,
            EventKind::Resume => &mut self.resume,
            EventKind::Start => &mut self.start,
        }
    }

    /// Bind a callback, replacing the previous one
    pub fn set(&mut self, kind: EventKind, callback: Callback) {
        *self.slot_mut(kind) = Some(callback);
    }

    pub fn get(&self, kind: EventKind) -> Option<&Callback> {
        match kind {
            EventKind::Boundary => self.boundary.as_ref(),
            EventKind::End => self.end.as_ref(),
            EventKind::Error => self.error.as_ref(),
            EventKind::Mark => self.mark.as_ref(),
            EventKind::Pause => self.pause.as_ref(),
            EventKind::Resume => self.resume.as_ref(),
            EventKind::Start => self.start.as_ref(),
        }
    }

    pub fn is_bound(&self, kind: EventKind) -> bool {
        self.get(kind).is_some()
    }

    /// Invoke the handler for this event, if one is bound
    pub fn fire(&self, event: &SpeechEvent) -> bool {
        match self.get(event.kind()) {
            Some(callback) => {
                callback(event);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound: Vec<&str> = EventKind::ALL
            .iter()
            .filter(|kind| self.is_bound(**kind))
            .map(|kind| kind.name())
            .collect();
        f.debug_struct("EventHandlers").field("bound", &bound).finish()
    }
}

/// Parameters for one spoken unit
///
/// A controller owns exactly one of these and mutates it in place; it holds
/// no reference back to the options it was populated from.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub voice: Voice,
    pub volume: f32,
    pub rate: f32,
    pub pitch: f32,
    pub text: String,
    pub handlers: EventHandlers,
}

impl Default for Utterance {
    fn default() -> Self {
        Utterance {
            voice: Voice::placeholder(),
            volume: 1.0,
            rate: 1.0,
            pitch: 1.0,
            text: String::new(),
            handlers: EventHandlers::new(),
        }
    }
}
