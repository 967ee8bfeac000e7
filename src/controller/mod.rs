//! Speech controller
//!
//! The controller is the whole public surface: it finds the page text to
//! read, keeps the options and the single reusable utterance in sync, and
//! drives the host synthesizer through play, pause, resume and stop.
//!
//! Host notifications (voices changed, teardown, speech lifecycle events)
//! arrive on a channel handed to the synthesizer at construction. The
//! embedding loop drains it with `process_events`.

pub mod config;
pub mod provisional;

use crate::dom::{Document, ElementId, Page, SelectionSource};
use crate::speech::{
    format_text, select_voice, Callback, EventKind, HostEvent, SpeechEvent, SpeechSynthesis,
    Utterance, Voice,
};
use crate::{Result, SpeechError};
use config::{clamp_setting, Options, OptionsPatch, PITCH_RANGE, RATE_RANGE, VOLUME_RANGE};
use log::{debug, error, info, warn};
use provisional::SelectionOverride;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

/// Selector used when none is given
pub const DEFAULT_SELECTOR: &str = ".speech";

/// Playback state as seen by the controller
///
/// On engines that cannot pause, `pause` leaves the state at `Speaking`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Speaking,
    Paused,
}

/// The host capabilities a controller runs on
pub struct Host {
    /// `None` when the host cannot synthesize speech at all
    pub synthesis: Option<Box<dyn SpeechSynthesis>>,
    pub document: Box<dyn Document>,
    pub selection: Box<dyn SelectionSource>,
}

impl Host {
    pub fn new(
        synthesis: Box<dyn SpeechSynthesis>,
        document: Box<dyn Document>,
        selection: Box<dyn SelectionSource>,
    ) -> Self {
        Self {
            synthesis: Some(synthesis),
            document,
            selection,
        }
    }

    /// A page serves as both the document and the selection source
    pub fn with_page(synthesis: Box<dyn SpeechSynthesis>, page: Page) -> Self {
        Self::new(synthesis, Box::new(page.clone()), Box::new(page))
    }
}

/// Reads page text aloud through the host synthesizer
pub struct SpeechController {
    synth: Box<dyn SpeechSynthesis>,
    document: Box<dyn Document>,
    selection: Box<dyn SelectionSource>,

    selector: String,

    /// What the user asked for, re-applied on every initialization
    patch: OptionsPatch,
    options: Options,

    /// Snapshot of the host voice list
    voices: Vec<Voice>,
    elements: Vec<ElementId>,

    utterance: Utterance,
    selection_override: SelectionOverride,
    state: PlaybackState,

    sender: Sender<HostEvent>,
    events: Receiver<HostEvent>,
    subscribed: bool,
}

impl SpeechController {
    /// Create a controller reading the elements matched by `selector`
    ///
    /// `None` uses `DEFAULT_SELECTOR`. Fails with `CapabilityUnsupported`
    /// when the host has no synthesizer. If the host has not loaded its
    /// voices yet, the controller finishes initializing when the
    /// `VoicesChanged` notification is processed.
    pub fn new(host: Host, selector: Option<&str>, options: OptionsPatch) -> Result<Self> {
        let mut synth = match host.synthesis {
            Some(synth) if synth.is_supported() => synth,
            _ => {
                return Err(SpeechError::CapabilityUnsupported(
                    "the host provides no speech synthesis".to_string(),
                ))
            }
        };

        let (sender, events) = channel();
        synth.attach(sender.clone())?;

        let selector = selector.unwrap_or(DEFAULT_SELECTOR).to_string();
        info!("Creating speech controller for {:?}", selector);

        let mut controller = Self {
            synth,
            document: host.document,
            selection: host.selection,
            selector,
            patch: options,
            options: Options::default(),
            voices: Vec::new(),
            elements: Vec::new(),
            utterance: Utterance::default(),
            selection_override: SelectionOverride::new(),
            state: PlaybackState::Idle,
            sender,
            events,
            subscribed: true,
        };

        controller.init()?;
        Ok(controller)
    }

    /// Create a controller for the default selector
    pub fn with_options(host: Host, options: OptionsPatch) -> Result<Self> {
        Self::new(host, None, options)
    }

    /// Resolve elements, fetch voices, merge options and build the utterance
    ///
    /// Without voices only the first three steps run.
    fn init(&mut self) -> Result<()> {
        self.elements = self.document.query_selector_all(&self.selector)?;
        debug!("Selector {:?} matched {} elements", self.selector, self.elements.len());

        self.voices = self.synth.voices()?;
        self.options.merge(&self.patch);

        if self.voices.is_empty() {
            info!("No voices loaded yet, waiting for the host");
            return Ok(());
        }

        self.options.voice = Some(select_voice(&self.voices, &self.options.lang));
        self.assemble_message()?;
        self.sync_utterance();
        self.render_voice_list()?;

        info!(
            "Speech controller ready: {} voices, {} elements",
            self.voices.len(),
            self.elements.len()
        );
        Ok(())
    }

    /// Language of the resolved voice, which decides the terminator
    fn voice_lang(&self) -> &str {
        self.options
            .voice
            .as_ref()
            .map(|v| v.lang.as_str())
            .unwrap_or("")
    }

    /// Configured text followed by the text of every matched element
    ///
    /// Always starts from the configured text, so running it again after the
    /// voices change does not repeat the page text.
    fn assemble_message(&mut self) -> Result<()> {
        let lang = self.voice_lang().to_string();
        let configured = self.patch.text.as_deref().unwrap_or("");

        let mut message = format_text(Some(configured), &lang);
        for id in &self.elements {
            let text = self.document.element_text(*id)?;
            message.push_str(&format_text(Some(&text), &lang));
            message.push(' ');
        }

        debug!("Assembled message of {} chars", message.len());
        self.options.text = message;
        Ok(())
    }

    /// Copy the options into the utterance
    ///
    /// Must run after every change to the options. During a selection
    /// override the new text is parked instead of replacing the selection.
    pub fn sync_utterance(&mut self) {
        self.utterance.voice = self.options.voice.clone().unwrap_or_default();
        self.utterance.volume = self.options.volume;
        self.utterance.rate = self.options.rate;
        self.utterance.pitch = self.options.pitch;
        self.utterance.handlers = self.options.handlers.clone();

        if !self.selection_override.update(self.options.text.clone()) {
            self.utterance.text = self.options.text.clone();
        }

        if self.options.debug {
            info!("Utterance: {:?}", self.utterance);
        }
    }

    /// Append one entry per voice to the configured container
    ///
    /// Entries are appended on every initialization; nothing is removed.
    fn render_voice_list(&mut self) -> Result<()> {
        if self.options.select_id.is_empty() {
            return Ok(());
        }

        for voice in &self.voices {
            let added = self.document.append_child(
                &self.options.select_id,
                &self.options.select_element,
                &voice.label(),
                &voice.lang,
            )?;
            if !added {
                debug!("No element with id {:?} for the voice list", self.options.select_id);
                return Ok(());
            }
        }

        debug!("Rendered {} voices into #{}", self.voices.len(), self.options.select_id);
        Ok(())
    }

    /// Speak the selection instead of the message if the user has one
    fn apply_selection(&mut self) -> bool {
        let selected = match self.selection.selected_text() {
            Ok(text) => text,
            Err(e) => {
                warn!("Could not read the text selection: {}", e);
                return false;
            }
        };
        if selected.is_empty() {
            return false;
        }

        let formatted = format_text(Some(&selected), self.voice_lang());
        debug!("Speaking selection of {} chars", formatted.len());
        let current = std::mem::take(&mut self.utterance.text);
        self.utterance.text = self.selection_override.apply(current, formatted);
        true
    }

    /// Put the message back after a selection override
    fn restore_text(&mut self) -> bool {
        match self.selection_override.restore() {
            Some(saved) => {
                self.utterance.text = saved;
                true
            }
            None => false,
        }
    }

    /// Route a failed host call to the error callback
    fn host_failed(&mut self, action: &str, e: SpeechError) {
        error!("{} failed: {}", action, e);
        self.dispatch(SpeechEvent::Error(e.to_string()));
    }

    // Playback

    /// Enqueue the utterance on the host
    ///
    /// Calling this while already speaking queues a second utterance behind
    /// the first; it does not replace it.
    pub fn play(&mut self) -> Result<()> {
        if !self.is_ready() {
            self.init()?;
        }

        self.apply_selection();

        if self.options.debug {
            info!("Playing: {:?}", self.utterance);
        }

        match self.synth.speak(&self.utterance) {
            Ok(()) => self.state = PlaybackState::Speaking,
            Err(e) => self.host_failed("Speak", e),
        }
        Ok(())
    }

    /// Hold the current utterance
    ///
    /// The state stays `Speaking` on engines without pause support, since
    /// the audio keeps playing there.
    pub fn pause(&mut self) {
        if let Err(e) = self.synth.pause() {
            return self.host_failed("Pause", e);
        }
        if !self.synth.can_pause() {
            warn!("The speech engine cannot pause; still speaking");
            return;
        }
        if self.state == PlaybackState::Speaking {
            self.state = PlaybackState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if let Err(e) = self.synth.resume() {
            return self.host_failed("Resume", e);
        }
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Speaking;
        }
    }

    /// Cancel everything queued on the host and end any selection override
    pub fn stop(&mut self) {
        self.restore_text();
        self.state = PlaybackState::Idle;
        if let Err(e) = self.synth.cancel() {
            self.host_failed("Cancel", e);
        }
    }

    // Host events

    /// Drain and handle pending host notifications
    pub fn process_events(&mut self) -> Result<usize> {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle_host_event(event)?;
            handled += 1;
        }
        Ok(handled)
    }

    pub fn handle_host_event(&mut self, event: HostEvent) -> Result<()> {
        match event {
            HostEvent::VoicesChanged => {
                info!("Host voices changed, reinitializing");
                self.init()
            }
            HostEvent::Unload => {
                info!("Host unloading, stopping speech");
                self.stop();
                Ok(())
            }
            HostEvent::Speech(event) => {
                self.dispatch(event);
                Ok(())
            }
        }
    }

    /// Apply a lifecycle event, then invoke its callback
    pub fn dispatch(&mut self, event: SpeechEvent) {
        debug!("Speech event: {:?}", event);
        match &event {
            SpeechEvent::Start | SpeechEvent::Resume => self.state = PlaybackState::Speaking,
            SpeechEvent::Pause => self.state = PlaybackState::Paused,
            SpeechEvent::End | SpeechEvent::Error(_) => {
                self.restore_text();
                self.state = PlaybackState::Idle;
            }
            SpeechEvent::Boundary { .. } | SpeechEvent::Mark { .. } => {}
        }
        self.utterance.handlers.fire(&event);
    }

    /// Sender for notifications from outside the synthesizer (e.g. teardown)
    pub fn event_sender(&self) -> Sender<HostEvent> {
        self.sender.clone()
    }

    /// Withdraw the host subscription. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.subscribed {
            debug!("Detaching from host notifications");
            self.synth.detach();
            self.subscribed = false;
        }
    }

    // Live reconfiguration

    /// Replace the text spoken by the next `play()`
    pub fn replace_text(&mut self, text: &str) {
        self.options.text = text.to_string();
        self.sync_utterance();
    }

    /// Switch to the voice for `lang`, falling back like initialization does
    pub fn change_voice(&mut self, lang: &str) {
        self.patch.lang = Some(lang.to_string());
        self.options.lang = lang.to_string();
        self.options.voice = Some(select_voice(&self.voices, lang));
        self.sync_utterance();
    }

    pub fn change_volume(&mut self, volume: f32) {
        self.patch.volume = Some(volume);
        self.options.volume = clamp_setting("volume", volume, VOLUME_RANGE);
        self.sync_utterance();
    }

    pub fn change_rate(&mut self, rate: f32) {
        self.patch.rate = Some(rate);
        self.options.rate = clamp_setting("rate", rate, RATE_RANGE);
        self.sync_utterance();
    }

    pub fn change_pitch(&mut self, pitch: f32) {
        self.patch.pitch = Some(pitch);
        self.options.pitch = clamp_setting("pitch", pitch, PITCH_RANGE);
        self.sync_utterance();
    }

    /// Bind the callback for one event, replacing the previous one
    pub fn on(&mut self, kind: EventKind, callback: Callback) {
        debug!("Binding {} callback", kind.name());
        self.patch.handlers.set(kind, callback.clone());
        self.options.handlers.set(kind, callback);
        self.sync_utterance();
    }

    pub fn on_boundary(&mut self, f: impl Fn(&SpeechEvent) + Send + Sync + 'static) {
        self.on(EventKind::Boundary, Arc::new(f));
    }

    /// The end callback runs after the selection override is undone
    pub fn on_end(&mut self, f: impl Fn(&SpeechEvent) + Send + Sync + 'static) {
        self.on(EventKind::End, Arc::new(f));
    }

    pub fn on_error(&mut self, f: impl Fn(&SpeechEvent) + Send + Sync + 'static) {
        self.on(EventKind::Error, Arc::new(f));
    }

    pub fn on_mark(&mut self, f: impl Fn(&SpeechEvent) + Send + Sync + 'static) {
        self.on(EventKind::Mark, Arc::new(f));
    }

    pub fn on_pause(&mut self, f: impl Fn(&SpeechEvent) + Send + Sync + 'static) {
        self.on(EventKind::Pause, Arc::new(f));
    }

    pub fn on_resume(&mut self, f: impl Fn(&SpeechEvent) + Send + Sync + 'static) {
        self.on(EventKind::Resume, Arc::new(f));
    }

    pub fn on_start(&mut self, f: impl Fn(&SpeechEvent) + Send + Sync + 'static) {
        self.on(EventKind::Start, Arc::new(f));
    }

    // Accessors

    /// Whether initialization ran with the host's voices
    ///
    /// Stays true when no voice matched: the placeholder voice then leaves
    /// the choice to the engine.
    pub fn is_ready(&self) -> bool {
        self.options.voice.is_some()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn utterance(&self) -> &Utterance {
        &self.utterance
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn elements(&self) -> &[ElementId] {
        &self.elements
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn is_override_active(&self) -> bool {
        self.selection_override.is_active()
    }

    /// Whether the host is still speaking, if it can tell
    pub fn is_speaking(&self) -> Result<Option<bool>> {
        self.synth.is_speaking()
    }
}

impl Drop for SpeechController {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;
    use crate::speech::backends::memory::{MemorySynthesis, SynthCall};

    fn page() -> Page {
        let page = Page::new();
        page.push(Element::new("p").with_class("speech").with_text("First line\nSecond"));
        page.push(Element::new("p").with_text("Not read"));
        page
    }

    fn controller(synth: &MemorySynthesis, page: &Page, options: OptionsPatch) -> SpeechController {
        let host = Host::with_page(Box::new(synth.clone()), page.clone());
        SpeechController::with_options(host, options).unwrap()
    }

    #[test]
    fn test_init_assembles_message() {
        let synth = MemorySynthesis::new(vec![Voice::new("Alex", "en-US").as_default()]);
        let speech = controller(&synth, &page(), OptionsPatch::new().text("Intro"));

        assert!(speech.is_ready());
        assert_eq!(speech.options().text, "IntroFirst line. Second ");
        assert_eq!(speech.utterance().text, speech.options().text);
        assert_eq!(speech.utterance().voice.name, "Alex");
    }

    #[test]
    fn test_unsupported_host() {
        let host = Host::with_page(Box::new(MemorySynthesis::unsupported()), Page::new());
        let result = SpeechController::with_options(host, OptionsPatch::new());
        assert!(matches!(result, Err(SpeechError::CapabilityUnsupported(_))));

        let host = Host {
            synthesis: None,
            document: Box::new(Page::new()),
            selection: Box::new(Page::new()),
        };
        assert!(matches!(
            SpeechController::with_options(host, OptionsPatch::new()),
            Err(SpeechError::CapabilityUnsupported(_))
        ));
    }

    #[test]
    fn test_pause_resume_transitions() {
        let synth = MemorySynthesis::new(vec![Voice::new("Alex", "en-US")]);
        let mut speech = controller(&synth, &page(), OptionsPatch::new());

        speech.pause();
        assert_eq!(speech.state(), PlaybackState::Idle);

        speech.play().unwrap();
        speech.pause();
        assert_eq!(speech.state(), PlaybackState::Paused);
        speech.resume();
        assert_eq!(speech.state(), PlaybackState::Speaking);
        speech.stop();
        assert_eq!(speech.state(), PlaybackState::Idle);

        assert_eq!(
            synth.calls()[1..],
            [
                SynthCall::Speak("First line. Second ".to_string()),
                SynthCall::Pause,
                SynthCall::Resume,
                SynthCall::Cancel,
            ]
        );
    }

    #[test]
    fn test_dispose_detaches() {
        let synth = MemorySynthesis::new(vec![Voice::new("Alex", "en-US")]);
        let mut speech = controller(&synth, &page(), OptionsPatch::new());
        assert!(synth.is_attached());
        speech.dispose();
        assert!(!synth.is_attached());
        speech.dispose();

        let speech = controller(&synth, &page(), OptionsPatch::new());
        assert!(synth.is_attached());
        drop(speech);
        assert!(!synth.is_attached());
    }
}
