//! Synthesis voices and language-based voice selection

use log::{debug, warn};

/// A named, language-tagged voice offered by the host engine
///
/// Voices are snapshots: the registry is replaced wholesale whenever the
/// host reports that its voice list changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Voice {
    /// Backend-specific identifier used to select the voice on the engine
    pub id: String,
    /// Human readable name, e.g. "Alex"
    pub name: String,
    /// BCP 47 language tag, e.g. "en-US"
    pub lang: String,
    /// Whether the host marks this voice as its default
    pub default: bool,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            lang: lang.into(),
            default: false,
        }
    }

    /// Mark this voice as the host default
    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }

    /// The empty voice returned when nothing could be selected
    pub fn placeholder() -> Self {
        Self::default()
    }

    /// A voice with no name never came from the host
    pub fn is_resolved(&self) -> bool {
        !self.name.is_empty()
    }

    /// Label shown in the voice picker: "name (lang)"
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.lang)
    }
}

/// Pick the voice for a language tag
///
/// The first voice whose tag matches exactly wins. Without a match the
/// host default is used (the last one, if the host marks several), and
/// without a default the unresolved placeholder is returned.
pub fn select_voice(voices: &[Voice], lang: &str) -> Voice {
    let mut fallback = None;

    for voice in voices {
        if voice.lang == lang {
            debug!("Selected voice {} for {:?}", voice.label(), lang);
            return voice.clone();
        } else if voice.default {
            fallback = Some(voice);
        }
    }

    match fallback {
        Some(voice) => {
            if !lang.is_empty() {
                warn!(
                    "No voice for language {:?}, using default voice {}",
                    lang,
                    voice.label()
                );
            }
            voice.clone()
        }
        None => {
            debug!("No voice available for {:?}", lang);
            Voice::placeholder()
        }
    }
}
