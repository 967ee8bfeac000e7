//! Speech options
//!
//! `Options` holds the live configuration of a controller. Users never build
//! one directly: they describe what to change in an `OptionsPatch` (by hand,
//! from JSON, or from the `[speech]` section of an INI file) and the
//! controller merges it over the defaults.

use crate::speech::{Callback, EventHandlers, EventKind, SpeechEvent, Voice};
use crate::{Result, SpeechError};
use ini::Ini;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const VOLUME_RANGE: (f32, f32) = (0.0, 1.0);
pub const RATE_RANGE: (f32, f32) = (0.1, 10.0);
pub const PITCH_RANGE: (f32, f32) = (0.0, 2.0);

/// Clamp a prosody value into its range, warning when it was outside
pub(crate) fn clamp_setting(name: &str, value: f32, (min, max): (f32, f32)) -> f32 {
    if value.is_nan() {
        warn!("{} is not a number, using {}", name, max.min(1.0));
        return max.min(1.0);
    }
    if value < min || value > max {
        warn!("{} {} out of range {}-{}, clamping", name, value, min, max);
    }
    value.clamp(min, max)
}

/// Live configuration of a controller
#[derive(Debug, Clone)]
pub struct Options {
    /// Language to pick a voice for, e.g. "en-US"
    pub lang: String,
    /// Voice resolved from `lang`; `None` until voices are available
    pub voice: Option<Voice>,
    pub volume: f32,
    pub rate: f32,
    pub pitch: f32,
    /// Text to speak. After initialization this is the full assembled message.
    pub text: String,
    /// Id of the element that receives the voice list
    pub select_id: String,
    /// Tag of each voice list entry
    pub select_element: String,
    pub handlers: EventHandlers,
    /// Log the utterance whenever it is synced or spoken
    pub debug: bool,
    /// Keys the merge did not recognize, kept as given
    pub extra: HashMap<String, Value>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            lang: String::new(),
            voice: None,
            volume: 1.0,
            rate: 1.0,
            pitch: 1.0,
            text: String::new(),
            select_id: String::new(),
            select_element: "option".to_string(),
            handlers: EventHandlers::new(),
            debug: false,
            extra: HashMap::new(),
        }
    }
}

impl Options {
    /// Overwrite every key the patch sets, leaving the rest alone
    pub fn merge(&mut self, patch: &OptionsPatch) {
        if let Some(lang) = &patch.lang {
            self.lang = lang.clone();
        }
        if let Some(volume) = patch.volume {
            self.volume = clamp_setting("volume", volume, VOLUME_RANGE);
        }
        if let Some(rate) = patch.rate {
            self.rate = clamp_setting("rate", rate, RATE_RANGE);
        }
        if let Some(pitch) = patch.pitch {
            self.pitch = clamp_setting("pitch", pitch, PITCH_RANGE);
        }
        if let Some(text) = &patch.text {
            self.text = text.clone();
        }
        if let Some(select_id) = &patch.select_id {
            self.select_id = select_id.clone();
        }
        if let Some(select_element) = &patch.select_element {
            self.select_element = select_element.clone();
        }
        if let Some(debug) = patch.debug {
            self.debug = debug;
        }
        for kind in EventKind::ALL {
            if let Some(callback) = patch.handlers.get(kind) {
                self.handlers.set(kind, callback.clone());
            }
        }
        for (key, value) in &patch.unknown {
            warn!("Ignoring unknown option {:?}", key);
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// A set of option overrides
///
/// Keys left as `None` keep their current value when merged. Keys that are
/// not options end up in `unknown`.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct OptionsPatch {
    pub lang: Option<String>,
    pub volume: Option<f32>,
    pub rate: Option<f32>,
    pub pitch: Option<f32>,
    pub text: Option<String>,
    #[serde(alias = "selectId")]
    pub select_id: Option<String>,
    #[serde(alias = "selectElement")]
    pub select_element: Option<String>,
    pub debug: Option<bool>,
    #[serde(skip)]
    pub handlers: EventHandlers,
    #[serde(flatten)]
    pub unknown: HashMap<String, Value>,
}

impl std::fmt::Debug for OptionsPatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsPatch")
            .field("lang", &self.lang)
            .field("volume", &self.volume)
            .field("rate", &self.rate)
            .field("pitch", &self.pitch)
            .field("text", &self.text)
            .field("select_id", &self.select_id)
            .field("select_element", &self.select_element)
            .field("debug", &self.debug)
            .field("handlers", &self.handlers)
            .field("unknown", &self.unknown.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl OptionsPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lang(mut self, lang: &str) -> Self {
        self.lang = Some(lang.to_string());
        self
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn rate(mut self, rate: f32) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn pitch(mut self, pitch: f32) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn select_id(mut self, id: &str) -> Self {
        self.select_id = Some(id.to_string());
        self
    }

    pub fn select_element(mut self, tag: &str) -> Self {
        self.select_element = Some(tag.to_string());
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Bind a callback for one event
    pub fn on<F>(mut self, kind: EventKind, callback: F) -> Self
    where
        F: Fn(&SpeechEvent) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        self.handlers.set(kind, callback);
        self
    }

    /// Parse a JSON object such as `{"lang": "en-US", "volume": 0.5}`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let patch: Self = serde_json::from_str(json)?;
        debug!("Parsed options from JSON: {:?}", patch);
        Ok(patch)
    }

    /// Read the `[speech]` section of an INI file
    pub fn from_ini_file(path: &Path) -> Result<Self> {
        debug!("Loading options from {:?}", path);
        let ini = Ini::load_from_file(path)
            .map_err(|e| SpeechError::IniParse(format!("Failed to load config: {}", e)))?;
        Self::from_ini(&ini)
    }

    pub fn from_ini(ini: &Ini) -> Result<Self> {
        let mut patch = Self::default();
        let Some(section) = ini.section(Some("speech")) else {
            return Ok(patch);
        };

        for (key, value) in section.iter() {
            match key {
                "lang" => patch.lang = Some(value.to_string()),
                "volume" => patch.volume = Some(parse_number(key, value)?),
                "rate" => patch.rate = Some(parse_number(key, value)?),
                "pitch" => patch.pitch = Some(parse_number(key, value)?),
                "text" => patch.text = Some(value.to_string()),
                "select_id" => patch.select_id = Some(value.to_string()),
                "select_element" => patch.select_element = Some(value.to_string()),
                "debug" => {
                    patch.debug = Some(value.parse().map_err(|_| {
                        SpeechError::Config(format!("debug must be true or false, got {:?}", value))
                    })?)
                }
                other => {
                    patch
                        .unknown
                        .insert(other.to_string(), Value::String(value.to_string()));
                }
            }
        }

        Ok(patch)
    }

    /// Default config file path (~/.pagespeak.cfg)
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pagespeak.cfg")
    }
}

fn parse_number(key: &str, value: &str) -> Result<f32> {
    value
        .trim()
        .parse()
        .map_err(|_| SpeechError::Config(format!("{} must be a number, got {:?}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.lang, "");
        assert!(options.voice.is_none());
        assert_eq!(options.volume, 1.0);
        assert_eq!(options.rate, 1.0);
        assert_eq!(options.pitch, 1.0);
        assert_eq!(options.select_element, "option");
        assert!(!options.debug);
        assert!(!options.handlers.is_bound(EventKind::End));
    }

    #[test]
    fn test_merge_only_set_keys() {
        let mut options = Options::default();
        options.merge(&OptionsPatch::new().volume(0.5).lang("ja-JP"));
        assert_eq!(options.volume, 0.5);
        assert_eq!(options.lang, "ja-JP");
        assert_eq!(options.rate, 1.0);

        options.merge(&OptionsPatch::new().rate(2.0));
        assert_eq!(options.volume, 0.5);
        assert_eq!(options.rate, 2.0);
    }

    #[test]
    fn test_merge_clamps() {
        let mut options = Options::default();
        options.merge(&OptionsPatch::new().volume(3.0).pitch(-1.0).rate(100.0));
        assert_eq!(options.volume, 1.0);
        assert_eq!(options.pitch, 0.0);
        assert_eq!(options.rate, 10.0);
    }

    #[test]
    fn test_json_unknown_keys() {
        let patch = OptionsPatch::from_json_str(
            r#"{"volume": 0.25, "selectId": "voices", "colour": "red"}"#,
        )
        .unwrap();
        assert_eq!(patch.volume, Some(0.25));
        assert_eq!(patch.select_id.as_deref(), Some("voices"));

        let mut options = Options::default();
        options.merge(&patch);
        assert_eq!(options.volume, 0.25);
        assert_eq!(options.extra.get("colour"), Some(&Value::from("red")));
    }

    #[test]
    fn test_json_invalid() {
        assert!(OptionsPatch::from_json_str(r#"{"volume": "loud"}"#).is_err());
        assert!(OptionsPatch::from_json_str("not json").is_err());
    }

    #[test]
    fn test_ini_section() {
        let mut ini = Ini::new();
        ini.with_section(Some("speech"))
            .set("lang", "en-GB")
            .set("rate", "1.5")
            .set("debug", "true")
            .set("engine", "x");
        let patch = OptionsPatch::from_ini(&ini).unwrap();
        assert_eq!(patch.lang.as_deref(), Some("en-GB"));
        assert_eq!(patch.rate, Some(1.5));
        assert_eq!(patch.debug, Some(true));
        assert!(patch.unknown.contains_key("engine"));
        assert!(patch.volume.is_none());

        let mut bad = Ini::new();
        bad.with_section(Some("speech")).set("pitch", "high");
        assert!(OptionsPatch::from_ini(&bad).is_err());

        assert!(OptionsPatch::from_ini(&Ini::new()).unwrap().lang.is_none());
    }
}
