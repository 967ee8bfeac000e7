//! Text normalization for the speech engine
//!
//! Line breaks and runs of whitespace become sentence terminators so the
//! engine pauses where the page visually breaks. Japanese voices get the
//! ideographic full stop instead of ". ".

use once_cell::sync::Lazy;
use regex::Regex;

/// Language tag that switches to the ideographic full stop
pub const JAPANESE_LANG: &str = "ja-JP";

/// Runs of CR, runs of LF, CR/LF mixes, or two-or-more whitespace chars
static BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r+|\n+|[\n\r]+|\s{2,}").expect("valid break pattern"));

/// Runs of periods mixed with whitespace, left behind by the first pass
static PERIOD_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.\s]{2,}").expect("valid period pattern"));

static IDEOGRAPHIC_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"。{2,}").expect("valid full stop pattern"));

/// The sentence terminator used for a voice language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// ". "
    Period,
    /// "。" with no following space
    IdeographicFullStop,
}

impl Terminator {
    pub fn for_lang(lang: &str) -> Self {
        if lang == JAPANESE_LANG {
            Terminator::IdeographicFullStop
        } else {
            Terminator::Period
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Terminator::Period => ". ",
            Terminator::IdeographicFullStop => "。",
        }
    }

    fn runs(self) -> &'static Regex {
        match self {
            Terminator::Period => &PERIOD_RUNS,
            Terminator::IdeographicFullStop => &IDEOGRAPHIC_RUNS,
        }
    }
}

/// Normalize text for a voice language
///
/// Absent text formats to an empty string. Formatting already formatted
/// text returns it unchanged.
pub fn format_text(text: Option<&str>, lang: &str) -> String {
    let Some(text) = text else {
        return String::new();
    };

    let terminator = Terminator::for_lang(lang);
    let replacement = terminator.as_str();

    let first = BREAKS.replace_all(text, replacement);
    let second = terminator.runs().replace_all(first.trim(), replacement);

    second.trim().to_string()
}
