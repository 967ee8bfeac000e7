//! Text formatting properties

use pagespeak::speech::format::{format_text, Terminator, JAPANESE_LANG};
use proptest::prelude::*;
use regex::Regex;

fn period_runs() -> Regex {
    Regex::new(r"[.\s]{2,}").unwrap()
}

#[test]
fn test_examples() {
    assert_eq!(
        format_text(Some("Hello\n\nWorld   Foo"), "en-US"),
        "Hello. World. Foo"
    );
    assert_eq!(format_text(Some("Hello\r\n\r\nWorld"), "fr-FR"), "Hello. World");
    assert_eq!(format_text(Some("見出し\r\n本文"), JAPANESE_LANG), "見出し。本文");
    assert_eq!(format_text(None, "en-US"), "");
}

#[test]
fn test_terminators() {
    assert_eq!(Terminator::for_lang(JAPANESE_LANG).as_str(), "。");
    assert_eq!(Terminator::for_lang("en-US").as_str(), ". ");
    assert_eq!(Terminator::for_lang("").as_str(), ". ");
    assert!(!format_text(Some("a\nb"), JAPANESE_LANG).contains(' '));
}

proptest! {
    #[test]
    fn test_idempotent(text in "[a-z .\\t\\r\\n\u{3000}。]{0,40}") {
        for lang in ["en-US", JAPANESE_LANG] {
            let once = format_text(Some(&text), lang);
            let twice = format_text(Some(&once), lang);
            prop_assert_eq!(&once, &twice);
        }
    }

    #[test]
    fn test_idempotent_any_text(text in "\\PC{0,60}") {
        let once = format_text(Some(&text), "en-US");
        prop_assert_eq!(format_text(Some(&once), "en-US"), once);
    }

    #[test]
    fn test_no_repeated_terminators(text in "[a-z .\\t\\r\\n。]{0,40}") {
        let western = format_text(Some(&text), "en-US");
        for run in period_runs().find_iter(&western) {
            prop_assert_eq!(run.as_str(), ". ");
        }
        prop_assert!(!western.contains(".."));

        let japanese = format_text(Some(&text), JAPANESE_LANG);
        prop_assert!(!japanese.contains("。。"));
        prop_assert!(!japanese.contains('\n'));
    }

    #[test]
    fn test_no_line_breaks_or_outer_whitespace(text in "[a-z \\r\\n]{0,40}") {
        let formatted = format_text(Some(&text), "en-US");
        prop_assert!(!formatted.contains('\n'));
        prop_assert!(!formatted.contains('\r'));
        prop_assert_eq!(formatted.trim(), formatted.as_str());
    }
}
