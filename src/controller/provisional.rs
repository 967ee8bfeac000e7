//! Selection override bookkeeping
//!
//! While the user's selection is being spoken, the configured message is
//! parked here so it can be put back once playback ends or is stopped.

/// Saved utterance text while a selection override is active
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionOverride {
    provisional: Option<String>,
}

impl SelectionOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.provisional.is_some()
    }

    /// Park `current` and return the replacement to speak instead
    ///
    /// If an override is already active the originally parked text is kept,
    /// so a second `play()` over a selection cannot lose the real message.
    pub fn apply(&mut self, current: String, selection: String) -> String {
        if self.provisional.is_none() {
            self.provisional = Some(current);
        }
        selection
    }

    /// Replace the parked text, e.g. when the message is changed mid-override
    pub fn update(&mut self, text: String) -> bool {
        match &mut self.provisional {
            Some(saved) => {
                *saved = text;
                true
            }
            None => false,
        }
    }

    /// End the override, handing back the parked text
    pub fn restore(&mut self) -> Option<String> {
        self.provisional.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_restore() {
        let mut state = SelectionOverride::new();
        assert!(!state.is_active());

        let spoken = state.apply("message".into(), "picked".into());
        assert_eq!(spoken, "picked");
        assert!(state.is_active());

        assert_eq!(state.restore().as_deref(), Some("message"));
        assert!(!state.is_active());
        assert_eq!(state.restore(), None);
    }

    #[test]
    fn test_second_apply_keeps_original() {
        let mut state = SelectionOverride::new();
        state.apply("message".into(), "first".into());
        state.apply("first".into(), "second".into());
        assert_eq!(state.restore().as_deref(), Some("message"));
    }

    #[test]
    fn test_update() {
        let mut state = SelectionOverride::new();
        assert!(!state.update("ignored".into()));
        state.apply("old".into(), "picked".into());
        assert!(state.update("new".into()));
        assert_eq!(state.restore().as_deref(), Some("new"));
    }
}
