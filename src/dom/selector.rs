//! CSS-like selectors
//!
//! Supported: selector groups (`a, b`), compound selectors built from a tag
//! name, `*`, `#id` and `.class`, and the descendant combinator (whitespace).

use crate::{Result, SpeechError};
use std::fmt;

/// One compound selector, e.g. `p.speech#intro`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    /// Lowercased tag name; `None` matches any tag
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
}

/// A chain of compounds joined by descendant combinators
///
/// The last compound matches the element itself; earlier ones must match
/// ancestors, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Complex {
    pub parts: Vec<Compound>,
}

/// A comma-separated selector group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub alternatives: Vec<Complex>,
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_'
}

fn invalid(input: &str, reason: &str) -> SpeechError {
    SpeechError::Selector(format!("{:?}: {}", input, reason))
}

impl Compound {
    fn parse(token: &str, input: &str) -> Result<Self> {
        let mut compound = Compound::default();
        let mut chars = token.chars().peekable();

        // Leading tag name or universal selector
        if chars.peek() == Some(&'*') {
            chars.next();
        } else {
            let tag: String = std::iter::from_fn(|| chars.next_if(|c| is_name_char(*c))).collect();
            if !tag.is_empty() {
                compound.tag = Some(tag.to_lowercase());
            }
        }

        while let Some(prefix) = chars.next() {
            let name: String = std::iter::from_fn(|| chars.next_if(|c| is_name_char(*c))).collect();
            if name.is_empty() {
                return Err(invalid(input, "expected a name"));
            }
            match prefix {
                '#' if compound.id.is_none() => compound.id = Some(name),
                '#' => return Err(invalid(input, "more than one id")),
                '.' => compound.classes.push(name),
                other => return Err(invalid(input, &format!("unexpected {:?}", other))),
            }
        }

        Ok(compound)
    }

    pub fn matches(&self, tag: &str, id: Option<&str>, classes: &[String]) -> bool {
        if let Some(expected) = &self.tag {
            if !expected.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(expected) = &self.id {
            if id != Some(expected.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| classes.contains(c))
    }
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self> {
        let mut alternatives = Vec::new();

        for group in input.split(',') {
            let parts = group
                .split_whitespace()
                .map(|token| Compound::parse(token, input))
                .collect::<Result<Vec<_>>>()?;
            if parts.is_empty() {
                return Err(invalid(input, "empty selector"));
            }
            alternatives.push(Complex { parts });
        }

        Ok(Self { alternatives })
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}", tag)?,
            None if self.id.is_none() && self.classes.is_empty() => write!(f, "*")?,
            None => {}
        }
        if let Some(id) = &self.id {
            write!(f, "#{}", id)?;
        }
        for class in &self.classes {
            write!(f, ".{}", class)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_class() {
        let selector = Selector::parse(".speech").unwrap();
        assert_eq!(selector.alternatives.len(), 1);
        let part = &selector.alternatives[0].parts[0];
        assert_eq!(part.tag, None);
        assert_eq!(part.classes, vec!["speech".to_string()]);
    }

    #[test]
    fn test_parse_compound_and_descendant() {
        let selector = Selector::parse("article p.lead#first").unwrap();
        let parts = &selector.alternatives[0].parts;
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].tag.as_deref(), Some("article"));
        assert_eq!(parts[1].id.as_deref(), Some("first"));
        assert_eq!(parts[1].to_string(), "p#first.lead");
    }

    #[test]
    fn test_parse_group() {
        let selector = Selector::parse("h1, .speech").unwrap();
        assert_eq!(selector.alternatives.len(), 2);
    }

    #[test]
    fn test_invalid() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("p,").is_err());
        assert!(Selector::parse("p > a").is_err());
        assert!(Selector::parse("#a#b").is_err());
        assert!(Selector::parse(".").is_err());
    }

    #[test]
    fn test_compound_matches() {
        let compound = Selector::parse("P.speech").unwrap().alternatives[0].parts[0].clone();
        let classes = vec!["speech".to_string(), "lead".to_string()];
        assert!(compound.matches("p", None, &classes));
        assert!(!compound.matches("div", None, &classes));
        assert!(!compound.matches("p", None, &[]));
    }
}
