//! Voice selection policy.
//!
//! Selection is deliberately dumb: the first available voice from an ordered
//! preference list, else the first voice passing a fallback predicate, else
//! none. No fuzzy matching.

/// One voice an engine can speak with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub id: String,
    pub language: String,
}

type FallbackPredicate = Box<dyn Fn(&Voice) -> bool + Send + Sync>;

pub struct VoicePolicy {
    preferred: Vec<String>,
    fallback: FallbackPredicate,
}

impl VoicePolicy {
    pub fn new(preferred: Vec<String>, fallback: FallbackPredicate) -> Self {
        Self { preferred, fallback }
    }

    /// Default policy: the user's persisted voice first, then any
    /// English-language voice.
    pub fn english_default(preferred_voice: Option<String>) -> Self {
        Self::new(
            preferred_voice.into_iter().collect(),
            Box::new(|voice| voice.language.to_ascii_lowercase().starts_with("en")),
        )
    }

    /// First preferred match, else first fallback match, else none.
    pub fn select<'a>(&self, voices: &'a [Voice]) -> Option<&'a Voice> {
        self.preferred
            .iter()
            .find_map(|wanted| voices.iter().find(|v| &v.id == wanted))
            .or_else(|| voices.iter().find(|v| (self.fallback)(v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices() -> Vec<Voice> {
        vec![
            Voice {
                id: "fr-fr".to_string(),
                language: "fr".to_string(),
            },
            Voice {
                id: "en-gb".to_string(),
                language: "en-GB".to_string(),
            },
            Voice {
                id: "en-us".to_string(),
                language: "en-US".to_string(),
            },
        ]
    }

    #[test]
    fn preferred_voice_wins_over_fallback() {
        let policy = VoicePolicy::english_default(Some("en-us".to_string()));
        assert_eq!(policy.select(&voices()).map(|v| v.id.as_str()), Some("en-us"));
    }

    #[test]
    fn preference_order_is_respected() {
        let policy = VoicePolicy::new(
            vec!["missing".to_string(), "en-gb".to_string(), "en-us".to_string()],
            Box::new(|_| true),
        );
        assert_eq!(policy.select(&voices()).map(|v| v.id.as_str()), Some("en-gb"));
    }

    #[test]
    fn falls_back_to_first_predicate_match() {
        let policy = VoicePolicy::english_default(Some("no-such-voice".to_string()));
        assert_eq!(policy.select(&voices()).map(|v| v.id.as_str()), Some("en-gb"));
    }

    #[test]
    fn none_when_nothing_matches() {
        let policy = VoicePolicy::new(
            vec!["x".to_string()],
            Box::new(|v| v.language.starts_with("de")),
        );
        assert_eq!(policy.select(&voices()), None);
        assert_eq!(policy.select(&[]), None);
    }
}
