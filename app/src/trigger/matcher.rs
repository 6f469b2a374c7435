/// Matching strategy behind the trigger detector. Implementations decide
/// whether a transcript contains a trigger utterance; the detector's caller
/// contract never changes when the strategy is swapped.
pub trait TriggerMatcher: Send + Sync {
    fn matches(&self, text: &str) -> bool;
}

/// Default strategy: case-folded, whitespace-collapsed substring
/// containment of any configured phrase. Tolerates transcription noise
/// around the phrase but does no edit-distance fuzzing.
pub struct PhraseMatcher {
    phrases: Vec<String>,
}

impl PhraseMatcher {
    pub fn new(phrases: &[String]) -> Self {
        Self {
            phrases: phrases
                .iter()
                .map(|p| normalize(p))
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }
}

impl TriggerMatcher for PhraseMatcher {
    fn matches(&self, text: &str) -> bool {
        let normalized = normalize(text);
        self.phrases.iter().any(|p| normalized.contains(p.as_str()))
    }
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
