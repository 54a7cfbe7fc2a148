use super::types::{LengthDirection, LengthPreference, Tone};

pub(crate) const TONE_KEYWORDS: &[&str] = &["tone", "formal", "casual", "professional", "friendly"];
pub(crate) const LENGTH_KEYWORDS: &[&str] = &["longer", "shorter", "brief", "expand", "condense"];
pub(crate) const STRUCTURE_KEYWORDS: &[&str] = &["structure", "organize", "flow", "format"];

const EXPAND_KEYWORDS: &[&str] = &["longer", "expand", "more detail"];
const SHORT_KEYWORDS: &[&str] = &["shorter", "brief"];
const LONG_KEYWORDS: &[&str] = &["longer", "expand"];

/// What a piece of feedback text asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Intent {
    /// First tone named in the text.
    pub tone: Option<Tone>,
    /// The text talks about tone at all.
    pub tone_requested: bool,
    pub length_direction: Option<LengthDirection>,
    pub preferred_length: Option<LengthPreference>,
    /// Structural keywords found, in table order.
    pub structural_hints: Vec<String>,
}

/// Turns free-text feedback into an [`Intent`].
///
/// Implementations must be deterministic: the scorer and the analyzer rely on
/// classifying the same text twice giving the same answer.
pub trait IntentClassifier: Send + Sync {
    fn classify_intent(&self, text: &str) -> Intent;

    fn name(&self) -> &str;
}

/// Substring rule table over lower-cased text.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

pub(crate) fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

impl IntentClassifier for KeywordClassifier {
    fn classify_intent(&self, text: &str) -> Intent {
        let text = text.to_lowercase();

        let tone = Tone::ALL
            .into_iter()
            .find(|tone| text.contains(tone.to_string().as_str()));

        let length_direction = contains_any(&text, LENGTH_KEYWORDS).then(|| {
            if contains_any(&text, EXPAND_KEYWORDS) {
                LengthDirection::Expand
            } else {
                LengthDirection::Condense
            }
        });

        let preferred_length = if contains_any(&text, SHORT_KEYWORDS) {
            Some(LengthPreference::Short)
        } else if contains_any(&text, LONG_KEYWORDS) {
            Some(LengthPreference::Long)
        } else {
            None
        };

        let structural_hints = STRUCTURE_KEYWORDS
            .iter()
            .filter(|keyword| text.contains(*keyword))
            .map(|keyword| (*keyword).to_string())
            .collect();

        Intent {
            tone,
            tone_requested: contains_any(&text, TONE_KEYWORDS),
            length_direction,
            preferred_length,
            structural_hints,
        }
    }

    fn name(&self) -> &str {
        "keyword"
    }
}
