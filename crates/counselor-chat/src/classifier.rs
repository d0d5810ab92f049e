//! Keyword-based intent classification.
//!
//! Maps free text onto a support [`Category`] by substring matching against
//! fixed keyword sets. Sets are tried in priority order and the first hit
//! wins. Latin and Devanagari keywords are always checked together, so a
//! user may type in either script whatever the active language is.

use counselor_core::{Category, Language};

/// Keywords for one category, in both scripts.
pub struct KeywordSet {
    pub category: Category,
    pub latin: &'static [&'static str],
    pub devanagari: &'static [&'static str],
}

impl KeywordSet {
    fn matches(&self, normalized: &str) -> bool {
        self.latin
            .iter()
            .chain(self.devanagari.iter())
            .any(|keyword| normalized.contains(keyword))
    }
}

/// Priority-ordered keyword sets. Order matters: "career tips for my
/// academic grade" is academic, not career or study tips.
pub const KEYWORD_SETS: [KeywordSet; 4] = [
    KeywordSet {
        category: Category::Academic,
        latin: &["academic", "study", "grade"],
        // "padhai" is stored with a decomposed nukta (U+0922 U+093C).
        devanagari: &["शैक्षणिक", "\u{092A}\u{0922}\u{093C}\u{093E}\u{0908}"],
    },
    KeywordSet {
        category: Category::Career,
        latin: &["career", "job", "future"],
        devanagari: &["करियर", "नौकरी"],
    },
    KeywordSet {
        category: Category::MentalHealth,
        latin: &["mental", "stress", "anxiety"],
        devanagari: &["मानसिक", "तनाव"],
    },
    KeywordSet {
        category: Category::StudyTips,
        latin: &["tips", "help", "how"],
        devanagari: &["टिप्स", "कैसे"],
    },
];

/// Stateless classifier over [`KEYWORD_SETS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    /// Classify `text`. Pure and deterministic; `language` only tags the
    /// trace output and never changes the result.
    pub fn classify(text: &str, language: Language) -> Category {
        let normalized = normalize(text);
        let category = KEYWORD_SETS
            .iter()
            .find(|set| set.matches(&normalized))
            .map(|set| set.category)
            .unwrap_or(Category::Default);
        tracing::trace!(%language, %category, "Classified message");
        category
    }
}

/// Lower-case the input and split precomposed Devanagari nukta letters
/// (U+0958..=U+095F) into base letter + nukta, the form the keyword tables use.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let base = match c {
            '\u{0958}' => Some('\u{0915}'),
            '\u{0959}' => Some('\u{0916}'),
            '\u{095A}' => Some('\u{0917}'),
            '\u{095B}' => Some('\u{091C}'),
            '\u{095C}' => Some('\u{0921}'),
            '\u{095D}' => Some('\u{0922}'),
            '\u{095E}' => Some('\u{092B}'),
            '\u{095F}' => Some('\u{092F}'),
            _ => None,
        };
        match base {
            Some(b) => {
                out.push(b);
                out.push('\u{093C}');
            }
            None => out.extend(c.to_lowercase()),
        }
    }
    out
}
