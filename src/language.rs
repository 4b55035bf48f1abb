use std::collections::HashSet;

/// Decides whether a piece of text is already in the report language.
pub trait LanguageDetector: Send + Sync {
    fn is_target_language(&self, text: &str) -> bool;
}

const PORTUGUESE_COMMON_WORDS: &[&str] = &[
    "o", "a", "os", "as", "de", "do", "da", "dos", "das", "em", "no", "na", "um", "uma", "que",
    "não", "para", "com", "por", "é", "foi", "está", "ao", "pelo", "pela", "mas", "ou", "se",
    "quando", "erro",
];

/// Word-overlap heuristic: text counts as Portuguese once it contains at
/// least `threshold` distinct words from a small list of common ones.
///
/// Short strings are easy to misjudge in both directions (see tests).
#[derive(Debug, Clone)]
pub struct CommonWordDetector {
    words: HashSet<&'static str>,
    threshold: usize,
}

impl Default for CommonWordDetector {
    fn default() -> Self {
        Self::new(PORTUGUESE_COMMON_WORDS, 2)
    }
}

impl CommonWordDetector {
    pub fn new(words: &[&'static str], threshold: usize) -> Self {
        Self {
            words: words.iter().copied().collect(),
            threshold,
        }
    }

    fn overlap(&self, text: &str) -> usize {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .filter(|w| self.words.contains(w.as_str()))
            .collect::<HashSet<_>>()
            .len()
    }
}

impl LanguageDetector for CommonWordDetector {
    fn is_target_language(&self, text: &str) -> bool {
        self.overlap(text) >= self.threshold
    }
}
