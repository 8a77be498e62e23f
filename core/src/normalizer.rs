use crate::config::IndexConfig;
use crate::tokenizer::Token;
use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    /// Pronoun and plural endings that may follow a stem.
    static ref PRONOUN_SUFFIX: Regex =
        Regex::new(r"^(?:ها)?(?:ی)?(?:(?:ات)?(?: تان|تان| مان|مان| شان|شان)|ی|م|ت|ش|ء)$").expect("valid regex");
    /// Same, with the extra linking `ی` allowed after a stem ending in `ا` or `و`.
    static ref PRONOUN_SUFFIX_AFTER_VOWEL: Regex =
        Regex::new(r"^(?:ی)?(?:ها)?(?:ی)?(?:(?:ات)?(?: تان|تان| مان|مان| شان|شان)|ی|م|ت|ش|ء)$").expect("valid regex");
}

const PERSIAN_STOPWORDS: &str = include_str!("../data/stopwords-fa.txt");
const ENGLISH_STOPWORDS: &str = include_str!("../data/stopwords-en.txt");

const PLURAL_ENDINGS: [&str; 4] = ["یی", " ی", "ها", "ات"];
const NOTATIONS: [char; 5] = ['،', '؟', ':', '/', '\\'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Persian,
    English,
}

impl Language {
    fn builtin_stopwords(self) -> &'static str {
        match self {
            Language::Persian => PERSIAN_STOPWORDS,
            Language::English => ENGLISH_STOPWORDS,
        }
    }
}

/// Everything that decides how words become terms. Stored with a trained
/// index so queries are normalized the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerSettings {
    pub language: Language,
    /// Sorted.
    pub stopwords: Vec<String>,
}

/// Maps raw words to index terms, or drops them.
#[derive(Debug, Clone)]
pub struct Normalizer {
    language: Language,
    stopwords: HashSet<String>,
}

impl Normalizer {
    /// Normalizer with the built-in stop-word list of `language`.
    pub fn new(language: Language) -> Self {
        Self::with_stopwords(language, language.builtin_stopwords().split_whitespace())
    }

    pub fn with_stopwords<I, W>(language: Language, words: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<String>,
    {
        Self { language, stopwords: words.into_iter().map(Into::into).collect() }
    }

    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        match &config.stopwords_path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading stop words from {}", path.display()))?;
                Ok(Self::with_stopwords(config.language, text.split_whitespace()))
            }
            None => Ok(Self::new(config.language)),
        }
    }

    pub fn from_settings(settings: &NormalizerSettings) -> Self {
        Self::with_stopwords(settings.language, settings.stopwords.iter().cloned())
    }

    pub fn settings(&self) -> NormalizerSettings {
        let mut stopwords: Vec<String> = self.stopwords.iter().cloned().collect();
        stopwords.sort();
        NormalizerSettings { language: self.language, stopwords }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    /// Index term for `word`, or `None` if the word is dropped.
    pub fn normalize(&self, word: &str) -> Option<String> {
        match self.language {
            Language::Persian => self.normalize_persian(word),
            Language::English => self.normalize_english(word),
        }
    }

    /// Normalize every token, keeping the original positions of survivors.
    pub fn normalize_tokens(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens
            .into_iter()
            .filter_map(|t| self.normalize(&t.word).map(|word| Token::new(word, t.position)))
            .collect()
    }

    fn normalize_persian(&self, word: &str) -> Option<String> {
        let nfkc: String = word.nfkc().collect();
        let canonical = canonicalize_script(nfkc.trim());
        let word = canonical.trim();
        if word.is_empty() {
            return None;
        }
        let word = strip_notations(word);
        if word.is_empty() || self.is_stopword(&word) {
            return None;
        }
        let word = strip_pronoun_suffix(&word);
        if word.is_empty() {
            return None;
        }
        let word = strip_plural(word);
        if word.is_empty() || self.is_stopword(word) {
            return None;
        }
        Some(word.to_string())
    }

    fn normalize_english(&self, word: &str) -> Option<String> {
        let lowered = word.nfkc().collect::<String>().to_lowercase();
        let trimmed = lowered.trim_matches(|c: char| !c.is_alphanumeric());
        if trimmed.is_empty() || self.is_stopword(trimmed) {
            return None;
        }
        Some(STEMMER.stem(trimmed).to_string())
    }
}

/// Unify digit and letter variants, turn joiners into spaces, drop harakat.
fn canonicalize_script(word: &str) -> String {
    word.chars()
        .filter_map(|c| match c {
            '۰'..='۹' => char::from_digit(c as u32 - '۰' as u32, 10),
            'ي' => Some('ی'),
            'ة' | 'ۀ' => Some('ه'),
            '\u{200c}' | '\u{200f}' => Some(' '),
            'ك' => Some('ک'),
            'ؤ' => Some('و'),
            'إ' | 'أ' => Some('ا'),
            '\u{064b}'..='\u{0652}' => None,
            _ => Some(c),
        })
        .collect()
}

/// Drop Persian punctuation; dots survive only inside numbers.
fn strip_notations(word: &str) -> String {
    let keep_dots = word.chars().any(char::is_numeric);
    word.chars()
        .filter(|c| !NOTATIONS.contains(c) && (keep_dots || *c != '.'))
        .collect()
}

/// Shortest stem whose remainder is a pronoun/plural ending.
fn strip_pronoun_suffix(word: &str) -> &str {
    for (idx, _) in word.char_indices().skip(1) {
        let (stem, rest) = word.split_at(idx);
        let suffix = if stem.ends_with('ا') || stem.ends_with('و') {
            &*PRONOUN_SUFFIX_AFTER_VOWEL
        } else {
            &*PRONOUN_SUFFIX
        };
        if suffix.is_match(rest) {
            return stem.trim();
        }
    }
    word.trim()
}

fn strip_plural(mut word: &str) -> &str {
    for end in PLURAL_ENDINGS {
        if let Some(stripped) = word.strip_suffix(end) {
            word = stripped;
        }
    }
    word
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fa(word: &str) -> Option<String> {
        Normalizer::new(Language::Persian).normalize(word)
    }

    #[test]
    fn persian_digits_become_ascii() {
        assert_eq!(fa("۱۳۹۸").as_deref(), Some("1398"));
        assert_eq!(fa("۲.۵").as_deref(), Some("2.5"));
    }

    #[test]
    fn arabic_letter_forms_are_unified() {
        assert_eq!(fa("كتاب").as_deref(), Some("کتاب"));
        assert_eq!(fa("كِتاب").as_deref(), Some("کتاب"));
    }

    #[test]
    fn punctuation_and_stopwords_drop() {
        assert_eq!(fa("،"), None);
        assert_eq!(fa("و"), None);
        assert_eq!(fa("است"), None);
        assert_eq!(fa("کتاب؟").as_deref(), Some("کتاب"));
        assert_eq!(fa("a.b").as_deref(), Some("ab"));
    }

    #[test]
    fn pronoun_suffixes_are_removed() {
        assert_eq!(fa("کتابم").as_deref(), Some("کتاب"));
        assert_eq!(fa("کتابی").as_deref(), Some("کتاب"));
        assert_eq!(fa("کتابهایشان").as_deref(), Some("کتاب"));
        assert_eq!(fa("دانشجویم").as_deref(), Some("دانشجو"));
    }

    #[test]
    fn trailing_joiner_leaves_no_space() {
        assert_eq!(fa("کتاب\u{200c}").as_deref(), Some("کتاب"));
        assert_eq!(fa("کتاب\u{200f}").as_deref(), Some("کتاب"));
        assert_eq!(fa("\u{200c}کتاب").as_deref(), Some("کتاب"));
        assert_eq!(fa("است\u{200c}"), None);
    }

    #[test]
    fn settings_rebuild_the_same_normalizer() {
        let n = Normalizer::with_stopwords(Language::English, ["the", "and", "of"]);
        let settings = n.settings();
        assert_eq!(settings.stopwords, vec!["and", "of", "the"]);

        let rebuilt = Normalizer::from_settings(&settings);
        assert_eq!(rebuilt.settings(), settings);
        assert_eq!(rebuilt.language(), Language::English);
        assert_eq!(rebuilt.normalize("and"), None);
        assert_ne!(Normalizer::new(Language::Persian).settings(), settings);
    }

    #[test]
    fn plural_endings_are_removed() {
        assert_eq!(fa("کتابها").as_deref(), Some("کتاب"));
        assert_eq!(strip_plural("درختان"), "درختان");
    }

    #[test]
    fn latin_words_pass_through_persian_rules() {
        assert_eq!(fa("alpha").as_deref(), Some("alpha"));
    }

    #[test]
    fn english_stems_and_filters() {
        let n = Normalizer::new(Language::English);
        assert_eq!(n.normalize("Running,").as_deref(), Some("run"));
        assert_eq!(n.normalize("The"), None);
        assert_eq!(n.normalize("--"), None);
    }

    #[test]
    fn custom_stopwords_replace_builtin() {
        let n = Normalizer::with_stopwords(Language::English, ["alpha"]);
        assert_eq!(n.normalize("alpha"), None);
        assert_eq!(n.normalize("the").as_deref(), Some("the"));
    }

    #[test]
    fn tokens_keep_positions() {
        let n = Normalizer::new(Language::English);
        let out = n.normalize_tokens(vec![Token::new("the", 1), Token::new("cats", 2)]);
        assert_eq!(out, vec![Token::new("cat", 2)]);
    }
}
