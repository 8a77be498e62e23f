/// A raw word and its 1-based position in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub word: String,
    pub position: u32,
}

impl Token {
    pub fn new(word: impl Into<String>, position: u32) -> Self {
        Self { word: word.into(), position }
    }
}

const BRACKETS: [char; 4] = ['(', ')', '«', '»'];

/// Split text on whitespace and brackets. Positions count non-empty segments only.
pub fn tokenize(text: &str) -> Vec<Token> {
    text.trim()
        .split(|c: char| c.is_whitespace() || BRACKETS.contains(&c))
        .filter(|s| !s.is_empty())
        .zip(1u32..)
        .map(|(word, position)| Token::new(word, position))
        .collect()
}
