use textcat_core::{tokenize, Language, Normalizer, Token};

#[test]
fn it_normalizes_persian_text() {
    let normalizer = Normalizer::new(Language::Persian);
    let tokens = normalizer.normalize_tokens(tokenize("كتابهای (تاریخ) و ریاضی‌ها در سال ۱۳۹۸"));
    let words: Vec<&str> = tokens.iter().map(|t| t.word.as_str()).collect();
    assert!(words.contains(&"کتاب"));
    assert!(words.contains(&"تاریخ"));
    assert!(words.contains(&"1398"));
    assert!(!words.contains(&"و"));
    assert!(!words.contains(&"در"));
}

#[test]
fn it_keeps_positions_of_dropped_words() {
    let normalizer = Normalizer::new(Language::English);
    let tokens = normalizer.normalize_tokens(tokenize("The quick brown fox and the lazy dog"));
    assert_eq!(tokens.first(), Some(&Token::new("quick", 2)));
    assert_eq!(tokens.last(), Some(&Token::new("dog", 8)));
    assert!(tokens.iter().all(|t| t.word != "the" && t.word != "and"));
}
