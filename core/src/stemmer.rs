/// Words this short are never stemmed.
const MAX_UNSTEMMED_LEN: usize = 3;
/// A suffix is only stripped if at least this many characters remain.
const MIN_STEM_LEN: usize = 2;

/// Inflectional endings, tried in order. The order matters: the first match wins.
const ENDINGS: [&str; 28] = [
    "иями", "ями", "ами", "ией", "ий", "ый", "ой", "ия", "ья", "ие", "ье", "ых", "ую", "юю", "ая",
    "яя", "ом", "ем", "ах", "ях", "ы", "и", "а", "я", "о", "е", "у", "ю",
];

/// Strip the first matching ending from a lowercased Cyrillic token.
pub fn stem(word: &str) -> String {
    let len = word.chars().count();
    if len <= MAX_UNSTEMMED_LEN {
        return word.to_string();
    }
    ENDINGS
        .iter()
        .find(|ending| word.ends_with(*ending) && len - ending.chars().count() >= MIN_STEM_LEN)
        .map(|ending| word[..word.len() - ending.len()].to_string())
        .unwrap_or_else(|| word.to_string())
}
