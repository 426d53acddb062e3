use lazy_static::lazy_static;
use regex::Regex;
use std::str::Utf8Error;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"[а-яё]+").expect("valid regex");
    static ref QUERY_TOKEN: Regex = Regex::new(r"&&|\|\||[!()]|[а-яё]+").expect("valid regex");
}

/// Lexical unit of a boolean query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryToken {
    Term(String),
    And,
    Or,
    Not,
    LeftParen,
    RightParen,
}

/// Split text into lowercased runs of Cyrillic letters. Everything else separates runs.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered).map(|m| m.as_str().to_string()).collect()
}

/// Byte-level entry point: malformed UTF-8 is rejected rather than repaired.
pub fn tokenize_bytes(bytes: &[u8]) -> Result<Vec<String>, Utf8Error> {
    Ok(tokenize(std::str::from_utf8(bytes)?))
}

/// Tokenize a query string into terms and operators.
///
/// `&&` and `||` are only recognized as doubled pairs; a lone `&` or `|` is
/// skipped like any other separator. `!`, `(` and `)` are always single tokens.
pub fn tokenize_query(query: &str) -> Vec<QueryToken> {
    let lowered = query.to_lowercase();
    QUERY_TOKEN
        .find_iter(&lowered)
        .map(|m| match m.as_str() {
            "&&" => QueryToken::And,
            "||" => QueryToken::Or,
            "!" => QueryToken::Not,
            "(" => QueryToken::LeftParen,
            ")" => QueryToken::RightParen,
            word => QueryToken::Term(word.to_string()),
        })
        .collect()
}

pub fn tokenize_query_bytes(bytes: &[u8]) -> Result<Vec<QueryToken>, Utf8Error> {
    Ok(tokenize_query(std::str::from_utf8(bytes)?))
}
