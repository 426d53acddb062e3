//! Boolean query parsing and evaluation.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! Or   := And ("||" And)*
//! And  := Not ("&&" Not)*
//! Not  := "!" Not | Atom
//! Atom := "(" Or ")" | TERM
//! ```
//!
//! Malformed input never produces an error. A production that cannot be
//! completed becomes [`Expr::Invalid`], which evaluates to the empty set, and
//! tokens left over after the top-level `Or` turn the whole query into
//! `Invalid`.
//!
//! `&&` and `||` chains are kept flat and folded in a loop. Nesting through
//! `!` and parentheses is capped at [`MAX_DEPTH`]; a query nested deeper than
//! that is treated as malformed.

use crate::index::InvertedIndex;
use crate::set_ops::{difference, intersect, union};
use crate::stemmer::stem;
use crate::tokenizer::{tokenize_query, QueryToken};
use crate::PostingSet;
use std::borrow::Cow;
use std::fmt;

/// Deepest run of nested `!` and `(` the parser will follow.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A stemmed term.
    Term(String),
    Not(Box<Expr>),
    /// Two or more operands joined by `&&`.
    And(Vec<Expr>),
    /// Two or more operands joined by `||`.
    Or(Vec<Expr>),
    Group(Box<Expr>),
    Invalid,
}

fn write_joined(f: &mut fmt::Formatter<'_>, operands: &[Expr], sep: &str) -> fmt::Result {
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{operand}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Term(t) => write!(f, "{t}"),
            Expr::Not(e) => write!(f, "!{e}"),
            Expr::And(operands) => write_joined(f, operands, " && "),
            Expr::Or(operands) => write_joined(f, operands, " || "),
            Expr::Group(e) => write!(f, "({e})"),
            Expr::Invalid => write!(f, "<invalid>"),
        }
    }
}

struct Parser<'a> {
    tokens: &'a [QueryToken],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a QueryToken> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, expected: &QueryToken) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse(mut self) -> Expr {
        let expr = self.or();
        if self.pos < self.tokens.len() {
            return Expr::Invalid;
        }
        expr
    }

    fn or(&mut self) -> Expr {
        let first = self.and();
        if self.peek() != Some(&QueryToken::Or) {
            return first;
        }
        let mut operands = vec![first];
        while self.eat(&QueryToken::Or) {
            operands.push(self.and());
        }
        Expr::Or(operands)
    }

    fn and(&mut self) -> Expr {
        let first = self.not();
        if self.peek() != Some(&QueryToken::And) {
            return first;
        }
        let mut operands = vec![first];
        while self.eat(&QueryToken::And) {
            operands.push(self.not());
        }
        Expr::And(operands)
    }

    /// Consume the current `!` or `(` and parse one nested level with `inner`. Past
    /// [`MAX_DEPTH`] nothing is consumed, so the remaining input invalidates
    /// the whole query.
    fn nested(&mut self, inner: fn(&mut Self) -> Expr) -> Option<Expr> {
        if self.depth >= MAX_DEPTH {
            return None;
        }
        self.pos += 1;
        self.depth += 1;
        let expr = inner(self);
        self.depth -= 1;
        Some(expr)
    }

    fn not(&mut self) -> Expr {
        if self.peek() == Some(&QueryToken::Not) {
            return match self.nested(Self::not) {
                Some(inner) => Expr::Not(Box::new(inner)),
                None => Expr::Invalid,
            };
        }
        self.atom()
    }

    fn atom(&mut self) -> Expr {
        match self.peek() {
            Some(QueryToken::LeftParen) => match self.nested(Self::or) {
                Some(inner) if self.eat(&QueryToken::RightParen) => Expr::Group(Box::new(inner)),
                _ => Expr::Invalid,
            },
            Some(QueryToken::Term(word)) => {
                self.pos += 1;
                Expr::Term(stem(word))
            }
            // left unconsumed so the caller sees it as trailing input
            _ => Expr::Invalid,
        }
    }
}

/// Parse a token sequence. An empty sequence parses to [`Expr::Invalid`].
pub fn parse(tokens: &[QueryToken]) -> Expr {
    Parser { tokens, pos: 0, depth: 0 }.parse()
}

fn eval<'a>(expr: &Expr, index: &'a InvertedIndex) -> Cow<'a, PostingSet> {
    match expr {
        Expr::Term(term) => match index.postings(term) {
            Some(postings) => Cow::Borrowed(postings),
            None => Cow::Owned(PostingSet::new()),
        },
        Expr::Not(inner) => Cow::Owned(difference(index.universe(), &*eval(inner, index))),
        Expr::And(operands) => {
            let mut operands = operands.iter();
            let mut acc = match operands.next() {
                Some(first) => eval(first, index),
                None => return Cow::Owned(PostingSet::new()),
            };
            for operand in operands {
                if acc.is_empty() {
                    break;
                }
                acc = Cow::Owned(intersect(&*acc, &*eval(operand, index)));
            }
            acc
        }
        Expr::Or(operands) => {
            let mut operands = operands.iter();
            let mut acc = match operands.next() {
                Some(first) => eval(first, index),
                None => return Cow::Owned(PostingSet::new()),
            };
            for operand in operands {
                acc = Cow::Owned(union(&*acc, &*eval(operand, index)));
            }
            acc
        }
        Expr::Group(inner) => eval(inner, index),
        Expr::Invalid => Cow::Owned(PostingSet::new()),
    }
}

/// Evaluate a parsed query. Lookups never modify the index.
pub fn evaluate(expr: &Expr, index: &InvertedIndex) -> PostingSet {
    eval(expr, index).into_owned()
}

/// Tokenize, parse and evaluate `query` in one go.
pub fn search(query: &str, index: &InvertedIndex) -> PostingSet {
    let tokens = tokenize_query(query);
    if tokens.is_empty() {
        return PostingSet::new();
    }
    let expr = parse(&tokens);
    let result = evaluate(&expr, index);
    tracing::debug!(query, %expr, hits = result.len(), "evaluated query");
    result
}
