//! Tokenization for the source language.
//!
//! Uses the logos crate for fast lexical analysis.

use logos::Logos;
use thiserror::Error;

/// Lexical errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("unexpected character '{ch}' at byte {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("number out of range at byte {offset}: {text}")]
    NumberOverflow { text: String, offset: usize },
}

pub type Result<T> = std::result::Result<T, LexError>;

/// Token types for the source language.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    #[token("return")]
    Return,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"[0-9]+", parse_decimal)]
    Number(i64),

    #[token("==")]
    EqEq,

    #[token("!=")]
    NotEq,

    #[token("<=")]
    LtEq,

    #[token(">=")]
    GtEq,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token("=")]
    Eq,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(";")]
    Semi,
}

fn parse_decimal(lex: &mut logos::Lexer<Token>) -> Option<i64> {
    lex.slice().parse().ok()
}

/// Lexer wrapper producing `(Token, byte_offset)` pairs, eagerly materialized
/// into a `Vec` by [`tokenize`] so the parser can use a cursor over it.
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
        }
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Result<(Token, usize)>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.inner.next()?;
        let span = self.inner.span();

        let token = match token {
            Ok(token) => token,
            Err(()) => {
                let slice = self.inner.slice();
                if !slice.is_empty() && slice.bytes().all(|b| b.is_ascii_digit()) {
                    return Some(Err(LexError::NumberOverflow {
                        text: slice.to_string(),
                        offset: span.start,
                    }));
                }
                let ch = slice.chars().next().unwrap_or('\0');
                return Some(Err(LexError::UnexpectedChar {
                    ch,
                    offset: span.start,
                }));
            }
        };

        Some(Ok((token, span.start)))
    }
}

/// Tokenize `source` in full, eagerly, returning the first error encountered
/// (if any) rather than a partial token stream.
pub fn tokenize(source: &str) -> Result<Vec<(Token, usize)>> {
    Lexer::new(source).collect()
}
