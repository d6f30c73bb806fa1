//! Lexer for Boolean queries
//!
//! Splits a query line into operators, parentheses and normalized terms.
//! Operators are the literal uppercase words `AND`, `OR` and `NOT`; any
//! other word is run through the [`TextNormalizer`] so it matches the terms
//! the index was built with. Parentheses may be attached to words, as in
//! `(cat OR dog)`.

use std::fmt;

use crate::tokenizer::TextNormalizer;

/// Token types of a Boolean query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    And,
    Or,
    Not,
    LeftParen,
    RightParen,
    /// A normalized term
    Term(String),
}

impl Token {
    pub fn is_operator(&self) -> bool {
        matches!(self, Token::And | Token::Or)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::And => f.write_str("AND"),
            Token::Or => f.write_str("OR"),
            Token::Not => f.write_str("NOT"),
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
            Token::Term(term) => f.write_str(term),
        }
    }
}

/// Lexer over one query line
pub struct Lexer<'a, N: TextNormalizer + ?Sized> {
    input: Vec<char>,
    position: usize,
    normalizer: &'a N,
}

impl<'a, N: TextNormalizer + ?Sized> Lexer<'a, N> {
    pub fn new(input: &str, normalizer: &'a N) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            normalizer,
        }
    }

    /// Next token, `None` at end of input
    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();
        let ch = self.current_char()?;

        match ch {
            '(' => {
                self.advance();
                Some(Token::LeftParen)
            }
            ')' => {
                self.advance();
                Some(Token::RightParen)
            }
            _ => Some(self.read_word()),
        }
    }

    /// Consume the whole input
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }

    fn read_word(&mut self) -> Token {
        let mut word = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() || ch == '(' || ch == ')' {
                break;
            }
            word.push(ch);
            self.advance();
        }

        match word.as_str() {
            "AND" => Token::And,
            "OR" => Token::Or,
            "NOT" => Token::Not,
            // A word with nothing indexable left still has to occupy an
            // operand slot; it is looked up as written and matches nothing.
            _ => Token::Term(
                self.normalizer
                    .normalize_query_term(&word)
                    .unwrap_or_else(|| word.to_lowercase()),
            ),
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().map_or(false, char::is_whitespace) {
            self.advance();
        }
    }
}
