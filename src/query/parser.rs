//! Structural validation of Boolean queries
//!
//! Evaluation is a strict left-to-right scan with no precedence, so the
//! parser does not build a tree. It checks the token stream against
//!
//! ```text
//! query   := operand ((AND | OR) operand)*
//! operand := NOT? (TERM | '(' query ')')
//! ```
//!
//! and rejects anything else before evaluation starts.

use std::fmt;

use super::lexer::{Lexer, Token};
use crate::error::{IndexError, Result};
use crate::tokenizer::TextNormalizer;

/// A validated query, ready for evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    tokens: Vec<Token>,
}

impl Query {
    /// Lex and validate one query line
    pub fn parse<N: TextNormalizer + ?Sized>(input: &str, normalizer: &N) -> Result<Self> {
        Self::from_tokens(Lexer::new(input, normalizer).tokenize())
    }

    /// Validate an already lexed token stream
    pub fn from_tokens(tokens: Vec<Token>) -> Result<Self> {
        if tokens.is_empty() {
            return Err(IndexError::EmptyQuery);
        }
        let mut parser = Parser {
            tokens: &tokens,
            position: 0,
        };
        parser.parse_query(0)?;
        if let Some(token) = parser.current() {
            // parse_query at depth 0 only stops early on a stray ')'
            return Err(match token {
                Token::RightParen => IndexError::UnbalancedParenthesis(parser.position),
                other => IndexError::QueryParse(format!(
                    "unexpected {} at token {}",
                    other, parser.position
                )),
            });
        }
        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

struct Parser<'t> {
    tokens: &'t [Token],
    position: usize,
}

impl<'t> Parser<'t> {
    /// query := operand ((AND | OR) operand)*
    fn parse_query(&mut self, depth: usize) -> Result<()> {
        self.parse_operand(depth)?;
        loop {
            match self.current() {
                None => return Ok(()),
                Some(Token::RightParen) => return Ok(()),
                Some(token) if token.is_operator() => {
                    self.advance();
                    self.parse_operand(depth)?;
                }
                Some(token) => {
                    return Err(IndexError::QueryParse(format!(
                        "expected AND or OR before {} at token {}",
                        token, self.position
                    )))
                }
            }
        }
    }

    /// operand := NOT? (TERM | '(' query ')')
    fn parse_operand(&mut self, depth: usize) -> Result<()> {
        if self.current() == Some(&Token::Not) {
            self.advance();
            if self.current() == Some(&Token::Not) {
                return Err(IndexError::QueryParse(format!(
                    "repeated NOT at token {}",
                    self.position
                )));
            }
        }

        match self.current() {
            Some(Token::Term(_)) => {
                self.advance();
                Ok(())
            }
            Some(Token::LeftParen) => {
                let open = self.position;
                self.advance();
                if self.current() == Some(&Token::RightParen) {
                    return Err(IndexError::QueryParse(format!(
                        "empty parentheses at token {}",
                        open
                    )));
                }
                self.parse_query(depth + 1)?;
                match self.current() {
                    Some(Token::RightParen) => {
                        self.advance();
                        Ok(())
                    }
                    _ => Err(IndexError::UnbalancedParenthesis(open)),
                }
            }
            Some(Token::RightParen) if depth == 0 => {
                Err(IndexError::UnbalancedParenthesis(self.position))
            }
            Some(token) => Err(IndexError::QueryParse(format!(
                "expected a term or '(' but found {} at token {}",
                token, self.position
            ))),
            None => Err(IndexError::QueryParse(
                "query ends where an operand is expected".to_string(),
            )),
        }
    }

    fn current(&self) -> Option<&'t Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) {
        self.position += 1;
    }
}
