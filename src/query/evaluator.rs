//! Left-to-right Boolean evaluation over an [`IndexHandle`]
//!
//! Operators apply in the order they are read; there is no precedence, so
//! `a OR b AND c` means `(a OR b) AND c`. A single accumulator holds the
//! result so far, together with the pending operator and a pending `NOT`
//! for the next operand. Parenthesized runs are evaluated recursively.

use tracing::debug;

use super::lexer::Token;
use super::parser::Query;
use crate::error::{IndexError, Result};
use crate::index::{complement, intersect, union, IndexHandle, PostingList};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operator {
    And,
    Or,
}

pub struct Evaluator<'a> {
    index: &'a IndexHandle,
}

impl<'a> Evaluator<'a> {
    pub fn new(index: &'a IndexHandle) -> Self {
        Self { index }
    }

    /// Matching document ids, ascending
    pub fn evaluate(&self, query: &Query) -> Result<PostingList> {
        let result = self.evaluate_tokens(query.tokens())?;
        debug!(query = %query, matches = result.len(), "query evaluated");
        Ok(result)
    }

    fn evaluate_tokens(&self, tokens: &[Token]) -> Result<PostingList> {
        let mut accumulator: Option<PostingList> = None;
        let mut pending: Option<Operator> = None;
        let mut negate = false;
        let mut i = 0;

        while i < tokens.len() {
            let operand = match &tokens[i] {
                Token::And => {
                    pending = Some(Operator::And);
                    i += 1;
                    continue;
                }
                Token::Or => {
                    pending = Some(Operator::Or);
                    i += 1;
                    continue;
                }
                Token::Not => {
                    negate = true;
                    i += 1;
                    continue;
                }
                Token::LeftParen => {
                    let close = matching_paren(tokens, i)?;
                    let inner = self.evaluate_tokens(&tokens[i + 1..close])?;
                    i = close + 1;
                    inner
                }
                Token::RightParen => return Err(IndexError::UnbalancedParenthesis(i)),
                Token::Term(term) => {
                    i += 1;
                    self.index.posting_list(term)?
                }
            };

            let operand = if negate {
                negate = false;
                complement(&operand, self.index.universe())?
            } else {
                operand
            };

            accumulator = Some(match (accumulator.take(), pending.take()) {
                (None, None) => operand,
                (Some(current), Some(Operator::Or)) => union(&current, &operand),
                (Some(current), Some(Operator::And)) => intersect_with_skips(current, operand),
                (Some(_), None) => {
                    return Err(IndexError::QueryParse(format!(
                        "missing operator before token {}",
                        i
                    )))
                }
                (None, Some(_)) => {
                    return Err(IndexError::QueryParse(
                        "operator without a left operand".to_string(),
                    ))
                }
            });
        }

        accumulator.ok_or(IndexError::EmptyQuery)
    }
}

fn intersect_with_skips(mut left: PostingList, mut right: PostingList) -> PostingList {
    if !left.has_skips() {
        left.build_skip();
    }
    if !right.has_skips() {
        right.build_skip();
    }
    intersect(&left, &right)
}

/// Index of the `)` closing the `(` at `open`, tracking nesting depth
fn matching_paren(tokens: &[Token], open: usize) -> Result<usize> {
    let mut depth = 0usize;
    for (offset, token) in tokens[open..].iter().enumerate() {
        match token {
            Token::LeftParen => depth += 1,
            Token::RightParen => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open + offset);
                }
            }
            _ => {}
        }
    }
    Err(IndexError::UnbalancedParenthesis(open))
}
