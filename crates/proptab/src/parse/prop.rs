use std::iter::Peekable;

use crate::{
    logic::{BinOp, Formula},
    parse::{tokenize, ParseErr, ParseResult, Token, TokenKind},
};

/// Deepest allowed stack of `~` and `(` around any subformula.
pub const MAX_NESTING: usize = 1024;

pub fn parse_prop_formula(formula: &str) -> ParseResult<Formula> {
    PropParser::parse(formula)
}

/// Recursive descent over a fully parenthesized token stream:
///
/// ```text
/// Input   ::= Formula [ BinOp Formula ]
/// Formula ::= Atom | '~' Formula | '(' Formula BinOp Formula ')'
/// BinOp   ::= '&' | '|' | '->'
/// ```
///
/// Only the outermost binary application may drop its parentheses.
/// Nesting beyond [`MAX_NESTING`] is rejected.
pub struct PropParser<'f> {
    tokens: Peekable<std::vec::IntoIter<Token<'f>>>,
    /// Reported position of end-of-input errors: just past the last token
    end: usize,
    depth: usize,
}

impl<'f> PropParser<'f> {
    pub fn parse(formula: &'f str) -> ParseResult<Formula> {
        let tokens = tokenize(formula)?;
        PropParser::new(tokens).parse_input()
    }

    pub fn new(tokens: Vec<Token<'f>>) -> Self {
        let end = tokens.last().map(Token::end).unwrap_or(0);
        Self {
            tokens: tokens.into_iter().peekable(),
            end,
            depth: 0,
        }
    }

    /// Consumes the whole token stream.
    pub fn parse_input(mut self) -> ParseResult<Formula> {
        let left = self.parse_formula()?;

        let node = match self.peek_op() {
            Some(op) => {
                self.tokens.next();
                let right = self.parse_formula()?;
                op.apply(left, right)
            }
            None => left,
        };

        match self.tokens.next() {
            Some(t) => Err(ParseErr::TrailingTokens(t.spelling.to_string(), t.src_pos)),
            None => Ok(node),
        }
    }

    fn parse_formula(&mut self) -> ParseResult<Formula> {
        // A run of negations is collected in a loop, not by recursion
        let mut negations = 0;
        let token = loop {
            let token = self.tokens.next().ok_or(ParseErr::UnexpectedEndOfInput)?;
            if token.kind != TokenKind::Not {
                break token;
            }
            self.enter(token.src_pos)?;
            negations += 1;
        };

        let inner = match token.kind {
            TokenKind::Atom(name) => Formula::atom(name),
            TokenKind::LParen => {
                self.enter(token.src_pos)?;
                let group = self.parse_group()?;
                self.depth -= 1;
                group
            }
            _ => {
                return Err(ParseErr::UnexpectedToken(
                    token.spelling.to_string(),
                    token.src_pos,
                ))
            }
        };

        self.depth -= negations;
        Ok((0..negations).fold(inner, |f, _| Formula::not(f)))
    }

    fn enter(&mut self, pos: usize) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            Err(ParseErr::NestingTooDeep(pos))
        } else {
            Ok(())
        }
    }

    /// Parses the rest of a group after its opening parenthesis.
    fn parse_group(&mut self) -> ParseResult<Formula> {
        let left = self.parse_formula()?;

        let op = match self.tokens.next() {
            Some(t) => match binop(t.kind) {
                Some(op) => op,
                None => return Err(ParseErr::ExpectedOperator(t.spelling.to_string(), t.src_pos)),
            },
            None => return Err(ParseErr::ExpectedOperator(self.got_end(), self.end)),
        };

        let right = self.parse_formula()?;

        match self.tokens.next() {
            Some(Token {
                kind: TokenKind::RParen,
                ..
            }) => Ok(op.apply(left, right)),
            Some(t) => Err(ParseErr::MissingClosingParen(
                t.spelling.to_string(),
                t.src_pos,
            )),
            None => Err(ParseErr::MissingClosingParen(self.got_end(), self.end)),
        }
    }

    fn peek_op(&mut self) -> Option<BinOp> {
        self.tokens.peek().and_then(|t| binop(t.kind))
    }

    fn got_end(&self) -> String {
        "end of input".to_string()
    }
}

fn binop(kind: TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::And => Some(BinOp::And),
        TokenKind::Or => Some(BinOp::Or),
        TokenKind::Imp => Some(BinOp::Imp),
        _ => None,
    }
}
