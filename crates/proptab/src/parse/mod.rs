use std::fmt;

pub mod prop;

pub use prop::{parse_prop_formula, PropParser};

pub type ParseResult<T> = Result<T, ParseErr>;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ParseErr {
    /// Character and its byte offset in the input
    InvalidCharacter(char, usize),
    UnexpectedEndOfInput,
    UnexpectedToken(String, usize),
    ExpectedOperator(String, usize),
    MissingClosingParen(String, usize),
    TrailingTokens(String, usize),
    /// Offset of the `~` or `(` that opened one level too many
    NestingTooDeep(usize),
}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErr::InvalidCharacter(c, pos) => write!(
                f,
                "Invalid character '{}' at position {}. Use single uppercase letters as atoms and the operators ~ & | ->",
                c, pos
            ),
            ParseErr::UnexpectedEndOfInput => write!(f, "Expected formula but got end of input"),
            ParseErr::UnexpectedToken(got, pos) => {
                write!(f, "Expected formula but got {} at position {}", got, pos)
            }
            ParseErr::ExpectedOperator(got, pos) => write!(
                f,
                "Expected one of &, |, -> but got {} at position {}",
                got, pos
            ),
            ParseErr::MissingClosingParen(got, pos) => {
                write!(f, "Expected ) but got {} at position {}", got, pos)
            }
            ParseErr::TrailingTokens(got, pos) => {
                write!(f, "Expected end of input but got {} at position {}", got, pos)
            }
            ParseErr::NestingTooDeep(pos) => write!(
                f,
                "Formula is nested more than {} levels deep at position {}",
                prop::MAX_NESTING,
                pos
            ),
        }
    }
}

impl std::error::Error for ParseErr {}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Token<'f> {
    pub kind: TokenKind,
    pub spelling: &'f str,
    pub src_pos: usize,
}

impl<'f> Token<'f> {
    fn end(&self) -> usize {
        self.src_pos + self.spelling.len()
    }
}

impl<'f> fmt::Display for Token<'f> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spelling)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    Not,
    And,
    Or,
    Imp,
    LParen,
    RParen,
    Atom(char),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Not => write!(f, "~"),
            TokenKind::And => write!(f, "&"),
            TokenKind::Or => write!(f, "|"),
            TokenKind::Imp => write!(f, "->"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Atom(c) => write!(f, "{}", c),
        }
    }
}

/// Lexes a formula one token at a time. Whitespace is skipped; any other
/// character outside the token alphabet ends the stream with an
/// [`ParseErr::InvalidCharacter`].
pub struct Tokenizer<'f> {
    src: &'f str,
    pos: usize,
    failed: bool,
}

impl<'f> Tokenizer<'f> {
    pub fn new(src: &'f str) -> Self {
        Self {
            src,
            pos: 0,
            failed: false,
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.src[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    fn extract_token(&mut self) -> ParseResult<Token<'f>> {
        let rest = &self.src[self.pos..];
        let start = self.pos;

        if rest.starts_with("->") {
            self.pos += 2;
            return Ok(Token {
                kind: TokenKind::Imp,
                spelling: &self.src[start..self.pos],
                src_pos: start,
            });
        }

        let c = match rest.chars().next() {
            Some(c) => c,
            None => return Err(ParseErr::UnexpectedEndOfInput),
        };
        let kind = match c {
            '~' => TokenKind::Not,
            '&' => TokenKind::And,
            '|' => TokenKind::Or,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            'A'..='Z' => TokenKind::Atom(c),
            _ => return Err(ParseErr::InvalidCharacter(c, start)),
        };
        self.pos += 1;

        Ok(Token {
            kind,
            spelling: &self.src[start..self.pos],
            src_pos: start,
        })
    }
}

impl<'f> Iterator for Tokenizer<'f> {
    type Item = ParseResult<Token<'f>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.skip_whitespace();
        if self.pos >= self.src.len() {
            return None;
        }
        let res = self.extract_token();
        if res.is_err() {
            self.failed = true;
        }
        Some(res)
    }
}

pub fn tokenize(formula: &str) -> ParseResult<Vec<Token<'_>>> {
    Tokenizer::new(formula).collect()
}
