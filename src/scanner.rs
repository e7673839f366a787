//! Handle RoyC's lexical analysis.
//!
//! Contains the [Scanner], which implements an [Iterator] yielding `Result<Token, CompileError>`.
//! Scanning is a single left-to-right pass over the source string with one character of
//! lookahead (two, for comment openers); no backtracking is ever needed.
//!
//! # Example
//!
//! ```
//! use royc::scanner::{tokenize, TokenKind};
//!
//! let tokens = tokenize("exit(1 + 2);").unwrap();
//! let kinds: Vec<_> = tokens.iter().map(|t| t.kind()).collect();
//!
//! use TokenKind::*;
//! assert_eq!(
//!     vec![Exit, OpenParen, IntLit, Plus, IntLit, CloseParen, Semi],
//!     kinds
//! );
//! ```
use enum_map::Enum;

use crate::error::CompileError;

/// One token of RoyC source, tagged with its [TokenKind], the line it starts on, and — for
/// identifiers and integer literals only — the text it was scanned from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    kind: TokenKind,
    line: usize,
    value: Option<&'a str>,
}

/// What _kind_ of [Token] you have.
///
/// Note: unlike the reference tokenizer, there is no `Eof` or `Error` tag here. Scanning either
/// succeeds and produces a finite sequence drawn entirely from this set, or fails with a
/// [CompileError::Lex].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
#[rustfmt::skip]
pub enum TokenKind {
    Exit, IntLit, Semi, OpenParen, CloseParen, Ident, Let, Eq,
    Plus, Star, Minus, FSlash, OpenCurly, CloseCurly, If, Elif, Else,
}

/// Scans RoyC source code and iteratively yields [Token]s, in lexical order.
///
/// The scanner is stateful and does a single pass: once the string is exhausted, the iterator
/// yields `None` forever.
#[derive(Debug)]
pub struct Scanner<'a> {
    start: &'a str,
    current: &'a str,
    line: usize,
}

/// Tokenize an entire source string in one call, surfacing the first unrecognized character as
/// a [CompileError::Lex].
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, CompileError> {
    Scanner::new(source).collect()
}

impl<'a> Scanner<'a> {
    /// Start scanning the given string of source code.
    pub fn new(source: &'a str) -> Self {
        Scanner {
            start: source,
            current: source,
            line: 1,
        }
    }

    /// Scan and return the next [Token], or `None` once the source is exhausted.
    fn scan_token(&mut self) -> Option<Result<Token<'a>, CompileError>> {
        self.skip_whitespace_and_comments();
        self.start = self.current;

        if self.is_at_end() {
            return None;
        }

        let c = self.advance();
        let token = match c {
            c if is_id_start(c) => self.identifier(),
            c if c.is_ascii_digit() => self.number(),
            '(' => self.make_token(TokenKind::OpenParen),
            ')' => self.make_token(TokenKind::CloseParen),
            '{' => self.make_token(TokenKind::OpenCurly),
            '}' => self.make_token(TokenKind::CloseCurly),
            ';' => self.make_token(TokenKind::Semi),
            '=' => self.make_token(TokenKind::Eq),
            '+' => self.make_token(TokenKind::Plus),
            '*' => self.make_token(TokenKind::Star),
            '-' => self.make_token(TokenKind::Minus),
            '/' => self.make_token(TokenKind::FSlash),
            _ => return Some(Err(CompileError::Lex { line: self.line, character: c })),
        };

        Some(Ok(token))
    }

    /// Returns `true` if we've reached the end of the source code.
    fn is_at_end(&self) -> bool {
        self.current.is_empty()
    }

    /// Advances `self.current`. Returns the consumed char.
    ///
    /// # Panics
    ///
    /// If this is called at the end of the string.
    fn advance(&mut self) -> char {
        let c = self
            .current
            .chars()
            .next()
            .expect("advance() called at end of input");
        self.current = &self.current[c.len_utf8()..];
        c
    }

    /// Peek at the next char, without consuming it. Returns `'\0'` at end-of-input.
    fn peek(&self) -> char {
        self.current.chars().next().unwrap_or('\0')
    }

    /// Peek at the char after next, without consuming anything.
    fn peek_next(&self) -> char {
        let mut chars = self.current.chars();
        chars.next();
        chars.next().unwrap_or('\0')
    }

    /// Skip runs of whitespace, line comments, and block comments.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                ' ' | '\r' | '\t' => {
                    self.advance();
                }
                '\n' => {
                    self.line += 1;
                    self.advance();
                }
                '/' if self.peek_next() == '/' => {
                    self.advance();
                    self.advance();
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                    // The newline itself (if any) is handled by the next loop iteration, so that
                    // the line counter stays correct.
                }
                '/' if self.peek_next() == '*' => {
                    self.advance();
                    self.advance();
                    loop {
                        if self.is_at_end() {
                            // Unterminated block comment: stop silently, per spec.
                            break;
                        }
                        if self.peek() == '*' && self.peek_next() == '/' {
                            self.advance();
                            self.advance();
                            break;
                        }
                        if self.peek() == '\n' {
                            self.line += 1;
                        }
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    /// Scan an identifier or keyword. Assumes the first letter has already been consumed.
    fn identifier(&mut self) -> Token<'a> {
        while is_id_continue(self.peek()) {
            self.advance();
        }

        let text = self.lexeme_text();
        match keyword_from(text) {
            Some(kind) => self.make_token(kind),
            None => self.make_token_with_value(TokenKind::Ident, text),
        }
    }

    /// Scan an integer literal. Assumes the first digit has already been consumed.
    fn number(&mut self) -> Token<'a> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let text = self.lexeme_text();
        self.make_token_with_value(TokenKind::IntLit, text)
    }

    /// The text between `self.start` and `self.current`.
    fn lexeme_text(&self) -> &'a str {
        let extent = self.start.len() - self.current.len();
        &self.start[..extent]
    }

    fn make_token(&self, kind: TokenKind) -> Token<'a> {
        Token { kind, line: self.line, value: None }
    }

    fn make_token_with_value(&self, kind: TokenKind, value: &'a str) -> Token<'a> {
        Token { kind, line: self.line, value: Some(value) }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>, CompileError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.scan_token()
    }
}

impl<'a> Token<'a> {
    /// The [TokenKind] of this token.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The line this token was scanned from.
    pub fn line(&self) -> usize {
        self.line
    }

    /// The literal text of this token. Only present for [TokenKind::Ident] and
    /// [TokenKind::IntLit]; `None` for every other kind.
    pub fn value(&self) -> Option<&'a str> {
        self.value
    }
}

///////////////////////////////////////////// Helpers /////////////////////////////////////////////

/// Returns true if this char can start an identifier.
///
/// Note: this differs from the teacher's Lox scanner, which also allows `_`. RoyC identifiers
/// must start with a letter (see spec invariants on [TokenKind::Ident]).
fn is_id_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// Returns true if this char may continue an identifier after its first letter.
fn is_id_continue(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

/// Classify a scanned word as one of RoyC's five keywords, or `None` if it's a plain identifier.
fn keyword_from(text: &str) -> Option<TokenKind> {
    match text {
        "exit" => Some(TokenKind::Exit),
        "let" => Some(TokenKind::Let),
        "if" => Some(TokenKind::If),
        "elif" => Some(TokenKind::Elif),
        "else" => Some(TokenKind::Else),
        _ => None,
    }
}

////////////////////////////////////////////// Tests //////////////////////////////////////////////
