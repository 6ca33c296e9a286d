//! Tokenizer for the expression grammar.

use crate::error::{EvalError, Result};
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    Str(String),
    Name(String),

    // Arithmetic
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    At,

    // Bitwise
    Amp,
    Pipe,
    Caret,
    Tilde,
    LeftShift,
    RightShift,

    // Comparison
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,

    // Assignment
    Assign, // =
    Walrus, // :=

    // Grouping
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,

    // Separators
    Comma,
    Colon,
    Dot,

    Eof,
}

impl TokenKind {
    /// Whether this token is the given keyword.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, TokenKind::Name(name) if name == keyword)
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Tokenize the whole input, ending with an `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.chars.next();
        }

        let Some((position, c)) = self.chars.next() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                position: self.input.len(),
            });
        };

        let kind = match c {
            '0'..='9' => self.number(position)?,
            '.' if self.peek_char().is_some_and(|d| d.is_ascii_digit()) => {
                self.number(position)?
            }
            '\'' | '"' => self.string(position, c)?,
            c if c == '_' || c.is_alphabetic() => self.name(position),
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => {
                if self.eat('*') {
                    TokenKind::DoubleStar
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.eat('/') {
                    TokenKind::DoubleSlash
                } else {
                    TokenKind::Slash
                }
            }
            '%' => TokenKind::Percent,
            '@' => TokenKind::At,
            '&' => TokenKind::Amp,
            '|' => TokenKind::Pipe,
            '^' => TokenKind::Caret,
            '~' => TokenKind::Tilde,
            '<' => {
                if self.eat('<') {
                    TokenKind::LeftShift
                } else if self.eat('=') {
                    TokenKind::LessEq
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.eat('>') {
                    TokenKind::RightShift
                } else if self.eat('=') {
                    TokenKind::GreaterEq
                } else {
                    TokenKind::Greater
                }
            }
            '=' => {
                if self.eat('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '!' if self.eat('=') => TokenKind::NotEq,
            ':' => {
                if self.eat('=') {
                    TokenKind::Walrus
                } else {
                    TokenKind::Colon
                }
            }
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            other => {
                return Err(EvalError::syntax(
                    position,
                    format!("unexpected character {other:?}"),
                ));
            }
        };

        Ok(Token { kind, position })
    }

    /// Consume characters while `pred` holds, returning the end offset.
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        while let Some(&(i, c)) = self.chars.peek() {
            if !pred(c) {
                return i;
            }
            self.chars.next();
        }
        self.input.len()
    }

    fn number(&mut self, start: usize) -> Result<TokenKind> {
        let first = self.input[start..].chars().next();

        // Prefixed integers: 0x.., 0o.., 0b..
        if first == Some('0') {
            let radix = match self.peek_char() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.chars.next();
                let digits_start = start + 2;
                let end = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
                let digits: String = self.input[digits_start..end]
                    .chars()
                    .filter(|&c| c != '_')
                    .collect();
                return i64::from_str_radix(&digits, radix)
                    .map(TokenKind::Int)
                    .map_err(|_| EvalError::syntax(start, "invalid integer literal"));
            }
        }

        let mut is_float = first == Some('.');
        let mut end = self.take_while(|c| c.is_ascii_digit() || c == '_');

        if !is_float && self.peek_char() == Some('.') {
            is_float = true;
            self.chars.next();
            end = self.take_while(|c| c.is_ascii_digit() || c == '_');
        }

        if matches!(self.peek_char(), Some('e' | 'E')) {
            is_float = true;
            self.chars.next();
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.chars.next();
            }
            end = self.take_while(|c| c.is_ascii_digit());
        }

        if self.peek_char().is_some_and(|c| c.is_alphabetic() || c == '_') {
            return Err(EvalError::syntax(start, "invalid numeric literal"));
        }

        let text: String = self.input[start..end]
            .chars()
            .filter(|&c| c != '_')
            .collect();

        if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| EvalError::syntax(start, "invalid float literal"))
        } else {
            text.parse::<i64>()
                .map(TokenKind::Int)
                .map_err(|_| EvalError::syntax(start, "integer literal too large"))
        }
    }

    fn string(&mut self, start: usize, quote: char) -> Result<TokenKind> {
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some((_, c)) if c == quote => return Ok(TokenKind::Str(value)),
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, escaped)) => value.push(escaped),
                    None => break,
                },
                Some((_, c)) => value.push(c),
                None => break,
            }
        }
        Err(EvalError::syntax(start, "unterminated string literal"))
    }

    fn name(&mut self, start: usize) -> TokenKind {
        let end = self.take_while(|c| c == '_' || c.is_alphanumeric());
        TokenKind::Name(self.input[start..end].to_string())
    }
}
