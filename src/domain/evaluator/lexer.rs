//! Tokenizer for the expression language.

use crate::domain::error::SyntaxError;

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Number(f64),
    Str(String),
    Name(String),
    Punct(&'static str),
    Newline,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub pos: usize,
}

/// Longest operators first so that `**=` wins over `**` and `*`.
const PUNCTUATION: &[&str] = &[
    "**=", "//=", "<<=", ">>=", "**", "//", "<<", ">>", "==", "!=", ">=", "<=", "+=", "-=", "*=",
    "/=", "%=", "&=", "|=", "^=", "+", "-", "*", "/", "%", "(", ")", "[", "]", ",", ".", ":", ";",
    "<", ">", "=", "&", "|", "^", "~",
];

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.remaining().chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn error(&self, message: impl Into<String>, position: usize) -> SyntaxError {
        SyntaxError {
            message: message.into(),
            position,
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            let Some(ch) = self.peek() else {
                tokens.push(Token {
                    tok: Tok::End,
                    pos: self.pos,
                });
                return Ok(tokens);
            };
            let start = self.pos;
            match ch {
                '\n' => {
                    self.advance();
                    // Line breaks inside brackets join lines.
                    if self.depth == 0 {
                        tokens.push(Token {
                            tok: Tok::Newline,
                            pos: start,
                        });
                    }
                }
                c if c.is_whitespace() => {
                    self.advance();
                }
                '#' => {
                    while matches!(self.peek(), Some(c) if c != '\n') {
                        self.advance();
                    }
                }
                '\\' if self.peek_second() == Some('\n') => {
                    self.advance();
                    self.advance();
                }
                c if c.is_ascii_digit()
                    || (c == '.' && self.peek_second().is_some_and(|d| d.is_ascii_digit())) =>
                {
                    let value = self.number()?;
                    tokens.push(Token {
                        tok: Tok::Number(value),
                        pos: start,
                    });
                }
                '\'' | '"' => {
                    let value = self.string(ch)?;
                    tokens.push(Token {
                        tok: Tok::Str(value),
                        pos: start,
                    });
                }
                c if c.is_alphabetic() || c == '_' => {
                    while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
                        self.advance();
                    }
                    tokens.push(Token {
                        tok: Tok::Name(self.input[start..self.pos].to_string()),
                        pos: start,
                    });
                }
                _ => {
                    let punct = PUNCTUATION
                        .iter()
                        .find(|p| self.remaining().starts_with(**p))
                        .copied()
                        .ok_or_else(|| self.error(format!("unexpected character '{}'", ch), start))?;
                    self.pos += punct.len();
                    match punct {
                        "(" | "[" => self.depth += 1,
                        ")" | "]" => self.depth = self.depth.saturating_sub(1),
                        _ => {}
                    }
                    tokens.push(Token {
                        tok: Tok::Punct(punct),
                        pos: start,
                    });
                }
            }
        }
    }

    fn number(&mut self) -> Result<f64, SyntaxError> {
        let start = self.pos;
        let mut has_dot = false;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() || ch == '_' {
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let mark = self.pos;
            self.advance();
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            if matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
            } else {
                self.pos = mark;
            }
        }
        if matches!(self.peek(), Some(c) if c.is_alphabetic() || c == '_') {
            return Err(self.error("invalid number literal", start));
        }
        let literal = self.input[start..self.pos].replace('_', "");
        literal
            .parse::<f64>()
            .map_err(|_| self.error(format!("invalid number: {}", literal), start))
    }

    fn string(&mut self, quote: char) -> Result<String, SyntaxError> {
        let start = self.pos;
        self.advance();
        let mut value = String::new();
        loop {
            match self.advance() {
                None | Some('\n') => return Err(self.error("unterminated string literal", start)),
                Some(c) if c == quote => return Ok(value),
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('\\') => value.push('\\'),
                    Some('\'') => value.push('\''),
                    Some('"') => value.push('"'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return Err(self.error("unterminated string literal", start)),
                },
                Some(c) => value.push(c),
            }
        }
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, SyntaxError> {
    Lexer::new(input).tokenize()
}
