//! A byte cursor over an ASCII spec string, with line/column tracking
//! for diagnostics.

use crate::error::ParseError;

/// Characters that terminate a bare (unquoted) token: whitespace plus the
/// grammar's structural punctuation.
const NAKED_STOP: &[u8] = b" ,:\n@'\"";

#[derive(Clone)]
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Result<Cursor<'a>, ParseError> {
        if !input.is_ascii() {
            return Err(ParseError::NotAscii);
        }
        Ok(Cursor { input: input.as_bytes(), pos: 0, line: 1, col: 1 })
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    pub fn peek_at(&self, n: usize) -> Option<u8> {
        self.input.get(self.pos + n).copied()
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Consume one byte, updating line/column bookkeeping.
    pub fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(b)
    }

    pub fn error(&self, msg: impl Into<String>) -> ParseError {
        ParseError::Syntax(msg.into(), self.line, self.col)
    }

    /// Consume `c` if it's next, case-sensitively.
    pub fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the optional `:` soft separator between atoms.
    pub fn eat_separator(&mut self) {
        self.eat(b':');
    }

    /// Consume a literal keyword, case-insensitively, only if it is not
    /// immediately followed by another identifier character (so `getx`
    /// does not match the `get` keyword).
    pub fn eat_keyword_ci(&mut self, kw: &str) -> bool {
        let kb = kw.as_bytes();
        if self.pos + kb.len() > self.input.len() {
            return false;
        }
        for (i, &b) in kb.iter().enumerate() {
            if !self.input[self.pos + i].eq_ignore_ascii_case(&b) {
                return false;
            }
        }
        let next = self.peek_at(kb.len());
        if matches!(next, Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            return false;
        }
        for _ in 0..kb.len() {
            self.advance();
        }
        true
    }

    pub fn parse_integer(&mut self) -> Result<u64, ParseError> {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.advance();
        }
        if self.pos == start {
            return Err(self.error("expected integer"));
        }
        let text = std::str::from_utf8(&self.input[start..self.pos]).unwrap();
        text.parse::<u64>().map_err(|_| self.error("integer out of range"))
    }

    /// A quoted literal: `'...'` or `"..."`, with backslash escapes.
    /// Returns the decoded bytes.
    pub fn parse_quoted(&mut self) -> Result<Vec<u8>, ParseError> {
        let (line, col) = (self.line, self.col);
        let quote = match self.peek() {
            Some(b @ b'\'') | Some(b @ b'"') => b,
            _ => return Err(self.error("expected quoted literal")),
        };
        self.advance();
        let start = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated quoted literal")),
                Some(b) if b == quote => break,
                Some(b'\\') => {
                    self.advance();
                    if self.advance().is_none() {
                        return Err(self.error("unterminated quoted literal"));
                    }
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
        let body = std::str::from_utf8(&self.input[start..self.pos]).unwrap();
        let decoded = crate::escape::decode(body, quote as char, line, col)?;
        self.advance(); // closing quote
        Ok(decoded)
    }

    /// A bare (unquoted) token: one or more characters outside
    /// [`NAKED_STOP`], itself escape-decoded (a bare token may still
    /// contain `\n`-style escapes).
    pub fn parse_naked(&mut self) -> Result<Vec<u8>, ParseError> {
        let (line, col) = (self.line, self.col);
        let start = self.pos;
        while matches!(self.peek(), Some(b) if !NAKED_STOP.contains(&b)) {
            if self.peek() == Some(b'\\') {
                self.advance();
                self.advance();
            } else {
                self.advance();
            }
        }
        if self.pos == start {
            return Err(self.error("expected a value"));
        }
        let text = std::str::from_utf8(&self.input[start..self.pos]).unwrap();
        crate::escape::decode(text, '\0', line, col)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn integer_parses_digits() {
        let mut c = Cursor::new("123abc").unwrap();
        assert_eq!(c.parse_integer().unwrap(), 123);
        assert_eq!(c.peek(), Some(b'a'));
    }

    #[test]
    fn quoted_literal_with_escape() {
        let mut c = Cursor::new("'a\\nb'rest").unwrap();
        assert_eq!(c.parse_quoted().unwrap(), b"a\nb");
        assert_eq!(c.peek(), Some(b'r'));
    }

    #[test]
    fn naked_stops_at_colon() {
        let mut c = Cursor::new("abcdef:ghi").unwrap();
        assert_eq!(c.parse_naked().unwrap(), b"abcdef");
        assert_eq!(c.peek(), Some(b':'));
    }

    #[test]
    fn keyword_does_not_match_prefix_of_longer_word() {
        let mut c = Cursor::new("getter").unwrap();
        assert!(!c.eat_keyword_ci("get"));
    }

    #[test]
    fn keyword_matches_case_insensitively() {
        let mut c = Cursor::new("GeT:x").unwrap();
        assert!(c.eat_keyword_ci("get"));
        assert_eq!(c.peek(), Some(b':'));
    }

    #[test]
    fn rejects_non_ascii() {
        assert!(Cursor::new("200:b'héllo'").is_err());
    }
}
