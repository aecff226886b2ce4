//! Seekable byte streams over BASIC code.
//!
//! A [`CodeStream`] holds plain text or tokenised bytes and a cursor.
//! Reads never run past the end, writes overwrite in place and append
//! once they reach the end. [`TokenisedStream`] adds the structural scans
//! that need to know how wide each token is.

use super::token::{self, TokenWidth};
use super::Error;
use crate::error;
use std::io::SeekFrom;
use std::ops::{Deref, DerefMut};

/// Whitespace in code streams.
pub const BLANKS: &[u8] = b" \t\n";

/// Plain text lines end at NUL or CR.
pub const PLAIN_END_LINE: &[u8] = b"\0\r";

const MAX_NAME_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeStream {
    buffer: Vec<u8>,
    pos: usize,
    end_line: &'static [u8],
}

impl Default for CodeStream {
    fn default() -> CodeStream {
        CodeStream::new(Vec::new())
    }
}

impl CodeStream {
    pub fn new<T: Into<Vec<u8>>>(bytes: T) -> CodeStream {
        CodeStream::with_end_line(bytes, PLAIN_END_LINE)
    }

    pub fn with_end_line<T: Into<Vec<u8>>>(bytes: T, end_line: &'static [u8]) -> CodeStream {
        CodeStream {
            buffer: bytes.into(),
            pos: 0,
            end_line,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Moves the cursor, clamped to the buffer. Returns the new position.
    pub fn seek(&mut self, pos: SeekFrom) -> usize {
        let len = self.buffer.len() as i64;
        let target = match pos {
            SeekFrom::Start(n) => n.min(len as u64) as i64,
            SeekFrom::Current(n) => self.pos as i64 + n,
            SeekFrom::End(n) => len + n,
        };
        self.pos = target.max(0).min(len) as usize;
        self.pos
    }

    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.buffer.len());
    }

    fn back(&mut self, n: usize) {
        self.pos = self.pos.saturating_sub(n);
    }

    pub fn peek(&self, n: usize) -> &[u8] {
        let end = (self.pos + n).min(self.buffer.len());
        &self.buffer[self.pos..end]
    }

    pub fn peek_byte(&self) -> Option<u8> {
        self.buffer.get(self.pos).copied()
    }

    pub fn read(&mut self, n: usize) -> &[u8] {
        let start = self.pos;
        self.advance(n);
        &self.buffer[start..self.pos]
    }

    pub fn read_byte(&mut self) -> Option<u8> {
        let c = self.peek_byte()?;
        self.pos += 1;
        Some(c)
    }

    pub fn read_to_end(&mut self) -> &[u8] {
        let start = self.pos;
        self.pos = self.buffer.len();
        &self.buffer[start..]
    }

    /// Overwrites from the cursor on, growing the buffer where needed.
    pub fn write(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        if end > self.buffer.len() {
            self.buffer.resize(end, 0);
        }
        self.buffer[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
    }

    /// Drops everything from the cursor on.
    pub fn truncate(&mut self) {
        self.buffer.truncate(self.pos);
    }

    pub fn skip_blank(&mut self) -> Option<u8> {
        while let Some(c) = self.peek_byte() {
            if !BLANKS.contains(&c) {
                return Some(c);
            }
            self.pos += 1;
        }
        None
    }

    pub fn skip_blank_read(&mut self) -> Option<u8> {
        self.skip_blank();
        self.read_byte()
    }

    /// Moves back over whitespace and peeks at the byte it stops on.
    pub fn backskip_blank(&mut self) -> Option<u8> {
        loop {
            self.back(1);
            match self.peek_byte() {
                Some(c) if BLANKS.contains(&c) && self.pos > 0 => continue,
                d => return d,
            }
        }
    }

    pub fn read_if(&mut self, set: &[u8]) -> Option<u8> {
        match self.peek_byte() {
            Some(c) if set.contains(&c) => {
                self.pos += 1;
                Some(c)
            }
            _ => None,
        }
    }

    pub fn skip_blank_read_if(&mut self, set: &[u8]) -> Option<u8> {
        self.skip_blank();
        self.read_if(set)
    }

    /// Reads up to, not including, the first byte found in `set`.
    pub fn read_to(&mut self, set: &[u8]) -> &[u8] {
        let start = self.pos;
        let end = self.buffer[start..]
            .iter()
            .position(|c| set.contains(c))
            .map_or(self.buffer.len(), |i| start + i);
        self.pos = end;
        &self.buffer[start..end]
    }

    /// Skips whitespace and reads a byte that must be in `set`.
    pub fn require_read(&mut self, set: &[u8]) -> Result<u8, Error> {
        match self.skip_blank() {
            Some(c) if set.contains(&c) => {
                self.pos += 1;
                Ok(c)
            }
            _ => Err(error!(SyntaxError)),
        }
    }

    /// Reads a variable name, upper-cased, with its sigil if any.
    /// Nothing is consumed if the name does not start with a letter.
    pub fn read_name(&mut self) -> Vec<u8> {
        let start = self.pos;
        match self.skip_blank_read() {
            Some(c) if c.is_ascii_alphabetic() => self.back(1),
            _ => {
                self.pos = start;
                return Vec::new();
            }
        }
        let body = self.pos;
        while let Some(c) = self.peek_byte() {
            if !token::is_name_char(c) {
                break;
            }
            self.pos += 1;
        }
        let mut name = self.buffer[body..self.pos].to_vec();
        name.truncate(MAX_NAME_LEN);
        if let Some(sigil) = self.peek_byte().filter(|&c| token::is_sigil(c)) {
            self.pos += 1;
            name.push(sigil);
        }
        name.make_ascii_uppercase();
        name
    }

    /// Reads a numeric literal as written, normalising `&` prefixes.
    pub fn read_number(&mut self) -> Vec<u8> {
        match self.peek_byte() {
            Some(b'&') => {
                self.pos += 1;
                if let Some(b'H') | Some(b'h') = self.peek_byte() {
                    self.pos += 1;
                    let mut word = b"&H".to_vec();
                    while let Some(c) = self.peek_byte().filter(u8::is_ascii_hexdigit) {
                        self.pos += 1;
                        word.push(c);
                    }
                    word
                } else {
                    if let Some(b'O') | Some(b'o') = self.peek_byte() {
                        self.pos += 1;
                    }
                    let mut word = b"&O".to_vec();
                    while let Some(c) = self
                        .peek_byte()
                        .filter(|c| (b'0'..=b'7').contains(c) || BLANKS.contains(c))
                    {
                        self.pos += 1;
                        word.push(c);
                    }
                    word
                }
            }
            Some(c) if c.is_ascii_digit() || b".+-".contains(&c) => self.read_decimal(),
            _ => Vec::new(),
        }
    }

    fn read_decimal(&mut self) -> Vec<u8> {
        let mut have_exp = false;
        let mut have_point = false;
        let mut word = Vec::new();
        while let Some(c) = self.read_byte() {
            let c = c.to_ascii_uppercase();
            if c == b'.' && !have_point && !have_exp {
                have_point = true;
                word.push(c);
            } else if (c == b'E' || c == b'D') && !have_exp {
                // 1ELSE and 1EQV are not exponents
                if c == b'E' {
                    if let Some(b'L') | Some(b'Q') = self.peek_byte().map(|c| c.to_ascii_uppercase()) {
                        self.back(1);
                        break;
                    }
                }
                have_exp = true;
                word.push(c);
            } else if (c == b'-' || c == b'+')
                && word.last().map_or(true, |&l| l == b'E' || l == b'D')
            {
                word.push(c);
            } else if c.is_ascii_digit() || BLANKS.contains(&c) || b"\x1c\x1d\x1f".contains(&c) {
                word.push(c);
            } else if (c == b'!' || c == b'#') && !have_exp {
                word.push(c);
                break;
            } else if c == b'%' {
                break;
            } else {
                self.back(1);
                break;
            }
        }
        // trailing whitespace is left in the stream
        let trailing = word.iter().rev().take_while(|c| BLANKS.contains(c)).count();
        self.back(trailing);
        word.truncate(word.len() - trailing);
        let leading = word.iter().take_while(|c| BLANKS.contains(c)).count();
        word.drain(..leading);
        word
    }

    /// Reads a string literal including its quotes. An unterminated literal
    /// runs to the end of the line.
    pub fn read_string(&mut self) -> Vec<u8> {
        if self.peek_byte() != Some(b'"') {
            return Vec::new();
        }
        self.pos += 1;
        let mut word = vec![b'"'];
        let end_line = self.end_line;
        let start = self.pos;
        while let Some(c) = self.peek_byte() {
            if c == b'"' || end_line.contains(&c) {
                break;
            }
            self.pos += 1;
        }
        word.extend_from_slice(&self.buffer[start..self.pos]);
        if self.peek_byte() == Some(b'"') {
            self.pos += 1;
            word.push(b'"');
        }
        word
    }

    /// Reads a line or jump number of at most five digits, blanks allowed
    /// in between. Stops after a value above 6552 so 65530 and up cannot
    /// be entered.
    pub fn read_line_number(&mut self) -> Option<u16> {
        let mut value: Option<u32> = None;
        let mut ndigits = 0;
        let mut nblanks = 0;
        while ndigits < 5 {
            match self.peek_byte() {
                Some(c) if c.is_ascii_digit() => {
                    self.pos += 1;
                    nblanks = 0;
                    ndigits += 1;
                    let v = value.unwrap_or(0) * 10 + u32::from(c - b'0');
                    value = Some(v);
                    if v > 6552 {
                        break;
                    }
                }
                Some(c) if BLANKS.contains(&c) => {
                    self.pos += 1;
                    nblanks += 1;
                }
                _ => break,
            }
        }
        self.back(nblanks);
        value.map(|v| v as u16)
    }
}

/// A stream of tokenised code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenisedStream {
    stream: CodeStream,
}

impl Default for TokenisedStream {
    fn default() -> TokenisedStream {
        TokenisedStream::new(Vec::new())
    }
}

impl Deref for TokenisedStream {
    type Target = CodeStream;
    fn deref(&self) -> &CodeStream {
        &self.stream
    }
}

impl DerefMut for TokenisedStream {
    fn deref_mut(&mut self) -> &mut CodeStream {
        &mut self.stream
    }
}

impl TokenisedStream {
    pub fn new<T: Into<Vec<u8>>>(bytes: T) -> TokenisedStream {
        TokenisedStream {
            stream: CodeStream::with_end_line(bytes, token::END_LINE),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.stream.into_bytes()
    }

    /// Scans to the next byte in `set`, stepping over whole tokens, string
    /// literals, comments and line headers. Stops at the end of the program.
    pub fn skip_to(&mut self, set: &[u8]) {
        while let Some(c) = self.peek_byte() {
            let width = token::token_width(c);
            if let TokenWidth::Delimited(term) = width {
                self.stream.pos += 1;
                // a NUL always ends the line, even inside a literal
                while let Some(d) = self.peek_byte() {
                    if d == 0 {
                        break;
                    }
                    self.stream.pos += 1;
                    if d == term {
                        break;
                    }
                }
                continue;
            }
            if set.contains(&c) {
                return;
            }
            if c == 0 {
                self.stream.pos += 1;
                let next = self.read(2);
                if next.len() < 2 || next == b"\0\0" {
                    return;
                }
                self.stream.advance(2);
            } else if let TokenWidth::Fixed(n) = width {
                self.stream.advance(n);
            }
        }
    }

    pub fn skip_to_read(&mut self, set: &[u8]) -> Option<u8> {
        self.skip_to(set);
        self.read_byte()
    }

    /// Reads a one-byte keyword token or a prefixed two-byte one.
    pub fn read_keyword_token(&mut self) -> Vec<u8> {
        let mut token = Vec::with_capacity(2);
        if let Some(lead) = self.read_byte() {
            token.push(lead);
            if let 0xfd..=0xff = lead {
                token.extend(self.read_byte());
            }
        }
        token
    }

    /// Reads a numeric literal token with its payload, or nothing if the
    /// cursor is not on one. A payload cut off by the end of the buffer is
    /// returned as far as it goes.
    pub fn read_number_token(&mut self) -> Vec<u8> {
        match self.peek_byte() {
            Some(lead) if token::is_number(lead) => match token::token_width(lead) {
                TokenWidth::Fixed(n) => self.read(n).to_vec(),
                TokenWidth::Delimited(_) => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    pub fn require_end(&mut self) -> Result<(), Error> {
        match self.skip_blank() {
            Some(c) if !token::END_STATEMENT.contains(&c) => Err(error!(SyntaxError)),
            _ => Ok(()),
        }
    }

    /// Reads past a line header, false at the end of the program.
    fn skip_line_header(&mut self) -> bool {
        let trail = self.read(4);
        trail.len() == 4 && trail[..2] != [0, 0]
    }

    /// Moves to the next statement that starts with keyword `requested`.
    /// Statements inside THEN and ELSE clauses are not considered.
    /// Returns the position of the keyword.
    pub fn skip_to_token(&mut self, requested: &[u8]) -> Option<usize> {
        loop {
            if self.skip_to_read(token::END_STATEMENT) == Some(0) && !self.skip_line_header() {
                return None;
            }
            self.skip_blank();
            let start = self.tell();
            let found = self.read_keyword_token();
            self.stream.pos = start;
            if found.is_empty() {
                return None;
            } else if found == requested {
                return Some(start);
            }
        }
    }

    /// Skips a nested block such as FOR/NEXT or WHILE/WEND. Returns true
    /// with the cursor on the matching `close` keyword, false at the end
    /// of the program. With `allow_comma`, `NEXT I, J` closes two blocks.
    pub fn skip_block(&mut self, open: u8, close: u8, allow_comma: bool) -> bool {
        let mut depth = 0usize;
        loop {
            let c = self.skip_to_read(&[0, b':', token::THEN, token::ELSE]);
            if c == Some(0) && !self.skip_line_header() {
                return false;
            }
            match self.skip_blank() {
                None => return false,
                Some(d) if d == open => {
                    self.stream.pos += 1;
                    depth += 1;
                }
                Some(d) if d == close => {
                    if depth == 0 {
                        return true;
                    }
                    self.stream.pos += 1;
                    depth -= 1;
                    if allow_comma {
                        while self
                            .skip_blank()
                            .map_or(false, |d| !token::END_STATEMENT.contains(&d))
                        {
                            self.skip_to(b"\0:,");
                            if self.peek_byte() == Some(b',') {
                                if depth == 0 {
                                    return true;
                                }
                                self.stream.pos += 1;
                                depth -= 1;
                            }
                        }
                    }
                }
                Some(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backskip_blank() {
        let mut s = CodeStream::new(&b"a  \n\t b"[..]);
        s.read(6);
        assert_eq!(s.backskip_blank(), Some(b'a'));
        assert_eq!(s.tell(), 0);
    }

    #[test]
    fn test_read_to() {
        let mut s = CodeStream::new(&b"a  \n\t b"[..]);
        assert_eq!(s.read_to(b" "), b"a");
        assert_eq!(s.read_to(b"c"), b"  \n\t b");
        assert_eq!(s.read(1), b"");
    }

    #[test]
    fn test_seek_clamps() {
        let mut s = CodeStream::new(&b"abc"[..]);
        assert_eq!(s.seek(SeekFrom::Current(-5)), 0);
        assert_eq!(s.seek(SeekFrom::Start(10)), 3);
        assert_eq!(s.seek(SeekFrom::End(-1)), 2);
        assert_eq!(s.read_to_end(), b"c");
    }

    #[test]
    fn test_write_overwrites_then_appends() {
        let mut s = CodeStream::new(&b"abc"[..]);
        s.seek(SeekFrom::Start(2));
        s.write(b"xyz");
        assert_eq!(s.as_bytes(), b"abxyz");
        s.seek(SeekFrom::Start(1));
        s.truncate();
        assert_eq!(s.as_bytes(), b"a");
    }

    #[test]
    fn test_read_name() {
        assert_eq!(CodeStream::new(&b"abc1\0hjk"[..]).read_name(), b"ABC1");
        assert_eq!(CodeStream::new(&b"  abc1$jhjk"[..]).read_name(), b"ABC1$");
        let mut s = CodeStream::new(&b"1abc1$jhjk"[..]);
        assert_eq!(s.read_name(), b"");
        assert_eq!(s.tell(), 0);
        let long = [b'a'; 50];
        assert_eq!(CodeStream::new(&long[..]).read_name().len(), 40);
    }

    #[test]
    fn test_read_number() {
        assert_eq!(CodeStream::new(&b"123ab"[..]).read_number(), b"123");
        assert_eq!(CodeStream::new(&b""[..]).read_number(), b"");
        assert_eq!(CodeStream::new(&b"a"[..]).read_number(), b"");
        assert_eq!(CodeStream::new(&b"&ha"[..]).read_number(), b"&Ha");
        assert_eq!(CodeStream::new(&b"&7"[..]).read_number(), b"&O7");
        assert_eq!(CodeStream::new(&b"1.5e+3#"[..]).read_number(), b"1.5E+3");
        assert_eq!(CodeStream::new(&b"2#x"[..]).read_number(), b"2#");
        let mut s = CodeStream::new(&b"1ELSE"[..]);
        assert_eq!(s.read_number(), b"1");
        assert_eq!(s.tell(), 1);
        let mut s = CodeStream::new(&b"12  :"[..]);
        assert_eq!(s.read_number(), b"12");
        assert_eq!(s.tell(), 2);
    }

    #[test]
    fn test_read_string() {
        assert_eq!(CodeStream::new(&b"\"123ab\"ghj"[..]).read_string(), b"\"123ab\"");
        assert_eq!(CodeStream::new(&b"\"123ab"[..]).read_string(), b"\"123ab");
        assert_eq!(CodeStream::new(&b"\"12\r3\""[..]).read_string(), b"\"12");
        assert_eq!(CodeStream::new(&b"x\"\""[..]).read_string(), b"");
    }

    #[test]
    fn test_read_line_number() {
        let mut s = CodeStream::new(&b"1 0 x"[..]);
        assert_eq!(s.read_line_number(), Some(10));
        assert_eq!(s.tell(), 3);
        let mut s = CodeStream::new(&b"65535"[..]);
        assert_eq!(s.read_line_number(), Some(6553));
        assert_eq!(CodeStream::new(&b"x"[..]).read_line_number(), None);
    }

    #[test]
    fn test_require_read() {
        let mut s = CodeStream::new(&b"  ,x"[..]);
        assert_eq!(s.require_read(b","), Ok(b','));
        assert!(s.require_read(b",").is_err());
    }

    #[test]
    fn test_read_number_token() {
        let cases: &[(&[u8], &[u8])] = &[
            (b"\x0b\x01\x00ghja", b"\x0b\x01\x00"),
            (b"\x0c\x01\x00ghja", b"\x0c\x01\x00"),
            (b"\x11\x01\x00ghja", b"\x11"),
            (b"\x0f\xffghja", b"\x0f\xff"),
            (b"\x1c\xff\x00ghja", b"\x1c\xff\x00"),
            (b"\x1d\xff\x00gh", b"\x1d\xff\x00gh"),
            (b"\x1f\xff\x00ghjklm", b"\x1f\xff\x00ghjklm"),
            (b"\x1f\xff", b"\x1f\xff"),
            (b"\x00\x01\x00ghja", b""),
        ];
        for (input, output) in cases {
            assert_eq!(&TokenisedStream::new(*input).read_number_token(), output);
        }
    }

    #[test]
    fn test_skip_to_token() {
        let mut s = TokenisedStream::new(&b"\x0b\x01\x00ghja"[..]);
        assert_eq!(s.skip_to_token(b"\x91"), None);
        assert_eq!(s.tell(), 7);
        let mut s = TokenisedStream::new(&b"\x81\x00\x00\x00"[..]);
        assert_eq!(s.skip_to_token(b"\x91"), None);
        assert_eq!(s.tell(), 4);
        assert_eq!(s.peek_byte(), None);
        let mut s = TokenisedStream::new(&b"\x81:\x91 \x1c\x91\x00"[..]);
        assert_eq!(s.skip_to_token(b"\x91"), Some(2));
    }

    #[test]
    fn test_skip_to_steps_over_literals() {
        let mut s = TokenisedStream::new(
            &b"\"a:b\"\x11:\x00\x01\x02\x0a\x00\x8fx:y\x00\x00\x00:"[..],
        );
        s.skip_to(b":");
        assert_eq!(s.tell(), 6);
        s.read(1);
        s.skip_to(b":");
        assert_eq!(s.tell(), 19);
        let mut s = TokenisedStream::new(&b"\x1c:\x00:"[..]);
        s.skip_to(b":");
        assert_eq!(s.tell(), 3);
    }

    #[test]
    fn test_skip_block() {
        let mut s = TokenisedStream::new(&b"\x0b\x01\x00ghja"[..]);
        assert!(!s.skip_block(0x91, 0x90, false));
        assert_eq!(s.tell(), 7);
        // FOR:FOR:NEXT:NEXT
        let mut s = TokenisedStream::new(&b"x:\x82:\x83:\x83"[..]);
        assert!(s.skip_block(0x82, 0x83, false));
        assert_eq!(s.tell(), 6);
        let mut s = TokenisedStream::new(&b"x:\x82:\x83 I,J:\x83"[..]);
        assert!(s.skip_block(0x82, 0x83, true));
        assert_eq!(s.tell(), 7);
    }

    #[test]
    fn test_require_end() {
        let mut s = TokenisedStream::new(&b"  :"[..]);
        assert!(s.require_end().is_ok());
        let mut s = TokenisedStream::new(&b" x"[..]);
        assert!(s.require_end().is_err());
    }
}
