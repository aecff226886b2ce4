use super::number::Literal;
use super::stream::{CodeStream, BLANKS};
use super::token::{self, Dialect, KeywordDict};
use super::Error;
use std::io::SeekFrom;

/// Keywords that can be followed by one or more line numbers.
const LINENUM_WORDS: &[&str] = &[
    "GOTO", "THEN", "ELSE", "GOSUB", "LIST", "RENUM", "EDIT", "LLIST", "DELETE", "RUN", "RESUME",
    "AUTO", "ERL", "RESTORE", "RETURN",
];

const OPERATORS: &[u8] = b"+-=/\\^*<>";

/// Converts plain text lines to tokenised form.
#[derive(Debug, Clone, Default)]
pub struct Tokeniser {
    keywords: KeywordDict,
}

fn is_number_start(c: u8) -> bool {
    c.is_ascii_digit() || c == b'.'
}

impl Tokeniser {
    pub fn new(dialect: Dialect) -> Tokeniser {
        Tokeniser {
            keywords: KeywordDict::new(dialect),
        }
    }

    pub fn keywords(&self) -> &KeywordDict {
        &self.keywords
    }

    fn token_for(&self, word: &[u8]) -> Option<&[u8]> {
        std::str::from_utf8(word)
            .ok()
            .and_then(|w| self.keywords.token(w))
    }

    /// Tokenises one line of text. A numbered line starts with the
    /// `00 C0 DE` record marker and its line number, a direct line with
    /// `:`. Blank input gives an empty result.
    pub fn tokenise_line(&self, line: &[u8]) -> Result<Vec<u8>, Error> {
        let mut ins = CodeStream::new(line);
        let mut outs = Vec::with_capacity(line.len() + 5);
        if ins.skip_blank().is_none() {
            return Ok(outs);
        }
        self.line_number(&mut ins, &mut outs);
        let mut allow_jumpnum = false;
        // 6553 6 tokenises the 6 as a number
        let mut allow_number = true;
        let mut spc_or_tab = false;
        loop {
            let c = match ins.peek_byte() {
                None | Some(b'\r') | Some(0) => break,
                Some(c) => c,
            };
            if BLANKS.contains(&c) {
                ins.read_byte();
                outs.push(c);
            } else if c == b'"' {
                outs.extend(ins.read_string());
            } else if allow_number && allow_jumpnum && is_number_start(c) {
                self.jump_number(&mut ins, &mut outs);
            } else if c == b'&' || (allow_number && !allow_jumpnum && is_number_start(c)) {
                self.number(&mut ins, &mut outs)?;
            } else if OPERATORS.contains(&c) {
                ins.read_byte();
                outs.extend_from_slice(self.token_for(&[c]).unwrap_or(&[c]));
                // LIST 100-200 keeps line number mode
                allow_number = true;
            } else if c == b'\'' {
                ins.read_byte();
                outs.extend_from_slice(&[b':', token::REM, token::O_REM]);
                rem(&mut ins, &mut outs);
            } else if c == b'?' {
                ins.read_byte();
                outs.push(token::PRINT);
                allow_number = true;
            } else if c.is_ascii_alphabetic() {
                let word = self.tokenise_word(&mut ins, &mut outs);
                if word == token::KW_REM.as_bytes() {
                    rem(&mut ins, &mut outs);
                } else if word == token::KW_DATA.as_bytes() {
                    data(&mut ins, &mut outs);
                } else {
                    allow_jumpnum = LINENUM_WORDS.iter().any(|w| w.as_bytes() == &word[..]);
                    // numbers may follow a keyword but not a name
                    allow_number = self.token_for(&word).is_some();
                    if word == token::KW_SPC.as_bytes() || word == token::KW_TAB.as_bytes() {
                        spc_or_tab = true;
                    }
                }
            } else {
                ins.read_byte();
                match c {
                    b',' | b'#' | b';' | b'(' | b'[' => allow_number = true,
                    b')' if spc_or_tab => {
                        spc_or_tab = false;
                        allow_jumpnum = false;
                        allow_number = true;
                    }
                    _ => {
                        allow_jumpnum = false;
                        allow_number = false;
                    }
                }
                outs.push(if (32..=127).contains(&c) { c } else { b' ' });
            }
        }
        Ok(outs)
    }

    fn line_number(&self, ins: &mut CodeStream, outs: &mut Vec<u8>) {
        match ins.read_line_number() {
            Some(number) => {
                outs.extend_from_slice(b"\0\xC0\xDE");
                outs.extend_from_slice(&number.to_le_bytes());
                // one blank after the number is dropped, except after 0
                if ins.peek_byte() == Some(b' ') && number != 0 {
                    ins.read_byte();
                }
            }
            None => outs.push(b':'),
        }
    }

    fn jump_number(&self, ins: &mut CodeStream, outs: &mut Vec<u8>) {
        if let Some(number) = ins.read_line_number() {
            outs.push(token::T_UINT);
            outs.extend_from_slice(&number.to_le_bytes());
        } else if ins.read_if(b".").is_some() {
            outs.push(b'.');
        }
    }

    fn number(&self, ins: &mut CodeStream, outs: &mut Vec<u8>) -> Result<(), Error> {
        let word = ins.read_number();
        if !word.is_empty() {
            outs.extend(Literal::parse(&word)?.to_token());
        }
        Ok(())
    }

    /// Reads a keyword or name and writes its tokenised form. Returns the
    /// upper-cased word.
    fn tokenise_word(&self, ins: &mut CodeStream, outs: &mut Vec<u8>) -> Vec<u8> {
        let mut word = Vec::new();
        loop {
            let c = ins.read_byte();
            word.extend(c.map(|c| c.to_ascii_uppercase()));
            if word == b"GO" {
                let pos = ins.tell();
                if ins.peek(4).to_ascii_uppercase() == b" SUB" {
                    word = token::KW_GOSUB.as_bytes().to_vec();
                    ins.read(4);
                } else {
                    // GO TO allows any number of blanks
                    ins.skip_blank();
                    if ins.read(2).to_ascii_uppercase() == b"TO" {
                        word = token::KW_GOTO.as_bytes().to_vec();
                    } else {
                        ins.seek(SeekFrom::Start(pos as u64));
                    }
                }
                if word != b"GO" && ins.peek_byte().map_or(false, token::is_name_char) {
                    ins.seek(SeekFrom::Start(pos as u64));
                    word.truncate(2);
                }
            }
            if let Some(tok) = self.token_for(&word) {
                let attaches = [token::KW_FN, token::KW_SPC, token::KW_TAB, token::KW_USR]
                    .iter()
                    .any(|k| k.as_bytes() == &word[..]);
                if !attaches && ins.peek_byte().map_or(false, token::is_name_char) {
                    continue;
                }
                if word == token::KW_ELSE.as_bytes() {
                    outs.push(b':');
                    outs.extend_from_slice(tok);
                } else if word == token::KW_WHILE.as_bytes() {
                    outs.extend_from_slice(tok);
                    outs.push(token::O_PLUS);
                } else {
                    outs.extend_from_slice(tok);
                }
                return word;
            }
            match c {
                None => {
                    outs.extend_from_slice(&word);
                    return word;
                }
                Some(c) if !token::is_name_char(c) => {
                    word.pop();
                    ins.seek(SeekFrom::Current(-1));
                    outs.extend_from_slice(&word);
                    return word;
                }
                Some(_) => {}
            }
        }
    }
}

/// Comments pass through to the end of the line.
fn rem(ins: &mut CodeStream, outs: &mut Vec<u8>) {
    outs.extend_from_slice(ins.read_to(b"\r\0"));
}

/// DATA passes through to the end of the statement, string literals
/// included.
fn data(ins: &mut CodeStream, outs: &mut Vec<u8>) {
    loop {
        outs.extend_from_slice(ins.read_to(b"\r\0:\""));
        if ins.peek_byte() == Some(b'"') {
            outs.extend(ins.read_string());
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokenise(line: &str) -> Vec<u8> {
        Tokeniser::default().tokenise_line(line.as_bytes()).unwrap()
    }

    #[test]
    fn test_line_header() {
        assert_eq!(tokenise("10 ? 1"), b"\0\xC0\xDE\x0a\x00\x91 \x12");
        assert_eq!(tokenise("? 1"), b":\x91 \x12");
        assert_eq!(tokenise("0  END"), b"\0\xC0\xDE\x00\x00  \x81");
        assert_eq!(tokenise("   "), b"");
    }

    #[test]
    fn test_save_lines() {
        assert_eq!(tokenise("60 SAVE \"test.bin\""), b"\0\xC0\xDE<\x00\xbe \"test.bin\"");
        assert_eq!(tokenise("70 SAVE \"test.asc\",A"), b"\0\xC0\xDEF\x00\xbe \"test.asc\",A");
        assert_eq!(tokenise("80 LIST,\"test.lst\""), b"\0\xC0\xDEP\x00\x93,\"test.lst\"");
    }

    #[test]
    fn test_jump_numbers() {
        assert_eq!(tokenise("GOTO 100"), b":\x89 \x0e\x64\x00");
        assert_eq!(tokenise("go to 100"), b":\x89 \x0e\x64\x00");
        assert_eq!(tokenise("GO SUB 10"), b":\x8d \x0e\x0a\x00");
        assert_eq!(tokenise("LIST 10-20"), b":\x93 \x0e\x0a\x00\xea\x0e\x14\x00");
        assert_eq!(tokenise("LIST ."), b":\x93 .");
    }

    #[test]
    fn test_names_and_numbers() {
        assert_eq!(tokenise("format=1"), b":FORMAT\xe7\x12");
        assert_eq!(tokenise("a1 10"), b":A1 10");
        assert_eq!(tokenise("x=&HFF"), b":X\xe7\x0c\xff\x00");
        assert_eq!(tokenise("x=300"), b":X\xe7\x1c\x2c\x01");
        assert_eq!(tokenise("x=20"), b":X\xe7\x0f\x14");
    }

    #[test]
    fn test_special_keywords() {
        assert_eq!(tokenise("' hi"), b"::\x8f\xd9 hi");
        assert_eq!(tokenise("REM x=1:y"), b":\x8f x=1:y");
        assert_eq!(tokenise("DATA 1,\"a:b\":x=1"), b":\x84 1,\"a:b\":X\xe7\x12");
        assert_eq!(tokenise("IF A THEN 10 ELSE 20"), b":\x8b A \xcd \x0e\x0a\x00 :\xa1 \x0e\x14\x00");
        assert_eq!(tokenise("WHILE A"), b":\xb1\xe9 A");
        assert_eq!(tokenise("PRINT FNA"), b":\x91 \xd1A");
        assert_eq!(tokenise("PRINT SPC(3)"), b":\x91 \xd2\x14)");
    }

    #[test]
    fn test_control_characters() {
        assert_eq!(tokenise("PRINT\x01"), b":\x91 ");
        assert_eq!(tokenise("PRINT\x00junk"), b":\x91");
    }

    #[test]
    fn test_overflow() {
        let err = Tokeniser::default().tokenise_line(b"x=&H10000").unwrap_err();
        assert_eq!(err.code(), 6);
    }
}
