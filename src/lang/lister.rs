use super::number;
use super::stream::TokenisedStream;
use super::token::{self, Dialect, KeywordDict, TokenWidth};
use super::MAX_LINE_LEN;
use std::io::SeekFrom;

/// Bytes after a keyword that suppress the space GW-BASIC lists after it.
const NO_SPACE_BEFORE: &[u8] = b"\xd9\",; :()$%!#_@~|`";

/// Converts tokenised lines back to their canonical listing.
#[derive(Debug, Clone, Default)]
pub struct Lister {
    keywords: KeywordDict,
}

impl Lister {
    pub fn new(dialect: Dialect) -> Lister {
        Lister {
            keywords: KeywordDict::new(dialect),
        }
    }

    /// Lists the stored line whose header starts at the cursor, just past
    /// the record's leading NUL. At the end of the program, or on a
    /// header cut short, returns `None` and leaves the cursor in place.
    pub fn detokenise_line(&self, ins: &mut TokenisedStream) -> Option<(u16, Vec<u8>)> {
        let start = ins.tell();
        let header = ins.read(4).to_vec();
        if header.len() < 4 || header[..2] == [0, 0] {
            ins.seek(SeekFrom::Start(start as u64));
            return None;
        }
        let number = u16::from_le_bytes([header[2], header[3]]);
        if number == 0 && ins.peek_byte() == Some(b' ') {
            ins.read_byte();
        }
        let mut text = number.to_string().into_bytes();
        if ins.peek_byte() != Some(b'\t') {
            text.push(b' ');
        }
        text.extend(self.detokenise_statement(ins));
        Some((number, text))
    }

    /// Lists tokens up to the end of the line.
    pub fn detokenise_statement(&self, ins: &mut TokenisedStream) -> Vec<u8> {
        let mut literal = false;
        let mut comment = false;
        let mut out = Vec::new();
        while let Some(c) = ins.read_byte() {
            if c == 0 {
                break;
            } else if c == b'"' {
                out.push(c);
                literal = !literal;
            } else if token::is_number(c) || token::is_line_number(c) {
                // numbers are listed even inside literals and comments
                let mut bytes = vec![c];
                if let TokenWidth::Fixed(n) = token::token_width(c) {
                    bytes.extend_from_slice(ins.read(n - 1));
                }
                out.extend(number::detokenise(&bytes).into_bytes());
            } else if comment || literal || (0x20..=0x7e).contains(&c) {
                out.push(c);
            } else if c == b'\n' {
                out.extend_from_slice(b"\n\r");
            } else if c <= 0x09 {
                out.push(c);
            } else {
                comment = self.keyword_into(ins, c, &mut out);
            }
        }
        out.truncate(MAX_LINE_LEN);
        out
    }

    /// Lists the output of `Tokeniser::tokenise_line`: a numbered line
    /// with its number, a direct line without its leading `:`.
    pub fn detokenise(&self, tokenised: &[u8]) -> Vec<u8> {
        let mut ins = TokenisedStream::new(tokenised);
        match ins.read_byte() {
            Some(0) => self.detokenise_line(&mut ins).map_or_else(Vec::new, |(_, text)| text),
            Some(_) => self.detokenise_statement(&mut ins),
            None => Vec::new(),
        }
    }

    /// Writes the keyword for a one or two byte token, with the spacing
    /// GW-BASIC lists around it. Unknown tokens are passed through.
    /// Returns true if the keyword starts a comment.
    fn keyword_into(&self, ins: &mut TokenisedStream, lead: u8, out: &mut Vec<u8>) -> bool {
        let (keyword, single) = match self.keywords.keyword(&[lead]) {
            Some(keyword) => (keyword, true),
            None => {
                let pair = ins.peek_byte().and_then(|next| self.keywords.keyword(&[lead, next]));
                match pair {
                    Some(keyword) => {
                        ins.read_byte();
                        (keyword, false)
                    }
                    None => {
                        out.push(lead);
                        return false;
                    }
                }
            }
        };
        // no space between FN or USR and what follows
        if !token::is_operator(lead)
            && out.last().map_or(false, u8::is_ascii_alphanumeric)
            && !out.ends_with(token::KW_FN.as_bytes())
            && !out.ends_with(token::KW_USR.as_bytes())
        {
            out.push(b' ');
        }
        let next = ins.peek_byte();
        if single && lead == token::REM && next == Some(token::O_REM) && out.last() == Some(&b':') {
            // :REM' lists as '
            ins.read_byte();
            out.pop();
            out.extend_from_slice(token::KW_O_REM.as_bytes());
        } else if single && lead == token::O_PLUS && out.ends_with(token::KW_WHILE.as_bytes()) {
            // WHILE is stored as WHILE+
        } else if single && lead == token::ELSE {
            // :ELSE lists as ELSE, a lone ELSE at the start loses its E
            if out.pop().is_none() {
                out.extend_from_slice(&keyword.as_bytes()[1..]);
            } else {
                out.extend_from_slice(keyword.as_bytes());
            }
        } else {
            out.extend_from_slice(keyword.as_bytes());
        }
        let bare_token = single
            && (token::is_operator(lead)
                || token::is_comment(lead)
                || [token::TAB, token::SPC, token::USR, token::FN].contains(&lead));
        let bare_next = next.map_or(true, |c| {
            c == 0 || token::is_operator(c) || NO_SPACE_BEFORE.contains(&c)
        });
        if !bare_token && !bare_next {
            out.push(b' ');
        }
        single && token::is_comment(lead)
    }
}
