use super::stream::BLANKS;
use super::*;

/// One tokenised line. `body` holds the tokens after the line number,
/// or after the leading `:` anchor of a direct line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    number: LineNumber,
    body: Vec<u8>,
}

impl Line {
    pub fn new(number: LineNumber, body: Vec<u8>) -> Line {
        Line { number, body }
    }

    pub fn parse(text: &str, tokeniser: &Tokeniser) -> Result<Line, Error> {
        Line::parse_bytes(text.as_bytes(), tokeniser)
    }

    pub fn parse_bytes(text: &[u8], tokeniser: &Tokeniser) -> Result<Line, Error> {
        let tokens = tokeniser.tokenise_line(text)?;
        if tokens.first() == Some(&0) && tokens.len() >= 5 {
            let number = u16::from_le_bytes([tokens[3], tokens[4]]);
            Ok(Line::new(Some(number), tokens[5..].to_vec()))
        } else {
            Ok(Line::new(None, tokens.get(1..).unwrap_or(&[]).to_vec()))
        }
    }

    pub fn number(&self) -> LineNumber {
        self.number
    }

    pub fn is_direct(&self) -> bool {
        self.number.is_none()
    }

    /// True if there is nothing but blanks after the line number.
    /// Entering an empty numbered line deletes that line.
    pub fn is_empty(&self) -> bool {
        self.body
            .iter()
            .find(|&&c| !BLANKS.contains(&c))
            .map_or(true, |&c| c == 0)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The form the tokeniser produces: `00 C0 DE nn nn body` for
    /// numbered lines, `: body` for direct ones.
    pub fn tokens(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.body.len() + 5);
        match self.number {
            Some(number) => {
                out.extend_from_slice(b"\0\xC0\xDE");
                out.extend_from_slice(&number.to_le_bytes());
            }
            None => out.push(b':'),
        }
        out.extend_from_slice(&self.body);
        out
    }

    pub fn list(&self, lister: &Lister) -> Vec<u8> {
        lister.detokenise(&self.tokens())
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let text = self.list(&Lister::default());
        write!(f, "{}", String::from_utf8_lossy(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered() {
        let line = Line::parse("100 print x", &Tokeniser::default()).unwrap();
        assert_eq!(line.number(), Some(100));
        assert!(!line.is_direct());
        assert_eq!(line.body(), b"\x91 X");
        assert_eq!(line.to_string(), "100 PRINT X");
    }

    #[test]
    fn test_direct() {
        let line = Line::parse("list", &Tokeniser::default()).unwrap();
        assert!(line.is_direct());
        assert_eq!(line.tokens(), b":\x93");
        assert_eq!(line.to_string(), "LIST");
    }

    #[test]
    fn test_empty() {
        assert!(Line::parse("100", &Tokeniser::default()).unwrap().is_empty());
        assert!(Line::parse("100   ", &Tokeniser::default()).unwrap().is_empty());
        assert!(!Line::parse("100 '", &Tokeniser::default()).unwrap().is_empty());
    }
}
