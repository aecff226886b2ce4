//! Program file formats.
//!
//! Every file starts with a tag byte and ends with `1A`:
//!
//! * `FF`: the tokenised program buffer without its leading NUL.
//! * `FE`: the same, encrypted with the protection cipher. The final
//!   `1A` is stored in the clear.
//! * anything else: plain text lines ending in CR LF.

use super::protect::{protect, unprotect};
use super::{Config, Program};
use crate::error;
use crate::lang::Error;
use tracing::debug;

pub const TOKENISED_TAG: u8 = 0xFF;
pub const PROTECTED_TAG: u8 = 0xFE;
pub const EOF: u8 = 0x1A;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Ascii,
    Tokenised,
    Protected,
}

impl FileFormat {
    pub fn detect(bytes: &[u8]) -> FileFormat {
        let format = match bytes.first() {
            Some(&TOKENISED_TAG) => FileFormat::Tokenised,
            Some(&PROTECTED_TAG) => FileFormat::Protected,
            _ => FileFormat::Ascii,
        };
        debug!("Detected {:?} program file", format);
        format
    }

    pub fn tag(self) -> Option<u8> {
        match self {
            FileFormat::Ascii => None,
            FileFormat::Tokenised => Some(TOKENISED_TAG),
            FileFormat::Protected => Some(PROTECTED_TAG),
        }
    }
}

/// Bytes between the tag and the `1A`, or `BadFileMode` if the tag is not
/// the one expected.
fn payload(bytes: &[u8], format: FileFormat) -> Result<&[u8], Error> {
    match bytes.split_first() {
        Some((&tag, rest)) if Some(tag) == format.tag() => {
            Ok(rest.strip_suffix(&[EOF]).unwrap_or(rest))
        }
        _ => Err(error!(BadFileMode)),
    }
}

fn envelope(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 2);
    out.push(tag);
    out.extend_from_slice(payload);
    out.push(EOF);
    out
}

/// Tokenises a plain text program. Pointers and the line order are those
/// the program store gives it.
pub fn ascii_to_tokenised(text: &[u8], config: &Config) -> Result<Vec<u8>, Error> {
    let mut program = Program::new(config.clone());
    program.load(text)?;
    program.save(FileFormat::Tokenised)
}

/// Lists a tokenised program as plain text.
pub fn tokenised_to_ascii(bytes: &[u8], config: &Config) -> Result<Vec<u8>, Error> {
    payload(bytes, FileFormat::Tokenised)?;
    let mut program = Program::new(config.clone());
    program.load(bytes)?;
    program.save(FileFormat::Ascii)
}

pub fn tokenised_to_protected(bytes: &[u8]) -> Result<Vec<u8>, Error> {
    let plain = payload(bytes, FileFormat::Tokenised)?;
    Ok(envelope(PROTECTED_TAG, &protect(plain)))
}

pub fn protected_to_tokenised(bytes: &[u8]) -> Result<Vec<u8>, Error> {
    let cipher = payload(bytes, FileFormat::Protected)?;
    Ok(envelope(TOKENISED_TAG, &unprotect(cipher)))
}

/// Converts a program file of any format to `to`.
pub fn convert(bytes: &[u8], to: FileFormat, config: &Config) -> Result<Vec<u8>, Error> {
    let from = FileFormat::detect(bytes);
    debug!("Converting {:?} to {:?}", from, to);
    match (from, to) {
        (FileFormat::Ascii, FileFormat::Ascii) => Ok(bytes.to_vec()),
        (FileFormat::Tokenised, FileFormat::Tokenised) => Ok(bytes.to_vec()),
        (FileFormat::Protected, FileFormat::Protected) => Ok(bytes.to_vec()),
        (FileFormat::Ascii, FileFormat::Tokenised) => ascii_to_tokenised(bytes, config),
        (FileFormat::Ascii, FileFormat::Protected) => {
            tokenised_to_protected(&ascii_to_tokenised(bytes, config)?)
        }
        (FileFormat::Tokenised, FileFormat::Ascii) => tokenised_to_ascii(bytes, config),
        (FileFormat::Tokenised, FileFormat::Protected) => tokenised_to_protected(bytes),
        (FileFormat::Protected, FileFormat::Tokenised) => protected_to_tokenised(bytes),
        (FileFormat::Protected, FileFormat::Ascii) => {
            tokenised_to_ascii(&protected_to_tokenised(bytes)?, config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detect() {
        assert_eq!(FileFormat::detect(b"\xff\x00"), FileFormat::Tokenised);
        assert_eq!(FileFormat::detect(b"\xfe\x00"), FileFormat::Protected);
        assert_eq!(FileFormat::detect(b"10 END"), FileFormat::Ascii);
        assert_eq!(FileFormat::detect(b""), FileFormat::Ascii);
    }

    #[test]
    fn test_wrong_tag() {
        assert_eq!(tokenised_to_protected(b"\xfe\x00\x1a").unwrap_err().code(), 54);
        assert_eq!(protected_to_tokenised(b"").unwrap_err().code(), 54);
    }

    #[test]
    fn test_short_program() {
        let tokenised = convert(b"10 ? 1\r\n\x1a", FileFormat::Tokenised, &Config::default()).unwrap();
        assert_eq!(tokenised, b"\xff\x76\x12\x0a\x00\x91\x20\x12\x00\x00\x00\x1a");
    }

    #[test]
    fn test_protect_round_trip() {
        let tokenised = b"\xff\x76\x12\x0a\x00\x91\x20\x12\x00\x00\x00\x1a";
        let protected = tokenised_to_protected(tokenised).unwrap();
        assert_eq!(protected[0], PROTECTED_TAG);
        assert_eq!(protected.last(), Some(&EOF));
        assert_eq!(protected_to_tokenised(&protected).unwrap(), tokenised.to_vec());
    }
}
