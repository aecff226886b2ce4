/*!
# Rust Language Module

This Rust module provides the byte-level representation of GW-BASIC
code: code streams, the token grammar, numeric literal tokens, and the
conversion between plain text and tokenised lines.

*/

#[macro_use]
mod error;
mod line;
mod lister;
mod tokenise;

pub mod number;
pub mod stream;
pub mod token;

pub use error::Error;
pub use error::ErrorCode;
pub use line::Line;
pub use lister::Lister;
pub use stream::{CodeStream, TokenisedStream};
pub use token::{Dialect, KeywordDict};
pub use tokenise::Tokeniser;

/// Line numbers are `None` for direct statements.
pub type LineNumber = Option<u16>;

/// The longest line GW-BASIC will list or load.
pub const MAX_LINE_LEN: usize = 255;
