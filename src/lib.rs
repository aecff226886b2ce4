//! # GW-BASIC Programs
//!
//! GW-BASIC programs as the interpreter stores them: tokenising and
//! listing lines, keeping the line chain of a program in memory and
//! converting between plain text, tokenised and protected files.
//! The video module has the byte matrices, fonts and sprite records
//! the interpreter draws the screen with.
//!
//! The `basic` executable is a line-entry terminal over a program. Begin
//! by opening a terminal and running it.
//! ```text
//! Ok
//! █
//! ```

#[path = "doc/introduction.rs"]
#[allow(non_snake_case)]
pub mod _Introduction;

#[path = "doc/file_formats.rs"]
#[allow(non_snake_case)]
pub mod __File_Formats;

pub mod lang;
pub mod mach;
pub mod term;
pub mod video;
