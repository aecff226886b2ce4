/*!
## Rust Machine Module

This Rust module holds a BASIC program in memory the way GW-BASIC does
and moves it between the plain text, tokenised and protected file
formats.

*/

mod config;
pub mod format;
mod program;
pub mod protect;

pub use config::Config;
pub use format::FileFormat;
pub use program::Program;
pub use program::Renumbered;
