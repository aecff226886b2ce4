/*!
## Rust Video Module

Byte matrices for glyph and sprite rendering, bitmap fonts and the
packed and planed sprite record formats.

*/

pub mod font;
pub mod matrix;
pub mod sprite;

pub use font::Font;
pub use matrix::{hstack, vstack, ByteMatrix, MatrixError};
pub use sprite::SpriteBuilder;
