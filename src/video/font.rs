use super::matrix::{hstack, vstack, ByteMatrix};
use std::collections::HashMap;
use tracing::debug;

/// Codes that repeat their last row and column when a glyph is extended
/// to 9 pixels, so box drawing characters join up.
fn carries_edge(code: u8) -> bool {
    (0xb0..=0xdf).contains(&code)
}

/// Single-height bitmap font keyed by code page byte.
///
/// Each entry holds one byte per scan line, or two for 16-pixel wide
/// glyphs. Glyphs are built on first use and cached.
#[derive(Debug, Clone)]
pub struct Font {
    width: usize,
    height: usize,
    fontdict: HashMap<u8, Vec<u8>>,
    glyphs: HashMap<(u8, bool), ByteMatrix>,
}

impl Font {
    pub fn new(height: usize, fontdict: HashMap<u8, Vec<u8>>) -> Font {
        Font {
            width: 8,
            height,
            fontdict,
            glyphs: HashMap::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Switches cell size, rebuilding the single-width glyphs.
    pub fn init_mode(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.glyphs.clear();
            for code in 0..=255 {
                self.build_glyph(code, false);
            }
        }
    }

    pub fn get_byte(&self, code: u8, offset: usize) -> Option<u8> {
        self.fontdict.get(&code)?.get(offset).copied()
    }

    /// Changes one scan line of a glyph definition.
    pub fn set_byte(&mut self, code: u8, offset: usize, value: u8) {
        let row = offset % 8;
        let entry = self.fontdict.entry(code).or_insert_with(Vec::new);
        if entry.len() <= row {
            entry.resize(row + 1, 0);
        }
        entry[row] = value;
        self.glyphs.retain(|&(c, _), _| c != code);
    }

    pub fn get_glyph(&mut self, code: u8, fullwidth: bool) -> ByteMatrix {
        if let Some(glyph) = self.glyphs.get(&(code, fullwidth)) {
            return glyph.clone();
        }
        self.build_glyph(code, fullwidth)
    }

    fn build_glyph(&mut self, code: u8, fullwidth: bool) -> ByteMatrix {
        // 9-line cells use 8-line definitions
        let code_height = if self.height == 9 { 8 } else { self.height };
        let mut bytes = match self.fontdict.get(&code) {
            Some(bytes) => bytes.clone(),
            None => {
                debug!("No glyph for code {:#04x}; replacing with blank.", code);
                vec![0; self.height]
            }
        };
        if bytes.len() < code_height {
            bytes.resize(code_height, 0);
        }
        let mut glyph = ByteMatrix::frompacked(&bytes, code_height, 8);
        let req_width = self.width * if fullwidth { 2 } else { 1 };
        if req_width >= glyph.width() * 2 {
            debug!("Code {:#04x} stretched to full-width.", code);
            glyph = glyph.hrepeat(2);
        } else if glyph.width() >= req_width.saturating_sub(1) * 2 {
            debug!("Code {:#04x} squeezed to half-width.", code);
            glyph = glyph.strided_cols(0, 2);
        }
        if self.height > glyph.height() {
            glyph = extend_height(&glyph, carries_edge(code));
        }
        if req_width > glyph.width() {
            glyph = extend_width(&glyph, carries_edge(code));
        }
        self.glyphs.insert((code, fullwidth), glyph.clone());
        glyph
    }

    /// A row of half-width characters as one matrix.
    pub fn get_glyphs(&mut self, text: &[u8]) -> ByteMatrix {
        let glyphs: Vec<ByteMatrix> = text.iter().map(|&c| self.get_glyph(c, false)).collect();
        hstack(&glyphs).unwrap_or_default()
    }

    /// Renders text in colour `attr` on `back`, underlining with the last
    /// scan line.
    pub fn render_text(&mut self, text: &[u8], attr: u8, back: u8, underline: bool) -> ByteMatrix {
        let mut sprite = self.get_glyphs(text).render(back, attr);
        if underline && sprite.height() > 0 {
            let last = sprite.height() - 1;
            sprite.set(last, .., attr).ok();
        }
        sprite
    }
}

fn extend_height(glyph: &ByteMatrix, carry_last: bool) -> ByteMatrix {
    if carry_last && glyph.height() > 0 {
        let last = glyph.slice(glyph.height() - 1, ..);
        vstack(&[glyph.copy(), last]).unwrap_or_else(|_| glyph.vextend(1, 0))
    } else {
        glyph.vextend(1, 0)
    }
}

fn extend_width(glyph: &ByteMatrix, carry_last: bool) -> ByteMatrix {
    // double width glyphs get two empty columns
    if glyph.width() >= 16 {
        return glyph.hextend(2, 0);
    }
    if carry_last && glyph.width() > 0 {
        let last = glyph.slice(.., glyph.width() - 1);
        return hstack(&[glyph.copy(), last]).unwrap_or_else(|_| glyph.hextend(1, 0));
    }
    glyph.hextend(1, 0)
}
