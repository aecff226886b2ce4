//! Fill tiles and GET/PUT sprite records.
//!
//! A sprite record starts with a little-endian size header of two
//! 16-bit words, followed by the packed pixel rows.

use super::matrix::{ByteMatrix, MatrixError};

/// Converts between sprites and the byte records GET and PUT use.
pub trait SpriteBuilder {
    fn pack(&self, sprite: &ByteMatrix) -> Vec<u8>;
    fn unpack(&self, record: &[u8]) -> Result<ByteMatrix, MatrixError>;
}

fn size_header(record: &[u8]) -> Result<(usize, usize), MatrixError> {
    if record.len() < 4 {
        return Err(MatrixError::Buffer {
            needed: 4,
            len: record.len(),
        });
    }
    let first = u16::from_le_bytes([record[0], record[1]]);
    let second = u16::from_le_bytes([record[2], record[3]]);
    Ok((usize::from(first), usize::from(second)))
}

fn pixel_data(record: &[u8], len: usize) -> Result<&[u8], MatrixError> {
    record.get(4..4 + len).ok_or(MatrixError::Buffer {
        needed: 4 + len,
        len: record.len(),
    })
}

fn header(first: usize, second: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(4);
    out.extend_from_slice(&(first as u16).to_le_bytes());
    out.extend_from_slice(&(second as u16).to_le_bytes());
    out
}

fn combine_planes(allplanes: &ByteMatrix, planes: usize) -> ByteMatrix {
    let mut combined = allplanes.strided_rows(0, planes);
    for plane in 1..planes {
        combined |= &(&allplanes.strided_rows(plane, planes) << plane as u8);
    }
    combined
}

/// Packed-pixel tiles: each pattern byte is one scan line.
#[derive(Debug, Clone, Copy)]
pub struct PackedTileBuilder {
    bits_per_pixel: usize,
}

impl PackedTileBuilder {
    pub fn new(bits_per_pixel: usize) -> PackedTileBuilder {
        PackedTileBuilder { bits_per_pixel }
    }

    pub fn build(&self, pattern: &[u8]) -> ByteMatrix {
        ByteMatrix::frompacked(pattern, pattern.len(), 8 / self.bits_per_pixel)
    }
}

/// Interlaced-plane tiles: consecutive pattern bytes hold successive
/// colour planes of one scan line.
#[derive(Debug, Clone, Copy)]
pub struct PlanedTileBuilder {
    planes: usize,
}

impl PlanedTileBuilder {
    pub fn new(planes: usize) -> PlanedTileBuilder {
        PlanedTileBuilder { planes }
    }

    pub fn build(&self, pattern: &[u8]) -> ByteMatrix {
        let mut pattern = pattern.to_vec();
        let extra = pattern.len() % self.planes;
        if extra != 0 {
            pattern.resize(pattern.len() + self.planes - extra, 0);
        }
        let allplanes = ByteMatrix::frompacked(&pattern, pattern.len(), 8);
        combine_planes(&allplanes, self.planes)
    }
}

/// Packed-pixel sprites. The header holds the row length in bits and the
/// height.
#[derive(Debug, Clone, Copy)]
pub struct PackedSpriteBuilder {
    bits_per_pixel: usize,
}

impl PackedSpriteBuilder {
    pub fn new(bits_per_pixel: usize) -> PackedSpriteBuilder {
        PackedSpriteBuilder { bits_per_pixel }
    }
}

impl SpriteBuilder for PackedSpriteBuilder {
    fn pack(&self, sprite: &ByteMatrix) -> Vec<u8> {
        let mut out = header(sprite.width() * self.bits_per_pixel, sprite.height());
        out.extend(sprite.packed(8 / self.bits_per_pixel));
        out
    }

    fn unpack(&self, record: &[u8]) -> Result<ByteMatrix, MatrixError> {
        let (row_bits, height) = size_header(record)?;
        let width = row_bits / self.bits_per_pixel;
        let row_bytes = (width * self.bits_per_pixel + 7) / 8;
        let packed = pixel_data(record, row_bytes * height)?;
        let sprite = ByteMatrix::frompacked(packed, height, 8 / self.bits_per_pixel);
        Ok(sprite.slice(.., ..width))
    }
}

/// Sprites with colour planes in consecutive rows, 8 pixels a byte.
/// The header holds the width in pixels and the height.
///
/// Tandy mode 6 records half the real width in the header, build it with
/// `PlanedSpriteBuilder::tandy6`.
#[derive(Debug, Clone, Copy)]
pub struct PlanedSpriteBuilder {
    planes: usize,
    width_factor: usize,
}

impl PlanedSpriteBuilder {
    pub fn new(planes: usize) -> PlanedSpriteBuilder {
        PlanedSpriteBuilder {
            planes,
            width_factor: 1,
        }
    }

    pub fn tandy6(planes: usize) -> PlanedSpriteBuilder {
        PlanedSpriteBuilder {
            planes,
            width_factor: 2,
        }
    }
}

impl SpriteBuilder for PlanedSpriteBuilder {
    fn pack(&self, sprite: &ByteMatrix) -> Vec<u8> {
        // packing at 8 items a byte keeps only the low bit
        let planes: Vec<Vec<u8>> = (0..self.planes)
            .map(|plane| (sprite >> plane as u8).packed(8))
            .collect();
        let row_bytes = (sprite.width() + 7) / 8;
        let mut out = header(sprite.width() / self.width_factor, sprite.height());
        for row in 0..sprite.height() {
            for plane in &planes {
                out.extend_from_slice(&plane[row * row_bytes..(row + 1) * row_bytes]);
            }
        }
        out
    }

    fn unpack(&self, record: &[u8]) -> Result<ByteMatrix, MatrixError> {
        let (width, height) = size_header(record)?;
        let width = width * self.width_factor;
        let row_bytes = (width + 7) / 8;
        let packed = pixel_data(record, height * self.planes * row_bytes)?;
        let allplanes = ByteMatrix::frompacked(packed, height * self.planes, 8);
        Ok(combine_planes(&allplanes.slice(.., ..width), self.planes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprite() -> ByteMatrix {
        ByteMatrix::from_bytes(2, 3, &[0, 1, 2, 3, 2, 1]).unwrap()
    }

    #[test]
    fn test_packed_tile() {
        let tile = PackedTileBuilder::new(2).build(&[0x1b, 0xe4]);
        assert_eq!(tile, ByteMatrix::from_bytes(2, 4, &[0, 1, 2, 3, 3, 2, 1, 0]).unwrap());
    }

    #[test]
    fn test_planed_tile() {
        // plane 0 = 0xf0, plane 1 = 0x3c, plane 2 padded
        let tile = PlanedTileBuilder::new(3).build(&[0xf0, 0x3c]);
        assert_eq!(tile, ByteMatrix::from_bytes(1, 8, &[1, 1, 3, 3, 2, 2, 0, 0]).unwrap());
    }

    #[test]
    fn test_packed_sprite() {
        let builder = PackedSpriteBuilder::new(2);
        let record = builder.pack(&sprite());
        assert_eq!(record, vec![6, 0, 2, 0, 0x18, 0xe4]);
        assert_eq!(builder.unpack(&record).unwrap(), sprite());
    }

    #[test]
    fn test_planed_sprite() {
        let builder = PlanedSpriteBuilder::new(2);
        let record = builder.pack(&sprite());
        // rows interlaced plane by plane
        assert_eq!(record, vec![3, 0, 2, 0, 0x40, 0x20, 0xa0, 0xc0]);
        assert_eq!(builder.unpack(&record).unwrap(), sprite());
    }

    #[test]
    fn test_tandy6_width() {
        let builder = PlanedSpriteBuilder::tandy6(2);
        let wide = ByteMatrix::new(1, 4, 3);
        let record = builder.pack(&wide);
        assert_eq!(&record[..4], &[2, 0, 1, 0]);
        assert_eq!(builder.unpack(&record).unwrap(), wide);
    }

    #[test]
    fn test_short_record() {
        let builder = PackedSpriteBuilder::new(1);
        assert!(builder.unpack(&[8, 0]).is_err());
        assert!(builder.unpack(&[8, 0, 2, 0, 0xff]).is_err());
    }
}
