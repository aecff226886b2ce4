//! Two-dimensional byte matrices.
//!
//! A [`ByteMatrix`] either owns its storage or is a view into storage it
//! shares with other matrices, such as emulated video memory. Writes
//! through a view are visible in every matrix sharing the buffer. Views
//! address their rows with a pitch that may exceed the width.

use std::cell::RefCell;
use std::convert::TryFrom;
use std::fmt;
use std::ops::{
    BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Range, RangeFrom, RangeFull,
    RangeInclusive, RangeTo, RangeToInclusive, Shl, ShlAssign, Shr, ShrAssign,
};
use std::rc::Rc;
use thiserror::Error;

/// Storage that views alias.
pub type SharedBuffer = Rc<RefCell<Vec<u8>>>;

pub fn shared_buffer(bytes: Vec<u8>) -> SharedBuffer {
    Rc::new(RefCell::new(bytes))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    Shape {
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("cannot assign {0} to a matrix region")]
    Type(&'static str),
    #[error("value {0} does not fit in a byte")]
    Value(i64),
    #[error("invalid hex string")]
    Hex,
    #[error("pitch {pitch} is narrower than width {width}")]
    Pitch { pitch: usize, width: usize },
    #[error("buffer too short: need {needed} bytes, have {len}")]
    Buffer { needed: usize, len: usize },
}

/// Row or column selector: a single index or any range. Out of range
/// selections are clamped.
pub trait AxisIndex {
    fn axis_range(&self, len: usize) -> Range<usize>;
}

fn clamp(start: usize, end: usize, len: usize) -> Range<usize> {
    let end = end.min(len);
    start.min(end)..end
}

impl AxisIndex for usize {
    fn axis_range(&self, len: usize) -> Range<usize> {
        clamp(*self, self.saturating_add(1), len)
    }
}

impl AxisIndex for Range<usize> {
    fn axis_range(&self, len: usize) -> Range<usize> {
        clamp(self.start, self.end, len)
    }
}

impl AxisIndex for RangeInclusive<usize> {
    fn axis_range(&self, len: usize) -> Range<usize> {
        clamp(*self.start(), self.end().saturating_add(1), len)
    }
}

impl AxisIndex for RangeFrom<usize> {
    fn axis_range(&self, len: usize) -> Range<usize> {
        clamp(self.start, len, len)
    }
}

impl AxisIndex for RangeTo<usize> {
    fn axis_range(&self, len: usize) -> Range<usize> {
        clamp(0, self.end, len)
    }
}

impl AxisIndex for RangeToInclusive<usize> {
    fn axis_range(&self, len: usize) -> Range<usize> {
        clamp(0, self.end.saturating_add(1), len)
    }
}

impl AxisIndex for RangeFull {
    fn axis_range(&self, len: usize) -> Range<usize> {
        0..len
    }
}

/// Right hand side of [`ByteMatrix::set`].
#[derive(Debug)]
pub enum Value<'a> {
    /// Broadcast to every cell; must fit in a byte.
    Scalar(i64),
    /// Same shape as the target region.
    Matrix(&'a ByteMatrix),
    /// One value per cell of a single row or column.
    Sequence(&'a [u8]),
    Unsupported(&'static str),
}

impl From<u8> for Value<'_> {
    fn from(v: u8) -> Self {
        Value::Scalar(i64::from(v))
    }
}

impl From<i32> for Value<'_> {
    fn from(v: i32) -> Self {
        Value::Scalar(i64::from(v))
    }
}

impl From<i64> for Value<'_> {
    fn from(v: i64) -> Self {
        Value::Scalar(v)
    }
}

impl From<f64> for Value<'_> {
    fn from(_: f64) -> Self {
        Value::Unsupported("float")
    }
}

impl<'a> From<&'a ByteMatrix> for Value<'a> {
    fn from(m: &'a ByteMatrix) -> Self {
        Value::Matrix(m)
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(s: &'a [u8]) -> Self {
        Value::Sequence(s)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Value<'a> {
    fn from(s: &'a [u8; N]) -> Self {
        Value::Sequence(s)
    }
}

impl<'a> From<&'a Vec<u8>> for Value<'a> {
    fn from(s: &'a Vec<u8>) -> Self {
        Value::Sequence(s)
    }
}

/// A grid of byte cells that owns its storage or views another
/// matrix's storage.
///
/// The bitwise operators (`|`, `&`, `^`, `>>`, `<<` and their assign
/// forms) accept another matrix or a byte.
///
/// # Panics
///
/// The operators panic when two matrices differ in shape. Use
/// [`ByteMatrix::try_elementwise`] and
/// [`ByteMatrix::try_elementwise_inplace`] for matrices of unchecked shape.
pub struct ByteMatrix {
    height: usize,
    width: usize,
    offset: usize,
    pitch: usize,
    buffer: SharedBuffer,
    view: bool,
}

impl Default for ByteMatrix {
    fn default() -> ByteMatrix {
        ByteMatrix::owned(0, 0, Vec::new())
    }
}

/// Cloning always gives independent storage, as [`ByteMatrix::copy`].
impl Clone for ByteMatrix {
    fn clone(&self) -> ByteMatrix {
        self.copy()
    }
}

impl PartialEq for ByteMatrix {
    fn eq(&self, other: &ByteMatrix) -> bool {
        self.shape() == other.shape() && self.to_bytes() == other.to_bytes()
    }
}

impl Eq for ByteMatrix {}

impl fmt::Debug for ByteMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteMatrix({}, {}, [", self.height, self.width)?;
        for row in self.to_rows() {
            f.write_str("\n    '")?;
            for byte in row {
                write!(f, "\\x{:02x}", byte)?;
            }
            f.write_str("',")?;
        }
        f.write_str(" ])")
    }
}

impl ByteMatrix {
    fn owned(height: usize, width: usize, data: Vec<u8>) -> ByteMatrix {
        debug_assert_eq!(data.len(), height * width);
        ByteMatrix {
            height,
            width,
            offset: 0,
            pitch: width,
            buffer: shared_buffer(data),
            view: false,
        }
    }

    /// A matrix with every cell set to `fill`.
    pub fn new(height: usize, width: usize, fill: u8) -> ByteMatrix {
        ByteMatrix::owned(height, width, vec![fill; height * width])
    }

    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<ByteMatrix, MatrixError> {
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * width);
        for row in rows {
            let row = row.as_ref();
            if row.len() != width {
                return Err(MatrixError::Shape {
                    expected: (rows.len(), width),
                    found: (rows.len(), row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(ByteMatrix::owned(rows.len(), width, data))
    }

    /// Row-major data of exactly `height * width` bytes.
    pub fn from_bytes(height: usize, width: usize, data: &[u8]) -> Result<ByteMatrix, MatrixError> {
        if data.len() != height * width {
            return Err(MatrixError::Shape {
                expected: (height, width),
                found: (1, data.len()),
            });
        }
        Ok(ByteMatrix::owned(height, width, data.to_vec()))
    }

    /// A view over caller storage with rows `pitch` bytes apart.
    pub fn view_from_buffer(
        height: usize,
        width: usize,
        pitch: usize,
        buffer: &SharedBuffer,
    ) -> Result<ByteMatrix, MatrixError> {
        if pitch < width {
            return Err(MatrixError::Pitch { pitch, width });
        }
        let needed = if height == 0 {
            0
        } else {
            (height - 1) * pitch + width
        };
        let len = buffer.borrow().len();
        if len < needed {
            return Err(MatrixError::Buffer { needed, len });
        }
        Ok(ByteMatrix {
            height,
            width,
            offset: 0,
            pitch,
            buffer: Rc::clone(buffer),
            view: true,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn is_view(&self) -> bool {
        self.view
    }

    fn row_start(&self, row: usize) -> usize {
        self.offset + row * self.pitch
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        if row < self.height && col < self.width {
            Some(self.buffer.borrow()[self.row_start(row) + col])
        } else {
            None
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let buf = self.buffer.borrow();
        let mut out = Vec::with_capacity(self.height * self.width);
        for row in 0..self.height {
            let start = self.row_start(row);
            out.extend_from_slice(&buf[start..start + self.width]);
        }
        out
    }

    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        let buf = self.buffer.borrow();
        (0..self.height)
            .map(|row| {
                let start = self.row_start(row);
                buf[start..start + self.width].to_vec()
            })
            .collect()
    }

    /// A matrix sharing this one's storage.
    pub fn view(&self) -> ByteMatrix {
        ByteMatrix {
            height: self.height,
            width: self.width,
            offset: self.offset,
            pitch: self.pitch,
            buffer: Rc::clone(&self.buffer),
            view: true,
        }
    }

    /// An owning matrix with independent storage.
    pub fn copy(&self) -> ByteMatrix {
        ByteMatrix::owned(self.height, self.width, self.to_bytes())
    }

    /// Selects a region. Slicing a view gives a view of the same storage,
    /// slicing an owning matrix gives a copy. No rows gives a 0x0 matrix.
    pub fn slice<R: AxisIndex, C: AxisIndex>(&self, rows: R, cols: C) -> ByteMatrix {
        let rows = rows.axis_range(self.height);
        let cols = cols.axis_range(self.width);
        if rows.is_empty() {
            return ByteMatrix::default();
        }
        if self.view {
            ByteMatrix {
                height: rows.len(),
                width: cols.len(),
                offset: self.row_start(rows.start) + cols.start,
                pitch: self.pitch,
                buffer: Rc::clone(&self.buffer),
                view: true,
            }
        } else {
            let buf = self.buffer.borrow();
            let mut data = Vec::with_capacity(rows.len() * cols.len());
            for row in rows.clone() {
                let start = self.row_start(row);
                data.extend_from_slice(&buf[start + cols.start..start + cols.end]);
            }
            ByteMatrix::owned(rows.len(), cols.len(), data)
        }
    }

    /// Every `step`th row from `start`. A view for views, else a copy.
    pub fn strided_rows(&self, start: usize, step: usize) -> ByteMatrix {
        assert!(step > 0, "row step must be positive");
        if start >= self.height {
            return ByteMatrix::default();
        }
        let height = (self.height - start + step - 1) / step;
        let stepped = ByteMatrix {
            height,
            width: self.width,
            offset: self.row_start(start),
            pitch: self.pitch * step,
            buffer: Rc::clone(&self.buffer),
            view: true,
        };
        if self.view {
            stepped
        } else {
            stepped.copy()
        }
    }

    /// Every `step`th column from `start`, always copied.
    pub fn strided_cols(&self, start: usize, step: usize) -> ByteMatrix {
        assert!(step > 0, "column step must be positive");
        let rows: Vec<Vec<u8>> = self
            .to_rows()
            .into_iter()
            .map(|row| row.into_iter().skip(start).step_by(step).collect())
            .collect();
        let width = rows.first().map_or(0, Vec::len);
        ByteMatrix::owned(self.height, width, rows.concat())
    }

    fn write_region(&mut self, rows: Range<usize>, cols: Range<usize>, cells: &[u8]) {
        let width = cols.len();
        let mut buf = self.buffer.borrow_mut();
        for (i, row) in rows.enumerate() {
            let start = self.row_start(row) + cols.start;
            buf[start..start + width].copy_from_slice(&cells[i * width..(i + 1) * width]);
        }
    }

    /// Assigns to a region. Nothing is written if the value is rejected.
    pub fn set<'a, R, C, V>(&mut self, rows: R, cols: C, value: V) -> Result<(), MatrixError>
    where
        R: AxisIndex,
        C: AxisIndex,
        V: Into<Value<'a>>,
    {
        let rows = rows.axis_range(self.height);
        let cols = cols.axis_range(self.width);
        let shape = (rows.len(), cols.len());
        let cells = match value.into() {
            Value::Scalar(n) => {
                let byte = u8::try_from(n).map_err(|_| MatrixError::Value(n))?;
                vec![byte; shape.0 * shape.1]
            }
            Value::Matrix(m) => {
                if m.shape() != shape {
                    return Err(MatrixError::Shape {
                        expected: shape,
                        found: m.shape(),
                    });
                }
                // snapshot first, m may share our storage
                m.to_bytes()
            }
            Value::Sequence(seq) => {
                if (shape.0 != 1 && shape.1 != 1) || seq.len() != shape.0 * shape.1 {
                    return Err(MatrixError::Shape {
                        expected: shape,
                        found: (1, seq.len()),
                    });
                }
                seq.to_vec()
            }
            Value::Unsupported(kind) => return Err(MatrixError::Type(kind)),
        };
        self.write_region(rows, cols, &cells);
        Ok(())
    }

    fn check_shape(&self, rhs: &ByteMatrix) -> Result<(), MatrixError> {
        if self.shape() != rhs.shape() {
            return Err(MatrixError::Shape {
                expected: self.shape(),
                found: rhs.shape(),
            });
        }
        Ok(())
    }

    pub fn try_elementwise<F>(&self, rhs: &ByteMatrix, op: F) -> Result<ByteMatrix, MatrixError>
    where
        F: Fn(u8, u8) -> u8,
    {
        self.check_shape(rhs)?;
        let data = self
            .to_bytes()
            .into_iter()
            .zip(rhs.to_bytes())
            .map(|(l, r)| op(l, r))
            .collect();
        Ok(ByteMatrix::owned(self.height, self.width, data))
    }

    pub fn elementwise<F>(&self, rhs: u8, op: F) -> ByteMatrix
    where
        F: Fn(u8, u8) -> u8,
    {
        let data = self.to_bytes().into_iter().map(|l| op(l, rhs)).collect();
        ByteMatrix::owned(self.height, self.width, data)
    }

    pub fn try_elementwise_inplace<F>(&mut self, rhs: &ByteMatrix, op: F) -> Result<(), MatrixError>
    where
        F: Fn(u8, u8) -> u8,
    {
        let cells = self.try_elementwise(rhs, op)?.to_bytes();
        self.write_region(0..self.height, 0..self.width, &cells);
        Ok(())
    }

    pub fn elementwise_inplace<F>(&mut self, rhs: u8, op: F)
    where
        F: Fn(u8, u8) -> u8,
    {
        let cells = self.elementwise(rhs, op).to_bytes();
        self.write_region(0..self.height, 0..self.width, &cells);
    }

    /// Packs `items_per_byte` cells into each byte, most significant bits
    /// first. Each row starts on a new byte; a short final group is zero
    /// filled.
    ///
    /// # Panics
    ///
    /// If `items_per_byte` does not divide 8.
    pub fn packed(&self, items_per_byte: usize) -> Vec<u8> {
        let (bpp, mask) = bit_depth(items_per_byte);
        let mut out = Vec::new();
        for row in self.to_rows() {
            for group in row.chunks(items_per_byte) {
                let byte = group
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (i, &cell)| acc | (cell & mask) << (8 - bpp - i * bpp));
                out.push(byte);
            }
        }
        out
    }

    /// Inverse of [`ByteMatrix::packed`]. A buffer too short for `height`
    /// rows gives a 0x0 matrix.
    ///
    /// # Panics
    ///
    /// If `items_per_byte` does not divide 8.
    pub fn frompacked(packed: &[u8], height: usize, items_per_byte: usize) -> ByteMatrix {
        let (bpp, mask) = bit_depth(items_per_byte);
        if height == 0 || packed.len() < height {
            return ByteMatrix::default();
        }
        let row_bytes = packed.len() / height;
        let data = packed
            .chunks_exact(row_bytes)
            .take(height)
            .flatten()
            .flat_map(|&byte| (0..items_per_byte).map(move |i| (byte >> (8 - bpp - i * bpp)) & mask))
            .collect();
        ByteMatrix::owned(height, row_bytes * items_per_byte, data)
    }

    pub fn hex(&self, items_per_byte: usize) -> String {
        self.packed(items_per_byte)
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    pub fn fromhex(hex: &str, height: usize, items_per_byte: usize) -> Result<ByteMatrix, MatrixError> {
        if !hex.is_ascii() || hex.len() % 2 != 0 {
            return Err(MatrixError::Hex);
        }
        let packed = (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| MatrixError::Hex))
            .collect::<Result<Vec<u8>, MatrixError>>()?;
        Ok(ByteMatrix::frompacked(&packed, height, items_per_byte))
    }

    /// Zero cells become `back`, all others `fore`.
    pub fn render(&self, back: u8, fore: u8) -> ByteMatrix {
        self.elementwise(0, |cell, _| if cell == 0 { back } else { fore })
    }

    fn map_rows<F: Fn(Vec<u8>) -> Vec<u8>>(&self, f: F) -> ByteMatrix {
        let rows: Vec<Vec<u8>> = self.to_rows().into_iter().map(f).collect();
        let width = rows.first().map_or(self.width, Vec::len);
        ByteMatrix::owned(self.height, width, rows.concat())
    }

    pub fn hextend(&self, by_width: usize, fill: u8) -> ByteMatrix {
        let mut m = self.map_rows(|mut row| {
            row.resize(row.len() + by_width, fill);
            row
        });
        m.width = self.width + by_width;
        m.pitch = m.width;
        m
    }

    pub fn vextend(&self, by_height: usize, fill: u8) -> ByteMatrix {
        let mut data = self.to_bytes();
        data.resize(data.len() + by_height * self.width, fill);
        ByteMatrix::owned(self.height + by_height, self.width, data)
    }

    /// Repeats each cell: `12` becomes `1122`.
    pub fn hrepeat(&self, times: usize) -> ByteMatrix {
        let mut m = self.map_rows(|row| {
            row.into_iter()
                .flat_map(|b| std::iter::repeat(b).take(times))
                .collect()
        });
        m.width = self.width * times;
        m.pitch = m.width;
        m
    }

    /// Repeats each row.
    pub fn vrepeat(&self, times: usize) -> ByteMatrix {
        let mut data = Vec::with_capacity(self.height * self.width * times);
        for row in self.to_rows() {
            for _ in 0..times {
                data.extend_from_slice(&row);
            }
        }
        ByteMatrix::owned(self.height * times, self.width, data)
    }

    /// Repeats the whole matrix side by side.
    pub fn htile(&self, times: usize) -> ByteMatrix {
        let mut m = self.map_rows(|row| row.repeat(times));
        m.width = self.width * times;
        m.pitch = m.width;
        m
    }

    /// Repeats the whole matrix top to bottom.
    pub fn vtile(&self, times: usize) -> ByteMatrix {
        ByteMatrix::owned(self.height * times, self.width, self.to_bytes().repeat(times))
    }

    /// Moves a region to `(dst_row, dst_col)` and zeroes what it leaves
    /// behind. Overlapping source and destination are handled.
    pub fn move_region<R: AxisIndex, C: AxisIndex>(
        &mut self,
        rows: R,
        cols: C,
        dst_row: usize,
        dst_col: usize,
    ) -> Result<(), MatrixError> {
        let rows = rows.axis_range(self.height);
        let cols = cols.axis_range(self.width);
        let (height, width) = (rows.len(), cols.len());
        let (dst_end, dst_col_end) = match (dst_row.checked_add(height), dst_col.checked_add(width)) {
            (Some(row_end), Some(col_end)) if row_end <= self.height && col_end <= self.width => {
                (row_end, col_end)
            }
            (row_end, col_end) => {
                return Err(MatrixError::Shape {
                    expected: self.shape(),
                    found: (row_end.unwrap_or(usize::MAX), col_end.unwrap_or(usize::MAX)),
                })
            }
        };
        let block = self.slice(rows.clone(), cols.clone()).to_bytes();
        self.write_region(rows, cols, &vec![0; height * width]);
        self.write_region(dst_row..dst_end, dst_col..dst_col_end, &block);
        Ok(())
    }
}

fn bit_depth(items_per_byte: usize) -> (usize, u8) {
    assert!(
        items_per_byte > 0 && 8 % items_per_byte == 0,
        "items per byte must divide 8"
    );
    let bpp = 8 / items_per_byte;
    (bpp, ((1u16 << bpp) - 1) as u8)
}

/// Concatenates matrices of equal height side by side.
pub fn hstack<'a, I>(matrices: I) -> Result<ByteMatrix, MatrixError>
where
    I: IntoIterator<Item = &'a ByteMatrix>,
{
    let mut iter = matrices.into_iter();
    let first = match iter.next() {
        Some(m) => m,
        None => return Ok(ByteMatrix::default()),
    };
    let mut rows = first.to_rows();
    for m in iter {
        if m.height != first.height {
            return Err(MatrixError::Shape {
                expected: (first.height, m.width),
                found: m.shape(),
            });
        }
        for (row, extra) in rows.iter_mut().zip(m.to_rows()) {
            row.extend(extra);
        }
    }
    if rows.is_empty() {
        return Ok(ByteMatrix::default());
    }
    ByteMatrix::from_rows(&rows)
}

/// Concatenates matrices of equal width top to bottom.
pub fn vstack<'a, I>(matrices: I) -> Result<ByteMatrix, MatrixError>
where
    I: IntoIterator<Item = &'a ByteMatrix>,
{
    let mut iter = matrices.into_iter();
    let first = match iter.next() {
        Some(m) => m,
        None => return Ok(ByteMatrix::default()),
    };
    let mut data = first.to_bytes();
    let mut height = first.height;
    for m in iter {
        if m.width != first.width {
            return Err(MatrixError::Shape {
                expected: (m.height, first.width),
                found: m.shape(),
            });
        }
        data.extend(m.to_bytes());
        height += m.height;
    }
    Ok(ByteMatrix::owned(height, first.width, data))
}

fn shl_byte(l: u8, r: u8) -> u8 {
    l.checked_shl(u32::from(r)).unwrap_or(0)
}

fn shr_byte(l: u8, r: u8) -> u8 {
    l.checked_shr(u32::from(r)).unwrap_or(0)
}

macro_rules! bitwise_op {
    ($Op:ident, $op:ident, $OpAssign:ident, $op_assign:ident, $f:expr) => {
        impl $Op<&ByteMatrix> for &ByteMatrix {
            type Output = ByteMatrix;
            fn $op(self, rhs: &ByteMatrix) -> ByteMatrix {
                match self.try_elementwise(rhs, $f) {
                    Ok(m) => m,
                    Err(e) => panic!("{}", e),
                }
            }
        }

        impl $Op<u8> for &ByteMatrix {
            type Output = ByteMatrix;
            fn $op(self, rhs: u8) -> ByteMatrix {
                self.elementwise(rhs, $f)
            }
        }

        impl $OpAssign<&ByteMatrix> for ByteMatrix {
            fn $op_assign(&mut self, rhs: &ByteMatrix) {
                if let Err(e) = self.try_elementwise_inplace(rhs, $f) {
                    panic!("{}", e);
                }
            }
        }

        impl $OpAssign<u8> for ByteMatrix {
            fn $op_assign(&mut self, rhs: u8) {
                self.elementwise_inplace(rhs, $f)
            }
        }
    };
}

bitwise_op!(BitOr, bitor, BitOrAssign, bitor_assign, |l, r| l | r);
bitwise_op!(BitAnd, bitand, BitAndAssign, bitand_assign, |l, r| l & r);
bitwise_op!(BitXor, bitxor, BitXorAssign, bitxor_assign, |l, r| l ^ r);
bitwise_op!(Shr, shr, ShrAssign, shr_assign, shr_byte);
bitwise_op!(Shl, shl, ShlAssign, shl_assign, shl_byte);
