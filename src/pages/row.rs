//! # Row Layout
//!
//! Rows on data and catalog pages share one layout:
//!
//! ```text
//! +--------------------+ 0
//! | row head (4 bytes) |  status_a, status_b, fixed_len
//! +--------------------+ 4
//! | fixed portion      |  fixed columns back to back
//! +--------------------+ fixed_len
//! | column_count (2)   |
//! | NULL bitmap        |  ceil(column_count / 8) bytes
//! +--------------------+
//! | var_count (2)      |  only when status_a has HAS_VARIABLE
//! | var_end[var_count] |  2 bytes each: absolute end offset of column v
//! | var payloads       |
//! +--------------------+
//! ```
//!
//! `var_end[v]` offsets are absolute within the row; the payload of variable
//! column `v` spans `[var_end[v-1], var_end[v])`, with the variable region
//! itself starting right after the offset array. The high bit of a `var_end`
//! entry flags a complex column (an in-row LOB or row-overflow pointer rather
//! than inline data).

use zerocopy::byteorder::{LittleEndian, U16};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::error::{Error, Result};
use crate::pages::PageId;
use crate::storage::parse_prefix;

pub const ROW_HEAD_SIZE: usize = 4;

/// High bit of a variable-column end offset: payload is a LOB/overflow
/// pointer, not inline data.
pub const COMPLEX_COLUMN_BIT: u16 = 0x8000;

/// status_a bit: a NULL bitmap follows the fixed portion.
const HAS_NULL_BITMAP: u8 = 0x10;
/// status_a bit: a variable-column array follows the NULL bitmap.
const HAS_VARIABLE: u8 = 0x20;

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct RowHead {
    status_a: u8,
    status_b: u8,
    fixed_len: U16<LittleEndian>,
}

impl RowHead {
    pub fn status_a(&self) -> u8 {
        self.status_a
    }

    /// End offset of the fixed portion, counted from the start of the row
    /// (the 4-byte head included).
    pub fn fixed_len(&self) -> u16 {
        self.fixed_len.get()
    }

    pub fn has_null_bitmap(&self) -> bool {
        self.status_a & HAS_NULL_BITMAP != 0
    }

    pub fn has_variable(&self) -> bool {
        self.status_a & HAS_VARIABLE != 0
    }
}

/// Parsed view over one row. Construction walks the trailer once and
/// validates every boundary; accessors after that are O(1) and cannot fail.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    data: &'a [u8],
    head: RowHead,
    fixed_len: usize,
    column_count: usize,
    bitmap_start: usize,
    var_count: usize,
    var_array_start: usize,
    var_data_start: usize,
}

impl<'a> RowView<'a> {
    pub fn parse(data: &'a [u8], page: PageId) -> Result<Self> {
        let head: &RowHead = parse_prefix(data, page, "row head")?;
        let fixed_len = head.fixed_len() as usize;
        if fixed_len < ROW_HEAD_SIZE || fixed_len + 2 > data.len() {
            return Err(Error::corrupt_page(
                page,
                format!("row fixed length {} outside row of {} bytes", fixed_len, data.len()),
            ));
        }

        let column_count =
            u16::from_le_bytes([data[fixed_len], data[fixed_len + 1]]) as usize;
        let bitmap_start = fixed_len + 2;
        let bitmap_len = column_count.div_ceil(8);
        if bitmap_start + bitmap_len > data.len() {
            return Err(Error::corrupt_page(
                page,
                format!("NULL bitmap for {} columns overruns row", column_count),
            ));
        }

        let (var_count, var_array_start) = if head.has_variable() {
            let at = bitmap_start + bitmap_len;
            if at + 2 > data.len() {
                return Err(Error::corrupt_page(page, "variable count overruns row"));
            }
            (
                u16::from_le_bytes([data[at], data[at + 1]]) as usize,
                at + 2,
            )
        } else {
            (0, bitmap_start + bitmap_len)
        };

        let var_data_start = var_array_start + var_count * 2;
        if var_data_start > data.len() {
            return Err(Error::corrupt_page(
                page,
                format!("variable offset array ({} entries) overruns row", var_count),
            ));
        }

        Ok(Self {
            data,
            head: *head,
            fixed_len,
            column_count,
            bitmap_start,
            var_count,
            var_array_start,
            var_data_start,
        })
    }

    pub fn head(&self) -> RowHead {
        self.head
    }

    pub fn fixed_len(&self) -> usize {
        self.fixed_len
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn var_count(&self) -> usize {
        self.var_count
    }

    /// The fixed portion after the row head.
    pub fn fixed_bytes(&self) -> &'a [u8] {
        &self.data[ROW_HEAD_SIZE..self.fixed_len]
    }

    /// Whole-row bytes as sliced from the page.
    pub fn raw(&self) -> &'a [u8] {
        self.data
    }

    pub fn is_null(&self, column: usize) -> bool {
        if column >= self.column_count {
            return true;
        }
        let byte = self.data[self.bitmap_start + column / 8];
        byte & (1 << (column % 8)) != 0
    }

    fn var_end(&self, v: usize) -> u16 {
        let at = self.var_array_start + v * 2;
        u16::from_le_bytes([self.data[at], self.data[at + 1]])
    }

    /// Payload bytes of variable column `v` plus its complex-column flag.
    pub fn var_bytes(&self, v: usize, page: PageId) -> Result<(&'a [u8], bool)> {
        if v >= self.var_count {
            return Err(Error::corrupt_page(
                page,
                format!("variable column {} of {}", v, self.var_count),
            ));
        }
        let raw_end = self.var_end(v);
        let complex = raw_end & COMPLEX_COLUMN_BIT != 0;
        let end = (raw_end & !COMPLEX_COLUMN_BIT) as usize;
        let start = if v == 0 {
            self.var_data_start
        } else {
            (self.var_end(v - 1) & !COMPLEX_COLUMN_BIT) as usize
        };
        if start > end || end > self.data.len() || start < self.var_data_start {
            return Err(Error::corrupt_page(
                page,
                format!("variable column {} spans {}..{} outside row", v, start, end),
            ));
        }
        Ok((&self.data[start..end], complex))
    }

    /// Total row length: end of the last variable column, or end of the
    /// trailer when the row has no variable columns.
    pub fn row_len(&self) -> usize {
        if self.var_count == 0 {
            self.var_data_start
        } else {
            (self.var_end(self.var_count - 1) & !COMPLEX_COLUMN_BIT) as usize
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testutil::build_row;
    use super::*;

    fn parse(row: &[u8]) -> RowView<'_> {
        RowView::parse(row, PageId::new(1, 7)).unwrap()
    }

    #[test]
    fn fixed_only_row() {
        let row = build_row(&[1, 0, 0, 0, 2, 0], &[false, false], &[]);
        let view = parse(&row);
        assert_eq!(view.fixed_len(), 10);
        assert_eq!(view.column_count(), 2);
        assert_eq!(view.var_count(), 0);
        assert_eq!(view.fixed_bytes(), &[1, 0, 0, 0, 2, 0]);
        assert!(!view.is_null(0));
        assert!(!view.is_null(1));
    }

    #[test]
    fn null_bitmap_bits() {
        let row = build_row(&[0; 8], &[false, true, false], &[]);
        let view = parse(&row);
        assert!(!view.is_null(0));
        assert!(view.is_null(1));
        assert!(!view.is_null(2));
        // past the stored column count reads as NULL
        assert!(view.is_null(9));
    }

    #[test]
    fn variable_columns_span_trailer() {
        let row = build_row(&[42, 0, 0, 0], &[false, false], &[b"hello", b"x"]);
        let view = parse(&row);
        assert_eq!(view.var_count(), 2);
        let (a, complex_a) = view.var_bytes(0, PageId::NULL).unwrap();
        assert_eq!(a, b"hello");
        assert!(!complex_a);
        let (b, _) = view.var_bytes(1, PageId::NULL).unwrap();
        assert_eq!(b, b"x");
        assert_eq!(view.row_len(), row.len());
    }

    #[test]
    fn empty_variable_column() {
        let row = build_row(&[], &[true], &[b""]);
        let view = parse(&row);
        let (payload, _) = view.var_bytes(0, PageId::NULL).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn complex_bit_is_reported() {
        let mut row = build_row(&[], &[false], &[b"0123456789abcdef"]);
        // set the high bit of var_end[0]
        let at = row.len() - 16 - 2;
        let end = u16::from_le_bytes([row[at], row[at + 1]]) | COMPLEX_COLUMN_BIT;
        row[at..at + 2].copy_from_slice(&end.to_le_bytes());
        let view = parse(&row);
        let (payload, complex) = view.var_bytes(0, PageId::NULL).unwrap();
        assert_eq!(payload.len(), 16);
        assert!(complex);
    }

    #[test]
    fn truncated_row_is_corrupt() {
        let row = build_row(&[1, 2, 3, 4], &[false], &[]);
        let result = RowView::parse(&row[..5], PageId::new(1, 3));
        assert!(matches!(result, Err(Error::CorruptPage { .. })));
    }

    #[test]
    fn bad_fixed_len_is_corrupt() {
        let mut row = build_row(&[1, 2, 3, 4], &[false], &[]);
        row[2..4].copy_from_slice(&2u16.to_le_bytes());
        assert!(RowView::parse(&row, PageId::NULL).is_err());
    }
}
