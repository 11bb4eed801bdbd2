//! # Typed Data Pages
//!
//! [`DataPage`] wraps a raw page with its validated header and slot array and
//! iterates rows lazily. [`DataPage::typed_rows`] adds the per-catalog layer:
//! given a [`FixedRow`] implementation it checks that the page belongs to the
//! expected object and that each row's fixed portion matches the catalog's
//! fixed-row size, then yields zerocopy references to the fixed portion
//! together with the full [`RowView`] for variable columns.

use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use crate::error::{Error, Result};
use crate::pages::{PageHeader, PageId, RowView, SlotArray, ROW_HEAD_SIZE};
use crate::storage::parse_prefix;

/// A catalog row type with a fixed-size leading portion at a known layout.
pub trait FixedRow: FromBytes + KnownLayout + Immutable + Unaligned + Sized {
    /// Object id of the catalog this row belongs to, when fixed (system
    /// catalogs); `None` for user objects.
    const OBJECT_ID: Option<u32>;

    /// On-disk size of the fixed portion including the 4-byte row head.
    fn fixed_size() -> usize {
        ROW_HEAD_SIZE + size_of::<Self>()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DataPage<'a> {
    page: &'a [u8],
    header: &'a PageHeader,
    slots: SlotArray<'a>,
}

impl<'a> DataPage<'a> {
    pub fn new(page: &'a [u8], header: &'a PageHeader) -> Self {
        Self {
            page,
            header,
            slots: SlotArray::new(page, header),
        }
    }

    pub fn header(&self) -> &'a PageHeader {
        self.header
    }

    pub fn page_id(&self) -> PageId {
        self.header.page_id()
    }

    pub fn slots(&self) -> SlotArray<'a> {
        self.slots
    }

    pub fn raw(&self) -> &'a [u8] {
        self.page
    }

    /// Parses the row at `slot`.
    pub fn row(&self, slot: usize) -> Result<RowView<'a>> {
        let bytes = self.slots.row_bytes(slot)?;
        RowView::parse(bytes, self.page_id())
    }

    /// Lazy iteration over all rows of the page.
    pub fn rows(&self) -> RowIter<'a> {
        RowIter {
            page: *self,
            next: 0,
        }
    }

    /// Validates this page against catalog `T` and returns a typed iterator.
    ///
    /// `expected_object` overrides `T::OBJECT_ID` for user objects whose id
    /// is only known at runtime.
    pub fn typed_rows<T: FixedRow>(
        &self,
        expected_object: Option<u32>,
    ) -> Result<TypedRowIter<'a, T>> {
        let want = expected_object.or(T::OBJECT_ID);
        if let Some(object_id) = want {
            if self.header.obj_id() != object_id {
                return Err(Error::corrupt_page(
                    self.page_id(),
                    format!(
                        "page belongs to object {}, expected {}",
                        self.header.obj_id(),
                        object_id
                    ),
                ));
            }
        }
        Ok(TypedRowIter {
            page: *self,
            next: 0,
            _marker: std::marker::PhantomData,
        })
    }

    /// Parses the fixed portion of the row at `slot` as `T`, verifying the
    /// row's declared fixed length.
    pub fn typed_row<T: FixedRow>(&self, slot: usize) -> Result<(&'a T, RowView<'a>)> {
        let view = self.row(slot)?;
        if view.fixed_len() != T::fixed_size() {
            return Err(Error::corrupt_page(
                self.page_id(),
                format!(
                    "row fixed length {} does not match catalog row size {}",
                    view.fixed_len(),
                    T::fixed_size()
                ),
            ));
        }
        let fixed: &T = parse_prefix(view.fixed_bytes(), self.page_id(), "catalog row")?;
        Ok((fixed, view))
    }
}

/// Lazy, single-pass iteration over the rows of one page.
pub struct RowIter<'a> {
    page: DataPage<'a>,
    next: usize,
}

impl<'a> Iterator for RowIter<'a> {
    type Item = Result<RowView<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.page.slots.len() {
            return None;
        }
        let slot = self.next;
        self.next += 1;
        Some(self.page.row(slot))
    }
}

pub struct TypedRowIter<'a, T> {
    page: DataPage<'a>,
    next: usize,
    _marker: std::marker::PhantomData<&'a T>,
}

impl<'a, T: FixedRow> Iterator for TypedRowIter<'a, T> {
    type Item = Result<(&'a T, RowView<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.page.slots.len() {
            return None;
        }
        let slot = self.next;
        self.next += 1;
        Some(self.page.typed_row::<T>(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::row::testutil::build_row;
    use crate::pages::validate_page;
    use crate::storage::{PAGE_HEADER_SIZE, PAGE_SIZE};
    use zerocopy::byteorder::{LittleEndian, U32};
    use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

    #[repr(C)]
    #[derive(Debug, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
    struct PairRow {
        a: U32<LittleEndian>,
        b: U32<LittleEndian>,
    }

    impl FixedRow for PairRow {
        const OBJECT_ID: Option<u32> = Some(77);
    }

    pub(crate) fn page_with_rows(obj_id: u32, rows: &[Vec<u8>]) -> Vec<u8> {
        let mut page = vec![0u8; PAGE_SIZE];
        page[0x01] = 1;
        page[0x16..0x18].copy_from_slice(&(rows.len() as u16).to_le_bytes());
        page[0x18..0x1C].copy_from_slice(&obj_id.to_le_bytes());
        let mut offset = PAGE_HEADER_SIZE;
        for (i, row) in rows.iter().enumerate() {
            page[offset..offset + row.len()].copy_from_slice(row);
            let pos = PAGE_SIZE - 2 * (i + 1);
            page[pos..pos + 2].copy_from_slice(&(offset as u16).to_le_bytes());
            offset += row.len();
        }
        page[0x1E..0x20].copy_from_slice(&(offset as u16).to_le_bytes());
        page
    }

    #[test]
    fn iterates_typed_rows() {
        let rows: Vec<Vec<u8>> = (0..3u32)
            .map(|i| {
                let mut fixed = Vec::new();
                fixed.extend_from_slice(&i.to_le_bytes());
                fixed.extend_from_slice(&(i * 10).to_le_bytes());
                build_row(&fixed, &[false, false], &[])
            })
            .collect();
        let page = page_with_rows(77, &rows);
        let header = validate_page(&page).unwrap();
        let data = DataPage::new(&page, header);

        let decoded: Vec<(u32, u32)> = data
            .typed_rows::<PairRow>(None)
            .unwrap()
            .map(|r| {
                let (row, _) = r.unwrap();
                (row.a.get(), row.b.get())
            })
            .collect();
        assert_eq!(decoded, vec![(0, 0), (1, 10), (2, 20)]);
    }

    #[test]
    fn wrong_object_id_is_corrupt() {
        let page = page_with_rows(78, &[build_row(&[0; 8], &[false, false], &[])]);
        let header = validate_page(&page).unwrap();
        let data = DataPage::new(&page, header);
        assert!(matches!(
            data.typed_rows::<PairRow>(None),
            Err(Error::CorruptPage { .. })
        ));
    }

    #[test]
    fn wrong_fixed_size_is_corrupt() {
        // 6-byte fixed portion where PairRow expects 8
        let page = page_with_rows(77, &[build_row(&[0; 6], &[false, false], &[])]);
        let header = validate_page(&page).unwrap();
        let data = DataPage::new(&page, header);
        let result = data.typed_rows::<PairRow>(None).unwrap().next().unwrap();
        assert!(matches!(result, Err(Error::CorruptPage { .. })));
    }

    #[test]
    fn row_iteration_is_lazy_and_ordered() {
        let rows: Vec<Vec<u8>> = (0..4u8)
            .map(|i| build_row(&[i], &[false], &[]))
            .collect();
        let page = page_with_rows(5, &rows);
        let header = validate_page(&page).unwrap();
        let data = DataPage::new(&page, header);
        let firsts: Vec<u8> = data
            .rows()
            .map(|r| r.unwrap().fixed_bytes()[0])
            .collect();
        assert_eq!(firsts, vec![0, 1, 2, 3]);
    }
}
