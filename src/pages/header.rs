//! # Page Header Layout
//!
//! Every page carries a 96-byte header. All integers are little-endian and
//! unaligned; the struct is transmuted from raw page bytes with `zerocopy`.
//!
//! ## Layout (96 bytes)
//!
//! ```text
//! Offset  Size  Field           Description
//! ------  ----  --------------  ----------------------------------------
//! 0x00    1     header_version  Format version (1)
//! 0x01    1     page_type       Type tag (data, index, IAM, ...)
//! 0x02    1     type_flag_bits  Per-type flags
//! 0x03    1     level           B-tree level (0 = leaf)
//! 0x04    2     flag_bits       Page flags (torn/checksum mode, ...)
//! 0x06    2     index_id        Index id within the object
//! 0x08    6     prev_page       Previous sibling (page:4, file:2)
//! 0x0E    2     pmin_len        Fixed-size portion length of rows
//! 0x10    6     next_page       Next sibling
//! 0x16    2     slot_count      Number of slots
//! 0x18    4     obj_id          Owning object id
//! 0x1C    2     free_count      Free bytes on the page
//! 0x1E    2     free_data       Offset where free space begins
//! 0x20    6     page_id         This page's identity
//! 0x26    2     reserved_count  Reserved byte count
//! 0x28    10    lsn             Log sequence number
//! 0x32    2     xact_reserved   Reserved by transactions
//! 0x34    6     xdes_id         Allocating transaction
//! 0x3A    2     ghost_rec_count Ghost records
//! 0x3C    4     torn_bits       Torn-page protection bits
//! 0x40    32    reserved        Unused
//! ```
//!
//! A null [`PageId`] (all zero) terminates sibling chains.

use std::fmt;

use zerocopy::byteorder::{LittleEndian, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::error::{Error, Result};
use crate::storage::{BODY_SIZE, PAGE_HEADER_SIZE, PAGE_SIZE};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Null = 0,
    Data = 1,
    Index = 2,
    TextMix = 3,
    TextTree = 4,
    Sort = 8,
    Gam = 10,
    Sgam = 11,
    FileHeader = 15,
    Boot = 13,
    Iam = 16,
    Pfs = 17,
    Unknown = 0xFF,
}

impl PageType {
    pub fn from_byte(b: u8) -> Self {
        match b {
            0 => PageType::Null,
            1 => PageType::Data,
            2 => PageType::Index,
            3 => PageType::TextMix,
            4 => PageType::TextTree,
            8 => PageType::Sort,
            10 => PageType::Gam,
            11 => PageType::Sgam,
            13 => PageType::Boot,
            15 => PageType::FileHeader,
            16 => PageType::Iam,
            17 => PageType::Pfs,
            _ => PageType::Unknown,
        }
    }
}

/// A `(file_id, page_id)` page reference as stored on disk: 4 bytes of page
/// number followed by 2 bytes of file number.
#[repr(C)]
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromBytes, IntoBytes, Immutable, KnownLayout,
    Unaligned,
)]
pub struct PageId {
    page: U32<LittleEndian>,
    file: U16<LittleEndian>,
}

impl PageId {
    pub const NULL: PageId = PageId {
        page: U32::ZERO,
        file: U16::ZERO,
    };

    pub fn new(file_id: u16, page_id: u32) -> Self {
        Self {
            page: U32::new(page_id),
            file: U16::new(file_id),
        }
    }

    pub fn page_id(&self) -> u32 {
        self.page.get()
    }

    pub fn file_id(&self) -> u16 {
        self.file.get()
    }

    /// A zero page in file zero marks the end of a chain.
    pub fn is_null(&self) -> bool {
        self.page.get() == 0 && self.file.get() == 0
    }
}

impl fmt::Debug for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.get(), self.page.get())
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.get(), self.page.get())
    }
}

/// Log sequence number, kept only for diagnostics.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
pub struct Lsn {
    file_seq: U32<LittleEndian>,
    block: U32<LittleEndian>,
    slot: U16<LittleEndian>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct PageHeader {
    header_version: u8,
    page_type: u8,
    type_flag_bits: u8,
    level: u8,
    flag_bits: U16<LittleEndian>,
    index_id: U16<LittleEndian>,
    prev_page: PageId,
    pmin_len: U16<LittleEndian>,
    next_page: PageId,
    slot_count: U16<LittleEndian>,
    obj_id: U32<LittleEndian>,
    free_count: U16<LittleEndian>,
    free_data: U16<LittleEndian>,
    page_id: PageId,
    reserved_count: U16<LittleEndian>,
    lsn: Lsn,
    xact_reserved: U16<LittleEndian>,
    xdes_id: [u8; 6],
    ghost_rec_count: U16<LittleEndian>,
    torn_bits: U32<LittleEndian>,
    reserved: [u8; 32],
}

impl PageHeader {
    pub fn from_page(page: &[u8]) -> Result<&Self> {
        if page.len() < PAGE_HEADER_SIZE {
            return Err(Error::corrupt_page(
                PageId::NULL,
                format!("page buffer too small: {}", page.len()),
            ));
        }
        Self::ref_from_bytes(&page[..size_of::<Self>()])
            .map_err(|_| Error::corrupt_page(PageId::NULL, "misaligned page header"))
    }

    pub fn page_type(&self) -> PageType {
        PageType::from_byte(self.page_type)
    }

    pub fn type_byte(&self) -> u8 {
        self.page_type
    }

    /// B-tree level; 0 for leaf and heap pages.
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn index_id(&self) -> u16 {
        self.index_id.get()
    }

    pub fn prev_page(&self) -> PageId {
        self.prev_page
    }

    pub fn next_page(&self) -> PageId {
        self.next_page
    }

    /// Fixed-size portion length of rows stored on this page.
    pub fn pmin_len(&self) -> u16 {
        self.pmin_len.get()
    }

    pub fn slot_count(&self) -> u16 {
        self.slot_count.get()
    }

    pub fn obj_id(&self) -> u32 {
        self.obj_id.get()
    }

    pub fn free_count(&self) -> u16 {
        self.free_count.get()
    }

    pub fn free_data(&self) -> u16 {
        self.free_data.get()
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn lsn(&self) -> Lsn {
        self.lsn
    }

    pub fn is_data(&self) -> bool {
        self.page_type() == PageType::Data
    }

    pub fn is_index(&self) -> bool {
        self.page_type() == PageType::Index
    }

    pub fn is_iam(&self) -> bool {
        self.page_type() == PageType::Iam
    }

    pub fn is_leaf(&self) -> bool {
        self.level == 0
    }

    /// Unallocated pages are fully zeroed.
    pub fn is_null(&self) -> bool {
        self.page_type == 0
    }
}

/// Validates the self-consistency invariants of a page header:
/// a known type tag, `free_data` within the body, and room for the slot
/// array behind the free space watermark.
pub fn validate_page(page: &[u8]) -> Result<&PageHeader> {
    let header = PageHeader::from_page(page)?;
    if header.is_null() {
        return Ok(header);
    }
    let id = header.page_id();

    if header.page_type() == PageType::Unknown {
        return Err(Error::corrupt_page(
            id,
            format!("unknown page type {:#04x}", header.page_type),
        ));
    }

    let free_data = header.free_data() as usize;
    if free_data < PAGE_HEADER_SIZE || free_data > PAGE_SIZE {
        return Err(Error::corrupt_page(
            id,
            format!("free_data {} outside page body", free_data),
        ));
    }

    let slot_bytes = header.slot_count() as usize * 2;
    if slot_bytes > BODY_SIZE || free_data + slot_bytes > PAGE_SIZE {
        return Err(Error::corrupt_page(
            id,
            format!(
                "slot array ({} slots) overlaps row data at {}",
                header.slot_count(),
                free_data
            ),
        ));
    }

    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::IntoBytes;

    #[test]
    fn header_is_96_bytes() {
        assert_eq!(size_of::<PageHeader>(), PAGE_HEADER_SIZE);
        assert_eq!(size_of::<PageId>(), 6);
        assert_eq!(size_of::<Lsn>(), 10);
    }

    #[test]
    fn page_type_round_trip() {
        for (byte, ty) in [
            (0u8, PageType::Null),
            (1, PageType::Data),
            (2, PageType::Index),
            (3, PageType::TextMix),
            (13, PageType::Boot),
            (16, PageType::Iam),
            (17, PageType::Pfs),
        ] {
            assert_eq!(PageType::from_byte(byte), ty);
        }
        assert_eq!(PageType::from_byte(99), PageType::Unknown);
    }

    #[test]
    fn null_page_id_terminates() {
        assert!(PageId::NULL.is_null());
        assert!(!PageId::new(1, 20).is_null());
        assert_eq!(PageId::new(1, 20).page_id(), 20);
        assert_eq!(PageId::new(1, 20).file_id(), 1);
    }

    #[test]
    fn page_id_on_disk_layout() {
        let id = PageId::new(0x0102, 0x0A0B0C0D);
        assert_eq!(id.as_bytes(), &[0x0D, 0x0C, 0x0B, 0x0A, 0x02, 0x01]);
    }

    #[test]
    fn header_reads_fields_from_bytes() {
        let mut page = [0u8; PAGE_SIZE];
        page[0x00] = 1; // header_version
        page[0x01] = 2; // index page
        page[0x03] = 3; // level
        page[0x16] = 5; // slot_count
        page[0x18..0x1C].copy_from_slice(&100u32.to_le_bytes());
        page[0x1E..0x20].copy_from_slice(&200u16.to_le_bytes());
        page[0x20..0x24].copy_from_slice(&77u32.to_le_bytes());
        page[0x24..0x26].copy_from_slice(&1u16.to_le_bytes());

        let header = PageHeader::from_page(&page).unwrap();
        assert_eq!(header.page_type(), PageType::Index);
        assert_eq!(header.level(), 3);
        assert_eq!(header.slot_count(), 5);
        assert_eq!(header.obj_id(), 100);
        assert_eq!(header.free_data(), 200);
        assert_eq!(header.page_id(), PageId::new(1, 77));
    }

    #[test]
    fn validate_rejects_unknown_type() {
        let mut page = [0u8; PAGE_SIZE];
        page[0x01] = 99;
        page[0x1E..0x20].copy_from_slice(&96u16.to_le_bytes());
        assert!(matches!(
            validate_page(&page),
            Err(Error::CorruptPage { .. })
        ));
    }

    #[test]
    fn validate_rejects_free_data_inside_header() {
        let mut page = [0u8; PAGE_SIZE];
        page[0x01] = 1;
        page[0x1E..0x20].copy_from_slice(&10u16.to_le_bytes());
        assert!(matches!(
            validate_page(&page),
            Err(Error::CorruptPage { .. })
        ));
    }

    #[test]
    fn validate_rejects_slot_array_overlap() {
        let mut page = [0u8; PAGE_SIZE];
        page[0x01] = 1;
        page[0x16..0x18].copy_from_slice(&200u16.to_le_bytes());
        page[0x1E..0x20].copy_from_slice(&(PAGE_SIZE as u16 - 100).to_le_bytes());
        assert!(matches!(
            validate_page(&page),
            Err(Error::CorruptPage { .. })
        ));
    }

    #[test]
    fn validate_accepts_zeroed_page() {
        let page = [0u8; PAGE_SIZE];
        let header = validate_page(&page).unwrap();
        assert!(header.is_null());
    }
}
