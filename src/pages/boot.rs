//! # Boot Page
//!
//! Page 9 of the primary file is the boot page: a single-row page describing
//! the database and anchoring the system catalog. The only fields the engine
//! needs are the database name, the version pair, and
//! `first_sys_indexes` — the page reference to the first `sysallocunits`
//! page, from which every other catalog object is reachable.
//!
//! ## Boot row layout (within the row, head included)
//!
//! ```text
//! 0x000  row head (4)
//! 0x004  version u16
//! 0x006  create_version u16
//! 0x008  status u32
//! 0x030  dbname nchar[128]  UTF-16LE, NUL padded
//! 0x130  dbid u16
//! 0x138  first_sys_indexes PageId
//! 0x140  (end of fixed portion)
//! ```

use zerocopy::byteorder::{LittleEndian, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::error::{Error, Result};
use crate::pages::{DataPage, FixedRow, PageHeader, PageId, PageType};
use crate::types::decode_utf16le_nul;

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct BootRow {
    version: U16<LittleEndian>,
    create_version: U16<LittleEndian>,
    status: U32<LittleEndian>,
    pad1: [u8; 36],
    dbname: [u8; 256],
    dbid: U16<LittleEndian>,
    pad2: [u8; 6],
    first_sys_indexes: PageId,
    pad3: [u8; 2],
}

impl FixedRow for BootRow {
    const OBJECT_ID: Option<u32> = None;
}

impl BootRow {
    pub fn version(&self) -> u16 {
        self.version.get()
    }

    pub fn dbid(&self) -> u16 {
        self.dbid.get()
    }

    pub fn dbname(&self) -> String {
        decode_utf16le_nul(&self.dbname)
    }

    pub fn first_sys_indexes(&self) -> PageId {
        self.first_sys_indexes
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BootPage<'a> {
    row: &'a BootRow,
}

impl<'a> BootPage<'a> {
    pub fn new(page: &'a [u8], header: &'a PageHeader) -> Result<Self> {
        if header.page_type() != PageType::Boot {
            return Err(Error::corrupt_page(
                header.page_id(),
                format!("expected boot page, found {:?}", header.page_type()),
            ));
        }
        let data = DataPage::new(page, header);
        if data.slots().is_empty() {
            return Err(Error::corrupt_page(header.page_id(), "boot page has no rows"));
        }
        let (row, _) = data.typed_row::<BootRow>(0)?;
        Ok(Self { row })
    }

    pub fn row(&self) -> &'a BootRow {
        self.row
    }

    pub fn dbname(&self) -> String {
        self.row.dbname()
    }

    pub fn first_sys_indexes(&self) -> PageId {
        self.row.first_sys_indexes()
    }
}
