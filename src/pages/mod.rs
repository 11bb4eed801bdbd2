//! # Page Structure
//!
//! Typed views over raw 8 KiB pages. Every page starts with a 96-byte header
//! and ends with a slot array growing backwards from the tail:
//!
//! ```text
//! +---------------------------+ 0
//! |    Header (96 bytes)      |
//! +---------------------------+ 96
//! |    Row data               |
//! |    (grows downward)       |
//! +---------------------------+ free_data
//! |    Free space             |
//! +---------------------------+
//! |    Slot array             |  2 bytes per row, slot 0 last
//! +---------------------------+ 8192
//! ```
//!
//! Each slot is a little-endian u16 byte offset of a row within the page.
//! Rows begin with a 4-byte row head followed by the fixed portion, the
//! column count, the NULL bitmap, and (when present) the variable-column
//! offset array and payloads — see [`row`].
//!
//! ## Page Kinds
//!
//! The header's type tag selects the view:
//!
//! | Tag | Kind | View |
//! |-----|------|------|
//! | 1 | data | [`DataPage`] with per-catalog typed rows |
//! | 2 | index | `index::IndexPage` |
//! | 3 | text-mix | raw (LOB storage, resolved by callers) |
//! | 10 | GAM / 11 SGAM | raw allocation maps |
//! | 13 | boot | [`BootPage`] |
//! | 15 | file header | raw |
//! | 16 | IAM | [`IamPage`] |
//! | 17 | PFS | [`PfsPage`] |
//!
//! Typed accessors validate the header against what the caller expects
//! (object id, fixed row size) and surface any mismatch as `CorruptPage`.

mod boot;
mod header;
mod iam;
mod pfs;
pub(crate) mod row;
mod slot;
#[cfg(test)]
pub(crate) mod testutil;
mod typed;

pub use boot::{BootPage, BootRow};
pub use header::{validate_page, Lsn, PageHeader, PageId, PageType};
pub use iam::{IamChain, IamHeaderRow, IamPage, IAM_SINGLE_PAGES};
pub use pfs::{pfs_page_for, PfsPage};
pub use row::{RowHead, RowView, COMPLEX_COLUMN_BIT, ROW_HEAD_SIZE};
pub use slot::SlotArray;
pub use typed::{DataPage, FixedRow, RowIter, TypedRowIter};
