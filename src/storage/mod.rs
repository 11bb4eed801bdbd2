//! # Storage Module
//!
//! Read-only, memory-mapped access to database files. A database file is a
//! flat sequence of 8 KiB pages:
//!
//! ```text
//! Offset 0:        Page 0 (8192 bytes)   file header
//! Offset 8192:     Page 1                PFS
//! Offset 16384:    Page 2
//! ...
//! Offset 73728:    Page 9                boot page
//! ```
//!
//! The engine never writes: files are mapped with `memmap2::Mmap` (shared,
//! read-only) and every page access returns a borrowed page buffer pointing
//! directly into the mapping. There is no page cache of our own; the OS page
//! cache is the cache.
//!
//! ## Safety Model
//!
//! A read-only mapping is never remapped, so borrows handed out by
//! [`PageFile::page`] stay valid for the lifetime of the file object. The
//! borrow checker ties every typed view to that lifetime; no reference
//! counting or epochs are needed.
//!
//! ## Well-Known Pages
//!
//! | Index | Page |
//! |-------|------|
//! | 0 | file header |
//! | 1 (then every 8088) | PFS allocation status |
//! | 9 | boot page |
//!
//! ## Module Organization
//!
//! - `mmap`: single-file mapping (`PageFile`) and the multi-file
//!   [`PageStore`] that resolves `(file_id, page_id)` references.

mod mmap;

pub use mmap::{PageFile, PageStore};

use crate::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, KnownLayout};

/// Size of every page in the file.
pub const PAGE_SIZE: usize = 8192;

/// Size of the page header at the start of every page.
pub const PAGE_HEADER_SIZE: usize = 96;

/// Usable bytes between the header and the slot array.
pub const BODY_SIZE: usize = PAGE_SIZE - PAGE_HEADER_SIZE;

/// Page index of the file header page.
pub const FILE_HEADER_PAGE: u32 = 0;

/// Page index of the boot page.
pub const BOOT_PAGE: u32 = 9;

/// A PFS page occurs at index 1 and then every `PFS_INTERVAL` pages.
pub const PFS_INTERVAL: u32 = 8088;

/// A full page buffer.
pub type PageBuf = [u8; PAGE_SIZE];

/// Parses a zerocopy struct from the front of a byte slice, mapping layout
/// mismatch into `CorruptPage` with the given page identity.
#[inline]
pub(crate) fn parse_prefix<'a, T: FromBytes + KnownLayout + Immutable>(
    bytes: &'a [u8],
    page: crate::pages::PageId,
    what: &str,
) -> Result<&'a T> {
    let size = size_of::<T>();
    if bytes.len() < size {
        return Err(Error::corrupt_page(
            page,
            format!("{} needs {} bytes, {} available", what, size, bytes.len()),
        ));
    }
    T::ref_from_bytes(&bytes[..size])
        .map_err(|_| Error::corrupt_page(page, format!("misaligned {}", what)))
}
