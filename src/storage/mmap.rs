//! # Memory-Mapped Page Files
//!
//! [`PageFile`] maps one database file read-only and serves pages by index.
//! [`PageStore`] owns the primary file plus any attached secondary files and
//! resolves `(file_id, page_id)` references across them.
//!
//! ## Design
//!
//! The mapping is created once at open and never changes, so page borrows are
//! plain `&[u8; 8192]` slices into the mapping with the store's lifetime.
//! Sequential scans call [`PageFile::prefetch`] which issues
//! `madvise(MADV_WILLNEED)` so the kernel reads ahead of the iterator.
//!
//! ## Errors
//!
//! - Opening a missing file, an unreadable file, or a file whose size is not
//!   a multiple of 8192 yields `FileUnavailable`.
//! - A page index past end-of-file yields `OutOfBounds`.
//! - A `(file_id, page_id)` reference to a file id that was never attached
//!   yields `UnknownFile`; for a single-file database only file id 1 exists.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use super::{PageBuf, PAGE_SIZE};
use crate::error::{Error, Result};
use crate::pages::PageId;

/// One database file, mapped read-only.
#[derive(Debug)]
pub struct PageFile {
    path: String,
    mmap: Mmap,
    page_count: u32,
}

impl PageFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let unavailable = |reason: String| Error::FileUnavailable {
            path: display.clone(),
            reason,
        };

        let file = File::open(path).map_err(|e| unavailable(e.to_string()))?;
        let metadata = file.metadata().map_err(|e| unavailable(e.to_string()))?;
        let file_size = metadata.len();

        if file_size == 0 {
            return Err(unavailable("file is empty".into()));
        }
        if file_size % PAGE_SIZE as u64 != 0 {
            return Err(unavailable(format!(
                "size {} is not a multiple of page size {}",
                file_size, PAGE_SIZE
            )));
        }

        // SAFETY: the mapping is read-only and private to this process's view;
        // the engine never truncates or writes the file, and the Mmap lifetime
        // is tied to PageFile, so borrows returned by page() cannot outlive
        // the mapping.
        let mmap = unsafe { Mmap::map(&file).map_err(|e| unavailable(e.to_string()))? };

        Ok(Self {
            path: display,
            mmap,
            page_count: (file_size / PAGE_SIZE as u64) as u32,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Returns the page at `page_index`, borrowed from the mapping.
    pub fn page(&self, page_index: u32) -> Result<&PageBuf> {
        if page_index >= self.page_count {
            return Err(Error::OutOfBounds {
                page_index,
                page_count: self.page_count,
            });
        }
        let offset = page_index as usize * PAGE_SIZE;
        let bytes = &self.mmap[offset..offset + PAGE_SIZE];
        // The slice is exactly PAGE_SIZE bytes by construction.
        bytes.try_into().map_err(|_| Error::OutOfBounds {
            page_index,
            page_count: self.page_count,
        })
    }

    /// Hints the kernel that `count` pages starting at `start` will be read.
    pub fn prefetch(&self, start: u32, count: u32) {
        if start >= self.page_count {
            return;
        }
        let end = (start + count).min(self.page_count);
        let offset = start as usize * PAGE_SIZE;
        let len = (end - start) as usize * PAGE_SIZE;

        #[cfg(unix)]
        // SAFETY: the range was clamped to the mapping above; madvise with
        // MADV_WILLNEED is advisory and does not invalidate the mapping.
        unsafe {
            libc::madvise(
                self.mmap.as_ptr().add(offset) as *mut libc::c_void,
                len,
                libc::MADV_WILLNEED,
            );
        }
        #[cfg(not(unix))]
        let _ = len;
    }
}

/// The set of files making up one database. File ids are 1-based; a
/// single-file database has exactly file id 1.
#[derive(Debug)]
pub struct PageStore {
    // files[0] is file id 1.
    files: Vec<PageFile>,
}

impl PageStore {
    /// Opens a single-file database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            files: vec![PageFile::open(path)?],
        })
    }

    /// Attaches a secondary file; it becomes the next file id in sequence.
    pub fn attach<P: AsRef<Path>>(&mut self, path: P) -> Result<u16> {
        self.files.push(PageFile::open(path)?);
        Ok(self.files.len() as u16)
    }

    /// Page count of the primary file.
    pub fn page_count(&self) -> u32 {
        self.files[0].page_count()
    }

    pub fn primary(&self) -> &PageFile {
        &self.files[0]
    }

    /// Loads a page of the primary file by index.
    pub fn load(&self, page_index: u32) -> Result<&PageBuf> {
        self.files[0].page(page_index)
    }

    /// Resolves a `(file_id, page_id)` reference across attached files.
    pub fn load_by_id(&self, id: PageId) -> Result<&PageBuf> {
        let file_id = id.file_id();
        if file_id == 0 || file_id as usize > self.files.len() {
            return Err(Error::UnknownFile {
                file_id,
                page_id: id.page_id(),
            });
        }
        self.files[file_id as usize - 1].page(id.page_id())
    }

    pub fn prefetch(&self, id: PageId, count: u32) {
        if let Some(file) = self.files.get(id.file_id() as usize - 1) {
            file.prefetch(id.page_id(), count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(pages: u32) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.mdf");
        let mut f = File::create(&path).unwrap();
        for i in 0..pages {
            let mut page = [0u8; PAGE_SIZE];
            page[0] = i as u8;
            f.write_all(&page).unwrap();
        }
        f.flush().unwrap();
        (dir, path)
    }

    #[test]
    fn open_counts_pages() {
        let (_dir, path) = write_file(4);
        let file = PageFile::open(&path).unwrap();
        assert_eq!(file.page_count(), 4);
    }

    #[test]
    fn open_missing_file_is_unavailable() {
        let result = PageFile::open("/nonexistent/path/x.mdf");
        assert!(matches!(result, Err(Error::FileUnavailable { .. })));
    }

    #[test]
    fn open_truncated_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.mdf");
        std::fs::write(&path, [0u8; 100]).unwrap();
        let result = PageFile::open(&path);
        assert!(matches!(result, Err(Error::FileUnavailable { .. })));
    }

    #[test]
    fn page_out_of_bounds() {
        let (_dir, path) = write_file(2);
        let file = PageFile::open(&path).unwrap();
        assert!(file.page(1).is_ok());
        assert!(matches!(
            file.page(2),
            Err(Error::OutOfBounds {
                page_index: 2,
                page_count: 2
            })
        ));
    }

    #[test]
    fn page_contents_are_mapped() {
        let (_dir, path) = write_file(3);
        let file = PageFile::open(&path).unwrap();
        assert_eq!(file.page(0).unwrap()[0], 0);
        assert_eq!(file.page(2).unwrap()[0], 2);
    }

    #[test]
    fn store_rejects_unknown_file_id() {
        let (_dir, path) = write_file(2);
        let store = PageStore::open(&path).unwrap();
        let id = PageId::new(2, 0);
        assert!(matches!(
            store.load_by_id(id),
            Err(Error::UnknownFile { file_id: 2, .. })
        ));
        let id0 = PageId::new(0, 5);
        assert!(matches!(store.load_by_id(id0), Err(Error::UnknownFile { .. })));
    }

    #[test]
    fn store_resolves_file_one() {
        let (_dir, path) = write_file(2);
        let store = PageStore::open(&path).unwrap();
        let page = store.load_by_id(PageId::new(1, 1)).unwrap();
        assert_eq!(page[0], 1);
    }
}
