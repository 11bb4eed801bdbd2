//! # Error Types
//!
//! Every failure the engine can surface is a variant of [`Error`]. Corruption
//! errors carry the identity of the offending page (`file_id`, `page_id`) and,
//! where one exists, the object id of the catalog entity involved, so a caller
//! can report exactly where a damaged file went wrong.
//!
//! The library never panics on malformed input; all parsing paths return
//! `Result<T, Error>` and propagate with `?`.

use crate::pages::PageId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file cannot be opened, read, or is not a whole number of pages.
    #[error("file unavailable: {path}: {reason}")]
    FileUnavailable { path: String, reason: String },

    /// A page index past the end of the mapped file.
    #[error("page index {page_index} out of bounds (page_count={page_count})")]
    OutOfBounds { page_index: u32, page_count: u32 },

    /// A `(file_id, page_id)` reference into a file this database does not have.
    #[error("unknown file id {file_id} (page {page_id})")]
    UnknownFile { file_id: u16, page_id: u32 },

    /// A page header that is self-inconsistent or of an unexpected type.
    #[error("corrupt page {page}: {reason}")]
    CorruptPage { page: PageId, reason: String },

    /// A B-tree child or sibling pointer violating tree invariants.
    #[error("corrupt index at page {page}: {reason}")]
    CorruptIndex { page: PageId, reason: String },

    /// An IAM chain pointer leading to a page that is not the next IAM page
    /// of the same allocation unit.
    #[error("IAM chain broken at page {page}: {reason}")]
    IamChainBroken { page: PageId, reason: String },

    /// The catalog references a column, scalar type, or index row that is
    /// missing; `object_id` identifies the table being rebuilt.
    #[error("incomplete schema for object {object_id}: {reason}")]
    SchemaIncomplete { object_id: u32, reason: String },

    /// Caller-supplied table name not present in the catalog.
    #[error("unknown table '{name}'")]
    UnknownTable { name: String },

    /// A cancellation signal was observed between page boundaries.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn corrupt_page(page: PageId, reason: impl Into<String>) -> Self {
        Error::CorruptPage {
            page,
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt_index(page: PageId, reason: impl Into<String>) -> Self {
        Error::CorruptIndex {
            page,
            reason: reason.into(),
        }
    }

    pub(crate) fn iam_chain(page: PageId, reason: impl Into<String>) -> Self {
        Error::IamChainBroken {
            page,
            reason: reason.into(),
        }
    }

    pub(crate) fn schema(object_id: u32, reason: impl Into<String>) -> Self {
        Error::SchemaIncomplete {
            object_id,
            reason: reason.into(),
        }
    }
}
