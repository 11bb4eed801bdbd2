//! # mdfread - Read-Only Database File Engine
//!
//! mdfread parses and navigates 8 KiB page-structured database files:
//! it rebuilds the logical schema from the system catalogs, decodes records
//! through clustered indexes and heaps, and answers geographic range queries
//! against a Hilbert-grid spatial index. The engine never writes.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mdfread::Database;
//!
//! let db = Database::open("./geodata.mdf")?;
//! for table in db.tables()? {
//!     println!("{}", table.table.name());
//! }
//!
//! let places = db.datatable("places")?;
//! for row in places.rows()? {
//!     let row = row?;
//!     println!("{:?}", row.column(0));
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │       Public API (Database)         │
//! ├──────────────────┬──────────────────┤
//! │  Schema Builder  │  Spatial Query   │
//! ├──────────────────┼──────────────────┤
//! │  Catalog Reader  │  Cell Set/Grid   │
//! ├──────────────────┴──────────────────┤
//! │  B-Tree Navigator │ IAM Walker      │
//! ├─────────────────────────────────────┤
//! │  Typed Pages / Records              │
//! ├─────────────────────────────────────┤
//! │  Page Store (read-only mmap)        │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: memory-mapped page files, `(file, page)` resolution
//! - [`pages`]: page headers, slot arrays, rows, IAM, boot and PFS views
//! - [`catalog`]: system catalog layouts and the allocation-unit reader
//! - [`index`]: B-tree descent and leaf sibling chains
//! - [`schema`]: user table, column and index reconstruction
//! - [`records`]: leaf-row column decoding
//! - [`spatial`]: projection, Hilbert cells, cell sets, range queries
//! - [`database`]: the public facade tying the layers together
//!
//! ## Concurrency
//!
//! Everything observable is immutable after open: pages come from a
//! read-only mapping and schemas build once behind a lock. Shared references
//! to one [`Database`] are safe across threads; scans are independent
//! cursors. Long scans take a [`CancelToken`] checked at page boundaries.

pub mod catalog;
pub mod database;
pub mod error;
pub mod index;
pub mod pages;
pub mod records;
pub mod schema;
pub mod spatial;
pub mod storage;
pub mod types;

pub use database::{CancelToken, Database, DataTable, Row, SpatialScan, TableScan};
pub use error::{Error, Result};
pub use spatial::{SpatialCell, SpatialPoint};
pub use types::Value;
