//! # Table, Column and Index Descriptors
//!
//! The rebuilt form of one user table. Offsets are laid out the way rows
//! store them: fixed columns get a running byte offset starting right after
//! the 4-byte row head, variable columns get a running index into the row's
//! variable-offset array.

use std::fmt::Write as _;

use crate::index::{KeyComparator, KeyKind, KeyPart};
use crate::pages::{PageId, ROW_HEAD_SIZE};
use crate::types::{ScalarType, VAR_LENGTH_SENTINEL};

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub colid: u32,
    pub scalar: ScalarType,
    /// Declared length; -1 for `varchar(max)`-style columns.
    pub length: i16,
    pub utype: u32,
}

impl Column {
    /// A column is fixed iff its scalar type is in the fixed set and the
    /// declared length is not the variable sentinel.
    pub fn is_fixed(&self) -> bool {
        self.scalar.is_fixed() && self.length != VAR_LENGTH_SENTINEL
    }

    /// Stored width of a fixed column.
    pub fn fixed_size(&self) -> Option<usize> {
        if !self.is_fixed() {
            return None;
        }
        Some(
            self.scalar
                .intrinsic_size()
                .unwrap_or(self.length.max(0) as usize),
        )
    }
}

/// Immutable descriptor of one user table.
#[derive(Debug, Clone)]
pub struct UserTable {
    id: u32,
    name: String,
    columns: Vec<Column>,
    /// Per column: fixed byte offset within the row, or variable index.
    offsets: Vec<usize>,
    fixed_size: usize,
    var_count: usize,
}

impl UserTable {
    pub fn new(id: u32, name: String, columns: Vec<Column>) -> Self {
        let mut offsets = Vec::with_capacity(columns.len());
        let mut offset = ROW_HEAD_SIZE;
        let mut var_index = 0;
        for column in &columns {
            match column.fixed_size() {
                Some(size) => {
                    offsets.push(offset);
                    offset += size;
                }
                None => {
                    offsets.push(var_index);
                    var_index += 1;
                }
            }
        }
        Self {
            id,
            name,
            columns,
            offsets,
            fixed_size: offset - ROW_HEAD_SIZE,
            var_count: var_index,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, i: usize) -> Option<&Column> {
        self.columns.get(i)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn find_colid(&self, colid: u32) -> Option<usize> {
        self.columns.iter().position(|c| c.colid == colid)
    }

    /// Byte offset of fixed column `i` within the row (head included).
    pub fn fixed_offset(&self, i: usize) -> usize {
        debug_assert!(self.columns[i].is_fixed());
        self.offsets[i]
    }

    /// Variable-array index of variable column `i`.
    pub fn var_offset(&self, i: usize) -> usize {
        debug_assert!(!self.columns[i].is_fixed());
        self.offsets[i]
    }

    /// Sum of the fixed column widths.
    pub fn fixed_size(&self) -> usize {
        self.fixed_size
    }

    pub fn count_var(&self) -> usize {
        self.var_count
    }

    pub fn count_fixed(&self) -> usize {
        self.columns.len() - self.var_count
    }

    /// Human-readable schema listing, one line per column.
    pub fn type_schema(&self, cluster: Option<&ClusterIndex>) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "name = {}", self.name);
        let _ = writeln!(out, "id = {} ({:#x})", self.id, self.id);
        let _ = writeln!(out, "columns({})", self.columns.len());
        for (i, c) in self.columns.iter().enumerate() {
            let _ = write!(out, "[{}] {} : {} (", c.colid, c.name, c.scalar.name());
            if c.length == VAR_LENGTH_SENTINEL {
                let _ = write!(out, "var");
            } else {
                let _ = write!(out, "{}", c.length);
            }
            let _ = write!(out, ")");
            if c.is_fixed() {
                let _ = write!(out, " fixed");
            }
            if let Some(ci) = cluster {
                if let Some(pos) = ci.columns().iter().position(|k| k.column == i) {
                    if pos == 0 {
                        let _ = write!(out, " primary key");
                    } else {
                        let _ = write!(out, " index key");
                    }
                }
            }
            let _ = writeln!(out);
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// One key column of a clustered index.
#[derive(Debug, Clone, Copy)]
pub struct IndexColumn {
    /// Index into [`UserTable::columns`].
    pub column: usize,
    pub scalar: ScalarType,
    pub order: SortOrder,
    pub sub_key_length: usize,
}

/// Clustered-index descriptor: the tree root plus the key columns in key
/// order. Doubles as the primary-key description when the clustered index
/// is the primary key (index id 1).
#[derive(Debug, Clone)]
pub struct ClusterIndex {
    name: String,
    root: PageId,
    columns: Vec<IndexColumn>,
    key_length: usize,
}

impl ClusterIndex {
    pub fn new(name: String, root: PageId, columns: Vec<IndexColumn>) -> Self {
        let key_length = columns.iter().map(|c| c.sub_key_length).sum();
        Self {
            name,
            root,
            columns,
            key_length,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> PageId {
        self.root
    }

    pub fn columns(&self) -> &[IndexColumn] {
        &self.columns
    }

    /// Total key length: the sum of sub-key lengths.
    pub fn key_length(&self) -> usize {
        self.key_length
    }

    pub fn comparator(&self) -> KeyComparator {
        KeyComparator::new(self.columns.iter().map(|c| {
            let part = KeyPart::new(KeyKind::from_scalar(c.scalar), c.sub_key_length);
            if c.order == SortOrder::Descending {
                part.descending()
            } else {
                part
            }
        }))
    }
}

/// Geography-index descriptor: the spatial B-tree root and the rowset id
/// that owns its allocation unit.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    pub name: String,
    pub root: PageId,
    pub rowset: u64,
    /// Column index of the geography column the index covers.
    pub geo_column: usize,
}
