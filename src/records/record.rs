//! # Record View
//!
//! Zero-copy column access for one leaf row, parameterized by the table
//! schema. Byte-backed values borrow from the page the row lives on.

use crate::error::{Error, Result};
use crate::pages::{PageId, RowView};
use crate::schema::UserTable;
use crate::types::Value;

#[derive(Debug, Clone, Copy)]
pub struct Record<'a, 't> {
    row: RowView<'a>,
    table: &'t UserTable,
    page: PageId,
}

impl<'a, 't> Record<'a, 't> {
    pub fn new(row: RowView<'a>, table: &'t UserTable, page: PageId) -> Self {
        Self { row, table, page }
    }

    /// Parses the row at `bytes` and binds it to `table`.
    pub fn parse(bytes: &'a [u8], table: &'t UserTable, page: PageId) -> Result<Self> {
        Ok(Self::new(RowView::parse(bytes, page)?, table, page))
    }

    pub fn table(&self) -> &'t UserTable {
        self.table
    }

    pub fn row(&self) -> &RowView<'a> {
        &self.row
    }

    pub fn column_count(&self) -> usize {
        self.table.column_count()
    }

    pub fn is_null(&self, i: usize) -> bool {
        self.row.is_null(i)
    }

    /// Decodes column `i`.
    pub fn column(&self, i: usize) -> Result<Value<'a>> {
        let column = self.table.column(i).ok_or_else(|| {
            Error::corrupt_page(
                self.page,
                format!("column {} of {}", i, self.table.column_count()),
            )
        })?;
        if self.row.is_null(i) {
            return Ok(Value::Null);
        }
        if let Some(size) = column.fixed_size() {
            let offset = self.table.fixed_offset(i);
            let raw = self.row.raw();
            if offset + size > self.row.fixed_len() || offset + size > raw.len() {
                return Err(Error::corrupt_page(
                    self.page,
                    format!(
                        "fixed column '{}' spans {}..{} past fixed portion {}",
                        column.name,
                        offset,
                        offset + size,
                        self.row.fixed_len()
                    ),
                ));
            }
            let bytes = &raw[offset..offset + size];
            Value::decode_fixed(column.scalar, bytes).ok_or_else(|| {
                Error::corrupt_page(
                    self.page,
                    format!("undecodable fixed column '{}'", column.name),
                )
            })
        } else {
            let v = self.table.var_offset(i);
            if v >= self.row.var_count() {
                // a row written before the column was added stores fewer
                // variable columns; absent means NULL
                return Ok(Value::Null);
            }
            let (bytes, complex) = self.row.var_bytes(v, self.page)?;
            Ok(Value::decode_variable(column.scalar, bytes, complex))
        }
    }

    /// Decodes every column in order.
    pub fn values(&self) -> Result<Vec<Value<'a>>> {
        (0..self.column_count()).map(|i| self.column(i)).collect()
    }

    /// Concatenated raw key bytes for the given index columns, used to probe
    /// the clustered tree. Only fixed key columns participate in keys.
    pub fn key_bytes(&self, key_columns: &[crate::schema::IndexColumn]) -> Result<Vec<u8>> {
        let mut key = Vec::new();
        for k in key_columns {
            let column = &self.table.columns()[k.column];
            let size = column.fixed_size().ok_or_else(|| {
                Error::schema(self.table.id(), "variable-size index key column")
            })?;
            let offset = self.table.fixed_offset(k.column);
            let raw = self.row.raw();
            if offset + size > raw.len() {
                return Err(Error::corrupt_page(self.page, "key column past row end"));
            }
            key.extend_from_slice(&raw[offset..offset + size]);
        }
        Ok(key)
    }
}
