//! # Schema Builder
//!
//! Rebuilds [`TableSchema`] descriptors from the catalogs:
//!
//! 1. Enumerate `sysschobjs` rows with kind `"U "`.
//! 2. Collect each table's `syscolpars` rows, ordered by `colid`, and resolve
//!    scalar types through `sysscalartypes` by `utype`.
//! 3. Resolve the clustered index (`sysidxstats` index id 1) and its key
//!    columns (`sysiscols` ordered by key ordinal, direction from the status
//!    bit), and the geography index (`sysidxstats` type 4) rooted in the
//!    allocation unit owned by its rowset id.
//!
//! A table whose catalog references are incomplete is skipped with a warning;
//! the remaining tables still build. Rebuilding from the same pages is
//! deterministic, so two opens of one file yield equal schemas.

use std::sync::Arc;

use hashbrown::HashMap;
use tracing::{debug, warn};

use crate::catalog::{
    AllocType, CatalogReader, SysColParsRow, SysIdxStatsRow, SysIsColsRow, SysObj,
    SysScalarTypesRow, SysSchObjsRow,
};
use crate::error::{Error, Result};
use crate::pages::PageId;
use crate::schema::{
    ClusterIndex, Column, IndexColumn, SortOrder, SpatialIndex, UserTable,
};
use crate::types::{decode_utf16le, ScalarType};

/// One rebuilt table: the column layout plus its index descriptors and heap
/// anchors.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub table: Arc<UserTable>,
    pub cluster: Option<ClusterIndex>,
    pub spatial: Option<SpatialIndex>,
    /// Root page of the in-row allocation unit (clustered root or heap first
    /// page path).
    pub root: Option<PageId>,
    /// First IAM page of the in-row allocation unit, for heap scans.
    pub first_iam: Option<PageId>,
}

struct ColInfo {
    colid: u32,
    name: String,
    xtype: ScalarType,
    utype: u32,
    length: i16,
}

fn var_name(row: &crate::pages::RowView<'_>, page: PageId) -> Result<String> {
    if row.var_count() == 0 {
        return Ok(String::new());
    }
    let (bytes, _) = row.var_bytes(0, page)?;
    Ok(decode_utf16le(bytes))
}

/// Reads every user table out of the catalogs. Tables that fail to resolve
/// are reported in the second list and skipped.
pub fn build_schemas(reader: &CatalogReader<'_>) -> Result<(Vec<TableSchema>, Vec<Error>)> {
    // scalar types by id
    let mut scalars: HashMap<u32, ScalarType> = HashMap::new();
    for row in reader.catalog_rows::<SysScalarTypesRow>(SysObj::SysScalarTypes)? {
        let (row, _) = row?;
        scalars.insert(row.id(), row.xtype());
    }

    // columns grouped by object id
    let mut columns: HashMap<u32, Vec<ColInfo>> = HashMap::new();
    for row in reader.catalog_rows::<SysColParsRow>(SysObj::SysColPars)? {
        let (row, view) = row?;
        columns.entry(row.object_id()).or_default().push(ColInfo {
            colid: row.colid(),
            name: var_name(&view, PageId::NULL)?,
            xtype: row.xtype(),
            utype: row.utype(),
            length: row.length(),
        });
    }

    // indexes grouped by object id
    let mut indexes: HashMap<u32, Vec<(SysIdxStatsRow, String)>> = HashMap::new();
    for row in reader.catalog_rows::<SysIdxStatsRow>(SysObj::SysIdxStats)? {
        let (row, view) = row?;
        let name = var_name(&view, PageId::NULL)?;
        indexes.entry(row.object_id()).or_default().push((*row, name));
    }

    // index key columns grouped by (object id, index id)
    let mut key_columns: HashMap<(u32, u32), Vec<SysIsColsRow>> = HashMap::new();
    for row in reader.catalog_rows::<SysIsColsRow>(SysObj::SysIsCols)? {
        let (row, _) = row?;
        key_columns
            .entry((row.object_id(), row.indid()))
            .or_default()
            .push(*row);
    }

    let mut tables = Vec::new();
    let mut failures = Vec::new();
    for row in reader.catalog_rows::<SysSchObjsRow>(SysObj::SysSchObjs)? {
        let (row, view) = row?;
        if !row.is_user_table() {
            continue;
        }
        let name = var_name(&view, PageId::NULL)?;
        match build_table(
            reader,
            row.id(),
            name.clone(),
            &scalars,
            &mut columns,
            &indexes,
            &key_columns,
        ) {
            Ok(schema) => {
                debug!(table = %name, id = row.id(), "schema built");
                tables.push(schema);
            }
            Err(e) => {
                warn!(table = %name, id = row.id(), error = %e, "schema skipped");
                failures.push(e);
            }
        }
    }
    Ok((tables, failures))
}

#[allow(clippy::too_many_arguments)]
fn build_table(
    reader: &CatalogReader<'_>,
    object_id: u32,
    name: String,
    scalars: &HashMap<u32, ScalarType>,
    columns: &mut HashMap<u32, Vec<ColInfo>>,
    indexes: &HashMap<u32, Vec<(SysIdxStatsRow, String)>>,
    key_columns: &HashMap<(u32, u32), Vec<SysIsColsRow>>,
) -> Result<TableSchema> {
    let mut cols = columns
        .remove(&object_id)
        .ok_or_else(|| Error::schema(object_id, "no syscolpars rows"))?;
    cols.sort_by_key(|c| c.colid);

    let mut built = Vec::with_capacity(cols.len());
    for col in cols {
        let scalar = *scalars
            .get(&col.utype)
            .ok_or_else(|| {
                Error::schema(
                    object_id,
                    format!("column '{}' references missing type {}", col.name, col.utype),
                )
            })?;
        // syscolpars carries the xtype too; a mismatch means the catalogs
        // disagree with each other
        if scalar != col.xtype && col.xtype != ScalarType::None {
            return Err(Error::schema(
                object_id,
                format!(
                    "column '{}' xtype {:?} disagrees with scalar type {:?}",
                    col.name, col.xtype, scalar
                ),
            ));
        }
        built.push(Column {
            name: col.name,
            colid: col.colid,
            scalar,
            length: col.length,
            utype: col.utype,
        });
    }
    let table = Arc::new(UserTable::new(object_id, name, built));

    let empty = Vec::new();
    let table_indexes = indexes.get(&object_id).unwrap_or(&empty);

    let mut cluster = None;
    let mut spatial = None;
    for (idx, idx_name) in table_indexes {
        if idx.is_clustered() {
            let root = reader.find_root(object_id as u64).ok_or_else(|| {
                Error::schema(object_id, "clustered index without in-row allocation unit")
            })?;
            let keys = resolve_key_columns(object_id, idx.indid(), &table, key_columns)?;
            cluster = Some(ClusterIndex::new(idx_name.clone(), root, keys));
        } else if idx.is_spatial() {
            let root = reader.find_root(idx.rowset()).ok_or_else(|| {
                Error::schema(
                    object_id,
                    format!("spatial index rowset {} has no allocation unit", idx.rowset()),
                )
            })?;
            let geo_column = table
                .columns()
                .iter()
                .position(|c| c.scalar == ScalarType::Geography)
                .ok_or_else(|| Error::schema(object_id, "spatial index without geography column"))?;
            spatial = Some(SpatialIndex {
                name: idx_name.clone(),
                root,
                rowset: idx.rowset(),
                geo_column,
            });
        }
    }

    let allocs = reader.find_sysalloc(object_id as u64, AllocType::InRow);
    let root = allocs
        .first()
        .map(|a| a.pgroot())
        .filter(|id| !id.is_null());
    let first_iam = allocs
        .first()
        .map(|a| a.pgfirstiam())
        .filter(|id| !id.is_null());

    Ok(TableSchema {
        table,
        cluster,
        spatial,
        root,
        first_iam,
    })
}

fn resolve_key_columns(
    object_id: u32,
    indid: u32,
    table: &UserTable,
    key_columns: &HashMap<(u32, u32), Vec<SysIsColsRow>>,
) -> Result<Vec<IndexColumn>> {
    let mut rows = key_columns
        .get(&(object_id, indid))
        .cloned()
        .ok_or_else(|| Error::schema(object_id, "clustered index without sysiscols rows"))?;
    rows.sort_by_key(|r| r.key_ordinal());

    let mut keys = Vec::with_capacity(rows.len());
    for row in rows {
        let column = table.find_colid(row.colid()).ok_or_else(|| {
            Error::schema(
                object_id,
                format!("index key references missing column {}", row.colid()),
            )
        })?;
        let col = &table.columns()[column];
        let sub_key_length = col.fixed_size().ok_or_else(|| {
            Error::schema(
                object_id,
                format!("index key column '{}' is not fixed-size", col.name),
            )
        })?;
        keys.push(IndexColumn {
            column,
            scalar: col.scalar,
            order: if row.is_descending() {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            },
            sub_key_length,
        });
    }
    if keys.is_empty() {
        return Err(Error::schema(object_id, "clustered index with no key columns"));
    }
    Ok(keys)
}
