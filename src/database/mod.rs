//! # Database Facade
//!
//! [`Database`] owns the mapped file set and exposes the public read surface:
//! schema enumeration, table scans, point lookups through the clustered
//! index, and spatial range lookups through the geography index.
//!
//! ## Lifecycle
//!
//! Opening maps the primary file and validates the boot page. The schema
//! cache builds lazily on first use behind a `parking_lot::RwLock` and is
//! immutable afterwards, so any number of threads can read one open database
//! concurrently; page bytes themselves are immutable from open to close.
//!
//! ## Cancellation
//!
//! Long scans accept a [`CancelToken`]. The token is checked between page
//! boundaries; once observed, the scan yields `Cancelled` and fuses.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use hashbrown::HashSet;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::catalog::CatalogReader;
use crate::error::{Error, Result};
use crate::index::{IndexTree, KeyComparator, KeyKind, KeyPart};
use crate::pages::{validate_page, BootPage, DataPage, PageId, PageType};
use crate::records::Record;
use crate::schema::TableSchema;
use crate::spatial::query::{cell_range, within_distance};
use crate::spatial::transform::EarthModel;
use crate::spatial::{CellSet, GeoPoint, SpatialCell, SpatialGrid, SpatialPoint, SpatialRow};
use crate::storage::{PageStore, BOOT_PAGE};
use crate::types::{GeoTag, Value};

/// Shareable cancellation signal for long-running scans.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, AtomicOrdering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(AtomicOrdering::Relaxed)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

fn check_cancel(token: Option<&CancelToken>) -> Result<()> {
    match token {
        Some(t) => t.check(),
        None => Ok(()),
    }
}

/// Open options: earth model for spatial math and per-load validation.
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    path: Option<std::path::PathBuf>,
    ellipsoid: bool,
}

impl DatabaseBuilder {
    pub fn path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use the latitude-interpolated ellipsoid radius for distances.
    pub fn ellipsoid(mut self, on: bool) -> Self {
        self.ellipsoid = on;
        self
    }

    pub fn open(self) -> Result<Database> {
        let path = self.path.ok_or_else(|| Error::FileUnavailable {
            path: String::new(),
            reason: "no path given".into(),
        })?;
        Database::open_with(
            path,
            if self.ellipsoid {
                EarthModel::Ellipsoid
            } else {
                EarthModel::Sphere
            },
        )
    }
}

struct SchemaCache {
    tables: Vec<Arc<TableSchema>>,
    failures: Vec<Error>,
}

pub struct Database {
    store: PageStore,
    model: EarthModel,
    dbname: String,
    schemas: RwLock<Option<Arc<SchemaCache>>>,
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::default()
    }

    /// Opens a single-file database with the default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, EarthModel::Sphere)
    }

    fn open_with<P: AsRef<Path>>(path: P, model: EarthModel) -> Result<Self> {
        let store = PageStore::open(&path)?;
        let boot_bytes = store.load(BOOT_PAGE)?;
        let boot_header = validate_page(boot_bytes)?;
        let dbname = BootPage::new(boot_bytes, boot_header)?.dbname();
        info!(
            path = %path.as_ref().display(),
            db = %dbname,
            pages = store.page_count(),
            "database opened"
        );
        Ok(Self {
            store,
            model,
            dbname,
            schemas: RwLock::new(None),
        })
    }

    pub fn dbname(&self) -> &str {
        &self.dbname
    }

    pub fn page_count(&self) -> u32 {
        self.store.page_count()
    }

    pub fn store(&self) -> &PageStore {
        &self.store
    }

    pub fn earth_model(&self) -> EarthModel {
        self.model
    }

    fn schema_cache(&self) -> Result<Arc<SchemaCache>> {
        if let Some(cache) = self.schemas.read().as_ref() {
            return Ok(cache.clone());
        }
        let mut slot = self.schemas.write();
        if let Some(cache) = slot.as_ref() {
            return Ok(cache.clone());
        }
        let reader = CatalogReader::open(&self.store)?;
        let (tables, failures) = crate::schema::build_schemas(&reader)?;
        debug!(tables = tables.len(), skipped = failures.len(), "schema cache built");
        let cache = Arc::new(SchemaCache {
            tables: tables.into_iter().map(Arc::new).collect(),
            failures,
        });
        *slot = Some(cache.clone());
        Ok(cache)
    }

    /// All user tables that rebuilt cleanly.
    pub fn tables(&self) -> Result<Vec<Arc<TableSchema>>> {
        Ok(self.schema_cache()?.tables.clone())
    }

    /// Tables whose catalog entries were incomplete, as errors.
    pub fn schema_failures(&self) -> Result<usize> {
        Ok(self.schema_cache()?.failures.len())
    }

    pub fn find_table(&self, name: &str) -> Result<Option<Arc<TableSchema>>> {
        Ok(self
            .schema_cache()?
            .tables
            .iter()
            .find(|t| t.table.name() == name)
            .cloned())
    }

    /// Like [`find_table`](Self::find_table) but an absent name is an error.
    pub fn datatable(&self, name: &str) -> Result<DataTable<'_>> {
        let schema = self.find_table(name)?.ok_or_else(|| Error::UnknownTable {
            name: name.to_string(),
        })?;
        Ok(DataTable { db: self, schema })
    }

    pub fn datatable_of(&self, schema: Arc<TableSchema>) -> DataTable<'_> {
        DataTable { db: self, schema }
    }

    /// Allocation status of a page, from the PFS page covering it.
    pub fn is_allocated(&self, id: PageId) -> Result<bool> {
        let pfs_id = PageId::new(id.file_id(), crate::pages::pfs_page_for(id.page_id()));
        let bytes = self.store.load_by_id(pfs_id)?;
        let header = validate_page(bytes)?;
        let pfs = crate::pages::PfsPage::new(bytes, header)?;
        Ok(pfs.is_allocated(id.page_id()))
    }

    /// Rows of `table` within `radius_meters` of `center`, via the
    /// geography index.
    pub fn spatial_lookup(
        &self,
        table: &str,
        center: SpatialPoint,
        radius_meters: f64,
    ) -> Result<SpatialScan<'_>> {
        self.datatable(table)?
            .spatial_lookup(center, radius_meters, None)
    }
}

/// One decoded row.
#[derive(Debug, Clone)]
pub struct Row<'a> {
    values: Vec<Value<'a>>,
    page: PageId,
    slot: usize,
}

impl<'a> Row<'a> {
    pub fn column(&self, i: usize) -> &Value<'a> {
        &self.values[i]
    }

    pub fn values(&self) -> &[Value<'a>] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value<'a>> {
        self.values
    }

    /// Identity of the page/slot the row came from.
    pub fn location(&self) -> (PageId, usize) {
        (self.page, self.slot)
    }
}

/// Scannable handle over one table.
pub struct DataTable<'a> {
    db: &'a Database,
    schema: Arc<TableSchema>,
}

impl<'a> DataTable<'a> {
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Lazy forward scan of every row: the clustered leaf chain when the
    /// table has one, otherwise the heap's IAM pages.
    pub fn rows(&self) -> Result<TableScan<'a>> {
        self.rows_with(None)
    }

    pub fn rows_with(&self, cancel: Option<CancelToken>) -> Result<TableScan<'a>> {
        let source = match (&self.schema.cluster, self.schema.first_iam) {
            (Some(cluster), _) => {
                let tree = IndexTree::new(
                    &self.db.store,
                    cluster.root(),
                    cluster.comparator(),
                );
                let first = tree.begin_leaf()?;
                self.db.store.prefetch(first, 64);
                ScanSource::Chain(Some(first))
            }
            (None, Some(first_iam)) => {
                // heap pages are unordered; the IAM chain is the page list
                let mut pages = Vec::new();
                for id in crate::pages::IamChain::new(&self.db.store, first_iam) {
                    let id = id?;
                    let header = validate_page(self.db.store.load_by_id(id)?)?;
                    if header.page_type() == PageType::Data {
                        pages.push(id);
                    }
                }
                ScanSource::List(pages, 0)
            }
            (None, None) => ScanSource::Chain(None),
        };
        Ok(TableScan {
            db: self.db,
            schema: self.schema.clone(),
            source,
            slot: 0,
            cancel,
            done: false,
        })
    }

    /// Point lookup through the clustered index by raw key bytes.
    pub fn find_row(&self, key: &[u8]) -> Result<Option<Row<'a>>> {
        let cluster = self.schema.cluster.as_ref().ok_or_else(|| {
            Error::schema(self.schema.table.id(), "point lookup requires a clustered index")
        })?;
        let comparator = cluster.comparator();
        let tree = IndexTree::new(&self.db.store, cluster.root(), comparator.clone());
        let leaf = tree.find_leaf(key)?;
        let page_bytes = self.db.store.load_by_id(leaf)?;
        let header = validate_page(page_bytes)?;
        let page = DataPage::new(page_bytes, header);
        for slot in 0..page.slots().len() {
            let view = page.row(slot)?;
            let record = Record::new(view, &self.schema.table, leaf);
            let row_key = record.key_bytes(cluster.columns())?;
            match comparator.compare(&row_key, key) {
                std::cmp::Ordering::Less => continue,
                std::cmp::Ordering::Equal => {
                    return Ok(Some(Row {
                        values: record.values()?,
                        page: leaf,
                        slot,
                    }));
                }
                std::cmp::Ordering::Greater => return Ok(None),
            }
        }
        Ok(None)
    }

    /// Spatial range lookup; requires a geography index on the table.
    pub fn spatial_lookup(
        &self,
        center: SpatialPoint,
        radius_meters: f64,
        cancel: Option<CancelToken>,
    ) -> Result<SpatialScan<'a>> {
        let spatial = self.schema.spatial.as_ref().ok_or_else(|| {
            Error::schema(self.schema.table.id(), "table has no spatial index")
        })?;
        if self.schema.cluster.is_none() {
            return Err(Error::schema(
                self.schema.table.id(),
                "spatial lookup requires a clustered primary key",
            ));
        }
        let mut cells = CellSet::new();
        cell_range(
            &mut cells,
            center,
            radius_meters,
            SpatialGrid::default(),
            self.db.model,
        );
        let cover = cells.cells();
        debug!(
            table = %self.schema.table.name(),
            cover = cover.len(),
            "spatial lookup cover computed"
        );
        Ok(SpatialScan {
            db: self.db,
            schema: self.schema.clone(),
            spatial_root: spatial.root,
            geo_column: spatial.geo_column,
            center,
            radius_meters,
            cover,
            cover_idx: 0,
            leaf: None,
            slot: 0,
            seen: HashSet::new(),
            cancel,
            done: false,
        })
    }
}

enum ScanSource {
    /// Leaf sibling chain: current page, advanced through `next_page`.
    Chain(Option<PageId>),
    /// Materialized heap page list and cursor.
    List(Vec<PageId>, usize),
}

impl ScanSource {
    fn current(&self) -> Option<PageId> {
        match self {
            ScanSource::Chain(id) => *id,
            ScanSource::List(pages, i) => pages.get(*i).copied(),
        }
    }

    fn step(&mut self, next_in_chain: PageId) {
        match self {
            ScanSource::Chain(id) => {
                *id = if next_in_chain.is_null() {
                    None
                } else {
                    Some(next_in_chain)
                };
            }
            ScanSource::List(_, i) => *i += 1,
        }
    }
}

/// Lazy row iterator over a table scan.
pub struct TableScan<'a> {
    db: &'a Database,
    schema: Arc<TableSchema>,
    source: ScanSource,
    slot: usize,
    cancel: Option<CancelToken>,
    done: bool,
}

impl<'a> TableScan<'a> {
    fn advance(&mut self) -> Result<Option<Row<'a>>> {
        loop {
            let Some(page_id) = self.source.current() else {
                return Ok(None);
            };
            let bytes = self.db.store.load_by_id(page_id)?;
            let header = validate_page(bytes)?;
            if header.page_type() != PageType::Data {
                return Err(Error::corrupt_page(
                    page_id,
                    format!("table scan reached {:?} page", header.page_type()),
                ));
            }
            let page = DataPage::new(bytes, header);
            if self.slot < page.slots().len() {
                let slot = self.slot;
                self.slot += 1;
                let view = page.row(slot)?;
                let record = Record::new(view, &self.schema.table, page_id);
                return Ok(Some(Row {
                    values: record.values()?,
                    page: page_id,
                    slot,
                }));
            }
            // page exhausted
            check_cancel(self.cancel.as_ref())?;
            self.source.step(header.next_page());
            self.slot = 0;
        }
    }
}

impl<'a> Iterator for TableScan<'a> {
    type Item = Result<Row<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn spatial_comparator() -> KeyComparator {
    KeyComparator::new([
        KeyPart::new(KeyKind::Bytes, 5),
        KeyPart::new(KeyKind::BigInt, 8),
    ])
}

/// Lazy row iterator over a spatial range lookup: walks the cover cells,
/// seeks each prefix range in the spatial B-tree, and resolves candidate
/// primary keys through the clustered index with a final distance check.
pub struct SpatialScan<'a> {
    db: &'a Database,
    schema: Arc<TableSchema>,
    spatial_root: PageId,
    geo_column: usize,
    center: SpatialPoint,
    radius_meters: f64,
    cover: Vec<SpatialCell>,
    cover_idx: usize,
    /// Current leaf page and the high bound of the active cover range.
    leaf: Option<(PageId, [u8; 5])>,
    slot: usize,
    seen: HashSet<i64>,
    cancel: Option<CancelToken>,
    done: bool,
}

impl<'a> SpatialScan<'a> {
    fn seek_next_cover(&mut self) -> Result<bool> {
        let Some(cell) = self.cover.get(self.cover_idx).copied() else {
            return Ok(false);
        };
        self.cover_idx += 1;
        check_cancel(self.cancel.as_ref())?;

        let lo = cell.range_lo().to_bytes();
        let hi = cell.range_hi().to_bytes();
        let mut probe = Vec::with_capacity(13);
        probe.extend_from_slice(&lo);
        probe.extend_from_slice(&i64::MIN.to_le_bytes());

        let tree = IndexTree::new(&self.db.store, self.spatial_root, spatial_comparator());
        let leaf = tree.find_leaf(&probe)?;
        self.leaf = Some((leaf, hi));
        self.slot = 0;
        Ok(true)
    }

    fn fetch_by_pk(&self, pk0: i64) -> Result<Option<Row<'a>>> {
        let table = DataTable {
            db: self.db,
            schema: self.schema.clone(),
        };
        let cluster = self.schema.cluster.as_ref().ok_or_else(|| {
            Error::schema(
                self.schema.table.id(),
                "spatial lookup requires a clustered primary key",
            )
        })?;
        // the spatial key's pk0 is the leading (single) cluster key column
        let part = cluster.columns()[0];
        let key = match part.sub_key_length {
            8 => pk0.to_le_bytes().to_vec(),
            4 => (pk0 as i32).to_le_bytes().to_vec(),
            other => {
                return Err(Error::schema(
                    self.schema.table.id(),
                    format!("unsupported spatial primary key width {}", other),
                ));
            }
        };
        table.find_row(&key)
    }

    fn row_matches(&self, row: &Row<'a>) -> bool {
        match row.column(self.geo_column) {
            Value::GeoRef(GeoTag::Geography, bytes) => match GeoPoint::parse(bytes) {
                Some(point) => within_distance(
                    self.center,
                    point.point(),
                    self.radius_meters,
                    self.db.model,
                ),
                None => false,
            },
            _ => false,
        }
    }

    fn advance(&mut self) -> Result<Option<Row<'a>>> {
        loop {
            let Some((leaf_id, hi)) = self.leaf else {
                if !self.seek_next_cover()? {
                    return Ok(None);
                }
                continue;
            };

            let bytes = self.db.store.load_by_id(leaf_id)?;
            let header = validate_page(bytes)?;
            let page = DataPage::new(bytes, header);

            if self.slot >= page.slots().len() {
                check_cancel(self.cancel.as_ref())?;
                let next = header.next_page();
                if next.is_null() {
                    self.leaf = None;
                } else {
                    self.leaf = Some((next, hi));
                    self.slot = 0;
                }
                continue;
            }

            let slot = self.slot;
            self.slot += 1;
            let (srow, _) = page.typed_row::<SpatialRow>(slot)?;
            let cell_bytes = srow.cell().to_bytes();
            if cell_bytes > hi {
                // past the cover range: move to the next cover cell
                self.leaf = None;
                continue;
            }
            let lo_cell = self.cover[self.cover_idx - 1];
            if !lo_cell.contains_prefix(&srow.cell()) {
                // before the range start on the first leaf
                continue;
            }
            if !self.seen.insert(srow.pk0()) {
                continue;
            }
            if let Some(row) = self.fetch_by_pk(srow.pk0())? {
                if self.row_matches(&row) {
                    return Ok(Some(row));
                }
            }
        }
    }
}

impl<'a> Iterator for SpatialScan<'a> {
    type Item = Result<Row<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
