//! # Catalog Reader
//!
//! Bootstraps the catalog from the boot page and materializes allocation-unit
//! lookups:
//!
//! 1. Page 9 → `first_sys_indexes` → the `sysallocunits` page chain.
//! 2. `find_sysalloc(object_id, alloc_type)` scans that chain for rows whose
//!    `ownerid` matches.
//! 3. Catalog tables are then read through their in-row allocation unit:
//!    `pgfirst` anchors a [`PageChain`] of data pages.
//! 4. `find_datapage` walks the IAM chains of the matching allocation units
//!    and yields the pages whose header carries the requested type.
//!
//! The `sysallocunits` scan is cached per reader; everything else is lazy
//! and borrows pages straight from the store.

use tracing::debug;

use crate::catalog::{AllocType, SysAllocUnitsRow, SysObj};
use crate::error::{Error, Result};
use crate::pages::{
    validate_page, BootPage, DataPage, FixedRow, IamChain, PageId, PageType, RowView,
};
use crate::storage::{PageStore, BOOT_PAGE};

/// Follows a `next_page` chain of same-object pages, yielding [`DataPage`]
/// views. Restartable from its head page id.
pub struct PageChain<'a> {
    store: &'a PageStore,
    next: Option<PageId>,
    expect_type: PageType,
}

impl<'a> PageChain<'a> {
    pub fn new(store: &'a PageStore, head: PageId, expect_type: PageType) -> Self {
        Self {
            store,
            next: if head.is_null() { None } else { Some(head) },
            expect_type,
        }
    }

    fn load(&mut self, id: PageId) -> Result<DataPage<'a>> {
        let store = self.store;
        let page = store.load_by_id(id)?;
        let header = validate_page(page)?;
        if header.page_type() != self.expect_type {
            return Err(Error::corrupt_page(
                id,
                format!(
                    "expected {:?} page in chain, found {:?}",
                    self.expect_type,
                    header.page_type()
                ),
            ));
        }
        let next = header.next_page();
        self.next = if next.is_null() { None } else { Some(next) };
        Ok(DataPage::new(page, header))
    }
}

impl<'a> Iterator for PageChain<'a> {
    type Item = Result<DataPage<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        match self.load(id) {
            Ok(page) => Some(Ok(page)),
            Err(e) => {
                self.next = None;
                Some(Err(e))
            }
        }
    }
}

/// Typed row iteration across a whole catalog page chain.
pub struct CatalogPages<'a, T> {
    chain: PageChain<'a>,
    object_id: u32,
    current: Option<crate::pages::TypedRowIter<'a, T>>,
}

impl<'a, T: FixedRow> Iterator for CatalogPages<'a, T> {
    type Item = Result<(&'a T, RowView<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(rows) = &mut self.current {
                if let Some(item) = rows.next() {
                    return Some(item);
                }
                self.current = None;
            }
            match self.chain.next()? {
                Ok(page) => match page.typed_rows::<T>(Some(self.object_id)) {
                    Ok(rows) => self.current = Some(rows),
                    Err(e) => return Some(Err(e)),
                },
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

pub struct CatalogReader<'a> {
    store: &'a PageStore,
    sysalloc: Vec<SysAllocUnitsRow>,
}

impl<'a> CatalogReader<'a> {
    /// Opens the boot page and scans the `sysallocunits` chain once.
    pub fn open(store: &'a PageStore) -> Result<Self> {
        let boot_bytes = store.load(BOOT_PAGE)?;
        let boot_header = validate_page(boot_bytes)?;
        let boot = BootPage::new(boot_bytes, boot_header)?;
        let first = boot.first_sys_indexes();
        debug!(dbname = %boot.dbname(), sysallocunits = %first, "catalog bootstrap");

        let mut sysalloc = Vec::new();
        let chain = PageChain::new(store, first, PageType::Data);
        for page in chain {
            let page = page?;
            for row in page.typed_rows::<SysAllocUnitsRow>(None)? {
                let (row, _) = row?;
                sysalloc.push(*row);
            }
        }
        debug!(allocation_units = sysalloc.len(), "sysallocunits scanned");
        Ok(Self { store, sysalloc })
    }

    pub fn store(&self) -> &'a PageStore {
        self.store
    }

    /// All allocation-unit rows for `(ownerid, alloc_type)`.
    pub fn find_sysalloc(&self, ownerid: u64, alloc_type: AllocType) -> Vec<&SysAllocUnitsRow> {
        self.sysalloc
            .iter()
            .filter(|row| row.ownerid() == ownerid && row.alloc_type() == alloc_type as u8)
            .collect()
    }

    /// Pages of the matching allocation units whose header type equals
    /// `page_type`, collected by walking the IAM chains.
    pub fn find_datapage(
        &self,
        ownerid: u64,
        alloc_type: AllocType,
        page_type: PageType,
    ) -> Result<Vec<PageId>> {
        let mut pages = Vec::new();
        for alloc in self.find_sysalloc(ownerid, alloc_type) {
            for id in IamChain::new(self.store, alloc.pgfirstiam()) {
                let id = id?;
                let page = self.store.load_by_id(id)?;
                let header = validate_page(page)?;
                if header.page_type() == page_type {
                    pages.push(id);
                }
            }
        }
        Ok(pages)
    }

    /// Typed rows of a system catalog, across its whole in-row page chain.
    pub fn catalog_rows<T: FixedRow>(&self, obj: SysObj) -> Result<CatalogPages<'a, T>> {
        let object_id = obj as u32;
        let alloc = self
            .find_sysalloc(object_id as u64, AllocType::InRow)
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::schema(object_id, "no in-row allocation unit for system catalog")
            })?;
        Ok(CatalogPages {
            chain: PageChain::new(self.store, alloc.pgfirst(), PageType::Data),
            object_id,
            current: None,
        })
    }

    /// The clustered/heap root page of the allocation unit owned by
    /// `ownerid`, when one exists.
    pub fn find_root(&self, ownerid: u64) -> Option<PageId> {
        self.find_sysalloc(ownerid, AllocType::InRow)
            .first()
            .map(|row| row.pgroot())
            .filter(|id| !id.is_null())
    }
}
