//! # Index Tree Navigator
//!
//! [`IndexTree`] descends from a root index page to the leaf (data) level and
//! walks the leaf sibling chain in either direction. The tree is restartable:
//! it holds only the root id and the key comparator, never iteration state.

use std::cmp::Ordering;

use tracing::trace;

use crate::error::{Error, Result};
use crate::index::KeyComparator;
use crate::pages::{validate_page, PageHeader, PageId, PageType, SlotArray};
use crate::storage::PageStore;

/// View over one index page: sorted `(key, child)` rows.
#[derive(Debug, Clone, Copy)]
pub struct IndexPage<'a> {
    header: &'a PageHeader,
    slots: SlotArray<'a>,
    key_length: usize,
}

impl<'a> IndexPage<'a> {
    pub fn new(page: &'a [u8], header: &'a PageHeader, key_length: usize) -> Result<Self> {
        if header.page_type() != PageType::Index {
            return Err(Error::corrupt_index(
                header.page_id(),
                format!("expected index page, found {:?}", header.page_type()),
            ));
        }
        Ok(Self {
            header,
            slots: SlotArray::new(page, header),
            key_length,
        })
    }

    pub fn header(&self) -> &'a PageHeader {
        self.header
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn row(&self, i: usize) -> Result<&'a [u8]> {
        let bytes = self.slots.row_bytes(i)?;
        let need = 1 + self.key_length + size_of::<PageId>();
        if bytes.len() < need {
            return Err(Error::corrupt_index(
                self.header.page_id(),
                format!("index row {} shorter than {} bytes", i, need),
            ));
        }
        Ok(&bytes[..need])
    }

    /// Key bytes of slot `i`.
    pub fn key(&self, i: usize) -> Result<&'a [u8]> {
        Ok(&self.row(i)?[1..1 + self.key_length])
    }

    /// Child page of slot `i`.
    pub fn child(&self, i: usize) -> Result<PageId> {
        let row = self.row(i)?;
        let at = 1 + self.key_length;
        Ok(PageId::new(
            u16::from_le_bytes([row[at + 4], row[at + 5]]),
            u32::from_le_bytes([row[at], row[at + 1], row[at + 2], row[at + 3]]),
        ))
    }

    /// Slot 0 of the leftmost page of a level holds the −∞ key.
    pub fn slot_is_neg_infinity(&self, i: usize) -> bool {
        i == 0 && self.header.prev_page().is_null()
    }

    /// Rightmost slot whose key is `≤ key` (binary search); slot 0 when even
    /// the first comparable key is greater.
    pub fn find_slot(&self, key: &[u8], cmp: &KeyComparator) -> Result<usize> {
        let mut lo = 0usize;
        let mut hi = self.len();
        // invariant: every slot < lo is <= key, every slot >= hi is > key
        while lo < hi {
            let mid = (lo + hi) / 2;
            let le = if self.slot_is_neg_infinity(mid) {
                true
            } else {
                cmp.compare(self.key(mid)?, key) != Ordering::Greater
            };
            if le {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(lo.saturating_sub(1))
    }
}

/// A root-anchored navigator over one B-tree.
#[derive(Debug, Clone)]
pub struct IndexTree<'a> {
    store: &'a PageStore,
    root: PageId,
    comparator: KeyComparator,
}

impl<'a> IndexTree<'a> {
    pub fn new(store: &'a PageStore, root: PageId, comparator: KeyComparator) -> Self {
        Self {
            store,
            root,
            comparator,
        }
    }

    pub fn root(&self) -> PageId {
        self.root
    }

    pub fn comparator(&self) -> &KeyComparator {
        &self.comparator
    }

    fn load_header(&self, id: PageId) -> Result<(&'a [u8], &'a PageHeader)> {
        let page = self.store.load_by_id(id)?;
        let header = validate_page(page)?;
        Ok((page, header))
    }

    /// Descends to the leaf data page that would contain `key`.
    pub fn find_leaf(&self, key: &[u8]) -> Result<PageId> {
        self.descend(|page| page.find_slot(key, &self.comparator))
    }

    /// Leftmost leaf of the tree.
    pub fn begin_leaf(&self) -> Result<PageId> {
        self.descend(|_| Ok(0))
    }

    /// Rightmost leaf of the tree.
    pub fn end_leaf(&self) -> Result<PageId> {
        self.descend(|page| Ok(page.len() - 1))
    }

    fn descend<F>(&self, mut pick: F) -> Result<PageId>
    where
        F: FnMut(&IndexPage<'a>) -> Result<usize>,
    {
        let mut current = self.root;
        let mut last_level: Option<u8> = None;
        loop {
            let (page, header) = self.load_header(current)?;
            match header.page_type() {
                PageType::Data => {
                    // the root itself may be a single data page
                    return Ok(current);
                }
                PageType::Index => {}
                other => {
                    return Err(Error::corrupt_index(
                        current,
                        format!("descent reached {:?} page", other),
                    ));
                }
            }
            if let Some(level) = last_level {
                if header.level() + 1 != level {
                    return Err(Error::corrupt_index(
                        current,
                        format!("child level {} under parent level {}", header.level(), level),
                    ));
                }
            }
            let index = IndexPage::new(page, header, self.comparator.key_length())?;
            if index.is_empty() {
                return Err(Error::corrupt_index(current, "empty index page"));
            }
            let slot = pick(&index)?;
            let child = index.child(slot)?;
            if child.is_null() {
                return Err(Error::corrupt_index(current, "null child pointer"));
            }
            trace!(page = %current, slot, child = %child, "index descent");
            if header.level() <= 1 {
                // children are the leaf data pages
                let (_, child_header) = self.load_header(child)?;
                if child_header.page_type() != PageType::Data || !child_header.is_leaf() {
                    return Err(Error::corrupt_index(
                        child,
                        format!(
                            "leaf pointer resolves to {:?} level {}",
                            child_header.page_type(),
                            child_header.level()
                        ),
                    ));
                }
                return Ok(child);
            }
            last_level = Some(header.level());
            current = child;
        }
    }

    /// Follows the leaf-level `next_page` pointer; `None` at chain end.
    pub fn next_leaf(&self, leaf: PageId) -> Result<Option<PageId>> {
        self.sibling(leaf, |h| h.next_page())
    }

    /// Follows the leaf-level `prev_page` pointer; `None` at chain end.
    pub fn prev_leaf(&self, leaf: PageId) -> Result<Option<PageId>> {
        self.sibling(leaf, |h| h.prev_page())
    }

    fn sibling<F>(&self, leaf: PageId, pick: F) -> Result<Option<PageId>>
    where
        F: Fn(&PageHeader) -> PageId,
    {
        let (_, header) = self.load_header(leaf)?;
        let next = pick(header);
        if next.is_null() {
            return Ok(None);
        }
        let (_, next_header) = self.load_header(next)?;
        if next_header.is_null()
            || next_header.level() != header.level()
            || next_header.page_type() != header.page_type()
        {
            return Err(Error::corrupt_index(
                next,
                format!(
                    "sibling of {} resolves to {:?} level {}",
                    leaf,
                    next_header.page_type(),
                    next_header.level()
                ),
            ));
        }
        Ok(Some(next))
    }

    /// Forward scan of the whole leaf level, restartable from the root.
    pub fn leaves(&self) -> Result<LeafChain<'a, '_>> {
        Ok(LeafChain {
            tree: self,
            next: Some(self.begin_leaf()?),
        })
    }
}

/// Iterator over the leaf page ids of a tree, left to right.
pub struct LeafChain<'a, 't> {
    tree: &'t IndexTree<'a>,
    next: Option<PageId>,
}

impl Iterator for LeafChain<'_, '_> {
    type Item = Result<PageId>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        match self.tree.next_leaf(current) {
            Ok(next) => {
                self.next = next;
                Some(Ok(current))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
