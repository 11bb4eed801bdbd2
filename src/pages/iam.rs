//! # IAM Pages and Chain Walking
//!
//! An Index Allocation Map page lists the pages belonging to one allocation
//! unit. It has two slots:
//!
//! - **slot 0** — the IAM header row: a sequence number, the first page id of
//!   the extent interval this page maps, and eight single-page allocation
//!   slots for the unit's first pages (allocated one at a time before the
//!   unit grows to whole extents).
//! - **slot 1** — an extent bitmap. Bit `k` set means the extent of eight
//!   pages starting at `start_page.page + 8k` belongs to the unit.
//!
//! [`IamChain`] walks a chain of IAM pages via the page-header `next_page`
//! link and yields, per page, the non-null single-page entries followed by
//! every page of every set extent. A next pointer that does not resolve to an
//! IAM page of the same object and index yields `IamChainBroken`.

use zerocopy::byteorder::{LittleEndian, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::error::{Error, Result};
use crate::pages::{DataPage, FixedRow, PageHeader, PageId, PageType};
use crate::storage::PageStore;

/// Number of single-page allocation slots in the IAM header row.
pub const IAM_SINGLE_PAGES: usize = 8;

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct IamHeaderRow {
    sequence: U32<LittleEndian>,
    pad1: [u8; 10],
    status: U32<LittleEndian>,
    pad2: [u8; 12],
    start_page: PageId,
    single_pages: [PageId; IAM_SINGLE_PAGES],
}

impl FixedRow for IamHeaderRow {
    const OBJECT_ID: Option<u32> = None;
}

impl IamHeaderRow {
    pub fn sequence(&self) -> u32 {
        self.sequence.get()
    }

    pub fn start_page(&self) -> PageId {
        self.start_page
    }

    pub fn single_page(&self, i: usize) -> PageId {
        self.single_pages[i]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IamPage<'a> {
    header: &'a PageHeader,
    row: &'a IamHeaderRow,
    bitmap: &'a [u8],
}

impl<'a> IamPage<'a> {
    pub fn new(page: &'a [u8], header: &'a PageHeader) -> Result<Self> {
        if header.page_type() != PageType::Iam {
            return Err(Error::corrupt_page(
                header.page_id(),
                format!("expected IAM page, found {:?}", header.page_type()),
            ));
        }
        let data = DataPage::new(page, header);
        if data.slots().len() < 2 {
            return Err(Error::corrupt_page(
                header.page_id(),
                "IAM page must have a header row and a bitmap row",
            ));
        }
        let (row, _) = data.typed_row::<IamHeaderRow>(0)?;
        let bitmap_row = data.row(1)?;
        Ok(Self {
            header,
            row,
            bitmap: bitmap_row.fixed_bytes(),
        })
    }

    pub fn header(&self) -> &'a PageHeader {
        self.header
    }

    pub fn row(&self) -> &'a IamHeaderRow {
        self.row
    }

    /// Number of extents the bitmap covers.
    pub fn extent_count(&self) -> usize {
        self.bitmap.len() * 8
    }

    pub fn extent_is_set(&self, k: usize) -> bool {
        let byte = k / 8;
        byte < self.bitmap.len() && self.bitmap[byte] & (1 << (k % 8)) != 0
    }

    /// First page of extent `k`.
    pub fn extent_page(&self, k: usize) -> PageId {
        let start = self.row.start_page();
        PageId::new(start.file_id(), start.page_id() + (k as u32) * 8)
    }
}

/// Walks an IAM chain, yielding every page id belonging to the allocation
/// unit: single pages first, then extent pages, page by page, following
/// `next_page` until null. Restartable from the chain head.
pub struct IamChain<'a> {
    store: &'a PageStore,
    obj_id: u32,
    index_id: u16,
    state: ChainState<'a>,
}

enum ChainState<'a> {
    /// Next IAM page to load; None once the chain ends.
    Load(Option<PageId>),
    Page {
        iam: IamPage<'a>,
        phase: Phase,
    },
    Failed,
}

enum Phase {
    Single(usize),
    /// (extent index, page-within-extent)
    Extent(usize, u32),
}

impl<'a> IamChain<'a> {
    /// Starts walking from `pgfirstiam`. The first page establishes the
    /// object/index identity subsequent pages must match.
    pub fn new(store: &'a PageStore, first: PageId) -> Self {
        Self {
            store,
            obj_id: 0,
            index_id: 0,
            state: ChainState::Load(if first.is_null() { None } else { Some(first) }),
        }
    }

    fn load(&mut self, id: PageId) -> Result<IamPage<'a>> {
        let page = self.store.load_by_id(id)?;
        let header = crate::pages::validate_page(page)?;
        if header.page_type() != PageType::Iam {
            return Err(Error::iam_chain(
                id,
                format!("chain points at {:?} page", header.page_type()),
            ));
        }
        if self.obj_id == 0 && self.index_id == 0 {
            self.obj_id = header.obj_id();
            self.index_id = header.index_id();
        } else if header.obj_id() != self.obj_id || header.index_id() != self.index_id {
            return Err(Error::iam_chain(
                id,
                format!(
                    "chain crosses from object {}/{} to {}/{}",
                    self.obj_id,
                    self.index_id,
                    header.obj_id(),
                    header.index_id()
                ),
            ));
        }
        IamPage::new(page, header)
    }

    fn advance(&mut self) -> Result<Option<PageId>> {
        loop {
            match &mut self.state {
                ChainState::Failed => return Ok(None),
                ChainState::Load(next) => match next.take() {
                    None => return Ok(None),
                    Some(id) => {
                        let iam = self.load(id)?;
                        self.state = ChainState::Page {
                            iam,
                            phase: Phase::Single(0),
                        };
                    }
                },
                ChainState::Page { iam, phase } => match phase {
                    Phase::Single(i) => {
                        if *i < IAM_SINGLE_PAGES {
                            let id = iam.row().single_page(*i);
                            *i += 1;
                            if !id.is_null() {
                                return Ok(Some(id));
                            }
                        } else {
                            *phase = Phase::Extent(0, 0);
                        }
                    }
                    Phase::Extent(k, within) => {
                        if *k >= iam.extent_count() {
                            let next = iam.header().next_page();
                            self.state =
                                ChainState::Load(if next.is_null() { None } else { Some(next) });
                        } else if !iam.extent_is_set(*k) {
                            *k += 1;
                            *within = 0;
                        } else {
                            let base = iam.extent_page(*k);
                            let id = PageId::new(base.file_id(), base.page_id() + *within);
                            *within += 1;
                            if *within == 8 {
                                *k += 1;
                                *within = 0;
                            }
                            return Ok(Some(id));
                        }
                    }
                },
            }
        }
    }
}

impl<'a> Iterator for IamChain<'a> {
    type Item = Result<PageId>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(Some(id)) => Some(Ok(id)),
            Ok(None) => None,
            Err(e) => {
                self.state = ChainState::Failed;
                Some(Err(e))
            }
        }
    }
}
