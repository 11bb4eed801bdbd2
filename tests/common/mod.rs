//! Synthetic single-file database fixture for integration tests.
//!
//! Builds a minimal but complete on-disk image: file header, PFS, boot page,
//! a `sysallocunits` page anchoring one data page per system catalog, user
//! tables with clustered indexes, and (optionally) a spatial index tree.

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;

pub const PAGE_SIZE: usize = 8192;
pub const PAGE_HEADER_SIZE: usize = 96;

// page type tags
pub const PT_DATA: u8 = 1;
pub const PT_INDEX: u8 = 2;
pub const PT_BOOT: u8 = 13;
pub const PT_FILE_HEADER: u8 = 15;
pub const PT_IAM: u8 = 16;
pub const PT_PFS: u8 = 17;

// system object ids
pub const OBJ_SYSROWSETS: u32 = 5;
pub const OBJ_SYSALLOCUNITS: u32 = 7;
pub const OBJ_SYSSCHOBJS: u32 = 34;
pub const OBJ_SYSCOLPARS: u32 = 41;
pub const OBJ_SYSSCALARTYPES: u32 = 50;
pub const OBJ_SYSIDXSTATS: u32 = 54;
pub const OBJ_SYSISCOLS: u32 = 55;
pub const OBJ_SYSOBJVALUES: u32 = 60;

pub fn utf16(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}

pub fn put_page_id(buf: &mut [u8], at: usize, file: u16, page: u32) {
    buf[at..at + 4].copy_from_slice(&page.to_le_bytes());
    buf[at + 4..at + 6].copy_from_slice(&file.to_le_bytes());
}

/// Record image: 4-byte head, fixed portion, column count, NULL bitmap and
/// optional variable columns with absolute end offsets.
pub fn build_row(fixed: &[u8], nulls: &[bool], vars: &[&[u8]]) -> Vec<u8> {
    let fixed_len = 4 + fixed.len();
    let mut row = Vec::new();
    let status_a = 0x10 | if vars.is_empty() { 0 } else { 0x20 };
    row.push(status_a);
    row.push(0);
    row.extend_from_slice(&(fixed_len as u16).to_le_bytes());
    row.extend_from_slice(fixed);
    row.extend_from_slice(&(nulls.len() as u16).to_le_bytes());
    let mut bitmap = vec![0u8; nulls.len().div_ceil(8)];
    for (i, &null) in nulls.iter().enumerate() {
        if null {
            bitmap[i / 8] |= 1 << (i % 8);
        }
    }
    row.extend_from_slice(&bitmap);
    if !vars.is_empty() {
        row.extend_from_slice(&(vars.len() as u16).to_le_bytes());
        let data_start = row.len() + vars.len() * 2;
        let mut end = data_start;
        for var in vars {
            end += var.len();
            row.extend_from_slice(&(end as u16).to_le_bytes());
        }
        for var in vars {
            row.extend_from_slice(var);
        }
    }
    row
}

/// One page under construction.
pub struct Page {
    pub index: u32,
    pub page_type: u8,
    pub level: u8,
    pub index_id: u16,
    pub obj_id: u32,
    pub prev: u32,
    pub next: u32,
    pub rows: Vec<Vec<u8>>,
}

impl Page {
    pub fn new(index: u32, page_type: u8) -> Self {
        Self {
            index,
            page_type,
            level: 0,
            index_id: 0,
            obj_id: 0,
            prev: 0,
            next: 0,
            rows: Vec::new(),
        }
    }

    pub fn obj(mut self, obj_id: u32) -> Self {
        self.obj_id = obj_id;
        self
    }

    pub fn level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    pub fn linked(mut self, prev: u32, next: u32) -> Self {
        self.prev = prev;
        self.next = next;
        self
    }

    pub fn row(mut self, row: Vec<u8>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn render(&self) -> Vec<u8> {
        let mut page = vec![0u8; PAGE_SIZE];
        page[0x00] = 1;
        page[0x01] = self.page_type;
        page[0x03] = self.level;
        page[0x06..0x08].copy_from_slice(&self.index_id.to_le_bytes());
        if self.prev != 0 {
            put_page_id(&mut page, 0x08, 1, self.prev);
        }
        if self.next != 0 {
            put_page_id(&mut page, 0x10, 1, self.next);
        }
        page[0x16..0x18].copy_from_slice(&(self.rows.len() as u16).to_le_bytes());
        page[0x18..0x1C].copy_from_slice(&self.obj_id.to_le_bytes());
        put_page_id(&mut page, 0x20, 1, self.index);

        let mut offset = PAGE_HEADER_SIZE;
        for (i, row) in self.rows.iter().enumerate() {
            page[offset..offset + row.len()].copy_from_slice(row);
            let pos = PAGE_SIZE - 2 * (i + 1);
            page[pos..pos + 2].copy_from_slice(&(offset as u16).to_le_bytes());
            offset += row.len();
        }
        page[0x1E..0x20].copy_from_slice(&(offset as u16).to_le_bytes());
        let free = (PAGE_SIZE - 2 * self.rows.len() - offset) as u16;
        page[0x1C..0x1E].copy_from_slice(&free.to_le_bytes());
        page
    }
}

// --- catalog row images -------------------------------------------------

pub fn boot_row(dbname: &str, first_sys_indexes: u32) -> Vec<u8> {
    let mut fixed = vec![0u8; 316];
    fixed[0..2].copy_from_slice(&95u16.to_le_bytes());
    let name = utf16(dbname);
    fixed[0x2C..0x2C + name.len()].copy_from_slice(&name);
    fixed[0x12C..0x12E].copy_from_slice(&1u16.to_le_bytes());
    put_page_id(&mut fixed, 0x134, 1, first_sys_indexes);
    build_row(&fixed, &[], &[])
}

pub fn sysallocunits_row(
    auid: u64,
    ownerid: u64,
    pgfirst: u32,
    pgroot: u32,
    pgfirstiam: u32,
) -> Vec<u8> {
    let mut fixed = vec![0u8; 69];
    fixed[0..8].copy_from_slice(&auid.to_le_bytes());
    fixed[8] = 1; // in-row data
    fixed[9..17].copy_from_slice(&ownerid.to_le_bytes());
    if pgfirst != 0 {
        put_page_id(&mut fixed, 23, 1, pgfirst);
    }
    if pgroot != 0 {
        put_page_id(&mut fixed, 29, 1, pgroot);
    }
    if pgfirstiam != 0 {
        put_page_id(&mut fixed, 35, 1, pgfirstiam);
    }
    build_row(&fixed, &[], &[])
}

pub fn sysschobjs_row(id: u32, name: &str, kind: &[u8; 2]) -> Vec<u8> {
    let mut fixed = vec![0u8; 40];
    fixed[0..4].copy_from_slice(&id.to_le_bytes());
    fixed[13..15].copy_from_slice(kind);
    build_row(&fixed, &[false], &[&utf16(name)])
}

pub fn syscolpars_row(id: u32, colid: u32, xtype: u8, utype: u32, length: i16, name: &str) -> Vec<u8> {
    let mut fixed = vec![0u8; 41];
    fixed[0..4].copy_from_slice(&id.to_le_bytes());
    fixed[6..10].copy_from_slice(&colid.to_le_bytes());
    fixed[10] = xtype;
    fixed[11..15].copy_from_slice(&utype.to_le_bytes());
    fixed[15..17].copy_from_slice(&length.to_le_bytes());
    build_row(&fixed, &[false], &[&utf16(name)])
}

pub fn sysscalartypes_row(id: u32, xtype: u8, length: i16, name: &str) -> Vec<u8> {
    let mut fixed = vec![0u8; 45];
    fixed[0..4].copy_from_slice(&id.to_le_bytes());
    fixed[8] = xtype;
    fixed[9..11].copy_from_slice(&length.to_le_bytes());
    build_row(&fixed, &[false], &[&utf16(name)])
}

pub fn sysidxstats_row(id: u32, indid: u32, index_type: u8, rowset: u64, name: &str) -> Vec<u8> {
    let mut fixed = vec![0u8; 35];
    fixed[0..4].copy_from_slice(&id.to_le_bytes());
    fixed[4..8].copy_from_slice(&indid.to_le_bytes());
    fixed[17] = index_type;
    fixed[27..35].copy_from_slice(&rowset.to_le_bytes());
    build_row(&fixed, &[false], &[&utf16(name)])
}

pub fn sysiscols_row(idmajor: u32, idminor: u32, colid: u32, ordinal: u32, descending: bool) -> Vec<u8> {
    let mut fixed = vec![0u8; 24];
    fixed[0..4].copy_from_slice(&idmajor.to_le_bytes());
    fixed[4..8].copy_from_slice(&idminor.to_le_bytes());
    fixed[8..12].copy_from_slice(&colid.to_le_bytes());
    if descending {
        fixed[12] = 0x4;
    }
    fixed[16..20].copy_from_slice(&ordinal.to_le_bytes());
    build_row(&fixed, &[], &[])
}

pub fn sysrowsets_row(rowsetid: u64, idmajor: u32, idminor: u32) -> Vec<u8> {
    let mut fixed = vec![0u8; 35];
    fixed[0..8].copy_from_slice(&rowsetid.to_le_bytes());
    fixed[9..13].copy_from_slice(&idmajor.to_le_bytes());
    fixed[13..17].copy_from_slice(&idminor.to_le_bytes());
    build_row(&fixed, &[], &[])
}

/// IAM header row: chain sequence, extent interval start, eight single-page
/// allocation slots.
pub fn iam_header_row(start_page: u32, singles: &[u32]) -> Vec<u8> {
    let mut fixed = vec![0u8; 84];
    fixed[0..4].copy_from_slice(&1u32.to_le_bytes());
    put_page_id(&mut fixed, 30, 1, start_page);
    for (i, &p) in singles.iter().enumerate() {
        if p != 0 {
            put_page_id(&mut fixed, 36 + i * 6, 1, p);
        }
    }
    build_row(&fixed, &[], &[])
}

/// IAM extent bitmap row; bit `k` maps the extent of eight pages starting
/// at `start_page + 8k`.
pub fn iam_bitmap_row(extents: &[usize]) -> Vec<u8> {
    let mut bitmap = vec![0u8; 64];
    for &k in extents {
        bitmap[k / 8] |= 1 << (k % 8);
    }
    build_row(&bitmap, &[], &[])
}

/// Index page row: status byte, raw key bytes, child page reference.
pub fn index_row(key: &[u8], child: u32) -> Vec<u8> {
    let mut row = vec![0u8];
    row.extend_from_slice(key);
    row.extend_from_slice(&child.to_le_bytes());
    row.extend_from_slice(&1u16.to_le_bytes());
    row
}

/// Spatial leaf row fixed portion: cell id, pk0, attr, srid.
pub fn spatial_fixed(cell: [u8; 5], pk0: i64, attr: u16) -> Vec<u8> {
    let mut fixed = Vec::with_capacity(19);
    fixed.extend_from_slice(&cell);
    fixed.extend_from_slice(&pk0.to_le_bytes());
    fixed.extend_from_slice(&attr.to_le_bytes());
    fixed.extend_from_slice(&4326u32.to_le_bytes());
    fixed
}

pub fn spatial_leaf_row(cell: [u8; 5], pk0: i64) -> Vec<u8> {
    build_row(&spatial_fixed(cell, pk0, 1), &[false, false, false, false], &[])
}

/// Spatial index key: cell bytes then pk0.
pub fn spatial_key(cell: [u8; 5], pk0: i64) -> Vec<u8> {
    let mut key = Vec::with_capacity(13);
    key.extend_from_slice(&cell);
    key.extend_from_slice(&pk0.to_le_bytes());
    key
}

/// Geography point payload (22 bytes).
pub fn geo_point(lat: f64, lon: f64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(22);
    bytes.extend_from_slice(&4326u32.to_le_bytes());
    bytes.extend_from_slice(&0x0C01u16.to_le_bytes());
    bytes.extend_from_slice(&lat.to_le_bytes());
    bytes.extend_from_slice(&lon.to_le_bytes());
    bytes
}

// --- whole-file assembly ------------------------------------------------

/// Writes pages into a file image; every touched page is marked allocated
/// in the PFS page, and pages 0 (file header) and 1 (PFS) are synthesized.
pub fn write_db(name: &str, pages: Vec<Page>) -> (tempfile::TempDir, PathBuf) {
    let count = pages.iter().map(|p| p.index + 1).max().unwrap_or(10).max(10);
    let mut file = vec![0u8; count as usize * PAGE_SIZE];

    let mut pfs = Page::new(1, PT_PFS).render();
    for page in &pages {
        pfs[PAGE_HEADER_SIZE + page.index as usize] = 0x40;
    }
    pfs[PAGE_HEADER_SIZE] = 0x40;
    pfs[PAGE_HEADER_SIZE + 1] = 0x40;

    let header_page = Page::new(0, PT_FILE_HEADER).render();
    file[..PAGE_SIZE].copy_from_slice(&header_page);
    file[PAGE_SIZE..2 * PAGE_SIZE].copy_from_slice(&pfs);

    for page in &pages {
        let at = page.index as usize * PAGE_SIZE;
        file[at..at + PAGE_SIZE].copy_from_slice(&page.render());
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(format!("{}.mdf", name));
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(&file).unwrap();
    f.flush().unwrap();
    (dir, path)
}

/// Catalog scaffolding: boot page at 9 pointing at a `sysallocunits` page at
/// 10, one data page per system catalog at 11..=17. Returns the pages;
/// callers append their user-table rows and pages.
pub struct CatalogFixture {
    pub sysalloc_rows: Vec<Vec<u8>>,
    pub sysschobjs: Vec<Vec<u8>>,
    pub syscolpars: Vec<Vec<u8>>,
    pub sysscalartypes: Vec<Vec<u8>>,
    pub sysidxstats: Vec<Vec<u8>>,
    pub sysiscols: Vec<Vec<u8>>,
    pub sysrowsets: Vec<Vec<u8>>,
    pub extra_pages: Vec<Page>,
}

impl CatalogFixture {
    pub fn new() -> Self {
        Self {
            sysalloc_rows: Vec::new(),
            sysschobjs: Vec::new(),
            syscolpars: Vec::new(),
            sysscalartypes: vec![
                sysscalartypes_row(56, 56, 4, "int"),
                sysscalartypes_row(127, 127, 8, "bigint"),
                sysscalartypes_row(231, 231, -1, "nvarchar"),
                sysscalartypes_row(240, 240, -1, "geography"),
            ],
            sysidxstats: Vec::new(),
            sysiscols: Vec::new(),
            sysrowsets: Vec::new(),
            extra_pages: Vec::new(),
        }
    }

    pub fn build(mut self, name: &str) -> (tempfile::TempDir, PathBuf) {
        // allocation units for the system catalogs themselves
        let catalogs = [
            (OBJ_SYSSCHOBJS, 11u32),
            (OBJ_SYSCOLPARS, 12),
            (OBJ_SYSSCALARTYPES, 13),
            (OBJ_SYSIDXSTATS, 14),
            (OBJ_SYSISCOLS, 15),
            (OBJ_SYSROWSETS, 16),
            (OBJ_SYSOBJVALUES, 17),
        ];
        let mut auid = 1_000u64;
        for (obj, page) in catalogs {
            auid += 1;
            self.sysalloc_rows
                .push(sysallocunits_row(auid, obj as u64, page, page, 0));
        }

        let mut pages = vec![
            Page::new(9, PT_BOOT).row(boot_row(name, 10)),
            {
                let mut p = Page::new(10, PT_DATA).obj(OBJ_SYSALLOCUNITS);
                for row in self.sysalloc_rows {
                    p.rows.push(row);
                }
                p
            },
        ];
        let catalog_pages = [
            (11u32, OBJ_SYSSCHOBJS, self.sysschobjs),
            (12, OBJ_SYSCOLPARS, self.syscolpars),
            (13, OBJ_SYSSCALARTYPES, self.sysscalartypes),
            (14, OBJ_SYSIDXSTATS, self.sysidxstats),
            (15, OBJ_SYSISCOLS, self.sysiscols),
            (16, OBJ_SYSROWSETS, self.sysrowsets),
            (17, OBJ_SYSOBJVALUES, Vec::new()),
        ];
        for (index, obj, rows) in catalog_pages {
            let mut p = Page::new(index, PT_DATA).obj(obj);
            p.rows = rows;
            pages.push(p);
        }
        pages.extend(self.extra_pages);
        write_db(name, pages)
    }
}
