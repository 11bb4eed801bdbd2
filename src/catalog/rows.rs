//! # Catalog Row Layouts
//!
//! Fixed portions of the system catalog rows, transmuted in place with
//! `zerocopy`. Offsets below are within the row, 4-byte row head included;
//! the structs start right after the head. Name columns are the first
//! variable column of their row and are decoded by the caller from the
//! [`RowView`](crate::pages::RowView) that accompanies each typed row.

use zerocopy::byteorder::{LittleEndian, I16, U16, U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::pages::{FixedRow, PageId};
use crate::types::ScalarType;

/// `sysallocunits` row, 73 bytes.
///
/// ```text
/// 0x00 head  0x04 auid  0x0C type  0x0D ownerid  0x15 status  0x19 fgid
/// 0x1B pgfirst  0x21 pgroot  0x27 pgfirstiam  0x2D pcused  0x35 pcdata
/// 0x3D pcreserved  0x45 dbfragid
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct SysAllocUnitsRow {
    auid: U64<LittleEndian>,
    alloc_type: u8,
    ownerid: U64<LittleEndian>,
    status: U32<LittleEndian>,
    fgid: U16<LittleEndian>,
    pgfirst: PageId,
    pgroot: PageId,
    pgfirstiam: PageId,
    pcused: U64<LittleEndian>,
    pcdata: U64<LittleEndian>,
    pcreserved: U64<LittleEndian>,
    dbfragid: U32<LittleEndian>,
}

impl FixedRow for SysAllocUnitsRow {
    const OBJECT_ID: Option<u32> = Some(super::SysObj::SysAllocUnits as u32);
}

impl SysAllocUnitsRow {
    pub fn auid(&self) -> u64 {
        self.auid.get()
    }

    pub fn alloc_type(&self) -> u8 {
        self.alloc_type
    }

    pub fn ownerid(&self) -> u64 {
        self.ownerid.get()
    }

    pub fn pgfirst(&self) -> PageId {
        self.pgfirst
    }

    pub fn pgroot(&self) -> PageId {
        self.pgroot
    }

    pub fn pgfirstiam(&self) -> PageId {
        self.pgfirstiam
    }
}

/// `sysschobjs` row, 44-byte fixed portion; the object name is the first
/// variable column (UTF-16LE).
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct SysSchObjsRow {
    id: U32<LittleEndian>,
    nsid: U32<LittleEndian>,
    nsclass: u8,
    status: U32<LittleEndian>,
    kind: [u8; 2],
    pid: U32<LittleEndian>,
    pclass: u8,
    intprop: U32<LittleEndian>,
    created: [u8; 8],
    modified: [u8; 8],
}

impl FixedRow for SysSchObjsRow {
    const OBJECT_ID: Option<u32> = Some(super::SysObj::SysSchObjs as u32);
}

impl SysSchObjsRow {
    pub fn id(&self) -> u32 {
        self.id.get()
    }

    /// Two-character object kind code; `"U "` marks a user table.
    pub fn kind(&self) -> [u8; 2] {
        self.kind
    }

    pub fn is_user_table(&self) -> bool {
        self.kind == *b"U "
    }
}

/// `syscolpars` row, 45-byte fixed portion; the column name is the first
/// variable column.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct SysColParsRow {
    id: U32<LittleEndian>,
    number: U16<LittleEndian>,
    colid: U32<LittleEndian>,
    xtype: u8,
    utype: U32<LittleEndian>,
    length: I16<LittleEndian>,
    prec: u8,
    scale: u8,
    collationid: U32<LittleEndian>,
    status: U32<LittleEndian>,
    maxinrow: U16<LittleEndian>,
    xmlns: U32<LittleEndian>,
    dflt: U32<LittleEndian>,
    chk: U32<LittleEndian>,
}

impl FixedRow for SysColParsRow {
    const OBJECT_ID: Option<u32> = Some(super::SysObj::SysColPars as u32);
}

impl SysColParsRow {
    pub fn object_id(&self) -> u32 {
        self.id.get()
    }

    pub fn colid(&self) -> u32 {
        self.colid.get()
    }

    pub fn xtype(&self) -> ScalarType {
        ScalarType::from_xtype(self.xtype)
    }

    pub fn utype(&self) -> u32 {
        self.utype.get()
    }

    /// Declared length in bytes; -1 is the variable-length sentinel.
    pub fn length(&self) -> i16 {
        self.length.get()
    }
}

/// `sysscalartypes` row, 49-byte fixed portion; the type name is the first
/// variable column.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct SysScalarTypesRow {
    id: U32<LittleEndian>,
    schid: U32<LittleEndian>,
    xtype: u8,
    length: I16<LittleEndian>,
    prec: u8,
    scale: u8,
    collationid: U32<LittleEndian>,
    status: U32<LittleEndian>,
    created: [u8; 8],
    modified: [u8; 8],
    dflt: U32<LittleEndian>,
    chk: U32<LittleEndian>,
}

impl FixedRow for SysScalarTypesRow {
    const OBJECT_ID: Option<u32> = Some(super::SysObj::SysScalarTypes as u32);
}

impl SysScalarTypesRow {
    pub fn id(&self) -> u32 {
        self.id.get()
    }

    pub fn xtype(&self) -> ScalarType {
        ScalarType::from_xtype(self.xtype)
    }

    pub fn length(&self) -> i16 {
        self.length.get()
    }
}

/// `sysidxstats` row, 39-byte fixed portion; the index name is the first
/// variable column.
///
/// ```text
/// 0x00 head  0x04 id  0x08 indid  0x0C status  0x10 intprop  0x14 fillfact
/// 0x15 type  0x16 tinyprop  0x17 dataspace  0x1B lobds  0x1F rowset
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct SysIdxStatsRow {
    id: U32<LittleEndian>,
    indid: U32<LittleEndian>,
    status: U32<LittleEndian>,
    intprop: U32<LittleEndian>,
    fillfact: u8,
    index_type: u8,
    tinyprop: u8,
    dataspace: U32<LittleEndian>,
    lobds: U32<LittleEndian>,
    rowset: U64<LittleEndian>,
}

impl FixedRow for SysIdxStatsRow {
    const OBJECT_ID: Option<u32> = Some(super::SysObj::SysIdxStats as u32);
}

/// `sysidxstats.type` codes.
pub mod index_type {
    pub const HEAP: u8 = 0;
    pub const CLUSTERED: u8 = 1;
    pub const NONCLUSTERED: u8 = 2;
    pub const SPATIAL: u8 = 4;
}

impl SysIdxStatsRow {
    pub fn object_id(&self) -> u32 {
        self.id.get()
    }

    pub fn indid(&self) -> u32 {
        self.indid.get()
    }

    pub fn index_type(&self) -> u8 {
        self.index_type
    }

    pub fn is_clustered(&self) -> bool {
        self.indid.get() == 1 && self.index_type == index_type::CLUSTERED
    }

    pub fn is_spatial(&self) -> bool {
        self.index_type == index_type::SPATIAL
    }

    pub fn rowset(&self) -> u64 {
        self.rowset.get()
    }
}

/// `sysiscols` row, 28-byte fixed portion: index key columns.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct SysIsColsRow {
    idmajor: U32<LittleEndian>,
    idminor: U32<LittleEndian>,
    subid: U32<LittleEndian>,
    status: U32<LittleEndian>,
    intprop: U32<LittleEndian>,
    tinyprop: [u8; 4],
}

impl FixedRow for SysIsColsRow {
    const OBJECT_ID: Option<u32> = Some(super::SysObj::SysIsCols as u32);
}

/// `sysiscols.status` bit: key column sorts descending.
const STATUS_DESCENDING: u32 = 0x4;

impl SysIsColsRow {
    pub fn object_id(&self) -> u32 {
        self.idmajor.get()
    }

    pub fn indid(&self) -> u32 {
        self.idminor.get()
    }

    pub fn colid(&self) -> u32 {
        self.subid.get()
    }

    pub fn key_ordinal(&self) -> u32 {
        self.intprop.get()
    }

    pub fn is_descending(&self) -> bool {
        self.status.get() & STATUS_DESCENDING != 0
    }
}

/// `sysrowsets` row, 39-byte fixed portion: partition descriptors.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct SysRowSetsRow {
    rowsetid: U64<LittleEndian>,
    ownertype: u8,
    idmajor: U32<LittleEndian>,
    idminor: U32<LittleEndian>,
    numpart: U32<LittleEndian>,
    status: U32<LittleEndian>,
    fgidfs: U16<LittleEndian>,
    rcrows: U64<LittleEndian>,
}

impl FixedRow for SysRowSetsRow {
    const OBJECT_ID: Option<u32> = Some(super::SysObj::SysRowSets as u32);
}

impl SysRowSetsRow {
    pub fn rowsetid(&self) -> u64 {
        self.rowsetid.get()
    }

    pub fn object_id(&self) -> u32 {
        self.idmajor.get()
    }

    pub fn indid(&self) -> u32 {
        self.idminor.get()
    }

    pub fn row_count(&self) -> u64 {
        self.rcrows.get()
    }
}

/// `sysobjvalues` row, 17-byte fixed portion; the value is the first
/// variable column.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct SysObjValuesRow {
    valclass: u8,
    objid: U32<LittleEndian>,
    subobjid: U32<LittleEndian>,
    valnum: U32<LittleEndian>,
}

impl FixedRow for SysObjValuesRow {
    const OBJECT_ID: Option<u32> = Some(super::SysObj::SysObjValues as u32);
}

impl SysObjValuesRow {
    pub fn object_id(&self) -> u32 {
        self.objid.get()
    }

    pub fn valclass(&self) -> u8 {
        self.valclass
    }
}
