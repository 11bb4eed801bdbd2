//! # Spatial Index Rows
//!
//! On-disk layouts of the spatial B-tree: the 23-byte leaf row and the
//! in-row geography point payload.
//!
//! ## Leaf row (23 bytes, row head included)
//!
//! ```text
//! 0x00 row head (4)   0x04 cell_id (5)   0x09 pk0 i64
//! 0x11 cell_attr u16  0x13 srid u32
//! ```
//!
//! ## Geography point payload (22 bytes)
//!
//! ```text
//! 0x00 srid u32   0x04 tag u16 (= 0x0C01)   0x06 lat f64   0x0E lon f64
//! ```

use zerocopy::byteorder::{LittleEndian, F64, I64, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::pages::FixedRow;
use crate::spatial::{SpatialCell, SpatialPoint};

/// Spatial index keys are `cell_id (5) + pk0 (8)`.
pub const SPATIAL_KEY_LENGTH: usize = 13;

/// Geography point type tag.
const POINT_TAG: u16 = 0x0C01;

/// How a cell relates to the indexed geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellAttr {
    /// The cell at least touches the object.
    Touch,
    /// The object partially covers the cell.
    Part,
    /// The object covers the whole cell.
    Cover,
}

impl CellAttr {
    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(CellAttr::Touch),
            1 => Some(CellAttr::Part),
            2 => Some(CellAttr::Cover),
            _ => None,
        }
    }
}

/// Fixed portion of a spatial leaf row.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct SpatialRow {
    cell: [u8; 5],
    pk0: I64<LittleEndian>,
    cell_attr: U16<LittleEndian>,
    srid: U32<LittleEndian>,
}

impl FixedRow for SpatialRow {
    const OBJECT_ID: Option<u32> = None;
}

impl SpatialRow {
    pub fn cell(&self) -> SpatialCell {
        SpatialCell::from_bytes(self.cell)
    }

    /// Primary-key value of the indexed row.
    pub fn pk0(&self) -> i64 {
        self.pk0.get()
    }

    pub fn cell_attr(&self) -> Option<CellAttr> {
        CellAttr::from_raw(self.cell_attr.get())
    }

    /// Whether the object covers this whole cell (no per-row distance check
    /// can be skipped either way; cover only states containment).
    pub fn cell_cover(&self) -> bool {
        self.cell_attr.get() == 2
    }

    pub fn srid(&self) -> u32 {
        self.srid.get()
    }
}

/// Line segment geography type tag.
const LINE_TAG: u16 = 0x1401;
/// Multipolygon geography type tag.
const MULTIPOLYGON_TAG: u16 = 0x0401;

/// In-row geography point value.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct GeoPoint {
    srid: U32<LittleEndian>,
    tag: U16<LittleEndian>,
    latitude: F64<LittleEndian>,
    longitude: F64<LittleEndian>,
}

impl GeoPoint {
    /// Parses a 22-byte geography payload carrying a point.
    pub fn parse(bytes: &[u8]) -> Option<&Self> {
        let point = Self::ref_from_bytes(bytes.get(..size_of::<Self>())?).ok()?;
        if point.tag.get() != POINT_TAG {
            return None;
        }
        Some(point)
    }

    pub fn srid(&self) -> u32 {
        self.srid.get()
    }

    pub fn point(&self) -> SpatialPoint {
        SpatialPoint::new(self.latitude.get(), self.longitude.get())
    }
}

/// In-row geography line segment (38 bytes): two endpoints.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct GeoLineSegment {
    srid: U32<LittleEndian>,
    tag: U16<LittleEndian>,
    lat1: F64<LittleEndian>,
    lon1: F64<LittleEndian>,
    lat2: F64<LittleEndian>,
    lon2: F64<LittleEndian>,
}

impl GeoLineSegment {
    pub fn parse(bytes: &[u8]) -> Option<&Self> {
        let line = Self::ref_from_bytes(bytes.get(..size_of::<Self>())?).ok()?;
        if line.tag.get() != LINE_TAG {
            return None;
        }
        Some(line)
    }

    pub fn endpoints(&self) -> (SpatialPoint, SpatialPoint) {
        (
            SpatialPoint::new(self.lat1.get(), self.lon1.get()),
            SpatialPoint::new(self.lat2.get(), self.lon2.get()),
        )
    }
}

/// In-row geography multipolygon: a 10-byte header followed by
/// `num_points` packed lat/lon pairs. Consecutive equal points close a
/// ring.
#[derive(Debug, Clone, Copy)]
pub struct GeoMultiPolygon<'a> {
    srid: u32,
    points: &'a [u8],
    num_points: usize,
}

impl<'a> GeoMultiPolygon<'a> {
    pub fn parse(bytes: &'a [u8]) -> Option<Self> {
        if bytes.len() < 10 {
            return None;
        }
        let srid = u32::from_le_bytes(bytes[0..4].try_into().ok()?);
        let tag = u16::from_le_bytes(bytes[4..6].try_into().ok()?);
        if tag != MULTIPOLYGON_TAG {
            return None;
        }
        let num_points = u32::from_le_bytes(bytes[6..10].try_into().ok()?) as usize;
        let points = bytes.get(10..10 + num_points * 16)?;
        Some(Self {
            srid,
            points,
            num_points,
        })
    }

    pub fn srid(&self) -> u32 {
        self.srid
    }

    pub fn len(&self) -> usize {
        self.num_points
    }

    pub fn is_empty(&self) -> bool {
        self.num_points == 0
    }

    pub fn point(&self, i: usize) -> SpatialPoint {
        // the points slice spans exactly num_points * 16 bytes
        let at = i * 16;
        let mut lat = [0u8; 8];
        lat.copy_from_slice(&self.points[at..at + 8]);
        let mut lon = [0u8; 8];
        lon.copy_from_slice(&self.points[at + 8..at + 16]);
        SpatialPoint::new(f64::from_le_bytes(lat), f64::from_le_bytes(lon))
    }

    pub fn points(&self) -> impl Iterator<Item = SpatialPoint> + '_ {
        (0..self.num_points).map(move |i| self.point(i))
    }

    /// Number of closed rings (a ring ends where a point repeats its
    /// predecessor).
    pub fn ring_count(&self) -> usize {
        let mut count = 0;
        let mut i = 0;
        let mut j = 1;
        while j < self.num_points {
            if self.point(i) == self.point(j) {
                count += 1;
                j += 1;
                i = j;
            }
            j += 1;
        }
        count
    }
}
