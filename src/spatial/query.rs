//! # Spatial Range Queries
//!
//! Translates a geographic circle into the set of grid cells that may hold
//! matching rows:
//!
//! 1. Bound the circle with a geographic rectangle (destination points at
//!    the four cardinal bearings); a rectangle wrapping a pole widens to the
//!    full longitude range, one that crosses the antimeridian splits in two.
//! 2. Sample the rectangle's edges ([`EDGE_N`] points per edge) and project
//!    each sample, producing a closed contour in the unit square.
//! 3. Recurse through the four grid levels, classifying each cell square
//!    against the contour: disjoint cells are skipped, fully covered cells
//!    enter the [`CellSet`] as whole prefixes, boundary cells subdivide down
//!    to depth 4.

use tracing::debug;

use crate::spatial::math_util::{self, Contains};
use crate::spatial::transform::{self, EarthModel, SpatialGrid, RAD_TO_DEG};
use crate::spatial::{CellSet, Point2D, Rect2D, SpatialCell, SpatialPoint, CELL_DEPTH_MAX};

/// Boundary samples per rectangle edge.
pub const EDGE_N: usize = 16;

/// A geographic rectangle; `min_lon > max_lon` means it wraps the
/// antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialRect {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl SpatialRect {
    pub fn is_valid(&self) -> bool {
        self.min_lat < self.max_lat
            && self.min_lat >= -90.0
            && self.max_lat <= 90.0
            && self.min_lon.abs() <= 180.0
            && self.max_lon.abs() <= 180.0
    }

    fn corner(&self, i: usize) -> SpatialPoint {
        match i % 4 {
            0 => SpatialPoint::new(self.min_lat, self.min_lon),
            1 => SpatialPoint::new(self.min_lat, self.max_lon),
            2 => SpatialPoint::new(self.max_lat, self.max_lon),
            _ => SpatialPoint::new(self.max_lat, self.min_lon),
        }
    }
}

/// Cells covering a circle of `radius_meters` around `center`.
pub fn cell_range(
    set: &mut CellSet,
    center: SpatialPoint,
    radius_meters: f64,
    grid: SpatialGrid,
    model: EarthModel,
) {
    if radius_meters <= 0.0 {
        set.insert(transform::make_cell(center, grid));
        return;
    }
    cell_bbox(set, center, radius_meters, grid, model);
}

/// Cells covering the bounding rectangle of a circle. A rectangle wrapping a
/// pole is split there: the polar side becomes a full-longitude band.
pub fn cell_bbox(
    set: &mut CellSet,
    center: SpatialPoint,
    radius_meters: f64,
    grid: SpatialGrid,
    model: EarthModel,
) {
    if radius_meters <= 0.0 {
        set.insert(transform::make_cell(center, grid));
        return;
    }
    let deg = RAD_TO_DEG * radius_meters / model.radius(center.latitude);
    let raw_min = center.latitude - deg;
    let raw_max = center.latitude + deg;
    let over_north = raw_max > 90.0;
    let over_south = raw_min < -90.0;

    if over_north || over_south {
        // the circle wraps a pole: every longitude is inside, so the
        // rectangle splits into a polar cap band
        let rect = SpatialRect {
            min_lat: if over_south { -90.0 } else { raw_min },
            max_lat: if over_north { 90.0 } else { raw_max },
            min_lon: -180.0,
            max_lon: 180.0,
        };
        debug!(?rect, "pole-wrapping query rectangle");
        cell_rect(set, &rect, grid);
        return;
    }

    let lh = transform::destination(center, radius_meters, 270.0, model);
    let rh = transform::destination(center, radius_meters, 90.0, model);
    let rect = SpatialRect {
        min_lat: raw_min,
        max_lat: raw_max,
        min_lon: lh.longitude,
        max_lon: rh.longitude,
    };
    if rect.min_lon > rect.max_lon {
        // crosses the antimeridian
        cell_rect(
            set,
            &SpatialRect {
                min_lon: rect.min_lon,
                max_lon: 180.0,
                ..rect
            },
            grid,
        );
        cell_rect(
            set,
            &SpatialRect {
                min_lon: -180.0,
                max_lon: rect.max_lon,
                ..rect
            },
            grid,
        );
    } else {
        cell_rect(set, &rect, grid);
    }
}

/// Cells covering a geographic rectangle: contour sampling, then 4-level
/// recursive selection against the projected polygon.
///
/// The hemispheres project onto disjoint halves of the unit square, so an
/// equator-crossing rectangle is processed as its northern and southern
/// halves.
pub fn cell_rect(set: &mut CellSet, rc: &SpatialRect, grid: SpatialGrid) {
    debug_assert!(rc.is_valid());
    if rc.min_lat < 0.0 && rc.max_lat > 0.0 {
        cell_rect_hemisphere(
            set,
            &SpatialRect {
                max_lat: 0.0,
                ..*rc
            },
            grid,
        );
        cell_rect_hemisphere(
            set,
            &SpatialRect {
                min_lat: 0.0,
                ..*rc
            },
            grid,
        );
    } else {
        cell_rect_hemisphere(set, rc, grid);
    }
}

fn cell_rect_hemisphere(set: &mut CellSet, rc: &SpatialRect, grid: SpatialGrid) {
    let poly = build_contour(rc);
    let bbox = contour_bbox(&poly);

    let g0 = grid.level(0);
    let x0 = ((bbox.lt.x * g0 as f64) as i64).clamp(0, g0 as i64 - 1) as u32;
    let x1 = ((bbox.rb.x * g0 as f64) as i64).clamp(0, g0 as i64 - 1) as u32;
    let y0 = ((bbox.lt.y * g0 as f64) as i64).clamp(0, g0 as i64 - 1) as u32;
    let y1 = ((bbox.rb.y * g0 as f64) as i64).clamp(0, g0 as i64 - 1) as u32;

    for hx in x0..=x1 {
        for hy in y0..=y1 {
            let span = 1.0 / g0 as f64;
            let origin = Point2D::new(hx as f64 * span, hy as f64 * span);
            let id = crate::spatial::hilbert::xy2d(g0, hx, hy) as u8;
            let mut ids = [0u8; 4];
            ids[0] = id;
            select_cells(set, &poly, ids, 1, origin, span, grid);
        }
    }
}

fn select_cells(
    set: &mut CellSet,
    poly: &[Point2D],
    ids: [u8; 4],
    depth: u8,
    origin: Point2D,
    span: f64,
    grid: SpatialGrid,
) {
    let rect = Rect2D {
        lt: origin,
        rb: Point2D::new(origin.x + span, origin.y + span),
    };
    match math_util::contains(poly, &rect) {
        Contains::None => {}
        Contains::RectInside => {
            set.insert_prefix(SpatialCell::new(ids, depth));
        }
        Contains::Intersect | Contains::PolyInside => {
            if depth == CELL_DEPTH_MAX {
                set.insert(SpatialCell::new(ids, CELL_DEPTH_MAX));
                return;
            }
            let g = grid.level(depth as usize);
            let child_span = span / g as f64;
            for hx in 0..g {
                for hy in 0..g {
                    let child_origin = Point2D::new(
                        origin.x + hx as f64 * child_span,
                        origin.y + hy as f64 * child_span,
                    );
                    let mut child_ids = ids;
                    child_ids[depth as usize] = crate::spatial::hilbert::xy2d(g, hx, hy) as u8;
                    select_cells(set, poly, child_ids, depth + 1, child_origin, child_span, grid);
                }
            }
        }
    }
}

/// Samples the rectangle boundary into a closed projected contour,
/// `EDGE_N` points per edge.
fn build_contour(rc: &SpatialRect) -> Vec<Point2D> {
    let mut poly = Vec::with_capacity(EDGE_N * 4);
    for edge in 0..4 {
        let p1 = rc.corner(edge);
        let p2 = rc.corner(edge + 1);
        let dlat = p2.latitude - p1.latitude;
        let dlon = p2.longitude - p1.longitude;
        for i in 0..EDGE_N {
            let t = i as f64 / EDGE_N as f64;
            poly.push(transform::project_globe(SpatialPoint::new(
                p1.latitude + t * dlat,
                p1.longitude + t * dlon,
            )));
        }
    }
    poly
}

fn contour_bbox(poly: &[Point2D]) -> Rect2D {
    let mut bbox = Rect2D {
        lt: poly[0],
        rb: poly[0],
    };
    for p in &poly[1..] {
        bbox.lt.x = bbox.lt.x.min(p.x);
        bbox.lt.y = bbox.lt.y.min(p.y);
        bbox.rb.x = bbox.rb.x.max(p.x);
        bbox.rb.y = bbox.rb.y.max(p.y);
    }
    bbox
}

/// The angular radius check applied per candidate row: true when `p` lies
/// within `radius_meters` of `center`.
pub fn within_distance(
    center: SpatialPoint,
    p: SpatialPoint,
    radius_meters: f64,
    model: EarthModel,
) -> bool {
    transform::haversine(center, p, model) <= radius_meters
}

/// Rough sanity bound used by tests: the angular radius in degrees.
pub fn radius_degrees(radius_meters: f64, latitude: f64, model: EarthModel) -> f64 {
    RAD_TO_DEG * radius_meters / model.radius(latitude)
}
