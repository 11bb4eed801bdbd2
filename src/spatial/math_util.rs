//! # Planar Predicates
//!
//! Point/segment/rectangle/polygon predicates in the unit square, used to
//! classify grid cells against a projected query contour.

use crate::spatial::{Point2D, Rect2D};

/// How a closed contour relates to a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contains {
    /// Disjoint.
    None,
    /// Boundaries cross.
    Intersect,
    /// The rectangle lies fully inside the contour.
    RectInside,
    /// The contour lies fully inside the rectangle.
    PolyInside,
}

pub fn point_inside(p: Point2D, rc: &Rect2D) -> bool {
    p.x >= rc.lt.x && p.x <= rc.rb.x && p.y >= rc.lt.y && p.y <= rc.rb.y
}

#[inline]
fn cross(o: Point2D, a: Point2D, b: Point2D) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

#[inline]
fn on_segment(a: Point2D, b: Point2D, p: Point2D) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Whether segments `(a, b)` and `(c, d)` intersect, touching included.
pub fn line_intersect(a: Point2D, b: Point2D, c: Point2D, d: Point2D) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(c, d, a))
        || (d2 == 0.0 && on_segment(c, d, b))
        || (d3 == 0.0 && on_segment(a, b, c))
        || (d4 == 0.0 && on_segment(a, b, d))
}

/// Whether segment `(a, b)` touches the rectangle anywhere.
pub fn line_rect_intersect(a: Point2D, b: Point2D, rc: &Rect2D) -> bool {
    if point_inside(a, rc) || point_inside(b, rc) {
        return true;
    }
    let corners = rect_corners(rc);
    for i in 0..4 {
        if line_intersect(a, b, corners[i], corners[(i + 1) % 4]) {
            return true;
        }
    }
    false
}

pub fn rect_corners(rc: &Rect2D) -> [Point2D; 4] {
    [
        rc.lt,
        Point2D::new(rc.rb.x, rc.lt.y),
        rc.rb,
        Point2D::new(rc.lt.x, rc.rb.y),
    ]
}

/// Ray-casting point-in-polygon over a closed contour.
pub fn polygon_contains_point(poly: &[Point2D], p: Point2D) -> bool {
    let mut inside = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let pi = poly[i];
        let pj = poly[j];
        if (pi.y > p.y) != (pj.y > p.y)
            && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Classifies a contour against a rectangle.
pub fn contains(poly: &[Point2D], rc: &Rect2D) -> Contains {
    debug_assert!(poly.len() >= 3);
    let corners = rect_corners(rc);
    for i in 0..poly.len() {
        let a = poly[i];
        let b = poly[(i + 1) % poly.len()];
        for j in 0..4 {
            if line_intersect(a, b, corners[j], corners[(j + 1) % 4]) {
                return Contains::Intersect;
            }
        }
    }
    // no boundary crossing: containment is all-or-nothing either way
    if corners.iter().all(|c| polygon_contains_point(poly, *c)) {
        return Contains::RectInside;
    }
    if point_inside(poly[0], rc) {
        return Contains::PolyInside;
    }
    Contains::None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect2D {
        Rect2D {
            lt: Point2D::new(x0, y0),
            rb: Point2D::new(x1, y1),
        }
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2D> {
        vec![
            Point2D::new(x0, y0),
            Point2D::new(x1, y0),
            Point2D::new(x1, y1),
            Point2D::new(x0, y1),
        ]
    }

    #[test]
    fn segment_intersection() {
        let o = Point2D::new(0.0, 0.0);
        let e = Point2D::new(1.0, 1.0);
        assert!(line_intersect(
            o,
            e,
            Point2D::new(0.0, 1.0),
            Point2D::new(1.0, 0.0)
        ));
        assert!(!line_intersect(
            o,
            Point2D::new(0.4, 0.4),
            Point2D::new(0.0, 1.0),
            Point2D::new(1.0, 0.6)
        ));
        // touching endpoint counts
        assert!(line_intersect(
            o,
            e,
            e,
            Point2D::new(2.0, 0.0)
        ));
    }

    #[test]
    fn segment_rect() {
        let rc = rect(0.25, 0.25, 0.75, 0.75);
        assert!(line_rect_intersect(
            Point2D::new(0.0, 0.5),
            Point2D::new(1.0, 0.5),
            &rc
        ));
        assert!(line_rect_intersect(
            Point2D::new(0.3, 0.3),
            Point2D::new(0.4, 0.4),
            &rc
        ));
        assert!(!line_rect_intersect(
            Point2D::new(0.0, 0.0),
            Point2D::new(0.1, 0.9),
            &rc
        ));
    }

    #[test]
    fn ray_casting() {
        let poly = square(0.0, 0.0, 1.0, 1.0);
        assert!(polygon_contains_point(&poly, Point2D::new(0.5, 0.5)));
        assert!(!polygon_contains_point(&poly, Point2D::new(1.5, 0.5)));
    }

    #[test]
    fn classify_rect_inside() {
        let poly = square(0.0, 0.0, 1.0, 1.0);
        assert_eq!(
            contains(&poly, &rect(0.4, 0.4, 0.6, 0.6)),
            Contains::RectInside
        );
    }

    #[test]
    fn classify_intersect() {
        let poly = square(0.0, 0.0, 1.0, 1.0);
        assert_eq!(
            contains(&poly, &rect(0.9, 0.9, 1.2, 1.2)),
            Contains::Intersect
        );
    }

    #[test]
    fn classify_disjoint() {
        let poly = square(0.0, 0.0, 0.4, 0.4);
        assert_eq!(contains(&poly, &rect(0.6, 0.6, 0.9, 0.9)), Contains::None);
    }

    #[test]
    fn classify_poly_inside() {
        let poly = square(0.45, 0.45, 0.55, 0.55);
        assert_eq!(
            contains(&poly, &rect(0.0, 0.0, 1.0, 1.0)),
            Contains::PolyInside
        );
    }
}
