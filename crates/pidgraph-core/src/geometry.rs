//! Planar helpers shared by the assembler and perception post-processing.

use crate::model::{BoundingBox, Point};

/// Real-valued point; centres of odd-sized boxes land on half pixels.
pub type PointF = (f64, f64);

pub fn bbox_center(bbox: &BoundingBox) -> PointF {
    (
        bbox.x as f64 + bbox.w as f64 / 2.0,
        bbox.y as f64 + bbox.h as f64 / 2.0,
    )
}

pub fn to_f(p: Point) -> PointF {
    (p.0 as f64, p.1 as f64)
}

/// Euclidean distance.
pub fn distance(a: PointF, b: PointF) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Midpoint of two integer points.
pub fn midpoint(a: Point, b: Point) -> PointF {
    ((a.0 + b.0) as f64 / 2.0, (a.1 + b.1) as f64 / 2.0)
}

/// Index of the candidate closest to `origin` whose distance is strictly
/// below `max_dist`. Ties keep the earliest candidate.
pub fn nearest_within<I>(origin: PointF, candidates: I, max_dist: f64) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = PointF>,
{
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in candidates.into_iter().enumerate() {
        let d = distance(origin, c);
        if d >= max_dist {
            continue;
        }
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best
}

/// Overlap of `other` with `keep`, as a fraction of `other`'s area.
/// Extents are inclusive pixel ranges, so a `w x h` box covers `(w+1)(h+1)` pixels.
pub fn overlap_ratio(keep: &BoundingBox, other: &BoundingBox) -> f64 {
    let xx1 = keep.x.max(other.x);
    let yy1 = keep.y.max(other.y);
    let xx2 = (keep.x + keep.w).min(other.x + other.w);
    let yy2 = (keep.y + keep.h).min(other.y + other.h);

    let w = (xx2 - xx1 + 1).max(0);
    let h = (yy2 - yy1 + 1).max(0);
    let area = (other.w + 1) * (other.h + 1);
    if area <= 0 {
        return 0.0;
    }
    (w * h) as f64 / area as f64
}
