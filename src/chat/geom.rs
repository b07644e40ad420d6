use super::BBoxPx;

/// Intersection over union of the horizontal spans of two boxes.
pub(super) fn horizontal_overlap_ratio(a: &BBoxPx, b: &BBoxPx) -> f32 {
    let ix1 = a.x.max(b.x);
    let ix2 = a.right().min(b.right());
    if ix2 <= ix1 {
        return 0.0;
    }
    let inter = (ix2 - ix1) as f32;
    let union = (a.right().max(b.right()) - a.x.min(b.x)) as f32;
    inter / union.max(1.0)
}

pub(super) fn overlaps_horizontally(a: &BBoxPx, b: &BBoxPx) -> bool {
    a.x.max(b.x) < a.right().min(b.right())
}

pub(super) fn overlaps_vertically(a: &BBoxPx, b: &BBoxPx) -> bool {
    a.y.max(b.y) < a.bottom().min(b.bottom())
}

/// Signed gap between the bottom of `upper` and the top of `lower`.
/// Negative when the boxes overlap.
pub(super) fn vertical_gap(upper: &BBoxPx, lower: &BBoxPx) -> i64 {
    lower.y as i64 - upper.bottom() as i64
}

pub(super) fn union_bbox(a: &BBoxPx, b: &BBoxPx) -> BBoxPx {
    let x1 = a.x.min(b.x);
    let y1 = a.y.min(b.y);
    let x2 = a.right().max(b.right());
    let y2 = a.bottom().max(b.bottom());
    BBoxPx {
        x: x1,
        y: y1,
        w: x2 - x1,
        h: y2 - y1,
    }
}

/// Two boxes are near when they sit within `max_gap` pixels vertically
/// (or overlap) and share horizontal ground.
pub(super) fn is_near(a: &BBoxPx, b: &BBoxPx, max_gap: u32) -> bool {
    let (upper, lower) = if a.y <= b.y { (a, b) } else { (b, a) };
    let vertical_ok =
        overlaps_vertically(a, b) || vertical_gap(upper, lower) <= max_gap as i64;
    if !vertical_ok {
        return false;
    }
    let center_distance = (a.center_x() - b.center_x()).abs();
    let span = a.w.max(b.w) as f32;
    center_distance < span || overlaps_horizontally(a, b)
}
