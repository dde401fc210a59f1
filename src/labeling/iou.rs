use ndarray::prelude::*;

use crate::labeling::{BBox, Ltrb, Overlap};

/// Compute intersection over union of two boxes.
///
/// Parameters
/// ----------
/// a, b : BBox<Ltrb>
///     Boxes in format `(x1, y1, x2, y2)`.
///
/// Returns
/// -------
/// f32
///     The intersection over union in [0, 1]. Disjoint or touching boxes
///     yield exactly `0.0`, as does a pair whose union has no area.
///
pub fn iou(a: &BBox<Ltrb>, b: &BBox<Ltrb>) -> f32 {
    let i_xmin = a.left().max(b.left());
    let i_ymin = a.top().max(b.top());

    let i_xmax = a.right().min(b.right());
    let i_ymax = a.bottom().min(b.bottom());

    let intersection_area = (i_xmax - i_xmin).max(0.0) * (i_ymax - i_ymin).max(0.0);
    if intersection_area == 0.0 {
        return 0.0;
    }

    let union_area = a.area() + b.area() - intersection_area;
    if union_area <= 0.0 {
        return 0.0;
    }

    intersection_area / union_area
}

/// Computes the overlap between `bbox` and each of the `candidates`.
///
/// Returns an array with one entry per candidate, in candidate order.
pub fn iou_batch<O: Overlap + ?Sized>(overlap: &O, bbox: &BBox<Ltrb>, candidates: &[&BBox<Ltrb>]) -> Array1<f32> {
    candidates
        .iter()
        .map(|c| overlap.overlap(c, bbox))
        .collect()
}

/// Default overlap primitive, plain box IoU.
#[derive(Debug, Default, Copy, Clone)]
pub struct BoxIou;

impl Overlap for BoxIou {
    #[inline]
    fn overlap(&self, a: &BBox<Ltrb>, b: &BBox<Ltrb>) -> f32 {
        iou(a, b)
    }
}
