use std::cmp::Ordering;

use crate::labeling::PredictedDetection;

/// Descending confidence comparison. NaN sorts after every number and ties
/// with other NaNs, `-0.0` ties with `0.0`.
#[inline]
pub fn by_confidence_desc(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Returns the permutation that sorts `detections` by decreasing confidence.
///
/// Element `k` of the result is the original index of the detection placed
/// at sorted position `k`. The sort is stable: equal confidences keep their
/// input order.
pub fn confidence_order<C>(detections: &[PredictedDetection<C>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..detections.len()).collect();
    order.sort_by(|&a, &b| by_confidence_desc(detections[a].confidence, detections[b].confidence));

    order
}

/// Moves values from sorted positions back to their original positions.
///
/// `sorted[k]` lands at `order[k]`, undoing the reordering described by
/// `order`. Both slices must have the same length.
pub fn restore_order<T: Clone>(sorted: &[T], order: &[usize]) -> Vec<T> {
    debug_assert_eq!(sorted.len(), order.len());

    let mut restored = sorted.to_vec();
    for (value, &original) in sorted.iter().zip(order.iter()) {
        restored[original] = value.clone();
    }

    restored
}
