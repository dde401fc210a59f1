use ndarray::prelude::*;

use crate::error::Error;
use crate::labeling::{BBox, Ltrb};

pub const GROUND_TRUTH_ROW_LEN: usize = 5;
pub const PREDICTION_ROW_LEN: usize = 6;

///
/// A labeled object present in the image.
///
/// class : C - Class identifier, compared by exact equality.
/// bbox : BBox in format `(x1, y1, x2, y2)`.
///
#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruthDetection<C> {
    pub class: C,
    pub bbox: BBox<Ltrb>,
}

///
/// A model-produced candidate box.
///
/// class : C - Predicted class identifier.
/// bbox : BBox in format `(x1, y1, x2, y2)`.
/// confidence : f32 - Detector confidence score, higher is more confident.
///
#[derive(Debug, Clone, PartialEq)]
pub struct PredictedDetection<C> {
    pub class: C,
    pub bbox: BBox<Ltrb>,
    pub confidence: f32,
}

impl<C> GroundTruthDetection<C> {
    #[inline]
    pub fn new(class: C, bbox: BBox<Ltrb>) -> Self {
        Self { class, bbox }
    }
}

impl<C> PredictedDetection<C> {
    #[inline]
    pub fn new(class: C, bbox: BBox<Ltrb>, confidence: f32) -> Self {
        Self { class, bbox, confidence }
    }
}

impl GroundTruthDetection<i64> {
    /// Parses a raw `[class, x1, y1, x2, y2]` row.
    ///
    /// `index` is only used to report which row was malformed.
    pub fn from_row(index: usize, row: ArrayView1<'_, f32>) -> Result<Self, Error> {
        check_len("ground truth", index, row, GROUND_TRUTH_ROW_LEN)?;

        Ok(Self {
            class: class_id("ground truth", index, row[0])?,
            bbox: BBox::ltrb(row[1], row[2], row[3], row[4]),
        })
    }
}

impl PredictedDetection<i64> {
    /// Parses a raw `[class, x1, y1, x2, y2, confidence]` row.
    pub fn from_row(index: usize, row: ArrayView1<'_, f32>) -> Result<Self, Error> {
        check_len("prediction", index, row, PREDICTION_ROW_LEN)?;

        Ok(Self {
            class: class_id("prediction", index, row[0])?,
            bbox: BBox::ltrb(row[1], row[2], row[3], row[4]),
            confidence: row[5],
        })
    }
}

/// Parses every row of a `(n, 5)` array into ground truths.
///
/// An array without rows is valid whatever its column count.
pub fn ground_truths_from_array(rows: ArrayView2<'_, f32>) -> Result<Vec<GroundTruthDetection<i64>>, Error> {
    rows.axis_iter(Axis(0))
        .enumerate()
        .map(|(index, row)| GroundTruthDetection::from_row(index, row))
        .collect()
}

/// Parses every row of a `(n, 6)` array into predictions.
pub fn predictions_from_array(rows: ArrayView2<'_, f32>) -> Result<Vec<PredictedDetection<i64>>, Error> {
    rows.axis_iter(Axis(0))
        .enumerate()
        .map(|(index, row)| PredictedDetection::from_row(index, row))
        .collect()
}

fn check_len(kind: &'static str, index: usize, row: ArrayView1<'_, f32>, expected: usize) -> Result<(), Error> {
    if row.len() != expected {
        return Err(Error::DimensionMismatch {
            kind,
            index,
            expected,
            found: row.len(),
        });
    }

    Ok(())
}

fn class_id(kind: &'static str, index: usize, value: f32) -> Result<i64, Error> {
    // i64::MAX rounds up to 2^63 as f32, which does not fit
    if !value.is_finite()
        || value.fract() != 0.0
        || value < i64::MIN as f32
        || value >= i64::MAX as f32
    {
        return Err(Error::InvalidClassId { kind, index, value });
    }

    Ok(value as i64)
}
