pub mod labeling;
pub mod error;


pub use labeling::{
    BBox, Ltrb, Ltwh, Overlap, BoxIou,
    ErrorLabelType, LabelMatrix, GroundTruthDetection, PredictedDetection,
};
use labeling::{detection, ordering};
use error::Error;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorLabelingConfig {
    /// Minimum IoU for a prediction to count as overlapping a ground truth.
    pub iou_threshold: f32,
}

impl ErrorLabelingConfig {
    pub fn new(iou_threshold: f32) -> Self {
        Self {
            iou_threshold,
        }
    }

    fn validate(&self) -> Result<(), Error> {
        // NaN fails the range check too
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(Error::InvalidConfiguration(self.iou_threshold));
        }

        Ok(())
    }
}

impl Default for ErrorLabelingConfig {
    fn default() -> Self {
        Self::new(0.5)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LabelingState {
    Constructed,
    Computed,
}

/// Labels every (ground truth, prediction) pair of a single image.
///
/// Predictions are visited in decreasing confidence order so that the most
/// confident qualifying prediction of each ground truth becomes its `Match`
/// and later qualifying ones become `DuplicateDetection`. Results are stored
/// in the caller's input order on both axes.
///
/// A ground truth whose row ends up without a `Match` is missing; that is
/// reported through `missing()`, never as a cell value.
pub struct ErrorLabeling<C, O = BoxIou> {
    ground_truth: Vec<GroundTruthDetection<C>>,
    predictions: Vec<PredictedDetection<C>>,
    iou_threshold: f32,
    overlap: O,
    labels: LabelMatrix,
    state: LabelingState,
}

impl<C: PartialEq> ErrorLabeling<C, BoxIou> {
    pub fn new(
        ground_truth: Vec<GroundTruthDetection<C>>,
        predictions: Vec<PredictedDetection<C>>,
        config: ErrorLabelingConfig,
    ) -> Result<Self, Error> {
        Self::with_overlap(ground_truth, predictions, config, BoxIou)
    }
}

impl ErrorLabeling<i64, BoxIou> {
    /// Builds a labeler from raw arrays, ground truths as `(n, 5)` rows of
    /// `[class, x1, y1, x2, y2]` and predictions as `(m, 6)` rows of
    /// `[class, x1, y1, x2, y2, confidence]`.
    pub fn from_arrays(
        ground_truth: ArrayView2<'_, f32>,
        predictions: ArrayView2<'_, f32>,
        config: ErrorLabelingConfig,
    ) -> Result<Self, Error> {
        Self::new(
            detection::ground_truths_from_array(ground_truth)?,
            detection::predictions_from_array(predictions)?,
            config,
        )
    }
}

impl<C: PartialEq, O: Overlap> ErrorLabeling<C, O> {
    pub fn with_overlap(
        ground_truth: Vec<GroundTruthDetection<C>>,
        predictions: Vec<PredictedDetection<C>>,
        config: ErrorLabelingConfig,
        overlap: O,
    ) -> Result<Self, Error> {
        config.validate()?;

        let labels = LabelMatrix::unset(ground_truth.len(), predictions.len());

        Ok(Self {
            ground_truth,
            predictions,
            iou_threshold: config.iou_threshold,
            overlap,
            labels,
            state: LabelingState::Constructed,
        })
    }

    #[inline]
    pub fn ground_truth(&self) -> &[GroundTruthDetection<C>] {
        self.ground_truth.as_slice()
    }

    #[inline]
    pub fn predictions(&self) -> &[PredictedDetection<C>] {
        self.predictions.as_slice()
    }

    #[inline]
    pub fn iou_threshold(&self) -> f32 {
        self.iou_threshold
    }

    #[inline]
    pub fn state(&self) -> LabelingState {
        self.state
    }

    #[inline]
    pub fn is_computed(&self) -> bool {
        self.state == LabelingState::Computed
    }

    #[inline]
    pub fn labels(&self) -> &LabelMatrix {
        &self.labels
    }

    #[inline]
    pub fn into_labels(self) -> LabelMatrix {
        self.labels
    }

    #[inline]
    pub fn get(&self, gt: usize, pred: usize) -> Option<ErrorLabelType> {
        self.labels.get(gt, pred)
    }

    /// Ground truths without a matching prediction, empty before `compute`.
    pub fn missing(&self) -> Vec<usize> {
        if !self.is_computed() {
            return vec![];
        }

        self.labels.missing()
    }

    /// Labels every pair, replacing the result of any previous run.
    pub fn compute(&mut self) -> &LabelMatrix {
        let order = ordering::confidence_order(&self.predictions);
        let sorted: Vec<_> = order.iter().map(|&i| &self.predictions[i]).collect();
        let candidates: Vec<_> = sorted.iter().map(|d| &d.bbox).collect();

        let mut cells = Array2::from_elem(self.labels.shape(), None);

        for (gt_idx, gt) in self.ground_truth.iter().enumerate() {
            let ious = labeling::iou::iou_batch(&self.overlap, &gt.bbox, &candidates);
            let row = self.label_row(gt, &sorted, ious.view());

            log::trace!("ground truth #{}: {:?}", gt_idx, row);

            let row = ordering::restore_order(&row, &order);
            cells.row_mut(gt_idx).assign(&aview1(&row).mapv(Some));
        }

        self.labels = LabelMatrix::from_cells(cells);
        self.state = LabelingState::Computed;

        log::debug!(
            "labeled {} ground truths x {} predictions (iou_threshold = {}), {} missing",
            self.ground_truth.len(),
            self.predictions.len(),
            self.iou_threshold,
            self.labels.missing().len(),
        );

        &self.labels
    }

    /// Labels one ground truth against predictions in confidence order.
    fn label_row(
        &self,
        gt: &GroundTruthDetection<C>,
        sorted: &[&PredictedDetection<C>],
        ious: ArrayView1<'_, f32>,
    ) -> Vec<ErrorLabelType> {
        let mut matched = false;

        sorted
            .iter()
            .zip(ious.iter())
            .map(|(det, &iou)| {
                let same_class = det.class == gt.class;

                if iou == 0.0 {
                    ErrorLabelType::Background
                } else if self.iou_threshold <= iou {
                    if !same_class {
                        ErrorLabelType::ClassName
                    } else if matched {
                        ErrorLabelType::DuplicateDetection
                    } else {
                        matched = true;
                        ErrorLabelType::Match
                    }
                } else if !same_class {
                    ErrorLabelType::ClassLocalization
                } else {
                    ErrorLabelType::Localization
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labeling::ErrorLabelType::*;

    fn gt(class: &'static str, b: [f32; 4]) -> GroundTruthDetection<&'static str> {
        GroundTruthDetection::new(class, BBox::ltrb(b[0], b[1], b[2], b[3]))
    }

    fn pred(class: &'static str, b: [f32; 4], confidence: f32) -> PredictedDetection<&'static str> {
        PredictedDetection::new(class, BBox::ltrb(b[0], b[1], b[2], b[3]), confidence)
    }

    fn labeled(
        ground_truth: Vec<GroundTruthDetection<&'static str>>,
        predictions: Vec<PredictedDetection<&'static str>>,
    ) -> ErrorLabeling<&'static str> {
        let mut labeling = ErrorLabeling::new(ground_truth, predictions, Default::default()).unwrap();
        labeling.compute();
        labeling
    }

    fn row(labeling: &ErrorLabeling<&'static str>, gt: usize) -> Vec<Option<ErrorLabelType>> {
        labeling.labels().row(gt).to_vec()
    }

    #[test]
    fn duplicate_lands_at_original_index() {
        let labeling = labeled(
            vec![gt("dog", [0.0, 0.0, 10.0, 10.0])],
            vec![
                pred("dog", [0.0, 0.0, 10.0, 10.0], 0.9),
                pred("dog", [0.0, 0.0, 10.0, 10.0], 0.95),
            ],
        );

        assert_eq!(row(&labeling, 0), vec![Some(DuplicateDetection), Some(Match)]);
    }

    #[test]
    fn wrong_class_with_full_overlap() {
        let labeling = labeled(
            vec![gt("cat", [0.0, 0.0, 10.0, 10.0])],
            vec![pred("dog", [0.0, 0.0, 10.0, 10.0], 0.8)],
        );

        assert_eq!(labeling.get(0, 0), Some(ClassName));
        assert_eq!(labeling.missing(), vec![0]);
    }

    #[test]
    fn disjoint_is_background_regardless_of_class() {
        let labeling = labeled(
            vec![gt("cat", [0.0, 0.0, 10.0, 10.0])],
            vec![
                pred("cat", [20.0, 20.0, 30.0, 30.0], 0.8),
                pred("dog", [20.0, 20.0, 30.0, 30.0], 0.7),
            ],
        );

        assert_eq!(row(&labeling, 0), vec![Some(Background), Some(Background)]);
    }

    #[test]
    fn low_overlap_is_localization() {
        let labeling = labeled(
            vec![gt("cat", [0.0, 0.0, 10.0, 10.0])],
            vec![
                pred("cat", [5.0, 5.0, 15.0, 15.0], 0.8),
                pred("dog", [5.0, 5.0, 15.0, 15.0], 0.8),
            ],
        );

        assert_eq!(row(&labeling, 0), vec![Some(Localization), Some(ClassLocalization)]);
    }

    #[test]
    fn threshold_is_inclusive() {
        // iou of the prediction is exactly 0.5
        let labeling = labeled(
            vec![gt("cat", [0.0, 0.0, 10.0, 10.0])],
            vec![pred("cat", [0.0, 0.0, 10.0, 5.0], 0.8)],
        );

        assert_eq!(labeling.get(0, 0), Some(Match));
    }

    #[test]
    fn restores_non_involutive_order() {
        // confidence order is [2, 0, 1]
        let labeling = labeled(
            vec![gt("cat", [0.0, 0.0, 10.0, 10.0])],
            vec![
                pred("cat", [0.0, 0.0, 10.0, 10.0], 0.5),
                pred("cat", [5.0, 5.0, 15.0, 15.0], 0.1),
                pred("cat", [0.0, 0.0, 10.0, 10.0], 0.9),
            ],
        );

        assert_eq!(row(&labeling, 0), vec![Some(DuplicateDetection), Some(Localization), Some(Match)]);
    }

    #[test]
    fn equal_confidence_first_in_input_wins() {
        let labeling = labeled(
            vec![gt("cat", [0.0, 0.0, 10.0, 10.0])],
            vec![
                pred("cat", [0.0, 0.0, 10.0, 10.0], 0.7),
                pred("cat", [0.0, 0.0, 10.0, 10.0], 0.7),
            ],
        );

        assert_eq!(row(&labeling, 0), vec![Some(Match), Some(DuplicateDetection)]);
    }

    #[test]
    fn rows_are_independent() {
        let labeling = labeled(
            vec![
                gt("cat", [0.0, 0.0, 10.0, 10.0]),
                gt("dog", [100.0, 100.0, 110.0, 110.0]),
                gt("cat", [0.0, 0.0, 10.0, 10.0]),
            ],
            vec![
                pred("dog", [100.0, 100.0, 110.0, 110.0], 0.6),
                pred("cat", [0.0, 0.0, 10.0, 10.0], 0.9),
            ],
        );

        assert_eq!(row(&labeling, 0), vec![Some(Background), Some(Match)]);
        assert_eq!(row(&labeling, 1), vec![Some(Match), Some(Background)]);
        // a prediction may match several ground truths
        assert_eq!(row(&labeling, 2), vec![Some(Background), Some(Match)]);
        assert!(labeling.missing().is_empty());
    }

    #[test]
    fn at_most_one_match_per_row() {
        let predictions: Vec<_> = (0..8)
            .map(|i| pred("cat", [0.0, 0.0, 10.0, 10.0 - i as f32 * 0.5], (i % 3) as f32 / 3.0))
            .collect();
        let labeling = labeled(vec![gt("cat", [0.0, 0.0, 10.0, 10.0])], predictions);

        let r = row(&labeling, 0);
        assert_eq!(r.iter().filter(|&&l| l == Some(Match)).count(), 1);
        assert_eq!(r.iter().filter(|&&l| l == Some(DuplicateDetection)).count(), 7);
        // the match is the first of the 0.667 confidence predictions
        assert_eq!(r[2], Some(Match));
    }

    #[test]
    fn compute_is_idempotent() {
        let mut labeling = ErrorLabeling::new(
            vec![gt("cat", [0.0, 0.0, 10.0, 10.0]), gt("dog", [5.0, 5.0, 20.0, 20.0])],
            vec![
                pred("cat", [1.0, 1.0, 10.0, 10.0], 0.3),
                pred("dog", [5.0, 5.0, 19.0, 19.0], 0.8),
                pred("cat", [0.0, 0.0, 9.0, 9.0], 0.3),
            ],
            ErrorLabelingConfig::default(),
        ).unwrap();

        assert_eq!(labeling.state(), LabelingState::Constructed);
        let first = labeling.compute().clone();
        assert_eq!(labeling.state(), LabelingState::Computed);
        let second = labeling.compute().clone();

        assert_eq!(first, second);
        assert!(first.is_complete());
    }

    #[test]
    fn unset_before_compute() {
        let labeling = ErrorLabeling::new(
            vec![gt("cat", [0.0, 0.0, 10.0, 10.0])],
            vec![pred("cat", [0.0, 0.0, 10.0, 10.0], 0.5)],
            ErrorLabelingConfig::default(),
        ).unwrap();

        assert!(!labeling.is_computed());
        assert_eq!(labeling.labels().shape(), (1, 1));
        assert_eq!(labeling.get(0, 0), None);
        assert!(labeling.missing().is_empty());
    }

    #[test]
    fn empty_inputs() {
        let labeling = labeled(vec![], vec![pred("cat", [0.0, 0.0, 1.0, 1.0], 0.5)]);
        assert_eq!(labeling.labels().shape(), (0, 1));

        let labeling = labeled(vec![gt("cat", [0.0, 0.0, 1.0, 1.0])], vec![]);
        assert_eq!(labeling.labels().shape(), (1, 0));
        assert_eq!(labeling.missing(), vec![0]);

        let labeling = labeled(vec![], vec![]);
        assert_eq!(labeling.labels().shape(), (0, 0));
        assert!(labeling.is_computed());
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        for &t in &[-0.1f32, 1.5, f32::NAN] {
            let res = ErrorLabeling::<&str>::new(vec![], vec![], ErrorLabelingConfig::new(t));
            assert!(matches!(res, Err(Error::InvalidConfiguration(_))));
        }

        for &t in &[0.0f32, 1.0] {
            assert!(ErrorLabeling::<&str>::new(vec![], vec![], ErrorLabelingConfig::new(t)).is_ok());
        }
    }

    #[test]
    fn zero_threshold_still_separates_background() {
        let mut labeling = ErrorLabeling::new(
            vec![gt("cat", [0.0, 0.0, 10.0, 10.0])],
            vec![
                pred("cat", [9.0, 9.0, 19.0, 19.0], 0.9),
                pred("cat", [50.0, 50.0, 60.0, 60.0], 0.8),
            ],
            ErrorLabelingConfig::new(0.0),
        ).unwrap();
        labeling.compute();

        assert_eq!(labeling.labels().row(0).to_vec(), vec![Some(Match), Some(Background)]);
    }

    #[test]
    fn custom_overlap() {
        let overlap = |a: &BBox<Ltrb>, b: &BBox<Ltrb>| if a == b { 0.3f32 } else { 0.0 };
        let mut labeling = ErrorLabeling::with_overlap(
            vec![gt("cat", [0.0, 0.0, 10.0, 10.0])],
            vec![pred("cat", [0.0, 0.0, 10.0, 10.0], 0.9)],
            ErrorLabelingConfig::new(0.25),
            overlap,
        ).unwrap();
        labeling.compute();

        assert_eq!(labeling.get(0, 0), Some(Match));
    }

    #[test]
    fn nan_overlap_is_localization() {
        let overlap = |_: &BBox<Ltrb>, _: &BBox<Ltrb>| f32::NAN;
        let mut labeling = ErrorLabeling::with_overlap(
            vec![gt("cat", [0.0, 0.0, 10.0, 10.0])],
            vec![
                pred("cat", [0.0, 0.0, 10.0, 10.0], 0.9),
                pred("dog", [0.0, 0.0, 10.0, 10.0], 0.8),
            ],
            ErrorLabelingConfig::default(),
            overlap,
        ).unwrap();
        labeling.compute();

        assert_eq!(labeling.labels().row(0).to_vec(), vec![Some(Localization), Some(ClassLocalization)]);
        assert_eq!(labeling.missing(), vec![0]);
    }

    #[test]
    fn from_arrays_rejects_unrepresentable_class() {
        let ground_truth = arr2(&[[1e19, 0.0, 0.0, 10.0, 10.0]]);
        let predictions = arr2(&[[1e20, 0.0, 0.0, 10.0, 10.0, 0.9]]);

        let res = ErrorLabeling::from_arrays(ground_truth.view(), predictions.view(), Default::default());
        assert!(matches!(
            res,
            Err(Error::InvalidClassId { kind: "ground truth", index: 0, .. })
        ));
    }

    #[test]
    fn from_arrays() -> anyhow::Result<()> {
        let ground_truth = arr2(&[[1.0, 0.0, 0.0, 10.0, 10.0]]);
        let predictions = arr2(&[
            [1.0, 0.0, 0.0, 10.0, 10.0, 0.9],
            [2.0, 0.0, 0.0, 10.0, 10.0, 0.95],
            [1.0, 0.0, 0.0, 10.0, 10.0, 0.99],
        ]);

        let mut labeling = ErrorLabeling::from_arrays(ground_truth.view(), predictions.view(), Default::default())?;
        labeling.compute();

        assert_eq!(
            labeling.labels().row(0).to_vec(),
            vec![Some(DuplicateDetection), Some(ClassName), Some(Match)]
        );
        Ok(())
    }

    #[test]
    fn from_arrays_rejects_malformed_rows() {
        let ground_truth = arr2(&[[1.0, 0.0, 0.0, 10.0, 10.0]]);
        let predictions = arr2(&[[1.0, 0.0, 0.0, 10.0, 10.0]]);

        let res = ErrorLabeling::from_arrays(ground_truth.view(), predictions.view(), Default::default());
        assert!(matches!(
            res,
            Err(Error::DimensionMismatch { kind: "prediction", index: 0, expected: 6, found: 5 })
        ));
    }

    #[test]
    fn config_defaults_from_serde() -> anyhow::Result<()> {
        let config: ErrorLabelingConfig = serde_json::from_str("{}")?;
        assert_eq!(config.iou_threshold, 0.5);

        let config: ErrorLabelingConfig = serde_json::from_str(r#"{"iou_threshold": 0.75}"#)?;
        assert_eq!(config.iou_threshold, 0.75);
        Ok(())
    }

    #[test]
    fn instances_run_in_parallel() {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                std::thread::spawn(move || {
                    let offset = i as f32 * 10.0;
                    let mut labeling = ErrorLabeling::new(
                        vec![GroundTruthDetection::new(i, BBox::ltrb(offset, 0.0, offset + 10.0, 10.0))],
                        vec![PredictedDetection::new(i, BBox::ltrb(offset, 0.0, offset + 10.0, 10.0), 0.5)],
                        ErrorLabelingConfig::default(),
                    ).unwrap();
                    labeling.compute();
                    labeling.into_labels()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().get(0, 0), Some(Match));
        }
    }
}
