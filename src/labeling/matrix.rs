use std::collections::HashMap;

use ndarray::prelude::*;

use crate::labeling::ErrorLabelType;

/// Labels of every (ground truth, prediction) pair of one image.
///
/// Rows follow the ground-truth input order, columns the prediction input
/// order. `None` marks a cell that has not been computed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMatrix {
    cells: Array2<Option<ErrorLabelType>>,
}

impl LabelMatrix {
    pub fn unset(ground_truths: usize, predictions: usize) -> Self {
        Self {
            cells: Array2::from_elem((ground_truths, predictions), None),
        }
    }

    pub(crate) fn from_cells(cells: Array2<Option<ErrorLabelType>>) -> Self {
        Self { cells }
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.cells.dim()
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.cells.nrows()
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.cells.ncols()
    }

    /// Label of ground truth `gt` against prediction `pred`, `None` when
    /// either index is out of range or the cell is unset.
    #[inline]
    pub fn get(&self, gt: usize, pred: usize) -> Option<ErrorLabelType> {
        self.cells.get((gt, pred)).copied().flatten()
    }

    /// Labels of one ground truth, in prediction input order.
    ///
    /// Panics if `gt` is out of range, like `ArrayBase::row`.
    #[inline]
    pub fn row(&self, gt: usize) -> ArrayView1<'_, Option<ErrorLabelType>> {
        self.cells.row(gt)
    }

    #[inline]
    pub fn view(&self) -> ArrayView2<'_, Option<ErrorLabelType>> {
        self.cells.view()
    }

    #[inline]
    pub fn into_inner(self) -> Array2<Option<ErrorLabelType>> {
        self.cells
    }

    /// Returns true if no cell is unset.
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Returns true if some prediction matched ground truth `gt`, false when
    /// `gt` is out of range.
    #[inline]
    pub fn has_match(&self, gt: usize) -> bool {
        (0..self.ncols()).any(|pred| self.get(gt, pred) == Some(ErrorLabelType::Match))
    }

    /// Indices of ground truths that no prediction matched.
    ///
    /// Only meaningful on a computed matrix; every row of an unset matrix is
    /// reported.
    pub fn missing(&self) -> Vec<usize> {
        (0..self.nrows())
            .filter(|&gt| !self.has_match(gt))
            .collect()
    }

    /// Number of cells per label, plus one `Missing` per ground truth
    /// without a match. Unset cells are not counted.
    pub fn label_counts(&self) -> HashMap<ErrorLabelType, usize> {
        let mut counts = HashMap::new();

        for label in self.cells.iter().flatten() {
            *counts.entry(*label).or_insert(0) += 1;
        }

        let missing = self.missing().len();
        if missing > 0 {
            counts.insert(ErrorLabelType::Missing, missing);
        }

        counts
    }
}
