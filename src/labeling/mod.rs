pub mod detection;
pub mod iou;
pub mod label;
pub mod matrix;
pub mod ordering;

pub use detection::{GroundTruthDetection, PredictedDetection};
pub use iou::BoxIou;
pub use label::ErrorLabelType;
pub use matrix::LabelMatrix;

use core::marker::PhantomData;
use ndarray::prelude::*;

pub trait BBoxFormat: std::fmt::Debug {}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ltwh;
impl BBoxFormat for Ltwh {}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}


/// Axis-aligned box, four scalars in the convention given by `F`.
#[derive(Debug, Clone, PartialEq)]
pub struct BBox<F: BBoxFormat>([f32; 4], PhantomData<F>);
impl<F: BBoxFormat> BBox<F> {
    #[inline]
    pub fn as_view(&self) -> ArrayView1<'_, f32> {
        aview1(&self.0)
    }

    #[inline]
    pub fn to_array(&self) -> [f32; 4] {
        self.0
    }
}

impl BBox<Ltwh> {
    #[inline]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }

    #[inline]
    pub fn ltwh(x1: f32, x2: f32, x3: f32, x4: f32) -> Self {
        BBox(
            [x1, x2, x3, x4],
            Default::default(),
        )
    }
}

impl BBox<Ltrb> {
    #[inline]
    pub fn ltrb(x1: f32, x2: f32, x3: f32, x4: f32) -> Self {
        BBox(
            [x1, x2, x3, x4],
            Default::default(),
        )
    }

    #[inline]
    pub fn as_ltwh(&self) -> BBox<Ltwh> {
        self.into()
    }

    #[inline(always)]
    pub fn left(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> f32 {
        self.0[3]
    }

    /// Area of the box, zero for inverted or degenerate boxes.
    #[inline]
    pub fn area(&self) -> f32 {
        (self.right() - self.left()).max(0.0) * (self.bottom() - self.top()).max(0.0)
    }
}

impl <'a> From<&'a BBox<Ltwh>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Ltwh>) -> Self {
        Self([
            v.0[0],
            v.0[1],
            v.0[2] + v.0[0],
            v.0[3] + v.0[1],
        ], Default::default())
    }
}

impl <'a> From<&'a BBox<Ltrb>> for BBox<Ltwh> {
    #[inline]
    fn from(v: &'a BBox<Ltrb>) -> Self {
        Self([
            v.0[0],
            v.0[1],
            v.0[2] - v.0[0],
            v.0[3] - v.0[1],
        ], Default::default())
    }
}

/// Overlap primitive used to compare a prediction against a ground truth.
///
/// Implementations must return a ratio in `[0, 1]`, where `0.0` means the
/// boxes are disjoint. Any `Fn(&BBox<Ltrb>, &BBox<Ltrb>) -> f32` qualifies.
pub trait Overlap {
    fn overlap(&self, a: &BBox<Ltrb>, b: &BBox<Ltrb>) -> f32;
}

impl<T> Overlap for T
    where T: Fn(&BBox<Ltrb>, &BBox<Ltrb>) -> f32
{
    #[inline]
    fn overlap(&self, a: &BBox<Ltrb>, b: &BBox<Ltrb>) -> f32 {
        self(a, b)
    }
}

#[test]
fn bbox_format_conversion_test() {
    let ltwh = BBox::ltwh(2.0, 3.0, 10.0, 4.0);
    let ltrb = ltwh.as_ltrb();

    assert_eq!(ltrb.to_array(), [2.0, 3.0, 12.0, 7.0]);
    assert_eq!(ltrb.as_ltwh(), ltwh);
    assert_eq!(ltrb.as_view(), aview1(&[2.0f32, 3.0, 12.0, 7.0]));
    assert_eq!(ltrb.area(), 40.0);
}

#[test]
fn inverted_bbox_has_no_area_test() {
    assert_eq!(BBox::ltrb(10.0, 10.0, 0.0, 0.0).area(), 0.0);
}

#[test]
fn closure_overlap_test() {
    let always_half = |_: &BBox<Ltrb>, _: &BBox<Ltrb>| 0.5f32;
    let b = BBox::ltrb(0.0, 0.0, 1.0, 1.0);

    assert_eq!(always_half.overlap(&b, &b), 0.5);
}
