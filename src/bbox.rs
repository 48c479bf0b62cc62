use ndarray::Array2;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

pub trait BBoxFormat: fmt::Debug + Copy + PartialEq {}

/// Left-top-right-bottom format, contains left top and right bottom corners
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}

/// X-y-aspect_ratio-height format, contains coordinates of the center of bbox and aspect_ratio-height
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Xyah;
impl BBoxFormat for Xyah {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox<F: BBoxFormat>([f32; 4], PhantomData<F>);

impl<F: BBoxFormat> From<BBox<F>> for [f32; 4] {
    fn from(bbox: BBox<F>) -> Self {
        bbox.0
    }
}

impl<F: BBoxFormat> BBox<F> {
    #[inline]
    pub fn as_slice(&self) -> &[f32; 4] {
        &self.0
    }

    // Use carefully when you REALLY sure that slice have needed format
    #[inline(always)]
    pub fn assigned(slice: &[f32; 4]) -> Self {
        BBox(*slice, PhantomData)
    }
}

impl<F: BBoxFormat> Serialize for BBox<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, F: BBoxFormat> Deserialize<'de> for BBox<F> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <[f32; 4]>::deserialize(deserializer).map(|raw| BBox(raw, PhantomData))
    }
}

impl BBox<Ltrb> {
    #[inline]
    pub fn ltrb(x1: f32, x2: f32, x3: f32, x4: f32) -> Self {
        BBox([x1, x2, x3, x4], PhantomData)
    }

    #[inline]
    pub fn as_xyah(&self) -> BBox<Xyah> {
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

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.0[2] - self.0[0]
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.0[3] - self.0[1]
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Finite, non-negative corners spanning a positive area.
    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|v| v.is_finite() && *v >= 0.0) && self.width() > 0.0 && self.height() > 0.0
    }

    pub fn iou(&self, other: &BBox<Ltrb>) -> f32 {
        let i_w = (self.right().min(other.right()) - self.left().max(other.left())).max(0.0);
        let i_h = (self.bottom().min(other.bottom()) - self.top().max(other.top())).max(0.0);
        let i_area = i_w * i_h;
        let union = self.area() + other.area() - i_area;

        if union <= 0.0 {
            0.0
        } else {
            i_area / union
        }
    }

    /// True when all four corners of `inner` lie within this box grown by `margin` px.
    pub fn contains(&self, inner: &BBox<Ltrb>, margin: f32) -> bool {
        inner.left() >= self.left() - margin
            && inner.top() >= self.top() - margin
            && inner.right() <= self.right() + margin
            && inner.bottom() <= self.bottom() + margin
    }
}

impl BBox<Xyah> {
    #[inline]
    pub fn xyah(x1: f32, x2: f32, x3: f32, x4: f32) -> Self {
        BBox([x1, x2, x3, x4], PhantomData)
    }

    #[inline(always)]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }

    #[inline(always)]
    pub fn cx(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn cy(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn aspect_ratio(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.0[3]
    }
}

impl<'a> From<&'a BBox<Ltrb>> for BBox<Xyah> {
    #[inline]
    fn from(v: &'a BBox<Ltrb>) -> Self {
        Self(
            [
                v.0[0] + (v.0[2] - v.0[0]) / 2.0,
                v.0[1] + (v.0[3] - v.0[1]) / 2.0,
                (v.0[2] - v.0[0]) / (v.0[3] - v.0[1]),
                v.0[3] - v.0[1],
            ],
            PhantomData,
        )
    }
}

impl<'a> From<&'a BBox<Xyah>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Xyah>) -> Self {
        let half_w = v.0[2] * v.0[3] / 2.;
        let half_h = v.0[3] / 2.;

        Self(
            [
                v.0[0] - half_w,
                v.0[1] - half_h,
                v.0[0] + half_w,
                v.0[1] + half_h,
            ],
            PhantomData,
        )
    }
}

/// IoU matrix with one row per `rows` box and one column per `cols` box.
pub fn ious(rows: &[BBox<Ltrb>], cols: &[BBox<Ltrb>]) -> Array2<f32> {
    Array2::from_shape_fn((rows.len(), cols.len()), |(r, c)| rows[r].iou(&cols[c]))
}
