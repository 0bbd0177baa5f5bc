//! Floating-point bounding boxes as reported by collaborators.

use std::marker::PhantomData;

use super::rect::Rect;
use super::{Normalized, Pixel};

/// An axis-aligned bounding box in XYXY format (xmin, ymin, xmax, ymax).
///
/// The `TSpace` parameter should be either [`Pixel`] or [`Normalized`], so a
/// YOLO-normalized box cannot be passed where pixel coordinates are expected.
///
/// Collaborators may report boxes that are unordered, partially outside the
/// image, or not finite. This type represents them as-is; [`BBox::clamp_to`]
/// is the single place where they become a valid [`Rect`].
#[derive(Clone, Copy, PartialEq)]
pub struct BBox<TSpace> {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> BBox<TSpace> {
    /// Creates a new bounding box from explicit coordinates.
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            _space: PhantomData,
        }
    }

    /// Converts from XYWH format where (x, y) is the top-left corner.
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_xyxy(x, y, x + width, y + height)
    }

    /// Converts from center format (cx, cy, width, height), as used by YOLO.
    #[inline]
    pub fn from_cxcywh(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        Self::from_xyxy(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }

    /// Smallest box containing every point of a polygon.
    ///
    /// Returns `None` for an empty polygon.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut points = points.into_iter();
        let (x0, y0) = points.next()?;
        let mut bbox = Self::from_xyxy(x0, y0, x0, y0);
        for (x, y) in points {
            bbox.xmin = bbox.xmin.min(x);
            bbox.ymin = bbox.ymin.min(y);
            bbox.xmax = bbox.xmax.max(x);
            bbox.ymax = bbox.ymax.max(y);
        }
        Some(bbox)
    }

    /// Returns the width of the bounding box.
    ///
    /// May be negative if the box is malformed (xmax < xmin).
    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Returns the height of the bounding box.
    ///
    /// May be negative if the box is malformed (ymax < ymin).
    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Returns true if all coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.xmin.is_finite() && self.ymin.is_finite() && self.xmax.is_finite() && self.ymax.is_finite()
    }
}

impl<TSpace> std::fmt::Debug for BBox<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBox")
            .field("xmin", &self.xmin)
            .field("ymin", &self.ymin)
            .field("xmax", &self.xmax)
            .field("ymax", &self.ymax)
            .finish()
    }
}

impl BBox<Normalized> {
    /// Converts normalized coordinates to pixel coordinates.
    pub fn to_pixel(&self, image_width: u32, image_height: u32) -> BBox<Pixel> {
        let w = image_width as f64;
        let h = image_height as f64;
        BBox::from_xyxy(self.xmin * w, self.ymin * h, self.xmax * w, self.ymax * h)
    }
}

impl BBox<Pixel> {
    /// Clamps the box into a `image_width` x `image_height` image and rounds
    /// it to whole pixels.
    ///
    /// Unordered corners are swapped. Returns `None` when the box is not
    /// finite or has no area left once clamped.
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Option<Rect> {
        if !self.is_finite() {
            return None;
        }

        let w = image_width as f64;
        let h = image_height as f64;

        let x0 = self.xmin.min(self.xmax).clamp(0.0, w).round();
        let x1 = self.xmin.max(self.xmax).clamp(0.0, w).round();
        let y0 = self.ymin.min(self.ymax).clamp(0.0, h).round();
        let y1 = self.ymin.max(self.ymax).clamp(0.0, h).round();

        Rect::new(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
    }
}
