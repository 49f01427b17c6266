//! Regions of interest in pixel space.
//!
//! A [`Region`] is an axis-aligned box with its origin at the top-left of the
//! frame. Regions are plain values: detections produce them, the encode
//! graph copies their coordinates verbatim into `addroi` / `drawbox`
//! directives. Nothing here clips a region to the frame; that is left to the
//! encoder.

use serde::{Deserialize, Serialize};

/// One detection result: an axis-aligned box in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    /// Left edge x-coordinate
    pub x: i32,
    /// Top edge y-coordinate
    pub y: i32,
    /// Box width
    pub w: i32,
    /// Box height
    pub h: i32,
}

/// The regions detected in one sampled frame.
pub type RegionSet = Vec<Region>;

impl Region {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Right edge x-coordinate (exclusive).
    #[inline]
    pub fn x2(&self) -> i64 {
        i64::from(self.x) + i64::from(self.w)
    }

    /// Bottom edge y-coordinate (exclusive).
    #[inline]
    pub fn y2(&self) -> i64 {
        i64::from(self.y) + i64::from(self.h)
    }

    /// Box area in pixels; zero for degenerate (non-positive) sizes.
    #[inline]
    pub fn area(&self) -> i64 {
        if self.w <= 0 || self.h <= 0 {
            0
        } else {
            i64::from(self.w) * i64::from(self.h)
        }
    }

    /// Compute Intersection over Union with another region.
    ///
    /// Symmetric, bounded in `[0, 1]`; identical non-empty regions give `1.0`
    /// and regions without spatial overlap give `0.0`.
    pub fn iou(&self, other: &Region) -> f64 {
        let x1 = i64::from(self.x).max(i64::from(other.x));
        let y1 = i64::from(self.y).max(i64::from(other.y));
        let x2 = self.x2().min(other.x2());
        let y2 = self.y2().min(other.y2());

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = (x2 - x1) * (y2 - y1);
        let union = self.area() + other.area() - intersection;

        if union > 0 {
            intersection as f64 / union as f64
        } else {
            0.0
        }
    }

    /// Parses `"x,y,w,h"`.
    pub fn parse_csv(s: &str) -> Option<Region> {
        let parts: Vec<i32> = s
            .split(',')
            .map(|p| p.trim().parse::<i32>())
            .collect::<Result<_, _>>()
            .ok()?;
        match parts.as_slice() {
            [x, y, w, h] => Some(Region::new(*x, *y, *w, *h)),
            _ => None,
        }
    }
}

/// Fraction of the frame covered by the union of `regions`, clipped to the frame.
pub fn frame_coverage(regions: &[Region], width: u32, height: u32) -> f64 {
    let frame_area = u64::from(width) * u64::from(height);
    if frame_area == 0 || regions.is_empty() {
        return 0.0;
    }

    let (w, h) = (width as usize, height as usize);
    let mut mask = vec![false; w * h];
    for region in regions {
        let x0 = i64::from(region.x).clamp(0, w as i64) as usize;
        let y0 = i64::from(region.y).clamp(0, h as i64) as usize;
        let x1 = region.x2().clamp(0, w as i64) as usize;
        let y1 = region.y2().clamp(0, h as i64) as usize;
        if x1 <= x0 || y1 <= y0 {
            continue;
        }
        for row in y0..y1 {
            mask[row * w + x0..row * w + x1].fill(true);
        }
    }

    let covered = mask.iter().filter(|&&px| px).count() as u64;
    covered as f64 / frame_area as f64
}

/// Mean per-sample frame coverage over a sequence of region sets.
pub fn mean_coverage<'a, I>(samples: I, width: u32, height: u32) -> f64
where
    I: IntoIterator<Item = &'a RegionSet>,
{
    let mut total = 0.0;
    let mut count = 0usize;
    for regions in samples {
        total += frame_coverage(regions, width, height);
        count += 1;
    }
    if count == 0 { 0.0 } else { total / count as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_identical_is_one() {
        let a = Region::new(10, 10, 20, 20);
        assert_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_disjoint_is_zero() {
        let a = Region::new(0, 0, 10, 10);
        let b = Region::new(10, 0, 10, 10); // touching edge only
        assert_eq!(a.iou(&b), 0.0);
        let c = Region::new(100, 100, 5, 5);
        assert_eq!(a.iou(&c), 0.0);
    }

    #[test]
    fn test_iou_partial_overlap_is_symmetric() {
        let a = Region::new(0, 0, 10, 10);
        let b = Region::new(5, 5, 10, 10);
        // intersection 25, union 175
        let expected = 25.0 / 175.0;
        assert!((a.iou(&b) - expected).abs() < 1e-12);
        assert_eq!(a.iou(&b), b.iou(&a));
    }

    #[test]
    fn test_iou_degenerate_region() {
        let a = Region::new(0, 0, 0, 10);
        assert_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn test_parse_csv() {
        assert_eq!(Region::parse_csv("1, 2,3,4"), Some(Region::new(1, 2, 3, 4)));
        assert_eq!(Region::parse_csv("-5,0,10,10"), Some(Region::new(-5, 0, 10, 10)));
        assert_eq!(Region::parse_csv("1,2,3"), None);
        assert_eq!(Region::parse_csv("a,b,c,d"), None);
    }

    #[test]
    fn test_coverage_full_and_empty() {
        assert_eq!(frame_coverage(&[Region::new(0, 0, 8, 4)], 8, 4), 1.0);
        assert_eq!(frame_coverage(&[], 8, 4), 0.0);
    }

    #[test]
    fn test_coverage_clips_and_unions() {
        // Two overlapping boxes, one hanging off the right edge.
        let regions = [Region::new(0, 0, 4, 4), Region::new(2, 0, 10, 2)];
        // 16 from the first, plus columns 4..8 of rows 0..2 = 8 more.
        assert_eq!(frame_coverage(&regions, 8, 4), 24.0 / 32.0);
    }

    #[test]
    fn test_mean_coverage() {
        let samples = vec![vec![Region::new(0, 0, 8, 4)], vec![]];
        assert_eq!(mean_coverage(&samples, 8, 4), 0.5);
        let empty: Vec<RegionSet> = Vec::new();
        assert_eq!(mean_coverage(&empty, 8, 4), 0.0);
    }
}
