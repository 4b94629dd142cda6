//! 5-point face landmarks in normalized image coordinates.

use crate::shared::region::NormalizedRegion;

pub const LEFT_EYE: usize = 0;
pub const RIGHT_EYE: usize = 1;
pub const NOSE: usize = 2;
pub const LEFT_MOUTH: usize = 3;
pub const RIGHT_MOUTH: usize = 4;

#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarks {
    /// `None` marks a landmark the model was not confident about.
    points: [Option<(f64, f64)>; 5],
}

impl FaceLandmarks {
    pub fn new(points: [Option<(f64, f64)>; 5]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Option<(f64, f64)>; 5] {
        &self.points
    }

    /// Re-expresses landmarks found inside `area` in the coordinates `area`
    /// is expressed in.
    pub fn map_from_local(&self, area: &NormalizedRegion) -> FaceLandmarks {
        let points = self
            .points
            .map(|p| p.map(|(x, y)| (area.x + x * area.width, area.y + y * area.height)));
        FaceLandmarks::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ── map_from_local ──────────────────────────────────────────────

    #[test]
    fn test_map_from_local_into_roi() {
        let mut pts = [None; 5];
        pts[RIGHT_EYE] = Some((0.5, 1.0));
        let mapped = FaceLandmarks::new(pts).map_from_local(&NormalizedRegion::detection_roi());
        let (x, y) = mapped.points()[RIGHT_EYE].unwrap();
        assert_relative_eq!(x, 0.5);
        assert_relative_eq!(y, 0.75);
        assert!(mapped.points()[LEFT_EYE].is_none());
    }

    #[test]
    fn test_map_from_local_full_area_keeps_points() {
        let mut pts = [None; 5];
        pts[NOSE] = Some((0.3, 0.4));
        let mapped = FaceLandmarks::new(pts).map_from_local(&NormalizedRegion::new(0.0, 0.0, 1.0, 1.0));
        let (x, y) = mapped.points()[NOSE].unwrap();
        assert_relative_eq!(x, 0.3);
        assert_relative_eq!(y, 0.4);
    }
}
