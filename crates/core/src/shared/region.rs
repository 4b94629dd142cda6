/// Fraction of each frame dimension covered by the detection region of interest.
pub const ROI_FRACTION: f64 = 0.5;

/// A rectangle in normalized image coordinates (0–1, top-left origin).
///
/// Used both for the detector's region of interest and for face bounding
/// boxes, so results stay independent of frame resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A rectangle in integer pixel coordinates, clamped to its image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl NormalizedRegion {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle of the given size fractions centred in the image.
    pub fn centered(width: f64, height: f64) -> Self {
        let width = width.clamp(0.0, 1.0);
        let height = height.clamp(0.0, 1.0);
        Self::new((1.0 - width) / 2.0, (1.0 - height) / 2.0, width, height)
    }

    /// The fixed centre region the face detector is restricted to.
    pub fn detection_roi() -> Self {
        Self::centered(ROI_FRACTION, ROI_FRACTION)
    }

    /// Maps the region onto an image of the given size.
    ///
    /// Edges are rounded outward-in (floor for the origin, ceil for the far
    /// edge) and clamped, so a non-empty region never maps to zero pixels on
    /// a non-empty image.
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> PixelRegion {
        let w = image_width as f64;
        let h = image_height as f64;
        let x1 = (self.x * w).floor().clamp(0.0, w) as u32;
        let y1 = (self.y * h).floor().clamp(0.0, h) as u32;
        let x2 = ((self.x + self.width) * w).ceil().clamp(0.0, w) as u32;
        let y2 = ((self.y + self.height) * h).ceil().clamp(0.0, h) as u32;
        PixelRegion {
            x: x1,
            y: y1,
            width: x2.saturating_sub(x1),
            height: y2.saturating_sub(y1),
        }
    }

    /// Re-expresses a region given relative to `self` in the coordinates
    /// `self` is expressed in.
    ///
    /// A face found at `(0.5, 0.5)` inside the centre ROI lies at
    /// `(0.5, 0.5)` of the full frame as well.
    pub fn map_from_local(&self, local: &NormalizedRegion) -> NormalizedRegion {
        NormalizedRegion::new(
            self.x + local.x * self.width,
            self.y + local.y * self.height,
            local.width * self.width,
            local.height * self.height,
        )
    }
}

impl PixelRegion {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
