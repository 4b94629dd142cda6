use image::{imageops, RgbImage};

/// How a frame's stored pixels relate to its upright display orientation.
///
/// Variants follow the EXIF orientation tags (1–8). `apply` returns the
/// upright image, so detectors always see faces the right way up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Up,
    UpMirrored,
    Down,
    DownMirrored,
    /// EXIF 5. A mirrored front camera in portrait delivers frames this way.
    LeftMirrored,
    Right,
    RightMirrored,
    Left,
}

impl Orientation {
    /// Parses the EXIF orientation tag value.
    pub fn from_exif(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Orientation::Up),
            2 => Some(Orientation::UpMirrored),
            3 => Some(Orientation::Down),
            4 => Some(Orientation::DownMirrored),
            5 => Some(Orientation::LeftMirrored),
            6 => Some(Orientation::Right),
            7 => Some(Orientation::RightMirrored),
            8 => Some(Orientation::Left),
            _ => None,
        }
    }

    /// Returns the upright version of `image`.
    pub fn apply(self, image: &RgbImage) -> RgbImage {
        match self {
            Orientation::Up => image.clone(),
            Orientation::UpMirrored => imageops::flip_horizontal(image),
            Orientation::Down => imageops::rotate180(image),
            Orientation::DownMirrored => imageops::flip_vertical(image),
            // transpose
            Orientation::LeftMirrored => imageops::flip_horizontal(&imageops::rotate90(image)),
            Orientation::Right => imageops::rotate90(image),
            // transverse
            Orientation::RightMirrored => imageops::flip_horizontal(&imageops::rotate270(image)),
            Orientation::Left => imageops::rotate270(image),
        }
    }
}
