use image::RgbImage;

/// Byte layout of a [`Frame`]'s pixel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// 3 bytes per pixel, R G B. Decoded stills use this layout.
    Rgb24,
    /// 4 bytes per pixel, B G R A. Camera buffers arrive in this layout.
    Bgra32,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb24 => 3,
            PixelFormat::Bgra32 => 4,
        }
    }
}

/// A single camera frame: a tightly packed pixel buffer in row-major order.
///
/// Format conversion happens at I/O boundaries and in [`Frame::to_rgb_image`];
/// the capture pipeline treats pixel data as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * format.bytes_per_pixel(),
            "data length must equal width * height * bytes per pixel"
        );
        Self {
            data,
            width,
            height,
            format,
            index,
        }
    }

    /// Wraps a decoded RGB image as a frame at the given stream position.
    pub fn from_rgb_image(image: RgbImage, index: usize) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, PixelFormat::Rgb24, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Converts the buffer to a displayable RGB image, dropping alpha.
    ///
    /// Returns `None` if the buffer length does not match the dimensions.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        let bpp = self.format.bytes_per_pixel();
        let expected = (self.width as usize) * (self.height as usize) * bpp;
        if self.data.len() != expected {
            return None;
        }
        let rgb = match self.format {
            PixelFormat::Rgb24 => self.data.clone(),
            PixelFormat::Bgra32 => {
                let mut rgb = Vec::with_capacity(expected / 4 * 3);
                for px in self.data.chunks_exact(4) {
                    rgb.extend_from_slice(&[px[2], px[1], px[0]]);
                }
                rgb
            }
        };
        RgbImage::from_raw(self.width, self.height, rgb)
    }
}
