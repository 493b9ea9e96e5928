use image::DynamicImage;

use crate::error::{Error, Result};

/// Square capture of side `S` pixels that all pixel geometry refers to.
///
/// The decoded image is optional: only the card strategy looks at pixels,
/// the other strategies work from the side length and the landmarks alone.
#[derive(Debug, Clone)]
pub struct CaptureFrame {
    side: u32,
    image: Option<DynamicImage>,
}

impl CaptureFrame {
    pub fn from_image(image: DynamicImage) -> Result<CaptureFrame> {
        let (width, height) = (image.width(), image.height());
        if width != height || width == 0 {
            return Err(Error::NonSquareFrame { width, height });
        }
        Ok(CaptureFrame {
            side: width,
            image: Some(image),
        })
    }

    pub fn landmarks_only(side: u32) -> CaptureFrame {
        CaptureFrame { side, image: None }
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn image(&self) -> Option<&DynamicImage> {
        self.image.as_ref()
    }
}
