/////////////////////////////////////////////////////////////////////////////////////////
// The Data types that the datasets output and transforms input.

use image::DynamicImage;
use ndarray::prelude::*;

/// Expect images to be normalized between [0, 1] and have a shape of HWC with C = 3
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub image: Array3<f32>,
}

impl Image {
    /// [height, width]
    pub fn size(&self) -> [usize; 2] {
        let shape = self.image.dim();
        [shape.0, shape.1]
    }

    /// Converts any color layout (grayscale, rgba, 16 bit, ...) to three channel rgb.
    pub fn from_image(im: &DynamicImage) -> Image {
        let im = im.to_rgb32f();
        let w = im.width() as usize;
        let h = im.height() as usize;
        // indexed by pixel, so the shape always matches the decoded buffer
        let array = Array3::from_shape_fn((h, w, 3), |(y, x, c)| {
            im.get_pixel(x as u32, y as u32).0[c]
        });
        Self { image: array }
    }
}

/// A decoded sample with its label. `index` is the manifest entry that was
/// actually read, which differs from the requested index when a strict
/// dataset substituted a later entry for a failing one.
#[derive(Clone, Debug, PartialEq)]
pub struct ImLabeled {
    pub image: Image,
    pub label: u32,
    pub index: usize,
}

/// What an indexed access produces. The null variants are left for the
/// collation step to drop or pad.
#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    Loaded(ImLabeled),
    /// Decoding or transforming the entry failed; the label is still attached.
    Failed { label: u32, index: usize },
    /// The requested index was past the end of the dataset.
    OutOfRange,
}

impl Item {
    pub fn image(&self) -> Option<&Image> {
        match self {
            Item::Loaded(x) => Some(&x.image),
            _ => None,
        }
    }

    pub fn label(&self) -> Option<u32> {
        match self {
            Item::Loaded(x) => Some(x.label),
            Item::Failed { label, .. } => Some(*label),
            Item::OutOfRange => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Item::Loaded(_))
    }

    pub fn into_loaded(self) -> Option<ImLabeled> {
        match self {
            Item::Loaded(x) => Some(x),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    #[test]
    fn grayscale_becomes_rgb() {
        let gray = GrayImage::from_pixel(5, 3, Luma([255u8]));
        let im = Image::from_image(&DynamicImage::ImageLuma8(gray));
        assert_eq!(im.image.dim(), (3, 5, 3));
        assert_eq!(im.size(), [3, 5]);
        assert!(im.image.iter().all(|x| (*x - 1.0).abs() < 1e-6));
    }

    #[test]
    fn rgba_keeps_pixel_layout() {
        let mut rgba = RgbaImage::new(3, 2);
        rgba.put_pixel(2, 1, Rgba([255, 0, 51, 0]));
        let im = Image::from_image(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(im.image.dim(), (2, 3, 3));
        assert_eq!(im.image[[1, 2, 0]], 1.0);
        assert_eq!(im.image[[1, 2, 1]], 0.0);
        assert!((im.image[[1, 2, 2]] - 0.2).abs() < 1e-6);
        assert_eq!(im.image[[0, 0, 0]], 0.0);
    }

    #[test]
    fn item_accessors() {
        let failed = Item::Failed { label: 0, index: 3 };
        assert_eq!(failed.label(), Some(0));
        assert!(failed.image().is_none());
        assert_eq!(Item::OutOfRange.label(), None);
        assert!(Item::OutOfRange.into_loaded().is_none());
    }
}
