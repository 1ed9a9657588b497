use std::path::Path;

use image::io::Reader as ImageReader;
use image::{DynamicImage, ImageError};

/// Opens and decodes one image file. Fails on a missing or corrupt file.
pub trait Decode: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DynamicImage, ImageError>;
}

/// Decodes from the local file system, guessing the format from the file
/// contents rather than trusting the extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileDecoder;

impl Decode for FileDecoder {
    fn decode(&self, path: &Path) -> Result<DynamicImage, ImageError> {
        ImageReader::open(path)?.with_guessed_format()?.decode()
    }
}

impl<F> Decode for F
where
    F: Fn(&Path) -> Result<DynamicImage, ImageError> + Send + Sync,
{
    fn decode(&self, path: &Path) -> Result<DynamicImage, ImageError> {
        self(path)
    }
}
