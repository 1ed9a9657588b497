use anyhow::{Error, Result};
use ndarray::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::data::Image;

/// A pure function over samples. Takes `&self` so one transform can be shared
/// by every thread reading from the dataset.
pub trait Transform<In, Out>: Send + Sync {
    fn transform(&self, x: In) -> Result<Out>;
}

impl<In, Out, F> Transform<In, Out> for F
where
    F: Fn(In) -> Result<Out> + Send + Sync,
{
    fn transform(&self, x: In) -> Result<Out> {
        self(x)
    }
}

/// Rescales the image so its values span `range`, centered at `mu`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Normalize {
    pub mu: f32,
    pub range: f32,
}

impl Default for Normalize {
    fn default() -> Self {
        Normalize {
            mu: 0.0,
            range: 2.0,
        }
    }
}

impl Transform<Image, Image> for Normalize {
    fn transform(&self, mut data: Image) -> Result<Image> {
        if self.range.is_nan() || self.range <= 0.0 {
            return Err(Error::msg(format!("normalize range {} must be positive", self.range)));
        }
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        data.image.for_each(|x| {
            min = min.min(*x);
            max = max.max(*x);
        });
        if data.image.is_empty() {
            return Ok(data);
        }
        let center = (max + min) / 2.0;
        // flat images have no spread to rescale
        if max == min {
            data.image.fill(self.mu);
            return Ok(data);
        }
        let width = (max - min) / self.range;
        data.image.mapv_inplace(|x| (x - center) / width + self.mu);
        Ok(data)
    }
}

/// Mirrors the image left to right with probability `p`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HorizontalFlip {
    pub p: f64,
}

impl Default for HorizontalFlip {
    fn default() -> Self {
        Self { p: 0.5 }
    }
}

impl Transform<Image, Image> for HorizontalFlip {
    fn transform(&self, data: Image) -> Result<Image> {
        if !(0.0..=1.0).contains(&self.p) {
            return Err(Error::msg(format!("flip probability {} not in [0, 1]", self.p)));
        }
        if !rand::thread_rng().gen_bool(self.p) {
            return Ok(data);
        }
        let flipped = data.image.slice(s![.., ..;-1, ..]).to_owned();
        Ok(Image { image: flipped })
    }
}

/// Crops a `height` x `width` window from the center of the image.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CenterCrop {
    pub height: usize,
    pub width: usize,
}

impl Transform<Image, Image> for CenterCrop {
    fn transform(&self, data: Image) -> Result<Image> {
        let [h, w] = data.size();
        if self.height > h || self.width > w {
            return Err(Error::msg(format!(
                "cannot crop {}x{} from a {h}x{w} image",
                self.height, self.width
            )));
        }
        let top = (h - self.height) / 2;
        let left = (w - self.width) / 2;
        let cropped = data
            .image
            .slice(s![top..top + self.height, left..left + self.width, ..])
            .to_owned();
        Ok(Image { image: cropped })
    }
}

/// Applies each transform in order, stopping at the first failure.
#[derive(Default)]
pub struct Compose {
    steps: Vec<Box<dyn Transform<Image, Image>>>,
}

impl Compose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then<T: Transform<Image, Image> + 'static>(mut self, t: T) -> Self {
        self.steps.push(Box::new(t));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Transform<Image, Image> for Compose {
    fn transform(&self, x: Image) -> Result<Image> {
        self.steps.iter().try_fold(x, |x, t| t.transform(x))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ramp(h: usize, w: usize) -> Image {
        let image = Array3::from_shape_fn((h, w, 3), |(i, j, _)| {
            (i * w + j) as f32 / (h * w) as f32
        });
        Image { image }
    }

    #[test]
    fn normalize_spans_range() {
        let n = Normalize::default();
        let out = n.transform(ramp(4, 4)).unwrap();
        let min = out.image.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = out.image.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert!((min + 1.0).abs() < 1e-5);
        assert!((max - 1.0).abs() < 1e-5);
    }

    #[test]
    fn normalize_flat_image() {
        let n = Normalize { mu: 0.5, range: 2.0 };
        let out = n
            .transform(Image { image: Array3::ones((2, 2, 3)) })
            .unwrap();
        assert!(out.image.iter().all(|x| *x == 0.5));
    }

    #[test]
    fn normalize_rejects_empty_range() {
        for range in [0.0, -1.0, f32::NAN] {
            let n = Normalize { mu: 0.0, range };
            assert!(n.transform(ramp(2, 2)).is_err());
        }
    }

    #[test]
    fn flip_always_and_never() {
        let im = ramp(2, 3);
        let flipped = HorizontalFlip { p: 1.0 }.transform(im.clone()).unwrap();
        assert_eq!(flipped.image[[0, 0, 0]], im.image[[0, 2, 0]]);
        assert_eq!(flipped.image[[1, 2, 1]], im.image[[1, 0, 1]]);

        let same = HorizontalFlip { p: 0.0 }.transform(im.clone()).unwrap();
        assert_eq!(same, im);

        assert!(HorizontalFlip { p: 1.5 }.transform(im).is_err());
    }

    #[test]
    fn center_crop() {
        let im = ramp(6, 4);
        let out = CenterCrop { height: 2, width: 2 }.transform(im.clone()).unwrap();
        assert_eq!(out.size(), [2, 2]);
        assert_eq!(out.image[[0, 0, 0]], im.image[[2, 1, 0]]);

        assert!(CenterCrop { height: 7, width: 1 }.transform(im).is_err());
    }

    #[test]
    fn compose_with_closure() {
        let t = Compose::new()
            .then(CenterCrop { height: 2, width: 2 })
            .then(|mut x: Image| -> Result<Image> {
                x.image.mapv_inplace(|v| v * 0.0);
                Ok(x)
            });
        assert_eq!(t.len(), 2);
        let out = t.transform(ramp(4, 4)).unwrap();
        assert_eq!(out.size(), [2, 2]);
        assert!(out.image.iter().all(|x| *x == 0.0));

        let failing = Compose::new()
            .then(|_: Image| -> Result<Image> { Err(Error::msg("boom")) })
            .then(CenterCrop { height: 1, width: 1 });
        assert!(failing.transform(ramp(2, 2)).is_err());
    }
}
