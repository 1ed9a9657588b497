use ndarray::prelude::*;

use super::data::Item;
use crate::error::DataError;

/// A stacked batch of images, NHWC, with one label per image.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    pub images: Array4<f32>,
    pub labels: Vec<u32>,
    /// Manifest entries the images were read from.
    pub indices: Vec<usize>,
}

/// Drops null samples and stacks the rest in the first dimension.
/// [H, W, C] -> [B, H, W, C]. Returns `None` if no sample survives.
pub fn stack<I>(items: I) -> Result<Option<Batch>, DataError>
where
    I: IntoIterator<Item = Item>,
{
    let loaded: Vec<_> = items.into_iter().filter_map(Item::into_loaded).collect();
    let first = match loaded.first() {
        Some(x) => x,
        None => return Ok(None),
    };
    let expected = first.image.size();
    let (h, w, c) = first.image.image.dim();

    let mut images = Array4::<f32>::zeros((loaded.len(), h, w, c));
    for (i, x) in loaded.iter().enumerate() {
        if x.image.image.dim() != (h, w, c) {
            return Err(DataError::ShapeMismatch {
                expected,
                found: x.image.size(),
            });
        }
        images.slice_mut(s![i, .., .., ..]).assign(&x.image.image);
    }

    Ok(Some(Batch {
        images,
        labels: loaded.iter().map(|x| x.label).collect(),
        indices: loaded.iter().map(|x| x.index).collect(),
    }))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::datasets::data::{ImLabeled, Image};

    fn loaded(index: usize, h: usize, w: usize, v: f32) -> Item {
        Item::Loaded(ImLabeled {
            image: Image { image: Array3::from_elem((h, w, 3), v) },
            label: 0,
            index,
        })
    }

    #[test]
    fn drops_null_samples() {
        let items = vec![
            loaded(0, 2, 2, 0.25),
            Item::Failed { label: 0, index: 1 },
            Item::OutOfRange,
            loaded(3, 2, 2, 0.75),
        ];
        let batch = stack(items).unwrap().unwrap();
        assert_eq!(batch.images.dim(), (2, 2, 2, 3));
        assert_eq!(batch.labels, vec![0, 0]);
        assert_eq!(batch.indices, vec![0, 3]);
        assert_eq!(batch.images[[1, 1, 1, 2]], 0.75);
    }

    #[test]
    fn all_null_is_none() {
        let items = vec![Item::OutOfRange, Item::Failed { label: 0, index: 2 }];
        assert!(stack(items).unwrap().is_none());
    }

    #[test]
    fn size_mismatch() {
        let items = vec![loaded(0, 2, 2, 0.0), loaded(1, 3, 2, 0.0)];
        assert!(matches!(
            stack(items),
            Err(DataError::ShapeMismatch { expected: [2, 2], found: [3, 2] })
        ));
    }
}
