/// This module only defines the dataset logic for listing, loading and processing
/// images. Scheduling workers, prefetching and the training loop itself belong
/// to whatever drives the dataset.
use crate::error::DataError;
use crate::Config;

pub mod collate;
pub mod data;
pub mod decode;
pub mod manifest;
pub mod transforms;

/// Builds a dataset from a light parameter struct. The parameters are cheap to
/// clone and serialize, while the built dataset may take a scan over storage.
pub trait DatasetBuilder: Config {
    type Dataset: Dataset;
    fn build(&self) -> Result<Self::Dataset, DataError>;
}

/// The universal Dataset trait: a sized, indexable collection that a batching
/// layer can query from many threads at once.
pub trait Dataset: Send + Sync {
    type DataPoint;
    fn len(&self) -> usize;
    fn get(&self, index: usize) -> Result<Self::DataPoint, DataError>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
