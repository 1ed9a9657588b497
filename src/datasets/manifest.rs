use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::data::{ImLabeled, Image, Item};
use super::decode::{Decode, FileDecoder};
use super::transforms::Transform;
use super::{Dataset, DatasetBuilder};
use crate::error::DataError;

/// Every entry carries this label; pre-training has no supervision signal.
pub const PLACEHOLDER_LABEL: u32 = 0;

/// How often a lenient scan reports progress.
pub const DEFAULT_PROGRESS_EVERY: usize = 5_000_000;

/// Main configuration parameters for a manifest backed dataset
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ManifestParams {
    /// Text file with one image path per line.
    pub manifest: PathBuf,
    /// Directory that relative manifest lines are joined onto.
    pub root: Option<PathBuf>,
    /// Stat every path while scanning and drop the missing ones. Failed reads
    /// are then replaced by the next readable entry instead of a null sample.
    pub validate_on_load: bool,
    /// Log a progress line every this many entries during a lenient scan.
    /// Defaults to 5,000,000; `0` disables progress logging.
    pub progress_every: usize,
}

impl Default for ManifestParams {
    fn default() -> Self {
        Self {
            manifest: PathBuf::new(),
            root: None,
            validate_on_load: true,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

impl DatasetBuilder for ManifestParams {
    type Dataset = ManifestImageIndex;

    fn build(&self) -> Result<Self::Dataset, DataError> {
        ManifestImageIndex::scan(
            &self.manifest,
            self.root.clone(),
            self.validate_on_load,
            self.progress_every,
        )
    }
}

/// Joins a manifest line onto `root`. Absolute lines are kept as they are,
/// since joining an absolute path replaces the base.
pub fn resolve_entry(root: Option<&Path>, line: &str) -> PathBuf {
    match root {
        Some(root) => root.join(line),
        None => PathBuf::from(line),
    }
}

/// Lazily decoded images listed in a manifest file.
///
/// Holds only paths; every access reopens and decodes its file, so the index
/// can be shared freely between loader threads.
pub struct ManifestImageIndex {
    entries: Vec<PathBuf>,
    root: Option<PathBuf>,
    validate_on_load: bool,
    transform: Option<Box<dyn Transform<Image, Image>>>,
    decoder: Box<dyn Decode>,
}

impl std::fmt::Debug for ManifestImageIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestImageIndex")
            .field("len", &self.entries.len())
            .field("root", &self.root)
            .field("validate_on_load", &self.validate_on_load)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl ManifestImageIndex {
    pub fn new(
        manifest: impl AsRef<Path>,
        root: Option<PathBuf>,
        validate_on_load: bool,
    ) -> Result<Self, DataError> {
        Self::scan(manifest.as_ref(), root, validate_on_load, DEFAULT_PROGRESS_EVERY)
    }

    fn scan(
        manifest: &Path,
        root: Option<PathBuf>,
        validate_on_load: bool,
        progress_every: usize,
    ) -> Result<Self, DataError> {
        let file = File::open(manifest).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DataError::ManifestNotFound(manifest.to_path_buf()),
            _ => DataError::ManifestRead {
                path: manifest.to_path_buf(),
                source: e,
            },
        })?;

        let start = Instant::now();
        let mut entries = Vec::new();
        let mut skipped = 0usize;

        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| DataError::ManifestRead {
                path: manifest.to_path_buf(),
                source: e,
            })?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let path = resolve_entry(root.as_deref(), line);

            if validate_on_load {
                if !path.exists() {
                    warn!(path = %path.display(), "image path not found, skipping");
                    skipped += 1;
                    continue;
                }
            } else if progress_every > 0 && (entries.len() + 1) % progress_every == 0 {
                info!(
                    loaded = entries.len() + 1,
                    elapsed_s = start.elapsed().as_secs_f64(),
                    "scanning manifest"
                );
            }
            entries.push(path);
        }

        if entries.is_empty() {
            return Err(DataError::EmptyManifest(manifest.to_path_buf()));
        }

        info!(
            manifest = %manifest.display(),
            entries = entries.len(),
            skipped,
            elapsed_s = start.elapsed().as_secs_f64(),
            "loaded image paths"
        );

        Ok(Self {
            entries,
            root,
            validate_on_load,
            transform: None,
            decoder: Box::new(FileDecoder),
        })
    }

    pub fn with_transform<T: Transform<Image, Image> + 'static>(mut self, transform: T) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    pub fn with_decoder<D: Decode + 'static>(mut self, decoder: D) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false once built; kept for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self, index: usize) -> Option<&Path> {
        self.entries.get(index).map(PathBuf::as_path)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn validates_on_load(&self) -> bool {
        self.validate_on_load
    }

    /// Decodes exactly the entry at `index`, with no substitution and no
    /// null sample on failure.
    pub fn load(&self, index: usize) -> Result<ImLabeled, DataError> {
        let path = self.entries.get(index).ok_or(DataError::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })?;
        debug!(index, path = %path.display(), "loading image");

        let decoded = self.decoder.decode(path).map_err(|e| DataError::Decode {
            path: path.clone(),
            source: e,
        })?;
        let mut image = Image::from_image(&decoded);
        if let Some(t) = &self.transform {
            image = t.transform(image).map_err(|e| DataError::Transform {
                path: path.clone(),
                source: e,
            })?;
        }
        Ok(ImLabeled {
            image,
            label: PLACEHOLDER_LABEL,
            index,
        })
    }

    /// Reads `index`, or on failure the next entries in order, wrapping
    /// around at most once through the whole manifest.
    fn get_substituting(&self, index: usize) -> Result<ImLabeled, DataError> {
        let len = self.entries.len();
        if index >= len {
            return Err(DataError::IndexOutOfRange { index, len });
        }
        for attempt in 0..len {
            let i = (index + attempt) % len;
            match self.load(i) {
                Ok(x) => {
                    if i != index {
                        warn!(
                            requested = index,
                            substituted = i,
                            "returning a different image for index"
                        );
                    }
                    return Ok(x);
                }
                Err(e) => warn!(
                    index = i,
                    path = %self.entries[i].display(),
                    error = %e,
                    "failed to load image"
                ),
            }
        }
        Err(DataError::Exhausted {
            index,
            attempts: len,
        })
    }

    fn get_lenient(&self, index: usize) -> Item {
        if index >= self.entries.len() {
            warn!(
                index,
                len = self.entries.len(),
                "index out of range, returning null sample"
            );
            return Item::OutOfRange;
        }
        match self.load(index) {
            Ok(x) => Item::Loaded(x),
            Err(e) => {
                warn!(
                    index,
                    path = %self.entries[index].display(),
                    error = %e,
                    "failed to load image, returning null sample"
                );
                Item::Failed {
                    label: PLACEHOLDER_LABEL,
                    index,
                }
            }
        }
    }
}

impl Dataset for ManifestImageIndex {
    type DataPoint = Item;

    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Strict datasets either load an image or fail the whole call; lenient
    /// ones never fail and report problems through the null variants of [`Item`].
    fn get(&self, index: usize) -> Result<Item, DataError> {
        if self.validate_on_load {
            self.get_substituting(index).map(Item::Loaded)
        } else {
            Ok(self.get_lenient(index))
        }
    }
}
