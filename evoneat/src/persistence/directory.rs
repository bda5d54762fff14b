use super::{Checkpoint, CheckpointRecord, Checkpointer, Codec, GenerationSelector, PersistenceError};
use crate::cache::LruCache;
use crate::evolution::Generation;
use crate::fitness::FitnessLedger;
use crate::innovations::Innovations;

use log::{debug, info};

use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

const FILE_PREFIX: &str = "generation-";
const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(4) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};

/// Stores one checkpoint file per generation in a directory,
/// named `generation-000042.<extension>`.
///
/// Files are written under a temporary name and renamed into
/// place, so a checkpoint file is always complete. Decoded
/// checkpoints are kept in a small LRU cache.
///
/// # Examples
/// ```no_run
/// use evoneat::persistence::{Checkpointer, DirectoryCheckpointer, RonCodec};
///
/// let checkpointer = DirectoryCheckpointer::<RonCodec>::new("checkpoints")?;
/// println!("{} checkpoint(s) so far", checkpointer.generation_count()?);
/// # Ok::<(), evoneat::persistence::PersistenceError>(())
/// ```
#[derive(Debug)]
pub struct DirectoryCheckpointer<C> {
    directory: PathBuf,
    cache: LruCache<usize, CheckpointRecord>,
    codec: PhantomData<C>,
}

impl<C: Codec> DirectoryCheckpointer<C> {
    /// Opens a checkpoint directory, creating it if needed.
    pub fn new(directory: impl Into<PathBuf>) -> Result<DirectoryCheckpointer<C>, PersistenceError> {
        Self::with_cache_capacity(directory, DEFAULT_CACHE_CAPACITY)
    }

    /// Opens a checkpoint directory, keeping up to
    /// `capacity` decoded checkpoints in memory.
    pub fn with_cache_capacity(
        directory: impl Into<PathBuf>,
        capacity: NonZeroUsize,
    ) -> Result<DirectoryCheckpointer<C>, PersistenceError> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|e| PersistenceError::io(&directory, e))?;
        Ok(DirectoryCheckpointer {
            directory,
            cache: LruCache::new(capacity),
            codec: PhantomData,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the path of a generation's checkpoint file.
    pub fn path_of(&self, generation: usize) -> PathBuf {
        self.directory
            .join(format!("{}{:06}.{}", FILE_PREFIX, generation, C::EXTENSION))
    }

    /// Returns the numbers of the stored generations, in increasing order.
    pub fn generations(&self) -> Result<Vec<usize>, PersistenceError> {
        let entries = fs::read_dir(&self.directory).map_err(|e| PersistenceError::io(&self.directory, e))?;
        let suffix = format!(".{}", C::EXTENSION);
        let mut generations = vec![];
        for entry in entries {
            let entry = entry.map_err(|e| PersistenceError::io(&self.directory, e))?;
            let name = entry.file_name();
            let number = name
                .to_str()
                .and_then(|n| n.strip_prefix(FILE_PREFIX))
                .and_then(|n| n.strip_suffix(suffix.as_str()))
                .and_then(|n| n.parse::<usize>().ok());
            if let Some(number) = number {
                generations.push(number);
            }
        }
        generations.sort_unstable();
        Ok(generations)
    }

    fn read(&mut self, generation: usize) -> Result<CheckpointRecord, PersistenceError> {
        if let Some(record) = self.cache.get(&generation) {
            debug!("checkpoint of generation {} served from cache", generation);
            return Ok(record.clone());
        }
        let path = self.path_of(generation);
        let text = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PersistenceError::MissingGeneration(generation),
            _ => PersistenceError::io(&path, e),
        })?;
        let record = C::decode(&text)?;
        self.cache.insert(generation, record.clone());
        Ok(record)
    }
}

impl<C: Codec> Checkpointer for DirectoryCheckpointer<C> {
    fn save(
        &mut self,
        innovations: &Innovations,
        generation: &Generation,
        scores: &FitnessLedger,
    ) -> Result<(), PersistenceError> {
        let record = CheckpointRecord::capture(innovations, generation, scores);
        let text = C::encode(&record)?;

        let path = self.path_of(generation.number());
        let temporary = path.with_extension(format!("{}.tmp", C::EXTENSION));
        fs::write(&temporary, text).map_err(|e| PersistenceError::io(&temporary, e))?;
        fs::rename(&temporary, &path).map_err(|e| PersistenceError::io(&path, e))?;

        self.cache.insert(generation.number(), record);
        info!("checkpointed generation {} to {}", generation.number(), path.display());
        Ok(())
    }

    fn load(&mut self, selector: GenerationSelector) -> Result<Checkpoint, PersistenceError> {
        let generation = match selector {
            GenerationSelector::Number(n) => n,
            GenerationSelector::Latest => *self.generations()?.last().ok_or(PersistenceError::Empty)?,
        };
        self.read(generation)?.restore()
    }

    fn generation_count(&self) -> Result<usize, PersistenceError> {
        Ok(self.generations()?.len())
    }
}
