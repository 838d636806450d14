//! In-memory anime catalog.
//!
//! The catalog is built exactly once at startup and never mutated afterwards.
//! Records are kept sorted by ascending id and indexed by id, so both ordered
//! scans and point lookups work without any locking.

mod loader;

pub use loader::{open, read_catalog};

use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::models::anime::Anime;

/// Fatal errors raised while building the catalog.
///
/// None of these are recoverable at request time: if loading fails the
/// process must not start serving.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed catalog input: {0}")]
    MalformedInput(#[from] serde_json::Error),

    #[error("Duplicate anime id {0} in catalog")]
    DuplicateIdentifier(u32),

    #[error("Invalid anime id 0 (\"{title}\"): ids must be positive")]
    InvalidIdentifier { title: String },
}

/// Immutable, ordered collection of [`Anime`] records with an id index.
#[derive(Debug, Default)]
pub struct Catalog {
    animes: Vec<Anime>,
    index: HashMap<u32, usize>,
}

impl Catalog {
    /// Parses a JSON array of records and builds the catalog.
    ///
    /// # Errors
    ///
    /// - [`LoadError::MalformedInput`] if the payload is not valid JSON or a
    ///   field does not match its declared type (unknown enum names included)
    /// - [`LoadError::DuplicateIdentifier`] if two records share an id
    /// - [`LoadError::InvalidIdentifier`] if a record has id 0
    pub fn load(bytes: &[u8]) -> Result<Self, LoadError> {
        let animes: Vec<Anime> = serde_json::from_slice(bytes)?;
        Self::from_records(animes)
    }

    /// Builds the catalog from already-parsed records.
    ///
    /// # Errors
    ///
    /// Same identifier checks as [`Catalog::load`].
    pub fn from_records(mut animes: Vec<Anime>) -> Result<Self, LoadError> {
        if let Some(anime) = animes.iter().find(|a| a.id == 0) {
            return Err(LoadError::InvalidIdentifier {
                title: anime.title.clone(),
            });
        }

        animes.sort_by_key(|a| a.id);

        let mut index = HashMap::with_capacity(animes.len());
        for (pos, anime) in animes.iter().enumerate() {
            if index.insert(anime.id, pos).is_some() {
                return Err(LoadError::DuplicateIdentifier(anime.id));
            }
        }

        debug!(records = animes.len(), "Catalog index built");

        Ok(Self { animes, index })
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Anime> {
        self.index.get(&id).map(|&pos| &self.animes[pos])
    }

    /// All records in ascending id order.
    #[must_use]
    pub fn all(&self) -> &[Anime] {
        &self.animes
    }

    /// The `count` records with the highest ids, still in ascending order.
    #[must_use]
    pub fn recent(&self, count: usize) -> &[Anime] {
        let start = self.animes.len().saturating_sub(count);
        &self.animes[start..]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.animes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.animes.is_empty()
    }
}
