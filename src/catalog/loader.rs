//! Reads the catalog file from disk.
//!
//! Parsing a large catalog is CPU-bound, so [`open`] runs it on a blocking
//! thread. Files ending in `.zst` are decompressed first.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument};

use super::{Catalog, LoadError};

/// Loads the catalog at `path` without blocking the runtime.
///
/// # Errors
///
/// Returns the underlying [`LoadError`] (wrapped with the file path) if the
/// file cannot be read or its contents are rejected.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub async fn open(path: impl AsRef<Path>) -> Result<Catalog> {
    let path: PathBuf = path.as_ref().to_path_buf();
    let start = Instant::now();

    let display = path.display().to_string();
    let catalog = tokio::task::spawn_blocking(move || read_catalog(&path))
        .await
        .context("Blocking task panicked while loading catalog")?
        .with_context(|| format!("Failed to load catalog from {display}"))?;

    metrics::gauge!("catalog_records_loaded").set(catalog.len() as f64);

    info!(
        event = "catalog_loaded",
        records = catalog.len(),
        duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Catalog ready"
    );

    Ok(catalog)
}

/// Blocking read + parse.
pub fn read_catalog(path: &Path) -> Result<Catalog, LoadError> {
    let io_err = |source: std::io::Error| LoadError::Io {
        path: path.display().to_string(),
        source,
    };

    let raw = std::fs::read(path).map_err(io_err)?;
    debug!(bytes = raw.len(), "Read catalog file");

    let bytes = if is_compressed(path) {
        let mut decoder = zstd::Decoder::new(raw.as_slice()).map_err(io_err)?;
        let mut out = Vec::with_capacity(raw.len() * 4);
        decoder.read_to_end(&mut out).map_err(io_err)?;
        debug!(bytes = out.len(), "Decompressed catalog");
        out
    } else {
        raw
    };

    Catalog::load(&bytes)
}

fn is_compressed(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "zst")
}
