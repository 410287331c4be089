//! CalibrationCache - in-memory and on-disk cache of glyph calibrations.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use super::calibrator::{calibrate, total_area, Calibration, ASCII_COUNT};
use super::font::FontIdentity;
use super::rasterizer::{CellSize, GlyphRasterizer, MIN_CELL_DIM};
use super::{CacheError, CalibrationError};

/// Version tag baked into every cache file name and record.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

const RECORD_PREFIX: &str = "ascii_lut_v";

/// Persisted form of a [`Calibration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Tool version that wrote the record.
    #[serde(default)]
    pub version: String,
    /// Font key the record was built for.
    #[serde(default)]
    pub font: String,
    pub lut: Vec<u8>,
    pub aspect: f64,
    #[serde(alias = "pixmap")]
    pub pixmaps: Vec<u8>,
    pub pixmap_widths: Vec<u32>,
    pub pixmap_heights: Vec<u32>,
}

impl CacheRecord {
    pub fn from_calibration(calibration: &Calibration) -> Self {
        Self {
            version: TOOL_VERSION.to_string(),
            font: calibration.font().key(),
            lut: calibration.lut().to_vec(),
            aspect: calibration.aspect(),
            pixmaps: calibration.pixmaps().to_vec(),
            pixmap_widths: calibration.pixmap_widths().to_vec(),
            pixmap_heights: calibration.pixmap_heights().to_vec(),
        }
    }

    /// Check the array-length invariants of the record.
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.lut.len() != ASCII_COUNT {
            return Err(CacheError::Invalid(format!(
                "lut has {} entries, expected {}",
                self.lut.len(),
                ASCII_COUNT
            )));
        }
        if self.pixmap_widths.len() != ASCII_COUNT || self.pixmap_heights.len() != ASCII_COUNT {
            return Err(CacheError::Invalid(format!(
                "{} widths and {} heights, expected {}",
                self.pixmap_widths.len(),
                self.pixmap_heights.len(),
                ASCII_COUNT
            )));
        }
        let declared = total_area(&self.pixmap_widths, &self.pixmap_heights)
            .ok_or_else(|| CacheError::Invalid("glyph dimensions overflow".to_string()))?;
        if declared != self.pixmaps.len() {
            return Err(CacheError::Invalid(format!(
                "pixmaps hold {} bytes, dimensions declare {}",
                self.pixmaps.len(),
                declared
            )));
        }
        Ok(())
    }

    /// Validate and convert into a calibration for `font`.
    pub fn into_calibration(self, font: &FontIdentity) -> Result<Calibration, CacheError> {
        self.validate()?;
        Ok(Calibration::from_parts(
            font.clone(),
            self.lut,
            self.pixmaps,
            self.pixmap_widths,
            self.pixmap_heights,
            self.aspect,
        )?)
    }
}

/// Get-or-build cache of calibrations keyed by font identity and version.
///
/// Calibrations are published as `Arc<Calibration>` only after they are
/// fully built, so readers never observe a partially constructed table.
pub struct CalibrationCache {
    dir: Option<PathBuf>,
    version: String,
    memory: Mutex<HashMap<String, Arc<Calibration>>>,
}

impl CalibrationCache {
    /// Create a cache persisting into `dir`.
    /// Does not create the directory - it is created on first store.
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir: Some(dir),
            version: TOOL_VERSION.to_string(),
            memory: Mutex::new(HashMap::new()),
        }
    }

    /// Create a cache that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            version: TOOL_VERSION.to_string(),
            memory: Mutex::new(HashMap::new()),
        }
    }

    /// Create a cache in the default directory.
    /// Default: ~/.cache/glyphcast/
    pub fn with_default_dir() -> Self {
        Self::new(default_dir())
    }

    /// Override the version tag (records from other versions are ignored).
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Deterministic file name hash for a font key.
    /// Returns a 32-character hex string (first 16 bytes of SHA256).
    pub fn hash_key(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..16])
    }

    /// Path of the record for `font`, if this cache persists to disk.
    pub fn record_path(&self, font: &FontIdentity) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        Some(dir.join(format!(
            "{}{}_{}.json",
            RECORD_PREFIX,
            self.version,
            Self::hash_key(&font.key())
        )))
    }

    /// Load and validate the persisted calibration for `font`.
    pub fn load(&self, font: &FontIdentity) -> Result<Calibration, CacheError> {
        let path = self.record_path(font).ok_or(CacheError::Disabled)?;
        let content = std::fs::read(&path)?;
        let record: CacheRecord = serde_json::from_slice(&content)?;
        if !record.version.is_empty() && record.version != self.version {
            return Err(CacheError::VersionMismatch {
                found: record.version,
                expected: self.version.clone(),
            });
        }
        let key = font.key();
        if !record.font.is_empty() && record.font != key {
            return Err(CacheError::FontMismatch {
                found: record.font,
                expected: key,
            });
        }
        record.into_calibration(font)
    }

    /// Persist `calibration` under its font identity.
    pub fn store(&self, calibration: &Calibration) -> Result<PathBuf, CacheError> {
        let path = self
            .record_path(calibration.font())
            .ok_or(CacheError::Disabled)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut record = CacheRecord::from_calibration(calibration);
        record.version = self.version.clone();
        let json = serde_json::to_vec(&record)?;

        // write-then-rename so readers never see a truncated record
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        Ok(path)
    }

    /// Return the calibration for the rasterizer's font, building it if
    /// needed.
    ///
    /// Lookup order: memory, then disk, then a fresh calibration which is
    /// persisted. Unreadable or invalid records, and records whose cell size
    /// differs from the rasterizer's, are discarded. A failed write only logs
    /// a warning; the only error is a calibration that violates its own
    /// invariants.
    ///
    /// The memory lock is not held while loading or calibrating. Two threads
    /// missing on the same font may both build it; the first one published
    /// wins and both return it.
    pub fn ensure_calibrated(
        &self,
        rasterizer: &dyn GlyphRasterizer,
    ) -> Result<Arc<Calibration>, CalibrationError> {
        let font = rasterizer.identity();
        let key = font.key();

        if let Some(calibration) = self.cached(&key) {
            return Ok(calibration);
        }

        if self.dir.is_some() {
            match self.load_for(rasterizer) {
                Ok(calibration) => {
                    log::debug!("Loaded calibration for {} from cache", font);
                    return Ok(self.publish(key, calibration));
                }
                Err(CacheError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                    log::debug!("No cached calibration for {}", font);
                }
                Err(e) => {
                    log::warn!("Discarding cached calibration for {}: {}", font, e);
                }
            }
        }

        let calibration = calibrate(rasterizer)?;
        if self.dir.is_some() {
            match self.store(&calibration) {
                Ok(path) => log::info!("Saved calibration to {}", path.display()),
                Err(e) => log::warn!("Failed to persist calibration for {}: {}", font, e),
            }
        }
        Ok(self.publish(key, calibration))
    }

    /// Load the record for the rasterizer's font and check that its cells
    /// match the size the rasterizer would produce.
    fn load_for(&self, rasterizer: &dyn GlyphRasterizer) -> Result<Calibration, CacheError> {
        let calibration = self.load(rasterizer.identity())?;
        let cell = rasterizer.cell_size();
        let expected = CellSize::new(cell.width.max(MIN_CELL_DIM), cell.height.max(MIN_CELL_DIM));
        if calibration.cell_size() != expected {
            return Err(CacheError::Invalid(format!(
                "cells are {}x{}, font renders {}x{}",
                calibration.cell_size().width,
                calibration.cell_size().height,
                expected.width,
                expected.height
            )));
        }
        Ok(calibration)
    }

    fn cached(&self, key: &str) -> Option<Arc<Calibration>> {
        self.memory
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn publish(&self, key: String, calibration: Calibration) -> Arc<Calibration> {
        let mut memory = self.memory.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(memory.entry(key).or_insert_with(|| Arc::new(calibration)))
    }

    /// Drop the in-memory entry for `font` so the next lookup goes to disk.
    pub fn forget(&self, font: &FontIdentity) {
        self.memory
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&font.key());
    }

    /// Drop the in-memory entry and delete the record for `font`.
    pub fn invalidate(&self, font: &FontIdentity) -> Result<(), CacheError> {
        self.forget(font);
        if let Some(path) = self.record_path(font) {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Delete every calibration record in the cache directory, returning the
    /// number of files removed.
    pub fn clear(&self) -> Result<usize, CacheError> {
        self.memory
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        let Some(dir) = self.dir.as_ref() else {
            return Ok(0);
        };
        if !dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_record = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(RECORD_PREFIX) && n.ends_with(".json"))
                .unwrap_or(false);
            if is_record && std::fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Default cache directory: `<cache_dir>/glyphcast`.
pub fn default_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("glyphcast")
}
