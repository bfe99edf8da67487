//! Per-family, per-subset metadata records and their in-process index.
//!
//! Records live at `{meta_dir}/{family}/{key}.json`. The store keeps each
//! family's records in memory after the first read. Every [`MetadataStore::put`]
//! drops that family from the index and bumps a generation counter, so
//! memoized consumers can tell when their inputs changed.

use std::{
    array,
    collections::HashMap,
    fs,
    hash::{BuildHasher, RandomState},
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use log::debug;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::{
    cache_key::CacheKey,
    error::{Error, Result},
    io::{find_files_by_extension, write_atomic},
};

/// Population and writes are serialized per family through one of these.
const LOCK_STRIPES: usize = 16;

/// A family name usable as a single directory below the metadata root.
pub fn is_valid_family_name(family: &str) -> bool {
    !family.trim().is_empty()
        && family != "."
        && family != ".."
        && !family.contains(['/', '\\', '\0'])
}

fn full_coverage() -> f64 {
    1.0
}

/// Description of one built (or skipped-as-empty) subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub font_family: String,
    /// The range spec exactly as configured; reused as the CSS `unicode-range`.
    #[serde(rename = "subset_range")]
    pub subset_range_spec: String,
    /// `{key}.woff2`
    #[serde(rename = "woff2_file_name")]
    pub artifact_file_name: String,
    /// Subset index, stored as a string.
    #[serde(rename = "subset")]
    pub subset_index: String,
    /// Records written before coverage tracking carry no value and count as fully covered.
    #[serde(rename = "coverage", default = "full_coverage")]
    pub coverage_ratio: f64,
    #[serde(rename = "supported_chars", default)]
    pub supported_char_count: usize,
}

impl MetadataRecord {
    pub fn new(
        font_family: &str,
        subset_index: usize,
        range_spec: &str,
        coverage_ratio: f64,
        supported_char_count: usize,
    ) -> Self {
        let key = CacheKey::derive(font_family, subset_index);
        Self {
            font_family: font_family.to_string(),
            subset_range_spec: range_spec.to_string(),
            artifact_file_name: key.artifact_file_name(),
            subset_index: subset_index.to_string(),
            coverage_ratio,
            supported_char_count,
        }
    }

    /// The cache key, recomputed from family and index.
    pub fn cache_key(&self) -> Option<CacheKey> {
        self.index().map(|index| CacheKey::derive(&self.font_family, index))
    }

    pub fn index(&self) -> Option<usize> {
        self.subset_index.parse().ok()
    }

    /// Whether the font has any glyph in this subset.
    pub fn has_coverage(&self) -> bool {
        self.coverage_ratio > 0.0 || self.supported_char_count > 0
    }
}

/// Reads and writes metadata records and caches them per family.
#[derive(Debug)]
pub struct MetadataStore {
    meta_dir: PathBuf,
    families: RwLock<HashMap<String, Arc<[MetadataRecord]>>>,
    family_locks: [Mutex<()>; LOCK_STRIPES],
    hasher: RandomState,
    generation: AtomicU64,
}

impl MetadataStore {
    pub fn new(meta_dir: impl Into<PathBuf>) -> Self {
        Self {
            meta_dir: meta_dir.into(),
            families: RwLock::new(HashMap::new()),
            family_locks: array::from_fn(|_| Mutex::new(())),
            hasher: RandomState::new(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn meta_dir(&self) -> &Path {
        &self.meta_dir
    }

    pub fn family_dir(&self, family: &str) -> PathBuf {
        self.meta_dir.join(family)
    }

    pub fn record_path(&self, family: &str, key: &CacheKey) -> PathBuf {
        self.family_dir(family).join(key.metadata_file_name())
    }

    /// Incremented by every write or invalidation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn family_lock(&self, family: &str) -> &Mutex<()> {
        &self.family_locks[self.hasher.hash_one(family) as usize % LOCK_STRIPES]
    }

    /// All records of a family, ordered by subset index.
    ///
    /// The first call per family reads the directory; later calls are served
    /// from memory until the family is written or invalidated. A corrupt record
    /// fails the whole read and nothing is cached. Families without a directory
    /// and names that are not a single path component yield an empty list and
    /// are not cached either.
    pub fn get(&self, family: &str) -> Result<Arc<[MetadataRecord]>> {
        if !is_valid_family_name(family) {
            debug!("Ignoring metadata lookup for invalid family name {family:?}");
            return Ok(Arc::from([]));
        }

        if let Some(records) = self.families.read().get(family) {
            debug!("Metadata cache hit for {family}");
            return Ok(records.clone());
        }

        let _guard = self.family_lock(family).lock();

        // Another reader may have populated it while we waited.
        if let Some(records) = self.families.read().get(family) {
            return Ok(records.clone());
        }

        if !self.family_dir(family).is_dir() {
            return Ok(Arc::from([]));
        }

        let records: Arc<[MetadataRecord]> = self.load_family(family)?.into();
        debug!("Loaded {} metadata records for {family}", records.len());
        self.families.write().insert(family.to_string(), records.clone());
        Ok(records)
    }

    /// Number of families held in memory.
    pub fn cached_families(&self) -> usize {
        self.families.read().len()
    }

    fn load_family(&self, family: &str) -> Result<Vec<MetadataRecord>> {
        let mut records = find_files_by_extension(&self.family_dir(family), &["json"], false)?
            .iter()
            .map(|path| read_record_file(path))
            .collect::<Result<Vec<_>>>()?;
        records.sort_by(|a, b| {
            a.index().cmp(&b.index()).then_with(|| a.subset_index.cmp(&b.subset_index))
        });
        Ok(records)
    }

    /// Read one record straight from disk, bypassing the family index.
    pub fn read_record(&self, family: &str, key: &CacheKey) -> Result<Option<MetadataRecord>> {
        if !is_valid_family_name(family) {
            return Ok(None);
        }
        let path = self.record_path(family, key);
        if !path.is_file() {
            return Ok(None);
        }
        read_record_file(&path).map(Some)
    }

    /// Write (or overwrite) a record and invalidate its family.
    pub fn put(&self, record: &MetadataRecord) -> Result<()> {
        let family = record.font_family.as_str();
        if !is_valid_family_name(family) {
            return Err(Error::metadata(
                &self.meta_dir,
                format!("invalid family name {family:?}"),
            ));
        }
        let key = record.cache_key().ok_or_else(|| {
            Error::metadata(
                self.family_dir(family),
                format!("subset index '{}' is not a number", record.subset_index),
            )
        })?;
        let path = self.record_path(family, &key);
        let json = serde_json::to_string(record).map_err(|e| Error::metadata(&path, e))?;

        let _guard = self.family_lock(family).lock();
        write_atomic(&path, json)?;
        self.invalidate(family);
        Ok(())
    }

    /// Drop a family from the in-memory index.
    pub fn invalidate(&self, family: &str) {
        self.families.write().remove(family);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Drop every family from the in-memory index.
    pub fn invalidate_all(&self) {
        self.families.write().clear();
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

fn read_record_file(path: &Path) -> Result<MetadataRecord> {
    let text = fs::read_to_string(path).map_err(|e| Error::metadata(path, e))?;
    serde_json::from_str(&text).map_err(|e| Error::metadata(path, e))
}
