//! Parallel subset builds with skip, force and single-retry semantics.
//!
//! Each configured subset goes through:
//!
//! ```text
//! Pending -> Skipped                       (artifact present, no force)
//! Pending -> Queued -> Built               (engine succeeded, artifact written)
//!                   -> EmptySkipped        (nothing requested is in the font;
//!                                           a stale artifact is removed)
//!                   -> Failed              (strict and relaxed attempts both failed)
//! ```
//!
//! Queued subsets run on a dedicated rayon pool. A failing or panicking job
//! only affects its own outcome. After every job has joined, a single-threaded
//! metadata pass records coverage for each subset that lacks a record.

use std::{
    collections::{BTreeSet, HashMap},
    fmt, fs,
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use log::{debug, info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};

use crate::{
    cache_key::CacheKey,
    coverage::{Coverage, supported_codepoints},
    engine::{SubsetEngine, SubsetOptions},
    error::{Error, Result},
    io::{FontFile, write_atomic},
    metadata::{MetadataRecord, MetadataStore},
    subsets::SubsetDefinition,
    unicode_range::parse_unicode_range,
};

/// Terminal state of one subset in a build pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubsetStatus {
    /// Up to date before the pass started; nothing dispatched.
    Skipped,
    /// Artifact written.
    Built { bytes: usize },
    /// The font has none of the requested codepoints; no artifact.
    EmptySkipped,
    /// Both engine attempts (or the artifact write) failed.
    Failed { error: String },
}

impl SubsetStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Built { .. } => "built",
            Self::EmptySkipped => "empty",
            Self::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetOutcome {
    pub index: usize,
    pub cache_key: CacheKey,
    pub status: SubsetStatus,
}

/// Aggregated result of [`SubsetBuildScheduler::build_family`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub family: String,
    /// One entry per configured subset, ordered by index.
    pub outcomes: Vec<SubsetOutcome>,
    /// Metadata records written by the metadata pass.
    pub metadata_written: usize,
}

impl BuildReport {
    fn indices(&self, pred: impl Fn(&SubsetStatus) -> bool) -> Vec<usize> {
        self.outcomes.iter().filter(|o| pred(&o.status)).map(|o| o.index).collect()
    }

    pub fn built(&self) -> Vec<usize> {
        self.indices(|s| matches!(s, SubsetStatus::Built { .. }))
    }

    pub fn skipped(&self) -> Vec<usize> {
        self.indices(|s| matches!(s, SubsetStatus::Skipped))
    }

    pub fn empty_skipped(&self) -> Vec<usize> {
        self.indices(|s| matches!(s, SubsetStatus::EmptySkipped))
    }

    /// `(index, error)` for every failed subset.
    pub fn failed(&self) -> Vec<(usize, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.status {
                SubsetStatus::Failed { error } => Some((o.index, error.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.failed().is_empty()
    }

    pub fn status_of(&self, index: usize) -> Option<&SubsetStatus> {
        self.outcomes.iter().find(|o| o.index == index).map(|o| &o.status)
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} built, {} skipped, {} empty, {} failed, {} metadata records written",
            self.family,
            self.built().len(),
            self.skipped().len(),
            self.empty_skipped().len(),
            self.failed().len(),
            self.metadata_written
        )
    }
}

/// Decides which subsets need building and runs them on a bounded pool.
pub struct SubsetBuildScheduler {
    cache_dir: PathBuf,
    subsets: Vec<SubsetDefinition>,
    engine: Arc<dyn SubsetEngine>,
    pool: ThreadPool,
}

impl fmt::Debug for SubsetBuildScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubsetBuildScheduler")
            .field("cache_dir", &self.cache_dir)
            .field("subsets", &self.subsets.len())
            .field("workers", &self.workers())
            .finish()
    }
}

impl SubsetBuildScheduler {
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        subsets: Vec<SubsetDefinition>,
        engine: Arc<dyn SubsetEngine>,
        workers: usize,
    ) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("fontsub-build-{i}"))
            .build()
            .map_err(|e| Error::WorkerPool(e.to_string()))?;
        Ok(Self { cache_dir: cache_dir.into(), subsets, engine, pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn subsets(&self) -> &[SubsetDefinition] {
        &self.subsets
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// `{cache_dir}/{key}.woff2`
    pub fn artifact_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(key.artifact_file_name())
    }

    /// Build missing or stale subsets of one family, then record their coverage.
    ///
    /// Safe to call repeatedly: without `force`, a family whose subsets are all
    /// built or known to be empty performs no engine calls and writes nothing.
    pub fn build_family(
        &self,
        family: &str,
        font_path: &Path,
        force: bool,
        store: &MetadataStore,
    ) -> Result<BuildReport> {
        let font = FontFile::new(font_path);
        if !font.exists() {
            return Err(Error::MissingFontFile { path: font_path.to_path_buf() });
        }

        let mut outcomes = Vec::with_capacity(self.subsets.len());
        let mut queued = Vec::new();
        for subset in &self.subsets {
            let key = CacheKey::derive(family, subset.index);
            if !force && self.is_up_to_date(family, &key, store) {
                debug!("Skipping subset {} of {family}: up to date", subset.index);
                outcomes.push(SubsetOutcome {
                    index: subset.index,
                    cache_key: key,
                    status: SubsetStatus::Skipped,
                });
            } else {
                queued.push((subset, key));
            }
        }

        let needs_metadata: Vec<&SubsetDefinition> = self
            .subsets
            .iter()
            .filter(|s| {
                force || !store.record_path(family, &CacheKey::derive(family, s.index)).is_file()
            })
            .collect();

        info!("{family}: {} subsets queued, {} skipped", queued.len(), outcomes.len());

        if queued.is_empty() && needs_metadata.is_empty() {
            info!("{family}: all subsets are up to date; use force to rebuild");
            return Ok(BuildReport { family: family.to_string(), outcomes, metadata_written: 0 });
        }

        let font_data = font.read()?;
        let supported = supported_codepoints(&font_data)
            .map_err(|message| Error::ParseFont { path: font_path.to_path_buf(), message })?;

        let mut requested: HashMap<usize, BTreeSet<u32>> = HashMap::new();
        for subset in queued.iter().map(|(s, _)| *s).chain(needs_metadata.iter().copied()) {
            requested
                .entry(subset.index)
                .or_insert_with(|| parse_unicode_range(&subset.range_spec));
        }

        if !queued.is_empty() {
            let start = Instant::now();
            info!("{family}: building {} subsets on {} workers", queued.len(), self.workers());

            let built: Vec<SubsetOutcome> = self.pool.install(|| {
                queued
                    .par_iter()
                    .map(|(subset, key)| {
                        let status = self.run_isolated(
                            family,
                            subset.index,
                            &font_data,
                            &requested[&subset.index],
                            &supported,
                            &self.artifact_path(key),
                        );
                        SubsetOutcome { index: subset.index, cache_key: key.clone(), status }
                    })
                    .collect()
            });
            outcomes.extend(built);

            info!("{family}: build phase finished in {:.2}s", start.elapsed().as_secs_f64());
        }
        outcomes.sort_by_key(|o| o.index);

        let mut metadata_written = 0;
        for subset in needs_metadata {
            let coverage = Coverage::compute(&requested[&subset.index], &supported);
            let record = MetadataRecord::new(
                family,
                subset.index,
                &subset.range_spec,
                coverage.rounded_ratio(),
                coverage.supported_count(),
            );
            store.put(&record)?;
            metadata_written += 1;
        }
        info!("{family}: wrote {metadata_written} metadata records");

        let report = BuildReport { family: family.to_string(), outcomes, metadata_written };
        for (index, error) in report.failed() {
            warn!("{family}: subset {index} failed: {error}");
        }
        info!("{report}");
        Ok(report)
    }

    /// An existing artifact, or a record saying the subset is empty for this font.
    fn is_up_to_date(&self, family: &str, key: &CacheKey, store: &MetadataStore) -> bool {
        if self.artifact_path(key).is_file() {
            return true;
        }
        match store.read_record(family, key) {
            Ok(Some(record)) => !record.has_coverage(),
            Ok(None) => false,
            Err(e) => {
                warn!("{e}; rebuilding");
                false
            }
        }
    }

    fn run_isolated(
        &self,
        family: &str,
        index: usize,
        font_data: &[u8],
        requested: &BTreeSet<u32>,
        supported: &BTreeSet<u32>,
        artifact: &Path,
    ) -> SubsetStatus {
        let engine = self.engine.as_ref();
        let job = || run_job(engine, family, index, font_data, requested, supported, artifact);
        panic::catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            SubsetStatus::Failed { error: format!("subset job panicked: {message}") }
        })
    }
}

fn run_job(
    engine: &dyn SubsetEngine,
    family: &str,
    index: usize,
    font_data: &[u8],
    requested: &BTreeSet<u32>,
    supported: &BTreeSet<u32>,
    artifact: &Path,
) -> SubsetStatus {
    let coverage = Coverage::compute(requested, supported);
    if coverage.is_empty() {
        info!("{family}: subset {index} has no glyphs in this font, skipping");
        // Only a forced rebuild reaches here with an artifact on disk.
        if artifact.is_file() {
            match fs::remove_file(artifact) {
                Ok(()) => info!("{family}: removed stale artifact for subset {index}"),
                Err(e) => warn!("Failed to remove stale artifact {}: {e}", artifact.display()),
            }
        }
        return SubsetStatus::EmptySkipped;
    }

    let data = match engine.subset(font_data, &coverage.actual, &SubsetOptions::strict()) {
        Ok(data) => data,
        Err(first) => {
            warn!("{family}: subset {index} failed ({first:#}), retrying with relaxed options");
            match engine.subset(font_data, &coverage.actual, &SubsetOptions::relaxed()) {
                Ok(data) => data,
                Err(e) => return SubsetStatus::Failed { error: format!("{e:#}") },
            }
        }
    };

    match write_atomic(artifact, &data) {
        Ok(()) => {
            info!(
                "{family}: built subset {index} -> {} ({} glyphs, {} bytes)",
                artifact.file_name().unwrap_or_default().to_string_lossy(),
                coverage.supported_count(),
                data.len()
            );
            SubsetStatus::Built { bytes: data.len() }
        }
        Err(e) => SubsetStatus::Failed { error: e.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(index: usize, status: SubsetStatus) -> SubsetOutcome {
        SubsetOutcome { index, cache_key: CacheKey::derive("Demo", index), status }
    }

    #[test]
    fn test_report_accessors() {
        let report = BuildReport {
            family: "Demo".into(),
            outcomes: vec![
                outcome(0, SubsetStatus::Built { bytes: 10 }),
                outcome(1, SubsetStatus::Skipped),
                outcome(2, SubsetStatus::EmptySkipped),
                outcome(3, SubsetStatus::Failed { error: "boom".into() }),
            ],
            metadata_written: 2,
        };

        assert_eq!(report.built(), vec![0]);
        assert_eq!(report.skipped(), vec![1]);
        assert_eq!(report.empty_skipped(), vec![2]);
        assert_eq!(report.failed(), vec![(3, "boom")]);
        assert!(!report.is_success());
        assert_eq!(report.status_of(2), Some(&SubsetStatus::EmptySkipped));
        assert_eq!(
            report.to_string(),
            "Demo: 1 built, 1 skipped, 1 empty, 1 failed, 2 metadata records written"
        );
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(SubsetStatus::Skipped.label(), "skipped");
        assert_eq!(SubsetStatus::Built { bytes: 1 }.label(), "built");
        assert_eq!(SubsetStatus::EmptySkipped.label(), "empty");
        assert_eq!(SubsetStatus::Failed { error: String::new() }.label(), "failed");
    }
}
