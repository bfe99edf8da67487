//! The font service: one scheduler, one metadata store and one stylesheet
//! synthesizer wired to a [`Config`].

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{info, warn};

use crate::{
    cache_key::CacheKey,
    config::Config,
    css::CssSynthesizer,
    engine::{HarfBuzzEngine, SubsetEngine},
    error::{Error, Result},
    io::{FontFile, find_files_by_extension},
    listing::{FontListing, list_fonts},
    metadata::{MetadataRecord, MetadataStore},
    scheduler::{BuildReport, SubsetBuildScheduler},
};

#[derive(Debug)]
pub struct FontService {
    config: Config,
    store: Arc<MetadataStore>,
    scheduler: SubsetBuildScheduler,
    css: CssSynthesizer,
}

impl FontService {
    /// Service using the HarfBuzz + WOFF2 engine.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_engine(config, Arc::new(HarfBuzzEngine))
    }

    /// Service with a caller-supplied engine. Creates the configured directories.
    pub fn with_engine(config: Config, engine: Arc<dyn SubsetEngine>) -> Result<Self> {
        config.ensure_dirs()?;
        let subsets = config.subsets()?;
        let scheduler = SubsetBuildScheduler::new(
            config.cache_dir.clone(),
            subsets,
            engine,
            config.worker_count(),
        )?;
        let store = Arc::new(MetadataStore::new(config.meta_dir.clone()));
        let css = CssSynthesizer::new(store.clone(), config.artifact_url_prefix.clone());
        Ok(Self { config, store, scheduler, css })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<MetadataStore> {
        &self.store
    }

    pub fn scheduler(&self) -> &SubsetBuildScheduler {
        &self.scheduler
    }

    /// Source fonts under the font directory, recursively.
    pub fn font_files(&self) -> Result<Vec<PathBuf>> {
        find_files_by_extension(&self.config.font_dir, &["ttf", "otf"], true)
    }

    /// Locate the source font of a family.
    pub fn font_path(&self, family: &str) -> Result<PathBuf> {
        self.font_files()?
            .into_iter()
            .find(|path| FontFile::new(path).family() == family)
            .ok_or_else(|| Error::MissingFontFile {
                path: self.config.font_dir.join(format!("{family}.ttf")),
            })
    }

    /// Build a family by name.
    pub fn build_family(&self, family: &str, force: bool) -> Result<BuildReport> {
        let path = self.font_path(family)?;
        self.scheduler.build_family(family, &path, force, &self.store)
    }

    /// Build the family whose source is `path`; the family name is the file stem.
    pub fn build_font_file(&self, path: &Path, force: bool) -> Result<BuildReport> {
        let family = FontFile::new(path).family();
        self.scheduler.build_family(&family, path, force, &self.store)
    }

    /// Build every font in the font directory. A failing family does not stop the others.
    pub fn build_all(&self, force: bool) -> Result<Vec<(String, Result<BuildReport>)>> {
        let fonts = self.font_files()?;
        info!("Found {} fonts in {}", fonts.len(), self.config.font_dir.display());

        Ok(fonts
            .iter()
            .map(|path| {
                let family = FontFile::new(path).family();
                let result = self.build_font_file(path, force);
                if let Err(e) = &result {
                    warn!("{family}: {e}");
                }
                (family, result)
            })
            .collect())
    }

    pub fn metadata(&self, family: &str) -> Result<Arc<[MetadataRecord]>> {
        self.store.get(family)
    }

    pub fn stylesheet(&self, family_specs: &BTreeSet<String>, display: &str) -> Result<Arc<str>> {
        self.css.synthesize(family_specs, display)
    }

    pub fn list_fonts(&self) -> Result<FontListing> {
        list_fonts(&self.config.font_dir, &self.config.base_url)
    }

    /// Bytes of a built artifact, or `None` if it has not been built.
    pub fn cached_artifact(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        let path = self.scheduler.artifact_path(key);
        if !path.is_file() {
            return Ok(None);
        }
        fs::read(&path).map(Some).map_err(|source| Error::ReadFont { path, source })
    }
}
