//! Shared fixtures: in-memory fonts, a scripted engine and throwaway configs.

#![allow(dead_code)]

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use anyhow::bail;
use fontsub_core::{Config, FontService, SubsetEngine, SubsetOptions};
use parking_lot::Mutex;
use tempfile::TempDir;
use write_fonts::{FontBuilder, tables::cmap::Cmap, types::GlyphId};

/// A font holding only a `cmap` that maps each codepoint to its own glyph.
pub fn make_font(codepoints: &[u32]) -> Vec<u8> {
    let mappings: Vec<(char, GlyphId)> = codepoints
        .iter()
        .enumerate()
        .filter_map(|(i, cp)| Some((char::from_u32(*cp)?, GlyphId::new(i as u32 + 1))))
        .collect();
    let cmap = Cmap::from_mappings(mappings).expect("cmap");

    let mut builder = FontBuilder::new();
    builder.add_table(&cmap).expect("add cmap");
    builder.build()
}

/// What the fake engine does when a codepoint set contains a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Fail,
    /// Fail with strict options, succeed with relaxed ones.
    FailStrict,
    Panic,
}

/// Engine that returns `FAKE` followed by the codepoints, with scripted failures.
#[derive(Default)]
pub struct FakeEngine {
    calls: AtomicUsize,
    triggers: Mutex<Vec<(u32, Behavior)>>,
    seen: Mutex<Vec<(BTreeSet<u32>, SubsetOptions)>>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(self: &Arc<Self>, codepoint: u32, behavior: Behavior) -> Arc<Self> {
        self.triggers.lock().push((codepoint, behavior));
        self.clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<(BTreeSet<u32>, SubsetOptions)> {
        self.seen.lock().clone()
    }
}

impl SubsetEngine for FakeEngine {
    fn subset(
        &self,
        _font_data: &[u8],
        codepoints: &BTreeSet<u32>,
        options: &SubsetOptions,
    ) -> anyhow::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push((codepoints.clone(), options.clone()));

        let trigger = self
            .triggers
            .lock()
            .iter()
            .find(|(cp, _)| codepoints.contains(cp))
            .map(|(_, behavior)| *behavior);
        match trigger {
            Some(Behavior::Fail) => bail!("scripted failure"),
            Some(Behavior::FailStrict) if *options == SubsetOptions::strict() => {
                bail!("strict options rejected")
            }
            Some(Behavior::Panic) => panic!("scripted panic"),
            _ => {}
        }

        let mut out = b"FAKE".to_vec();
        for cp in codepoints {
            out.extend_from_slice(&cp.to_be_bytes());
        }
        Ok(out)
    }
}

/// Temporary font/cache/meta directories plus a subset table file.
pub struct Fixture {
    pub dir: TempDir,
    pub config: Config,
}

/// Route `log` output through the test harness; `RUST_LOG` selects the level.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

impl Fixture {
    pub fn new(subsets: &[&str]) -> Self {
        init_logging();
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        let subsets_file = root.join("subsets.json");
        fs::write(&subsets_file, serde_json::to_string(subsets).expect("json")).expect("write");

        let config = Config {
            font_dir: root.join("fonts"),
            cache_dir: root.join("cache"),
            meta_dir: root.join("meta"),
            subsets_file: Some(subsets_file),
            base_url: "http://localhost:8080".to_string(),
            worker_fraction: 1.0,
            ..Config::default()
        };
        fs::create_dir_all(&config.font_dir).expect("font dir");
        Self { dir, config }
    }

    pub fn add_font(&self, file_name: &str, codepoints: &[u32]) -> PathBuf {
        let path = self.config.font_dir.join(file_name);
        fs::write(&path, make_font(codepoints)).expect("write font");
        path
    }

    pub fn service(&self, engine: Arc<dyn SubsetEngine>) -> FontService {
        FontService::with_engine(self.config.clone(), engine).expect("service")
    }

    pub fn meta_files(&self, family: &str) -> Vec<(PathBuf, Vec<u8>)> {
        let mut files: Vec<_> = fs::read_dir(self.config.meta_dir.join(family))
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .map(|p| {
                        let data = fs::read(&p).expect("read meta");
                        (p, data)
                    })
                    .collect()
            })
            .unwrap_or_default();
        files.sort();
        files
    }
}

pub fn artifact_exists(config: &Config, family: &str, index: usize) -> bool {
    artifact_path(config, family, index).is_file()
}

pub fn artifact_path(config: &Config, family: &str, index: usize) -> PathBuf {
    config.cache_dir.join(fontsub_core::derive_key(family, index).artifact_file_name())
}

pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&fs::read(path).expect("read")).expect("json")
}
