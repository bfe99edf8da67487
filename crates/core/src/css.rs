//! `@font-face` stylesheet synthesis from family metadata.

use std::{
    collections::BTreeSet,
    fmt,
    num::NonZeroUsize,
    sync::Arc,
};

use log::debug;
use lru::LruCache;
use parking_lot::Mutex;

use crate::{error::Result, metadata::MetadataStore};

/// Weight used when a spec or variant does not name one.
pub const DEFAULT_WEIGHT: &str = "400";

/// Stylesheets remembered per metadata generation.
pub const DEFAULT_MEMO_CAPACITY: usize = 128;

const ITALIC_MARKER: &str = "italic";

/// One requested style of a family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub style: &'static str,
    pub weight: String,
}

impl Variant {
    /// `700` -> normal 700, `700italic` -> italic 700, `italic` -> italic 400.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        if token.contains(ITALIC_MARKER) {
            Self { style: "italic", weight: weight_or_default(&token.replace(ITALIC_MARKER, "")) }
        } else {
            Self { style: "normal", weight: weight_or_default(token) }
        }
    }
}

fn weight_or_default(weight: &str) -> String {
    match weight.trim() {
        "" => DEFAULT_WEIGHT.to_string(),
        weight => weight.to_string(),
    }
}

/// `family:variant,variant,...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilySpec {
    pub family: String,
    pub variants: Vec<Variant>,
}

impl FamilySpec {
    pub fn parse(spec: &str) -> Self {
        let (family, variants) = match spec.split_once(':') {
            Some((family, variants)) => (family, variants.split(',').map(Variant::parse).collect()),
            None => (spec, vec![Variant::parse(DEFAULT_WEIGHT)]),
        };
        Self { family: family.trim().to_string(), variants }
    }
}

type MemoKey = (Vec<String>, String);

/// Stylesheets rendered from one metadata generation.
struct Memo {
    generation: u64,
    entries: LruCache<MemoKey, Arc<str>>,
}

/// Turns family specs into stylesheet text, memoized per metadata generation.
pub struct CssSynthesizer {
    store: Arc<MetadataStore>,
    url_prefix: String,
    memo: Mutex<Memo>,
}

impl fmt::Debug for CssSynthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CssSynthesizer")
            .field("url_prefix", &self.url_prefix)
            .field("memoized", &self.memo_len())
            .finish()
    }
}

impl CssSynthesizer {
    pub fn new(store: Arc<MetadataStore>, url_prefix: impl Into<String>) -> Self {
        Self::with_capacity(store, url_prefix, DEFAULT_MEMO_CAPACITY)
    }

    /// Like [`CssSynthesizer::new`], remembering at most `capacity` stylesheets.
    pub fn with_capacity(
        store: Arc<MetadataStore>,
        url_prefix: impl Into<String>,
        capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        let generation = store.generation();
        Self {
            store,
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
            memo: Mutex::new(Memo { generation, entries: LruCache::new(capacity) }),
        }
    }

    /// Stylesheet for a set of family specs and a `font-display` strategy.
    ///
    /// Specs are processed in sorted order, so equal sets give identical text.
    /// Subsets with zero coverage contribute no rule.
    pub fn synthesize(&self, family_specs: &BTreeSet<String>, display: &str) -> Result<Arc<str>> {
        let generation = self.store.generation();
        let key: MemoKey = (family_specs.iter().cloned().collect(), display.to_string());

        {
            let mut memo = self.memo.lock();
            if memo.generation == generation
                && let Some(css) = memo.entries.get(&key)
            {
                debug!("Stylesheet memo hit");
                return Ok(css.clone());
            }
        }

        let css: Arc<str> = self.render(family_specs, display)?.into();
        self.remember(key, css.clone(), generation);
        Ok(css)
    }

    /// Store a stylesheet rendered from `rendered_at`, unless a write has
    /// happened since.
    fn remember(&self, key: MemoKey, css: Arc<str>, rendered_at: u64) {
        let mut memo = self.memo.lock();
        if self.store.generation() != rendered_at {
            debug!("Metadata changed while rendering; not memoizing");
            return;
        }
        if memo.generation != rendered_at {
            memo.entries.clear();
            memo.generation = rendered_at;
        }
        memo.entries.put(key, css);
    }

    fn render(&self, family_specs: &BTreeSet<String>, display: &str) -> Result<String> {
        let mut rules = Vec::new();

        for spec in family_specs.iter().map(|s| FamilySpec::parse(s)) {
            let records = self.store.get(&spec.family)?;
            for variant in &spec.variants {
                for record in records.iter().filter(|r| r.has_coverage()) {
                    rules.push(format!(
                        "/* [{index}] */\n\
                         @font-face {{\n  \
                           font-family: '{family}';\n  \
                           font-style: {style};\n  \
                           font-weight: {weight};\n  \
                           src: url('{prefix}/{file}') format('woff2');\n  \
                           unicode-range: {range};\n  \
                           font-display: {display};\n\
                         }}\n",
                        index = record.subset_index,
                        family = spec.family,
                        style = variant.style,
                        weight = variant.weight,
                        prefix = self.url_prefix,
                        file = record.artifact_file_name,
                        range = record.subset_range_spec,
                    ));
                }
            }
        }

        Ok(rules.join("\n"))
    }

    /// Number of memoized stylesheets.
    pub fn memo_len(&self) -> usize {
        self.memo.lock().entries.len()
    }
}
