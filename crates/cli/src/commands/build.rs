//! Subset builds across one or many families.

use std::path::Path;

use anyhow::{Result, bail};
use fontsub_core::{BuildReport, FontService, io::FontFile};
use log::error;

/// Per-family tally of a build run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BuildSummary {
    /// A family fails when it could not be built at all or any of its subsets failed.
    pub fn from_results<'a>(
        results: impl IntoIterator<Item = (&'a str, &'a fontsub_core::Result<BuildReport>)>,
    ) -> Self {
        let mut summary = Self::default();
        for (family, result) in results {
            match result {
                Ok(report) if report.is_success() => summary.succeeded += 1,
                Ok(report) => {
                    for (index, e) in report.failed() {
                        error!("{family}: subset {index}: {e}");
                    }
                    summary.failed += 1;
                }
                Err(e) => {
                    error!("{family}: {e}");
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn ok_or_bail(&self, operation: &str) -> Result<()> {
        if self.failed > 0 {
            bail!("{operation} failed: {} succeeded, {} failed", self.succeeded, self.failed);
        }
        Ok(())
    }
}

/// Build a named family, a single font file, or every font in the font directory.
pub fn build(
    service: &FontService,
    family: Option<&str>,
    font: Option<&Path>,
    force: bool,
) -> Result<()> {
    let results = match (family, font) {
        (Some(family), _) => vec![(family.to_string(), service.build_family(family, force))],
        (None, Some(path)) => {
            vec![(FontFile::new(path).family(), service.build_font_file(path, force))]
        }
        (None, None) => service.build_all(force)?,
    };

    for report in results.iter().filter_map(|(_, r)| r.as_ref().ok()) {
        println!("{report}");
    }

    let summary = BuildSummary::from_results(results.iter().map(|(f, r)| (f.as_str(), r)));
    println!("build: {} succeeded, {} failed", summary.succeeded, summary.failed);
    summary.ok_or_bail("build")
}
