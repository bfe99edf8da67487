//! CLI definitions and command dispatch.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fontsub_core::{Config, FontService, http::DEFAULT_DISPLAY};

use crate::commands::{artifact, build, css, key, list, meta};

#[derive(Parser)]
#[command(name = "fontsub")]
#[command(about = "Build unicode-range font subsets and the stylesheets that load them")]
pub struct Cli {
    /// JSON configuration file; built-in defaults when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build missing subsets for one family, one font file, or every font.
    Build {
        /// Family name (font file name without extension).
        family: Option<String>,
        #[arg(long, conflicts_with = "family")]
        font: Option<PathBuf>,
        /// Rebuild artifacts and metadata even when present.
        #[arg(short, long)]
        force: bool,
    },
    /// Print the stylesheet for one or more family specs (`Family:400,700italic`).
    Css {
        #[arg(short, long = "family", required = true)]
        families: Vec<String>,
        #[arg(short, long, default_value = DEFAULT_DISPLAY)]
        display: String,
    },
    /// Print the font listing as JSON.
    List,
    /// Print the metadata records of a family as JSON.
    Meta { family: String },
    /// Print the cache key of a subset.
    Key { family: String, index: usize },
    /// Copy a built artifact out of the cache.
    Artifact {
        /// `{key}.woff2`
        file: String,
        #[arg(short, long)]
        output: PathBuf,
    },
}

impl Cli {
    pub fn run(self) -> Result<()> {
        if let Commands::Key { family, index } = &self.command {
            println!("{}", key(family, *index));
            return Ok(());
        }

        let config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        let service = FontService::new(config)?;
        self.command.run(&service)
    }
}

impl Commands {
    pub fn run(self, service: &FontService) -> Result<()> {
        match self {
            Commands::Build { family, font, force } => {
                build(service, family.as_deref(), font.as_deref(), force)?;
            }
            Commands::Css { families, display } => print!("{}", css(service, &families, &display)?),
            Commands::List => println!("{}", list(service)?),
            Commands::Meta { family } => println!("{}", meta(service, &family)?),
            Commands::Key { family, index } => println!("{}", key(&family, index)),
            Commands::Artifact { file, output } => artifact(service, &file, &output)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build() {
        let cli = Cli::try_parse_from(["fontsub", "build", "Demo", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Build { family: Some(ref f), font: None, force: true } if f == "Demo"
        ));
    }

    #[test]
    fn test_build_family_and_font_conflict() {
        let result = Cli::try_parse_from(["fontsub", "build", "Demo", "--font", "a.ttf"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_css() {
        let cli = Cli::try_parse_from([
            "fontsub", "-c", "fontsub.json", "css", "-f", "Demo:700", "-f", "Other",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("fontsub.json")));
        match cli.command {
            Commands::Css { families, display } => {
                assert_eq!(families, vec!["Demo:700", "Other"]);
                assert_eq!(display, DEFAULT_DISPLAY);
            }
            _ => panic!("expected css"),
        }
    }
}
