use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::error::ScrapeError;

pub const DEFAULT_URL: &str = "https://www.boite-a-lire.com/";
pub const DEFAULT_OUTPUT_DIR: &str = "bookcases";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Looked up with any extension `config` understands (toml, json, yaml...).
const DEFAULT_CONFIG_FILE: &str = "bookcases";
const ENV_PREFIX: &str = "BOOKCASES";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Headless Chromium over CDP
    Chrome,
    /// spider.cloud rendering API
    Spider,
    /// Plain HTTP GET, no JavaScript
    Http,
    /// Already-rendered HTML on disk
    File,
}

/// Resolved run settings: defaults, then config file, then `BOOKCASES_*`
/// environment variables, then command-line flags.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub url: String,
    pub output_dir: PathBuf,
    pub renderer: RendererKind,
    pub html_file: Option<PathBuf>,
    pub render_timeout_secs: u64,
    pub user_agent: String,
    pub browser_path: Option<PathBuf>,
    pub strict_coordinates: bool,
}

/// Values given explicitly on the command line. `None` leaves the lower
/// layers untouched.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub renderer: Option<RendererKind>,
    pub html_file: Option<PathBuf>,
    pub render_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub browser_path: Option<PathBuf>,
    pub strict_coordinates: bool,
}

impl Settings {
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self, ScrapeError> {
        Self::load_from(file, Environment::with_prefix(ENV_PREFIX), overrides)
    }

    fn load_from(
        file: Option<&Path>,
        env: Environment,
        overrides: &Overrides,
    ) -> Result<Self, ScrapeError> {
        let builder = defaults()?;
        let builder = match file {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };
        let mut settings: Settings = builder
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.apply(overrides);
        settings.validate()?;
        Ok(settings)
    }

    fn apply(&mut self, o: &Overrides) {
        if let Some(url) = &o.url {
            self.url = url.clone();
        }
        if let Some(dir) = &o.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(kind) = o.renderer {
            self.renderer = kind;
        }
        if let Some(path) = &o.html_file {
            self.html_file = Some(path.clone());
            // An input file without an explicit renderer means "read it".
            if o.renderer.is_none() {
                self.renderer = RendererKind::File;
            }
        }
        if let Some(secs) = o.render_timeout_secs {
            self.render_timeout_secs = secs;
        }
        if let Some(ua) = &o.user_agent {
            self.user_agent = ua.clone();
        }
        if let Some(path) = &o.browser_path {
            self.browser_path = Some(path.clone());
        }
        if o.strict_coordinates {
            self.strict_coordinates = true;
        }
    }

    fn validate(&self) -> Result<(), ScrapeError> {
        if self.render_timeout_secs == 0 {
            return Err(ScrapeError::Config(
                "render_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.renderer == RendererKind::File && self.html_file.is_none() {
            return Err(ScrapeError::Config(
                "the file renderer needs html_file (--html-file)".into(),
            ));
        }
        if self.renderer != RendererKind::File && self.url.trim().is_empty() {
            return Err(ScrapeError::Config("url must not be empty".into()));
        }
        Ok(())
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }
}

fn defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ScrapeError> {
    Ok(Config::builder()
        .set_default("url", DEFAULT_URL)?
        .set_default("output_dir", DEFAULT_OUTPUT_DIR)?
        .set_default("renderer", "chrome")?
        .set_default("render_timeout_secs", DEFAULT_TIMEOUT_SECS)?
        .set_default("user_agent", DEFAULT_USER_AGENT)?
        .set_default("strict_coordinates", false)?)
}
