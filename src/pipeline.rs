use std::path::PathBuf;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::config::Settings;
use crate::dedup;
use crate::error::ScrapeError;
use crate::geojson::{self, FeatureCollection};
use crate::parser;
use crate::render::Renderer;

/// Counters printed at the end of a run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunReport {
    pub total: usize,
    pub unique: usize,
    pub duplicates: usize,
    pub malformed: usize,
    pub parse_failures: usize,
    pub output_path: Option<PathBuf>,
}

impl RunReport {
    pub fn print(&self) {
        if let Some(path) = &self.output_path {
            println!("GeoJSON created: {}", path.display());
        }
        println!("Total bookcases: {}", self.total);
        println!("Unique bookcases: {}", self.unique);
        println!("Duplicate bookcases: {}", self.duplicates);
        if self.malformed > 0 {
            println!("Malformed coordinates: {}", self.malformed);
        }
        if self.parse_failures > 0 {
            println!("Unparseable records: {}", self.parse_failures);
        }
    }
}

/// Render → extract → dedup → write `bookcases.geojson`.
pub async fn fetch(settings: &Settings, renderer: &dyn Renderer) -> Result<RunReport, ScrapeError> {
    let html = render_page(renderer, &settings.url).await?;
    let (collection, mut report) = collect(&html, settings.strict_coordinates)?;
    let path = geojson::write_collection(&settings.output_dir, &collection)?;
    report.output_path = Some(path);
    Ok(report)
}

/// Same as [`fetch`] without touching the output directory.
pub async fn dry_run(settings: &Settings, renderer: &dyn Renderer) -> Result<RunReport, ScrapeError> {
    let html = render_page(renderer, &settings.url).await?;
    let (_, report) = collect(&html, settings.strict_coordinates)?;
    Ok(report)
}

async fn render_page(renderer: &dyn Renderer, url: &str) -> Result<String, ScrapeError> {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("Rendering {} ({})", url, renderer.name()));
    pb.enable_steady_tick(Duration::from_millis(120));

    let html = renderer.render(url).await;
    pb.finish_and_clear();
    let html = html?;
    info!("Rendered {} bytes from {}", html.len(), url);
    Ok(html)
}

fn found_line(n: usize) -> String {
    format!("Found {} bookcases on the webpage", n)
}

/// Extraction and dedup over rendered HTML. Fails with `NoRecordsFound` when
/// no record was extracted; records that all have unusable coordinates still
/// yield an empty collection.
pub fn collect(html: &str, strict: bool) -> Result<(FeatureCollection, RunReport), ScrapeError> {
    let extraction = parser::extract_records(html);
    if extraction.records.is_empty() {
        return Err(ScrapeError::NoRecordsFound);
    }
    println!("{}", found_line(extraction.records.len()));

    let parse_failures = extraction.failures.len();
    let d = dedup::dedup(extraction.records, strict)?;
    let report = RunReport {
        total: d.total,
        unique: d.features.len(),
        duplicates: d.duplicates,
        malformed: d.malformed,
        parse_failures,
        output_path: None,
    };
    Ok((FeatureCollection { features: d.features }, report))
}
