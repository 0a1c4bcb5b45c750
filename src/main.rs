mod config;
mod dedup;
mod error;
mod geojson;
mod gpx;
mod parser;
mod pipeline;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};

use crate::config::{Overrides, RendererKind, Settings};
use crate::error::{ScrapeError, EXIT_FAILURE};

#[derive(Parser)]
#[command(
    name = "bookcase_scraper",
    about = "Export the bookcases embedded in a map page as GeoJSON"
)]
struct Cli {
    /// Config file (toml, json or yaml); defaults to ./bookcases.* if present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the page and write <output-dir>/bookcases.geojson
    Fetch(SourceArgs),
    /// Render and count records without writing anything
    Extract(SourceArgs),
    /// Convert a GeoJSON export into GPX waypoints
    Gpx {
        /// GeoJSON FeatureCollection to convert
        input: PathBuf,
        /// Output file (default: input with a .gpx extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Waypoint group name
        #[arg(short, long, default_value = gpx::DEFAULT_TITLE)]
        title: String,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Page holding the embedded records
    #[arg(long)]
    url: Option<String>,
    /// Directory replaced by each run
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    #[arg(short, long, value_enum)]
    renderer: Option<RendererKind>,
    /// Saved HTML to read instead of rendering (implies --renderer file)
    #[arg(long)]
    html_file: Option<PathBuf>,
    /// Seconds to wait for the page to render
    #[arg(long = "timeout")]
    timeout_secs: Option<u64>,
    #[arg(long)]
    user_agent: Option<String>,
    /// Chromium/Chrome binary (default: search PATH)
    #[arg(long)]
    browser_path: Option<PathBuf>,
    /// Abort on the first record with an unusable coord_gps
    #[arg(long)]
    strict_coordinates: bool,
}

impl From<SourceArgs> for Overrides {
    fn from(a: SourceArgs) -> Self {
        Self {
            url: a.url,
            output_dir: a.output_dir,
            renderer: a.renderer,
            html_file: a.html_file,
            render_timeout_secs: a.timeout_secs,
            user_agent: a.user_agent,
            browser_path: a.browser_path,
            strict_coordinates: a.strict_coordinates,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let result = run(cli).await;

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Fetch(args) => {
            let settings = Settings::load(cli.config.as_deref(), &args.into())?;
            let renderer = render::from_settings(&settings)?;
            let report = pipeline::fetch(&settings, renderer.as_ref()).await?;
            report.print();
            Ok(())
        }
        Commands::Extract(args) => {
            let settings = Settings::load(cli.config.as_deref(), &args.into())?;
            let renderer = render::from_settings(&settings)?;
            let report = pipeline::dry_run(&settings, renderer.as_ref()).await?;
            report.print();
            Ok(())
        }
        Commands::Gpx {
            input,
            output,
            title,
        } => {
            let (path, count) = gpx::convert(&input, output.as_deref(), &title)?;
            println!("Wrote {} waypoints to {}", count, path.display());
            Ok(())
        }
    }
}

/// Status for a failed run; errors outside the scrape taxonomy are failures.
fn exit_code(e: &anyhow::Error) -> u8 {
    e.downcast_ref::<ScrapeError>()
        .map(ScrapeError::exit_code)
        .unwrap_or(EXIT_FAILURE)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
