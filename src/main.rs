use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use simplelog::{Config, LevelFilter, WriteLogger};

use pdfpane::panic_handler::initialize_panic_handler;
use pdfpane::pdf::{MupdfEngine, ViewMode};
use pdfpane::png_export::export_pages;
use pdfpane::{Settings, Viewer};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(
    name = "pdfpane",
    version,
    about = "Render PDF pages the way the embedded viewer shows them"
)]
struct Cli {
    /// Document path, file:// URL or data URI
    source: String,

    /// Page to navigate to (1-based)
    #[arg(short, long, default_value_t = 1)]
    page: usize,

    /// Explicit zoom factor
    #[arg(short, long, conflicts_with = "mode")]
    scale: Option<f32>,

    /// Scale the pages to fit the viewport
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Viewport size as WIDTHxHEIGHT
    #[arg(long, default_value = "1024x768", value_parser = parse_viewport)]
    viewport: (f32, f32),

    /// Lay out as if the viewer were fullscreen
    #[arg(long)]
    fullscreen: bool,

    /// Directory the page images are written to
    #[arg(short, long, default_value = "pages")]
    out: PathBuf,

    /// Settings file
    #[arg(long, default_value = "pdfpane.yaml")]
    settings: PathBuf,

    #[arg(long, default_value = "pdfpane.log")]
    log_file: PathBuf,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Default,
    FitToWidth,
    FitToHeight,
}

impl From<ModeArg> for ViewMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Default => ViewMode::Default,
            ModeArg::FitToWidth => ViewMode::FitToWidth,
            ModeArg::FitToHeight => ViewMode::FitToHeight,
        }
    }
}

fn parse_viewport(s: &str) -> Result<(f32, f32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f32>()
            .ok()
            .filter(|n| *n > 0.0)
            .ok_or_else(|| format!("invalid dimension {v:?}"))
    };
    Ok((parse(w)?, parse(h)?))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    WriteLogger::init(
        level,
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("creating {}", cli.log_file.display()))?,
    )?;
    initialize_panic_handler();

    let settings = Settings::load(&cli.settings)?;
    let mut viewer = Viewer::new(MupdfEngine, settings)
        .on_page_changed(|current, total| info!("Current page {current} of {total}"))
        .on_page_error(|e| warn!("{e}"));

    let (width, height) = cli.viewport;
    viewer.set_viewport(width, height, Instant::now());
    viewer.load(&cli.source)?;
    settle(&mut viewer)?;

    if cli.fullscreen {
        viewer.toggle_fullscreen();
    }
    if let Some(mode) = cli.mode {
        viewer.set_view_mode(mode.into());
    }
    if let Some(scale) = cli.scale {
        viewer.set_scale(scale);
    }
    viewer.navigate_to(cli.page);
    viewer.refresh_visibility();
    settle(&mut viewer)?;

    let bitmaps: Vec<_> = (1..=viewer.state().page_count)
        .filter_map(|n| viewer.page_bitmap(n))
        .filter(|page| (page.scale - viewer.state().scale).abs() < 1e-3)
        .collect();
    let refs: Vec<_> = bitmaps.iter().map(|page| &**page).collect();
    let written = export_pages(&cli.out, &refs)?;

    let toolbar = viewer.toolbar();
    println!(
        "{} | {} | {}",
        toolbar.pages_label, toolbar.zoom_label, toolbar.view_mode_label
    );
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}

fn settle(viewer: &mut Viewer<MupdfEngine>) -> Result<()> {
    if !viewer.wait_idle(SETTLE_TIMEOUT)? {
        bail!("rendering did not finish within {SETTLE_TIMEOUT:?}");
    }
    Ok(())
}
