use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reelpress::{
    AbortSignal, Canvas, Container, DecodeAdapter, DecodePolicy, EngineKind, ExportConfig,
    ExportSettings, Fps, FrameCompositor, QualityPreset, SessionManager, SourceDecoder, Timeline,
};

#[derive(Parser, Debug)]
#[command(name = "reelpress", version)]
struct Cli {
    /// JSON runtime configuration (REELPRESS_* environment variables still apply on top).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single timestamp as a PNG.
    Frame(FrameArgs),
    /// Export the timeline as a video file (requires `ffmpeg`).
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input timeline JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Timeline time in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Output width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Output height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Root for relative media locators (defaults to the timeline's directory).
    #[arg(long)]
    assets_root: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input timeline JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output video path.
    #[arg(long)]
    out: PathBuf,

    /// Output width in pixels (even).
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Output height in pixels (even).
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Frame rate, integer or `num/den`.
    #[arg(long, default_value = "30")]
    fps: Fps,

    /// Duration in seconds (defaults to the end of the last element).
    #[arg(long)]
    duration: Option<f64>,

    /// draft | normal | high | lossless
    #[arg(long, default_value = "normal", value_parser = parse_quality)]
    quality: QualityPreset,

    /// mp4 | mov | webm (defaults to the output extension, then mp4).
    #[arg(long, value_parser = parse_container)]
    container: Option<Container>,

    /// auto | native | platform | optimized | continuous
    #[arg(long, default_value = "auto", value_parser = parse_engine)]
    engine: EngineChoice,

    /// Frames in flight between compositor and encoder.
    #[arg(long)]
    pipeline_depth: Option<usize>,

    /// Root for relative media locators (defaults to the timeline's directory).
    #[arg(long)]
    assets_root: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug)]
enum EngineChoice {
    Auto,
    Pinned(EngineKind),
}

fn parse_quality(s: &str) -> Result<QualityPreset, String> {
    QualityPreset::parse(s).map_err(|e| e.to_string())
}

fn parse_container(s: &str) -> Result<Container, String> {
    Container::parse(s).map_err(|e| e.to_string())
}

fn parse_engine(s: &str) -> Result<EngineChoice, String> {
    if s.trim().eq_ignore_ascii_case("auto") {
        return Ok(EngineChoice::Auto);
    }
    EngineKind::parse(s)
        .map(EngineChoice::Pinned)
        .map_err(|e| e.to_string())
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    match cli.cmd {
        Command::Frame(args) => cmd_frame(config, args),
        Command::Export(args) => cmd_export(config, args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ExportConfig> {
    let base = match path {
        Some(p) => ExportConfig::from_path(p)?,
        None => ExportConfig::default(),
    };
    Ok(base.with_env_overrides()?)
}

fn default_assets_root(in_path: &Path) -> PathBuf {
    in_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf()
}

fn cmd_frame(mut config: ExportConfig, args: FrameArgs) -> anyhow::Result<()> {
    let timeline = Timeline::from_path(&args.in_path)?;
    config.assets_root = args
        .assets_root
        .unwrap_or_else(|| default_assets_root(&args.in_path));

    let canvas = Canvas {
        width: args.width,
        height: args.height,
    };
    let mut adapter = DecodeAdapter::new(
        Box::new(SourceDecoder::from_config(&config)),
        DecodePolicy::Ephemeral,
    );
    let mut compositor = FrameCompositor::new(canvas, [0, 0, 0, 255])?;
    let composed = compositor.render_frame(&timeline, args.time, &mut adapter)?;
    for w in &composed.warnings {
        eprintln!("warning: {w}");
    }

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let frame = composed.frame;
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(mut config: ExportConfig, args: ExportArgs) -> anyhow::Result<()> {
    let timeline = Timeline::from_path(&args.in_path)?;
    config.assets_root = args
        .assets_root
        .unwrap_or_else(|| default_assets_root(&args.in_path));
    if let Some(depth) = args.pipeline_depth {
        config.pipeline_depth = depth;
    }
    if let EngineChoice::Pinned(kind) = args.engine {
        config.engine_order = Some(vec![kind]);
    }

    let duration = args.duration.unwrap_or_else(|| timeline.content_end_sec());
    let mut settings = ExportSettings::new(args.width, args.height, args.fps, duration, &args.out);
    settings.quality = args.quality;
    settings.container = match args.container {
        Some(c) => c,
        None => args
            .out
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|e| Container::parse(e).ok())
            .unwrap_or_default(),
    };

    let manager = SessionManager::new(config)?;
    let file = manager.export(
        &timeline,
        &settings,
        |pct: f32, stage: &str| eprint!("\r{pct:5.1}% {stage:<24}"),
        AbortSignal::new(),
    )?;
    eprintln!();

    for skipped in &file.skipped_engines {
        eprintln!("skipped engine {skipped}");
    }
    for w in &file.warnings {
        eprintln!("warning: {w}");
    }
    println!(
        "wrote {} ({} frames, {:.3}s, engine {})",
        file.path.display(),
        file.frame_count,
        file.duration_secs,
        file.engine
    );
    Ok(())
}
