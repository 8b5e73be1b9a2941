// this_file: src/main.rs

//! `render`: the CLI surface of §6 — a thin collaborator wiring CLI parsing,
//! file I/O, and the `flipbook` library's C1–C9 pipeline together.

use clap::Parser;
use flipbook::animation::{build_worker_contexts, PlaceholderAnimation};
use flipbook::assets::apply_image_overrides;
use flipbook::dispatcher::{compute_frame_plan, partition_round_robin};
use flipbook::fontmanager::HeuristicFontManager;
use flipbook::logging::init_logging;
use flipbook::measure::MeasurementMode;
use flipbook::overrides::{parse_override_document, OverrideDocument};
use flipbook::pipeline::{apply_text_overrides, parse_fonts_list};
use flipbook::security::validate_json_size;
use flipbook::sizer::DEFAULT_TEXT_PADDING;
use flipbook::worker::{run_worker, Delivery, OutputFormats, Progress};
use flipbook::writer::FrameBuffer;
use serde_json::Value;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Renders a Lottie animation to a sequence of RGBA frames, applying a
/// text-autofit and layer-override pass first.
#[derive(Parser)]
#[command(name = "render", author, version, about, long_about = None)]
struct Cli {
    /// Stream PNG frames, in order, to stdout instead of writing files.
    #[arg(long)]
    stream: bool,

    /// Enable debug-level logging.
    #[arg(long)]
    debug: bool,

    /// Path to a layer-override document (§3 Override record / Image
    /// override record).
    #[arg(long = "layer-overrides")]
    layer_overrides: Option<PathBuf>,

    /// Fraction of the raw target width used as the autofit target
    /// (§4.4 Padding).
    #[arg(long = "text-padding", default_value_t = DEFAULT_TEXT_PADDING)]
    text_padding: f64,

    /// Text measurement mode: fast | accurate | pixel-perfect (§4.3).
    #[arg(long = "text-measurement-mode", default_value = "accurate")]
    text_measurement_mode: String,

    /// Worker thread count (0 = hardware concurrency).
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Emit WebP instead of PNG in file mode (ignored in stream mode,
    /// §4.9 stream-mode constraint).
    #[arg(long)]
    webp: bool,

    /// Animation JSON file.
    input: PathBuf,

    /// Output directory in file mode (defaults to `-` in stream mode).
    output_dir: Option<String>,

    /// Output FPS (defaults to the animation's own FPS, or 30).
    fps: Option<f64>,
}

fn main() -> ExitCode {
    flipbook::crash::install();
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(cli) {
        Ok(summary) => {
            log::info!("rendered {} frames, {} failed", summary.rendered, summary.failed);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("render: {}", e);
            ExitCode::FAILURE
        }
    }
}

struct RunSummary {
    rendered: u64,
    failed: u64,
}

fn run(cli: Cli) -> anyhow::Result<RunSummary> {
    let input_text = std::fs::read_to_string(&cli.input)?;
    validate_json_size(&input_text)?;
    let root: Value = serde_json::from_str(&input_text)?;

    let mode = MeasurementMode::parse(&cli.text_measurement_mode)
        .ok_or_else(|| anyhow::anyhow!("unknown --text-measurement-mode '{}'", cli.text_measurement_mode))?;

    let overrides = load_overrides(&cli)?;
    let override_dir = cli
        .layer_overrides
        .as_ref()
        .and_then(|p| p.parent())
        .map(|p| p.to_path_buf())
        .unwrap_or_default();

    let with_images = apply_image_overrides(&input_text, &overrides.image_layers, &override_dir);
    let fonts_list = parse_fonts_list(&root);
    let animation_width = root.get("w").and_then(|v| v.as_f64()).unwrap_or(0.0);
    let font_manager = HeuristicFontManager::default();

    let mutated = apply_text_overrides(
        &with_images,
        &overrides,
        &fonts_list,
        &font_manager,
        animation_width,
        cli.text_padding,
        mode,
    );
    // The mutated document is what a real vector-graphics engine would parse
    // to build animation instances (§4.6). No such engine ships in this
    // repo (§1 out of scope); `PlaceholderAnimation` stands in, sized from
    // the input's own declared dimensions/timing so the dispatcher/worker/
    // writer pipeline is exercised end to end.
    let _ = &mutated;

    let fr = root.get("fr").and_then(|v| v.as_f64()).unwrap_or(30.0);
    let ip = root.get("ip").and_then(|v| v.as_f64()).unwrap_or(0.0);
    let op = root.get("op").and_then(|v| v.as_f64()).unwrap_or(0.0);
    let duration = ((op - ip) / fr).max(0.0);
    let fps = cli.fps.unwrap_or(fr);
    let width = root.get("w").and_then(|v| v.as_u64()).unwrap_or(512) as u32;
    let height = root.get("h").and_then(|v| v.as_u64()).unwrap_or(512) as u32;

    let worker_count = if cli.workers == 0 {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    } else {
        cli.workers
    };

    let plan = compute_frame_plan(duration, fps);
    let buckets = partition_round_robin(&plan, worker_count);
    let mut contexts = build_worker_contexts(worker_count, || PlaceholderAnimation::new(duration, fps, width, height));

    let formats = OutputFormats {
        png: !cli.webp || cli.stream,
        webp: cli.webp && !cli.stream,
    };
    let progress = Progress::default();

    if cli.stream {
        let buffer = FrameBuffer::new(plan.len());
        std::thread::scope(|scope| {
            for (ctx, frames) in contexts.iter_mut().zip(buckets.iter()) {
                let (animation, surface, conversion) = ctx;
                let buffer = &buffer;
                let progress = &progress;
                scope.spawn(move || {
                    run_worker(animation, surface, conversion, frames, formats, &Delivery::Stream(buffer), progress);
                });
            }
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            let _ = buffer.drain_in_order(&mut lock);
        });
    } else {
        let output_dir = PathBuf::from(cli.output_dir.clone().unwrap_or_else(|| ".".to_string()));
        std::fs::create_dir_all(&output_dir)?;
        std::thread::scope(|scope| {
            for (ctx, frames) in contexts.iter_mut().zip(buckets.iter()) {
                let (animation, surface, conversion) = ctx;
                let dir = output_dir.as_path();
                let progress = &progress;
                scope.spawn(move || {
                    run_worker(
                        animation,
                        surface,
                        conversion,
                        frames,
                        formats,
                        &Delivery::Files { dir, prefix: "frame_" },
                        progress,
                    );
                });
            }
        });
    }

    Ok(RunSummary {
        rendered: progress.completed(),
        failed: progress.failed(),
    })
}

fn load_overrides(cli: &Cli) -> anyhow::Result<OverrideDocument> {
    let Some(path) = &cli.layer_overrides else {
        return Ok(OverrideDocument::default());
    };
    match std::fs::read_to_string(path) {
        Ok(raw) => Ok(parse_override_document(&raw)),
        Err(e) => {
            log::error!("cannot read layer-overrides file {:?}: {}", path, e);
            Ok(OverrideDocument::default())
        }
    }
}
