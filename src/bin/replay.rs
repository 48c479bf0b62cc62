use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::PathBuf;

use platetrack::pipeline::write_associations;
use platetrack::{
    EventSink, Frame, JsonFrameExporter, JsonLinesSink, MemoryRegistry, MemorySink, PipelineConfig,
    Run,
};

/// Replays recorded detections through the tracker and checks plates
/// against a vehicle registry.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Opts {
    /// JSON lines file, one frame per line
    #[arg(short, long)]
    frames: PathBuf,

    /// Registry records: a JSON array, or a CSV export when the file ends in `.csv`
    #[arg(short, long)]
    registry: PathBuf,

    /// Where to append correlation events (JSON lines)
    #[arg(short, long)]
    events: Option<PathBuf>,

    /// Where to write the per-frame plate association log (JSON lines)
    #[arg(short, long)]
    associations: Option<PathBuf>,

    /// Directory receiving the frame of every correlated vehicle
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Pipeline config (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    fps: Option<f64>,

    #[arg(long)]
    video_source: Option<String>,

    /// Print an alert for every correlated vehicle
    #[arg(long)]
    show_alerts: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = Opts::parse();

    let mut config = match &opts.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(fps) = opts.fps {
        config.fps = fps;
    }

    config.video_source = opts
        .video_source
        .clone()
        .unwrap_or_else(|| opts.frames.display().to_string());

    let is_csv = opts
        .registry
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"));

    let registry = if is_csv {
        MemoryRegistry::from_csv_file(&opts.registry)
    } else {
        MemoryRegistry::from_file(&opts.registry)
    }
    .with_context(|| format!("loading registry {}", opts.registry.display()))?;
    log::info!("registry: {} vehicles", registry.len());

    let mut sink: Box<dyn EventSink> = match &opts.events {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening {}", path.display()))?;

            Box::new(JsonLinesSink::new(BufWriter::new(file)))
        }
        None => Box::new(MemorySink::default()),
    };

    let mut run = Run::new(&config, &registry, sink.as_mut())?;
    if let Some(dir) = &opts.export_dir {
        let exporter = JsonFrameExporter::new(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
        run = run.with_exporter(exporter);
    }

    let frames = File::open(&opts.frames)
        .with_context(|| format!("opening {}", opts.frames.display()))?;

    let mut failures = 0;
    let mut rejected = 0;
    for (line_no, line) in BufReader::new(frames).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let frame: Frame = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: wrong frame format", opts.frames.display(), line_no + 1))?;

        let report = run.process_frame(&frame);
        failures += report.failures.len();
        rejected += report.rejected;

        if opts.show_alerts {
            for (_, event) in &report.events {
                println!("REGISTERED VEHICLE DETECTED");
                println!(
                    "Frame #{}, Vehicle #{}, Timecode: {}",
                    event.frame_index, event.track_id, event.timecode
                );
                println!(
                    "License: {} (Confidence: {:.2})",
                    event.plate_text, event.confidence
                );
                println!("Vehicle Info: {}", event.vehicle.summary());
                if let Some(path) = &event.image_path {
                    println!("Frame saved: {}", path.display());
                }
                println!(
                    "Description: {}",
                    event.vehicle.description.as_deref().unwrap_or("N/A")
                );
                println!("{}", "-".repeat(50));
            }
        }
    }

    let summary = run.finish();

    if let Some(path) = &opts.associations {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        write_associations(BufWriter::new(file), &summary.log)?;
    }

    println!("Processed {} frames of {}", summary.frames, config.video_source);

    for (track_id, text) in &summary.canonical {
        println!("  track #{}: {}", track_id, text);
    }

    if summary.events > 0 {
        println!("Detected {} registered vehicles", summary.events);
    } else {
        println!("No registered vehicles detected");
    }

    if rejected > 0 {
        log::warn!("{} malformed detections dropped", rejected);
    }

    if failures > 0 {
        log::warn!("{} registry, export or persistence failures during the run", failures);
    }

    Ok(())
}
