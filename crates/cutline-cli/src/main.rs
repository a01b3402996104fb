//! Cutline - headless timeline compositor driver
//!
//! Loads a timeline document, reports what the compositor derives from
//! it, and optionally compiles and runs an export against the system
//! FFmpeg.

use anyhow::{bail, Context, Result};
use cutline_core::{format_timecode, CutlineError};
use cutline_export::{compile, ExportEvent, ExportJob, ExportSettings, FfmpegEncoder};
use cutline_timeline::{InMemoryRegistry, MediaSource, Timeline};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Document the CLI accepts. Timeline persistence is a host concern;
/// this format exists only for this driver.
#[derive(Debug, Deserialize)]
struct TimelineDoc {
    sources: Vec<MediaSource>,
    timeline: Timeline,
    /// Optional export configuration; without it the run is dry.
    export: Option<ExportSettings>,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut args = std::env::args().skip(1);
    let Some(doc_path) = args.next().map(PathBuf::from) else {
        bail!("usage: cutline <timeline.json> [--run]");
    };
    let run_export = args.any(|a| a == "--run");

    let data = std::fs::read_to_string(&doc_path)
        .with_context(|| format!("reading {}", doc_path.display()))?;
    let doc: TimelineDoc =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", doc_path.display()))?;

    let mut registry = InMemoryRegistry::new();
    for source in doc.sources {
        registry.insert(source);
    }
    let timeline = doc.timeline;

    info!(
        sources = registry.len(),
        tracks = timeline.tracks.len(),
        clips = timeline.clip_count(),
        "Timeline loaded"
    );
    println!(
        "{} tracks, {} clips, content ends at {} (displayed as {:.0}s)",
        timeline.tracks.len(),
        timeline.clip_count(),
        format_timecode(timeline.content_duration()),
        timeline.total_duration()
    );

    let Some(settings) = doc.export else {
        info!("No export section in document; done");
        return Ok(());
    };

    let plan = compile(&timeline, &registry, &settings)?;
    println!(
        "Export plan: {} inputs, {} stages, {:.2}s / {} frames -> {}",
        plan.inputs.len(),
        plan.stages.len(),
        plan.total_duration,
        plan.total_frames,
        plan.output_path().display()
    );
    println!("ffmpeg {}", plan.to_ffmpeg_args().join(" "));

    if !run_export {
        return Ok(());
    }

    let encoder = FfmpegEncoder::locate()?;
    let job = ExportJob::spawn(&plan, &encoder)?;
    for event in job.events().iter() {
        match event {
            ExportEvent::Started => info!("Encoding started"),
            ExportEvent::Progress(p) => {
                eprint!(
                    "\r{:5.1}%  frame {}  {:.2}x  eta {:.0}s   ",
                    p.fraction * 100.0,
                    p.frame,
                    p.speed,
                    p.eta
                );
            }
            ExportEvent::Completed { output } => {
                eprintln!();
                println!("Export complete: {}", output.display());
            }
            ExportEvent::Failed { code, stderr } => {
                eprintln!();
                return Err(CutlineError::Subprocess { code, stderr }.into());
            }
            ExportEvent::Cancelled => {
                eprintln!();
                println!("Export cancelled");
            }
        }
    }

    Ok(())
}
