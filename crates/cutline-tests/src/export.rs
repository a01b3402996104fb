//! Integration tests for the export compiler and job lifecycle.

use crossbeam_channel::{unbounded, Receiver};
use cutline_export::{
    compile, Encoder, EncoderHandle, ExitReport, ExportEvent, ExportJob, ExportSettings,
    ProgressParser, Quality, Stage,
};
use cutline_timeline::{Clip, InMemoryRegistry, MediaRegistry, MediaSource, Timeline, Track};
use parking_lot::Mutex;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::time::Duration;
use uuid::Uuid;

// ── Helpers ────────────────────────────────────────────────────

fn settings() -> ExportSettings {
    ExportSettings::new("/tmp/cutline-tests", "render").unwrap()
}

/// Three 5-second clips, added to the model in shuffled order.
fn shuffled_timeline() -> (Timeline, InMemoryRegistry, Vec<Uuid>) {
    let mut timeline = Timeline::new();
    let track = timeline.add_track(Track::new_video("V1"));
    let mut registry = InMemoryRegistry::new();

    let mut by_position = vec![Uuid::nil(); 3];
    for (position, start) in [(1usize, 5.0), (2, 10.0), (0, 0.0)] {
        let media_id = registry.insert(MediaSource::new(format!("clip{position}.mp4"), 5.0));
        let source = registry.resolve(media_id).unwrap().clone();
        let clip = Clip::from_source(&source, track, start);
        by_position[position] = timeline.add_clip(clip, &registry).unwrap();
    }
    (timeline, registry, by_position)
}

// ── Compiler output shape ──────────────────────────────────────

#[test]
fn concat_order_ignores_insertion_order() {
    let (timeline, registry, by_position) = shuffled_timeline();
    let plan = compile(&timeline, &registry, &settings()).unwrap();

    assert_eq!(plan.clip_order, by_position);
    assert_eq!(
        plan.inputs,
        vec![
            "clip0.mp4".to_string(),
            "clip1.mp4".into(),
            "clip2.mp4".into()
        ]
    );
}

#[test]
fn quality_tiers_map_to_compression_levels() {
    let (timeline, registry, _) = shuffled_timeline();
    for (quality, crf) in [
        (Quality::Low, 28),
        (Quality::Medium, 23),
        (Quality::High, 18),
        (Quality::Ultra, 15),
    ] {
        let mut s = settings();
        s.quality = quality;
        let plan = compile(&timeline, &registry, &s).unwrap();
        let encode_crf = plan.stages.iter().find_map(|stage| match stage {
            Stage::Encode { crf, .. } => Some(*crf),
            _ => None,
        });
        assert_eq!(encode_crf, Some(crf));
    }
}

#[test]
fn pipeline_stages_follow_trim_concat_scale_encode_order() {
    let (timeline, registry, _) = shuffled_timeline();
    let plan = compile(&timeline, &registry, &settings()).unwrap();

    let index_of = |pred: fn(&Stage) -> bool| plan.stages.iter().position(pred).unwrap();
    let last_trim = plan
        .stages
        .iter()
        .rposition(|s| matches!(s, Stage::TrimVideo { .. }))
        .unwrap();
    let concat = index_of(|s| matches!(s, Stage::ConcatVideo { .. }));
    let scale = index_of(|s| matches!(s, Stage::Scale { .. }));
    let encode = index_of(|s| matches!(s, Stage::Encode { .. }));
    let progress = index_of(|s| matches!(s, Stage::ReportProgress));

    assert!(last_trim < concat);
    assert!(concat < scale);
    assert!(scale < encode);
    assert!(encode < progress);
}

#[test]
fn missing_source_fails_compile() {
    let (timeline, _, _) = shuffled_timeline();
    let empty = InMemoryRegistry::new();
    assert!(compile(&timeline, &empty, &settings()).is_err());
}

// ── Progress stream against the job ────────────────────────────

struct ScriptedHandle {
    reader: Option<Box<dyn BufRead + Send>>,
    report: ExitReport,
}

impl EncoderHandle for ScriptedHandle {
    fn take_progress_reader(&mut self) -> Option<Box<dyn BufRead + Send>> {
        self.reader.take()
    }
    fn kill(&mut self) {}
    fn wait(&mut self) -> ExitReport {
        self.report.clone()
    }
}

struct ScriptedEncoder {
    script: String,
    report: ExitReport,
}

impl Encoder for ScriptedEncoder {
    fn spawn(&self, _args: &[String]) -> cutline_core::Result<Box<dyn EncoderHandle>> {
        Ok(Box::new(ScriptedHandle {
            reader: Some(Box::new(Cursor::new(self.script.clone().into_bytes()))),
            report: self.report.clone(),
        }))
    }
}

/// Blocks between lines until the test feeds more.
struct ChannelReader {
    rx: Receiver<String>,
    pending: Vec<u8>,
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.pending.is_empty() {
            match self.rx.recv() {
                Ok(chunk) => self.pending = chunk.into_bytes(),
                Err(_) => return Ok(0),
            }
        }
        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

struct ChannelEncoder {
    rx: Mutex<Option<Receiver<String>>>,
}

impl Encoder for ChannelEncoder {
    fn spawn(&self, _args: &[String]) -> cutline_core::Result<Box<dyn EncoderHandle>> {
        let rx = self.rx.lock().take().expect("single spawn");
        Ok(Box::new(ScriptedHandle {
            reader: Some(Box::new(BufReader::new(ChannelReader {
                rx,
                pending: Vec::new(),
            }))),
            report: ExitReport {
                success: true,
                code: Some(0),
                stderr: String::new(),
            },
        }))
    }
}

#[test]
fn progress_flows_from_stream_to_job_events() {
    let (timeline, registry, _) = shuffled_timeline();
    let plan = compile(&timeline, &registry, &settings()).unwrap();
    // 15 s of output
    assert!((plan.total_duration - 15.0).abs() < 1e-9);

    let encoder = ScriptedEncoder {
        script: "frame=90\nout_time=00:00:03.00\nspeed=3x\nprogress=continue\n\
                 frame=450\nout_time=00:00:15.00\nspeed=3x\nprogress=end\n"
            .into(),
        report: ExitReport {
            success: true,
            code: Some(0),
            stderr: String::new(),
        },
    };
    let job = ExportJob::spawn(&plan, &encoder).unwrap();
    let events: Vec<ExportEvent> = job.events().iter().collect();

    let progress: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ExportEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert_eq!(progress.len(), 2);
    assert!((progress[0].fraction - 0.2).abs() < 1e-9);
    // 12 s of output left at 3x -> 4 s of wall time
    assert!((progress[0].eta - 4.0).abs() < 1e-6);
    assert!((progress[1].fraction - 1.0).abs() < 1e-9);
    assert!(matches!(events.last(), Some(ExportEvent::Completed { .. })));
}

#[test]
fn cancel_mid_export_stops_progress_and_resets_running() {
    let (timeline, registry, _) = shuffled_timeline();
    let plan = compile(&timeline, &registry, &settings()).unwrap();

    let (lines_tx, lines_rx) = unbounded();
    let encoder = ChannelEncoder {
        rx: Mutex::new(Some(lines_rx)),
    };
    let job = ExportJob::spawn(&plan, &encoder).unwrap();
    let events = job.events();

    lines_tx
        .send("frame=30\nout_time=00:00:01.00\nprogress=continue\n".to_string())
        .unwrap();
    assert_eq!(events.recv().unwrap(), ExportEvent::Started);
    assert!(matches!(events.recv().unwrap(), ExportEvent::Progress(_)));
    assert!(job.is_running());

    job.cancel();
    assert!(!job.is_running());
    assert_eq!(events.recv().unwrap(), ExportEvent::Cancelled);

    // Late stream data cannot fire events on the closed line
    lines_tx
        .send("frame=60\nout_time=00:00:02.00\nprogress=continue\n".to_string())
        .unwrap();
    assert!(events.recv_timeout(Duration::from_millis(200)).is_err());

    // A second cancel stays a no-op
    job.cancel();
    assert!(!job.is_running());
}

// ── Parser + compiler agreement ────────────────────────────────

#[test]
fn parser_eta_uses_plan_duration() {
    let (timeline, registry, _) = shuffled_timeline();
    let plan = compile(&timeline, &registry, &settings()).unwrap();

    let mut parser = ProgressParser::new(plan.total_duration);
    let updates = parser.feed("frame=150\nout_time=00:00:05.00\nspeed=1x\nprogress=continue\n");
    assert_eq!(updates.len(), 1);
    assert!((updates[0].estimated_total - plan.total_duration).abs() < 1e-6);
    assert!((updates[0].eta - 10.0).abs() < 1e-6);
}
