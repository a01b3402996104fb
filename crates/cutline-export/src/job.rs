//! A running export: one encoder process, one reader thread, one typed
//! event stream.
//!
//! The job is an explicit object the caller owns — there is no hidden
//! singleton, and several jobs can exist if the caller's policy allows
//! it. All event delivery goes through a single sender slot guarded by
//! a mutex; cancellation takes the sender out of the slot *before*
//! killing the process, so no event can fire on a cancelled line.

use crossbeam_channel::{unbounded, Receiver, Sender};
use cutline_core::{CutlineError, Result};
use parking_lot::Mutex;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::encoder::{Encoder, EncoderHandle};
use crate::plan::ExportPlan;
use crate::progress::{ExportProgress, ProgressParser};

/// Events delivered on a job's channel, in order. `Completed`,
/// `Failed`, and `Cancelled` are terminal; nothing follows them.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEvent {
    Started,
    Progress(ExportProgress),
    Completed { output: PathBuf },
    Failed { code: Option<i32>, stderr: String },
    Cancelled,
}

struct Shared {
    /// The single subscription. `None` = unsubscribed (finished or
    /// cancelled); taking it under the lock is what makes teardown
    /// atomic with respect to in-flight sends.
    events_tx: Mutex<Option<Sender<ExportEvent>>>,
    handle: Mutex<Option<Box<dyn EncoderHandle>>>,
    cancelled: AtomicBool,
    running: AtomicBool,
}

impl Shared {
    /// Deliver an event; false when listeners are unsubscribed.
    fn send(&self, event: ExportEvent) -> bool {
        match self.events_tx.lock().as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }
}

/// A caller-owned export run.
pub struct ExportJob {
    id: Uuid,
    output: PathBuf,
    events: Receiver<ExportEvent>,
    shared: Arc<Shared>,
}

impl ExportJob {
    /// Render the plan to arguments, spawn the encoder, and start the
    /// progress reader thread. `Started` is already queued when this
    /// returns.
    pub fn spawn(plan: &ExportPlan, encoder: &dyn Encoder) -> Result<Self> {
        let args = plan.to_ffmpeg_args();
        let mut handle = encoder.spawn(&args)?;
        let reader = handle.take_progress_reader().ok_or_else(|| {
            CutlineError::Encoder("encoder progress stream unavailable".into())
        })?;

        let (tx, rx) = unbounded();
        let shared = Arc::new(Shared {
            events_tx: Mutex::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
            cancelled: AtomicBool::new(false),
            running: AtomicBool::new(true),
        });
        shared.send(ExportEvent::Started);

        let output = plan.output_path();
        let worker = Arc::clone(&shared);
        let worker_output = output.clone();
        let total_duration = plan.total_duration;
        let spawned = std::thread::Builder::new()
            .name("cutline-export-progress".into())
            .spawn(move || run_reader(worker, reader, total_duration, worker_output));
        if let Err(e) = spawned {
            if let Some(mut handle) = shared.handle.lock().take() {
                handle.kill();
            }
            return Err(CutlineError::Encoder(format!(
                "failed to start progress reader: {e}"
            )));
        }

        let id = Uuid::new_v4();
        debug!(job = %id, output = %output.display(), "Export started");
        Ok(Self {
            id,
            output,
            events: rx,
            shared,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Output path the encoder writes to.
    pub fn output(&self) -> &PathBuf {
        &self.output
    }

    /// The job's event stream.
    pub fn events(&self) -> Receiver<ExportEvent> {
        self.events.clone()
    }

    /// Whether the encoder is still running.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Cancel the export. Idempotent: cancelling twice, or cancelling
    /// an already-finished job, is a no-op. Listeners are unsubscribed
    /// before the process is killed, and the job can be replaced by a
    /// fresh one immediately.
    pub fn cancel(&self) {
        let Some(tx) = self.shared.events_tx.lock().take() else {
            return;
        };
        self.shared.cancelled.store(true, Ordering::SeqCst);
        let _ = tx.send(ExportEvent::Cancelled);
        drop(tx);

        if let Some(mut handle) = self.shared.handle.lock().take() {
            handle.kill();
        }
        self.shared.running.store(false, Ordering::SeqCst);
        debug!(job = %self.id, "Export cancelled");
    }
}

/// Reader-thread body: pump progress chunks into the parser, then
/// collect the exit report at end of stream.
fn run_reader(
    shared: Arc<Shared>,
    mut reader: Box<dyn BufRead + Send>,
    total_duration: f64,
    output: PathBuf,
) {
    let mut parser = ProgressParser::new(total_duration);
    let mut line = String::new();
    loop {
        if shared.cancelled.load(Ordering::SeqCst) {
            return; // cancel() owns teardown
        }
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                for update in parser.feed(&line) {
                    if !shared.send(ExportEvent::Progress(update)) {
                        return;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Progress stream read failed");
                break;
            }
        }
    }

    // Natural end of stream: the process decides success or failure.
    let Some(mut handle) = shared.handle.lock().take() else {
        return; // cancelled while we were reading
    };
    let report = handle.wait();
    shared.running.store(false, Ordering::SeqCst);
    if report.success {
        shared.send(ExportEvent::Completed { output });
    } else {
        shared.send(ExportEvent::Failed {
            code: report.code,
            stderr: report.stderr,
        });
    }
    *shared.events_tx.lock() = None;
}
