//! Playback controller: a state machine driving a [`PlaybackSurface`]
//! from the timeline.
//!
//! Everything here is single-threaded and event-driven. The host loop
//! feeds surface events in; the controller issues surface commands and
//! queues typed [`PlaybackEvent`]s for the host to drain. While
//! playing, the surface's own time reports are authoritative — the
//! controller never advances time from a wall clock.

use cutline_timeline::{MediaRegistry, Timeline};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::mapper::{find_active_clip, next_clip_after};
use crate::surface::{PlaybackSurface, SurfaceEvent};

/// Re-seeking the surface is skipped when it is already within this
/// distance of the target, so scrubbing does not thrash the decoder.
pub const SEEK_EPSILON: f64 = 0.05;

/// Tolerance when comparing a reported source time to a clip boundary.
const BOUNDARY_EPSILON: f64 = 1e-9;

/// Coarse playback mode. `Ended` is terminal until a new seek or play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackMode {
    #[default]
    Idle,
    Playing,
    Paused,
    Ended,
}

/// Snapshot of the controller's observable state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub global_time: f64,
    pub is_playing: bool,
    /// A seek or clip transition is in flight and awaiting the
    /// surface's confirmation.
    pub is_seeking: bool,
    pub active_clip_id: Option<Uuid>,
}

/// Events queued for the host; drained with
/// [`PlaybackController::poll_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// Published global time changed.
    TimeChanged(f64),
    /// The active clip changed (`None` = entered a gap or stopped).
    ClipChanged(Option<Uuid>),
    /// The playhead landed in a gap; playback auto-pauses there.
    EnteredGap(f64),
    /// The last clip finished.
    PlaybackEnded,
    /// The surface reported a failure; playback paused.
    SurfaceError(String),
}

/// Drives one playback surface from one timeline.
pub struct PlaybackController<S: PlaybackSurface> {
    surface: S,
    mode: PlaybackMode,
    global_time: f64,
    active_clip: Option<Uuid>,
    /// Source-relative target of an in-flight seek or transition.
    /// Time reports away from this target are stale and ignored.
    pending_seek: Option<f64>,
    /// Reentrancy guard: boundary handling runs once even when several
    /// time updates arrive around the boundary.
    is_transitioning: bool,
    events: Vec<PlaybackEvent>,
}

impl<S: PlaybackSurface> PlaybackController<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            mode: PlaybackMode::Idle,
            global_time: 0.0,
            active_clip: None,
            pending_seek: None,
            is_transitioning: false,
            events: Vec::new(),
        }
    }

    /// Current playback mode.
    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    /// Observable state snapshot.
    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            global_time: self.global_time,
            is_playing: self.mode == PlaybackMode::Playing,
            is_seeking: self.pending_seek.is_some(),
            active_clip_id: self.active_clip,
        }
    }

    /// Drain the queued events.
    pub fn poll_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.events)
    }

    /// Access the driven surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    // ── Transport ───────────────────────────────────────────────

    /// Start or resume playback at the current global time.
    ///
    /// A finished session restarts from the head. Starting inside a
    /// gap begins at the next clip.
    pub fn play(&mut self, timeline: &Timeline, registry: &dyn MediaRegistry) {
        if self.mode == PlaybackMode::Playing {
            return;
        }
        if self.mode == PlaybackMode::Ended {
            self.force_global_time(0.0);
        }

        match find_active_clip(timeline, self.global_time) {
            Some(active) => {
                self.bind(timeline, registry, active.clip_id, active.source_time);
                self.surface.play();
                self.mode = PlaybackMode::Playing;
                debug!(time = self.global_time, "Playback started");
            }
            None => match next_clip_after(timeline, self.global_time) {
                Some(next) => {
                    let (next_id, next_start, trim_start) = (next.id, next.start, next.trim_start);
                    self.force_global_time(next_start);
                    self.bind(timeline, registry, next_id, trim_start);
                    self.surface.play();
                    self.mode = PlaybackMode::Playing;
                    debug!(time = next_start, "Playback started past gap");
                }
                None => {
                    self.mode = PlaybackMode::Ended;
                    self.events.push(PlaybackEvent::PlaybackEnded);
                }
            },
        }
    }

    /// Pause playback, keeping the current position.
    pub fn pause(&mut self) {
        if self.mode == PlaybackMode::Playing {
            self.surface.pause();
            self.mode = PlaybackMode::Paused;
            debug!(time = self.global_time, "Playback paused");
        }
    }

    /// Seek/scrub to a global time. The global time is authoritative:
    /// the controller maps it to (clip, source time) and re-seeks the
    /// surface only when it is meaningfully off target. Landing in a
    /// gap auto-pauses and keeps the scrubbed time.
    pub fn seek(&mut self, t: f64, timeline: &Timeline, registry: &dyn MediaRegistry) {
        let t = t.clamp(0.0, timeline.total_duration());
        self.force_global_time(t);
        self.is_transitioning = false;
        if matches!(self.mode, PlaybackMode::Idle | PlaybackMode::Ended) {
            self.mode = PlaybackMode::Paused;
        }

        match find_active_clip(timeline, t) {
            Some(active) => {
                self.bind(timeline, registry, active.clip_id, active.source_time);
                if self.mode == PlaybackMode::Playing {
                    self.surface.play();
                }
            }
            None => {
                self.surface.pause();
                if self.mode == PlaybackMode::Playing {
                    self.mode = PlaybackMode::Paused;
                }
                if self.active_clip.take().is_some() {
                    self.events.push(PlaybackEvent::ClipChanged(None));
                }
                self.pending_seek = None;
                debug!(time = t, "Seeked into gap, pausing");
                self.events.push(PlaybackEvent::EnteredGap(t));
            }
        }
    }

    // ── Surface events ──────────────────────────────────────────

    /// Feed one surface event into the state machine.
    pub fn handle_event(
        &mut self,
        event: SurfaceEvent,
        timeline: &Timeline,
        registry: &dyn MediaRegistry,
    ) {
        match event {
            SurfaceEvent::LoadedMetadata => {
                debug!("Surface metadata loaded");
            }
            SurfaceEvent::TimeUpdate(source_time) => {
                self.on_time_update(source_time, timeline, registry);
            }
            SurfaceEvent::Ended => {
                if self.mode == PlaybackMode::Playing && !self.is_transitioning {
                    self.advance(timeline, registry);
                }
            }
            SurfaceEvent::Error(reason) => {
                warn!(%reason, "Surface error, pausing");
                self.surface.pause();
                if self.mode == PlaybackMode::Playing {
                    self.mode = PlaybackMode::Paused;
                }
                self.pending_seek = None;
                self.is_transitioning = false;
                self.events.push(PlaybackEvent::SurfaceError(reason));
            }
        }
    }

    fn on_time_update(
        &mut self,
        source_time: f64,
        timeline: &Timeline,
        registry: &dyn MediaRegistry,
    ) {
        // An in-flight seek/transition: reports away from the target
        // are stale echoes of the old position and must not advance
        // the playhead.
        if let Some(target) = self.pending_seek {
            if (source_time - target).abs() > SEEK_EPSILON {
                return;
            }
            self.pending_seek = None;
            self.is_transitioning = false;
        }
        if self.mode != PlaybackMode::Playing || self.is_transitioning {
            return;
        }
        let Some(clip_id) = self.active_clip else {
            return;
        };
        let Some(clip) = timeline.clip(clip_id) else {
            // The active clip was edited away mid-session.
            self.surface.pause();
            self.mode = PlaybackMode::Paused;
            self.active_clip = None;
            self.events.push(PlaybackEvent::ClipChanged(None));
            return;
        };

        if source_time >= clip.trim_end - BOUNDARY_EPSILON {
            self.advance(timeline, registry);
            return;
        }

        let global = clip.global_time_at(source_time);
        self.publish_time(global);
    }

    /// Move past the current clip's end: next clip (skipping any gap)
    /// or end of timeline.
    fn advance(&mut self, timeline: &Timeline, registry: &dyn MediaRegistry) {
        let Some(current) = self.active_clip.and_then(|id| timeline.clip(id)) else {
            return;
        };
        let (current_start, current_end) = (current.start, current.end());

        self.is_transitioning = true;
        match next_clip_after(timeline, current_start) {
            Some(next) => {
                let (next_id, next_start, trim_start) = (next.id, next.start, next.trim_start);
                debug!(from = %current_start, to = %next_start, "Clip transition");
                self.publish_time(next_start);
                self.bind(timeline, registry, next_id, trim_start);
                self.surface.play();
                // is_transitioning stays set until the surface confirms
                // the new position; stale boundary reports are dropped
                // by the pending-seek filter meanwhile.
            }
            None => {
                self.surface.pause();
                self.mode = PlaybackMode::Ended;
                self.publish_time(current_end);
                self.is_transitioning = false;
                debug!(time = current_end, "Playback ended");
                self.events.push(PlaybackEvent::PlaybackEnded);
            }
        }
    }

    // ── Internals ───────────────────────────────────────────────

    /// Bind a clip to the surface: load its source when the clip
    /// changed, then seek to the target source time unless the surface
    /// is already close enough.
    fn bind(
        &mut self,
        timeline: &Timeline,
        registry: &dyn MediaRegistry,
        clip_id: Uuid,
        source_time: f64,
    ) {
        let Some(clip) = timeline.clip(clip_id) else {
            return;
        };
        let changed = self.active_clip != Some(clip_id);
        if changed {
            let Some(source) = registry.resolve(clip.media_id) else {
                warn!(media = %clip.media_id, "Media source missing, cannot bind clip");
                self.events.push(PlaybackEvent::SurfaceError(format!(
                    "media source {} not registered",
                    clip.media_id
                )));
                return;
            };
            self.surface.load(&source.path);
            self.active_clip = Some(clip_id);
            self.events.push(PlaybackEvent::ClipChanged(Some(clip_id)));
        }

        // A freshly loaded file is at an indeterminate position, so a
        // clip change always seeks.
        if changed || (self.surface.current_time() - source_time).abs() > SEEK_EPSILON {
            self.surface.seek(source_time);
            self.pending_seek = Some(source_time);
        }
    }

    /// Publish a new global time. Within a session the published value
    /// never decreases (decoder jitter is dropped); explicit seeks go
    /// through [`Self::force_global_time`] instead.
    fn publish_time(&mut self, t: f64) {
        if t < self.global_time - BOUNDARY_EPSILON {
            return;
        }
        self.global_time = t;
        self.events.push(PlaybackEvent::TimeChanged(t));
    }

    fn force_global_time(&mut self, t: f64) {
        self.global_time = t;
        self.events.push(PlaybackEvent::TimeChanged(t));
    }
}
