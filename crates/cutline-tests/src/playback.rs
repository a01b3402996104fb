//! Integration tests for time mapping and playback control.
//!
//! Drives the full stack — model, mapper, controller — against a
//! recorded surface double, with no real decoder anywhere.

use cutline_playback::{
    find_active_clip, PlaybackController, PlaybackEvent, PlaybackMode, PlaybackSurface,
    SurfaceEvent,
};
use cutline_timeline::{Clip, ClipPatch, InMemoryRegistry, MediaRegistry, MediaSource, Timeline, Track};
use uuid::Uuid;

// ── Helpers ────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct RecordingSurface {
    loads: Vec<String>,
    time: f64,
    playing: bool,
}

impl PlaybackSurface for RecordingSurface {
    fn load(&mut self, path: &str) {
        self.loads.push(path.to_string());
        self.time = 0.0;
    }
    fn play(&mut self) {
        self.playing = true;
    }
    fn pause(&mut self) {
        self.playing = false;
    }
    fn seek(&mut self, time: f64) {
        self.time = time;
    }
    fn current_time(&self) -> f64 {
        self.time
    }
}

/// Two adjacent clips from different sources:
/// A {start 0, duration 10, trim 0..10}, B {start 10, duration 5,
/// trim 2..7}.
fn two_clip_layout() -> (Timeline, InMemoryRegistry, Uuid, Uuid) {
    let mut timeline = Timeline::new();
    let track = timeline.add_track(Track::new_video("V1"));
    let mut registry = InMemoryRegistry::new();
    let a_media = registry.insert(MediaSource::new("a.mp4", 10.0));
    let b_media = registry.insert(MediaSource::new("b.mp4", 10.0));

    let a_source = registry.resolve(a_media).unwrap().clone();
    let a_id = timeline
        .add_clip(Clip::from_source(&a_source, track, 0.0), &registry)
        .unwrap();

    let b_source = registry.resolve(b_media).unwrap().clone();
    let mut b = Clip::from_source(&b_source, track, 10.0);
    b.duration = 5.0;
    let b_id = timeline.add_clip(b, &registry).unwrap();
    timeline
        .update_clip(b_id, &ClipPatch::trim(2.0, 7.0), &registry)
        .unwrap();

    (timeline, registry, a_id, b_id)
}

// ── Mapping scenarios ──────────────────────────────────────────

#[test]
fn playhead_at_12_maps_to_clip_b_source_4() {
    let (timeline, _, _, b_id) = two_clip_layout();
    let active = find_active_clip(&timeline, 12.0).unwrap();
    assert_eq!(active.clip_id, b_id);
    assert!((active.source_time - 4.0).abs() < 1e-9);
}

#[test]
fn active_clip_is_unique_latest_start() {
    let (timeline, _, a_id, b_id) = two_clip_layout();
    // Inside A
    assert_eq!(find_active_clip(&timeline, 5.0).unwrap().clip_id, a_id);
    // Shared edge: the later-starting clip wins the tie-break
    assert_eq!(find_active_clip(&timeline, 10.0).unwrap().clip_id, b_id);
    // Past B's placement end
    assert!(find_active_clip(&timeline, 15.5).is_none());
}

#[test]
fn clip_relative_roundtrip_is_exact() {
    let (timeline, _, _, b_id) = two_clip_layout();
    let clip = timeline.clip(b_id).unwrap();
    for x in [2.0, 2.5, 4.75, 6.999, 7.0] {
        let timeline_time = clip.global_time_at(x);
        let back = clip.source_time_at(timeline_time);
        assert!((back - x).abs() < f64::EPSILON * 8.0);
    }
}

// ── Controller sessions over the full stack ────────────────────

#[test]
fn full_session_plays_through_both_clips() {
    let (timeline, registry, a_id, b_id) = two_clip_layout();
    let mut ctl = PlaybackController::new(RecordingSurface::default());

    ctl.play(&timeline, &registry);
    assert_eq!(ctl.state().active_clip_id, Some(a_id));
    ctl.handle_event(SurfaceEvent::TimeUpdate(0.0), &timeline, &registry);

    // Through A
    for t in [2.0, 5.0, 9.5] {
        ctl.handle_event(SurfaceEvent::TimeUpdate(t), &timeline, &registry);
        assert_eq!(ctl.state().global_time, t);
    }

    // Boundary: transition into B at its trim-in point
    ctl.handle_event(SurfaceEvent::TimeUpdate(10.0), &timeline, &registry);
    assert_eq!(ctl.state().active_clip_id, Some(b_id));
    assert_eq!(ctl.state().global_time, 10.0);
    assert_eq!(
        ctl.surface().loads,
        vec!["a.mp4".to_string(), "b.mp4".into()]
    );

    // Through B (source 2..7 maps to timeline 10..15)
    ctl.handle_event(SurfaceEvent::TimeUpdate(2.0), &timeline, &registry);
    ctl.handle_event(SurfaceEvent::TimeUpdate(5.0), &timeline, &registry);
    assert_eq!(ctl.state().global_time, 13.0);

    // B's trim end: the timeline is over
    ctl.handle_event(SurfaceEvent::TimeUpdate(7.0), &timeline, &registry);
    assert_eq!(ctl.mode(), PlaybackMode::Ended);
    assert_eq!(ctl.state().global_time, 15.0);
    assert!(ctl
        .poll_events()
        .contains(&PlaybackEvent::PlaybackEnded));
}

#[test]
fn published_times_never_decrease_during_session() {
    let (timeline, registry, _, _) = two_clip_layout();
    let mut ctl = PlaybackController::new(RecordingSurface::default());
    ctl.play(&timeline, &registry);

    let feed = [0.0, 1.0, 0.9, 3.0, 9.9, 10.0, 2.0, 4.0, 7.0];
    for t in feed {
        ctl.handle_event(SurfaceEvent::TimeUpdate(t), &timeline, &registry);
    }

    let times: Vec<f64> = ctl
        .poll_events()
        .into_iter()
        .filter_map(|e| match e {
            PlaybackEvent::TimeChanged(t) => Some(t),
            _ => None,
        })
        .collect();
    for pair in times.windows(2) {
        assert!(
            pair[1] >= pair[0],
            "time went backwards: {:?} -> {:?}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn scrubbing_into_gap_auto_pauses() {
    let mut timeline = Timeline::new();
    let track = timeline.add_track(Track::new_video("V1"));
    let mut registry = InMemoryRegistry::new();
    let media_id = registry.insert(MediaSource::new("g.mp4", 4.0));
    let source = registry.resolve(media_id).unwrap().clone();
    timeline
        .add_clip(Clip::from_source(&source, track, 0.0), &registry)
        .unwrap();
    timeline
        .add_clip(Clip::from_source(&source, track, 10.0), &registry)
        .unwrap();

    let mut ctl = PlaybackController::new(RecordingSurface::default());
    ctl.play(&timeline, &registry);
    ctl.handle_event(SurfaceEvent::TimeUpdate(0.0), &timeline, &registry);

    ctl.seek(7.0, &timeline, &registry);
    assert_eq!(ctl.mode(), PlaybackMode::Paused);
    assert_eq!(ctl.state().active_clip_id, None);
    assert_eq!(ctl.state().global_time, 7.0);
    assert!(!ctl.surface().playing);
    assert!(ctl.poll_events().contains(&PlaybackEvent::EnteredGap(7.0)));

    // Gap is a state, not an error: resuming play skips to the next clip
    ctl.play(&timeline, &registry);
    assert_eq!(ctl.mode(), PlaybackMode::Playing);
    assert_eq!(ctl.state().global_time, 10.0);
}

#[test]
fn editing_while_paused_then_resuming_remaps() {
    let (mut timeline, registry, a_id, b_id) = two_clip_layout();
    let mut ctl = PlaybackController::new(RecordingSurface::default());
    ctl.seek(12.0, &timeline, &registry);
    assert_eq!(ctl.state().active_clip_id, Some(b_id));

    // Remove B while paused; the playhead position now falls past A
    timeline.remove_clip(b_id).unwrap();
    ctl.seek(12.0, &timeline, &registry);
    assert_eq!(ctl.state().active_clip_id, None);

    // Back inside A everything still maps
    ctl.seek(3.0, &timeline, &registry);
    assert_eq!(ctl.state().active_clip_id, Some(a_id));
}
