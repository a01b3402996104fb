//! Integration tests for the timeline model.
//!
//! Exercises cross-crate interactions between cutline-core and
//! cutline-timeline, including the invariants the rest of the system
//! leans on.

use cutline_timeline::{
    snap_position, snap_to_grid, Clip, ClipPatch, InMemoryRegistry, MediaRegistry, MediaSource,
    Timeline, Track,
};
use uuid::Uuid;

// ── Helpers ────────────────────────────────────────────────────

fn registry_with(duration: f64) -> (InMemoryRegistry, Uuid) {
    let mut registry = InMemoryRegistry::new();
    let media_id = registry.insert(MediaSource::new("media/test.mp4", duration));
    (registry, media_id)
}

fn source_of(registry: &InMemoryRegistry, id: Uuid) -> MediaSource {
    registry.resolve(id).unwrap().clone()
}

fn build_timeline() -> (Timeline, InMemoryRegistry, Uuid, Uuid) {
    let mut timeline = Timeline::new();
    let video = timeline.add_track(Track::new_video("V1"));
    let audio = timeline.add_track(Track::new_audio("A1"));
    let (registry, media_id) = registry_with(30.0);

    let source = source_of(&registry, media_id);
    for start in [0.0, 30.0, 60.0] {
        let mut clip = Clip::from_source(&source, video, start);
        clip.duration = 30.0;
        timeline.add_clip(clip, &registry).unwrap();
    }
    let music = Clip::from_source(&source, audio, 0.0);
    timeline.add_clip(music, &registry).unwrap();

    (timeline, registry, video, media_id)
}

// ── Model invariants under edit storms ─────────────────────────

#[test]
fn trim_invariants_hold_after_any_update() {
    let (mut timeline, registry, _, media_id) = build_timeline();
    let ids: Vec<Uuid> = timeline
        .clips_sorted_by_start()
        .iter()
        .map(|c| c.id)
        .collect();

    // A mix of valid, clamped, and invalid patches
    let patches = [
        ClipPatch::trim(5.0, 25.0),
        ClipPatch::trim(-3.0, 99.0),
        ClipPatch::trim(20.0, 4.0),
        ClipPatch {
            volume: Some(7.5),
            ..Default::default()
        },
        ClipPatch {
            trim_start: Some(29.5),
            ..Default::default()
        },
    ];

    for id in &ids {
        for patch in &patches {
            let _ = timeline.update_clip(*id, patch, &registry);
            let clip = timeline.clip(*id).unwrap();
            let source = source_of(&registry, media_id);
            assert!(clip.trim_start >= 0.0);
            assert!(clip.trim_start < clip.trim_end);
            assert!(clip.trim_end <= source.duration);
            assert!((0.0..=1.0).contains(&clip.volume));
            assert!(clip.start >= 0.0);
        }
    }
}

#[test]
fn edges_are_strictly_ascending_without_duplicates() {
    let (timeline, _, _, _) = build_timeline();
    let edges = timeline.clip_edges();
    for pair in edges.windows(2) {
        assert!(pair[0] < pair[1], "edges not strictly ascending: {edges:?}");
    }
    // V1 clips at 0/30/60 + 30s audio clip share edges heavily
    assert_eq!(edges, vec![0.0, 30.0, 60.0, 90.0]);
}

#[test]
fn overlap_scenario_from_adjacent_tracks_is_allowed() {
    // Same span on different tracks is not an overlap
    let (timeline, _, _, _) = build_timeline();
    assert_eq!(timeline.clip_count(), 4);
}

#[test]
fn overlap_scenario_same_track_is_flagged() {
    let mut timeline = Timeline::new();
    let track = timeline.add_track(Track::new_video("V1"));
    let (registry, media_id) = registry_with(10.0);
    let source = source_of(&registry, media_id);

    timeline
        .add_clip(Clip::from_source(&source, track, 0.0), &registry)
        .unwrap();
    let err = timeline
        .add_clip(Clip::from_source(&source, track, 5.0), &registry)
        .unwrap_err();
    assert!(err.to_string().contains("5s-10s"));
}

// ── Snap engine against the model's edge list ──────────────────

#[test]
fn snapped_grid_values_are_exact_multiples() {
    for time in [0.1, 3.33, 17.9, 42.0] {
        let snap = snap_to_grid(time, 0.5);
        assert!(snap.snapped);
        let steps = snap.value / 0.5;
        assert!((steps - steps.round()).abs() < 1e-9);
    }
}

#[test]
fn drag_position_follows_grid_precedence() {
    let (timeline, _, _, _) = build_timeline();
    let edges = timeline.clip_edges();

    // Grid enabled: rounds to the 2 s grid despite the edge at 30.0
    let snap = snap_position(29.9, Some(2.0), &edges, 0.5);
    assert_eq!(snap.value, 30.0); // 30 happens to be a multiple of 2
    let snap = snap_position(28.7, Some(2.0), &edges, 0.5);
    assert_eq!(snap.value, 28.0);

    // Grid disabled: pulled onto the clip edge
    let snap = snap_position(29.9, None, &edges, 0.5);
    assert_eq!(snap.value, 30.0);
    assert!(snap.snapped);
}

// ── Serialization of the model surface ─────────────────────────

#[test]
fn timeline_roundtrips_through_json() {
    let (timeline, _, _, _) = build_timeline();
    let json = serde_json::to_string(&timeline).unwrap();
    let restored: Timeline = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.tracks.len(), timeline.tracks.len());
    assert_eq!(restored.clip_count(), timeline.clip_count());
    assert_eq!(restored.clip_edges(), timeline.clip_edges());
    assert_eq!(restored.total_duration(), timeline.total_duration());
}
