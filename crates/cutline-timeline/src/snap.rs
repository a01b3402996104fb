//! Snap engine for timeline interactions.
//!
//! Pure functions over the model's edge list. Grid snapping is
//! unconditional rounding; edge snapping is threshold-gated. When a grid
//! is enabled it always wins and edges are not consulted — drag
//! placement depends on that exact precedence.

/// Result of a snap computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snap {
    /// The (possibly) adjusted time value.
    pub value: f64,
    /// Whether the value was snapped.
    pub snapped: bool,
}

/// Round `time` to the nearest multiple of `grid`.
///
/// `snapped` is always true for a valid grid: grid snapping is not
/// threshold-gated. A nonpositive grid disables snapping.
pub fn snap_to_grid(time: f64, grid: f64) -> Snap {
    if grid <= 0.0 {
        return Snap {
            value: time,
            snapped: false,
        };
    }
    Snap {
        value: (time / grid).round() * grid,
        snapped: true,
    }
}

/// Snap `time` to the nearest clip edge within `threshold`.
///
/// Returns the original time unsnapped when no edge is close enough.
/// `edges` is the sorted, deduplicated list from
/// `Timeline::clip_edges`; order is not actually required here.
pub fn snap_to_edges(time: f64, edges: &[f64], threshold: f64) -> Snap {
    let mut best: Option<(f64, f64)> = None; // (edge, distance)
    for &edge in edges {
        let dist = (edge - time).abs();
        if dist <= threshold && best.map_or(true, |(_, d)| dist < d) {
            best = Some((edge, dist));
        }
    }
    match best {
        Some((edge, _)) => Snap {
            value: edge,
            snapped: true,
        },
        None => Snap {
            value: time,
            snapped: false,
        },
    }
}

/// Combined snap with the grid-wins precedence rule: when `grid` is
/// set, edge snapping is never consulted.
pub fn snap_position(time: f64, grid: Option<f64>, edges: &[f64], threshold: f64) -> Snap {
    match grid {
        Some(grid) => snap_to_grid(time, grid),
        None => snap_to_edges(time, edges, threshold),
    }
}
