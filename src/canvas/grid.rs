//! Grid snapping
//!
//! The single most behaviorally load-bearing formula in the engine,
//! kept as isolated pure functions.

use crate::config::GRID_SIZE;

/// Snap a coordinate to the nearest multiple of the grid unit
pub fn snap_to_grid(value: f64) -> f64 {
    (value / GRID_SIZE).round() * GRID_SIZE
}

/// Clamp a canvas origin coordinate to the visible quadrant
pub fn clamp_origin(value: f64) -> f64 {
    value.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_rounds_to_nearest_grid_point() {
        assert_eq!(snap_to_grid(0.0), 0.0);
        assert_eq!(snap_to_grid(9.0), 0.0);
        assert_eq!(snap_to_grid(10.0), 20.0);
        assert_eq!(snap_to_grid(97.0), 100.0);
        assert_eq!(snap_to_grid(103.0), 100.0);
        assert_eq!(snap_to_grid(110.0), 120.0);
        assert_eq!(snap_to_grid(250.0), 260.0);
    }

    #[test]
    fn test_snap_preserves_grid_points() {
        for v in [0.0, 20.0, 40.0, 2980.0] {
            assert_eq!(snap_to_grid(v), v);
        }
    }

    #[test]
    fn test_clamp_origin() {
        assert_eq!(clamp_origin(-12.5), 0.0);
        assert_eq!(clamp_origin(0.0), 0.0);
        assert_eq!(clamp_origin(33.0), 33.0);
    }
}
