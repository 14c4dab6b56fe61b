use hanare_ipc::ProximityAlgorithm;

use super::{Point, Rect};

/// Per-axis multipliers applied to the cursor offset before measuring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sensitivity {
    pub x: f64,
    pub y: f64,
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proximity {
    pub distance: f64,
    pub within: bool,
    /// Unit vector pointing from the cursor toward the window, i.e. the
    /// direction the window should travel to get away.
    pub push: (f64, f64),
}

/// Distance from `point` to the closest point of `rect`; 0 when inside.
pub fn nearest_edge_distance(point: Point, rect: &Rect) -> f64 {
    edge_distance_scaled(point, rect, Sensitivity::default())
}

fn edge_distance_scaled(point: Point, rect: &Rect, sensitivity: Sensitivity) -> f64 {
    let dx = (rect.x - point.x).max(0).max(point.x - rect.right()) as f64;
    let dy = (rect.y - point.y).max(0).max(point.y - rect.bottom()) as f64;
    (dx * sensitivity.x).hypot(dy * sensitivity.y)
}

pub fn evaluate(
    cursor: Point,
    rect: &Rect,
    algorithm: ProximityAlgorithm,
    sensitivity: Sensitivity,
    threshold: f64,
) -> Proximity {
    let (cx, cy) = rect.center();
    let dx = cx - cursor.x as f64;
    let dy = cy - cursor.y as f64;

    let distance = match algorithm {
        ProximityAlgorithm::NearestEdge => edge_distance_scaled(cursor, rect, sensitivity),
        ProximityAlgorithm::Euclidean => (dx * sensitivity.x).hypot(dy * sensitivity.y),
        ProximityAlgorithm::Manhattan => (dx * sensitivity.x).abs() + (dy * sensitivity.y).abs(),
    };

    let len = dx.hypot(dy);
    let push = if len > f64::EPSILON {
        (dx / len, dy / len)
    } else {
        (1.0, 0.0)
    };

    Proximity {
        distance,
        within: distance <= threshold,
        push,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> Rect {
        Rect::new(100, 100, 200, 100)
    }

    #[test]
    fn test_nearest_edge_zero_iff_inside() {
        let r = window();
        for &(x, y) in &[(100, 100), (300, 200), (150, 150), (300, 150)] {
            let p = Point::new(x, y);
            assert!(r.contains(p));
            assert_eq!(nearest_edge_distance(p, &r), 0.0);
        }
        for &(x, y) in &[(99, 150), (301, 150), (150, 99), (150, 201), (0, 0)] {
            let p = Point::new(x, y);
            assert!(!r.contains(p));
            assert!(nearest_edge_distance(p, &r) > 0.0);
        }
    }

    #[test]
    fn test_nearest_edge_is_distance_to_closest_boundary_point() {
        let r = window();
        assert_eq!(nearest_edge_distance(Point::new(50, 150), &r), 50.0);
        assert_eq!(nearest_edge_distance(Point::new(200, 240), &r), 40.0);
        // Diagonal from the top-left corner.
        assert_eq!(nearest_edge_distance(Point::new(97, 96), &r), 5.0);
        // Diagonal from the bottom-right corner.
        assert_eq!(nearest_edge_distance(Point::new(306, 208), &r), 10.0);
    }

    #[test]
    fn test_center_algorithms() {
        let r = window(); // center (200, 150)
        let cursor = Point::new(170, 110);

        let e = evaluate(cursor, &r, ProximityAlgorithm::Euclidean, Sensitivity::default(), 60.0);
        assert!((e.distance - 50.0).abs() < 1e-9);
        assert!(e.within);

        let m = evaluate(cursor, &r, ProximityAlgorithm::Manhattan, Sensitivity::default(), 60.0);
        assert!((m.distance - 70.0).abs() < 1e-9);
        assert!(!m.within);
    }

    #[test]
    fn test_push_points_away_from_cursor() {
        let r = window();
        let p = evaluate(
            Point::new(50, 150),
            &r,
            ProximityAlgorithm::NearestEdge,
            Sensitivity::default(),
            60.0,
        );
        assert!(p.within);
        assert!((p.push.0 - 1.0).abs() < 1e-9);
        assert!(p.push.1.abs() < 1e-9);

        let above = evaluate(
            Point::new(200, 80),
            &r,
            ProximityAlgorithm::NearestEdge,
            Sensitivity::default(),
            60.0,
        );
        assert!(above.push.1 > 0.99);
    }

    #[test]
    fn test_cursor_on_center_defaults_push_right() {
        let r = window();
        let p = evaluate(
            Point::new(200, 150),
            &r,
            ProximityAlgorithm::Euclidean,
            Sensitivity::default(),
            10.0,
        );
        assert_eq!(p.distance, 0.0);
        assert_eq!(p.push, (1.0, 0.0));
    }

    #[test]
    fn test_sensitivity_scales_axes() {
        let r = window();
        let cursor = Point::new(50, 150); // 50px left of the window
        let relaxed = Sensitivity { x: 2.0, y: 1.0 };
        let p = evaluate(cursor, &r, ProximityAlgorithm::NearestEdge, relaxed, 60.0);
        assert_eq!(p.distance, 100.0);
        assert!(!p.within);

        let vertical_only = Sensitivity { x: 1.0, y: 0.5 };
        let q = evaluate(
            Point::new(200, 240),
            &r,
            ProximityAlgorithm::NearestEdge,
            vertical_only,
            30.0,
        );
        assert_eq!(q.distance, 20.0);
        assert!(q.within);
    }
}
