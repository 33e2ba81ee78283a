//! Distance and containment predicates
//!
//! Integer coordinates are widened to f64 before any multiplication so board
//! sized values cannot overflow.

use super::types::Point;

/// Euclidean distance between two points
pub fn point_distance(a: Point, b: Point) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    dx.hypot(dy)
}

/// Point-to-segment minimum distance and the closest point on the segment
pub fn point_segment_distance(p: Point, a: Point, b: Point) -> (f64, [f64; 2]) {
    let ab = [(b.x - a.x) as f64, (b.y - a.y) as f64];
    let ap = [(p.x - a.x) as f64, (p.y - a.y) as f64];
    let ab_len2 = ab[0] * ab[0] + ab[1] * ab[1];

    if ab_len2 == 0.0 {
        // Degenerate segment
        return (point_distance(p, a), [a.x as f64, a.y as f64]);
    }

    let t = ((ap[0] * ab[0] + ap[1] * ab[1]) / ab_len2).clamp(0.0, 1.0);
    let closest = [a.x as f64 + t * ab[0], a.y as f64 + t * ab[1]];
    let d = (p.x as f64 - closest[0]).hypot(p.y as f64 - closest[1]);

    (d, closest)
}

/// Even-odd containment test against a closed ring; points on an edge count as inside
pub fn point_in_ring(p: Point, ring: &[Point]) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let (px, py) = (p.x as f64, p.y as f64);
    let mut inside = false;
    let mut j = ring.len() - 1;

    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);

        if point_segment_distance(p, a, b).0 == 0.0 {
            return true;
        }

        let (ax, ay) = (a.x as f64, a.y as f64);
        let (bx, by) = (b.x as f64, b.y as f64);

        if (ay > py) != (by > py) {
            let x_cross = ax + (py - ay) * (bx - ax) / (by - ay);
            if px < x_cross {
                inside = !inside;
            }
        }

        j = i;
    }

    inside
}
