use nalgebra as na;

pub type Point = na::Point2<i32>;

/// Values of the line equation closer to zero than this put the point on the line.
pub const SIDE_EPSILON: f64 = 1e-6;

/// Coefficients `(a, b, c)` of `a·x + b·y + c = 0` through `start` and `end`.
#[inline]
pub fn line_equation(start: &Point, end: &Point) -> (f64, f64, f64) {
    let (x1, y1) = (start.x as f64, start.y as f64);
    let (x2, y2) = (end.x as f64, end.y as f64);

    (y2 - y1, x1 - x2, x2 * y1 - x1 * y2)
}

/// Which side of the line through `start`/`end` the point lies on: `-1`, `0` or `+1`.
///
/// Coincident endpoints give `a = b = c = 0`, so every point lands on side `0`.
pub fn line_side(start: &Point, end: &Point, p: &Point) -> i8 {
    let (a, b, c) = line_equation(start, end);
    let value = a * p.x as f64 + b * p.y as f64 + c;

    if value.abs() < SIDE_EPSILON {
        0
    } else if value > 0.0 {
        1
    } else {
        -1
    }
}

#[inline]
fn on_segment(p: &Point, p1: &Point, p2: &Point) -> bool {
    let cross = (p2.x as i64 - p1.x as i64) * (p.y as i64 - p1.y as i64)
        - (p2.y as i64 - p1.y as i64) * (p.x as i64 - p1.x as i64);

    cross == 0
        && p.x >= p1.x.min(p2.x)
        && p.x <= p1.x.max(p2.x)
        && p.y >= p1.y.min(p2.y)
        && p.y <= p1.y.max(p2.y)
}

/// Ray-casting containment test. Points on an edge or a vertex count as inside.
///
/// Polygons with fewer than three vertices contain nothing.
pub fn polygon_contains(poly: &[Point], p: &Point) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut p1 = poly[n - 1];

    for &p2 in poly {
        if on_segment(p, &p1, &p2) {
            return true;
        }

        if (p1.y > p.y) != (p2.y > p.y) {
            let (x1, y1) = (p1.x as f64, p1.y as f64);
            let xints = (p.y as f64 - y1) * (p2.x as f64 - x1) / (p2.y as f64 - y1) + x1;

            if (p.x as f64) < xints {
                inside = !inside;
            }
        }

        p1 = p2;
    }

    inside
}
