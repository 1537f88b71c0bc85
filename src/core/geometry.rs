// geometry.rs - Planar convex hulls and their intersection area

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Cross product of (b - o) x (a - o) sign convention: > 0 when o, a, b turn left
fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Convex hull of a point set; fewer than three non-collinear points give a degenerate hull
#[derive(Debug, Clone, PartialEq)]
pub enum Hull {
    Empty,
    Point(Point),
    Segment(Point, Point),
    /// Counter-clockwise vertices, no three collinear
    Polygon(Vec<Point>),
}

impl Hull {
    pub fn area(&self) -> f64 {
        match self {
            Hull::Polygon(vertices) => polygon_area(vertices),
            _ => 0.0,
        }
    }
}

fn compare_points(a: &Point, b: &Point) -> Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

/// Andrew's monotone chain
pub fn convex_hull(points: &[Point]) -> Hull {
    let mut sorted: Vec<Point> = points.to_vec();
    sorted.sort_by(compare_points);
    sorted.dedup();

    match sorted.len() {
        0 => return Hull::Empty,
        1 => return Hull::Point(sorted[0]),
        _ => {}
    }

    let mut lower: Vec<Point> = Vec::with_capacity(sorted.len());
    for &p in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point> = Vec::with_capacity(sorted.len());
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);

    match lower.len() {
        0 | 1 => Hull::Point(sorted[0]),
        2 => Hull::Segment(lower[0], lower[1]),
        _ => Hull::Polygon(lower),
    }
}

/// Shoelace formula, always non-negative
pub fn polygon_area(vertices: &[Point]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        twice += a.x * b.y - b.x * a.y;
    }
    (twice / 2.0).abs()
}

fn line_intersection(p1: Point, p2: Point, q1: Point, q2: Point) -> Point {
    let a1 = p2.y - p1.y;
    let b1 = p1.x - p2.x;
    let c1 = a1 * p1.x + b1 * p1.y;
    let a2 = q2.y - q1.y;
    let b2 = q1.x - q2.x;
    let c2 = a2 * q1.x + b2 * q1.y;
    let det = a1 * b2 - a2 * b1;
    if det == 0.0 {
        return p2;
    }
    Point::new((b2 * c1 - b1 * c2) / det, (a1 * c2 - a2 * c1) / det)
}

/// Clip a convex polygon by a convex counter-clockwise clipper (Sutherland-Hodgman)
fn clip(subject: &[Point], clipper: &[Point]) -> Vec<Point> {
    let mut output = subject.to_vec();
    for i in 0..clipper.len() {
        if output.is_empty() {
            break;
        }
        let edge_start = clipper[i];
        let edge_end = clipper[(i + 1) % clipper.len()];
        let input = std::mem::take(&mut output);

        for j in 0..input.len() {
            let current = input[j];
            let previous = input[(j + input.len() - 1) % input.len()];
            let current_inside = cross(edge_start, edge_end, current) >= 0.0;
            let previous_inside = cross(edge_start, edge_end, previous) >= 0.0;

            if current_inside {
                if !previous_inside {
                    output.push(line_intersection(previous, current, edge_start, edge_end));
                }
                output.push(current);
            } else if previous_inside {
                output.push(line_intersection(previous, current, edge_start, edge_end));
            }
        }
    }
    output
}

/// Area of the intersection of two hulls; degenerate hulls never overlap with positive area
pub fn intersection_area(a: &Hull, b: &Hull) -> f64 {
    match (a, b) {
        (Hull::Polygon(pa), Hull::Polygon(pb)) => polygon_area(&clip(pa, pb)),
        _ => 0.0,
    }
}
