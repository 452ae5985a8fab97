use std::fmt;

/// An integer pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.x, self.y)
    }
}

// ─── Rect ────────────────────────────────────────────────────────────────────

/// An axis-aligned rectangle. `max` is exclusive on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn from_size(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { min: Point::new(x, y), max: Point::new(x + w, y + h) }
    }

    pub fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }
}

// ─── Circle ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn contains(&self, p: Point) -> bool {
        let dx = (p.x - self.center.x) as f64;
        let dy = (p.y - self.center.y) as f64;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

// ─── Line ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub p1: Point,
    pub p2: Point,
}

impl Line {
    pub fn new(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }
}

// ─── Polygon ─────────────────────────────────────────────────────────────────

/// Even-odd point-in-polygon test over the closed vertex ring.
pub fn polygon_contains(vertices: &[Point], p: Point) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let (px, py) = (p.x as f64 + 0.5, p.y as f64 + 0.5);
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (vertices[i].x as f64, vertices[i].y as f64);
        let (xj, yj) = (vertices[j].x as f64, vertices[j].y as f64);
        if (yi > py) != (yj > py) {
            let cross = (xj - xi) * (py - yi) / (yj - yi) + xi;
            if px < cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_max_is_exclusive() {
        let r = Rect::from_size(0, 0, 10, 10);
        assert!(r.contains(Point::new(9, 9)));
        assert!(!r.contains(Point::new(10, 9)));
        assert!(!r.contains(Point::new(0, 10)));
    }

    #[test]
    fn rect_dimensions() {
        let r = Rect::from_size(1, 2, 3, 4);
        assert_eq!(r.min, Point::new(1, 2));
        assert_eq!(r.max, Point::new(4, 6));
        assert_eq!((r.width(), r.height()), (3, 4));
    }

    #[test]
    fn circle_contains_boundary() {
        let c = Circle::new(Point::new(0, 0), 5.0);
        assert!(c.contains(Point::new(3, 4)));
        assert!(!c.contains(Point::new(4, 4)));
    }

    #[test]
    fn polygon_even_odd() {
        let square = [
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert!(polygon_contains(&square, Point::new(5, 5)));
        assert!(!polygon_contains(&square, Point::new(15, 5)));
    }

    #[test]
    fn degenerate_polygon_contains_nothing() {
        let pts = [Point::new(0, 0), Point::new(5, 5)];
        assert!(!polygon_contains(&pts, Point::new(2, 2)));
    }
}
