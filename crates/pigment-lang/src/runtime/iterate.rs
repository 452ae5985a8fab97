use std::collections::HashMap;

use crate::error::RuntimeError;
use crate::runtime::value::{MapKey, Value};
use crate::types::geom::{Circle, Line, Point, Rect};

/// Whether the visitor wants the traversal to keep going. A body that
/// hits `return` stops early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop,
}

pub type Visitor<'a> = dyn FnMut(Value) -> Result<Step, RuntimeError> + 'a;

/// Drives `for v in x { }` for every iterable value type. Geometry
/// values yield the points they cover; kernels yield their weights,
/// lists their elements, maps a `{key:, val:}` view per entry.
pub fn iterate(line: usize, v: &Value, visit: &mut Visitor<'_>) -> Result<(), RuntimeError> {
    match v {
        Value::Rect(r)      => iterate_rect(*r, visit),
        Value::Circle(c)    => iterate_circle(*c, visit),
        Value::Line(l)      => iterate_line(*l, visit),
        Value::Polygon(pts) => iterate_polygon(pts, visit),
        Value::Kernel(k) => {
            let weights = k.borrow().values.clone();
            for w in weights {
                if visit(Value::Number(w))? == Step::Stop {
                    return Ok(());
                }
            }
            Ok(())
        }
        Value::List(items) => {
            let items = items.borrow().clone();
            for item in items {
                if visit(item)? == Step::Stop {
                    return Ok(());
                }
            }
            Ok(())
        }
        Value::Map(entries) => iterate_map(entries.borrow().clone(), visit),
        _ => Err(RuntimeError::new(line, format!(
            "{} is not iterable", v.type_name()))),
    }
}

fn iterate_rect(r: Rect, visit: &mut Visitor<'_>) -> Result<(), RuntimeError> {
    for y in r.min.y..r.max.y {
        for x in r.min.x..r.max.x {
            if visit(Value::Point(Point::new(x, y)))? == Step::Stop {
                return Ok(());
            }
        }
    }
    Ok(())
}

/// Integer midpoint circle fill: each decision step emits the
/// horizontal span pair symmetric about the center, without trig and
/// without revisiting rows.
fn iterate_circle(c: Circle, visit: &mut Visitor<'_>) -> Result<(), RuntimeError> {
    let r = c.radius.round() as i32;
    if r < 0 {
        return Ok(());
    }
    let (cx, cy) = (c.center.x, c.center.y);

    let mut span = |x0: i32, x1: i32, y: i32, visit: &mut Visitor<'_>| {
        for x in x0..=x1 {
            if visit(Value::Point(Point::new(x, y)))? == Step::Stop {
                return Ok(Step::Stop);
            }
        }
        Ok(Step::Continue)
    };

    let mut x = 0;
    let mut y = r;
    let mut d = 1 - r;

    while x <= y {
        if span(cx - y, cx + y, cy + x, visit)? == Step::Stop {
            return Ok(());
        }
        if x != 0 && span(cx - y, cx + y, cy - x, visit)? == Step::Stop {
            return Ok(());
        }

        if d < 0 {
            d += 2 * x + 3;
        } else {
            // y is about to shrink: rows cy±y are final at half-width x
            if x != y {
                if span(cx - x, cx + x, cy + y, visit)? == Step::Stop {
                    return Ok(());
                }
                if span(cx - x, cx + x, cy - y, visit)? == Step::Stop {
                    return Ok(());
                }
            }
            d += 2 * (x - y) + 5;
            y -= 1;
        }
        x += 1;
    }
    Ok(())
}

/// DDA along the dominant axis, `p1` inclusive, `p2` exclusive.
fn iterate_line(l: Line, visit: &mut Visitor<'_>) -> Result<(), RuntimeError> {
    let dx = (l.p2.x - l.p1.x) as f64;
    let dy = (l.p2.y - l.p1.y) as f64;
    let steps = dx.abs().max(dy.abs()) as i32;

    if steps == 0 {
        visit(Value::Point(l.p1))?;
        return Ok(());
    }

    for i in 0..steps {
        let t = i as f64 / steps as f64;
        let x = l.p1.x + (t * dx).round() as i32;
        let y = l.p1.y + (t * dy).round() as i32;
        if visit(Value::Point(Point::new(x, y)))? == Step::Stop {
            return Ok(());
        }
    }
    Ok(())
}

/// Horizontal-scanline fill, even-odd rule, sampling at pixel centers.
/// A post-pass visits the pixels of horizontal border edges the scan
/// itself skips.
fn iterate_polygon(vertices: &[Point], visit: &mut Visitor<'_>) -> Result<(), RuntimeError> {
    let n = vertices.len();
    if n < 3 {
        return Ok(());
    }

    let y_min = vertices.iter().map(|p| p.y).min().unwrap_or(0);
    let y_max = vertices.iter().map(|p| p.y).max().unwrap_or(0);

    for y in y_min..=y_max {
        let yc = y as f64 + 0.5;
        let mut crossings = Vec::new();

        for i in 0..n {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            if a.y == b.y {
                continue;
            }
            let (ay, by) = (a.y as f64, b.y as f64);
            if (yc >= ay.min(by)) && (yc < ay.max(by)) {
                let t = (yc - ay) / (by - ay);
                crossings.push(a.x as f64 + t * (b.x - a.x) as f64);
            }
        }

        crossings.sort_by(|p, q| p.partial_cmp(q).unwrap_or(std::cmp::Ordering::Equal));

        for pair in crossings.chunks_exact(2) {
            let x0 = (pair[0] - 0.5).ceil() as i32;
            let x1 = (pair[1] - 0.5).floor() as i32;
            for x in x0..=x1 {
                if visit(Value::Point(Point::new(x, y)))? == Step::Stop {
                    return Ok(());
                }
            }
        }
    }

    // horizontal edges form part of the outline but never cross a
    // scanline, so fill them directly
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        if a.y != b.y {
            continue;
        }
        for x in a.x.min(b.x)..=a.x.max(b.x) {
            if visit(Value::Point(Point::new(x, a.y)))? == Step::Stop {
                return Ok(());
            }
        }
    }
    Ok(())
}

/// Each entry appears as a fresh `{key: k, val: v}` map; entries come
/// out sorted by the key's display string so iteration is stable.
fn iterate_map(
    entries: HashMap<MapKey, Value>,
    visit: &mut Visitor<'_>,
) -> Result<(), RuntimeError> {
    let mut sorted: Vec<(String, MapKey, Value)> = entries
        .into_iter()
        .map(|(k, v)| (k.to_value().to_string(), k, v))
        .collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    for (_, key, val) in sorted {
        let mut view = HashMap::new();
        view.insert(MapKey::Str("key".into()), key.to_value());
        view.insert(MapKey::Str("val".into()), val);
        if visit(Value::map(view))? == Step::Stop {
            return Ok(());
        }
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn collect_points(v: &Value) -> Vec<Point> {
        let mut points = Vec::new();
        iterate(1, v, &mut |item| {
            if let Value::Point(p) = item {
                points.push(p);
            }
            Ok(Step::Continue)
        })
        .unwrap();
        points
    }

    #[test]
    fn rect_iterates_row_major() {
        let pts = collect_points(&Value::Rect(Rect::from_size(0, 0, 2, 2)));
        assert_eq!(pts, vec![
            Point::new(0, 0), Point::new(1, 0),
            Point::new(0, 1), Point::new(1, 1),
        ]);
    }

    #[test]
    fn circle_covers_contained_pixels_once() {
        let c = Circle::new(Point::new(0, 0), 3.0);
        let pts = collect_points(&Value::Circle(c));
        let mut sorted: Vec<Point> = pts.clone();
        sorted.sort_by_key(|p| (p.y, p.x));
        sorted.dedup();
        assert_eq!(pts.len(), sorted.len(), "no pixel visited twice");
        assert!(pts.contains(&Point::new(0, 0)));
        assert!(pts.contains(&Point::new(3, 0)));
        assert!(pts.contains(&Point::new(0, -3)));
        assert!(!pts.contains(&Point::new(3, 3)));
    }

    #[test]
    fn zero_radius_circle_is_one_pixel() {
        let pts = collect_points(&Value::Circle(Circle::new(Point::new(5, 5), 0.0)));
        assert_eq!(pts, vec![Point::new(5, 5)]);
    }

    #[test]
    fn line_excludes_endpoint() {
        let l = Line::new(Point::new(0, 0), Point::new(3, 0));
        let pts = collect_points(&Value::Line(l));
        assert_eq!(pts, vec![Point::new(0, 0), Point::new(1, 0), Point::new(2, 0)]);
    }

    #[test]
    fn line_steps_along_dominant_axis() {
        let l = Line::new(Point::new(0, 0), Point::new(4, 2));
        let pts = collect_points(&Value::Line(l));
        assert_eq!(pts.len(), 4);
        assert_eq!(pts[0], Point::new(0, 0));
    }

    #[test]
    fn degenerate_line_is_one_point() {
        let l = Line::new(Point::new(2, 2), Point::new(2, 2));
        let pts = collect_points(&Value::Line(l));
        assert_eq!(pts, vec![Point::new(2, 2)]);
    }

    #[test]
    fn polygon_fills_square() {
        let square = Value::Polygon(Rc::new(vec![
            Point::new(0, 0),
            Point::new(3, 0),
            Point::new(3, 3),
            Point::new(0, 3),
        ]));
        let pts = collect_points(&square);
        assert!(pts.contains(&Point::new(1, 1)));
        assert!(pts.contains(&Point::new(2, 2)));
        assert!(!pts.contains(&Point::new(4, 1)));
    }

    #[test]
    fn kernel_iterates_weights() {
        let k = Value::kernel(crate::types::kernel::Kernel::square(vec![1.0, 2.0, 3.0, 4.0]));
        let mut seen = Vec::new();
        iterate(1, &k, &mut |item| {
            if let Value::Number(n) = item {
                seen.push(n);
            }
            Ok(Step::Continue)
        })
        .unwrap();
        assert_eq!(seen, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn map_iteration_yields_key_val_views_in_key_order() {
        let mut m = HashMap::new();
        m.insert(MapKey::Str("b".into()), Value::Number(2.0));
        m.insert(MapKey::Str("a".into()), Value::Number(1.0));
        let mut seen = Vec::new();
        iterate(1, &Value::map(m), &mut |item| {
            seen.push(item.to_string());
            Ok(Step::Continue)
        })
        .unwrap();
        assert_eq!(seen, vec!["{key: a, val: 1}", "{key: b, val: 2}"]);
    }

    #[test]
    fn visitor_can_stop_early() {
        let mut count = 0;
        iterate(1, &Value::Rect(Rect::from_size(0, 0, 10, 10)), &mut |_| {
            count += 1;
            Ok(if count == 3 { Step::Stop } else { Step::Continue })
        })
        .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn numbers_are_not_iterable() {
        let e = iterate(7, &Value::Number(1.0), &mut |_| Ok(Step::Continue)).unwrap_err();
        assert_eq!(e.line, 7);
        assert!(e.message.contains("not iterable"));
    }
}
