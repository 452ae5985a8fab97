use std::rc::Rc;

use crate::error::RuntimeError;
use crate::runtime::value::{MapKey, Value, fmt_num};
use crate::types::color::Color;
use crate::types::geom::{Point, polygon_contains};

fn mismatch(line: usize, op: &str, a: &Value, b: &Value) -> RuntimeError {
    RuntimeError::new(line, format!(
        "operator `{op}` is not defined for {} and {}", a.type_name(), b.type_name()))
}

// ─── Comparison ──────────────────────────────────────────────────────────────

/// Three-way comparison. `Some(sign)` for ordered pairs (numbers,
/// strings), `Some(0.0)` for equal values of the same type, `None` for
/// everything else ("incomparable"). Equality treats `None` as
/// not-equal; the ordering operators refuse it.
pub fn compare(a: &Value, b: &Value) -> Option<f64> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let ord = x.partial_cmp(y)?;
            Some(ord as i8 as f64)
        }
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y) as i8 as f64),

        (Value::Bool(x), Value::Bool(y)) if x == y => Some(0.0),
        (Value::Color(x), Value::Color(y)) if x == y => Some(0.0),
        (Value::Point(x), Value::Point(y)) if x == y => Some(0.0),
        (Value::Rect(x), Value::Rect(y)) if x == y => Some(0.0),
        (Value::Circle(x), Value::Circle(y)) if x == y => Some(0.0),
        (Value::Line(x), Value::Line(y)) if x == y => Some(0.0),
        (Value::Polygon(x), Value::Polygon(y)) if x == y => Some(0.0),
        (Value::Kernel(x), Value::Kernel(y)) if *x.borrow() == *y.borrow() => Some(0.0),

        (Value::List(x), Value::List(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            if x.len() == y.len()
                && x.iter().zip(y.iter()).all(|(a, b)| compare(a, b) == Some(0.0))
            {
                Some(0.0)
            } else {
                None
            }
        }
        (Value::Map(x), Value::Map(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            if x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| compare(v, w) == Some(0.0)))
            {
                Some(0.0)
            } else {
                None
            }
        }

        (Value::Function(x), Value::Function(y)) if Rc::ptr_eq(x, y) => Some(0.0),
        (Value::Nil, Value::Nil) => Some(0.0),

        _ => None,
    }
}

pub fn equals(a: &Value, b: &Value) -> bool {
    compare(a, b) == Some(0.0)
}

// ─── Arithmetic ──────────────────────────────────────────────────────────────

fn point_scalar(p: Point, n: f64, f: impl Fn(f64, f64) -> f64) -> Point {
    Point::new(f(p.x as f64, n) as i32, f(p.y as f64, n) as i32)
}

fn point_point(a: Point, b: Point, f: impl Fn(f64, f64) -> f64) -> Point {
    Point::new(
        f(a.x as f64, b.x as f64) as i32,
        f(a.y as f64, b.y as f64) as i32,
    )
}

/// Channel-wise color arithmetic in raw 0..255 space, keeping the
/// color operand's alpha. Used by `+ - %`.
fn color_raw(c: Color, other: &Value, swapped: bool, f: impl Fn(f64, f64) -> f64) -> Color {
    let g = |x: f64, y: f64| if swapped { f(y, x) } else { f(x, y) };
    match other {
        Value::Number(n) => Color::new(g(c.r, *n), g(c.g, *n), g(c.b, *n), c.a),
        Value::Color(o)  => Color::new(g(c.r, o.r), g(c.g, o.g), g(c.b, o.b), c.a),
        _ => unreachable!(),
    }
}

/// Color `* /` work in normalized 0..1 space and include alpha.
fn color_norm(c: Color, other: &Value, swapped: bool, f: impl Fn(f64, f64) -> f64) -> Color {
    let apply = |x: f64, y: f64| {
        let (x, y) = if swapped { (y, x) } else { (x, y) };
        f(x, y) * 255.0
    };
    match other {
        Value::Number(n) => Color::new(
            apply(c.r / 255.0, *n),
            apply(c.g / 255.0, *n),
            apply(c.b / 255.0, *n),
            apply(c.a / 255.0, *n),
        ),
        Value::Color(o) => Color::new(
            apply(c.r / 255.0, o.r / 255.0),
            apply(c.g / 255.0, o.g / 255.0),
            apply(c.b / 255.0, o.b / 255.0),
            apply(c.a / 255.0, o.a / 255.0),
        ),
        _ => unreachable!(),
    }
}

/// `+ - %` share one raw-space table; `* /` use the normalized table.
fn arith_raw(
    line: usize,
    op: &str,
    a: &Value,
    b: &Value,
    f: impl Fn(f64, f64) -> f64 + Copy,
) -> Result<Value, RuntimeError> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(f(*x, *y))),
        (Value::Point(p), Value::Number(n))  => Ok(Value::Point(point_scalar(*p, *n, f))),
        (Value::Number(n), Value::Point(p))  => {
            Ok(Value::Point(point_scalar(*p, *n, |x, y| f(y, x))))
        }
        (Value::Point(p), Value::Point(q))   => Ok(Value::Point(point_point(*p, *q, f))),
        (Value::Color(c), Value::Number(_) | Value::Color(_)) => {
            Ok(Value::Color(color_raw(*c, b, false, f)))
        }
        (Value::Number(_), Value::Color(c)) => Ok(Value::Color(color_raw(*c, a, true, f))),
        _ => Err(mismatch(line, op, a, b)),
    }
}

fn arith_norm(
    line: usize,
    op: &str,
    a: &Value,
    b: &Value,
    f: impl Fn(f64, f64) -> f64 + Copy,
) -> Result<Value, RuntimeError> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(f(*x, *y))),
        (Value::Point(p), Value::Number(n))  => Ok(Value::Point(point_scalar(*p, *n, f))),
        (Value::Number(n), Value::Point(p))  => {
            Ok(Value::Point(point_scalar(*p, *n, |x, y| f(y, x))))
        }
        (Value::Point(p), Value::Point(q))   => Ok(Value::Point(point_point(*p, *q, f))),
        (Value::Color(c), Value::Number(_) | Value::Color(_)) => {
            Ok(Value::Color(color_norm(*c, b, false, f)))
        }
        (Value::Number(_), Value::Color(c)) => Ok(Value::Color(color_norm(*c, a, true, f))),
        _ => Err(mismatch(line, op, a, b)),
    }
}

pub fn add(line: usize, a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    arith_raw(line, "+", a, b, |x, y| x + y)
}

pub fn sub(line: usize, a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    arith_raw(line, "-", a, b, |x, y| x - y)
}

pub fn rem(line: usize, a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    arith_raw(line, "%", a, b, |x, y| x % y)
}

pub fn mul(line: usize, a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    arith_norm(line, "*", a, b, |x, y| x * y)
}

/// Division follows IEEE-754; dividing by zero yields inf/NaN, it is
/// not trapped.
pub fn div(line: usize, a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    arith_norm(line, "/", a, b, |x, y| x / y)
}

// ─── Unary ───────────────────────────────────────────────────────────────────

pub fn neg(line: usize, v: &Value) -> Result<Value, RuntimeError> {
    match v {
        Value::Number(n) => Ok(Value::Number(-n)),
        Value::Point(p)  => Ok(Value::Point(Point::new(-p.x, -p.y))),
        // color negation inverts the channels, alpha untouched
        Value::Color(c)  => Ok(Value::Color(Color::new(
            255.0 - c.r, 255.0 - c.g, 255.0 - c.b, c.a,
        ))),
        _ => Err(RuntimeError::new(line, format!(
            "operator `-` is not defined for {}", v.type_name()))),
    }
}

pub fn not(line: usize, v: &Value) -> Result<Value, RuntimeError> {
    match v {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        _ => Err(RuntimeError::new(line, format!(
            "operator `not` needs a boolean, got {}", v.type_name()))),
    }
}

// ─── Membership ──────────────────────────────────────────────────────────────

pub fn contains(line: usize, item: &Value, container: &Value) -> Result<Value, RuntimeError> {
    let found = match (item, container) {
        (_, Value::List(items)) => items.borrow().iter().any(|v| equals(item, v)),
        (Value::Number(n), Value::Kernel(k)) => k.borrow().values.contains(n),
        (Value::Point(p), Value::Rect(r))    => r.contains(*p),
        (Value::Point(p), Value::Circle(c))  => c.contains(*p),
        (Value::Point(p), Value::Polygon(pts)) => polygon_contains(pts, *p),
        (Value::Str(needle), Value::Str(hay)) => hay.contains(needle.as_str()),
        (_, Value::Map(entries)) => match MapKey::from_value(item) {
            Some(key) => entries.borrow().contains_key(&key),
            None => false,
        },
        _ => return Err(mismatch(line, "in", item, container)),
    };
    Ok(Value::Bool(found))
}

// ─── Concatenation ───────────────────────────────────────────────────────────

pub fn concat(line: usize, a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    match (a, b) {
        (Value::List(x), Value::List(y)) => {
            let mut items = x.borrow().clone();
            items.extend(y.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        (Value::List(x), _) => {
            let mut items = x.borrow().clone();
            items.push(b.clone());
            Ok(Value::list(items))
        }
        // with a string on either side, `::` builds a string
        (Value::Str(_), _) | (_, Value::Str(_)) => {
            Ok(Value::Str(format!("{a}{b}")))
        }
        _ => Err(mismatch(line, "::", a, b)),
    }
}

// ─── Member access ───────────────────────────────────────────────────────────

pub fn property(line: usize, v: &Value, name: &str) -> Result<Value, RuntimeError> {
    let result = match (v, name) {
        (Value::Point(p), "x") => Some(Value::Number(p.x as f64)),
        (Value::Point(p), "y") => Some(Value::Number(p.y as f64)),

        (Value::Color(c), "r") => Some(Value::Number(c.r)),
        (Value::Color(c), "g") => Some(Value::Number(c.g)),
        (Value::Color(c), "b") => Some(Value::Number(c.b)),
        (Value::Color(c), "a") => Some(Value::Number(c.a)),

        (Value::Rect(r), "min")    => Some(Value::Point(r.min)),
        (Value::Rect(r), "max")    => Some(Value::Point(r.max)),
        (Value::Rect(r), "width")  => Some(Value::Number(r.width() as f64)),
        (Value::Rect(r), "height") => Some(Value::Number(r.height() as f64)),

        (Value::Circle(c), "center") => Some(Value::Point(c.center)),
        (Value::Circle(c), "radius") => Some(Value::Number(c.radius)),

        (Value::Line(l), "p1") => Some(Value::Point(l.p1)),
        (Value::Line(l), "p2") => Some(Value::Point(l.p2)),

        (Value::Kernel(k), "width")  => Some(Value::Number(k.borrow().width as f64)),
        (Value::Kernel(k), "height") => Some(Value::Number(k.borrow().height as f64)),

        // `m.key` is shorthand for `m["key"]`; a missing key reads nil
        (Value::Map(entries), _) => Some(
            entries
                .borrow()
                .get(&MapKey::Str(name.to_string()))
                .cloned()
                .unwrap_or(Value::Nil),
        ),

        _ => None,
    };
    result.ok_or_else(|| RuntimeError::new(line, format!(
        "{} has no property `{name}`", v.type_name())))
}

// ─── Indexing ────────────────────────────────────────────────────────────────

/// Truncates the index and wraps a negative value once from the end.
fn resolve_index(line: usize, raw: f64, len: usize, what: &str) -> Result<usize, RuntimeError> {
    let mut i = raw.trunc() as i64;
    if i < 0 {
        i += len as i64;
    }
    if i < 0 || i >= len as i64 {
        return Err(RuntimeError::new(line, format!(
            "index {} is out of range for {what} of length {len}", fmt_num(raw))));
    }
    Ok(i as usize)
}

fn number_index(line: usize, index: &Value) -> Result<f64, RuntimeError> {
    match index {
        Value::Number(n) => Ok(*n),
        other => Err(RuntimeError::new(line, format!(
            "index must be a number, got {}", other.type_name()))),
    }
}

pub fn index(line: usize, v: &Value, index: &Value) -> Result<Value, RuntimeError> {
    match v {
        Value::List(items) => {
            let items = items.borrow();
            let i = resolve_index(line, number_index(line, index)?, items.len(), "list")?;
            Ok(items[i].clone())
        }
        Value::Kernel(k) => {
            let k = k.borrow();
            let i = resolve_index(line, number_index(line, index)?, k.len(), "kernel")?;
            Ok(Value::Number(k.values[i]))
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let i = resolve_index(line, number_index(line, index)?, chars.len(), "string")?;
            Ok(Value::Str(chars[i].to_string()))
        }
        Value::Map(entries) => {
            let key = MapKey::from_value(index).ok_or_else(|| {
                RuntimeError::new(line, format!(
                    "{} cannot be a map key", index.type_name()))
            })?;
            Ok(entries.borrow().get(&key).cloned().unwrap_or(Value::Nil))
        }
        _ => Err(RuntimeError::new(line, format!(
            "{} cannot be indexed", v.type_name()))),
    }
}

/// `[lo..hi]` — both bounds wrap from the end, the upper bound is
/// inclusive: `[1,2,3,4][2..-1]` is `[3, 4]`.
pub fn index_range(
    line: usize,
    v: &Value,
    lower: &Value,
    upper: &Value,
) -> Result<Value, RuntimeError> {
    let slice = |len: usize| -> Result<(usize, usize), RuntimeError> {
        let lo = resolve_index(line, number_index(line, lower)?, len, "range")?;
        let hi = resolve_index(line, number_index(line, upper)?, len, "range")?;
        if lo > hi {
            return Err(RuntimeError::new(line, format!(
                "range lower bound {lo} is past upper bound {hi}")));
        }
        Ok((lo, hi))
    };

    match v {
        Value::List(items) => {
            let items = items.borrow();
            let (lo, hi) = slice(items.len())?;
            Ok(Value::list(items[lo..=hi].to_vec()))
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (lo, hi) = slice(chars.len())?;
            Ok(Value::Str(chars[lo..=hi].iter().collect()))
        }
        _ => Err(RuntimeError::new(line, format!(
            "{} cannot be sliced", v.type_name()))),
    }
}

/// In-place element mutation behind `xs[i] = v`.
pub fn index_assign(
    line: usize,
    target: &Value,
    index: &Value,
    value: Value,
) -> Result<(), RuntimeError> {
    match target {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let i = resolve_index(line, number_index(line, index)?, items.len(), "list")?;
            items[i] = value;
            Ok(())
        }
        Value::Kernel(k) => {
            let weight = match value {
                Value::Number(n) => n,
                other => {
                    return Err(RuntimeError::new(line, format!(
                        "kernel cells hold numbers, got {}", other.type_name())));
                }
            };
            let mut k = k.borrow_mut();
            let len = k.len();
            let i = resolve_index(line, number_index(line, index)?, len, "kernel")?;
            k.values[i] = weight;
            Ok(())
        }
        Value::Map(entries) => {
            let key = MapKey::from_value(index).ok_or_else(|| {
                RuntimeError::new(line, format!(
                    "{} cannot be a map key", index.type_name()))
            })?;
            entries.borrow_mut().insert(key, value);
            Ok(())
        }
        _ => Err(RuntimeError::new(line, format!(
            "cannot assign into {}", target.type_name()))),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
