use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::syntax::ast::Stmt;
use crate::types::color::Color;
use crate::types::geom::{Circle, Line, Point, Rect};
use crate::types::kernel::Kernel;

/// A runtime value. Collections share structure through `Rc`, so
/// cloning a `Value` is always cheap and aliasing is observable.
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Str(String),
    Color(Color),
    Point(Point),
    Rect(Rect),
    Circle(Circle),
    Line(Line),
    Polygon(Rc<Vec<Point>>),
    Kernel(Rc<RefCell<Kernel>>),
    List(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<HashMap<MapKey, Value>>>),
    Function(Rc<FunctionData>),
    Nil,
}

/// A user function value: parameter names, body, and the environment
/// frames captured at the definition site.
#[derive(Debug)]
pub struct FunctionData {
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub captured: Vec<HashMap<String, Value>>,
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn map(entries: HashMap<MapKey, Value>) -> Self {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    pub fn kernel(k: Kernel) -> Self {
        Value::Kernel(Rc::new(RefCell::new(k)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_)   => "number",
            Value::Bool(_)     => "boolean",
            Value::Str(_)      => "string",
            Value::Color(_)    => "color",
            Value::Point(_)    => "point",
            Value::Rect(_)     => "rect",
            Value::Circle(_)   => "circle",
            Value::Line(_)     => "line",
            Value::Polygon(_)  => "polygon",
            Value::Kernel(_)   => "kernel",
            Value::List(_)     => "list",
            Value::Map(_)      => "map",
            Value::Function(_) => "function",
            Value::Nil         => "nil",
        }
    }
}

/// Formats a number the way scripts write them: integral values lose
/// the fraction.
pub fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{}", fmt_num(*v)),
            Value::Bool(v)   => write!(f, "{v}"),
            Value::Str(s)    => write!(f, "{s}"),
            Value::Color(c)  => write!(f, "{c}"),
            Value::Point(p)  => write!(f, "{p}"),
            Value::Rect(r) => {
                write!(f, "rect({}, {}, {}, {})", r.min.x, r.min.y, r.width(), r.height())
            }
            Value::Circle(c) => {
                write!(f, "circle({}, {})", c.center, fmt_num(c.radius))
            }
            Value::Line(l) => write!(f, "line({}, {})", l.p1, l.p2),
            Value::Polygon(pts) => {
                write!(f, "polygon([")?;
                for (i, p) in pts.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{p}")?;
                }
                write!(f, "])")
            }
            Value::Kernel(k) => write!(f, "{}", k.borrow()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.borrow().iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                // deterministic output: entries sorted by key display
                let map = entries.borrow();
                let mut keys: Vec<(String, &MapKey)> =
                    map.keys().map(|k| (k.to_value().to_string(), k)).collect();
                keys.sort_by(|a, b| a.0.cmp(&b.0));
                write!(f, "{{")?;
                for (i, (text, key)) in keys.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{text}: {}", map[*key])?;
                }
                write!(f, "}}")
            }
            Value::Function(data) => write!(f, "fn({})", data.params.join(", ")),
            Value::Nil => write!(f, "nil"),
        }
    }
}

// ─── Map keys ────────────────────────────────────────────────────────────────

/// The hashable subset of values usable as map keys. Numbers key by
/// bit pattern with `-0.0` folded into `0.0`; colors likewise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Number(u64),
    Bool(bool),
    Str(String),
    Point(Point),
    Color([u64; 4]),
}

fn num_bits(v: f64) -> u64 {
    if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() }
}

impl MapKey {
    /// `None` when the value's type cannot be a key.
    pub fn from_value(v: &Value) -> Option<MapKey> {
        match v {
            Value::Number(n) => Some(MapKey::Number(num_bits(*n))),
            Value::Bool(b)   => Some(MapKey::Bool(*b)),
            Value::Str(s)    => Some(MapKey::Str(s.clone())),
            Value::Point(p)  => Some(MapKey::Point(*p)),
            Value::Color(c) => Some(MapKey::Color([
                num_bits(c.r), num_bits(c.g), num_bits(c.b), num_bits(c.a),
            ])),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Number(bits) => Value::Number(f64::from_bits(*bits)),
            MapKey::Bool(b)      => Value::Bool(*b),
            MapKey::Str(s)       => Value::Str(s.clone()),
            MapKey::Point(p)     => Value::Point(*p),
            MapKey::Color(bits)  => Value::Color(Color::new(
                f64::from_bits(bits[0]),
                f64::from_bits(bits[1]),
                f64::from_bits(bits[2]),
                f64::from_bits(bits[3]),
            )),
        }
    }
}
