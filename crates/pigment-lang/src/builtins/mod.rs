use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::LazyLock;

use crate::error::RuntimeError;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::value::{FunctionData, Value};
use crate::types::geom::{Circle, Line, Point, Rect};
use crate::types::kernel::Kernel;

mod collections;
mod colors;
mod geometry;
mod math;
mod surface;

/// Parameter type tags for overload matching. `Any` matches every
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Number,
    Boolean,
    Str,
    Color,
    Point,
    Rect,
    Circle,
    Line,
    Polygon,
    Kernel,
    List,
    Map,
    Function,
    Nil,
    Any,
}

impl TypeTag {
    fn matches(self, v: &Value) -> bool {
        match self {
            TypeTag::Number   => matches!(v, Value::Number(_)),
            TypeTag::Boolean  => matches!(v, Value::Bool(_)),
            TypeTag::Str      => matches!(v, Value::Str(_)),
            TypeTag::Color    => matches!(v, Value::Color(_)),
            TypeTag::Point    => matches!(v, Value::Point(_)),
            TypeTag::Rect     => matches!(v, Value::Rect(_)),
            TypeTag::Circle   => matches!(v, Value::Circle(_)),
            TypeTag::Line     => matches!(v, Value::Line(_)),
            TypeTag::Polygon  => matches!(v, Value::Polygon(_)),
            TypeTag::Kernel   => matches!(v, Value::Kernel(_)),
            TypeTag::List     => matches!(v, Value::List(_)),
            TypeTag::Map      => matches!(v, Value::Map(_)),
            TypeTag::Function => matches!(v, Value::Function(_)),
            TypeTag::Nil      => matches!(v, Value::Nil),
            TypeTag::Any      => true,
        }
    }

    fn name(self) -> &'static str {
        match self {
            TypeTag::Number   => "number",
            TypeTag::Boolean  => "boolean",
            TypeTag::Str      => "string",
            TypeTag::Color    => "color",
            TypeTag::Point    => "point",
            TypeTag::Rect     => "rect",
            TypeTag::Circle   => "circle",
            TypeTag::Line     => "line",
            TypeTag::Polygon  => "polygon",
            TypeTag::Kernel   => "kernel",
            TypeTag::List     => "list",
            TypeTag::Map      => "map",
            TypeTag::Function => "function",
            TypeTag::Nil      => "nil",
            TypeTag::Any      => "any",
        }
    }
}

pub type BuiltinFn =
    for<'a, 'b> fn(&'a mut Interpreter<'b>, &[Value], usize) -> Result<Value, RuntimeError>;

/// One callable shape of a builtin. With `variadic`, the last tag
/// matches zero or more trailing arguments.
pub struct Overload {
    pub params: &'static [TypeTag],
    pub variadic: bool,
    pub func: BuiltinFn,
}

impl Overload {
    fn matches(&self, args: &[Value]) -> bool {
        if self.variadic {
            let fixed = self.params.len() - 1;
            if args.len() < fixed {
                return false;
            }
            let tail = self.params[fixed];
            self.params[..fixed].iter().zip(args).all(|(t, v)| t.matches(v))
                && args[fixed..].iter().all(|v| tail.matches(v))
        } else {
            args.len() == self.params.len()
                && self.params.iter().zip(args).all(|(t, v)| t.matches(v))
        }
    }

    fn signature(&self, name: &str) -> String {
        let mut parts: Vec<String> =
            self.params.iter().map(|t| t.name().to_string()).collect();
        if self.variadic {
            if let Some(last) = parts.last_mut() {
                last.push_str("...");
            }
        }
        format!("{name}({})", parts.join(", "))
    }
}

/// The builtin function table: name → ordered overload list. Built
/// once per process and read-only afterwards.
pub struct Registry {
    entries: HashMap<&'static str, Vec<Overload>>,
}

impl Registry {
    fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    pub(crate) fn add(
        &mut self,
        name: &'static str,
        params: &'static [TypeTag],
        func: BuiltinFn,
    ) {
        self.entries.entry(name).or_default().push(Overload {
            params,
            variadic: false,
            func,
        });
    }

    pub(crate) fn add_variadic(
        &mut self,
        name: &'static str,
        params: &'static [TypeTag],
        func: BuiltinFn,
    ) {
        self.entries.entry(name).or_default().push(Overload {
            params,
            variadic: true,
            func,
        });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// First matching overload wins; a full miss lists every candidate
    /// signature.
    pub fn call(
        &self,
        interp: &mut Interpreter<'_>,
        name: &str,
        args: &[Value],
        line: usize,
    ) -> Result<Value, RuntimeError> {
        let Some(overloads) = self.entries.get(name) else {
            return Err(RuntimeError::new(line, format!("unknown function `{name}`")));
        };

        for overload in overloads {
            if overload.matches(args) {
                return (overload.func)(interp, args, line);
            }
        }

        let actual: Vec<&str> = args.iter().map(|v| v.type_name()).collect();
        let candidates: Vec<String> =
            overloads.iter().map(|o| o.signature(name)).collect();
        Err(RuntimeError::new(line, format!(
            "no overload of `{name}` accepts ({}); candidates: {}",
            actual.join(", "),
            candidates.join(", "),
        )))
    }
}

static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    let mut reg = Registry::new();
    math::register(&mut reg);
    colors::register(&mut reg);
    geometry::register(&mut reg);
    collections::register(&mut reg);
    surface::register(&mut reg);
    reg
});

pub fn registry() -> &'static Registry {
    &REGISTRY
}

// ─── Argument accessors ──────────────────────────────────────────────────────
//
// Overload matching already checked the tags; these exist so `Any`
// parameters and internal errors still fail loudly instead of
// panicking.

fn wrong(line: usize, i: usize, expected: &str, got: &Value) -> RuntimeError {
    RuntimeError::new(line, format!(
        "argument {} must be a {expected}, got {}", i + 1, got.type_name()))
}

pub(crate) fn num(line: usize, args: &[Value], i: usize) -> Result<f64, RuntimeError> {
    match &args[i] {
        Value::Number(n) => Ok(*n),
        other => Err(wrong(line, i, "number", other)),
    }
}

pub(crate) fn point(line: usize, args: &[Value], i: usize) -> Result<Point, RuntimeError> {
    match &args[i] {
        Value::Point(p) => Ok(*p),
        other => Err(wrong(line, i, "point", other)),
    }
}

pub(crate) fn color(
    line: usize,
    args: &[Value],
    i: usize,
) -> Result<crate::types::color::Color, RuntimeError> {
    match &args[i] {
        Value::Color(c) => Ok(*c),
        other => Err(wrong(line, i, "color", other)),
    }
}

pub(crate) fn rect(line: usize, args: &[Value], i: usize) -> Result<Rect, RuntimeError> {
    match &args[i] {
        Value::Rect(r) => Ok(*r),
        other => Err(wrong(line, i, "rect", other)),
    }
}

pub(crate) fn circle(line: usize, args: &[Value], i: usize) -> Result<Circle, RuntimeError> {
    match &args[i] {
        Value::Circle(c) => Ok(*c),
        other => Err(wrong(line, i, "circle", other)),
    }
}

pub(crate) fn line_arg(line: usize, args: &[Value], i: usize) -> Result<Line, RuntimeError> {
    match &args[i] {
        Value::Line(l) => Ok(*l),
        other => Err(wrong(line, i, "line", other)),
    }
}

pub(crate) fn kernel(
    line: usize,
    args: &[Value],
    i: usize,
) -> Result<Rc<RefCell<Kernel>>, RuntimeError> {
    match &args[i] {
        Value::Kernel(k) => Ok(Rc::clone(k)),
        other => Err(wrong(line, i, "kernel", other)),
    }
}

pub(crate) fn list(
    line: usize,
    args: &[Value],
    i: usize,
) -> Result<Rc<RefCell<Vec<Value>>>, RuntimeError> {
    match &args[i] {
        Value::List(items) => Ok(Rc::clone(items)),
        other => Err(wrong(line, i, "list", other)),
    }
}

pub(crate) fn map(
    line: usize,
    args: &[Value],
    i: usize,
) -> Result<Rc<RefCell<HashMap<crate::runtime::value::MapKey, Value>>>, RuntimeError> {
    match &args[i] {
        Value::Map(entries) => Ok(Rc::clone(entries)),
        other => Err(wrong(line, i, "map", other)),
    }
}

pub(crate) fn function(
    line: usize,
    args: &[Value],
    i: usize,
) -> Result<Rc<FunctionData>, RuntimeError> {
    match &args[i] {
        Value::Function(f) => Ok(Rc::clone(f)),
        other => Err(wrong(line, i, "function", other)),
    }
}
