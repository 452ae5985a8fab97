use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::builtins;
use crate::error::RuntimeError;
use crate::runtime::iterate::{Step, iterate};
use crate::runtime::ops;
use crate::runtime::value::{FunctionData, MapKey, Value};
use crate::surface::Surface;
use crate::syntax::ast::*;
use crate::types::color;
use crate::types::color::Color;
use crate::types::geom::{Point, Rect};
use crate::types::kernel::Kernel;

/// The result of executing a statement: either fall through to the
/// next one, or unwind to the nearest function boundary. Return is a
/// control signal, never an error — a genuine evaluation error must
/// not be swallowed by the unwind path.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Return(Value),
}

type Frame = Rc<RefCell<HashMap<String, Value>>>;

pub struct Interpreter<'a> {
    /// Scope frames, innermost last. Frame 0 holds constants, frame 1
    /// is the script's top level.
    scopes: Vec<Frame>,
    pub surface: &'a mut dyn Surface,
    output: Vec<String>,
}

/// Runs a compiled program against a surface and returns its log
/// lines.
pub fn run(program: &Program, surface: &mut dyn Surface) -> Result<Vec<String>, RuntimeError> {
    let mut interp = Interpreter::new(surface);
    for stmt in &program.stmts {
        match interp.exec_stmt(stmt)? {
            Flow::Normal => {}
            Flow::Return(Value::Nil) => break,
            Flow::Return(v) => {
                return Err(RuntimeError::new(stmt_line(stmt), format!(
                    "cannot return a {} from the top level", v.type_name())));
            }
        }
    }
    Ok(interp.output)
}

fn stmt_line(stmt: &Stmt) -> usize {
    match stmt {
        Stmt::Decl { span, .. }
        | Stmt::Assign { span, .. }
        | Stmt::IndexAssign { span, .. }
        | Stmt::PixelAssign { span, .. }
        | Stmt::Log { span, .. } => span.line,
        Stmt::Invoke(e) => e.span().line,
        Stmt::If(s) => s.span.line,
        Stmt::ForIn(s) => s.span.line,
        Stmt::ForRange(s) => s.span.line,
        Stmt::While(s) => s.span.line,
        Stmt::Return(_, span) | Stmt::Yield(span) => span.line,
    }
}

impl<'a> Interpreter<'a> {
    fn new(surface: &'a mut dyn Surface) -> Self {
        let w = surface.source_width();
        let h = surface.source_height();

        let mut constants = HashMap::new();
        constants.insert("Black".into(), Value::Color(color::BLACK));
        constants.insert("White".into(), Value::Color(color::WHITE));
        constants.insert("Transparent".into(), Value::Color(color::TRANSPARENT));
        constants.insert("Pi".into(), Value::Number(std::f64::consts::PI));
        constants.insert("Rad2Deg".into(), Value::Number(180.0 / std::f64::consts::PI));
        constants.insert("Deg2Rad".into(), Value::Number(std::f64::consts::PI / 180.0));
        constants.insert("W".into(), Value::Number(w as f64));
        constants.insert("H".into(), Value::Number(h as f64));
        constants.insert("Bounds".into(), Value::Rect(Rect::from_size(0, 0, w, h)));

        Self {
            scopes: vec![
                Rc::new(RefCell::new(constants)),
                Rc::new(RefCell::new(HashMap::new())),
            ],
            surface,
            output: Vec::new(),
        }
    }

    // ─── Scopes ──────────────────────────────────────────────────────────────

    fn declare(&mut self, name: &str, value: Value) {
        if let Some(frame) = self.scopes.last() {
            frame.borrow_mut().insert(name.to_string(), value);
        }
    }

    fn assign(&mut self, line: usize, name: &str, value: Value) -> Result<(), RuntimeError> {
        for frame in self.scopes.iter().rev() {
            let mut frame = frame.borrow_mut();
            if let Some(slot) = frame.get_mut(name) {
                *slot = value;
                return Ok(());
            }
        }
        Err(RuntimeError::new(line, format!(
            "cannot assign to undeclared variable `{name}`")))
    }

    fn lookup(&self, line: usize, name: &str) -> Result<Value, RuntimeError> {
        for frame in self.scopes.iter().rev() {
            if let Some(v) = frame.borrow().get(name) {
                return Ok(v.clone());
            }
        }
        Err(RuntimeError::new(line, format!("undefined identifier `{name}`")))
    }

    fn push_frame(&mut self) {
        self.scopes.push(Rc::new(RefCell::new(HashMap::new())));
    }

    fn pop_frame(&mut self) {
        self.scopes.pop();
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    fn exec_block(&mut self, stmts: &[Stmt]) -> Result<Flow, RuntimeError> {
        self.push_frame();
        let result = self.exec_stmts(stmts);
        self.pop_frame();
        result
    }

    fn exec_stmts(&mut self, stmts: &[Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                ret => return Ok(ret),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Decl { name, value, .. } => {
                let value = self.eval_expr(value)?;
                self.declare(name, value);
                Ok(Flow::Normal)
            }

            Stmt::Assign { name, value, span } => {
                let value = self.eval_expr(value)?;
                self.assign(span.line, name, value)?;
                Ok(Flow::Normal)
            }

            Stmt::IndexAssign { object, index, value, span } => {
                let object = self.eval_expr(object)?;
                let index = self.eval_expr(index)?;
                let value = self.eval_expr(value)?;
                ops::index_assign(span.line, &object, &index, value)?;
                Ok(Flow::Normal)
            }

            Stmt::PixelAssign { pos, value, span } => {
                let pos = self.eval_point(pos, span.line, "pixel write position")?;
                let value = self.eval_expr(value)?;
                let Value::Color(c) = value else {
                    return Err(RuntimeError::new(span.line, format!(
                        "pixel write needs a color, got {}", value.type_name())));
                };
                self.surface.set_pixel(pos.x, pos.y, c);
                Ok(Flow::Normal)
            }

            Stmt::Invoke(expr) => {
                self.eval_expr(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::If(s) => {
                if self.eval_bool(&s.condition)? {
                    self.exec_block(&s.then_block)
                } else if let Some(else_block) = &s.else_block {
                    self.exec_block(else_block)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While(s) => {
                while self.eval_bool(&s.condition)? {
                    match self.exec_block(&s.body)? {
                        Flow::Normal => {}
                        ret => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::ForIn(s) => self.exec_for_in(s),
            Stmt::ForRange(s) => self.exec_for_range(s),

            Stmt::Log { args, .. } => {
                let mut line = String::new();
                for arg in args {
                    line.push_str(&self.eval_expr(arg)?.to_string());
                }
                self.output.push(line);
                Ok(Flow::Normal)
            }

            Stmt::Return(value, _) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }

            Stmt::Yield(span) => Err(RuntimeError::new(span.line,
                "`yield` is reserved and cannot be executed")),
        }
    }

    fn exec_for_in(&mut self, s: &ForInStmt) -> Result<Flow, RuntimeError> {
        let iterable = self.eval_expr(&s.iterable)?;

        // iterating a rect retargets the Bounds constant
        if let Value::Rect(r) = &iterable {
            self.scopes[0].borrow_mut().insert("Bounds".into(), Value::Rect(*r));
        }

        self.push_frame();
        let mut pending = Flow::Normal;
        let result = iterate(s.span.line, &iterable, &mut |item| {
            self.declare(&s.var, item);
            match self.exec_block(&s.body)? {
                Flow::Normal => Ok(Step::Continue),
                ret => {
                    pending = ret;
                    Ok(Step::Stop)
                }
            }
        });
        self.pop_frame();
        result?;
        Ok(pending)
    }

    /// `lo..hi` is half-open; the step defaults to 1 and may be
    /// negative, in which case the loop counts down.
    fn exec_for_range(&mut self, s: &ForRangeStmt) -> Result<Flow, RuntimeError> {
        let line = s.span.line;
        let lower = self.eval_number(&s.lower, line, "range lower bound")?;
        let upper = self.eval_number(&s.upper, line, "range upper bound")?;
        let step = match &s.step {
            Some(expr) => self.eval_number(expr, line, "range step")?,
            None => 1.0,
        };
        if step == 0.0 {
            return Err(RuntimeError::new(line, "range step cannot be zero"));
        }

        self.push_frame();
        let mut v = lower;
        let mut pending = Flow::Normal;
        while if step > 0.0 { v < upper } else { v > upper } {
            self.declare(&s.var, Value::Number(v));
            match self.exec_block(&s.body) {
                Ok(Flow::Normal) => {}
                Ok(ret) => {
                    pending = ret;
                    break;
                }
                Err(e) => {
                    self.pop_frame();
                    return Err(e);
                }
            }
            v += step;
        }
        self.pop_frame();
        Ok(pending)
    }

    // ─── Expressions ─────────────────────────────────────────────────────────

    fn eval_bool(&mut self, expr: &Expr) -> Result<bool, RuntimeError> {
        match self.eval_expr(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeError::new(expr.span().line, format!(
                "condition must be a boolean, got {}", other.type_name()))),
        }
    }

    fn eval_number(&mut self, expr: &Expr, line: usize, what: &str) -> Result<f64, RuntimeError> {
        match self.eval_expr(expr)? {
            Value::Number(n) => Ok(n),
            other => Err(RuntimeError::new(line, format!(
                "{what} must be a number, got {}", other.type_name()))),
        }
    }

    fn eval_point(&mut self, expr: &Expr, line: usize, what: &str) -> Result<Point, RuntimeError> {
        match self.eval_expr(expr)? {
            Value::Point(p) => Ok(p),
            other => Err(RuntimeError::new(line, format!(
                "{what} must be a point, got {}", other.type_name()))),
        }
    }

    pub fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Number(v, _)   => Ok(Value::Number(*v)),
            Expr::Bool(v, _)     => Ok(Value::Bool(*v)),
            Expr::Str(s, _)      => Ok(Value::Str(s.clone())),
            Expr::ColorLit(s, _) => Ok(Value::Color(Color::from_hex(s))),
            Expr::Nil(_)         => Ok(Value::Nil),
            Expr::Ident(name, span) => self.lookup(span.line, name),

            Expr::Binary { op, left, right, span } => self.eval_binary(*op, left, right, span),

            Expr::Unary { op, operand, span } => {
                let v = self.eval_expr(operand)?;
                match op {
                    UnOp::Neg => ops::neg(span.line, &v),
                    UnOp::Not => ops::not(span.line, &v),
                }
            }

            Expr::Ternary { condition, then_expr, else_expr, .. } => {
                if self.eval_bool(condition)? {
                    self.eval_expr(then_expr)
                } else {
                    self.eval_expr(else_expr)
                }
            }

            Expr::Tuple { x, y, span } => {
                let x = self.eval_number(x, span.line, "point x")?;
                let y = self.eval_number(y, span.line, "point y")?;
                Ok(Value::Point(Point::new(x.trunc() as i32, y.trunc() as i32)))
            }

            Expr::Pipeline { left, right, .. } => {
                let value = self.eval_expr(left)?;
                self.push_frame();
                self.declare("$", value);
                let result = self.eval_expr(right);
                self.pop_frame();
                result
            }

            Expr::Member { expr, member, span } => {
                let v = self.eval_expr(expr)?;
                ops::property(span.line, &v, member)
            }

            Expr::Index { expr, index, span } => {
                let v = self.eval_expr(expr)?;
                let i = self.eval_expr(index)?;
                ops::index(span.line, &v, &i)
            }

            Expr::IndexRange { expr, lower, upper, span } => {
                let v = self.eval_expr(expr)?;
                let lo = self.eval_expr(lower)?;
                let hi = self.eval_expr(upper)?;
                ops::index_range(span.line, &v, &lo, &hi)
            }

            Expr::PixelRead { pos, span } => {
                let p = self.eval_point(pos, span.line, "pixel read position")?;
                Ok(Value::Color(self.surface.pixel(p.x, p.y)))
            }

            Expr::Call { callee, args, span } => self.eval_call(callee, args, span),

            Expr::KernelLit(values, _) => Ok(Value::kernel(Kernel::square(values.clone()))),

            Expr::ListLit(items, _) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item)?);
                }
                Ok(Value::list(values))
            }

            Expr::MapLit(entries, span) => {
                let mut map = HashMap::with_capacity(entries.len());
                for (key_expr, value_expr) in entries {
                    let key = self.eval_expr(key_expr)?;
                    let key = MapKey::from_value(&key).ok_or_else(|| {
                        RuntimeError::new(span.line, format!(
                            "{} cannot be a map key", key.type_name()))
                    })?;
                    let value = self.eval_expr(value_expr)?;
                    map.insert(key, value);
                }
                Ok(Value::map(map))
            }

            Expr::FnLit { params, body, .. } => {
                // capture frames above constants and script top level:
                // those two stay dynamically shared, everything in
                // between is snapshotted at definition time
                let captured = self.scopes[2.min(self.scopes.len())..]
                    .iter()
                    .map(|frame| frame.borrow().clone())
                    .collect();
                Ok(Value::Function(Rc::new(FunctionData {
                    params: params.clone(),
                    body: body.clone(),
                    captured,
                })))
            }
        }
    }

    fn eval_binary(
        &mut self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        span: &Span,
    ) -> Result<Value, RuntimeError> {
        // short-circuit forms first; both sides must be boolean
        match op {
            BinOp::Or => {
                if self.eval_bool(left)? {
                    return Ok(Value::Bool(true));
                }
                return Ok(Value::Bool(self.eval_bool(right)?));
            }
            BinOp::And => {
                if !self.eval_bool(left)? {
                    return Ok(Value::Bool(false));
                }
                return Ok(Value::Bool(self.eval_bool(right)?));
            }
            _ => {}
        }

        let line = span.line;
        let a = self.eval_expr(left)?;
        let b = self.eval_expr(right)?;

        match op {
            BinOp::Add => ops::add(line, &a, &b),
            BinOp::Sub => ops::sub(line, &a, &b),
            BinOp::Mul => ops::mul(line, &a, &b),
            BinOp::Div => ops::div(line, &a, &b),
            BinOp::Mod => ops::rem(line, &a, &b),
            BinOp::In  => ops::contains(line, &a, &b),
            BinOp::Concat => ops::concat(line, &a, &b),

            BinOp::Eq    => Ok(Value::Bool(ops::compare(&a, &b) == Some(0.0))),
            BinOp::NotEq => Ok(Value::Bool(ops::compare(&a, &b) != Some(0.0))),

            BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => {
                let Some(ord) = ops::compare(&a, &b) else {
                    return Err(RuntimeError::new(line, format!(
                        "cannot order {} and {}", a.type_name(), b.type_name())));
                };
                Ok(Value::Bool(match op {
                    BinOp::Lt   => ord < 0.0,
                    BinOp::LtEq => ord <= 0.0,
                    BinOp::Gt   => ord > 0.0,
                    _           => ord >= 0.0,
                }))
            }

            BinOp::Or | BinOp::And => unreachable!("handled above"),
        }
    }

    // ─── Calls ───────────────────────────────────────────────────────────────

    fn eval_call(
        &mut self,
        callee: &str,
        args: &[Expr],
        span: &Span,
    ) -> Result<Value, RuntimeError> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg)?);
        }

        // builtins shadow user bindings; an argument mismatch against
        // a known builtin reports its candidates instead of falling
        // through
        if builtins::registry().contains(callee) {
            return builtins::registry().call(self, callee, &values, span.line);
        }

        match self.lookup(span.line, callee)? {
            Value::Function(func) => self.call_function(span.line, &func, &values),
            other => Err(RuntimeError::new(span.line, format!(
                "`{callee}` is a {}, not a function", other.type_name()))),
        }
    }

    /// Invokes a user function: the constants and script-top frames
    /// stay shared, the captured frames are replayed as snapshots, and
    /// the arguments land in a fresh frame on top.
    pub fn call_function(
        &mut self,
        line: usize,
        func: &FunctionData,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        if args.len() != func.params.len() {
            return Err(RuntimeError::new(line, format!(
                "function takes {} argument(s), got {}", func.params.len(), args.len())));
        }

        let mut frames: Vec<Frame> = Vec::with_capacity(func.captured.len() + 3);
        frames.push(Rc::clone(&self.scopes[0]));
        if self.scopes.len() > 1 {
            frames.push(Rc::clone(&self.scopes[1]));
        }
        for captured in &func.captured {
            frames.push(Rc::new(RefCell::new(captured.clone())));
        }
        let mut params = HashMap::with_capacity(args.len());
        for (name, value) in func.params.iter().zip(args) {
            params.insert(name.clone(), value.clone());
        }
        frames.push(Rc::new(RefCell::new(params)));

        let saved = std::mem::replace(&mut self.scopes, frames);
        let result = self.exec_stmts(&func.body);
        self.scopes = saved;

        match result? {
            Flow::Return(v) => Ok(v),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}
