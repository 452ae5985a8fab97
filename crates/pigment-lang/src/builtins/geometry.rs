use std::rc::Rc;

use super::{Registry, TypeTag, list, num, point};
use crate::error::RuntimeError;
use crate::runtime::value::Value;
use crate::types::geom::{Circle, Line, Point, Rect};
use crate::types::kernel::Kernel;

const NN: &[TypeTag] = &[TypeTag::Number; 2];
const NNNN: &[TypeTag] = &[TypeTag::Number; 4];

pub(super) fn register(reg: &mut Registry) {
    reg.add("point", NN, |_, args, line| {
        Ok(Value::Point(Point::new(
            num(line, args, 0)?.trunc() as i32,
            num(line, args, 1)?.trunc() as i32,
        )))
    });

    // rect(x, y, w, h): width and height are added to the min corner
    reg.add("rect", NNNN, |_, args, line| {
        Ok(Value::Rect(Rect::from_size(
            num(line, args, 0)?.trunc() as i32,
            num(line, args, 1)?.trunc() as i32,
            num(line, args, 2)?.trunc() as i32,
            num(line, args, 3)?.trunc() as i32,
        )))
    });

    reg.add("circle", &[TypeTag::Point, TypeTag::Number], |_, args, line| {
        Ok(Value::Circle(Circle::new(point(line, args, 0)?, num(line, args, 1)?)))
    });

    reg.add("line", &[TypeTag::Point, TypeTag::Point], |_, args, line| {
        Ok(Value::Line(Line::new(point(line, args, 0)?, point(line, args, 1)?)))
    });

    reg.add("polygon", &[TypeTag::List], |_, args, line| {
        let items = list(line, args, 0)?;
        let mut vertices = Vec::with_capacity(items.borrow().len());
        for item in items.borrow().iter() {
            match item {
                Value::Point(p) => vertices.push(*p),
                other => {
                    return Err(RuntimeError::new(line, format!(
                        "polygon vertices must be points, got {}", other.type_name())));
                }
            }
        }
        drop_closing_vertex(&mut vertices);
        Ok(Value::Polygon(Rc::new(vertices)))
    });

    // at least three vertices, any number more
    reg.add_variadic("polygon", &[TypeTag::Point; 4], |_, args, line| {
        let mut vertices = Vec::with_capacity(args.len());
        for i in 0..args.len() {
            vertices.push(point(line, args, i)?);
        }
        drop_closing_vertex(&mut vertices);
        Ok(Value::Polygon(Rc::new(vertices)))
    });

    // kernel(n): an n×n zero kernel; kernel(w, h, fill) for any shape
    reg.add("kernel", &[TypeTag::Number], |_, args, line| {
        let side = size(line, args, 0)?;
        Ok(Value::kernel(Kernel::filled(side, side, 0.0)))
    });

    reg.add("kernel", &[TypeTag::Number, TypeTag::Number, TypeTag::Number], |_, args, line| {
        let w = size(line, args, 0)?;
        let h = size(line, args, 1)?;
        Ok(Value::kernel(Kernel::filled(w, h, num(line, args, 2)?)))
    });

    // list(n): n nils; list(n, fill) repeats any value
    reg.add("list", &[TypeTag::Number], |_, args, line| {
        Ok(Value::list(vec![Value::Nil; size(line, args, 0)?]))
    });

    reg.add("list", &[TypeTag::Number, TypeTag::Any], |_, args, line| {
        Ok(Value::list(vec![args[1].clone(); size(line, args, 0)?]))
    });
}

/// A ring that repeats its first vertex at the end is implicitly
/// closed; the duplicate is not a vertex.
fn drop_closing_vertex(vertices: &mut Vec<Point>) {
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
}

fn size(line: usize, args: &[Value], i: usize) -> Result<usize, RuntimeError> {
    let v = num(line, args, i)?;
    if v < 0.0 {
        return Err(RuntimeError::new(line, format!(
            "size cannot be negative, got {v}")));
    }
    Ok(v.trunc() as usize)
}
