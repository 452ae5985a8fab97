use super::{Registry, TypeTag, color, kernel, num, point, rect};
use crate::error::RuntimeError;
use crate::runtime::iterate::{Step, iterate};
use crate::runtime::value::Value;
use crate::surface::Channel;

pub(super) fn register(reg: &mut Registry) {
    reg.add("convolute", &[TypeTag::Point, TypeTag::Kernel], |interp, args, line| {
        let center = point(line, args, 0)?;
        let k = kernel(line, args, 1)?;
        let c = interp.surface.convolute(center, &k.borrow());
        Ok(Value::Color(c))
    });

    fetch(reg, "fetchRed", Channel::Red);
    fetch(reg, "fetchGreen", Channel::Green);
    fetch(reg, "fetchBlue", Channel::Blue);
    fetch(reg, "fetchAlpha", Channel::Alpha);

    reg.add("blt", &[TypeTag::Rect], |interp, args, line| {
        interp.surface.blt(rect(line, args, 0)?);
        Ok(Value::Nil)
    });

    reg.add("flip", &[], |interp, _, _| {
        Ok(Value::Number(interp.surface.flip() as f64))
    });

    reg.add("recall", &[TypeTag::Number], |interp, args, line| {
        let id = num(line, args, 0)?.trunc();
        if id < 0.0 || !interp.surface.recall(id as usize) {
            return Err(RuntimeError::new(line, format!("no snapshot {}", id)));
        }
        Ok(Value::Nil)
    });

    reg.add("resize", &[TypeTag::Number, TypeTag::Number], |interp, args, line| {
        let w = num(line, args, 0)?.trunc() as i32;
        let h = num(line, args, 1)?.trunc() as i32;
        interp.surface.resize(w, h);
        Ok(Value::Nil)
    });

    for shape in [TypeTag::Rect, TypeTag::Circle, TypeTag::Line, TypeTag::Polygon] {
        reg.add("plot", plot_params(shape), plot);
    }
}

fn fetch(reg: &mut Registry, name: &'static str, channel: Channel) {
    let params = &[TypeTag::Point, TypeTag::Number];
    // one fn per channel so the closure stays capture-free
    match channel {
        Channel::Red => reg.add(name, params, |interp, args, line| {
            fetch_channel(interp, args, line, Channel::Red)
        }),
        Channel::Green => reg.add(name, params, |interp, args, line| {
            fetch_channel(interp, args, line, Channel::Green)
        }),
        Channel::Blue => reg.add(name, params, |interp, args, line| {
            fetch_channel(interp, args, line, Channel::Blue)
        }),
        Channel::Alpha => reg.add(name, params, |interp, args, line| {
            fetch_channel(interp, args, line, Channel::Alpha)
        }),
    }
}

fn fetch_channel(
    interp: &mut crate::runtime::interpreter::Interpreter<'_>,
    args: &[Value],
    line: usize,
    channel: Channel,
) -> Result<Value, RuntimeError> {
    let center = point(line, args, 0)?;
    let radius = num(line, args, 1)?;
    if radius < 0.0 {
        return Err(RuntimeError::new(line, format!(
            "radius cannot be negative, got {radius}")));
    }
    let k = interp.surface.fetch(center, radius.trunc() as usize, channel);
    Ok(Value::kernel(k))
}

fn plot_params(shape: TypeTag) -> &'static [TypeTag] {
    match shape {
        TypeTag::Rect    => &[TypeTag::Rect, TypeTag::Color],
        TypeTag::Circle  => &[TypeTag::Circle, TypeTag::Color],
        TypeTag::Line    => &[TypeTag::Line, TypeTag::Color],
        TypeTag::Polygon => &[TypeTag::Polygon, TypeTag::Color],
        _ => unreachable!("plot only covers shape types"),
    }
}

/// Fills every pixel of the shape with one color.
fn plot(
    interp: &mut crate::runtime::interpreter::Interpreter<'_>,
    args: &[Value],
    line: usize,
) -> Result<Value, RuntimeError> {
    let fill = color(line, args, 1)?;
    let surface = &mut *interp.surface;
    iterate(line, &args[0], &mut |v| {
        if let Value::Point(p) = v {
            surface.set_pixel(p.x, p.y, fill);
        }
        Ok(Step::Continue)
    })?;
    Ok(Value::Nil)
}
