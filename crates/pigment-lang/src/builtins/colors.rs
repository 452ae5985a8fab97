use std::collections::HashMap;

use super::{Registry, TypeTag, color, map, num};
use crate::error::RuntimeError;
use crate::runtime::value::{MapKey, Value};
use crate::types::color::Color;

const NNN: &[TypeTag] = &[TypeTag::Number; 3];
const NNNN: &[TypeTag] = &[TypeTag::Number; 4];

pub(super) fn register(reg: &mut Registry) {
    reg.add("rgb", NNN, |_, args, line| {
        Ok(Value::Color(Color::opaque(
            num(line, args, 0)?,
            num(line, args, 1)?,
            num(line, args, 2)?,
        )))
    });

    // rgb(map) converts an {h, s, v} map back into a color
    reg.add("rgb", &[TypeTag::Map], |_, args, line| {
        let entries = map(line, args, 0)?;
        let entries = entries.borrow();
        let channel = |name: &str| -> Result<f64, RuntimeError> {
            match entries.get(&MapKey::Str(name.to_string())) {
                Some(Value::Number(n)) => Ok(*n),
                _ => Err(RuntimeError::new(line, format!(
                    "rgb(map) needs a numeric `{name}` entry"))),
            }
        };
        let (h, s, v) = (channel("h")?, channel("s")?, channel("v")?);
        Ok(Value::Color(hsv_to_rgb(h, s, v)))
    });

    reg.add("rgba", NNNN, |_, args, line| {
        Ok(Value::Color(Color::new(
            num(line, args, 0)?,
            num(line, args, 1)?,
            num(line, args, 2)?,
            num(line, args, 3)?,
        )))
    });

    // rgb01 takes channels in 0..1
    reg.add("rgb01", NNN, |_, args, line| {
        Ok(Value::Color(Color::opaque(
            num(line, args, 0)? * 255.0,
            num(line, args, 1)? * 255.0,
            num(line, args, 2)? * 255.0,
        )))
    });

    reg.add("hsv", NNN, |_, args, line| {
        Ok(hsv_map(
            num(line, args, 0)?,
            num(line, args, 1)?,
            num(line, args, 2)?,
        ))
    });

    reg.add("hsv", &[TypeTag::Color], |_, args, line| {
        let c = color(line, args, 0)?;
        let (h, s, v) = rgb_to_hsv(c);
        Ok(hsv_map(h, s, v))
    });

    reg.add("clamp", &[TypeTag::Color], |_, args, line| {
        Ok(Value::Color(color(line, args, 0)?.clamp()))
    });
}

fn hsv_map(h: f64, s: f64, v: f64) -> Value {
    let mut entries = HashMap::new();
    entries.insert(MapKey::Str("h".into()), Value::Number(h));
    entries.insert(MapKey::Str("s".into()), Value::Number(s));
    entries.insert(MapKey::Str("v".into()), Value::Number(v));
    Value::map(entries)
}

/// Hue in degrees, saturation and value in 0..1, channels in 0..255.
fn hsv_to_rgb(h: f64, s: f64, v: f64) -> Color {
    let h = h.rem_euclid(360.0);
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h {
        h if h < 60.0  => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _              => (c, 0.0, x),
    };
    Color::opaque((r + m) * 255.0, (g + m) * 255.0, (b + m) * 255.0)
}

fn rgb_to_hsv(c: Color) -> (f64, f64, f64) {
    let r = c.r / 255.0;
    let g = c.g / 255.0;
    let b = c.b / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };
    (h, s, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsv_round_trip_primaries() {
        for c in [
            Color::opaque(255.0, 0.0, 0.0),
            Color::opaque(0.0, 255.0, 0.0),
            Color::opaque(0.0, 0.0, 255.0),
            Color::opaque(128.0, 64.0, 32.0),
        ] {
            let (h, s, v) = rgb_to_hsv(c);
            let back = hsv_to_rgb(h, s, v);
            assert!((back.r - c.r).abs() < 0.5, "r for {c}");
            assert!((back.g - c.g).abs() < 0.5, "g for {c}");
            assert!((back.b - c.b).abs() < 0.5, "b for {c}");
        }
    }

    #[test]
    fn pure_red_hue_is_zero() {
        let (h, s, v) = rgb_to_hsv(Color::opaque(255.0, 0.0, 0.0));
        assert_eq!((h, s, v), (0.0, 1.0, 1.0));
    }

    #[test]
    fn grey_has_zero_saturation() {
        let (_, s, _) = rgb_to_hsv(Color::opaque(100.0, 100.0, 100.0));
        assert_eq!(s, 0.0);
    }
}
