use std::fmt;

/// An RGBA color. Channels are nominally 0..255 but are not clamped —
/// arithmetic may push them outside that range, and `clamp` brings them
/// back. Alpha defaults to 255 (opaque).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 255.0 };
pub const WHITE: Color = Color { r: 255.0, g: 255.0, b: 255.0, a: 255.0 };
pub const TRANSPARENT: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };

impl Color {
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn opaque(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 255.0 }
    }

    /// Parses the digit portion of a color literal: `"ff0000"` or
    /// `"ff0000ee"`. The lexer guarantees the digits are valid hex.
    pub fn from_hex(digits: &str) -> Self {
        let byte = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16).unwrap_or(0) as f64
        };
        let a = if digits.len() == 8 { byte(6) } else { 255.0 };
        Self { r: byte(0), g: byte(2), b: byte(4), a }
    }

    /// Rounds and clamps every channel to 0..255.
    pub fn clamp(&self) -> Self {
        let c = |v: f64| v.round().clamp(0.0, 255.0);
        Self { r: c(self.r), g: c(self.g), b: c(self.b), a: c(self.a) }
    }

    pub fn channel_byte(v: f64) -> u8 {
        v.round().clamp(0.0, 255.0) as u8
    }
}

impl fmt::Display for Color {
    /// `#RRGGBB`, with `:AA` appended when the color is not opaque.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = Color::channel_byte(self.r);
        let g = Color::channel_byte(self.g);
        let b = Color::channel_byte(self.b);
        let a = Color::channel_byte(self.a);
        if a == 255 {
            write!(f, "#{r:02x}{g:02x}{b:02x}")
        } else {
            write!(f, "#{r:02x}{g:02x}{b:02x}:{a:02x}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hex_opaque() {
        let c = Color::from_hex("ff8000");
        assert_eq!((c.r, c.g, c.b, c.a), (255.0, 128.0, 0.0, 255.0));
    }

    #[test]
    fn from_hex_with_alpha() {
        let c = Color::from_hex("0000ff80");
        assert_eq!((c.b, c.a), (255.0, 128.0));
    }

    #[test]
    fn display_round_trips() {
        assert_eq!(Color::from_hex("ff8000").to_string(), "#ff8000");
        assert_eq!(Color::from_hex("0000ff80").to_string(), "#0000ff:80");
    }

    #[test]
    fn clamp_bounds_channels() {
        let c = Color::new(300.0, -20.0, 128.4, 255.0).clamp();
        assert_eq!((c.r, c.g, c.b), (255.0, 0.0, 128.0));
    }

    #[test]
    fn display_clamps_out_of_range() {
        let c = Color::new(300.0, -5.0, 0.0, 255.0);
        assert_eq!(c.to_string(), "#ff0000");
    }
}
