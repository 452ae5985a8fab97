use std::fmt;

/// A convolution kernel: a rectangular grid of weights. Literals are
/// always square, but the `kernel(w, h, fill)` builtin can make any
/// shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f64>,
}

impl Kernel {
    pub fn new(width: usize, height: usize, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), width * height);
        Self { width, height, values }
    }

    /// A square kernel from literal weights. The parser guarantees the
    /// count is a perfect square.
    pub fn square(values: Vec<f64>) -> Self {
        let side = (values.len() as f64).sqrt() as usize;
        Self { width: side, height: side, values }
    }

    pub fn filled(width: usize, height: usize, fill: f64) -> Self {
        Self { width, height, values: vec![fill; width * height] }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }
}

impl fmt::Display for Kernel {
    /// `|a b c d|` — the same shape a literal is written in.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            if v.fract() == 0.0 {
                write!(f, "{}", *v as i64)?;
            } else {
                write!(f, "{v}")?;
            }
        }
        write!(f, "|")
    }
}
