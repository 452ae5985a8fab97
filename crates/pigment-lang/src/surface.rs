use crate::types::color::{Color, TRANSPARENT};
use crate::types::geom::{Point, Rect};
use crate::types::kernel::Kernel;

/// A single color channel, used by the `fetch*` sampling primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
    Alpha,
}

impl Channel {
    fn of(self, c: Color) -> f64 {
        match self {
            Channel::Red   => c.r,
            Channel::Green => c.g,
            Channel::Blue  => c.b,
            Channel::Alpha => c.a,
        }
    }
}

/// The host-side raster a script runs against. Reads come from the
/// source image, writes go to a separate target image; `flip` promotes
/// the target to become the next source.
pub trait Surface {
    fn source_width(&self) -> i32;
    fn source_height(&self) -> i32;
    fn target_width(&self) -> i32;
    fn target_height(&self) -> i32;

    /// Reads a source pixel. Out-of-bounds coordinates clamp to the
    /// nearest edge pixel.
    fn pixel(&self, x: i32, y: i32) -> Color;

    /// Writes a target pixel. Writes outside the target bounds or the
    /// clip rectangle are dropped.
    fn set_pixel(&mut self, x: i32, y: i32, color: Color);

    fn clip(&self) -> Option<Rect>;
    fn set_clip(&mut self, clip: Option<Rect>);

    /// Copies a sub-rectangle of the source into the target at the
    /// same coordinates.
    fn blt(&mut self, rect: Rect);

    /// Resizes the target buffer in place, nearest-neighbour.
    fn resize(&mut self, width: i32, height: i32);

    /// Snapshots the current source, promotes the target to source and
    /// allocates a fresh target. Returns the snapshot id.
    fn flip(&mut self) -> usize;

    /// Restores a previous snapshot as the source with a fresh target.
    /// Returns false when the id is unknown.
    fn recall(&mut self, id: usize) -> bool;

    /// Convolves `kernel` around `center` against the source and
    /// returns the weighted average. A zero weight sum degrades to the
    /// plain weighted sum rather than dividing by zero.
    fn convolute(&self, center: Point, kernel: &Kernel) -> Color {
        let (mut r, mut g, mut b, mut a) = (0.0, 0.0, 0.0, 0.0);
        let half_w = (kernel.width / 2) as i32;
        let half_h = (kernel.height / 2) as i32;

        for ky in 0..kernel.height {
            for kx in 0..kernel.width {
                let w = kernel.values[ky * kernel.width + kx];
                let x = center.x + kx as i32 - half_w;
                let y = center.y + ky as i32 - half_h;
                let c = self.pixel(x, y);
                r += w * c.r;
                g += w * c.g;
                b += w * c.b;
                a += w * c.a;
            }
        }

        let sum = kernel.sum();
        if sum != 0.0 {
            Color::new(r / sum, g / sum, b / sum, a / sum)
        } else {
            Color::new(r, g, b, a)
        }
    }

    /// Samples one channel of the `(2r+1)²` neighbourhood around
    /// `center` into a kernel-shaped array.
    fn fetch(&self, center: Point, radius: usize, channel: Channel) -> Kernel {
        let side = 2 * radius + 1;
        let mut values = Vec::with_capacity(side * side);
        let r = radius as i32;
        for dy in -r..=r {
            for dx in -r..=r {
                let c = self.pixel(center.x + dx, center.y + dy);
                values.push(channel.of(c));
            }
        }
        Kernel::new(side, side, values)
    }
}

// ─── In-memory raster ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Buffer {
    width: i32,
    height: i32,
    pixels: Vec<Color>,
}

impl Buffer {
    fn filled(width: i32, height: i32, color: Color) -> Self {
        let n = (width.max(0) * height.max(0)) as usize;
        Self { width, height, pixels: vec![color; n] }
    }

    fn get_clamped(&self, x: i32, y: i32) -> Color {
        if self.pixels.is_empty() {
            return TRANSPARENT;
        }
        let x = x.clamp(0, self.width - 1);
        let y = y.clamp(0, self.height - 1);
        self.pixels[(y * self.width + x) as usize]
    }

    fn set(&mut self, x: i32, y: i32, color: Color) {
        if x >= 0 && x < self.width && y >= 0 && y < self.height {
            self.pixels[(y * self.width + x) as usize] = color;
        }
    }
}

/// A plain in-memory [`Surface`]: two same-shaped buffers plus the
/// snapshot list behind `flip`/`recall`.
#[derive(Debug, Clone)]
pub struct Raster {
    source: Buffer,
    target: Buffer,
    snapshots: Vec<Buffer>,
    clip: Option<Rect>,
}

impl Raster {
    /// A blank raster: transparent source and target of the same size.
    pub fn blank(width: i32, height: i32) -> Self {
        Self {
            source: Buffer::filled(width, height, TRANSPARENT),
            target: Buffer::filled(width, height, TRANSPARENT),
            snapshots: Vec::new(),
            clip: None,
        }
    }

    /// Builds the source from row-major pixel data; the target starts
    /// blank at the same size.
    pub fn from_pixels(width: i32, height: i32, pixels: Vec<Color>) -> Self {
        Self {
            source: Buffer { width, height, pixels },
            target: Buffer::filled(width, height, TRANSPARENT),
            snapshots: Vec::new(),
            clip: None,
        }
    }

    /// Reads a pixel from the target, mostly useful to inspect what a
    /// script drew.
    pub fn target_pixel(&self, x: i32, y: i32) -> Color {
        self.target.get_clamped(x, y)
    }
}

impl Surface for Raster {
    fn source_width(&self) -> i32 {
        self.source.width
    }

    fn source_height(&self) -> i32 {
        self.source.height
    }

    fn target_width(&self) -> i32 {
        self.target.width
    }

    fn target_height(&self) -> i32 {
        self.target.height
    }

    fn pixel(&self, x: i32, y: i32) -> Color {
        self.source.get_clamped(x, y)
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(clip) = self.clip {
            if !clip.contains(Point::new(x, y)) {
                return;
            }
        }
        self.target.set(x, y, color);
    }

    fn clip(&self) -> Option<Rect> {
        self.clip
    }

    fn set_clip(&mut self, clip: Option<Rect>) {
        self.clip = clip;
    }

    fn blt(&mut self, rect: Rect) {
        for y in rect.min.y..rect.max.y {
            for x in rect.min.x..rect.max.x {
                let c = self.source.get_clamped(x, y);
                self.set_pixel(x, y, c);
            }
        }
    }

    fn resize(&mut self, width: i32, height: i32) {
        let mut next = Buffer::filled(width, height, TRANSPARENT);
        if width > 0 && height > 0 && !self.target.pixels.is_empty() {
            for y in 0..height {
                for x in 0..width {
                    let sx = (x as i64 * self.target.width as i64 / width as i64) as i32;
                    let sy = (y as i64 * self.target.height as i64 / height as i64) as i32;
                    let c = self.target.get_clamped(sx, sy);
                    next.set(x, y, c);
                }
            }
        }
        self.target = next;
    }

    fn flip(&mut self) -> usize {
        let id = self.snapshots.len();
        let promoted = std::mem::replace(
            &mut self.target,
            Buffer::filled(0, 0, TRANSPARENT),
        );
        let retired = std::mem::replace(&mut self.source, promoted);
        self.snapshots.push(retired);
        self.target = Buffer::filled(self.source.width, self.source.height, TRANSPARENT);
        id
    }

    fn recall(&mut self, id: usize) -> bool {
        let Some(snapshot) = self.snapshots.get(id) else {
            return false;
        };
        self.source = snapshot.clone();
        self.target = Buffer::filled(self.source.width, self.source.height, TRANSPARENT);
        true
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::color::{BLACK, WHITE};

    #[test]
    fn reads_clamp_to_edges() {
        let mut pixels = vec![BLACK; 4];
        pixels[0] = WHITE; // (0,0)
        let r = Raster::from_pixels(2, 2, pixels);
        assert_eq!(r.pixel(-5, -5), WHITE);
        assert_eq!(r.pixel(10, 10), BLACK);
    }

    #[test]
    fn writes_outside_target_are_dropped() {
        let mut r = Raster::blank(2, 2);
        r.set_pixel(5, 5, WHITE);
        assert_eq!(r.target_pixel(1, 1), TRANSPARENT);
    }

    #[test]
    fn clip_limits_writes() {
        let mut r = Raster::blank(4, 4);
        r.set_clip(Some(Rect::from_size(0, 0, 2, 2)));
        r.set_pixel(1, 1, WHITE);
        r.set_pixel(3, 3, WHITE);
        assert_eq!(r.target_pixel(1, 1), WHITE);
        assert_eq!(r.target_pixel(3, 3), TRANSPARENT);
    }

    #[test]
    fn convolute_identity_kernel() {
        let pixels = vec![
            WHITE, BLACK, BLACK,
            BLACK, WHITE, BLACK,
            BLACK, BLACK, BLACK,
        ];
        let r = Raster::from_pixels(3, 3, pixels);
        let k = Kernel::square(vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(r.convolute(Point::new(1, 1), &k), WHITE);
    }

    #[test]
    fn convolute_averages_by_weight_sum() {
        let r = Raster::from_pixels(2, 2, vec![WHITE, WHITE, WHITE, WHITE]);
        let k = Kernel::square(vec![1.0, 1.0, 1.0, 1.0]);
        let c = r.convolute(Point::new(0, 0), &k);
        assert_eq!(c.r, 255.0);
    }

    #[test]
    fn convolute_zero_sum_is_plain_sum() {
        let r = Raster::from_pixels(2, 2, vec![WHITE, WHITE, WHITE, WHITE]);
        let k = Kernel::square(vec![1.0, -1.0, 1.0, -1.0]);
        let c = r.convolute(Point::new(0, 0), &k);
        assert_eq!(c.r, 0.0);
    }

    #[test]
    fn fetch_returns_neighbourhood_channel() {
        let r = Raster::from_pixels(3, 3, vec![WHITE; 9]);
        let k = r.fetch(Point::new(1, 1), 1, Channel::Red);
        assert_eq!((k.width, k.height), (3, 3));
        assert!(k.values.iter().all(|&v| v == 255.0));
    }

    #[test]
    fn flip_promotes_target() {
        let mut r = Raster::blank(2, 2);
        r.set_pixel(0, 0, WHITE);
        let id = r.flip();
        assert_eq!(id, 0);
        assert_eq!(r.pixel(0, 0), WHITE);
        assert_eq!(r.target_pixel(0, 0), TRANSPARENT);
    }

    #[test]
    fn recall_restores_snapshot() {
        let mut r = Raster::from_pixels(1, 1, vec![WHITE]);
        r.flip(); // snapshot 0 = the white source
        assert_eq!(r.pixel(0, 0), TRANSPARENT);
        assert!(r.recall(0));
        assert_eq!(r.pixel(0, 0), WHITE);
        assert!(!r.recall(7));
    }

    #[test]
    fn blt_copies_region() {
        let mut r = Raster::from_pixels(2, 2, vec![WHITE, BLACK, BLACK, WHITE]);
        r.blt(Rect::from_size(0, 0, 1, 1));
        assert_eq!(r.target_pixel(0, 0), WHITE);
        assert_eq!(r.target_pixel(1, 1), TRANSPARENT);
    }

    #[test]
    fn resize_scales_target() {
        let mut r = Raster::blank(2, 2);
        r.set_pixel(0, 0, WHITE);
        r.set_pixel(1, 1, WHITE);
        r.resize(4, 4);
        assert_eq!(r.target_width(), 4);
        assert_eq!(r.target_pixel(0, 0), WHITE);
        assert_eq!(r.target_pixel(1, 1), WHITE);
        assert_eq!(r.target_pixel(3, 0), TRANSPARENT);
    }
}
