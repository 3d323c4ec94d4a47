//! Monochrome 64x32 framebuffer.

/// Framebuffer width in pixels.
pub const WIDTH: usize = 64;

/// Framebuffer height in pixels.
pub const HEIGHT: usize = 32;

/// A 64x32 grid of lit/off pixels, stored as 64 columns of 32 rows.
///
/// Coordinates wrap: `(x, y)` addresses `(x % 64, y % 32)`.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    columns: Vec<[bool; HEIGHT]>,
}

impl Framebuffer {
    /// An all-off framebuffer.
    pub fn new() -> Self {
        Self {
            columns: vec![[false; HEIGHT]; WIDTH],
        }
    }

    /// Whether the pixel at `(x, y)` is lit.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.columns[x % WIDTH][y % HEIGHT]
    }

    /// Light or clear the pixel at `(x, y)`.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, lit: bool) {
        self.columns[x % WIDTH][y % HEIGHT] = lit;
    }

    /// Set every pixel to the same state.
    pub fn fill(&mut self, lit: bool) {
        for column in &mut self.columns {
            *column = [lit; HEIGHT];
        }
    }

    /// Number of lit pixels.
    pub fn lit_count(&self) -> usize {
        self.columns
            .iter()
            .map(|column| column.iter().filter(|p| **p).count())
            .sum()
    }

    /// Pixels in row-major order, one byte (0 or 1) per pixel.
    pub fn to_row_major(&self) -> Vec<u8> {
        (0..HEIGHT)
            .flat_map(|y| (0..WIDTH).map(move |x| (x, y)))
            .map(|(x, y)| self.columns[x][y] as u8)
            .collect()
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                write!(f, "{}", if self.columns[x][y] { '#' } else { '.' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framebuffer")
            .field("lit", &self.lit_count())
            .finish()
    }
}
