//! Halton low-discrepancy sequence
//!
//! Used to scatter obstacles evenly but deterministically across the grid.

/// Radical inverse of `index` in `base`, in `[0, 1)`.
#[must_use]
pub fn halton(base: u32, mut index: u32) -> f32 {
    let mut result = 0.0_f64;
    let mut f = 1.0_f64;
    while index > 0 {
        f /= f64::from(base);
        result += f64::from(index % base) * f;
        index /= base;
    }
    result as f32
}

/// Endless 2D Halton (2, 3) cell sequence over a `cols × rows` grid.
///
/// Starts at index 1, since index 0 maps every base to the origin.
#[derive(Debug, Clone)]
pub struct HaltonCells {
    cols: usize,
    rows: usize,
    index: u32,
}

impl HaltonCells {
    #[must_use]
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            index: 1,
        }
    }
}

impl Iterator for HaltonCells {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cols == 0 || self.rows == 0 || self.index == u32::MAX {
            return None;
        }
        let x = (halton(2, self.index) * self.cols as f32).floor() as usize;
        let z = (halton(3, self.index) * self.rows as f32).floor() as usize;
        self.index += 1;
        Some((x.min(self.cols - 1), z.min(self.rows - 1)))
    }
}
