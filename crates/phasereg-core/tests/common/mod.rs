#![allow(dead_code)]

use ndarray::Array2;

use phasereg_core::Shift;

/// A Gaussian spot used to build smooth synthetic scenes.
#[derive(Clone, Copy, Debug)]
pub struct Spot {
    pub row: f64,
    pub col: f64,
    pub sigma: f64,
    pub amplitude: f64,
}

/// Deterministic pseudo-random spots kept `margin` pixels away from the border.
pub fn make_spots(count: usize, rows: usize, cols: usize, margin: f64, seed: u64) -> Vec<Spot> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    (0..count)
        .map(|_| Spot {
            row: margin + next() * (rows as f64 - 2.0 * margin),
            col: margin + next() * (cols as f64 - 2.0 * margin),
            sigma: 1.5 + 2.5 * next(),
            amplitude: 0.3 + 0.7 * next(),
        })
        .collect()
}

/// Render `spots` moved by `shift` (content moves right by `dx`, down by `dy`).
pub fn render(spots: &[Spot], rows: usize, cols: usize, shift: Shift) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        spots
            .iter()
            .map(|s| {
                let dr = r as f64 - s.row - shift.dy;
                let dc = c as f64 - s.col - shift.dx;
                s.amplitude * (-(dr * dr + dc * dc) / (2.0 * s.sigma * s.sigma)).exp()
            })
            .sum()
    })
}

/// A scene and a copy of it translated by `shift`.
pub fn make_shifted_pair(rows: usize, cols: usize, shift: Shift, seed: u64) -> (Array2<f64>, Array2<f64>) {
    let count = (rows * cols / 128).max(8);
    let spots = make_spots(count, rows, cols, 6.0, seed);
    (
        render(&spots, rows, cols, Shift::default()),
        render(&spots, rows, cols, shift),
    )
}

/// A scene whose spots stay clear of the border even after `shift`, so the
/// pair is close to periodic.
pub fn make_interior_pair(rows: usize, cols: usize, shift: Shift, seed: u64) -> (Array2<f64>, Array2<f64>) {
    let margin = rows.min(cols) as f64 / 4.0;
    let spots = make_spots(24, rows, cols, margin, seed);
    (
        render(&spots, rows, cols, Shift::default()),
        render(&spots, rows, cols, shift),
    )
}

/// Circularly shift `data` by whole pixels.
pub fn roll(data: &Array2<f64>, dy: isize, dx: isize) -> Array2<f64> {
    let (h, w) = data.dim();
    Array2::from_shape_fn((h, w), |(r, c)| {
        let src_r = (r as isize - dy).rem_euclid(h as isize) as usize;
        let src_c = (c as isize - dx).rem_euclid(w as isize) as usize;
        data[[src_r, src_c]]
    })
}

/// Euclidean distance between two shifts.
pub fn shift_error(estimated: Shift, truth: Shift) -> f64 {
    (estimated - truth).magnitude()
}
