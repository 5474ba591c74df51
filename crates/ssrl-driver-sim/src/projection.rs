//! Radial projection of a 1-D profile onto a 2-D detector image.
//!
//! Each pixel takes the profile value at its distance from the image centre.
//! Distances are measured from the pixel-grid midpoint, normalised by the
//! largest distance in the grid, then stretched onto `[0, max(x)]`.

use ndarray::Array2;
use ssrl_core::error::{SimError, SimResult};

/// Piecewise-linear interpolation of `(xp, fp)` at `x`.
///
/// `xp` must be non-decreasing. Values left of `xp[0]` or right of the last
/// sample clamp to the end values. An empty table yields NaN.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len().min(fp.len());
    if n == 0 || x.is_nan() {
        return f64::NAN;
    }
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }

    // first index with xp > x; 1..n-1 by the checks above
    let hi = xp[..n].partition_point(|&v| v <= x);
    let lo = hi - 1;
    let t = (x - xp[lo]) / (xp[hi] - xp[lo]);
    fp[lo] + t * (fp[hi] - fp[lo])
}

/// Project the profile `intensity(x)` onto a `(rows, cols)` image.
///
/// Pixel coordinates are measured from the grid midpoint `((rows - 1) / 2,
/// (cols - 1) / 2)`, so even-sized frames sit half a pixel off an integer
/// half-extent grid `[-n/2, n/2)`.
///
/// The result is symmetric under 180 degree rotation. A 1×1 image maps its
/// single pixel to radius zero.
///
/// # Errors
///
/// [`SimError::InvalidShape`] if the profile is empty, `x` and `intensity`
/// differ in length, or either image dimension is zero.
pub fn generate_image(
    x: &[f64],
    intensity: &[f64],
    shape: (usize, usize),
) -> SimResult<Array2<f64>> {
    let (rows, cols) = shape;
    if x.is_empty() || x.len() != intensity.len() {
        return Err(SimError::InvalidShape(format!(
            "profile has {} x-values and {} intensities",
            x.len(),
            intensity.len()
        )));
    }
    if rows == 0 || cols == 0 {
        return Err(SimError::InvalidShape(format!(
            "image shape ({rows}, {cols}) has an empty axis"
        )));
    }

    let x_max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let row_mid = (rows - 1) as f64 / 2.0;
    let col_mid = (cols - 1) as f64 / 2.0;
    let max_distance = row_mid.hypot(col_mid);

    let image = Array2::from_shape_fn((rows, cols), |(i, j)| {
        let distance = (i as f64 - row_mid).hypot(j as f64 - col_mid);
        let unit = if max_distance > 0.0 {
            distance / max_distance
        } else {
            0.0
        };
        interp(unit * x_max, x, intensity)
    });
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interp_inside_and_clamped() {
        let xp = [1.0, 2.0, 4.0];
        let fp = [10.0, 20.0, 0.0];
        assert_eq!(interp(1.5, &xp, &fp), 15.0);
        assert_eq!(interp(3.0, &xp, &fp), 10.0);
        assert_eq!(interp(2.0, &xp, &fp), 20.0);
        assert_eq!(interp(-5.0, &xp, &fp), 10.0);
        assert_eq!(interp(99.0, &xp, &fp), 0.0);
    }

    #[test]
    fn test_interp_degenerate_tables() {
        assert!(interp(1.0, &[], &[]).is_nan());
        assert_eq!(interp(7.0, &[3.0], &[2.0]), 2.0);
        assert!(interp(f64::NAN, &[0.0, 1.0], &[0.0, 1.0]).is_nan());
    }

    #[test]
    fn test_image_shape_and_corners() {
        let x = [0.0, 1.0, 2.0];
        let y = [5.0, 3.0, 1.0];
        let image = generate_image(&x, &y, (4, 6)).unwrap();
        assert_eq!(image.dim(), (4, 6));
        // corners sit at the largest distance, i.e. max(x)
        assert_eq!(image[[0, 0]], 1.0);
        assert_eq!(image[[3, 5]], 1.0);
    }

    #[test]
    fn test_image_rotation_symmetry() {
        let x: Vec<f64> = (1..=50).map(|v| v as f64 * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|v| (v * 3.0).sin().abs()).collect();
        for shape in [(5, 5), (6, 9), (1, 7), (8, 2)] {
            let image = generate_image(&x, &y, shape).unwrap();
            let (rows, cols) = shape;
            for i in 0..rows {
                for j in 0..cols {
                    assert_eq!(image[[i, j]], image[[rows - 1 - i, cols - 1 - j]]);
                }
            }
        }
    }

    #[test]
    fn test_odd_image_centre_uses_first_sample() {
        let x = [2.0, 4.0];
        let y = [7.0, 1.0];
        let image = generate_image(&x, &y, (3, 3)).unwrap();
        // radius 0 lies left of x[0] and clamps
        assert_eq!(image[[1, 1]], 7.0);
    }

    #[test]
    fn test_single_pixel_image() {
        let image = generate_image(&[0.0, 1.0], &[3.0, 9.0], (1, 1)).unwrap();
        assert_eq!(image[[0, 0]], 3.0);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            generate_image(&[], &[], (2, 2)),
            Err(SimError::InvalidShape(_))
        ));
        assert!(generate_image(&[1.0], &[1.0, 2.0], (2, 2)).is_err());
        assert!(generate_image(&[1.0], &[1.0], (0, 2)).is_err());
    }
}
