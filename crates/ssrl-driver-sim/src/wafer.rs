//! Sample positions on a wafer.

use serde::{Deserialize, Serialize};

/// Default wafer radius in grid steps.
pub const DEFAULT_WAFER_RADIUS: u32 = 10;

/// Footprint of the measurable area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaferShape {
    /// Points inside the circle of the given radius
    #[default]
    Circle,
    /// Every point of the square grid
    Square,
}

/// Integer grid positions on a wafer of the given radius.
///
/// Walks `-radius..=radius` row by row (y outer, x inner) and returns the
/// kept points as parallel `(xs, ys)` vectors. `Circle` keeps points with
/// `x² + y² <= radius²`; `Square` keeps the whole grid.
pub fn wafer_locations(shape: WaferShape, radius: u32) -> (Vec<f64>, Vec<f64>) {
    let r = i64::from(radius);
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for y in -r..=r {
        for x in -r..=r {
            let keep = match shape {
                WaferShape::Circle => x * x + y * y <= r * r,
                WaferShape::Square => true,
            };
            if keep {
                xs.push(x as f64);
                ys.push(y as f64);
            }
        }
    }
    (xs, ys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_radius() {
        assert_eq!(wafer_locations(WaferShape::Circle, 0), (vec![0.0], vec![0.0]));
    }

    #[test]
    fn test_radius_one_circle_order() {
        let (xs, ys) = wafer_locations(WaferShape::Circle, 1);
        assert_eq!(xs, vec![0.0, -1.0, 0.0, 1.0, 0.0]);
        assert_eq!(ys, vec![-1.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_square_counts() {
        let (xs, ys) = wafer_locations(WaferShape::Square, 2);
        assert_eq!(xs.len(), 25);
        assert_eq!(ys.len(), 25);
        assert_eq!((xs[0], ys[0]), (-2.0, -2.0));
        assert_eq!((xs[24], ys[24]), (2.0, 2.0));
    }

    #[test]
    fn test_default_circle_inside_radius() {
        let (xs, ys) = wafer_locations(WaferShape::default(), DEFAULT_WAFER_RADIUS);
        // lattice points in a radius-10 disc
        assert_eq!(xs.len(), 317);
        let r2 = f64::from(DEFAULT_WAFER_RADIUS).powi(2);
        assert!(xs.iter().zip(&ys).all(|(x, y)| x * x + y * y <= r2));
    }
}
