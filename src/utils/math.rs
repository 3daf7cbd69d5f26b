use std::f64::consts::PI;

/// Normalize an angle to the [-pi, pi] range.
pub fn normalize_angle(mut angle: f64) -> f64 {
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Normalize a heading to [0, 360) degrees.
pub fn normalize_heading_deg(heading: f64) -> f64 {
    heading.rem_euclid(360.0)
}

/// Shortest signed difference between two headings, in [-180, 180] degrees.
pub fn heading_error_deg(target: f64, current: f64) -> f64 {
    let mut error = target - current;
    if error > 180.0 {
        error -= 360.0;
    } else if error < -180.0 {
        error += 360.0;
    }
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_angle() {
        assert_relative_eq!(normalize_angle(3.0 * PI), PI);
        assert_relative_eq!(normalize_angle(-3.0 * PI), -PI);
        assert_relative_eq!(normalize_angle(0.5), 0.5);
    }

    #[test]
    fn test_heading_error_wraps() {
        assert_relative_eq!(heading_error_deg(10.0, 350.0), 20.0);
        assert_relative_eq!(heading_error_deg(350.0, 10.0), -20.0);
        assert_relative_eq!(heading_error_deg(180.0, 90.0), 90.0);
    }
}
