use nalgebra::Vector3;
use std::f64::consts::PI;

/// Convert degrees to radians
#[inline]
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// Convert radians to degrees
#[inline]
pub fn rad_to_deg(rad: f64) -> f64 {
    rad * 180.0 / PI
}

/// Wrap an angle into (-PI, PI].
pub fn normalize_angle(angle: f64) -> f64 {
    let mut angle = angle;
    if angle > PI {
        angle -= 2.0 * PI;
    } else if angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Horizontal azimuth of a vector, with +y being 0 and +x being PI/2.
///
/// Returns 0 for a vector with no horizontal component.
pub fn azimuth(v: &Vector3<f64>) -> f64 {
    if v.x == 0.0 && v.y == 0.0 {
        0.0
    } else {
        v.x.atan2(v.y)
    }
}

/// Horizontal (ground-plane) speed of a velocity vector.
#[inline]
pub fn horizontal_speed(v: &Vector3<f64>) -> f64 {
    (v.x * v.x + v.y * v.y).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_normalize_angle_wraps() {
        assert_relative_eq!(normalize_angle(1.5 * PI), -0.5 * PI);
        assert_relative_eq!(normalize_angle(-1.5 * PI), 0.5 * PI);
        assert_relative_eq!(normalize_angle(PI), PI);
        assert_relative_eq!(normalize_angle(-PI), PI);
        assert_relative_eq!(normalize_angle(0.25), 0.25);
    }

    #[test]
    fn test_azimuth_axes() {
        assert_relative_eq!(azimuth(&Vector3::new(0.0, 1.0, 0.0)), 0.0);
        assert_relative_eq!(azimuth(&Vector3::new(1.0, 0.0, 0.0)), FRAC_PI_2);
        assert_relative_eq!(azimuth(&Vector3::new(-1.0, 0.0, 0.0)), -FRAC_PI_2);
        assert_relative_eq!(azimuth(&Vector3::new(0.0, -1.0, 0.0)), PI);
    }

    #[test]
    fn test_azimuth_degenerate() {
        assert_eq!(azimuth(&Vector3::new(0.0, 0.0, 5.0)), 0.0);
    }

    #[test]
    fn test_horizontal_speed_ignores_vertical() {
        assert_relative_eq!(horizontal_speed(&Vector3::new(3.0, 4.0, 100.0)), 5.0);
    }
}
