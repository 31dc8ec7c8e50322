// Per-module mounting geometry.
//
// Each module sits at a fixed 2-D offset from the rotation center. That
// position alone determines two derived angles:
// - the angular offset between chassis frame and the module's raw steering
//   zero (set by which quadrant the module is mounted in), and
// - the X-stance angle (radially outward from center) used when locked.

use std::f64::consts::{FRAC_PI_2, PI};

/// Immutable mounting description for one module. Derived angles are
/// computed once at construction and never change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleGeometry {
    x_m: f64,
    y_m: f64,
    angular_offset_rad: f64,
    lock_angle_rad: f64,
}

impl ModuleGeometry {
    /// Build geometry for a module mounted at (x, y) relative to the
    /// rotation center. The steering offset follows the quadrant:
    /// (+x,+y) -> 270°, (+x,-y) -> 0°, (-x,-y) -> 90°, anything else -> 180°.
    pub fn new(x_m: f64, y_m: f64) -> Self {
        let angular_offset_rad = if x_m > 0.0 && y_m > 0.0 {
            3.0 * FRAC_PI_2
        } else if x_m > 0.0 && y_m < 0.0 {
            0.0
        } else if x_m < 0.0 && y_m < 0.0 {
            FRAC_PI_2
        } else {
            PI
        };

        Self {
            x_m,
            y_m,
            angular_offset_rad,
            lock_angle_rad: y_m.atan2(x_m),
        }
    }

    pub fn x_m(&self) -> f64 {
        self.x_m
    }

    pub fn y_m(&self) -> f64 {
        self.y_m
    }

    /// Chassis-frame angle of the module's raw steering zero.
    pub fn angular_offset_rad(&self) -> f64 {
        self.angular_offset_rad
    }

    /// Radially-outward steering angle for the locked X-stance.
    pub fn lock_angle_rad(&self) -> f64 {
        self.lock_angle_rad
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_angular_offset_per_quadrant() {
        assert_relative_eq!(
            ModuleGeometry::new(0.3, 0.3).angular_offset_rad(),
            270.0_f64.to_radians()
        );
        assert_relative_eq!(
            ModuleGeometry::new(0.3, -0.3).angular_offset_rad(),
            0.0
        );
        assert_relative_eq!(
            ModuleGeometry::new(-0.3, -0.3).angular_offset_rad(),
            90.0_f64.to_radians()
        );
        assert_relative_eq!(
            ModuleGeometry::new(-0.3, 0.3).angular_offset_rad(),
            180.0_f64.to_radians()
        );
    }

    #[test]
    fn test_lock_angles_point_radially_outward() {
        assert_relative_eq!(
            ModuleGeometry::new(0.3, 0.3).lock_angle_rad(),
            45.0_f64.to_radians()
        );
        assert_relative_eq!(
            ModuleGeometry::new(0.3, -0.3).lock_angle_rad(),
            -45.0_f64.to_radians()
        );
        assert_relative_eq!(
            ModuleGeometry::new(-0.3, 0.3).lock_angle_rad(),
            135.0_f64.to_radians()
        );
        assert_relative_eq!(
            ModuleGeometry::new(-0.3, -0.3).lock_angle_rad(),
            -135.0_f64.to_radians()
        );
    }
}
