// Angle helpers shared by steering optimization, input shaping, and odometry.
// All angles are radians, counter-clockwise positive.

use std::f64::consts::{PI, TAU};

/// Wrap an angle into [0, 2π).
pub fn wrap_to_tau(angle: f64) -> f64 {
    angle.rem_euclid(TAU)
}

/// Wrap an angle into (-π, π].
pub fn wrap_to_pi(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI { wrapped - TAU } else { wrapped }
}

/// Unsigned shortest angular distance between two angles, in [0, π].
pub fn angle_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(TAU);
    if diff > PI { TAU - diff } else { diff }
}

/// Step `current` towards `target` along the circle by at most `step` radians,
/// taking the short way around. Returns `target` once it is within reach.
pub fn step_towards_circular(current: f64, target: f64, step: f64) -> f64 {
    let current = wrap_to_tau(current);
    let target = wrap_to_tau(target);
    let direction = (target - current).signum();
    let difference = (current - target).abs();

    if difference <= step {
        target
    } else if difference > PI {
        // Shorter path crosses the 0/2π seam
        if current + TAU - target < step || target + TAU - current < step {
            target
        } else {
            wrap_to_tau(current - direction * step)
        }
    } else {
        current + direction * step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wrap_to_tau() {
        assert_relative_eq!(wrap_to_tau(0.0), 0.0);
        assert_relative_eq!(wrap_to_tau(TAU + 0.5), 0.5);
        assert_relative_eq!(wrap_to_tau(-0.5), TAU - 0.5);
        assert_relative_eq!(wrap_to_tau(3.0 * PI), PI);
    }

    #[test]
    fn test_wrap_to_pi() {
        assert_relative_eq!(wrap_to_pi(0.0), 0.0);
        assert_relative_eq!(wrap_to_pi(PI), PI);
        assert_relative_eq!(wrap_to_pi(PI + 0.1), -PI + 0.1, epsilon = 1e-12);
        assert_relative_eq!(wrap_to_pi(-PI - 0.1), PI - 0.1, epsilon = 1e-12);
        assert_relative_eq!(wrap_to_pi(5.0 * PI), PI);
    }

    #[test]
    fn test_angle_difference_takes_short_way() {
        assert_relative_eq!(angle_difference(0.1, -0.1), 0.2, epsilon = 1e-12);
        // 350° vs 10° is 20° apart, not 340°
        assert_relative_eq!(
            angle_difference(350.0_f64.to_radians(), 10.0_f64.to_radians()),
            20.0_f64.to_radians(),
            epsilon = 1e-12
        );
        assert_relative_eq!(angle_difference(PI, -PI), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_step_within_reach_returns_target() {
        assert_relative_eq!(step_towards_circular(1.0, 1.05, 0.1), 1.05);
    }

    #[test]
    fn test_step_moves_by_step_size() {
        assert_relative_eq!(step_towards_circular(1.0, 2.0, 0.1), 1.1, epsilon = 1e-12);
        assert_relative_eq!(step_towards_circular(2.0, 1.0, 0.1), 1.9, epsilon = 1e-12);
    }

    #[test]
    fn test_step_crosses_seam() {
        // 5.8 rad to 0.2 rad: short way is forward across 2π
        let stepped = step_towards_circular(5.8, 0.2, 0.2);
        assert_relative_eq!(stepped, 6.0, epsilon = 1e-12);
        // and from 0.2 back towards 5.8 goes negative across the seam
        let stepped = step_towards_circular(0.2, 5.8, 0.3);
        assert_relative_eq!(stepped, wrap_to_tau(-0.1), epsilon = 1e-12);
    }
}
