// Trapezoidal motion profile.
//
// Time-optimal accelerate / cruise / decelerate plan between two
// (position, velocity) states under symmetric velocity and acceleration
// bounds. The heading-lock controller re-plans every cycle from the
// measured state and takes the profile's velocity one period in.

/// Symmetric velocity/acceleration bounds for a profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraints {
    pub max_velocity: f64,
    pub max_acceleration: f64,
}

/// A point along a profile.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProfileState {
    pub position: f64,
    pub velocity: f64,
}

impl ProfileState {
    pub fn new(position: f64, velocity: f64) -> Self {
        Self { position, velocity }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TrapezoidProfile {
    constraints: Constraints,
}

impl TrapezoidProfile {
    pub fn new(constraints: Constraints) -> Self {
        Self { constraints }
    }

    /// The state `dt_s` seconds along the time-optimal profile from
    /// `current` to `goal`.
    pub fn calculate(&self, dt_s: f64, current: ProfileState, goal: ProfileState) -> ProfileState {
        let max_velocity = self.constraints.max_velocity;
        let max_acceleration = self.constraints.max_acceleration;

        // Mirror everything when the goal lies behind, solve forward, and
        // mirror the result back.
        let direction = if goal.position < current.position {
            -1.0
        } else {
            1.0
        };
        let mut current = mirror(current, direction);
        let goal = mirror(goal, direction);

        if current.velocity > max_velocity {
            current.velocity = max_velocity;
        }

        // Time and distance spent joining the endpoint velocities onto the
        // profile's acceleration ramps
        let cutoff_begin = current.velocity / max_acceleration;
        let cutoff_dist_begin = cutoff_begin * cutoff_begin * max_acceleration / 2.0;
        let cutoff_end = goal.velocity / max_acceleration;
        let cutoff_dist_end = cutoff_end * cutoff_end * max_acceleration / 2.0;

        let full_trapezoid_dist =
            cutoff_dist_begin + (goal.position - current.position) + cutoff_dist_end;
        let mut acceleration_time = max_velocity / max_acceleration;
        let mut full_speed_dist =
            full_trapezoid_dist - acceleration_time * acceleration_time * max_acceleration;

        // Short moves never reach max velocity: degenerate to a triangle
        if full_speed_dist < 0.0 {
            acceleration_time = (full_trapezoid_dist / max_acceleration).sqrt();
            full_speed_dist = 0.0;
        }

        // end_accel goes negative when the current velocity is already too
        // high for the remaining distance; the decel branch then applies.
        let end_accel = acceleration_time - cutoff_begin;
        let end_full_speed = end_accel + full_speed_dist / max_velocity;
        let end_decel = end_full_speed + acceleration_time - cutoff_end;

        let mut result = current;
        if dt_s < end_accel {
            result.velocity += dt_s * max_acceleration;
            result.position += (current.velocity + dt_s * max_acceleration / 2.0) * dt_s;
        } else if dt_s < end_full_speed {
            result.velocity = max_velocity;
            result.position += (current.velocity + end_accel * max_acceleration / 2.0) * end_accel
                + max_velocity * (dt_s - end_accel);
        } else if dt_s <= end_decel {
            let time_left = end_decel - dt_s;
            result.velocity = goal.velocity + time_left * max_acceleration;
            result.position =
                goal.position - (goal.velocity + time_left * max_acceleration / 2.0) * time_left;
        } else {
            result = goal;
        }

        mirror(result, direction)
    }
}

fn mirror(state: ProfileState, direction: f64) -> ProfileState {
    ProfileState {
        position: state.position * direction,
        velocity: state.velocity * direction,
    }
}
