//! Per-frame car and camera motion.

use cgmath::{InnerSpace, Point3, Vector3};

use crate::data_structures::instance::Instance;

/// Beyond this distance from the origin the car is put back to the origin.
pub const MAX_RADIUS: f32 = 200.0;

/// Drive physics runs at a third of wall-clock time.
pub const DRIVE_TIME_SCALE: f32 = 1.0 / 3.0;

/// Follow-camera tuning.
pub const FOLLOW_DAMPING: f32 = 5.0;
pub const FOLLOW_DISTANCE: f32 = 5.0;
pub const FOLLOW_HEIGHT: f32 = 2.5;

/// Keyboard state fed into [`CarControls`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriveInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub brake: bool,
}

/// Simplified vehicle motion: throttle, brake, rolling resistance and a
/// fixed turning radius. Moves the car along its heading.
#[derive(Clone, Debug, PartialEq)]
pub struct CarControls {
    pub input: DriveInput,
    pub speed: f32,
    pub max_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    pub brake_power: f32,
    pub turning_radius: f32,
}

impl Default for CarControls {
    fn default() -> Self {
        Self {
            input: DriveInput::default(),
            speed: 0.0,
            max_speed: 40.0,
            acceleration: 15.0,
            deceleration: 8.0,
            brake_power: 40.0,
            turning_radius: 75.0,
        }
    }
}

impl CarControls {
    pub fn update(&mut self, car: &mut Instance, dt: f32) {
        let input = self.input;
        if input.forward {
            self.speed += self.acceleration * dt;
        }
        if input.backward {
            self.speed -= self.acceleration * dt;
        }
        let resistance = if input.brake {
            self.brake_power
        } else if !input.forward && !input.backward {
            self.deceleration
        } else {
            0.0
        };
        self.speed = approach_zero(self.speed, resistance * dt);
        self.speed = self.speed.clamp(-self.max_speed / 2.0, self.max_speed);

        if self.speed == 0.0 {
            return;
        }
        let steer = match (input.left, input.right) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        };
        let distance = self.speed * dt;
        if steer != 0.0 {
            car.rotate_y(steer * distance / self.turning_radius);
        }
        car.position += car.forward() * distance;
    }
}

fn approach_zero(value: f32, amount: f32) -> f32 {
    if value > 0.0 {
        (value - amount).max(0.0)
    } else {
        (value + amount).min(0.0)
    }
}

/// Puts the car back at the origin and stops it once it has left the
/// playable radius. Returns whether it did.
pub fn recover_out_of_bounds(car: &mut Instance, controls: &mut CarControls) -> bool {
    if car.position.magnitude() > MAX_RADIUS {
        car.position = Vector3::new(0.0, 0.0, 0.0);
        controls.speed = 0.0;
        true
    } else {
        false
    }
}

/// The point the follow camera chases: above and behind the car on world
/// axes.
pub fn follow_target(car_position: Vector3<f32>) -> Point3<f32> {
    Point3::new(
        car_position.x,
        FOLLOW_HEIGHT,
        car_position.z + FOLLOW_DISTANCE,
    )
}

/// Exponential approach of `from` toward `to` with the given damping.
pub fn damp(from: Point3<f32>, to: Point3<f32>, damping: f32, dt: f32) -> Point3<f32> {
    let t = 1.0 - (-damping * dt).exp();
    from + (to - from) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn idle_car_does_not_move() {
        let mut controls = CarControls::default();
        let mut car = Instance::new();
        controls.update(&mut car, 0.1);
        assert_eq!(car.position, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn throttle_accelerates_up_to_max_speed() {
        let mut controls = CarControls::default();
        controls.input.forward = true;
        let mut car = Instance::new();
        for _ in 0..1000 {
            controls.update(&mut car, 0.05);
        }
        assert_eq!(controls.speed, controls.max_speed);
        assert!(car.position.z > 0.0);
    }

    #[test]
    fn rolling_resistance_stops_the_car() {
        let mut controls = CarControls::default();
        controls.speed = 4.0;
        let mut car = Instance::new();
        controls.update(&mut car, 1.0);
        assert_eq!(controls.speed, 0.0);
    }

    #[test]
    fn recovery_is_idempotent() {
        let mut controls = CarControls::default();
        controls.speed = 12.0;
        let mut car = Instance::from(Vector3::new(150.0, 0.0, 150.0));
        assert!(recover_out_of_bounds(&mut car, &mut controls));
        assert_eq!(car.position, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(controls.speed, 0.0);
        assert!(!recover_out_of_bounds(&mut car, &mut controls));
        assert_eq!(car.position, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn exactly_on_the_border_stays() {
        let mut controls = CarControls::default();
        let mut car = Instance::from(Vector3::new(200.0, 0.0, 0.0));
        assert!(!recover_out_of_bounds(&mut car, &mut controls));
    }

    #[test]
    fn damping_converges_without_overshoot() {
        let target = Point3::new(0.0, 2.5, 5.0);
        let mut eye = Point3::new(3.25, 2.0, -5.0);
        for _ in 0..600 {
            let next = damp(eye, target, FOLLOW_DAMPING, 1.0 / 60.0);
            assert!((next - target).magnitude() <= (eye - target).magnitude());
            eye = next;
        }
        assert_relative_eq!(eye.z, target.z, epsilon = 1e-3);
        // a huge frame lands on the target instead of passing it
        let jumped = damp(Point3::new(0.0, 0.0, 0.0), target, FOLLOW_DAMPING, 10.0);
        assert_relative_eq!(jumped.z, 5.0, epsilon = 1e-3);
    }
}
