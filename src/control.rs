use std::str::FromStr;

use nalgebra::{Point2, Vector2};
use serde::Deserialize;
use thiserror::Error;

use crate::input::{InputState, RotationCenter};

pub const DRIVE_MODE_BY_VELOCITY: &str = "by-velocity";
pub const DRIVE_MODE_BY_FORCE: &str = "by-force";

/// Below this speed the heading does not respond to steering keys.
const MIN_STEERING_SPEED: f64 = 1.0;

/// How held keys are translated into motion of the active vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveMode {
    /// Drive keys assign the vehicle velocity directly.
    #[default]
    ByVelocity,
    /// Drive keys apply a thrust force at a chosen point.
    ByForce,
}

#[derive(Debug, Error)]
#[error("unknown drive mode {0:?}, expected \"by-velocity\" or \"by-force\"")]
pub struct UnknownDriveMode(pub String);

impl FromStr for DriveMode {
    type Err = UnknownDriveMode;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            DRIVE_MODE_BY_VELOCITY => Ok(DriveMode::ByVelocity),
            DRIVE_MODE_BY_FORCE => Ok(DriveMode::ByForce),
            other => Err(UnknownDriveMode(other.to_string())),
        }
    }
}

/// Control-law tuning.
///
/// Keep this separate from world setup (spawn poses, obstacle geometry). All
/// fields can be overridden from the settings file.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Per-tick velocity decay while coasting.
    pub deceleration: f64,

    /// Magnitude of the velocity-mode drive vector.
    pub acceleration: f64,

    /// Per-tick velocity decay while the brake is held.
    pub braking_deceleration: f64,

    /// Magnitude of the force-mode thrust vector.
    pub acceleration_force: f64,

    /// Heading change per steering tick, radians.
    pub max_rotation_speed: f64,

    /// Front-wheel deflection per steering tick, radians.
    pub max_wheel_rotation_speed: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            deceleration: 0.001,
            acceleration: 3.0,
            braking_deceleration: 0.2,
            acceleration_force: 0.0055,
            max_rotation_speed: 1.0_f64.to_radians(),
            max_wheel_rotation_speed: 30.0_f64.to_radians(),
        }
    }
}

/// The four wheel sub-shapes of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wheel {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

impl Wheel {
    pub const ALL: [Wheel; 4] = [
        Wheel::FrontLeft,
        Wheel::FrontRight,
        Wheel::RearLeft,
        Wheel::RearRight,
    ];

    pub fn index(self) -> usize {
        match self {
            Wheel::FrontLeft => 0,
            Wheel::FrontRight => 1,
            Wheel::RearLeft => 2,
            Wheel::RearRight => 3,
        }
    }
}

/// Narrow view of a rigid body as seen by the control law.
///
/// The playground backs this with a rapier body; the unit tests back it with
/// a stub, so the law never depends on engine internals.
pub trait VehicleBody {
    fn position(&self) -> Point2<f64>;
    fn velocity(&self) -> Vector2<f64>;
    /// Heading in radians.
    fn angle(&self) -> f64;
    /// Scalar velocity magnitude.
    fn speed(&self) -> f64;
    /// Absolute orientation of the front-left wheel.
    fn front_wheel_angle(&self) -> f64;
    /// World position of one wheel sub-shape.
    fn wheel_position(&self, wheel: Wheel) -> Point2<f64>;

    /// Re-orients both front wheels to an absolute angle.
    fn set_front_wheel_angle(&mut self, angle: f64);
    fn set_velocity(&mut self, velocity: Vector2<f64>);
    fn set_angle(&mut self, angle: f64);
    fn apply_force(&mut self, point: Point2<f64>, force: Vector2<f64>);
}

/// Runs one control tick on the active vehicle.
pub fn drive(input: &InputState, tuning: &Tuning, body: &mut dyn VehicleBody) {
    match input.drive_mode {
        DriveMode::ByVelocity => drive_by_velocity(input, tuning, body),
        DriveMode::ByForce => drive_by_force(input, tuning, body),
    }
}

pub fn drive_by_velocity(input: &InputState, tuning: &Tuning, body: &mut dyn VehicleBody) {
    let steer_basis = body.front_wheel_angle();

    // Drive vector along the current front-wheel direction.
    let basic = Vector2::new(
        -tuning.acceleration * steer_basis.sin(),
        tuning.acceleration * steer_basis.cos(),
    );

    let mut velocity = body.velocity();
    let mut angle = body.angle();
    let mut wheel_angle = body.angle();
    let speed = round_to(body.speed(), 3);

    if input.brake {
        velocity *= 1.0 - tuning.braking_deceleration;
    } else if input.up {
        velocity = basic;
    } else if input.down {
        velocity = -basic;
    } else {
        // rolling friction
        velocity *= 1.0 - tuning.deceleration;
    }

    if input.left {
        wheel_angle -= tuning.max_wheel_rotation_speed;
        if speed >= MIN_STEERING_SPEED {
            angle -= tuning.max_rotation_speed * steering_sense(input.down);
        }
    }
    if input.right {
        wheel_angle += tuning.max_wheel_rotation_speed;
        if speed >= MIN_STEERING_SPEED {
            angle += tuning.max_rotation_speed * steering_sense(input.down);
        }
    }

    body.set_front_wheel_angle(wheel_angle);
    body.set_velocity(velocity);
    body.set_angle(angle);
}

pub fn drive_by_force(input: &InputState, tuning: &Tuning, body: &mut dyn VehicleBody) {
    let steer_basis = body.front_wheel_angle();
    let mut angle = body.angle();
    let mut wheel_angle = body.angle();

    let mut force = Vector2::new(
        -tuning.acceleration_force * steer_basis.sin(),
        tuning.acceleration_force * steer_basis.cos(),
    );

    let speed = round_to(body.speed(), 1);

    // No thrust while coasting or while both drive keys fight each other.
    // The trailing coasting-speed clause overlaps the first; kept as is.
    let coasting = !input.up && !input.down;
    if coasting || (input.up && input.down) || (coasting && speed < 0.1 && speed > 0.0) {
        force = Vector2::zeros();
    }

    // braking / reverse thrust
    if input.down {
        force = -force;
    }

    if speed > MIN_STEERING_SPEED {
        if input.left {
            angle -= tuning.max_rotation_speed * steering_sense(input.down);
            wheel_angle -= tuning.max_wheel_rotation_speed;
        }
        if input.right {
            angle += tuning.max_rotation_speed * steering_sense(input.down);
            wheel_angle += tuning.max_wheel_rotation_speed;
        }
    }

    let mut application_point = body.position();
    if input.rotation_center == RotationCenter::RearWheels {
        if input.left {
            application_point = body.wheel_position(Wheel::RearLeft);
        } else if input.right {
            application_point = body.wheel_position(Wheel::RearRight);
        }
    }

    body.set_front_wheel_angle(wheel_angle);
    body.apply_force(application_point, force);
    body.set_angle(angle);
}

// Steering sense flips while reversing.
fn steering_sense(down: bool) -> f64 {
    if down {
        -1.0
    } else {
        1.0
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputState;

    struct StubBody {
        position: Point2<f64>,
        velocity: Vector2<f64>,
        angle: f64,
        wheel_angle: f64,
        rear_left: Point2<f64>,
        rear_right: Point2<f64>,
        applied_force: Option<(Point2<f64>, Vector2<f64>)>,
    }

    impl StubBody {
        fn at_rest() -> Self {
            Self {
                position: Point2::new(450.0, 350.0),
                velocity: Vector2::zeros(),
                angle: 0.0,
                wheel_angle: 0.0,
                rear_left: Point2::new(433.0, 325.0),
                rear_right: Point2::new(468.0, 325.0),
                applied_force: None,
            }
        }

        fn moving(velocity: Vector2<f64>) -> Self {
            Self {
                velocity,
                ..Self::at_rest()
            }
        }
    }

    impl VehicleBody for StubBody {
        fn position(&self) -> Point2<f64> {
            self.position
        }

        fn velocity(&self) -> Vector2<f64> {
            self.velocity
        }

        fn angle(&self) -> f64 {
            self.angle
        }

        fn speed(&self) -> f64 {
            self.velocity.norm()
        }

        fn front_wheel_angle(&self) -> f64 {
            self.wheel_angle
        }

        fn wheel_position(&self, wheel: Wheel) -> Point2<f64> {
            match wheel {
                Wheel::RearLeft => self.rear_left,
                Wheel::RearRight => self.rear_right,
                _ => self.position,
            }
        }

        fn set_front_wheel_angle(&mut self, angle: f64) {
            self.wheel_angle = angle;
        }

        fn set_velocity(&mut self, velocity: Vector2<f64>) {
            self.velocity = velocity;
        }

        fn set_angle(&mut self, angle: f64) {
            self.angle = angle;
        }

        fn apply_force(&mut self, point: Point2<f64>, force: Vector2<f64>) {
            self.applied_force = Some((point, force));
        }
    }

    #[test]
    fn brake_never_increases_speed_whatever_else_is_held() {
        for mask in 0..16u8 {
            let mut input = InputState::default();
            input.brake = true;
            input.up = mask & 1 != 0;
            input.down = mask & 2 != 0;
            input.left = mask & 4 != 0;
            input.right = mask & 8 != 0;

            let mut body = StubBody::moving(Vector2::new(2.0, 1.0));
            let prior = body.speed();
            drive_by_velocity(&input, &Tuning::default(), &mut body);
            assert!(
                body.speed() <= prior,
                "speed grew under braking with mask {mask:#06b}"
            );
        }
    }

    #[test]
    fn coasting_decays_velocity_by_the_exact_factor() {
        let tuning = Tuning::default();
        let mut body = StubBody::moving(Vector2::new(3.0, 4.0));
        drive_by_velocity(&InputState::default(), &tuning, &mut body);
        assert_eq!(body.velocity.x, 3.0 * (1.0 - tuning.deceleration));
        assert_eq!(body.velocity.y, 4.0 * (1.0 - tuning.deceleration));
    }

    #[test]
    fn braking_at_rest_stays_at_rest() {
        let mut input = InputState::default();
        input.brake = true;
        let mut body = StubBody::at_rest();
        drive_by_velocity(&input, &Tuning::default(), &mut body);
        assert_eq!(body.velocity, Vector2::zeros());
    }

    #[test]
    fn forward_sets_the_drive_vector_along_the_wheels() {
        let tuning = Tuning::default();
        let mut input = InputState::default();
        input.up = true;
        let mut body = StubBody::at_rest();
        drive_by_velocity(&input, &tuning, &mut body);
        assert_eq!(body.velocity.x, 0.0);
        assert_eq!(body.velocity.y, tuning.acceleration);
    }

    #[test]
    fn reverse_negates_the_drive_vector() {
        let tuning = Tuning::default();
        let mut input = InputState::default();
        input.down = true;
        let mut body = StubBody::at_rest();
        drive_by_velocity(&input, &tuning, &mut body);
        assert_eq!(body.velocity.y, -tuning.acceleration);
    }

    #[test]
    fn heading_is_locked_below_the_speed_gate() {
        let mut input = InputState::default();
        input.left = true;
        let mut body = StubBody::moving(Vector2::new(0.0, 0.5));
        drive_by_velocity(&input, &Tuning::default(), &mut body);
        assert_eq!(body.angle, 0.0);
        // the wheels still turn while the hull does not
        assert_eq!(body.wheel_angle, -Tuning::default().max_wheel_rotation_speed);
    }

    #[test]
    fn steering_left_at_speed_turns_heading_and_wheels() {
        let tuning = Tuning::default();
        let mut input = InputState::default();
        input.left = true;
        let mut body = StubBody::moving(Vector2::new(0.0, 2.0));
        drive_by_velocity(&input, &tuning, &mut body);
        assert_eq!(body.angle, -tuning.max_rotation_speed);
        assert_eq!(body.wheel_angle, -tuning.max_wheel_rotation_speed);
    }

    #[test]
    fn reversing_inverts_the_steering_sense() {
        let tuning = Tuning::default();
        let mut input = InputState::default();
        input.left = true;
        input.down = true;
        let mut body = StubBody::moving(Vector2::new(0.0, 2.0));
        drive_by_velocity(&input, &tuning, &mut body);
        assert_eq!(body.angle, tuning.max_rotation_speed);
    }

    #[test]
    fn forward_thrust_at_rest_is_applied_at_the_centroid() {
        let tuning = Tuning::default();
        let mut input = InputState::default();
        input.up = true;
        let mut body = StubBody::at_rest();
        drive_by_force(&input, &tuning, &mut body);
        let (point, force) = body.applied_force.expect("no force applied");
        assert_eq!(point, body.position);
        assert_eq!(force.x, 0.0);
        assert_eq!(force.y, tuning.acceleration_force);
    }

    #[test]
    fn thrust_is_zero_while_coasting_or_with_both_drive_keys() {
        for (up, down) in [(false, false), (true, true)] {
            let mut input = InputState::default();
            input.up = up;
            input.down = down;
            let mut body = StubBody::moving(Vector2::new(0.0, 3.0));
            drive_by_force(&input, &Tuning::default(), &mut body);
            let (_, force) = body.applied_force.expect("no force applied");
            assert_eq!(force, Vector2::zeros());
        }
    }

    #[test]
    fn reverse_thrust_points_backwards() {
        let tuning = Tuning::default();
        let mut input = InputState::default();
        input.down = true;
        let mut body = StubBody::at_rest();
        drive_by_force(&input, &tuning, &mut body);
        let (_, force) = body.applied_force.expect("no force applied");
        assert_eq!(force.y, -tuning.acceleration_force);
    }

    #[test]
    fn force_mode_steering_needs_speed_strictly_above_one() {
        let mut input = InputState::default();
        input.up = true;
        input.left = true;

        let mut body = StubBody::moving(Vector2::new(0.0, 1.0));
        drive_by_force(&input, &Tuning::default(), &mut body);
        assert_eq!(body.angle, 0.0);
        assert_eq!(body.wheel_angle, 0.0);

        let tuning = Tuning::default();
        let mut body = StubBody::moving(Vector2::new(0.0, 2.0));
        drive_by_force(&input, &tuning, &mut body);
        assert_eq!(body.angle, -tuning.max_rotation_speed);
        assert_eq!(body.wheel_angle, -tuning.max_wheel_rotation_speed);
    }

    #[test]
    fn rear_wheel_pivot_moves_the_application_point() {
        let mut input = InputState::default();
        input.up = true;
        input.left = true;
        input.rotation_center = RotationCenter::RearWheels;
        let mut body = StubBody::moving(Vector2::new(0.0, 2.0));
        drive_by_force(&input, &Tuning::default(), &mut body);
        let (point, _) = body.applied_force.expect("no force applied");
        assert_eq!(point, body.rear_left);

        input.left = false;
        input.right = true;
        let mut body = StubBody::moving(Vector2::new(0.0, 2.0));
        drive_by_force(&input, &Tuning::default(), &mut body);
        let (point, _) = body.applied_force.expect("no force applied");
        assert_eq!(point, body.rear_right);
    }

    #[test]
    fn dispatch_follows_the_selected_drive_mode() {
        let mut input = InputState::default();
        input.up = true;
        input.drive_mode = DriveMode::ByForce;
        let mut body = StubBody::at_rest();
        drive(&input, &Tuning::default(), &mut body);
        assert!(body.applied_force.is_some());
        assert_eq!(body.velocity, Vector2::zeros());
    }

    #[test]
    fn drive_mode_identifiers_parse_or_fail_loudly() {
        assert_eq!(
            "by-velocity".parse::<DriveMode>().unwrap(),
            DriveMode::ByVelocity
        );
        assert_eq!("by-force".parse::<DriveMode>().unwrap(), DriveMode::ByForce);
        assert!("warp".parse::<DriveMode>().is_err());
    }
}
