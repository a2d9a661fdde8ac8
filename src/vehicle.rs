use nalgebra::{Isometry2, Point2, UnitComplex, Vector2};
use rapier2d_f64::prelude::*;

use crate::control::{VehicleBody, Wheel};

// Hull and wheel geometry, in world units.
const HULL_HALF_WIDTH: f64 = 20.0;
const HULL_HALF_HEIGHT: f64 = 40.0;
const HULL_X_OFFSET: f64 = 1.0;
const WHEEL_HALF_WIDTH: f64 = 3.0;
const WHEEL_HALF_HEIGHT: f64 = 5.5;
const WHEEL_X_OFFSET: f64 = 18.0;
const WHEEL_Y_OFFSET: f64 = 25.0;

const HULL_MASS: f64 = 1.0;
const WHEEL_MASS: f64 = 0.05;
const HULL_FRICTION: f64 = 0.01;

// Engine-side velocity decay per second, standing in for per-tick air
// friction of 0.1 at 60 Hz.
const LINEAR_DAMPING: f64 = 6.0;

// Converts thrust tuning values into engine force units. Calibrated so a
// straight force-mode run tops out near the velocity-mode drive speed:
// terminal speed = THRUST_FORCE_SCALE * acceleration_force
//                / (total mass * LINEAR_DAMPING) ~ 4.
const THRUST_FORCE_SCALE: f64 = 5200.0;

/// Startup pose of a vehicle. Poses are fixed at world construction.
#[derive(Debug, Clone, Copy)]
pub struct SpawnPose {
    pub x: f64,
    pub y: f64,
    /// Heading in radians.
    pub angle: f64,
}

fn wheel_offset(wheel: Wheel) -> Vector2<f64> {
    match wheel {
        Wheel::FrontLeft => Vector2::new(-(WHEEL_X_OFFSET - 1.0), WHEEL_Y_OFFSET + 1.0),
        Wheel::FrontRight => Vector2::new(WHEEL_X_OFFSET, WHEEL_Y_OFFSET + 1.0),
        Wheel::RearLeft => Vector2::new(-(WHEEL_X_OFFSET - 1.0), -WHEEL_Y_OFFSET),
        Wheel::RearRight => Vector2::new(WHEEL_X_OFFSET, -WHEEL_Y_OFFSET),
    }
}

/// A compound vehicle: one dynamic body carrying the hull collider and four
/// wheel colliders. Created once at startup, never destroyed.
pub struct Vehicle {
    pub body: RigidBodyHandle,
    pub hull: ColliderHandle,
    pub wheels: [ColliderHandle; 4],
}

impl Vehicle {
    pub fn spawn(pose: SpawnPose, bodies: &mut RigidBodySet, colliders: &mut ColliderSet) -> Self {
        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(vector![pose.x, pose.y])
            .rotation(pose.angle)
            .linear_damping(LINEAR_DAMPING)
            .can_sleep(false);
        let body = bodies.insert(rigid_body);

        let hull_collider = ColliderBuilder::cuboid(HULL_HALF_WIDTH, HULL_HALF_HEIGHT)
            .translation(vector![HULL_X_OFFSET, 0.0])
            .mass(HULL_MASS)
            .friction(HULL_FRICTION)
            .restitution(0.0);
        let hull = colliders.insert_with_parent(hull_collider, body, bodies);

        let wheels = Wheel::ALL.map(|wheel| {
            let collider = ColliderBuilder::cuboid(WHEEL_HALF_WIDTH, WHEEL_HALF_HEIGHT)
                .translation(wheel_offset(wheel))
                .mass(WHEEL_MASS);
            colliders.insert_with_parent(collider, body, bodies)
        });

        Vehicle { body, hull, wheels }
    }
}

/// Rapier-backed implementation of the control-law body boundary.
///
/// Wheel orientation lives in the wheel colliders' position relative to the
/// body; setting an absolute wheel angle stores `angle - body_angle` there,
/// so the wheels keep their absolute orientation across body rotation.
/// Thrust vectors cross into engine force units here, scaled by
/// `THRUST_FORCE_SCALE`; control-law tuning keeps its own scale.
pub struct VehicleBodyView<'a> {
    vehicle: &'a Vehicle,
    bodies: &'a mut RigidBodySet,
    colliders: &'a mut ColliderSet,
}

impl<'a> VehicleBodyView<'a> {
    pub fn new(
        vehicle: &'a Vehicle,
        bodies: &'a mut RigidBodySet,
        colliders: &'a mut ColliderSet,
    ) -> Self {
        Self {
            vehicle,
            bodies,
            colliders,
        }
    }

    fn body(&self) -> &RigidBody {
        &self.bodies[self.vehicle.body]
    }

    fn wheel_rotation_wrt_body(&self, wheel: Wheel) -> f64 {
        let handle = self.vehicle.wheels[wheel.index()];
        self.colliders[handle]
            .position_wrt_parent()
            .map(|pose| pose.rotation.angle())
            .unwrap_or(0.0)
    }
}

impl VehicleBody for VehicleBodyView<'_> {
    fn position(&self) -> Point2<f64> {
        Point2::from(*self.body().translation())
    }

    fn velocity(&self) -> Vector2<f64> {
        *self.body().linvel()
    }

    fn angle(&self) -> f64 {
        self.body().rotation().angle()
    }

    fn speed(&self) -> f64 {
        self.body().linvel().norm()
    }

    fn front_wheel_angle(&self) -> f64 {
        self.angle() + self.wheel_rotation_wrt_body(Wheel::FrontLeft)
    }

    fn wheel_position(&self, wheel: Wheel) -> Point2<f64> {
        self.body().position() * Point2::from(wheel_offset(wheel))
    }

    fn set_front_wheel_angle(&mut self, angle: f64) {
        let relative = angle - self.angle();
        for wheel in [Wheel::FrontLeft, Wheel::FrontRight] {
            let handle = self.vehicle.wheels[wheel.index()];
            self.colliders[handle]
                .set_position_wrt_parent(Isometry2::new(wheel_offset(wheel), relative));
        }
    }

    fn set_velocity(&mut self, velocity: Vector2<f64>) {
        self.bodies[self.vehicle.body].set_linvel(velocity, true);
    }

    fn set_angle(&mut self, angle: f64) {
        self.bodies[self.vehicle.body].set_rotation(UnitComplex::new(angle), true);
    }

    fn apply_force(&mut self, point: Point2<f64>, force: Vector2<f64>) {
        self.bodies[self.vehicle.body].add_force_at_point(
            force * THRUST_FORCE_SCALE,
            point,
            true,
        );
    }
}
