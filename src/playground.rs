use std::f64::consts::PI;

use nalgebra::{Point2, Vector2};
use rapier2d_f64::prelude::*;
use tracing::{debug, info, trace};

use crate::config::PlaygroundConfig;
use crate::control::{drive, Tuning};
use crate::input::{Action, InputState, VehicleId};
use crate::vehicle::{SpawnPose, Vehicle, VehicleBodyView};

/// Fixed simulation rate, ticks per second.
pub const TICK_RATE: f64 = 60.0;

/// Debug instrumentation window: 1.5 s worth of ticks.
const LOG_WINDOW_TICKS: u32 = 90;

// Static obstacle geometry.
const BUILDING_POSITION: (f64, f64) = (100.0, 300.0);
const BUILDING_HALF_WIDTH: f64 = 50.0;
const BUILDING_HALF_HEIGHT: f64 = 200.0;

const SPAWN_POSES: [SpawnPose; 3] = [
    SpawnPose {
        x: 450.0,
        y: 350.0,
        angle: 120.0 * PI / 180.0,
    },
    SpawnPose {
        x: 300.0,
        y: 450.0,
        angle: 40.0 * PI / 180.0,
    },
    SpawnPose {
        x: 420.0,
        y: 200.0,
        angle: -15.0 * PI / 180.0,
    },
];

/// Kinematic snapshot of one vehicle, for front ends and tests.
#[derive(Debug, Clone, Copy)]
pub struct VehicleState {
    pub position: Point2<f64>,
    pub velocity: Vector2<f64>,
    pub angle: f64,
    pub speed: f64,
}

/// The whole playground: rapier world, obstacle, three vehicles and the
/// input state feeding the control law.
pub struct Playground {
    physics_pipeline: PhysicsPipeline,
    gravity: Vector2<f64>,
    integration_parameters: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    vehicles: [Vehicle; 3],
    input: InputState,
    tuning: Tuning,
    tick_counter: u32,
    logged: (f64, f64),
}

impl Playground {
    pub fn new(config: PlaygroundConfig) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: 1.0 / TICK_RATE,
            ..IntegrationParameters::default()
        };
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        create_building(&mut bodies, &mut colliders);

        let vehicles = SPAWN_POSES.map(|pose| Vehicle::spawn(pose, &mut bodies, &mut colliders));

        let mut input = InputState::default();
        input.drive_mode = config.drive_mode;

        info!(mode = ?config.drive_mode, "playground ready");

        Playground {
            physics_pipeline: PhysicsPipeline::new(),
            // top-down world, no gravity
            gravity: vector![0.0, 0.0],
            integration_parameters,
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            vehicles,
            input,
            tuning: config.tuning,
            tick_counter: 0,
            logged: (0.0, 0.0),
        }
    }

    pub fn key_down(&mut self, action: Action) {
        self.input.key_down(action);
    }

    pub fn key_up(&mut self, action: Action) {
        self.input.key_up(action);
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn active_vehicle(&self) -> VehicleId {
        self.input.active_vehicle
    }

    pub fn vehicle_state(&self, id: VehicleId) -> VehicleState {
        let body = &self.bodies[self.vehicles[id.index()].body];
        VehicleState {
            position: Point2::from(*body.translation()),
            velocity: *body.linvel(),
            angle: body.rotation().angle(),
            speed: body.linvel().norm(),
        }
    }

    /// One simulation step: control law on the active vehicle, then physics.
    pub fn tick(&mut self) {
        let active = &self.vehicles[self.input.active_vehicle.index()];
        {
            let mut view = VehicleBodyView::new(active, &mut self.bodies, &mut self.colliders);
            drive(&self.input, &self.tuning, &mut view);
        }

        let physics_hooks = ();
        let event_handler = ();

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &physics_hooks,
            &event_handler,
        );

        // control-law forces last a single tick
        self.bodies[active.body].reset_forces(true);

        self.tick_counter += 1;
        if self.tick_counter >= LOG_WINDOW_TICKS {
            trace!(ticks = LOG_WINDOW_TICKS, "instrumentation window elapsed");
            self.tick_counter = 0;
        }

        self.log_active_state();
    }

    // Change-only log of the active vehicle's speed and heading.
    fn log_active_state(&mut self) {
        let state = self.vehicle_state(self.input.active_vehicle);
        let speed = round6(state.speed);
        let angle = round6(state.angle);
        if (speed, angle) == self.logged {
            return;
        }
        self.logged = (speed, angle);
        debug!(vehicle = ?self.input.active_vehicle, speed, angle, "active vehicle");
    }
}

fn create_building(bodies: &mut RigidBodySet, colliders: &mut ColliderSet) {
    let rigid_body = RigidBodyBuilder::fixed()
        .translation(vector![BUILDING_POSITION.0, BUILDING_POSITION.1]);
    let building_handle = bodies.insert(rigid_body);
    let collider = ColliderBuilder::cuboid(BUILDING_HALF_WIDTH, BUILDING_HALF_HEIGHT)
        .friction(1.0)
        .restitution(0.0);

    colliders.insert_with_parent(collider, building_handle, bodies);
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}
