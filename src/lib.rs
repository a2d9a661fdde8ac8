//! A 2D rigid-body driving playground: three compound vehicles and a static
//! obstacle in a rapier world, steered by a per-tick control law that turns
//! held keys into velocity or force updates on the active vehicle.

pub mod config;
pub mod control;
pub mod input;
pub mod playground;
pub mod vehicle;

pub use config::{ConfigError, PlaygroundConfig};
pub use control::{drive, DriveMode, Tuning, VehicleBody, Wheel};
pub use input::{Action, InputState, KeyBindings, RotationCenter, VehicleId};
pub use playground::{Playground, VehicleState};
