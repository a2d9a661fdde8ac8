use std::collections::HashMap;

use serde::Deserialize;
use tracing::info;

use crate::control::DriveMode;

/// Everything a bound key can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Action {
    SteerLeft,
    SteerRight,
    Accelerate,
    Reverse,
    Brake,
    SelectVehicleOne,
    SelectVehicleTwo,
    SelectVehicleThree,
    DriveByVelocity,
    DriveByForce,
    PivotAtCenter,
    PivotAtRearWheels,
}

/// Identity of one of the three vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VehicleId {
    #[default]
    One,
    Two,
    Three,
}

impl VehicleId {
    pub fn index(self) -> usize {
        match self {
            VehicleId::One => 0,
            VehicleId::Two => 1,
            VehicleId::Three => 2,
        }
    }
}

/// Point a force-mode turn pivots around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationCenter {
    #[default]
    BodyCenter,
    RearWheels,
}

/// Held-key flags plus the discrete selectors.
///
/// Mutated only from key events, read by the control law every tick. Plain
/// owned data; everything runs on one thread.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub brake: bool,
    pub active_vehicle: VehicleId,
    pub drive_mode: DriveMode,
    pub rotation_center: RotationCenter,
}

impl InputState {
    /// Key pressed. Movement flags latch on (idempotent under OS key repeat);
    /// selector actions wait for the release edge.
    pub fn key_down(&mut self, action: Action) {
        match action {
            Action::SteerLeft => self.left = true,
            Action::SteerRight => self.right = true,
            Action::Accelerate => self.up = true,
            Action::Reverse => self.down = true,
            Action::Brake => self.brake = true,
            _ => {}
        }
    }

    /// Key released. Movement flags drop; selectors transition here.
    pub fn key_up(&mut self, action: Action) {
        match action {
            Action::SteerLeft => self.left = false,
            Action::SteerRight => self.right = false,
            Action::Accelerate => self.up = false,
            Action::Reverse => self.down = false,
            Action::Brake => self.brake = false,
            Action::SelectVehicleOne => self.select_vehicle(VehicleId::One),
            Action::SelectVehicleTwo => self.select_vehicle(VehicleId::Two),
            Action::SelectVehicleThree => self.select_vehicle(VehicleId::Three),
            Action::DriveByVelocity => self.select_drive_mode(DriveMode::ByVelocity),
            Action::DriveByForce => self.select_drive_mode(DriveMode::ByForce),
            Action::PivotAtCenter => self.rotation_center = RotationCenter::BodyCenter,
            Action::PivotAtRearWheels => self.rotation_center = RotationCenter::RearWheels,
        }
    }

    fn select_vehicle(&mut self, id: VehicleId) {
        if self.active_vehicle != id {
            info!(vehicle = ?id, "active vehicle changed");
        }
        self.active_vehicle = id;
    }

    fn select_drive_mode(&mut self, mode: DriveMode) {
        if self.drive_mode != mode {
            info!(?mode, "drive mode changed");
        }
        self.drive_mode = mode;
    }
}

/// Maps symbolic key names to actions, case-insensitively.
///
/// Whatever front end produces the key events resolves its key names through
/// this table; unmapped keys resolve to nothing and are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "HashMap<String, Action>")]
pub struct KeyBindings(HashMap<String, Action>);

impl KeyBindings {
    pub fn resolve(&self, key: &str) -> Option<Action> {
        self.0.get(&key.to_uppercase()).copied()
    }
}

impl From<HashMap<String, Action>> for KeyBindings {
    fn from(map: HashMap<String, Action>) -> Self {
        Self(
            map.into_iter()
                .map(|(key, action)| (key.to_uppercase(), action))
                .collect(),
        )
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut map = HashMap::new();
        for (key, action) in [
            ("LEFT", Action::SteerLeft),
            ("RIGHT", Action::SteerRight),
            ("UP", Action::Accelerate),
            ("DOWN", Action::Reverse),
            ("SPACE", Action::Brake),
            ("1", Action::SelectVehicleOne),
            ("2", Action::SelectVehicleTwo),
            ("3", Action::SelectVehicleThree),
            ("V", Action::DriveByVelocity),
            ("F", Action::DriveByForce),
            ("X", Action::PivotAtCenter),
            ("C", Action::PivotAtRearWheels),
        ] {
            map.insert(key.to_string(), action);
        }
        Self(map)
    }
}
