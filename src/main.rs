use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vehicle_playground::{KeyBindings, Playground, PlaygroundConfig, VehicleId};

const SETTINGS_PATH: &str = "settings/playground.ron";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::fs::read_to_string(SETTINGS_PATH) {
        Ok(settings) => PlaygroundConfig::from_ron(&settings)?,
        Err(_) => {
            warn!(path = SETTINGS_PATH, "no settings file, using defaults");
            PlaygroundConfig::default()
        }
    };

    let bindings = config.bindings.clone();
    let mut playground = Playground::new(config);

    // Scripted key session standing in for a keyboard front end.
    info!("driving vehicle one forward");
    hold(&mut playground, &bindings, "Up", 120);

    info!("steering left while rolling");
    key_down(&mut playground, &bindings, "Up");
    hold(&mut playground, &bindings, "Left", 60);
    key_up(&mut playground, &bindings, "Up");

    info!("braking to a stop");
    hold(&mut playground, &bindings, "Space", 60);
    report(&playground, VehicleId::One);

    info!("switching to vehicle two in force mode");
    key_up(&mut playground, &bindings, "2");
    key_up(&mut playground, &bindings, "F");
    hold(&mut playground, &bindings, "Up", 180);
    report(&playground, VehicleId::Two);

    info!("pivot turn about the rear wheels");
    key_up(&mut playground, &bindings, "C");
    key_down(&mut playground, &bindings, "Up");
    hold(&mut playground, &bindings, "Right", 90);
    key_up(&mut playground, &bindings, "Up");
    report(&playground, VehicleId::Two);

    Ok(())
}

fn key_down(playground: &mut Playground, bindings: &KeyBindings, key: &str) {
    if let Some(action) = bindings.resolve(key) {
        playground.key_down(action);
    }
}

fn key_up(playground: &mut Playground, bindings: &KeyBindings, key: &str) {
    if let Some(action) = bindings.resolve(key) {
        playground.key_up(action);
    }
}

fn hold(playground: &mut Playground, bindings: &KeyBindings, key: &str, ticks: u32) {
    key_down(playground, bindings, key);
    for _ in 0..ticks {
        playground.tick();
    }
    key_up(playground, bindings, key);
}

fn report(playground: &Playground, id: VehicleId) {
    let state = playground.vehicle_state(id);
    info!(
        ?id,
        speed = state.speed,
        angle = state.angle,
        x = state.position.x,
        y = state.position.y,
        "vehicle state"
    );
}
