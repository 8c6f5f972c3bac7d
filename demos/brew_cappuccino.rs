//! Brew a cappuccino
//!
//! Scripts a pair of hands through the whole drink on the standard cafe bar:
//! grind, tamp, extract, fill, steam and pour. Pass a TOML file to override
//! the default timings.
//!
//!     RUST_LOG=info cargo run --example brew_cappuccino [config.toml]

use std::sync::Arc;

use barista_engine::{
    build_cafe_scene,
    docking::slot_world_pose,
    effects::RecordingEffectSink,
    physics::tilted_pose,
    session::{self, layout, snapshot_json},
    InputEvent, Pose, PropId, Session, SimulationConfig, SlotId, Tag,
};
use cgmath::{Point3, Vector3};
use crossbeam_channel::Sender;

const FRAME: f32 = 1.0 / 30.0;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimulationConfig::load_from_file(path)?,
        None => SimulationConfig::default(),
    };
    let timings = config.clone();

    let (mut bar, cafe) = build_cafe_scene(config)?;
    let recorder = RecordingEffectSink::default();
    let effect_log = Arc::clone(&recorder.calls);
    session::set_effect_sink(&mut bar, Box::new(recorder));
    let hands = session::input_sender(&bar);

    println!("Brewing a cappuccino...");

    // Grind
    let grinder = slot_pose(&bar, cafe.grinder_slot);
    place(&hands, cafe.filter, grinder)?;
    run(&mut bar, timings.grinder.duration);
    report(&bar, "ground coffee", cafe.filter, Tag::FILTER_WITH_COFFEE);

    // Tamp on the filter still in the grinder, then put the tamper down
    let seat = slot_pose(&bar, cafe.tamper_seat);
    place(&hands, cafe.tamper, seat)?;
    run(&mut bar, timings.tamper.duration);
    report(&bar, "tamped", cafe.filter, Tag::FILTER_PRESSED);
    place(&hands, cafe.tamper, spawn_pose(layout::TAMPER_SPAWN))?;

    // Extract
    let group_head = slot_pose(&bar, cafe.group_head_slot);
    let cup_stand = slot_pose(&bar, cafe.cup_slot);
    place(&hands, cafe.filter, group_head)?;
    place(&hands, cafe.cup, cup_stand)?;
    run(&mut bar, timings.extraction.duration);
    report(&bar, "espresso", cafe.cup, Tag::CUP_WITH_ESPRESSO);

    // Fill the pitcher from the carton
    let pitcher = layout::PITCHER_SPAWN;
    let over_pitcher = tilted_pose(
        Point3::new(pitcher[0] + 0.12, pitcher[1] + 0.2, pitcher[2] - 0.03),
        Vector3::unit_z(),
        90.0,
    );
    hands.send(InputEvent::GrabStart {
        prop: cafe.carton,
        actor_pose: Some(over_pitcher),
    })?;
    run(&mut bar, timings.fill.duration);
    place(&hands, cafe.carton, spawn_pose(layout::CARTON_SPAWN))?;
    report(&bar, "milk", cafe.pitcher, Tag::PITCHER_WITH_MILK);

    // Steam
    hands.send(InputEvent::EnterZone {
        zone: cafe.steam_zone,
        prop: cafe.pitcher,
    })?;
    hands.send(InputEvent::KnobRotation {
        degrees: timings.steam.max_rotation,
    })?;
    run(&mut bar, timings.steam.duration);
    hands.send(InputEvent::KnobRotation {
        degrees: timings.steam.min_rotation,
    })?;
    hands.send(InputEvent::ExitZone {
        zone: cafe.steam_zone,
        prop: cafe.pitcher,
    })?;
    report(&bar, "steamed milk", cafe.pitcher, Tag::PITCHER_WITH_TEXTURED_MILK);

    // Pour
    let stand = layout::CUP_STAND;
    let over_cup = tilted_pose(
        Point3::new(stand[0] + 0.1, stand[1] + 0.2, stand[2] - 0.05),
        Vector3::unit_z(),
        90.0,
    );
    hands.send(InputEvent::GrabStart {
        prop: cafe.pitcher,
        actor_pose: Some(over_cup),
    })?;
    run(&mut bar, timings.pour.duration);
    place(&hands, cafe.pitcher, spawn_pose(layout::PITCHER_SPAWN))?;
    run(&mut bar, FRAME);
    report(&bar, "cappuccino", cafe.cup, Tag::CUP_WITH_CAPPUCCINO);

    let events = session::drain_events(&mut bar);
    println!("[OK] {} events published", events.len());
    println!("[OK] {} effect calls", effect_log.lock().len());
    print_violations(&bar);
    println!("{}", snapshot_json(&bar)?);

    session::shutdown_session(&mut bar);
    Ok(())
}

/// Grab a prop (or keep holding it), carry it to `target` and let go
fn place(hands: &Sender<InputEvent>, prop: PropId, target: Pose) -> anyhow::Result<()> {
    hands.send(InputEvent::GrabStart {
        prop,
        actor_pose: Some(target),
    })?;
    hands.send(InputEvent::PoseUpdate { prop, pose: target })?;
    hands.send(InputEvent::GrabEnd { prop })?;
    Ok(())
}

/// Tick the bar for a little longer than `seconds`
fn run(bar: &mut Session, seconds: f32) {
    let frames = (seconds / FRAME).ceil() as usize + 3;
    for _ in 0..frames {
        session::tick(bar, FRAME);
    }
}

fn slot_pose(bar: &Session, slot: SlotId) -> Pose {
    slot_world_pose(&bar.scene.slots.slots[slot.0 as usize], &bar.scene.props)
}

fn spawn_pose(position: [f32; 3]) -> Pose {
    barista_engine::physics::pose_at(position[0], position[1], position[2])
}

fn report(bar: &Session, step: &str, prop: PropId, expected: Tag) {
    match session::get_tag(bar, prop) {
        Some(tag) if tag == expected => println!("[OK] {}: {}", step, tag),
        Some(tag) => println!("[!!] {}: expected {}, found {}", step, expected, tag),
        None => println!("[!!] {}: prop {} has no tag", step, prop.0),
    }
}

fn print_violations(bar: &Session) {
    let violations = session::ownership_violations(bar);
    if violations.is_empty() {
        println!("[OK] ownership consistent ({} props)", bar.scene.props.props.len());
    } else {
        println!("[!!] ownership violations: {:?}", violations);
    }
}
