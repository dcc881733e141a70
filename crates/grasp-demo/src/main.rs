//! Headless grasp session: scripted controllers driving the interaction core.
//!
//! Builds a small in-memory scene, then feeds a scripted grab, pinch or dolly
//! session through the fixed-timestep tracking loop and logs what happened
//! to the scene and the camera rig.
//!
//! Run with: `cargo run -p grasp-demo -- --scenario all`

mod scenario;
mod tick_loop;

use clap::Parser;
use glam::{DMat4, DVec3};
use grasp_config::{CliArgs, Config};
use grasp_interaction::{
    InteractionStyle, MemoryScene, MemoryView, ObjectHandle, RenderView, TickReport,
};
use scenario::{CRATE_POSITION, Scenario, Script};
use tick_loop::TickLoop;
use tracing::{debug, info, warn};

/// CLI arguments for the demo binary.
#[derive(Parser, Debug)]
#[command(name = "grasp-demo", about = "Scripted two-controller interaction session")]
struct DemoArgs {
    /// Which interaction to script.
    #[arg(long, value_enum, default_value_t = Scenario::All)]
    scenario: Scenario,

    /// Tracking ticks per scripted phase.
    #[arg(long, default_value_t = 90)]
    ticks: u64,

    /// Simulated display refresh rate in Hz.
    #[arg(long, default_value_t = 72.0)]
    frame_rate: f64,

    #[command(flatten)]
    overrides: CliArgs,
}

fn main() {
    let args = DemoArgs::parse();

    // Only touch the filesystem when a config directory was asked for.
    let (mut config, load_error) = match &args.overrides.config {
        Some(dir) => match Config::load_or_create(dir) {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        },
        None => (Config::default(), None),
    };
    config.apply_cli_overrides(&args.overrides);

    grasp_log::init_logging(
        config.debug.log_dir.as_deref(),
        cfg!(debug_assertions),
        Some(&config),
    );

    if let Some(e) = load_error {
        warn!("Could not load config: {e}; using defaults");
    }
    if let Err(e) = config.validate() {
        warn!("Invalid configuration after overrides: {e}; using defaults");
        config = Config::default();
    }

    info!("grasp demo");
    info!(
        "Scenario: {:?} | {} ticks per phase | tracking {} Hz | display {} Hz",
        args.scenario, args.ticks, config.session.tick_rate_hz, args.frame_rate
    );

    let mut style = InteractionStyle::from_config(&config);
    for conflict in style.input_map().detect_conflicts() {
        info!(
            "Button {:?} drives {:?}",
            conflict.binding.button, conflict.actions
        );
    }

    let world_units = config.interaction.world_units_per_meter;
    let mut view = MemoryView::new(DMat4::from_scale(DVec3::splat(world_units)));
    view.set_visible_bounds(
        DVec3::new(-1.0, 0.0, -2.0) * world_units,
        DVec3::new(1.0, 2.0, 0.0) * world_units,
    );
    style.set_magnification(&mut view, config.interaction.magnification);

    let mut scene = MemoryScene::new();
    let objects = populate(&mut scene, &view);

    let script = Script::new(args.scenario, args.ticks);
    let mut tick_loop = TickLoop::new(config.session.tick_dt(), config.session.max_frame_time_s);
    let frame_time = 1.0 / args.frame_rate.max(1.0);

    let mut next_tick = 0;
    while next_tick < script.total_ticks() {
        tick_loop.frame(frame_time, |_, session_time| {
            if next_tick >= script.total_ticks() {
                return;
            }
            let events = script.events(next_tick);
            let report = style.process_tick(&events, &mut scene, &mut view);
            log_report(next_tick, session_time, &report);
            next_tick += 1;
        });
    }

    info!(
        "Ran {} ticks over {} frames ({:.2}s session, alpha {:.2})",
        tick_loop.tick_count(),
        tick_loop.frame_count(),
        tick_loop.session_time(),
        tick_loop.alpha()
    );
    for (name, object) in objects {
        match scene.world_center(object) {
            Some(center) => info!(
                "{name}: centre ({:.1}, {:.1}, {:.1}), parent chain depth {}",
                center.x,
                center.y,
                center.z,
                scene.parent_chain(object).len()
            ),
            None => warn!("{name}: no longer in the scene"),
        }
    }
    if let Some(p2w) = view.physical_to_world() {
        let eye = p2w.transform_point3(DVec3::ZERO);
        info!(
            "Play-area origin at ({:.1}, {:.1}, {:.1})",
            eye.x, eye.y, eye.z
        );
    }
    if let Some(magnification) = style.magnification(&view) {
        info!("Magnification {magnification:.3}");
    }
    info!("{} render requests", view.render_requests());
}

/// Place the demo objects in world space relative to the current rig.
fn populate(scene: &mut MemoryScene, view: &MemoryView) -> Vec<(&'static str, ObjectHandle)> {
    let p2w = view.physical_to_world().unwrap_or(DMat4::IDENTITY);
    let scale = p2w.x_axis.truncate().length();
    let place = |physical: DVec3| p2w.transform_point3(physical);

    vec![
        (
            "crate",
            scene.add_object("crate", place(CRATE_POSITION), 0.15 * scale),
        ),
        (
            "lamp",
            scene.add_object("lamp", place(DVec3::new(0.8, 1.5, -1.0)), 0.1 * scale),
        ),
        (
            "table",
            scene.add_object("table", place(DVec3::new(-0.6, 0.7, -0.9)), 0.4 * scale),
        ),
    ]
}

fn log_report(tick: u64, session_time: f64, report: &TickReport) {
    for gesture in &report.gesture_edges {
        info!("tick {tick}: gesture {gesture:?}");
    }
    for (device, object) in &report.grabs_started {
        info!("tick {tick}: {device} grabbed {object}");
    }
    debug!(
        tick,
        session_time,
        moved = report.objects_moved,
        world_moved = report.world_moved,
        render = report.render_requested,
        "tick done"
    );
}
