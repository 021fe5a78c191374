//! Headless demo: a small warehouse with two guards and a sprinting player
//!
//! Set `RUST_LOG=debug` to follow guard state changes.

use std::error::Error;

use stealth_nav::prelude::*;

const DT: f32 = 1.0 / 60.0;
const FRAMES: u32 = 60 * 20;

fn build_level() -> Result<Level, NavError> {
    let config = LevelConfig::default().with_half_size(30.0, 20.0);
    let mut level = Level::new(config, 0x5eed);

    // Shelving rows
    for i in -2..=2 {
        let x = i as f32 * 10.0;
        level.spawn_static_box(Vec2::new(x, 6.0), 0.0, Vec2::new(1.5, 8.0));
    }
    level.spawn_static_box(Vec2::new(0.0, -12.0), 0.3, Vec2::new(6.0, 1.0));

    level.build_navigation()?;
    level.spawn_guard(Vec2::new(-25.0, -15.0))?;
    level.spawn_guard(Vec2::new(25.0, 15.0))?;
    level.spawn_player(Vec2::new(-25.0, 15.0));
    Ok(level)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut level = build_level()?;
    if let Some(nav) = level.navigation() {
        log::info!(
            "Navigation mesh: {} vertices, {} faces",
            nav.mesh().vertex_count(),
            nav.mesh().face_count()
        );
    }

    let route = [
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, -1.0),
        Vec2::new(1.0, 0.2),
        Vec2::new(0.0, 1.0),
    ];
    let mut debug = DebugLines::new();
    for frame in 0..FRAMES {
        let leg = (frame / (FRAMES / route.len() as u32)) as usize % route.len();
        level.set_player_input(PlayerInput {
            movement: route[leg],
            aim: Vec2::ZERO,
            sprint: frame % 240 < 120,
        });
        level.update(DT);

        if frame % 120 == 0 {
            debug.clear();
            level.debug_render(&mut debug);
            log::info!(
                "t={:.1}s captures={} debug_lines={}",
                frame as f32 * DT,
                level.captures(),
                debug.line_count()
            );
        }
    }

    log::info!("Finished with {} captures", level.captures());
    Ok(())
}
