//! Drives the scene through the key tracker and rasterizer without a terminal.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use cubeform_core::{Geometry, InputMapper, Rates, Scene};
use cubeform_terminal::{AsciiRenderer, Camera, Config, KeyTracker};

const FRAME: Duration = Duration::from_millis(16);

fn press(code: KeyCode) -> KeyEvent {
    KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press)
}

fn keys_from(config: &Config) -> KeyTracker {
    KeyTracker::new(config.input.hold_timeout()).with_repeat_delay(config.input.repeat_delay())
}

fn scene_from(config: &Config) -> Scene {
    Scene::new(Geometry::cube(), InputMapper::new(Rates::from(&config.rates)))
        .with_max_frame_time(config.input.max_frame_time)
        .with_solid(config.display.solid)
}

#[test]
fn moving_right_shifts_the_picture() {
    let config = Config::default();
    let mut scene = scene_from(&config);
    let mut keys = keys_from(&config);
    keys.set_releases_reported(true);

    let mut renderer = AsciiRenderer::new(80, 24, Camera::new(80, 24));
    scene.render(&mut renderer);
    assert!(renderer.covered_cells() > 0);
    assert!((0..24).all(|y| renderer.cell(70, y).ch == ' '));

    let mut now = Instant::now();
    keys.handle_event(&press(KeyCode::Char('d')), now);
    for _ in 0..180 {
        now += FRAME;
        let input = keys.frame_input(now, FRAME.as_secs_f32());
        scene.step(&input);
    }

    // 180 frames of 16 ms at 1 unit/s
    let x = scene.model_matrix()[(0, 3)];
    assert!((x - 2.88).abs() < 1e-3, "moved to {}", x);

    renderer.clear();
    scene.render(&mut renderer);
    // The whole cube now sits in the right half of the screen
    let left_half: usize = (0..24)
        .flat_map(|y| (0..40).map(move |x| (x, y)))
        .filter(|&(x, y)| renderer.cell(x, y).ch != ' ')
        .count();
    assert_eq!(left_half, 0);
    assert!(renderer.covered_cells() > 0);
}

#[test]
fn fill_key_toggles_once_per_press() {
    let config = Config::default();
    let mut scene = scene_from(&config);
    let mut keys = keys_from(&config);

    let mut now = Instant::now();
    keys.handle_event(&press(KeyCode::Char('f')), now);
    scene.step(&keys.frame_input(now, 0.016));
    assert!(scene.is_solid());

    // Auto-repeat of the same key keeps it held without toggling again
    for _ in 0..5 {
        now += FRAME;
        keys.handle_event(&press(KeyCode::Char('f')), now);
        scene.step(&keys.frame_input(now, 0.016));
    }
    assert!(scene.is_solid());
}

#[test]
fn quit_key_stops_the_scene() {
    let config = Config::default();
    let mut scene = scene_from(&config);
    let mut keys = keys_from(&config);

    let now = Instant::now();
    keys.handle_event(&press(KeyCode::Esc), now);
    scene.step(&keys.frame_input(now, 0.016));
    assert!(!scene.is_running());
}

#[test]
fn holding_keys_through_slow_first_repeat() {
    let config = Config::default();
    let mut scene = scene_from(&config);
    let mut keys = keys_from(&config);

    // Like a plain terminal: one press, then auto-repeat kicks in at 500 ms
    let start = Instant::now();
    let mut events: Vec<(Instant, KeyCode)> = Vec::new();
    for code in [KeyCode::Char('f'), KeyCode::Char('d')] {
        events.push((start, code));
        events.extend((0..20).map(|i| (start + Duration::from_millis(500 + 33 * i), code)));
    }
    events.sort_by_key(|&(at, _)| at);

    let mut toggles = 0;
    let mut frames_moving = 0;
    let mut frames = 0;
    let mut next = 0;
    let mut now = start;
    let mut solid = scene.is_solid();
    while now < start + Duration::from_millis(1100) {
        while next < events.len() && events[next].0 <= now {
            keys.handle_event(&press(events[next].1), events[next].0);
            next += 1;
        }

        let before = scene.model_matrix()[(0, 3)];
        scene.step(&keys.frame_input(now, FRAME.as_secs_f32()));
        if scene.model_matrix()[(0, 3)] > before {
            frames_moving += 1;
        }
        if scene.is_solid() != solid {
            toggles += 1;
            solid = scene.is_solid();
        }

        frames += 1;
        now += FRAME;
    }

    assert_eq!(toggles, 1);
    assert_eq!(frames_moving, frames);
}
