//! Terminal front end for the cubeform transform engine
use crossterm::{
    cursor,
    event::{
        self, Event, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use cubeform_core::{Geometry, InputMapper, Rates, Scene};
use log::{debug, info, warn};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod camera;
pub mod config;
pub mod keys;
pub mod renderer;

pub use camera::{Camera, ProjectionMode};
pub use config::{load_config, Config, ConfigError};
pub use keys::KeyTracker;
pub use renderer::AsciiRenderer;

pub const WINDOW_TITLE: &str = "Cube Transformations";

/// Rows reserved above the picture for the status line
const HUD_ROWS: u16 = 1;

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    scene: Scene,
    renderer: AsciiRenderer,
    keys: KeyTracker,
    frame_time: Duration,
    last_fps_sample: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(config: &Config) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let rows = height.saturating_sub(HUD_ROWS);

        let camera = Camera::new(width as u32, rows as u32)
            .with_distance(config.display.camera_distance)
            .with_fov_degrees(config.display.fov_degrees)
            .with_mode(config.display.projection);

        let scene = Scene::new(Geometry::cube(), InputMapper::new(Rates::from(&config.rates)))
            .with_max_frame_time(config.input.max_frame_time)
            .with_solid(config.display.solid);

        Ok(Self {
            scene,
            renderer: AsciiRenderer::new(width as usize, rows as usize, camera),
            keys: KeyTracker::new(config.input.hold_timeout())
                .with_repeat_delay(config.input.repeat_delay()),
            frame_time: config.frame_time(),
            last_fps_sample: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        // Restores the terminal on every exit path from here on
        let mut guard = TerminalGuard::new(stdout());
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::SetTitle(WINDOW_TITLE)
        )?;

        // Release events make held keys exact instead of timeout based
        let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if enhanced {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            guard.enhanced = true;
        }
        self.keys.set_releases_reported(enhanced);
        info!("terminal ready, key release events: {}", enhanced);

        let result = self.main_loop();
        let restored = guard.restore();
        result.and(restored)
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let mut previous = Instant::now();

        while self.scene.is_running() {
            let frame_start = Instant::now();
            let elapsed = frame_start.duration_since(previous).as_secs_f32();
            previous = frame_start;

            // Handle input
            self.poll_events()?;
            let input = self.keys.frame_input(Instant::now(), elapsed);

            // Update
            self.scene.step(&input);
            if !self.scene.is_running() {
                break;
            }

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let spent = frame_start.elapsed();
            if spent < self.frame_time {
                std::thread::sleep(self.frame_time - spent);
            }

            // Update FPS counter
            let now = Instant::now();
            let window = now - self.last_fps_sample;
            if window.as_secs() >= 1 {
                self.fps = self.frame_count as f32 / window.as_secs_f32();
                self.frame_count = 0;
                self.last_fps_sample = now;
            }
        }

        info!("frame loop stopped");
        Ok(())
    }

    fn poll_events(&mut self) -> io::Result<()> {
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) => self.keys.handle_event(&key, Instant::now()),
                Event::Resize(width, height) => {
                    let rows = height.saturating_sub(HUD_ROWS);
                    debug!("resized to {}x{}", width, rows);
                    self.renderer.resize(width as usize, rows as usize);
                    queue!(stdout(), terminal::Clear(ClearType::All))?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn render(&mut self) -> io::Result<()> {
        self.renderer.clear();
        self.scene.render(&mut self.renderer);

        // Output to terminal
        let mut stdout = stdout();
        self.renderer.draw(&mut stdout, HUD_ROWS)?;

        // Draw UI overlay
        let mode = if self.scene.is_solid() { "solid" } else { "wire" };
        let mut status = format!(
            "{} | FPS: {:.1} | {} | Arrows=Rotate (Shift: Z) WASD=Move (Shift: Z) +/-=Scale (X/Y/Z lock) R=Reset F=Fill Q=Quit",
            WINDOW_TITLE, self.fps, mode
        );
        status.truncate(self.renderer.width());
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(status),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

/// Undoes raw mode, the alternate screen and keyboard enhancement
struct TerminalGuard<W: Write> {
    out: W,
    enhanced: bool,
    active: bool,
}

impl<W: Write> TerminalGuard<W> {
    fn new(out: W) -> Self {
        Self {
            out,
            enhanced: false,
            active: true,
        }
    }

    /// Run every cleanup step, reporting the first failure
    fn restore(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        let pop = if self.enhanced {
            execute!(self.out, PopKeyboardEnhancementFlags)
        } else {
            Ok(())
        };
        let raw = terminal::disable_raw_mode();
        let screen = execute!(self.out, terminal::LeaveAlternateScreen, cursor::Show);
        pop.and(raw).and(screen)
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            warn!("failed to restore terminal: {}", err);
        }
    }
}
