//! Turns crossterm key events into per-frame held/pressed key sets.
//!
//! Most terminals only report presses and auto-repeats, never releases. A key
//! is therefore treated as held until a release arrives or, when the terminal
//! cannot report releases, until it goes quiet. Keyboards wait far longer
//! before the first auto-repeat than between repeats, so a fresh key gets
//! `repeat_delay` to produce its first repeat and `hold_timeout` after that.
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use cubeform_core::{FrameInput, KeySet};

/// Key bound to a terminal key code, if any
pub fn key_for(code: KeyCode) -> Option<KeySet> {
    let key = match code {
        KeyCode::Left => KeySet::LEFT,
        KeyCode::Right => KeySet::RIGHT,
        KeyCode::Up => KeySet::UP,
        KeyCode::Down => KeySet::DOWN,
        KeyCode::Esc => KeySet::QUIT,
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => KeySet::W,
            'a' => KeySet::A,
            's' => KeySet::S,
            'd' => KeySet::D,
            'x' => KeySet::X,
            'y' => KeySet::Y,
            'z' => KeySet::Z,
            '=' | '+' => KeySet::INCREASE,
            '-' | '_' => KeySet::DECREASE,
            'r' => KeySet::RESET,
            'f' => KeySet::TOGGLE_SOLID,
            'q' => KeySet::QUIT,
            _ => return None,
        },
        _ => return None,
    };
    Some(key)
}

fn is_shifted(event: &KeyEvent) -> bool {
    event.modifiers.contains(KeyModifiers::SHIFT)
        || matches!(event.code, KeyCode::Char(c) if c.is_ascii_uppercase())
}

/// Longest usual wait before a keyboard's first auto-repeat
pub const DEFAULT_REPEAT_DELAY: Duration = Duration::from_millis(660);

#[derive(Debug, Clone, Copy)]
struct HeldKey {
    last_seen: Instant,
    repeating: bool,
    shifted: bool,
}

#[derive(Debug)]
pub struct KeyTracker {
    hold_timeout: Duration,
    repeat_delay: Duration,
    releases_reported: bool,
    held: HashMap<KeySet, HeldKey>,
    pressed: KeySet,
    interrupted: bool,
}

impl KeyTracker {
    pub fn new(hold_timeout: Duration) -> Self {
        Self {
            hold_timeout,
            repeat_delay: DEFAULT_REPEAT_DELAY,
            releases_reported: false,
            held: HashMap::new(),
            pressed: KeySet::empty(),
            interrupted: false,
        }
    }

    /// How long a key that has not auto-repeated yet stays held
    pub fn with_repeat_delay(mut self, repeat_delay: Duration) -> Self {
        self.repeat_delay = repeat_delay;
        self
    }

    /// Whether the terminal reports key releases (keyboard enhancement on)
    pub fn set_releases_reported(&mut self, reported: bool) {
        self.releases_reported = reported;
    }

    pub fn handle_event(&mut self, event: &KeyEvent, now: Instant) {
        if event.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(event.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            self.interrupted = true;
            return;
        }

        let Some(key) = key_for(event.code) else {
            return;
        };

        match event.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                self.expire(now);
                let repeating = self.held.contains_key(&key);
                if !repeating {
                    self.pressed |= key;
                }
                self.held.insert(
                    key,
                    HeldKey {
                        last_seen: now,
                        repeating,
                        shifted: is_shifted(event),
                    },
                );
            }
            KeyEventKind::Release => {
                self.held.remove(&key);
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        if self.releases_reported {
            return;
        }
        let (hold_timeout, repeat_delay) = (self.hold_timeout, self.repeat_delay);
        self.held.retain(|_, held| {
            let timeout = if held.repeating {
                hold_timeout
            } else {
                repeat_delay.max(hold_timeout)
            };
            now.saturating_duration_since(held.last_seen) <= timeout
        });
    }

    /// Keys held right now, with the modifier folded in
    pub fn held(&mut self, now: Instant) -> KeySet {
        self.expire(now);

        let mut keys = KeySet::empty();
        for (&key, held) in &self.held {
            keys |= key;
            if held.shifted {
                keys |= KeySet::MODIFIER;
            }
        }
        keys
    }

    /// Snapshot for one frame; clears the pressed edges
    pub fn frame_input(&mut self, now: Instant, elapsed: f32) -> FrameInput {
        let held = self.held(now);
        let pressed = std::mem::take(&mut self.pressed);
        let quit_requested = std::mem::take(&mut self.interrupted);

        FrameInput {
            // A tap shorter than a frame still counts for that frame
            held: held | (pressed & !KeySet::TOGGLE_SOLID),
            pressed,
            quit_requested,
            elapsed,
        }
    }
}
