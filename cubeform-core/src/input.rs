//! Maps a snapshot of held keys to at most one transform delta per frame.
//!
//! The mapping is a fixed, ordered rule table. Rules are checked top to
//! bottom and the first guard that holds wins; every rule below it is skipped
//! for that frame even if its keys are also down. Which keys were pressed
//! first never matters, only their position in [`RULES`].
use bitflags::bitflags;
use log::trace;
use nalgebra::Vector3;

use crate::transform::Axis;

bitflags! {
    /// Named keys the mapper understands
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeySet: u32 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const UP = 1 << 2;
        const DOWN = 1 << 3;
        const W = 1 << 4;
        const A = 1 << 5;
        const S = 1 << 6;
        const D = 1 << 7;
        const X = 1 << 8;
        const Y = 1 << 9;
        const Z = 1 << 10;
        const INCREASE = 1 << 11;
        const DECREASE = 1 << 12;
        /// Switches vertical rotation to Z and W/S translation to Z
        const MODIFIER = 1 << 13;
        const RESET = 1 << 14;
        const TOGGLE_SOLID = 1 << 15;
        const QUIT = 1 << 16;
    }
}

/// One incremental change to the transform state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeltaOp {
    Rotate { axis: Axis, degrees: f32 },
    Translate(Vector3<f32>),
    Scale(Vector3<f32>),
    Reset,
}

/// Per-second rates, multiplied by the frame's elapsed time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    pub rotate_degrees_per_sec: f32,
    pub translate_units_per_sec: f32,
    /// Scale factor per frame is `1 +/- scale_rate_per_sec * dt`
    pub scale_rate_per_sec: f32,
}

impl Default for Rates {
    fn default() -> Self {
        Self {
            rotate_degrees_per_sec: 90.0,
            translate_units_per_sec: 1.0,
            scale_rate_per_sec: 0.5,
        }
    }
}

/// What a rule does once its guard holds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Rotate about `axis`, or `modified` while the modifier is held
    Rotate { axis: Axis, modified: Axis, sign: f32 },
    /// Move along `direction`, or `modified` while the modifier is held
    Translate { direction: [f32; 3], modified: [f32; 3] },
    /// Scale one axis, or all three when `axis` is `None`
    Scale { axis: Option<Axis>, sign: f32 },
    Reset,
}

impl Action {
    fn delta(&self, keys: KeySet, rates: &Rates, dt: f32) -> DeltaOp {
        let modified = keys.contains(KeySet::MODIFIER);
        match *self {
            Action::Rotate {
                axis,
                modified: alt,
                sign,
            } => DeltaOp::Rotate {
                axis: if modified { alt } else { axis },
                degrees: sign * rates.rotate_degrees_per_sec * dt,
            },
            Action::Translate {
                direction,
                modified: alt,
            } => {
                let direction = Vector3::from(if modified { alt } else { direction });
                DeltaOp::Translate(direction * rates.translate_units_per_sec * dt)
            }
            Action::Scale { axis, sign } => {
                let factor = 1.0 + sign * rates.scale_rate_per_sec * dt;
                let factors = match axis {
                    Some(axis) => {
                        let mut factors = Vector3::repeat(1.0);
                        factors[axis as usize] = factor;
                        factors
                    }
                    None => Vector3::repeat(factor),
                };
                DeltaOp::Scale(factors)
            }
            Action::Reset => DeltaOp::Reset,
        }
    }
}

/// A guard over held keys and the action it triggers.
///
/// The guard holds when every key in `requires` is down and none of
/// `excludes` is.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub requires: KeySet,
    pub excludes: KeySet,
    pub action: Action,
}

impl Rule {
    pub fn holds(&self, keys: KeySet) -> bool {
        keys.contains(self.requires) && !keys.intersects(self.excludes)
    }
}

const AXIS_LOCKS: KeySet = KeySet::X.union(KeySet::Y).union(KeySet::Z);

const fn rotate(name: &'static str, key: KeySet, axis: Axis, modified: Axis, sign: f32) -> Rule {
    Rule {
        name,
        requires: key,
        excludes: KeySet::empty(),
        action: Action::Rotate {
            axis,
            modified,
            sign,
        },
    }
}

const fn translate(
    name: &'static str,
    key: KeySet,
    direction: [f32; 3],
    modified: [f32; 3],
) -> Rule {
    Rule {
        name,
        requires: key,
        excludes: KeySet::empty(),
        action: Action::Translate {
            direction,
            modified,
        },
    }
}

const fn scale(
    name: &'static str,
    requires: KeySet,
    excludes: KeySet,
    axis: Option<Axis>,
    sign: f32,
) -> Rule {
    Rule {
        name,
        requires,
        excludes,
        action: Action::Scale { axis, sign },
    }
}

/// The input rules in precedence order, highest first
pub static RULES: [Rule; 17] = [
    rotate("rotate-left", KeySet::LEFT, Axis::Y, Axis::Y, -1.0),
    rotate("rotate-right", KeySet::RIGHT, Axis::Y, Axis::Y, 1.0),
    rotate("rotate-up", KeySet::UP, Axis::X, Axis::Z, -1.0),
    rotate("rotate-down", KeySet::DOWN, Axis::X, Axis::Z, 1.0),
    translate("move-forward", KeySet::W, [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
    translate("move-back", KeySet::S, [0.0, -1.0, 0.0], [0.0, 0.0, -1.0]),
    translate("move-left", KeySet::A, [-1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]),
    translate("move-right", KeySet::D, [1.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
    scale("grow-x", KeySet::X.union(KeySet::INCREASE), KeySet::empty(), Some(Axis::X), 1.0),
    scale("shrink-x", KeySet::X.union(KeySet::DECREASE), KeySet::empty(), Some(Axis::X), -1.0),
    scale("grow-y", KeySet::Y.union(KeySet::INCREASE), KeySet::empty(), Some(Axis::Y), 1.0),
    scale("shrink-y", KeySet::Y.union(KeySet::DECREASE), KeySet::empty(), Some(Axis::Y), -1.0),
    scale("grow-z", KeySet::Z.union(KeySet::INCREASE), KeySet::empty(), Some(Axis::Z), 1.0),
    scale("shrink-z", KeySet::Z.union(KeySet::DECREASE), KeySet::empty(), Some(Axis::Z), -1.0),
    scale("grow", KeySet::INCREASE, AXIS_LOCKS, None, 1.0),
    scale("shrink", KeySet::DECREASE, AXIS_LOCKS, None, -1.0),
    Rule {
        name: "reset",
        requires: KeySet::RESET,
        excludes: KeySet::empty(),
        action: Action::Reset,
    },
];

/// Evaluates [`RULES`] with a set of rates
#[derive(Debug, Clone, Default)]
pub struct InputMapper {
    rates: Rates,
}

impl InputMapper {
    pub fn new(rates: Rates) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &Rates {
        &self.rates
    }

    /// The first rule whose guard holds for `keys`
    pub fn matching_rule(&self, keys: KeySet) -> Option<&'static Rule> {
        RULES.iter().find(|rule| rule.holds(keys))
    }

    /// Delta for this frame, or `None` when no rule fires
    pub fn map(&self, keys: KeySet, elapsed: f32) -> Option<DeltaOp> {
        let rule = self.matching_rule(keys)?;
        let delta = rule.action.delta(keys, &self.rates, elapsed);
        trace!("rule {} fired: {:?}", rule.name, delta);
        Some(delta)
    }
}
