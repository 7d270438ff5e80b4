//! The fixed registry of built-in patterns.
//!
//! Presets are not first-class runtime objects: selecting one copies its
//! pattern into the user program's slot. Names and integer identifiers
//! round-trip losslessly, so successor identifiers stored inside patterns can
//! always be reported back out by name.

use crate::pattern::Pattern;
use crate::types::{Hold, LampState};

const OFF: LampState = LampState::OFF;
const RED: LampState = LampState::new(true, false, false);
const AMBER: LampState = LampState::new(false, true, false);
const GREEN: LampState = LampState::new(false, false, true);

/// Identifier of a built-in pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PresetId {
    /// All lamps dark.
    Off = 0,
    /// Solid red.
    Red = 1,
    /// Solid amber.
    Amber = 2,
    /// Solid green.
    Green = 3,
    /// Red at 1 Hz.
    BlinkRed = 4,
    /// Amber at 1 Hz.
    BlinkAmber = 5,
    /// Green at 1 Hz.
    BlinkGreen = 6,
    /// Red, amber and green cycling.
    Chase = 7,
}

impl PresetId {
    /// Every preset, in identifier order.
    pub const ALL: [PresetId; 8] = [
        PresetId::Off,
        PresetId::Red,
        PresetId::Amber,
        PresetId::Green,
        PresetId::BlinkRed,
        PresetId::BlinkAmber,
        PresetId::BlinkGreen,
        PresetId::Chase,
    ];

    /// Resolves a preset by name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "off" => Some(PresetId::Off),
            "red" => Some(PresetId::Red),
            "amber" => Some(PresetId::Amber),
            "green" => Some(PresetId::Green),
            "blink-red" => Some(PresetId::BlinkRed),
            "blink-amber" => Some(PresetId::BlinkAmber),
            "blink-green" => Some(PresetId::BlinkGreen),
            "chase" => Some(PresetId::Chase),
            _ => None,
        }
    }

    /// Returns the preset's name.
    pub fn name(&self) -> &'static str {
        match self {
            PresetId::Off => "off",
            PresetId::Red => "red",
            PresetId::Amber => "amber",
            PresetId::Green => "green",
            PresetId::BlinkRed => "blink-red",
            PresetId::BlinkAmber => "blink-amber",
            PresetId::BlinkGreen => "blink-green",
            PresetId::Chase => "chase",
        }
    }

    /// Returns the preset's stable integer identifier.
    pub fn index(&self) -> u8 {
        *self as u8
    }

    /// Resolves a preset by its integer identifier. Out-of-range yields `None`.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// Builds a fresh copy of the preset's pattern.
    ///
    /// All built-ins run indefinitely and carry no successor.
    ///
    /// # Panics
    /// Panics if `N` is smaller than the preset's frame count (3 at most).
    pub fn pattern<const N: usize>(&self) -> Pattern<N> {
        let builder = Pattern::builder();
        let builder = match self {
            PresetId::Off => builder.frame(OFF, Hold::Indefinite),
            PresetId::Red => builder.frame(RED, Hold::Indefinite),
            PresetId::Amber => builder.frame(AMBER, Hold::Indefinite),
            PresetId::Green => builder.frame(GREEN, Hold::Indefinite),
            PresetId::BlinkRed => blink(builder, RED),
            PresetId::BlinkAmber => blink(builder, AMBER),
            PresetId::BlinkGreen => blink(builder, GREEN),
            PresetId::Chase => builder
                .frame(RED, Hold::Millis(300))
                .frame(AMBER, Hold::Millis(300))
                .frame(GREEN, Hold::Millis(300)),
        };

        match builder.build() {
            Ok(pattern) => pattern,
            // Every arm above adds at least one frame and leaves the
            // duration indefinite.
            Err(_) => unreachable!(),
        }
    }
}

fn blink<const N: usize>(
    builder: crate::pattern::PatternBuilder<N>,
    lamps: LampState,
) -> crate::pattern::PatternBuilder<N> {
    builder
        .frame(lamps, Hold::Millis(500))
        .frame(OFF, Hold::Millis(500))
}
