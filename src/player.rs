//! Pattern player with timing control.
//!
//! Provides [`PatternPlayer`] which advances a pattern against a running
//! clock, producing lamp-state changes and pattern-expiry signals. Also
//! defines the [`SignalLamps`] trait for hardware abstraction.

use crate::pattern::Pattern;
use crate::time::{TimeInstant, TimeSource};
use crate::types::LampState;

/// Trait for abstracting the signal-stack lamp hardware.
///
/// Implement this for your output stage (GPIO, relay driver, shift register,
/// etc.). Handle any hardware errors internally - this method cannot fail.
pub trait SignalLamps {
    /// Drives the three lamps to the given state.
    fn set_lamps(&mut self, lamps: LampState);
}

/// Transient playback state for the currently installed pattern.
#[derive(Debug, Clone, Copy)]
struct PlayerState<I> {
    frame_index: usize,
    frame_started: I,
    pattern_started: I,
}

/// What one player operation observably did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// New lamp output, if it changed this tick.
    pub lamps: Option<LampState>,

    /// The pattern's own duration has elapsed.
    ///
    /// The caller decides what happens next, normally by consulting the
    /// pattern's successor preset and installing it. The player itself never
    /// switches programs.
    pub expired: bool,
}

/// Advances a pattern against a running clock and drives the lamp hardware.
///
/// The player owns only transient playback state; the pattern being played is
/// borrowed per call. Whoever owns the patterns must call [`install`] every
/// time the played pattern is replaced - `service` assumes the pattern it is
/// handed is the one that was installed.
///
/// [`install`]: PatternPlayer::install
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Time instant type
/// * `L` - Lamp hardware implementation type
/// * `T` - Time source implementation type
pub struct PatternPlayer<'t, I: TimeInstant, L: SignalLamps, T: TimeSource<I>> {
    lamps: L,
    time_source: &'t T,
    state: Option<PlayerState<I>>,
    current: LampState,
}

impl<'t, I: TimeInstant, L: SignalLamps, T: TimeSource<I>> PatternPlayer<'t, I, L, T> {
    /// Creates a new player with all lamps dark.
    pub fn new(mut lamps: L, time_source: &'t T) -> Self {
        lamps.set_lamps(LampState::OFF);

        Self {
            lamps,
            time_source,
            state: None,
            current: LampState::OFF,
        }
    }

    /// Installs a pattern, resetting playback state.
    ///
    /// The "init" event: the frame index returns to 0, both timestamps become
    /// "now", and frame 0's output takes effect immediately without waiting
    /// for its duration - a freshly installed pattern's first frame is always
    /// observed, regardless of tick timing.
    pub fn install<const N: usize>(&mut self, pattern: &Pattern<N>) -> TickReport {
        let now = self.time_source.now();
        self.state = Some(PlayerState {
            frame_index: 0,
            frame_started: now,
            pattern_started: now,
        });

        TickReport {
            lamps: self.apply(pattern.frames()[0].lamps),
            expired: false,
        }
    }

    /// Advances the installed pattern by one tick.
    ///
    /// Pattern expiry is evaluated every tick, independently of frame
    /// boundaries, so a pattern may expire mid-frame. It is checked before
    /// frame advance: an expired pattern is about to be replaced, and
    /// emitting one last frame of it would only be overwritten by the
    /// successor's frame 0.
    ///
    /// Both comparisons are strictly greater-than; elapsed time exactly equal
    /// to a duration does not yet advance it.
    pub fn service<const N: usize>(&mut self, pattern: &Pattern<N>) -> TickReport {
        let Some(mut state) = self.state else {
            return TickReport::default();
        };
        let now = self.time_source.now();

        if pattern
            .duration()
            .is_elapsed(now.millis_since(state.pattern_started))
        {
            return TickReport {
                lamps: None,
                expired: true,
            };
        }

        let frame = &pattern.frames()[state.frame_index];
        if frame.hold.is_elapsed(now.millis_since(state.frame_started)) {
            state.frame_index = (state.frame_index + 1) % pattern.frame_count();
            state.frame_started = now;
            self.state = Some(state);

            return TickReport {
                lamps: self.apply(pattern.frames()[state.frame_index].lamps),
                expired: false,
            };
        }

        TickReport::default()
    }

    /// Returns the lamp output currently on the hardware.
    pub fn current_lamps(&self) -> LampState {
        self.current
    }

    /// Writes to the hardware only when the output actually changes.
    fn apply(&mut self, lamps: LampState) -> Option<LampState> {
        if lamps == self.current {
            return None;
        }

        self.lamps.set_lamps(lamps);
        self.current = lamps;
        Some(lamps)
    }
}
