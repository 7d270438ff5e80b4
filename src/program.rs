//! Program selection: which pattern source currently owns the lamps.
//!
//! A program is a named slot in a fixed enumeration. Status programs display
//! connectivity conditions through statically defined patterns; the single
//! user program displays whatever preset or definition was installed last.
//! The [`ProgramSelector`] owns all of it and is the only component that
//! switches what the player plays.

use crate::pattern::Pattern;
use crate::player::{PatternPlayer, SignalLamps};
use crate::presets::PresetId;
use crate::time::{TimeInstant, TimeSource};
use crate::types::{Hold, LampState};

const AMBER: LampState = LampState::new(false, true, false);
const RED: LampState = LampState::new(true, false, false);

/// Identifier of a program slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProgramId {
    /// All lamps dark. The initial program.
    Off,
    /// Joining the configured network.
    WifiConnecting,
    /// Provisioning hotspot is active.
    WifiHotspot,
    /// Network association failed.
    WifiError,
    /// Connecting to the message broker.
    MqttConnecting,
    /// Broker connection failed.
    MqttError,
    /// The user-controlled pattern.
    User,
}

impl ProgramId {
    /// Returns the program's name as reported over the wire.
    pub fn name(&self) -> &'static str {
        match self {
            ProgramId::Off => "off",
            ProgramId::WifiConnecting => "wifi-connecting",
            ProgramId::WifiHotspot => "wifi-hotspot",
            ProgramId::WifiError => "wifi-error",
            ProgramId::MqttConnecting => "mqtt-connecting",
            ProgramId::MqttError => "mqtt-error",
            ProgramId::User => "user",
        }
    }
}

/// What one selector operation observably did.
///
/// Drives the adapter's notification contract: one `state` message per lamp
/// change, one `program` message per program switch, one `pattern` message
/// per install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StackUpdate {
    /// New lamp output, if it changed.
    pub lamps: Option<LampState>,

    /// The program that became active, if a switch occurred.
    pub program: Option<ProgramId>,

    /// A pattern was installed into the user slot.
    pub pattern_installed: bool,
}

/// Chooses which pattern source is currently played.
///
/// Owns the current program id, the immutable status pattern table, the one
/// live user pattern, and the player. Any program may follow any other; the
/// callers (connectivity events, remote commands, pattern expiry) decide when
/// transitions occur.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Time instant type
/// * `L` - Lamp hardware implementation type
/// * `T` - Time source implementation type
/// * `N` - Maximum number of frames in patterns
pub struct ProgramSelector<'t, I: TimeInstant, L: SignalLamps, T: TimeSource<I>, const N: usize> {
    player: PatternPlayer<'t, I, L, T>,
    status: [Pattern<N>; 6],
    user: Pattern<N>,
    current: ProgramId,
}

impl<'t, I: TimeInstant, L: SignalLamps, T: TimeSource<I>, const N: usize>
    ProgramSelector<'t, I, L, T, N>
{
    /// Creates a selector in the `Off` program with all lamps dark.
    ///
    /// # Panics
    /// Panics if `N < 3` (too small for the built-in patterns).
    pub fn new(lamps: L, time_source: &'t T) -> Self {
        let mut player = PatternPlayer::new(lamps, time_source);
        let status = status_patterns();
        player.install(&status[0]);

        Self {
            player,
            status,
            user: PresetId::Off.pattern(),
            current: ProgramId::Off,
        }
    }

    /// Switches to the given program.
    ///
    /// No-op when `id` is already current; otherwise the program's pattern is
    /// installed with init semantics.
    pub fn set_program(&mut self, id: ProgramId) -> StackUpdate {
        if id == self.current {
            return StackUpdate::default();
        }

        self.current = id;
        let pattern = pattern_for(&self.status, &self.user, id);
        let report = self.player.install(pattern);

        StackUpdate {
            lamps: report.lamps,
            program: Some(id),
            pattern_installed: false,
        }
    }

    /// Replaces the user pattern and makes it active immediately.
    ///
    /// Always switches to the `User` program (even when already there) and
    /// re-inits the player, pre-empting whatever was previously running. This
    /// is how presets and definitions take effect.
    pub fn install_user_pattern(&mut self, pattern: Pattern<N>) -> StackUpdate {
        let switched = self.current != ProgramId::User;
        self.current = ProgramId::User;
        self.user = pattern;
        let report = self.player.install(&self.user);

        StackUpdate {
            lamps: report.lamps,
            program: switched.then_some(ProgramId::User),
            pattern_installed: true,
        }
    }

    /// Advances the active program by one tick.
    ///
    /// Only the active program is advanced; background programs produce no
    /// output and cost no work. When the active pattern expires, its
    /// successor preset is installed as the user pattern. A missing successor
    /// falls back to `off` - unreachable for validated patterns, kept as an
    /// invariant guard.
    pub fn service(&mut self) -> StackUpdate {
        let pattern = pattern_for(&self.status, &self.user, self.current);
        let report = self.player.service(pattern);

        if report.expired {
            let successor = match pattern.successor() {
                Some(preset) => preset,
                None => {
                    log::warn!("expired pattern names no successor, falling back to off");
                    PresetId::Off
                }
            };
            return self.install_user_pattern(successor.pattern());
        }

        StackUpdate {
            lamps: report.lamps,
            program: None,
            pattern_installed: false,
        }
    }

    /// Returns the active program.
    pub fn current_program(&self) -> ProgramId {
        self.current
    }

    /// Returns the pattern currently in the user slot.
    pub fn user_pattern(&self) -> &Pattern<N> {
        &self.user
    }

    /// Returns the lamp output currently on the hardware.
    pub fn current_lamps(&self) -> LampState {
        self.player.current_lamps()
    }
}

fn pattern_for<'a, const N: usize>(
    status: &'a [Pattern<N>; 6],
    user: &'a Pattern<N>,
    id: ProgramId,
) -> &'a Pattern<N> {
    match id {
        ProgramId::Off => &status[0],
        ProgramId::WifiConnecting => &status[1],
        ProgramId::WifiHotspot => &status[2],
        ProgramId::WifiError => &status[3],
        ProgramId::MqttConnecting => &status[4],
        ProgramId::MqttError => &status[5],
        ProgramId::User => user,
    }
}

/// Builds the fixed status pattern table, indexed as in [`pattern_for`].
fn status_patterns<const N: usize>() -> [Pattern<N>; 6] {
    [
        PresetId::Off.pattern(),
        status_blink(AMBER, 500),
        solid(AMBER),
        status_blink(RED, 250),
        status_blink(AMBER, 250),
        status_blink(RED, 500),
    ]
}

fn solid<const N: usize>(lamps: LampState) -> Pattern<N> {
    match Pattern::builder().frame(lamps, Hold::Indefinite).build() {
        Ok(pattern) => pattern,
        Err(_) => unreachable!(),
    }
}

fn status_blink<const N: usize>(lamps: LampState, half_period_ms: u32) -> Pattern<N> {
    match Pattern::builder()
        .frame(lamps, Hold::Millis(half_period_ms))
        .frame(LampState::OFF, Hold::Millis(half_period_ms))
        .build()
    {
        Ok(pattern) => pattern,
        Err(_) => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Millis;
    use core::cell::Cell;

    struct MockLamps;

    impl SignalLamps for MockLamps {
        fn set_lamps(&mut self, _lamps: LampState) {}
    }

    struct MockTimeSource {
        current_time: Cell<u32>,
    }

    impl MockTimeSource {
        fn new() -> Self {
            Self {
                current_time: Cell::new(0),
            }
        }

        fn advance(&self, millis: u32) {
            self.current_time
                .set(self.current_time.get().wrapping_add(millis));
        }
    }

    impl TimeSource<Millis> for MockTimeSource {
        fn now(&self) -> Millis {
            Millis(self.current_time.get())
        }
    }

    fn selector(
        clock: &MockTimeSource,
    ) -> ProgramSelector<'_, Millis, MockLamps, MockTimeSource, 32> {
        ProgramSelector::new(MockLamps, clock)
    }

    const RED: LampState = LampState::new(true, false, false);

    #[test]
    fn starts_in_off_program_with_dark_lamps() {
        let clock = MockTimeSource::new();
        let selector = selector(&clock);

        assert_eq!(selector.current_program(), ProgramId::Off);
        assert_eq!(selector.current_lamps(), LampState::OFF);
    }

    #[test]
    fn set_program_switches_and_reports_the_switch() {
        let clock = MockTimeSource::new();
        let mut selector = selector(&clock);

        let update = selector.set_program(ProgramId::WifiConnecting);
        assert_eq!(update.program, Some(ProgramId::WifiConnecting));
        assert_eq!(update.lamps, Some(LampState::new(false, true, false)));
        assert!(!update.pattern_installed);
    }

    #[test]
    fn set_program_is_a_no_op_when_already_current() {
        let clock = MockTimeSource::new();
        let mut selector = selector(&clock);
        selector.set_program(ProgramId::WifiError);

        let update = selector.set_program(ProgramId::WifiError);
        assert_eq!(update, StackUpdate::default());
    }

    #[test]
    fn any_program_may_follow_any_other() {
        let clock = MockTimeSource::new();
        let mut selector = selector(&clock);

        for id in [
            ProgramId::MqttError,
            ProgramId::WifiHotspot,
            ProgramId::User,
            ProgramId::WifiConnecting,
            ProgramId::Off,
        ] {
            let update = selector.set_program(id);
            assert_eq!(update.program, Some(id));
            assert_eq!(selector.current_program(), id);
        }
    }

    #[test]
    fn install_user_pattern_pre_empts_status_display() {
        let clock = MockTimeSource::new();
        let mut selector = selector(&clock);
        selector.set_program(ProgramId::MqttConnecting);

        let update = selector.install_user_pattern(PresetId::Red.pattern());
        assert_eq!(selector.current_program(), ProgramId::User);
        assert_eq!(update.program, Some(ProgramId::User));
        assert!(update.pattern_installed);
        assert_eq!(update.lamps, Some(RED));
    }

    #[test]
    fn reinstall_into_user_program_reports_no_switch() {
        let clock = MockTimeSource::new();
        let mut selector = selector(&clock);
        selector.install_user_pattern(PresetId::Red.pattern());

        let update = selector.install_user_pattern(PresetId::Green.pattern());
        assert_eq!(update.program, None);
        assert!(update.pattern_installed);
        assert_eq!(update.lamps, Some(LampState::new(false, false, true)));
    }

    #[test]
    fn reinstall_restarts_the_pattern_from_frame_zero() {
        let clock = MockTimeSource::new();
        let mut selector = selector(&clock);
        selector.install_user_pattern(PresetId::BlinkRed.pattern());

        clock.advance(501);
        selector.service();
        assert_eq!(selector.current_lamps(), LampState::OFF);

        // Installing the same preset again re-inits: frame 0 shows at once.
        let update = selector.install_user_pattern(PresetId::BlinkRed.pattern());
        assert_eq!(update.lamps, Some(RED));
    }

    #[test]
    fn expired_pattern_hands_over_to_its_successor() {
        let clock = MockTimeSource::new();
        let mut selector = selector(&clock);
        let pattern = Pattern::<32>::builder()
            .frame(RED, Hold::Millis(200))
            .frame(LampState::OFF, Hold::Millis(200))
            .duration(Hold::Millis(1500))
            .successor(PresetId::Off)
            .build()
            .unwrap();
        selector.install_user_pattern(pattern);

        clock.advance(1501);
        let update = selector.service();

        assert_eq!(selector.current_program(), ProgramId::User);
        assert!(update.pattern_installed);
        assert_eq!(selector.user_pattern(), &PresetId::Off.pattern());
        assert_eq!(selector.current_lamps(), LampState::OFF);
    }

    #[test]
    fn status_patterns_never_expire() {
        let clock = MockTimeSource::new();
        let mut selector = selector(&clock);
        selector.set_program(ProgramId::WifiError);

        clock.advance(60 * 60 * 1000);
        let update = selector.service();
        assert!(!update.pattern_installed);
        assert_eq!(selector.current_program(), ProgramId::WifiError);
    }

    #[test]
    fn service_advances_only_the_active_program() {
        let clock = MockTimeSource::new();
        let mut selector = selector(&clock);
        selector.install_user_pattern(PresetId::BlinkAmber.pattern());

        clock.advance(501);
        let update = selector.service();
        assert_eq!(update.lamps, Some(LampState::OFF));
        assert_eq!(update.program, None);
    }
}
