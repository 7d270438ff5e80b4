//! The remote-control surface: command parsing, dispatch, notifications.
//!
//! The adapter is transport-agnostic. Inbound, the embedding hands every
//! received message to [`Topics::parse_command`] and forwards the result to
//! [`ControlAdapter::handle_command`]; outbound, the adapter publishes
//! through the [`NotificationSink`] trait. Connectivity-status events bypass
//! the command path and drive the program selector directly.
//!
//! Side-effect contract: exactly one `state` notification per lamp-output
//! change, one `program` notification per program switch, one `pattern`
//! notification per successful pattern install. Failed or ignored commands
//! publish nothing; they are only logged locally.

use core::fmt::Write;

use heapless::{String, Vec};
use serde::Serialize;

use crate::definition::{self, ValidationError};
use crate::pattern::Pattern;
use crate::player::SignalLamps;
use crate::presets::PresetId;
use crate::program::{ProgramId, ProgramSelector, StackUpdate};
use crate::time::{TimeInstant, TimeSource};
use crate::types::Hold;

/// Identity payload published while the device is reachable.
pub const ONLINE: &str = "online";

/// Identity payload the transport should register as its last will, so the
/// broker reports the device `offline` on ungraceful disconnect.
pub const OFFLINE: &str = "offline";

/// Maximum length of a topic string.
pub const TOPIC_CAPACITY: usize = 64;

/// Serialization buffer for the `pattern` notification payload.
const PATTERN_PAYLOAD_CAPACITY: usize = 2048;

/// A short stable device identifier derived from hardware identity.
///
/// Deterministic per physical unit and short enough for the addressing slot
/// of the command namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceId(String<16>);

impl DeviceId {
    /// Derives the identifier from a hardware identity word, e.g. the low
    /// bits of a MAC address or a chip serial.
    pub fn from_hardware(hardware_id: u32) -> Self {
        let mut id = String::new();
        let _ = write!(id, "stack-{:06x}", hardware_id & 0x00FF_FFFF);
        DeviceId(id)
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inbound remote command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Announce identity; no state change.
    Identify,
    /// Install the named preset as the user pattern.
    Preset(&'a str),
    /// Validate and install a definition document as the user pattern.
    Definition(&'a [u8]),
}

/// The device's slice of the topic namespace.
///
/// Commands arrive on `<root>/<all|deviceId>/<command>`; notifications leave
/// on `<root>/<deviceId>/<suffix>`.
#[derive(Debug, Clone)]
pub struct Topics {
    root: &'static str,
    device: DeviceId,
}

impl Topics {
    /// Creates the namespace for one device.
    pub fn new(root: &'static str, device: DeviceId) -> Self {
        Self { root, device }
    }

    /// Returns the device identifier.
    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    /// Topic filter covering every command addressed to this namespace.
    pub fn subscription(&self) -> String<TOPIC_CAPACITY> {
        let mut topic = String::new();
        let _ = write!(topic, "{}/+/+", self.root);
        topic
    }

    /// Matches an inbound message against the command namespace.
    ///
    /// Returns `None` for foreign roots, other devices' addresses, unknown
    /// commands, and non-UTF-8 preset payloads.
    pub fn parse_command<'a>(&self, topic: &'a str, payload: &'a [u8]) -> Option<Command<'a>> {
        let mut parts = topic.split('/');
        if parts.next()? != self.root {
            return None;
        }

        let address = parts.next()?;
        if address != "all" && address != self.device.as_str() {
            return None;
        }

        let command = parts.next()?;
        if parts.next().is_some() {
            return None;
        }

        match command {
            "identify" => Some(Command::Identify),
            "preset" => core::str::from_utf8(payload)
                .ok()
                .map(|name| Command::Preset(name.trim())),
            "definition" => Some(Command::Definition(payload)),
            _ => None,
        }
    }

    /// Topic of the `identity` notification (and of the last will).
    pub fn identity(&self) -> String<TOPIC_CAPACITY> {
        self.notification("identity")
    }

    fn state(&self) -> String<TOPIC_CAPACITY> {
        self.notification("state")
    }

    fn program(&self) -> String<TOPIC_CAPACITY> {
        self.notification("program")
    }

    fn pattern(&self) -> String<TOPIC_CAPACITY> {
        self.notification("pattern")
    }

    fn notification(&self, suffix: &str) -> String<TOPIC_CAPACITY> {
        let mut topic = String::new();
        let _ = write!(topic, "{}/{}/{}", self.root, self.device.as_str(), suffix);
        topic
    }
}

/// A connectivity-status event from the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectivityEvent {
    /// Joining the configured network.
    WifiConnecting,
    /// The provisioning hotspot came up.
    HotspotStarted,
    /// Network association failed.
    WifiFailed,
    /// Connecting to the message broker.
    BrokerConnecting,
    /// Broker session established; user display resumes.
    BrokerConnected,
    /// Broker connection failed.
    BrokerFailed,
}

impl ConnectivityEvent {
    /// The status program this event selects.
    pub fn program(&self) -> ProgramId {
        match self {
            ConnectivityEvent::WifiConnecting => ProgramId::WifiConnecting,
            ConnectivityEvent::HotspotStarted => ProgramId::WifiHotspot,
            ConnectivityEvent::WifiFailed => ProgramId::WifiError,
            ConnectivityEvent::BrokerConnecting => ProgramId::MqttConnecting,
            ConnectivityEvent::BrokerConnected => ProgramId::User,
            ConnectivityEvent::BrokerFailed => ProgramId::MqttError,
        }
    }
}

/// Trait for abstracting the outbound side of the transport.
///
/// Implement this for your pub/sub client. Handle delivery errors internally -
/// this method cannot fail; the notification contract only covers what the
/// adapter hands to the sink.
pub trait NotificationSink {
    /// Publishes one notification.
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool);
}

// Outbound wire shapes. Indefinite durations are omitted, never sentinel-encoded.

#[derive(Serialize)]
struct StateOut {
    red: bool,
    amber: bool,
    green: bool,
}

#[derive(Serialize)]
struct FrameOut {
    red: bool,
    amber: bool,
    green: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    delay: Option<u32>,
}

#[derive(Serialize)]
struct PatternOut<const N: usize> {
    frames: Vec<FrameOut, N>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delay: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_preset: Option<&'static str>,
}

fn wire_delay(hold: Hold) -> Option<u32> {
    match hold {
        Hold::Millis(ms) => Some(ms),
        Hold::Indefinite => None,
    }
}

fn pattern_out<const N: usize>(pattern: &Pattern<N>) -> PatternOut<N> {
    let mut frames: Vec<FrameOut, N> = Vec::new();
    for frame in pattern.frames() {
        // Frame count is bounded by the pattern's own capacity.
        let _ = frames.push(FrameOut {
            red: frame.lamps.red,
            amber: frame.lamps.amber,
            green: frame.lamps.green,
            delay: wire_delay(frame.hold),
        });
    }

    PatternOut {
        frames,
        delay: wire_delay(pattern.duration()),
        next_preset: pattern.successor().map(|preset| preset.name()),
    }
}

/// Maps remote commands and connectivity events onto the program selector,
/// and selector changes onto outbound notifications.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Time instant type
/// * `L` - Lamp hardware implementation type
/// * `T` - Time source implementation type
/// * `N` - Maximum number of frames in patterns
pub struct ControlAdapter<'t, I: TimeInstant, L: SignalLamps, T: TimeSource<I>, const N: usize> {
    selector: ProgramSelector<'t, I, L, T, N>,
    topics: Topics,
}

impl<'t, I: TimeInstant, L: SignalLamps, T: TimeSource<I>, const N: usize>
    ControlAdapter<'t, I, L, T, N>
{
    /// Creates the adapter with a fresh selector in the `Off` program.
    pub fn new(lamps: L, time_source: &'t T, topics: Topics) -> Self {
        Self {
            selector: ProgramSelector::new(lamps, time_source),
            topics,
        }
    }

    /// Returns the topic namespace, for subscriptions and will registration.
    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    /// Returns the currently active program.
    pub fn current_program(&self) -> ProgramId {
        self.selector.current_program()
    }

    /// Returns the pattern currently in the user slot.
    pub fn user_pattern(&self) -> &Pattern<N> {
        self.selector.user_pattern()
    }

    /// Publishes the identity announcement.
    ///
    /// Call once after the transport connects, and again on `identify`.
    pub fn announce<S: NotificationSink>(&self, sink: &mut S) {
        sink.publish(self.topics.identity().as_str(), ONLINE.as_bytes(), true);
    }

    /// Dispatches one inbound command.
    pub fn handle_command<S: NotificationSink>(&mut self, command: Command<'_>, sink: &mut S) {
        match command {
            Command::Identify => self.announce(sink),
            Command::Preset(name) => match PresetId::from_name(name) {
                Some(preset) => {
                    let update = self.selector.install_user_pattern(preset.pattern());
                    self.emit(update, sink);
                }
                // Source-level policy: unknown presets are dropped without a
                // wire-visible failure.
                None => log::warn!("ignoring unknown preset {:?}", name),
            },
            Command::Definition(document) => match definition::validate::<N>(document) {
                Ok(pattern) => {
                    let update = self.selector.install_user_pattern(pattern);
                    self.emit(update, sink);
                }
                Err(error) => self.reject_definition(error),
            },
        }
    }

    /// Feeds a connectivity-status event into the program selector.
    pub fn on_connectivity<S: NotificationSink>(
        &mut self,
        event: ConnectivityEvent,
        sink: &mut S,
    ) {
        let update = self.selector.set_program(event.program());
        self.emit(update, sink);
    }

    /// Advances the active program by one control-loop tick.
    pub fn service<S: NotificationSink>(&mut self, sink: &mut S) {
        let update = self.selector.service();
        self.emit(update, sink);
    }

    fn reject_definition(&self, error: ValidationError) {
        log::warn!("ignoring invalid definition: {}", error);
    }

    fn emit<S: NotificationSink>(&self, update: StackUpdate, sink: &mut S) {
        if let Some(lamps) = update.lamps {
            let state = StateOut {
                red: lamps.red,
                amber: lamps.amber,
                green: lamps.green,
            };
            let mut buf = [0u8; 64];
            match serde_json_core::to_slice(&state, &mut buf) {
                Ok(len) => sink.publish(self.topics.state().as_str(), &buf[..len], true),
                Err(_) => log::error!("state payload exceeds buffer"),
            }
        }

        if let Some(program) = update.program {
            sink.publish(
                self.topics.program().as_str(),
                program.name().as_bytes(),
                true,
            );
        }

        if update.pattern_installed {
            let echo = pattern_out(self.selector.user_pattern());
            let mut buf = [0u8; PATTERN_PAYLOAD_CAPACITY];
            match serde_json_core::to_slice(&echo, &mut buf) {
                Ok(len) => sink.publish(self.topics.pattern().as_str(), &buf[..len], true),
                Err(_) => log::error!("pattern payload exceeds buffer"),
            }
        }
    }
}
