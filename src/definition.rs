//! Validation of externally supplied pattern definitions.
//!
//! A definition is a JSON document describing a custom pattern:
//!
//! ```json
//! {
//!     "frames": [
//!         {"red": true, "amber": false, "green": false, "delay": 200}
//!     ],
//!     "delay": 1500,
//!     "next_preset": "off"
//! }
//! ```
//!
//! `delay` fields are milliseconds; `-1` (or an absent field) means
//! indefinite. The top-level `delay` is the pattern's overall duration; when
//! it is finite, `next_preset` names the built-in pattern to hand over to.
//!
//! Validation is pure transformation: no hardware or network side effects,
//! and every failure is atomic - nothing partially installs.

use crate::pattern::Pattern;
use crate::presets::PresetId;
use crate::types::{Frame, Hold, LampState};
use heapless::Vec;
use serde::Deserialize;

/// Maximum number of frames the document parser accepts.
///
/// Deliberately above any useful pattern capacity so that over-long
/// definitions are reported as [`ValidationError::TooManyFrames`] rather than
/// failing opaquely at parse time.
pub const MAX_DOC_FRAMES: usize = 64;

/// Wire sentinel for an indefinite duration.
const INDEFINITE: i64 = -1;

#[derive(Debug, Deserialize)]
struct FrameDoc {
    red: bool,
    amber: bool,
    green: bool,
    delay: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PatternDoc<'a> {
    #[serde(default)]
    frames: Vec<FrameDoc, MAX_DOC_FRAMES>,
    delay: Option<i64>,
    #[serde(borrow)]
    next_preset: Option<&'a str>,
}

/// Definition validation errors.
///
/// All recoverable: the previously active pattern stays untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValidationError {
    /// The document is not valid JSON for the definition schema.
    Malformed,

    /// `frames` is absent or empty.
    MissingFrames,

    /// A frame `delay` is negative (other than the `-1` sentinel) or out of
    /// range.
    InvalidFrameDelay,

    /// More frames than the pattern capacity allows.
    TooManyFrames,

    /// The top-level `delay` is negative (other than the `-1` sentinel) or
    /// out of range.
    InvalidPatternDelay,

    /// `next_preset` is absent or does not name a built-in pattern.
    UnknownPreset,
}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ValidationError::Malformed => {
                write!(f, "definition is not a valid JSON document")
            }
            ValidationError::MissingFrames => {
                write!(f, "definition must have at least one frame")
            }
            ValidationError::InvalidFrameDelay => {
                write!(f, "frame delay must be -1 or a non-negative integer")
            }
            ValidationError::TooManyFrames => {
                write!(f, "definition exceeds the pattern frame capacity")
            }
            ValidationError::InvalidPatternDelay => {
                write!(f, "pattern delay must be -1 or a non-negative integer")
            }
            ValidationError::UnknownPreset => {
                write!(f, "next_preset does not name a known preset")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ValidationError {}

/// Parses and validates a definition document into a pattern.
///
/// Rules are checked in order and the first failure wins. On success the
/// returned pattern is fully populated and ready to install.
pub fn validate<const N: usize>(document: &[u8]) -> Result<Pattern<N>, ValidationError> {
    let (doc, _) = serde_json_core::from_slice::<PatternDoc<'_>>(document)
        .map_err(|_| ValidationError::Malformed)?;

    if doc.frames.is_empty() {
        return Err(ValidationError::MissingFrames);
    }

    let mut holds: Vec<Hold, MAX_DOC_FRAMES> = Vec::new();
    for frame in &doc.frames {
        let hold = delay_to_hold(frame.delay).ok_or(ValidationError::InvalidFrameDelay)?;
        // Capacity matches the document's; cannot overflow.
        let _ = holds.push(hold);
    }

    if doc.frames.len() > N {
        return Err(ValidationError::TooManyFrames);
    }

    let (duration, successor) = match delay_to_hold(doc.delay) {
        Some(Hold::Indefinite) => (Hold::Indefinite, None),
        Some(finite) => {
            let preset = doc
                .next_preset
                .and_then(PresetId::from_name)
                .ok_or(ValidationError::UnknownPreset)?;
            (finite, Some(preset))
        }
        None => return Err(ValidationError::InvalidPatternDelay),
    };

    let mut frames: Vec<Frame, N> = Vec::new();
    for (doc_frame, hold) in doc.frames.iter().zip(holds) {
        let lamps = LampState::new(doc_frame.red, doc_frame.amber, doc_frame.green);
        // Count was checked against N above; cannot overflow.
        let _ = frames.push(Frame::new(lamps, hold));
    }

    Ok(Pattern::from_parts(frames, duration, successor))
}

/// Maps a wire delay onto a hold. `None` or `-1` is indefinite.
fn delay_to_hold(delay: Option<i64>) -> Option<Hold> {
    match delay {
        None | Some(INDEFINITE) => Some(Hold::Indefinite),
        Some(ms) => u32::try_from(ms).ok().map(Hold::Millis),
    }
}
