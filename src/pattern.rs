use crate::presets::PresetId;
use crate::types::{Frame, Hold, LampState};
use heapless::Vec;

/// Capacity used for user patterns by convention.
///
/// The pattern model itself is generic over its capacity; this is the bound
/// the definition validator tests against in this crate's own test suite and
/// the value embeddings are expected to pick.
pub const PATTERN_CAPACITY: usize = 32;

/// An ordered, bounded sequence of frames with an overall duration.
///
/// A pattern cycles through its frames, each held for its own duration, and
/// optionally expires as a whole: a finite pattern-level duration names a
/// successor preset to hand over to. A pattern with an indefinite duration
/// runs until it is replaced and never consults its successor.
///
/// # Type Parameters
/// * `N` - Maximum number of frames this pattern can hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern<const N: usize> {
    frames: Vec<Frame, N>,
    duration: Hold,
    successor: Option<PresetId>,
}

impl<const N: usize> Pattern<N> {
    /// Creates a new pattern builder.
    pub fn builder() -> PatternBuilder<N> {
        PatternBuilder::new()
    }

    /// Constructs a pattern whose invariants the caller has already checked.
    pub(crate) fn from_parts(
        frames: Vec<Frame, N>,
        duration: Hold,
        successor: Option<PresetId>,
    ) -> Self {
        Self {
            frames,
            duration,
            successor,
        }
    }

    /// Returns the frames in playback order. Never empty.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Returns the number of frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Returns the pattern-level duration.
    pub fn duration(&self) -> Hold {
        self.duration
    }

    /// Returns the preset to hand over to when the pattern expires.
    ///
    /// Only meaningful for finite-duration patterns; indefinite patterns
    /// never expire and leave this unset.
    pub fn successor(&self) -> Option<PresetId> {
        self.successor
    }
}

/// Pattern validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PatternError {
    /// No frames provided.
    Empty,

    /// Finite pattern duration without a successor preset.
    MissingSuccessor,
}

impl core::fmt::Display for PatternError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PatternError::Empty => {
                write!(f, "pattern must have at least one frame")
            }
            PatternError::MissingSuccessor => {
                write!(
                    f,
                    "finite-duration patterns must name a successor preset"
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PatternError {}

/// Builder for constructing validated patterns.
#[derive(Debug)]
pub struct PatternBuilder<const N: usize> {
    frames: Vec<Frame, N>,
    duration: Hold,
    successor: Option<PresetId>,
}

impl<const N: usize> PatternBuilder<N> {
    /// Creates a new empty pattern builder.
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            duration: Hold::Indefinite,
            successor: None,
        }
    }

    /// Adds a frame to the pattern.
    ///
    /// # Panics
    /// Panics if the pattern capacity is exceeded.
    pub fn frame(mut self, lamps: LampState, hold: Hold) -> Self {
        if self.frames.push(Frame::new(lamps, hold)).is_err() {
            panic!("pattern capacity exceeded");
        }
        self
    }

    /// Sets the pattern-level duration.
    ///
    /// Default is `Hold::Indefinite`.
    pub fn duration(mut self, duration: Hold) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the preset to hand over to when the pattern expires.
    pub fn successor(mut self, preset: PresetId) -> Self {
        self.successor = Some(preset);
        self
    }

    /// Builds and validates the pattern.
    ///
    /// # Errors
    /// * `Empty` - No frames were added
    /// * `MissingSuccessor` - Finite duration with no successor preset
    pub fn build(self) -> Result<Pattern<N>, PatternError> {
        if self.frames.is_empty() {
            return Err(PatternError::Empty);
        }

        if matches!(self.duration, Hold::Millis(_)) && self.successor.is_none() {
            return Err(PatternError::MissingSuccessor);
        }

        Ok(Pattern {
            frames: self.frames,
            duration: self.duration,
            successor: self.successor,
        })
    }
}

impl<const N: usize> Default for PatternBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: LampState = LampState::new(true, false, false);

    #[test]
    fn empty_pattern_is_rejected() {
        let result = Pattern::<8>::builder().build();
        assert_eq!(result.unwrap_err(), PatternError::Empty);
    }

    #[test]
    fn finite_pattern_without_successor_is_rejected() {
        let result = Pattern::<8>::builder()
            .frame(RED, Hold::Millis(100))
            .duration(Hold::Millis(1000))
            .build();
        assert_eq!(result.unwrap_err(), PatternError::MissingSuccessor);
    }

    #[test]
    fn finite_pattern_with_successor_builds() {
        let pattern = Pattern::<8>::builder()
            .frame(RED, Hold::Millis(100))
            .duration(Hold::Millis(1000))
            .successor(PresetId::Off)
            .build()
            .unwrap();

        assert_eq!(pattern.frame_count(), 1);
        assert_eq!(pattern.duration(), Hold::Millis(1000));
        assert_eq!(pattern.successor(), Some(PresetId::Off));
    }

    #[test]
    fn indefinite_pattern_needs_no_successor() {
        let pattern = Pattern::<8>::builder()
            .frame(RED, Hold::Indefinite)
            .build()
            .unwrap();

        assert_eq!(pattern.duration(), Hold::Indefinite);
        assert_eq!(pattern.successor(), None);
    }

    #[test]
    #[should_panic(expected = "pattern capacity exceeded")]
    fn overfilling_the_builder_panics() {
        let mut builder = Pattern::<2>::builder();
        for _ in 0..3 {
            builder = builder.frame(RED, Hold::Millis(100));
        }
    }
}
