//! Line states and events
use embedded_hal::digital::PinState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Logical state of a line.
pub enum LineState {
    /// The line has not been sampled yet
    Unknown,
    /// The line is at its inactive level
    Inactive,
    /// The line is at its active level
    Active,
}

impl LineState {
    /// Maps a physical level to a logical state given the active level.
    pub fn from_level(level: PinState, active_level: PinState) -> Self {
        if level == active_level {
            LineState::Active
        } else {
            LineState::Inactive
        }
    }

    /// Returns true if the line is active.
    pub fn is_active(self) -> bool {
        self == LineState::Active
    }
}

/// Payload of every line event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineEventData {
    /// Pin the event came from
    pub pin: u8,
    /// New logical value, true when active
    pub active: bool,
    /// Milliseconds since the previous logical change
    ///
    /// The state established by initialization is not a change, so the first change afterwards reports
    /// zero. A line that is active at boot and then released therefore classifies as a short press.
    pub duration_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Classification of a release.
pub enum Press {
    /// Released before the long press threshold
    Short,
    /// Released at or after the long press threshold
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Events produced by one logical change.
pub struct Transition {
    /// Level change event data
    pub data: LineEventData,
    /// Set when the change is a release
    pub press: Option<Press>,
}

/// Direct notification hook, called once per logical change
pub type Callback = fn(&LineEventData);
