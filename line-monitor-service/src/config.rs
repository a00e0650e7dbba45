//! Line monitor configuration
use embassy_time::Duration;
use embedded_hal::digital::PinState;
use embedded_services::event_bus::{Kind, Topic};

use crate::hal::Pull;

/// Default bus topic for line events
pub const GPIO_TOPIC: Topic = "gpio";

/// Bus event kinds used by the default route
pub mod kind {
    use embedded_services::event_bus::Kind;

    /// Logical level changed
    pub const LINE_CHANGE: Kind = 0;
    /// Line was released before the long press threshold
    pub const BUTTON: Kind = 1;
    /// Line was released at or after the long press threshold
    pub const LONG_BUTTON: Kind = 2;
}

/// Default long press threshold
pub const LONG_PRESS_THRESHOLD: Duration = Duration::from_millis(1000);

/// Debounce window of the button preset
pub const BUTTON_DEBOUNCE: Duration = Duration::from_millis(50);

/// Debounce window of the motion sensor preset
pub const MOTION_SENSOR_DEBOUNCE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Struct representing the configuration of a monitored line.
pub struct LineConfig {
    /// Physical level considered active
    pub active_level: PinState,
    /// Request the internal pull resistor, its polarity follows `active_level`
    pub internal_pull: bool,
    /// Sample on any edge interrupt, otherwise the line is only sampled on demand
    pub interrupt_enabled: bool,
    /// Quiet time after an edge before sampling, zero disables debouncing
    pub debounce: Duration,
    /// Releases held at least this long are long presses
    pub long_press_threshold: Duration,
    /// Maximum time to wait for bus capacity in task context, `None` waits indefinitely
    pub post_timeout: Option<Duration>,
}

impl LineConfig {
    /// Creates a new config with the given active level and default values otherwise.
    pub fn new(active_level: PinState) -> Self {
        Self {
            active_level,
            ..Default::default()
        }
    }

    /// Push button preset, internal pull with a 50 ms debounce window.
    pub fn button(active_level: PinState) -> Self {
        Self::new(active_level)
            .with_internal_pull(true)
            .with_debounce(BUTTON_DEBOUNCE)
    }

    /// PIR motion sensor preset, no pull with a 1 s debounce window.
    pub fn motion_sensor(active_level: PinState) -> Self {
        Self::new(active_level).with_debounce(MOTION_SENSOR_DEBOUNCE)
    }

    /// Sets the internal pull request.
    pub fn with_internal_pull(mut self, internal_pull: bool) -> Self {
        self.internal_pull = internal_pull;
        self
    }

    /// Enables or disables edge interrupts.
    pub fn with_interrupt(mut self, interrupt_enabled: bool) -> Self {
        self.interrupt_enabled = interrupt_enabled;
        self
    }

    /// Sets the debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sets the long press threshold.
    pub fn with_long_press_threshold(mut self, threshold: Duration) -> Self {
        self.long_press_threshold = threshold;
        self
    }

    /// Sets the task context bus timeout.
    pub fn with_post_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.post_timeout = timeout;
        self
    }

    /// Returns true if a debounce window is configured.
    pub fn debounced(&self) -> bool {
        self.debounce.as_ticks() > 0
    }

    /// Pull resistor to use when the internal pull is enabled.
    ///
    /// The pull holds the line at its inactive level.
    pub fn active_pull(&self) -> Pull {
        match self.active_level {
            PinState::Low => Pull::Up,
            PinState::High => Pull::Down,
        }
    }

    /// Pull resistor requested by this configuration.
    pub fn pull(&self) -> Pull {
        if self.internal_pull {
            self.active_pull()
        } else {
            Pull::None
        }
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            active_level: PinState::High,
            internal_pull: false,
            interrupt_enabled: true,
            debounce: Duration::from_ticks(0),
            long_press_threshold: LONG_PRESS_THRESHOLD,
            post_timeout: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Event bus routing for a line.
pub struct BusRoute {
    /// Topic every event is posted under
    pub topic: Topic,
    /// Kind of level change events
    pub change: Kind,
    /// Kind of short press events
    pub press: Kind,
    /// Kind of long press events
    pub long_press: Kind,
}

impl Default for BusRoute {
    fn default() -> Self {
        Self {
            topic: GPIO_TOPIC,
            change: kind::LINE_CHANGE,
            press: kind::BUTTON,
            long_press: kind::LONG_BUTTON,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Event group bits for a line. A zero mask is never set.
pub struct GroupBits {
    /// Set when the line becomes active
    pub on: u32,
    /// Set when the line becomes inactive
    pub off: u32,
    /// Set on a short press
    pub press: u32,
    /// Set on a long press
    pub long_press: u32,
}
